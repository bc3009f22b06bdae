use std::num::NonZeroU64;

use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::geometry::{quad_layout, skybox_layout, LitVertex};
use crate::lighting::{DirectionalLight, LightingUniform, PointLight};
use crate::render::shaders::{BLIT_SHADER, LIT_SHADER, SKYBOX_SHADER};
use crate::render::target::{OffscreenTarget, DEPTH_STENCIL_FORMAT};
use crate::texture::{GpuTexture, COLOR_FORMAT};

/// Specular exponent used when a material does not name one.
pub const DEFAULT_SHININESS: f32 = 32.0;

/// Model, view and projection for a single lit draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransforms {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
}

impl From<&ObjectTransforms> for TransformUniform {
    fn from(transforms: &ObjectTransforms) -> Self {
        let normal = Mat3::from_mat4(transforms.model).inverse().transpose();
        Self {
            model: transforms.model.to_cols_array_2d(),
            view: transforms.view.to_cols_array_2d(),
            projection: transforms.projection.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub params: [f32; 4],
}

impl MaterialUniform {
    pub fn new(shininess: f32) -> Self {
        Self {
            params: [shininess, 0.0, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SkyboxUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

fn uniform_entry<T>(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(std::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

fn texture_entry(binding: u32, view_dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn linear_sampler(device: &wgpu::Device, label: &str, address_mode: wgpu::AddressMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}

#[allow(clippy::too_many_arguments)]
fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    vertex_layout: wgpu::VertexBufferLayout<'_>,
    format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
    depth_stencil: Option<wgpu::DepthStencilState>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts,
        immediate_size: 0,
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[vertex_layout],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            ..Default::default()
        },
        depth_stencil,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview_mask: None,
        cache: None,
    })
}

/// Depth state of the opaque scene pass.
pub fn scene_depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_STENCIL_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Depth state of the skybox: tested against the scene but never written.
pub fn skybox_depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_STENCIL_FORMAT,
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Compiled lit shader and the layouts its programs and materials bind against.
pub struct LitPipeline {
    pub pipeline: wgpu::RenderPipeline,
    frame_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl LitPipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lit-frame-layout"),
            entries: &[
                uniform_entry::<TransformUniform>(0, wgpu::ShaderStages::VERTEX),
                uniform_entry::<LightingUniform>(1, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lit-material-layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2),
                texture_entry(1, wgpu::TextureViewDimension::D2),
                sampler_entry(2),
                uniform_entry::<MaterialUniform>(3, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let pipeline = create_pipeline(
            device,
            "lit-pipeline",
            LIT_SHADER,
            &[&frame_layout, &material_layout],
            LitVertex::layout(),
            COLOR_FORMAT,
            Some(wgpu::Face::Back),
            Some(scene_depth_state()),
        );
        let sampler = linear_sampler(device, "lit-sampler", wgpu::AddressMode::Repeat);
        Self {
            pipeline,
            frame_layout,
            material_layout,
            sampler,
        }
    }

    /// Bind group for one mesh's texture maps and specular exponent.
    pub fn create_material(
        &self,
        device: &wgpu::Device,
        diffuse: &GpuTexture,
        specular: &GpuTexture,
        shininess: f32,
        label: &str,
    ) -> wgpu::BindGroup {
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytes_of(&MaterialUniform::new(shininess)),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&specular.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: uniform.as_entire_binding(),
                },
            ],
        })
    }
}

/// Uniform state owned by one lit draw (ground or a model).
pub struct LitProgram {
    transforms: wgpu::Buffer,
    lighting: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl LitProgram {
    pub fn new(device: &wgpu::Device, pipeline: &LitPipeline, label: &str) -> Self {
        let transforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label}-transforms")),
            size: std::mem::size_of::<TransformUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lighting = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label}-lighting")),
            size: std::mem::size_of::<LightingUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &pipeline.frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: transforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting.as_entire_binding(),
                },
            ],
        });
        Self {
            transforms,
            lighting,
            bind_group,
        }
    }

    pub fn bind_lights(
        &self,
        queue: &wgpu::Queue,
        directional: &DirectionalLight,
        point: &PointLight,
        eye: Vec3,
    ) {
        let uniform = LightingUniform::new(directional, point, eye);
        queue.write_buffer(&self.lighting, 0, bytes_of(&uniform));
    }

    pub fn bind_transforms(&self, queue: &wgpu::Queue, transforms: &ObjectTransforms) {
        let uniform = TransformUniform::from(transforms);
        queue.write_buffer(&self.transforms, 0, bytes_of(&uniform));
    }
}

/// Cubemap pipeline with its rotation-only camera uniform.
pub struct SkyboxProgram {
    pub pipeline: wgpu::RenderPipeline,
    uniform: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl SkyboxProgram {
    pub fn new(device: &wgpu::Device, cubemap: &GpuTexture) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox-layout"),
            entries: &[
                uniform_entry::<SkyboxUniform>(0, wgpu::ShaderStages::VERTEX),
                texture_entry(1, wgpu::TextureViewDimension::Cube),
                sampler_entry(2),
            ],
        });
        let pipeline = create_pipeline(
            device,
            "skybox-pipeline",
            SKYBOX_SHADER,
            &[&layout],
            skybox_layout(),
            COLOR_FORMAT,
            None,
            Some(skybox_depth_state()),
        );
        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("skybox-uniform"),
            size: std::mem::size_of::<SkyboxUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let sampler = linear_sampler(device, "skybox-sampler", wgpu::AddressMode::ClampToEdge);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox-bind-group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&cubemap.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });
        Self {
            pipeline,
            uniform,
            bind_group,
        }
    }

    pub fn bind_transforms(&self, queue: &wgpu::Queue, view: Mat4, projection: Mat4) {
        let uniform = SkyboxUniform {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        };
        queue.write_buffer(&self.uniform, 0, bytes_of(&uniform));
    }
}

/// Full-screen quad that copies the offscreen color attachment to the surface.
pub struct BlitProgram {
    pub pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    pub bind_group: wgpu::BindGroup,
}

impl BlitProgram {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        target: &OffscreenTarget,
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit-layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2),
                sampler_entry(1),
            ],
        });
        let pipeline = create_pipeline(
            device,
            "blit-pipeline",
            BLIT_SHADER,
            &[&layout],
            quad_layout(),
            surface_format,
            None,
            None,
        );
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blit-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let bind_group = Self::screen_bind_group(device, &layout, &sampler, target);
        Self {
            pipeline,
            layout,
            sampler,
            bind_group,
        }
    }

    /// Points the blit at a freshly created offscreen target.
    pub fn rebind(&mut self, device: &wgpu::Device, target: &OffscreenTarget) {
        self.bind_group = Self::screen_bind_group(device, &self.layout, &self.sampler, target);
    }

    fn screen_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        target: &OffscreenTarget,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blit-bind-group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&target.color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn uniform_blocks_match_shader_layouts() {
        assert_eq!(std::mem::size_of::<TransformUniform>(), 3 * 64 + 48);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 144);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 16);
        assert_eq!(std::mem::size_of::<SkyboxUniform>(), 128);
    }

    #[test]
    fn normal_matrix_drops_translation_and_scale() {
        let transforms = ObjectTransforms {
            model: Mat4::from_translation(Vec3::new(4.0, -2.0, 1.0))
                * Mat4::from_rotation_y(90f32.to_radians())
                * Mat4::from_scale(Vec3::splat(0.5)),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        let uniform = TransformUniform::from(&transforms);
        let normal = Vec3::new(uniform.normal[0][0], uniform.normal[0][1], uniform.normal[0][2]);
        // rotated +X column, scaled by the inverse of 0.5
        assert_relative_eq!(normal.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(normal.z, -2.0, epsilon = 1e-5);
        assert_eq!(uniform.model[3], [4.0, -2.0, 1.0, 1.0]);
    }

    #[test]
    fn skybox_depth_never_writes() {
        let sky = skybox_depth_state();
        assert!(!sky.depth_write_enabled);
        assert_eq!(sky.depth_compare, wgpu::CompareFunction::LessEqual);
        let scene = scene_depth_state();
        assert!(scene.depth_write_enabled);
        assert_eq!(scene.depth_compare, wgpu::CompareFunction::Less);
    }

    #[test]
    fn material_carries_shininess() {
        assert_eq!(MaterialUniform::new(DEFAULT_SHININESS).params[0], 32.0);
    }
}
