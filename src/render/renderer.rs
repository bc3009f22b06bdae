use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Mat4;
use log::{info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::config::AppConfig;
use crate::error::ResourceError;
use crate::frame::FrameStage;
use crate::geometry::{
    vertex_count, LitVertex, QUAD_STRIDE, QUAD_VERTICES, SKYBOX_STRIDE, SKYBOX_VERTICES,
    STONE_STRIDE, STONE_VERTICES,
};
use crate::lighting::{DirectionalLight, PointLight};
use crate::obj::{load_obj, ObjMesh};
use crate::render::programs::{
    BlitProgram, LitPipeline, LitProgram, ObjectTransforms, SkyboxProgram, DEFAULT_SHININESS,
};
use crate::render::target::OffscreenTarget;
use crate::scene::{draw_list, DrawableKind, FrameTransforms};
use crate::texture::{CubemapFaces, GpuTexture};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];
const GROUND_SPECULAR: [u8; 4] = [128, 128, 128, 255];

/// Owns the GPU device, the window surface and every resource a frame touches.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    target: OffscreenTarget,
    lit: LitPipeline,
    drawables: Vec<DrawSlot>,
    skybox: SkyboxProgram,
    skybox_cube: VertexBuffer,
    quad: VertexBuffer,
    blit: BlitProgram,
    clear_color: wgpu::Color,
    directional_light: DirectionalLight,
    point_light: PointLight,
    _textures: Vec<GpuTexture>,
}

/// One opaque draw: its own program plus the meshes it submits.
struct DrawSlot {
    name: String,
    model: Mat4,
    program: LitProgram,
    meshes: Vec<MeshBuffers>,
}

struct VertexBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl VertexBuffer {
    fn from_floats(device: &wgpu::Device, data: &[f32], stride: usize, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            buffer,
            count: vertex_count(data, stride),
        }
    }
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
    material: wgpu::BindGroup,
}

impl MeshBuffers {
    fn from_mesh(
        device: &wgpu::Device,
        vertices: &[LitVertex],
        indices: &[u32],
        material: wgpu::BindGroup,
        label: &str,
    ) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: indices.len() as u32,
            material,
        }
    }
}

/// Decoded textures keyed by path so meshes sharing a map upload it once.
struct TextureCache<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    loaded: HashMap<PathBuf, usize>,
    textures: Vec<GpuTexture>,
}

impl<'a> TextureCache<'a> {
    fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            loaded: HashMap::new(),
            textures: Vec::new(),
        }
    }

    fn load(&mut self, path: &Path, fallback: [u8; 4]) -> Result<usize, ResourceError> {
        if let Some(&index) = self.loaded.get(path) {
            return Ok(index);
        }
        let (texture, failure) = GpuTexture::load_or(self.device, self.queue, path, fallback);
        if let Some(err) = failure {
            err.recover()?;
        }
        Ok(self.push(texture, Some(path)))
    }

    fn solid(&mut self, color: [u8; 4], label: &str) -> usize {
        let texture = GpuTexture::solid(self.device, self.queue, color, label);
        self.push(texture, None)
    }

    fn push(&mut self, texture: GpuTexture, path: Option<&Path>) -> usize {
        let index = self.textures.len();
        self.textures.push(texture);
        if let Some(path) = path {
            self.loaded.insert(path.to_path_buf(), index);
        }
        index
    }

    fn get(&self, index: usize) -> &GpuTexture {
        &self.textures[index]
    }
}

impl Renderer {
    /// Creates the device and surface, validates the offscreen target and
    /// loads every scene resource.
    pub async fn new(window: Arc<Window>, app: &AppConfig) -> Result<Self> {
        let size = surface_extent(window.inner_size());

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(ResourceError::from)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(ResourceError::from)?;
        let adapter_info = adapter.get_info();
        info!(
            "Using adapter '{}' ({:?})",
            adapter_info.name, adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("pet-sims-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(ResourceError::from)?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| ResourceError::Window("surface reports no formats".into()))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let target = OffscreenTarget::create(&device, size.width, size.height)
            .context("offscreen render target could not be created")?;

        let mut textures = TextureCache::new(&device, &queue);
        let lit = LitPipeline::new(&device);

        let skybox_cube =
            VertexBuffer::from_floats(&device, SKYBOX_VERTICES, SKYBOX_STRIDE, "skybox-vertices");
        let quad = VertexBuffer::from_floats(&device, QUAD_VERTICES, QUAD_STRIDE, "quad-vertices");

        let face_paths = app.skybox_faces.clone().map(|face| app.resource_path(&face));
        let mut faces = CubemapFaces::load(&face_paths);
        for failure in std::mem::take(&mut faces.failures) {
            failure.recover()?;
        }
        let cubemap = GpuTexture::cubemap(&device, &queue, &faces);
        let skybox = SkyboxProgram::new(&device, &cubemap);
        textures.push(cubemap, None);

        let mut drawables = Vec::new();
        for drawable in draw_list(app) {
            let program = LitProgram::new(&device, &lit, &drawable.name);
            let meshes = match drawable.kind {
                DrawableKind::Ground => {
                    vec![ground_mesh(&device, &lit, &mut textures, app)?]
                }
                DrawableKind::Model(index) => {
                    let path = app.resource_path(&app.models[index].path);
                    model_meshes(&device, &lit, &mut textures, &path, &drawable.name)?
                }
            };
            drawables.push(DrawSlot {
                name: drawable.name,
                model: drawable.model,
                program,
                meshes,
            });
        }

        let blit = BlitProgram::new(&device, surface_format, &target);
        let clear = app.clear_color;
        let texture_store = textures.textures;

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            target,
            lit,
            drawables,
            skybox,
            skybox_cube,
            quad,
            blit,
            clear_color: wgpu::Color {
                r: clear.x as f64,
                g: clear.y as f64,
                b: clear.z as f64,
                a: 1.0,
            },
            directional_light: app.directional_light,
            point_light: app.point_light,
            _textures: texture_store,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Reconfigures the surface and rebuilds the offscreen target for `new_size`.
    /// A zero-area size (minimized window) is ignored.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) -> Result<(), ResourceError> {
        if new_size.width == 0 || new_size.height == 0 {
            return Ok(());
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        if self.target.size() == (new_size.width, new_size.height) {
            return Ok(());
        }
        self.target = OffscreenTarget::create(&self.device, new_size.width, new_size.height)?;
        self.blit.rebind(&self.device, &self.target);
        info!("Resized to {}x{}", new_size.width, new_size.height);
        Ok(())
    }

    /// Re-applies the current surface configuration after it was lost or outdated.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Records and presents one frame: the scene and skybox into the offscreen
    /// target, then the blit onto the window surface.
    pub fn render_frame(&mut self, frame: &FrameTransforms) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        for slot in &self.drawables {
            slot.program.bind_lights(
                &self.queue,
                &self.directional_light,
                &self.point_light,
                frame.eye,
            );
            slot.program.bind_transforms(
                &self.queue,
                &ObjectTransforms {
                    model: slot.model,
                    view: frame.view,
                    projection: frame.projection,
                },
            );
        }
        self.skybox
            .bind_transforms(&self.queue, frame.skybox_view, frame.projection);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        for stage in FrameStage::PASSES {
            match stage {
                FrameStage::OffscreenPass => self.record_scene(&mut encoder),
                FrameStage::SkyboxPass => self.record_skybox(&mut encoder),
                FrameStage::BlitPass => self.record_blit(&mut encoder, &surface_view),
                _ => {}
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn record_scene(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("offscreen-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.target.color_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            ..Default::default()
        });

        pass.set_pipeline(&self.lit.pipeline);
        for slot in &self.drawables {
            pass.set_bind_group(0, &slot.program.bind_group, &[]);
            for mesh in &slot.meshes {
                pass.set_bind_group(1, &mesh.material, &[]);
                pass.set_vertex_buffer(0, mesh.vertex.slice(..));
                pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
    }

    fn record_skybox(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("skybox-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.target.color_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        pass.set_pipeline(&self.skybox.pipeline);
        pass.set_bind_group(0, &self.skybox.bind_group, &[]);
        pass.set_vertex_buffer(0, self.skybox_cube.buffer.slice(..));
        pass.draw(0..self.skybox_cube.count, 0..1);
    }

    fn record_blit(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("blit-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        pass.set_pipeline(&self.blit.pipeline);
        pass.set_bind_group(0, &self.blit.bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad.buffer.slice(..));
        pass.draw(0..self.quad.count, 0..1);
    }

    /// Names of the opaque draws with the number of meshes each submits.
    pub fn draw_summary(&self) -> Vec<(String, usize)> {
        self.drawables
            .iter()
            .map(|slot| (slot.name.clone(), slot.meshes.len()))
            .collect()
    }
}

fn ground_mesh(
    device: &wgpu::Device,
    lit: &LitPipeline,
    textures: &mut TextureCache<'_>,
    app: &AppConfig,
) -> Result<MeshBuffers, ResourceError> {
    let vertices = stone_vertices();
    let indices: Vec<u32> = (0..vertices.len() as u32).collect();
    let diffuse = textures.load(&app.resource_path(&app.ground.texture), WHITE)?;
    let specular = textures.solid(GROUND_SPECULAR, "ground-specular");
    let material = lit.create_material(
        device,
        textures.get(diffuse),
        textures.get(specular),
        DEFAULT_SHININESS,
        "ground-material",
    );
    Ok(MeshBuffers::from_mesh(device, &vertices, &indices, material, "ground"))
}

/// Window size clamped so the surface and offscreen target never start at zero area.
fn surface_extent(size: PhysicalSize<u32>) -> PhysicalSize<u32> {
    PhysicalSize::new(size.width.max(1), size.height.max(1))
}

fn stone_vertices() -> Vec<LitVertex> {
    STONE_VERTICES
        .chunks_exact(STONE_STRIDE)
        .map(|v| LitVertex {
            position: [v[0], v[1], v[2]],
            normal: [v[3], v[4], v[5]],
            uv: [v[6], v[7]],
        })
        .collect()
}

/// Loads an OBJ model; a failure is logged and the model draws nothing.
fn model_meshes(
    device: &wgpu::Device,
    lit: &LitPipeline,
    textures: &mut TextureCache<'_>,
    path: &Path,
    name: &str,
) -> Result<Vec<MeshBuffers>, ResourceError> {
    let model = match load_obj(path) {
        Ok(model) => model,
        Err(err) => {
            ResourceError::Model {
                path: path.to_path_buf(),
                message: format!("{err:#}"),
            }
            .recover()?;
            return Ok(Vec::new());
        }
    };
    info!(
        "Loaded model '{name}' from {} ({} meshes, {} triangles)",
        path.display(),
        model.meshes.len(),
        model.triangle_count()
    );

    model
        .meshes
        .iter()
        .enumerate()
        .map(|(index, mesh)| {
            let label = format!("{name}-mesh{index}");
            let material = mesh_material(device, lit, textures, &model, mesh, &label)?;
            Ok(MeshBuffers::from_mesh(
                device,
                &mesh.vertices,
                &mesh.indices,
                material,
                &label,
            ))
        })
        .collect()
}

fn mesh_material(
    device: &wgpu::Device,
    lit: &LitPipeline,
    textures: &mut TextureCache<'_>,
    model: &crate::obj::ObjModel,
    mesh: &ObjMesh,
    label: &str,
) -> Result<wgpu::BindGroup, ResourceError> {
    let material = model.material_for(mesh);
    if mesh.material.is_some() && material.is_none() {
        warn!("{label}: material {:?} not found, drawing untextured", mesh.material);
    }
    let diffuse = match material.and_then(|m| m.diffuse_map.as_deref()) {
        Some(path) => textures.load(path, WHITE)?,
        None => textures.solid(WHITE, &format!("{label}-diffuse")),
    };
    let specular = match material.and_then(|m| m.specular_map.as_deref()) {
        Some(path) => textures.load(path, BLACK)?,
        None => textures.solid(BLACK, &format!("{label}-specular")),
    };
    let shininess = material
        .and_then(|m| m.shininess)
        .filter(|s| *s > 0.0)
        .unwrap_or(DEFAULT_SHININESS);
    Ok(lit.create_material(
        device,
        textures.get(diffuse),
        textures.get(specular),
        shininess,
        label,
    ))
}
