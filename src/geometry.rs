//! Static vertex data uploaded once at startup.

use bytemuck::{Pod, Zeroable};

/// Floats per stone vertex: position.xyz, normal.xyz, uv.
pub const STONE_STRIDE: usize = 8;
/// Floats per skybox vertex: position.xyz.
pub const SKYBOX_STRIDE: usize = 3;
/// Floats per quad vertex: position.xy, uv.
pub const QUAD_STRIDE: usize = 4;

/// Interleaved vertex layout shared by the stone platform and loaded models.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LitVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl LitVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub fn skybox_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
    wgpu::VertexBufferLayout {
        array_stride: (SKYBOX_STRIDE * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

pub fn quad_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];
    wgpu::VertexBufferLayout {
        array_stride: (QUAD_STRIDE * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

pub fn vertex_count(data: &[f32], stride: usize) -> u32 {
    (data.len() / stride) as u32
}

/// Thin stone slab, 2 x 0.2 x 2, centred on the origin.
#[rustfmt::skip]
pub const STONE_VERTICES: &[f32] = &[
    // top
    1.0, 0.1, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0,
    1.0, 0.1, -1.0, 0.0, 1.0, 0.0, 1.0, 0.0,
    -1.0, 0.1, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0,
    1.0, 0.1, -1.0, 0.0, 1.0, 0.0, 1.0, 0.0,
    -1.0, 0.1, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0,
    -1.0, 0.1, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0,
    // right
    1.0, 0.1, -1.0, 1.0, 0.0, 0.0, 0.0, 0.2,
    1.0, 0.1, 1.0, 1.0, 0.0, 0.0, 1.0, 0.2,
    1.0, -0.1, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
    1.0, 0.1, -1.0, 1.0, 0.0, 0.0, 0.0, 0.2,
    1.0, -0.1, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
    1.0, -0.1, -1.0, 1.0, 0.0, 0.0, 0.0, 0.0,
    // back
    -1.0, 0.1, -1.0, 0.0, 0.0, -1.0, 0.0, 0.2,
    1.0, 0.1, -1.0, 0.0, 0.0, -1.0, 1.0, 0.2,
    1.0, -0.1, -1.0, 0.0, 0.0, -1.0, 1.0, 0.0,
    -1.0, 0.1, -1.0, 0.0, 0.0, -1.0, 0.0, 0.2,
    1.0, -0.1, -1.0, 0.0, 0.0, -1.0, 1.0, 0.0,
    -1.0, -0.1, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0,
    // left
    -1.0, 0.1, 1.0, -1.0, 0.0, 0.0, 0.0, 0.2,
    -1.0, 0.1, -1.0, -1.0, 0.0, 0.0, 1.0, 0.2,
    -1.0, -0.1, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0,
    -1.0, -0.1, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0,
    -1.0, 0.1, -1.0, -1.0, 0.0, 0.0, 1.0, 0.2,
    -1.0, -0.1, -1.0, -1.0, 0.0, 0.0, 1.0, 0.0,
    // front
    1.0, 0.1, 1.0, 0.0, 0.0, 1.0, 0.0, 0.2,
    -1.0, 0.1, 1.0, 0.0, 0.0, 1.0, 1.0, 0.2,
    1.0, -0.1, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0,
    1.0, -0.1, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0,
    -1.0, 0.1, 1.0, 0.0, 0.0, 1.0, 1.0, 0.2,
    -1.0, -0.1, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0,
    // bottom
    1.0, -0.1, -1.0, 0.0, -1.0, 0.0, 1.0, 0.0,
    1.0, -0.1, 1.0, 0.0, -1.0, 0.0, 1.0, 1.0,
    -1.0, -0.1, 1.0, 0.0, -1.0, 0.0, 0.0, 1.0,
    1.0, -0.1, -1.0, 0.0, -1.0, 0.0, 1.0, 0.0,
    -1.0, -0.1, 1.0, 0.0, -1.0, 0.0, 0.0, 1.0,
    -1.0, -0.1, -1.0, 0.0, -1.0, 0.0, 0.0, 0.0,
];

/// Unit cube seen from the inside; only directions matter when sampling the cubemap.
#[rustfmt::skip]
pub const SKYBOX_VERTICES: &[f32] = &[
    -1.0, 1.0, -1.0,
    -1.0, -1.0, -1.0,
    1.0, -1.0, -1.0,
    1.0, -1.0, -1.0,
    1.0, 1.0, -1.0,
    -1.0, 1.0, -1.0,
    -1.0, -1.0, 1.0,
    -1.0, -1.0, -1.0,
    -1.0, 1.0, -1.0,
    -1.0, 1.0, -1.0,
    -1.0, 1.0, 1.0,
    -1.0, -1.0, 1.0,
    1.0, -1.0, -1.0,
    1.0, -1.0, 1.0,
    1.0, 1.0, 1.0,
    1.0, 1.0, 1.0,
    1.0, 1.0, -1.0,
    1.0, -1.0, -1.0,
    -1.0, -1.0, 1.0,
    -1.0, 1.0, 1.0,
    1.0, 1.0, 1.0,
    1.0, 1.0, 1.0,
    1.0, -1.0, 1.0,
    -1.0, -1.0, 1.0,
    -1.0, 1.0, -1.0,
    1.0, 1.0, -1.0,
    1.0, 1.0, 1.0,
    1.0, 1.0, 1.0,
    -1.0, 1.0, 1.0,
    -1.0, 1.0, -1.0,
    -1.0, -1.0, -1.0,
    -1.0, -1.0, 1.0,
    1.0, -1.0, -1.0,
    1.0, -1.0, -1.0,
    -1.0, -1.0, 1.0,
    1.0, -1.0, 1.0,
];

/// Two triangles covering normalized device coordinates.
#[rustfmt::skip]
pub const QUAD_VERTICES: &[f32] = &[
    // positions // uv
    -1.0, 1.0, 0.0, 1.0,
    -1.0, -1.0, 0.0, 0.0,
    1.0, -1.0, 1.0, 0.0,
    -1.0, 1.0, 0.0, 1.0,
    1.0, -1.0, 1.0, 0.0,
    1.0, 1.0, 1.0, 1.0,
];
