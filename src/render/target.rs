use log::info;

use crate::error::ResourceError;
use crate::texture::COLOR_FORMAT;

/// Combined depth/stencil format of the offscreen attachment.
pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Color and depth/stencil attachments the scene and skybox are drawn into.
///
/// The color attachment is also sampled by the blit pass, so the target must
/// be rebuilt (and the blit bind group with it) whenever the window resizes.
pub struct OffscreenTarget {
    _color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    _depth: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    pub fn create(device: &wgpu::Device, width: u32, height: u32) -> Result<Self, ResourceError> {
        validate_extent(width, height, device.limits().max_texture_dimension_2d)?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen-color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen-depth-stencil"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_STENCIL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());
        info!("Offscreen target created at {width}x{height}");

        Ok(Self {
            _color: color,
            color_view,
            _depth: depth,
            depth_view,
            width,
            height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Rejects attachment sizes the device cannot back.
pub fn validate_extent(width: u32, height: u32, max_dimension: u32) -> Result<(), ResourceError> {
    if width == 0 || height == 0 {
        return Err(ResourceError::OffscreenIncomplete {
            reason: format!("zero-sized attachment {width}x{height}"),
        });
    }
    if width > max_dimension || height > max_dimension {
        return Err(ResourceError::OffscreenIncomplete {
            reason: format!(
                "{width}x{height} exceeds the device limit of {max_dimension} texels per side"
            ),
        });
    }
    Ok(())
}
