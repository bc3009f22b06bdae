//! Image decoding and texture upload for the platform texture and the skybox cubemap.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::RgbaImage;
use log::{info, warn};

use crate::config::SKYBOX_FACE_NAMES;
use crate::error::ResourceError;

/// Sampled color format for every decoded image.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Magenta so a missing cubemap face is obvious on screen.
const MISSING_FACE_COLOR: [u8; 4] = [255, 0, 255, 255];

/// Tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn decode(path: &Path) -> Result<Self, image::ImageError> {
        let rgba = image::open(path)?.to_rgba8();
        Ok(Self::from_rgba(rgba))
    }

    fn from_rgba(rgba: RgbaImage) -> Self {
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: rgba.into_raw(),
        }
    }

    fn resized(&self, width: u32, height: u32) -> Self {
        match RgbaImage::from_raw(self.width, self.height, self.pixels.clone()) {
            Some(buffer) => Self::from_rgba(image::imageops::resize(
                &buffer,
                width,
                height,
                FilterType::Triangle,
            )),
            None => Self::solid(width, height, MISSING_FACE_COLOR),
        }
    }

    /// Full mip chain down to 1x1, starting with a copy of `self`.
    pub fn mip_chain(&self) -> Vec<DecodedImage> {
        let mut levels = vec![self.clone()];
        let (mut width, mut height) = (self.width, self.height);
        while width > 1 || height > 1 {
            width = (width / 2).max(1);
            height = (height / 2).max(1);
            let next = levels[levels.len() - 1].resized(width, height);
            levels.push(next);
        }
        levels
    }
}

/// Levels in a full chain for a `width` x `height` base image.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Six square faces in +X, -X, +Y, -Y, +Z, -Z order.
#[derive(Debug)]
pub struct CubemapFaces {
    pub size: u32,
    pub faces: Vec<DecodedImage>,
    /// Faces that failed to decode and were replaced with a placeholder.
    pub failures: Vec<ResourceError>,
}

impl CubemapFaces {
    /// Decodes all faces. Missing or unreadable faces become magenta, and faces
    /// that disagree with the first good face's size are resampled to it.
    pub fn load(paths: &[PathBuf; 6]) -> Self {
        let mut decoded = Vec::with_capacity(6);
        let mut failures = Vec::new();
        for (face, path) in SKYBOX_FACE_NAMES.into_iter().zip(paths) {
            match DecodedImage::decode(path) {
                Ok(image) => decoded.push(Some(image)),
                Err(source) => {
                    failures.push(ResourceError::CubemapFace {
                        face,
                        path: path.clone(),
                        source,
                    });
                    decoded.push(None);
                }
            }
        }
        Self::assemble(decoded, failures)
    }

    fn assemble(decoded: Vec<Option<DecodedImage>>, failures: Vec<ResourceError>) -> Self {
        let size = decoded
            .iter()
            .flatten()
            .next()
            .map(|image| image.width.max(image.height))
            .unwrap_or(1);
        let faces = decoded
            .into_iter()
            .zip(SKYBOX_FACE_NAMES)
            .map(|(image, face)| match image {
                Some(image) if image.width == size && image.height == size => image,
                Some(image) => {
                    warn!(
                        "cubemap face {face} is {}x{}, resampling to {size}x{size}",
                        image.width, image.height
                    );
                    image.resized(size, size)
                }
                None => DecodedImage::solid(size, size, MISSING_FACE_COLOR),
            })
            .collect();
        Self {
            size,
            faces,
            failures,
        }
    }
}

/// A sampled GPU texture and its default view.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    /// Uploads `image` with a full mip chain.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DecodedImage,
        label: &str,
    ) -> Self {
        let levels = image.mip_chain();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_level_count(image.width, image.height),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (level, data) in levels.iter().enumerate() {
            write_layer(queue, &texture, data, level as u32, 0);
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        info!(
            "Created texture '{label}' ({}x{}, {} mips)",
            image.width,
            image.height,
            levels.len()
        );
        Self { texture, view }
    }

    /// Decodes and uploads `path`. On failure a 1x1 `fallback` texel is
    /// uploaded instead and the decode error is handed back for reporting.
    pub fn load_or(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        fallback: [u8; 4],
    ) -> (Self, Option<ResourceError>) {
        let label = path.display().to_string();
        match DecodedImage::decode(path) {
            Ok(image) => (Self::from_image(device, queue, &image, &label), None),
            Err(source) => {
                let placeholder = DecodedImage::solid(1, 1, fallback);
                let error = ResourceError::TextureDecode {
                    path: path.to_path_buf(),
                    source,
                };
                (Self::from_image(device, queue, &placeholder, &label), Some(error))
            }
        }
    }

    /// 1x1 texture of a single color.
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, color: [u8; 4], label: &str) -> Self {
        Self::from_image(device, queue, &DecodedImage::solid(1, 1, color), label)
    }

    pub fn cubemap(device: &wgpu::Device, queue: &wgpu::Queue, faces: &CubemapFaces) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("skybox-cubemap"),
            size: wgpu::Extent3d {
                width: faces.size,
                height: faces.size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, face) in faces.faces.iter().enumerate() {
            write_layer(queue, &texture, face, 0, layer as u32);
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        info!("Skybox cubemap uploaded: {0}x{0}, 6 faces", faces.size);
        Self { texture, view }
    }
}

fn write_layer(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    image: &DecodedImage,
    mip_level: u32,
    layer: u32,
) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        &image.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.width * 4),
            rows_per_image: Some(image.height),
        },
        wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_count_matches_largest_dimension() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(640, 480), 10);
    }

    #[test]
    fn mip_chain_halves_to_one_texel() {
        let image = DecodedImage::solid(8, 4, [10, 20, 30, 255]);
        let chain = image.mip_chain();
        let sizes: Vec<_> = chain.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
        assert_eq!(chain.len() as u32, mip_level_count(8, 4));
        assert_eq!(chain[3].pixels, vec![10, 20, 30, 255]);
    }

    #[test]
    fn missing_faces_become_placeholders() {
        let mut decoded = vec![None; 6];
        decoded[1] = Some(DecodedImage::solid(4, 4, [0, 0, 255, 255]));
        let faces = CubemapFaces::assemble(decoded, Vec::new());
        assert_eq!(faces.size, 4);
        assert_eq!(faces.faces.len(), 6);
        assert_eq!(&faces.faces[0].pixels[..4], &MISSING_FACE_COLOR);
        assert_eq!(&faces.faces[1].pixels[..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn mismatched_faces_are_resampled() {
        let mut decoded = vec![Some(DecodedImage::solid(4, 4, [1, 2, 3, 255])); 6];
        decoded[5] = Some(DecodedImage::solid(8, 8, [9, 9, 9, 255]));
        let faces = CubemapFaces::assemble(decoded, Vec::new());
        assert_eq!((faces.faces[5].width, faces.faces[5].height), (4, 4));
        assert_eq!(faces.faces[5].pixels.len(), 4 * 4 * 4);
    }

    #[test]
    fn unreadable_paths_are_reported_per_face() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SKYBOX_FACE_NAMES.map(|face| dir.path().join(format!("{face}.png")));
        let faces = CubemapFaces::load(&paths);
        assert_eq!(faces.failures.len(), 6);
        assert_eq!(faces.size, 1);
        assert!(faces.failures.iter().all(|err| !err.is_fatal()));
    }

    #[test]
    fn decodes_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wood.png");
        RgbaImage::from_pixel(3, 2, image::Rgba([200, 100, 50, 255]))
            .save(&path)
            .unwrap();
        let image = DecodedImage::decode(&path).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(&image.pixels[..4], &[200, 100, 50, 255]);
    }
}
