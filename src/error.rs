use std::path::PathBuf;

use log::error;

/// Failures while creating or loading GPU-side resources.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("failed to create window: {0}")]
    Window(String),

    #[error("no compatible GPU adapter found")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to load texture {}: {source}", path.display())]
    TextureDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load cubemap face {face} from {}: {source}", path.display())]
    CubemapFace {
        face: &'static str,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load model {}: {message}", path.display())]
    Model { path: PathBuf, message: String },

    #[error("offscreen render target is incomplete: {reason}")]
    OffscreenIncomplete { reason: String },
}

impl ResourceError {
    /// Fatal errors abort startup; the rest degrade to a placeholder resource.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ResourceError::Window(_)
                | ResourceError::Adapter(_)
                | ResourceError::Device(_)
                | ResourceError::Surface(_)
                | ResourceError::OffscreenIncomplete { .. }
        )
    }

    /// Logs a recoverable failure and returns `Ok`, or hands a fatal one back
    /// to the caller.
    pub fn recover(self) -> Result<(), ResourceError> {
        if self.is_fatal() {
            return Err(self);
        }
        error!("{self}");
        Ok(())
    }
}
