//! GPU side of the frame: pipelines, the offscreen target and the renderer
//! that records the scene, skybox and blit passes.

pub mod programs;
pub mod renderer;
pub mod shaders;
pub mod target;

pub use programs::{LitPipeline, LitProgram, ObjectTransforms};
pub use renderer::Renderer;
pub use target::OffscreenTarget;
