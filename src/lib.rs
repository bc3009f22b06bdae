//! Building blocks for the PET SIMS demo: a fly camera, light parameters,
//! scene configuration and a wgpu renderer that draws the scene offscreen
//! before blitting it to the window.
//!
//! Everything except [`render`] and [`app`] is plain data and math, so the
//! camera, input and configuration layers can be exercised without a GPU.

pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod input;
pub mod lighting;
pub mod obj;
pub mod render;
pub mod scene;
pub mod texture;

pub use camera::{Camera, CameraMovement};
pub use config::AppConfig;
pub use error::ResourceError;
pub use frame::{FrameClock, FrameStage};
pub use input::{InputState, KeyCode, NamedKey};
pub use lighting::{DirectionalLight, PointLight};
pub use obj::{load_obj, load_obj_from_str, ObjMesh, ObjModel};
pub use render::Renderer;
pub use scene::{Drawable, FrameTransforms, Placement, Rotation};
