//! Vantage - a GPU-accelerated 3D scene viewer and editor
//!
//! The scene graph owned by the active scheme is mirrored into GPU
//! buffers every frame, pushed through a fixed compute chain (transform,
//! project, light, clip) and rasterized into the viewport, with the
//! immediate-mode UI composited on top.

pub mod camera;
pub mod gpu;
pub mod scene;
pub mod scheme;
pub mod schemes;
pub mod viewer;

pub use camera::Camera;
pub use gpu::{PipelineDriver, PipelineError};
pub use scene::SceneGraph;
pub use scheme::{Scheme, SchemeController, SchemeKind};
pub use viewer::ViewerApp;
