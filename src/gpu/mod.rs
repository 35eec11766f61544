//! GPU pipeline module
//!
//! Everything wgpu lives under here: the compute stage that transforms,
//! projects, lights and clips the scene on the GPU, the render stage that
//! rasterizes the result into the viewport's frame target, and the driver
//! that sequences both once per frame.
//!
//! ## Architecture
//!
//! - [`types`] - POD buffer layouts shared with the WGSL shaders
//! - [`compute`] - scene buffers and the six-kernel compute chain
//! - [`render`] - offscreen frame target and raster pass
//! - [`driver`] - per-frame state machine tying the stages together
//! - [`config`] - shared graphics settings
//! - `shaders/` - WGSL sources for the compute chain and raster pass

pub mod compute;
pub mod config;
pub mod driver;
pub mod error;
pub mod render;
pub mod types;

pub use compute::{ComputePipeline, DerivedSnapshot, SceneBuffers};
pub use config::GraphicsConfig;
pub use driver::{FrameReport, PipelineDriver};
pub use error::PipelineError;
pub use render::RenderPipeline;
pub use types::{ClipCounts, ClippedVertex, LitFace};
