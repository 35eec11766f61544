//! Pipeline error taxonomy

use crate::scene::SceneError;
use thiserror::Error;

/// Errors surfaced by the compute/render stages and the frame driver
///
/// Startup variants are fatal: the application must not enter the frame
/// loop without valid pipeline state. Per-frame variants degrade a single
/// frame (the dispatch is skipped and the previous frame's buffers are
/// rendered again).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("wgpu render state unavailable (is the wgpu backend enabled?)")]
    NoRenderState,

    #[error("device limits exceeded: {what} needs {required} bytes, limit is {limit}")]
    BufferTooLarge {
        what: &'static str,
        required: u64,
        limit: u64,
    },

    #[error("scene rejected: {0}")]
    InvalidScene(#[from] SceneError),

    #[error("{what} outgrew their allocation ({required} > {capacity}); a reset was required")]
    CapacityExceeded {
        what: &'static str,
        required: u32,
        capacity: u32,
    },

    #[error("buffer readback failed")]
    Readback,

    #[error("render stage received buffers from epoch {got}, current epoch is {expected}")]
    StaleBuffers { expected: u64, got: u64 },
}
