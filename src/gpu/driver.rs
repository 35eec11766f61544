//! Per-frame orchestration of the compute and render stages
//!
//! One `frame()` call walks the fixed sequence: dirty check -> optional
//! static reset -> dynamic reset -> compute -> buffer handoff -> render.
//! The static reset only happens when the scene's element counts no
//! longer match the current allocations; everything else runs every
//! frame.
//!
//! Failures never cross the frame boundary silently: the returned
//! [`FrameReport`] carries what happened, and a frame whose dispatch was
//! refused (invalid scene, exhausted allocation) re-renders from the
//! buffers of the last good frame instead of drawing garbage. Retrying is
//! the caller's job; the driver simply runs the same sequence again next
//! frame.

use crate::camera::Camera;
use crate::gpu::compute::ComputePipeline;
use crate::gpu::error::PipelineError;
use crate::gpu::render::RenderPipeline;
use crate::scene::SceneGraph;
use log::{error, warn};

/// What a single driven frame did
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Compute chain was dispatched this frame
    pub computed: bool,
    /// Topology-sized buffers were reallocated this frame
    pub static_reset: bool,
    /// Why compute was skipped, if it was
    pub skipped: Option<String>,
}

pub struct PipelineDriver {
    compute: ComputePipeline,
    render: RenderPipeline,
}

impl PipelineDriver {
    /// Builds both stages; any failure here is a startup failure and the
    /// caller must not enter the frame loop
    pub fn new(device: &wgpu::Device) -> Result<Self, PipelineError> {
        Ok(Self {
            compute: ComputePipeline::new(device)?,
            render: RenderPipeline::new(device)?,
        })
    }

    pub fn compute_pipeline(&self) -> &ComputePipeline {
        &self.compute
    }

    pub fn render_pipeline_mut(&mut self) -> &mut RenderPipeline {
        &mut self.render
    }

    /// Runs one frame of the pipeline state machine
    pub fn frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneGraph,
        camera: &Camera,
        viewport: (u32, u32),
    ) -> FrameReport {
        let mut report = FrameReport::default();
        self.render.resize(device, viewport.0, viewport.1);

        match self.prepare_and_compute(device, queue, scene, camera, &mut report) {
            Ok(()) => {
                report.computed = true;
            }
            Err(err) => {
                warn!("frame compute skipped: {err}");
                report.skipped = Some(err.to_string());
            }
        }

        // Handoff happens every frame, even after a skipped compute: the
        // handles then still point at the last good frame's data.
        self.render.set_buffers(self.compute.scene_buffers());
        if let Err(err) = self.render.render(device, queue, self.compute.epoch()) {
            error!("render stage failed: {err}");
            report.skipped.get_or_insert_with(|| err.to_string());
        }
        report
    }

    fn prepare_and_compute(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneGraph,
        camera: &Camera,
        report: &mut FrameReport,
    ) -> Result<(), PipelineError> {
        scene.validate()?;

        if self.compute.needs_static_reset(scene) {
            if scene.is_empty() {
                self.compute.set_empty_buffers(device);
            } else {
                self.compute.reset_static_buffers(device, scene)?;
            }
            report.static_reset = true;
        }
        self.compute.reset_dynamic_buffers(device, scene)?;
        self.compute.compute(device, queue, scene, camera)
    }
}
