//! Render stage: offscreen frame target, depth buffer, and the raster pass
//!
//! The stage rasterizes the post-clip triangle stream into an offscreen
//! color target that the UI layer composites as a native egui texture.
//! It owns the color and depth attachments; the scene buffers it draws
//! from are borrowed from the compute stage each frame and validated by
//! allocation epoch before any draw is issued.

use crate::gpu::compute::SceneBuffers;
use crate::gpu::config::GraphicsConfig;
use crate::gpu::error::PipelineError;
use crate::gpu::types::ClippedVertex;
use log::warn;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct RenderPipeline {
    pipeline: wgpu::RenderPipeline,
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
    clear_color: wgpu::Color,
    /// Borrowed post-clip buffers; refreshed every frame by the driver
    buffers: Option<SceneBuffers>,
    /// egui handle of the color target; None until (re)registered
    texture_id: Option<egui::TextureId>,
    /// Registration for a replaced target, freed on the next register
    retired_texture_id: Option<egui::TextureId>,
}

impl RenderPipeline {
    /// Creates the raster pipeline state and an initial 1x1 frame target
    pub fn new(device: &wgpu::Device) -> Result<Self, PipelineError> {
        let config = GraphicsConfig::global();
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Render Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene_render.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Render Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[ClippedVertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(config.color_target_state())],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // faces are lit double-sided, so nothing is culled here
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: config.multisample_state(),
            multiview: None,
            cache: None,
        });

        let (color_texture, color_view, depth_view) = Self::create_targets(device, 1, 1);
        Ok(Self {
            pipeline,
            color_texture,
            color_view,
            depth_view,
            width: 1,
            height: 1,
            clear_color: wgpu::Color {
                r: 0.016,
                g: 0.016,
                b: 0.02,
                a: 1.0,
            },
            buffers: None,
            texture_id: None,
            retired_texture_id: None,
        })
    }

    /// Frame target size in physical pixels
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Recreates the color and depth attachments when the viewport size
    /// changes; the egui registration is renewed on the next frame
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.width && height == self.height {
            return;
        }
        let (color_texture, color_view, depth_view) = Self::create_targets(device, width, height);
        self.color_texture = color_texture;
        self.color_view = color_view;
        self.depth_view = depth_view;
        self.width = width;
        self.height = height;
        self.retired_texture_id = self.texture_id.take();
    }

    /// Receives the borrowed post-clip buffers for this frame
    pub fn set_buffers(&mut self, buffers: SceneBuffers) {
        self.buffers = Some(buffers);
    }

    /// Exposes the color target to the UI layer, re-registering after a
    /// resize. Returns the texture id the viewport panel should display.
    pub fn register_texture(
        &mut self,
        device: &wgpu::Device,
        renderer: &mut egui_wgpu::Renderer,
    ) -> egui::TextureId {
        if let Some(id) = self.texture_id {
            return id;
        }
        if let Some(old) = self.retired_texture_id.take() {
            renderer.free_texture(&old);
        }
        let id = renderer.register_native_texture(device, &self.color_view, wgpu::FilterMode::Linear);
        self.texture_id = Some(id);
        id
    }

    /// Clears the frame target and rasterizes the clipped scene into it
    ///
    /// A zero-face scene presents a cleared frame (the indirect index
    /// count is zero). Buffers from a stale allocation epoch are never
    /// drawn; the frame stays cleared and the mismatch is reported.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        current_epoch: u64,
    ) -> Result<(), PipelineError> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Render Encoder"),
        });

        let draw = match &self.buffers {
            Some(buffers) if buffers.epoch == current_epoch => Some(buffers),
            Some(buffers) => {
                warn!(
                    "render stage holds buffers from epoch {}, current is {}; skipping draw",
                    buffers.epoch, current_epoch
                );
                None
            }
            None => None,
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(buffers) = draw {
                pass.set_pipeline(&self.pipeline);
                pass.set_vertex_buffer(0, buffers.vertices.slice(..));
                pass.set_index_buffer(buffers.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed_indirect(&buffers.draw_args, 0);
            }
        }
        queue.submit(std::iter::once(encoder.finish()));

        match &self.buffers {
            Some(buffers) if buffers.epoch != current_epoch => Err(PipelineError::StaleBuffers {
                expected: current_epoch,
                got: buffers.epoch,
            }),
            _ => Ok(()),
        }
    }

    /// Blocking readback of the color target as tightly packed RGBA8 rows
    pub fn read_color(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<u8>, PipelineError> {
        let bytes_per_row = (self.width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Readback Buffer"),
            size: bytes_per_row as u64 * self.height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            self.color_texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = std::sync::mpsc::channel();
        staging.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            _ => return Err(PipelineError::Readback),
        }

        let mapped = staging.slice(..).get_mapped_range();
        let mut pixels = Vec::with_capacity((self.width * self.height * 4) as usize);
        for row in 0..self.height {
            let start = (row * bytes_per_row) as usize;
            pixels.extend_from_slice(&mapped[start..start + (self.width * 4) as usize]);
        }
        Ok(pixels)
    }

    fn create_targets(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView, wgpu::TextureView) {
        let config = GraphicsConfig::global();
        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Color Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: config.texture_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Depth Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        (color_texture, color_view, depth_view)
    }
}
