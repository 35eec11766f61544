//! Compute stage: GPU-resident scene buffers and the per-frame kernel chain
//!
//! The stage owns two families of buffers. Static buffers are sized by
//! scene topology (node/vertex/face/light counts plus the vertex-to-node
//! table) and are only reallocated when topology changes. Dynamic buffers
//! hold the derived per-frame results (world/projected vertices, lit
//! faces, the compacted post-clip stream) and are sized by the *pre-clip
//! maximum* bound, since clipping can only reduce counts.
//!
//! [`ComputePipeline::compute`] encodes the six kernels back to back in a
//! single compute pass, which gives each dispatch visibility of its
//! predecessor's writes. It never allocates; the driver performs any
//! required reset beforehand.

use crate::camera::Camera;
use crate::gpu::error::PipelineError;
use crate::gpu::types::{
    CameraUniform, ClipCounts, ClippedVertex, DrawIndexedArgs, GpuFace, GpuLight, GpuNode,
    GpuVertex, LitFace, SceneParams,
};
use crate::scene::SceneGraph;
use std::mem;

const WORKGROUP_SIZE: u32 = 64;

/// Binding slot numbers, shared with `shaders/scene_compute.wgsl`
mod slot {
    pub const PARAMS: u32 = 0;
    pub const CAMERA: u32 = 1;
    pub const NODES: u32 = 2;
    pub const VERTICES: u32 = 3;
    pub const FACES: u32 = 4;
    pub const LIGHTS: u32 = 5;
    pub const VERTEX_LINKS: u32 = 6;
    pub const WORLD_MATRICES: u32 = 7;
    pub const WORLD_VERTICES: u32 = 8;
    pub const PROJECTED_VERTICES: u32 = 9;
    pub const LIT_FACES: u32 = 10;
    pub const CLIPPED_VERTICES: u32 = 11;
    pub const CLIPPED_INDICES: u32 = 12;
    pub const COUNTS: u32 = 13;
    pub const DRAW_ARGS: u32 = 14;
}

/// Slot lists per kernel; every kernel stays within the default
/// storage-buffers-per-stage limit because it only binds what it reads
/// or writes.
const RESET_SLOTS: &[u32] = &[slot::COUNTS, slot::DRAW_ARGS];
const TRANSFORM_SLOTS: &[u32] = &[slot::PARAMS, slot::NODES, slot::WORLD_MATRICES];
const VERTEX_SLOTS: &[u32] = &[
    slot::PARAMS,
    slot::VERTICES,
    slot::VERTEX_LINKS,
    slot::WORLD_MATRICES,
    slot::WORLD_VERTICES,
];
const PROJECT_SLOTS: &[u32] = &[
    slot::PARAMS,
    slot::CAMERA,
    slot::WORLD_VERTICES,
    slot::PROJECTED_VERTICES,
];
const LIGHT_SLOTS: &[u32] = &[
    slot::PARAMS,
    slot::FACES,
    slot::LIGHTS,
    slot::WORLD_VERTICES,
    slot::LIT_FACES,
];
const CLIP_SLOTS: &[u32] = &[
    slot::PARAMS,
    slot::FACES,
    slot::PROJECTED_VERTICES,
    slot::LIT_FACES,
    slot::CLIPPED_VERTICES,
    slot::CLIPPED_INDICES,
    slot::COUNTS,
    slot::DRAW_ARGS,
];

/// Non-owning handles to the post-clip buffers, handed to the render stage
///
/// The underlying allocations stay owned by the compute stage. `epoch`
/// identifies the allocation generation; the render stage refuses to draw
/// from an epoch older than the compute stage's current one.
#[derive(Debug, Clone)]
pub struct SceneBuffers {
    pub vertices: wgpu::Buffer,
    pub indices: wgpu::Buffer,
    pub draw_args: wgpu::Buffer,
    pub epoch: u64,
}

/// Readback of the derived buffers, used by the stats panel and tests
#[derive(Debug, Clone, Default)]
pub struct DerivedSnapshot {
    pub counts: ClipCounts,
    pub projected: Vec<[f32; 4]>,
    pub lit: Vec<LitFace>,
    pub clipped: Vec<ClippedVertex>,
}

/// One fixed-function kernel: its pipeline, layout and cached bind group
struct Kernel {
    label: &'static str,
    slots: &'static [u32],
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
}

/// Element capacities the static buffers were last allocated for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StaticCapacity {
    nodes: u32,
    vertices: u32,
    faces: u32,
    lights: u32,
}

/// Element capacities of the dynamic buffers (pre-clip maximum bound)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DynamicCapacity {
    vertices: u32,
    faces: u32,
}

pub struct ComputePipeline {
    kernels: [Kernel; 6],

    params_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,

    // static buffers, sized by topology
    node_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    face_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    link_buffer: wgpu::Buffer,
    world_matrix_buffer: wgpu::Buffer,

    // dynamic buffers, derived every frame
    world_vertex_buffer: wgpu::Buffer,
    projected_vertex_buffer: wgpu::Buffer,
    lit_face_buffer: wgpu::Buffer,
    clipped_vertex_buffer: wgpu::Buffer,
    clipped_index_buffer: wgpu::Buffer,
    counts_buffer: wgpu::Buffer,
    draw_args_buffer: wgpu::Buffer,

    static_capacity: StaticCapacity,
    dynamic_capacity: DynamicCapacity,
    /// Bumped on every (re)allocation; stamped into [`SceneBuffers`]
    epoch: u64,
}

impl ComputePipeline {
    /// Creates the pipeline state for all six kernels and minimum-sized
    /// buffers. A shader or layout failure here is non-recoverable.
    pub fn new(device: &wgpu::Device) -> Result<Self, PipelineError> {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene_compute.wgsl").into()),
        });

        let kernels = [
            Self::create_kernel(device, &module, "reset_counts", RESET_SLOTS),
            Self::create_kernel(device, &module, "compute_transforms", TRANSFORM_SLOTS),
            Self::create_kernel(device, &module, "compute_vertices", VERTEX_SLOTS),
            Self::create_kernel(device, &module, "project_vertices", PROJECT_SLOTS),
            Self::create_kernel(device, &module, "light_faces", LIGHT_SLOTS),
            Self::create_kernel(device, &module, "clip_faces", CLIP_SLOTS),
        ];

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Params Buffer"),
            size: mem::size_of::<SceneParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let counts_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Clip Counts Buffer"),
            size: mem::size_of::<ClipCounts>() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let draw_args_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Indirect Draw Args Buffer"),
            size: mem::size_of::<DrawIndexedArgs>() as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::INDIRECT
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let empty = StaticCapacity::default();
        let mut pipeline = Self {
            kernels,
            params_buffer,
            camera_buffer,
            node_buffer: Self::storage_buffer(device, "Node Buffer", 1, mem::size_of::<GpuNode>(), wgpu::BufferUsages::empty()),
            vertex_buffer: Self::storage_buffer(device, "Vertex Buffer", 1, mem::size_of::<GpuVertex>(), wgpu::BufferUsages::empty()),
            face_buffer: Self::storage_buffer(device, "Face Buffer", 1, mem::size_of::<GpuFace>(), wgpu::BufferUsages::empty()),
            light_buffer: Self::storage_buffer(device, "Light Buffer", 1, mem::size_of::<GpuLight>(), wgpu::BufferUsages::empty()),
            link_buffer: Self::storage_buffer(device, "Vertex Link Buffer", 1, mem::size_of::<u32>(), wgpu::BufferUsages::empty()),
            world_matrix_buffer: Self::storage_buffer(device, "World Matrix Buffer", 1, 64, wgpu::BufferUsages::empty()),
            world_vertex_buffer: Self::storage_buffer(device, "World Vertex Buffer", 1, 16, wgpu::BufferUsages::COPY_SRC),
            projected_vertex_buffer: Self::storage_buffer(device, "Projected Vertex Buffer", 1, 16, wgpu::BufferUsages::COPY_SRC),
            lit_face_buffer: Self::storage_buffer(device, "Lit Face Buffer", 1, mem::size_of::<LitFace>(), wgpu::BufferUsages::COPY_SRC),
            clipped_vertex_buffer: Self::storage_buffer(device, "Clipped Vertex Buffer", 3, mem::size_of::<ClippedVertex>(), wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_SRC),
            clipped_index_buffer: Self::storage_buffer(device, "Clipped Index Buffer", 3, mem::size_of::<u32>(), wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_SRC),
            counts_buffer,
            draw_args_buffer,
            static_capacity: empty,
            dynamic_capacity: DynamicCapacity::default(),
            epoch: 0,
        };
        pipeline.set_empty_buffers(device);
        Ok(pipeline)
    }

    /// Shrinks every scene-sized buffer back to its minimum allocation
    ///
    /// Called at startup and whenever topology drops to empty.
    pub fn set_empty_buffers(&mut self, device: &wgpu::Device) {
        self.allocate_static(device, StaticCapacity { nodes: 1, vertices: 1, faces: 1, lights: 1 });
        self.allocate_dynamic(device, DynamicCapacity { vertices: 1, faces: 1 });
        self.static_capacity = StaticCapacity::default();
        self.dynamic_capacity = DynamicCapacity::default();
    }

    /// Reallocates the topology-sized buffers for the given scene
    ///
    /// Only called when SceneCounts changed since the previous frame. The
    /// new buffers carry no stale data: every element is written by the
    /// upload in the next [`compute`](Self::compute) call before any
    /// kernel reads it.
    pub fn reset_static_buffers(
        &mut self,
        device: &wgpu::Device,
        scene: &SceneGraph,
    ) -> Result<(), PipelineError> {
        let capacity = StaticCapacity {
            nodes: scene.nodes().len() as u32,
            vertices: scene.counts().num_vertices,
            faces: scene.counts().num_faces,
            lights: scene.lights().len() as u32,
        };
        let limit = device.limits().max_storage_buffer_binding_size as u64;
        Self::check_limit("node buffer", capacity.nodes as u64 * mem::size_of::<GpuNode>() as u64, limit)?;
        Self::check_limit("vertex buffer", capacity.vertices as u64 * mem::size_of::<GpuVertex>() as u64, limit)?;
        Self::check_limit("face buffer", capacity.faces as u64 * mem::size_of::<GpuFace>() as u64, limit)?;
        Self::check_limit("world matrix buffer", capacity.nodes as u64 * 64, limit)?;

        self.allocate_static(
            device,
            StaticCapacity {
                nodes: capacity.nodes.max(1),
                vertices: capacity.vertices.max(1),
                faces: capacity.faces.max(1),
                lights: capacity.lights.max(1),
            },
        );
        self.static_capacity = capacity;
        Ok(())
    }

    /// Ensures the derived buffers can hold the pre-clip maximum
    ///
    /// Cheap when sizes are unchanged; reallocates (and bumps the epoch)
    /// otherwise. Clipping can only shrink counts, so the pre-clip bound
    /// sizes the allocation.
    pub fn reset_dynamic_buffers(
        &mut self,
        device: &wgpu::Device,
        scene: &SceneGraph,
    ) -> Result<(), PipelineError> {
        let counts = scene.counts();
        let capacity = DynamicCapacity {
            vertices: counts.num_vertices,
            faces: counts.num_faces,
        };
        if capacity == self.dynamic_capacity {
            return Ok(());
        }
        let limit = device.limits().max_storage_buffer_binding_size as u64;
        Self::check_limit(
            "clipped vertex buffer",
            capacity.faces as u64 * 3 * mem::size_of::<ClippedVertex>() as u64,
            limit,
        )?;
        Self::check_limit("lit face buffer", capacity.faces as u64 * mem::size_of::<LitFace>() as u64, limit)?;

        self.allocate_dynamic(
            device,
            DynamicCapacity {
                vertices: capacity.vertices.max(1),
                faces: capacity.faces.max(1),
            },
        );
        self.dynamic_capacity = capacity;
        Ok(())
    }

    /// Uploads the scene and dispatches the kernel chain in fixed order,
    /// blocking until the GPU has finished
    ///
    /// Never allocates: if the scene outgrew the buffers, the driver
    /// failed to reset first and the dispatch is refused.
    pub fn compute(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneGraph,
        camera: &Camera,
    ) -> Result<(), PipelineError> {
        let counts = scene.counts();
        let num_nodes = scene.nodes().len() as u32;
        let num_lights = scene.lights().len() as u32;
        if num_nodes > self.static_capacity.nodes
            || counts.num_vertices > self.static_capacity.vertices
            || counts.num_faces > self.static_capacity.faces
            || num_lights > self.static_capacity.lights
        {
            return Err(PipelineError::CapacityExceeded {
                what: "static scene buffers",
                required: counts.num_vertices,
                capacity: self.static_capacity.vertices,
            });
        }
        if counts.num_vertices > self.dynamic_capacity.vertices
            || counts.num_faces > self.dynamic_capacity.faces
        {
            return Err(PipelineError::CapacityExceeded {
                what: "derived scene buffers",
                required: counts.num_faces,
                capacity: self.dynamic_capacity.faces,
            });
        }

        self.upload(queue, scene, camera);
        self.ensure_bind_groups(device);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Compute Encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Scene Compute Pass"),
                timestamp_writes: None,
            });
            // reset always runs so an empty scene still presents cleanly
            self.dispatch(&mut pass, 0, 1);
            if num_nodes > 0 {
                self.dispatch(&mut pass, 1, num_nodes.div_ceil(WORKGROUP_SIZE));
            }
            if counts.num_vertices > 0 {
                let workgroups = counts.num_vertices.div_ceil(WORKGROUP_SIZE);
                self.dispatch(&mut pass, 2, workgroups);
                self.dispatch(&mut pass, 3, workgroups);
            }
            if counts.num_faces > 0 {
                let workgroups = counts.num_faces.div_ceil(WORKGROUP_SIZE);
                self.dispatch(&mut pass, 4, workgroups);
                self.dispatch(&mut pass, 5, workgroups);
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
        let _ = device.poll(wgpu::Maintain::Wait);
        Ok(())
    }

    /// Hands the post-clip buffers to the render stage without copying
    ///
    /// The handles stay valid until the next reset; the embedded epoch
    /// lets the receiver detect staleness.
    pub fn scene_buffers(&self) -> SceneBuffers {
        SceneBuffers {
            vertices: self.clipped_vertex_buffer.clone(),
            indices: self.clipped_index_buffer.clone(),
            draw_args: self.draw_args_buffer.clone(),
            epoch: self.epoch,
        }
    }

    /// Current allocation epoch
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True when the scene's element counts no longer match what the
    /// static buffers were allocated for
    pub fn needs_static_reset(&self, scene: &SceneGraph) -> bool {
        let counts = scene.counts();
        self.static_capacity
            != StaticCapacity {
                nodes: scene.nodes().len() as u32,
                vertices: counts.num_vertices,
                faces: counts.num_faces,
                lights: scene.lights().len() as u32,
            }
    }

    /// Blocking readback of the post-clip counters
    pub fn read_counts(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<ClipCounts, PipelineError> {
        let raw = self.read_buffer(device, queue, &self.counts_buffer, mem::size_of::<ClipCounts>() as u64)?;
        Ok(bytemuck::pod_read_unaligned(&raw))
    }

    /// Blocking readback of every derived buffer, for diagnostics
    pub fn snapshot_derived_buffers(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<DerivedSnapshot, PipelineError> {
        let counts = self.read_counts(device, queue)?;
        let num_vertices = self.dynamic_capacity.vertices as u64;
        let num_faces = self.dynamic_capacity.faces as u64;

        let projected = if num_vertices > 0 {
            let raw = self.read_buffer(device, queue, &self.projected_vertex_buffer, num_vertices * 16)?;
            bytemuck::pod_collect_to_vec(&raw)
        } else {
            Vec::new()
        };
        let lit = if num_faces > 0 {
            let raw = self.read_buffer(device, queue, &self.lit_face_buffer, num_faces * mem::size_of::<LitFace>() as u64)?;
            bytemuck::pod_collect_to_vec(&raw)
        } else {
            Vec::new()
        };
        let clipped = if counts.clipped_vertices > 0 {
            let raw = self.read_buffer(
                device,
                queue,
                &self.clipped_vertex_buffer,
                counts.clipped_vertices as u64 * mem::size_of::<ClippedVertex>() as u64,
            )?;
            bytemuck::pod_collect_to_vec(&raw)
        } else {
            Vec::new()
        };

        Ok(DerivedSnapshot {
            counts,
            projected,
            lit,
            clipped,
        })
    }

    // --- internals ---

    fn create_kernel(
        device: &wgpu::Device,
        module: &wgpu::ShaderModule,
        entry_point: &'static str,
        slots: &'static [u32],
    ) -> Kernel {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = slots
            .iter()
            .map(|&binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: Self::slot_binding_type(binding),
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(entry_point),
            entries: &entries,
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(entry_point),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(entry_point),
            layout: Some(&pipeline_layout),
            module,
            entry_point: Some(entry_point),
            compilation_options: Default::default(),
            cache: None,
        });
        Kernel {
            label: entry_point,
            slots,
            pipeline,
            layout,
            bind_group: None,
        }
    }

    fn slot_binding_type(binding: u32) -> wgpu::BufferBindingType {
        match binding {
            slot::PARAMS | slot::CAMERA => wgpu::BufferBindingType::Uniform,
            slot::NODES | slot::VERTICES | slot::FACES | slot::LIGHTS | slot::VERTEX_LINKS => {
                wgpu::BufferBindingType::Storage { read_only: true }
            }
            _ => wgpu::BufferBindingType::Storage { read_only: false },
        }
    }

    fn buffer_for_slot(&self, binding: u32) -> &wgpu::Buffer {
        match binding {
            slot::PARAMS => &self.params_buffer,
            slot::CAMERA => &self.camera_buffer,
            slot::NODES => &self.node_buffer,
            slot::VERTICES => &self.vertex_buffer,
            slot::FACES => &self.face_buffer,
            slot::LIGHTS => &self.light_buffer,
            slot::VERTEX_LINKS => &self.link_buffer,
            slot::WORLD_MATRICES => &self.world_matrix_buffer,
            slot::WORLD_VERTICES => &self.world_vertex_buffer,
            slot::PROJECTED_VERTICES => &self.projected_vertex_buffer,
            slot::LIT_FACES => &self.lit_face_buffer,
            slot::CLIPPED_VERTICES => &self.clipped_vertex_buffer,
            slot::CLIPPED_INDICES => &self.clipped_index_buffer,
            slot::COUNTS => &self.counts_buffer,
            slot::DRAW_ARGS => &self.draw_args_buffer,
            _ => unreachable!("unknown binding slot {binding}"),
        }
    }

    fn storage_buffer(
        device: &wgpu::Device,
        label: &str,
        elements: u64,
        element_size: usize,
        extra_usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: elements.max(1) * element_size as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST | extra_usage,
            mapped_at_creation: false,
        })
    }

    fn allocate_static(&mut self, device: &wgpu::Device, capacity: StaticCapacity) {
        self.node_buffer = Self::storage_buffer(device, "Node Buffer", capacity.nodes as u64, mem::size_of::<GpuNode>(), wgpu::BufferUsages::empty());
        self.vertex_buffer = Self::storage_buffer(device, "Vertex Buffer", capacity.vertices as u64, mem::size_of::<GpuVertex>(), wgpu::BufferUsages::empty());
        self.face_buffer = Self::storage_buffer(device, "Face Buffer", capacity.faces as u64, mem::size_of::<GpuFace>(), wgpu::BufferUsages::empty());
        self.light_buffer = Self::storage_buffer(device, "Light Buffer", capacity.lights as u64, mem::size_of::<GpuLight>(), wgpu::BufferUsages::empty());
        self.link_buffer = Self::storage_buffer(device, "Vertex Link Buffer", capacity.vertices as u64, mem::size_of::<u32>(), wgpu::BufferUsages::empty());
        self.world_matrix_buffer = Self::storage_buffer(device, "World Matrix Buffer", capacity.nodes as u64, 64, wgpu::BufferUsages::empty());
        self.invalidate_bind_groups();
    }

    fn allocate_dynamic(&mut self, device: &wgpu::Device, capacity: DynamicCapacity) {
        self.world_vertex_buffer = Self::storage_buffer(device, "World Vertex Buffer", capacity.vertices as u64, 16, wgpu::BufferUsages::COPY_SRC);
        self.projected_vertex_buffer = Self::storage_buffer(device, "Projected Vertex Buffer", capacity.vertices as u64, 16, wgpu::BufferUsages::COPY_SRC);
        self.lit_face_buffer = Self::storage_buffer(device, "Lit Face Buffer", capacity.faces as u64, mem::size_of::<LitFace>(), wgpu::BufferUsages::COPY_SRC);
        self.clipped_vertex_buffer = Self::storage_buffer(
            device,
            "Clipped Vertex Buffer",
            capacity.faces as u64 * 3,
            mem::size_of::<ClippedVertex>(),
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_SRC,
        );
        self.clipped_index_buffer = Self::storage_buffer(
            device,
            "Clipped Index Buffer",
            capacity.faces as u64 * 3,
            mem::size_of::<u32>(),
            wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_SRC,
        );
        self.invalidate_bind_groups();
    }

    fn invalidate_bind_groups(&mut self) {
        for kernel in &mut self.kernels {
            kernel.bind_group = None;
        }
        self.epoch += 1;
    }

    fn ensure_bind_groups(&mut self, device: &wgpu::Device) {
        for i in 0..self.kernels.len() {
            if self.kernels[i].bind_group.is_some() {
                continue;
            }
            let entries: Vec<wgpu::BindGroupEntry> = self.kernels[i]
                .slots
                .iter()
                .map(|&binding| wgpu::BindGroupEntry {
                    binding,
                    resource: self.buffer_for_slot(binding).as_entire_binding(),
                })
                .collect();
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(self.kernels[i].label),
                layout: &self.kernels[i].layout,
                entries: &entries,
            });
            self.kernels[i].bind_group = Some(bind_group);
        }
    }

    /// Full re-upload of the mirrored scene data; correctness baseline for
    /// any mutation the scheme performed this frame
    fn upload(&self, queue: &wgpu::Queue, scene: &SceneGraph, camera: &Camera) {
        let params = SceneParams {
            num_nodes: scene.nodes().len() as u32,
            num_vertices: scene.counts().num_vertices,
            num_faces: scene.counts().num_faces,
            num_lights: scene.lights().len() as u32,
        };
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let camera_uniform = CameraUniform::new(
            camera.view_matrix(),
            camera.projection_matrix(),
            camera.position,
        );
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera_uniform));

        let nodes: Vec<GpuNode> = scene.nodes().iter().map(GpuNode::from).collect();
        if !nodes.is_empty() {
            queue.write_buffer(&self.node_buffer, 0, bytemuck::cast_slice(&nodes));
        }
        let vertices: Vec<GpuVertex> = scene.vertices().iter().map(GpuVertex::from).collect();
        if !vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
        let faces: Vec<GpuFace> = scene.faces().iter().map(GpuFace::from).collect();
        if !faces.is_empty() {
            queue.write_buffer(&self.face_buffer, 0, bytemuck::cast_slice(&faces));
        }
        let lights: Vec<GpuLight> = scene.lights().iter().map(GpuLight::from).collect();
        if !lights.is_empty() {
            queue.write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&lights));
        }
        if !scene.vertex_links().is_empty() {
            queue.write_buffer(&self.link_buffer, 0, bytemuck::cast_slice(scene.vertex_links()));
        }
    }

    fn dispatch(&self, pass: &mut wgpu::ComputePass<'_>, kernel: usize, workgroups: u32) {
        let kernel = &self.kernels[kernel];
        if let Some(bind_group) = &kernel.bind_group {
            pass.set_pipeline(&kernel.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(workgroups.max(1), 1, 1);
        }
    }

    fn check_limit(what: &'static str, required: u64, limit: u64) -> Result<(), PipelineError> {
        if required > limit {
            return Err(PipelineError::BufferTooLarge {
                what,
                required,
                limit,
            });
        }
        Ok(())
    }

    fn read_buffer(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        buffer: &wgpu::Buffer,
        size: u64,
    ) -> Result<Vec<u8>, PipelineError> {
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Staging Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
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
        let data = staging.slice(..).get_mapped_range().to_vec();
        Ok(data)
    }
}
