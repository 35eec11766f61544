//! POD mirror types uploaded to (or read back from) GPU buffers
//!
//! Field order and padding are dictated by the WGSL struct layouts in
//! `shaders/scene_compute.wgsl`; the size assertions at the bottom guard
//! against drift.

use crate::scene::{Face, Light, Node, Vertex};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::mem;

/// Node transform as the transform kernel consumes it
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct GpuNode {
    /// Rotation quaternion (x, y, z, w)
    pub rotation: [f32; 4],
    pub position: [f32; 3],
    /// Parent node index, -1 for root nodes
    pub parent: i32,
    pub scale: [f32; 3],
    pub _pad: u32,
}

impl From<&Node> for GpuNode {
    fn from(node: &Node) -> Self {
        Self {
            rotation: node.transform.rotation.to_array(),
            position: node.transform.position.to_array(),
            parent: node.parent.map_or(-1, |p| p as i32),
            scale: node.transform.scale.to_array(),
            _pad: 0,
        }
    }
}

/// Model-space vertex position (w = 1)
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 4],
}

impl From<&Vertex> for GpuVertex {
    fn from(vertex: &Vertex) -> Self {
        Self {
            position: vertex.position.extend(1.0).to_array(),
        }
    }
}

/// Triangle corner indices
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct GpuFace {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub _pad: u32,
}

impl From<&Face> for GpuFace {
    fn from(face: &Face) -> Self {
        Self {
            a: face.a,
            b: face.b,
            c: face.c,
            _pad: 0,
        }
    }
}

/// Point light as the lighting kernel consumes it
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct GpuLight {
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub _pad: f32,
}

impl From<&Light> for GpuLight {
    fn from(light: &Light) -> Self {
        Self {
            position: light.position.to_array(),
            intensity: light.intensity,
            color: light.color.to_array(),
            _pad: 0.0,
        }
    }
}

/// Camera matrices, bound as a uniform to the projection kernel
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub position: [f32; 4],
}

impl CameraUniform {
    pub fn new(view: Mat4, proj: Mat4, position: glam::Vec3) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            position: position.extend(1.0).to_array(),
        }
    }
}

/// Element counts of the uploaded scene, bound as a uniform to every kernel
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct SceneParams {
    pub num_nodes: u32,
    pub num_vertices: u32,
    pub num_faces: u32,
    pub num_lights: u32,
}

/// Post-clip counters, written by the clipping kernel via atomics
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ClipCounts {
    pub clipped_vertices: u32,
    pub clipped_faces: u32,
}

/// `draw_indexed_indirect` argument block, filled in by the clipping kernel
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct DrawIndexedArgs {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

/// Per-face lighting result (normal kept for diagnostics)
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct LitFace {
    pub normal: [f32; 4],
    pub color: [f32; 4],
}

/// Post-clip vertex stream handed to the render stage
///
/// Positions are already in clip space, so the render shader is a pure
/// passthrough.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub struct ClippedVertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

impl ClippedVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x4,
        },
    ];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ClippedVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Transform;
    use glam::Vec3;

    #[test]
    fn test_struct_sizes_match_shader_layout() {
        assert_eq!(mem::size_of::<GpuNode>(), 48);
        assert_eq!(mem::size_of::<GpuVertex>(), 16);
        assert_eq!(mem::size_of::<GpuFace>(), 16);
        assert_eq!(mem::size_of::<GpuLight>(), 32);
        assert_eq!(mem::size_of::<CameraUniform>(), 144);
        assert_eq!(mem::size_of::<SceneParams>(), 16);
        assert_eq!(mem::size_of::<ClipCounts>(), 8);
        assert_eq!(mem::size_of::<DrawIndexedArgs>(), 20);
        assert_eq!(mem::size_of::<LitFace>(), 32);
        assert_eq!(mem::size_of::<ClippedVertex>(), 32);
    }

    #[test]
    fn test_gpu_node_encodes_missing_parent_as_negative() {
        let node = Node::new("n", Transform::at(Vec3::X), 0);
        let gpu = GpuNode::from(&node);
        assert_eq!(gpu.parent, -1);
        assert_eq!(gpu.position, [1.0, 0.0, 0.0]);
        assert_eq!(gpu.scale, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_vertex_upload_sets_unit_w() {
        let gpu = GpuVertex::from(&Vertex::new(1.0, 2.0, 3.0));
        assert_eq!(gpu.position, [1.0, 2.0, 3.0, 1.0]);
    }
}
