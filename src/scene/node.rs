//! Scene node types and transforms

use glam::{Mat4, Quat, Vec3};

/// Unique identifier for a scene node (index into the scene's node list)
pub type NodeId = u32;

/// Identifier of the mesh a node was instantiated from
pub type MeshId = u32;

/// Position / orientation / scale of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Creates a transform at the given position with identity rotation and unit scale
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Local transform matrix (scale, then rotate, then translate)
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// One entity in the scene graph
///
/// Nodes own a transform and reference the mesh they were built from. The
/// vertices instantiated for a node are linked back to it through the
/// scene's vertex-to-node table, which is what the transform kernel uses
/// to resolve ownership.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub mesh: MeshId,
    /// Parent node, if any. Parent transforms compose onto this node's.
    pub parent: Option<NodeId>,
}

impl Node {
    /// Creates a new root-level node
    pub fn new(name: impl Into<String>, transform: Transform, mesh: MeshId) -> Self {
        Self {
            name: name.into(),
            transform,
            mesh,
            parent: None,
        }
    }

    /// Sets the parent link
    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }
}
