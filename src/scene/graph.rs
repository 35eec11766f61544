//! Scene graph container and topology bookkeeping
//!
//! The [`SceneGraph`] is the authoritative owner of all logical scene data:
//! nodes, vertices, faces, lights, and the vertex-to-node ownership table.
//! The GPU pipeline only ever holds a mirrored, uploadable copy of it.
//!
//! Two revision counters drive buffer management. `topology_revision`
//! changes whenever any collection changes length, which forces the
//! compute stage to reallocate its topology-sized buffers.
//! `content_revision` changes on every mutation and tells the pipeline
//! that buffer contents must be re-uploaded.

use super::light::Light;
use super::mesh::{Face, Mesh, Vertex};
use super::node::{MeshId, Node, NodeId, Transform};
use thiserror::Error;

/// Maximum parent-chain depth the transform kernel will walk.
/// Kept in sync with `MAX_PARENT_DEPTH` in `gpu/shaders/scene_compute.wgsl`.
pub const MAX_PARENT_DEPTH: u32 = 32;

/// Authoritative vertex/face counts used to decide buffer (re)allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneCounts {
    pub num_vertices: u32,
    pub num_faces: u32,
}

/// Topology inconsistencies detected before upload
///
/// Any of these skips the frame's compute dispatch rather than letting a
/// kernel index out of range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("vertex-to-node table has {actual} entries for {expected} vertices")]
    LinkTableLength { expected: usize, actual: usize },
    #[error("vertex {vertex} is linked to node {node}, but only {num_nodes} nodes exist")]
    LinkTargetOutOfRange {
        vertex: usize,
        node: u32,
        num_nodes: usize,
    },
    #[error("face {face} references vertex {index}, but only {num_vertices} vertices exist")]
    FaceIndexOutOfRange {
        face: usize,
        index: u32,
        num_vertices: usize,
    },
    #[error("node {node} has parent {parent}, but only {num_nodes} nodes exist")]
    ParentOutOfRange {
        node: NodeId,
        parent: NodeId,
        num_nodes: usize,
    },
    #[error("parent chain of node {node} exceeds depth {max_depth} (cycle?)")]
    ParentChainTooDeep { node: NodeId, max_depth: u32 },
}

/// Owning container for all logical scene data
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    lights: Vec<Light>,
    /// Vertex index -> owning node index, one entry per vertex
    link: Vec<u32>,
    next_mesh_id: MeshId,
    topology_revision: u64,
    content_revision: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // --- read access (consumed by the compute stage each frame) ---

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Vertex-to-node ownership table (one node index per vertex)
    pub fn vertex_links(&self) -> &[u32] {
        &self.link
    }

    pub fn counts(&self) -> SceneCounts {
        SceneCounts {
            num_vertices: self.vertices.len() as u32,
            num_faces: self.faces.len() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.lights.is_empty()
    }

    /// Bumped whenever any collection changes length
    pub fn topology_revision(&self) -> u64 {
        self.topology_revision
    }

    /// Bumped on every mutation, including transform edits
    pub fn content_revision(&self) -> u64 {
        self.content_revision
    }

    // --- mutation (only ever performed by the active scheme) ---

    /// Instantiates a mesh as a new node and returns its id
    ///
    /// The mesh's vertices and faces are appended to the scene with face
    /// indices rebased, and every new vertex is linked to the new node.
    pub fn add_object(&mut self, name: impl Into<String>, mesh: &Mesh, transform: Transform) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        let vertex_base = self.vertices.len() as u32;
        let mesh_id = self.next_mesh_id;
        self.next_mesh_id += 1;

        self.nodes.push(Node::new(name, transform, mesh_id));
        self.vertices.extend_from_slice(&mesh.vertices);
        self.link.extend(std::iter::repeat(node_id).take(mesh.vertices.len()));
        self.faces.extend(mesh.faces.iter().map(|f| Face {
            a: f.a + vertex_base,
            b: f.b + vertex_base,
            c: f.c + vertex_base,
        }));

        self.touch_topology();
        node_id
    }

    /// Like [`add_object`](Self::add_object), parented under an existing node
    pub fn add_child_object(
        &mut self,
        name: impl Into<String>,
        mesh: &Mesh,
        transform: Transform,
        parent: NodeId,
    ) -> NodeId {
        let id = self.add_object(name, mesh, transform);
        self.nodes[id as usize].parent = Some(parent);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// Mutable node access; marks scene contents dirty
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.content_revision += 1;
        self.nodes.get_mut(id as usize)
    }

    /// Removes a node together with its vertices and faces
    ///
    /// Children of the removed node are reparented to its parent. Returns
    /// false if the id is out of range.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if (id as usize) >= self.nodes.len() {
            return false;
        }
        let removed = self.nodes.remove(id as usize);

        // Remap surviving vertices and drop the removed node's.
        let mut vertex_remap = vec![u32::MAX; self.vertices.len()];
        let mut kept_vertices = Vec::with_capacity(self.vertices.len());
        let mut kept_link = Vec::with_capacity(self.link.len());
        for (v, (&vertex, &owner)) in self.vertices.iter().zip(&self.link).enumerate() {
            if owner == id {
                continue;
            }
            vertex_remap[v] = kept_vertices.len() as u32;
            kept_vertices.push(vertex);
            kept_link.push(if owner > id { owner - 1 } else { owner });
        }
        self.vertices = kept_vertices;
        self.link = kept_link;

        // Faces survive only if all three corners survived.
        self.faces.retain_mut(|face| {
            let [a, b, c] = face.indices().map(|i| vertex_remap[i as usize]);
            if a == u32::MAX || b == u32::MAX || c == u32::MAX {
                return false;
            }
            *face = Face { a, b, c };
            true
        });

        // Fix parent links: children of the removed node move up a level.
        for node in &mut self.nodes {
            node.parent = match node.parent {
                Some(p) if p == id => removed.parent.map(|rp| if rp > id { rp - 1 } else { rp }),
                Some(p) if p > id => Some(p - 1),
                other => other,
            };
        }

        self.touch_topology();
        true
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.touch_topology();
        self.lights.len() - 1
    }

    /// Mutable light access; marks scene contents dirty
    pub fn light_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.content_revision += 1;
        self.lights.get_mut(index)
    }

    pub fn remove_light(&mut self, index: usize) -> Option<Light> {
        if index >= self.lights.len() {
            return None;
        }
        let light = self.lights.remove(index);
        self.touch_topology();
        Some(light)
    }

    /// Removes everything, leaving an empty scene
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.vertices.clear();
        self.faces.clear();
        self.lights.clear();
        self.link.clear();
        self.touch_topology();
    }

    /// Checks every topology invariant the kernels rely on
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.link.len() != self.vertices.len() {
            return Err(SceneError::LinkTableLength {
                expected: self.vertices.len(),
                actual: self.link.len(),
            });
        }
        let num_nodes = self.nodes.len();
        for (vertex, &node) in self.link.iter().enumerate() {
            if node as usize >= num_nodes {
                return Err(SceneError::LinkTargetOutOfRange {
                    vertex,
                    node,
                    num_nodes,
                });
            }
        }
        let num_vertices = self.vertices.len();
        for (i, face) in self.faces.iter().enumerate() {
            for index in face.indices() {
                if index as usize >= num_vertices {
                    return Err(SceneError::FaceIndexOutOfRange {
                        face: i,
                        index,
                        num_vertices,
                    });
                }
            }
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                if parent as usize >= num_nodes {
                    return Err(SceneError::ParentOutOfRange {
                        node: i as NodeId,
                        parent,
                        num_nodes,
                    });
                }
            }
            // Bounded walk up the chain; anything deeper than the kernel
            // will follow is rejected here.
            let mut current = node.parent;
            let mut depth = 0;
            while let Some(p) = current {
                depth += 1;
                if depth > MAX_PARENT_DEPTH {
                    return Err(SceneError::ParentChainTooDeep {
                        node: i as NodeId,
                        max_depth: MAX_PARENT_DEPTH,
                    });
                }
                current = self.nodes.get(p as usize).and_then(|n| n.parent);
            }
        }
        Ok(())
    }

    fn touch_topology(&mut self) {
        self.topology_revision += 1;
        self.content_revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_add_object_rebases_faces_and_links() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object("a", &Mesh::cube(1.0), Transform::default());
        let b = scene.add_object("b", &Mesh::cube(1.0), Transform::at(Vec3::X));

        assert_eq!(scene.counts().num_vertices, 16);
        assert_eq!(scene.counts().num_faces, 24);
        assert_eq!(scene.vertex_links()[0], a);
        assert_eq!(scene.vertex_links()[8], b);
        // second cube's faces reference the rebased range
        assert!(scene.faces()[12..].iter().all(|f| f.indices().iter().all(|&i| i >= 8)));
        scene.validate().unwrap();
    }

    #[test]
    fn test_remove_node_compacts_everything() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object("a", &Mesh::cube(1.0), Transform::default());
        let _b = scene.add_object("b", &Mesh::tetrahedron(1.0), Transform::default());

        assert!(scene.remove_node(a));
        assert_eq!(scene.counts().num_vertices, 4);
        assert_eq!(scene.counts().num_faces, 4);
        // surviving vertices now all belong to node 0
        assert!(scene.vertex_links().iter().all(|&n| n == 0));
        scene.validate().unwrap();
    }

    #[test]
    fn test_remove_node_reparents_children() {
        let mut scene = SceneGraph::new();
        let root = scene.add_object("root", &Mesh::cube(1.0), Transform::default());
        let mid = scene.add_child_object("mid", &Mesh::cube(1.0), Transform::default(), root);
        let leaf = scene.add_child_object("leaf", &Mesh::cube(1.0), Transform::default(), mid);
        assert_eq!(leaf, 2);

        assert!(scene.remove_node(mid));
        // leaf shifted down one slot and now hangs off root
        assert_eq!(scene.node(1).unwrap().parent, Some(root));
        scene.validate().unwrap();
    }

    #[test]
    fn test_revisions_distinguish_topology_from_content() {
        let mut scene = SceneGraph::new();
        let id = scene.add_object("a", &Mesh::cube(1.0), Transform::default());
        let topo = scene.topology_revision();
        let content = scene.content_revision();

        scene.node_mut(id).unwrap().transform.position.x = 2.0;
        assert_eq!(scene.topology_revision(), topo);
        assert!(scene.content_revision() > content);

        scene.add_light(Light::default());
        assert!(scene.topology_revision() > topo);
    }

    #[test]
    fn test_validate_rejects_bad_link_target() {
        let mut scene = SceneGraph::new();
        scene.add_object("a", &Mesh::triangle(1.0), Transform::default());
        scene.link[0] = 7;
        assert_eq!(
            scene.validate(),
            Err(SceneError::LinkTargetOutOfRange {
                vertex: 0,
                node: 7,
                num_nodes: 1
            })
        );
    }

    #[test]
    fn test_validate_rejects_parent_cycle() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object("a", &Mesh::triangle(1.0), Transform::default());
        let b = scene.add_child_object("b", &Mesh::triangle(1.0), Transform::default(), a);
        scene.node_mut(a).unwrap().parent = Some(b);
        assert!(matches!(
            scene.validate(),
            Err(SceneError::ParentChainTooDeep { .. })
        ));
    }

    #[test]
    fn test_clear_empties_scene() {
        let mut scene = SceneGraph::new();
        scene.add_object("a", &Mesh::cube(1.0), Transform::default());
        scene.add_light(Light::default());
        scene.clear();
        assert!(scene.is_empty());
        assert_eq!(scene.counts(), SceneCounts::default());
        scene.validate().unwrap();
    }
}
