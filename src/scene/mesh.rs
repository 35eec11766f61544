//! Mesh data: vertices, faces, and the primitive shapes used by the stages

use glam::Vec3;

/// A single vertex position in model space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
        }
    }
}

impl From<Vec3> for Vertex {
    fn from(position: Vec3) -> Self {
        Self { position }
    }
}

/// A triangle referencing three vertices by index (CCW winding)
///
/// The face normal is derived on the GPU from the world-space corner
/// positions, so it is not stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Face {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    /// Vertex indices in winding order
    pub fn indices(&self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }
}

/// A reusable bundle of vertices and faces that nodes are instantiated from
///
/// Face indices are local to the mesh; the scene graph rebases them when an
/// object is added.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
        Self { vertices, faces }
    }

    /// Axis-aligned cube centered at the origin
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let vertices = vec![
            Vertex::new(-h, -h, -h),
            Vertex::new(h, -h, -h),
            Vertex::new(h, h, -h),
            Vertex::new(-h, h, -h),
            Vertex::new(-h, -h, h),
            Vertex::new(h, -h, h),
            Vertex::new(h, h, h),
            Vertex::new(-h, h, h),
        ];
        let faces = vec![
            // -Z
            Face::new(0, 2, 1),
            Face::new(0, 3, 2),
            // +Z
            Face::new(4, 5, 6),
            Face::new(4, 6, 7),
            // -X
            Face::new(0, 4, 7),
            Face::new(0, 7, 3),
            // +X
            Face::new(1, 2, 6),
            Face::new(1, 6, 5),
            // -Y
            Face::new(0, 1, 5),
            Face::new(0, 5, 4),
            // +Y
            Face::new(3, 7, 6),
            Face::new(3, 6, 2),
        ];
        Self::new(vertices, faces)
    }

    /// Flat square in the XZ plane, centered at the origin
    pub fn plane(size: f32) -> Self {
        let h = size * 0.5;
        let vertices = vec![
            Vertex::new(-h, 0.0, -h),
            Vertex::new(h, 0.0, -h),
            Vertex::new(h, 0.0, h),
            Vertex::new(-h, 0.0, h),
        ];
        let faces = vec![Face::new(0, 2, 1), Face::new(0, 3, 2)];
        Self::new(vertices, faces)
    }

    /// Regular tetrahedron centered at the origin
    pub fn tetrahedron(size: f32) -> Self {
        let s = size * 0.5;
        let vertices = vec![
            Vertex::new(s, s, s),
            Vertex::new(s, -s, -s),
            Vertex::new(-s, s, -s),
            Vertex::new(-s, -s, s),
        ];
        let faces = vec![
            Face::new(0, 1, 2),
            Face::new(0, 3, 1),
            Face::new(0, 2, 3),
            Face::new(1, 3, 2),
        ];
        Self::new(vertices, faces)
    }

    /// UV sphere centered at the origin
    pub fn uv_sphere(radius: f32, rings: u32, segments: u32) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);
        let mut vertices = Vec::new();
        let mut faces = Vec::new();

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            for seg in 0..segments {
                let theta = std::f32::consts::TAU * seg as f32 / segments as f32;
                vertices.push(Vertex::new(
                    radius * phi.sin() * theta.cos(),
                    radius * phi.cos(),
                    radius * phi.sin() * theta.sin(),
                ));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let next_seg = (seg + 1) % segments;
                let i0 = ring * segments + seg;
                let i1 = ring * segments + next_seg;
                let i2 = (ring + 1) * segments + next_seg;
                let i3 = (ring + 1) * segments + seg;
                if ring > 0 {
                    faces.push(Face::new(i0, i1, i2));
                }
                if ring + 1 < rings {
                    faces.push(Face::new(i0, i2, i3));
                }
            }
        }

        Self::new(vertices, faces)
    }

    /// Single triangle in the XY plane, facing +Z
    pub fn triangle(size: f32) -> Self {
        let h = size * 0.5;
        let vertices = vec![
            Vertex::new(-h, -h, 0.0),
            Vertex::new(h, -h, 0.0),
            Vertex::new(0.0, h, 0.0),
        ];
        let faces = vec![Face::new(0, 1, 2)];
        Self::new(vertices, faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_counts() {
        let cube = Mesh::cube(1.0);
        assert_eq!(cube.vertices.len(), 8);
        assert_eq!(cube.faces.len(), 12);
    }

    #[test]
    fn test_face_indices_in_range() {
        for mesh in [
            Mesh::cube(1.0),
            Mesh::plane(2.0),
            Mesh::tetrahedron(1.0),
            Mesh::uv_sphere(1.0, 8, 12),
            Mesh::triangle(1.0),
        ] {
            let n = mesh.vertices.len() as u32;
            for face in &mesh.faces {
                for idx in face.indices() {
                    assert!(idx < n, "index {} out of range {}", idx, n);
                }
            }
        }
    }

    #[test]
    fn test_sphere_pole_rings_are_triangles() {
        let sphere = Mesh::uv_sphere(1.0, 4, 6);
        // rings+1 latitude rows of `segments` vertices each
        assert_eq!(sphere.vertices.len(), 5 * 6);
        // pole rings contribute one triangle per segment, middle rings two
        assert_eq!(sphere.faces.len(), 6 + 12 + 12 + 6);
    }
}
