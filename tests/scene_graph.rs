//! Scene graph topology invariants across editing sequences

use glam::Vec3;
use vantage::scene::{Light, Mesh, SceneGraph, Transform};

/// Counts always mirror the live collection lengths
fn assert_counts_consistent(scene: &SceneGraph) {
    let counts = scene.counts();
    assert_eq!(counts.num_vertices as usize, scene.vertices().len());
    assert_eq!(counts.num_faces as usize, scene.faces().len());
    assert_eq!(scene.vertex_links().len(), scene.vertices().len());
}

#[test]
fn editing_sequence_preserves_invariants() {
    let mut scene = SceneGraph::new();
    let meshes = [
        Mesh::cube(1.0),
        Mesh::tetrahedron(1.0),
        Mesh::uv_sphere(1.0, 6, 8),
        Mesh::plane(2.0),
    ];

    for round in 0..4 {
        for (i, mesh) in meshes.iter().enumerate() {
            scene.add_object(
                format!("object {round}-{i}"),
                mesh,
                Transform::at(Vec3::new(i as f32, round as f32, 0.0)),
            );
        }
        scene.validate().unwrap();
        assert_counts_consistent(&scene);

        // remove from the middle so everything after has to re-index
        scene.remove_node(1);
        scene.validate().unwrap();
        assert_counts_consistent(&scene);
    }
}

#[test]
fn removal_drops_exactly_the_nodes_vertices() {
    let mut scene = SceneGraph::new();
    scene.add_object("a", &Mesh::cube(1.0), Transform::default());
    scene.add_object("b", &Mesh::uv_sphere(1.0, 6, 8), Transform::default());
    scene.add_object("c", &Mesh::tetrahedron(1.0), Transform::default());
    let total = scene.counts().num_vertices;

    // the sphere owns (rings + 1) * segments = 56 vertices
    scene.remove_node(1);
    assert_eq!(scene.counts().num_vertices, total - 56);
    scene.validate().unwrap();
    assert_counts_consistent(&scene);
}

#[test]
fn topology_revision_moves_only_on_structural_edits() {
    let mut scene = SceneGraph::new();
    let id = scene.add_object("a", &Mesh::cube(1.0), Transform::default());
    scene.add_light(Light::default());

    let mut last = scene.topology_revision();
    scene.node_mut(id).unwrap().transform.position.x += 1.0;
    scene.light_mut(0).unwrap().intensity = 0.5;
    assert_eq!(scene.topology_revision(), last);

    scene.remove_light(0);
    assert!(scene.topology_revision() > last);
    last = scene.topology_revision();

    scene.remove_node(id);
    assert!(scene.topology_revision() > last);
    assert_counts_consistent(&scene);
}

#[test]
fn content_revision_moves_on_every_mutation() {
    let mut scene = SceneGraph::new();
    let id = scene.add_object("a", &Mesh::cube(1.0), Transform::default());

    let mut last = scene.content_revision();
    scene.node_mut(id).unwrap().transform.scale = Vec3::splat(2.0);
    assert!(scene.content_revision() > last);
    last = scene.content_revision();

    scene.add_light(Light::default());
    assert!(scene.content_revision() > last);
}

#[test]
fn hundred_to_fifty_vertex_shrink() {
    // scenario from the buffer-resize path: build ~100 vertices, drop to
    // half, and make sure nothing dangles
    let mut scene = SceneGraph::new();
    for i in 0..12 {
        scene.add_object(
            format!("cube {i}"),
            &Mesh::cube(0.4),
            Transform::at(Vec3::new(i as f32, 0.0, 0.0)),
        );
    }
    assert_eq!(scene.counts().num_vertices, 96);

    for _ in 0..6 {
        scene.remove_node(0);
    }
    assert_eq!(scene.counts().num_vertices, 48);
    scene.validate().unwrap();

    // every face still references live vertices
    let num_vertices = scene.counts().num_vertices;
    for face in scene.faces() {
        for index in face.indices() {
            assert!(index < num_vertices);
        }
    }
}
