//! End-to-end pipeline tests against a headless device
//!
//! Every test acquires its own adapter and skips (with a note on stderr)
//! when the machine has none, so the suite stays green on CI runners
//! without GPUs.

use glam::Vec3;
use vantage::camera::Camera;
use vantage::gpu::compute::ComputePipeline;
use vantage::gpu::render::RenderPipeline;
use vantage::gpu::{PipelineDriver, PipelineError};
use vantage::scene::{Light, Mesh, SceneGraph, Transform};

fn create_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;
    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()
}

macro_rules! device_or_skip {
    () => {
        match create_device() {
            Some(pair) => pair,
            None => {
                eprintln!("skipping: no gpu adapter available");
                return;
            }
        }
    };
}

/// Camera on the +Z axis looking at the origin
fn front_camera() -> Camera {
    Camera {
        position: Vec3::new(0.0, 0.0, 5.0),
        target: Vec3::ZERO,
        ..Default::default()
    }
}

fn lit_triangle_scene() -> SceneGraph {
    let mut scene = SceneGraph::new();
    scene.add_object("tri", &Mesh::triangle(2.0), Transform::default());
    scene.add_light(Light::white(Vec3::new(0.0, 0.0, 5.0), 1.0));
    scene
}

#[test]
fn empty_scene_presents_a_cleared_frame() {
    let (device, queue) = device_or_skip!();
    let mut driver = PipelineDriver::new(&device).unwrap();
    let scene = SceneGraph::new();

    let report = driver.frame(&device, &queue, &scene, &front_camera(), (64, 64));
    assert!(report.computed, "skipped: {:?}", report.skipped);

    let counts = driver.compute_pipeline().read_counts(&device, &queue).unwrap();
    assert_eq!(counts.clipped_faces, 0);
    assert_eq!(counts.clipped_vertices, 0);

    let pixels = driver
        .render_pipeline_mut()
        .read_color(&device, &queue)
        .unwrap();
    let first = &pixels[0..4];
    assert!(pixels.chunks(4).all(|px| px == first), "frame not uniform");
    assert_eq!(first[3], 255);
}

#[test]
fn visible_triangle_is_kept_and_lit() {
    let (device, queue) = device_or_skip!();
    let mut driver = PipelineDriver::new(&device).unwrap();
    let scene = lit_triangle_scene();

    let report = driver.frame(&device, &queue, &scene, &front_camera(), (64, 64));
    assert!(report.computed, "skipped: {:?}", report.skipped);
    assert!(report.static_reset);

    let snapshot = driver
        .compute_pipeline()
        .snapshot_derived_buffers(&device, &queue)
        .unwrap();
    assert_eq!(snapshot.counts.clipped_faces, 1);
    assert_eq!(snapshot.counts.clipped_vertices, 3);

    // the light in front of the face must contribute beyond the ambient
    // floor
    let lit = snapshot.lit[0].color;
    assert!(lit[0] > 0.2, "face barely lit: {lit:?}");

    // the rasterized triangle covers the frame center
    let pixels = driver
        .render_pipeline_mut()
        .read_color(&device, &queue)
        .unwrap();
    let center = 4 * (32 * 64 + 32);
    let corner = &pixels[0..4];
    assert_ne!(&pixels[center..center + 4], corner, "triangle not drawn");
}

#[test]
fn triangle_behind_the_camera_is_discarded() {
    let (device, queue) = device_or_skip!();
    let mut driver = PipelineDriver::new(&device).unwrap();

    let mut scene = SceneGraph::new();
    scene.add_object(
        "tri",
        &Mesh::triangle(2.0),
        Transform::at(Vec3::new(0.0, 0.0, 10.0)),
    );
    scene.add_light(Light::default());

    let report = driver.frame(&device, &queue, &scene, &front_camera(), (64, 64));
    assert!(report.computed, "skipped: {:?}", report.skipped);

    let counts = driver.compute_pipeline().read_counts(&device, &queue).unwrap();
    assert_eq!(counts.clipped_faces, 0);
    assert_eq!(counts.clipped_vertices, 0);
}

#[test]
fn repeated_compute_is_idempotent() {
    let (device, queue) = device_or_skip!();
    let mut driver = PipelineDriver::new(&device).unwrap();

    let mut scene = SceneGraph::new();
    scene.add_object("cube", &Mesh::cube(2.0), Transform::default());
    scene.add_light(Light::default());

    driver.frame(&device, &queue, &scene, &front_camera(), (64, 64));
    let first = driver
        .compute_pipeline()
        .snapshot_derived_buffers(&device, &queue)
        .unwrap();
    driver.frame(&device, &queue, &scene, &front_camera(), (64, 64));
    let second = driver
        .compute_pipeline()
        .snapshot_derived_buffers(&device, &queue)
        .unwrap();

    assert_eq!(first.counts, second.counts);
    assert_eq!(first.projected, second.projected);
    assert_eq!(
        bytemuck::cast_slice::<_, u8>(&first.lit),
        bytemuck::cast_slice::<_, u8>(&second.lit)
    );
    // compaction order across faces is scheduling-dependent, so compare
    // the clipped stream as a set of triangles
    let mut a: Vec<[u8; 96]> = first
        .clipped
        .chunks(3)
        .map(|tri| bytemuck::cast_slice(tri).try_into().unwrap())
        .collect();
    let mut b: Vec<[u8; 96]> = second
        .clipped
        .chunks(3)
        .map(|tri| bytemuck::cast_slice(tri).try_into().unwrap())
        .collect();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b);
}

#[test]
fn topology_shrink_resizes_and_leaves_no_residue() {
    let (device, queue) = device_or_skip!();
    let mut driver = PipelineDriver::new(&device).unwrap();

    let mut scene = SceneGraph::new();
    for i in 0..10 {
        scene.add_object(
            format!("cube {i}"),
            &Mesh::cube(0.5),
            Transform::at(Vec3::new(i as f32 * 0.8 - 3.6, 0.0, 0.0)),
        );
    }
    scene.add_light(Light::default());
    assert_eq!(scene.counts().num_vertices, 80);

    let report = driver.frame(&device, &queue, &scene, &front_camera(), (64, 64));
    assert!(report.computed);

    // drop half the nodes
    for _ in 0..5 {
        scene.remove_node(0);
    }
    assert_eq!(scene.counts().num_vertices, 40);

    let report = driver.frame(&device, &queue, &scene, &front_camera(), (64, 64));
    assert!(report.computed, "skipped: {:?}", report.skipped);
    assert!(report.static_reset, "shrink must reallocate static buffers");

    let snapshot = driver
        .compute_pipeline()
        .snapshot_derived_buffers(&device, &queue)
        .unwrap();
    // derived buffers are sized to the reduced scene only
    assert_eq!(snapshot.projected.len(), 40);
    assert!(snapshot.counts.clipped_faces <= scene.counts().num_faces);
    assert_eq!(
        snapshot.counts.clipped_vertices,
        snapshot.counts.clipped_faces * 3
    );
}

#[test]
fn face_on_the_near_plane_classifies_consistently() {
    let (device, queue) = device_or_skip!();
    let mut driver = PipelineDriver::new(&device).unwrap();

    // integer-valued camera and triangle positions keep the view-space
    // depth bit-exact, so the triangle sits exactly on the near plane
    let camera = Camera {
        position: Vec3::new(0.0, 0.0, 4.0),
        target: Vec3::ZERO,
        near: 1.0,
        ..Default::default()
    };
    let mut scene = SceneGraph::new();
    scene.add_object(
        "tri",
        &Mesh::triangle(0.02),
        Transform::at(Vec3::new(0.0, 0.0, 3.0)),
    );
    scene.add_light(Light::default());

    let mut seen = Vec::new();
    for _ in 0..5 {
        let report = driver.frame(&device, &queue, &scene, &camera, (64, 64));
        assert!(report.computed, "skipped: {:?}", report.skipped);
        let counts = driver.compute_pipeline().read_counts(&device, &queue).unwrap();
        seen.push(counts.clipped_faces);
    }
    assert!(
        seen.iter().all(|&c| c == seen[0]),
        "boundary classification flickered: {seen:?}"
    );
    assert_eq!(seen[0], 1, "boundary counts as inside");
}

#[test]
fn stale_buffer_epoch_is_refused() {
    let (device, queue) = device_or_skip!();
    let mut compute = ComputePipeline::new(&device).unwrap();
    let mut render = RenderPipeline::new(&device).unwrap();
    let camera = front_camera();

    let scene = lit_triangle_scene();
    compute.reset_static_buffers(&device, &scene).unwrap();
    compute.reset_dynamic_buffers(&device, &scene).unwrap();
    compute.compute(&device, &queue, &scene, &camera).unwrap();
    render.set_buffers(compute.scene_buffers());

    // grow the scene so the allocations (and the epoch) move on
    let mut bigger = lit_triangle_scene();
    bigger.add_object("cube", &Mesh::cube(1.0), Transform::at(Vec3::X * 3.0));
    compute.reset_static_buffers(&device, &bigger).unwrap();
    compute.reset_dynamic_buffers(&device, &bigger).unwrap();

    let result = render.render(&device, &queue, compute.epoch());
    assert!(
        matches!(result, Err(PipelineError::StaleBuffers { .. })),
        "stale handoff must be refused, got {result:?}"
    );
}
