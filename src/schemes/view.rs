//! View scheme: orbit inspection and editing of a single object

use crate::camera::Camera;
use crate::scene::{Light, Mesh, NodeId, SceneGraph, Transform};
use crate::scheme::{MouseButtons, Scheme, SchemeKind};
use glam::{EulerRot, Quat, Vec3};

/// Mesh choices offered by the object editor
const MESH_CHOICES: &[&str] = &["Sphere", "Cube", "Tetrahedron", "Plane"];

pub struct ViewScheme {
    scene: SceneGraph,
    subject: NodeId,
    mesh_name: &'static str,
    /// Euler angles mirrored into the subject's rotation quaternion
    euler: Vec3,
}

impl ViewScheme {
    pub fn new() -> Self {
        let mut scene = SceneGraph::new();
        let subject = scene.add_object("subject", &Mesh::uv_sphere(1.5, 16, 24), Transform::default());
        scene.add_light(Light::white(Vec3::new(4.0, 6.0, 4.0), 0.9));
        scene.add_light(Light::new(
            Vec3::new(-6.0, 2.0, -3.0),
            0.4,
            Vec3::new(0.4, 0.6, 1.0),
        ));
        Self {
            scene,
            subject,
            mesh_name: "Sphere",
            euler: Vec3::ZERO,
        }
    }

    fn mesh_by_name(name: &str) -> Mesh {
        match name {
            "Cube" => Mesh::cube(2.0),
            "Tetrahedron" => Mesh::tetrahedron(2.0),
            "Plane" => Mesh::plane(3.0),
            _ => Mesh::uv_sphere(1.5, 16, 24),
        }
    }

    /// Replaces the inspected object, keeping its transform
    ///
    /// This removes and re-adds the node, so it exercises the topology
    /// reset path of the pipeline.
    fn swap_mesh(&mut self, name: &'static str) {
        let transform = self
            .scene
            .node(self.subject)
            .map(|n| n.transform)
            .unwrap_or_default();
        self.scene.remove_node(self.subject);
        self.subject = self
            .scene
            .add_object("subject", &Self::mesh_by_name(name), transform);
        self.mesh_name = name;
    }
}

impl Default for ViewScheme {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheme for ViewScheme {
    fn kind(&self) -> SchemeKind {
        SchemeKind::View
    }

    fn display_name(&self) -> &'static str {
        "View"
    }

    fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    fn update(&mut self, _camera: &mut Camera, _dt: f32) {
        // inspection is fully user-driven; nothing animates on its own
    }

    fn handle_mouse_move(&mut self, camera: &mut Camera, dx: f32, dy: f32, buttons: MouseButtons) {
        if buttons.middle || (buttons.primary && buttons.secondary) {
            camera.pan(dx, dy);
        } else if buttons.primary {
            camera.orbit(dx, dy);
        }
    }

    fn handle_mouse_button(&mut self, _buttons: MouseButtons) {}

    fn handle_scroll(&mut self, camera: &mut Camera, delta: f32) {
        camera.dolly(delta);
    }

    fn handle_key(&mut self, key: egui::Key, down: bool) {
        let _ = (key, down);
    }

    fn build_ui(&mut self, ui: &mut egui::Ui, camera: &mut Camera) {
        ui.heading("Object");
        let mut choice = self.mesh_name;
        egui::ComboBox::from_label("mesh")
            .selected_text(choice)
            .show_ui(ui, |ui| {
                for &name in MESH_CHOICES {
                    ui.selectable_value(&mut choice, name, name);
                }
            });
        if choice != self.mesh_name {
            self.swap_mesh(choice);
        }

        let mut position = self
            .scene
            .node(self.subject)
            .map(|n| n.transform.position)
            .unwrap_or_default();
        let mut scale = self
            .scene
            .node(self.subject)
            .map(|n| n.transform.scale.x)
            .unwrap_or(1.0);
        let mut euler = self.euler;

        let mut changed = false;
        ui.horizontal(|ui| {
            ui.label("position");
            changed |= ui.add(egui::DragValue::new(&mut position.x).speed(0.05)).changed();
            changed |= ui.add(egui::DragValue::new(&mut position.y).speed(0.05)).changed();
            changed |= ui.add(egui::DragValue::new(&mut position.z).speed(0.05)).changed();
        });
        ui.horizontal(|ui| {
            ui.label("rotation");
            changed |= ui
                .add(egui::DragValue::new(&mut euler.x).speed(0.02).suffix(" rad"))
                .changed();
            changed |= ui
                .add(egui::DragValue::new(&mut euler.y).speed(0.02).suffix(" rad"))
                .changed();
            changed |= ui
                .add(egui::DragValue::new(&mut euler.z).speed(0.02).suffix(" rad"))
                .changed();
        });
        changed |= ui
            .add(egui::Slider::new(&mut scale, 0.1..=4.0).text("scale"))
            .changed();

        if changed {
            self.euler = euler;
            if let Some(node) = self.scene.node_mut(self.subject) {
                node.transform.position = position;
                node.transform.rotation = Quat::from_euler(EulerRot::YXZ, euler.y, euler.x, euler.z);
                node.transform.scale = Vec3::splat(scale);
            }
        }

        ui.separator();
        ui.heading("Lights");
        let mut remove: Option<usize> = None;
        for i in 0..self.scene.lights().len() {
            let mut light = self.scene.lights()[i];
            let mut touched = false;
            ui.push_id(i, |ui| {
                ui.horizontal(|ui| {
                    ui.label(format!("light {i}"));
                    touched |= ui.add(egui::DragValue::new(&mut light.position.x).speed(0.1)).changed();
                    touched |= ui.add(egui::DragValue::new(&mut light.position.y).speed(0.1)).changed();
                    touched |= ui.add(egui::DragValue::new(&mut light.position.z).speed(0.1)).changed();
                    if ui.small_button("x").clicked() {
                        remove = Some(i);
                    }
                });
                touched |= ui
                    .add(egui::Slider::new(&mut light.intensity, 0.0..=2.0).text("intensity"))
                    .changed();
                let mut rgb = light.color.to_array();
                if ui.color_edit_button_rgb(&mut rgb).changed() {
                    light.color = Vec3::from_array(rgb);
                    touched = true;
                }
            });
            if touched {
                if let Some(slot) = self.scene.light_mut(i) {
                    *slot = light;
                }
            }
        }
        if let Some(i) = remove {
            self.scene.remove_light(i);
        }
        if ui.button("add light").clicked() {
            self.scene.add_light(Light::default());
        }

        ui.separator();
        if ui.button("frame object").clicked() {
            camera.target = position;
            camera.frame_radius(2.0 * scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_scene_is_valid() {
        let scheme = ViewScheme::new();
        scheme.scene().validate().unwrap();
        assert_eq!(scheme.scene().lights().len(), 2);
    }

    #[test]
    fn test_swap_mesh_changes_topology() {
        let mut scheme = ViewScheme::new();
        let before = scheme.scene().counts();
        scheme.swap_mesh("Cube");
        let after = scheme.scene().counts();
        assert_ne!(before, after);
        assert_eq!(after.num_vertices, 8);
        scheme.scene().validate().unwrap();
    }

    #[test]
    fn test_swap_mesh_keeps_transform() {
        let mut scheme = ViewScheme::new();
        scheme
            .scene_mut()
            .node_mut(0)
            .unwrap()
            .transform
            .position
            .y = 3.0;
        scheme.swap_mesh("Tetrahedron");
        let node = scheme.scene().node(scheme.subject).unwrap();
        assert_eq!(node.transform.position.y, 3.0);
    }
}
