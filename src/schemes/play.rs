//! Play scheme: free-flight camera through the active stage

use crate::camera::Camera;
use crate::scene::SceneGraph;
use crate::scheme::{MouseButtons, Scheme, SchemeKind};
use crate::schemes::stage::Stage;
use glam::{Quat, Vec3};
use log::info;
use std::collections::HashSet;

const SPIN_SPEED: f32 = 0.7;

pub struct PlayScheme {
    stage: Stage,
    pressed: HashSet<egui::Key>,
    /// Mouse look is active while the secondary button is held
    looking: bool,
    animate: bool,
}

impl PlayScheme {
    pub fn new() -> Self {
        Self {
            stage: Stage::courtyard(),
            pressed: HashSet::new(),
            looking: false,
            animate: true,
        }
    }

    pub fn stage_name(&self) -> &'static str {
        self.stage.name
    }

    fn movement_input(&self) -> Vec3 {
        let mut local = Vec3::ZERO;
        if self.pressed.contains(&egui::Key::W) {
            local.z += 1.0;
        }
        if self.pressed.contains(&egui::Key::S) {
            local.z -= 1.0;
        }
        if self.pressed.contains(&egui::Key::D) {
            local.x += 1.0;
        }
        if self.pressed.contains(&egui::Key::A) {
            local.x -= 1.0;
        }
        if self.pressed.contains(&egui::Key::E) {
            local.y += 1.0;
        }
        if self.pressed.contains(&egui::Key::Q) {
            local.y -= 1.0;
        }
        local
    }
}

impl Default for PlayScheme {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheme for PlayScheme {
    fn kind(&self) -> SchemeKind {
        SchemeKind::Play
    }

    fn display_name(&self) -> &'static str {
        "Play"
    }

    fn scene(&self) -> &SceneGraph {
        &self.stage.scene
    }

    fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.stage.scene
    }

    fn update(&mut self, camera: &mut Camera, dt: f32) {
        if self.animate {
            let spin = Quat::from_rotation_y(SPIN_SPEED * dt);
            for &id in &self.stage.animated {
                if let Some(node) = self.stage.scene.node_mut(id) {
                    node.transform.rotation = spin * node.transform.rotation;
                }
            }
        }

        let movement = self.movement_input();
        if movement != Vec3::ZERO {
            camera.fly_move(movement.normalize(), dt);
        }
    }

    fn handle_mouse_move(&mut self, camera: &mut Camera, dx: f32, dy: f32, _buttons: MouseButtons) {
        if self.looking {
            camera.look(dx, dy);
        }
    }

    fn handle_mouse_button(&mut self, buttons: MouseButtons) {
        self.looking = buttons.secondary;
    }

    fn handle_scroll(&mut self, camera: &mut Camera, delta: f32) {
        camera.fly_speed = (camera.fly_speed + delta * 0.5).clamp(0.5, 50.0);
    }

    fn handle_key(&mut self, key: egui::Key, down: bool) {
        if down {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    fn build_ui(&mut self, ui: &mut egui::Ui, camera: &mut Camera) {
        ui.heading("Stage");
        let mut selected = self.stage.name;
        egui::ComboBox::from_label("stage")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                for &name in Stage::builtin_names() {
                    ui.selectable_value(&mut selected, name, name);
                }
            });
        if selected != self.stage.name {
            self.switch_stage(Stage::builtin(selected));
        }

        ui.checkbox(&mut self.animate, "animate");
        ui.add(egui::Slider::new(&mut camera.fly_speed, 0.5..=50.0).text("fly speed"));

        ui.separator();
        let counts = self.stage.scene.counts();
        ui.label(format!(
            "{} nodes, {} vertices, {} faces, {} lights",
            self.stage.scene.nodes().len(),
            counts.num_vertices,
            counts.num_faces,
            self.stage.scene.lights().len(),
        ));

        ui.separator();
        ui.small("WASD move, Q/E down/up, hold right mouse to look");
    }

    fn switch_stage(&mut self, stage: Stage) {
        info!("switching stage to {}", stage.name);
        self.stage = stage;
        self.pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_spins_animated_nodes() {
        let mut scheme = PlayScheme::new();
        let mut camera = Camera::default();
        let id = scheme.stage.animated[0];
        let before = scheme.stage.scene.node(id).unwrap().transform.rotation;
        scheme.update(&mut camera, 0.25);
        let after = scheme.stage.scene.node(id).unwrap().transform.rotation;
        assert!(before.angle_between(after) > 1e-4);
    }

    #[test]
    fn test_animation_toggle_freezes_scene() {
        let mut scheme = PlayScheme::new();
        scheme.animate = false;
        let mut camera = Camera::default();
        let revision = scheme.scene().content_revision();
        scheme.update(&mut camera, 0.25);
        assert_eq!(scheme.scene().content_revision(), revision);
    }

    #[test]
    fn test_keys_drive_camera() {
        let mut scheme = PlayScheme::new();
        let mut camera = Camera::default();
        let start = camera.position;
        scheme.handle_key(egui::Key::W, true);
        scheme.update(&mut camera, 0.1);
        assert!(camera.position != start);
        scheme.handle_key(egui::Key::W, false);
        let held = camera.position;
        scheme.update(&mut camera, 0.1);
        assert_eq!(camera.position, held);
    }

    #[test]
    fn test_switch_stage_replaces_scene() {
        let mut scheme = PlayScheme::new();
        scheme.switch_stage(Stage::empty());
        assert!(scheme.scene().is_empty());
        assert_eq!(scheme.stage_name(), "Empty");
    }
}
