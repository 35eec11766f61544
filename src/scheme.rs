//! Scheme system: the application modes that own and mutate the scene
//!
//! A scheme is the active mode of the viewer (free-flight playthrough,
//! orbit inspection, ...). It owns the authoritative scene graph, mutates
//! it in `update`, receives viewport input, and contributes its controls
//! to the side panel. The GPU pipeline only ever reads the scene a scheme
//! exposes.

use crate::camera::Camera;
use crate::scene::SceneGraph;
use crate::schemes::stage::Stage;

/// Identifies a scheme for explicit dispatch and menu switching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    Play,
    View,
}

/// Mouse button state forwarded with viewport drags
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseButtons {
    pub primary: bool,
    pub secondary: bool,
    pub middle: bool,
}

/// One application mode of the viewer
pub trait Scheme {
    /// Which mode this is
    fn kind(&self) -> SchemeKind;

    /// Display name shown in the scheme menu
    fn display_name(&self) -> &'static str;

    /// The scene this scheme wants rendered this frame
    fn scene(&self) -> &SceneGraph;

    /// Mutable scene access for editors and animation
    fn scene_mut(&mut self) -> &mut SceneGraph;

    /// Per-frame scene mutation and camera motion; runs before the
    /// pipeline dispatch, never during it
    fn update(&mut self, camera: &mut Camera, dt: f32);

    /// Pointer drag over the viewport
    fn handle_mouse_move(&mut self, camera: &mut Camera, dx: f32, dy: f32, buttons: MouseButtons);

    /// Pointer button transition over the viewport
    fn handle_mouse_button(&mut self, buttons: MouseButtons);

    /// Scroll over the viewport
    fn handle_scroll(&mut self, camera: &mut Camera, delta: f32);

    /// Key transition while the viewport has focus
    fn handle_key(&mut self, key: egui::Key, down: bool);

    /// Scheme-specific side panel contents
    fn build_ui(&mut self, ui: &mut egui::Ui, camera: &mut Camera);

    /// Swap the active stage; only meaningful for schemes that host stages
    fn switch_stage(&mut self, stage: Stage) {
        let _ = stage;
    }
}

/// Owns every registered scheme and tracks which one is active
///
/// Explicit mode selection over an enum of kinds; the controller is part
/// of the app context and threaded through the frame loop rather than
/// living in a global.
pub struct SchemeController {
    schemes: Vec<Box<dyn Scheme>>,
    active: usize,
}

impl SchemeController {
    pub fn new() -> Self {
        Self {
            schemes: Vec::new(),
            active: 0,
        }
    }

    pub fn register(&mut self, scheme: Box<dyn Scheme>) {
        self.schemes.push(scheme);
    }

    pub fn active(&self) -> &dyn Scheme {
        self.schemes[self.active].as_ref()
    }

    pub fn active_mut(&mut self) -> &mut dyn Scheme {
        self.schemes[self.active].as_mut()
    }

    pub fn active_kind(&self) -> SchemeKind {
        self.active().kind()
    }

    /// Switches to the scheme of the given kind, if registered
    pub fn set_active(&mut self, kind: SchemeKind) -> bool {
        if let Some(index) = self.schemes.iter().position(|s| s.kind() == kind) {
            self.active = index;
            true
        } else {
            false
        }
    }

    /// (kind, name) of every registered scheme, for the mode menu
    pub fn available(&self) -> Vec<(SchemeKind, &'static str)> {
        self.schemes
            .iter()
            .map(|s| (s.kind(), s.display_name()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

impl Default for SchemeController {
    fn default() -> Self {
        Self::new()
    }
}
