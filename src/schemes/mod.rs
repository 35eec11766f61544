//! Scheme implementations

pub mod play;
pub mod stage;
pub mod view;

pub use play::PlayScheme;
pub use stage::Stage;
pub use view::ViewScheme;

use crate::scheme::SchemeController;

/// Builds the controller with every built-in scheme registered, the view
/// scheme active first
pub fn default_controller() -> SchemeController {
    let mut controller = SchemeController::new();
    controller.register(Box::new(ViewScheme::new()));
    controller.register(Box::new(PlayScheme::new()));
    controller
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::SchemeKind;

    #[test]
    fn test_default_controller_registers_both_schemes() {
        let controller = default_controller();
        let kinds: Vec<SchemeKind> = controller.available().iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec![SchemeKind::View, SchemeKind::Play]);
        assert_eq!(controller.active_kind(), SchemeKind::View);
    }

    #[test]
    fn test_controller_switches_by_kind() {
        let mut controller = default_controller();
        assert!(controller.set_active(SchemeKind::Play));
        assert_eq!(controller.active_kind(), SchemeKind::Play);
        assert!(controller.set_active(SchemeKind::View));
        assert_eq!(controller.active_kind(), SchemeKind::View);
    }
}
