//! Point lights

use glam::Vec3;

/// A point light, global to the scene
///
/// Consumed read-only by the lighting kernel; every face accumulates the
/// diffuse contribution of every light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub intensity: f32,
    pub color: Vec3,
}

impl Light {
    pub fn new(position: Vec3, intensity: f32, color: Vec3) -> Self {
        Self {
            position,
            intensity,
            color,
        }
    }

    /// White light of the given intensity
    pub fn white(position: Vec3, intensity: f32) -> Self {
        Self::new(position, intensity, Vec3::ONE)
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::white(Vec3::new(4.0, 6.0, 4.0), 1.0)
    }
}
