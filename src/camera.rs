//! 3D camera with orbit-style and fly-style navigation
//!
//! The view scheme drives the camera Maya-style (orbit / pan / dolly
//! around a target), the play scheme flies it freely (WASD + mouse look).
//! Both manipulate the same position/target pair, so switching schemes
//! keeps the camera where it was.

use glam::{Mat4, Vec3};

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,

    pub orbit_sensitivity: f32,
    pub pan_sensitivity: f32,
    pub zoom_sensitivity: f32,
    pub look_sensitivity: f32,
    pub fly_speed: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(5.0, 5.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 45.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
            aspect: 1.0,
            orbit_sensitivity: 0.01,
            pan_sensitivity: 0.005,
            zoom_sensitivity: 0.5,
            look_sensitivity: 0.003,
            fly_speed: 5.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// View-to-clip matrix (right-handed, 0..1 depth)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Orbit around the target, keeping distance fixed
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        let offset = self.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }

        let mut theta = offset.z.atan2(offset.x);
        let mut phi = (offset.y / radius).acos();

        theta += delta_x * self.orbit_sensitivity;
        phi += delta_y * self.orbit_sensitivity;
        // keep away from the poles
        phi = phi.clamp(0.01, std::f32::consts::PI - 0.01);

        self.position = self.target
            + Vec3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.cos(),
                radius * phi.sin() * theta.sin(),
            );
    }

    /// Pan target and position together in the view plane
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let forward = (self.target - self.position).normalize_or_zero();
        let right = forward.cross(self.up).normalize_or_zero();
        let up = right.cross(forward);

        let distance = (self.target - self.position).length().max(1.0);
        let offset =
            (right * -delta_x + up * delta_y) * self.pan_sensitivity * distance;
        self.position += offset;
        self.target += offset;
    }

    /// Dolly toward (positive) or away from (negative) the target
    pub fn dolly(&mut self, delta: f32) {
        let offset = self.position - self.target;
        let radius = offset.length();
        let new_radius = (radius - delta * self.zoom_sensitivity).max(self.near * 2.0);
        if radius > f32::EPSILON {
            self.position = self.target + offset * (new_radius / radius);
        }
    }

    /// Rotate the view direction in place (fly-style mouse look)
    pub fn look(&mut self, delta_x: f32, delta_y: f32) {
        let forward = self.target - self.position;
        let radius = forward.length();
        if radius <= f32::EPSILON {
            return;
        }
        let dir = forward / radius;

        let mut yaw = dir.z.atan2(dir.x);
        let mut pitch = dir.y.asin();
        yaw += delta_x * self.look_sensitivity;
        pitch = (pitch - delta_y * self.look_sensitivity)
            .clamp(-std::f32::consts::FRAC_PI_2 + 0.01, std::f32::consts::FRAC_PI_2 - 0.01);

        let new_dir = Vec3::new(
            pitch.cos() * yaw.cos(),
            pitch.sin(),
            pitch.cos() * yaw.sin(),
        );
        self.target = self.position + new_dir * radius;
    }

    /// Move position and target together along the view axes (fly-style)
    ///
    /// `local` is (right, up, forward) in units of `fly_speed` per second;
    /// `dt` is the frame time.
    pub fn fly_move(&mut self, local: Vec3, dt: f32) {
        let forward = (self.target - self.position).normalize_or_zero();
        let right = forward.cross(self.up).normalize_or_zero();
        let offset =
            (right * local.x + self.up * local.y + forward * local.z) * self.fly_speed * dt;
        self.position += offset;
        self.target += offset;
    }

    /// Frame the camera so a sphere of the given radius around the target
    /// is fully visible
    pub fn frame_radius(&mut self, radius: f32) {
        let distance = (radius.max(0.1) / (self.fov * 0.5).tan()) * 1.2;
        let dir = (self.position - self.target).normalize_or_zero();
        let dir = if dir == Vec3::ZERO { Vec3::ONE.normalize() } else { dir };
        self.position = self.target + dir * distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_matrix_looks_at_target() {
        let camera = Camera {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            ..Default::default()
        };
        let view = camera.view_matrix();
        // the target maps onto the -Z axis in view space
        let p = view.transform_point3(Vec3::ZERO);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, -5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_projection_maps_near_plane_to_zero_depth() {
        let camera = Camera::default();
        let proj = camera.projection_matrix();
        let clip = proj * glam::Vec4::new(0.0, 0.0, -camera.near, 1.0);
        assert_relative_eq!(clip.z / clip.w, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_orbit_preserves_distance() {
        let mut camera = Camera::default();
        let before = (camera.position - camera.target).length();
        camera.orbit(35.0, -12.0);
        let after = (camera.position - camera.target).length();
        assert_relative_eq!(before, after, epsilon = 1e-4);
    }

    #[test]
    fn test_dolly_never_crosses_target() {
        let mut camera = Camera::default();
        for _ in 0..100 {
            camera.dolly(10.0);
        }
        assert!((camera.position - camera.target).length() >= camera.near);
    }

    #[test]
    fn test_fly_move_shifts_position_and_target_equally() {
        let mut camera = Camera::default();
        let gap = camera.target - camera.position;
        camera.fly_move(Vec3::new(1.0, 0.0, 1.0), 0.016);
        assert_relative_eq!(
            (camera.target - camera.position).length(),
            gap.length(),
            epsilon = 1e-4
        );
    }
}
