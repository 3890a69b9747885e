use glam::{Vec2, Vec3};
use stagecraft_scene::Camera;
use std::f32::consts::{PI, TAU};

const EPS: f32 = 1e-6;

/// Orbit-drag camera controls.
///
/// Dragging rotates the camera around `target`, the wheel changes the
/// distance to it and a secondary drag pans the target in screen space.
/// Handlers only accumulate pending deltas; nothing moves until
/// [`OrbitController::update`] is called, which the frame driver does once per
/// tick before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitController {
    pub target: Vec3,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle limits in radians, measured from +Y.
    pub min_polar: f32,
    pub max_polar: f32,
    /// When set, pending motion decays by `1 - factor` per update instead of
    /// being applied all at once, giving the camera inertia.
    pub damping_factor: Option<f32>,
    viewport_height: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_pixels: Vec2,
    pan_offset: Vec3,
}

impl OrbitController {
    pub fn new(target: Vec3, viewport_height: f32) -> Self {
        Self {
            target,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar: 0.0,
            max_polar: PI,
            damping_factor: None,
            viewport_height: viewport_height.max(1.0),
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_pixels: Vec2::ZERO,
            pan_offset: Vec3::ZERO,
        }
    }

    /// Record a primary drag. A drag the full viewport height turns a full circle.
    pub fn handle_drag(&mut self, dx: f32, dy: f32) {
        let per_pixel = TAU / self.viewport_height * self.rotate_speed;
        self.delta_theta -= dx * per_pixel;
        self.delta_phi -= dy * per_pixel;
    }

    /// Record a wheel step. Negative deltas move closer to the target.
    pub fn handle_wheel(&mut self, delta: f32) {
        let step = 0.95_f32.powf(self.zoom_speed);
        if delta < 0.0 {
            self.scale *= step;
        } else if delta > 0.0 {
            self.scale /= step;
        }
    }

    /// Record a secondary drag in pixels.
    pub fn handle_pan(&mut self, dx: f32, dy: f32) {
        self.pan_pixels += Vec2::new(dx, dy);
    }

    pub fn has_pending(&self) -> bool {
        self.delta_theta != 0.0
            || self.delta_phi != 0.0
            || self.scale != 1.0
            || self.pan_pixels != Vec2::ZERO
            || self.pan_offset != Vec3::ZERO
    }

    /// Apply pending input to the camera. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        if !self.has_pending() {
            return false;
        }
        let before = (camera.position, camera.rotation);
        self.resolve_pan(camera);

        let offset = camera.position - self.target;
        let radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > EPS {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            PI / 2.0
        };

        let damping = self.damping_factor.map(|f| f.clamp(0.0, 1.0));
        let step = damping.unwrap_or(1.0);
        theta += self.delta_theta * step;
        phi += self.delta_phi * step;
        phi = phi
            .clamp(self.min_polar, self.max_polar)
            .clamp(EPS, PI - EPS);
        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * step;

        let sin_phi = phi.sin();
        let offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = self.target + offset;
        camera.look_at(self.target);

        match damping {
            Some(f) => {
                self.delta_theta *= 1.0 - f;
                self.delta_phi *= 1.0 - f;
                self.pan_offset *= 1.0 - f;
            }
            None => {
                self.delta_theta = 0.0;
                self.delta_phi = 0.0;
                self.pan_offset = Vec3::ZERO;
            }
        }
        self.scale = 1.0;

        let moved = (camera.position - before.0).length_squared() > EPS * EPS
            || (camera.rotation - before.1).length_squared() > EPS * EPS;
        if moved {
            tracing::trace!(
                "orbit camera at ({:.2}, {:.2}, {:.2})",
                camera.position.x,
                camera.position.y,
                camera.position.z
            );
        }
        moved
    }

    /// Convert pending pixel pan into a world-space target offset, scaled so
    /// the point under the cursor at target depth follows the pointer.
    fn resolve_pan(&mut self, camera: &Camera) {
        if self.pan_pixels == Vec2::ZERO {
            return;
        }
        let half_fov = camera.projection().fov_degrees().to_radians() / 2.0;
        let target_distance = (camera.position - self.target).length() * half_fov.tan();
        let units_per_pixel = 2.0 * target_distance / self.viewport_height * self.pan_speed;
        let orientation = camera.orientation();
        let right = orientation * Vec3::X;
        let up = orientation * Vec3::Y;
        self.pan_offset += right * (-self.pan_pixels.x * units_per_pixel)
            + up * (self.pan_pixels.y * units_per_pixel);
        self.pan_pixels = Vec2::ZERO;
    }
}
