//! Orthographic camera and orbit controls.
//!
//! The frame loop only needs two things from a camera: advance any damped
//! motion once per frame, and turn a cursor position into a pick ray. Those
//! two operations form the `CameraRig` seam; `OrbitRig` is the interactive
//! implementation used by the viewer and the CLI.

use std::f64::consts::PI;

use foundation::math::Vec3;

use crate::config::{CameraConfig, ControlsConfig};
use crate::picking::Ray;

/// Cursor position in normalized device coordinates (`[-1, 1]`, y up).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ndc {
    pub x: f64,
    pub y: f64,
}

impl Ndc {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Converts a viewport pixel position (y down) to NDC (y up).
    pub fn from_pixels(x_px: f64, y_px: f64, width_px: f64, height_px: f64) -> Self {
        let w = width_px.max(1.0);
        let h = height_px.max(1.0);
        Self {
            x: (x_px / w) * 2.0 - 1.0,
            y: -(y_px / h) * 2.0 + 1.0,
        }
    }
}

pub trait CameraRig {
    /// Advances damped motion. Returns `true` if the view changed.
    fn update(&mut self) -> bool;

    /// World-space pick ray through `ndc`.
    fn ray_from_ndc(&self, ndc: Ndc) -> Ray;
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrthoCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Half-height of the view volume at zoom 1.
    pub frustum_size: f64,
    /// Viewport width / height.
    pub aspect: f64,
    pub zoom: f64,
    pub near: f64,
    pub far: f64,
}

impl OrthoCamera {
    pub fn from_config(config: &CameraConfig, aspect: f64) -> Self {
        Self {
            position: config.position(),
            target: Vec3::ZERO,
            frustum_size: config.frustum_size,
            aspect: aspect.max(1e-6),
            zoom: config.zoom,
            near: config.near,
            far: config.far,
        }
    }

    pub fn set_viewport(&mut self, width_px: f64, height_px: f64) {
        self.aspect = if height_px <= 0.0 {
            1.0
        } else {
            (width_px / height_px).max(1e-6)
        };
    }

    /// Moves the orbit target to `target`, keeping the viewing offset.
    pub fn recenter(&mut self, target: Vec3) {
        let offset = self.position - self.target;
        self.target = target;
        self.position = target + offset;
    }

    /// Visible half-width and half-height in world units.
    pub fn half_extents(&self) -> (f64, f64) {
        let half_h = self.frustum_size / self.zoom;
        (half_h * self.aspect, half_h)
    }

    /// Orthonormal `(forward, right, up)` basis of the view.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = (self.target - self.position).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        (forward, right, up)
    }

    /// Orthographic ray starting on the near plane.
    pub fn ray_from_ndc(&self, ndc: Ndc) -> Ray {
        let (forward, right, up) = self.basis();
        let (half_w, half_h) = self.half_extents();
        let origin = self.position
            + right * (ndc.x * half_w)
            + up * (ndc.y * half_h)
            + forward * self.near;
        Ray::new(origin, forward)
    }

    /// Projects a world point to NDC.
    pub fn project(&self, world: Vec3) -> Ndc {
        let (_, right, up) = self.basis();
        let (half_w, half_h) = self.half_extents();
        let d = world - self.position;
        Ndc::new(d.dot(right) / half_w, d.dot(up) / half_h)
    }

    /// Column-major view-projection matrix, depth mapped to `[0, 1]`
    /// between the near and far planes.
    pub fn view_projection(&self) -> [[f32; 4]; 4] {
        let (forward, right, up) = self.basis();
        let (half_w, half_h) = self.half_extents();
        let depth = (self.far - self.near).max(1e-6);

        let x = right * (1.0 / half_w);
        let y = up * (1.0 / half_h);
        let z = forward * (1.0 / depth);
        let p = self.position;
        [
            [x.x as f32, y.x as f32, z.x as f32, 0.0],
            [x.y as f32, y.y as f32, z.y as f32, 0.0],
            [x.z as f32, y.z as f32, z.z as f32, 0.0],
            [
                -x.dot(p) as f32,
                -y.dot(p) as f32,
                ((-forward.dot(p) - self.near) / depth) as f32,
                1.0,
            ],
        ]
    }
}

/// Spherical coordinates around the orbit target (`theta` about +Y measured
/// from +Z, `phi` from +Y).
#[derive(Debug, Copy, Clone, PartialEq)]
struct Spherical {
    radius: f64,
    theta: f64,
    phi: f64,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self {
                radius,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_r = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_r * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_r * self.theta.cos(),
        )
    }
}

const MOTION_EPS: f64 = 1e-6;

/// Damped orbit/zoom/pan input accumulated between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    config: ControlsConfig,
    delta_theta: f64,
    delta_phi: f64,
    pan_offset: Vec3,
    zoom_changed: bool,
}

impl OrbitControls {
    pub fn new(config: ControlsConfig) -> Self {
        Self {
            config,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            zoom_changed: false,
        }
    }

    /// Queues a rotation from a pointer drag of `(dx, dy)` pixels.
    pub fn rotate(&mut self, dx_px: f64, dy_px: f64, viewport_height_px: f64) {
        let h = viewport_height_px.max(1.0);
        self.delta_theta -= 2.0 * PI * dx_px / h * self.config.rotate_speed;
        self.delta_phi -= 2.0 * PI * dy_px / h * self.config.rotate_speed;
    }

    /// Applies a wheel step to the camera zoom, clamped to the configured range.
    pub fn zoom(&mut self, camera: &mut OrthoCamera, wheel_delta_y: f64) {
        if wheel_delta_y == 0.0 {
            return;
        }
        let scale = 0.95f64.powf(self.config.zoom_speed * (wheel_delta_y * 0.01).abs());
        let next = if wheel_delta_y < 0.0 {
            camera.zoom / scale
        } else {
            camera.zoom * scale
        };
        let clamped = next.clamp(self.config.min_zoom, self.config.max_zoom);
        if (clamped - camera.zoom).abs() > MOTION_EPS {
            camera.zoom = clamped;
            self.zoom_changed = true;
        }
    }

    /// Queues a screen-space pan from a pointer drag of `(dx, dy)` pixels.
    pub fn pan(&mut self, camera: &OrthoCamera, dx_px: f64, dy_px: f64, viewport: (f64, f64)) {
        let (_, right, up) = camera.basis();
        let (half_w, half_h) = camera.half_extents();
        let w = viewport.0.max(1.0);
        let h = viewport.1.max(1.0);
        let left = right * (-dx_px * 2.0 * half_w / w * self.config.pan_speed);
        let upward = up * (dy_px * 2.0 * half_h / h * self.config.pan_speed);
        self.pan_offset += left + upward;
    }

    /// Applies queued motion to `camera`. Returns `true` if the view changed.
    pub fn update(&mut self, camera: &mut OrthoCamera) -> bool {
        let offset = camera.position - camera.target;
        let mut spherical = Spherical::from_offset(offset);

        let damping = if self.config.enable_damping {
            self.config.damping_factor
        } else {
            1.0
        };

        spherical.theta += self.delta_theta * damping;
        spherical.phi += self.delta_phi * damping;
        spherical.phi = spherical
            .phi
            .clamp(self.config.min_polar_angle, self.config.max_polar_angle)
            .clamp(MOTION_EPS, PI - MOTION_EPS);

        let target = camera.target + self.pan_offset * damping;
        let position = target + spherical.to_offset();

        if self.config.enable_damping {
            self.delta_theta *= 1.0 - damping;
            self.delta_phi *= 1.0 - damping;
            self.pan_offset = self.pan_offset * (1.0 - damping);
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }

        let moved = position.distance_squared(camera.position) > MOTION_EPS * MOTION_EPS
            || target.distance_squared(camera.target) > MOTION_EPS * MOTION_EPS
            || std::mem::take(&mut self.zoom_changed);

        camera.position = position;
        camera.target = target;
        moved
    }
}

/// Orthographic camera driven by orbit controls.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitRig {
    pub camera: OrthoCamera,
    pub controls: OrbitControls,
}

impl OrbitRig {
    pub fn new(camera: CameraConfig, controls: ControlsConfig, aspect: f64) -> Self {
        let mut rig = Self {
            camera: OrthoCamera::from_config(&camera, aspect),
            controls: OrbitControls::new(controls),
        };
        // Pull the initial position inside the polar limits.
        rig.controls.update(&mut rig.camera);
        rig
    }
}

impl CameraRig for OrbitRig {
    fn update(&mut self) -> bool {
        self.controls.update(&mut self.camera)
    }

    fn ray_from_ndc(&self, ndc: Ndc) -> Ray {
        self.camera.ray_from_ndc(ndc)
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraRig, Ndc, OrbitControls, OrbitRig, OrthoCamera};
    use crate::config::{CameraConfig, ControlsConfig};
    use foundation::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn pixels_map_to_ndc_with_y_up() {
        let c = Ndc::from_pixels(0.0, 0.0, 800.0, 600.0);
        assert_eq!(c, Ndc::new(-1.0, 1.0));
        let c = Ndc::from_pixels(400.0, 300.0, 800.0, 600.0);
        assert_eq!(c, Ndc::new(0.0, 0.0));
        let c = Ndc::from_pixels(800.0, 600.0, 800.0, 600.0);
        assert_eq!(c, Ndc::new(1.0, -1.0));
    }

    #[test]
    fn project_inverts_ray_origin() {
        let camera = OrthoCamera::from_config(&CameraConfig::default(), 16.0 / 9.0);
        let ndc = Ndc::new(0.3, -0.4);
        let ray = camera.ray_from_ndc(ndc);
        let back = camera.project(ray.origin + ray.dir * 5.0);
        assert_close(back.x, ndc.x, 1e-9);
        assert_close(back.y, ndc.y, 1e-9);
    }

    #[test]
    fn view_projection_agrees_with_project() {
        let camera = OrthoCamera::from_config(&CameraConfig::default(), 4.0 / 3.0);
        let m = camera.view_projection();
        let world = Vec3::new(2.0, 0.5, -3.0);
        let p = [world.x as f32, world.y as f32, world.z as f32, 1.0];
        let clip: Vec<f32> = (0..4)
            .map(|row| (0..4).map(|col| m[col][row] * p[col]).sum())
            .collect();
        let ndc = camera.project(world);
        assert_close(clip[0] as f64, ndc.x, 1e-4);
        assert_close(clip[1] as f64, ndc.y, 1e-4);
        assert!(clip[2] > 0.0 && clip[2] < 1.0, "depth {}", clip[2]);
        assert_eq!(clip[3], 1.0);

        let near = camera.ray_from_ndc(Ndc::new(0.0, 0.0)).origin;
        let z: f32 = (0..3).map(|c| m[c][2] * [near.x, near.y, near.z][c] as f32).sum::<f32>() + m[3][2];
        assert!(z.abs() < 1e-4, "near plane maps to depth 0, got {z}");
    }

    #[test]
    fn recentered_target_projects_to_the_middle() {
        let mut camera = OrthoCamera::from_config(&CameraConfig::default(), 1.0);
        let p = Vec3::new(40.0, 0.2, -12.0);
        camera.recenter(p);
        let ndc = camera.project(p);
        assert_close(ndc.x, 0.0, 1e-9);
        assert_close(ndc.y, 0.0, 1e-9);
    }

    #[test]
    fn center_ray_passes_through_target() {
        let camera = OrthoCamera::from_config(&CameraConfig::default(), 1.0);
        let ray = camera.ray_from_ndc(Ndc::new(0.0, 0.0));
        // Distance from the target to the ray line.
        let to_target = camera.target - ray.origin;
        let along = to_target.dot(ray.dir);
        let closest = ray.origin + ray.dir * along;
        assert!(closest.distance(camera.target) < 1e-9);
    }

    #[test]
    fn polar_angle_is_clamped() {
        let mut rig = OrbitRig::new(
            CameraConfig::default(),
            ControlsConfig {
                enable_damping: false,
                ..ControlsConfig::default()
            },
            1.0,
        );
        // Drag far downward: tries to tip the camera past the horizon.
        rig.controls.rotate(0.0, -5000.0, 600.0);
        rig.update();
        let offset = rig.camera.position - rig.camera.target;
        let phi = (offset.y / offset.length()).acos();
        assert_close(phi, ControlsConfig::default().max_polar_angle, 1e-9);
    }

    #[test]
    fn damping_spreads_rotation_over_frames_and_settles() {
        let mut rig = OrbitRig::new(CameraConfig::default(), ControlsConfig::default(), 1.0);
        rig.controls.rotate(50.0, 0.0, 600.0);
        assert!(rig.update());
        let mut frames = 1;
        while rig.update() {
            frames += 1;
            assert!(frames < 1000, "orbit damping never settled");
        }
        assert!(frames > 10);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = OrthoCamera::from_config(&CameraConfig::default(), 1.0);
        let mut controls = OrbitControls::new(ControlsConfig::default());
        for _ in 0..200 {
            controls.zoom(&mut camera, -100.0);
        }
        assert_close(camera.zoom, 3.5, 1e-12);
        for _ in 0..200 {
            controls.zoom(&mut camera, 100.0);
        }
        assert_close(camera.zoom, 1.5, 1e-12);
    }

    #[test]
    fn pan_moves_target_and_position_together() {
        let mut camera = OrthoCamera::from_config(&CameraConfig::default(), 1.0);
        let mut controls = OrbitControls::new(ControlsConfig {
            enable_damping: false,
            ..ControlsConfig::default()
        });
        controls.update(&mut camera);
        let before = camera.position - camera.target;
        controls.pan(&camera, 100.0, 0.0, (800.0, 600.0));
        assert!(controls.update(&mut camera));
        let after = camera.position - camera.target;
        assert!(after.distance(before) < 1e-9);
        assert!(camera.target.distance(Vec3::ZERO) > 0.1);
    }
}
