use glam::{Mat4, Quat, Vec3};
use serde::Serialize;
use std::f32::consts::FRAC_PI_2;
use volray_common::{CameraMode, EngineConfig};
use volray_input::Movement;

/// Margin kept between the pitch and straight up/down.
pub const PITCH_EPSILON: f32 = 0.01;
/// Largest allowed `|pitch|`.
pub const MAX_PITCH: f32 = FRAC_PI_2 - PITCH_EPSILON;
/// Closest the orbit and arcball cameras get to their target.
pub const MIN_DISTANCE: f32 = 0.1;

/// Position and look angles, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraState {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

/// Orthonormal camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl CameraBasis {
    /// Frame for the given yaw/pitch; `forward` is unit length by construction.
    pub fn from_angles(yaw: f32, pitch: f32) -> Self {
        let forward = Vec3::new(
            pitch.cos() * yaw.sin(),
            pitch.sin(),
            pitch.cos() * yaw.cos(),
        );
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward).normalize();
        Self { forward, right, up }
    }

    fn from_orientation(orientation: Quat) -> Self {
        Self {
            forward: (orientation * Vec3::Z).normalize(),
            right: (orientation * Vec3::NEG_X).normalize(),
            up: (orientation * Vec3::Y).normalize(),
        }
    }

    /// Unit displacement for a movement key.
    pub fn direction(&self, movement: Movement) -> Vec3 {
        match movement {
            Movement::Forward => self.forward,
            Movement::Back => -self.forward,
            Movement::Left => -self.right,
            Movement::Right => self.right,
            Movement::Up => self.up,
            Movement::Down => -self.up,
        }
    }
}

/// What the frame encoder needs from a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub view: Mat4,
    pub position: Vec3,
}

/// Integrates mouse deltas and held movements into a camera each frame.
///
/// Camera motion is not part of any deterministic simulation; it only
/// depends on the inputs and `dt` handed to [`CameraController::update`].
#[derive(Debug, Clone)]
pub struct CameraController {
    mode: CameraMode,
    state: CameraState,
    basis: CameraBasis,
    target: Vec3,
    distance: f32,
    orientation: Quat,
    pub mouse_sensitivity: f32,
    pub player_speed: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraMode::FreeFly, Vec3::new(0.0, 0.0, -1.0))
    }
}

impl CameraController {
    /// Camera at `start`. A free-fly camera looks down +Z; orbit and arcball
    /// cameras look at the origin from `start`, keeping its direction and
    /// distance. A start on the target itself looks down +Z.
    pub fn new(mode: CameraMode, start: Vec3) -> Self {
        let target = Vec3::ZERO;
        let (yaw, pitch, distance) = match mode {
            CameraMode::FreeFly => (0.0, 0.0, MIN_DISTANCE),
            CameraMode::Orbit | CameraMode::Arcball => {
                let offset = start - target;
                let len = offset.length();
                if len > f32::EPSILON && offset.is_finite() {
                    let forward = -offset / len;
                    let pitch = forward.y.clamp(-1.0, 1.0).asin();
                    let pitch = if mode == CameraMode::Orbit {
                        pitch.clamp(-MAX_PITCH, MAX_PITCH)
                    } else {
                        pitch
                    };
                    (forward.x.atan2(forward.z), pitch, len.max(MIN_DISTANCE))
                } else {
                    (0.0, 0.0, MIN_DISTANCE)
                }
            }
        };
        let mut camera = Self {
            mode,
            state: CameraState {
                position: start,
                yaw,
                pitch,
            },
            basis: CameraBasis::from_angles(yaw, pitch),
            target,
            distance,
            orientation: Quat::from_rotation_y(yaw) * Quat::from_rotation_x(-pitch),
            mouse_sensitivity: 1.0,
            player_speed: 1.1,
        };
        camera.update(0.0, (0.0, 0.0), &[]);
        camera
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut camera = Self::new(config.camera_mode, config.start_position);
        camera.mouse_sensitivity = config.mouse_sensitivity;
        camera.player_speed = config.player_speed;
        if config.camera_mode != CameraMode::FreeFly {
            camera.distance = config.orbit_distance.max(MIN_DISTANCE);
            camera.update(0.0, (0.0, 0.0), &[]);
        }
        camera
    }

    /// Advance one frame. Negative or non-finite `dt` counts as zero.
    pub fn update(&mut self, dt: f32, mouse_delta: (f32, f32), movements: &[Movement]) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let turn = self.mouse_sensitivity * dt;
        let step = self.player_speed * dt;

        match self.mode {
            CameraMode::FreeFly => {
                self.turn_clamped(mouse_delta.0 * turn, mouse_delta.1 * turn);
                for m in movements {
                    self.state.position += self.basis.direction(*m) * step;
                }
            }
            CameraMode::Orbit => {
                self.turn_clamped(mouse_delta.0 * turn, mouse_delta.1 * turn);
                self.zoom(movements, step);
                self.state.position = self.target - self.basis.forward * self.distance;
            }
            CameraMode::Arcball => {
                let yaw = Quat::from_axis_angle(Vec3::Y, mouse_delta.0 * turn);
                let pitch = Quat::from_axis_angle(self.basis.right, mouse_delta.1 * turn);
                self.orientation = (pitch * yaw * self.orientation).normalize();
                self.basis = CameraBasis::from_orientation(self.orientation);
                let f = self.basis.forward;
                self.state.yaw = f.x.atan2(f.z);
                self.state.pitch = f.y.clamp(-1.0, 1.0).asin();
                self.zoom(movements, step);
                self.state.position = self.target - f * self.distance;
            }
        }
    }

    fn turn_clamped(&mut self, d_yaw: f32, d_pitch: f32) {
        self.state.yaw += d_yaw;
        self.state.pitch = (self.state.pitch + d_pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.basis = CameraBasis::from_angles(self.state.yaw, self.state.pitch);
    }

    fn zoom(&mut self, movements: &[Movement], step: f32) {
        for m in movements {
            match m {
                Movement::Forward => self.distance -= step,
                Movement::Back => self.distance += step,
                _ => {}
            }
        }
        self.distance = self.distance.max(MIN_DISTANCE);
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn yaw(&self) -> f32 {
        self.state.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.state.pitch
    }

    pub fn basis(&self) -> CameraBasis {
        self.basis
    }

    /// Distance to the target (orbit and arcball modes).
    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.state.position;
        let center = match self.mode {
            CameraMode::FreeFly => eye + self.basis.forward,
            CameraMode::Orbit | CameraMode::Arcball => self.target,
        };
        Mat4::look_at_rh(eye, center, self.basis.up)
    }

    pub fn view(&self) -> CameraView {
        CameraView {
            view: self.view_matrix(),
            position: self.state.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn fly() -> CameraController {
        CameraController::new(CameraMode::FreeFly, Vec3::ZERO)
    }

    fn assert_orthonormal(b: CameraBasis) {
        for v in [b.forward, b.right, b.up] {
            assert!((v.length() - 1.0).abs() < EPS, "not unit: {v}");
        }
        assert!(b.forward.dot(b.right).abs() < EPS);
        assert!(b.forward.dot(b.up).abs() < EPS);
        assert!(b.right.dot(b.up).abs() < EPS);
    }

    #[test]
    fn holding_w_for_one_second_moves_player_speed_along_z() {
        let mut cam = fly();
        cam.update(1.0, (0.0, 0.0), &[Movement::Forward]);
        assert!(cam.position().abs_diff_eq(Vec3::new(0.0, 0.0, 1.1), EPS));
    }

    #[test]
    fn mouse_delta_scales_by_sensitivity_and_dt() {
        let mut cam = fly();
        cam.update(0.1, (10.0, -5.0), &[]);
        assert!((cam.yaw() - 1.0).abs() < EPS);
        assert!((cam.pitch() + 0.5).abs() < EPS);
    }

    #[test]
    fn displacement_is_linear_in_dt() {
        let moves = [Movement::Forward, Movement::Right, Movement::Up];
        let base = {
            let mut cam = fly();
            cam.update(0.25, (0.0, 0.0), &moves);
            cam.position()
        };
        for dt in [0.0_f32, 0.5, 1.0, 2.0, 4.0] {
            let mut cam = fly();
            cam.update(dt, (0.0, 0.0), &moves);
            let expected = base * (dt / 0.25);
            assert!(
                cam.position().abs_diff_eq(expected, 1e-4),
                "dt={dt}: {} vs {expected}",
                cam.position()
            );
        }
    }

    #[test]
    fn negative_or_nan_dt_is_ignored() {
        let mut cam = fly();
        cam.update(-1.0, (100.0, 100.0), &[Movement::Forward]);
        cam.update(f32::NAN, (100.0, 100.0), &[Movement::Forward]);
        assert_eq!(cam.position(), Vec3::ZERO);
        assert_eq!(cam.yaw(), 0.0);
    }

    #[test]
    fn pitch_never_leaves_clamp_range() {
        let mut cam = fly();
        for i in 0..500 {
            let dy = if i % 3 == 0 { -900.0 } else { 700.0 };
            cam.update(0.05, (13.0, dy), &[]);
            assert!(cam.pitch() <= MAX_PITCH && cam.pitch() >= -MAX_PITCH);
        }
        cam.update(10.0, (0.0, 1.0e6), &[]);
        assert_eq!(cam.pitch(), MAX_PITCH);
        cam.update(10.0, (0.0, -1.0e6), &[]);
        assert_eq!(cam.pitch(), -MAX_PITCH);
    }

    #[test]
    fn basis_stays_orthonormal() {
        let mut cam = fly();
        for i in 0..200 {
            let f = i as f32;
            cam.update(0.016, ((f * 0.7).sin() * 90.0, (f * 1.3).cos() * 120.0), &[]);
            assert_orthonormal(cam.basis());
        }
    }

    #[test]
    fn strafe_and_vertical_follow_basis() {
        let mut cam = fly();
        cam.update(1.0, (0.0, 0.0), &[Movement::Right]);
        assert!(cam.position().abs_diff_eq(Vec3::new(-1.1, 0.0, 0.0), EPS));

        let mut cam = fly();
        cam.update(1.0, (0.0, 0.0), &[Movement::Up, Movement::Left]);
        assert!(cam.position().abs_diff_eq(Vec3::new(1.1, 1.1, 0.0), EPS));
    }

    #[test]
    fn view_matrix_maps_forward_to_negative_z() {
        let mut cam = fly();
        cam.update(0.1, (3.0, 2.0), &[]);
        let ahead = cam.position() + cam.basis().forward * 5.0;
        let v = cam.view_matrix().transform_point3(ahead);
        assert!(v.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-4));
    }

    #[test]
    fn orbit_keeps_target_centered() {
        let mut cam = CameraController::new(CameraMode::Orbit, Vec3::new(0.0, 0.0, -2.0));
        cam.update(0.1, (4.0, 2.0), &[]);
        assert!((cam.position().length() - 2.0).abs() < 1e-4);
        let origin = cam.view_matrix().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-4));

        cam.update(1.0, (0.0, 0.0), &[Movement::Forward]);
        assert!((cam.distance() - 0.9).abs() < 1e-4);
        cam.update(10.0, (0.0, 0.0), &[Movement::Forward]);
        assert_eq!(cam.distance(), MIN_DISTANCE);
    }

    #[test]
    fn arcball_rolls_over_the_pole_without_degenerating() {
        let mut cam = CameraController::new(CameraMode::Arcball, Vec3::new(0.0, 0.0, -3.0));
        for _ in 0..100 {
            cam.update(0.05, (1.0, 10.0), &[]);
            assert_orthonormal(cam.basis());
            assert!((cam.position().length() - 3.0).abs() < 1e-3);
        }
        assert!(cam.view_matrix().is_finite());
    }

    #[test]
    fn orbit_starts_at_the_configured_position() {
        let mut cam = CameraController::new(CameraMode::Orbit, Vec3::new(2.0, 0.0, 0.0));
        assert!(cam.position().abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
        assert!(cam.basis().forward.abs_diff_eq(Vec3::NEG_X, 1e-5));
        assert!((cam.distance() - 2.0).abs() < EPS);
        let origin = cam.view_matrix().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-4));

        cam.update(0.0, (0.0, 0.0), &[]);
        assert!(cam.position().abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn orbit_start_above_target_keeps_elevation() {
        let start = Vec3::new(0.0, 1.0, -1.0);
        let cam = CameraController::new(CameraMode::Orbit, start);
        assert!(cam.position().abs_diff_eq(start, 1e-5));
        assert!((cam.pitch() + std::f32::consts::FRAC_PI_4).abs() < EPS);
    }

    #[test]
    fn arcball_starts_at_the_configured_position() {
        let start = Vec3::new(1.0, 2.0, 2.0);
        let cam = CameraController::new(CameraMode::Arcball, start);
        assert!(cam.position().abs_diff_eq(start, 1e-4));
        assert!(cam.basis().forward.abs_diff_eq(-start / 3.0, 1e-5));
        assert_orthonormal(cam.basis());
        let origin = cam.view_matrix().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -3.0), 1e-4));
    }

    #[test]
    fn orbit_start_on_target_falls_back_to_plus_z() {
        let cam = CameraController::new(CameraMode::Orbit, Vec3::ZERO);
        assert_eq!(cam.distance(), MIN_DISTANCE);
        assert!(cam.basis().forward.abs_diff_eq(Vec3::Z, EPS));
    }

    #[test]
    fn from_config_orbit_distance_keeps_start_direction() {
        let config = EngineConfig {
            camera_mode: CameraMode::Orbit,
            start_position: Vec3::new(1.0, 0.0, 0.0),
            orbit_distance: 3.0,
            ..EngineConfig::default()
        };
        let cam = CameraController::from_config(&config);
        assert!(cam.position().abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn from_config_applies_tuning() {
        let config = EngineConfig {
            player_speed: 2.0,
            mouse_sensitivity: 0.5,
            ..EngineConfig::default()
        };
        let mut cam = CameraController::from_config(&config);
        assert_eq!(cam.position(), Vec3::new(0.0, 0.0, -1.0));
        cam.update(1.0, (2.0, 0.0), &[Movement::Back]);
        assert!((cam.yaw() - 1.0).abs() < EPS);
    }
}
