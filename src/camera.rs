//! Camera aggregate and the three update modes the labs switch between.
//!
//! [`Camera::update_pro`] is the custom fly update fed with explicit
//! movement/rotation/zoom deltas. [`Camera::update_free`] and
//! [`Camera::update_first_person`] are the built-in modes that read the raw
//! input themselves.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::input::{InputState, KeyCode, MouseButton, NamedKey};

pub const NEAR_PLANE: f32 = 0.01;
pub const FAR_PLANE: f32 = 1000.0;

const MOVE_SPEED: f32 = 0.09;
const ROTATION_SPEED: f32 = 0.03;
const MOUSE_SENSITIVITY: f32 = 0.003;
const PAN_SPEED: f32 = 0.2;
// Keeps the view vector from collapsing onto the up axis.
const PITCH_MARGIN: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    Perspective,
    Orthographic,
}

impl Projection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Perspective => Self::Orthographic,
            Self::Orthographic => Self::Perspective,
        }
    }
}

/// Which update drives the camera this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraMode {
    /// Fly update with lab-specific deltas.
    Custom,
    /// Built-in free camera: 3D movement, vertical keys, wheel zoom.
    Free,
    /// Built-in first-person camera: movement locked to the ground plane.
    FirstPerson,
}

impl CameraMode {
    /// Picks the mode from the held digit keys. `1` wins over `2`, `2` over
    /// `3`; with none held the current mode is kept.
    pub fn select(input: &InputState, current: Self) -> Self {
        if input.is_key_down(KeyCode::digit(1)) {
            Self::Custom
        } else if input.is_key_down(KeyCode::digit(2)) {
            Self::Free
        } else if input.is_key_down(KeyCode::digit(3)) {
            Self::FirstPerson
        } else {
            current
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees. Used as the view height in
    /// orthographic mode.
    pub fovy: f32,
    pub projection: Projection,
}

impl Camera {
    pub fn perspective(position: Vec3, target: Vec3, fovy: f32) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            fovy,
            projection: Projection::Perspective,
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn up_axis(&self) -> Vec3 {
        self.up.normalize_or_zero()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up_axis()).normalize_or_zero()
    }

    pub fn toggle_projection(&mut self) {
        self.projection = self.projection.toggled();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let aspect = aspect.max(0.01);
        match self.projection {
            Projection::Perspective => {
                Mat4::perspective_rh(self.fovy.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
            }
            Projection::Orthographic => {
                let top = self.fovy / 2.0;
                let right = top * aspect;
                Mat4::orthographic_rh(-right, right, -top, top, NEAR_PLANE, FAR_PLANE)
            }
        }
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Rotates the view up/down around the right axis. With `lock_view` the
    /// view cannot pass the up or down axis.
    pub fn pitch(&mut self, angle: f32, lock_view: bool) {
        let up = self.up_axis();
        let view = self.target - self.position;
        let mut angle = angle;
        if lock_view {
            let max_up = up.angle_between(view) - PITCH_MARGIN;
            if angle > max_up {
                angle = max_up;
            }
            let max_down = -(-up).angle_between(view) + PITCH_MARGIN;
            if angle < max_down {
                angle = max_down;
            }
        }
        let right = self.right();
        if right == Vec3::ZERO {
            return;
        }
        let view = Quat::from_axis_angle(right, angle) * view;
        self.target = self.position + view;
    }

    /// Rotates the view left/right around the up axis.
    pub fn yaw(&mut self, angle: f32) {
        let up = self.up_axis();
        if up == Vec3::ZERO {
            return;
        }
        let view = Quat::from_axis_angle(up, angle) * (self.target - self.position);
        self.target = self.position + view;
    }

    /// Rotates the up vector around the view axis.
    pub fn roll(&mut self, angle: f32) {
        let forward = self.forward();
        if forward == Vec3::ZERO {
            return;
        }
        self.up = Quat::from_axis_angle(forward, angle) * self.up;
    }

    pub fn move_forward(&mut self, distance: f32, in_world_plane: bool) {
        let mut forward = self.forward();
        if in_world_plane {
            forward.y = 0.0;
            forward = forward.normalize_or_zero();
        }
        self.translate(forward * distance);
    }

    pub fn move_right(&mut self, distance: f32, in_world_plane: bool) {
        let mut right = self.right();
        if in_world_plane {
            right.y = 0.0;
            right = right.normalize_or_zero();
        }
        self.translate(right * distance);
    }

    pub fn move_up(&mut self, distance: f32) {
        self.translate(self.up_axis() * distance);
    }

    /// Dollies towards (negative `delta`) or away from the target.
    pub fn move_to_target(&mut self, delta: f32) {
        let mut distance = self.position.distance(self.target) + delta;
        if distance <= 0.0 {
            distance = 0.001;
        }
        let forward = self.forward();
        self.position = self.target - forward * distance;
    }

    fn translate(&mut self, offset: Vec3) {
        self.position += offset;
        self.target += offset;
    }

    /// Custom fly update.
    ///
    /// `movement` is (forward, right, up) in world units, `rotation` is
    /// (yaw, pitch, roll) in degrees and `zoom` moves the camera towards the
    /// target. Movement stays in the ground plane.
    pub fn update_pro(&mut self, movement: Vec3, rotation: Vec3, zoom: f32) {
        self.pitch(-rotation.y.to_radians(), true);
        self.yaw(-rotation.x.to_radians());
        self.roll(rotation.z.to_radians());

        self.move_forward(movement.x, true);
        self.move_right(movement.y, true);
        self.move_up(movement.z);

        self.move_to_target(zoom);
    }

    pub fn update_free(&mut self, input: &InputState) {
        self.update_builtin(input, false);

        if input.is_key_down(KeyCode::Named(NamedKey::Space)) {
            self.move_up(MOVE_SPEED);
        }
        if input.is_key_down(KeyCode::Named(NamedKey::LeftCtrl)) {
            self.move_up(-MOVE_SPEED);
        }
        self.move_to_target(-input.wheel_move());
    }

    pub fn update_first_person(&mut self, input: &InputState) {
        self.update_builtin(input, true);
    }

    fn update_builtin(&mut self, input: &InputState, in_world_plane: bool) {
        let key = |name| input.is_key_down(KeyCode::Named(name));
        if key(NamedKey::Down) {
            self.pitch(-ROTATION_SPEED, true);
        }
        if key(NamedKey::Up) {
            self.pitch(ROTATION_SPEED, true);
        }
        if key(NamedKey::Right) {
            self.yaw(-ROTATION_SPEED);
        }
        if key(NamedKey::Left) {
            self.yaw(ROTATION_SPEED);
        }
        if input.is_key_down(KeyCode::char('Q')) {
            self.roll(-ROTATION_SPEED);
        }
        if input.is_key_down(KeyCode::char('E')) {
            self.roll(ROTATION_SPEED);
        }

        let delta = input.mouse_delta();
        if !in_world_plane && input.is_mouse_button_down(MouseButton::MIDDLE) {
            if delta.x != 0.0 {
                self.move_right(PAN_SPEED * delta.x.signum(), false);
            }
            if delta.y != 0.0 {
                self.move_up(-PAN_SPEED * delta.y.signum());
            }
        } else {
            self.yaw(-delta.x * MOUSE_SENSITIVITY);
            self.pitch(-delta.y * MOUSE_SENSITIVITY, true);
        }

        if input.is_key_down(KeyCode::char('W')) {
            self.move_forward(MOVE_SPEED, in_world_plane);
        }
        if input.is_key_down(KeyCode::char('A')) {
            self.move_right(-MOVE_SPEED, in_world_plane);
        }
        if input.is_key_down(KeyCode::char('S')) {
            self.move_forward(-MOVE_SPEED, in_world_plane);
        }
        if input.is_key_down(KeyCode::char('D')) {
            self.move_right(MOVE_SPEED, in_world_plane);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overhead() -> Camera {
        Camera::perspective(Vec3::new(0.0, 10.0, 10.0), Vec3::ZERO, 45.0)
    }

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, 1e-4), "{a:?} != {b:?}");
    }

    #[test]
    fn mode_selection_follows_key_precedence() {
        let mut input = InputState::new();
        input.set_key_down(KeyCode::digit(1));
        input.set_key_down(KeyCode::digit(2));
        assert_eq!(CameraMode::select(&input, CameraMode::FirstPerson), CameraMode::Custom);

        input.set_key_up(KeyCode::digit(1));
        input.set_key_down(KeyCode::digit(3));
        assert_eq!(CameraMode::select(&input, CameraMode::Custom), CameraMode::Free);
    }

    #[test]
    fn mode_is_kept_without_keys() {
        let input = InputState::new();
        assert_eq!(CameraMode::select(&input, CameraMode::Free), CameraMode::Free);
    }

    #[test]
    fn forward_movement_stays_in_ground_plane() {
        let mut camera = overhead();
        camera.update_pro(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, 0.0);
        assert_vec_eq(camera.position, Vec3::new(0.0, 10.0, 9.0));
        assert_vec_eq(camera.target, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn zoom_changes_distance_to_target() {
        let mut camera = overhead();
        let before = camera.position.distance(camera.target);
        camera.update_pro(Vec3::ZERO, Vec3::ZERO, 1.5);
        let after = camera.position.distance(camera.target);
        assert!((after - before - 1.5).abs() < 1e-4);

        camera.move_to_target(-100.0);
        assert!(camera.position.distance(camera.target) > 0.0);
    }

    #[test]
    fn pitch_is_clamped_before_the_up_axis() {
        let mut camera = overhead();
        camera.pitch(10.0, true);
        let forward = camera.forward();
        assert!(forward.y < 1.0);
        assert!(forward.angle_between(Vec3::Y) > 0.0);
    }

    #[test]
    fn yaw_keeps_distance() {
        let mut camera = overhead();
        let before = camera.position.distance(camera.target);
        camera.update_pro(Vec3::ZERO, Vec3::new(90.0, 0.0, 0.0), 0.0);
        assert!((camera.position.distance(camera.target) - before).abs() < 1e-4);
        assert!(camera.target.x.abs() > 1.0);
    }

    #[test]
    fn first_person_ignores_vertical_component() {
        let mut camera = overhead();
        let mut input = InputState::new();
        input.set_key_down(KeyCode::char('W'));
        camera.update_first_person(&input);
        assert!((camera.position.y - 10.0).abs() < 1e-5);
        assert!(camera.position.z < 10.0);
    }

    #[test]
    fn free_mode_moves_along_view() {
        let mut camera = overhead();
        let mut input = InputState::new();
        input.set_key_down(KeyCode::char('W'));
        camera.update_free(&input);
        assert!(camera.position.y < 10.0);
    }

    #[test]
    fn projection_toggles_both_ways() {
        let mut camera = overhead();
        camera.toggle_projection();
        assert_eq!(camera.projection, Projection::Orthographic);
        camera.toggle_projection();
        assert_eq!(camera.projection, Projection::Perspective);
    }

    #[test]
    fn view_projection_maps_target_to_screen_center() {
        let camera = overhead();
        for projection in [Projection::Perspective, Projection::Orthographic] {
            let camera = Camera { projection, ..camera };
            let clip = camera.view_projection(16.0 / 9.0) * camera.target.extend(1.0);
            let ndc = clip / clip.w;
            assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
            assert!(ndc.z > 0.0 && ndc.z < 1.0);
        }
    }
}
