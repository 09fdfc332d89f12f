use glam::Vec3;

use crate::camera::{Camera, CameraMode};
use crate::input::{InputState, KeyCode, MouseButton, NamedKey};
use crate::scene::Rotor;

use super::{CursorMode, WindowCommands};

const WALK_SPEED: f32 = 0.1;
const RUN_SPEED: f32 = 0.25;
const MOUSE_ROTATION: f32 = 0.05;
const WHEEL_ZOOM: f32 = 1.5;

/// Keys driving the custom fly update.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FlyKeys {
    pub forward: KeyCode,
    pub back: KeyCode,
    pub right: KeyCode,
    pub left: KeyCode,
}

impl FlyKeys {
    pub const WASD: Self = Self {
        forward: KeyCode::Character('W'),
        back: KeyCode::Character('S'),
        right: KeyCode::Character('D'),
        left: KeyCode::Character('A'),
    };

    pub const ARROWS: Self = Self {
        forward: KeyCode::Named(NamedKey::Up),
        back: KeyCode::Named(NamedKey::Down),
        right: KeyCode::Named(NamedKey::Right),
        left: KeyCode::Named(NamedKey::Left),
    };
}

/// Custom fly update: keys move 0.1 per frame (0.25 with shift), mouse
/// motion turns 0.05 degrees per pixel, the wheel zooms 1.5 units per notch.
pub(crate) fn fly(camera: &mut Camera, input: &InputState, keys: FlyKeys) {
    let speed = if input.is_key_down(KeyCode::Named(NamedKey::LeftShift)) {
        RUN_SPEED
    } else {
        WALK_SPEED
    };
    let movement = Vec3::new(
        (input.axis(keys.forward) - input.axis(keys.back)) * speed,
        (input.axis(keys.right) - input.axis(keys.left)) * speed,
        0.0,
    );
    let delta = input.mouse_delta() * MOUSE_ROTATION;
    camera.update_pro(
        movement,
        Vec3::new(delta.x, delta.y, 0.0),
        input.wheel_move() * WHEEL_ZOOM,
    );
}

/// Backspace releases the cursor, the left button captures it again.
pub(crate) fn cursor_keys(input: &InputState) -> Option<CursorMode> {
    if input.is_key_down(KeyCode::Named(NamedKey::Backspace)) {
        Some(CursorMode::Released)
    } else if input.is_mouse_button_down(MouseButton::LEFT) {
        Some(CursorMode::Captured)
    } else {
        None
    }
}

/// Camera with a switchable update mode plus the rotor, shared by the
/// camera and helicopter labs.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub camera: Camera,
    pub mode: CameraMode,
    pub rotor: Rotor,
}

impl CameraRig {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            mode: CameraMode::Custom,
            rotor: Rotor::default(),
        }
    }

    pub fn update(&mut self, input: &InputState) -> WindowCommands {
        let mode = CameraMode::select(input, self.mode);
        if mode != self.mode {
            log::debug!("camera mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
        match self.mode {
            CameraMode::Custom => fly(&mut self.camera, input, FlyKeys::WASD),
            CameraMode::Free => self.camera.update_free(input),
            CameraMode::FirstPerson => self.camera.update_first_person(input),
        }

        if input.is_key_pressed(KeyCode::char('P')) {
            self.camera.toggle_projection();
            log::debug!("projection {:?}", self.camera.projection);
        }

        if input.is_key_down(KeyCode::Named(NamedKey::Equal)) {
            self.rotor.spin_forward();
        } else if input.is_key_down(KeyCode::Named(NamedKey::Minus)) {
            self.rotor.spin_backward();
        }

        WindowCommands {
            cursor: cursor_keys(input),
        }
    }

    pub fn summary(&self) -> Vec<String> {
        vec![
            format!("camera mode={:?}", self.mode),
            format!(
                "camera position={} target={}",
                super::format_vec3(self.camera.position),
                super::format_vec3(self.camera.target)
            ),
            format!("projection={:?}", self.camera.projection),
            format!(
                "rotor angle={:.2} offset={:.2}",
                self.rotor.angle, self.rotor.offset
            ),
        ]
    }
}
