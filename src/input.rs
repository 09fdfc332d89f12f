use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
}

impl KeyCode {
    pub const fn char(ch: char) -> Self {
        Self::Character(ch)
    }

    pub const fn digit(value: u8) -> Self {
        Self::Digit(value)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii_alphabetic() => {
                Some(Self::Character(ch.to_ascii_uppercase()))
            }
            (Some(ch), None) if ch.is_ascii_digit() => Some(Self::Digit(ch as u8 - b'0')),
            _ => None,
        }
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Space" => Space,
        "Enter" | "Return" => Enter,
        "Tab" => Tab,
        "Left" => Left,
        "Right" => Right,
        "Up" => Up,
        "Down" => Down,
        "Escape" | "Esc" => Escape,
        "Backspace" => Backspace,
        "Equal" | "=" => Equal,
        "Minus" | "-" => Minus,
        "LeftShift" | "LShift" | "Shift" => LeftShift,
        "RightShift" | "RShift" => RightShift,
        "LeftCtrl" | "LControl" | "Ctrl" => LeftCtrl,
        "RightCtrl" | "RControl" => RightCtrl,
        "LeftAlt" | "LAlt" => LeftAlt,
        "RightAlt" | "RAlt" => RightAlt,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Friendly names for the non-printable keys the labs bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Backspace,
    Equal,
    Minus,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const MIDDLE: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Keyboard and mouse state polled once per frame.
///
/// Held keys persist across frames. Press edges, mouse motion and wheel
/// movement accumulate between two calls to [`InputState::end_frame`], so a
/// key held for many frames reports [`InputState::is_key_pressed`] only on
/// the frame it went down.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    mouse_buttons: HashSet<MouseButton>,
    mouse_pressed: HashSet<MouseButton>,
    mouse_delta: Vec2,
    wheel: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&mut self, key: KeyCode) {
        // OS key repeat re-sends presses for held keys; only the first counts.
        if self.keys.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn set_key_up(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn set_mouse_button_down(&mut self, button: MouseButton) {
        if self.mouse_buttons.insert(button) {
            self.mouse_pressed.insert(button);
        }
    }

    pub fn set_mouse_button_up(&mut self, button: MouseButton) {
        self.mouse_buttons.remove(&button);
    }

    pub fn add_mouse_delta(&mut self, delta: Vec2) {
        self.mouse_delta += delta;
    }

    pub fn add_wheel(&mut self, lines: f32) {
        self.wheel += lines;
    }

    /// Releases everything, used when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys.clear();
        self.mouse_buttons.clear();
    }

    /// Clears the per-frame edges and deltas. Held state is kept.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
        self.wheel = 0.0;
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub fn wheel_move(&self) -> f32 {
        self.wheel
    }

    /// `1.0` while the key is held, `0.0` otherwise.
    pub fn axis(&self, key: KeyCode) -> f32 {
        if self.is_key_down(key) {
            1.0
        } else {
            0.0
        }
    }

    /// Presses a key or mouse button given by name. Returns `false` for
    /// unknown names.
    pub fn press_by_name(&mut self, name: &str) -> bool {
        match parse_input_name(name) {
            Some(InputName::Key(key)) => self.set_key_down(key),
            Some(InputName::Mouse(button)) => self.set_mouse_button_down(button),
            None => return false,
        }
        true
    }

    /// Releases a key or mouse button given by name.
    pub fn release_by_name(&mut self, name: &str) -> bool {
        match parse_input_name(name) {
            Some(InputName::Key(key)) => self.set_key_up(key),
            Some(InputName::Mouse(button)) => self.set_mouse_button_up(button),
            None => return false,
        }
        true
    }
}

/// Returns `true` when `name` refers to a key or mouse button.
pub fn is_known_input_name(name: &str) -> bool {
    parse_input_name(name).is_some()
}

enum InputName {
    Key(KeyCode),
    Mouse(MouseButton),
}

fn parse_input_name(name: &str) -> Option<InputName> {
    if let Some(button) = parse_mouse_button(name) {
        return Some(InputName::Mouse(button));
    }
    KeyCode::from_name(name).map(InputName::Key)
}

fn parse_mouse_button(name: &str) -> Option<MouseButton> {
    if name.len() < 5 || !name.is_char_boundary(5) {
        return None;
    }
    if !name[..5].eq_ignore_ascii_case("mouse") {
        return None;
    }
    let suffix = &name[5..];
    if suffix.is_empty() {
        return Some(MouseButton::LEFT);
    }
    let index = suffix.parse::<u8>().ok()?;
    let index = index.saturating_sub(1);
    Some(MouseButton::new(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_character_and_digit_keys() {
        assert_eq!(KeyCode::from_name("Tab"), Some(KeyCode::Named(NamedKey::Tab)));
        assert_eq!(KeyCode::from_name("l"), Some(KeyCode::Character('L')));
        assert_eq!(KeyCode::from_name("2"), Some(KeyCode::Digit(2)));
        assert_eq!(KeyCode::from_name("="), Some(KeyCode::Named(NamedKey::Equal)));
        assert_eq!(KeyCode::from_name("Nope"), None);
    }

    #[test]
    fn mouse_names_are_supported() {
        assert_eq!(mouse_index("Mouse"), 0);
        assert_eq!(mouse_index("mouse3"), 2);
    }

    #[test]
    fn press_edge_fires_once_while_held() {
        let mut input = InputState::new();
        input.set_key_down(KeyCode::char('L'));
        assert!(input.is_key_pressed(KeyCode::char('L')));
        input.end_frame();

        // repeated OS press event while still held
        input.set_key_down(KeyCode::char('L'));
        assert!(input.is_key_down(KeyCode::char('L')));
        assert!(!input.is_key_pressed(KeyCode::char('L')));

        input.set_key_up(KeyCode::char('L'));
        input.end_frame();
        input.set_key_down(KeyCode::char('L'));
        assert!(input.is_key_pressed(KeyCode::char('L')));
    }

    #[test]
    fn deltas_reset_at_end_of_frame() {
        let mut input = InputState::new();
        input.add_mouse_delta(Vec2::new(3.0, -1.0));
        input.add_mouse_delta(Vec2::new(1.0, 1.0));
        input.add_wheel(1.0);
        assert_eq!(input.mouse_delta(), Vec2::new(4.0, 0.0));
        assert_eq!(input.wheel_move(), 1.0);
        input.end_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        assert_eq!(input.wheel_move(), 0.0);
    }

    #[test]
    fn press_by_name_handles_mouse_and_unknown_names() {
        let mut input = InputState::new();
        assert!(input.press_by_name("Mouse1"));
        assert!(input.is_mouse_button_pressed(MouseButton::LEFT));
        assert!(!input.press_by_name("Hyper"));
        assert!(input.release_by_name("Mouse1"));
        assert!(!input.is_mouse_button_down(MouseButton::LEFT));
    }

    fn mouse_index(name: &str) -> u8 {
        match parse_input_name(name).unwrap() {
            InputName::Mouse(button) => button.index(),
            InputName::Key(_) => panic!("expected mouse button"),
        }
    }
}
