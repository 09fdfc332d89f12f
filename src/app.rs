//! Windowed runtime: owns the event loop, feeds polled input to a lab and
//! hands its draw lists to the renderer at the configured frame rate.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use glam::Vec2;
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{
    DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton as WinitMouseButton,
    MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode as WinitKey, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::config::LabConfig;
use crate::input::{InputState, KeyCode, MouseButton, NamedKey};
use crate::labs::{CursorMode, Lab};
use crate::render::Renderer;
use crate::time::{FpsCounter, FramePacer};

/// Pixel scroll distance treated as one wheel notch.
const PIXELS_PER_LINE: f32 = 120.0;

/// The platform could not provide an event loop or a window.
#[derive(Debug)]
pub struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

/// Opens a window for `lab` and runs it until the window is closed or
/// Escape is pressed. Returns the lab so its final state can be reported.
pub fn run_windowed(lab: Box<dyn Lab>, config: &LabConfig) -> Result<Box<dyn Lab>> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;

    let mut app = App::new(lab, config.clone());
    event_loop.run_app(&mut app)?;

    if let Some(err) = app.error {
        return Err(err);
    }
    Ok(app.lab)
}

struct App {
    lab: Box<dyn Lab>,
    config: LabConfig,
    input: InputState,
    renderer: Option<Renderer>,
    pacer: FramePacer,
    fps: FpsCounter,
    cursor: Option<CursorMode>,
    focused: bool,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(lab: Box<dyn Lab>, config: LabConfig) -> Self {
        let now = Instant::now();
        Self {
            lab,
            pacer: FramePacer::new(config.target_fps, now),
            config,
            input: InputState::new(),
            renderer: None,
            fps: FpsCounter::new(now),
            cursor: None,
            focused: true,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:?}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn create_renderer(&mut self, event_loop: &ActiveEventLoop) -> Result<Renderer> {
        let window_config = &self.config.window;
        let attributes = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(LogicalSize::new(
                window_config.width as f64,
                window_config.height as f64,
            ))
            .with_resizable(window_config.resizable);
        let window = event_loop
            .create_window(attributes)
            .map_err(|err| WindowInitError::from_error("window", err))?;
        let window = Arc::new(window);
        block_on(Renderer::new(
            window,
            self.lab.assets(),
            self.config.sample_count(),
        ))
    }

    fn set_cursor(&mut self, mode: CursorMode) {
        if self.cursor == Some(mode) {
            return;
        }
        let Some(renderer) = &self.renderer else {
            return;
        };
        let window = renderer.window();
        match mode {
            CursorMode::Captured => {
                let grabbed = window
                    .set_cursor_grab(CursorGrabMode::Locked)
                    .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
                if let Err(err) = grabbed {
                    log::warn!("cursor grab unavailable: {err}");
                }
                window.set_cursor_visible(false);
            }
            CursorMode::Released => {
                if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
                    log::warn!("cursor release failed: {err}");
                }
                window.set_cursor_visible(true);
            }
        }
        log::debug!("cursor {mode:?}");
        self.cursor = Some(mode);
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(key) = map_keycode(code) else {
            return;
        };
        match event.state {
            ElementState::Pressed => {
                if key == KeyCode::Named(NamedKey::Escape) {
                    event_loop.exit();
                }
                self.input.set_key_down(key);
            }
            ElementState::Released => self.input.set_key_up(key),
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState, button: WinitMouseButton) {
        let index = match button {
            WinitMouseButton::Left => 0,
            WinitMouseButton::Right => 1,
            WinitMouseButton::Middle => 2,
            WinitMouseButton::Back => 3,
            WinitMouseButton::Forward => 4,
            WinitMouseButton::Other(value) => value.min(u8::MAX as u16) as u8,
        };
        let button = MouseButton::new(index);
        match state {
            ElementState::Pressed => self.input.set_mouse_button_down(button),
            ElementState::Released => self.input.set_mouse_button_up(button),
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let commands = self.lab.update(&self.input);
        self.input.end_frame();
        if let Some(cursor) = commands.cursor {
            self.set_cursor(cursor);
        }

        let list = self.lab.render();
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        match renderer.render(&list) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = renderer.window().inner_size();
                renderer.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow!("GPU is out of memory"));
                return;
            }
            Err(err) => log::warn!("skipping frame: {err}"),
        }

        if self.fps.tick(Instant::now()) {
            let title = format!("{} - {:.0} FPS", self.config.window.title, self.fps.fps());
            renderer.window().set_title(&title);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        match self.create_renderer(event_loop) {
            Ok(renderer) => {
                self.renderer = Some(renderer);
                log::info!("running {} lab", self.lab.kind());
                for line in self.lab.controls() {
                    log::info!("  {line}");
                }
                let cursor = self.lab.initial_cursor();
                self.set_cursor(cursor);
                self.pacer = FramePacer::new(self.config.target_fps, Instant::now());
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if window_id != renderer.window_id() {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => renderer.resize(size),
            WindowEvent::Focused(focused) => {
                self.focused = focused;
                if !focused {
                    self.input.release_all();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_button(state, button)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
                };
                self.input.add_wheel(lines);
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.focused {
                self.input.add_mouse_delta(Vec2::new(dx as f32, dy as f32));
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        let now = Instant::now();
        if self.pacer.ready(now) {
            renderer.window().request_redraw();
            self.pacer.advance(now);
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.pacer.deadline()));
    }
}

fn map_keycode(code: WinitKey) -> Option<KeyCode> {
    Some(match code {
        WinitKey::Space => KeyCode::Named(NamedKey::Space),
        WinitKey::Enter => KeyCode::Named(NamedKey::Enter),
        WinitKey::Tab => KeyCode::Named(NamedKey::Tab),
        WinitKey::ArrowLeft => KeyCode::Named(NamedKey::Left),
        WinitKey::ArrowRight => KeyCode::Named(NamedKey::Right),
        WinitKey::ArrowUp => KeyCode::Named(NamedKey::Up),
        WinitKey::ArrowDown => KeyCode::Named(NamedKey::Down),
        WinitKey::Escape => KeyCode::Named(NamedKey::Escape),
        WinitKey::Backspace => KeyCode::Named(NamedKey::Backspace),
        WinitKey::Equal => KeyCode::Named(NamedKey::Equal),
        WinitKey::Minus => KeyCode::Named(NamedKey::Minus),
        WinitKey::ShiftLeft => KeyCode::Named(NamedKey::LeftShift),
        WinitKey::ShiftRight => KeyCode::Named(NamedKey::RightShift),
        WinitKey::ControlLeft => KeyCode::Named(NamedKey::LeftCtrl),
        WinitKey::ControlRight => KeyCode::Named(NamedKey::RightCtrl),
        WinitKey::AltLeft => KeyCode::Named(NamedKey::LeftAlt),
        WinitKey::AltRight => KeyCode::Named(NamedKey::RightAlt),
        WinitKey::Digit0 => KeyCode::Digit(0),
        WinitKey::Digit1 => KeyCode::Digit(1),
        WinitKey::Digit2 => KeyCode::Digit(2),
        WinitKey::Digit3 => KeyCode::Digit(3),
        WinitKey::Digit4 => KeyCode::Digit(4),
        WinitKey::Digit5 => KeyCode::Digit(5),
        WinitKey::Digit6 => KeyCode::Digit(6),
        WinitKey::Digit7 => KeyCode::Digit(7),
        WinitKey::Digit8 => KeyCode::Digit(8),
        WinitKey::Digit9 => KeyCode::Digit(9),
        WinitKey::KeyA => KeyCode::Character('A'),
        WinitKey::KeyB => KeyCode::Character('B'),
        WinitKey::KeyC => KeyCode::Character('C'),
        WinitKey::KeyD => KeyCode::Character('D'),
        WinitKey::KeyE => KeyCode::Character('E'),
        WinitKey::KeyF => KeyCode::Character('F'),
        WinitKey::KeyG => KeyCode::Character('G'),
        WinitKey::KeyH => KeyCode::Character('H'),
        WinitKey::KeyI => KeyCode::Character('I'),
        WinitKey::KeyJ => KeyCode::Character('J'),
        WinitKey::KeyK => KeyCode::Character('K'),
        WinitKey::KeyL => KeyCode::Character('L'),
        WinitKey::KeyM => KeyCode::Character('M'),
        WinitKey::KeyN => KeyCode::Character('N'),
        WinitKey::KeyO => KeyCode::Character('O'),
        WinitKey::KeyP => KeyCode::Character('P'),
        WinitKey::KeyQ => KeyCode::Character('Q'),
        WinitKey::KeyR => KeyCode::Character('R'),
        WinitKey::KeyS => KeyCode::Character('S'),
        WinitKey::KeyT => KeyCode::Character('T'),
        WinitKey::KeyU => KeyCode::Character('U'),
        WinitKey::KeyV => KeyCode::Character('V'),
        WinitKey::KeyW => KeyCode::Character('W'),
        WinitKey::KeyX => KeyCode::Character('X'),
        WinitKey::KeyY => KeyCode::Character('Y'),
        WinitKey::KeyZ => KeyCode::Character('Z'),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_lab_bindings() {
        assert_eq!(map_keycode(WinitKey::KeyW), Some(KeyCode::char('W')));
        assert_eq!(map_keycode(WinitKey::Digit3), Some(KeyCode::digit(3)));
        assert_eq!(map_keycode(WinitKey::Equal), Some(KeyCode::Named(NamedKey::Equal)));
        assert_eq!(map_keycode(WinitKey::ShiftLeft), Some(KeyCode::Named(NamedKey::LeftShift)));
        assert_eq!(map_keycode(WinitKey::F13), None);
    }

    #[test]
    fn panic_payloads_become_messages() {
        let err = WindowInitError::from_panic("event loop", Box::new("no display"));
        assert_eq!(err.to_string(), "failed to initialize event loop: no display");
        let err = WindowInitError::from_panic("window", Box::new(42));
        assert!(err.to_string().ends_with("unknown panic"));
    }
}
