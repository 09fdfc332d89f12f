//! The four lab scenes.
//!
//! A lab owns its scene state and assets. The runtime calls
//! [`Lab::update`] once per frame with the polled input, then
//! [`Lab::render`] to record the frame's draws.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::assets::AssetRegistry;
use crate::config::LabConfig;
use crate::frame::DrawList;
use crate::input::InputState;

pub mod camera;
mod controls;
pub mod helicopter;
pub mod lighting;
pub mod stencil;

pub use camera::CameraLab;
pub use controls::CameraRig;
pub use helicopter::HelicopterLab;
pub use lighting::LightingLab;
pub use stencil::StencilLab;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabKind {
    Camera,
    Helicopter,
    Lighting,
    Stencil,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown lab {0:?}; expected one of camera, helicopter, lighting, stencil")]
pub struct UnknownLab(pub String);

impl LabKind {
    pub const ALL: [LabKind; 4] = [
        LabKind::Camera,
        LabKind::Helicopter,
        LabKind::Lighting,
        LabKind::Stencil,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Helicopter => "helicopter",
            Self::Lighting => "lighting",
            Self::Stencil => "stencil",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Camera => "camera modes, projection toggle and a spinning rotor",
            Self::Helicopter => "textured helicopter over a tiled ground",
            Self::Lighting => "Phong point light with material presets",
            Self::Stencil => "stencil-clipped floor reflections with alpha blending",
        }
    }

    /// Accepts the lab name or its lab number (`lab3`, `lab4`, `lab5`,
    /// `lab7`).
    pub fn from_name(name: &str) -> Result<Self, UnknownLab> {
        match name.to_ascii_lowercase().as_str() {
            "camera" | "lab3" => Ok(Self::Camera),
            "helicopter" | "lab4" => Ok(Self::Helicopter),
            "lighting" | "lab5" => Ok(Self::Lighting),
            "stencil" | "lab7" => Ok(Self::Stencil),
            _ => Err(UnknownLab(name.to_string())),
        }
    }
}

impl FromStr for LabKind {
    type Err = UnknownLab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for LabKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cursor state requested by a lab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    /// Hidden and locked to the window; mouse motion drives the camera.
    Captured,
    Released,
}

/// Window-side effects of a frame's update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowCommands {
    pub cursor: Option<CursorMode>,
}

pub trait Lab {
    fn kind(&self) -> LabKind;

    fn assets(&self) -> &AssetRegistry;

    fn initial_cursor(&self) -> CursorMode {
        CursorMode::Captured
    }

    /// Reads the frame's input and advances the scene state.
    fn update(&mut self, input: &InputState) -> WindowCommands;

    /// Records the frame's draws.
    fn render(&self) -> DrawList;

    /// Human-readable state, one line per entry.
    fn summary(&self) -> Vec<String>;

    /// Key bindings shown at startup.
    fn controls(&self) -> &'static [&'static str];
}

pub fn create_lab(kind: LabKind, config: &LabConfig) -> Box<dyn Lab> {
    match kind {
        LabKind::Camera => Box::new(CameraLab::new()),
        LabKind::Helicopter => Box::new(HelicopterLab::new(config)),
        LabKind::Lighting => Box::new(LightingLab::new(config)),
        LabKind::Stencil => Box::new(StencilLab::new()),
    }
}

pub(crate) fn format_vec3(v: glam::Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}
