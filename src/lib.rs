//! Interactive 3D lab scenes rendered with wgpu.
//!
//! Each lab owns its scene state and records a [`frame::DrawList`] per
//! frame. Recording is independent from the GPU, so every lab can be
//! stepped and inspected headless; [`app::run_windowed`] drives the same
//! labs through a winit window and the [`render::Renderer`].

pub mod app;
pub mod assets;
pub mod camera;
pub mod color;
pub mod config;
pub mod frame;
pub mod input;
pub mod labs;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod texture;
pub mod time;

pub use assets::{AssetRegistry, MeshId, Model, Shading, TextureId};
pub use camera::{Camera, CameraMode, Projection};
pub use color::Color;
pub use config::{ConfigError, LabConfig, WindowConfig};
pub use frame::{DrawCommand, DrawList, Frame, PassPhase};
pub use input::{is_known_input_name, InputState, KeyCode, MouseButton, NamedKey};
pub use labs::{create_lab, Lab, LabKind};
pub use mesh::{MeshData, Topology, Vertex};
pub use render::Renderer;
pub use scene::{Light, Material, Renderable, RenderableList, Rotor};
pub use texture::TextureData;
