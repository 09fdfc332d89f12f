//! Floor reflections clipped by the stencil buffer.
//!
//! Each frame the floor plane is drawn into the stencil mask, then every
//! renderable is drawn mirrored below the floor at low alpha where the mask
//! is set, and finally the renderables themselves are drawn on top. Both
//! blended groups are ordered back to front from the camera.

use glam::Vec3;

use crate::assets::{AssetRegistry, Model};
use crate::camera::Camera;
use crate::color::Color;
use crate::frame::{DrawList, Frame};
use crate::input::{InputState, KeyCode, MouseButton, NamedKey};
use crate::mesh::MeshData;
use crate::scene::{Light, Material, Renderable, RenderableList};

use super::{format_vec3, CursorMode, Lab, LabKind, WindowCommands};

const MOUSE_ROTATION: f32 = 0.1;
const RUN_FACTOR: f32 = 2.0;
const CRAWL_FACTOR: f32 = 0.3;
const WALK_HEIGHT: f32 = 6.0;
const SELECTION_STEP: f32 = 0.5;
const REFLECTION_ALPHA: f32 = 0.1;
const LAMP_DIMMED_ALPHA: f32 = 0.3;
const NIGHT: Color = Color::rgba(125, 41, 55, 100);

/// Index of the lamp cube, whose overlay alpha follows the light.
const LAMP: usize = 1;
const NAMES: [&str; 2] = ["ruby sphere", "lamp cube"];

pub struct StencilLab {
    camera: Camera,
    walking: bool,
    light: Light,
    renderables: RenderableList,
    floor: Model,
    assets: AssetRegistry,
}

impl StencilLab {
    pub fn new() -> Self {
        let mut assets = AssetRegistry::new();
        let sphere = Model::lit(assets.add_mesh(MeshData::sphere(2.0, 16, 16)));
        let cube = Model::lit(assets.add_mesh(MeshData::cube(5.0, 5.0, 5.0)));
        let floor = Model::lit(assets.add_mesh(MeshData::plane(40.0, 40.0, 5, 5)));

        let light = Light::point(Vec3::splat(10.0), false);
        let renderables = RenderableList::new(vec![
            Renderable::new(sphere, light.position, Material::RUBY),
            Renderable::new(cube, Vec3::new(7.0, 2.5, 0.0), Material::LAMP),
        ]);

        let camera = Camera::perspective(Vec3::new(25.0, 6.0, 25.0), Vec3::new(0.0, 3.0, 0.0), 45.0);
        let mut lab = Self {
            camera,
            walking: false,
            light,
            renderables,
            floor,
            assets,
        };
        lab.renderables.update_view_distances(lab.camera.position);
        lab
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn renderables(&self) -> &RenderableList {
        &self.renderables
    }

    pub fn walking(&self) -> bool {
        self.walking
    }

    /// Overlay material: as configured, except the lamp which is opaque
    /// while the light is on.
    fn overlay_material(&self, index: usize, material: Material) -> Material {
        if index != LAMP {
            return material;
        }
        let alpha = if self.light.enabled { 1.0 } else { LAMP_DIMMED_ALPHA };
        material.with_transparency(alpha)
    }
}

impl Default for StencilLab {
    fn default() -> Self {
        Self::new()
    }
}

impl Lab for StencilLab {
    fn kind(&self) -> LabKind {
        LabKind::Stencil
    }

    fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    fn update(&mut self, input: &InputState) -> WindowCommands {
        let key = |ch| input.is_key_down(KeyCode::char(ch));
        let pressed = |ch| input.is_key_pressed(KeyCode::char(ch));

        let mut cursor = None;
        if pressed('R') {
            cursor = Some(CursorMode::Released);
        }
        if input.is_mouse_button_pressed(MouseButton::LEFT) {
            cursor = Some(CursorMode::Captured);
        }

        let mut movement = Vec3::ZERO;
        if key('W') {
            movement.x = 1.0;
        }
        if key('S') {
            movement.x = -1.0;
        }
        if key('A') {
            movement.y = -1.0;
        }
        if key('D') {
            movement.y = 1.0;
        }
        let mut speed = 1.0;
        if input.is_key_down(KeyCode::Named(NamedKey::LeftShift)) {
            speed = RUN_FACTOR;
        }
        if input.is_key_down(KeyCode::Named(NamedKey::LeftCtrl)) {
            speed = CRAWL_FACTOR;
        }

        if pressed('L') {
            self.light.toggle();
            log::debug!("light enabled={}", self.light.enabled);
        }
        if pressed('P') {
            self.camera.toggle_projection();
        }
        if pressed('F') {
            self.walking = !self.walking;
            if self.walking {
                self.camera.position.y = WALK_HEIGHT;
                self.camera.target.y = WALK_HEIGHT;
            }
            log::debug!("walk mode={}", self.walking);
        }
        if !self.walking {
            if key('C') {
                movement.z = 1.0;
            }
            if key('V') {
                movement.z = -1.0;
            }
        }

        for index in 0..self.renderables.len() {
            if input.is_key_pressed(KeyCode::digit(index as u8 + 1)) && self.renderables.select(index) {
                log::debug!("selected {}", NAMES[index]);
            }
        }
        let arrow = |named| input.axis(KeyCode::Named(named)) * SELECTION_STEP;
        let shift = Vec3::new(
            arrow(NamedKey::Up) - arrow(NamedKey::Down),
            0.0,
            arrow(NamedKey::Left) - arrow(NamedKey::Right),
        );
        if let Some(selected) = self.renderables.selected_mut() {
            selected.position += shift;
        }

        let delta = input.mouse_delta() * MOUSE_ROTATION;
        self.camera.update_pro(
            movement * speed,
            Vec3::new(delta.x, delta.y, 0.0),
            -input.wheel_move(),
        );
        self.renderables.update_view_distances(self.camera.position);

        WindowCommands { cursor }
    }

    fn render(&self) -> DrawList {
        let clear = if self.light.enabled {
            Color::LIGHTGRAY
        } else {
            NIGHT
        };
        let order = self.renderables.back_to_front();
        let items = self.renderables.items();

        let mut frame = Frame::begin(&self.assets, &self.camera, clear);
        frame.set_view_position(self.camera.position);
        frame.set_light(&self.light);

        let mut frame = frame.begin_stencil_mask();
        frame.set_material(&Material::OBSIDIAN);
        frame.draw_model(self.floor, Vec3::ZERO, 1.0, Color::WHITE);

        let mut frame = frame.end_stencil_mask();
        for &index in &order {
            let item = &items[index];
            frame.set_material(&item.material.with_transparency(REFLECTION_ALPHA));
            let mirrored = Vec3::new(item.position.x, -1.0 - item.position.y, item.position.z);
            frame.draw_model_ex(item.model, mirrored, Vec3::X, 180.0, Vec3::ONE, Color::WHITE);
        }

        let mut frame = frame.end_stencil();
        for &index in &order {
            let item = &items[index];
            frame.set_material(&self.overlay_material(index, item.material));
            frame.draw_model(item.model, item.position, 1.0, Color::WHITE);
        }

        frame.finish()
    }

    fn summary(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "camera position={} target={}",
                format_vec3(self.camera.position),
                format_vec3(self.camera.target)
            ),
            format!("projection={:?} walk mode={}", self.camera.projection, self.walking),
            format!("light enabled={}", self.light.enabled),
            format!("selected={}", NAMES[self.renderables.selected()]),
        ];
        for (item, name) in self.renderables.items().iter().zip(NAMES) {
            lines.push(format!(
                " - {name} pos={} distance={:.2}",
                format_vec3(item.position),
                item.view_distance
            ));
        }
        lines
    }

    fn controls(&self) -> &'static [&'static str] {
        &[
            "W/A/S/D + mouse: move and look (shift faster, ctrl slower)",
            "C/V: move up/down, F: toggle walk mode",
            "L: toggle light, P: toggle projection",
            "1/2: select sphere/cube, arrows: move the selection",
            "R: release cursor, left click: capture",
        ]
    }
}
