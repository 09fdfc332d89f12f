use glam::Vec3;

use crate::assets::{AssetRegistry, MeshId, Model};
use crate::camera::Camera;
use crate::color::Color;
use crate::config::LabConfig;
use crate::frame::{DrawList, Frame};
use crate::input::{InputState, KeyCode, NamedKey};
use crate::mesh::MeshData;
use crate::scene::{Light, Material};

use super::controls::{cursor_keys, fly, FlyKeys};
use super::{format_vec3, CursorMode, Lab, LabKind, WindowCommands};

const LIGHT_STEP: f32 = 0.1;
const INDICATOR_RADIUS: f32 = 0.2;

/// Selectable material presets, in key order.
const MATERIALS: [(&str, Material); 2] = [
    ("obsidian", Material::OBSIDIAN),
    ("emerald", Material::EMERALD),
];

/// A plane, a textured box and a textured ball lit by one movable point
/// light.
pub struct LightingLab {
    camera: Camera,
    light: Light,
    light_color: Color,
    material: usize,
    assets: AssetRegistry,
    plane: Model,
    cube: Model,
    sphere: Model,
    indicator: MeshId,
    indicator_wires: MeshId,
    grid: MeshId,
}

impl LightingLab {
    pub fn new(config: &LabConfig) -> Self {
        let mut assets = AssetRegistry::new();
        let tiles = assets.add_texture(&config.asset_path("img.png"), false);
        let bomb = assets.add_texture(&config.asset_path("bomb.png"), false);

        let plane = Model::lit(assets.add_mesh(MeshData::plane(10.0, 10.0, 3, 3)));
        let cube = Model::lit(assets.add_mesh(MeshData::cube(2.0, 4.0, 2.0))).with_texture(tiles);
        let sphere = Model::lit(assets.add_mesh(MeshData::sphere(1.0, 16, 12))).with_texture(bomb);
        let indicator = assets.add_mesh(MeshData::sphere(1.0, 8, 8));
        let indicator_wires = assets.add_mesh(MeshData::sphere_wires(1.0, 8, 8));
        let grid = assets.add_mesh(MeshData::grid(10, 1.0));

        Self {
            camera: Camera::perspective(Vec3::new(-2.0, 4.0, -6.0), Vec3::new(0.0, 0.5, 0.0), 45.0),
            light: Light::point(Vec3::new(-2.0, 1.0, -2.0), true),
            light_color: Color::WHITE,
            material: 0,
            assets,
            plane,
            cube,
            sphere,
            indicator,
            indicator_wires,
            grid,
        }
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn material(&self) -> Material {
        MATERIALS[self.material].1
    }

    fn set_light_color(&mut self, color: Color) {
        self.light_color = color;
        self.light.set_color(color.to_vec3());
        log::debug!("light color {color:?}");
    }
}

impl Lab for LightingLab {
    fn kind(&self) -> LabKind {
        LabKind::Lighting
    }

    fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    fn initial_cursor(&self) -> CursorMode {
        CursorMode::Released
    }

    fn update(&mut self, input: &InputState) -> WindowCommands {
        fly(&mut self.camera, input, FlyKeys::ARROWS);
        let cursor = cursor_keys(input);

        if input.is_key_pressed(KeyCode::Named(NamedKey::Tab)) {
            self.light.toggle();
            log::debug!("light enabled={}", self.light.enabled);
        }

        let step = |key| input.axis(key) * LIGHT_STEP;
        self.light.position += Vec3::new(
            step(KeyCode::char('A')) - step(KeyCode::char('D')),
            step(KeyCode::Named(NamedKey::LeftShift)) - step(KeyCode::Named(NamedKey::LeftCtrl)),
            step(KeyCode::char('W')) - step(KeyCode::char('S')),
        );

        for (key, color) in [
            ('R', Color::RED),
            ('G', Color::GREEN),
            ('B', Color::BLUE),
            ('F', Color::WHITE),
        ] {
            if input.is_key_pressed(KeyCode::char(key)) {
                self.set_light_color(color);
            }
        }

        for index in 0..MATERIALS.len() {
            if input.is_key_pressed(KeyCode::digit(index as u8 + 1)) {
                self.material = index;
                log::debug!("material {}", MATERIALS[index].0);
            }
        }

        WindowCommands { cursor }
    }

    fn render(&self) -> DrawList {
        let mut frame = Frame::begin(&self.assets, &self.camera, Color::RAYWHITE);
        frame.set_view_position(self.camera.position);
        frame.set_light(&self.light);
        frame.set_material(&self.material());

        frame.draw_model(self.plane, Vec3::ZERO, 1.0, Color::WHITE);
        frame.draw_model(self.cube, Vec3::ZERO, 1.0, Color::WHITE);
        frame.draw_model(self.sphere, Vec3::new(2.0, 2.5, 2.0), 1.0, Color::WHITE);

        let radius = Vec3::splat(INDICATOR_RADIUS);
        if self.light.enabled {
            frame.draw_mesh(self.indicator, self.light.position, radius, self.light_color);
        } else {
            frame.draw_mesh(
                self.indicator_wires,
                self.light.position,
                radius,
                self.light_color.fade(0.3),
            );
        }

        frame.draw_mesh(self.grid, Vec3::ZERO, Vec3::ONE, Color::WHITE);
        frame.finish()
    }

    fn summary(&self) -> Vec<String> {
        vec![
            format!(
                "camera position={} target={}",
                format_vec3(self.camera.position),
                format_vec3(self.camera.target)
            ),
            format!(
                "light enabled={} position={} color=({}, {}, {})",
                self.light.enabled,
                format_vec3(self.light.position),
                self.light_color.r,
                self.light_color.g,
                self.light_color.b
            ),
            format!("material={}", MATERIALS[self.material].0),
        ]
    }

    fn controls(&self) -> &'static [&'static str] {
        &[
            "Arrows + mouse: move and look (shift to run)",
            "Tab: toggle light",
            "W/A/S/D/Shift/Ctrl: move the light",
            "R/G/B/F: light color red, green, blue, white",
            "1/2: obsidian, emerald material",
            "Backspace: release cursor, left click: capture",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Shading;

    fn lab() -> LightingLab {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LabConfig::defaults(LabKind::Lighting);
        config.asset_dir = dir.path().to_path_buf();
        LightingLab::new(&config)
    }

    #[test]
    fn tab_toggles_on_press_edge() {
        let mut lab = lab();
        let mut input = InputState::new();
        input.set_key_down(KeyCode::Named(NamedKey::Tab));
        lab.update(&input);
        assert!(!lab.light().enabled);

        // still held: no second toggle
        input.end_frame();
        lab.update(&input);
        assert!(!lab.light().enabled);

        input.set_key_up(KeyCode::Named(NamedKey::Tab));
        input.end_frame();
        input.set_key_down(KeyCode::Named(NamedKey::Tab));
        lab.update(&input);
        assert!(lab.light().enabled);
    }

    #[test]
    fn held_keys_move_the_light_every_frame() {
        let mut lab = lab();
        let mut input = InputState::new();
        input.set_key_down(KeyCode::char('A'));
        input.set_key_down(KeyCode::char('W'));
        for _ in 0..10 {
            lab.update(&input);
            input.end_frame();
        }
        let position = lab.light().position;
        assert!(position.abs_diff_eq(Vec3::new(-1.0, 1.0, -1.0), 1e-4), "{position:?}");
    }

    #[test]
    fn color_and_material_presets() {
        let mut lab = lab();
        let mut input = InputState::new();
        input.set_key_down(KeyCode::char('R'));
        input.set_key_down(KeyCode::digit(2));
        lab.update(&input);
        assert_eq!(lab.light().diffuse, Color::RED.to_vec3());
        assert_eq!(lab.material(), Material::EMERALD);

        let list = lab.render();
        assert_eq!(list.commands[0].shading, Shading::Lit);
        assert_eq!(list.commands[0].uniforms.material, Material::EMERALD);
        assert_eq!(list.commands[0].uniforms.material.transparency, 0.1);
        assert_eq!(list.commands[3].tint, Color::RED);
    }

    #[test]
    fn disabled_light_draws_faded_wires() {
        let mut lab = lab();
        let mut input = InputState::new();
        input.set_key_down(KeyCode::Named(NamedKey::Tab));
        lab.update(&input);

        let list = lab.render();
        let indicator = &list.commands[3];
        assert_eq!(indicator.tint.a, 77);
        assert_eq!(indicator.mesh, lab.indicator_wires);
    }
}
