use glam::Vec3;

use crate::assets::{AssetRegistry, MeshId};
use crate::camera::{Camera, CameraMode};
use crate::color::Color;
use crate::frame::{DrawList, Frame};
use crate::input::InputState;
use crate::mesh::MeshData;

use super::{CameraRig, Lab, LabKind, WindowCommands};

/// Grid, a cube with an arm, and a sphere/blade rotor that spins around
/// the X axis while `=` or `-` is held.
pub struct CameraLab {
    rig: CameraRig,
    assets: AssetRegistry,
    grid: MeshId,
    sphere_wires: MeshId,
}

impl CameraLab {
    pub fn new() -> Self {
        let mut assets = AssetRegistry::new();
        let grid = assets.add_mesh(MeshData::grid(20, 5.0));
        let sphere_wires = assets.add_mesh(MeshData::sphere_wires(1.0, 20, 10));
        Self {
            rig: CameraRig::new(Camera::perspective(
                Vec3::new(0.0, 10.0, 10.0),
                Vec3::ZERO,
                45.0,
            )),
            assets,
            grid,
            sphere_wires,
        }
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }
}

impl Default for CameraLab {
    fn default() -> Self {
        Self::new()
    }
}

impl Lab for CameraLab {
    fn kind(&self) -> LabKind {
        LabKind::Camera
    }

    fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    fn update(&mut self, input: &InputState) -> WindowCommands {
        self.rig.update(input)
    }

    fn render(&self) -> DrawList {
        let camera = &self.rig.camera;
        let rotor = self.rig.rotor;
        let mut frame = Frame::begin(&self.assets, camera, Color::RAYWHITE);

        frame.draw_mesh(self.grid, Vec3::ZERO, Vec3::ONE, Color::WHITE);
        if self.rig.mode == CameraMode::FirstPerson {
            frame.draw_cube(camera.target, Vec3::ONE, Color::PURPLE);
        }

        frame.with_matrix(|frame| {
            frame.translate(Vec3::new(rotor.offset, 0.0, 0.0));

            let body = Vec3::splat(2.0);
            frame.draw_cube(Vec3::ZERO, body, Color::RED);
            frame.draw_cube_wires(Vec3::ZERO, body, Color::BLACK);

            let arm_at = Vec3::new(1.0, 0.0, 0.0);
            let arm = Vec3::new(1.0, 0.25, 0.25);
            frame.draw_cube(arm_at, arm, Color::RED);
            frame.draw_cube_wires(arm_at, arm, Color::BLACK);

            frame.with_matrix(|frame| {
                frame.rotate(rotor.angle, Vec3::X);

                let ball_at = Vec3::new(-2.0, 0.0, 0.0);
                frame.draw_sphere(ball_at, 1.0, Color::BLUE);
                frame.draw_mesh(self.sphere_wires, ball_at, Vec3::ONE, Color::BLACK);

                let blade_at = Vec3::new(1.5, 0.0, 0.0);
                let blade = Vec3::new(0.1, 5.0, 0.5);
                frame.draw_cube(blade_at, blade, Color::ORANGE);
                frame.draw_cube_wires(blade_at, blade, Color::BLACK);
            });
        });

        frame.finish()
    }

    fn summary(&self) -> Vec<String> {
        self.rig.summary()
    }

    fn controls(&self) -> &'static [&'static str] {
        &[
            "1/2/3: custom, free, first-person camera",
            "W/A/S/D + mouse: move and look (shift to run)",
            "P: toggle perspective/orthographic",
            "=/-: spin the rotor",
            "Backspace: release cursor, left click: capture",
        ]
    }
}
