use glam::Vec3;

use crate::assets::{AssetRegistry, MeshId, Model, TextureId};
use crate::camera::{Camera, CameraMode};
use crate::color::Color;
use crate::config::LabConfig;
use crate::frame::{DrawList, Frame, Opaque};
use crate::input::InputState;
use crate::mesh::MeshData;

use super::{CameraRig, Lab, LabKind, WindowCommands};

const BODY_SIDE: f32 = 2.0;
const HOVER_HEIGHT: f32 = 10.0;

/// Textured box body hovering over a tiled ground, with the rotor group
/// spinning around the body's centre.
pub struct HelicopterLab {
    rig: CameraRig,
    assets: AssetRegistry,
    ground: Model,
    side: Model,
    ball: Model,
}

impl HelicopterLab {
    pub fn new(config: &LabConfig) -> Self {
        let mut assets = AssetRegistry::new();
        let body_texture = assets.add_texture(&config.asset_path("helicopter.png"), true);
        let ball_texture = assets.add_texture(&config.asset_path("bomb.png"), true);
        let ground_texture = assets.add_texture(&config.asset_path("img.png"), true);

        let ground = assets.add_mesh(MeshData::textured_quad(100.0, 100.0, 2.0));
        let side = assets.add_mesh(MeshData::textured_quad(BODY_SIDE, BODY_SIDE, 2.0));
        let ball = assets.add_mesh(MeshData::sphere(1.0, 20, 10));

        Self {
            rig: CameraRig::new(Camera::perspective(
                Vec3::new(0.0, 10.0, 10.0),
                Vec3::ZERO,
                45.0,
            )),
            assets,
            ground: textured(ground, ground_texture),
            side: textured(side, body_texture),
            ball: textured(ball, ball_texture),
        }
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    fn draw_body(&self, frame: &mut Frame<'_, Opaque>) {
        let half = BODY_SIDE / 2.0;
        // (offset from the body centre, rotations applied in order)
        let sides: [(Vec3, &[(f32, Vec3)]); 6] = [
            (Vec3::new(0.0, 0.0, half), &[(90.0, Vec3::X)]),
            (Vec3::new(-half, 0.0, 0.0), &[(90.0, Vec3::Z)]),
            (Vec3::new(0.0, 0.0, -half), &[(90.0, Vec3::X), (180.0, Vec3::Z)]),
            (Vec3::new(half, 0.0, 0.0), &[(-90.0, Vec3::Z)]),
            (Vec3::new(0.0, half, 0.0), &[]),
            (Vec3::new(0.0, -half, 0.0), &[(180.0, Vec3::X)]),
        ];
        for (offset, rotations) in sides {
            frame.with_matrix(|frame| {
                frame.translate(offset + Vec3::Y * HOVER_HEIGHT);
                for &(degrees, axis) in rotations {
                    frame.rotate(degrees, axis);
                }
                frame.draw_model(self.side, Vec3::ZERO, 1.0, Color::WHITE);
            });
        }
    }
}

fn textured(mesh: MeshId, texture: TextureId) -> Model {
    Model::unlit(mesh).with_texture(texture)
}

impl Lab for HelicopterLab {
    fn kind(&self) -> LabKind {
        LabKind::Helicopter
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

        if self.rig.mode == CameraMode::FirstPerson {
            frame.draw_cube(camera.target, Vec3::ONE, Color::PURPLE);
        }
        frame.draw_model(self.ground, Vec3::ZERO, 1.0, Color::WHITE);

        frame.with_matrix(|frame| {
            frame.translate(Vec3::new(rotor.offset, 0.0, 0.0));

            let arm_at = Vec3::new(1.0, HOVER_HEIGHT, 0.0);
            let arm = Vec3::new(1.0, 0.25, 0.25);
            frame.draw_cube(arm_at, arm, Color::RED);
            frame.draw_cube_wires(arm_at, arm, Color::BLACK);

            self.draw_body(frame);

            frame.with_matrix(|frame| {
                let pivot = Vec3::new(0.0, HOVER_HEIGHT, 0.0);
                frame.translate(pivot);
                frame.rotate(rotor.angle, Vec3::X);
                frame.translate(-pivot);

                frame.draw_model(self.ball, Vec3::new(-2.0, HOVER_HEIGHT, 0.0), 1.0, Color::WHITE);

                let blade_at = Vec3::new(1.5, HOVER_HEIGHT, 0.0);
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
            "=/-: spin the rotor and move the helicopter",
            "Backspace: release cursor, left click: capture",
        ]
    }
}
