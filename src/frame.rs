//! Per-frame draw recording.
//!
//! A [`Frame`] records draw calls into a [`DrawList`] that the renderer
//! executes later. The pass phase is part of the frame's type: a frame
//! starts in [`Opaque`], may open a stencil mask ([`StencilWrite`]), switch
//! to drawing clipped by it ([`StencilTest`]) and close it again
//! ([`Overlay`]). Every transition consumes the frame, so draws cannot be
//! issued out of order and a frame cannot be finished with the stencil
//! still open:
//!
//! ```compile_fail
//! use graphics_labs::{assets::AssetRegistry, camera::Camera, color::Color, frame::Frame};
//!
//! let assets = AssetRegistry::new();
//! let camera = Camera::perspective(glam::Vec3::ONE, glam::Vec3::ZERO, 45.0);
//! let frame = Frame::begin(&assets, &camera, Color::WHITE).begin_stencil_mask();
//! frame.finish();
//! ```
//!
//! Each draw copies the current transform and the uniform slots (view
//! position, light, material), so later slot updates never leak into draws
//! that were already issued.

use std::marker::PhantomData;

use glam::{Mat4, Quat, Vec3};

use crate::assets::{AssetRegistry, MeshId, Model, Shading, TextureId};
use crate::camera::Camera;
use crate::color::Color;
use crate::mesh::Topology;
use crate::scene::{Light, Material};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PassPhase {
    Opaque,
    StencilWrite,
    StencilTest,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilMode {
    Disabled,
    /// Always passes and writes the reference value.
    Write,
    /// Passes where the stored value equals the reference. Read-only.
    Test,
}

impl PassPhase {
    pub fn stencil_mode(self) -> StencilMode {
        match self {
            Self::Opaque | Self::Overlay => StencilMode::Disabled,
            Self::StencilWrite => StencilMode::Write,
            Self::StencilTest => StencilMode::Test,
        }
    }

    /// The mask plane is drawn without touching depth.
    pub fn depth_write(self) -> bool {
        !matches!(self, Self::StencilWrite)
    }
}

pub trait Phase {
    const PHASE: PassPhase;
}

#[derive(Debug)]
pub struct Opaque;
#[derive(Debug)]
pub struct StencilWrite;
#[derive(Debug)]
pub struct StencilTest;
#[derive(Debug)]
pub struct Overlay;

impl Phase for Opaque {
    const PHASE: PassPhase = PassPhase::Opaque;
}
impl Phase for StencilWrite {
    const PHASE: PassPhase = PassPhase::StencilWrite;
}
impl Phase for StencilTest {
    const PHASE: PassPhase = PassPhase::StencilTest;
}
impl Phase for Overlay {
    const PHASE: PassPhase = PassPhase::Overlay;
}

/// Values of the lighting shader's uniform slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSlots {
    pub view_position: Vec3,
    pub light: Light,
    pub material: Material,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub phase: PassPhase,
    pub mesh: MeshId,
    pub topology: Topology,
    pub texture: Option<TextureId>,
    pub transform: Mat4,
    pub tint: Color,
    pub shading: Shading,
    pub uniforms: UniformSlots,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct DrawList {
    pub clear: Color,
    pub camera: Camera,
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    /// `true` when no draw belongs to an earlier phase than the one before it.
    pub fn phases_in_order(&self) -> bool {
        self.commands
            .windows(2)
            .all(|pair| pair[0].phase <= pair[1].phase)
    }

    pub fn count_in(&self, phase: PassPhase) -> usize {
        self.commands
            .iter()
            .filter(|command| command.phase == phase)
            .count()
    }

    pub fn uses_stencil(&self) -> bool {
        self.commands
            .iter()
            .any(|command| command.phase.stencil_mode() != StencilMode::Disabled)
    }
}

pub struct Frame<'a, P: Phase> {
    assets: &'a AssetRegistry,
    list: DrawList,
    matrix: Mat4,
    uniforms: UniformSlots,
    _phase: PhantomData<P>,
}

impl<'a> Frame<'a, Opaque> {
    pub fn begin(assets: &'a AssetRegistry, camera: &Camera, clear: Color) -> Self {
        Self {
            assets,
            list: DrawList {
                clear,
                camera: *camera,
                commands: Vec::new(),
            },
            matrix: Mat4::IDENTITY,
            uniforms: UniformSlots {
                view_position: camera.position,
                light: Light::default(),
                material: Material::default(),
            },
            _phase: PhantomData,
        }
    }

    /// Opens the stencil mask. Draws mark the stencil and skip depth writes.
    pub fn begin_stencil_mask(self) -> Frame<'a, StencilWrite> {
        self.transition()
    }

    pub fn finish(self) -> DrawList {
        self.list
    }
}

impl<'a> Frame<'a, StencilWrite> {
    /// Closes the mask. Following draws only land on marked pixels.
    pub fn end_stencil_mask(self) -> Frame<'a, StencilTest> {
        self.transition()
    }
}

impl<'a> Frame<'a, StencilTest> {
    pub fn end_stencil(self) -> Frame<'a, Overlay> {
        self.transition()
    }
}

impl<'a> Frame<'a, Overlay> {
    pub fn finish(self) -> DrawList {
        self.list
    }
}

impl<'a, P: Phase> Frame<'a, P> {
    fn transition<Q: Phase>(self) -> Frame<'a, Q> {
        log::trace!("pass {:?} -> {:?}", P::PHASE, Q::PHASE);
        Frame {
            assets: self.assets,
            list: self.list,
            matrix: self.matrix,
            uniforms: self.uniforms,
            _phase: PhantomData,
        }
    }

    pub fn assets(&self) -> &'a AssetRegistry {
        self.assets
    }

    pub fn set_view_position(&mut self, position: Vec3) {
        self.uniforms.view_position = position;
    }

    pub fn set_light(&mut self, light: &Light) {
        self.uniforms.light = *light;
    }

    pub fn set_material(&mut self, material: &Material) {
        self.uniforms.material = *material;
    }

    /// Runs `f` with a copy of the current matrix and restores it afterwards.
    pub fn with_matrix(&mut self, f: impl FnOnce(&mut Self)) {
        let saved = self.matrix;
        f(self);
        self.matrix = saved;
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.matrix *= Mat4::from_translation(offset);
    }

    /// Rotates by `degrees` around `axis` in local space.
    pub fn rotate(&mut self, degrees: f32, axis: Vec3) {
        let axis = axis.normalize_or_zero();
        if axis != Vec3::ZERO {
            self.matrix *= Mat4::from_axis_angle(axis, degrees.to_radians());
        }
    }

    pub fn draw_model(&mut self, model: Model, position: Vec3, scale: f32, tint: Color) {
        self.push(model, Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(scale)), tint);
    }

    /// Draws `model` scaled, then rotated by `degrees` around `axis`, then
    /// moved to `position`.
    pub fn draw_model_ex(
        &mut self,
        model: Model,
        position: Vec3,
        axis: Vec3,
        degrees: f32,
        scale: Vec3,
        tint: Color,
    ) {
        let rotation = match axis.try_normalize() {
            Some(axis) => Quat::from_axis_angle(axis, degrees.to_radians()),
            None => Quat::IDENTITY,
        };
        let local = Mat4::from_scale_rotation_translation(scale, rotation, position);
        self.push(model, local, tint);
    }

    pub fn draw_cube(&mut self, position: Vec3, size: Vec3, color: Color) {
        let mesh = self.assets.primitives().cube;
        self.draw_mesh(mesh, position, size, color);
    }

    pub fn draw_cube_wires(&mut self, position: Vec3, size: Vec3, color: Color) {
        let mesh = self.assets.primitives().cube_wires;
        self.draw_mesh(mesh, position, size, color);
    }

    pub fn draw_sphere(&mut self, center: Vec3, radius: f32, color: Color) {
        let mesh = self.assets.primitives().sphere;
        self.draw_mesh(mesh, center, Vec3::splat(radius), color);
    }

    /// Unlit, untextured draw of a registered mesh.
    pub fn draw_mesh(&mut self, mesh: MeshId, position: Vec3, scale: Vec3, color: Color) {
        let local = Mat4::from_translation(position) * Mat4::from_scale(scale);
        self.push(Model::unlit(mesh), local, color);
    }

    fn push(&mut self, model: Model, local: Mat4, tint: Color) {
        self.list.commands.push(DrawCommand {
            phase: P::PHASE,
            mesh: model.mesh,
            topology: self.assets.topology(model.mesh),
            texture: model.texture,
            transform: self.matrix * local,
            tint,
            shading: model.shading,
            uniforms: self.uniforms,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshData;

    fn camera() -> Camera {
        Camera::perspective(Vec3::new(25.0, 6.0, 25.0), Vec3::new(0.0, 3.0, 0.0), 45.0)
    }

    #[test]
    fn full_stencil_sequence_keeps_phase_order() {
        let mut assets = AssetRegistry::new();
        let plane = assets.add_mesh(MeshData::plane(40.0, 40.0, 5, 5));
        let camera = camera();

        let mut frame = Frame::begin(&assets, &camera, Color::LIGHTGRAY);
        frame.draw_cube(Vec3::ZERO, Vec3::ONE, Color::RED);
        let mut frame = frame.begin_stencil_mask();
        frame.draw_model(Model::lit(plane), Vec3::ZERO, 1.0, Color::WHITE);
        let mut frame = frame.end_stencil_mask();
        frame.draw_sphere(Vec3::new(0.0, -11.0, 0.0), 2.0, Color::WHITE);
        let mut frame = frame.end_stencil();
        frame.draw_sphere(Vec3::splat(10.0), 2.0, Color::WHITE);
        let list = frame.finish();

        assert!(list.phases_in_order());
        assert!(list.uses_stencil());
        assert_eq!(list.count_in(PassPhase::StencilWrite), 1);
        assert_eq!(list.commands[1].phase.stencil_mode(), StencilMode::Write);
        assert!(!list.commands[1].phase.depth_write());
        assert_eq!(list.commands[2].phase.stencil_mode(), StencilMode::Test);
        assert!(list.commands[2].phase.depth_write());
        assert_eq!(list.commands[3].phase.stencil_mode(), StencilMode::Disabled);
    }

    #[test]
    fn frame_without_stencil_finishes_from_opaque() {
        let assets = AssetRegistry::new();
        let mut frame = Frame::begin(&assets, &camera(), Color::RAYWHITE);
        frame.draw_cube(Vec3::ZERO, Vec3::splat(2.0), Color::RED);
        let list = frame.finish();
        assert_eq!(list.clear, Color::RAYWHITE);
        assert!(!list.uses_stencil());
    }

    #[test]
    fn each_draw_carries_the_material_set_before_it() {
        let assets = AssetRegistry::new();
        let mut frame = Frame::begin(&assets, &camera(), Color::WHITE);
        frame.set_material(&Material::RUBY.with_transparency(1.0));
        frame.draw_sphere(Vec3::ZERO, 1.0, Color::WHITE);
        frame.set_material(&Material::LAMP);
        frame.draw_sphere(Vec3::ZERO, 1.0, Color::WHITE);
        let list = frame.finish();

        assert_eq!(list.commands[0].uniforms.material.transparency, 1.0);
        assert_eq!(list.commands[0].uniforms.material.diffuse, Material::RUBY.diffuse);
        assert_eq!(list.commands[1].uniforms.material, Material::LAMP);
    }

    #[test]
    fn view_position_starts_at_camera() {
        let assets = AssetRegistry::new();
        let camera = camera();
        let mut frame = Frame::begin(&assets, &camera, Color::WHITE);
        frame.draw_cube(Vec3::ZERO, Vec3::ONE, Color::RED);
        frame.set_view_position(Vec3::ZERO);
        frame.draw_cube(Vec3::ZERO, Vec3::ONE, Color::RED);
        let list = frame.finish();
        assert_eq!(list.commands[0].uniforms.view_position, camera.position);
        assert_eq!(list.commands[1].uniforms.view_position, Vec3::ZERO);
    }

    #[test]
    fn matrix_scope_is_restored() {
        let assets = AssetRegistry::new();
        let mut frame = Frame::begin(&assets, &camera(), Color::WHITE);
        frame.with_matrix(|frame| {
            frame.translate(Vec3::new(1.0, 0.0, 0.0));
            frame.rotate(90.0, Vec3::Y);
            frame.draw_cube(Vec3::new(1.0, 0.0, 0.0), Vec3::ONE, Color::RED);
        });
        frame.draw_cube(Vec3::ZERO, Vec3::ONE, Color::RED);
        let list = frame.finish();

        let moved = list.commands[0].transform.transform_point3(Vec3::ZERO);
        assert!(moved.abs_diff_eq(Vec3::new(1.0, 0.0, -1.0), 1e-5), "{moved:?}");
        assert_eq!(list.commands[1].transform, Mat4::IDENTITY);
    }

    #[test]
    fn model_ex_flips_around_x() {
        let assets = AssetRegistry::new();
        let mut frame = Frame::begin(&assets, &camera(), Color::WHITE);
        let model = Model::lit(assets.primitives().sphere);
        frame.draw_model_ex(model, Vec3::new(7.0, -3.5, 0.0), Vec3::X, 180.0, Vec3::ONE, Color::WHITE);
        let list = frame.finish();

        let transform = list.commands[0].transform;
        let top = transform.transform_point3(Vec3::Y);
        assert!(top.abs_diff_eq(Vec3::new(7.0, -4.5, 0.0), 1e-5), "{top:?}");
    }

    #[test]
    fn wire_draws_are_lines() {
        let assets = AssetRegistry::new();
        let mut frame = Frame::begin(&assets, &camera(), Color::WHITE);
        frame.draw_cube_wires(Vec3::ZERO, Vec3::ONE, Color::BLACK);
        let list = frame.finish();
        assert_eq!(list.commands[0].topology, Topology::Lines);
        assert_eq!(list.commands[0].shading, Shading::Unlit);
    }
}
