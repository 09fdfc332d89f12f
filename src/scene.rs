//! Scene state shared by the labs: the point light, material presets,
//! positioned renderables and the rotor driven by the `=`/`-` keys.

use std::cmp::Ordering;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::assets::Model;

/// Point light as seen by the lighting shader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub enabled: bool,
    pub position: Vec3,
    pub target: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Light {
    /// White point light aimed at the origin.
    pub fn point(position: Vec3, enabled: bool) -> Self {
        Self {
            enabled,
            position,
            target: Vec3::ZERO,
            ambient: Vec3::ONE,
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
        }
    }

    /// Sets the diffuse and specular colour. Ambient is left alone.
    pub fn set_color(&mut self, color: Vec3) {
        self.diffuse = color;
        self.specular = color;
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::point(Vec3::ZERO, false)
    }
}

/// Phong material. `shininess` is the specular exponent, `transparency`
/// the output alpha in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
    pub transparency: f32,
}

impl Material {
    pub const RUBY: Self = Self {
        ambient: Vec3::new(0.1745, 0.01175, 0.01175),
        diffuse: Vec3::new(0.61424, 0.04136, 0.04136),
        specular: Vec3::new(0.727811, 0.626959, 0.626959),
        shininess: 0.6 * 128.0,
        transparency: 0.3,
    };

    pub const EMERALD: Self = Self {
        ambient: Vec3::new(0.0215, 0.1745, 0.0215),
        diffuse: Vec3::new(0.07568, 0.61424, 0.07568),
        specular: Vec3::new(0.633, 0.727811, 0.633),
        shininess: 0.6 * 128.0,
        transparency: 0.1,
    };

    pub const OBSIDIAN: Self = Self {
        ambient: Vec3::new(0.05375, 0.05, 0.06625),
        diffuse: Vec3::new(0.18275, 0.17, 0.22525),
        specular: Vec3::new(0.332741, 0.328634, 0.346435),
        shininess: 0.3 * 128.0,
        transparency: 1.0,
    };

    pub const LAMP: Self = Self {
        ambient: Vec3::ONE,
        diffuse: Vec3::ONE,
        specular: Vec3::ONE,
        shininess: 128.0,
        transparency: 0.3,
    };

    /// Working copy with the transparency overwritten.
    pub fn with_transparency(self, transparency: f32) -> Self {
        Self {
            transparency: transparency.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::OBSIDIAN
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderable {
    pub model: Model,
    pub position: Vec3,
    pub material: Material,
    /// Distance to the camera, recomputed every frame before drawing.
    pub view_distance: f32,
}

impl Renderable {
    pub fn new(model: Model, position: Vec3, material: Material) -> Self {
        Self {
            model,
            position,
            material,
            view_distance: 0.0,
        }
    }
}

/// Ordered renderables with a selection that always points at an element.
#[derive(Debug, Clone)]
pub struct RenderableList {
    items: Vec<Renderable>,
    selected: usize,
}

impl RenderableList {
    pub fn new(items: Vec<Renderable>) -> Self {
        Self { items, selected: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Renderable] {
        &self.items
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Selects `index`. Out-of-range indices leave the selection unchanged
    /// and return `false`.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.selected = index;
            true
        } else {
            false
        }
    }

    pub fn selected_mut(&mut self) -> Option<&mut Renderable> {
        self.items.get_mut(self.selected)
    }

    pub fn update_view_distances(&mut self, camera_position: Vec3) {
        for item in &mut self.items {
            item.view_distance = camera_position.distance(item.position);
        }
    }

    /// Indices ordered farthest first. Equal distances keep list order.
    pub fn back_to_front(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_by(|&a, &b| {
            self.items[b]
                .view_distance
                .partial_cmp(&self.items[a].view_distance)
                .unwrap_or(Ordering::Equal)
        });
        order
    }
}

/// Rotation angle in degrees paired with an unbounded offset.
///
/// Both directions share the same wrap check: the angle resets to zero once
/// it reaches 360, while negative angles are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotor {
    pub angle: f32,
    pub offset: f32,
}

impl Rotor {
    pub const ANGLE_STEP: f32 = 20.0;
    pub const OFFSET_STEP: f32 = 0.25;

    pub fn spin_forward(&mut self) {
        self.angle += Self::ANGLE_STEP;
        self.wrap();
        self.offset += Self::OFFSET_STEP;
    }

    pub fn spin_backward(&mut self) {
        self.angle -= Self::ANGLE_STEP;
        self.wrap();
        self.offset -= Self::OFFSET_STEP;
    }

    fn wrap(&mut self) {
        if self.angle >= 360.0 {
            self.angle = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MeshId, Model};

    fn model(id: usize) -> Model {
        Model::lit(MeshId(id))
    }

    #[test]
    fn rotor_wraps_to_zero_at_full_turn() {
        let mut rotor = Rotor::default();
        for step in 1..=17 {
            rotor.spin_forward();
            assert_eq!(rotor.angle, step as f32 * 20.0);
        }
        rotor.spin_forward();
        assert_eq!(rotor.angle, 0.0);
        assert_eq!(rotor.offset, 18.0 * 0.25);
    }

    #[test]
    fn rotor_340_plus_step_is_zero() {
        let mut rotor = Rotor {
            angle: 340.0,
            offset: 0.0,
        };
        rotor.spin_forward();
        assert_eq!(rotor.angle, 0.0);
    }

    #[test]
    fn negative_angles_never_wrap() {
        let mut rotor = Rotor::default();
        for _ in 0..30 {
            rotor.spin_backward();
        }
        assert_eq!(rotor.angle, -600.0);
        assert_eq!(rotor.offset, -7.5);
    }

    #[test]
    fn light_toggle_flips_each_time() {
        let mut light = Light::point(Vec3::splat(10.0), false);
        light.toggle();
        assert!(light.enabled);
        light.toggle();
        assert!(!light.enabled);
    }

    #[test]
    fn set_color_keeps_ambient() {
        let mut light = Light::point(Vec3::ZERO, true);
        light.set_color(Vec3::X);
        assert_eq!(light.diffuse, Vec3::X);
        assert_eq!(light.specular, Vec3::X);
        assert_eq!(light.ambient, Vec3::ONE);
    }

    #[test]
    fn emerald_is_nearly_clear() {
        assert_eq!(Material::EMERALD.transparency, 0.1);
        assert_eq!(Material::OBSIDIAN.transparency, 1.0);
    }

    #[test]
    fn transparency_override_leaves_preset_untouched() {
        let copy = Material::RUBY.with_transparency(1.0);
        assert_eq!(copy.transparency, 1.0);
        assert_eq!(Material::RUBY.transparency, 0.3);
        assert_eq!(copy.diffuse, Material::RUBY.diffuse);
    }

    #[test]
    fn distances_follow_positions() {
        let mut list = RenderableList::new(vec![
            Renderable::new(model(0), Vec3::ZERO, Material::RUBY),
            Renderable::new(model(1), Vec3::new(7.0, 2.5, 0.0), Material::LAMP),
        ]);
        let camera = Vec3::new(25.0, 6.0, 25.0);
        list.update_view_distances(camera);

        let d0 = (25.0_f32 * 25.0 + 6.0 * 6.0 + 25.0 * 25.0).sqrt();
        let d1 = (18.0_f32 * 18.0 + 3.5 * 3.5 + 25.0 * 25.0).sqrt();
        assert!((list.items()[0].view_distance - d0).abs() < 1e-4);
        assert!((list.items()[1].view_distance - d1).abs() < 1e-4);
        assert_eq!(list.back_to_front(), vec![0, 1]);
    }

    #[test]
    fn equal_distances_keep_list_order() {
        let mut list = RenderableList::new(vec![
            Renderable::new(model(0), Vec3::X, Material::RUBY),
            Renderable::new(model(1), Vec3::NEG_X, Material::LAMP),
            Renderable::new(model(2), Vec3::Z * 5.0, Material::LAMP),
        ]);
        list.update_view_distances(Vec3::ZERO);
        assert_eq!(list.back_to_front(), vec![2, 0, 1]);
    }

    #[test]
    fn selection_is_bounds_checked() {
        let mut list = RenderableList::new(vec![
            Renderable::new(model(0), Vec3::ZERO, Material::RUBY),
            Renderable::new(model(1), Vec3::ONE, Material::LAMP),
        ]);
        assert!(list.select(1));
        assert!(!list.select(2));
        assert_eq!(list.selected(), 1);

        if let Some(item) = list.selected_mut() {
            item.position.x += 0.5;
        }
        assert_eq!(list.items()[1].position.x, 1.5);
    }
}
