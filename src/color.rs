use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// 8-bit RGBA colour in sRGB space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const RED: Self = Self::rgba(230, 41, 55, 255);
    pub const GREEN: Self = Self::rgba(0, 228, 48, 255);
    pub const BLUE: Self = Self::rgba(0, 121, 241, 255);
    pub const ORANGE: Self = Self::rgba(255, 161, 0, 255);
    pub const PURPLE: Self = Self::rgba(200, 122, 255, 255);
    pub const LIGHTGRAY: Self = Self::rgba(200, 200, 200, 255);
    pub const RAYWHITE: Self = Self::rgba(245, 245, 245, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the colour with its alpha replaced by `alpha` in [0, 1].
    pub fn fade(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Normalised sRGB components, as fed to light colour uniforms.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }

    /// Linear-space RGBA for an sRGB render target.
    pub fn to_linear(self) -> Vec4 {
        Vec4::new(
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
            self.a as f32 / 255.0,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
