//! CPU-side RGBA textures with optional mip chains.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use image::imageops::{self, FilterType};
use image::RgbaImage;

/// One RGBA8 image per mip level, level 0 first.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub mips: Vec<Vec<u8>>,
}

impl TextureData {
    pub fn from_rgba(image: RgbaImage, mipmaps: bool) -> Result<Self> {
        let (width, height) = image.dimensions();
        ensure!(width > 0 && height > 0, "texture has zero size");

        let mut mips = Vec::new();
        if mipmaps {
            let mut level = image;
            loop {
                let (w, h) = level.dimensions();
                let next = if w > 1 || h > 1 {
                    Some(imageops::resize(
                        &level,
                        (w / 2).max(1),
                        (h / 2).max(1),
                        FilterType::Triangle,
                    ))
                } else {
                    None
                };
                mips.push(level.into_raw());
                match next {
                    Some(next) => level = next,
                    None => break,
                }
            }
        } else {
            mips.push(image.into_raw());
        }

        Ok(Self {
            width,
            height,
            mips,
        })
    }

    pub fn load(path: &Path, mipmaps: bool) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to load texture {}", path.display()))?
            .to_rgba8();
        Self::from_rgba(image, mipmaps)
    }

    /// Loads `path`, substituting a checkerboard when the file is missing or
    /// unreadable.
    pub fn load_or_fallback(path: &Path, mipmaps: bool) -> Self {
        match Self::load(path, mipmaps) {
            Ok(texture) => {
                log::info!(
                    "loaded texture {} ({}x{}, {} mips)",
                    path.display(),
                    texture.width,
                    texture.height,
                    texture.mip_count()
                );
                texture
            }
            Err(err) => {
                log::error!("{err:#}; using checkerboard");
                Self::checkerboard(64, 8)
            }
        }
    }

    /// Magenta/black checkerboard with `cell` pixel squares.
    pub fn checkerboard(size: u32, cell: u32) -> Self {
        let size = size.max(1);
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let on = ((x / cell) + (y / cell)) % 2 == 0;
                let texel = if on { [255, 0, 255, 255] } else { [0, 0, 0, 255] };
                pixels.extend_from_slice(&texel);
            }
        }
        Self {
            width: size,
            height: size,
            mips: vec![pixels],
        }
    }

    /// 1x1 white texel, bound for untextured draws.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            mips: vec![vec![255; 4]],
        }
    }

    pub fn mip_count(&self) -> u32 {
        self.mips.len() as u32
    }

    /// Size of `level`, never smaller than 1x1.
    pub fn mip_size(&self, level: u32) -> (u32, u32) {
        ((self.width >> level).max(1), (self.height >> level).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn mip_chain_halves_down_to_one_texel() {
        let image = RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 255]));
        let texture = TextureData::from_rgba(image, true).unwrap();
        assert_eq!(texture.mip_count(), 4);
        for level in 0..texture.mip_count() {
            let (w, h) = texture.mip_size(level);
            assert_eq!(texture.mips[level as usize].len(), (w * h * 4) as usize);
        }
        assert_eq!(texture.mip_size(3), (1, 1));
    }

    #[test]
    fn no_mipmaps_keeps_single_level() {
        let image = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        let texture = TextureData::from_rgba(image, false).unwrap();
        assert_eq!(texture.mip_count(), 1);
    }

    #[test]
    fn loads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let texture = TextureData::load(&path, true).unwrap();
        assert_eq!((texture.width, texture.height), (4, 4));
        assert_eq!(&texture.mips[0][..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn missing_file_falls_back_to_checkerboard() {
        let dir = tempfile::tempdir().unwrap();
        let texture = TextureData::load_or_fallback(&dir.path().join("missing.png"), true);
        assert_eq!(texture, TextureData::checkerboard(64, 8));
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let texture = TextureData::checkerboard(4, 2);
        let texel = |x: usize, y: usize| &texture.mips[0][(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
        assert_eq!(texel(0, 0), &[255, 0, 255, 255]);
        assert_eq!(texel(2, 0), &[0, 0, 0, 255]);
        assert_eq!(texel(2, 2), &[255, 0, 255, 255]);
    }
}
