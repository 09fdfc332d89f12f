//! Meshes and textures a lab builds at startup, addressed by handle.

use std::path::Path;

use crate::mesh::{MeshData, Topology};
use crate::texture::TextureData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Whether a draw goes through the lighting shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shading {
    /// Texture times tint times vertex colour.
    Unlit,
    /// Phong lighting from the light and material uniform slots.
    Lit,
}

/// Mesh with an optional diffuse texture and its shading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Model {
    pub mesh: MeshId,
    pub texture: Option<TextureId>,
    pub shading: Shading,
}

impl Model {
    pub fn unlit(mesh: MeshId) -> Self {
        Self {
            mesh,
            texture: None,
            shading: Shading::Unlit,
        }
    }

    pub fn lit(mesh: MeshId) -> Self {
        Self {
            mesh,
            texture: None,
            shading: Shading::Lit,
        }
    }

    pub fn with_texture(self, texture: TextureId) -> Self {
        Self {
            texture: Some(texture),
            ..self
        }
    }
}

/// Handles of the meshes behind the primitive draw calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitives {
    pub cube: MeshId,
    pub cube_wires: MeshId,
    pub sphere: MeshId,
}

#[derive(Debug)]
pub struct AssetRegistry {
    meshes: Vec<MeshData>,
    textures: Vec<TextureData>,
    primitives: Primitives,
}

impl AssetRegistry {
    /// Registry holding the unit primitives. Primitive draws scale them.
    pub fn new() -> Self {
        let meshes = vec![
            MeshData::cube(1.0, 1.0, 1.0),
            MeshData::cube_wires(1.0, 1.0, 1.0),
            MeshData::sphere(1.0, 16, 16),
        ];
        Self {
            meshes,
            textures: Vec::new(),
            primitives: Primitives {
                cube: MeshId(0),
                cube_wires: MeshId(1),
                sphere: MeshId(2),
            },
        }
    }

    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_texture_data(&mut self, texture: TextureData) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() - 1)
    }

    /// Loads a texture file. Missing files are replaced with a checkerboard.
    pub fn add_texture(&mut self, path: &Path, mipmaps: bool) -> TextureId {
        self.add_texture_data(TextureData::load_or_fallback(path, mipmaps))
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshData> {
        self.meshes.get(id.0)
    }

    pub fn topology(&self, id: MeshId) -> Topology {
        self.mesh(id)
            .map(|mesh| mesh.topology)
            .unwrap_or(Topology::Triangles)
    }

    pub fn meshes(&self) -> &[MeshData] {
        &self.meshes
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureData> {
        self.textures.get(id.0)
    }

    pub fn textures(&self) -> &[TextureData] {
        &self.textures
    }

    pub fn primitives(&self) -> Primitives {
        self.primitives
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_registered_first() {
        let assets = AssetRegistry::new();
        let primitives = assets.primitives();
        assert_eq!(assets.topology(primitives.cube), Topology::Triangles);
        assert_eq!(assets.topology(primitives.cube_wires), Topology::Lines);
        assert!(assets.mesh(primitives.sphere).is_some());
    }

    #[test]
    fn handles_index_added_assets() {
        let mut assets = AssetRegistry::new();
        let grid = assets.add_mesh(MeshData::grid(10, 1.0));
        assert_eq!(assets.topology(grid), Topology::Lines);

        let white = assets.add_texture_data(TextureData::white());
        assert_eq!(white, TextureId(0));
        assert_eq!(assets.texture(white).map(|t| t.width), Some(1));
        assert!(assets.texture(TextureId(5)).is_none());
    }

    #[test]
    fn missing_texture_file_still_yields_a_handle() {
        let dir = tempfile::tempdir().unwrap();
        let mut assets = AssetRegistry::new();
        let id = assets.add_texture(&dir.path().join("helicopter.png"), true);
        assert_eq!(assets.texture(id).map(|t| t.width), Some(64));
    }
}
