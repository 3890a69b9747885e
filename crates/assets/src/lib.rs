//! Asset registry: geometries, materials and textures behind content-addressed handles.
//!
//! The scene graph and renderers refer to assets by handle only. Registering
//! the same asset twice yields the same handle, so many meshes can share one
//! geometry/material pair without duplicating GPU resources.
//!
//! Texture files are decoded with the `image` crate. [`AssetStore::load_texture`]
//! never fails: a missing or undecodable file is logged and yields `None`, and
//! callers fall back to an untextured material.

mod geometry;
mod material;

pub use geometry::{Geometry, MeshData};
pub use material::{Material, Shading, Texture};

use sha2::{Digest, Sha256};
use stagecraft_common::{GeometryId, MaterialId, TextureId};
use std::collections::BTreeMap;
use std::path::Path;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("texture not found: {0:?}")]
    TextureNotFound(TextureId),
}

/// Content-addressed asset registry.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    geometries: BTreeMap<GeometryId, Geometry>,
    materials: BTreeMap<MaterialId, Material>,
    textures: BTreeMap<TextureId, Texture>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a geometry.
    pub fn register_geometry(&mut self, geometry: Geometry) -> Result<GeometryId, AssetError> {
        geometry.validate()?;
        let id = GeometryId(content_hash(&[b"geometry", &geometry.hash_bytes()]));
        self.geometries.insert(id, geometry);
        Ok(id)
    }

    /// Register a material. A `map` that is not registered is rejected.
    pub fn register_material(&mut self, material: Material) -> Result<MaterialId, AssetError> {
        if let Some(map) = material.map {
            if !self.textures.contains_key(&map) {
                return Err(AssetError::TextureNotFound(map));
            }
        }
        let id = MaterialId(material_hash(&material));
        self.materials.insert(id, material);
        Ok(id)
    }

    pub fn register_texture(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(content_hash(&[
            b"texture",
            &texture.width.to_le_bytes(),
            &texture.height.to_le_bytes(),
            &texture.pixels,
        ]));
        self.textures.insert(id, texture);
        id
    }

    /// Decode an image file into an RGBA8 texture and register it.
    pub fn try_load_texture(&mut self, path: impl AsRef<Path>) -> Result<TextureId, AssetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let rgba = image::load_from_memory(&bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        let id = self.register_texture(Texture {
            name: path.display().to_string(),
            width,
            height,
            pixels: rgba.into_raw(),
        });
        tracing::debug!("loaded texture {} ({width}x{height})", path.display());
        Ok(id)
    }

    /// Like [`Self::try_load_texture`], but degrades to `None` with a warning.
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Option<TextureId> {
        let path = path.as_ref();
        match self.try_load_texture(path) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "texture unavailable, using untextured material: {e}"
                );
                None
            }
        }
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(&id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(&id)
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

fn material_hash(material: &Material) -> u64 {
    let shading = [material.shading as u8, material.wireframe as u8];
    let map = material.map.map_or([0u8; 9], |t| {
        let mut out = [1u8; 9];
        out[1..].copy_from_slice(&t.0.to_le_bytes());
        out
    });
    content_hash(&[
        b"material",
        material.name.as_bytes(),
        &material.color.to_le_bytes(),
        &shading,
        &map,
    ])
}

fn content_hash(parts: &[&[u8]]) -> u64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecraft_common::Color;

    fn star() -> Geometry {
        Geometry::Sphere {
            radius: 0.25,
            width_segments: 24,
            height_segments: 24,
        }
    }

    #[test]
    fn register_geometry() {
        let mut store = AssetStore::new();
        let id = store.register_geometry(star()).unwrap();
        assert_eq!(store.geometry(id), Some(&star()));
        assert_eq!(store.geometry_count(), 1);
    }

    #[test]
    fn content_addressed_dedup() {
        let mut store = AssetStore::new();
        let a = store.register_geometry(star()).unwrap();
        let b = store.register_geometry(star()).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.geometry_count(), 1);

        let m1 = store
            .register_material(Material::standard("star", Color::WHITE))
            .unwrap();
        let m2 = store
            .register_material(Material::standard("star", Color::WHITE))
            .unwrap();
        assert_eq!(m1, m2);
        let wire = store
            .register_material(Material::standard("star", Color::WHITE).with_wireframe())
            .unwrap();
        assert_ne!(m1, wire);
        assert_eq!(store.material_count(), 2);
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let mut store = AssetStore::new();
        let err = store
            .register_geometry(Geometry::Box {
                width: 0.0,
                height: 1.0,
                depth: 1.0,
            })
            .unwrap_err();
        assert!(matches!(err, AssetError::InvalidGeometry(_)));
        assert_eq!(store.geometry_count(), 0);
    }

    #[test]
    fn material_with_unknown_map_is_rejected() {
        let mut store = AssetStore::new();
        let m = Material::standard("ghost", Color::WHITE).with_map(Some(TextureId(42)));
        assert!(matches!(
            store.register_material(m),
            Err(AssetError::TextureNotFound(TextureId(42)))
        ));
    }

    #[test]
    fn load_png_texture() {
        let tmp = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        image::RgbaImage::from_pixel(2, 3, image::Rgba([255, 0, 0, 255]))
            .save(tmp.path())
            .unwrap();

        let mut store = AssetStore::new();
        let id = store.try_load_texture(tmp.path()).unwrap();
        let tex = store.texture(id).unwrap();
        assert_eq!((tex.width, tex.height), (2, 3));
        assert_eq!(tex.pixels.len(), 2 * 3 * 4);
        assert_eq!(&tex.pixels[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn missing_texture_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AssetStore::new();
        assert!(matches!(
            store.try_load_texture(dir.path().join("space.jpg")),
            Err(AssetError::Io(_))
        ));
        assert!(store.load_texture(dir.path().join("space.jpg")).is_none());
        assert_eq!(store.texture_count(), 0);
    }

    #[test]
    fn corrupt_texture_degrades_to_none() {
        let tmp = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        std::fs::write(tmp.path(), b"definitely not a png").unwrap();
        let mut store = AssetStore::new();
        assert!(matches!(
            store.try_load_texture(tmp.path()),
            Err(AssetError::Image(_))
        ));
        assert!(store.load_texture(tmp.path()).is_none());
    }
}
