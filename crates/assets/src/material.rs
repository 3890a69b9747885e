use serde::{Deserialize, Serialize};
use stagecraft_common::{Color, TextureId};

/// How a material responds to scene lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shading {
    /// Flat color, ignores lights entirely.
    Unlit,
    /// Diffuse response to ambient and point lights.
    Lit,
}

/// Surface appearance of a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub color: Color,
    pub shading: Shading,
    /// Draw triangle edges as lines instead of filled faces.
    pub wireframe: bool,
    /// Albedo texture, multiplied with `color`.
    pub map: Option<TextureId>,
}

impl Material {
    /// Unlit material.
    pub fn basic(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            shading: Shading::Unlit,
            wireframe: false,
            map: None,
        }
    }

    /// Lit material.
    pub fn standard(name: impl Into<String>, color: Color) -> Self {
        Self {
            shading: Shading::Lit,
            ..Self::basic(name, color)
        }
    }

    pub fn with_wireframe(mut self) -> Self {
        self.wireframe = true;
        self
    }

    pub fn with_map(mut self, map: Option<TextureId>) -> Self {
        self.map = map;
        self
    }

    pub fn is_lit(&self) -> bool {
        self.shading == Shading::Lit
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::standard("default", Color::WHITE)
    }
}

/// Decoded RGBA8 texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}
