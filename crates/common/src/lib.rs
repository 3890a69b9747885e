//! Shared types used across the stagecraft crates.

mod color;
mod types;

pub use color::Color;
pub use types::{GeometryId, MaterialId, NodeId, TextureId, Transform};
