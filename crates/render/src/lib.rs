//! Rendering interface: renderer-agnostic.
//!
//! # Invariants
//! - Renderers read the scene and camera; they never mutate either.
//! - Everything a backend draws is derived per frame from [`collect_batches`]
//!   and [`collect_lights`], so backends share one interpretation of the
//!   scene graph.

mod batch;
mod renderer;

pub use batch::{DrawBatch, LightRig, MAX_POINT_LIGHTS, PointLight, collect_batches, collect_lights};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "stagecraft-render v0.1.0"
}
