//! wgpu render backend.
//!
//! Draws the scene graph through the [`Renderer`](stagecraft_render::Renderer)
//! interface: a clear colour or full-screen background texture, instanced
//! triangle meshes with ambient and point lighting, and line meshes for
//! wireframe materials, grids and light helpers.
//!
//! # Invariants
//! - Renderer never mutates the scene or camera.
//! - The returned [`SurfaceFrame`] is not presented until the caller is done
//!   drawing overlays into it.

mod context;
mod gpu;
mod mesh;
mod shaders;

pub use context::GpuContext;
pub use gpu::{SurfaceFrame, WgpuRenderer};

/// Errors from GPU setup and frame acquisition.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no GPU adapter compatible with the surface")]
    NoAdapter,
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface error: {0}")]
    Surface(wgpu::SurfaceError),
}
