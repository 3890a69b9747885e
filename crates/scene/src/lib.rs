//! Scene graph: nodes, lights, helpers and the camera that views them.
//!
//! # Invariants
//! - Nodes are only ever added; there is no removal path.
//! - Mesh nodes reference geometry and materials registered in the scene's
//!   own [`AssetStore`](stagecraft_assets::AssetStore).
//! - A camera's projection is fixed at construction; only its pose changes.

pub mod camera;
pub mod node;
pub mod scatter;
pub mod scene;

pub use camera::{Camera, Projection};
pub use node::{Light, NodeKind, SceneNode};
pub use scatter::scatter;
pub use scene::{Background, MAX_POINT_LIGHTS, Scene, SceneError};
