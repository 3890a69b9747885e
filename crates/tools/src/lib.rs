//! Developer tooling: read-only scene inspection.
//!
//! # Invariants
//! - Inspection never mutates the scene or camera.

mod inspector;

pub use inspector::{NodeInfo, SceneInspector, SceneSummary};
