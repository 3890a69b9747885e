//! Input-to-camera mapping.
//!
//! # Invariants
//! - Host input never touches the camera directly: events become
//!   [`CameraCommand`]s in a [`CommandQueue`], and the frame driver applies
//!   them once per tick before rendering.
//! - Orbit input is only recorded by handlers; the camera moves when
//!   [`OrbitController::update`] runs.

pub mod command;
pub mod orbit;
pub mod rig;
pub mod scroll;

pub use command::{CameraCommand, CommandQueue};
pub use orbit::OrbitController;
pub use rig::{CameraRig, RigEffect};
pub use scroll::{ScrollRig, ScrollTracker};
