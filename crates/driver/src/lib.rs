//! Frame driver: the per-tick update/render loop and the demo scenes it runs.
//!
//! # Invariants
//! - Within one tick, queued camera commands and per-tick animation are
//!   applied before the renderer is invoked, so a frame never shows the
//!   previous tick's state.
//! - All state lives in an explicit [`Stage`]; nothing is global.
//! - The loop stops only when its predicate says so (see [`StopToken`]).

pub mod demos;
pub mod frame;
pub mod stage;

pub use demos::{DemoConfig, Variant, Viewport, build};
pub use frame::{FixedRate, FrameScheduler, StopToken, Unpaced, run, run_with, tick};
pub use stage::{DriverError, Spin, Stage, TickReport};
