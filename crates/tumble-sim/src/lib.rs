//! Headless simulation for the rolling controller.
//!
//! - [`KinematicSixBar`]: a rigid six-bar that tips onto a neighboring face
//!   once the cables of that roll have contracted far enough.
//! - [`HeadlessRunner`]: drives a [`RollExecutor`](tumble_roll::RollExecutor)
//!   and the rig for a tick budget.
//! - [`RollStats`]: counters accumulated over a run.

pub mod headless;
pub mod rig;
pub mod stats;

pub use headless::{HeadlessRunner, RunOutcome};
pub use rig::{KinematicSixBar, RigConfig};
pub use stats::RollStats;
