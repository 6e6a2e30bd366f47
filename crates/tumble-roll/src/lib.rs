//! Rolling locomotion for a six-bar tensegrity.
//!
//! Each tick runs a fixed pipeline:
//!
//! 1. **Gravity-frame estimation**: body orientation from a reference rod,
//!    gravity expressed in the body frame.
//! 2. **Contact detection**: the face best aligned with gravity, confirmed
//!    by node heights.
//! 3. **Planning**: shortest roll sequence to the goal face, or to the face
//!    best aligned with a travel direction.
//! 4. **Execution**: cable rest-length commands for the current roll, with
//!    stall handling and replanning.
//!
//! The executor drives any [`TensegrityModel`]: a structure that exposes
//! rod poses and controllable cables.

pub mod contact;
pub mod executor;
pub mod gravity;
pub mod model;
#[cfg(feature = "bevy")]
pub mod plugin;
pub mod state;

pub use contact::{ContactDetector, ContactReading};
pub use executor::RollExecutor;
pub use gravity::{GravityEstimate, GravityEstimator};
pub use model::TensegrityModel;
#[cfg(feature = "bevy")]
pub use plugin::{RollController, RollSet, TumbleRollPlugin};
pub use state::{Plan, RollEvent, RollPhase, RollState, StepWatch, TickReport};

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::{
        ContactReading, GravityEstimate, RollEvent, RollExecutor, RollPhase, RollState,
        TensegrityModel, TickReport,
    };
    pub use tumble_core::{FaceId, GoalConfig, RollingConfig};
}
