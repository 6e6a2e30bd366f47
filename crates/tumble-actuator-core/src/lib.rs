//! Framework-agnostic cable actuation for tensegrity robots.
//!
//! Pure Rust library with no engine dependencies. Provides a rate-limited
//! rest-length motor and the length controller that drives it toward a
//! commanded rest length.
//!
//! # Cable Pipeline
//!
//! ```text
//! Target length → LengthController → CableActuator::set_rest_length → rest length
//!                 (PD, speed clamp)   (motor speed / range limits)
//! ```
//!
//! # Quick Start
//!
//! ```
//! use tumble_actuator_core::prelude::*;
//!
//! let mut cable = CableMotor::new(1.0).with_max_speed(0.5);
//! let mut controller = LengthController::new(10.0, 0.0, 0.5, 0.005);
//!
//! let dt = 0.01;
//! let mut converged = false;
//! for _ in 0..500 {
//!     converged = controller.track(&mut cable, 0.7, dt);
//!     if converged {
//!         break;
//!     }
//! }
//! assert!(converged);
//! ```

pub mod cable;
pub mod control;
pub mod presets;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::cable::{CableActuator, CableMotor};
    pub use crate::control::{LengthController, PdController};
    pub use crate::presets;
}
