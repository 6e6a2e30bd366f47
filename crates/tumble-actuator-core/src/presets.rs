//! Cable motor presets based on real tensegrity hardware.

use crate::cable::CableMotor;

/// Full-scale rover cable (NASA SUPERball class): spooled on a geared
/// brushless motor, about 0.3 m/s reel speed.
pub const fn superball_cable(rest_length: f64) -> CableMotor {
    CableMotor::new(rest_length)
        .with_max_speed(0.3)
        .with_range(0.2 * rest_length, 1.2 * rest_length)
}

/// Benchtop six-bar with hobby-servo spools.
pub const fn benchtop_cable(rest_length: f64) -> CableMotor {
    CableMotor::new(rest_length)
        .with_max_speed(0.08)
        .with_range(0.4 * rest_length, 1.1 * rest_length)
}

/// Idealized cable for planning studies: fast and unconstrained in range.
pub const fn ideal_cable(rest_length: f64) -> CableMotor {
    CableMotor::new(rest_length)
        .with_max_speed(10.0)
        .with_range(0.0, 4.0 * rest_length)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
