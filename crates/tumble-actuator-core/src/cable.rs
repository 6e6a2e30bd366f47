//! Cable actuator interface and a rate-limited rest-length motor.
//!
//! [`CableActuator`] is the narrow capability a controller needs from a
//! physical cable: read its rest length, command a new one. [`CableMotor`]
//! is the reference implementation used by the kinematic simulator.

// ---------------------------------------------------------------------------
// CableActuator
// ---------------------------------------------------------------------------

/// A cable whose rest length can be commanded.
pub trait CableActuator {
    /// Current rest length (m).
    fn current_length(&self) -> f64;

    /// Move the rest length toward `length` over one timestep of `dt`
    /// seconds. Implementations apply their own speed and range limits, so
    /// the new rest length may fall short of `length`.
    fn set_rest_length(&mut self, length: f64, dt: f64);
}

// ---------------------------------------------------------------------------
// CableMotor
// ---------------------------------------------------------------------------

/// Spool motor that reels a cable's rest length at a bounded speed.
///
/// Limits:
/// - Speed: `|Δlength| <= max_speed * dt` per call.
/// - Range: rest length stays within `[min_length, max_length]`.
#[derive(Clone, Debug)]
pub struct CableMotor {
    /// Maximum reel speed (m/s).
    pub max_speed: f64,
    /// Shortest allowed rest length (m).
    pub min_length: f64,
    /// Longest allowed rest length (m).
    pub max_length: f64,
    start_length: f64,
    rest_length: f64,
}

impl CableMotor {
    /// Create a motor holding `rest_length`.
    ///
    /// Defaults: `max_speed = 1.0 m/s`, range `[0, 2 × rest_length]`.
    pub const fn new(rest_length: f64) -> Self {
        Self {
            max_speed: 1.0,
            min_length: 0.0,
            max_length: 2.0 * rest_length,
            start_length: rest_length,
            rest_length,
        }
    }

    /// Set the maximum reel speed (m/s).
    pub const fn with_max_speed(mut self, max_speed: f64) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Set the allowed rest-length range (m).
    pub const fn with_range(mut self, min_length: f64, max_length: f64) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }

    /// Rest length the motor was created with.
    pub const fn start_length(&self) -> f64 {
        self.start_length
    }

    /// Return to the starting rest length.
    pub const fn reset(&mut self) {
        self.rest_length = self.start_length;
    }
}

impl CableActuator for CableMotor {
    fn current_length(&self) -> f64 {
        self.rest_length
    }

    fn set_rest_length(&mut self, length: f64, dt: f64) {
        if dt <= 0.0 || !length.is_finite() {
            return;
        }
        let max_step = self.max_speed * dt;
        let step = (length - self.rest_length).clamp(-max_step, max_step);
        self.rest_length = (self.rest_length + step).clamp(self.min_length, self.max_length);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
