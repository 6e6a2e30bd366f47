//! PD and rest-length controllers for cable actuators.

use crate::cable::CableActuator;

// ---------------------------------------------------------------------------
// PdController
// ---------------------------------------------------------------------------

/// PD controller (no integral term).
///
/// Output: `kp × error + kd × d(error)/dt`.
///
/// Gains for length tracking:
/// - `kp`: `1/s` (m/s of reel speed per m of error).
/// - `kd`: dimensionless.
#[derive(Clone, Debug)]
pub struct PdController {
    /// Proportional gain.
    pub kp: f64,
    /// Derivative gain.
    pub kd: f64,
    last_error: f64,
    initialized: bool,
}

impl PdController {
    /// Create a new PD controller.
    pub const fn new(kp: f64, kd: f64) -> Self {
        Self {
            kp,
            kd,
            last_error: 0.0,
            initialized: false,
        }
    }

    /// Compute control output.
    ///
    /// - `setpoint`: target value.
    /// - `measured`: current value.
    /// - `dt`: timestep (seconds), must be > 0.
    pub fn compute(&mut self, setpoint: f64, measured: f64, dt: f64) -> f64 {
        let error = setpoint - measured;
        let derivative = if self.initialized {
            (error - self.last_error) / dt
        } else {
            self.initialized = true;
            0.0
        };
        self.last_error = error;
        self.kp.mul_add(error, self.kd * derivative)
    }

    /// Reset derivative state.
    pub const fn reset(&mut self) {
        self.last_error = 0.0;
        self.initialized = false;
    }
}

// ---------------------------------------------------------------------------
// LengthController
// ---------------------------------------------------------------------------

/// Drives one cable's rest length toward a target.
///
/// One controller is bound to each cable for the lifetime of a rolling
/// controller. Each call to [`track`](Self::track) issues a single
/// speed-limited rest-length command and reports convergence. Re-issuing the
/// same target is idempotent.
#[derive(Clone, Debug)]
pub struct LengthController {
    pd: PdController,
    max_speed: f64,
    tolerance: f64,
    target: Option<f64>,
}

impl LengthController {
    /// Create a controller.
    ///
    /// - `kp`, `kd`: PD gains on rest-length error.
    /// - `max_speed`: reel speed clamp (m/s).
    /// - `tolerance`: convergence band (m).
    pub const fn new(kp: f64, kd: f64, max_speed: f64, tolerance: f64) -> Self {
        Self {
            pd: PdController::new(kp, kd),
            max_speed,
            tolerance,
            target: None,
        }
    }

    /// Command `cable` toward `target` for one timestep and return whether
    /// its rest length is within tolerance afterwards.
    ///
    /// `dt` must be > 0.
    pub fn track<C: CableActuator + ?Sized>(&mut self, cable: &mut C, target: f64, dt: f64) -> bool {
        if self.target != Some(target) {
            // New setpoint: avoid a derivative kick from the old error.
            self.pd.reset();
            self.target = Some(target);
        }

        let current = cable.current_length();
        let error = target - current;
        let speed = self
            .pd
            .compute(target, current, dt)
            .clamp(-self.max_speed, self.max_speed);
        let step = speed * dt;
        let next = if step.abs() >= error.abs() {
            target
        } else {
            current + step
        };
        cable.set_rest_length(next, dt);

        self.is_converged(cable, target)
    }

    /// Whether `cable` sits within tolerance of `target`.
    pub fn is_converged<C: CableActuator + ?Sized>(&self, cable: &C, target: f64) -> bool {
        (cable.current_length() - target).abs() <= self.tolerance
    }

    /// Last commanded target, if any.
    pub const fn target(&self) -> Option<f64> {
        self.target
    }

    /// Convergence band (m).
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Forget the setpoint and derivative state.
    pub const fn reset(&mut self) {
        self.pd.reset();
        self.target = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
