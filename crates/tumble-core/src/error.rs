use thiserror::Error;

use crate::types::FaceId;

/// Top-level error type for tumble.
#[derive(Debug, Error)]
pub enum TumbleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    #[error("Step error: {0}")]
    Step(#[from] StepError),

    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),
}

/// Configuration errors. Fatal at construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid gravity: {0} (must be > 0)")]
    InvalidGravity(f64),

    #[error("Goal face {face} out of range: closed faces are 0..{limit}")]
    GoalFaceOutOfRange { face: usize, limit: usize },

    #[error("Goal direction has no horizontal component")]
    DegenerateDirection,

    #[error("Unknown goal mode: {0} (expected \"face\" or \"dr\")")]
    UnknownMode(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised while binding the executor to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("Model has {got} rods, expected {expected}")]
    RodCount { expected: usize, got: usize },

    #[error("Model has {got} cables, expected {expected}")]
    CableCount { expected: usize, got: usize },

    #[error("Reference rod {0} has no pose")]
    ReferenceRodMissing(usize),
}

/// Per-tick errors. The tick is aborted and the executor state is left as it
/// was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum StepError {
    #[error("Invalid dt: {0} (must be > 0)")]
    InvalidDt(f64),

    #[error("Controller used before setup")]
    NotSetUp,

    #[error("Rod {0} has no pose")]
    MissingRod(usize),

    #[error("Cable {0} is not available")]
    MissingCable(usize),

    #[error("Planner fault: {0}")]
    Plan(#[from] PlanError),
}

/// Path planner errors.
///
/// Copy + static messages: raised from inside the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Face {face} out of range for a graph of {count} faces")]
    FaceOutOfRange { face: usize, count: usize },

    #[error("No path from {start} to {goal}")]
    Unreachable { start: FaceId, goal: FaceId },
}

impl PlanError {
    /// Whether this error indicates a broken graph rather than bad input.
    ///
    /// The icosahedron graph is connected, so an unreachable goal means the
    /// tables themselves are wrong. Callers must not retry on these.
    #[must_use]
    pub const fn is_logic_fault(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}
