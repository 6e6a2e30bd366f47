use std::str::FromStr;

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{CLOSED_FACE_COUNT, ROD_COUNT};

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_gravity() -> f64 {
    9.81
}
const fn default_rod_length() -> f64 {
    1.7
}
const fn default_rest_fraction() -> f64 {
    0.95
}
const fn default_contraction() -> f64 {
    0.35
}
const fn default_max_speed() -> f64 {
    0.5
}
const fn default_tolerance() -> f64 {
    0.005
}
const fn default_kp() -> f64 {
    10.0
}
const fn default_min_length() -> f64 {
    0.1
}
const fn default_height_threshold() -> f64 {
    0.05
}
const fn default_unsettled_warn_ticks() -> u32 {
    500
}
const fn default_max_step_ticks() -> u32 {
    3000
}
const fn default_max_retries() -> u32 {
    2
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// GoalMode / GoalConfig
// ---------------------------------------------------------------------------

/// Mode selector as written on the command line or in a scene file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalMode {
    /// Roll to a fixed closed face.
    Face,
    /// Dead reckoning: keep rolling toward a world-frame direction.
    DeadReckoning,
}

impl FromStr for GoalMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "face" => Ok(Self::Face),
            "dr" => Ok(Self::DeadReckoning),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Locomotion goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GoalConfig {
    /// Target closed face id (`0..CLOSED_FACE_COUNT`).
    Face { face: usize },
    /// World-frame direction `[x, y, z]`. The height (z) component is ignored.
    #[serde(rename = "dr")]
    DeadReckoning { direction: [f64; 3] },
}

impl GoalConfig {
    /// The mode selector for this goal.
    pub const fn mode(&self) -> GoalMode {
        match self {
            Self::Face { .. } => GoalMode::Face,
            Self::DeadReckoning { .. } => GoalMode::DeadReckoning,
        }
    }

    /// Validate the goal: face in the closed range, direction with a usable
    /// horizontal component.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Face { face } => {
                if face >= CLOSED_FACE_COUNT {
                    return Err(ConfigError::GoalFaceOutOfRange {
                        face,
                        limit: CLOSED_FACE_COUNT,
                    });
                }
            }
            Self::DeadReckoning { direction } => {
                if direction.iter().any(|v| !v.is_finite()) {
                    return Err(invalid("goal.direction", "must be finite"));
                }
                if direction[0].hypot(direction[1]) < 1e-9 {
                    return Err(ConfigError::DegenerateDirection);
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GeometryConfig
// ---------------------------------------------------------------------------

/// Structural dimensions of the six-bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Rod length in meters (default: 1.7).
    #[serde(default = "default_rod_length")]
    pub rod_length: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            rod_length: default_rod_length(),
        }
    }
}

// ---------------------------------------------------------------------------
// ActuationConfig
// ---------------------------------------------------------------------------

/// Cable rest lengths and length-controller tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuationConfig {
    /// Nominal rest length as a fraction of the icosahedron edge length
    /// (default: 0.95, i.e. slightly pretensioned).
    #[serde(default = "default_rest_fraction")]
    pub rest_fraction: f64,

    /// Fraction of the nominal rest length removed from a contracted cable
    /// (default: 0.35).
    #[serde(default = "default_contraction")]
    pub contraction: f64,

    /// Maximum cable reel speed in m/s (default: 0.5).
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Convergence tolerance on rest length in meters (default: 0.005).
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Proportional gain of the length controller, 1/s (default: 10).
    #[serde(default = "default_kp")]
    pub kp: f64,

    /// Derivative gain of the length controller (default: 0).
    #[serde(default)]
    pub kd: f64,

    /// Shortest rest length a motor will reel to, meters (default: 0.1).
    #[serde(default = "default_min_length")]
    pub min_length: f64,
}

impl Default for ActuationConfig {
    fn default() -> Self {
        Self {
            rest_fraction: default_rest_fraction(),
            contraction: default_contraction(),
            max_speed: default_max_speed(),
            tolerance: default_tolerance(),
            kp: default_kp(),
            kd: 0.0,
            min_length: default_min_length(),
        }
    }
}

// ---------------------------------------------------------------------------
// ContactConfig
// ---------------------------------------------------------------------------

/// Ground contact detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Maximum node height above the ground plane for a face to count as
    /// grounded, meters (default: 0.05).
    #[serde(default = "default_height_threshold")]
    pub height_threshold: f64,

    /// Height of the ground plane along world up (default: 0.0).
    #[serde(default)]
    pub ground_height: f64,

    /// Ticks without stable contact before a warning is logged while a roll
    /// is in flight (default: 500).
    #[serde(default = "default_unsettled_warn_ticks")]
    pub unsettled_warn_ticks: u32,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            height_threshold: default_height_threshold(),
            ground_height: 0.0,
            unsettled_warn_ticks: default_unsettled_warn_ticks(),
        }
    }
}

// ---------------------------------------------------------------------------
// StallConfig
// ---------------------------------------------------------------------------

/// What to do when a roll does not complete in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StallPolicy {
    /// Restart the step with the same commands, replanning after
    /// `max_retries` attempts.
    #[default]
    Retry,
    /// Replan from the current face straight away.
    Replan,
}

/// Bounds on a single roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StallConfig {
    /// Ticks a roll may spend on its start face before it counts as stalled
    /// (default: 3000).
    #[serde(default = "default_max_step_ticks")]
    pub max_step_ticks: u32,

    /// Stall handling (default: retry).
    #[serde(default)]
    pub policy: StallPolicy,

    /// Retries before a forced replan under [`StallPolicy::Retry`]
    /// (default: 2).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for StallConfig {
    fn default() -> Self {
        Self {
            max_step_ticks: default_max_step_ticks(),
            policy: StallPolicy::default(),
            max_retries: default_max_retries(),
        }
    }
}

// ---------------------------------------------------------------------------
// RollingConfig
// ---------------------------------------------------------------------------

/// Rolling controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct RollingConfig {
    /// Gravity magnitude in m/s^2. Must match the simulation; only used to
    /// scale the gravity-frame estimate.
    #[serde(default = "default_gravity")]
    pub gravity: f64,

    /// Locomotion goal.
    pub goal: GoalConfig,

    /// Rod whose pose defines the body frame (default: 0).
    #[serde(default)]
    pub reference_rod: usize,

    #[serde(default)]
    pub geometry: GeometryConfig,

    #[serde(default)]
    pub actuation: ActuationConfig,

    #[serde(default)]
    pub contact: ContactConfig,

    #[serde(default)]
    pub stall: StallConfig,
}

impl RollingConfig {
    /// Configuration for rolling to a fixed closed face.
    pub fn face(gravity: f64, face: usize) -> Self {
        Self::with_goal(gravity, GoalConfig::Face { face })
    }

    /// Configuration for dead reckoning toward `direction` (z ignored).
    pub fn dead_reckoning(gravity: f64, direction: [f64; 3]) -> Self {
        Self::with_goal(gravity, GoalConfig::DeadReckoning { direction })
    }

    fn with_goal(gravity: f64, goal: GoalConfig) -> Self {
        Self {
            gravity,
            goal,
            reference_rod: 0,
            geometry: GeometryConfig::default(),
            actuation: ActuationConfig::default(),
            contact: ContactConfig::default(),
            stall: StallConfig::default(),
        }
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.gravity.is_finite() && self.gravity > 0.0) {
            return Err(ConfigError::InvalidGravity(self.gravity));
        }
        self.goal.validate()?;
        if self.reference_rod >= ROD_COUNT {
            return Err(invalid("reference_rod", "must name one of the six rods"));
        }
        if !(self.geometry.rod_length > 0.0) {
            return Err(invalid("geometry.rod_length", "must be > 0"));
        }

        let act = &self.actuation;
        if !(act.rest_fraction > 0.0 && act.rest_fraction <= 1.0) {
            return Err(invalid("actuation.rest_fraction", "must be in (0, 1]"));
        }
        if !(act.contraction > 0.0 && act.contraction < 1.0) {
            return Err(invalid("actuation.contraction", "must be in (0, 1)"));
        }
        if !(act.max_speed > 0.0) {
            return Err(invalid("actuation.max_speed", "must be > 0"));
        }
        if !(act.tolerance > 0.0) {
            return Err(invalid("actuation.tolerance", "must be > 0"));
        }
        if act.kp <= 0.0 || act.kd < 0.0 {
            return Err(invalid("actuation.kp", "kp must be > 0 and kd >= 0"));
        }
        if act.min_length < 0.0 || act.min_length >= self.contracted_length() {
            return Err(invalid(
                "actuation.min_length",
                "must be non-negative and below the contracted length",
            ));
        }

        if !(self.contact.height_threshold > 0.0) {
            return Err(invalid("contact.height_threshold", "must be > 0"));
        }
        if self.stall.max_step_ticks == 0 {
            return Err(invalid("stall.max_step_ticks", "must be > 0"));
        }
        Ok(())
    }

    /// Edge length of the icosahedral hull: `rod_length / φ`.
    pub fn edge_length(&self) -> f64 {
        let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
        self.geometry.rod_length / phi
    }

    /// Rest length every cable is held at when not part of a roll.
    pub fn nominal_length(&self) -> f64 {
        self.edge_length() * self.actuation.rest_fraction
    }

    /// Rest length of a cable contracted for a roll.
    pub fn contracted_length(&self) -> f64 {
        self.nominal_length() * (1.0 - self.actuation.contraction)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_constructor_defaults() {
        let cfg = RollingConfig::face(9.81, 3);
        assert!((cfg.gravity - 9.81).abs() < f64::EPSILON);
        assert_eq!(cfg.goal, GoalConfig::Face { face: 3 });
        assert_eq!(cfg.reference_rod, 0);
        assert!((cfg.geometry.rod_length - 1.7).abs() < f64::EPSILON);
        assert!((cfg.actuation.rest_fraction - 0.95).abs() < f64::EPSILON);
        assert!((cfg.actuation.contraction - 0.35).abs() < f64::EPSILON);
        assert!((cfg.contact.height_threshold - 0.05).abs() < f64::EPSILON);
        assert_eq!(cfg.stall.max_step_ticks, 3000);
        assert_eq!(cfg.stall.policy, StallPolicy::Retry);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn goal_face_out_of_range_rejected() {
        let err = RollingConfig::face(9.81, 8).validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::GoalFaceOutOfRange { face: 8, limit: 8 }
        ));
    }

    #[test]
    fn every_closed_face_accepted() {
        for face in 0..CLOSED_FACE_COUNT {
            assert!(RollingConfig::face(9.81, face).validate().is_ok());
        }
    }

    #[test]
    fn non_positive_gravity_rejected() {
        for g in [0.0, -9.81, f64::NAN] {
            let err = RollingConfig::face(g, 0).validate().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidGravity(_)));
        }
    }

    #[test]
    fn vertical_direction_rejected() {
        let err = RollingConfig::dead_reckoning(9.81, [0.0, 0.0, 1.0])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DegenerateDirection));
    }

    #[test]
    fn height_component_does_not_matter() {
        let cfg = RollingConfig::dead_reckoning(9.81, [1.0, 0.0, 25.0]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn contraction_out_of_range_rejected() {
        let mut cfg = RollingConfig::face(9.81, 0);
        cfg.actuation.contraction = 1.0;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
    }

    #[test]
    fn reference_rod_out_of_range_rejected() {
        let mut cfg = RollingConfig::face(9.81, 0);
        cfg.reference_rod = 6;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn lengths_follow_rod_length() {
        let cfg = RollingConfig::face(9.81, 0);
        let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
        assert!((cfg.edge_length() - 1.7 / phi).abs() < 1e-12);
        assert!(cfg.contracted_length() < cfg.nominal_length());
        assert!(cfg.nominal_length() < cfg.edge_length());
    }

    #[test]
    fn mode_parses_from_str() {
        assert_eq!("face".parse::<GoalMode>().unwrap(), GoalMode::Face);
        assert_eq!("dr".parse::<GoalMode>().unwrap(), GoalMode::DeadReckoning);
        assert!(matches!(
            "roll".parse::<GoalMode>().unwrap_err(),
            ConfigError::UnknownMode(_)
        ));
    }

    #[test]
    fn goal_reports_mode() {
        assert_eq!(GoalConfig::Face { face: 1 }.mode(), GoalMode::Face);
        assert_eq!(
            GoalConfig::DeadReckoning {
                direction: [1.0, 0.0, 0.0]
            }
            .mode(),
            GoalMode::DeadReckoning
        );
    }

    #[test]
    fn toml_face_goal_with_defaults() {
        let toml_str = r#"
            gravity = 9.81

            [goal]
            mode = "face"
            face = 5
        "#;
        let cfg = RollingConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(cfg.goal, GoalConfig::Face { face: 5 });
        assert_eq!(cfg.actuation, ActuationConfig::default());
        assert_eq!(cfg.contact, ContactConfig::default());
    }

    #[test]
    fn toml_dr_goal_with_sections() {
        let toml_str = r#"
            [goal]
            mode = "dr"
            direction = [0.0, 1.0, 0.0]

            [geometry]
            rod_length = 1.2

            [stall]
            max_step_ticks = 400
            policy = "replan"
        "#;
        let cfg = RollingConfig::from_toml_str(toml_str).unwrap();
        assert!((cfg.gravity - 9.81).abs() < f64::EPSILON);
        assert_eq!(
            cfg.goal,
            GoalConfig::DeadReckoning {
                direction: [0.0, 1.0, 0.0]
            }
        );
        assert!((cfg.geometry.rod_length - 1.2).abs() < f64::EPSILON);
        assert_eq!(cfg.stall.max_step_ticks, 400);
        assert_eq!(cfg.stall.policy, StallPolicy::Replan);
        assert_eq!(cfg.stall.max_retries, 2);
    }

    #[test]
    fn toml_invalid_goal_face_fails_validation() {
        let toml_str = r#"
            [goal]
            mode = "face"
            face = 12
        "#;
        let err = RollingConfig::from_toml_str(toml_str).unwrap_err();
        assert!(matches!(err, ConfigError::GoalFaceOutOfRange { .. }));
    }

    #[test]
    fn toml_unknown_mode_is_parse_error() {
        let toml_str = r#"
            [goal]
            mode = "walk"
        "#;
        let err = RollingConfig::from_toml_str(toml_str).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn goal_json_tag_is_mode() {
        let json = serde_json::to_string(&GoalConfig::DeadReckoning {
            direction: [1.0, 0.0, 0.0],
        })
        .unwrap();
        assert!(json.contains("\"mode\":\"dr\""));
        let goal: GoalConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(goal.mode(), GoalMode::DeadReckoning);
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let err = RollingConfig::from_file("/nonexistent/tumble.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
