// tumble-core: Face ids, configuration and errors for six-bar tensegrity rolling.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    ActuationConfig, ContactConfig, GeometryConfig, GoalConfig, GoalMode, RollingConfig,
    StallConfig, StallPolicy,
};
pub use error::{ConfigError, PlanError, SetupError, StepError, TumbleError};
pub use types::{CABLE_COUNT, CLOSED_FACE_COUNT, FACE_COUNT, FaceId, NODE_COUNT, ROD_COUNT};
