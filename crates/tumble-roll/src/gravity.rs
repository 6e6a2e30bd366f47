//! Gravity-frame estimation.
//!
//! The body orientation follows from the reference rod's world orientation
//! composed with the inverse of that rod's fixed body-frame orientation.
//! World gravity `(0, 0, -g)` is then expressed in the body frame.

use nalgebra::{Unit, UnitQuaternion, Vector3};
use tumble_core::StepError;
use tumble_geometry::Icosahedron;

use crate::model::TensegrityModel;

/// Gravity as seen from the body frame, recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityEstimate {
    /// Body-to-world rotation.
    pub body_rotation: UnitQuaternion<f64>,
    /// Unit gravity direction in the body frame.
    pub direction: Unit<Vector3<f64>>,
    /// Gravity vector in the body frame, scaled by `g` (m/s^2).
    pub vector: Vector3<f64>,
}

impl GravityEstimate {
    /// World-frame gravity direction (always `-Z`), recovered from the
    /// estimate.
    pub fn world_direction(&self) -> Vector3<f64> {
        self.body_rotation * self.direction.into_inner()
    }

    /// Rotate a body-frame vector into the world frame.
    pub fn rotate_to_world(&self, body: &Vector3<f64>) -> Vector3<f64> {
        self.body_rotation * body
    }
}

/// Estimates gravity in the body frame from one reference rod.
#[derive(Debug, Clone)]
pub struct GravityEstimator {
    reference_rod: usize,
    rod_frame_rotation: UnitQuaternion<f64>,
    magnitude: f64,
}

impl GravityEstimator {
    /// Estimator reading `reference_rod` of a body with `geometry`, for
    /// gravity of `magnitude` m/s^2.
    pub fn new(geometry: &Icosahedron, reference_rod: usize, magnitude: f64) -> Self {
        Self {
            reference_rod,
            rod_frame_rotation: geometry.rod_frame(reference_rod).rotation,
            magnitude,
        }
    }

    /// Rod the body frame is recovered from.
    pub const fn reference_rod(&self) -> usize {
        self.reference_rod
    }

    /// Estimate from the model's current reference rod pose.
    pub fn estimate<M: TensegrityModel + ?Sized>(&self, model: &M) -> Result<GravityEstimate, StepError> {
        let pose = model
            .rod_pose(self.reference_rod)
            .ok_or(StepError::MissingRod(self.reference_rod))?;
        Ok(self.estimate_from_rotation(&pose.rotation))
    }

    /// Estimate from the reference rod's world orientation.
    pub fn estimate_from_rotation(&self, rod_rotation: &UnitQuaternion<f64>) -> GravityEstimate {
        let body_rotation = rod_rotation * self.rod_frame_rotation.inverse();
        let direction = Unit::new_unchecked(body_rotation.inverse() * -Vector3::z());
        GravityEstimate {
            body_rotation,
            direction,
            vector: direction.into_inner() * self.magnitude,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
