//! Contact face detection.
//!
//! The grounded face is the one whose outward body-frame normal is closest
//! to the body-frame gravity direction: in the world it points straight
//! down, against the ground plane normal. A second check confirms that all
//! three of its nodes actually touch the ground.

use nalgebra::{Point3, Unit, Vector3};
use tumble_core::{ContactConfig, FaceId, NODE_COUNT, StepError};
use tumble_geometry::Icosahedron;

use crate::gravity::GravityEstimate;
use crate::model::TensegrityModel;

/// A confirmed ground contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactReading {
    /// Grounded face.
    pub face: FaceId,
    /// Angle between the face normal and gravity (rad).
    pub angle: f64,
}

/// Finds the grounded face each tick.
#[derive(Debug, Clone)]
pub struct ContactDetector {
    normals: Vec<Unit<Vector3<f64>>>,
    faces: Vec<[usize; 3]>,
    half_rod: f64,
    height_threshold: f64,
    ground_height: f64,
}

impl ContactDetector {
    /// Detector over every face of `geometry`.
    pub fn new(geometry: &Icosahedron, contact: &ContactConfig) -> Self {
        Self {
            normals: geometry.normals().to_vec(),
            faces: geometry.faces().to_vec(),
            half_rod: geometry.rod_length() / 2.0,
            height_threshold: contact.height_threshold,
            ground_height: contact.ground_height,
        }
    }

    /// Face best aligned with gravity, ignoring node heights. Ties go to the
    /// lowest id. All twenty faces are scored, open ones included, so a
    /// roll landing on an open face is confirmed too.
    pub fn best_face(&self, gravity: &GravityEstimate) -> ContactReading {
        let mut best = ContactReading {
            face: FaceId(0),
            angle: f64::INFINITY,
        };
        let mut best_score = f64::NEG_INFINITY;
        for (i, normal) in self.normals.iter().enumerate() {
            let score = normal.dot(&gravity.direction);
            if score > best_score {
                best_score = score;
                best = ContactReading {
                    face: FaceId(i),
                    angle: score.clamp(-1.0, 1.0).acos(),
                };
            }
        }
        best
    }

    /// Grounded face, or `None` when the best-aligned face is not resting
    /// on the ground.
    pub fn detect<M: TensegrityModel + ?Sized>(
        &self,
        model: &M,
        gravity: &GravityEstimate,
    ) -> Result<Option<ContactReading>, StepError> {
        let reading = self.best_face(gravity);
        let nodes = self.node_positions(model)?;
        let grounded = self.faces[reading.face.index()]
            .iter()
            .all(|&n| nodes[n].z - self.ground_height <= self.height_threshold);
        Ok(grounded.then_some(reading))
    }

    /// World node positions from the model's rod poses.
    pub fn node_positions<M: TensegrityModel + ?Sized>(
        &self,
        model: &M,
    ) -> Result<[Point3<f64>; NODE_COUNT], StepError> {
        let mut nodes = [Point3::origin(); NODE_COUNT];
        for (rod, ends) in nodes.chunks_exact_mut(2).enumerate() {
            let pose = model.rod_pose(rod).ok_or(StepError::MissingRod(rod))?;
            ends[0] = pose * Point3::new(0.0, -self.half_rod, 0.0);
            ends[1] = pose * Point3::new(0.0, self.half_rod, 0.0);
        }
        Ok(nodes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
