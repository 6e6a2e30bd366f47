//! Target face selection for direction goals.

use nalgebra::Vector3;
use tumble_core::{CLOSED_FACE_COUNT, FaceId};

/// Projected directions shorter than this carry no heading.
const MIN_HEADING: f64 = 1e-9;

/// Closed face whose world-frame outward normal best points along
/// `direction`.
///
/// `direction` is projected onto the ground plane (the component along `up`
/// is dropped) and normalized. Only the first [`CLOSED_FACE_COUNT`] entries
/// of `normals_world` are candidates. The face with the largest positive dot
/// product wins, ties going to the lowest id. Returns `None` when the
/// projected direction is degenerate or no candidate scores above zero.
pub fn best_aligned_face(
    normals_world: &[Vector3<f64>],
    direction: &Vector3<f64>,
    up: &Vector3<f64>,
) -> Option<FaceId> {
    let up = up.try_normalize(MIN_HEADING)?;
    let heading = (direction - up * direction.dot(&up)).try_normalize(MIN_HEADING)?;

    let mut best: Option<(FaceId, f64)> = None;
    for (i, normal) in normals_world.iter().take(CLOSED_FACE_COUNT).enumerate() {
        let score = normal.dot(&heading);
        if score > 0.0 && best.is_none_or(|(_, top)| score > top) {
            best = Some((FaceId(i), score));
        }
    }
    best.map(|(face, _)| face)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
