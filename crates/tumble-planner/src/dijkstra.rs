//! Fewest-roll paths over a [`FaceGraph`].

use tracing::debug;
use tumble_core::{FaceId, PlanError};
use tumble_geometry::FaceGraph;

/// Shortest face sequence from `start` to `goal`, both included.
///
/// Every roll costs one. Among unsettled faces the one with the smallest
/// distance, then the lowest id, is settled first, and a neighbor's
/// predecessor only changes on strict improvement. Equal inputs therefore
/// always yield the same path.
///
/// - `start == goal` returns `[start]` (zero rolls).
/// - A face outside the graph returns [`PlanError::FaceOutOfRange`].
/// - A goal with no connecting path returns [`PlanError::Unreachable`].
pub fn find_path<const N: usize>(
    graph: &FaceGraph<N>,
    start: FaceId,
    goal: FaceId,
) -> Result<Vec<FaceId>, PlanError> {
    for face in [start, goal] {
        if !graph.contains(face) {
            return Err(PlanError::FaceOutOfRange {
                face: face.index(),
                count: N,
            });
        }
    }
    if start == goal {
        return Ok(vec![start]);
    }

    let mut dist = [usize::MAX; N];
    let mut prev: [Option<usize>; N] = [None; N];
    let mut settled = [false; N];
    dist[start.index()] = 0;

    while let Some(face) = closest_unsettled(&dist, &settled) {
        settled[face] = true;
        if face == goal.index() {
            break;
        }
        let candidate = dist[face] + 1;
        for neighbor in graph.neighbors(FaceId(face)) {
            let n = neighbor.index();
            if !settled[n] && candidate < dist[n] {
                dist[n] = candidate;
                prev[n] = Some(face);
            }
        }
    }

    if dist[goal.index()] == usize::MAX {
        return Err(PlanError::Unreachable { start, goal });
    }

    let mut path = vec![goal];
    let mut cursor = goal.index();
    while let Some(parent) = prev[cursor] {
        path.push(FaceId(parent));
        cursor = parent;
    }
    path.reverse();

    debug!(%start, %goal, rolls = path.len() - 1, "path found");
    Ok(path)
}

fn closest_unsettled<const N: usize>(dist: &[usize; N], settled: &[bool; N]) -> Option<usize> {
    (0..N)
        .filter(|&f| !settled[f] && dist[f] != usize::MAX)
        .min_by_key(|&f| (dist[f], f))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
