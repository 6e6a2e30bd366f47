use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Structure sizes
// ---------------------------------------------------------------------------

/// Nodes (rod endpoints) of the six-bar.
pub const NODE_COUNT: usize = 12;

/// Rigid struts.
pub const ROD_COUNT: usize = 6;

/// Actuated cables, one per icosahedron edge that is not a parallel-rod gap.
pub const CABLE_COUNT: usize = 24;

/// Triangular faces of the icosahedral hull.
pub const FACE_COUNT: usize = 20;

/// Faces bounded entirely by cables. These are ids `0..CLOSED_FACE_COUNT`
/// and are the only valid goal faces.
pub const CLOSED_FACE_COUNT: usize = 8;

// ---------------------------------------------------------------------------
// FaceId
// ---------------------------------------------------------------------------

/// Identifier of one triangular resting face.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct FaceId(pub usize);

impl FaceId {
    /// Raw index into face-indexed tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Whether this face is one of the closed (all-cable) triangles.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        self.0 < CLOSED_FACE_COUNT
    }
}

impl From<usize> for FaceId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}
