//! Face adjacency graph.
//!
//! Two faces are adjacent when they share a hull edge: the robot can tip
//! from one onto the other over that edge. The graph is a single `N × N`
//! boolean table, symmetric and immutable once built.

use std::collections::VecDeque;

use tumble_core::{FACE_COUNT, FaceId, PlanError};

use crate::icosahedron::Icosahedron;

/// Fixed-size adjacency table over `N` faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceGraph<const N: usize> {
    adjacency: [[bool; N]; N],
}

impl<const N: usize> FaceGraph<N> {
    /// Graph with no edges.
    pub const fn empty() -> Self {
        Self {
            adjacency: [[false; N]; N],
        }
    }

    /// Build from undirected `(a, b)` face pairs. Self-pairs are ignored.
    pub fn from_edges(edges: &[(usize, usize)]) -> Result<Self, PlanError> {
        let mut graph = Self::empty();
        for &(a, b) in edges {
            for face in [a, b] {
                if face >= N {
                    return Err(PlanError::FaceOutOfRange { face, count: N });
                }
            }
            if a != b {
                graph.adjacency[a][b] = true;
                graph.adjacency[b][a] = true;
            }
        }
        Ok(graph)
    }

    /// Number of faces.
    pub const fn len(&self) -> usize {
        N
    }

    /// Whether the graph has no faces.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Whether `face` is a valid id for this graph.
    pub const fn contains(&self, face: FaceId) -> bool {
        face.index() < N
    }

    /// Whether `a` and `b` share an edge. Out-of-range ids are never
    /// adjacent.
    pub fn is_adjacent(&self, a: FaceId, b: FaceId) -> bool {
        self.contains(a) && self.contains(b) && self.adjacency[a.index()][b.index()]
    }

    /// Neighbors of `face` in ascending id order.
    pub fn neighbors(&self, face: FaceId) -> impl Iterator<Item = FaceId> + '_ {
        let row = self.adjacency.get(face.index());
        row.into_iter()
            .flat_map(|row| row.iter().enumerate())
            .filter_map(|(i, &adjacent)| adjacent.then_some(FaceId(i)))
    }

    /// Number of neighbors of `face`.
    pub fn degree(&self, face: FaceId) -> usize {
        self.neighbors(face).count()
    }

    /// Every edge once, as `(low, high)` in ascending order.
    pub fn edges(&self) -> Vec<(FaceId, FaceId)> {
        let mut edges = Vec::new();
        for a in 0..N {
            for b in (a + 1)..N {
                if self.adjacency[a][b] {
                    edges.push((FaceId(a), FaceId(b)));
                }
            }
        }
        edges
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edges().len()
    }

    /// Whether the table is symmetric with an empty diagonal.
    pub fn is_symmetric(&self) -> bool {
        (0..N).all(|a| !self.adjacency[a][a] && (0..N).all(|b| self.adjacency[a][b] == self.adjacency[b][a]))
    }

    /// Hop counts from `start` to every face (`None` when unreachable).
    pub fn hops_from(&self, start: FaceId) -> [Option<usize>; N] {
        let mut hops = [None; N];
        if !self.contains(start) {
            return hops;
        }
        hops[start.index()] = Some(0);
        let mut queue = VecDeque::from([start]);
        while let Some(face) = queue.pop_front() {
            let next = hops[face.index()].map_or(0, |h| h + 1);
            for neighbor in self.neighbors(face) {
                if hops[neighbor.index()].is_none() {
                    hops[neighbor.index()] = Some(next);
                    queue.push_back(neighbor);
                }
            }
        }
        hops
    }

    /// Whether every face can reach every other.
    pub fn is_connected(&self) -> bool {
        N == 0 || self.hops_from(FaceId(0)).iter().all(Option::is_some)
    }

    /// Longest shortest path in rolls, `None` if disconnected.
    pub fn diameter(&self) -> Option<usize> {
        let mut diameter = 0;
        for start in 0..N {
            for hops in self.hops_from(FaceId(start)) {
                diameter = diameter.max(hops?);
            }
        }
        Some(diameter)
    }
}

impl<const N: usize> Default for FaceGraph<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl FaceGraph<FACE_COUNT> {
    /// Adjacency of the icosahedral hull: faces sharing an edge.
    pub fn from_icosahedron(geometry: &Icosahedron) -> Self {
        let mut graph = Self::empty();
        for a in 0..FACE_COUNT {
            for b in 0..FACE_COUNT {
                graph.adjacency[a][b] = geometry.shared_edge(FaceId(a), FaceId(b)).is_some();
            }
        }
        graph
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
