//! Actuation policy: which cables to contract for each roll.
//!
//! Rolling from face `A` to adjacent face `B` over their shared edge
//! `(p, q)` contracts the cables from `p` and `q` to the apex `b` of `B`.
//! Cables the entry does not name are held at their nominal rest length.

use serde::{Deserialize, Serialize};
use tumble_core::{FACE_COUNT, FaceId};

use crate::graph::FaceGraph;
use crate::icosahedron::Icosahedron;

/// Rest-length command for one cable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CableCommand {
    /// Cable index.
    pub cable: usize,
    /// Target rest length (m).
    pub target_length: f64,
}

/// `N × N` table of cable commands keyed by `(from, to)` face.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuationPolicy<const N: usize> {
    table: [[Vec<CableCommand>; N]; N],
}

impl<const N: usize> ActuationPolicy<N> {
    /// Table with no entries.
    pub fn empty() -> Self {
        Self {
            table: std::array::from_fn(|_| std::array::from_fn(|_| Vec::new())),
        }
    }

    /// Set the entry for rolling `from → to`. Commands are stored in cable
    /// order. Out-of-range faces are ignored.
    pub fn insert(&mut self, from: FaceId, to: FaceId, mut commands: Vec<CableCommand>) {
        commands.sort_by_key(|c| c.cable);
        if let Some(entry) = self
            .table
            .get_mut(from.index())
            .and_then(|row| row.get_mut(to.index()))
        {
            *entry = commands;
        }
    }

    /// Commands for rolling `from → to`; empty when there is no such roll.
    pub fn commands(&self, from: FaceId, to: FaceId) -> &[CableCommand] {
        self.table
            .get(from.index())
            .and_then(|row| row.get(to.index()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Target for `cable` under the `from → to` entry, if it names one.
    pub fn target_for(&self, from: FaceId, to: FaceId, cable: usize) -> Option<f64> {
        self.commands(from, to)
            .iter()
            .find(|c| c.cable == cable)
            .map(|c| c.target_length)
    }

    /// Number of non-empty entries.
    pub fn entry_count(&self) -> usize {
        self.table
            .iter()
            .flat_map(|row| row.iter())
            .filter(|entry| !entry.is_empty())
            .count()
    }

    /// Whether every directed edge of `graph` has a non-empty entry.
    pub fn is_complete_for(&self, graph: &FaceGraph<N>) -> bool {
        graph.edges().into_iter().all(|(a, b)| {
            !self.commands(a, b).is_empty() && !self.commands(b, a).is_empty()
        })
    }
}

impl<const N: usize> Default for ActuationPolicy<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl ActuationPolicy<FACE_COUNT> {
    /// Derive the policy for every roll in `graph`, contracting the named
    /// cables to `contracted_length`.
    pub fn from_icosahedron(
        geometry: &Icosahedron,
        graph: &FaceGraph<FACE_COUNT>,
        contracted_length: f64,
    ) -> Self {
        let mut policy = Self::empty();
        for from in 0..FACE_COUNT {
            let from = FaceId(from);
            for to in graph.neighbors(from) {
                let Some(edge) = geometry.shared_edge(from, to) else {
                    continue;
                };
                let Some(apex) = geometry.apex(to, edge) else {
                    continue;
                };
                let commands = [edge.0, edge.1]
                    .into_iter()
                    .filter_map(|hinge| geometry.cable_between(hinge, apex))
                    .map(|cable| CableCommand {
                        cable,
                        target_length: contracted_length,
                    })
                    .collect();
                policy.insert(from, to, commands);
            }
        }
        policy
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
