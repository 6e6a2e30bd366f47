//! Icosahedral hull of a six-bar tensegrity.
//!
//! The twelve rod endpoints of a symmetric six-bar sit on the vertices of a
//! regular icosahedron: the cyclic permutations of `(0, ±1, ±φ)`, scaled so
//! that each rod spans `rod_length`. Rods come in three parallel pairs along
//! Z, Y and X. Rod `i` joins node `2i` (negative end) to node `2i + 1`
//! (positive end).
//!
//! Of the 30 icosahedron edges, the six that join the same-side ends of a
//! parallel rod pair carry no cable. The other 24 are cables, indexed by
//! `(low node, high node)` order. Faces bounded only by cables are *closed*
//! and come first in face order.

use std::f64::consts::PI;

use nalgebra::{Isometry3, Point3, Translation3, Unit, UnitQuaternion, Vector3};
use tumble_core::{CABLE_COUNT, FACE_COUNT, FaceId, NODE_COUNT, ROD_COUNT};

const PHI: f64 = 1.618_033_988_749_895;

/// Node coordinates on the unit-edge-2 icosahedron, rod pairs adjacent.
const UNIT_NODES: [[f64; 3]; NODE_COUNT] = [
    // Rods 0, 1: along Z
    [0.0, -1.0, -PHI],
    [0.0, -1.0, PHI],
    [0.0, 1.0, -PHI],
    [0.0, 1.0, PHI],
    // Rods 2, 3: along Y
    [-1.0, -PHI, 0.0],
    [-1.0, PHI, 0.0],
    [1.0, -PHI, 0.0],
    [1.0, PHI, 0.0],
    // Rods 4, 5: along X
    [-PHI, 0.0, -1.0],
    [PHI, 0.0, -1.0],
    [-PHI, 0.0, 1.0],
    [PHI, 0.0, 1.0],
];

/// Squared edge length on the unit icosahedron.
const UNIT_EDGE_SQ: f64 = 4.0;

/// Nodes of a parallel rod pair share this index.
const fn rod_pair(node: usize) -> usize {
    node / 4
}

// ---------------------------------------------------------------------------
// Icosahedron
// ---------------------------------------------------------------------------

/// Body-frame geometry of a six-bar with a given rod length.
///
/// The body frame is centered on the hull with rods aligned to its axes.
#[derive(Debug, Clone)]
pub struct Icosahedron {
    rod_length: f64,
    nodes: [Point3<f64>; NODE_COUNT],
    edges: Vec<(usize, usize)>,
    cables: Vec<(usize, usize)>,
    faces: Vec<[usize; 3]>,
    normals: Vec<Unit<Vector3<f64>>>,
}

impl Icosahedron {
    /// Build the hull for rods of `rod_length` meters.
    pub fn new(rod_length: f64) -> Self {
        let scale = rod_length / (2.0 * PHI);
        let nodes = std::array::from_fn(|i| {
            let [x, y, z] = UNIT_NODES[i];
            Point3::new(x * scale, y * scale, z * scale)
        });

        let mut edges = Vec::with_capacity(CABLE_COUNT + ROD_COUNT);
        for a in 0..NODE_COUNT {
            for b in (a + 1)..NODE_COUNT {
                if is_unit_edge(a, b) {
                    edges.push((a, b));
                }
            }
        }

        let cables: Vec<(usize, usize)> = edges
            .iter()
            .copied()
            .filter(|&(a, b)| rod_pair(a) != rod_pair(b))
            .collect();

        let mut faces = Vec::with_capacity(FACE_COUNT);
        for a in 0..NODE_COUNT {
            for b in (a + 1)..NODE_COUNT {
                for c in (b + 1)..NODE_COUNT {
                    if is_unit_edge(a, b) && is_unit_edge(b, c) && is_unit_edge(a, c) {
                        faces.push([a, b, c]);
                    }
                }
            }
        }
        faces.sort_by_key(|&[a, b, c]| {
            let open = rod_pair(a) == rod_pair(b)
                || rod_pair(b) == rod_pair(c)
                || rod_pair(a) == rod_pair(c);
            (open, [a, b, c])
        });

        let normals = faces
            .iter()
            .map(|&[a, b, c]| {
                let (pa, pb, pc) = (nodes[a], nodes[b], nodes[c]);
                let n = (pb - pa).cross(&(pc - pa));
                let centroid = (pa.coords + pb.coords + pc.coords) / 3.0;
                Unit::new_normalize(if n.dot(&centroid) < 0.0 { -n } else { n })
            })
            .collect();

        Self {
            rod_length,
            nodes,
            edges,
            cables,
            faces,
            normals,
        }
    }

    /// Rod length (m).
    pub const fn rod_length(&self) -> f64 {
        self.rod_length
    }

    /// Icosahedron edge length (m): `rod_length / φ`.
    pub fn edge_length(&self) -> f64 {
        self.rod_length / PHI
    }

    /// Body-frame node positions.
    pub const fn nodes(&self) -> &[Point3<f64>; NODE_COUNT] {
        &self.nodes
    }

    /// `(negative end, positive end)` nodes of `rod`.
    pub const fn rod_nodes(rod: usize) -> (usize, usize) {
        (2 * rod, 2 * rod + 1)
    }

    /// All 30 hull edges as `(low, high)` node pairs.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// The 24 cables as `(low, high)` node pairs, in cable index order.
    pub fn cables(&self) -> &[(usize, usize)] {
        &self.cables
    }

    /// Cable index joining nodes `a` and `b`, if that edge is a cable.
    pub fn cable_between(&self, a: usize, b: usize) -> Option<usize> {
        let key = (a.min(b), a.max(b));
        self.cables.binary_search(&key).ok()
    }

    /// Face node triples, closed faces first.
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Nodes of `face`, ascending.
    ///
    /// # Panics
    ///
    /// If `face` is not a hull face.
    pub fn face_nodes(&self, face: FaceId) -> [usize; 3] {
        self.faces[face.index()]
    }

    /// Outward unit normal of `face` in the body frame.
    ///
    /// # Panics
    ///
    /// If `face` is not a hull face.
    pub fn normal(&self, face: FaceId) -> Unit<Vector3<f64>> {
        self.normals[face.index()]
    }

    /// Outward unit normals of every face, indexed by face id.
    pub fn normals(&self) -> &[Unit<Vector3<f64>>] {
        &self.normals
    }

    /// Whether every edge of `face` is a cable.
    pub fn is_closed_face(&self, face: FaceId) -> bool {
        let [a, b, c] = self.face_nodes(face);
        [(a, b), (b, c), (a, c)]
            .iter()
            .all(|&(p, q)| self.cable_between(p, q).is_some())
    }

    /// Number of closed faces.
    pub fn closed_face_count(&self) -> usize {
        (0..self.faces.len())
            .filter(|&f| self.is_closed_face(FaceId(f)))
            .count()
    }

    /// Edge shared by faces `a` and `b` as an ascending node pair.
    pub fn shared_edge(&self, a: FaceId, b: FaceId) -> Option<(usize, usize)> {
        if a == b {
            return None;
        }
        let other = self.face_nodes(b);
        let mut shared = self.face_nodes(a).into_iter().filter(|n| other.contains(n));
        match (shared.next(), shared.next(), shared.next()) {
            (Some(p), Some(q), None) => Some((p, q)),
            _ => None,
        }
    }

    /// Node of `face` not on `edge`.
    pub fn apex(&self, face: FaceId, edge: (usize, usize)) -> Option<usize> {
        let nodes = self.face_nodes(face);
        if !nodes.contains(&edge.0) || !nodes.contains(&edge.1) {
            return None;
        }
        nodes.into_iter().find(|&n| n != edge.0 && n != edge.1)
    }

    /// Fixed pose of `rod` in the body frame.
    ///
    /// The rod frame is centered on the rod with local +Y running from its
    /// negative node to its positive node.
    pub fn rod_frame(&self, rod: usize) -> Isometry3<f64> {
        let (neg, pos) = Self::rod_nodes(rod);
        let (a, b) = (self.nodes[neg], self.nodes[pos]);
        let center = nalgebra::center(&a, &b);
        let rotation = rotation_onto(&Vector3::y(), &(b - a));
        Isometry3::from_parts(Translation3::from(center.coords), rotation)
    }

    /// World pose of `rod` for a body at `body`.
    pub fn rod_world_pose(&self, rod: usize, body: &Isometry3<f64>) -> Isometry3<f64> {
        body * self.rod_frame(rod)
    }

    /// Body pose implied by the world pose of `rod`.
    pub fn body_pose_from_rod(&self, rod: usize, rod_world: &Isometry3<f64>) -> Isometry3<f64> {
        rod_world * self.rod_frame(rod).inverse()
    }

    /// World node positions for a body at `body`.
    pub fn node_world_positions(&self, body: &Isometry3<f64>) -> [Point3<f64>; NODE_COUNT] {
        std::array::from_fn(|i| body * self.nodes[i])
    }

    /// Body pose resting on `face` on a Z-up ground plane at `ground_height`,
    /// centered above the world origin.
    pub fn resting_pose(&self, face: FaceId, ground_height: f64) -> Isometry3<f64> {
        let rotation = rotation_onto(&self.normal(face), &-Vector3::z());
        let [a, ..] = self.face_nodes(face);
        let drop = (rotation * self.nodes[a]).z;
        Isometry3::from_parts(Translation3::new(0.0, 0.0, ground_height - drop), rotation)
    }
}

fn is_unit_edge(a: usize, b: usize) -> bool {
    let [ax, ay, az] = UNIT_NODES[a];
    let [bx, by, bz] = UNIT_NODES[b];
    let d2 = (bz - az).mul_add(bz - az, (bx - ax).mul_add(bx - ax, (by - ay) * (by - ay)));
    (d2 - UNIT_EDGE_SQ).abs() < 1e-9
}

/// Shortest rotation taking `from` onto `to`, a half turn when opposed.
fn rotation_onto(from: &Vector3<f64>, to: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::rotation_between(from, to).unwrap_or_else(|| {
        let axis = from
            .cross(&Vector3::x())
            .try_normalize(1e-9)
            .unwrap_or_else(|| from.cross(&Vector3::y()).normalize());
        UnitQuaternion::from_axis_angle(&Unit::new_unchecked(axis), PI)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
