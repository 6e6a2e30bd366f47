//! Geometry of the six-bar tensegrity and the tables derived from it.
//!
//! - [`Icosahedron`]: nodes, rods, cables and faces of the icosahedral hull,
//!   plus rod frames and resting poses.
//! - [`FaceGraph`]: which faces the robot can roll between.
//! - [`ActuationPolicy`]: the cable commands that realize each roll.
//!
//! All tables are built once from the rod length and are read-only after.

pub mod graph;
pub mod icosahedron;
pub mod policy;

pub use graph::FaceGraph;
pub use icosahedron::Icosahedron;
pub use policy::{ActuationPolicy, CableCommand};
