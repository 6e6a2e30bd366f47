//! The capability the executor drives.

use nalgebra::Isometry3;
use tumble_actuator_core::cable::CableActuator;

/// A structure exposing rigid rod poses and controllable cables.
///
/// Any six-bar assembly, simulated or physical, can be rolled by implementing
/// this trait. Rod and cable indices follow
/// [`Icosahedron`](tumble_geometry::Icosahedron) numbering.
pub trait TensegrityModel {
    /// Number of rods.
    fn rod_count(&self) -> usize;

    /// World pose of `rod`: origin at the rod center, local +Y running from
    /// its negative node to its positive node.
    fn rod_pose(&self, rod: usize) -> Option<Isometry3<f64>>;

    /// Number of cables.
    fn cable_count(&self) -> usize;

    /// Read access to `cable`.
    fn cable(&self, cable: usize) -> Option<&dyn CableActuator>;

    /// Command access to `cable`.
    fn cable_mut(&mut self, cable: usize) -> Option<&mut dyn CableActuator>;
}
