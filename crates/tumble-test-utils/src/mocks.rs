//! Mock tensegrity models for testing.
//!
//! [`RigidSixBar`] never moves on its own: it holds whatever body pose the
//! test gives it, and its [`RecordingCable`]s log every command.

use nalgebra::Isometry3;
use tumble_actuator_core::cable::{CableActuator, CableMotor};
use tumble_core::{CABLE_COUNT, FaceId, ROD_COUNT, RollingConfig};
use tumble_geometry::Icosahedron;
use tumble_roll::TensegrityModel;

// ---------------------------------------------------------------------------
// RecordingCable
// ---------------------------------------------------------------------------

/// A cable motor that remembers every commanded length.
#[derive(Debug, Clone)]
pub struct RecordingCable {
    motor: CableMotor,
    /// Commanded lengths, oldest first.
    pub commands: Vec<f64>,
}

impl RecordingCable {
    /// Unlimited-speed cable starting at `rest_length`.
    pub const fn new(rest_length: f64) -> Self {
        Self {
            motor: CableMotor::new(rest_length).with_max_speed(f64::INFINITY),
            commands: Vec::new(),
        }
    }

    /// Last commanded length.
    pub fn last_command(&self) -> Option<f64> {
        self.commands.last().copied()
    }
}

impl CableActuator for RecordingCable {
    fn current_length(&self) -> f64 {
        self.motor.current_length()
    }

    fn set_rest_length(&mut self, length: f64, dt: f64) {
        self.commands.push(length);
        self.motor.set_rest_length(length, dt);
    }
}

// ---------------------------------------------------------------------------
// RigidSixBar
// ---------------------------------------------------------------------------

/// Six rods fixed in a rigid icosahedron pose plus 24 recording cables.
#[derive(Debug, Clone)]
pub struct RigidSixBar {
    geometry: Icosahedron,
    /// Rod poses in the world. Truncate to simulate a missing rod.
    pub rods: Vec<Isometry3<f64>>,
    /// Cables. Truncate to simulate a missing cable.
    pub cables: Vec<RecordingCable>,
}

impl RigidSixBar {
    /// Model placed at `body`, cables at the nominal rest length.
    pub fn with_pose(config: &RollingConfig, body: &Isometry3<f64>) -> Self {
        let geometry = Icosahedron::new(config.geometry.rod_length);
        let nominal = config.nominal_length();
        let mut model = Self {
            geometry,
            rods: Vec::new(),
            cables: (0..CABLE_COUNT).map(|_| RecordingCable::new(nominal)).collect(),
        };
        model.set_body(body);
        model
    }

    /// Model resting on `face` at the configured ground height.
    pub fn resting_on(config: &RollingConfig, face: FaceId) -> Self {
        let geometry = Icosahedron::new(config.geometry.rod_length);
        let body = geometry.resting_pose(face, config.contact.ground_height);
        Self::with_pose(config, &body)
    }

    /// Move every rod to match the body pose `body`.
    pub fn set_body(&mut self, body: &Isometry3<f64>) {
        self.rods = (0..ROD_COUNT)
            .map(|rod| self.geometry.rod_world_pose(rod, body))
            .collect();
    }

    /// Rest the body on `face`.
    pub fn rest_on(&mut self, face: FaceId, ground_height: f64) {
        let body = self.geometry.resting_pose(face, ground_height);
        self.set_body(&body);
    }

    /// Total commands received across all cables.
    pub fn command_count(&self) -> usize {
        self.cables.iter().map(|c| c.commands.len()).sum()
    }

    /// Forget every recorded command.
    pub fn clear_commands(&mut self) {
        for cable in &mut self.cables {
            cable.commands.clear();
        }
    }

    /// Hull geometry.
    pub const fn geometry(&self) -> &Icosahedron {
        &self.geometry
    }
}

impl TensegrityModel for RigidSixBar {
    fn rod_count(&self) -> usize {
        self.rods.len()
    }

    fn rod_pose(&self, rod: usize) -> Option<Isometry3<f64>> {
        self.rods.get(rod).copied()
    }

    fn cable_count(&self) -> usize {
        self.cables.len()
    }

    fn cable(&self, cable: usize) -> Option<&dyn CableActuator> {
        self.cables.get(cable).map(|c| c as &dyn CableActuator)
    }

    fn cable_mut(&mut self, cable: usize) -> Option<&mut dyn CableActuator> {
        self.cables
            .get_mut(cable)
            .map(|c| c as &mut dyn CableActuator)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
