//! Kinematic six-bar rig.
//!
//! A rigid body stand-in for a physics engine. While resting on a face it
//! watches the cables: once every cable of the policy entry toward a
//! neighbor has contracted past the trigger length, the body tips about the
//! shared edge over `roll_duration` seconds and comes to rest on that
//! neighbor. Locking the rig blocks new rolls, which makes a step stall.

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use tracing::debug;
use tumble_actuator_core::cable::{CableActuator, CableMotor};
use tumble_core::{CABLE_COUNT, FACE_COUNT, FaceId, ROD_COUNT, RollingConfig};
use tumble_geometry::{ActuationPolicy, FaceGraph, Icosahedron};
use tumble_roll::TensegrityModel;

const fn default_trigger_fraction() -> f64 {
    0.8
}
const fn default_roll_duration() -> f64 {
    0.4
}

/// Rig tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigConfig {
    /// Fraction of the nominal-to-contracted travel a cable must cover
    /// before it counts toward a roll (default: 0.8).
    pub trigger_fraction: f64,
    /// Seconds a roll takes from lift-off to landing (default: 0.4).
    pub roll_duration: f64,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            trigger_fraction: default_trigger_fraction(),
            roll_duration: default_roll_duration(),
        }
    }
}

#[derive(Debug, Clone)]
struct RollMotion {
    from: FaceId,
    to: FaceId,
    start: Isometry3<f64>,
    pivot: Point3<f64>,
    rotation: UnitQuaternion<f64>,
    elapsed: f64,
}

// ---------------------------------------------------------------------------
// KinematicSixBar
// ---------------------------------------------------------------------------

/// Rigid six-bar with 24 rate-limited cable motors.
#[derive(Debug, Clone)]
pub struct KinematicSixBar {
    geometry: Icosahedron,
    graph: FaceGraph<FACE_COUNT>,
    policy: ActuationPolicy<FACE_COUNT>,
    rig: RigConfig,
    body: Isometry3<f64>,
    resting: Option<FaceId>,
    motion: Option<RollMotion>,
    cables: Vec<CableMotor>,
    nominal_length: f64,
    contracted_length: f64,
    ground_height: f64,
    locked: bool,
    history: Vec<(FaceId, FaceId)>,
}

impl KinematicSixBar {
    /// Rig resting on `start`, cables at their nominal rest length.
    pub fn new(config: &RollingConfig, start: FaceId) -> Self {
        let geometry = Icosahedron::new(config.geometry.rod_length);
        let graph = FaceGraph::from_icosahedron(&geometry);
        let contracted_length = config.contracted_length();
        let policy = ActuationPolicy::from_icosahedron(&geometry, &graph, contracted_length);
        let nominal_length = config.nominal_length();
        let cables = (0..CABLE_COUNT)
            .map(|_| {
                CableMotor::new(nominal_length)
                    .with_max_speed(config.actuation.max_speed)
                    .with_range(config.actuation.min_length, 2.0 * nominal_length)
            })
            .collect();
        let ground_height = config.contact.ground_height;
        Self {
            body: geometry.resting_pose(start, ground_height),
            geometry,
            graph,
            policy,
            rig: RigConfig::default(),
            resting: Some(start),
            motion: None,
            cables,
            nominal_length,
            contracted_length,
            ground_height,
            locked: false,
            history: Vec::new(),
        }
    }

    /// Replace the rig tuning.
    pub const fn set_rig(&mut self, rig: RigConfig) {
        self.rig = rig;
    }

    /// Rig tuning.
    pub const fn rig(&self) -> RigConfig {
        self.rig
    }

    /// Cable length below which a cable counts toward a roll.
    pub fn trigger_length(&self) -> f64 {
        self.nominal_length - self.rig.trigger_fraction * (self.nominal_length - self.contracted_length)
    }

    /// Advance by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        if self.motion.is_some() {
            self.advance_roll(dt);
        } else if !self.locked
            && let Some(from) = self.resting
            && let Some(to) = self.triggered_roll(from)
        {
            self.start_roll(from, to);
        }
    }

    fn triggered_roll(&self, from: FaceId) -> Option<FaceId> {
        let trigger = self.trigger_length();
        self.graph.neighbors(from).find(|&to| {
            let commands = self.policy.commands(from, to);
            !commands.is_empty()
                && commands
                    .iter()
                    .all(|c| self.cables[c.cable].current_length() <= trigger)
        })
    }

    fn start_roll(&mut self, from: FaceId, to: FaceId) {
        let Some((hinge, _)) = self.geometry.shared_edge(from, to) else {
            return;
        };
        let landing_normal = self.body.rotation * self.geometry.normal(to).into_inner();
        let rotation = UnitQuaternion::rotation_between(&landing_normal, &-Vector3::z())
            .unwrap_or_else(UnitQuaternion::identity);
        debug!(%from, %to, angle = rotation.angle(), "rig roll started");
        self.motion = Some(RollMotion {
            from,
            to,
            start: self.body,
            pivot: self.body * self.geometry.nodes()[hinge],
            rotation,
            elapsed: 0.0,
        });
        self.resting = None;
    }

    fn advance_roll(&mut self, dt: f64) {
        let Some(motion) = self.motion.as_mut() else {
            return;
        };
        motion.elapsed += dt;
        let progress = if self.rig.roll_duration > 0.0 {
            (motion.elapsed / self.rig.roll_duration).min(1.0)
        } else {
            1.0
        };
        let partial = UnitQuaternion::identity().slerp(&motion.rotation, progress);
        self.body = Isometry3::rotation_wrt_point(partial, motion.pivot) * motion.start;

        if progress >= 1.0 {
            let (from, to) = (motion.from, motion.to);
            self.motion = None;
            self.settle_on(to);
            self.history.push((from, to));
            debug!(%from, %to, "rig roll landed");
        }
    }

    /// Snap the landed face exactly onto the ground plane.
    fn settle_on(&mut self, face: FaceId) {
        let [a, ..] = self.geometry.face_nodes(face);
        let height = (self.body * self.geometry.nodes()[a]).z;
        self.body = Translation3::new(0.0, 0.0, self.ground_height - height) * self.body;
        self.resting = Some(face);
    }

    /// Put the rig down on `face`, keeping its horizontal position. Any roll
    /// in flight is abandoned.
    pub fn place_on(&mut self, face: FaceId) {
        let rest = self.geometry.resting_pose(face, self.ground_height);
        let offset = Translation3::new(self.body.translation.x, self.body.translation.y, 0.0);
        self.body = offset * rest;
        self.motion = None;
        self.resting = Some(face);
    }

    /// Move the body to an arbitrary pose (e.g. lifted off the ground).
    /// The rig no longer counts as resting until it is placed again.
    pub const fn set_body_pose(&mut self, pose: Isometry3<f64>) {
        self.body = pose;
        self.motion = None;
        self.resting = None;
    }

    /// Block or allow new rolls.
    pub const fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Whether new rolls are blocked.
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Body pose in the world.
    pub const fn body_pose(&self) -> &Isometry3<f64> {
        &self.body
    }

    /// Face the rig rests on, `None` mid-roll.
    pub const fn resting_face(&self) -> Option<FaceId> {
        self.resting
    }

    /// Whether a roll is in flight.
    pub const fn is_rolling(&self) -> bool {
        self.motion.is_some()
    }

    /// Completed rolls as `(from, to)`, oldest first.
    pub fn history(&self) -> &[(FaceId, FaceId)] {
        &self.history
    }

    /// Current cable rest lengths.
    pub fn cable_lengths(&self) -> Vec<f64> {
        self.cables.iter().map(CableActuator::current_length).collect()
    }

    /// Hull geometry.
    pub const fn geometry(&self) -> &Icosahedron {
        &self.geometry
    }

    /// Nominal cable rest length.
    pub const fn nominal_length(&self) -> f64 {
        self.nominal_length
    }
}

impl TensegrityModel for KinematicSixBar {
    fn rod_count(&self) -> usize {
        ROD_COUNT
    }

    fn rod_pose(&self, rod: usize) -> Option<Isometry3<f64>> {
        (rod < ROD_COUNT).then(|| self.geometry.rod_world_pose(rod, &self.body))
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
