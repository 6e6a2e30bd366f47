//! Per-tick roll executor.
//!
//! [`RollExecutor`] owns every table and controller binding. The simulation
//! driver calls [`on_setup`](RollExecutor::on_setup) once, then
//! [`on_step`](RollExecutor::on_step) every tick. Within a tick the order is
//! fixed: gravity estimate, contact detection, then planning and plan
//! advancement, then cable commands.

use nalgebra::Vector3;
use tracing::{debug, error, info, warn};
use tumble_actuator_core::control::LengthController;
use tumble_core::{
    CABLE_COUNT, ConfigError, FACE_COUNT, FaceId, GoalConfig, ROD_COUNT, RollingConfig, SetupError,
    StallPolicy, StepError,
};
use tumble_geometry::{ActuationPolicy, FaceGraph, Icosahedron};
use tumble_planner::{best_aligned_face, find_path};

use crate::contact::{ContactDetector, ContactReading};
use crate::gravity::{GravityEstimate, GravityEstimator};
use crate::model::TensegrityModel;
use crate::state::{Plan, RollEvent, RollState, StepWatch, TickReport};

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// Everything built in the setup callback and dropped on teardown.
#[derive(Debug)]
struct Bindings {
    geometry: Icosahedron,
    graph: FaceGraph<FACE_COUNT>,
    policy: ActuationPolicy<FACE_COUNT>,
    estimator: GravityEstimator,
    detector: ContactDetector,
    controllers: Vec<LengthController>,
    nominal_length: f64,
}

impl Bindings {
    fn new(config: &RollingConfig) -> Self {
        let actuation = &config.actuation;
        let geometry = Icosahedron::new(config.geometry.rod_length);
        let graph = FaceGraph::from_icosahedron(&geometry);
        let policy = ActuationPolicy::from_icosahedron(&geometry, &graph, config.contracted_length());
        debug_assert!(policy.is_complete_for(&graph));
        let controllers = (0..CABLE_COUNT)
            .map(|_| {
                LengthController::new(
                    actuation.kp,
                    actuation.kd,
                    actuation.max_speed,
                    actuation.tolerance,
                )
            })
            .collect();
        Self {
            estimator: GravityEstimator::new(&geometry, config.reference_rod, config.gravity),
            detector: ContactDetector::new(&geometry, &config.contact),
            nominal_length: config.nominal_length(),
            geometry,
            graph,
            policy,
            controllers,
        }
    }

    /// Drive every cable toward its target for the `from → to` roll: the
    /// policy entry's length where named, nominal elsewhere. Returns whether
    /// all cables converged.
    fn apply_edge<M: TensegrityModel + ?Sized>(
        &mut self,
        model: &mut M,
        from: FaceId,
        to: FaceId,
        dt: f64,
    ) -> Result<bool, StepError> {
        check_cables(model)?;
        let mut converged = true;
        for (cable, controller) in self.controllers.iter_mut().enumerate() {
            let target = self
                .policy
                .target_for(from, to, cable)
                .unwrap_or(self.nominal_length);
            let actuator = model
                .cable_mut(cable)
                .ok_or(StepError::MissingCable(cable))?;
            converged &= controller.track(actuator, target, dt);
        }
        Ok(converged)
    }

    /// Whether every cable the `from → to` roll leaves at nominal sits within
    /// tolerance of it. The roll's own cables are skipped, so a retry does
    /// not wait for them to relax.
    fn is_released<M: TensegrityModel + ?Sized>(
        &self,
        model: &M,
        from: FaceId,
        to: FaceId,
    ) -> Result<bool, StepError> {
        check_cables(model)?;
        for (cable, controller) in self.controllers.iter().enumerate() {
            if self.policy.target_for(from, to, cable).is_some() {
                continue;
            }
            let actuator = model.cable(cable).ok_or(StepError::MissingCable(cable))?;
            if !controller.is_converged(actuator, self.nominal_length) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Drive the cables the `from → to` roll leaves at nominal back to it.
    /// The roll's own cables hold. Returns whether the release converged.
    fn release_for<M: TensegrityModel + ?Sized>(
        &mut self,
        model: &mut M,
        from: FaceId,
        to: FaceId,
        dt: f64,
    ) -> Result<bool, StepError> {
        check_cables(model)?;
        let mut released = true;
        for (cable, controller) in self.controllers.iter_mut().enumerate() {
            if self.policy.target_for(from, to, cable).is_some() {
                continue;
            }
            let actuator = model
                .cable_mut(cable)
                .ok_or(StepError::MissingCable(cable))?;
            released &= controller.track(actuator, self.nominal_length, dt);
        }
        Ok(released)
    }

    /// Path from `current` toward the goal. `None` when a direction goal has
    /// no aligned face.
    fn plan_from(
        &self,
        goal: &GoalConfig,
        current: FaceId,
        gravity: &GravityEstimate,
    ) -> Result<Option<Vec<FaceId>>, StepError> {
        let target = match goal {
            GoalConfig::Face { face } => FaceId(*face),
            GoalConfig::DeadReckoning { direction } => {
                let normals: Vec<Vector3<f64>> = self
                    .geometry
                    .normals()
                    .iter()
                    .map(|n| gravity.rotate_to_world(n))
                    .collect();
                let Some(target) =
                    best_aligned_face(&normals, &Vector3::from(*direction), &Vector3::z())
                else {
                    return Ok(None);
                };
                target
            }
        };
        match find_path(&self.graph, current, target) {
            Ok(path) => Ok(Some(path)),
            Err(err) => {
                if err.is_logic_fault() {
                    error!(%current, %target, "face graph fault: {err}");
                }
                Err(err.into())
            }
        }
    }
}

fn check_cables<M: TensegrityModel + ?Sized>(model: &M) -> Result<(), StepError> {
    match (0..CABLE_COUNT).find(|&c| model.cable(c).is_none()) {
        Some(missing) => Err(StepError::MissingCable(missing)),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// RollExecutor
// ---------------------------------------------------------------------------

enum Flow {
    /// Evaluate the new state within this tick.
    Continue,
    /// Stop until the next tick.
    Wait,
}

/// Plans and executes face-to-face rolls, one tick at a time.
#[derive(Debug)]
pub struct RollExecutor {
    config: RollingConfig,
    bindings: Option<Bindings>,
    state: RollState,
    last_contact: Option<FaceId>,
    ticks: u64,
}

impl RollExecutor {
    /// Create an executor. The goal and tunables are validated here.
    pub fn new(config: RollingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            bindings: None,
            state: RollState::Idle,
            last_contact: None,
            ticks: 0,
        })
    }

    /// Setup callback: check the model against the six-bar layout and build
    /// the tables, estimator, detector and one length controller per cable.
    pub fn on_setup<M: TensegrityModel + ?Sized>(&mut self, model: &M) -> Result<(), SetupError> {
        if model.rod_count() != ROD_COUNT {
            return Err(SetupError::RodCount {
                expected: ROD_COUNT,
                got: model.rod_count(),
            });
        }
        if model.cable_count() != CABLE_COUNT {
            return Err(SetupError::CableCount {
                expected: CABLE_COUNT,
                got: model.cable_count(),
            });
        }
        let reference = self.config.reference_rod;
        if model.rod_pose(reference).is_none() {
            return Err(SetupError::ReferenceRodMissing(reference));
        }

        let bindings = Bindings::new(&self.config);
        info!(
            goal = ?self.config.goal,
            nominal = bindings.nominal_length,
            contracted = self.config.contracted_length(),
            "rolling controller set up"
        );
        self.bindings = Some(bindings);
        self.state = RollState::Idle;
        self.last_contact = None;
        self.ticks = 0;
        Ok(())
    }

    /// Teardown callback: drop bindings and tables.
    pub fn teardown(&mut self) {
        self.bindings = None;
        self.state = RollState::Idle;
        self.last_contact = None;
        debug!("rolling controller torn down");
    }

    /// Replace the goal. The current plan is discarded and the executor plans
    /// again on the next tick with stable contact.
    pub fn set_goal(&mut self, goal: GoalConfig) -> Result<(), ConfigError> {
        goal.validate()?;
        info!(?goal, "goal changed");
        self.config.goal = goal;
        self.state = match self.last_contact {
            Some(current) => RollState::Planning { current },
            None => RollState::Idle,
        };
        Ok(())
    }

    /// Per-tick callback.
    ///
    /// An error aborts the tick and leaves the state as it was before the
    /// call.
    pub fn on_step<M: TensegrityModel + ?Sized>(
        &mut self,
        model: &mut M,
        dt: f64,
    ) -> Result<TickReport, StepError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(StepError::InvalidDt(dt));
        }
        let bindings = self.bindings.as_mut().ok_or(StepError::NotSetUp)?;

        let gravity = bindings.estimator.estimate(model)?;
        let contact = bindings.detector.detect(model, &gravity)?;

        let mut events = Vec::new();
        let mut state = self.state.clone();
        loop {
            let (next, flow) = transition(
                bindings,
                &self.config,
                state,
                contact,
                &gravity,
                &*model,
                &mut events,
            )?;
            state = next;
            if matches!(flow, Flow::Wait) {
                break;
            }
        }

        // Rolls in flight get their commands; a roll waiting to start gets
        // the previous roll's cables relaxed.
        let (step, converged) = match &state {
            RollState::AwaitingTransition { plan, .. } => match plan.step() {
                Some((from, to)) => (Some((from, to)), bindings.apply_edge(model, from, to, dt)?),
                None => (None, false),
            },
            RollState::ExecutingStep { plan, .. } => match plan.step() {
                Some((from, to)) => (None, bindings.release_for(model, from, to, dt)?),
                None => (None, false),
            },
            _ => (None, false),
        };

        debug!(
            tick = self.ticks,
            phase = ?state.phase(),
            contact = ?contact.map(|c| c.face),
            converged,
            "tick"
        );

        self.state = state;
        if let Some(reading) = contact {
            self.last_contact = Some(reading.face);
        }
        self.ticks += 1;

        Ok(TickReport {
            phase: self.state.phase(),
            contact,
            commanded: step,
            converged,
            events,
        })
    }

    /// Current state.
    pub const fn state(&self) -> &RollState {
        &self.state
    }

    /// Active configuration.
    pub const fn config(&self) -> &RollingConfig {
        &self.config
    }

    /// Active goal.
    pub const fn goal(&self) -> &GoalConfig {
        &self.config.goal
    }

    /// Active plan, if a roll is underway.
    pub const fn plan(&self) -> Option<&Plan> {
        self.state.plan()
    }

    /// Last face seen in stable contact.
    pub const fn last_contact(&self) -> Option<FaceId> {
        self.last_contact
    }

    /// Completed `on_step` calls since setup.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Whether the setup callback has run (and teardown has not).
    pub const fn is_set_up(&self) -> bool {
        self.bindings.is_some()
    }

    /// Hull geometry, once set up.
    pub fn geometry(&self) -> Option<&Icosahedron> {
        self.bindings.as_ref().map(|b| &b.geometry)
    }

    /// Face adjacency graph, once set up.
    pub fn graph(&self) -> Option<&FaceGraph<FACE_COUNT>> {
        self.bindings.as_ref().map(|b| &b.graph)
    }

    /// Actuation policy table, once set up.
    pub fn policy(&self) -> Option<&ActuationPolicy<FACE_COUNT>> {
        self.bindings.as_ref().map(|b| &b.policy)
    }
}

/// One state machine step. Returns the next state and whether to keep
/// evaluating within this tick.
fn transition<M: TensegrityModel + ?Sized>(
    bindings: &Bindings,
    config: &RollingConfig,
    state: RollState,
    contact: Option<ContactReading>,
    gravity: &GravityEstimate,
    model: &M,
    events: &mut Vec<RollEvent>,
) -> Result<(RollState, Flow), StepError> {
    let face_goal = match config.goal {
        GoalConfig::Face { face } => Some(FaceId(face)),
        GoalConfig::DeadReckoning { .. } => None,
    };

    let next = match state {
        RollState::Idle => match contact {
            Some(reading) => (RollState::Planning { current: reading.face }, Flow::Continue),
            None => (RollState::Idle, Flow::Wait),
        },

        RollState::Planning { current } => {
            let Some(reading) = contact else {
                return Ok((RollState::Planning { current }, Flow::Wait));
            };
            let current = reading.face;
            match bindings.plan_from(&config.goal, current, gravity)? {
                Some(path) if path.len() > 1 => {
                    info!(from = %current, rolls = path.len() - 1, ?path, "planned");
                    events.push(RollEvent::Planned { path: path.clone() });
                    let plan = Plan::new(path);
                    (RollState::ExecutingStep { plan, retries: 0 }, Flow::Continue)
                }
                _ if face_goal == Some(current) => {
                    info!(face = %current, "goal reached");
                    events.push(RollEvent::GoalReached { face: current });
                    (RollState::GoalReached { face: current }, Flow::Wait)
                }
                None => {
                    debug!(%current, "no face aligned with direction goal");
                    events.push(RollEvent::NoAlignedFace { current });
                    (RollState::Planning { current }, Flow::Wait)
                }
                Some(_) => (RollState::Planning { current }, Flow::Wait),
            }
        }

        RollState::ExecutingStep { plan, retries } => match plan.step() {
            Some((from, to)) => match contact {
                None => (RollState::ExecutingStep { plan, retries }, Flow::Wait),
                Some(reading) if reading.face != from => {
                    warn!(expected = %from, actual = %reading.face, "moved before roll started, replanning");
                    events.push(RollEvent::UnexpectedContact {
                        expected: from,
                        actual: reading.face,
                    });
                    (RollState::Planning { current: reading.face }, Flow::Continue)
                }
                Some(_) if !bindings.is_released(model, from, to)? => {
                    (RollState::ExecutingStep { plan, retries }, Flow::Wait)
                }
                Some(_) => {
                    debug!(%from, %to, retries, "issuing roll");
                    events.push(RollEvent::StepStarted { from, to });
                    let watch = StepWatch::new(from, to, retries);
                    (RollState::AwaitingTransition { plan, watch }, Flow::Wait)
                }
            },
            None => {
                let next = plan
                    .current()
                    .map_or(RollState::Idle, |current| RollState::Planning { current });
                (next, Flow::Continue)
            }
        },

        RollState::AwaitingTransition { mut plan, mut watch } => match contact {
            None => {
                watch.unsettled_ticks += 1;
                if watch.unsettled_ticks == config.contact.unsettled_warn_ticks {
                    warn!(
                        from = %watch.from,
                        to = %watch.to,
                        ticks = watch.unsettled_ticks,
                        "no stable contact"
                    );
                    events.push(RollEvent::Unsettled {
                        ticks: watch.unsettled_ticks,
                    });
                }
                (RollState::AwaitingTransition { plan, watch }, Flow::Wait)
            }

            Some(reading) if face_goal == Some(reading.face) => {
                if reading.face == watch.to {
                    events.push(RollEvent::RollCompleted {
                        from: watch.from,
                        to: watch.to,
                    });
                }
                info!(face = %reading.face, rolls_left = plan.remaining_rolls().saturating_sub(1), "goal reached");
                events.push(RollEvent::GoalReached { face: reading.face });
                (RollState::GoalReached { face: reading.face }, Flow::Wait)
            }

            Some(reading) if reading.face == watch.from => {
                watch.unsettled_ticks = 0;
                watch.ticks_on_start += 1;
                if watch.ticks_on_start < config.stall.max_step_ticks {
                    return Ok((RollState::AwaitingTransition { plan, watch }, Flow::Wait));
                }
                warn!(
                    from = %watch.from,
                    to = %watch.to,
                    ticks = watch.ticks_on_start,
                    retries = watch.retries,
                    "roll stalled"
                );
                events.push(RollEvent::Stalled {
                    from: watch.from,
                    to: watch.to,
                    retries: watch.retries,
                });
                match config.stall.policy {
                    StallPolicy::Retry if watch.retries < config.stall.max_retries => (
                        RollState::ExecutingStep {
                            plan,
                            retries: watch.retries + 1,
                        },
                        Flow::Continue,
                    ),
                    _ => {
                        info!(from = %watch.from, "replanning after stall");
                        (RollState::Planning { current: watch.from }, Flow::Continue)
                    }
                }
            }

            Some(reading) if reading.face == watch.to => {
                info!(from = %watch.from, to = %watch.to, "roll completed");
                events.push(RollEvent::RollCompleted {
                    from: watch.from,
                    to: watch.to,
                });
                plan.advance();
                if plan.is_finished() {
                    (RollState::Planning { current: reading.face }, Flow::Continue)
                } else {
                    (RollState::ExecutingStep { plan, retries: 0 }, Flow::Continue)
                }
            }

            Some(reading) => {
                warn!(expected = %watch.to, actual = %reading.face, "unexpected contact, replanning");
                events.push(RollEvent::UnexpectedContact {
                    expected: watch.to,
                    actual: reading.face,
                });
                (RollState::Planning { current: reading.face }, Flow::Continue)
            }
        },

        RollState::GoalReached { face } => (RollState::GoalReached { face }, Flow::Wait),
    };
    Ok(next)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
