//! Headless runs of the rolling controller against the kinematic rig.
//!
//! No window and no engine: each tick calls the executor's step callback and
//! then advances the rig by the same `dt`.

use nalgebra::Vector3;
use serde::Serialize;
use tracing::{debug, info};
use tumble_core::{FaceId, GoalConfig, RollingConfig, TumbleError};
use tumble_roll::{RollExecutor, TickReport};

use crate::rig::{KinematicSixBar, RigConfig};
use crate::stats::RollStats;

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Whether a face goal was reached.
    pub goal_reached: bool,
    /// Face the rig rests on at the end, `None` mid-roll.
    pub final_face: Option<usize>,
    /// Horizontal displacement of the body origin from the start (m).
    pub displacement: [f64; 2],
    /// Counters accumulated over the run.
    pub stats: RollStats,
}

/// Drives a [`RollExecutor`] and a [`KinematicSixBar`] in lockstep.
#[derive(Debug)]
pub struct HeadlessRunner {
    executor: RollExecutor,
    rig: KinematicSixBar,
    dt: f64,
    max_ticks: u64,
    max_rolls: Option<u32>,
    stats: RollStats,
    origin: Vector3<f64>,
}

impl HeadlessRunner {
    /// Runner with the rig resting on `start`, already set up.
    pub fn new(config: RollingConfig, start: FaceId) -> Result<Self, TumbleError> {
        let rig = KinematicSixBar::new(&config, start);
        let mut executor = RollExecutor::new(config)?;
        executor.on_setup(&rig)?;
        Ok(Self {
            origin: rig.body_pose().translation.vector,
            executor,
            rig,
            dt: 0.01,
            max_ticks: 20_000,
            max_rolls: None,
            stats: RollStats::new(),
        })
    }

    /// Builder: set the control timestep (default: 0.01 s).
    #[must_use]
    pub const fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Builder: set the tick budget of [`run`](Self::run) (default: 20000).
    #[must_use]
    pub const fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Builder: stop [`run`](Self::run) after this many completed rolls.
    /// Direction goals never terminate on their own.
    #[must_use]
    pub const fn with_max_rolls(mut self, max_rolls: u32) -> Self {
        self.max_rolls = Some(max_rolls);
        self
    }

    /// Builder: replace the rig tuning.
    #[must_use]
    pub const fn with_rig(mut self, rig: RigConfig) -> Self {
        self.rig.set_rig(rig);
        self
    }

    /// One control tick followed by one rig step.
    pub fn tick(&mut self) -> Result<TickReport, TumbleError> {
        let report = self.executor.on_step(&mut self.rig, self.dt)?;
        self.rig.step(self.dt);
        self.stats.record(&report);
        Ok(report)
    }

    /// Tick until the rig has settled on the goal face, the roll limit is
    /// hit or the tick budget runs out.
    ///
    /// Contact on the goal face is confirmed a few ticks before the rig
    /// lands, so the run keeps ticking until the landing completes.
    pub fn run(&mut self) -> Result<RunOutcome, TumbleError> {
        let max_rolls = self.max_rolls;
        let budget = self.max_ticks;
        self.run_until(
            |runner| {
                (runner.executor.state().is_goal_reached() && !runner.rig.is_rolling())
                    || max_rolls.is_some_and(|limit| runner.stats.rolls >= limit)
            },
            budget,
        )
    }

    /// Tick until `done` holds or `max_ticks` more ticks have run.
    pub fn run_until(
        &mut self,
        mut done: impl FnMut(&Self) -> bool,
        max_ticks: u64,
    ) -> Result<RunOutcome, TumbleError> {
        let mut ticks = 0;
        while !done(self) && ticks < max_ticks {
            self.tick()?;
            ticks += 1;
        }
        let outcome = self.outcome();
        if outcome.goal_reached {
            info!(
                ticks = outcome.stats.ticks,
                rolls = outcome.stats.rolls,
                "headless run reached goal"
            );
        } else {
            debug!(
                ticks = outcome.stats.ticks,
                rolls = outcome.stats.rolls,
                "headless run stopped"
            );
        }
        Ok(outcome)
    }

    /// Summary of the run so far.
    pub fn outcome(&self) -> RunOutcome {
        let offset = self.rig.body_pose().translation.vector - self.origin;
        RunOutcome {
            goal_reached: self.executor.state().is_goal_reached(),
            final_face: self.rig.resting_face().map(FaceId::index),
            displacement: [offset.x, offset.y],
            stats: self.stats.clone(),
        }
    }

    /// Change the goal mid-run.
    pub fn set_goal(&mut self, goal: GoalConfig) -> Result<(), TumbleError> {
        self.executor.set_goal(goal)?;
        Ok(())
    }

    /// The executor.
    pub const fn executor(&self) -> &RollExecutor {
        &self.executor
    }

    /// The rig.
    pub const fn rig(&self) -> &KinematicSixBar {
        &self.rig
    }

    /// Mutable rig access, for disturbances between ticks.
    pub const fn rig_mut(&mut self) -> &mut KinematicSixBar {
        &mut self.rig
    }

    /// Counters so far.
    pub const fn stats(&self) -> &RollStats {
        &self.stats
    }

    /// Control timestep.
    pub const fn dt(&self) -> f64 {
        self.dt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tumble_roll::RollPhase;

    #[test]
    fn runner_starts_set_up() {
        let runner = HeadlessRunner::new(RollingConfig::face(9.81, 4), FaceId(0)).unwrap();
        assert!(runner.executor().is_set_up());
        assert_eq!(runner.rig().resting_face(), Some(FaceId(0)));
        assert_relative_eq!(runner.dt(), 0.01);
    }

    #[test]
    fn invalid_goal_fails_construction() {
        let err = HeadlessRunner::new(RollingConfig::face(9.81, 20), FaceId(0)).unwrap_err();
        assert!(matches!(err, TumbleError::Config(_)));
    }

    #[test]
    fn invalid_dt_surfaces_as_step_error() {
        let mut runner = HeadlessRunner::new(RollingConfig::face(9.81, 4), FaceId(0))
            .unwrap()
            .with_dt(0.0);
        assert!(matches!(runner.tick(), Err(TumbleError::Step(_))));
    }

    #[test]
    fn first_tick_commands_a_roll() {
        let mut runner = HeadlessRunner::new(RollingConfig::face(9.81, 4), FaceId(0)).unwrap();
        let report = runner.tick().unwrap();
        assert_eq!(report.phase, RollPhase::AwaitingTransition);
        assert!(report.commanded.is_some());
        assert_eq!(runner.stats().plans, 1);
    }

    #[test]
    fn start_on_goal_finishes_immediately() {
        let mut runner = HeadlessRunner::new(RollingConfig::face(9.81, 6), FaceId(6)).unwrap();
        let outcome = runner.run().unwrap();
        assert!(outcome.goal_reached);
        assert_eq!(outcome.final_face, Some(6));
        assert_eq!(outcome.stats.rolls, 0);
        assert_eq!(outcome.stats.ticks, 1);
        assert_relative_eq!(outcome.displacement[0], 0.0);
        assert_relative_eq!(outcome.displacement[1], 0.0);
    }

    #[test]
    fn tick_budget_bounds_run() {
        let mut runner = HeadlessRunner::new(RollingConfig::face(9.81, 4), FaceId(0))
            .unwrap()
            .with_max_ticks(5);
        let outcome = runner.run().unwrap();
        assert!(!outcome.goal_reached);
        assert_eq!(outcome.stats.ticks, 5);
    }
}
