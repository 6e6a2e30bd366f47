//! Bevy ECS plugin for the rolling controller.
//!
//! Provides [`TumbleRollPlugin`], which binds a [`RollExecutor`] to a model
//! resource at startup and steps it once per frame.
//!
//! The step system runs in [`RollSet::Decide`]; physics or a simulated rig
//! should run in [`RollSet::Simulate`], after it.

use std::marker::PhantomData;

use bevy::prelude::*;
use tracing::error;
use tumble_core::{ConfigError, RollingConfig, StepError};

use crate::executor::RollExecutor;
use crate::model::TensegrityModel;
use crate::state::TickReport;

/// Ordering of the rolling systems within `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollSet {
    /// Estimate, detect, plan and command cables.
    Decide,
    /// Advance the model.
    Simulate,
}

/// Executor resource with a fixed control timestep.
#[derive(Resource, Debug)]
pub struct RollController {
    /// The executor.
    pub executor: RollExecutor,
    /// Control timestep in seconds.
    pub dt: f64,
    /// Report of the last successful tick.
    pub last_report: Option<TickReport>,
    /// Error of the last failed tick, cleared on success.
    pub last_error: Option<StepError>,
}

impl RollController {
    /// Controller for `config`, stepping at `dt` seconds.
    pub fn new(config: RollingConfig, dt: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            executor: RollExecutor::new(config)?,
            dt,
            last_report: None,
            last_error: None,
        })
    }
}

/// Rolls the model resource `M` with the [`RollController`] resource.
///
/// Insert both resources before the first update.
pub struct TumbleRollPlugin<M> {
    _model: PhantomData<fn() -> M>,
}

impl<M> Default for TumbleRollPlugin<M> {
    fn default() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<M: TensegrityModel + Resource> Plugin for TumbleRollPlugin<M> {
    fn build(&self, app: &mut App) {
        app.configure_sets(Update, (RollSet::Decide, RollSet::Simulate).chain())
            .add_systems(Startup, roll_setup_system::<M>)
            .add_systems(Update, roll_step_system::<M>.in_set(RollSet::Decide));
    }
}

/// Setup callback: bind the executor to the model.
#[allow(clippy::needless_pass_by_value)]
pub fn roll_setup_system<M: TensegrityModel + Resource>(
    mut controller: ResMut<RollController>,
    model: Res<M>,
) {
    if let Err(err) = controller.executor.on_setup(&*model) {
        error!("rolling controller setup failed: {err}");
    }
}

/// Per-frame callback.
pub fn roll_step_system<M: TensegrityModel + Resource>(
    mut controller: ResMut<RollController>,
    mut model: ResMut<M>,
) {
    let dt = controller.dt;
    match controller.executor.on_step(&mut *model, dt) {
        Ok(report) => {
            controller.last_report = Some(report);
            controller.last_error = None;
        }
        Err(err) => {
            error!("rolling controller tick failed: {err}");
            controller.last_error = Some(err);
        }
    }
}
