//! ECS wiring of the rolling controller.

use bevy::prelude::*;
use nalgebra::Isometry3;
use tumble_actuator_core::cable::CableActuator;
use tumble_core::{FaceId, RollingConfig};
use tumble_roll::{RollController, RollPhase, RollSet, TensegrityModel, TumbleRollPlugin};
use tumble_sim::KinematicSixBar;

const DT: f64 = 0.01;

/// The kinematic rig as a resource.
#[derive(Resource)]
struct SimRig(KinematicSixBar);

impl TensegrityModel for SimRig {
    fn rod_count(&self) -> usize {
        self.0.rod_count()
    }
    fn rod_pose(&self, rod: usize) -> Option<Isometry3<f64>> {
        self.0.rod_pose(rod)
    }
    fn cable_count(&self) -> usize {
        self.0.cable_count()
    }
    fn cable(&self, cable: usize) -> Option<&dyn CableActuator> {
        self.0.cable(cable)
    }
    fn cable_mut(&mut self, cable: usize) -> Option<&mut dyn CableActuator> {
        self.0.cable_mut(cable)
    }
}

fn rig_step_system(mut rig: ResMut<SimRig>) {
    rig.0.step(DT);
}

fn rolling_app(goal: usize, start: usize) -> App {
    let config = RollingConfig::face(9.81, goal);
    let rig = KinematicSixBar::new(&config, FaceId(start));
    let mut app = App::new();
    app.insert_resource(SimRig(rig));
    app.insert_resource(RollController::new(config, DT).unwrap());
    app.add_plugins(TumbleRollPlugin::<SimRig>::default());
    app.add_systems(Update, rig_step_system.in_set(RollSet::Simulate));
    app
}

#[test]
fn setup_runs_at_startup() {
    let mut app = rolling_app(4, 0);
    app.update();
    let controller = app.world().resource::<RollController>();
    assert!(controller.executor.is_set_up());
    assert!(controller.last_error.is_none());
    let report = controller.last_report.as_ref().unwrap();
    assert_eq!(report.phase, RollPhase::AwaitingTransition);
}

#[test]
fn app_rolls_to_goal() {
    let mut app = rolling_app(6, 11);
    for _ in 0..3_000 {
        app.update();
        if app.world().resource::<RollController>().executor.state().is_goal_reached() {
            break;
        }
    }
    let controller = app.world().resource::<RollController>();
    assert!(controller.executor.state().is_goal_reached());
    assert_eq!(controller.executor.last_contact(), Some(FaceId(6)));
}

#[test]
fn step_errors_are_kept_on_the_resource() {
    let mut app = rolling_app(4, 0);
    app.world_mut().resource_mut::<RollController>().dt = 0.0;
    app.update();
    let controller = app.world().resource::<RollController>();
    assert!(controller.last_report.is_none());
    assert!(controller.last_error.is_some());
}
