//! End-to-end rolling runs against the kinematic rig.

use nalgebra::Vector3;
use tumble_core::{CLOSED_FACE_COUNT, FACE_COUNT, FaceId, GoalConfig, RollingConfig, StallPolicy};
use tumble_geometry::FaceGraph;
use tumble_planner::find_path;
use tumble_roll::{RollEvent, RollPhase};
use tumble_sim::{HeadlessRunner, RigConfig};
use tumble_test_utils::{random_direction, seeded_rng};

fn face_runner(start: usize, goal: usize) -> HeadlessRunner {
    HeadlessRunner::new(RollingConfig::face(9.81, goal), FaceId(start))
        .unwrap()
        .with_max_ticks(5_000)
}

// ---------------------------------------------------------------------------
// Face goals
// ---------------------------------------------------------------------------

#[test]
fn every_start_reaches_every_closed_goal() {
    let config = RollingConfig::face(9.81, 0);
    let geometry = tumble_geometry::Icosahedron::new(config.geometry.rod_length);
    let graph = FaceGraph::<FACE_COUNT>::from_icosahedron(&geometry);

    for goal in 0..CLOSED_FACE_COUNT {
        for start in 0..FACE_COUNT {
            let outcome = face_runner(start, goal).run().unwrap();
            let shortest = find_path(&graph, FaceId(start), FaceId(goal)).unwrap();
            assert!(outcome.goal_reached, "{start} -> {goal} not reached");
            assert_eq!(outcome.final_face, Some(goal));
            assert_eq!(outcome.stats.rolls as usize, shortest.len() - 1);
            assert_eq!(outcome.stats.stalls, 0);
            assert_eq!(outcome.stats.faces_visited, shortest.iter().map(|f| f.index()).collect::<Vec<_>>());
        }
    }
}

#[test]
fn goal_reached_is_terminal() {
    let mut runner = face_runner(10, 2);
    let outcome = runner.run().unwrap();
    assert!(outcome.goal_reached);
    let rolls = outcome.stats.rolls;
    for _ in 0..200 {
        let report = runner.tick().unwrap();
        assert_eq!(report.phase, RollPhase::GoalReached);
        assert_eq!(report.commanded, None);
    }
    assert_eq!(runner.stats().rolls, rolls);
    assert_eq!(runner.rig().resting_face(), Some(FaceId(2)));
}

#[test]
fn goal_change_mid_path_replans() {
    let mut runner = face_runner(0, 7);
    runner
        .run_until(|r| r.stats().rolls >= 1 && !r.rig().is_rolling(), 2_000)
        .unwrap();
    let here = runner.rig().resting_face().unwrap();

    runner.set_goal(GoalConfig::Face { face: 3 }).unwrap();
    let report = runner.tick().unwrap();
    let planned = report.events.iter().find_map(|e| match e {
        RollEvent::Planned { path } => Some(path.clone()),
        _ => None,
    });
    if here == FaceId(3) {
        assert_eq!(report.phase, RollPhase::GoalReached);
    } else {
        let path = planned.unwrap();
        assert_eq!(path.first(), Some(&here));
        assert_eq!(path.last(), Some(&FaceId(3)));
    }

    let outcome = runner.run().unwrap();
    assert!(outcome.goal_reached);
    assert_eq!(outcome.final_face, Some(3));
}

// ---------------------------------------------------------------------------
// Dead reckoning
// ---------------------------------------------------------------------------

#[test]
fn dead_reckoning_makes_progress_along_direction() {
    let mut rng = seeded_rng(11);
    for _ in 0..4 {
        let direction = random_direction(&mut rng);
        let config = RollingConfig::dead_reckoning(9.81, [direction.x, direction.y, direction.z]);
        let mut runner = HeadlessRunner::new(config, FaceId(0))
            .unwrap()
            .with_max_ticks(10_000)
            .with_max_rolls(6);
        let outcome = runner.run().unwrap();
        assert!(!outcome.goal_reached);
        assert_eq!(outcome.stats.rolls, 6);
        let travelled = Vector3::new(outcome.displacement[0], outcome.displacement[1], 0.0);
        assert!(
            travelled.dot(&direction) > 0.0,
            "moved {travelled:?} against {direction:?}"
        );
    }
}

#[test]
fn dead_reckoning_never_reports_goal() {
    let config = RollingConfig::dead_reckoning(9.81, [1.0, 0.0, 0.0]);
    let mut runner = HeadlessRunner::new(config, FaceId(4))
        .unwrap()
        .with_max_ticks(3_000);
    let outcome = runner.run().unwrap();
    assert!(!outcome.goal_reached);
    assert!(outcome.stats.rolls > 0);
    assert!(outcome.stats.plans >= 1);
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[test]
fn stalled_roll_retries_then_recovers() {
    let mut config = RollingConfig::face(9.81, 5);
    config.stall.max_step_ticks = 150;
    config.stall.max_retries = 1;
    let mut runner = HeadlessRunner::new(config, FaceId(0))
        .unwrap()
        .with_max_ticks(5_000);
    runner.rig_mut().set_locked(true);

    let mut retries_seen = Vec::new();
    for _ in 0..400 {
        let report = runner.tick().unwrap();
        for event in &report.events {
            if let RollEvent::Stalled { retries, .. } = event {
                retries_seen.push(*retries);
            }
        }
    }
    assert_eq!(&retries_seen[..2], &[0, 1]);
    assert!(runner.stats().replans() >= 1);
    assert_eq!(runner.rig().resting_face(), Some(FaceId(0)));

    runner.rig_mut().set_locked(false);
    let outcome = runner.run().unwrap();
    assert!(outcome.goal_reached);
    assert_eq!(outcome.final_face, Some(5));
}

#[test]
fn replan_policy_skips_retries() {
    let mut config = RollingConfig::face(9.81, 5);
    config.stall.max_step_ticks = 100;
    config.stall.policy = StallPolicy::Replan;
    let mut runner = HeadlessRunner::new(config, FaceId(0)).unwrap();
    runner.rig_mut().set_locked(true);
    for _ in 0..350 {
        runner.tick().unwrap();
    }
    let stats = runner.stats();
    assert_eq!(stats.stalls, 3);
    assert_eq!(stats.plans, 4);
}

#[test]
fn unexpected_contact_replans_from_new_face() {
    let mut runner = face_runner(0, 6);
    let first = runner.tick().unwrap();
    let (from, to) = first.commanded.unwrap();

    // Far enough from the roll in flight that no neighbor shares its cables.
    let hops = runner.executor().graph().unwrap().hops_from(to);
    let displaced = (0..FACE_COUNT)
        .map(FaceId)
        .find(|&f| f != from && f != FaceId(6) && hops[f.index()].is_some_and(|h| h >= 3))
        .unwrap();
    runner.rig_mut().place_on(displaced);

    let report = runner.tick().unwrap();
    assert!(report.events.contains(&RollEvent::UnexpectedContact {
        expected: to,
        actual: displaced,
    }));
    let replanned = report.events.iter().find_map(|e| match e {
        RollEvent::Planned { path } => Some(path.clone()),
        _ => None,
    });
    assert_eq!(replanned.unwrap().first(), Some(&displaced));

    let outcome = runner.run().unwrap();
    assert!(outcome.goal_reached);
    assert_eq!(outcome.stats.unexpected_contacts, 1);
}

#[test]
fn lifted_rig_reports_unsettled() {
    let mut config = RollingConfig::face(9.81, 6);
    config.contact.unsettled_warn_ticks = 10;
    let mut runner = HeadlessRunner::new(config, FaceId(0)).unwrap();
    runner.tick().unwrap();

    let lifted = nalgebra::Translation3::new(0.0, 0.0, 1.0) * *runner.rig().body_pose();
    runner.rig_mut().set_body_pose(lifted);

    let mut unsettled = Vec::new();
    for _ in 0..30 {
        let report = runner.tick().unwrap();
        assert_eq!(report.contact, None);
        assert_eq!(report.phase, RollPhase::AwaitingTransition);
        for event in report.events {
            if let RollEvent::Unsettled { ticks } = event {
                unsettled.push(ticks);
            }
        }
    }
    assert_eq!(unsettled, vec![10]);
}

#[test]
fn slow_rig_still_arrives() {
    let mut runner = face_runner(12, 1).with_rig(RigConfig {
        trigger_fraction: 0.95,
        roll_duration: 1.5,
    });
    let outcome = runner.run().unwrap();
    assert!(outcome.goal_reached);
    assert_eq!(outcome.stats.stalls, 0);
    assert!(outcome.stats.mean_roll_ticks().unwrap() > 150.0);
}
