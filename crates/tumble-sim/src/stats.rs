//! Run statistics.
//!
//! [`RollStats`] folds [`TickReport`]s into counters: ticks, completed rolls,
//! stalls, plans, and the tick count of every completed roll.

use serde::Serialize;
use tumble_core::FaceId;
use tumble_roll::{RollEvent, TickReport};

// ---------------------------------------------------------------------------
// RollStats
// ---------------------------------------------------------------------------

/// Cumulative statistics over one run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RollStats {
    /// Ticks recorded.
    pub ticks: u64,
    /// Rolls confirmed by contact on the target face.
    pub rolls: u32,
    /// Stall detections.
    pub stalls: u32,
    /// Paths planned, the first one included.
    pub plans: u32,
    /// Contacts on a face the plan did not expect.
    pub unexpected_contacts: u32,
    /// Faces confirmed in contact, in order, without repeats.
    pub faces_visited: Vec<usize>,
    /// Ticks each completed roll took, from its commands to its contact.
    pub roll_ticks: Vec<u64>,
    /// Tick of the last `StepStarted` (for measuring roll durations).
    #[serde(skip)]
    step_started_at: Option<u64>,
}

impl RollStats {
    /// Create empty stats.
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            rolls: 0,
            stalls: 0,
            plans: 0,
            unexpected_contacts: 0,
            faces_visited: Vec::new(),
            roll_ticks: Vec::new(),
            step_started_at: None,
        }
    }

    /// Fold one tick into the counters.
    pub fn record(&mut self, report: &TickReport) {
        if let Some(contact) = report.contact {
            self.visit(contact.face);
        }
        for event in &report.events {
            match event {
                RollEvent::Planned { .. } => self.plans += 1,
                RollEvent::StepStarted { .. } => {
                    // A retry restarts the clock.
                    self.step_started_at = Some(self.ticks);
                }
                RollEvent::RollCompleted { .. } => {
                    self.rolls += 1;
                    if let Some(start) = self.step_started_at.take() {
                        self.roll_ticks.push(self.ticks - start);
                    }
                }
                RollEvent::Stalled { .. } => self.stalls += 1,
                RollEvent::UnexpectedContact { .. } => {
                    self.unexpected_contacts += 1;
                    self.step_started_at = None;
                }
                RollEvent::GoalReached { .. }
                | RollEvent::Unsettled { .. }
                | RollEvent::NoAlignedFace { .. } => {}
            }
        }
        self.ticks += 1;
    }

    fn visit(&mut self, face: FaceId) {
        if self.faces_visited.last() != Some(&face.index()) {
            self.faces_visited.push(face.index());
        }
    }

    /// Plans made after the first one.
    pub const fn replans(&self) -> u32 {
        self.plans.saturating_sub(1)
    }

    /// Average ticks per completed roll.
    pub fn mean_roll_ticks(&self) -> Option<f64> {
        if self.roll_ticks.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let sum: f64 = self.roll_ticks.iter().map(|&t| t as f64).sum();
        #[allow(clippy::cast_precision_loss)]
        Some(sum / self.roll_ticks.len() as f64)
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
