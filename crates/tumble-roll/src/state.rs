//! Roll executor state, plans and per-tick reports.

use tumble_core::FaceId;

use crate::contact::ContactReading;

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A face path with a cursor on the face the robot currently rests on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    faces: Vec<FaceId>,
    cursor: usize,
}

impl Plan {
    /// Plan over `faces`, starting at the first. Callers pass non-empty
    /// paths; an empty path is treated as already finished.
    pub const fn new(faces: Vec<FaceId>) -> Self {
        Self { faces, cursor: 0 }
    }

    /// Every face of the path, start and goal included.
    pub fn faces(&self) -> &[FaceId] {
        &self.faces
    }

    /// Index of the current face in [`faces`](Self::faces).
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Face the current roll starts from.
    pub fn current(&self) -> Option<FaceId> {
        self.faces.get(self.cursor).copied()
    }

    /// Face the current roll ends on.
    pub fn next(&self) -> Option<FaceId> {
        self.faces.get(self.cursor + 1).copied()
    }

    /// `(from, to)` of the current roll.
    pub fn step(&self) -> Option<(FaceId, FaceId)> {
        self.current().zip(self.next())
    }

    /// Last face of the path.
    pub fn goal(&self) -> Option<FaceId> {
        self.faces.last().copied()
    }

    /// Move the cursor onto the next face.
    pub const fn advance(&mut self) {
        if self.cursor + 1 < self.faces.len() {
            self.cursor += 1;
        }
    }

    /// Rolls left to reach the goal.
    pub const fn remaining_rolls(&self) -> usize {
        self.faces.len().saturating_sub(self.cursor + 1)
    }

    /// Whether no rolls remain.
    pub const fn is_finished(&self) -> bool {
        self.remaining_rolls() == 0
    }
}

// ---------------------------------------------------------------------------
// StepWatch
// ---------------------------------------------------------------------------

/// Progress bookkeeping for the roll in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepWatch {
    /// Face the roll starts from.
    pub from: FaceId,
    /// Face the roll should end on.
    pub to: FaceId,
    /// Ticks spent still resting on `from`.
    pub ticks_on_start: u32,
    /// Consecutive ticks without stable contact.
    pub unsettled_ticks: u32,
    /// Restarts of this step after stalls.
    pub retries: u32,
}

impl StepWatch {
    /// Fresh watch for a roll `from → to`.
    pub const fn new(from: FaceId, to: FaceId, retries: u32) -> Self {
        Self {
            from,
            to,
            ticks_on_start: 0,
            unsettled_ticks: 0,
            retries,
        }
    }
}

// ---------------------------------------------------------------------------
// RollState
// ---------------------------------------------------------------------------

/// Executor state machine.
///
/// | State | Leaves to |
/// |---|---|
/// | `Idle` | `Planning` on first stable contact |
/// | `Planning` | `ExecutingStep`, `GoalReached`, or stays (also while no stable contact) |
/// | `ExecutingStep` | `AwaitingTransition` once released cables converge and the step's commands are issued, `Planning` on contact elsewhere |
/// | `AwaitingTransition` | `ExecutingStep`, `GoalReached`, `Planning` |
/// | `GoalReached` | `Planning` on goal change |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RollState {
    /// No stable contact seen yet.
    #[default]
    Idle,
    /// Choosing a path. `current` is only the last face known; planning
    /// always starts from the live stable contact and waits without one.
    Planning { current: FaceId },
    /// Relaxing the cables the last roll contracted, then issuing the
    /// commands for the plan's current roll.
    ExecutingStep { plan: Plan, retries: u32 },
    /// Commands issued; waiting for contact on the next face.
    AwaitingTransition { plan: Plan, watch: StepWatch },
    /// Resting on the goal face.
    GoalReached { face: FaceId },
}

impl RollState {
    /// Coarse phase without payload.
    pub const fn phase(&self) -> RollPhase {
        match self {
            Self::Idle => RollPhase::Idle,
            Self::Planning { .. } => RollPhase::Planning,
            Self::ExecutingStep { .. } => RollPhase::ExecutingStep,
            Self::AwaitingTransition { .. } => RollPhase::AwaitingTransition,
            Self::GoalReached { .. } => RollPhase::GoalReached,
        }
    }

    /// Active plan, if a roll is underway.
    pub const fn plan(&self) -> Option<&Plan> {
        match self {
            Self::ExecutingStep { plan, .. } | Self::AwaitingTransition { plan, .. } => Some(plan),
            _ => None,
        }
    }

    /// Whether the state is terminal for a face goal.
    pub const fn is_goal_reached(&self) -> bool {
        matches!(self, Self::GoalReached { .. })
    }
}

/// Payload-free view of [`RollState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollPhase {
    Idle,
    Planning,
    ExecutingStep,
    AwaitingTransition,
    GoalReached,
}

// ---------------------------------------------------------------------------
// Events and reports
// ---------------------------------------------------------------------------

/// Notable transitions during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollEvent {
    /// A new path was planned.
    Planned { path: Vec<FaceId> },
    /// Commands for a roll were issued (again, after a retry).
    StepStarted { from: FaceId, to: FaceId },
    /// Contact confirmed on the roll's target face.
    RollCompleted { from: FaceId, to: FaceId },
    /// The goal face is grounded.
    GoalReached { face: FaceId },
    /// A roll spent too long on its start face.
    Stalled { from: FaceId, to: FaceId, retries: u32 },
    /// Contact on a face the plan did not expect.
    UnexpectedContact { expected: FaceId, actual: FaceId },
    /// No stable contact for this many ticks mid-roll.
    Unsettled { ticks: u32 },
    /// Direction goal with no face aligned to it.
    NoAlignedFace { current: FaceId },
}

/// Outcome of one `on_step` call.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Phase at the end of the tick.
    pub phase: RollPhase,
    /// Stable contact seen this tick.
    pub contact: Option<ContactReading>,
    /// Roll whose commands were applied this tick.
    pub commanded: Option<(FaceId, FaceId)>,
    /// Whether every cable commanded this tick sits within tolerance of its
    /// target: the roll's targets in flight, nominal while releasing.
    pub converged: bool,
    /// Transitions taken this tick, in order.
    pub events: Vec<RollEvent>,
}

impl TickReport {
    /// Whether any event of this tick matches `predicate`.
    pub fn has_event(&self, predicate: impl Fn(&RollEvent) -> bool) -> bool {
        self.events.iter().any(predicate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
