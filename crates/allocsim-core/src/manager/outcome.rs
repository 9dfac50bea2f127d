use core::fmt;

use serde::Serialize;

use super::ManagerKind;
use crate::diagnostics::Diagnostics;
use crate::model::{ResourceId, TaskId};

/// Why a manager killed a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
    /// Chosen as a deadlock victim by the optimistic manager
    Deadlock,
    /// Declared a claim larger than the resource's total capacity
    ClaimExceedsCapacity {
        /// Resource type claimed
        resource: ResourceId,
        /// Units claimed
        claim: u32,
        /// Units that exist
        capacity: u32,
    },
    /// Asked for more than its declared claim
    ClaimViolation {
        /// Resource type requested
        resource: ResourceId,
        /// Units requested
        requested: u32,
    },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deadlock => write!(f, "deadlock victim"),
            Self::ClaimExceedsCapacity {
                resource,
                claim,
                capacity,
            } => write!(
                f,
                "claim for resource {resource} ({claim}) exceeds capacity ({capacity})"
            ),
            Self::ClaimViolation {
                resource,
                requested,
            } => write!(
                f,
                "request for {requested} unit(s) of resource {resource} exceeds claim"
            ),
        }
    }
}

/// Terminal status of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskStatus {
    /// Ran its final activity
    Terminated {
        /// Cycle in which the task finished
        total_time: u32,
        /// Cycles spent blocked
        wait_time: u32,
    },
    /// Killed by the manager
    Aborted {
        /// Cycle in which the task was aborted
        cycle: u32,
        /// Why it was aborted
        reason: AbortReason,
    },
}

/// Final timing of one task in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    /// Task number
    pub task: TaskId,
    /// How the task ended
    #[serde(flatten)]
    pub status: TaskStatus,
}

impl TaskOutcome {
    /// Whether the task was aborted.
    pub const fn is_aborted(&self) -> bool {
        matches!(self.status, TaskStatus::Aborted { .. })
    }

    /// `(total_time, wait_time)` of a terminated task.
    pub const fn timing(&self) -> Option<(u32, u32)> {
        match self.status {
            TaskStatus::Terminated {
                total_time,
                wait_time,
            } => Some((total_time, wait_time)),
            TaskStatus::Aborted { .. } => None,
        }
    }

    /// Share of the task's lifetime spent blocked, as a rounded percentage.
    pub fn wait_percentage(&self) -> Option<u64> {
        self.timing()
            .map(|(total, wait)| percentage(u64::from(wait), u64::from(total)))
    }
}

/// `100 * part / whole`, rounded half away from zero; 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    (part * 200 + whole) / (whole * 2)
}

/// Everything one manager's run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationOutcome {
    /// Manager that ran
    pub manager: ManagerKind,
    /// Number of cycles simulated
    pub cycles: u32,
    /// One entry per task, sorted by task number
    pub tasks: Vec<TaskOutcome>,
    /// Diagnostics raised during the run
    pub diagnostics: Diagnostics,
}

impl SimulationOutcome {
    /// Outcome of one task.
    pub fn task(&self, task: TaskId) -> Option<&TaskOutcome> {
        self.tasks.iter().find(|outcome| outcome.task == task)
    }

    /// Number of aborted tasks.
    pub fn aborted_count(&self) -> usize {
        self.tasks.iter().filter(|outcome| outcome.is_aborted()).count()
    }
}
