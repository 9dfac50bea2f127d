//! Cycle-stepped simulation of the two allocation managers.
//!
//! Both managers share one engine ([`Simulation`]) that advances every task
//! by at most one activity per cycle:
//!
//! 1. compute timers tick down; expired tasks rejoin (or terminate)
//! 2. blocked tasks retry their parked request, in queue order
//! 3. every running task executes exactly one activity
//! 4. tasks made ready this cycle rejoin the running set
//! 5. if nothing could move, the policy resolves the stall
//! 6. units released this cycle become available for the next one
//!
//! The [`AllocationPolicy`] decides what differs between managers: how
//! claims are handled, whether a request may be granted, and what to do
//! when the run stalls.

mod avoidance;
mod context;
mod engine;
mod optimistic;
mod outcome;

pub use avoidance::AvoidanceManager;
pub use context::SimulationContext;
pub use engine::{AllocationPolicy, Decision, Simulation};
pub use optimistic::OptimisticManager;
pub use outcome::{AbortReason, SimulationOutcome, TaskOutcome, TaskStatus, percentage};

use core::fmt;

use serde::Serialize;

use crate::diagnostics::DiagnosticOrigin;
use crate::error::Result;
use crate::model::Workload;

/// Which allocation strategy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerKind {
    /// Grant-then-detect (FIFO) manager
    Optimistic,
    /// Banker's avoidance manager
    Avoidance,
}

impl ManagerKind {
    /// Both managers, in report order.
    pub const ALL: [Self; 2] = [Self::Optimistic, Self::Avoidance];

    /// Column heading used in the comparison table.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Optimistic => "FIFO",
            Self::Avoidance => "BANKER'S",
        }
    }

    /// Diagnostic origin for messages raised by this manager.
    pub const fn origin(self) -> DiagnosticOrigin {
        match self {
            Self::Optimistic => DiagnosticOrigin::Optimistic,
            Self::Avoidance => DiagnosticOrigin::Avoidance,
        }
    }

    /// Run `workload` to completion under this manager.
    ///
    /// # Errors
    /// Returns an error if the run violates an allocation invariant or stalls.
    pub fn simulate(self, workload: &Workload) -> Result<SimulationOutcome> {
        match self {
            Self::Optimistic => Simulation::new(OptimisticManager, workload).run(),
            Self::Avoidance => Simulation::new(AvoidanceManager, workload).run(),
        }
    }
}

impl fmt::Display for ManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimistic => write!(f, "Optimistic"),
            Self::Avoidance => write!(f, "Banker's"),
        }
    }
}
