//! Core engine for the resource-allocation simulator.
//!
//! This crate models a fixed population of tasks competing for reusable
//! resource types over discrete cycles, and runs the same workload under two
//! managers: an optimistic manager that grants greedily and recovers from
//! deadlock by aborting victims, and a Banker's avoidance manager that only
//! grants requests leaving the system in a safe state.

/// Accumulated, ordered diagnostics emitted by the loader and managers.
pub mod diagnostics;
/// Error types and result definitions.
pub mod error;
/// Workload file parsing.
pub mod loader;
/// The cycle engine and both allocation managers.
pub mod manager;
/// Resources, activities, tasks and the workload they form.
pub mod model;
/// Side-by-side comparison of two simulation runs.
pub mod report;
/// Banker's safety algorithm.
pub mod safety;

pub use diagnostics::{Diagnostic, DiagnosticOrigin, Diagnostics};
pub use error::{Error, Result};
pub use loader::{LoadedWorkload, load_workload, parse_workload};
pub use manager::{
    AbortReason, AllocationPolicy, AvoidanceManager, Decision, ManagerKind, OptimisticManager,
    Simulation, SimulationContext, SimulationOutcome, TaskOutcome, TaskStatus,
};
pub use model::{
    Activity, ActivityKind, Request, ResourceId, ResourceVector, Task, TaskId, TaskState, Workload,
};
pub use report::{ComparisonReport, ReportRow, Totals};
pub use safety::{Standing, is_safe, safe_sequence};
