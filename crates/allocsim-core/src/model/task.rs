use core::fmt;
use std::collections::VecDeque;

use serde::Serialize;

use super::activity::{Activity, Request};
use super::resource::{ResourceId, ResourceVector};
use crate::error::{Error, Result};

/// 1-based task number, unique within a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(u32);

impl TaskId {
    /// Task with the given 1-based number.
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// Task stored at a 0-based position.
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    /// 1-based task number.
    pub const fn number(self) -> u32 {
        self.0
    }

    /// 0-based position in a task list.
    pub const fn index(self) -> usize {
        self.0.saturating_sub(1) as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Execution state of a task within one manager's run.
///
/// ```text
///   Running ──request denied──► Blocked ──granted──► Running
///   Running ──compute(n)──────► Computing ──expired─► Running
///   Running ──terminate───────► Terminated
///   any live state ──abort────► Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TaskState {
    /// Task advances one activity per cycle
    Running,
    /// Task waits for its parked request to be granted
    Blocked,
    /// Task is busy for a number of cycles
    Computing,
    /// Task ran its final activity
    Terminated,
    /// Task was killed by the manager
    Aborted,
}

impl TaskState {
    /// Whether this state is final.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated | Self::Aborted)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Blocked => write!(f, "blocked"),
            Self::Computing => write!(f, "computing"),
            Self::Terminated => write!(f, "terminated"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// A task as owned by one manager's run.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    activities: VecDeque<Activity>,
    allocated: ResourceVector,
    claim: ResourceVector,
    pending: Option<Request>,
    state: TaskState,
    wait_time: u32,
    total_time: u32,
}

impl Task {
    /// Create a running task holding nothing, with an empty claim.
    pub fn new(id: TaskId, activities: impl IntoIterator<Item = Activity>, resources: usize) -> Self {
        Self {
            id,
            activities: activities.into_iter().collect(),
            allocated: ResourceVector::zeros(resources),
            claim: ResourceVector::zeros(resources),
            pending: None,
            state: TaskState::Running,
            wait_time: 0,
            total_time: 0,
        }
    }

    /// Task number.
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Current state.
    pub const fn state(&self) -> TaskState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: TaskState) {
        self.state = state;
    }

    /// Whether the task has terminated or been aborted.
    pub const fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether the task was aborted.
    pub const fn is_aborted(&self) -> bool {
        matches!(self.state, TaskState::Aborted)
    }

    /// Next activity without consuming it.
    pub fn peek_front(&self) -> Option<&Activity> {
        self.activities.front()
    }

    /// Consume the next activity.
    pub fn pop_front(&mut self) -> Option<Activity> {
        self.activities.pop_front()
    }

    /// Number of activities not yet consumed.
    pub fn remaining(&self) -> usize {
        self.activities.len()
    }

    /// Whether the next activity is `terminate`.
    pub fn next_is_terminate(&self) -> bool {
        self.peek_front().is_some_and(Activity::is_terminate)
    }

    /// Whether the task should finish now instead of taking another cycle.
    ///
    /// True when the next activity is `terminate` or nothing is left to run.
    pub fn ready_to_terminate(&self) -> bool {
        self.activities.is_empty() || self.next_is_terminate()
    }

    /// Units currently held, per resource type.
    pub const fn allocated(&self) -> &ResourceVector {
        &self.allocated
    }

    /// Declared maximum units, per resource type.
    pub const fn claim(&self) -> &ResourceVector {
        &self.claim
    }

    /// `claim - allocated`, the units the task may still ask for.
    pub fn need(&self) -> ResourceVector {
        self.claim.saturating_sub(&self.allocated)
    }

    /// Record the claim for one resource type.
    pub fn set_claim(&mut self, resource: ResourceId, units: u32) {
        self.claim.set(resource, units);
    }

    /// Whether holding `units` more of `resource` would exceed the claim.
    pub fn exceeds_claim(&self, resource: ResourceId, units: u32) -> bool {
        u64::from(self.allocated.get(resource)) + u64::from(units)
            > u64::from(self.claim.get(resource))
    }

    /// Add granted units to the allocation.
    pub fn allocate(&mut self, resource: ResourceId, units: u32) {
        self.allocated.add(resource, units);
    }

    /// Remove released units from the allocation.
    ///
    /// # Errors
    /// Returns [`Error::AllocationUnderflow`] when the task holds fewer units.
    pub fn deallocate(&mut self, resource: ResourceId, units: u32) -> Result<()> {
        let task = self.id;
        self.allocated
            .try_sub(resource, units)
            .map_err(|held| Error::AllocationUnderflow {
                task,
                resource,
                held,
                requested: units,
            })
    }

    /// Zero the allocation and hand back everything that was held.
    pub fn surrender(&mut self) -> ResourceVector {
        let held = self.allocated.clone();
        self.allocated.clear();
        held
    }

    /// Park a request that could not be granted.
    pub fn park(&mut self, request: Request) {
        self.pending = Some(request);
    }

    /// Request currently parked, if blocked.
    pub const fn pending(&self) -> Option<Request> {
        self.pending
    }

    /// Clear the parked request once granted.
    pub fn unpark(&mut self) -> Option<Request> {
        self.pending.take()
    }

    /// Cycles spent blocked.
    pub const fn wait_time(&self) -> u32 {
        self.wait_time
    }

    /// Count one more blocked cycle.
    pub fn record_wait(&mut self) {
        self.wait_time += 1;
    }

    /// Cycle in which the task finished, or 0 while live.
    pub const fn total_time(&self) -> u32 {
        self.total_time
    }

    pub(crate) fn finish(&mut self, state: TaskState, cycle: u32) {
        self.state = state;
        self.total_time = cycle;
        self.pending = None;
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test code is allowed to fail loudly"
)]
mod tests {
    use super::*;

    const RESOURCE: ResourceId = ResourceId::from_index(0);

    fn task(activities: Vec<Activity>) -> Task {
        Task::new(TaskId::new(1), activities, 2)
    }

    #[test]
    fn test_task_id_numbering() {
        assert_eq!(TaskId::from_index(0), TaskId::new(1));
        assert_eq!(TaskId::new(3).index(), 2);
        assert_eq!(TaskId::new(3).to_string(), "3");
    }

    #[test]
    fn test_new_task_holds_nothing() {
        let fresh = task(vec![Activity::Terminate]);
        assert_eq!(fresh.state(), TaskState::Running);
        assert!(fresh.allocated().is_zero());
        assert!(fresh.claim().is_zero());
        assert_eq!(fresh.wait_time(), 0);
        assert!(fresh.pending().is_none());
    }

    #[test]
    fn test_terminate_predicates() {
        let mut running = task(vec![
            Activity::Request {
                resource: RESOURCE,
                units: 1,
            },
            Activity::Terminate,
        ]);
        assert!(!running.next_is_terminate());
        assert!(!running.ready_to_terminate());

        let popped = running.pop_front();
        assert!(matches!(popped, Some(Activity::Request { units: 1, .. })));
        assert!(running.next_is_terminate());

        let exhausted = task(Vec::new());
        assert!(!exhausted.next_is_terminate());
        assert!(exhausted.ready_to_terminate());
    }

    #[test]
    fn test_claim_checks() {
        let mut claimed = task(Vec::new());
        claimed.set_claim(RESOURCE, 3);
        claimed.allocate(RESOURCE, 2);

        assert!(!claimed.exceeds_claim(RESOURCE, 1));
        assert!(claimed.exceeds_claim(RESOURCE, 2));
        assert_eq!(claimed.need().as_slice(), &[1, 0]);
    }

    #[test]
    fn test_deallocate_underflow_is_an_error() {
        let mut holder = task(Vec::new());
        holder.allocate(RESOURCE, 1);

        let error = holder.deallocate(RESOURCE, 2).unwrap_err();
        assert!(matches!(
            error,
            Error::AllocationUnderflow {
                held: 1,
                requested: 2,
                ..
            }
        ));
        assert_eq!(holder.allocated().get(RESOURCE), 1);

        holder.deallocate(RESOURCE, 1).expect("holds one unit");
        assert!(holder.allocated().is_zero());
    }

    #[test]
    fn test_surrender_zeroes_allocation() {
        let mut holder = task(Vec::new());
        holder.allocate(RESOURCE, 2);
        holder.allocate(ResourceId::from_index(1), 1);

        let held = holder.surrender();
        assert_eq!(held.as_slice(), &[2, 1]);
        assert!(holder.allocated().is_zero());
    }

    #[test]
    fn test_finish_clears_pending_request() {
        let mut blocked = task(Vec::new());
        blocked.park(Request {
            resource: RESOURCE,
            units: 1,
        });
        blocked.record_wait();
        blocked.finish(TaskState::Aborted, 4);

        assert!(blocked.is_aborted());
        assert!(blocked.is_finished());
        assert!(blocked.pending().is_none());
        assert_eq!(blocked.total_time(), 4);
        assert_eq!(blocked.wait_time(), 1);
    }
}
