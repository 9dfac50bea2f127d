use core::mem;

use tracing::{debug, info};

use super::ManagerKind;
use super::outcome::{AbortReason, SimulationOutcome, TaskOutcome, TaskStatus};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::model::{Request, ResourceId, ResourceVector, Task, TaskId, TaskState, Workload};

/// All mutable state of one manager's run.
///
/// Built fresh from a [`Workload`] for every run, so nothing here is ever
/// shared between the two managers.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    manager: ManagerKind,
    cycle: u32,
    capacity: ResourceVector,
    available: ResourceVector,
    released: ResourceVector,
    tasks: Vec<Task>,
    pub(super) running: Vec<TaskId>,
    pub(super) ready: Vec<TaskId>,
    pub(super) blocked: Vec<TaskId>,
    pub(super) computing: Vec<(TaskId, u32)>,
    abort_reasons: Vec<Option<AbortReason>>,
    finished: usize,
    settled_while_active: usize,
    diagnostics: Diagnostics,
}

impl SimulationContext {
    /// Fresh state for `manager` over `workload`: every task running, the
    /// whole capacity available.
    pub fn new(manager: ManagerKind, workload: &Workload) -> Self {
        let tasks = workload.instantiate();
        let running = tasks.iter().map(Task::id).collect();
        Self {
            manager,
            cycle: 0,
            capacity: workload.capacity().clone(),
            available: workload.capacity().clone(),
            released: ResourceVector::zeros(workload.resource_count()),
            abort_reasons: vec![None; tasks.len()],
            tasks,
            running,
            ready: Vec::new(),
            blocked: Vec::new(),
            computing: Vec::new(),
            finished: 0,
            settled_while_active: 0,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Manager this state belongs to.
    pub const fn manager(&self) -> ManagerKind {
        self.manager
    }

    /// Current cycle; 0 before the first step.
    pub const fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Total units per resource type.
    pub const fn capacity(&self) -> &ResourceVector {
        &self.capacity
    }

    /// Units grantable right now.
    pub const fn available(&self) -> &ResourceVector {
        &self.available
    }

    /// Units given back this cycle; they become available next cycle.
    pub const fn released(&self) -> &ResourceVector {
        &self.released
    }

    /// Every task, ordered by task number.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// One task by number.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.index())
    }

    /// Tasks that have not terminated or been aborted.
    pub fn live_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|task| !task.is_finished())
    }

    /// Blocked tasks in queue order.
    pub fn blocked(&self) -> &[TaskId] {
        &self.blocked
    }

    /// Tasks that will act next cycle, in order.
    pub fn running(&self) -> &[TaskId] {
        &self.running
    }

    /// Compute timers as `(task, cycles left)` in registration order.
    pub fn computing(&self) -> &[(TaskId, u32)] {
        &self.computing
    }

    /// Blocked task with the lowest task number.
    pub fn lowest_blocked(&self) -> Option<TaskId> {
        self.blocked.iter().min().copied()
    }

    /// Diagnostics raised so far in this run.
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Whether every task has reached a terminal state.
    pub fn is_complete(&self) -> bool {
        self.finished == self.tasks.len()
    }

    /// Whether the units in the pool, the release buffer, and every task's
    /// allocation add up to the capacity of each resource type.
    pub fn is_conserved(&self) -> bool {
        let mut accounted = self.available.clone();
        accounted.merge(&self.released);
        for task in &self.tasks {
            accounted.merge(task.allocated());
        }
        accounted == self.capacity
    }

    /// Whether the cycle that just ran left nothing able to move: no task
    /// will act or is computing, and some remain blocked.
    ///
    /// A task that acted this cycle and then finished still counts as
    /// moving. One that finished straight out of a compute delay does not.
    pub fn is_stalled(&self) -> bool {
        !self.is_complete()
            && self.running.is_empty()
            && self.ready.is_empty()
            && self.computing.is_empty()
            && self.settled_while_active == 0
            && !self.blocked.is_empty()
    }

    /// Record a diagnostic against the current cycle.
    pub fn record_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics
            .push_at(self.manager.origin(), self.cycle, message);
    }

    /// Set one component of a task's claim.
    pub fn set_claim(&mut self, id: TaskId, resource: ResourceId, units: u32) {
        self.task_mut(id).set_claim(resource, units);
    }

    /// Abort a blocked task, returning everything it holds to the release
    /// buffer.
    pub fn abort_blocked(&mut self, id: TaskId, reason: AbortReason) {
        self.blocked.retain(|blocked| *blocked != id);
        self.abort(id, reason);
    }

    pub(super) fn task_mut(&mut self, id: TaskId) -> &mut Task {
        &mut self.tasks[id.index()]
    }

    pub(super) fn begin_cycle(&mut self) {
        self.cycle += 1;
        self.settled_while_active = 0;
        debug!("{} cycle {}-{}", self.manager, self.cycle - 1, self.cycle);
    }

    pub(super) fn end_cycle(&mut self) {
        self.available.merge(&self.released);
        self.released.clear();
    }

    pub(super) fn rejoin_ready(&mut self) {
        let ready = mem::take(&mut self.ready);
        self.running.extend(ready);
    }

    /// Move units from the pool to a task.
    pub(super) fn grant(&mut self, id: TaskId, request: Request) -> Result<()> {
        self.available.take(request.resource, request.units)?;
        self.task_mut(id).allocate(request.resource, request.units);
        debug!(
            "task {id} completes its request (resource {}: requested {}, remaining {})",
            request.resource,
            request.units,
            self.available.get(request.resource)
        );
        Ok(())
    }

    /// Move units from a task to the release buffer.
    pub(super) fn release(&mut self, id: TaskId, resource: ResourceId, units: u32) -> Result<()> {
        self.task_mut(id).deallocate(resource, units)?;
        self.released.add(resource, units);
        debug!(
            "task {id} completes its release (resource {resource}: released {units}, available next cycle {})",
            self.available.get(resource) + self.released.get(resource)
        );
        Ok(())
    }

    /// Park a request and move the task to the blocked queue.
    pub(super) fn block(&mut self, id: TaskId, request: Request) {
        let task = self.task_mut(id);
        task.park(request);
        task.set_state(TaskState::Blocked);
        self.blocked.push(id);
        debug!(
            "task {id} waiting (resource {}: requested {}, available {})",
            request.resource,
            request.units,
            self.available.get(request.resource)
        );
    }

    pub(super) fn start_computing(&mut self, id: TaskId, cycles_left: u32) {
        self.task_mut(id).set_state(TaskState::Computing);
        self.computing.push((id, cycles_left));
    }

    pub(super) fn make_ready(&mut self, id: TaskId) {
        self.task_mut(id).set_state(TaskState::Running);
        self.ready.push(id);
    }

    /// Finish a task that acted this cycle, consuming its `terminate`
    /// activity if that is next. Anything still held goes to the release
    /// buffer.
    pub(super) fn terminate(&mut self, id: TaskId) {
        self.finish_quietly(id);
        self.settled_while_active += 1;
    }

    /// Finish a task whose compute delay just ran out. Unlike
    /// [`Self::terminate`] this does not keep the cycle from counting as
    /// stalled.
    pub(super) fn finish_quietly(&mut self, id: TaskId) {
        let cycle = self.cycle;
        let task = self.task_mut(id);
        if task.next_is_terminate() {
            task.pop_front();
        }
        let held = task.surrender();
        task.finish(TaskState::Terminated, cycle);
        if !held.is_zero() {
            debug!("task {id} terminates holding {held}; returned next cycle");
        }
        self.released.merge(&held);
        self.finished += 1;
        debug!("task {id} terminates at cycle {cycle}");
    }

    /// Kill a task, returning everything it holds to the release buffer.
    pub(super) fn abort(&mut self, id: TaskId, reason: AbortReason) {
        let cycle = self.cycle;
        let task = self.task_mut(id);
        let held = task.surrender();
        task.finish(TaskState::Aborted, cycle);
        self.released.merge(&held);
        self.abort_reasons[id.index()] = Some(reason);
        self.finished += 1;
        self.settled_while_active += 1;
        info!(
            "{} manager aborts task {id} at cycle {cycle} ({reason}); {held} available next cycle",
            self.manager
        );
    }

    /// Freeze the run into per-task outcomes sorted by task number.
    pub fn into_outcome(self) -> SimulationOutcome {
        let tasks = self
            .tasks
            .iter()
            .zip(&self.abort_reasons)
            .map(|(task, abort_reason)| TaskOutcome {
                task: task.id(),
                status: abort_reason.map_or_else(
                    || TaskStatus::Terminated {
                        total_time: task.total_time(),
                        wait_time: task.wait_time(),
                    },
                    |reason| TaskStatus::Aborted {
                        cycle: task.total_time(),
                        reason,
                    },
                ),
            })
            .collect();

        SimulationOutcome {
            manager: self.manager,
            cycles: self.cycle,
            tasks,
            diagnostics: self.diagnostics,
        }
    }
}
