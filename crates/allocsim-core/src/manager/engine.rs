use core::mem;

use tracing::{debug, trace};

use super::ManagerKind;
use super::context::SimulationContext;
use super::outcome::{AbortReason, SimulationOutcome};
use crate::error::Result;
use crate::model::{Activity, Request, ResourceId, Task, TaskId, Workload};

/// Verdict of a policy on one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Grant the request now
    Proceed,
    /// Park the request and retry it next cycle
    Block,
    /// Kill the requesting task
    Abort(AbortReason),
}

/// What differs between the two managers.
///
/// The engine owns the cycle order; a policy only answers the questions the
/// engine asks at `initiate`, at every request (fresh or retried), and when a
/// cycle ends with nothing able to move.
pub trait AllocationPolicy {
    /// Manager this policy implements.
    fn kind(&self) -> ManagerKind;

    /// Handle an `initiate` activity. Returning a reason aborts the task.
    fn initiate(
        &mut self,
        context: &mut SimulationContext,
        task: TaskId,
        resource: ResourceId,
        claim: u32,
    ) -> Option<AbortReason>;

    /// Decide a request. `context` reflects every grant made earlier in the
    /// same cycle.
    fn admit(
        &mut self,
        context: &mut SimulationContext,
        task: TaskId,
        request: Request,
    ) -> Decision;

    /// Called at the end of a cycle in which nothing could move.
    ///
    /// # Errors
    /// Returns an error if the policy cannot recover from the stall.
    fn resolve_stall(&mut self, context: &mut SimulationContext) -> Result<()>;
}

/// One manager's run over a workload, advanced a cycle at a time.
#[derive(Debug)]
pub struct Simulation<P> {
    policy: P,
    context: SimulationContext,
}

impl<P: AllocationPolicy> Simulation<P> {
    /// Prepare a run of `workload` with fresh task state.
    pub fn new(policy: P, workload: &Workload) -> Self {
        let context = SimulationContext::new(policy.kind(), workload);
        Self { policy, context }
    }

    /// Live state of the run.
    pub const fn context(&self) -> &SimulationContext {
        &self.context
    }

    /// Whether every task has terminated or been aborted.
    pub fn is_complete(&self) -> bool {
        self.context.is_complete()
    }

    /// Advance one cycle.
    ///
    /// Returns `true` once every task has reached a terminal state; further
    /// calls are no-ops.
    ///
    /// # Errors
    /// Returns an error if an allocation invariant is violated or the policy
    /// cannot resolve a stall.
    pub fn step(&mut self) -> Result<bool> {
        if self.context.is_complete() {
            return Ok(true);
        }

        self.context.begin_cycle();
        self.advance_computing();
        self.retry_blocked()?;
        self.run_active()?;
        self.context.rejoin_ready();

        if self.context.is_stalled() {
            debug!(
                "{} run stalled at cycle {} with blocked {:?}",
                self.context.manager(),
                self.context.cycle(),
                self.context.blocked()
            );
            self.policy.resolve_stall(&mut self.context)?;
        }

        self.context.end_cycle();
        debug_assert!(
            self.context.is_conserved(),
            "units leaked during cycle {}",
            self.context.cycle()
        );
        Ok(self.context.is_complete())
    }

    /// Step until every task has finished.
    ///
    /// # Errors
    /// Propagates the first error raised by [`Self::step`].
    pub fn run(mut self) -> Result<SimulationOutcome> {
        while !self.step()? {}
        Ok(self.into_outcome())
    }

    /// Freeze the run, finished or not, into its outcome.
    pub fn into_outcome(self) -> SimulationOutcome {
        self.context.into_outcome()
    }

    fn advance_computing(&mut self) {
        let timers = mem::take(&mut self.context.computing);
        for (id, cycles_left) in timers {
            let still_left = cycles_left.saturating_sub(1);
            if still_left == 0 {
                self.resume_after_compute(id);
            } else {
                self.context.computing.push((id, still_left));
            }
        }
    }

    fn retry_blocked(&mut self) -> Result<()> {
        let queue = self.context.blocked.clone();
        for id in queue {
            self.context.task_mut(id).record_wait();
            let Some(request) = self.context.task(id).and_then(Task::pending) else {
                continue;
            };

            match self.policy.admit(&mut self.context, id, request) {
                Decision::Proceed => {
                    self.context.blocked.retain(|blocked| *blocked != id);
                    self.context.task_mut(id).unpark();
                    self.context.grant(id, request)?;
                    self.resume(id);
                }
                Decision::Block => trace!("task {id} still blocked"),
                Decision::Abort(reason) => self.context.abort_blocked(id, reason),
            }
        }
        Ok(())
    }

    fn run_active(&mut self) -> Result<()> {
        let active = mem::take(&mut self.context.running);
        for id in active {
            if self.context.task(id).is_some_and(Task::ready_to_terminate) {
                self.context.terminate(id);
                continue;
            }
            let Some(activity) = self.context.task_mut(id).pop_front() else {
                continue;
            };

            if self.execute(id, activity)? {
                if self.context.task(id).is_some_and(Task::ready_to_terminate) {
                    self.context.terminate(id);
                } else {
                    self.context.running.push(id);
                }
            }
        }
        Ok(())
    }

    /// Run one activity; returns whether the task stays in the running set.
    fn execute(&mut self, id: TaskId, activity: Activity) -> Result<bool> {
        match activity {
            Activity::Initiate { resource, claim } => {
                let rejection = self.policy.initiate(&mut self.context, id, resource, claim);
                if let Some(reason) = rejection {
                    self.context.abort(id, reason);
                    return Ok(false);
                }
                Ok(true)
            }
            Activity::Request { resource, units } => {
                let request = Request { resource, units };
                match self.policy.admit(&mut self.context, id, request) {
                    Decision::Proceed => {
                        self.context.grant(id, request)?;
                        Ok(true)
                    }
                    Decision::Block => {
                        self.context.block(id, request);
                        Ok(false)
                    }
                    Decision::Abort(reason) => {
                        self.context.abort(id, reason);
                        Ok(false)
                    }
                }
            }
            Activity::Release { resource, units } => {
                self.context.release(id, resource, units)?;
                Ok(true)
            }
            Activity::Compute { cycles } => {
                if cycles > 1 {
                    debug!("task {id} computes for {cycles} cycle(s)");
                    self.context.start_computing(id, cycles - 1);
                } else {
                    self.resume_after_compute(id);
                }
                Ok(false)
            }
            Activity::Terminate => {
                self.context.terminate(id);
                Ok(false)
            }
        }
    }

    /// Return a task to the running set next cycle, or finish it now if it
    /// has nothing left but `terminate`.
    fn resume(&mut self, id: TaskId) {
        if self.context.task(id).is_some_and(Task::ready_to_terminate) {
            self.context.terminate(id);
        } else {
            self.context.make_ready(id);
        }
    }

    /// Like [`Self::resume`] for a task leaving a compute delay; finishing
    /// here does not count as progress for stall detection.
    fn resume_after_compute(&mut self, id: TaskId) {
        if self.context.task(id).is_some_and(Task::ready_to_terminate) {
            self.context.finish_quietly(id);
        } else {
            self.context.make_ready(id);
        }
    }
}
