use tracing::{debug, info};

use super::ManagerKind;
use super::context::SimulationContext;
use super::engine::{AllocationPolicy, Decision};
use super::outcome::AbortReason;
use crate::error::{Error, Result};
use crate::model::{Request, ResourceId, TaskId};
use crate::safety::{Standing, is_safe};

/// Banker's avoidance manager.
///
/// Every task declares its claims up front. A request is granted only when
/// it stays within the claim, fits in the pool, and leaves the system in a
/// safe state; otherwise the task blocks, or is aborted if it broke its claim.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvoidanceManager;

impl AvoidanceManager {
    /// Whether granting `request` to `task` keeps every live task able to
    /// finish.
    fn grant_is_safe(context: &SimulationContext, task: TaskId, request: Request) -> bool {
        let mut standings: Vec<Standing> = context.live_tasks().map(Standing::of).collect();
        if let Some(requester) = standings
            .iter_mut()
            .find(|standing| standing.task == task)
        {
            requester.grant(request.resource, request.units);
        }

        let mut work = context.available().clone();
        if work.take(request.resource, request.units).is_err() {
            return false;
        }
        is_safe(&standings, &work)
    }
}

impl AllocationPolicy for AvoidanceManager {
    fn kind(&self) -> ManagerKind {
        ManagerKind::Avoidance
    }

    fn initiate(
        &mut self,
        context: &mut SimulationContext,
        task: TaskId,
        resource: ResourceId,
        claim: u32,
    ) -> Option<AbortReason> {
        let capacity = context.capacity().get(resource);
        if claim > capacity {
            context.record_diagnostic(format!(
                "Banker aborts task {task} before run begins:\n\tclaim for resource {resource} ({claim}) exceeds number of units present ({capacity})"
            ));
            return Some(AbortReason::ClaimExceedsCapacity {
                resource,
                claim,
                capacity,
            });
        }

        context.set_claim(task, resource, claim);
        None
    }

    fn admit(
        &mut self,
        context: &mut SimulationContext,
        task: TaskId,
        request: Request,
    ) -> Decision {
        let Request { resource, units } = request;

        let over_claim = context
            .task(task)
            .is_some_and(|requester| requester.exceeds_claim(resource, units));
        if over_claim {
            let cycle = context.cycle();
            context.record_diagnostic(format!(
                "During cycle {}-{cycle} of Banker's algorithm: task {task}'s request exceeds its claim; aborted",
                cycle.saturating_sub(1)
            ));
            return Decision::Abort(AbortReason::ClaimViolation {
                resource,
                requested: units,
            });
        }

        if units > context.available().get(resource) {
            return Decision::Block;
        }

        if Self::grant_is_safe(context, task, request) {
            Decision::Proceed
        } else {
            debug!("granting task {task} {units} unit(s) of resource {resource} would be unsafe");
            Decision::Block
        }
    }

    fn resolve_stall(&mut self, context: &mut SimulationContext) -> Result<()> {
        info!(
            "Banker's run cannot progress at cycle {}",
            context.cycle()
        );
        Err(Error::Stalled {
            manager: ManagerKind::Avoidance,
            cycle: context.cycle(),
            blocked: context.blocked().len(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "Test code is allowed to use expect")]
mod tests {
    use super::*;
    use crate::model::{ResourceVector, Workload};

    const RESOURCE: ResourceId = ResourceId::from_index(0);

    fn context(capacity: u32, tasks: usize) -> SimulationContext {
        let workload = Workload::new(
            ResourceVector::from(vec![capacity]),
            vec![Vec::new(); tasks],
        );
        SimulationContext::new(ManagerKind::Avoidance, &workload)
    }

    #[test]
    fn test_claim_over_capacity_aborts_with_diagnostic() {
        let mut state = context(4, 1);

        let verdict = AvoidanceManager.initiate(&mut state, TaskId::new(1), RESOURCE, 5);

        assert_eq!(
            verdict,
            Some(AbortReason::ClaimExceedsCapacity {
                resource: RESOURCE,
                claim: 5,
                capacity: 4,
            })
        );
        let messages: Vec<String> = state
            .diagnostics()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Banker aborts task 1 before run begins:\n\tclaim for resource 1 (5) exceeds number of units present (4)"
                    .to_owned()
            ]
        );
    }

    #[test]
    fn test_claim_within_capacity_is_recorded() {
        let mut state = context(4, 1);

        let verdict = AvoidanceManager.initiate(&mut state, TaskId::new(1), RESOURCE, 4);

        assert!(verdict.is_none());
        let claim = state.task(TaskId::new(1)).map(|task| task.claim().get(RESOURCE));
        assert_eq!(claim, Some(4));
    }

    #[test]
    fn test_request_beyond_claim_is_aborted() {
        let mut state = context(4, 1);
        state.set_claim(TaskId::new(1), RESOURCE, 1);

        let verdict = AvoidanceManager.admit(
            &mut state,
            TaskId::new(1),
            Request {
                resource: RESOURCE,
                units: 2,
            },
        );

        assert!(matches!(
            verdict,
            Decision::Abort(AbortReason::ClaimViolation { requested: 2, .. })
        ));
        assert_eq!(state.diagnostics().len(), 1);
    }

    #[test]
    fn test_unsafe_grant_blocks() {
        let mut state = context(2, 2);
        state.set_claim(TaskId::new(1), RESOURCE, 2);
        state.set_claim(TaskId::new(2), RESOURCE, 2);
        let one = Request {
            resource: RESOURCE,
            units: 1,
        };

        assert_eq!(
            AvoidanceManager.admit(&mut state, TaskId::new(1), one),
            Decision::Proceed
        );
        state.grant(TaskId::new(1), one).expect("pool holds two units");

        assert_eq!(
            AvoidanceManager.admit(&mut state, TaskId::new(2), one),
            Decision::Block,
            "one unit each would leave neither task able to finish"
        );
    }
}
