use tracing::info;

use super::ManagerKind;
use super::context::SimulationContext;
use super::engine::{AllocationPolicy, Decision};
use super::outcome::AbortReason;
use crate::error::Result;
use crate::model::{Request, ResourceId, Task, TaskId};

/// Grant-then-detect manager.
///
/// Grants any request that fits in the pool and ignores claims. When a cycle
/// ends with every live task blocked it aborts the lowest-numbered blocked
/// task, repeating until the next lowest-numbered one could be served by
/// what the victims gave back.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimisticManager;

impl OptimisticManager {
    fn can_grant_after_recovery(context: &SimulationContext, task: TaskId) -> bool {
        context
            .task(task)
            .and_then(Task::pending)
            .is_some_and(|request| {
                let supply = u64::from(context.available().get(request.resource))
                    + u64::from(context.released().get(request.resource));
                u64::from(request.units) <= supply
            })
    }
}

impl AllocationPolicy for OptimisticManager {
    fn kind(&self) -> ManagerKind {
        ManagerKind::Optimistic
    }

    fn initiate(
        &mut self,
        _context: &mut SimulationContext,
        _task: TaskId,
        _resource: ResourceId,
        _claim: u32,
    ) -> Option<AbortReason> {
        None
    }

    fn admit(
        &mut self,
        context: &mut SimulationContext,
        _task: TaskId,
        request: Request,
    ) -> Decision {
        if request.units <= context.available().get(request.resource) {
            Decision::Proceed
        } else {
            Decision::Block
        }
    }

    fn resolve_stall(&mut self, context: &mut SimulationContext) -> Result<()> {
        info!(
            "deadlock detected at cycle {} among {} blocked task(s)",
            context.cycle(),
            context.blocked().len()
        );

        while let Some(victim) = context.lowest_blocked() {
            context.abort_blocked(victim, AbortReason::Deadlock);

            let Some(next) = context.lowest_blocked() else {
                break;
            };
            if Self::can_grant_after_recovery(context, next) {
                info!("task {next} can proceed once recovered units return");
                break;
            }
        }
        Ok(())
    }
}
