//! Workload model shared by both managers.
//!
//! A [`Workload`] is the immutable product of the loader: the capacity of
//! every resource type and, per task, the ordered activities it will run.
//! Managers never mutate it. Each run builds fresh [`Task`] instances from it,
//! so two runs over the same workload can never observe each other's state.

mod activity;
mod resource;
mod task;

pub use activity::{Activity, ActivityKind, Request};
pub use resource::{ResourceId, ResourceVector};
pub use task::{Task, TaskId, TaskState};

use serde::Serialize;

/// Immutable description of one simulation input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workload {
    capacity: ResourceVector,
    tasks: Vec<Vec<Activity>>,
}

impl Workload {
    /// Create a workload from a capacity vector and per-task activity lists.
    ///
    /// Task `n` (1-based) owns `tasks[n - 1]`.
    pub fn new(capacity: ResourceVector, tasks: Vec<Vec<Activity>>) -> Self {
        Self { capacity, tasks }
    }

    /// Total units of each resource type.
    pub fn capacity(&self) -> &ResourceVector {
        &self.capacity
    }

    /// Number of resource types.
    pub fn resource_count(&self) -> usize {
        self.capacity.len()
    }

    /// Number of tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Activities of one task, in execution order.
    pub fn activities(&self, task: TaskId) -> Option<&[Activity]> {
        self.tasks.get(task.index()).map(Vec::as_slice)
    }

    /// Build a fresh, independently owned task population for one run.
    pub fn instantiate(&self) -> Vec<Task> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(index, activities)| {
                Task::new(
                    TaskId::from_index(index),
                    activities.iter().copied(),
                    self.capacity.len(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Workload {
        let resource = ResourceId::from_index(0);
        Workload::new(
            ResourceVector::from(vec![4]),
            vec![
                vec![
                    Activity::Initiate { resource, claim: 4 },
                    Activity::Request { resource, units: 1 },
                    Activity::Release { resource, units: 1 },
                    Activity::Terminate,
                ],
                vec![Activity::Initiate { resource, claim: 2 }, Activity::Terminate],
            ],
        )
    }

    #[test]
    fn test_workload_accessors() {
        let workload = sample();
        assert_eq!(workload.task_count(), 2);
        assert_eq!(workload.resource_count(), 1);
        assert_eq!(workload.capacity().get(ResourceId::from_index(0)), 4);
        assert_eq!(workload.activities(TaskId::new(2)).map(<[_]>::len), Some(2));
        assert!(workload.activities(TaskId::new(3)).is_none());
    }

    #[test]
    fn test_instantiate_produces_independent_tasks() {
        let workload = sample();
        let mut first = workload.instantiate();
        let second = workload.instantiate();

        let popped = first[0].pop_front();
        assert!(matches!(popped, Some(Activity::Initiate { claim: 4, .. })));
        assert_eq!(first[0].remaining(), 3);
        assert_eq!(second[0].remaining(), 4, "other run must be unaffected");
        assert_eq!(workload.activities(TaskId::new(1)).map(<[_]>::len), Some(4));
    }
}
