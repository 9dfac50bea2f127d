//! Banker's safety algorithm.
//!
//! A state is safe when some order exists in which every task can be handed
//! its full remaining need, finish, and give back everything it holds. The
//! probe works on [`Standing`] snapshots and a copy of the available vector,
//! so a tentative grant can be evaluated without touching live state.

use serde::Serialize;
use tracing::trace;

use crate::model::{ResourceId, ResourceVector, Task, TaskId};

/// A task's claim and holdings as seen by one safety probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    /// Task the figures belong to
    pub task: TaskId,
    /// Declared maximum units per resource type
    pub claim: ResourceVector,
    /// Units held per resource type
    pub allocated: ResourceVector,
}

impl Standing {
    /// Snapshot a live task.
    pub fn of(task: &Task) -> Self {
        Self {
            task: task.id(),
            claim: task.claim().clone(),
            allocated: task.allocated().clone(),
        }
    }

    /// Units the task may still ask for.
    pub fn need(&self) -> ResourceVector {
        self.claim.saturating_sub(&self.allocated)
    }

    /// Apply a tentative grant to this snapshot.
    pub fn grant(&mut self, resource: ResourceId, units: u32) {
        self.allocated.add(resource, units);
    }
}

/// Find an order in which every task can run to completion.
///
/// Scans by ascending position and takes the first task whose need is
/// covered by what is available, returns its holdings to the pool, and
/// rescans. Returns `None` as soon as a full scan finds no such task.
pub fn safe_sequence(standings: &[Standing], available: &ResourceVector) -> Option<Vec<TaskId>> {
    let needs: Vec<ResourceVector> = standings.iter().map(Standing::need).collect();
    let mut work = available.clone();
    let mut finished = vec![false; standings.len()];
    let mut sequence = Vec::with_capacity(standings.len());

    while sequence.len() < standings.len() {
        let candidate = standings
            .iter()
            .zip(&needs)
            .zip(&finished)
            .position(|((_, need), done)| !done && work.covers(need));

        let Some(position) = candidate else {
            trace!(
                "unsafe: {} of {} task(s) can finish with {work}",
                sequence.len(),
                standings.len()
            );
            return None;
        };

        let standing = &standings[position];
        work.merge(&standing.allocated);
        finished[position] = true;
        sequence.push(standing.task);
    }

    trace!("safe sequence: {sequence:?}");
    Some(sequence)
}

/// Whether every task can still finish from this state.
pub fn is_safe(standings: &[Standing], available: &ResourceVector) -> bool {
    safe_sequence(standings, available).is_some()
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "Test code is allowed to use expect")]
mod tests {
    use super::*;

    fn standing(number: u32, claim: Vec<u32>, allocated: Vec<u32>) -> Standing {
        Standing {
            task: TaskId::new(number),
            claim: ResourceVector::from(claim),
            allocated: ResourceVector::from(allocated),
        }
    }

    #[test]
    fn test_empty_task_set_is_safe() {
        assert_eq!(
            safe_sequence(&[], &ResourceVector::zeros(2)),
            Some(Vec::new())
        );
    }

    #[test]
    fn test_classic_safe_state() {
        // Textbook example: 5 tasks, 3 resource types, available (3, 3, 2).
        let standings = vec![
            standing(1, vec![7, 5, 3], vec![0, 1, 0]),
            standing(2, vec![3, 2, 2], vec![2, 0, 0]),
            standing(3, vec![9, 0, 2], vec![3, 0, 2]),
            standing(4, vec![2, 2, 2], vec![2, 1, 1]),
            standing(5, vec![4, 3, 3], vec![0, 0, 2]),
        ];
        let available = ResourceVector::from(vec![3, 3, 2]);

        let sequence = safe_sequence(&standings, &available).expect("state is safe");
        let numbers: Vec<u32> = sequence.iter().map(|task| task.number()).collect();
        assert_eq!(numbers, vec![2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_unsafe_state() {
        let standings = vec![
            standing(1, vec![2], vec![1]),
            standing(2, vec![2], vec![1]),
        ];
        assert!(!is_safe(&standings, &ResourceVector::from(vec![0])));
        assert!(is_safe(&standings, &ResourceVector::from(vec![1])));
    }

    #[test]
    fn test_first_qualifying_task_wins() {
        let standings = vec![
            standing(1, vec![1], vec![0]),
            standing(2, vec![1], vec![0]),
        ];
        let sequence = safe_sequence(&standings, &ResourceVector::from(vec![1]))
            .expect("either task can finish first");
        assert_eq!(sequence, vec![TaskId::new(1), TaskId::new(2)]);
    }

    #[test]
    fn test_probe_is_deterministic_and_side_effect_free() {
        let standings = vec![
            standing(1, vec![3, 1], vec![1, 0]),
            standing(2, vec![2, 2], vec![1, 1]),
        ];
        let available = ResourceVector::from(vec![1, 1]);
        let standings_before = standings.clone();
        let available_before = available.clone();

        let first = safe_sequence(&standings, &available);
        let second = safe_sequence(&standings, &available);

        assert_eq!(first, second);
        assert_eq!(standings, standings_before);
        assert_eq!(available, available_before);
    }

    #[test]
    fn test_tentative_grant_on_snapshot() {
        let mut probe = standing(1, vec![2], vec![0]);
        probe.grant(ResourceId::from_index(0), 2);
        assert!(probe.need().is_zero());
        assert!(is_safe(&[probe], &ResourceVector::from(vec![0])));
    }
}
