use serde::Serialize;

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::manager::{ManagerKind, SimulationOutcome, TaskOutcome, TaskStatus, percentage};
use crate::model::TaskId;

const INDENT: &str = "    ";
const COLUMN: usize = 34;

/// Summed timing of the tasks one manager completed.
///
/// Aborted tasks are left out of both sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Sum of total-time over terminated tasks
    pub total_time: u64,
    /// Sum of wait-time over terminated tasks
    pub wait_time: u64,
}

impl Totals {
    /// Sum the terminated tasks of one run.
    pub fn of(outcome: &SimulationOutcome) -> Self {
        outcome
            .tasks
            .iter()
            .filter_map(TaskOutcome::timing)
            .fold(Self::default(), |totals, (total, wait)| Self {
                total_time: totals.total_time + u64::from(total),
                wait_time: totals.wait_time + u64::from(wait),
            })
    }

    /// Overall share of time spent waiting, as a rounded percentage.
    pub fn wait_percentage(&self) -> u64 {
        percentage(self.wait_time, self.total_time)
    }
}

/// One task's result under both managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Task number
    pub task: TaskId,
    /// Result under the optimistic manager
    pub optimistic: TaskStatus,
    /// Result under the Banker's manager
    pub avoidance: TaskStatus,
}

/// Both runs merged by task number, ready to print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonReport {
    /// Loader diagnostics followed by each manager's, in run order
    pub diagnostics: Diagnostics,
    /// One row per task, by ascending task number
    pub rows: Vec<ReportRow>,
    /// Totals of the optimistic run
    pub optimistic: Totals,
    /// Totals of the Banker's run
    pub avoidance: Totals,
}

impl ComparisonReport {
    /// Merge the two runs of the same workload.
    ///
    /// Tasks missing from either run are left out.
    pub fn new(optimistic: &SimulationOutcome, avoidance: &SimulationOutcome) -> Self {
        let rows = optimistic
            .tasks
            .iter()
            .filter_map(|left| {
                avoidance.task(left.task).map(|right| ReportRow {
                    task: left.task,
                    optimistic: left.status,
                    avoidance: right.status,
                })
            })
            .collect();

        let mut diagnostics = Diagnostics::default();
        diagnostics.extend(&optimistic.diagnostics);
        diagnostics.extend(&avoidance.diagnostics);

        Self {
            diagnostics,
            rows,
            optimistic: Totals::of(optimistic),
            avoidance: Totals::of(avoidance),
        }
    }

    /// Put input diagnostics ahead of the managers' own.
    #[must_use]
    pub fn with_input_diagnostics(mut self, input: &Diagnostics) -> Self {
        let mut diagnostics = input.clone();
        diagnostics.extend(&self.diagnostics);
        self.diagnostics = diagnostics;
        self
    }

    /// Drop every diagnostic from the report.
    pub fn clear_diagnostics(&mut self) {
        self.diagnostics = Diagnostics::default();
    }

    /// Render the side-by-side table, without diagnostics.
    pub fn render_table(&self) -> String {
        let mut table = String::new();
        let headings = ManagerKind::ALL.map(ManagerKind::label);
        push_line(&mut table, headings[0], headings[1]);

        for row in &self.rows {
            let label = format!("Task {}", row.task);
            push_line(
                &mut table,
                &status_cell(&label, row.optimistic),
                &status_cell(&label, row.avoidance),
            );
        }

        push_line(
            &mut table,
            &totals_cell(self.optimistic),
            &totals_cell(self.avoidance),
        );
        table
    }

    /// Serialise the report as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialisation fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

fn timing_cell(label: &str, total: u64, wait: u64) -> String {
    let share = percentage(wait, total);
    format!("{label:<7} {total:>4} {wait:>4} {share:>4}%")
}

fn status_cell(label: &str, status: TaskStatus) -> String {
    match status {
        TaskStatus::Terminated {
            total_time,
            wait_time,
        } => timing_cell(label, u64::from(total_time), u64::from(wait_time)),
        TaskStatus::Aborted { .. } => format!("{label:<7} aborted"),
    }
}

fn totals_cell(totals: Totals) -> String {
    timing_cell("Total", totals.total_time, totals.wait_time)
}

fn push_line(table: &mut String, left: &str, right: &str) {
    table.push_str(&format!("{INDENT}{left:<COLUMN$}{right}\n"));
}
