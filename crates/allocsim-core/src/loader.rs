//! Workload file reader.
//!
//! The format is whitespace-delimited: task count, resource-type count, one
//! capacity per resource type, then 4-token activity tuples
//! `<verb> <task> <resource|cycles> <units>`. Problems that only lose one
//! activity are reported as diagnostics; anything that leaves the token
//! stream unreadable is a parse error.

use core::str::FromStr;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::diagnostics::{DiagnosticOrigin, Diagnostics};
use crate::error::{Error, Result};
use crate::model::{Activity, ActivityKind, ResourceId, ResourceVector, Workload};

/// A parsed workload plus everything worth telling the user about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedWorkload {
    /// The immutable workload both managers run
    pub workload: Workload,
    /// Problems found while reading, in file order
    pub diagnostics: Diagnostics,
}

/// Read and parse a workload file.
///
/// # Errors
/// Returns [`Error::FileNotFound`] if `path` does not exist, [`Error::Io`] if
/// it cannot be read, and [`Error::Parse`] if its contents are malformed.
pub fn load_workload(path: &Path) -> Result<LoadedWorkload> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }
    let text = fs::read_to_string(path)?;
    debug!("read {} byte(s) from {}", text.len(), path.display());
    parse_workload(&text)
}

/// Parse workload text.
///
/// # Errors
/// Returns [`Error::Parse`] when a header value or tuple field is missing or
/// not a non-negative integer, or a verb is unknown.
pub fn parse_workload(text: &str) -> Result<LoadedWorkload> {
    let mut cursor = Cursor::new(text);

    let declared_tasks: usize = cursor.number("task count")?;
    let resource_count: usize = cursor.number("resource type count")?;
    let capacity = (0..resource_count)
        .map(|_| cursor.number::<u32>("resource capacity"))
        .collect::<Result<Vec<u32>>>()
        .map(ResourceVector::from)?;

    let mut builder = Builder::new(capacity);
    while let Some((line, verb)) = cursor.next_token() {
        let kind = ActivityKind::from_verb(verb)
            .ok_or_else(|| Error::parse(line, format!("unknown activity `{verb}`")))?;
        let task: usize = cursor.number("task number")?;
        let operand: u32 = cursor.number("resource type or cycle count")?;
        let units: u32 = cursor.number("unit count")?;
        builder.add(line, kind, task, operand, units);
    }

    Ok(builder.finish(declared_tasks))
}

/// Whitespace tokens tagged with their 1-based line number.
struct Cursor<'text> {
    tokens: Vec<(usize, &'text str)>,
    position: usize,
}

impl<'text> Cursor<'text> {
    fn new(text: &'text str) -> Self {
        let tokens = text
            .lines()
            .enumerate()
            .flat_map(|(index, line)| line.split_whitespace().map(move |word| (index + 1, word)))
            .collect();
        Self {
            tokens,
            position: 0,
        }
    }

    fn next_token(&mut self) -> Option<(usize, &'text str)> {
        let token = self.tokens.get(self.position).copied();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Line of the final token; 1 for empty input.
    fn last_line(&self) -> usize {
        self.tokens.last().map_or(1, |(line, _)| *line)
    }

    fn number<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let (line, word) = self
            .next_token()
            .ok_or_else(|| Error::parse(self.last_line(), format!("input ended before {what}")))?;
        word.parse()
            .map_err(|_| Error::parse(line, format!("expected {what}, found `{word}`")))
    }
}

/// Accumulates per-task activity lists while validating references.
struct Builder {
    capacity: ResourceVector,
    tasks: Vec<Vec<Activity>>,
    diagnostics: Diagnostics,
}

impl Builder {
    fn new(capacity: ResourceVector) -> Self {
        Self {
            capacity,
            tasks: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    fn report(&mut self, message: String) {
        warn!("{message}");
        self.diagnostics.push(DiagnosticOrigin::Loader, message);
    }

    fn add(&mut self, line: usize, kind: ActivityKind, task: usize, operand: u32, units: u32) {
        if kind == ActivityKind::Initiate && task == self.tasks.len() + 1 {
            self.tasks.push(Vec::new());
        }
        if task == 0 || task > self.tasks.len() {
            self.report(format!(
                "Error: invalid task number {task} on line {line}; {kind} ignored"
            ));
            return;
        }

        let activity = match kind {
            ActivityKind::Compute => Activity::Compute { cycles: operand },
            ActivityKind::Terminate => Activity::Terminate,
            ActivityKind::Initiate | ActivityKind::Request | ActivityKind::Release => {
                let Some(resource) = self.resource(operand) else {
                    self.report(format!(
                        "Error: invalid resource type {operand} for task {task} on line {line}; {kind} ignored"
                    ));
                    return;
                };
                match kind {
                    ActivityKind::Initiate => Activity::Initiate {
                        resource,
                        claim: units,
                    },
                    ActivityKind::Request => Activity::Request { resource, units },
                    _ => Activity::Release { resource, units },
                }
            }
        };

        if let Some(activities) = self.tasks.get_mut(task - 1) {
            activities.push(activity);
        }
    }

    fn resource(&self, number: u32) -> Option<ResourceId> {
        usize::try_from(number)
            .ok()
            .and_then(ResourceId::from_number)
            .filter(|resource| self.capacity.contains(*resource))
    }

    fn finish(mut self, declared_tasks: usize) -> LoadedWorkload {
        let unterminated: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, activities)| !activities.last().is_some_and(Activity::is_terminate))
            .map(|(index, _)| index + 1)
            .collect();
        for task in unterminated {
            self.report(format!(
                "Warning: task {task} has no terminate activity; it terminates after its last activity"
            ));
        }

        if declared_tasks != self.tasks.len() {
            self.report(format!(
                "Warning: header declares {declared_tasks} task(s) but {} were defined",
                self.tasks.len()
            ));
        }

        debug!(
            "loaded {} task(s) over {} resource type(s)",
            self.tasks.len(),
            self.capacity.len()
        );
        LoadedWorkload {
            workload: Workload::new(self.capacity, self.tasks),
            diagnostics: self.diagnostics,
        }
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
    use crate::model::TaskId;

    const RESOURCE: ResourceId = ResourceId::from_index(0);

    fn messages(loaded: &LoadedWorkload) -> Vec<String> {
        loaded
            .diagnostics
            .iter()
            .map(|diagnostic| diagnostic.message.clone())
            .collect()
    }

    #[test]
    fn test_parse_simple_workload() {
        let text = "2 1 4\n\
                    initiate 1 1 4\n\
                    request 1 1 2\n\
                    compute 1 3 0\n\
                    release 1 1 2\n\
                    terminate 1 0 0\n\
                    initiate 2 1 1\n\
                    terminate 2 0 0\n";

        let loaded = parse_workload(text).expect("workload is well formed");

        assert!(loaded.diagnostics.is_empty());
        assert_eq!(loaded.workload.task_count(), 2);
        assert_eq!(loaded.workload.capacity().as_slice(), &[4]);
        assert_eq!(
            loaded.workload.activities(TaskId::new(1)),
            Some(
                &[
                    Activity::Initiate {
                        resource: RESOURCE,
                        claim: 4
                    },
                    Activity::Request {
                        resource: RESOURCE,
                        units: 2
                    },
                    Activity::Compute { cycles: 3 },
                    Activity::Release {
                        resource: RESOURCE,
                        units: 2
                    },
                    Activity::Terminate,
                ][..]
            )
        );
    }

    #[test]
    fn test_tuples_may_span_lines() {
        let loaded = parse_workload("1 2\n3 5\ninitiate 1\n2 5 terminate\n1 0 0")
            .expect("tokens are whitespace delimited");

        assert_eq!(loaded.workload.capacity().as_slice(), &[3, 5]);
        assert_eq!(loaded.workload.activities(TaskId::new(1)).map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_invalid_task_number_is_skipped() {
        let text = "1 1 2\n\
                    initiate 1 1 1\n\
                    request 3 1 1\n\
                    terminate 1 0 0\n";

        let loaded = parse_workload(text).expect("bad task numbers are not fatal");

        assert_eq!(
            messages(&loaded),
            vec!["Error: invalid task number 3 on line 3; request ignored".to_owned()]
        );
        assert_eq!(loaded.workload.activities(TaskId::new(1)).map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_out_of_order_initiate_is_skipped() {
        let loaded = parse_workload("2 1 2\ninitiate 2 1 1\ninitiate 1 1 1\nterminate 1 0 0")
            .expect("bad task numbers are not fatal");

        assert_eq!(loaded.workload.task_count(), 1);
        assert_eq!(loaded.diagnostics.len(), 2, "skipped initiate and task count mismatch");
    }

    #[test]
    fn test_invalid_resource_type_is_skipped() {
        let loaded = parse_workload("1 1 2\ninitiate 1 1 1\nrequest 1 2 1\nterminate 1 0 0")
            .expect("bad resource types are not fatal");

        assert_eq!(
            messages(&loaded),
            vec!["Error: invalid resource type 2 for task 1 on line 3; request ignored".to_owned()]
        );
    }

    #[test]
    fn test_missing_terminate_is_reported() {
        let loaded = parse_workload("1 1 2\ninitiate 1 1 1\nrequest 1 1 1")
            .expect("implicit termination is allowed");

        assert_eq!(
            messages(&loaded),
            vec![
                "Warning: task 1 has no terminate activity; it terminates after its last activity"
                    .to_owned()
            ]
        );
    }

    #[test]
    fn test_unknown_verb_is_fatal() {
        let error = parse_workload("1 1 2\ninitiate 1 1 1\nborrow 1 1 1").unwrap_err();
        assert!(matches!(error, Error::Parse { line: 3, .. }));
        assert!(error.to_string().contains("unknown activity `borrow`"));
    }

    #[test]
    fn test_truncated_tuple_is_fatal() {
        let error = parse_workload("1 1 2\ninitiate 1 1").unwrap_err();
        assert!(matches!(error, Error::Parse { line: 2, .. }));
        assert_eq!(
            error.to_string(),
            "Parse error on line 2: input ended before unit count"
        );
    }

    #[test]
    fn test_truncated_tuple_points_at_last_line() {
        let error = parse_workload("1 1 2\ninitiate 1 1 2\n\nterminate\n1\n").unwrap_err();
        assert!(matches!(error, Error::Parse { line: 5, .. }));

        let empty = parse_workload("").unwrap_err();
        assert!(matches!(empty, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_non_integer_field_is_fatal() {
        let error = parse_workload("1 x").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Parse error on line 1: expected resource type count, found `x`"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let error = load_workload(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(error, Error::FileNotFound(_)));
        assert!(error.is_input_error());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("input.txt");
        fs::write(&path, "1 1 3\ninitiate 1 1 3\nterminate 1 0 0\n").expect("write input");

        let loaded = load_workload(&path).expect("file exists and is well formed");
        assert_eq!(loaded.workload.task_count(), 1);
    }
}
