use core::result::Result as CoreResult;
use std::io::Error as IoError;

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

use crate::manager::ManagerKind;
use crate::model::{ResourceId, TaskId};

/// Result type for simulator operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur while loading or simulating a workload.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// A report could not be serialised.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// The workload file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The workload text could not be parsed.
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line of the offending token (0 when the input ended early)
        line: usize,
        /// What was expected or found
        message: String,
    },

    /// A task gave back more units than it holds.
    #[error("Task {task} released {requested} unit(s) of resource {resource} but holds {held}")]
    AllocationUnderflow {
        /// Releasing task
        task: TaskId,
        /// Resource type being released
        resource: ResourceId,
        /// Units currently held
        held: u32,
        /// Units the task tried to release
        requested: u32,
    },

    /// A grant was attempted for more units than the pool has available.
    #[error("Resource {resource} has {available} unit(s) available but {requested} were taken")]
    PoolUnderflow {
        /// Resource type being drawn from
        resource: ResourceId,
        /// Units in the pool
        available: u32,
        /// Units requested
        requested: u32,
    },

    /// A manager reached a cycle in which nothing can ever progress again.
    #[error("{manager} manager stalled at cycle {cycle} with {blocked} blocked task(s)")]
    Stalled {
        /// Manager that stalled
        manager: ManagerKind,
        /// Cycle in which the stall was detected
        cycle: u32,
        /// Number of tasks left blocked
        blocked: usize,
    },
}

impl Error {
    /// Determines whether this error was caused by the input rather than the engine.
    ///
    /// Returns `true` for a missing file or malformed workload text.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::Parse { .. })
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let error1 = Error::FileNotFound("input-01.txt".to_owned());
        assert_eq!(error1.to_string(), "File not found: input-01.txt");

        let error2 = Error::parse(3, "expected an integer, found `x`");
        assert_eq!(
            error2.to_string(),
            "Parse error on line 3: expected an integer, found `x`"
        );

        let error3 = Error::AllocationUnderflow {
            task: TaskId::new(2),
            resource: ResourceId::from_index(0),
            held: 1,
            requested: 3,
        };
        assert_eq!(
            error3.to_string(),
            "Task 2 released 3 unit(s) of resource 1 but holds 1"
        );

        let error4 = Error::Stalled {
            manager: ManagerKind::Avoidance,
            cycle: 7,
            blocked: 2,
        };
        assert_eq!(
            error4.to_string(),
            "Banker's manager stalled at cycle 7 with 2 blocked task(s)"
        );
    }

    #[test]
    fn test_error_is_input_error() {
        assert!(Error::FileNotFound("missing".to_owned()).is_input_error());
        assert!(Error::parse(1, "bad").is_input_error());

        let engine_error = Error::PoolUnderflow {
            resource: ResourceId::from_index(0),
            available: 0,
            requested: 1,
        };
        assert!(!engine_error.is_input_error());
    }

    #[test]
    fn test_error_from_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
    }
}
