use core::fmt;

use serde::Serialize;

use super::resource::ResourceId;

/// Kind of an [`Activity`], without its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Declare a claim on a resource type
    Initiate,
    /// Ask for units of a resource type
    Request,
    /// Give back units of a resource type
    Release,
    /// Hold for a number of cycles without touching resources
    Compute,
    /// Finish the task
    Terminate,
}

impl ActivityKind {
    /// Verb used for this kind in workload files.
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Initiate => "initiate",
            Self::Request => "request",
            Self::Release => "release",
            Self::Compute => "compute",
            Self::Terminate => "terminate",
        }
    }

    /// Parse a workload-file verb.
    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "initiate" => Some(Self::Initiate),
            "request" => Some(Self::Request),
            "release" => Some(Self::Release),
            "compute" => Some(Self::Compute),
            "terminate" => Some(Self::Terminate),
            _ => None,
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// One scheduled step of a task. Immutable once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Activity {
    /// Declare the most units of `resource` the task will ever hold
    Initiate {
        /// Resource type being claimed
        resource: ResourceId,
        /// Maximum units
        claim: u32,
    },
    /// Ask for `units` more of `resource`
    Request {
        /// Resource type requested
        resource: ResourceId,
        /// Units requested
        units: u32,
    },
    /// Give back `units` of `resource`
    Release {
        /// Resource type released
        resource: ResourceId,
        /// Units released
        units: u32,
    },
    /// Stay busy for `cycles` cycles
    Compute {
        /// Number of cycles
        cycles: u32,
    },
    /// Finish the task
    Terminate,
}

impl Activity {
    /// Kind of this activity.
    pub const fn kind(&self) -> ActivityKind {
        match self {
            Self::Initiate { .. } => ActivityKind::Initiate,
            Self::Request { .. } => ActivityKind::Request,
            Self::Release { .. } => ActivityKind::Release,
            Self::Compute { .. } => ActivityKind::Compute,
            Self::Terminate => ActivityKind::Terminate,
        }
    }

    /// Resource type this activity touches, if any.
    pub const fn resource(&self) -> Option<ResourceId> {
        match self {
            Self::Initiate { resource, .. }
            | Self::Request { resource, .. }
            | Self::Release { resource, .. } => Some(*resource),
            Self::Compute { .. } | Self::Terminate => None,
        }
    }

    /// Units claimed, requested, released, or the compute cycle count.
    pub const fn amount(&self) -> u32 {
        match self {
            Self::Initiate { claim, .. } => *claim,
            Self::Request { units, .. } | Self::Release { units, .. } => *units,
            Self::Compute { cycles } => *cycles,
            Self::Terminate => 0,
        }
    }

    /// Whether this is the task's terminate step.
    pub const fn is_terminate(&self) -> bool {
        matches!(self, Self::Terminate)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resource() {
            Some(resource) => write!(f, "{} {} {}", self.kind(), resource, self.amount()),
            None if matches!(self, Self::Compute { .. }) => {
                write!(f, "{} {}", self.kind(), self.amount())
            }
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// A request parked on a blocked task until it can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Request {
    /// Resource type requested
    pub resource: ResourceId,
    /// Units requested
    pub units: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbs_round_trip_through_kind() {
        for kind in [
            ActivityKind::Initiate,
            ActivityKind::Request,
            ActivityKind::Release,
            ActivityKind::Compute,
            ActivityKind::Terminate,
        ] {
            assert_eq!(ActivityKind::from_verb(kind.verb()), Some(kind));
        }
        assert_eq!(ActivityKind::from_verb("allocate"), None);
    }

    #[test]
    fn test_compute_amount_is_cycle_count() {
        let compute = Activity::Compute { cycles: 3 };
        assert_eq!(compute.kind(), ActivityKind::Compute);
        assert_eq!(compute.amount(), 3);
        assert!(compute.resource().is_none());
    }

    #[test]
    fn test_display() {
        let resource = ResourceId::from_index(1);
        assert_eq!(
            Activity::Request { resource, units: 4 }.to_string(),
            "request 2 4"
        );
        assert_eq!(Activity::Compute { cycles: 2 }.to_string(), "compute 2");
        assert_eq!(Activity::Terminate.to_string(), "terminate");
    }
}
