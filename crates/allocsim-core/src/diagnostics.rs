use core::fmt;

use serde::Serialize;

/// Component that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticOrigin {
    /// Reading the workload file
    Loader,
    /// The optimistic manager's run
    Optimistic,
    /// The Banker's manager's run
    Avoidance,
}

impl fmt::Display for DiagnosticOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loader => write!(f, "loader"),
            Self::Optimistic => write!(f, "optimistic"),
            Self::Avoidance => write!(f, "banker"),
        }
    }
}

/// A non-fatal problem worth reporting to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Where the problem was found
    pub origin: DiagnosticOrigin,
    /// Simulation cycle, when raised during a run
    pub cycle: Option<u32>,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Diagnostics in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Record a diagnostic raised outside any cycle.
    pub fn push(&mut self, origin: DiagnosticOrigin, message: impl Into<String>) {
        self.0.push(Diagnostic {
            origin,
            cycle: None,
            message: message.into(),
        });
    }

    /// Record a diagnostic raised during `cycle`.
    pub fn push_at(&mut self, origin: DiagnosticOrigin, cycle: u32, message: impl Into<String>) {
        self.0.push(Diagnostic {
            origin,
            cycle: Some(cycle),
            message: message.into(),
        });
    }

    /// Append every diagnostic of `other`, keeping order.
    pub fn extend(&mut self, other: &Self) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in raise order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.0 {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_keep_raise_order() {
        let mut loader = Diagnostics::default();
        loader.push(DiagnosticOrigin::Loader, "Error: invalid task number 7");

        let mut banker = Diagnostics::default();
        banker.push_at(DiagnosticOrigin::Avoidance, 3, "Task 2 aborted");

        let mut all = Diagnostics::default();
        all.extend(&loader);
        all.extend(&banker);

        assert_eq!(all.len(), 2);
        let origins: Vec<DiagnosticOrigin> = all.iter().map(|diagnostic| diagnostic.origin).collect();
        assert_eq!(origins, vec![DiagnosticOrigin::Loader, DiagnosticOrigin::Avoidance]);
        assert_eq!(
            all.to_string(),
            "Error: invalid task number 7\nTask 2 aborted\n"
        );
    }

    #[test]
    fn test_empty_diagnostics_render_nothing() {
        let diagnostics = Diagnostics::default();
        assert!(diagnostics.is_empty());
        assert_eq!(diagnostics.to_string(), "");
    }
}
