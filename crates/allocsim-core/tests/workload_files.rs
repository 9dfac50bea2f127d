//! Workload files read from disk and carried through to a comparison report.
#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::tests_outside_test_module,
        reason = "Test allows"
    )
)]

use std::fs;
use std::path::PathBuf;

use allocsim_core::{ComparisonReport, DiagnosticOrigin, Error, ManagerKind, load_workload};
use anyhow::Result;
use tempfile::TempDir;

fn write_input(dir: &TempDir, contents: &str) -> Result<PathBuf> {
    let path = dir.path().join("input.txt");
    fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn test_file_to_report() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_input(
        &dir,
        "2 1 4
         initiate 1 1 4
         initiate 2 1 5
         request 1 1 2
         request 2 1 2
         release 1 1 2
         release 2 1 2
         terminate 1 0 0
         terminate 2 0 0",
    )?;

    let loaded = load_workload(&path)?;
    let optimistic = ManagerKind::Optimistic.simulate(&loaded.workload)?;
    let avoidance = ManagerKind::Avoidance.simulate(&loaded.workload)?;
    let report = ComparisonReport::new(&optimistic, &avoidance)
        .with_input_diagnostics(&loaded.diagnostics);

    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.diagnostics.len(), 1, "task 2 claims more than exists");
    let origins: Vec<DiagnosticOrigin> =
        report.diagnostics.iter().map(|diagnostic| diagnostic.origin).collect();
    assert_eq!(origins, vec![DiagnosticOrigin::Avoidance]);

    let table = report.render_table();
    assert!(table.contains("Task 2  aborted"));
    assert!(!table.contains("Task 1  aborted"));
    Ok(())
}

#[test]
fn test_loader_diagnostics_precede_run_diagnostics() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_input(
        &dir,
        "1 1 1\ninitiate 1 1 2\nrequest 9 1 1\nterminate 1 0 0\n",
    )?;

    let loaded = load_workload(&path)?;
    let optimistic = ManagerKind::Optimistic.simulate(&loaded.workload)?;
    let avoidance = ManagerKind::Avoidance.simulate(&loaded.workload)?;
    let report = ComparisonReport::new(&optimistic, &avoidance)
        .with_input_diagnostics(&loaded.diagnostics);

    let origins: Vec<DiagnosticOrigin> =
        report.diagnostics.iter().map(|diagnostic| diagnostic.origin).collect();
    assert_eq!(
        origins,
        vec![DiagnosticOrigin::Loader, DiagnosticOrigin::Avoidance]
    );
    Ok(())
}

#[test]
fn test_missing_file_is_reported_before_any_run() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let error = load_workload(&dir.path().join("absent.txt")).unwrap_err();

    assert!(matches!(error, Error::FileNotFound(_)));
    assert!(error.to_string().contains("absent.txt"));
}
