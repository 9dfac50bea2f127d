//! Logging setup and the simulate-and-report command.

use std::io::{self, Write as _};
use std::path::Path;

use allocsim_core::{ComparisonReport, ManagerKind, load_workload};
use anyhow::{Context as _, Result};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use crate::config::{LoggingConfig, OutputFormat, ReportConfig};

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins; otherwise `-v` selects debug, `-vv` trace, and no flag
/// falls back to the configured filter.
pub fn init_logging(config: &LoggingConfig, verbose: u8) {
    let fallback = match verbose {
        0 => config.filter.clone(),
        1 => "allocsim_core=debug,allocsim=debug".to_owned(),
        _ => "allocsim_core=trace,allocsim=trace".to_owned(),
    };

    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(config.ansi)
                .with_target(true)
                .with_level(true),
        )
        .init();
}

/// Load `input`, run it under both managers, and print the comparison.
///
/// # Errors
/// Returns an error if the workload cannot be loaded, either run fails, or
/// stdout cannot be written.
pub fn handle_simulation(input: &Path, config: &ReportConfig) -> Result<()> {
    let loaded = load_workload(input)
        .with_context(|| format!("Failed to load workload {}", input.display()))?;
    info!(
        "Loaded {} task(s) over {} resource type(s) from {}",
        loaded.workload.task_count(),
        loaded.workload.resource_count(),
        input.display()
    );

    let optimistic = ManagerKind::Optimistic
        .simulate(&loaded.workload)
        .context("Optimistic run failed")?;
    let avoidance = ManagerKind::Avoidance
        .simulate(&loaded.workload)
        .context("Banker's run failed")?;
    info!(
        "Optimistic run took {} cycle(s), Banker's {}",
        optimistic.cycles, avoidance.cycles
    );

    let mut report =
        ComparisonReport::new(&optimistic, &avoidance).with_input_diagnostics(&loaded.diagnostics);
    if !config.show_diagnostics {
        report.clear_diagnostics();
    }

    let rendered = render(&report, config.format)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Render `report` in the requested format.
///
/// In table form the diagnostics come first, separated from the table by a
/// blank line.
fn render(report: &ComparisonReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let mut output = String::new();
            if !report.diagnostics.is_empty() {
                output.push_str(&report.diagnostics.to_string());
                output.push('\n');
            }
            output.push_str(&report.render_table());
            Ok(output)
        }
        OutputFormat::Json => {
            let mut json = report.to_json()?;
            json.push('\n');
            Ok(json)
        }
    }
}
