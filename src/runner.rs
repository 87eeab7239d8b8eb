//! Sequential invocation of the external install script.
//!
//! One invocation per stored record, in store order, with the record name
//! as the only argument. Failures are logged and never stop the remaining
//! records; there is no retry and no timeout.
use crate::machine::MachineSpec;
use crate::settings::Settings;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Counts of script outcomes for one install pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallSummary {
    pub succeeded: usize,
    pub failed: usize,
}

struct ScriptCapture {
    stdout: String,
    stderr: String,
    status: ExitStatus,
}

/// Load the store and run the install script for every record.
pub fn run_install(settings: &Settings, console: &mut impl Write) -> Result<InstallSummary> {
    let records = settings.open_store().load()?;
    if records.is_empty() {
        tracing::info!(
            store = %settings.store_path.display(),
            "no machines to install services on"
        );
        writeln!(console, "\nNo provisioned machines found.")?;
        return Ok(InstallSummary::default());
    }
    install_services(&settings.script_path, &records, console)
}

/// Invoke `script` once per record, strictly in order.
pub fn install_services(
    script: &Path,
    records: &[MachineSpec],
    console: &mut impl Write,
) -> Result<InstallSummary> {
    let mut summary = InstallSummary::default();
    for record in records {
        let name = record.name.as_str();
        if let Err(err) = writeln!(console, "\nTrying to install services on '{name}'..") {
            tracing::warn!(error = %err, "install notice not written to console");
        }
        match run_script(script, name) {
            Ok(capture) if capture.status.success() => {
                summary.succeeded += 1;
                tracing::info!(
                    "Script executed for '{name}': {}",
                    single_line(&capture.stdout)
                );
            }
            Ok(capture) => {
                summary.failed += 1;
                tracing::error!(
                    exit_code = ?capture.status.code(),
                    "Script failed for '{name}': {}",
                    single_line(&capture.stderr)
                );
            }
            Err(err) => {
                summary.failed += 1;
                tracing::error!("Script failed for '{name}': {err:#}");
            }
        }
    }
    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "install pass finished"
    );
    Ok(summary)
}

fn run_script(script: &Path, name: &str) -> Result<ScriptCapture> {
    let output = Command::new(script)
        .arg(name)
        .output()
        .with_context(|| format!("spawn {}", script.display()))?;

    Ok(ScriptCapture {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        status: output.status,
    })
}

/// Log lines hold one event each, so multi-line output is joined.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(all(test, unix))]
#[path = "runner_tests.rs"]
mod tests;
