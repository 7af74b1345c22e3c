//! One compatibility run: resolve the driver, run the checks, emit results

use anyhow::Context;
use drivermatrix_core::{ConsoleTranscript, Harness, HarnessConfig, Report};
use drivermatrix_drivers::DriverRegistry;
use std::io::Write;
use std::path::Path;

/// Run every check and write the transcript to `out`.
///
/// Only setup problems (unknown driver, unwritable report file) are errors;
/// check and connection failures are part of the returned report.
pub async fn execute<W: Write + Send>(
    config: HarnessConfig,
    registry: &DriverRegistry,
    report_file: Option<&Path>,
    out: &mut W,
) -> anyhow::Result<Report> {
    let driver = registry.resolve(&config.driver)?;
    tracing::info!(driver = driver.name(), url = %config.url, "starting compatibility run");

    let harness = Harness::new(driver, config);
    let mut transcript = ConsoleTranscript::new(out);
    let report = harness.run(&mut transcript).await;

    if let Err(e) = transcript.finish() {
        // the report still decides the exit status
        tracing::warn!(error = %e, "failed to write transcript");
    }

    if let Some(path) = report_file {
        write_report(&report, path)?;
    }

    tracing::info!(
        passed = report.passed(),
        failed = report.failed(),
        "compatibility run finished"
    );
    Ok(report)
}

/// Write the JSON report to `path`, replacing any existing file
pub fn write_report(report: &Report, path: &Path) -> anyhow::Result<()> {
    let json = report.to_json_pretty()?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    tracing::debug!(path = %path.display(), "report written");
    Ok(())
}

/// Print the registered drivers, one per line
pub fn list_drivers<W: Write>(registry: &DriverRegistry, out: &mut W) -> std::io::Result<()> {
    for name in registry.list() {
        if let Some(driver) = registry.get(name) {
            writeln!(out, "{}\t{}", name, driver.display_name())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivermatrix_core::testing::{Faults, MemoryDriver, Operation};
    use drivermatrix_core::Status;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn registry(driver: MemoryDriver) -> DriverRegistry {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(driver));
        registry
    }

    fn memory_config() -> HarnessConfig {
        HarnessConfig::new("memory://local").with_driver("memory")
    }

    #[tokio::test]
    async fn test_execute_writes_transcript_and_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("report.json");
        let mut out = Vec::new();

        let report = execute(
            memory_config(),
            &registry(MemoryDriver::new()),
            Some(&report_path),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(report.exit_code(), 0);
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.starts_with("Rust memory Driver Compatibility Test\n"));
        assert_eq!(Report::from_transcript(&transcript).unwrap(), report);

        let written = std::fs::read_to_string(&report_path).unwrap();
        assert_eq!(Report::from_json(&written).unwrap(), report);
    }

    #[tokio::test]
    async fn test_execute_reports_failures_without_error() {
        let driver = MemoryDriver::new().with_faults(Faults::new().fail(Operation::DeleteOne));
        let mut out = Vec::new();

        let report = execute(memory_config(), &registry(driver), None, &mut out)
            .await
            .unwrap();

        assert_eq!(report.entry("delete-one").unwrap().status, Status::Fail);
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_execute_rejects_unknown_driver() {
        let mut out = Vec::new();
        let err = execute(
            memory_config().with_driver("cassandra"),
            &registry(MemoryDriver::new()),
            None,
            &mut out,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("unknown driver 'cassandra'"));
        assert!(out.is_empty(), "nothing runs for an unknown driver");
    }

    #[test]
    fn test_list_drivers() {
        let mut out = Vec::new();
        list_drivers(&registry(MemoryDriver::new()), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "memory\tIn-memory\n");
    }
}
