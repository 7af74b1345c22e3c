//! drivermatrix command-line runner
//!
//! Runs the compatibility checks once against the configured server, prints
//! the transcript and JSON report to stdout, and exits with status 0 when
//! every check passed, 1 when any check or the connection failed, and 2 when
//! the run could not be set up.

mod args;
mod logging;
mod run;

use args::Args;
use clap::Parser;
use drivermatrix_drivers::DriverRegistry;
use std::process::ExitCode;

const SETUP_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let logging_config = logging::LoggingConfig::default().with_log_file(args.log_file.clone());
    let _log_guard = match logging::init(logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: failed to initialize logging: {:#}", e);
            return ExitCode::from(SETUP_FAILURE);
        }
    };

    match run_cli(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %e, "run aborted");
            eprintln!("error: {:#}", e);
            ExitCode::from(SETUP_FAILURE)
        }
    }
}

async fn run_cli(args: Args) -> anyhow::Result<u8> {
    let registry = DriverRegistry::with_defaults();

    if args.list_drivers {
        run::list_drivers(&registry, &mut std::io::stdout())?;
        return Ok(0);
    }

    let config = args.harness_config()?;
    let report = run::execute(
        config,
        &registry,
        args.report_file.as_deref(),
        &mut std::io::stdout(),
    )
    .await?;

    Ok(report.exit_code())
}
