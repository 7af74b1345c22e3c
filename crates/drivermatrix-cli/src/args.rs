//! Command-line arguments and configuration layering

use clap::Parser;
use drivermatrix_core::{HarnessConfig, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Run the driver compatibility checks against a document database.
///
/// Settings are layered: built-in defaults, then the `--config` TOML file,
/// then environment variables, then flags.
#[derive(Parser, Debug)]
#[command(name = "drivermatrix", author, version, about, long_about = None)]
pub struct Args {
    /// Connection URL of the server under test
    #[arg(long, env = "OXIDEDB_URL")]
    pub url: Option<String>,

    /// Database to run the checks in
    #[arg(long, env = "DRIVER_MATRIX_DATABASE")]
    pub database: Option<String>,

    /// Collection the checks create and drop
    #[arg(long, env = "DRIVER_MATRIX_COLLECTION")]
    pub collection: Option<String>,

    /// Registered driver to exercise
    #[arg(long, env = "DRIVER_MATRIX_DRIVER")]
    pub driver: Option<String>,

    /// Connect and liveness probe timeout in milliseconds
    #[arg(long, env = "DRIVER_MATRIX_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// TOML file with run settings
    #[arg(long, env = "DRIVER_MATRIX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write the JSON report to this file
    #[arg(long)]
    pub report_file: Option<PathBuf>,

    /// Write JSON-formatted logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the registered drivers and exit
    #[arg(long)]
    pub list_drivers: bool,
}

impl Args {
    /// Resolve the run configuration from every source.
    ///
    /// clap has already folded environment variables into the flag values,
    /// so anything set here overrides the file.
    pub fn harness_config(&self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::from_file(path)?,
            None => HarnessConfig::default(),
        };

        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(collection) = &self.collection {
            config.collection = collection.clone();
        }
        if let Some(driver) = &self.driver {
            config.driver = driver.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_connect_timeout(Duration::from_millis(ms));
        }

        config.validate()?;
        Ok(config)
    }
}
