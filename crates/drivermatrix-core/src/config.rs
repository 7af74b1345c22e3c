//! Run configuration
//!
//! A [`HarnessConfig`] is built once per invocation and handed to the
//! connection manager. Values come from built-in defaults, an optional TOML
//! file, and the command line (the binary layers them in that order).

use crate::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Address used when nothing else is configured
pub const DEFAULT_URL: &str = "mongodb://localhost:27017";
/// Database the checks write into
pub const DEFAULT_DATABASE: &str = "driver_compat_test_rust";
/// Collection created, filled and dropped by the checks
pub const DEFAULT_COLLECTION: &str = "test_collection";
/// Driver picked from the registry when none is named
pub const DEFAULT_DRIVER: &str = "mongodb";
/// Upper bound for connecting and the liveness probe
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Configuration for a single compatibility run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Connection address (URL-like, driver specific)
    pub url: String,
    /// Database the session is bound to
    pub database: String,
    /// Collection the checks operate on
    pub collection: String,
    /// Registry name of the driver under test
    pub driver: String,
    /// Timeout for connecting and the liveness probe, in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            driver: DEFAULT_DRIVER.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl HarnessConfig {
    /// Create a configuration targeting `url` with every other value defaulted
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Timeout applied to connecting and to the liveness probe
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Parse a configuration from TOML; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading harness config file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Reject values that cannot produce a meaningful run
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(HarnessError::Configuration(
                "connection url must not be empty".to_string(),
            ));
        }
        if self.database.trim().is_empty() {
            return Err(HarnessError::Configuration(
                "database name must not be empty".to_string(),
            ));
        }
        if self.collection.trim().is_empty() {
            return Err(HarnessError::Configuration(
                "collection name must not be empty".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(HarnessError::Configuration(
                "connect timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
