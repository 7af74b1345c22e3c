//! Error types for drivermatrix

use thiserror::Error;

/// Core error type for harness and driver operations
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl HarnessError {
    /// Whether this error means the target could not be reached at all
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, HarnessError::Connection(_) | HarnessError::Timeout(_))
    }
}

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Why a single check did not pass.
///
/// The `Display` output becomes the `error` field of the report entry, so
/// driver failures render as the driver's own message.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error(transparent)]
    Driver(#[from] HarnessError),

    #[error("{0}")]
    Mismatch(String),

    #[error("check panicked: {0}")]
    Panicked(String),
}

impl CheckError {
    pub fn mismatch(detail: impl Into<String>) -> Self {
        CheckError::Mismatch(detail.into())
    }
}
