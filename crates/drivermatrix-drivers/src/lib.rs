//! drivermatrix drivers
//!
//! Registry of the driver adapters a compatibility run can target. Each
//! adapter lives in its own crate and is enabled by a cargo feature.

#[cfg(feature = "mongodb")]
pub use drivermatrix_driver_mongodb as mongodb;

mod registry;

pub use registry::DriverRegistry;

/// Re-export commonly used types from drivermatrix-core
pub use drivermatrix_core::{DocumentDriver, DocumentSession, HarnessError, Result};
