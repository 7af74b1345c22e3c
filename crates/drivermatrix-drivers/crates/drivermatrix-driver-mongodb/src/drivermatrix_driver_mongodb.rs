//! MongoDB driver for drivermatrix
//!
//! Adapts the official `mongodb` crate to the session primitives the
//! compatibility checks exercise: ping, collection create/drop/list, and
//! single/bulk CRUD.
//!
//! # Example
//!
//! ```ignore
//! use drivermatrix_core::{Harness, HarnessConfig, SilentObserver};
//! use drivermatrix_driver_mongodb::MongoDbDriver;
//! use std::sync::Arc;
//!
//! let config = HarnessConfig::new("mongodb://localhost:27017");
//! let report = Harness::new(Arc::new(MongoDbDriver::new()), config)
//!     .run(&mut SilentObserver)
//!     .await;
//! std::process::exit(report.exit_code().into());
//! ```

pub mod collections;
mod driver;
#[cfg(test)]
mod driver_tests;

pub use driver::*;
