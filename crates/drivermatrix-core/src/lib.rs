//! drivermatrix core - check sequencing and reporting for driver compatibility runs
//!
//! A run connects to one server through one driver, executes a fixed list of
//! checks against the resulting session, and produces a [`Report`]:
//!
//! - [`ConnectionManager`] - opens, probes and always releases the session
//! - [`Check`] - the ordered checks and their success predicates
//! - [`Sequencer`] - runs every check in isolation and records outcomes
//! - [`Harness`] - ties the two together; the entry point for binaries
//! - [`ConsoleTranscript`] - renders progress, summary and the JSON report
//!
//! Drivers implement [`DocumentDriver`] and [`DocumentSession`].

mod check;
mod config;
mod connection;
mod console;
mod driver;
mod error;
mod harness;
mod observer;
mod report;
mod sequencer;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use check::*;
pub use config::*;
pub use connection::*;
pub use console::*;
pub use driver::*;
pub use error::*;
pub use harness::*;
pub use observer::*;
pub use report::*;
pub use sequencer::*;
