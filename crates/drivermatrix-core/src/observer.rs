//! Progress notifications emitted while a run executes

use crate::{HarnessConfig, HarnessError, Report, TestEntry};

/// Receives run progress in order: start, then either connected followed by
/// one `on_check` per check, or a single connect failure, then finish.
pub trait RunObserver: Send {
    fn on_start(&mut self, _driver: &str, _config: &HarnessConfig) {}

    fn on_connected(&mut self) {}

    fn on_connect_failed(&mut self, _error: &HarnessError) {}

    /// `index` is 1-based
    fn on_check(&mut self, _index: usize, _entry: &TestEntry) {}

    fn on_finish(&mut self, _report: &Report) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {}
