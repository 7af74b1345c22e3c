//! Run entry point tying the connection manager and the sequencer together

use crate::{
    CONNECT_ENTRY, ConnectionManager, DocumentDriver, HarnessConfig, Outcome, Report,
    RunObserver, Sequencer,
};
use std::sync::Arc;

/// A single compatibility run of one driver against one server
pub struct Harness {
    manager: ConnectionManager,
}

impl Harness {
    pub fn new(driver: Arc<dyn DocumentDriver>, config: HarnessConfig) -> Self {
        Self {
            manager: ConnectionManager::new(driver, config),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        self.manager.config()
    }

    /// Connect, run every check, and return the finished report.
    ///
    /// When the connection cannot be established the report holds exactly one
    /// failed [`CONNECT_ENTRY`] and no check is attempted.
    #[tracing::instrument(skip(self, observer), fields(driver = self.manager.driver_name()))]
    pub async fn run(&self, observer: &mut dyn RunObserver) -> Report {
        let config = self.manager.config();
        observer.on_start(self.manager.driver_name(), config);

        let mut report = Report::new();
        let sequencer =
            Sequencer::new(config.collection.clone()).with_timeout(config.connect_timeout());

        let scoped = {
            let report = &mut report;
            let observer = &mut *observer;
            let sequencer = &sequencer;
            self.manager
                .scoped(move |session| async move {
                    observer.on_connected();
                    sequencer.run(session.as_ref(), report, observer).await;
                })
                .await
        };

        if let Err(e) = scoped {
            tracing::error!(error = %e, "connection failed, no checks attempted");
            observer.on_connect_failed(&e);
            report.record(CONNECT_ENTRY, Outcome::Fail(e.to_string()));
        }

        observer.on_finish(&report);
        report
    }
}

#[cfg(test)]
mod tests;
