//! Sequential execution of the check list

use crate::{
    Check, CheckError, DEFAULT_CONNECT_TIMEOUT_MS, DocumentSession, HarnessError, Outcome, Report,
    RunObserver,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::Instrument;

/// Runs every [`Check`] once, in order, against one session.
///
/// A failing or panicking check is recorded and the next one still runs;
/// nothing escapes a check boundary. Each check gets at most `timeout` to
/// finish its driver calls.
#[derive(Debug, Clone)]
pub struct Sequencer {
    collection: String,
    timeout: Duration,
}

impl Sequencer {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run all checks, appending one entry per check to `report`
    pub async fn run(
        &self,
        session: &dyn DocumentSession,
        report: &mut Report,
        observer: &mut dyn RunObserver,
    ) {
        for (index, check) in Check::ALL.into_iter().enumerate() {
            let outcome = self.run_check(check, session).await;
            let entry = report.record(check.name(), outcome);
            observer.on_check(index + 1, entry);
        }

        tracing::info!(
            passed = report.passed(),
            failed = report.failed(),
            "check sequence finished"
        );
    }

    async fn run_check(&self, check: Check, session: &dyn DocumentSession) -> Outcome {
        let span = tracing::info_span!("check", name = check.name());
        let guarded = AssertUnwindSafe(check.execute(session, &self.collection)).catch_unwind();
        let observed = tokio::time::timeout(self.timeout, guarded)
            .instrument(span)
            .await;

        let outcome = match observed {
            Ok(Ok(result)) => check.evaluate(result, &self.collection),
            Ok(Err(payload)) => {
                Outcome::Fail(CheckError::Panicked(panic_message(payload.as_ref())).to_string())
            }
            Err(_) => Outcome::Fail(
                HarnessError::Timeout(format!(
                    "{} did not complete within {} ms",
                    check.name(),
                    self.timeout.as_millis()
                ))
                .to_string(),
            ),
        };

        match &outcome {
            Outcome::Pass => tracing::info!(check = check.name(), "check passed"),
            Outcome::Fail(detail) => {
                tracing::warn!(check = check.name(), error = %detail, "check failed")
            }
        }
        outcome
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
