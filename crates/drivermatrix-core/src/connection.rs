//! Connection manager
//!
//! Opens the single session a run works with, probes it, and guarantees it
//! is closed again whatever happens to the code using it.

use crate::{DocumentDriver, DocumentSession, HarnessConfig, HarnessError, Result};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};

/// Owns the driver and configuration for one run
pub struct ConnectionManager {
    driver: Arc<dyn DocumentDriver>,
    config: HarnessConfig,
}

impl ConnectionManager {
    pub fn new(driver: Arc<dyn DocumentDriver>, config: HarnessConfig) -> Self {
        Self { driver, config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// Open a session and verify it answers `ping`.
    ///
    /// Opening and probing share one deadline. A session that was opened but
    /// failed the probe is closed before the error is returned. Every error
    /// is reported as [`HarnessError::Connection`] or
    /// [`HarnessError::Timeout`].
    #[tracing::instrument(skip(self), fields(driver = self.driver.name(), url = %self.config.url))]
    pub async fn acquire(&self) -> Result<Arc<dyn DocumentSession>> {
        let limit = self.config.connect_timeout();
        let deadline = Instant::now() + limit;
        tracing::debug!(timeout_ms = limit.as_millis() as u64, "connecting");

        let session = match timeout_at(deadline, self.driver.connect(&self.config)).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => return Err(as_connection_error(e)),
            Err(_) => return Err(timed_out(limit)),
        };

        match timeout_at(deadline, session.ping()).await {
            Ok(Ok(())) => {
                tracing::info!(database = session.database(), "connected");
                Ok(session)
            }
            Ok(Err(e)) => {
                self.release(session).await;
                Err(as_connection_error(e))
            }
            Err(_) => {
                self.release(session).await;
                Err(timed_out(limit))
            }
        }
    }

    /// Close a session, logging instead of failing
    pub async fn release(&self, session: Arc<dyn DocumentSession>) {
        match session.close().await {
            Ok(()) => tracing::debug!("session released"),
            Err(e) => tracing::warn!(error = %e, "failed to close session cleanly"),
        }
    }

    /// Acquire a session, run `body` with it, then release it.
    ///
    /// The session is released after `body` completes and also when it
    /// panics; the panic is resumed once the session is closed. `body` is
    /// not called when acquisition fails.
    pub async fn scoped<F, Fut, T>(&self, body: F) -> Result<T>
    where
        F: FnOnce(Arc<dyn DocumentSession>) -> Fut,
        Fut: Future<Output = T>,
    {
        let session = self.acquire().await?;
        let result = AssertUnwindSafe(body(Arc::clone(&session)))
            .catch_unwind()
            .await;
        self.release(session).await;

        match result {
            Ok(value) => Ok(value),
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}

fn as_connection_error(error: HarnessError) -> HarnessError {
    if error.is_connection_failure() {
        error
    } else {
        HarnessError::Connection(error.to_string())
    }
}

fn timed_out(limit: Duration) -> HarnessError {
    HarnessError::Timeout(format!(
        "no response from server within {} ms",
        limit.as_millis()
    ))
}

#[cfg(test)]
mod tests;
