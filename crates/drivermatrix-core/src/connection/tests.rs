//! Tests for session acquisition and scoped release

use super::*;
use crate::testing::{Faults, MemoryDriver, Operation};
use std::time::Duration;

fn manager(driver: &Arc<MemoryDriver>) -> ConnectionManager {
    let config = HarnessConfig::new("memory://local").with_connect_timeout(Duration::from_millis(200));
    ConnectionManager::new(Arc::clone(driver) as Arc<dyn DocumentDriver>, config)
}

#[tokio::test]
async fn test_acquire_returns_live_session() {
    let driver = Arc::new(MemoryDriver::new());
    let session = manager(&driver).acquire().await.unwrap();

    assert_eq!(session.database(), "driver_compat_test_rust");
    assert!(!session.is_closed());
}

#[tokio::test]
async fn test_refused_connection_is_connection_error() {
    let driver = Arc::new(MemoryDriver::new().refusing("connection refused"));
    let err = manager(&driver).acquire().await.err().unwrap();

    assert!(matches!(err, HarnessError::Connection(ref msg) if msg == "connection refused"));
    assert!(driver.sessions().is_empty());
}

#[tokio::test]
async fn test_failed_probe_releases_partial_session() {
    let driver = Arc::new(MemoryDriver::new().with_faults(Faults::new().fail(Operation::Ping)));
    let err = manager(&driver).acquire().await.err().unwrap();

    assert_eq!(
        err.to_string(),
        "Connection error: Driver error: injected failure in Ping"
    );
    let session = driver.last_session().unwrap();
    assert!(session.is_closed());
    assert_eq!(session.close_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_connect_times_out() {
    let driver = Arc::new(MemoryDriver::new().hanging());
    let err = manager(&driver).acquire().await.err().unwrap();

    assert!(matches!(err, HarnessError::Timeout(_)));
    assert_eq!(err.to_string(), "Timeout: no response from server within 200 ms");
}

#[tokio::test(start_paused = true)]
async fn test_hanging_probe_times_out_and_releases() {
    let driver = Arc::new(MemoryDriver::new().with_faults(Faults::new().hang(Operation::Ping)));
    let started = tokio::time::Instant::now();
    let err = manager(&driver).acquire().await.err().unwrap();

    assert!(matches!(err, HarnessError::Timeout(_)));
    assert!(started.elapsed() <= Duration::from_millis(200));
    assert_eq!(driver.last_session().unwrap().close_calls(), 1);
}

#[tokio::test]
async fn test_scoped_releases_after_body() {
    let driver = Arc::new(MemoryDriver::new());
    let value = manager(&driver)
        .scoped(|session| async move {
            session.ping().await.unwrap();
            7
        })
        .await
        .unwrap();

    assert_eq!(value, 7);
    assert_eq!(driver.last_session().unwrap().close_calls(), 1);
}

#[tokio::test]
async fn test_scoped_skips_body_when_connect_fails() {
    let driver = Arc::new(MemoryDriver::new().refusing("no route to host"));
    let mut ran = false;
    let flag = &mut ran;
    let result = manager(&driver)
        .scoped(move |_session| async move {
            *flag = true;
        })
        .await;

    assert!(result.is_err());
    assert!(!ran);
}

#[tokio::test]
async fn test_scoped_releases_when_body_panics() {
    let driver = Arc::new(MemoryDriver::new());
    let mgr = manager(&driver);

    let outcome = AssertUnwindSafe(mgr.scoped(|_session| async {
        panic!("body exploded");
    }))
    .catch_unwind()
    .await;

    assert!(outcome.is_err());
    let session = driver.last_session().unwrap();
    assert!(session.is_closed());
    assert_eq!(session.close_calls(), 1);
}
