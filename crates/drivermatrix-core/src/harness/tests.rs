//! End-to-end runs against the in-memory driver

use super::*;
use crate::testing::{Faults, MemoryDriver, Operation};
use crate::{CONNECT_ENTRY, ConsoleTranscript, SilentObserver, Status};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn harness(driver: &Arc<MemoryDriver>) -> Harness {
    let config = HarnessConfig::new("memory://local")
        .with_database("compat")
        .with_connect_timeout(Duration::from_millis(300));
    Harness::new(Arc::clone(driver) as Arc<dyn DocumentDriver>, config)
}

#[tokio::test]
async fn test_full_run_against_healthy_database() {
    let driver = Arc::new(MemoryDriver::new());
    let report = harness(&driver).run(&mut SilentObserver).await;

    assert_eq!(report.passed(), 10);
    assert_eq!(report.failed(), 0);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(driver.sessions().len(), 1, "connection attempted exactly once");
    assert_eq!(driver.last_session().unwrap().close_calls(), 1);
}

#[tokio::test]
async fn test_connection_failure_yields_single_connect_entry() {
    let driver = Arc::new(MemoryDriver::new().refusing("Connection refused (os error 111)"));
    let report = harness(&driver).run(&mut SilentObserver).await;

    assert_eq!(report.total(), 1);
    let entry = &report.tests()[0];
    assert_eq!(entry.name, CONNECT_ENTRY);
    assert_eq!(entry.status, Status::Fail);
    assert_eq!(
        entry.error.as_deref(),
        Some("Connection error: Connection refused (os error 111)")
    );
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn test_failed_probe_runs_no_checks_and_releases() {
    let driver = Arc::new(MemoryDriver::new().with_faults(Faults::new().fail(Operation::Ping)));
    let report = harness(&driver).run(&mut SilentObserver).await;

    assert_eq!(report.names(), vec![CONNECT_ENTRY]);
    assert_eq!(driver.last_session().unwrap().close_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_server_fails_within_timeout() {
    let driver = Arc::new(MemoryDriver::new().hanging());
    let harness = harness(&driver);
    let started = tokio::time::Instant::now();
    let report = harness.run(&mut SilentObserver).await;

    assert!(started.elapsed() <= harness.config().connect_timeout());
    assert_eq!(report.names(), vec![CONNECT_ENTRY]);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_check_does_not_stall_run() {
    let driver = Arc::new(MemoryDriver::new().with_faults(Faults::new().hang(Operation::FindOne)));
    let report = harness(&driver).run(&mut SilentObserver).await;

    assert_eq!(report.total(), 10);
    assert_eq!(
        report.entry("find-one").unwrap().error.as_deref(),
        Some("Timeout: find-one did not complete within 300 ms")
    );
    assert_eq!(report.exit_code(), 1);
    assert_eq!(driver.last_session().unwrap().close_calls(), 1);
}

#[tokio::test]
async fn test_update_on_missing_target_fails_run() {
    let driver = Arc::new(MemoryDriver::new().with_faults(Faults::new().fail(Operation::InsertOne)));
    let report = harness(&driver).run(&mut SilentObserver).await;

    assert_eq!(report.entry("update-one").unwrap().status, Status::Fail);
    assert_eq!(report.exit_code(), 1);
    assert_eq!(driver.last_session().unwrap().close_calls(), 1);
}

#[tokio::test]
async fn test_seeded_collection_does_not_break_setup() {
    let driver = Arc::new(MemoryDriver::new().with_setup(|session| {
        session.seed("test_collection", Vec::new());
    }));
    let report = harness(&driver).run(&mut SilentObserver).await;

    assert_eq!(report.entry("create-collection").unwrap().status, Status::Pass);
    assert!(report.all_passed());
}

#[tokio::test]
async fn test_transcript_of_full_run() {
    let driver = Arc::new(MemoryDriver::new().with_faults(Faults::new().insert_many_ids(1)));
    let mut transcript = ConsoleTranscript::new(Vec::new());
    let report = harness(&driver).run(&mut transcript).await;
    let output = String::from_utf8(transcript.finish().unwrap()).unwrap();

    assert!(output.starts_with(
        "Rust memory Driver Compatibility Test\n\
         =====================================\n\
         Connecting to: memory://local\n\n\
         ✓ Connected successfully\n\n\
         ✓ Test 1: ping\n"
    ));
    assert!(output.contains("✗ Test 5: insert-many - Expected 2 inserted documents, got 1\n"));
    assert!(output.contains("✓ Test 10: drop-collection\n"));
    assert!(output.contains("  Passed: 9\n  Failed: 1\n  Total:  10\n"));
    assert_eq!(Report::from_transcript(&output).unwrap(), report);
}

#[tokio::test]
async fn test_transcript_of_connection_failure() {
    let driver = Arc::new(MemoryDriver::new().refusing("refused"));
    let mut transcript = ConsoleTranscript::new(Vec::new());
    harness(&driver).run(&mut transcript).await;
    let output = String::from_utf8(transcript.finish().unwrap()).unwrap();

    assert!(output.contains("Failed to connect: Connection error: refused\n"));
    assert!(!output.contains("Connected successfully"));
    assert!(!output.contains("Test 1"));
}
