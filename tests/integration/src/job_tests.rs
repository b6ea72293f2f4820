//! Job Tests - Run, Cancel and Wait
//!
//! These tests drive the job state machine through `IJob` calls:
//! - Idle -> Running -> Completed / Cancelled / Failed
//! - AlreadyRunning on overlapping runs
//! - Bounded waits and the run bookkeeping (LastRun, LastError)

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use async_trait::async_trait;
use tokio::sync::Notify;

use common::*;
use orpc::job::{job_table, ole_date, CancelSignal, JobClient, JobObject, JobStatus, JobWork};
use orpc::types::hresult;

/// Work that runs until released, failing with `error` if one is set
struct Gate {
    release: Arc<Notify>,
    runs: Arc<AtomicUsize>,
    error: Option<&'static str>,
}

#[async_trait]
impl JobWork for Gate {
    async fn run(&self, _cancel: CancelSignal) -> Result<(), String> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        match self.error {
            Some(error) => Err(error.to_string()),
            None => Ok(()),
        }
    }
}

struct Harness {
    fixture: Fixture,
    job: JobObject,
    client: JobClient,
    release: Arc<Notify>,
    runs: Arc<AtomicUsize>,
}

fn harness(error: Option<&'static str>) -> Harness {
    let fixture = Fixture::new();
    let release = Arc::new(Notify::new());
    let runs = Arc::new(AtomicUsize::new(0));
    let job = JobObject::new(
        "gate",
        Gate {
            release: release.clone(),
            runs: runs.clone(),
            error,
        },
    );
    let pointer = fixture
        .server
        .export_pointer(job_table(Arc::new(job.clone())).unwrap())
        .unwrap();
    let client = JobClient::unmarshal(fixture.connection.clone(), &pointer).unwrap();
    Harness {
        fixture,
        job,
        client,
        release,
        runs,
    }
}

impl Harness {
    async fn status(&self) -> JobStatus {
        self.client.status().await.unwrap().into_result().unwrap()
    }
}

/// Test: Run, a refused second Run, Cancel, and a bounded zero wait
#[tokio::test]
async fn test_state_machine() {
    let h = harness(None);
    assert_eq!(h.status().await, JobStatus::Idle);

    assert!(h.client.run().await.unwrap().is_success());
    assert_eq!(h.status().await, JobStatus::Running);

    let second = h.client.run().await.unwrap();
    let failure = second.failure().cloned().unwrap();
    assert_eq!(failure.code, hresult::ALREADY_RUNNING);
    assert_eq!(failure.operation_name(), "/IJob/v1/Run");

    let started = Instant::now();
    let settled = h.client.wait_for_completion(0).await.unwrap().into_result().unwrap();
    assert!(!settled);
    assert!(started.elapsed() < Duration::from_secs(5));

    assert!(h.client.cancel().await.unwrap().is_success());
    assert_eq!(h.status().await, JobStatus::Cancelled);
    assert_eq!(
        h.client.wait_for_completion(0).await.unwrap().into_result().unwrap(),
        true
    );
}

/// Test: Cancel outside Running is a successful no-op
#[tokio::test]
async fn test_cancel_is_idempotent() {
    let h = harness(None);
    assert!(h.client.cancel().await.unwrap().is_success());
    assert_eq!(h.status().await, JobStatus::Idle);

    h.client.run().await.unwrap().into_result().unwrap();
    h.client.cancel().await.unwrap().into_result().unwrap();
    h.client.cancel().await.unwrap().into_result().unwrap();
    assert_eq!(h.status().await, JobStatus::Cancelled);
}

/// Test: a released run completes and records when it started
#[tokio::test]
async fn test_run_to_completion() {
    let h = harness(None);
    assert_eq!(
        h.client.last_run().await.unwrap().into_result().unwrap(),
        0.0
    );

    let before = ole_date(SystemTime::now());
    h.client.run().await.unwrap().into_result().unwrap();
    while h.runs.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    h.release.notify_one();

    assert_eq!(
        h.client.wait_for_completion(5).await.unwrap().into_result().unwrap(),
        true
    );
    assert_eq!(h.status().await, JobStatus::Completed);

    let last_run = h.client.last_run().await.unwrap().into_result().unwrap();
    assert!(last_run >= before);
    assert!(last_run <= ole_date(SystemTime::now()));
    assert_eq!(
        h.client.last_error().await.unwrap().into_result().unwrap(),
        None
    );
}

/// Test: a failed run keeps its error until the next run starts
#[tokio::test]
async fn test_failure_records_last_error() {
    let h = harness(Some("quota exceeded"));
    h.client.run().await.unwrap().into_result().unwrap();
    while h.runs.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    h.release.notify_one();

    assert!(h.job.wait(Duration::from_secs(5)).await);
    assert_eq!(h.status().await, JobStatus::Failed);
    assert_eq!(
        h.client.last_error().await.unwrap().into_result().unwrap().as_deref(),
        Some("quota exceeded")
    );

    h.client.run().await.unwrap().into_result().unwrap();
    assert_eq!(
        h.client.last_error().await.unwrap().into_result().unwrap(),
        None
    );
    h.client.cancel().await.unwrap();
}

/// Test: a job can run again after a cancelled run
#[tokio::test]
async fn test_rerun_after_cancel() {
    let h = harness(None);
    h.client.run().await.unwrap().into_result().unwrap();
    while h.runs.load(Ordering::SeqCst) < 1 {
        tokio::task::yield_now().await;
    }
    h.client.cancel().await.unwrap().into_result().unwrap();
    assert_eq!(h.status().await, JobStatus::Cancelled);

    h.client.run().await.unwrap().into_result().unwrap();
    while h.runs.load(Ordering::SeqCst) < 2 {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.status().await, JobStatus::Running);
    h.release.notify_one();

    assert!(h.job.wait(Duration::from_secs(5)).await);
    assert_eq!(h.status().await, JobStatus::Completed);
}

/// Test: negative waits are rejected
#[tokio::test]
async fn test_negative_wait() {
    let h = harness(None);
    let outcome = h.client.wait_for_completion(-5).await.unwrap();
    assert_eq!(outcome.status(), hresult::E_INVALIDARG);
    assert_eq!(h.fixture.server.stats().calls_failed, 0);
}
