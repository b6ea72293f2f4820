//! Stock job object
//!
//! [`JobObject`] runs a [`JobWork`] on the tokio runtime. Each `Run`
//! starts a new generation; a run that finishes after it was cancelled, or
//! after a newer run started, does not touch the state.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures::FutureExt;
use orpc_ndr::{BString, UniquePtr, VariantBool};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{info, warn};

use super::protocol::JobStatus;
use super::server::JobServer;
use crate::dispatch::{CallContext, Reply};
use crate::types::{hresult, Result, StatusCode};

/// Days between the OLE Automation epoch (1899-12-30) and the Unix epoch
const OLE_UNIX_EPOCH_DAYS: f64 = 25569.0;
const SECONDS_PER_DAY: f64 = 86400.0;

/// OLE Automation date for `time`
pub fn ole_date(time: SystemTime) -> f64 {
    let seconds = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    OLE_UNIX_EPOCH_DAYS + seconds / SECONDS_PER_DAY
}

/// Failure text for work that panicked
fn panic_message(panic: &(dyn Any + Send)) -> String {
    match panic.downcast_ref::<&str>() {
        Some(message) => format!("job panicked: {}", message),
        None => match panic.downcast_ref::<String>() {
            Some(message) => format!("job panicked: {}", message),
            None => "job panicked".to_string(),
        },
    }
}

/// Cancellation request seen by running work
#[derive(Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the run is cancelled
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // The run settled without being cancelled.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// The work a job performs on each run
#[async_trait]
pub trait JobWork: Send + Sync + 'static {
    /// Perform one run. An `Err` fails the run and becomes its last error.
    async fn run(&self, cancel: CancelSignal) -> std::result::Result<(), String>;
}

struct RunState {
    status: JobStatus,
    generation: u64,
    cancel: Option<watch::Sender<bool>>,
    last_run: Option<SystemTime>,
    last_error: Option<String>,
}

struct Shared {
    name: String,
    work: Arc<dyn JobWork>,
    run: Mutex<RunState>,
    status: watch::Sender<JobStatus>,
}

#[derive(Clone)]
pub struct JobObject {
    shared: Arc<Shared>,
}

impl JobObject {
    pub fn new(name: impl Into<String>, work: impl JobWork) -> Self {
        let (status, _) = watch::channel(JobStatus::Idle);
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                work: Arc::new(work),
                run: Mutex::new(RunState {
                    status: JobStatus::Idle,
                    generation: 0,
                    cancel: None,
                    last_run: None,
                    last_error: None,
                }),
                status,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn status(&self) -> JobStatus {
        self.shared.run.lock().status
    }

    /// OLE Automation date of the latest run's start; 0.0 if never run
    pub fn last_run(&self) -> f64 {
        self.shared
            .run
            .lock()
            .last_run
            .map(ole_date)
            .unwrap_or_default()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.run.lock().last_error.clone()
    }

    /// Start a run in the background
    pub fn start(&self) -> std::result::Result<(), StatusCode> {
        let (generation, signal) = {
            let mut run = self.shared.run.lock();
            if run.status.is_running() {
                return Err(hresult::ALREADY_RUNNING);
            }
            let (cancel, rx) = watch::channel(false);
            run.generation += 1;
            run.status = JobStatus::Running;
            run.cancel = Some(cancel);
            run.last_run = Some(SystemTime::now());
            run.last_error = None;
            self.shared.status.send_replace(JobStatus::Running);
            (run.generation, CancelSignal { rx })
        };
        info!(job = %self.shared.name, generation, "job started");

        let job = self.clone();
        tokio::spawn(async move {
            let mut cancelled = signal.clone();
            let work = AssertUnwindSafe(job.shared.work.run(signal))
                .catch_unwind()
                .map(|outcome| outcome.unwrap_or_else(|panic| Err(panic_message(&*panic))));
            let outcome = tokio::select! {
                outcome = work => Some(outcome),
                _ = cancelled.cancelled() => None,
            };
            match outcome {
                Some(Ok(())) => {
                    job.settle(generation, JobStatus::Completed, None);
                }
                Some(Err(error)) => {
                    job.settle(generation, JobStatus::Failed, Some(error));
                }
                None => {}
            }
        });
        Ok(())
    }

    fn settle(&self, generation: u64, next: JobStatus, error: Option<String>) -> bool {
        let mut run = self.shared.run.lock();
        if run.generation != generation || !run.status.is_running() {
            return false;
        }
        run.status = next;
        run.cancel = None;
        if let Some(error) = &error {
            warn!(job = %self.shared.name, generation, %error, "job failed");
        } else {
            info!(job = %self.shared.name, generation, status = ?next, "job settled");
        }
        run.last_error = error;
        self.shared.status.send_replace(next);
        true
    }

    /// Cancel the current run. Outside `Running` this changes nothing and
    /// returns false.
    pub fn cancel(&self) -> bool {
        let mut run = self.shared.run.lock();
        if !run.status.is_running() {
            return false;
        }
        if let Some(cancel) = run.cancel.take() {
            cancel.send_replace(true);
        }
        run.status = JobStatus::Cancelled;
        self.shared.status.send_replace(JobStatus::Cancelled);
        info!(job = %self.shared.name, generation = run.generation, "job cancelled");
        true
    }

    /// Wait up to `timeout` for the job to leave `Running`; true if it has
    pub async fn wait(&self, timeout: Duration) -> bool {
        let mut status = self.shared.status.subscribe();
        let settled = async {
            loop {
                if !status.borrow_and_update().is_running() {
                    return true;
                }
                if status.changed().await.is_err() {
                    return false;
                }
            }
        };
        tokio::time::timeout(timeout, settled).await.unwrap_or(false)
    }
}

impl fmt::Debug for JobObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobObject")
            .field("name", &self.shared.name)
            .field("status", &self.status())
            .finish()
    }
}

#[async_trait]
impl JobServer for JobObject {
    async fn run(&self, _ctx: &CallContext) -> Result<Reply<()>> {
        Ok(self.start().into())
    }

    async fn wait_for_completion(
        &self,
        ctx: &CallContext,
        seconds: i32,
    ) -> Result<Reply<VariantBool>> {
        let timeout = match ctx.wait_bound(seconds) {
            Ok(timeout) => timeout,
            Err(status) => return Ok(Reply::failed(status)),
        };
        Ok(Reply::ok(VariantBool(self.wait(timeout).await)))
    }

    async fn cancel(&self, _ctx: &CallContext) -> Result<Reply<()>> {
        JobObject::cancel(self);
        Ok(Reply::ok(()))
    }

    async fn status(&self, _ctx: &CallContext) -> Result<Reply<JobStatus>> {
        Ok(Reply::ok(JobObject::status(self)))
    }

    async fn last_run(&self, _ctx: &CallContext) -> Result<Reply<f64>> {
        Ok(Reply::ok(JobObject::last_run(self)))
    }

    async fn last_error(&self, _ctx: &CallContext) -> Result<Reply<UniquePtr<BString>>> {
        let error = JobObject::last_error(self).map(BString::from);
        Ok(Reply::ok(UniquePtr::from_option(error)))
    }
}
