//! Job Runner
//!
//! Exports a committable collection of jobs, then drives them through the
//! client side of a loopback connection: enumerate, run, optionally cancel
//! one, wait, and report.
//!
//! USAGE:
//!   job-runner [OPTIONS]
//!
//! EXAMPLES:
//!   job-runner                           # Three jobs, five steps each
//!   job-runner --jobs 5 --step-ms 50     # More, faster jobs
//!   job-runner --cancel 2                # Cancel the second job mid-run
//!   job-runner --fail 1 -v               # First job fails, debug logging

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use orpc::collection::{
    committable_collection_table, CollectionObject, CommitOptions, CommittableCollectionClient,
};
use orpc::job::{job_table, CancelSignal, JobClient, JobObject, JobStatus, JobWork};
use orpc::{Connection, InterfacePointer, ObjectServer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "job-runner")]
#[command(version)]
#[command(about = "Runs a collection of long-running jobs through the object RPC client")]
struct Args {
    /// Number of jobs in the collection
    #[arg(long, default_value_t = 3)]
    jobs: u32,

    /// Steps each job performs
    #[arg(long, default_value_t = 5)]
    steps: u32,

    /// Duration of one step in milliseconds
    #[arg(long, default_value_t = 100)]
    step_ms: u64,

    /// 1-based index of a job to cancel after its first step
    #[arg(long, value_name = "INDEX")]
    cancel: Option<i32>,

    /// 1-based index of a job that fails on its last step
    #[arg(long, value_name = "INDEX")]
    fail: Option<u32>,

    /// Seconds to wait for each job
    #[arg(long, default_value_t = 30)]
    wait: i32,

    /// Verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

/// Sleeps through a number of steps, optionally failing on the last
struct Steps {
    steps: u32,
    step: Duration,
    fail: bool,
}

#[async_trait]
impl JobWork for Steps {
    async fn run(&self, mut cancel: CancelSignal) -> Result<(), String> {
        for step in 1..=self.steps {
            tokio::select! {
                _ = tokio::time::sleep(self.step) => {}
                _ = cancel.cancelled() => return Ok(()),
            }
            if self.fail && step == self.steps {
                return Err(format!("step {} of {} failed", step, self.steps));
            }
        }
        Ok(())
    }
}

fn export_jobs(server: &ObjectServer, args: &Args) -> orpc::Result<Vec<InterfacePointer>> {
    (1..=args.jobs)
        .map(|index| {
            let job = JobObject::new(
                format!("job-{}", index),
                Steps {
                    steps: args.steps,
                    step: Duration::from_millis(args.step_ms),
                    fail: args.fail == Some(index),
                },
            );
            server.export_pointer(job_table(Arc::new(job))?)
        })
        .collect()
}

async fn report(index: usize, job: &JobClient) -> orpc::Result<JobStatus> {
    let status = job.status().await?.into_result()?;
    let last_run = job.last_run().await?.into_result()?;
    match job.last_error().await?.into_result()? {
        Some(error) => warn!("job {}: {:?} (last run {:.6}): {}", index, status, last_run, error),
        None => info!("job {}: {:?} (last run {:.6})", index, status, last_run),
    }
    Ok(status)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let server = ObjectServer::builder().build()?;
    let jobs = CollectionObject::complete(export_jobs(&server, &args)?);
    let pointer =
        server.export_pointer(committable_collection_table::<InterfacePointer, _>(jobs)?)?;
    info!("Exported {} jobs", args.jobs);

    let connection = Connection::new(server.loopback());
    let collection =
        CommittableCollectionClient::<InterfacePointer>::unmarshal(connection.clone(), &pointer)?;

    // Run from the committed snapshot
    let snapshot = collection
        .commit(CommitOptions::None)
        .await?
        .into_result()?
        .ok_or("commit returned no collection")?;
    let clients = snapshot
        .items()
        .await?
        .iter()
        .map(|item| JobClient::unmarshal(connection.clone(), item))
        .collect::<orpc::Result<Vec<_>>>()?;

    for job in &clients {
        job.run().await?.into_result()?;
    }
    info!("Started {} jobs", clients.len());

    if let Some(index) = args.cancel {
        let target = usize::try_from(index - 1)
            .ok()
            .and_then(|i| clients.get(i))
            .ok_or_else(|| format!("no job {} to cancel", index))?;
        tokio::time::sleep(Duration::from_millis(args.step_ms)).await;
        target.cancel().await?.into_result()?;
        info!("Cancelled job {}", index);
    }

    let mut completed = 0;
    for (i, job) in clients.iter().enumerate() {
        let settled = job.wait_for_completion(args.wait).await?.into_result()?;
        if !settled {
            warn!("job {} still running after {}s", i + 1, args.wait);
        }
        if report(i + 1, job).await? == JobStatus::Completed {
            completed += 1;
        }
    }

    let stats = server.stats();
    info!(
        "{} of {} jobs completed; {} calls processed, {} failed",
        completed,
        clients.len(),
        stats.calls_processed,
        stats.calls_failed
    );
    Ok(())
}
