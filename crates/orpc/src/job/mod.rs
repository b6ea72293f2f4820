//! Long-running jobs
//!
//! `Idle -> Running -> {Completed, Cancelled, Failed}`, driven by `Run` and
//! `Cancel` and observed with `Status` or a bounded `WaitForCompletion`.

mod client;
mod object;
mod protocol;
mod server;

pub use client::JobClient;
pub use object::{ole_date, CancelSignal, JobObject, JobWork};
pub use protocol::{Cancel, JobStatus, LastError, LastRun, Run, Status, WaitForCompletion, IJOB};
pub use server::{job_table, JobServer};
