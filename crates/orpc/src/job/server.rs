use std::sync::Arc;

use async_trait::async_trait;
use orpc_ndr::{BString, UniquePtr, VariantBool};

use super::protocol::{Cancel, JobStatus, LastError, LastRun, Run, Status, WaitForCompletion, IJOB};
use crate::dispatch::well_known::idispatch_table;
use crate::dispatch::{CallContext, DispatchTable, Reply};
use crate::types::Result;

/// `IJob` implementation
#[async_trait]
pub trait JobServer: Send + Sync + 'static {
    async fn run(&self, ctx: &CallContext) -> Result<Reply<()>>;

    async fn wait_for_completion(
        &self,
        ctx: &CallContext,
        seconds: i32,
    ) -> Result<Reply<VariantBool>>;

    async fn cancel(&self, ctx: &CallContext) -> Result<Reply<()>>;

    async fn status(&self, ctx: &CallContext) -> Result<Reply<JobStatus>>;

    async fn last_run(&self, ctx: &CallContext) -> Result<Reply<f64>>;

    async fn last_error(&self, ctx: &CallContext) -> Result<Reply<UniquePtr<BString>>>;
}

/// Dispatch table serving `IJob` from `server`
pub fn job_table<S: JobServer>(server: Arc<S>) -> Result<Arc<DispatchTable>> {
    let run = server.clone();
    let wait = server.clone();
    let cancel = server.clone();
    let status = server.clone();
    let last_run = server.clone();
    let last_error = server;

    DispatchTable::builder(&IJOB)
        .inherits(idispatch_table()?)
        .operation::<Run, _, _>(move |ctx, ()| {
            let server = run.clone();
            async move { server.run(&ctx).await }
        })
        .operation::<WaitForCompletion, _, _>(move |ctx, seconds| {
            let server = wait.clone();
            async move { server.wait_for_completion(&ctx, seconds).await }
        })
        .operation::<Cancel, _, _>(move |ctx, ()| {
            let server = cancel.clone();
            async move { server.cancel(&ctx).await }
        })
        .operation::<Status, _, _>(move |ctx, ()| {
            let server = status.clone();
            async move { server.status(&ctx).await }
        })
        .operation::<LastRun, _, _>(move |ctx, ()| {
            let server = last_run.clone();
            async move { server.last_run(&ctx).await }
        })
        .operation::<LastError, _, _>(move |ctx, ()| {
            let server = last_error.clone();
            async move { server.last_error(&ctx).await }
        })
        .build()
}
