//! IRemUnknown server implementation
//!
//! Serves remote reference counting for every object of the exporter it is
//! installed in. It is reached through the exporter's `remunknown_ipid`.

use std::sync::Arc;

use orpc_ndr::{ConformantArray, UniquePtr};
use tracing::debug;

use super::protocol::{
    RemAddRef, RemQiResult, RemQueryInterface, RemQueryInterfaceRequest, RemRefsRequest,
    RemRelease, IREMUNKNOWN,
};
use crate::dispatch::well_known::iunknown_table;
use crate::dispatch::{CallContext, DispatchTable, Reply};
use crate::types::{hresult, OrpcError, Result, StatusCode};

fn status_of(err: &OrpcError) -> StatusCode {
    match err {
        OrpcError::UnknownObject(_) => hresult::CO_E_OBJNOTCONNECTED,
        OrpcError::InterfaceMismatch { .. } => hresult::E_NOINTERFACE,
        _ => hresult::E_FAIL,
    }
}

async fn query_interface(
    ctx: CallContext,
    request: RemQueryInterfaceRequest,
) -> Result<Reply<UniquePtr<ConformantArray<RemQiResult>>>> {
    if usize::from(request.count) != request.iids.len() {
        return Ok(Reply::failed(hresult::E_INVALIDARG));
    }
    if ctx.exporter.lookup_ipid(&request.ipid).is_none() {
        return Ok(Reply::failed(hresult::CO_E_OBJNOTCONNECTED));
    }

    let results: Vec<RemQiResult> = request
        .iids
        .elements
        .iter()
        .map(|iid| match ctx.exporter.query_interface(&request.ipid, iid, request.refs) {
            Ok(std) => RemQiResult::success(std),
            Err(err) => {
                debug!(ipid = %request.ipid, %iid, error = %err, "RemQueryInterface entry failed");
                RemQiResult::failure(status_of(&err))
            }
        })
        .collect();

    let status = if results.iter().all(|r| r.hresult.is_success()) {
        hresult::S_OK
    } else if results.iter().any(|r| r.hresult.is_success()) {
        hresult::S_FALSE
    } else {
        hresult::E_NOINTERFACE
    };

    Ok(Reply::with_status(
        UniquePtr::new(ConformantArray::new(results)),
        status,
    ))
}

async fn add_ref(
    ctx: CallContext,
    request: RemRefsRequest,
) -> Result<Reply<ConformantArray<StatusCode>>> {
    if usize::from(request.count) != request.refs.len() {
        return Ok(Reply::failed(hresult::E_INVALIDARG));
    }

    let results: Vec<StatusCode> = request
        .refs
        .elements
        .iter()
        .map(|r| match ctx.exporter.add_refs(&r.ipid, r.public_refs) {
            Ok(_) => hresult::S_OK,
            Err(err) => status_of(&err),
        })
        .collect();

    let status = if results.iter().all(|s| s.is_success()) {
        hresult::S_OK
    } else {
        hresult::E_INVALIDARG
    };
    Ok(Reply::with_status(ConformantArray::new(results), status))
}

async fn release(ctx: CallContext, request: RemRefsRequest) -> Result<Reply<()>> {
    if usize::from(request.count) != request.refs.len() {
        return Ok(Reply::failed(hresult::E_INVALIDARG));
    }

    let mut status = hresult::S_OK;
    for r in &request.refs.elements {
        if let Err(err) = ctx.exporter.release_refs(&r.ipid, r.public_refs) {
            debug!(ipid = %r.ipid, error = %err, "RemRelease entry failed");
            status = hresult::E_INVALIDARG;
        }
    }
    Ok(Reply::with_status((), status))
}

/// Dispatch table for `IRemUnknown`
pub fn remunknown_table() -> Result<Arc<DispatchTable>> {
    DispatchTable::builder(&IREMUNKNOWN)
        .inherits(iunknown_table()?)
        .operation::<RemQueryInterface, _, _>(query_interface)
        .operation::<RemAddRef, _, _>(add_ref)
        .operation::<RemRelease, _, _>(release)
        .build()
}
