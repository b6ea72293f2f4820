//! Per-call server context and handler replies

use std::sync::Arc;
use std::time::Duration;

use orpc_ndr::{NdrContext, Uuid};

use crate::exporter::ObjectExporter;
use crate::transport::ConnectionId;
use crate::types::{
    hresult, InterfaceId, InterfacePointer, Ipid, Oid, OrpcExtentArray, Result, StatusCode,
};

use super::table::DispatchTable;

/// What a handler knows about the call it is serving
#[derive(Clone)]
pub struct CallContext {
    pub connection: ConnectionId,
    /// Target interface pointer
    pub ipid: Ipid,
    /// Object behind `ipid`
    pub oid: Oid,
    /// Interface the caller's reference is bound to
    pub interface: InterfaceId,
    pub causality_id: Uuid,
    /// ORPCTHIS extensions, passed through untouched
    pub extensions: Option<OrpcExtentArray>,
    /// Data representation of the call; the response uses it too
    pub ndr: NdrContext,
    pub exporter: Arc<ObjectExporter>,
    /// Upper bound for any blocking wait the call performs
    pub max_wait: Duration,
}

impl CallContext {
    pub fn new(
        connection: ConnectionId,
        ipid: Ipid,
        oid: Oid,
        interface: InterfaceId,
        exporter: Arc<ObjectExporter>,
    ) -> Self {
        Self {
            connection,
            ipid,
            oid,
            interface,
            causality_id: Uuid::NIL,
            extensions: None,
            ndr: NdrContext::new(),
            exporter,
            max_wait: Duration::from_secs(300),
        }
    }

    /// Turn a caller-supplied wait in seconds into a bounded duration.
    ///
    /// Negative values are rejected with `E_INVALIDARG`; anything longer
    /// than `max_wait` is clamped to it.
    pub fn wait_bound(&self, seconds: i32) -> std::result::Result<Duration, StatusCode> {
        let seconds = u64::try_from(seconds).map_err(|_| hresult::E_INVALIDARG)?;
        Ok(Duration::from_secs(seconds).min(self.max_wait))
    }

    /// Export a new object and marshal a pointer to it for the caller
    pub fn export(&self, table: Arc<DispatchTable>) -> Result<InterfacePointer> {
        let exported = self.exporter.export(table);
        self.exporter.marshal(&exported.ipid)
    }
}

/// Out-parameters and status produced by a handler
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<R> {
    pub body: R,
    pub status: StatusCode,
}

impl<R> Reply<R> {
    pub fn ok(body: R) -> Self {
        Self {
            body,
            status: hresult::S_OK,
        }
    }

    /// Reply with a status and whatever out-parameters are meaningful
    /// alongside it
    pub fn with_status(body: R, status: StatusCode) -> Self {
        Self { body, status }
    }
}

impl<R: Default> Reply<R> {
    pub fn failed(status: StatusCode) -> Self {
        Self {
            body: R::default(),
            status,
        }
    }
}

impl<R> From<std::result::Result<R, StatusCode>> for Reply<R>
where
    R: Default,
{
    fn from(result: std::result::Result<R, StatusCode>) -> Self {
        match result {
            Ok(body) => Self::ok(body),
            Err(status) => Self::failed(status),
        }
    }
}
