//! Transport seam
//!
//! The substrate does not own sockets. A [`Transport`] carries one encoded
//! request to the object exporter and hands back the encoded response.
//! [`LoopbackTransport`] delivers calls to an in-process [`ObjectServer`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use orpc_ndr::NdrContext;
use tracing::trace;

use crate::server::ObjectServer;
use crate::types::{InterfaceId, Ipid, Result};

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// Identifies one physical connection
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        Self(NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// One encoded request on its way to an object
#[derive(Clone, Debug)]
pub struct OutboundCall {
    /// Interface the target reference is bound to
    pub interface: InterfaceId,
    pub ipid: Ipid,
    pub opnum: u16,
    /// Data representation of `stub`; the response uses the same one
    pub ndr: NdrContext,
    /// ORPCTHIS followed by the request parameters
    pub stub: Bytes,
}

/// Request/response carrier between a client and an object exporter
#[async_trait]
pub trait Transport: Send + Sync {
    fn connection_id(&self) -> ConnectionId;

    /// Deliver a request and wait for its response stub
    async fn call(&self, call: OutboundCall) -> Result<Bytes>;
}

/// In-process transport straight into an [`ObjectServer`]
pub struct LoopbackTransport {
    id: ConnectionId,
    server: Arc<ObjectServer>,
}

impl LoopbackTransport {
    pub fn new(server: Arc<ObjectServer>) -> Self {
        Self {
            id: ConnectionId::next(),
            server,
        }
    }

    pub fn server(&self) -> &Arc<ObjectServer> {
        &self.server
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    fn connection_id(&self) -> ConnectionId {
        self.id
    }

    async fn call(&self, call: OutboundCall) -> Result<Bytes> {
        trace!(
            connection = %self.id,
            ipid = %call.ipid,
            opnum = call.opnum,
            stub_len = call.stub.len(),
            "loopback call"
        );
        self.server.handle(self.id, call).await
    }
}
