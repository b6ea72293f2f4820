//! Object server
//!
//! Owns an [`ObjectExporter`] and turns inbound calls into dispatches:
//! resolve the IPID, check the interface, decode ORPCTHIS, and hand the
//! rest of the stub to the object's dispatch table.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};

use crate::dispatch::{CallContext, DispatchTable};
use crate::envelope::open_request;
use crate::exporter::{ExportedObject, ObjectExporter, DEFAULT_PUBLIC_REFS};
use crate::remunknown::remunknown_table;
use crate::transport::{ConnectionId, LoopbackTransport, OutboundCall};
use crate::types::{InterfacePointer, Ipid, OrpcError, Result};

/// Object server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Upper bound for any `WaitForCompletion` a handler performs
    pub max_wait: Duration,
    /// Public references granted with each marshaled interface pointer
    pub public_refs: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(300),
            public_refs: DEFAULT_PUBLIC_REFS,
        }
    }
}

/// Server statistics
#[derive(Debug, Default)]
pub struct ServerStats {
    pub calls_received: AtomicU64,
    pub calls_processed: AtomicU64,
    pub calls_failed: AtomicU64,
    pub objects_exported: AtomicU64,
    pub objects_released: AtomicU64,
}

impl ServerStats {
    pub fn snapshot(&self) -> ServerStatsSnapshot {
        ServerStatsSnapshot {
            calls_received: self.calls_received.load(Ordering::Relaxed),
            calls_processed: self.calls_processed.load(Ordering::Relaxed),
            calls_failed: self.calls_failed.load(Ordering::Relaxed),
            objects_exported: self.objects_exported.load(Ordering::Relaxed),
            objects_released: self.objects_released.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of server statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerStatsSnapshot {
    pub calls_received: u64,
    pub calls_processed: u64,
    pub calls_failed: u64,
    pub objects_exported: u64,
    pub objects_released: u64,
}

/// Object server
///
/// Calls are handled independently and concurrently; the server does not
/// serialize calls to one object.
pub struct ObjectServer {
    exporter: Arc<ObjectExporter>,
    config: ServerConfig,
    stats: Arc<ServerStats>,
}

impl ObjectServer {
    pub fn new() -> Result<Self> {
        Self::with_config(ServerConfig::default())
    }

    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    pub fn with_config(config: ServerConfig) -> Result<Self> {
        let stats = Arc::new(ServerStats::default());
        let exporter = Arc::new(ObjectExporter::with_config(config.public_refs, stats.clone()));
        exporter.install_remunknown(remunknown_table()?);

        info!(
            oxid = %exporter.oxid(),
            remunknown = %exporter.remunknown_ipid(),
            "object server ready"
        );

        Ok(Self {
            exporter,
            config,
            stats,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn exporter(&self) -> &Arc<ObjectExporter> {
        &self.exporter
    }

    pub fn remunknown_ipid(&self) -> Ipid {
        self.exporter.remunknown_ipid()
    }

    pub fn stats(&self) -> ServerStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn export(&self, table: Arc<DispatchTable>) -> ExportedObject {
        self.exporter.export(table)
    }

    /// Export an object and marshal a pointer to it
    pub fn export_pointer(&self, table: Arc<DispatchTable>) -> Result<InterfacePointer> {
        let exported = self.exporter.export(table);
        self.exporter.marshal(&exported.ipid)
    }

    /// In-process transport into this server
    pub fn loopback(self: &Arc<Self>) -> Arc<LoopbackTransport> {
        Arc::new(LoopbackTransport::new(self.clone()))
    }

    /// Handle one inbound call
    pub async fn handle(&self, connection: ConnectionId, call: OutboundCall) -> Result<Bytes> {
        self.stats.calls_received.fetch_add(1, Ordering::Relaxed);

        let result = self.dispatch(connection, call).await;
        match &result {
            Ok(_) => {
                self.stats.calls_processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.stats.calls_failed.fetch_add(1, Ordering::Relaxed);
                debug!(%connection, error = %err, "call failed");
            }
        }
        result
    }

    async fn dispatch(&self, connection: ConnectionId, call: OutboundCall) -> Result<Bytes> {
        let binding = self
            .exporter
            .lookup(&call.ipid)
            .ok_or(OrpcError::UnknownObject(call.ipid))?;

        let node = binding
            .table
            .node(&call.interface.uuid)
            .ok_or(OrpcError::InterfaceMismatch {
                ipid: call.ipid,
                requested: call.interface,
            })?;

        let (this, reader) = open_request(call.stub, call.ndr)?;
        debug!(
            %connection,
            ipid = %call.ipid,
            interface = %node.descriptor().name,
            opnum = call.opnum,
            causality = %this.causality_id,
            "call received"
        );

        let ctx = CallContext {
            connection,
            ipid: call.ipid,
            oid: binding.oid,
            interface: call.interface,
            causality_id: this.causality_id,
            extensions: this.extensions.into_option(),
            ndr: call.ndr,
            exporter: self.exporter.clone(),
            max_wait: self.config.max_wait,
        };

        node.dispatch(ctx, call.opnum, reader).await
    }
}

/// Builder for [`ObjectServer`]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config: ServerConfig,
}

impl ServerBuilder {
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.config.max_wait = max_wait;
        self
    }

    pub fn public_refs(mut self, refs: u32) -> Self {
        self.config.public_refs = refs;
        self
    }

    pub fn build(self) -> Result<Arc<ObjectServer>> {
        ObjectServer::with_config(self.config).map(Arc::new)
    }
}
