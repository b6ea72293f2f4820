//! Object RPC substrate
//!
//! Invokes methods on remote, versioned interfaces that derive from one
//! another, in the style of DCOM over DCE RPC. Physical transports plug in
//! through [`transport::Transport`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Typed clients              │  Typed servers                │
//! │  - CollectionClient<T>      │  - CollectionServer<T>        │
//! │  - JobClient                │  - JobServer                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Invocation client          │  Object server                │
//! │  - Connection / Outcome     │  - ObjectExporter (OID/IPID)  │
//! │  - ObjectReference          │  - DispatchTable chains       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Call envelope: ORPCTHIS | params    ORPCTHAT | out | status│
//! ├─────────────────────────────────────────────────────────────┤
//! │                  NDR codec (orpc-ndr crate)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`]: identifiers, status codes, OBJREF and ORPC envelope types
//! - [`envelope`]: request and response framing
//! - [`dispatch`]: interface descriptors, typed operations, dispatch tables
//! - [`exporter`]: exported objects and their public reference counts
//! - [`remunknown`]: `IRemUnknown` (remote QueryInterface and refcounting)
//! - [`client`] / [`server`]: the two ends of a call
//! - [`collection`]: enumerable, mutable and committable collections
//! - [`job`]: long-running jobs with run, cancel and wait

pub mod client;
pub mod collection;
pub mod dispatch;
pub mod envelope;
pub mod exporter;
pub mod job;
pub mod reference;
pub mod remunknown;
pub mod server;
pub mod transport;
pub mod types;

pub use client::{ClientConfig, Connection, ConnectionBuilder, ObjectClient, Outcome};
pub use dispatch::{CallContext, DispatchTable, InterfaceDescriptor, Operation, Reply};
pub use reference::ObjectReference;
pub use server::{ObjectServer, ServerBuilder, ServerConfig, ServerStatsSnapshot};
pub use transport::{ConnectionId, LoopbackTransport, OutboundCall, Transport};
pub use types::{
    hresult, ComVersion, Failure, InterfaceId, InterfacePointer, Ipid, Oid, OrpcError, Oxid,
    Result, StatusCode,
};

/// COM version sent in ORPCTHIS by default
pub const COM_VERSION: ComVersion = ComVersion::DCOM_5_7;
