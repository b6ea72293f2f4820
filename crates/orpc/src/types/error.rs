//! Substrate error types

use std::time::Duration;

use thiserror::Error;

use super::identifiers::{InterfaceId, Ipid};
use super::status::Failure;
use crate::transport::ConnectionId;

/// Result type for substrate operations
pub type Result<T> = std::result::Result<T, OrpcError>;

/// Errors that end a call without a well-formed response.
///
/// A nonzero status in a well-formed response is not one of these; it is
/// returned as [`Outcome::Failed`](crate::Outcome::Failed). The
/// [`Failure`](OrpcError::Failure) variant exists for callers that convert
/// an outcome into a `Result` on purpose.
#[derive(Error, Debug)]
pub enum OrpcError {
    /// Malformed message
    #[error("codec error: {0}")]
    Codec(#[from] orpc_ndr::NdrError),

    /// Opnum not served anywhere in the interface chain
    #[error("unknown operation {opnum} on {interface}")]
    UnknownOperation { interface: &'static str, opnum: u16 },

    /// No object is exported under the IPID
    #[error("unknown object: {0}")]
    UnknownObject(Ipid),

    /// The object behind an IPID does not implement the requested interface
    #[error("interface {requested} not implemented by {ipid}")]
    InterfaceMismatch { ipid: Ipid, requested: InterfaceId },

    /// Call made without a bound object reference
    #[error("missing object binding for {operation}")]
    MissingBinding { operation: String },

    /// Object reference bound to a different connection
    #[error("object reference belongs to connection {actual}, call made on {expected}")]
    ConnectionMismatch {
        expected: ConnectionId,
        actual: ConnectionId,
    },

    /// Malformed OBJREF
    #[error("invalid OBJREF: {0}")]
    InvalidObjRef(String),

    /// Dispatch table construction error
    #[error("invalid dispatch table: {0}")]
    InvalidTable(String),

    /// Reference counting error
    #[error("reference counting error: {0}")]
    RefCount(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// No response within the configured call timeout
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// Protocol status failure converted on request
    #[error("{0}")]
    Failure(Failure),
}

impl From<Failure> for OrpcError {
    fn from(failure: Failure) -> Self {
        OrpcError::Failure(failure)
    }
}
