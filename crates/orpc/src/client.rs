//! Invocation client
//!
//! A [`Connection`] turns typed operations into calls on an
//! [`ObjectReference`]: it frames the request, sends it through the
//! transport, and decodes the response. A nonzero status in a well-formed
//! response comes back as [`Outcome::Failed`] together with the decoded
//! out-parameters, never as an `Err`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use orpc_ndr::NdrContext;
use tracing::{debug, trace};

use crate::dispatch::{InterfaceDescriptor, Operation};
use crate::envelope::{decode_response, encode_request};
use crate::reference::ObjectReference;
use crate::transport::{ConnectionId, OutboundCall, Transport};
use crate::types::{
    ComVersion, Failure, InterfacePointer, Ipid, OrpcError, OrpcThis, Result, StatusCode,
};

/// Configuration for a client connection
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Bound on each round trip; `None` waits as long as the transport does
    pub call_timeout: Option<Duration>,
    pub com_version: ComVersion,
    /// Byte order of outgoing requests
    pub ndr: NdrContext,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            call_timeout: Some(Duration::from_secs(60)),
            com_version: ComVersion::default(),
            ndr: NdrContext::new(),
        }
    }
}

/// Result of a call that reached the object and got a well-formed reply
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<R> {
    Success(R),
    /// Nonzero status; `partial` holds the out-parameters as decoded
    Failed { failure: Failure, partial: R },
}

impl<R> Outcome<R> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failed { failure, .. } => Some(failure),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.failure().map(|f| f.code).unwrap_or_default()
    }

    /// Out-parameters, whatever the status
    pub fn value(&self) -> &R {
        match self {
            Outcome::Success(value) => value,
            Outcome::Failed { partial, .. } => partial,
        }
    }

    pub fn into_value(self) -> R {
        match self {
            Outcome::Success(value) => value,
            Outcome::Failed { partial, .. } => partial,
        }
    }

    /// Treat a failure status as an error
    pub fn into_result(self) -> Result<R> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failed { failure, .. } => Err(OrpcError::Failure(failure)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(R) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failed { failure, partial } => Outcome::Failed {
                failure,
                partial: f(partial),
            },
        }
    }
}

/// Client side of one transport connection
#[derive(Clone)]
pub struct Connection {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl Connection {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn builder(transport: Arc<dyn Transport>) -> ConnectionBuilder {
        ConnectionBuilder {
            transport,
            config: ClientConfig::default(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.transport.connection_id()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Reference to `ipid` on this connection
    pub fn bind(&self, descriptor: &'static InterfaceDescriptor, ipid: Ipid) -> ObjectReference {
        ObjectReference::new(self.id(), descriptor, ipid)
    }

    /// Reference from a marshaled interface pointer received on this
    /// connection
    pub fn unmarshal(
        &self,
        pointer: &InterfacePointer,
        descriptor: &'static InterfaceDescriptor,
    ) -> Result<ObjectReference> {
        let objref = pointer.objref();
        if objref.iid != descriptor.id.uuid {
            return Err(OrpcError::InterfaceMismatch {
                ipid: objref.std.ipid,
                requested: descriptor.id,
            });
        }
        Ok(self.bind(descriptor, objref.std.ipid))
    }

    /// Invoke `O` on `target`.
    ///
    /// Binding errors are detected before anything is sent: no target,
    /// a target from another connection, or a target whose interface does
    /// not derive from the one declaring `O`.
    pub async fn invoke<O: Operation>(
        &self,
        target: Option<&ObjectReference>,
        request: &O::Request,
    ) -> Result<Outcome<O::Response>> {
        let target = target.ok_or_else(|| OrpcError::MissingBinding { operation: O::name() })?;

        let connection = self.id();
        if target.connection() != connection {
            return Err(OrpcError::ConnectionMismatch {
                expected: connection,
                actual: target.connection(),
            });
        }
        if !target.descriptor().derives_from(&O::INTERFACE.id.uuid) {
            return Err(OrpcError::InterfaceMismatch {
                ipid: target.ipid(),
                requested: O::INTERFACE.id,
            });
        }

        let this = OrpcThis::new().with_version(self.config.com_version);
        trace!(
            operation = %O::name(),
            ipid = %target.ipid(),
            opnum = O::OPNUM,
            causality = %this.causality_id,
            "invoking"
        );

        let ndr = self.config.ndr;
        let call = OutboundCall {
            interface: target.interface(),
            ipid: target.ipid(),
            opnum: O::OPNUM,
            ndr,
            stub: encode_request(&this, request, ndr)?,
        };

        let stub = match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.call(call))
                .await
                .map_err(|_| OrpcError::Timeout(limit))??,
            None => self.transport.call(call).await?,
        };

        let response = decode_response::<O::Response>(stub, ndr)?;
        if response.status.is_success() {
            return Ok(Outcome::Success(response.body));
        }

        let failure = Failure::new(
            response.status,
            O::INTERFACE.name,
            O::INTERFACE.id.major,
            O::MEMBER,
        );
        debug!(operation = %O::name(), status = %response.status, "call returned failure");
        Ok(Outcome::Failed {
            failure,
            partial: response.body,
        })
    }
}

/// A connection and, once bound, the reference calls go to.
///
/// Typed clients wrap one of these.
#[derive(Clone)]
pub struct ObjectClient {
    connection: Connection,
    descriptor: &'static InterfaceDescriptor,
    reference: Option<ObjectReference>,
}

impl ObjectClient {
    /// Client with no object bound yet
    pub fn new(connection: Connection, descriptor: &'static InterfaceDescriptor) -> Self {
        Self {
            connection,
            descriptor,
            reference: None,
        }
    }

    pub fn bound(connection: Connection, reference: ObjectReference) -> Self {
        Self {
            connection,
            descriptor: reference.descriptor(),
            reference: Some(reference),
        }
    }

    pub fn unmarshal(
        connection: Connection,
        pointer: &InterfacePointer,
        descriptor: &'static InterfaceDescriptor,
    ) -> Result<Self> {
        let reference = connection.unmarshal(pointer, descriptor)?;
        Ok(Self::bound(connection, reference))
    }

    /// Copy of this client bound to `ipid` on the same connection
    pub fn ipid(&self, ipid: Ipid) -> Self {
        let reference = match &self.reference {
            Some(reference) => reference.rebind(ipid),
            None => self.connection.bind(self.descriptor, ipid),
        };
        Self {
            reference: Some(reference),
            ..self.clone()
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn descriptor(&self) -> &'static InterfaceDescriptor {
        self.descriptor
    }

    pub fn reference(&self) -> Option<&ObjectReference> {
        self.reference.as_ref()
    }

    pub async fn invoke<O: Operation>(&self, request: &O::Request) -> Result<Outcome<O::Response>> {
        self.connection
            .invoke::<O>(self.reference.as_ref(), request)
            .await
    }
}

impl fmt::Debug for ObjectClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectClient")
            .field("interface", &self.descriptor.name)
            .field("reference", &self.reference)
            .finish()
    }
}

/// Builder for [`Connection`]
pub struct ConnectionBuilder {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl ConnectionBuilder {
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    pub fn com_version(mut self, version: ComVersion) -> Self {
        self.config.com_version = version;
        self
    }

    pub fn byte_order(mut self, ndr: NdrContext) -> Self {
        self.config.ndr = ndr;
        self
    }

    pub fn build(self) -> Connection {
        Connection::with_config(self.transport, self.config)
    }
}
