//! Object references
//!
//! An [`ObjectReference`] is a capability value: the connection a call goes
//! out on, the interface it speaks, and the IPID of the remote instance. It
//! owns nothing on the server; releasing the remote object is an explicit
//! `RemRelease` call.

use std::fmt;

use crate::dispatch::InterfaceDescriptor;
use crate::transport::ConnectionId;
use crate::types::{InterfaceId, Ipid};

#[derive(Clone, Copy)]
pub struct ObjectReference {
    connection: ConnectionId,
    descriptor: &'static InterfaceDescriptor,
    ipid: Ipid,
}

impl ObjectReference {
    pub fn new(
        connection: ConnectionId,
        descriptor: &'static InterfaceDescriptor,
        ipid: Ipid,
    ) -> Self {
        Self {
            connection,
            descriptor,
            ipid,
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn interface(&self) -> InterfaceId {
        self.descriptor.id
    }

    pub fn descriptor(&self) -> &'static InterfaceDescriptor {
        self.descriptor
    }

    pub fn ipid(&self) -> Ipid {
        self.ipid
    }

    /// Same connection and interface, different instance.
    ///
    /// `self` is left untouched.
    pub fn rebind(&self, ipid: Ipid) -> Self {
        Self { ipid, ..*self }
    }
}

impl PartialEq for ObjectReference {
    fn eq(&self, other: &Self) -> bool {
        self.connection == other.connection
            && self.descriptor.id == other.descriptor.id
            && self.ipid == other.ipid
    }
}

impl Eq for ObjectReference {}

impl fmt::Debug for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectReference")
            .field("connection", &self.connection)
            .field("interface", &self.descriptor.name)
            .field("ipid", &self.ipid)
            .finish()
    }
}
