//! Core wire types
//!
//! - Identifiers: OXID, OID, IPID, interface ids
//! - Status codes and failures
//! - Object references: OBJREF, STDOBJREF, embedded interface pointers
//! - ORPC envelope: ORPCTHIS, ORPCTHAT

mod error;
mod identifiers;
mod objref;
mod orpc;
mod status;
mod stdobjref;

pub use error::{OrpcError, Result};
pub use identifiers::{InterfaceId, Ipid, Oid, Oxid};
pub use objref::{objref_flags, InterfacePointer, ObjRef, OBJREF_SIGNATURE};
pub use orpc::{extent_ids, ComVersion, OrpcExtent, OrpcExtentArray, OrpcThat, OrpcThis};
pub use status::{hresult, operation_name, Failure, StatusCode};
pub use stdobjref::{flags as sorf, StdObjRef};

/// Well-known interface UUIDs
pub mod iid {
    use orpc_ndr::Uuid;

    pub const IUNKNOWN: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_c000_0000_0000_0046);
    pub const IDISPATCH: Uuid = Uuid::from_u128(0x0002_0400_0000_0000_c000_0000_0000_0046);
    pub const IREMUNKNOWN: Uuid = Uuid::from_u128(0x0000_0131_0000_0000_c000_0000_0000_0046);
}
