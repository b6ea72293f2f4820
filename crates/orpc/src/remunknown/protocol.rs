//! IRemUnknown wire protocol (MS-DCOM 3.1.1.5.6)
//!
//! Parameter lists as they appear after ORPCTHIS / before the status.

use orpc_ndr::{ndr_struct, ConformantArray, UniquePtr, Uuid};

use crate::dispatch::well_known::IUNKNOWN;
use crate::dispatch::InterfaceDescriptor;
use crate::types::{iid, InterfaceId, Ipid, OrpcError, Result, StatusCode, StdObjRef};

/// Entry count of a request; the wire carries it as a u16
fn entry_count(len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| {
        OrpcError::RefCount(format!("{} entries, at most {} fit one request", len, u16::MAX))
    })
}

pub const IREMUNKNOWN: InterfaceDescriptor = InterfaceDescriptor::new(
    "IRemUnknown",
    InterfaceId::new(iid::IREMUNKNOWN, 0, 0),
    Some(&IUNKNOWN),
    3,
);

ndr_struct! {
    /// REMQIRESULT
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct RemQiResult {
        pub hresult: StatusCode,
        /// Meaningful only when `hresult` is success
        pub std: StdObjRef,
    }
}

impl RemQiResult {
    pub fn success(std: StdObjRef) -> Self {
        Self {
            hresult: StatusCode::default(),
            std,
        }
    }

    pub fn failure(hresult: StatusCode) -> Self {
        Self {
            hresult,
            std: StdObjRef::new(Default::default(), Default::default(), Ipid::nil(), 0),
        }
    }
}

ndr_struct! {
    /// REMINTERFACEREF
    #[derive(Clone, Debug, PartialEq, Eq, Default)]
    pub struct RemInterfaceRef {
        pub ipid: Ipid,
        pub public_refs: u32,
        pub private_refs: u32,
    }
}

impl RemInterfaceRef {
    pub fn new(ipid: Ipid, public_refs: u32) -> Self {
        Self {
            ipid,
            public_refs,
            private_refs: 0,
        }
    }
}

ndr_struct! {
    /// RemQueryInterface in-parameters
    #[derive(Clone, Debug, PartialEq, Eq, Default)]
    pub struct RemQueryInterfaceRequest {
        pub ipid: Ipid,
        pub refs: u32,
        pub count: u16,
        pub iids: ConformantArray<Uuid>,
    }
}

impl RemQueryInterfaceRequest {
    pub fn new(ipid: Ipid, iids: Vec<Uuid>, refs: u32) -> Result<Self> {
        Ok(Self {
            ipid,
            refs,
            count: entry_count(iids.len())?,
            iids: ConformantArray::new(iids),
        })
    }
}

ndr_struct! {
    /// RemAddRef / RemRelease in-parameters
    #[derive(Clone, Debug, PartialEq, Eq, Default)]
    pub struct RemRefsRequest {
        pub count: u16,
        pub refs: ConformantArray<RemInterfaceRef>,
    }
}

impl RemRefsRequest {
    pub fn new(refs: Vec<RemInterfaceRef>) -> Result<Self> {
        Ok(Self {
            count: entry_count(refs.len())?,
            refs: ConformantArray::new(refs),
        })
    }
}

crate::orpc_operations! {
    /// Query interfaces on the object behind an IPID
    pub RemQueryInterface(IREMUNKNOWN, 3):
        RemQueryInterfaceRequest => UniquePtr<ConformantArray<RemQiResult>>;
    /// Add public references; one status per entry
    pub RemAddRef(IREMUNKNOWN, 4): RemRefsRequest => ConformantArray<StatusCode>;
    /// Release public references
    pub RemRelease(IREMUNKNOWN, 5): RemRefsRequest => ();
}
