//! STDOBJREF structure
//!
//! Identifies a marshaled interface pointer: exporter, object, interface
//! pointer, and the public references handed over with it.

use orpc_ndr::ndr_struct;

use super::identifiers::{Ipid, Oid, Oxid};

/// STDOBJREF flags (SORF_*)
pub mod flags {
    pub const SORF_NULL: u32 = 0x0000_0000;
    /// The reference does not take part in pinging
    pub const SORF_NOPING: u32 = 0x0000_1000;
}

ndr_struct! {
    /// Standard object reference (40 bytes)
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct StdObjRef {
        /// SORF_* flags
        pub flags: u32,
        /// Public references transferred with this reference
        pub public_refs: u32,
        pub oxid: Oxid,
        pub oid: Oid,
        pub ipid: Ipid,
    }
}

impl StdObjRef {
    pub const SIZE: usize = 40;

    pub fn new(oxid: Oxid, oid: Oid, ipid: Ipid, public_refs: u32) -> Self {
        Self {
            flags: flags::SORF_NULL,
            public_refs,
            oxid,
            oid,
            ipid,
        }
    }

    /// Reference exempt from pinging; lifetime is managed by explicit release
    pub fn new_noping(oxid: Oxid, oid: Oid, ipid: Ipid, public_refs: u32) -> Self {
        Self {
            flags: flags::SORF_NOPING,
            ..Self::new(oxid, oid, ipid, public_refs)
        }
    }

    pub fn requires_pinging(&self) -> bool {
        (self.flags & flags::SORF_NOPING) == 0
    }
}
