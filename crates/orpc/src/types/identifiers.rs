//! Object identifiers
//!
//! - OXID: object exporter identifier
//! - OID: object identifier within an exporter
//! - IPID: interface pointer identifier, one per exported interface of an object
//! - Interface id: interface UUID plus its version

use std::fmt;

use orpc_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Uuid};

macro_rules! id64 {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u64);

        impl $name {
            pub const SIZE: usize = 8;

            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Random identifier
            pub fn generate() -> Self {
                Self((uuid::Uuid::new_v4().as_u128() >> 64) as u64)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({:016x})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:016x}", self.0)
            }
        }

        impl NdrEncode for $name {
            fn ndr_encode(&self, w: &mut NdrWriter) -> orpc_ndr::Result<()> {
                w.put_u64(self.0);
                Ok(())
            }

            fn ndr_align() -> usize {
                8
            }
        }

        impl NdrDecode for $name {
            fn ndr_decode(r: &mut NdrReader) -> orpc_ndr::Result<Self> {
                r.get_u64().map(Self)
            }

            fn ndr_align() -> usize {
                8
            }
        }
    };
}

id64! {
    /// Object exporter identifier
    Oxid, "OXID"
}

id64! {
    /// Object identifier, unique within its exporter
    Oid, "OID"
}

/// Interface pointer identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Ipid(pub Uuid);

impl Ipid {
    pub const SIZE: usize = 16;

    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn generate() -> Self {
        Self(Uuid::generate())
    }

    pub fn nil() -> Self {
        Self(Uuid::NIL)
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for Ipid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IPID({})", self.0)
    }
}

impl fmt::Display for Ipid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NdrEncode for Ipid {
    fn ndr_encode(&self, w: &mut NdrWriter) -> orpc_ndr::Result<()> {
        self.0.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Ipid {
    fn ndr_decode(r: &mut NdrReader) -> orpc_ndr::Result<Self> {
        Uuid::ndr_decode(r).map(Self)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// Interface UUID and version
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceId {
    pub uuid: Uuid,
    pub major: u16,
    pub minor: u16,
}

impl InterfaceId {
    pub const fn new(uuid: Uuid, major: u16, minor: u16) -> Self {
        Self { uuid, major, minor }
    }

    /// Interface id from the 128-bit value of its UUID, version 0.0
    pub const fn from_u128(uuid: u128) -> Self {
        Self::new(Uuid::from_u128(uuid), 0, 0)
    }

    pub const fn with_version(self, major: u16, minor: u16) -> Self {
        Self::new(self.uuid, major, minor)
    }
}

impl fmt::Debug for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IID({} v{}.{})", self.uuid, self.major, self.minor)
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}.{}", self.uuid, self.major, self.minor)
    }
}
