//! Collection interfaces and their operations
//!
//! | Interface | Base | Opnums |
//! |---|---|---|
//! | `ICollection` | `IDispatch` | 7..13 |
//! | `IMutableCollection` | `ICollection` | 13..17 |
//! | `ICommittableCollection` | `IMutableCollection` | 17..18 |
//!
//! Indices are 1-based.

use std::fmt;
use std::marker::PhantomData;

use orpc_ndr::{ndr_enum, NdrDecode, NdrEncode, UniquePtr, Uuid, VariantBool};
use tracing::debug;

use crate::dispatch::well_known::IDISPATCH;
use crate::dispatch::{InterfaceDescriptor, Operation};
use crate::exporter::ObjectExporter;
use crate::types::{InterfaceId, InterfacePointer};

pub const ICOLLECTION: InterfaceDescriptor = InterfaceDescriptor::new(
    "ICollection",
    InterfaceId::from_u128(0x6f3e2c14_5a1b_4c2e_9d47_3b8f1a2c5e01).with_version(1, 0),
    Some(&IDISPATCH),
    6,
);

pub const IMUTABLE_COLLECTION: InterfaceDescriptor = InterfaceDescriptor::new(
    "IMutableCollection",
    InterfaceId::from_u128(0x6f3e2c14_5a1b_4c2e_9d47_3b8f1a2c5e02).with_version(1, 0),
    Some(&ICOLLECTION),
    4,
);

pub const ICOMMITTABLE_COLLECTION: InterfaceDescriptor = InterfaceDescriptor::new(
    "ICommittableCollection",
    InterfaceId::from_u128(0x6f3e2c14_5a1b_4c2e_9d47_3b8f1a2c5e03).with_version(1, 0),
    Some(&IMUTABLE_COLLECTION),
    1,
);

ndr_enum! {
    /// Population state. A collection starts `Building` and settles into
    /// exactly one of the other states.
    #[derive(Default)]
    pub enum CollectionState {
        #[default]
        Building = 1,
        Complete = 2,
        Cancelled = 3,
        Failed = 4,
    }
}

impl CollectionState {
    pub fn is_terminal(self) -> bool {
        self != CollectionState::Building
    }
}

ndr_enum! {
    #[derive(Default)]
    pub enum CommitOptions {
        /// The committed collection is returned complete
        #[default]
        None = 0,
        /// The committed collection is returned `Building` and filled in
        /// the background
        Asynchronous = 1,
    }
}

/// Element of a collection
pub trait CollectionItem:
    NdrEncode + NdrDecode + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Identity used by `GetById`, `RemoveById` and duplicate detection
    fn item_id(&self) -> Uuid;

    /// Called on the server each time a copy of the item is returned
    fn hand_out(&self, _exporter: &ObjectExporter) {}
}

/// Object references are identified by IPID. Handing one out grants the
/// caller the references carried in its STDOBJREF.
impl CollectionItem for InterfacePointer {
    fn item_id(&self) -> Uuid {
        *self.objref().std.ipid.uuid()
    }

    fn hand_out(&self, exporter: &ObjectExporter) {
        let std = &self.objref().std;
        if let Err(err) = exporter.add_refs(&std.ipid, std.public_refs) {
            debug!(ipid = %std.ipid, error = %err, "handing out a foreign or released reference");
        }
    }
}

crate::orpc_operations! {
    pub Count(ICOLLECTION, 8): () => i32;
    pub State(ICOLLECTION, 9): () => CollectionState;
    /// Stop population; a no-op once the collection is settled
    pub Cancel(ICOLLECTION, 10): () => ();
    /// Wait up to the given seconds for population to settle
    pub WaitForCompletion(ICOLLECTION, 11): i32 => VariantBool;
    pub Remove(IMUTABLE_COLLECTION, 14): i32 => ();
    pub RemoveById(IMUTABLE_COLLECTION, 15): Uuid => ();
    /// Returns a collection of the committed items
    pub Commit(ICOMMITTABLE_COLLECTION, 17): CommitOptions => UniquePtr<InterfacePointer>;
}

/// `Clone` is part of the interface but never succeeds; it always answers
/// `NOT_SUPPORTED`
#[derive(Debug, Clone, Copy, Default)]
pub struct CloneCollection;

impl Operation for CloneCollection {
    const INTERFACE: &'static InterfaceDescriptor = &IMUTABLE_COLLECTION;
    const OPNUM: u16 = 16;
    const MEMBER: &'static str = "Clone";
    type Request = ();
    type Response = UniquePtr<InterfacePointer>;
}

macro_rules! item_operations {
    ($(
        $(#[$meta:meta])*
        $name:ident ($iface:path, $opnum:literal): $req:ty => $resp:ty;
    )+) => {
        $(
            $(#[$meta])*
            pub struct $name<T>(PhantomData<fn() -> T>);

            impl<T: CollectionItem> Operation for $name<T> {
                const INTERFACE: &'static InterfaceDescriptor = &$iface;
                const OPNUM: u16 = $opnum;
                const MEMBER: &'static str = stringify!($name);
                type Request = $req;
                type Response = $resp;
            }
        )+
    };
}

item_operations! {
    /// Item at a 1-based index
    Item(ICOLLECTION, 7): i32 => UniquePtr<T>;
    GetById(ICOLLECTION, 12): Uuid => UniquePtr<T>;
    /// Append; `ALREADY_EXISTS` if an item with the same id is present
    Add(IMUTABLE_COLLECTION, 13): T => ();
}
