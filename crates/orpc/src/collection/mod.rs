//! Remotely enumerable collections
//!
//! A collection is populated on the server, possibly in the background,
//! while clients poll `State` or block in `WaitForCompletion`. The mutable
//! and committable refinements add editing and a commit that hands back a
//! separate read-only collection.

mod client;
mod object;
mod protocol;
mod server;

pub use client::{CollectionClient, CommittableCollectionClient, MutableCollectionClient};
pub use object::CollectionObject;
pub use protocol::{
    Add, Cancel, CloneCollection, CollectionItem, CollectionState, Commit, CommitOptions, Count,
    GetById, Item, Remove, RemoveById, State, WaitForCompletion, ICOLLECTION,
    ICOMMITTABLE_COLLECTION, IMUTABLE_COLLECTION,
};
pub use server::{
    collection_table, committable_collection_table, mutable_collection_table, CollectionServer,
    CommittableCollectionServer, MutableCollectionServer,
};
