//! Server traits for the collection interfaces and the tables that route
//! to them

use std::sync::Arc;

use async_trait::async_trait;
use orpc_ndr::{UniquePtr, Uuid, VariantBool};

use super::protocol::{
    Add, Cancel, CloneCollection, CollectionItem, CollectionState, Commit, CommitOptions, Count,
    GetById, Item, Remove, RemoveById, State, WaitForCompletion, ICOLLECTION,
    ICOMMITTABLE_COLLECTION, IMUTABLE_COLLECTION,
};
use crate::dispatch::well_known::idispatch_table;
use crate::dispatch::{CallContext, DispatchTable, Reply};
use crate::types::{hresult, InterfacePointer, Result};

/// `ICollection` implementation
#[async_trait]
pub trait CollectionServer<T: CollectionItem>: Send + Sync + 'static {
    async fn item(&self, ctx: &CallContext, index: i32) -> Result<Reply<UniquePtr<T>>>;

    async fn count(&self, ctx: &CallContext) -> Result<Reply<i32>>;

    async fn state(&self, ctx: &CallContext) -> Result<Reply<CollectionState>>;

    async fn cancel(&self, ctx: &CallContext) -> Result<Reply<()>>;

    async fn wait_for_completion(
        &self,
        ctx: &CallContext,
        seconds: i32,
    ) -> Result<Reply<VariantBool>>;

    async fn get_by_id(&self, ctx: &CallContext, id: Uuid) -> Result<Reply<UniquePtr<T>>>;
}

/// `IMutableCollection` implementation. `Clone` is not part of the trait:
/// the table answers it with `NOT_SUPPORTED`.
#[async_trait]
pub trait MutableCollectionServer<T: CollectionItem>: CollectionServer<T> {
    async fn add(&self, ctx: &CallContext, item: T) -> Result<Reply<()>>;

    async fn remove(&self, ctx: &CallContext, index: i32) -> Result<Reply<()>>;

    async fn remove_by_id(&self, ctx: &CallContext, id: Uuid) -> Result<Reply<()>>;
}

/// `ICommittableCollection` implementation
#[async_trait]
pub trait CommittableCollectionServer<T: CollectionItem>: MutableCollectionServer<T> {
    async fn commit(
        &self,
        ctx: &CallContext,
        options: CommitOptions,
    ) -> Result<Reply<UniquePtr<InterfacePointer>>>;
}

macro_rules! route {
    ($server:expr, $method:ident) => {{
        let server = $server.clone();
        move |ctx: CallContext, ()| {
            let server = server.clone();
            async move { server.$method(&ctx).await }
        }
    }};
    ($server:expr, $method:ident, $arg:ident: $ty:ty) => {{
        let server = $server.clone();
        move |ctx: CallContext, $arg: $ty| {
            let server = server.clone();
            async move { server.$method(&ctx, $arg).await }
        }
    }};
}

/// Dispatch table serving `ICollection` from `server`
pub fn collection_table<T, S>(server: Arc<S>) -> Result<Arc<DispatchTable>>
where
    T: CollectionItem,
    S: CollectionServer<T>,
{
    DispatchTable::builder(&ICOLLECTION)
        .inherits(idispatch_table()?)
        .operation::<Item<T>, _, _>(route!(server, item, index: i32))
        .operation::<Count, _, _>(route!(server, count))
        .operation::<State, _, _>(route!(server, state))
        .operation::<Cancel, _, _>(route!(server, cancel))
        .operation::<WaitForCompletion, _, _>(route!(server, wait_for_completion, seconds: i32))
        .operation::<GetById<T>, _, _>(route!(server, get_by_id, id: Uuid))
        .build()
}

pub fn mutable_collection_table<T, S>(server: Arc<S>) -> Result<Arc<DispatchTable>>
where
    T: CollectionItem,
    S: MutableCollectionServer<T>,
{
    DispatchTable::builder(&IMUTABLE_COLLECTION)
        .inherits(collection_table::<T, S>(server.clone())?)
        .operation::<Add<T>, _, _>(route!(server, add, item: T))
        .operation::<Remove, _, _>(route!(server, remove, index: i32))
        .operation::<RemoveById, _, _>(route!(server, remove_by_id, id: Uuid))
        .operation::<CloneCollection, _, _>(|_ctx, ()| async {
            Ok(Reply::failed(hresult::NOT_SUPPORTED))
        })
        .build()
}

pub fn committable_collection_table<T, S>(server: Arc<S>) -> Result<Arc<DispatchTable>>
where
    T: CollectionItem,
    S: CommittableCollectionServer<T>,
{
    DispatchTable::builder(&ICOMMITTABLE_COLLECTION)
        .inherits(mutable_collection_table::<T, S>(server.clone())?)
        .operation::<Commit, _, _>(route!(server, commit, options: CommitOptions))
        .build()
}
