//! Stock collection object
//!
//! [`CollectionObject`] keeps its items in memory and its state in a
//! `watch` channel, so `WaitForCompletion` wakes as soon as population
//! settles. The same object serves all three collection interfaces; which
//! ones a caller sees depends on the table it is exported with.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use orpc_ndr::{UniquePtr, Uuid, VariantBool};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::debug;

use super::protocol::{CollectionItem, CollectionState, CommitOptions};
use super::server::{
    collection_table, CollectionServer, CommittableCollectionServer, MutableCollectionServer,
};
use crate::dispatch::{CallContext, Reply};
use crate::types::{hresult, InterfacePointer, Result, StatusCode};

pub struct CollectionObject<T> {
    items: RwLock<Vec<T>>,
    /// Contents as of the last commit
    committed: RwLock<Vec<T>>,
    state: watch::Sender<CollectionState>,
}

impl<T: CollectionItem> CollectionObject<T> {
    fn with_state(items: Vec<T>, state: CollectionState) -> Arc<Self> {
        let (state, _) = watch::channel(state);
        Arc::new(Self {
            items: RwLock::new(items),
            committed: RwLock::new(Vec::new()),
            state,
        })
    }

    /// Empty collection still being populated
    pub fn building() -> Arc<Self> {
        Self::with_state(Vec::new(), CollectionState::Building)
    }

    /// Fully populated collection
    pub fn complete(items: Vec<T>) -> Arc<Self> {
        Self::with_state(items, CollectionState::Complete)
    }

    pub fn state(&self) -> CollectionState {
        *self.state.borrow()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn items(&self) -> Vec<T> {
        self.items.read().clone()
    }

    pub fn committed(&self) -> Vec<T> {
        self.committed.read().clone()
    }

    /// Append a populated item. Returns false once population has
    /// settled, which tells the producer to stop.
    pub fn push(&self, item: T) -> bool {
        let mut items = self.items.write();
        if self.state() != CollectionState::Building {
            return false;
        }
        items.push(item);
        true
    }

    fn settle(&self, next: CollectionState) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if state.is_terminal() {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            debug!(state = ?next, items = self.len(), "collection settled");
        }
        changed
    }

    /// Mark population complete
    pub fn finish(&self) -> bool {
        self.settle(CollectionState::Complete)
    }

    pub fn fail(&self) -> bool {
        self.settle(CollectionState::Failed)
    }

    /// Stop population. Returns false, changing nothing, when the
    /// collection has already settled.
    pub fn cancel(&self) -> bool {
        self.settle(CollectionState::Cancelled)
    }

    /// Item at a 1-based index
    pub fn get(&self, index: i32) -> std::result::Result<T, StatusCode> {
        let position = usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .ok_or(hresult::NOT_FOUND)?;
        self.items
            .read()
            .get(position)
            .cloned()
            .ok_or(hresult::NOT_FOUND)
    }

    pub fn find(&self, id: &Uuid) -> std::result::Result<T, StatusCode> {
        self.items
            .read()
            .iter()
            .find(|item| item.item_id() == *id)
            .cloned()
            .ok_or(hresult::NOT_FOUND)
    }

    pub fn insert(&self, item: T) -> std::result::Result<(), StatusCode> {
        let mut items = self.items.write();
        let id = item.item_id();
        if items.iter().any(|existing| existing.item_id() == id || *existing == item) {
            return Err(hresult::ALREADY_EXISTS);
        }
        items.push(item);
        Ok(())
    }

    pub fn remove_at(&self, index: i32) -> std::result::Result<T, StatusCode> {
        let mut items = self.items.write();
        let position = usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .filter(|&i| i < items.len())
            .ok_or(hresult::NOT_FOUND)?;
        Ok(items.remove(position))
    }

    pub fn remove_id(&self, id: &Uuid) -> std::result::Result<T, StatusCode> {
        let mut items = self.items.write();
        let position = items
            .iter()
            .position(|item| item.item_id() == *id)
            .ok_or(hresult::NOT_FOUND)?;
        Ok(items.remove(position))
    }

    /// Wait up to `timeout` for population to settle; true if it did
    pub async fn wait(&self, timeout: Duration) -> bool {
        let mut state = self.state.subscribe();
        let settled = async {
            loop {
                if state.borrow_and_update().is_terminal() {
                    return true;
                }
                if state.changed().await.is_err() {
                    return false;
                }
            }
        };
        tokio::time::timeout(timeout, settled).await.unwrap_or(false)
    }

    /// Replace the working set with the current contents and return a
    /// copy of it
    pub fn commit(&self) -> Vec<T> {
        let snapshot = self.items.read().clone();
        *self.committed.write() = snapshot.clone();
        snapshot
    }

    fn hand_out(&self, ctx: &CallContext, item: T) -> UniquePtr<T> {
        item.hand_out(&ctx.exporter);
        UniquePtr::new(item)
    }
}

#[async_trait]
impl<T: CollectionItem> CollectionServer<T> for CollectionObject<T> {
    async fn item(&self, ctx: &CallContext, index: i32) -> Result<Reply<UniquePtr<T>>> {
        Ok(self.get(index).map(|item| self.hand_out(ctx, item)).into())
    }

    async fn count(&self, _ctx: &CallContext) -> Result<Reply<i32>> {
        let count = i32::try_from(self.len()).unwrap_or(i32::MAX);
        Ok(Reply::ok(count))
    }

    async fn state(&self, _ctx: &CallContext) -> Result<Reply<CollectionState>> {
        Ok(Reply::ok(CollectionObject::state(self)))
    }

    async fn cancel(&self, _ctx: &CallContext) -> Result<Reply<()>> {
        CollectionObject::cancel(self);
        Ok(Reply::ok(()))
    }

    async fn wait_for_completion(
        &self,
        ctx: &CallContext,
        seconds: i32,
    ) -> Result<Reply<VariantBool>> {
        let timeout = match ctx.wait_bound(seconds) {
            Ok(timeout) => timeout,
            Err(status) => return Ok(Reply::failed(status)),
        };
        Ok(Reply::ok(VariantBool(self.wait(timeout).await)))
    }

    async fn get_by_id(&self, ctx: &CallContext, id: Uuid) -> Result<Reply<UniquePtr<T>>> {
        Ok(self.find(&id).map(|item| self.hand_out(ctx, item)).into())
    }
}

#[async_trait]
impl<T: CollectionItem> MutableCollectionServer<T> for CollectionObject<T> {
    async fn add(&self, _ctx: &CallContext, item: T) -> Result<Reply<()>> {
        Ok(self.insert(item).into())
    }

    async fn remove(&self, _ctx: &CallContext, index: i32) -> Result<Reply<()>> {
        Ok(self.remove_at(index).map(drop).into())
    }

    async fn remove_by_id(&self, _ctx: &CallContext, id: Uuid) -> Result<Reply<()>> {
        Ok(self.remove_id(&id).map(drop).into())
    }
}

#[async_trait]
impl<T: CollectionItem> CommittableCollectionServer<T> for CollectionObject<T> {
    async fn commit(
        &self,
        ctx: &CallContext,
        options: CommitOptions,
    ) -> Result<Reply<UniquePtr<InterfacePointer>>> {
        let snapshot = CollectionObject::commit(self);
        debug!(items = snapshot.len(), ?options, "collection committed");

        let result = match options {
            CommitOptions::None => CollectionObject::complete(snapshot),
            CommitOptions::Asynchronous => {
                let result = CollectionObject::building();
                let target = result.clone();
                tokio::spawn(async move {
                    for item in snapshot {
                        if !target.push(item) {
                            return;
                        }
                        tokio::task::yield_now().await;
                    }
                    target.finish();
                });
                result
            }
        };

        let pointer = ctx.export(collection_table::<T, _>(result)?)?;
        Ok(Reply::ok(UniquePtr::new(pointer)))
    }
}
