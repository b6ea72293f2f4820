//! Collection clients

use std::marker::PhantomData;
use std::ops::Deref;

use orpc_ndr::Uuid;

use super::protocol::{
    Add, Cancel, CloneCollection, CollectionItem, CollectionState, Commit, CommitOptions, Count,
    GetById, Item, Remove, RemoveById, State, WaitForCompletion, ICOLLECTION,
    ICOMMITTABLE_COLLECTION, IMUTABLE_COLLECTION,
};
use crate::client::{Connection, ObjectClient, Outcome};
use crate::dispatch::InterfaceDescriptor;
use crate::reference::ObjectReference;
use crate::types::{InterfacePointer, Ipid, Result};

/// `ICollection` client
pub struct CollectionClient<T> {
    object: ObjectClient,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for CollectionClient<T> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            _item: PhantomData,
        }
    }
}

impl<T: CollectionItem> CollectionClient<T> {
    fn from_object(object: ObjectClient) -> Self {
        Self {
            object,
            _item: PhantomData,
        }
    }

    /// Client with no collection bound; calls fail with `MissingBinding`
    /// until [`ipid`](Self::ipid) binds one
    pub fn new(connection: Connection) -> Self {
        Self::from_object(ObjectClient::new(connection, &ICOLLECTION))
    }

    pub fn bound(connection: Connection, reference: ObjectReference) -> Self {
        Self::from_object(ObjectClient::bound(connection, reference))
    }

    pub fn unmarshal(connection: Connection, pointer: &InterfacePointer) -> Result<Self> {
        Self::unmarshal_as(connection, pointer, &ICOLLECTION)
    }

    fn unmarshal_as(
        connection: Connection,
        pointer: &InterfacePointer,
        descriptor: &'static InterfaceDescriptor,
    ) -> Result<Self> {
        ObjectClient::unmarshal(connection, pointer, descriptor).map(Self::from_object)
    }

    pub fn ipid(&self, ipid: Ipid) -> Self {
        Self::from_object(self.object.ipid(ipid))
    }

    pub fn reference(&self) -> Option<&ObjectReference> {
        self.object.reference()
    }

    pub fn object(&self) -> &ObjectClient {
        &self.object
    }

    /// Item at a 1-based index; out of range fails with `NOT_FOUND`
    pub async fn item(&self, index: i32) -> Result<Outcome<Option<T>>> {
        let outcome = self.object.invoke::<Item<T>>(&index).await?;
        Ok(outcome.map(|item| item.into_option()))
    }

    pub async fn count(&self) -> Result<Outcome<i32>> {
        self.object.invoke::<Count>(&()).await
    }

    pub async fn state(&self) -> Result<Outcome<CollectionState>> {
        self.object.invoke::<State>(&()).await
    }

    pub async fn cancel(&self) -> Result<Outcome<()>> {
        self.object.invoke::<Cancel>(&()).await
    }

    /// True if population settled within `seconds`
    pub async fn wait_for_completion(&self, seconds: i32) -> Result<Outcome<bool>> {
        let outcome = self.object.invoke::<WaitForCompletion>(&seconds).await?;
        Ok(outcome.map(bool::from))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Outcome<Option<T>>> {
        let outcome = self.object.invoke::<GetById<T>>(&id).await?;
        Ok(outcome.map(|item| item.into_option()))
    }

    /// Every item, fetched one call at a time. Any failure status is
    /// returned as an error.
    pub async fn items(&self) -> Result<Vec<T>> {
        let count = self.count().await?.into_result()?;
        let mut items = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
        for index in 1..=count {
            if let Some(item) = self.item(index).await?.into_result()? {
                items.push(item);
            }
        }
        Ok(items)
    }
}

/// `IMutableCollection` client; read operations come from the
/// [`CollectionClient`] it derefs to
pub struct MutableCollectionClient<T> {
    inner: CollectionClient<T>,
}

impl<T> Clone for MutableCollectionClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Deref for MutableCollectionClient<T> {
    type Target = CollectionClient<T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: CollectionItem> MutableCollectionClient<T> {
    pub fn new(connection: Connection) -> Self {
        Self {
            inner: CollectionClient::from_object(ObjectClient::new(
                connection,
                &IMUTABLE_COLLECTION,
            )),
        }
    }

    pub fn bound(connection: Connection, reference: ObjectReference) -> Self {
        Self {
            inner: CollectionClient::bound(connection, reference),
        }
    }

    pub fn unmarshal(connection: Connection, pointer: &InterfacePointer) -> Result<Self> {
        CollectionClient::unmarshal_as(connection, pointer, &IMUTABLE_COLLECTION)
            .map(|inner| Self { inner })
    }

    pub fn ipid(&self, ipid: Ipid) -> Self {
        Self {
            inner: self.inner.ipid(ipid),
        }
    }

    /// Append `item`; fails with `ALREADY_EXISTS` for a duplicate
    pub async fn add(&self, item: &T) -> Result<Outcome<()>> {
        self.object.invoke::<Add<T>>(item).await
    }

    pub async fn remove(&self, index: i32) -> Result<Outcome<()>> {
        self.object.invoke::<Remove>(&index).await
    }

    pub async fn remove_by_id(&self, id: Uuid) -> Result<Outcome<()>> {
        self.object.invoke::<RemoveById>(&id).await
    }

    /// Always answered with `NOT_SUPPORTED`
    pub async fn clone_collection(&self) -> Result<Outcome<Option<InterfacePointer>>> {
        let outcome = self.object.invoke::<CloneCollection>(&()).await?;
        Ok(outcome.map(|pointer| pointer.into_option()))
    }
}

/// `ICommittableCollection` client
pub struct CommittableCollectionClient<T> {
    inner: MutableCollectionClient<T>,
}

impl<T> Clone for CommittableCollectionClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Deref for CommittableCollectionClient<T> {
    type Target = MutableCollectionClient<T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: CollectionItem> CommittableCollectionClient<T> {
    pub fn new(connection: Connection) -> Self {
        let object = ObjectClient::new(connection, &ICOMMITTABLE_COLLECTION);
        Self {
            inner: MutableCollectionClient {
                inner: CollectionClient::from_object(object),
            },
        }
    }

    pub fn bound(connection: Connection, reference: ObjectReference) -> Self {
        Self {
            inner: MutableCollectionClient::bound(connection, reference),
        }
    }

    pub fn unmarshal(connection: Connection, pointer: &InterfacePointer) -> Result<Self> {
        let inner = CollectionClient::unmarshal_as(connection, pointer, &ICOMMITTABLE_COLLECTION)?;
        Ok(Self {
            inner: MutableCollectionClient { inner },
        })
    }

    pub fn ipid(&self, ipid: Ipid) -> Self {
        Self {
            inner: self.inner.ipid(ipid),
        }
    }

    /// Commit the current contents and bind a client to the collection
    /// returned for them
    pub async fn commit(
        &self,
        options: CommitOptions,
    ) -> Result<Outcome<Option<CollectionClient<T>>>> {
        let outcome = self.object.invoke::<Commit>(&options).await?;
        let connection = self.object.connection().clone();
        let client = match outcome {
            Outcome::Success(pointer) => Outcome::Success(
                pointer
                    .into_option()
                    .map(|pointer| CollectionClient::unmarshal(connection, &pointer))
                    .transpose()?,
            ),
            Outcome::Failed { failure, .. } => Outcome::Failed {
                failure,
                partial: None,
            },
        };
        Ok(client)
    }
}
