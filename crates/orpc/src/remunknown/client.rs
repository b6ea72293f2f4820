//! IRemUnknown client implementation

use orpc_ndr::Uuid;

use super::protocol::{
    RemAddRef, RemInterfaceRef, RemQiResult, RemQueryInterface, RemQueryInterfaceRequest,
    RemRefsRequest, RemRelease, IREMUNKNOWN,
};
use crate::client::{Connection, ObjectClient, Outcome};
use crate::reference::ObjectReference;
use crate::types::{Ipid, Result, StatusCode};

/// Client for the `IRemUnknown` object of one exporter
#[derive(Clone)]
pub struct RemUnknownClient {
    object: ObjectClient,
}

impl RemUnknownClient {
    /// `remunknown_ipid` is the exporter's `IRemUnknown` IPID
    pub fn new(connection: Connection, remunknown_ipid: Ipid) -> Self {
        Self {
            object: ObjectClient::new(connection, &IREMUNKNOWN).ipid(remunknown_ipid),
        }
    }

    pub fn reference(&self) -> Option<&ObjectReference> {
        self.object.reference()
    }

    /// Release `refs` public references on `reference`
    pub async fn release_reference(
        &self,
        reference: &ObjectReference,
        refs: u32,
    ) -> Result<Outcome<()>> {
        self.release(vec![RemInterfaceRef::new(reference.ipid(), refs)])
            .await
    }

    /// Ask the object behind `ipid` for more interfaces, taking `refs`
    /// public references on each one granted
    pub async fn query_interface(
        &self,
        ipid: Ipid,
        iids: Vec<Uuid>,
        refs: u32,
    ) -> Result<Outcome<Vec<RemQiResult>>> {
        let request = RemQueryInterfaceRequest::new(ipid, iids, refs)?;
        let outcome = self.object.invoke::<RemQueryInterface>(&request).await?;
        Ok(outcome.map(|results| {
            results
                .into_option()
                .map(|a| a.into_vec())
                .unwrap_or_default()
        }))
    }

    pub async fn add_ref(&self, refs: Vec<RemInterfaceRef>) -> Result<Outcome<Vec<StatusCode>>> {
        let outcome = self
            .object
            .invoke::<RemAddRef>(&RemRefsRequest::new(refs)?)
            .await?;
        Ok(outcome.map(|results| results.into_vec()))
    }

    pub async fn release(&self, refs: Vec<RemInterfaceRef>) -> Result<Outcome<()>> {
        self.object
            .invoke::<RemRelease>(&RemRefsRequest::new(refs)?)
            .await
    }
}
