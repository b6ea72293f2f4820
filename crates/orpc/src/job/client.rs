use super::protocol::{Cancel, JobStatus, LastError, LastRun, Run, Status, WaitForCompletion, IJOB};
use crate::client::{Connection, ObjectClient, Outcome};
use crate::reference::ObjectReference;
use crate::types::{InterfacePointer, Ipid, Result};

/// `IJob` client
#[derive(Clone)]
pub struct JobClient {
    object: ObjectClient,
}

impl JobClient {
    /// Client with no job bound yet
    pub fn new(connection: Connection) -> Self {
        Self {
            object: ObjectClient::new(connection, &IJOB),
        }
    }

    pub fn bound(connection: Connection, reference: ObjectReference) -> Self {
        Self {
            object: ObjectClient::bound(connection, reference),
        }
    }

    pub fn unmarshal(connection: Connection, pointer: &InterfacePointer) -> Result<Self> {
        ObjectClient::unmarshal(connection, pointer, &IJOB).map(|object| Self { object })
    }

    pub fn ipid(&self, ipid: Ipid) -> Self {
        Self {
            object: self.object.ipid(ipid),
        }
    }

    pub fn reference(&self) -> Option<&ObjectReference> {
        self.object.reference()
    }

    pub async fn run(&self) -> Result<Outcome<()>> {
        self.object.invoke::<Run>(&()).await
    }

    /// True if the job is no longer running after at most `seconds`
    pub async fn wait_for_completion(&self, seconds: i32) -> Result<Outcome<bool>> {
        let outcome = self.object.invoke::<WaitForCompletion>(&seconds).await?;
        Ok(outcome.map(bool::from))
    }

    pub async fn cancel(&self) -> Result<Outcome<()>> {
        self.object.invoke::<Cancel>(&()).await
    }

    pub async fn status(&self) -> Result<Outcome<JobStatus>> {
        self.object.invoke::<Status>(&()).await
    }

    pub async fn last_run(&self) -> Result<Outcome<f64>> {
        self.object.invoke::<LastRun>(&()).await
    }

    pub async fn last_error(&self) -> Result<Outcome<Option<String>>> {
        let outcome = self.object.invoke::<LastError>(&()).await?;
        Ok(outcome.map(|error| error.into_option().map(|s| s.into_string())))
    }
}
