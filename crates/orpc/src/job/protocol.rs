//! `IJob` interface: opnums 7..13 on top of `IDispatch`

use orpc_ndr::{ndr_enum, BString, UniquePtr, VariantBool};

use crate::dispatch::well_known::IDISPATCH;
use crate::dispatch::InterfaceDescriptor;
use crate::types::InterfaceId;

pub const IJOB: InterfaceDescriptor = InterfaceDescriptor::new(
    "IJob",
    InterfaceId::from_u128(0x6f3e2c14_5a1b_4c2e_9d47_3b8f1a2c5e10).with_version(1, 0),
    Some(&IDISPATCH),
    6,
);

ndr_enum! {
    #[derive(Default)]
    pub enum JobStatus {
        #[default]
        Idle = 1,
        Running = 2,
        Completed = 3,
        Cancelled = 4,
        Failed = 5,
    }
}

impl JobStatus {
    pub fn is_running(self) -> bool {
        self == JobStatus::Running
    }
}

crate::orpc_operations! {
    /// Start a run; `ALREADY_RUNNING` while one is in progress
    pub Run(IJOB, 7): () => ();
    /// Wait up to the given seconds for the job to leave `Running`
    pub WaitForCompletion(IJOB, 8): i32 => VariantBool;
    pub Cancel(IJOB, 9): () => ();
    pub Status(IJOB, 10): () => JobStatus;
    /// Start of the latest run as an OLE Automation date; 0.0 if never run
    pub LastRun(IJOB, 11): () => f64;
    /// Error recorded by the latest failed run
    pub LastError(IJOB, 12): () => UniquePtr<BString>;
}
