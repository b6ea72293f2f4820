//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use orpc::client::Connection;
use orpc::dispatch::well_known::{idispatch_table, IDISPATCH};
use orpc::server::{ObjectServer, ServerBuilder};
use orpc::types::{InterfaceId, InterfacePointer};
use orpc::{orpc_operations, DispatchTable, InterfaceDescriptor, Reply};
use orpc_ndr::{BString, UniquePtr};

/// Initialize logging for tests; `RUST_LOG` selects the level
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A server and one loopback connection into it
pub struct Fixture {
    pub server: Arc<ObjectServer>,
    pub connection: Connection,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(ObjectServer::builder())
    }

    pub fn with(builder: ServerBuilder) -> Self {
        init_logging();
        let server = builder.build().expect("server");
        let connection = Connection::new(server.loopback());
        Self { server, connection }
    }

    /// Another connection into the same server
    pub fn connect(&self) -> Connection {
        Connection::new(self.server.loopback())
    }

    pub fn connect_with_timeout(&self, timeout: Duration) -> Connection {
        Connection::builder(self.server.loopback())
            .call_timeout(Some(timeout))
            .build()
    }
}

/// Small named object used as a collection element
pub const ILABEL: InterfaceDescriptor = InterfaceDescriptor::new(
    "ILabel",
    InterfaceId::from_u128(0x2b7c9e40_1d6a_4f83_a1c5_6e0d8f3b7a21).with_version(1, 0),
    Some(&IDISPATCH),
    1,
);

orpc_operations! {
    pub Name(ILABEL, 7): () => UniquePtr<BString>;
}

pub fn label_table(name: &str) -> Arc<DispatchTable> {
    let name = name.to_string();
    DispatchTable::builder(&ILABEL)
        .inherits(idispatch_table().expect("IDispatch table"))
        .operation::<Name, _, _>(move |_ctx, ()| {
            let name = name.clone();
            async move { Ok(Reply::ok(UniquePtr::new(BString::new(name)))) }
        })
        .build()
        .expect("ILabel table")
}

/// Export a label and marshal a pointer to it
pub fn export_label(server: &ObjectServer, name: &str) -> InterfacePointer {
    server.export_pointer(label_table(name)).expect("export label")
}

/// Read a label's name through `connection`
pub async fn label_name(connection: &Connection, pointer: &InterfacePointer) -> String {
    let reference = connection.unmarshal(pointer, &ILABEL).expect("unmarshal label");
    let outcome = connection
        .invoke::<Name>(Some(&reference), &())
        .await
        .expect("Name call");
    outcome
        .into_result()
        .expect("Name status")
        .into_option()
        .map(BString::into_string)
        .unwrap_or_default()
}
