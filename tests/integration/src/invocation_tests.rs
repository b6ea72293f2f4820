//! Invocation Tests - Typed Calls End to End
//!
//! These tests drive the invocation client against a live object server:
//! - Failure statuses with partially populated out-parameters
//! - Binding errors raised before anything is sent
//! - Rebinding, call timeouts and big-endian callers

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use orpc::client::{ObjectClient, Outcome};
use orpc::dispatch::well_known::IDISPATCH;
use orpc::types::{hresult, InterfaceId, OrpcError, StatusCode};
use orpc::{orpc_operations, Connection, DispatchTable, InterfaceDescriptor, Reply};
use orpc_ndr::{ndr_struct, BString, NdrContext, UniquePtr};

const IINVENTORY: InterfaceDescriptor = InterfaceDescriptor::new(
    "IInventory",
    InterfaceId::from_u128(0x7c41_0e52_93aa_4d1f_8b20_c6d4_1e97_0a35).with_version(1, 0),
    Some(&IDISPATCH),
    3,
);

ndr_struct! {
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Slot {
        /// Number of slots; valid even when the lookup fails
        pub count: i32,
        pub label: UniquePtr<BString>,
    }
}

orpc_operations! {
    /// 1-based slot lookup
    Lookup(IINVENTORY, 7): i32 => Slot;
    Rename(IINVENTORY, 8): UniquePtr<BString> => UniquePtr<BString>;
    Stall(IINVENTORY, 9): u32 => ();
}

/// Status returned for an out-of-range slot
const SLOT_NOT_FOUND: StatusCode = StatusCode(5);

fn inventory_table(labels: Vec<&'static str>) -> Arc<DispatchTable> {
    let labels = Arc::new(labels);
    DispatchTable::builder(&IINVENTORY)
        .inherits(orpc::dispatch::well_known::idispatch_table().unwrap())
        .operation::<Lookup, _, _>(move |_ctx, index| {
            let labels = labels.clone();
            async move {
                let count = labels.len() as i32;
                let label = usize::try_from(index)
                    .ok()
                    .and_then(|i| i.checked_sub(1))
                    .and_then(|i| labels.get(i));
                Ok(match label {
                    Some(label) => Reply::ok(Slot {
                        count,
                        label: UniquePtr::new(BString::new(*label)),
                    }),
                    None => Reply::with_status(
                        Slot {
                            count,
                            label: UniquePtr::null(),
                        },
                        SLOT_NOT_FOUND,
                    ),
                })
            }
        })
        .operation::<Rename, _, _>(|_ctx, name: UniquePtr<BString>| async move {
            let renamed = name
                .into_option()
                .map(|name| BString::new(name.as_str().to_uppercase()));
            Ok(Reply::ok(UniquePtr::from_option(renamed)))
        })
        .operation::<Stall, _, _>(|_ctx, millis| async move {
            tokio::time::sleep(Duration::from_millis(u64::from(millis))).await;
            Ok(Reply::ok(()))
        })
        .build()
        .unwrap()
}

fn inventory(fixture: &Fixture, labels: Vec<&'static str>) -> ObjectClient {
    let pointer = fixture.server.export_pointer(inventory_table(labels)).unwrap();
    ObjectClient::unmarshal(fixture.connection.clone(), &pointer, &IINVENTORY).unwrap()
}

/// Test: a nonzero status still delivers the documented out-parameters
#[tokio::test]
async fn test_failure_status_with_partial_output() {
    let fixture = Fixture::new();
    let client = inventory(&fixture, vec!["bolts", "nuts", "washers"]);

    let found = client.invoke::<Lookup>(&2).await.unwrap();
    let slot = found.into_result().unwrap();
    assert_eq!(slot.count, 3);
    assert_eq!(slot.label.get().map(BString::as_str), Some("nuts"));

    let missing = client.invoke::<Lookup>(&9).await.unwrap();
    match &missing {
        Outcome::Failed { failure, partial } => {
            assert_eq!(failure.code, SLOT_NOT_FOUND);
            assert_eq!(failure.code.0, 5);
            assert_eq!(failure.operation_name(), "/IInventory/v1/Lookup");
            assert_eq!(failure.to_string(), "/IInventory/v1/Lookup: 0x00000005");
            assert_eq!(partial.count, 3);
            assert!(partial.label.is_null());
        }
        Outcome::Success(slot) => panic!("lookup of slot 9 succeeded: {:?}", slot),
    }
    assert!(matches!(
        missing.into_result(),
        Err(OrpcError::Failure(ref f)) if f.code == SLOT_NOT_FOUND
    ));

    // A failure status is not a failed call
    let stats = fixture.server.stats();
    assert_eq!(stats.calls_processed, 2);
    assert_eq!(stats.calls_failed, 0);
}

/// Test: null and empty strings stay distinct across a call
#[tokio::test]
async fn test_null_and_empty_strings() {
    let fixture = Fixture::new();
    let client = inventory(&fixture, vec![]);

    let renamed = client
        .invoke::<Rename>(&UniquePtr::new(BString::new("gears")))
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(renamed.get().map(BString::as_str), Some("GEARS"));

    let empty = client
        .invoke::<Rename>(&UniquePtr::new(BString::new("")))
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(empty.get().map(BString::as_str), Some(""));

    let null = client.invoke::<Rename>(&UniquePtr::null()).await.unwrap().into_result().unwrap();
    assert!(null.is_null());
}

/// Test: calling without a bound reference fails before sending
#[tokio::test]
async fn test_missing_binding() {
    let fixture = Fixture::new();
    let unbound = ObjectClient::new(fixture.connection.clone(), &IINVENTORY);

    let err = unbound.invoke::<Lookup>(&1).await.unwrap_err();
    match err {
        OrpcError::MissingBinding { operation } => assert_eq!(operation, "/IInventory/v1/Lookup"),
        other => panic!("unexpected {:?}", other),
    }

    let err = fixture.connection.invoke::<Lookup>(None, &1).await.unwrap_err();
    assert!(matches!(err, OrpcError::MissingBinding { .. }));
    assert_eq!(fixture.server.stats().calls_received, 0);
}

/// Test: a reference from one connection cannot be used on another
#[tokio::test]
async fn test_connection_mismatch() {
    let fixture = Fixture::new();
    let client = inventory(&fixture, vec!["bolts"]);
    let reference = *client.reference().unwrap();

    let other: Connection = fixture.connect();
    assert_ne!(other.id(), fixture.connection.id());

    let err = other.invoke::<Lookup>(Some(&reference), &1).await.unwrap_err();
    match err {
        OrpcError::ConnectionMismatch { expected, actual } => {
            assert_eq!(expected, other.id());
            assert_eq!(actual, fixture.connection.id());
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(fixture.server.stats().calls_received, 0);

    // Rebinding on the right connection works
    let rebound = other.bind(&IINVENTORY, reference.ipid());
    let slot = other.invoke::<Lookup>(Some(&rebound), &1).await.unwrap();
    assert!(slot.is_success());
}

/// Test: rebinding yields a new reference and leaves the original alone
#[tokio::test]
async fn test_rebind_to_another_instance() {
    let fixture = Fixture::new();
    let first = inventory(&fixture, vec!["bolts"]);
    let second = inventory(&fixture, vec!["nuts", "washers"]);

    let rebound = first.ipid(second.reference().unwrap().ipid());
    assert_ne!(rebound.reference(), first.reference());
    assert_eq!(
        rebound.reference().unwrap().connection(),
        first.reference().unwrap().connection()
    );

    let slot = rebound.invoke::<Lookup>(&1).await.unwrap().into_result().unwrap();
    assert_eq!(slot.count, 2);
    let slot = first.invoke::<Lookup>(&1).await.unwrap().into_result().unwrap();
    assert_eq!(slot.count, 1);
}

/// Test: a slow handler trips the client's call timeout
#[tokio::test]
async fn test_call_timeout() {
    let fixture = Fixture::new();
    let pointer = fixture.server.export_pointer(inventory_table(vec![])).unwrap();
    let connection = fixture.connect_with_timeout(Duration::from_millis(20));
    let client = ObjectClient::unmarshal(connection, &pointer, &IINVENTORY).unwrap();

    let err = client.invoke::<Stall>(&2_000).await.unwrap_err();
    assert!(matches!(err, OrpcError::Timeout(limit) if limit == Duration::from_millis(20)));

    let quick = client.invoke::<Stall>(&0).await.unwrap();
    assert!(quick.is_success());
}

/// Test: the server answers a big-endian caller in big-endian
#[tokio::test]
async fn test_big_endian_caller() {
    let fixture = Fixture::new();
    let pointer = fixture.server.export_pointer(inventory_table(vec!["bolts", "nuts"])).unwrap();
    let connection = Connection::builder(fixture.server.loopback())
        .byte_order(NdrContext::big_endian())
        .build();
    let client = ObjectClient::unmarshal(connection, &pointer, &IINVENTORY).unwrap();

    let slot = client.invoke::<Lookup>(&2).await.unwrap().into_result().unwrap();
    assert_eq!(slot.count, 2);
    assert_eq!(slot.label.get().map(BString::as_str), Some("nuts"));

    let missing = client.invoke::<Lookup>(&0).await.unwrap();
    assert_eq!(missing.status(), SLOT_NOT_FOUND);
    assert_eq!(missing.value().count, 2);
}

/// Test: unmarshaling checks the interface the pointer was marshaled for
#[tokio::test]
async fn test_unmarshal_interface_check() {
    let fixture = Fixture::new();
    let label = export_label(&fixture.server, "alpha");

    let err =
        ObjectClient::unmarshal(fixture.connection.clone(), &label, &IINVENTORY).unwrap_err();
    assert!(matches!(
        err,
        OrpcError::InterfaceMismatch { requested, .. } if requested == IINVENTORY.id
    ));

    assert_eq!(label_name(&fixture.connection, &label).await, "alpha");
    assert_eq!(hresult::S_OK, StatusCode::default());
}
