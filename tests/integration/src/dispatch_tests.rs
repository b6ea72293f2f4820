//! Dispatch Tests - Interface Chains
//!
//! These tests exercise opnum routing through inherited interfaces:
//! - Base delegation across a three-level chain
//! - Unknown opnums at every level
//! - Derived tables sharing one base table
//! - Concurrent dispatch against one object

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;

use common::*;
use orpc::types::{hresult, InterfaceId, OrpcError};
use orpc::{orpc_operations, DispatchTable, InterfaceDescriptor, Operation, Reply};

const IROOT: InterfaceDescriptor = InterfaceDescriptor::new(
    "IRoot",
    InterfaceId::from_u128(0x5a00_0001).with_version(1, 0),
    None,
    7,
);
const IMIDDLE: InterfaceDescriptor = InterfaceDescriptor::new(
    "IMiddle",
    InterfaceId::from_u128(0x5a00_0002).with_version(1, 0),
    Some(&IROOT),
    7,
);
const ILEAF: InterfaceDescriptor = InterfaceDescriptor::new(
    "ILeaf",
    InterfaceId::from_u128(0x5a00_0003).with_version(1, 0),
    Some(&IMIDDLE),
    6,
);
const ISIBLING: InterfaceDescriptor = InterfaceDescriptor::new(
    "ISibling",
    InterfaceId::from_u128(0x5a00_0004).with_version(1, 0),
    Some(&IMIDDLE),
    1,
);

orpc_operations! {
    RootProbe(IROOT, 5): () => u32;
    MiddleProbe(IMIDDLE, 10): () => u32;
    LeafProbe(ILEAF, 16): () => u32;
    /// Beyond every range in the chain
    Stray(ILEAF, 99): () => u32;
    SiblingProbe(ISIBLING, 14): () => u32;
}

fn root_table() -> Arc<DispatchTable> {
    DispatchTable::builder(&IROOT)
        .operation::<RootProbe, _, _>(|_ctx, ()| async { Ok(Reply::ok(5)) })
        .build()
        .unwrap()
}

fn middle_table() -> Arc<DispatchTable> {
    DispatchTable::builder(&IMIDDLE)
        .inherits(root_table())
        .operation::<MiddleProbe, _, _>(|_ctx, ()| async { Ok(Reply::ok(10)) })
        .build()
        .unwrap()
}

fn leaf_table(base: Arc<DispatchTable>) -> Arc<DispatchTable> {
    DispatchTable::builder(&ILEAF)
        .inherits(base)
        .operation::<LeafProbe, _, _>(|_ctx, ()| async { Ok(Reply::ok(16)) })
        .build()
        .unwrap()
}

/// Test: each opnum lands on the level that owns it
#[tokio::test]
async fn test_three_level_chain() {
    let fixture = Fixture::new();
    let exported = fixture.server.export(leaf_table(middle_table()));
    let leaf = fixture.connection.bind(&ILEAF, exported.ipid);

    assert_eq!(IROOT.local_range(), 0..7);
    assert_eq!(IMIDDLE.local_range(), 7..14);
    assert_eq!(ILEAF.local_range(), 14..20);

    let root = fixture.connection.invoke::<RootProbe>(Some(&leaf), &()).await.unwrap();
    assert_eq!(root.into_result().unwrap(), 5);
    let middle = fixture.connection.invoke::<MiddleProbe>(Some(&leaf), &()).await.unwrap();
    assert_eq!(middle.into_result().unwrap(), 10);
    let derived = fixture.connection.invoke::<LeafProbe>(Some(&leaf), &()).await.unwrap();
    assert_eq!(derived.into_result().unwrap(), 16);

    let err = fixture.connection.invoke::<Stray>(Some(&leaf), &()).await.unwrap_err();
    assert!(matches!(err, OrpcError::UnknownOperation { interface: "ILeaf", opnum: 99 }));
}

/// Test: unregistered opnums inside a range are unknown, not a crash
#[tokio::test]
async fn test_unregistered_opnums() {
    let table = leaf_table(middle_table());
    for opnum in [0, 4, 6, 7, 13, 14, 19, 20] {
        assert!(table.lookup(opnum).is_none(), "opnum {} resolved", opnum);
    }
    assert_eq!(table.lookup(5).map(|(d, m)| (d.name, m)), Some(("IRoot", "RootProbe")));
    assert_eq!(table.lookup(10).map(|(d, m)| (d.name, m)), Some(("IMiddle", "MiddleProbe")));

    let fixture = Fixture::new();
    let exported = fixture.server.export(table);
    let leaf = fixture.connection.bind(&ILEAF, exported.ipid);

    // Declared on IRoot at an opnum nothing registered
    orpc_operations! {
        RootGap(IROOT, 6): () => u32;
    }
    let err = fixture.connection.invoke::<RootGap>(Some(&leaf), &()).await.unwrap_err();
    assert!(matches!(err, OrpcError::UnknownOperation { opnum: 6, .. }));

    let stats = fixture.server.stats();
    assert_eq!(stats.calls_failed, 1);
}

/// Test: two derived interfaces extend one base table without touching it
#[tokio::test]
async fn test_sibling_tables_share_base() {
    let middle = middle_table();
    let leaf = leaf_table(middle.clone());
    let sibling = DispatchTable::builder(&ISIBLING)
        .inherits(middle.clone())
        .operation::<SiblingProbe, _, _>(|_ctx, ()| async { Ok(Reply::ok(14)) })
        .build()
        .unwrap();

    assert!(middle.lookup(14).is_none());
    assert_eq!(leaf.lookup(14), None);
    assert_eq!(sibling.lookup(14).map(|(_, m)| m), Some("SiblingProbe"));
    assert_eq!(leaf.lookup(16).map(|(_, m)| m), Some("LeafProbe"));

    let fixture = Fixture::new();
    let sibling_ref = fixture.connection.bind(&ISIBLING, fixture.server.export(sibling).ipid);
    let leaf_ref = fixture.connection.bind(&ILEAF, fixture.server.export(leaf).ipid);

    let value = fixture.connection.invoke::<SiblingProbe>(Some(&sibling_ref), &()).await.unwrap();
    assert_eq!(value.into_result().unwrap(), 14);
    let value = fixture.connection.invoke::<MiddleProbe>(Some(&sibling_ref), &()).await.unwrap();
    assert_eq!(value.into_result().unwrap(), 10);

    // ILeaf does not derive from ISibling
    let err = fixture.connection.invoke::<SiblingProbe>(Some(&leaf_ref), &()).await.unwrap_err();
    assert!(matches!(err, OrpcError::InterfaceMismatch { .. }));
}

/// Test: a reference bound to an interface the object lacks is refused by
/// the server
#[tokio::test]
async fn test_server_checks_bound_interface() {
    let fixture = Fixture::new();
    let exported = fixture.server.export(middle_table());
    let claimed_leaf = fixture.connection.bind(&ILEAF, exported.ipid);

    let err = fixture.connection.invoke::<RootProbe>(Some(&claimed_leaf), &()).await.unwrap_err();
    match err {
        OrpcError::InterfaceMismatch { ipid, requested } => {
            assert_eq!(ipid, exported.ipid);
            assert_eq!(requested, ILEAF.id);
        }
        other => panic!("unexpected {:?}", other),
    }
}

/// Test: the IDispatch members every automation interface inherits
#[tokio::test]
async fn test_idispatch_members() {
    use orpc::dispatch::well_known::GetTypeInfoCount;

    let fixture = Fixture::new();
    let label = export_label(&fixture.server, "alpha");
    let reference = fixture.connection.unmarshal(&label, &ILABEL).unwrap();

    let count = fixture.connection.invoke::<GetTypeInfoCount>(Some(&reference), &()).await.unwrap();
    assert_eq!(count.into_result().unwrap(), 0);

    orpc_operations! {
        Invoke(orpc::dispatch::well_known::IDISPATCH, 6): () => ();
        QueryInterface(orpc::dispatch::well_known::IUNKNOWN, 0): () => ();
    }
    let outcome = fixture.connection.invoke::<Invoke>(Some(&reference), &()).await.unwrap();
    assert_eq!(outcome.status(), hresult::E_NOTIMPL);

    let err = fixture
        .connection
        .invoke::<QueryInterface>(Some(&reference), &())
        .await
        .unwrap_err();
    assert!(matches!(err, OrpcError::UnknownOperation { opnum: 0, .. }));
    assert_eq!(QueryInterface::name(), "/IUnknown/v0/QueryInterface");
}

/// Test: concurrent calls on one object are not serialized
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatch() {
    const CALLS: usize = 64;

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let table = DispatchTable::builder(&IROOT)
        .operation::<RootProbe, _, _>(move |_ctx, ()| {
            let counter = counter.clone();
            async move {
                tokio::task::yield_now().await;
                Ok(Reply::ok(counter.fetch_add(1, Ordering::SeqCst) as u32))
            }
        })
        .build()
        .unwrap();

    let fixture = Fixture::new();
    let reference = fixture.connection.bind(&IROOT, fixture.server.export(table).ipid);

    let calls = (0..CALLS).map(|_| {
        let connection = fixture.connection.clone();
        async move { connection.invoke::<RootProbe>(Some(&reference), &()).await }
    });
    let mut seen: Vec<u32> = join_all(calls)
        .await
        .into_iter()
        .map(|r| r.unwrap().into_result().unwrap())
        .collect();
    seen.sort_unstable();

    assert_eq!(seen, (0..CALLS as u32).collect::<Vec<_>>());
    assert_eq!(hits.load(Ordering::SeqCst), CALLS);
    assert_eq!(fixture.server.stats().calls_processed, CALLS as u64);
}
