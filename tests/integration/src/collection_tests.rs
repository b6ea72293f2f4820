//! Collection Tests - Enumeration, Editing and Commit
//!
//! These tests exercise the collection interfaces over a live server:
//! - Population lifecycle observed through `State` and `WaitForCompletion`
//! - 1-based indexing and lookups by id
//! - Mutable editing and the unsupported `Clone`
//! - Commit snapshots, synchronous and in the background

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::*;
use orpc::collection::{
    committable_collection_table, collection_table, mutable_collection_table, CollectionClient,
    CollectionItem, CollectionObject, CollectionState, CommitOptions, CommittableCollectionClient,
    MutableCollectionClient,
};
use orpc::server::ObjectServer;
use orpc::types::{hresult, InterfacePointer};

type Labels = CollectionObject<InterfacePointer>;

fn labels(server: &ObjectServer, names: &[&str]) -> Vec<InterfacePointer> {
    names.iter().map(|name| export_label(server, name)).collect()
}

async fn names(fixture: &Fixture, items: &[InterfacePointer]) -> Vec<String> {
    let mut names = Vec::new();
    for item in items {
        names.push(label_name(&fixture.connection, item).await);
    }
    names
}

fn read_only(fixture: &Fixture, object: Arc<Labels>) -> CollectionClient<InterfacePointer> {
    let pointer = fixture
        .server
        .export_pointer(collection_table::<InterfacePointer, _>(object).unwrap())
        .unwrap();
    CollectionClient::unmarshal(fixture.connection.clone(), &pointer).unwrap()
}

fn committable(
    fixture: &Fixture,
    object: Arc<Labels>,
) -> CommittableCollectionClient<InterfacePointer> {
    let pointer = fixture
        .server
        .export_pointer(committable_collection_table::<InterfacePointer, _>(object).unwrap())
        .unwrap();
    CommittableCollectionClient::unmarshal(fixture.connection.clone(), &pointer).unwrap()
}

/// Test: Building until populated, then Complete; Cancel afterwards is a
/// successful no-op
#[tokio::test]
async fn test_population_lifecycle() {
    let fixture = Fixture::new();
    let object = Labels::building();
    let client = read_only(&fixture, object.clone());

    assert_eq!(
        client.state().await.unwrap().into_result().unwrap(),
        CollectionState::Building
    );
    assert_eq!(client.count().await.unwrap().into_result().unwrap(), 0);

    for pointer in labels(&fixture.server, &["alpha", "beta"]) {
        assert!(object.push(pointer));
    }
    // Still building: clients must tolerate repeated Building polls
    assert_eq!(
        client.state().await.unwrap().into_result().unwrap(),
        CollectionState::Building
    );
    assert_eq!(client.count().await.unwrap().into_result().unwrap(), 2);

    object.finish();
    assert_eq!(
        client.state().await.unwrap().into_result().unwrap(),
        CollectionState::Complete
    );

    let cancel = client.cancel().await.unwrap();
    assert!(cancel.is_success());
    assert_eq!(
        client.state().await.unwrap().into_result().unwrap(),
        CollectionState::Complete
    );
    assert_eq!(
        client.wait_for_completion(0).await.unwrap().into_result().unwrap(),
        true
    );
}

/// Test: Cancel while building settles the collection as Cancelled
#[tokio::test]
async fn test_cancel_while_building() {
    let fixture = Fixture::new();
    let object = Labels::building();
    let client = read_only(&fixture, object.clone());

    assert!(client.cancel().await.unwrap().is_success());
    assert_eq!(object.state(), CollectionState::Cancelled);
    assert!(!object.push(export_label(&fixture.server, "late")));
    assert!(!object.finish());
    assert_eq!(
        client.state().await.unwrap().into_result().unwrap(),
        CollectionState::Cancelled
    );
}

/// Test: items are addressed from 1; out of range is NOT_FOUND
#[tokio::test]
async fn test_indexing() {
    let fixture = Fixture::new();
    let items = labels(&fixture.server, &["alpha", "beta", "gamma"]);
    let client = read_only(&fixture, Labels::complete(items.clone()));

    let first = client.item(1).await.unwrap().into_result().unwrap().unwrap();
    assert_eq!(first, items[0]);
    assert_eq!(label_name(&fixture.connection, &first).await, "alpha");

    for index in [0, 4, -1, i32::MAX] {
        let outcome = client.item(index).await.unwrap();
        assert_eq!(outcome.status(), hresult::NOT_FOUND, "index {}", index);
        assert_eq!(outcome.value(), &None);
    }

    let by_id = client.get_by_id(items[2].item_id()).await.unwrap().into_result().unwrap();
    assert_eq!(by_id.as_ref(), Some(&items[2]));
    let missing = client.get_by_id(export_label(&fixture.server, "x").item_id()).await.unwrap();
    assert_eq!(missing.status(), hresult::NOT_FOUND);

    let all = client.items().await.unwrap();
    assert_eq!(names(&fixture, &all).await, vec!["alpha", "beta", "gamma"]);
}

/// Test: each handed-out item carries references the client now holds
#[tokio::test]
async fn test_items_grant_references() {
    let fixture = Fixture::new();
    let items = labels(&fixture.server, &["alpha"]);
    let ipid = items[0].objref().std.ipid;
    let granted = items[0].objref().std.public_refs;
    let client = read_only(&fixture, Labels::complete(items));

    let exporter = fixture.server.exporter();
    let before = exporter.public_refs(&ipid).unwrap();
    client.item(1).await.unwrap().into_result().unwrap();
    client.item(1).await.unwrap().into_result().unwrap();
    assert_eq!(exporter.public_refs(&ipid), Some(before + 2 * granted));
}

/// Test: waiting is bounded by the caller and by the server
#[tokio::test]
async fn test_wait_for_completion() {
    let fixture = Fixture::with(ObjectServer::builder().max_wait(Duration::from_millis(100)));
    let object = Labels::building();
    let client = read_only(&fixture, object.clone());

    assert_eq!(
        client.wait_for_completion(0).await.unwrap().into_result().unwrap(),
        false
    );

    // Clamped to the server's bound
    let started = Instant::now();
    assert_eq!(
        client.wait_for_completion(3_600).await.unwrap().into_result().unwrap(),
        false
    );
    assert!(started.elapsed() < Duration::from_secs(10));

    let invalid = client.wait_for_completion(-1).await.unwrap();
    assert_eq!(invalid.status(), hresult::E_INVALIDARG);

    let finisher = {
        let object = object.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            object.finish();
        })
    };
    assert_eq!(
        client.wait_for_completion(1).await.unwrap().into_result().unwrap(),
        true
    );
    finisher.await.unwrap();
}

/// Test: Add, Remove and RemoveById with their failure statuses
#[tokio::test]
async fn test_mutable_editing() {
    let fixture = Fixture::new();
    let items = labels(&fixture.server, &["alpha", "beta"]);
    let object = Labels::complete(items.clone());
    let pointer = fixture
        .server
        .export_pointer(mutable_collection_table::<InterfacePointer, _>(object.clone()).unwrap())
        .unwrap();
    let client = MutableCollectionClient::unmarshal(fixture.connection.clone(), &pointer).unwrap();

    let duplicate = client.add(&items[0]).await.unwrap();
    assert_eq!(duplicate.status(), hresult::ALREADY_EXISTS);

    let gamma = export_label(&fixture.server, "gamma");
    assert!(client.add(&gamma).await.unwrap().is_success());
    assert_eq!(client.count().await.unwrap().into_result().unwrap(), 3);

    assert!(client.remove(1).await.unwrap().is_success());
    assert_eq!(client.remove(7).await.unwrap().status(), hresult::NOT_FOUND);

    assert!(client.remove_by_id(gamma.item_id()).await.unwrap().is_success());
    assert_eq!(
        client.remove_by_id(gamma.item_id()).await.unwrap().status(),
        hresult::NOT_FOUND
    );

    assert_eq!(object.items(), vec![items[1].clone()]);
    // A mutable collection is settled and stays editable
    assert_eq!(
        client.state().await.unwrap().into_result().unwrap(),
        CollectionState::Complete
    );
}

/// Test: Clone is part of the interface and always NOT_SUPPORTED
#[tokio::test]
async fn test_clone_not_supported() {
    let fixture = Fixture::new();
    let client = committable(&fixture, Labels::complete(labels(&fixture.server, &["alpha"])));

    let outcome = client.clone_collection().await.unwrap();
    let failure = outcome.failure().cloned().unwrap();
    assert_eq!(failure.code, hresult::NOT_SUPPORTED);
    assert_eq!(failure.operation_name(), "/IMutableCollection/v1/Clone");
    assert_eq!(outcome.into_value(), None);
}

/// Test: Commit returns a snapshot that later edits do not reach
#[tokio::test]
async fn test_commit_snapshot() {
    let fixture = Fixture::new();
    let items = labels(&fixture.server, &["A", "B"]);
    let object = Labels::complete(items.clone());
    let client = committable(&fixture, object.clone());

    let committed = client
        .commit(CommitOptions::None)
        .await
        .unwrap()
        .into_result()
        .unwrap()
        .unwrap();
    assert_eq!(
        committed.state().await.unwrap().into_result().unwrap(),
        CollectionState::Complete
    );
    assert_eq!(committed.items().await.unwrap(), items);

    let c = export_label(&fixture.server, "C");
    assert!(client.add(&c).await.unwrap().is_success());
    assert_eq!(client.count().await.unwrap().into_result().unwrap(), 3);

    let snapshot = committed.items().await.unwrap();
    assert_eq!(names(&fixture, &snapshot).await, vec!["A", "B"]);
    assert_eq!(object.committed(), items);

    // The committed collection is read-only
    let as_mutable = MutableCollectionClient::<InterfacePointer>::new(fixture.connection.clone())
        .ipid(committed.reference().unwrap().ipid());
    let err = as_mutable.add(&c).await.unwrap_err();
    assert!(matches!(err, orpc::OrpcError::InterfaceMismatch { .. }));
}

/// Test: an asynchronous commit hands back a collection still building
#[tokio::test]
async fn test_asynchronous_commit() {
    let fixture = Fixture::new();
    let items = labels(&fixture.server, &["A", "B", "C"]);
    let client = committable(&fixture, Labels::complete(items.clone()));

    let committed = client
        .commit(CommitOptions::Asynchronous)
        .await
        .unwrap()
        .into_result()
        .unwrap()
        .unwrap();

    assert_eq!(
        committed.wait_for_completion(5).await.unwrap().into_result().unwrap(),
        true
    );
    assert_eq!(
        committed.state().await.unwrap().into_result().unwrap(),
        CollectionState::Complete
    );
    assert_eq!(committed.items().await.unwrap(), items);
}
