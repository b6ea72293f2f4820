//! Codec Tests - Wire Layout Across Crates
//!
//! These tests check encodings the object layer depends on:
//! - Response framing in both byte orders
//! - Interface pointers embedded in messages
//! - Deferred referents and tampered pointer counts
//! - Closed enumerations and dynamically shaped values

use bytes::{Bytes, BytesMut};

use orpc::collection::{CollectionState, CommitOptions};
use orpc::envelope::{decode_response, encode_response, Response};
use orpc::job::JobStatus;
use orpc::types::{
    hresult, InterfacePointer, Ipid, ObjRef, Oid, OrpcError, OrpcThat, Oxid, StdObjRef,
};
use orpc_ndr::{
    decode, encode, ndr_struct, BString, Field, NdrContext, NdrError, NdrWriter, Shape, StringForm,
    UniquePtr, Uuid, Value, FIRST_REFERENT_ID,
};

ndr_struct! {
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Pair {
        pub id: u32,
        pub left: UniquePtr<BString>,
        pub right: UniquePtr<BString>,
    }
}

fn pair(left: Option<&str>, right: Option<&str>) -> Pair {
    Pair {
        id: 7,
        left: UniquePtr::from_option(left.map(BString::from)),
        right: UniquePtr::from_option(right.map(BString::from)),
    }
}

fn pointer() -> InterfacePointer {
    InterfacePointer::new(ObjRef::new(
        Uuid::from_u128(0x6f3e_2c14_5a1b_4c2e_9d47_3b8f_1a2c_5e01),
        StdObjRef::new_noping(Oxid::new(0x11), Oid::new(0x22), Ipid::generate(), 5),
    ))
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Test: the status closes the response in the caller's byte order
#[test]
fn test_response_framing_big_endian() {
    let ctx = NdrContext::big_endian();
    let body = pair(Some("left"), None);
    let stub = encode_response(&OrpcThat::new(), &body, hresult::NOT_FOUND, ctx).unwrap();

    assert_eq!(
        &stub[stub.len() - 4..],
        &hresult::NOT_FOUND.bits().to_be_bytes()
    );

    let response: Response<Pair> = decode_response(stub.clone(), ctx).unwrap();
    assert_eq!(response.status, hresult::NOT_FOUND);
    assert_eq!(response.body, body);

    // Read in the wrong order, the message no longer lines up
    assert!(decode_response::<Pair>(stub, NdrContext::new()).is_err());
}

/// Test: an OBJREF stays little-endian inside a big-endian message
#[test]
fn test_interface_pointer_in_big_endian_message() {
    let original = pointer();
    let value = UniquePtr::new(original.clone());
    let bytes = encode(&value, NdrContext::big_endian()).unwrap();

    let signature = bytes.windows(4).position(|w| w == b"MEOW");
    assert!(signature.is_some(), "OBJREF signature not found");

    let decoded: UniquePtr<InterfacePointer> = decode(bytes, NdrContext::big_endian()).unwrap();
    assert_eq!(decoded.get(), Some(&original));
    assert_eq!(decoded.get().unwrap().objref().std.public_refs, 5);
}

/// Test: referents follow the inline part in field order, null ones take
/// no referent ID
#[test]
fn test_referent_ordering() {
    let bytes = encode(&pair(Some("a"), Some("bc")), NdrContext::new()).unwrap();
    assert_eq!(u32_at(&bytes, 0), 7);
    assert_eq!(u32_at(&bytes, 4), FIRST_REFERENT_ID);
    assert_eq!(u32_at(&bytes, 8), FIRST_REFERENT_ID + 4);
    // First referent: "a", counted without terminator
    assert_eq!(u32_at(&bytes, 12), 1);
    assert_eq!(u32_at(&bytes, 16), 2);
    assert_eq!(u32_at(&bytes, 20), 1);

    let bytes = encode(&pair(None, Some("bc")), NdrContext::new()).unwrap();
    assert_eq!(u32_at(&bytes, 4), 0);
    assert_eq!(u32_at(&bytes, 8), FIRST_REFERENT_ID);
}

/// Test: a null string and an empty string encode differently
#[test]
fn test_null_and_empty_strings() {
    let null = encode(&UniquePtr::<BString>::null(), NdrContext::new()).unwrap();
    assert_eq!(&null[..], &[0, 0, 0, 0]);

    let empty = encode(&UniquePtr::new(BString::new("")), NdrContext::new()).unwrap();
    assert_eq!(empty.len(), 16);
    assert_eq!(u32_at(&empty, 0), FIRST_REFERENT_ID);
    assert_eq!(&empty[4..], &[0u8; 12]);

    let decoded: UniquePtr<BString> = decode(empty, NdrContext::new()).unwrap();
    assert_eq!(decoded.get().map(BString::as_str), Some(""));
    let decoded: UniquePtr<BString> = decode(null, NdrContext::new()).unwrap();
    assert!(decoded.is_null());
}

/// Test: referent IDs without referent bodies, and bodies without IDs
#[test]
fn test_tampered_pointer_counts() {
    let bytes = encode(&pair(Some("a"), Some("b")), NdrContext::new()).unwrap();

    // Drop the second referent body
    let truncated = bytes.slice(..bytes.len() - 14);
    let err = decode::<Pair>(truncated, NdrContext::new()).unwrap_err();
    assert!(
        matches!(err, NdrError::PointerCountMismatch { expected: 2, .. }),
        "{:?}",
        err
    );

    // Null out the second referent ID but keep its body
    let mut tampered = BytesMut::from(&bytes[..]);
    tampered[8..12].copy_from_slice(&[0, 0, 0, 0]);
    let err = decode::<Pair>(tampered.freeze(), NdrContext::new()).unwrap_err();
    assert!(
        matches!(err, NdrError::PointerCountMismatch { expected: 1, .. }),
        "{:?}",
        err
    );
}

/// Test: ordinals outside an enumeration's set are rejected by name
#[test]
fn test_closed_enumerations() {
    let ctx = NdrContext::new();
    let err = decode::<CollectionState>(encode(&9u16, ctx).unwrap(), ctx).unwrap_err();
    assert!(matches!(
        err,
        NdrError::InvalidDiscriminant { type_name: "CollectionState", value: 9 }
    ));

    let err = decode::<JobStatus>(encode(&0u16, ctx).unwrap(), ctx).unwrap_err();
    assert!(matches!(err, NdrError::InvalidDiscriminant { type_name: "JobStatus", value: 0 }));

    let state: CollectionState = decode(encode(&3u16, ctx).unwrap(), ctx).unwrap();
    assert_eq!(state, CollectionState::Cancelled);
    assert_eq!(
        encode(&CommitOptions::Asynchronous, ctx).unwrap().as_ref(),
        &[1, 0]
    );

    // Inside a response the failure surfaces as a codec error
    let mut w = NdrWriter::new(ctx);
    w.write(&OrpcThat::new()).unwrap();
    w.write(&42u16).unwrap();
    w.write(&hresult::S_OK).unwrap();
    let err = decode_response::<JobStatus>(w.finish().unwrap(), ctx).unwrap_err();
    assert!(matches!(err, OrpcError::Codec(NdrError::InvalidDiscriminant { .. })));
}

/// Test: a dynamically shaped record matches the typed codec byte for byte
#[test]
fn test_shape_matches_typed_codec() {
    let shape = Shape::record([
        Field::new("id", Shape::U32),
        Field::new("left", Shape::unique(Shape::String(StringForm::FreeForm))),
        Field::new("right", Shape::unique(Shape::String(StringForm::FreeForm))),
    ]);
    let value = Value::record([
        ("id", Value::U32(7)),
        ("left", Value::null()),
        ("right", Value::some(Value::string("right"))),
    ]);

    for ctx in [NdrContext::new(), NdrContext::big_endian()] {
        let dynamic = shape.encode(&value, ctx).unwrap();
        let typed = encode(&pair(None, Some("right")), ctx).unwrap();
        assert_eq!(dynamic, typed);

        assert_eq!(shape.decode(typed, ctx).unwrap(), value);
        let back: Pair = decode(dynamic, ctx).unwrap();
        assert_eq!(back, pair(None, Some("right")));
    }

    let ordinals: Vec<u16> = CollectionState::ALL.iter().map(|s| s.ordinal()).collect();
    let states = Shape::enumeration("CollectionState", ordinals);
    let err = states.decode(Bytes::from_static(&[0x10, 0]), NdrContext::new()).unwrap_err();
    assert!(matches!(err, NdrError::InvalidDiscriminant { value: 16, .. }));
}
