// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{from_bytes, serialized_size, to_bytes, to_bytes_with_limit, Error};
use claims::{assert_err, assert_err_eq, assert_ok};
use proptest::{collection::vec, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
enum Shape {
    Unit,
    Newtype(u32),
    Tuple(u8, bool),
    Struct { name: String, tags: Vec<u16> },
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
struct Envelope {
    version: u8,
    shapes: Vec<Shape>,
    memo: Option<String>,
    #[serde(with = "serde_bytes")]
    blob: Vec<u8>,
    signature: [u8; 4],
    amounts: (u64, u128, i64),
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        Just(Shape::Unit),
        any::<u32>().prop_map(Shape::Newtype),
        (any::<u8>(), any::<bool>()).prop_map(|(a, b)| Shape::Tuple(a, b)),
        (".{0,12}", vec(any::<u16>(), 0..4))
            .prop_map(|(name, tags)| Shape::Struct { name, tags }),
    ]
}

fn arb_envelope() -> impl Strategy<Value = Envelope> {
    (
        any::<u8>(),
        vec(arb_shape(), 0..6),
        proptest::option::of(".{0,8}"),
        vec(any::<u8>(), 0..300),
        any::<[u8; 4]>(),
        any::<(u64, u128, i64)>(),
    )
        .prop_map(|(version, shapes, memo, blob, signature, amounts)| Envelope {
            version,
            shapes,
            memo,
            blob,
            signature,
            amounts,
        })
}

proptest! {
    #[test]
    fn matches_reference_encoding(envelope in arb_envelope()) {
        let ours = to_bytes(&envelope).unwrap();
        prop_assert_eq!(&ours, &bcs::to_bytes(&envelope).unwrap());
        prop_assert_eq!(serialized_size(&envelope).unwrap(), ours.len());
        prop_assert_eq!(from_bytes::<Envelope>(&ours).unwrap(), envelope);
    }

    #[test]
    fn trailing_bytes_are_rejected(envelope in arb_envelope(), extra in vec(any::<u8>(), 1..4)) {
        let mut bytes = to_bytes(&envelope).unwrap();
        bytes.extend_from_slice(&extra);
        prop_assert_eq!(
            from_bytes::<Envelope>(&bytes).unwrap_err(),
            Error::RemainingBytes(extra.len())
        );
    }

    #[test]
    fn truncated_input_is_rejected(envelope in arb_envelope()) {
        let bytes = to_bytes(&envelope).unwrap();
        prop_assert!(from_bytes::<Envelope>(&bytes[..bytes.len() - 1]).is_err());
    }
}

#[test]
fn enum_variants_use_uleb128_indexes() {
    assert_eq!(to_bytes(&Shape::Unit).unwrap(), vec![0]);
    assert_eq!(to_bytes(&Shape::Newtype(1)).unwrap(), vec![1, 1, 0, 0, 0]);
    assert_eq!(to_bytes(&Shape::Tuple(7, true)).unwrap(), vec![2, 7, 1]);
    assert_eq!(
        to_bytes(&Shape::Struct {
            name: "a".to_string(),
            tags: vec![2]
        })
        .unwrap(),
        vec![3, 1, b'a', 1, 2, 0]
    );
}

#[test]
fn long_sequences_use_multi_byte_lengths() {
    let bytes = to_bytes(&vec![0u8; 200]).unwrap();
    assert_eq!(&bytes[..2], &[0xc8, 0x01]);
    assert_eq!(bytes.len(), 202);
}

#[test]
fn maps_are_sorted_by_encoded_keys() {
    let mut map = BTreeMap::new();
    // 256 encodes as [0x00, 0x01] and sorts before 1 = [0x01, 0x00].
    map.insert(1u16, true);
    map.insert(256u16, false);
    let bytes = to_bytes(&map).unwrap();
    assert_eq!(bytes, vec![2, 0x00, 0x01, 0, 0x01, 0x00, 1]);
    assert_eq!(bytes, bcs::to_bytes(&map).unwrap());
    assert_eq!(from_bytes::<BTreeMap<u16, bool>>(&bytes).unwrap(), map);

    let unsorted = vec![2, 0x01, 0x00, 1, 0x00, 0x01, 0];
    assert_err_eq!(
        from_bytes::<BTreeMap<u16, bool>>(&unsorted),
        Error::NonCanonicalMap
    );
}

#[test]
fn floats_are_not_supported() {
    assert_err_eq!(to_bytes(&1.5f64), Error::NotSupported("serialize_f64"));
}

#[test]
fn invalid_bool_and_option_tags() {
    assert_err_eq!(from_bytes::<bool>(&[2]), Error::InvalidBool(2));
    assert_err_eq!(from_bytes::<Option<u8>>(&[3, 0]), Error::InvalidOptionTag(3));
}

#[derive(Debug, Deserialize, Serialize)]
struct Nested(Option<Box<Nested>>);

fn nest(depth: usize) -> Nested {
    (0..depth).fold(Nested(None), |inner, _| Nested(Some(Box::new(inner))))
}

#[test]
fn container_depth_is_bounded() {
    assert_ok!(to_bytes(&nest(10)));
    assert_err!(to_bytes_with_limit(&nest(10), 5));
    let deep = vec![1u8; 600];
    let mut bytes = deep;
    bytes.push(0);
    assert_err_eq!(
        from_bytes::<Nested>(&bytes),
        Error::ExceededContainerDepthLimit("Nested")
    );
}
