// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    authentication_key::{derive_authentication_key, Scheme},
    hash::*,
};
use proptest::{collection::vec, prelude::*};
use serde::Serialize;
use std::str::FromStr;

#[derive(Serialize)]
struct Foo(u32);

impl CryptoHash for Foo {
    const DOMAIN_NAME: &'static str = "Foo";
}

#[derive(Serialize)]
struct RawTransaction;

impl CryptoHash for RawTransaction {
    const DOMAIN_NAME: &'static str = "RawTransaction";
}

#[derive(Serialize)]
struct RawTransactionWithData;

impl CryptoHash for RawTransactionWithData {
    const DOMAIN_NAME: &'static str = "RawTransactionWithData";
}

#[test]
fn test_sha3_256_of() {
    assert_eq!(
        HashValue::sha3_256_of(b"hello").to_hex(),
        "3338be694f50c5f338814986cdf0686453a888b84f424d792af4b9202398f392",
    );
    assert_eq!(
        HashValue::from_iter_sha3([&b"hel"[..], &b"lo"[..]]),
        HashValue::sha3_256_of(b"hello"),
    );
}

#[test]
fn test_domain_seeds() {
    assert_eq!(
        RawTransaction::domain_seed().to_hex(),
        "b5e97db07fa0bd0e5598aa3643a9bc6f6693bddc1a9fec9e674a461eaa00b193",
    );
    assert_eq!(
        RawTransactionWithData::domain_seed().to_hex(),
        "5efa3c4f02f83a0f4b2d69fc95c607cc02825cc4e7be536ef0992df050d9e67c",
    );
    assert_eq!(Foo::domain_seed(), HashValue::sha3_256_of(b"APTOS::Foo"));
}

#[test]
fn test_signing_message_and_hash() {
    let message = signing_message(&Foo(3)).unwrap();
    let mut expected = Foo::domain_seed().to_vec();
    expected.extend_from_slice(&3u32.to_le_bytes());
    assert_eq!(message, expected);
    assert_eq!(Foo(3).hash().unwrap(), HashValue::sha3_256_of(&expected));
}

#[test]
fn test_from_slice() {
    assert_eq!(HashValue::from_slice(vec![0; 32]).unwrap(), HashValue::zero());
    // The length is mismatched.
    assert!(HashValue::from_slice(vec![0; 31]).is_err());
    assert!(HashValue::from_slice(vec![0; 33]).is_err());
}

#[test]
fn test_hex_forms() {
    let hash = HashValue::sha3_256_of(b"world");
    let hex = hash.to_hex();
    assert_eq!(hex.len(), 64);
    assert_eq!(hash.to_hex_literal(), format!("0x{}", hex));
    assert_eq!(HashValue::from_hex(&hex).unwrap(), hash);
    assert_eq!(HashValue::from_str(&hash.to_hex_literal()).unwrap(), hash);
    assert_eq!(format!("{:x}", hash), hex);
    assert_eq!(format!("{}", hash), hex[..8]);
    assert!(HashValue::from_hex("0x1234").is_err());
    assert!(HashValue::from_hex("zz").is_err());
}

#[test]
fn test_serde() {
    let hash = HashValue::sha3_256_of(b"serde");
    let json = serde_json::to_string(&hash).unwrap();
    assert_eq!(json, format!("\"{}\"", hash.to_hex_literal()));
    assert_eq!(serde_json::from_str::<HashValue>(&json).unwrap(), hash);

    let bytes = aptos_bcs::to_bytes(&hash).unwrap();
    assert_eq!(bytes[0], 32);
    assert_eq!(&bytes[1..], hash.as_slice());
    assert_eq!(aptos_bcs::from_bytes::<HashValue>(&bytes).unwrap(), hash);
}

#[test]
fn test_authentication_key_derivation() {
    let material = [7u8; 32];
    let mut input = material.to_vec();
    input.push(0);
    assert_eq!(
        derive_authentication_key(&material, Scheme::Ed25519),
        HashValue::sha3_256_of(&input).into_inner(),
    );
    assert_eq!(Scheme::DeriveResourceAccountAddress.as_byte(), 255);
    assert_eq!(Scheme::DeriveObjectAddressFromSeed.as_byte(), 254);
    assert_eq!(Scheme::DeriveObjectAddressFromObject.as_byte(), 252);
    assert_eq!(Scheme::MultiKey.as_byte(), 3);
}

proptest! {
    #[test]
    fn test_hex_roundtrip(bytes in vec(any::<u8>(), 32)) {
        let hash = HashValue::from_slice(&bytes).unwrap();
        prop_assert_eq!(HashValue::from_hex(hash.to_hex()).unwrap(), hash);
    }
}
