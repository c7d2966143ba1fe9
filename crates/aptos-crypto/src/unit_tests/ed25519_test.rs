// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    ed25519::{Ed25519PrivateKey, Ed25519PublicKey, Ed25519Signature},
    traits::*,
    CryptoMaterialError,
};
use claims::{assert_err, assert_matches, assert_ok};
use proptest::prelude::*;

const ZERO_SEED_PUBLIC_KEY: &str =
    "3b6a27bcceb6a42d62a3a8d02a6f0d73653215771de243a63ac048a18b59da29";
const ZERO_SEED_AUTHENTICATION_KEY: &str =
    "08e845d10bbb594fcffceb36d934a188bb84d9cdf7362e4e2522265b185127cb";

fn zero_seed_key() -> Ed25519PrivateKey {
    Ed25519PrivateKey::from_seed(&[0u8; 32]).unwrap()
}

#[test]
fn test_zero_seed_key() {
    let private_key = zero_seed_key();
    assert_eq!(hex::encode(private_key.public_key().to_bytes()), ZERO_SEED_PUBLIC_KEY);
    assert_eq!(
        hex::encode(private_key.authentication_key()),
        ZERO_SEED_AUTHENTICATION_KEY
    );
    assert_eq!(
        private_key.public_key().authentication_key(),
        private_key.authentication_key()
    );
}

#[test]
fn test_sign_and_verify() {
    let private_key = zero_seed_key();
    let public_key = private_key.public_key();
    let message = b"Hello world";

    let signature = private_key.sign_arbitrary_message(message);
    assert_ok!(signature.verify_arbitrary_msg(message, &public_key));
    assert_err!(signature.verify_arbitrary_msg(b"Wello Horld", &public_key));

    let other = Ed25519PrivateKey::from_seed(&[1u8; 32]).unwrap();
    assert_err!(signature.verify_arbitrary_msg(message, &other.public_key()));

    // Ed25519 is deterministic.
    assert_eq!(signature, private_key.sign_arbitrary_message(message));
}

#[test]
fn test_simulation_signature_does_not_verify() {
    let private_key = zero_seed_key();
    let signature = private_key.simulation_signature();
    assert_eq!(signature.to_bytes(), [0u8; 64]);
    assert_err!(signature.verify_arbitrary_msg(b"anything", &private_key.public_key()));
}

#[test]
fn test_reload_from_bytes_invalidates_cache() {
    let private_key = zero_seed_key();
    let first = private_key.public_key();
    private_key.reload_from_bytes(&[1u8; 32]).unwrap();
    let second = private_key.public_key();
    assert_ne!(first, second);
    assert_eq!(
        second,
        Ed25519PrivateKey::from_seed(&[1u8; 32]).unwrap().public_key()
    );
    assert_eq!(private_key.authentication_key(), second.authentication_key());

    assert_matches!(
        private_key.reload_from_bytes(&[1u8; 31]),
        Err(CryptoMaterialError::WrongLengthError)
    );
    // A failed reload keeps the previous key.
    assert_eq!(private_key.public_key(), second);
}

#[test]
fn test_aip_80() {
    let private_key = zero_seed_key();
    let encoded = private_key.to_aip_80_string().unwrap();
    assert_eq!(encoded, format!("ed25519-priv-0x{}", "00".repeat(32)));
    let decoded = Ed25519PrivateKey::from_encoded_string(&encoded).unwrap();
    assert_eq!(decoded.public_key(), private_key.public_key());

    // Legacy forms.
    let legacy = format!("0x{}", "00".repeat(32));
    assert_ok!(Ed25519PrivateKey::from_encoded_string(&legacy));
    assert_ok!(Ed25519PrivateKey::from_encoded_string(&legacy[2..]));

    // The prefix is case sensitive and must be followed by 0x.
    assert_matches!(
        Ed25519PrivateKey::from_encoded_string(&encoded.replacen("ed25519", "Ed25519", 1)),
        Err(CryptoMaterialError::InvalidAip80Encoding(_))
    );
    assert_matches!(
        Ed25519PrivateKey::from_encoded_string(&format!("ed25519-priv-{}", "00".repeat(32))),
        Err(CryptoMaterialError::InvalidAip80Encoding(_))
    );
    assert_matches!(
        Ed25519PrivateKey::from_encoded_string(&format!("secp256k1-priv-0x{}", "00".repeat(32))),
        Err(CryptoMaterialError::InvalidAip80Encoding(_))
    );
    assert_err!(Ed25519PrivateKey::from_encoded_string("ed25519-priv-0xzz"));

    // Public keys have no text prefix.
    assert_err!(private_key.public_key().to_aip_80_string());
}

#[test]
fn test_private_key_is_not_printed() {
    let private_key = zero_seed_key();
    assert_eq!(
        format!("{:?}", private_key),
        "<elided secret for Ed25519PrivateKey>"
    );
    assert_eq!(
        format!("{}", private_key),
        "<elided secret for Ed25519PrivateKey>"
    );
}

#[test]
fn test_wrong_lengths() {
    assert_matches!(
        Ed25519PublicKey::try_from(&[0u8; 31][..]),
        Err(CryptoMaterialError::WrongLengthError)
    );
    assert_matches!(
        Ed25519Signature::try_from(&[0u8; 63][..]),
        Err(CryptoMaterialError::WrongLengthError)
    );
    assert_matches!(
        Ed25519PrivateKey::try_from(&[0u8; 33][..]),
        Err(CryptoMaterialError::WrongLengthError)
    );
}

#[test]
fn test_serde() {
    let private_key = zero_seed_key();
    let public_key = private_key.public_key();

    let bytes = aptos_bcs::to_bytes(&public_key).unwrap();
    assert_eq!(bytes[0], 32);
    assert_eq!(&bytes[1..], &public_key.to_bytes()[..]);
    assert_eq!(
        aptos_bcs::from_bytes::<Ed25519PublicKey>(&bytes).unwrap(),
        public_key
    );

    let signature = private_key.sign_arbitrary_message(b"serde");
    let bytes = aptos_bcs::to_bytes(&signature).unwrap();
    assert_eq!(bytes[0], 64);
    assert_eq!(
        aptos_bcs::from_bytes::<Ed25519Signature>(&bytes).unwrap(),
        signature
    );

    let json = serde_json::to_string(&public_key).unwrap();
    assert_eq!(json, format!("\"0x{}\"", ZERO_SEED_PUBLIC_KEY));
    assert_eq!(
        serde_json::from_str::<Ed25519PublicKey>(&json).unwrap(),
        public_key
    );
}

proptest! {
    #[test]
    fn test_sign_verify_roundtrip(
        private_key in any::<Ed25519PrivateKey>(),
        message in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let signature = private_key.sign_arbitrary_message(&message);
        prop_assert!(signature
            .verify_arbitrary_msg(&message, &private_key.public_key())
            .is_ok());
    }
}
