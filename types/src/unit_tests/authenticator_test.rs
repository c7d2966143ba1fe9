// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::transaction::authenticator::{
    AccountAuthenticator, AnyPublicKey, AnySignature, AuthenticationError, AuthenticationKey,
    MultiKey, MultiKeyAuthenticator, MultiKeySignature, SingleKeyAuthenticator,
    TransactionAuthenticator,
};
use aptos_crypto::{
    ed25519::{Ed25519PrivateKey, Ed25519Signature},
    hash::CryptoHash,
    secp256k1_ecdsa::Secp256k1EcdsaPrivateKey,
    traits::MessageSigner,
    Scheme,
};
use claims::{assert_err, assert_matches, assert_ok};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Serialize, Deserialize)]
struct TestMessage(String);

impl CryptoHash for TestMessage {
    const DOMAIN_NAME: &'static str = "TestMessage";
}

fn ed25519_key(seed: u8) -> Ed25519PrivateKey {
    Ed25519PrivateKey::from_seed(&[seed; 32]).unwrap()
}

fn secp256k1_key(last_byte: u8) -> Secp256k1EcdsaPrivateKey {
    let mut bytes = [0u8; 32];
    bytes[31] = last_byte;
    Secp256k1EcdsaPrivateKey::try_from(&bytes[..]).unwrap()
}

/// Ed25519, Secp256k1, Ed25519 with a threshold of two.
fn mixed_multi_key() -> (Ed25519PrivateKey, Secp256k1EcdsaPrivateKey, Ed25519PrivateKey, MultiKey) {
    let first = ed25519_key(0);
    let second = secp256k1_key(1);
    let third = ed25519_key(3);
    let multi_key = MultiKey::new(
        vec![
            AnyPublicKey::ed25519(first.public_key()),
            AnyPublicKey::secp256k1_ecdsa(second.public_key()),
            AnyPublicKey::ed25519(third.public_key()),
        ],
        2,
    )
    .unwrap();
    (first, second, third, multi_key)
}

#[test]
fn test_multi_key_two_of_three() {
    let (first, _, third, multi_key) = mixed_multi_key();
    let message = b"multi key message";

    let signatures = MultiKeySignature::new(vec![
        (2, AnySignature::ed25519(third.sign_arbitrary_message(message))),
        (0, AnySignature::ed25519(first.sign_arbitrary_message(message))),
    ])
    .unwrap();
    assert_eq!(signatures.bitmap(), &[0b1010_0000, 0, 0, 0]);
    assert_eq!(signatures.signer_indexes(), vec![0, 2]);

    let authenticator = MultiKeyAuthenticator::new(multi_key.clone(), signatures);
    assert_ok!(authenticator.verify_arbitrary_msg(message));
    assert_err!(authenticator.verify_arbitrary_msg(b"another message"));

    let only_first = MultiKeySignature::new(vec![(
        0,
        AnySignature::ed25519(first.sign_arbitrary_message(message)),
    )])
    .unwrap();
    assert_matches!(
        MultiKeyAuthenticator::new(multi_key, only_first).verify_arbitrary_msg(message),
        Err(AuthenticationError::ThresholdNotMet {
            signatures: 1,
            threshold: 2
        })
    );
}

#[test]
fn test_multi_key_with_secp256k1_signer() {
    let (first, second, _, multi_key) = mixed_multi_key();
    let message = TestMessage("hello".to_string());

    let signatures = MultiKeySignature::new(vec![
        (0, AnySignature::ed25519(first.sign(&message).unwrap())),
        (1, AnySignature::secp256k1_ecdsa(second.sign(&message).unwrap())),
    ])
    .unwrap();
    assert_eq!(signatures.bitmap(), &[0b1100_0000, 0, 0, 0]);
    let authenticator = AccountAuthenticator::multi_key(MultiKeyAuthenticator::new(
        multi_key.clone(),
        signatures,
    ));
    assert_ok!(authenticator.verify(&message));
    assert_eq!(
        authenticator.authentication_key(),
        Some(AuthenticationKey::multi_key(multi_key))
    );
    assert_eq!(authenticator.number_of_signatures(), 2);
}

#[test]
fn test_multi_key_signature_at_wrong_index() {
    let (first, _, third, multi_key) = mixed_multi_key();
    let message = b"multi key message";
    // The first key's signature claims index 2.
    let signatures = MultiKeySignature::new(vec![
        (1, AnySignature::ed25519(third.sign_arbitrary_message(message))),
        (2, AnySignature::ed25519(first.sign_arbitrary_message(message))),
    ])
    .unwrap();
    assert_err!(MultiKeyAuthenticator::new(multi_key, signatures).verify_arbitrary_msg(message));
}

#[test]
fn test_multi_key_validation() {
    let key = AnyPublicKey::ed25519(ed25519_key(0).public_key());
    assert_err!(MultiKey::new(vec![], 1));
    assert_err!(MultiKey::new(vec![key.clone()], 0));
    assert_err!(MultiKey::new(vec![key.clone()], 2));
    assert_err!(MultiKey::new(vec![key.clone(); 33], 1));
    assert_ok!(MultiKey::new(vec![key; 32], 32));

    let signature = AnySignature::ed25519(Ed25519Signature::simulation());
    assert_err!(MultiKeySignature::new(vec![]));
    assert_err!(MultiKeySignature::new(vec![(32, signature.clone())]));
    assert_err!(MultiKeySignature::new(vec![
        (1, signature.clone()),
        (1, signature)
    ]));
}

#[test]
fn test_multi_key_bcs() {
    let (first, _, third, multi_key) = mixed_multi_key();
    let signatures = MultiKeySignature::new(vec![
        (0, AnySignature::ed25519(first.sign_arbitrary_message(b"m"))),
        (2, AnySignature::ed25519(third.sign_arbitrary_message(b"m"))),
    ])
    .unwrap();

    assert_eq!(multi_key.to_bytes(), aptos_bcs::to_bytes(&multi_key).unwrap());
    assert_eq!(signatures.to_bytes(), aptos_bcs::to_bytes(&signatures).unwrap());
    // Vector of two signatures, then the bitmap as a four byte vector.
    let bytes = signatures.to_bytes();
    assert_eq!(bytes[0], 2);
    assert_eq!(&bytes[bytes.len() - 5..], &[4, 0b1010_0000, 0, 0, 0]);

    let authenticator = AccountAuthenticator::multi_key(MultiKeyAuthenticator::new(
        multi_key, signatures,
    ));
    let encoded = aptos_bcs::to_bytes(&authenticator).unwrap();
    assert_eq!(encoded[0], 3);
    assert_eq!(
        aptos_bcs::from_bytes::<AccountAuthenticator>(&encoded).unwrap(),
        authenticator
    );
}

#[test]
fn test_multi_key_bitmap_must_be_four_bytes() {
    let (first, _, _, _) = mixed_multi_key();
    let signatures = MultiKeySignature::new(vec![(
        0,
        AnySignature::ed25519(first.sign_arbitrary_message(b"m")),
    )])
    .unwrap();
    let mut bytes = signatures.to_bytes();
    let len = bytes.len();
    bytes[len - 5] = 3;
    bytes.pop();
    assert_err!(aptos_bcs::from_bytes::<MultiKeySignature>(&bytes));
}

#[test]
fn test_single_key_authenticator() {
    let private_key = ed25519_key(0);
    let public_key = AnyPublicKey::ed25519(private_key.public_key());
    assert_eq!(
        AuthenticationKey::any_key(public_key.clone()).to_string(),
        "0x88a8d9236470f416e88a030f2e906b842c7efe8e92af4ce929a8af09ab012fab"
    );
    assert_eq!(public_key.to_bcs_bytes(), aptos_bcs::to_bytes(&public_key).unwrap());

    let message = b"single key";
    let signature = AnySignature::ed25519(private_key.sign_arbitrary_message(message));
    assert_eq!(signature.to_bcs_bytes(), aptos_bcs::to_bytes(&signature).unwrap());
    let authenticator = SingleKeyAuthenticator::new(public_key, signature).unwrap();
    assert_ok!(authenticator.verify_arbitrary_msg(message));

    let account = AccountAuthenticator::single_key(authenticator);
    assert_eq!(account.scheme(), Some(Scheme::SingleKey));
    let encoded = aptos_bcs::to_bytes(&account).unwrap();
    // Variant 2, then the Ed25519 variant of AnyPublicKey with a 32 byte key.
    assert_eq!(&encoded[..3], &[2, 0, 32]);
}

#[test]
fn test_key_type_mismatch() {
    let ed25519 = ed25519_key(0);
    let secp256k1 = secp256k1_key(1);
    let message = b"mismatch";

    assert_matches!(
        SingleKeyAuthenticator::new(
            AnyPublicKey::ed25519(ed25519.public_key()),
            AnySignature::secp256k1_ecdsa(secp256k1.sign_arbitrary_message(message)),
        ),
        Err(AuthenticationError::KeyTypeMismatch { .. })
    );
    assert_matches!(
        AccountAuthenticator::from_key_and_signature(
            AnyPublicKey::secp256k1_ecdsa(secp256k1.public_key()),
            AnySignature::ed25519(ed25519.sign_arbitrary_message(message)),
        ),
        Err(AuthenticationError::KeyTypeMismatch { .. })
    );
    assert_matches!(
        AnyPublicKey::ed25519(ed25519.public_key()).verify_arbitrary_msg(
            message,
            &AnySignature::secp256k1_ecdsa(secp256k1.sign_arbitrary_message(message))
        ),
        Err(AuthenticationError::KeyTypeMismatch { .. })
    );
}

#[test]
fn test_from_key_and_signature_dispatch() {
    let ed25519 = ed25519_key(0);
    let secp256k1 = secp256k1_key(1);
    let message = b"dispatch";

    let legacy = AccountAuthenticator::from_key_and_signature(
        AnyPublicKey::ed25519(ed25519.public_key()),
        AnySignature::ed25519(ed25519.sign_arbitrary_message(message)),
    )
    .unwrap();
    assert_matches!(legacy, AccountAuthenticator::Ed25519 { .. });
    assert_ok!(legacy.verify_arbitrary_msg(message));

    let single_key = AccountAuthenticator::from_key_and_signature(
        AnyPublicKey::secp256k1_ecdsa(secp256k1.public_key()),
        AnySignature::secp256k1_ecdsa(secp256k1.sign_arbitrary_message(message)),
    )
    .unwrap();
    assert_matches!(single_key, AccountAuthenticator::SingleKey { .. });
    assert_ok!(single_key.verify_arbitrary_msg(message));
    assert_eq!(
        single_key.authentication_key().unwrap().to_string(),
        "0xd27beca0d8d20fa2ce444c7beab733b080d020711abcb65b2cb991868fb8fddb"
    );
}

#[test]
fn test_no_account_authenticator() {
    let authenticator = AccountAuthenticator::NoAccountAuthenticator;
    assert_eq!(aptos_bcs::to_bytes(&authenticator).unwrap(), vec![4]);
    assert_eq!(authenticator.scheme(), None);
    assert_eq!(authenticator.authentication_key(), None);
    assert_err!(authenticator.verify_arbitrary_msg(b"anything"));
}

#[test]
fn test_legacy_ed25519_transaction_authenticator_bcs() {
    let private_key = ed25519_key(0);
    let signature = private_key.sign_arbitrary_message(b"m");
    let authenticator = TransactionAuthenticator::ed25519(private_key.public_key(), signature.clone());
    let encoded = aptos_bcs::to_bytes(&authenticator).unwrap();

    let mut expected = vec![0, 32];
    expected.extend(private_key.public_key().to_bytes());
    expected.push(64);
    expected.extend(signature.to_bytes());
    assert_eq!(encoded, expected);

    let single_sender = TransactionAuthenticator::single_sender(AccountAuthenticator::ed25519(
        private_key.public_key(),
        signature,
    ));
    // Single sender wraps the account authenticator with its own variant prefix.
    assert_eq!(&aptos_bcs::to_bytes(&single_sender).unwrap()[..3], &[4, 0, 32]);
}

#[test]
fn test_authentication_key_parsing() {
    let expected = AuthenticationKey::ed25519(&ed25519_key(0).public_key());
    let hex = "08e845d10bbb594fcffceb36d934a188bb84d9cdf7362e4e2522265b185127cb";
    assert_eq!(AuthenticationKey::from_str(hex).unwrap(), expected);
    assert_eq!(
        AuthenticationKey::from_str(&format!("0x{}", hex)).unwrap(),
        expected
    );
    assert_eq!(format!("{:x}", expected), hex);
    assert_eq!(expected.to_string(), format!("0x{}", hex));
    assert_eq!(expected.account_address().to_hex(), hex);
    assert_err!(AuthenticationKey::from_str("0x1234"));
    assert_err!(AuthenticationKey::try_from(vec![0u8; 31]));
    assert_eq!(
        AuthenticationKey::from_preimage(&ed25519_key(0).public_key().to_bytes(), Scheme::Ed25519),
        expected
    );
}
