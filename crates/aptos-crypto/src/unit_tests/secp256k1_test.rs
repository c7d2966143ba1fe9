// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    secp256k1_ecdsa::{Secp256k1EcdsaPrivateKey, Secp256k1EcdsaPublicKey, Secp256k1EcdsaSignature},
    traits::*,
    CryptoMaterialError,
};
use claims::{assert_err, assert_matches, assert_ok};
use rand::{rngs::StdRng, SeedableRng};

/// The order of the secp256k1 group, big endian.
const GROUP_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

fn key_one() -> Secp256k1EcdsaPrivateKey {
    let mut bytes = [0u8; 32];
    bytes[31] = 1;
    Secp256k1EcdsaPrivateKey::try_from(&bytes[..]).unwrap()
}

/// Replaces `s` with `n - s`, which is an equally valid but non-canonical signature.
fn malleate(signature: &Secp256k1EcdsaSignature) -> [u8; 64] {
    let bytes = signature.to_bytes();
    let mut out = bytes;
    let mut borrow = 0i16;
    for i in (0..32).rev() {
        let mut diff = GROUP_ORDER[i] as i16 - bytes[32 + i] as i16 - borrow;
        borrow = if diff < 0 {
            diff += 256;
            1
        } else {
            0
        };
        out[32 + i] = diff as u8;
    }
    out
}

#[test]
fn test_public_key_and_authentication_key() {
    let private_key = key_one();
    assert_eq!(
        hex::encode(private_key.public_key().to_bytes()),
        "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8",
    );
    assert_eq!(
        hex::encode(private_key.authentication_key()),
        "d27beca0d8d20fa2ce444c7beab733b080d020711abcb65b2cb991868fb8fddb",
    );
}

#[test]
fn test_sign_and_verify() {
    let mut rng = StdRng::from_seed([7u8; 32]);
    let private_key = Secp256k1EcdsaPrivateKey::generate(&mut rng);
    let public_key = private_key.public_key();
    let message = b"Hello world";

    let signature = private_key.sign_arbitrary_message(message);
    assert_ok!(signature.verify_arbitrary_msg(message, &public_key));
    assert_err!(signature.verify_arbitrary_msg(b"Wello Horld", &public_key));
    assert_err!(signature.verify_arbitrary_msg(message, &key_one().public_key()));
}

#[test]
fn test_high_s_is_rejected() {
    let private_key = key_one();
    for message in [&b"a"[..], b"b", b"c", b"d"] {
        let signature = private_key.sign_arbitrary_message(message);
        let high_s = malleate(&signature);
        assert_matches!(
            Secp256k1EcdsaSignature::try_from(&high_s[..]),
            Err(CryptoMaterialError::CanonicalRepresentationError)
        );
    }
}

#[test]
fn test_simulation_signature() {
    let private_key = key_one();
    let signature = private_key.simulation_signature();
    assert_eq!(signature.to_bytes(), [0u8; 64]);
    assert_err!(signature.verify_arbitrary_msg(b"anything", &private_key.public_key()));
}

#[test]
fn test_recover_public_key() {
    let private_key = key_one();
    let message = b"recover me";
    let signature = private_key.sign_arbitrary_message(message);
    let authentication_key = private_key.authentication_key();

    let recovered = signature
        .recover_public_key(message, None, &authentication_key)
        .unwrap();
    assert_eq!(recovered, private_key.public_key());

    assert_err!(signature.recover_public_key(message, None, &[0u8; 32]));
    assert_err!(signature.recover_public_key(message, Some(9), &authentication_key));
}

#[test]
fn test_reload_from_bytes() {
    let private_key = key_one();
    let before = private_key.authentication_key();
    let mut bytes = [0u8; 32];
    bytes[31] = 2;
    private_key.reload_from_bytes(&bytes).unwrap();
    assert_ne!(private_key.authentication_key(), before);
    assert_eq!(
        private_key.public_key(),
        Secp256k1EcdsaPrivateKey::try_from(&bytes[..]).unwrap().public_key()
    );
    // Zero is not a valid scalar.
    assert_err!(private_key.reload_from_bytes(&[0u8; 32]));
}

#[test]
fn test_aip_80() {
    let private_key = key_one();
    let encoded = private_key.to_aip_80_string().unwrap();
    assert!(encoded.starts_with("secp256k1-priv-0x"));
    let decoded = Secp256k1EcdsaPrivateKey::from_encoded_string(&encoded).unwrap();
    assert_eq!(decoded.public_key(), private_key.public_key());
    assert_matches!(
        Secp256k1EcdsaPrivateKey::from_encoded_string(&encoded.replace("secp256k1", "ed25519")),
        Err(CryptoMaterialError::InvalidAip80Encoding(_))
    );
}

#[test]
fn test_public_key_parsing() {
    let public_key = key_one().public_key();
    assert_eq!(
        Secp256k1EcdsaPublicKey::try_from(&public_key.to_bytes()[..]).unwrap(),
        public_key
    );
    assert_matches!(
        Secp256k1EcdsaPublicKey::try_from(&public_key.to_bytes()[1..]),
        Err(CryptoMaterialError::WrongLengthError)
    );
    let mut off_curve = public_key.to_bytes();
    off_curve[64] ^= 1;
    assert_err!(Secp256k1EcdsaPublicKey::try_from(&off_curve[..]));

    let bytes = aptos_bcs::to_bytes(&public_key).unwrap();
    assert_eq!(bytes[0], 65);
    assert_eq!(
        aptos_bcs::from_bytes::<Secp256k1EcdsaPublicKey>(&bytes).unwrap(),
        public_key
    );
}
