// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! This module provides an API for ECDSA signatures over the Secp256k1 curve, with the message
//! pre-hashed with SHA3-256 before signing.
//!
//! Signatures are `r || s` (32 bytes each). Only low-s signatures are produced, and signatures
//! with `s > n/2` are rejected when parsed, so a signature cannot be mauled into a second valid
//! one.
//!
//! ```
//! use aptos_crypto::{
//!     secp256k1_ecdsa::*,
//!     traits::{MessageSigner, Signature, Uniform},
//! };
//!
//! let private_key = Secp256k1EcdsaPrivateKey::generate_random();
//! let signature = private_key.sign_arbitrary_message(b"hello");
//! assert!(signature
//!     .verify_arbitrary_msg(b"hello", &private_key.verifying_key())
//!     .is_ok());
//! ```

use crate::{
    authentication_key::{derive_authentication_key, Scheme},
    serde_support::impl_serde_for_crypto_material,
    traits::{self, Length, MessageSigner, Uniform, ValidCryptoMaterial},
    CryptoMaterialError, HashValue,
};
use anyhow::{anyhow, bail, Result};
use rand_core::{CryptoRng, RngCore};
use std::{
    fmt,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// The length in bytes of the Secp256k1 private key
pub const PRIVATE_KEY_LENGTH: usize = 32;
/// The length in bytes of an uncompressed Secp256k1 public key
pub const PUBLIC_KEY_LENGTH: usize = 65;
/// The length in bytes of a Secp256k1 signature
pub const SIGNATURE_LENGTH: usize = 64;

/// `AnyPublicKey` variant index of Secp256k1 keys, used to derive single-key auth keys.
const SINGLE_KEY_SECP256K1_VARIANT: u8 = 1;

/// A Secp256k1 ECDSA private key with lazily cached public and authentication keys.
pub struct Secp256k1EcdsaPrivateKey {
    state: RwLock<Secp256k1KeyState>,
}

struct Secp256k1KeyState {
    secret: libsecp256k1::SecretKey,
    public_key: Option<Secp256k1EcdsaPublicKey>,
    authentication_key: Option<[u8; 32]>,
}

impl Secp256k1KeyState {
    fn new(secret: libsecp256k1::SecretKey) -> Self {
        Self {
            secret,
            public_key: None,
            authentication_key: None,
        }
    }
}

/// An uncompressed Secp256k1 public key.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Secp256k1EcdsaPublicKey(libsecp256k1::PublicKey);

/// A low-s `r || s` signature.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Secp256k1EcdsaSignature([u8; SIGNATURE_LENGTH]);

fn message_digest(message: &[u8]) -> libsecp256k1::Message {
    libsecp256k1::Message::parse(HashValue::sha3_256_of(message).as_ref())
}

impl Secp256k1EcdsaPrivateKey {
    /// The length of the private key
    pub const LENGTH: usize = PRIVATE_KEY_LENGTH;

    fn read(&self) -> RwLockReadGuard<'_, Secp256k1KeyState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Secp256k1KeyState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the key material. Cached derived values are invalidated atomically.
    pub fn reload_from_bytes(&self, bytes: &[u8]) -> Result<(), CryptoMaterialError> {
        let secret = parse_secret(bytes)?;
        *self.write() = Secp256k1KeyState::new(secret);
        Ok(())
    }

    /// The public key, derived on first use.
    pub fn public_key(&self) -> Secp256k1EcdsaPublicKey {
        if let Some(public_key) = self.read().public_key {
            return public_key;
        }
        let mut state = self.write();
        if let Some(public_key) = state.public_key {
            return public_key;
        }
        let public_key =
            Secp256k1EcdsaPublicKey(libsecp256k1::PublicKey::from_secret_key(&state.secret));
        state.public_key = Some(public_key);
        public_key
    }

    /// Secp256k1 keys only control accounts through the single-key scheme, so this is the
    /// single-key authentication key.
    pub fn authentication_key(&self) -> [u8; 32] {
        if let Some(authentication_key) = self.read().authentication_key {
            return authentication_key;
        }
        let public_key = self.public_key();
        let mut state = self.write();
        if let Some(authentication_key) = state.authentication_key {
            return authentication_key;
        }
        let authentication_key = traits::PublicKey::authentication_key(&public_key);
        state.authentication_key = Some(authentication_key);
        authentication_key
    }
}

fn parse_secret(bytes: &[u8]) -> Result<libsecp256k1::SecretKey, CryptoMaterialError> {
    if bytes.len() != PRIVATE_KEY_LENGTH {
        return Err(CryptoMaterialError::WrongLengthError);
    }
    libsecp256k1::SecretKey::parse_slice(bytes)
        .map_err(|_| CryptoMaterialError::DeserializationError)
}

impl MessageSigner for Secp256k1EcdsaPrivateKey {
    type SignatureMaterial = Secp256k1EcdsaSignature;
    type VerifyingKeyMaterial = Secp256k1EcdsaPublicKey;

    /// Signs `SHA3-256(message)`.
    fn sign_arbitrary_message(&self, message: &[u8]) -> Secp256k1EcdsaSignature {
        let (mut signature, _recovery_id) =
            libsecp256k1::sign(&message_digest(message), &self.read().secret);
        signature.normalize_s();
        Secp256k1EcdsaSignature(signature.serialize())
    }

    fn simulation_signature(&self) -> Secp256k1EcdsaSignature {
        Secp256k1EcdsaSignature::simulation()
    }

    fn verifying_key(&self) -> Secp256k1EcdsaPublicKey {
        self.public_key()
    }
}

impl Uniform for Secp256k1EcdsaPrivateKey {
    fn generate<R>(rng: &mut R) -> Self
    where
        R: RngCore + CryptoRng,
    {
        // Scalars at or above the group order are rejected, which happens with negligible
        // probability.
        loop {
            let mut bytes = [0u8; PRIVATE_KEY_LENGTH];
            rng.fill_bytes(&mut bytes);
            if let Ok(secret) = libsecp256k1::SecretKey::parse(&bytes) {
                return Self {
                    state: RwLock::new(Secp256k1KeyState::new(secret)),
                };
            }
        }
    }
}

impl TryFrom<&[u8]> for Secp256k1EcdsaPrivateKey {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> std::result::Result<Self, CryptoMaterialError> {
        Ok(Self {
            state: RwLock::new(Secp256k1KeyState::new(parse_secret(bytes)?)),
        })
    }
}

impl Length for Secp256k1EcdsaPrivateKey {
    fn length(&self) -> usize {
        PRIVATE_KEY_LENGTH
    }
}

impl ValidCryptoMaterial for Secp256k1EcdsaPrivateKey {
    const AIP_80_PREFIX: &'static str = "secp256k1-priv-";

    fn to_bytes(&self) -> Vec<u8> {
        self.read().secret.serialize().to_vec()
    }
}

impl fmt::Display for Secp256k1EcdsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<elided secret for Secp256k1EcdsaPrivateKey>")
    }
}

impl fmt::Debug for Secp256k1EcdsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<elided secret for Secp256k1EcdsaPrivateKey>")
    }
}

impl Secp256k1EcdsaPublicKey {
    /// The length of an uncompressed public key
    pub const LENGTH: usize = PUBLIC_KEY_LENGTH;

    /// Uncompressed SEC1 encoding, `0x04 || x || y`.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.serialize()
    }
}

impl traits::PublicKey for Secp256k1EcdsaPublicKey {
    /// `SHA3-256(bcs(AnyPublicKey::Secp256k1Ecdsa(self)) || SingleKey)`.
    fn authentication_key(&self) -> [u8; 32] {
        let mut material = Vec::with_capacity(2 + PUBLIC_KEY_LENGTH);
        material.push(SINGLE_KEY_SECP256K1_VARIANT);
        material.push(PUBLIC_KEY_LENGTH as u8);
        material.extend_from_slice(&self.to_bytes());
        derive_authentication_key(&material, Scheme::SingleKey)
    }
}

impl TryFrom<&[u8]> for Secp256k1EcdsaPublicKey {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> std::result::Result<Self, CryptoMaterialError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        libsecp256k1::PublicKey::parse_slice(bytes, Some(libsecp256k1::PublicKeyFormat::Full))
            .map(Secp256k1EcdsaPublicKey)
            .map_err(|_| CryptoMaterialError::PointNotOnCurveError)
    }
}

impl Length for Secp256k1EcdsaPublicKey {
    fn length(&self) -> usize {
        PUBLIC_KEY_LENGTH
    }
}

impl ValidCryptoMaterial for Secp256k1EcdsaPublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.serialize().to_vec()
    }
}

impl std::hash::Hash for Secp256k1EcdsaPublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write(&self.0.serialize());
    }
}

impl fmt::Display for Secp256k1EcdsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.serialize()))
    }
}

impl fmt::Debug for Secp256k1EcdsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Secp256k1EcdsaPublicKey({})", self)
    }
}

impl Secp256k1EcdsaSignature {
    /// The length of the signature
    pub const LENGTH: usize = SIGNATURE_LENGTH;

    /// `r || s`
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0
    }

    /// A zero-filled signature, only accepted by transaction simulation.
    pub fn simulation() -> Self {
        Secp256k1EcdsaSignature([0u8; SIGNATURE_LENGTH])
    }

    fn parsed(&self) -> Result<libsecp256k1::Signature> {
        let signature = libsecp256k1::Signature::parse_standard(&self.0)
            .map_err(|e| anyhow!("malformed secp256k1 signature: {:?}", e))?;
        if signature.s.is_high() {
            bail!("secp256k1 signature is not canonical: s is high");
        }
        Ok(signature)
    }

    /// Recovers the public key that produced this signature over `message` and checks it against
    /// `expected_authentication_key`. Without a recovery id, ids 0 through 3 are tried in order.
    pub fn recover_public_key(
        &self,
        message: &[u8],
        recovery_id: Option<u8>,
        expected_authentication_key: &[u8; 32],
    ) -> Result<Secp256k1EcdsaPublicKey> {
        let signature = self.parsed()?;
        let digest = message_digest(message);
        let candidates = match recovery_id {
            Some(id) => id..=id,
            None => 0..=3,
        };
        for id in candidates {
            let Ok(recovery_id) = libsecp256k1::RecoveryId::parse(id) else {
                continue;
            };
            if let Ok(public_key) = libsecp256k1::recover(&digest, &signature, &recovery_id) {
                let public_key = Secp256k1EcdsaPublicKey(public_key);
                if &traits::PublicKey::authentication_key(&public_key)
                    == expected_authentication_key
                {
                    return Ok(public_key);
                }
            }
        }
        bail!("no recovered public key matches the authentication key")
    }
}

impl traits::Signature for Secp256k1EcdsaSignature {
    type VerifyingKeyMaterial = Secp256k1EcdsaPublicKey;

    /// Verifies the signature over `SHA3-256(message)`.
    fn verify_arbitrary_msg(
        &self,
        message: &[u8],
        public_key: &Secp256k1EcdsaPublicKey,
    ) -> Result<()> {
        let signature = self.parsed()?;
        if libsecp256k1::verify(&message_digest(message), &signature, &public_key.0) {
            Ok(())
        } else {
            bail!("secp256k1 signature verification failed")
        }
    }
}

impl TryFrom<&[u8]> for Secp256k1EcdsaSignature {
    type Error = CryptoMaterialError;

    /// Rejects signatures with a high `s`.
    fn try_from(bytes: &[u8]) -> std::result::Result<Self, CryptoMaterialError> {
        let bytes = <[u8; SIGNATURE_LENGTH]>::try_from(bytes)
            .map_err(|_| CryptoMaterialError::WrongLengthError)?;
        let signature = libsecp256k1::Signature::parse_standard(&bytes)
            .map_err(|_| CryptoMaterialError::DeserializationError)?;
        if signature.s.is_high() {
            return Err(CryptoMaterialError::CanonicalRepresentationError);
        }
        Ok(Secp256k1EcdsaSignature(bytes))
    }
}

impl Length for Secp256k1EcdsaSignature {
    fn length(&self) -> usize {
        SIGNATURE_LENGTH
    }
}

impl ValidCryptoMaterial for Secp256k1EcdsaSignature {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for Secp256k1EcdsaSignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Secp256k1EcdsaSignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Secp256k1EcdsaSignature({})", self)
    }
}

impl_serde_for_crypto_material!(Secp256k1EcdsaPublicKey, "Secp256k1EcdsaPublicKey");
impl_serde_for_crypto_material!(Secp256k1EcdsaSignature, "Secp256k1EcdsaSignature");
