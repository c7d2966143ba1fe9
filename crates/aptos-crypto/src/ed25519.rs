// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! This module provides an API for the PureEdDSA signature scheme over the ed25519 twisted
//! Edwards curve as defined in [RFC8032](https://tools.ietf.org/html/rfc8032).
//!
//! Signature verification also checks and rejects non-canonical signatures.
//!
//! # Examples
//!
//! ```
//! use aptos_crypto::{
//!     ed25519::*,
//!     traits::{MessageSigner, Signature, Uniform},
//! };
//!
//! let private_key = Ed25519PrivateKey::generate_random();
//! let public_key = private_key.verifying_key();
//!
//! let signature = private_key.sign_arbitrary_message(b"Test message");
//! assert!(signature.verify_arbitrary_msg(b"Test message", &public_key).is_ok());
//! assert!(signature.verify_arbitrary_msg(b"Other message", &public_key).is_err());
//! ```

use crate::{
    authentication_key::{derive_authentication_key, Scheme},
    serde_support::impl_serde_for_crypto_material,
    traits::{self, Length, MessageSigner, Uniform, ValidCryptoMaterial},
    CryptoMaterialError,
};
use anyhow::{anyhow, Result};
use ed25519_dalek::ExpandedSecretKey;
use rand_core::{CryptoRng, RngCore};
use std::{
    fmt,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// The length of the Ed25519PrivateKey
pub const ED25519_PRIVATE_KEY_LENGTH: usize = ed25519_dalek::SECRET_KEY_LENGTH;
/// The length of the Ed25519PublicKey
pub const ED25519_PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;
/// The length of the Ed25519Signature
pub const ED25519_SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// An Ed25519 private key.
///
/// The public key and the authentication key are derived lazily and cached. Reloading the key
/// material with [`Ed25519PrivateKey::reload_from_bytes`] swaps the secret and drops both caches
/// under the same write lock.
pub struct Ed25519PrivateKey {
    state: RwLock<Ed25519KeyState>,
}

struct Ed25519KeyState {
    secret: ed25519_dalek::SecretKey,
    public_key: Option<Ed25519PublicKey>,
    authentication_key: Option<[u8; 32]>,
}

impl Ed25519KeyState {
    fn new(secret: ed25519_dalek::SecretKey) -> Self {
        Self {
            secret,
            public_key: None,
            authentication_key: None,
        }
    }
}

/// An Ed25519 public key
#[derive(Clone, Eq, PartialEq)]
pub struct Ed25519PublicKey(ed25519_dalek::PublicKey);

/// An Ed25519 signature
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Ed25519Signature([u8; ED25519_SIGNATURE_LENGTH]);

impl Ed25519PrivateKey {
    /// The length of the Ed25519PrivateKey
    pub const LENGTH: usize = ED25519_PRIVATE_KEY_LENGTH;

    /// Builds a key from a 32-byte seed.
    pub fn from_seed(seed: &[u8; ED25519_PRIVATE_KEY_LENGTH]) -> Result<Self, CryptoMaterialError> {
        Self::try_from(&seed[..])
    }

    fn read(&self) -> RwLockReadGuard<'_, Ed25519KeyState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ed25519KeyState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the key material. Cached derived values are invalidated atomically.
    pub fn reload_from_bytes(&self, bytes: &[u8]) -> Result<(), CryptoMaterialError> {
        let secret = parse_secret(bytes)?;
        *self.write() = Ed25519KeyState::new(secret);
        Ok(())
    }

    /// The public key, derived on first use.
    pub fn public_key(&self) -> Ed25519PublicKey {
        if let Some(public_key) = &self.read().public_key {
            return public_key.clone();
        }
        let mut state = self.write();
        // Another writer may have filled the cache between the two locks.
        if let Some(public_key) = &state.public_key {
            return public_key.clone();
        }
        let public_key = Ed25519PublicKey(ed25519_dalek::PublicKey::from(&state.secret));
        state.public_key = Some(public_key.clone());
        public_key
    }

    /// The authentication key of the legacy Ed25519 account controlled by this key.
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

    fn sign_with_state(state: &Ed25519KeyState, message: &[u8]) -> Ed25519Signature {
        let public_key = match &state.public_key {
            Some(public_key) => public_key.0,
            None => ed25519_dalek::PublicKey::from(&state.secret),
        };
        let expanded_secret_key: ExpandedSecretKey = ExpandedSecretKey::from(&state.secret);
        let signature = expanded_secret_key.sign(message, &public_key);
        Ed25519Signature(signature.to_bytes())
    }
}

fn parse_secret(bytes: &[u8]) -> Result<ed25519_dalek::SecretKey, CryptoMaterialError> {
    if bytes.len() != ED25519_PRIVATE_KEY_LENGTH {
        return Err(CryptoMaterialError::WrongLengthError);
    }
    ed25519_dalek::SecretKey::from_bytes(bytes)
        .map_err(|_| CryptoMaterialError::DeserializationError)
}

impl MessageSigner for Ed25519PrivateKey {
    type SignatureMaterial = Ed25519Signature;
    type VerifyingKeyMaterial = Ed25519PublicKey;

    fn sign_arbitrary_message(&self, message: &[u8]) -> Ed25519Signature {
        // Warm the cache first so that signing never needs the write lock.
        self.public_key();
        Self::sign_with_state(&self.read(), message)
    }

    fn simulation_signature(&self) -> Ed25519Signature {
        Ed25519Signature::simulation()
    }

    fn verifying_key(&self) -> Ed25519PublicKey {
        self.public_key()
    }
}

impl Uniform for Ed25519PrivateKey {
    fn generate<R>(rng: &mut R) -> Self
    where
        R: RngCore + CryptoRng,
    {
        Self {
            state: RwLock::new(Ed25519KeyState::new(ed25519_dalek::SecretKey::generate(
                rng,
            ))),
        }
    }
}

impl TryFrom<&[u8]> for Ed25519PrivateKey {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> std::result::Result<Ed25519PrivateKey, CryptoMaterialError> {
        Ok(Self {
            state: RwLock::new(Ed25519KeyState::new(parse_secret(bytes)?)),
        })
    }
}

impl Length for Ed25519PrivateKey {
    fn length(&self) -> usize {
        Self::LENGTH
    }
}

impl ValidCryptoMaterial for Ed25519PrivateKey {
    const AIP_80_PREFIX: &'static str = "ed25519-priv-";

    fn to_bytes(&self) -> Vec<u8> {
        self.read().secret.as_bytes().to_vec()
    }
}

impl fmt::Display for Ed25519PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<elided secret for Ed25519PrivateKey>")
    }
}

impl fmt::Debug for Ed25519PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<elided secret for Ed25519PrivateKey>")
    }
}

impl Ed25519PublicKey {
    /// The length of the Ed25519PublicKey
    pub const LENGTH: usize = ED25519_PUBLIC_KEY_LENGTH;

    /// Serialize an Ed25519PublicKey.
    pub fn to_bytes(&self) -> [u8; ED25519_PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }
}

impl traits::PublicKey for Ed25519PublicKey {
    fn authentication_key(&self) -> [u8; 32] {
        derive_authentication_key(&self.to_bytes(), Scheme::Ed25519)
    }
}

impl TryFrom<&[u8]> for Ed25519PublicKey {
    type Error = CryptoMaterialError;

    /// Deserialize an Ed25519PublicKey. This method will check that the point decompresses.
    fn try_from(bytes: &[u8]) -> std::result::Result<Ed25519PublicKey, CryptoMaterialError> {
        if bytes.len() != ED25519_PUBLIC_KEY_LENGTH {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        ed25519_dalek::PublicKey::from_bytes(bytes)
            .map(Ed25519PublicKey)
            .map_err(|_| CryptoMaterialError::PointNotOnCurveError)
    }
}

impl Length for Ed25519PublicKey {
    fn length(&self) -> usize {
        ED25519_PUBLIC_KEY_LENGTH
    }
}

impl ValidCryptoMaterial for Ed25519PublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }
}

impl std::hash::Hash for Ed25519PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write(self.0.as_bytes());
    }
}

impl fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ed25519PublicKey({})", self)
    }
}

impl Ed25519Signature {
    /// The length of the Ed25519Signature
    pub const LENGTH: usize = ED25519_SIGNATURE_LENGTH;

    /// Serialize an Ed25519Signature.
    pub fn to_bytes(&self) -> [u8; ED25519_SIGNATURE_LENGTH] {
        self.0
    }

    /// A zero-filled signature, only accepted by transaction simulation.
    pub fn simulation() -> Self {
        Ed25519Signature([0u8; ED25519_SIGNATURE_LENGTH])
    }
}

impl traits::Signature for Ed25519Signature {
    type VerifyingKeyMaterial = Ed25519PublicKey;

    /// Checks that `self` is valid for an arbitrary &[u8] `message` using `public_key`.
    /// Outside of this crate, this particular function should only be used for native signature
    /// verification in Move.
    ///
    /// This function will check both the signature and `public_key` for small subgroup attacks.
    fn verify_arbitrary_msg(&self, message: &[u8], public_key: &Ed25519PublicKey) -> Result<()> {
        let signature = ed25519_dalek::Signature::try_from(&self.0[..])
            .map_err(|e| anyhow!("malformed ed25519 signature: {}", e))?;
        public_key
            .0
            .verify_strict(message, &signature)
            .map_err(|e| anyhow!("{}", e))
    }
}

impl TryFrom<&[u8]> for Ed25519Signature {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> std::result::Result<Ed25519Signature, CryptoMaterialError> {
        <[u8; ED25519_SIGNATURE_LENGTH]>::try_from(bytes)
            .map(Ed25519Signature)
            .map_err(|_| CryptoMaterialError::WrongLengthError)
    }
}

impl Length for Ed25519Signature {
    fn length(&self) -> usize {
        ED25519_SIGNATURE_LENGTH
    }
}

impl ValidCryptoMaterial for Ed25519Signature {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ed25519Signature({})", self)
    }
}

impl_serde_for_crypto_material!(Ed25519PublicKey, "Ed25519PublicKey");
impl_serde_for_crypto_material!(Ed25519Signature, "Ed25519Signature");

#[cfg(any(test, feature = "fuzzing"))]
impl proptest::arbitrary::Arbitrary for Ed25519PrivateKey {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        use proptest::prelude::*;

        any::<[u8; ED25519_PRIVATE_KEY_LENGTH]>()
            .prop_filter_map("valid seed", |seed| Ed25519PrivateKey::from_seed(&seed).ok())
            .boxed()
    }
}
