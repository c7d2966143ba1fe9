// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! This module provides an API for the accountable threshold multi-sig PureEdDSA signature scheme
//! over the ed25519 twisted Edwards curve as defined in [RFC8032](https://tools.ietf.org/html/rfc8032).
//!
//! Signature verification also checks and rejects non-canonical signatures.
//!
//! A public key is up to 32 Ed25519 public keys followed by a one-byte threshold. A signature is
//! the concatenation of the individual signatures, ordered by signer index, followed by a 4-byte
//! bitmap in which bit `i` (most significant bit of the first byte is index 0) is set if the key
//! at index `i` signed.

use crate::{
    authentication_key::{derive_authentication_key, Scheme},
    ed25519::{
        Ed25519PublicKey, Ed25519Signature, ED25519_PUBLIC_KEY_LENGTH, ED25519_SIGNATURE_LENGTH,
    },
    serde_support::impl_serde_for_crypto_material,
    traits::{self, Length, Signature as _, ValidCryptoMaterial},
    CryptoMaterialError,
};
use anyhow::{anyhow, bail, Result};
use std::fmt;

/// Maximum number of keys in a MultiEd25519 public key.
pub const MAX_NUM_OF_KEYS: usize = 32;

/// Length of the signer bitmap in bytes.
pub const BITMAP_NUM_OF_BYTES: usize = 4;

/// A k-of-n set of Ed25519 public keys.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct MultiEd25519PublicKey {
    public_keys: Vec<Ed25519PublicKey>,
    threshold: u8,
}

/// Signatures of a subset of the keys of a [`MultiEd25519PublicKey`].
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct MultiEd25519Signature {
    signatures: Vec<Ed25519Signature>,
    bitmap: [u8; BITMAP_NUM_OF_BYTES],
}

/// Checks `1 <= threshold <= num_of_keys <= MAX_NUM_OF_KEYS`.
pub fn check_threshold(num_of_keys: usize, threshold: u8) -> Result<(), CryptoMaterialError> {
    if threshold == 0 || num_of_keys < threshold as usize {
        Err(CryptoMaterialError::ValidationError)
    } else if num_of_keys > MAX_NUM_OF_KEYS {
        Err(CryptoMaterialError::WrongLengthError)
    } else {
        Ok(())
    }
}

impl MultiEd25519PublicKey {
    pub fn new(
        public_keys: Vec<Ed25519PublicKey>,
        threshold: u8,
    ) -> Result<Self, CryptoMaterialError> {
        check_threshold(public_keys.len(), threshold)?;
        Ok(MultiEd25519PublicKey {
            public_keys,
            threshold,
        })
    }

    pub fn public_keys(&self) -> &[Ed25519PublicKey] {
        &self.public_keys
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// `keys || threshold`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.public_keys.len() * ED25519_PUBLIC_KEY_LENGTH + 1);
        for public_key in &self.public_keys {
            bytes.extend_from_slice(&public_key.to_bytes());
        }
        bytes.push(self.threshold);
        bytes
    }
}

impl traits::PublicKey for MultiEd25519PublicKey {
    fn authentication_key(&self) -> [u8; 32] {
        derive_authentication_key(&self.to_bytes(), Scheme::MultiEd25519)
    }
}

impl TryFrom<&[u8]> for MultiEd25519PublicKey {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> std::result::Result<Self, CryptoMaterialError> {
        let Some((threshold, keys)) = bytes.split_last() else {
            return Err(CryptoMaterialError::WrongLengthError);
        };
        if keys.is_empty() || keys.len() % ED25519_PUBLIC_KEY_LENGTH != 0 {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        let public_keys = keys
            .chunks_exact(ED25519_PUBLIC_KEY_LENGTH)
            .map(Ed25519PublicKey::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(public_keys, *threshold)
    }
}

impl Length for MultiEd25519PublicKey {
    fn length(&self) -> usize {
        self.public_keys.len() * ED25519_PUBLIC_KEY_LENGTH + 1
    }
}

impl ValidCryptoMaterial for MultiEd25519PublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        MultiEd25519PublicKey::to_bytes(self)
    }
}

impl fmt::Display for MultiEd25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for MultiEd25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MultiEd25519PublicKey({}-of-{}: {:?})",
            self.threshold,
            self.public_keys.len(),
            self.public_keys
        )
    }
}

impl MultiEd25519Signature {
    /// Builds a signature from `(signature, signer index)` pairs in any order. Indexes must be
    /// distinct and below [`MAX_NUM_OF_KEYS`].
    pub fn new(
        mut signatures: Vec<(Ed25519Signature, u8)>,
    ) -> Result<Self, CryptoMaterialError> {
        if signatures.is_empty() || signatures.len() > MAX_NUM_OF_KEYS {
            return Err(CryptoMaterialError::ValidationError);
        }
        signatures.sort_by_key(|(_, index)| *index);
        let mut bitmap = [0u8; BITMAP_NUM_OF_BYTES];
        for (_, index) in &signatures {
            if *index as usize >= MAX_NUM_OF_KEYS {
                return Err(CryptoMaterialError::BitVecError(format!(
                    "signature index {} is out of range",
                    index
                )));
            }
            if bitmap_get_bit(bitmap, *index as usize) {
                return Err(CryptoMaterialError::BitVecError(format!(
                    "duplicate signature index {}",
                    index
                )));
            }
            bitmap_set_bit(&mut bitmap, *index as usize);
        }
        Ok(MultiEd25519Signature {
            signatures: signatures.into_iter().map(|(signature, _)| signature).collect(),
            bitmap,
        })
    }

    pub fn signatures(&self) -> &[Ed25519Signature] {
        &self.signatures
    }

    pub fn bitmap(&self) -> &[u8; BITMAP_NUM_OF_BYTES] {
        &self.bitmap
    }

    /// `signatures || bitmap`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            self.signatures.len() * ED25519_SIGNATURE_LENGTH + BITMAP_NUM_OF_BYTES,
        );
        for signature in &self.signatures {
            bytes.extend_from_slice(&signature.to_bytes());
        }
        bytes.extend_from_slice(&self.bitmap);
        bytes
    }
}

impl traits::Signature for MultiEd25519Signature {
    type VerifyingKeyMaterial = MultiEd25519PublicKey;

    /// Every signer flagged in the bitmap must have signed `message`, and there must be at least
    /// `threshold` of them.
    fn verify_arbitrary_msg(&self, message: &[u8], public_key: &MultiEd25519PublicKey) -> Result<()> {
        let num_signers = bitmap_count_ones(self.bitmap) as usize;
        if num_signers != self.signatures.len() {
            bail!("bitmap flags {} signers, found {} signatures", num_signers, self.signatures.len());
        }
        if num_signers < public_key.threshold as usize {
            bail!(
                "{} signatures do not meet the threshold of {}",
                num_signers,
                public_key.threshold
            );
        }
        let indexes = (0..MAX_NUM_OF_KEYS).filter(|i| bitmap_get_bit(self.bitmap, *i));
        for (index, signature) in indexes.zip(&self.signatures) {
            let key = public_key
                .public_keys
                .get(index)
                .ok_or_else(|| anyhow!("signer index {} has no public key", index))?;
            signature.verify_arbitrary_msg(message, key)?;
        }
        Ok(())
    }
}

impl TryFrom<&[u8]> for MultiEd25519Signature {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> std::result::Result<Self, CryptoMaterialError> {
        if bytes.len() < BITMAP_NUM_OF_BYTES {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        let (signature_bytes, bitmap_bytes) = bytes.split_at(bytes.len() - BITMAP_NUM_OF_BYTES);
        if signature_bytes.len() % ED25519_SIGNATURE_LENGTH != 0 {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        let mut bitmap = [0u8; BITMAP_NUM_OF_BYTES];
        bitmap.copy_from_slice(bitmap_bytes);
        let signatures = signature_bytes
            .chunks_exact(ED25519_SIGNATURE_LENGTH)
            .map(Ed25519Signature::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        if bitmap_count_ones(bitmap) as usize != signatures.len() {
            return Err(CryptoMaterialError::BitVecError(
                "bitmap does not match the number of signatures".to_string(),
            ));
        }
        Ok(MultiEd25519Signature { signatures, bitmap })
    }
}

impl Length for MultiEd25519Signature {
    fn length(&self) -> usize {
        self.signatures.len() * ED25519_SIGNATURE_LENGTH + BITMAP_NUM_OF_BYTES
    }
}

impl ValidCryptoMaterial for MultiEd25519Signature {
    fn to_bytes(&self) -> Vec<u8> {
        MultiEd25519Signature::to_bytes(self)
    }
}

impl fmt::Display for MultiEd25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for MultiEd25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MultiEd25519Signature({})", self)
    }
}

impl_serde_for_crypto_material!(MultiEd25519PublicKey, "MultiEd25519PublicKey");
impl_serde_for_crypto_material!(MultiEd25519Signature, "MultiEd25519Signature");

//////////////////////
// Helper functions //
//////////////////////

// Helper method to set the bit at `index`, most significant bit first.
pub fn bitmap_set_bit(input: &mut [u8; BITMAP_NUM_OF_BYTES], index: usize) {
    let bucket = index / 8;
    // It's always invoked with index < 32, thus there is no need to check range.
    let bucket_pos = index - (bucket * 8);
    input[bucket] |= 128 >> bucket_pos as u8;
}

// Helper method to get the input's bit at index.
pub fn bitmap_get_bit(input: [u8; BITMAP_NUM_OF_BYTES], index: usize) -> bool {
    let bucket = index / 8;
    // It's always invoked with index < 32, thus there is no need to check range.
    let bucket_pos = index - (bucket * 8);
    (input[bucket] & (128 >> bucket_pos as u8)) != 0
}

// Returns the number of set bits.
pub fn bitmap_count_ones(input: [u8; BITMAP_NUM_OF_BYTES]) -> u32 {
    input.iter().map(|a| a.count_ones()).sum()
}

// Find the last set bit.
pub fn bitmap_last_set_bit(input: [u8; BITMAP_NUM_OF_BYTES]) -> Option<u8> {
    input
        .iter()
        .rev()
        .enumerate()
        .find(|(_, byte)| byte != &&0u8)
        .map(|(i, byte)| (8 * (BITMAP_NUM_OF_BYTES - i) - byte.trailing_zeros() as usize - 1) as u8)
}
