// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! This module provides a generic set of traits for dealing with cryptographic primitives.
//!
//! For examples on how to use these traits, see the implementations of the [`crate::ed25519`] or
//! [`crate::secp256k1_ecdsa`] modules.

use crate::{hash::CryptoHash, signing_message, CryptoMaterialError};
use anyhow::Result;
use rand_core::{CryptoRng, RngCore};
use std::{fmt::Debug, hash::Hash};

/// Key material with a fixed serialized length.
pub trait Length {
    /// The serialized length of the data
    fn length(&self) -> usize;
}

/// Key or more generally crypto material with a notion of byte validation.
///
/// A type family for material that knows how to serialize and deserialize, as well as validate
/// byte-encoded material. The first task is to serialize the material to a vector of bytes. The
/// second is to validate a byte array and return an instance of the material.
pub trait ValidCryptoMaterial:
    // The for<'a> exactly matches the assumption "deserializable from any lifetime".
    for<'a> TryFrom<&'a [u8], Error = CryptoMaterialError> + Length
{
    /// Prefix of the AIP-80 text form, e.g. `ed25519-priv-`. Empty for material without one.
    const AIP_80_PREFIX: &'static str = "";

    /// Convert the valid crypto material to bytes.
    fn to_bytes(&self) -> Vec<u8>;
}

/// An extension to/from Strings for [`ValidCryptoMaterial`].
///
/// Relies on [`hex`] for string encoding / decoding.
/// No required fields, provides a default implementation.
pub trait ValidCryptoMaterialStringExt: ValidCryptoMaterial {
    /// When trying to convert from bytes, we simply decode the string into
    /// bytes before checking if we can convert.
    ///
    /// Accepts `0x<hex>`, bare `<hex>` and, for material with an AIP-80 prefix,
    /// `<prefix>0x<hex>`. The prefix is case sensitive.
    fn from_encoded_string(encoded_str: &str) -> std::result::Result<Self, CryptoMaterialError> {
        let hex_part = if !Self::AIP_80_PREFIX.is_empty() && encoded_str.starts_with(Self::AIP_80_PREFIX)
        {
            encoded_str[Self::AIP_80_PREFIX.len()..]
                .strip_prefix("0x")
                .ok_or_else(|| {
                    CryptoMaterialError::InvalidAip80Encoding(
                        "missing 0x after the scheme prefix".to_string(),
                    )
                })?
        } else if encoded_str.contains("-priv-") || encoded_str.contains("-pub-") {
            return Err(CryptoMaterialError::InvalidAip80Encoding(format!(
                "expected prefix '{}'",
                Self::AIP_80_PREFIX
            )));
        } else {
            encoded_str.strip_prefix("0x").unwrap_or(encoded_str)
        };
        let bytes_out = hex::decode(hex_part)
            .map_err(|_| CryptoMaterialError::DeserializationError)?;
        // We defer to `try_from` to make sure we only produce valid crypto materials.
        Self::try_from(bytes_out.as_ref())
    }

    /// A function to encode into hex-string after serializing.
    fn to_encoded_string(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// The AIP-80 text form, `<prefix>0x<hex>`.
    fn to_aip_80_string(&self) -> std::result::Result<String, CryptoMaterialError> {
        if Self::AIP_80_PREFIX.is_empty() {
            return Err(CryptoMaterialError::InvalidAip80Encoding(
                "no AIP-80 prefix for this material".to_string(),
            ));
        }
        Ok(format!("{}{}", Self::AIP_80_PREFIX, self.to_encoded_string()))
    }
}

// There's nothing required in this extension, so let's just derive it
// for anybody that has a ValidCryptoMaterial.
impl<T: ValidCryptoMaterial> ValidCryptoMaterialStringExt for T {}

/// A public key: verifying key material.
pub trait PublicKey: ValidCryptoMaterial + Clone + Debug + Eq + Hash + Send + Sync {
    /// The authentication key of an account controlled by this key alone.
    fn authentication_key(&self) -> [u8; 32];
}

/// A type family for signature material that knows which public key type is needed to verify it.
pub trait Signature: ValidCryptoMaterial + Clone + Debug + Eq + Hash + Send + Sync {
    /// The associated verifying key type for this signature.
    type VerifyingKeyMaterial: PublicKey;

    /// Verification for a struct we unambiguously know how to serialize and
    /// that we have a domain separation prefix for.
    fn verify<T: CryptoHash>(&self, message: &T, public_key: &Self::VerifyingKeyMaterial) -> Result<()> {
        self.verify_arbitrary_msg(&signing_message(message)?, public_key)
    }

    /// Native verification function.
    fn verify_arbitrary_msg(&self, message: &[u8], public_key: &Self::VerifyingKeyMaterial) -> Result<()>;
}

/// The signing capability shared by every private key type.
pub trait MessageSigner: Send + Sync {
    /// The public key matching this signer.
    type VerifyingKeyMaterial: PublicKey;
    /// The signatures this signer produces.
    type SignatureMaterial: Signature<VerifyingKeyMaterial = Self::VerifyingKeyMaterial>;

    /// Signs the raw bytes of `message`.
    fn sign_arbitrary_message(&self, message: &[u8]) -> Self::SignatureMaterial;

    /// Signs the signing message of a domain-separated value.
    fn sign<T: CryptoHash>(&self, message: &T) -> std::result::Result<Self::SignatureMaterial, CryptoMaterialError> {
        Ok(self.sign_arbitrary_message(&signing_message(message)?))
    }

    /// A zero-filled signature of the right length, accepted only by simulation.
    fn simulation_signature(&self) -> Self::SignatureMaterial;

    /// The verifying key. Cached after the first derivation.
    fn verifying_key(&self) -> Self::VerifyingKeyMaterial;
}

/// A type family for schemes which know how to generate key material from
/// a cryptographically-secure [`CryptoRng`].
pub trait Uniform {
    /// Generate key material from an RNG. This should generally not be used for production
    /// purposes even with a good source of randomness. When possible use hardware crypto to
    /// generate and store private keys.
    fn generate<R>(rng: &mut R) -> Self
    where
        R: RngCore + CryptoRng;

    /// Generate a random key from the operating system RNG.
    fn generate_random() -> Self
    where
        Self: Sized,
    {
        let mut rng = rand::rngs::OsRng;
        Self::generate(&mut rng)
    }
}
