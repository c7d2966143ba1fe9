// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! This module defines the [`HashValue`] type and domain-separated hashing.
//!
//! Every structure that is hashed or signed on Aptos is serialized with BCS and prefixed with a
//! seed that depends on the name of its type, so that the encodings of two different types can
//! never collide. The seed of a type `Foo` is `SHA3-256(b"APTOS::Foo")`:
//!
//! * the hash of a value is `SHA3-256(seed || bcs(value))`,
//! * the signing message of a value is `seed || bcs(value)`, handed unhashed to the signature
//!   scheme.

use crate::CryptoMaterialError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};
use std::{fmt, str::FromStr};

/// Prefix of every domain separator.
pub const HASH_PREFIX: &[u8] = b"APTOS::";

/// Output value of our hash function. Intentionally opaque for safety and modularity.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord, Default)]
pub struct HashValue {
    hash: [u8; HashValue::LENGTH],
}

impl HashValue {
    /// The length of the hash in bytes.
    pub const LENGTH: usize = 32;
    /// The length of the hash in bits.
    pub const LENGTH_IN_BITS: usize = Self::LENGTH * 8;

    /// Create a new [`HashValue`] from a byte array.
    pub const fn new(hash: [u8; HashValue::LENGTH]) -> Self {
        HashValue { hash }
    }

    /// Create from a slice (e.g. retrieved from storage).
    pub fn from_slice<T: AsRef<[u8]>>(bytes: T) -> Result<Self, CryptoMaterialError> {
        <[u8; Self::LENGTH]>::try_from(bytes.as_ref())
            .map_err(|_| CryptoMaterialError::WrongLengthError)
            .map(Self::new)
    }

    /// Dumps into a vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.hash.to_vec()
    }

    /// Creates a zero-initialized instance.
    pub const fn zero() -> Self {
        HashValue {
            hash: [0; HashValue::LENGTH],
        }
    }

    /// Convenience function that computes a `HashValue` internally equal to
    /// the sha3_256 of a byte buffer. It will handle hasher creation, data
    /// feeding and finalization.
    pub fn sha3_256_of(buffer: &[u8]) -> Self {
        Self::from_iter_sha3(std::iter::once(buffer))
    }

    /// Hashes the concatenation of all the buffers.
    pub fn from_iter_sha3<'a, I>(buffers: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut sha3 = Sha3_256::new();
        for buffer in buffers {
            sha3.update(buffer);
        }
        let mut hash = [0u8; Self::LENGTH];
        hash.copy_from_slice(sha3.finalize().as_slice());
        HashValue { hash }
    }

    /// Returns the inner bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.hash
    }

    /// Returns the inner array.
    pub fn into_inner(self) -> [u8; Self::LENGTH] {
        self.hash
    }

    /// Full lowercase hex without a prefix.
    pub fn to_hex(&self) -> String {
        format!("{:x}", self)
    }

    /// Full lowercase hex with a `0x` prefix, the form used by the REST API.
    pub fn to_hex_literal(&self) -> String {
        format!("{:#x}", self)
    }

    /// Parses hex, with or without a `0x` prefix.
    pub fn from_hex<T: AsRef<[u8]>>(hex: T) -> Result<Self, CryptoMaterialError> {
        let hex = hex.as_ref();
        let hex = hex.strip_prefix(b"0x").unwrap_or(hex);
        <[u8; Self::LENGTH] as hex::FromHex>::from_hex(hex)
            .map(Self::new)
            .map_err(|_| CryptoMaterialError::DeserializationError)
    }
}

impl AsRef<[u8; HashValue::LENGTH]> for HashValue {
    fn as_ref(&self) -> &[u8; HashValue::LENGTH] {
        &self.hash
    }
}

impl std::ops::Deref for HashValue {
    type Target = [u8; Self::LENGTH];

    fn deref(&self) -> &Self::Target {
        &self.hash
    }
}

impl fmt::LowerHex for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        for byte in &self.hash {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashValue(")?;
        <Self as fmt::LowerHex>::fmt(self, f)?;
        write!(f, ")")
    }
}

/// Will print shortened (4 bytes) hash
impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.hash.iter().take(4) {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl From<[u8; HashValue::LENGTH]> for HashValue {
    fn from(hash: [u8; HashValue::LENGTH]) -> Self {
        HashValue::new(hash)
    }
}

impl FromStr for HashValue {
    type Err = CryptoMaterialError;

    fn from_str(s: &str) -> Result<Self, CryptoMaterialError> {
        HashValue::from_hex(s)
    }
}

impl Serialize for HashValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex_literal())
        } else {
            // In order to preserve the Serde data model and help analysis tools,
            // make sure to wrap our value in a container with the same name
            // as the original type.
            serializer
                .serialize_newtype_struct("HashValue", serde_bytes::Bytes::new(&self.hash[..]))
        }
    }
}

impl<'de> Deserialize<'de> for HashValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let encoded_hash = <String>::deserialize(deserializer)?;
            HashValue::from_hex(encoded_hash.as_str())
                .map_err(<D::Error as ::serde::de::Error>::custom)
        } else {
            // See comment in serialize.
            #[derive(::serde::Deserialize)]
            #[serde(rename = "HashValue")]
            struct Value<'a>(&'a [u8]);

            let value = Value::deserialize(deserializer)?;
            HashValue::from_slice(value.0).map_err(<D::Error as de::Error>::custom)
        }
    }
}

/// A type that is hashed and signed under its own domain separator.
///
/// ```
/// use aptos_crypto::hash::{CryptoHash, HashValue};
///
/// #[derive(serde::Serialize)]
/// struct Greeting(u8);
///
/// impl CryptoHash for Greeting {
///     const DOMAIN_NAME: &'static str = "Greeting";
/// }
///
/// assert_eq!(Greeting::domain_seed(), HashValue::sha3_256_of(b"APTOS::Greeting"));
/// ```
pub trait CryptoHash: Serialize {
    /// Type name mixed into the seed, `APTOS::<DOMAIN_NAME>`.
    const DOMAIN_NAME: &'static str;

    /// `SHA3-256("APTOS::" || DOMAIN_NAME)`.
    fn domain_seed() -> HashValue {
        HashValue::from_iter_sha3([HASH_PREFIX, Self::DOMAIN_NAME.as_bytes()])
    }

    /// `SHA3-256(seed || bcs(self))`.
    fn hash(&self) -> Result<HashValue, CryptoMaterialError> {
        let bytes =
            aptos_bcs::to_bytes(self).map_err(|_| CryptoMaterialError::SerializationError)?;
        Ok(HashValue::from_iter_sha3([
            Self::domain_seed().as_slice(),
            bytes.as_slice(),
        ]))
    }
}

/// The bytes handed to a signature scheme when signing `message`: its domain seed followed by its
/// BCS encoding.
pub fn signing_message<T: CryptoHash>(message: &T) -> Result<Vec<u8>, CryptoMaterialError> {
    let mut bytes = T::domain_seed().to_vec();
    aptos_bcs::serialize_into(&mut bytes, message)
        .map_err(|_| CryptoMaterialError::SerializationError)?;
    Ok(bytes)
}
