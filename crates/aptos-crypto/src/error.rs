// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rexport the error types needed for the various crypto traits

pub use anyhow::{bail, Error};
use thiserror::Error;

/// An error type for key and signature validation issues, see [`ValidCryptoMaterial`][crate::ValidCryptoMaterial].
///
/// This enum reflects there are three interesting cases:
/// 1) Raw (for example) ed25519 signatures and keys that are not of the expected length.
/// 2) Bytes that do not decode to a valid point or scalar.
/// 3) Well formed material that is rejected by an additional check (canonical form, threshold).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CryptoMaterialError {
    /// Struct to be signed does not serialize correctly.
    #[error("Struct to be signed does not serialize correctly")]
    SerializationError,
    /// Key or signature material does not deserialize correctly.
    #[error("Key or signature material does not deserialize correctly")]
    DeserializationError,
    /// Key or signature material deserializes, but is otherwise not valid.
    #[error("Key or signature material deserializes, but is otherwise not valid")]
    ValidationError,
    /// Key, threshold or signature material does not have the expected size.
    #[error("Key, threshold or signature material does not have the expected size")]
    WrongLengthError,
    /// Part of the signature or key is not canonical resulting to malleability issues.
    #[error("Part of the signature or key is not canonical resulting to malleability issues")]
    CanonicalRepresentationError,
    /// A curve point (i.e., a public key) lies on a small group.
    #[error("A curve point (i.e., a public key) lies on a small group")]
    SmallSubgroupError,
    /// A curve point (i.e., a public key) does not satisfy the curve equation.
    #[error("A curve point (i.e., a public key) does not satisfy the curve equation")]
    PointNotOnCurveError,
    /// BitVec errors in accountable multi-sig schemes.
    #[error("BitVec errors in accountable multi-sig schemes")]
    BitVecError(String),
    /// The text form carries an unknown or mismatching AIP-80 prefix.
    #[error("Invalid AIP-80 encoding: {0}")]
    InvalidAip80Encoding(String),
}
