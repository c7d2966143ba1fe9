// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! A library supplying the key schemes and hashing used to sign Aptos transactions:
//! Ed25519, Secp256k1 ECDSA and MultiEd25519, domain-separated SHA3-256 hashing and
//! authentication key derivation.

pub mod authentication_key;
pub mod ed25519;
pub mod error;
pub mod hash;
pub mod multi_ed25519;
pub mod secp256k1_ecdsa;
pub mod traits;

mod serde_support;

#[cfg(test)]
mod unit_tests;

pub use self::{
    authentication_key::{derive_authentication_key, Scheme},
    error::CryptoMaterialError,
    hash::{signing_message, CryptoHash, HashValue},
    traits::*,
};
