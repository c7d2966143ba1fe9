// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Authentication keys bind key material to an account. An authentication key is
//! `SHA3-256(material || scheme)` where `material` is the serialized public key (or key set) and
//! `scheme` is a one-byte tag telling the chain how to interpret it.

use crate::HashValue;

/// Scheme byte appended to the hashed material.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Scheme {
    Ed25519 = 0,
    MultiEd25519 = 1,
    SingleKey = 2,
    MultiKey = 3,
    /// Object address derived from an existing object address and a seed address.
    DeriveObjectAddressFromObject = 252,
    DeriveObjectAddressFromGuid = 253,
    /// Named object address: creator address plus a user chosen seed.
    DeriveObjectAddressFromSeed = 254,
    /// Resource account address: creator address plus a user chosen seed.
    DeriveResourceAccountAddress = 255,
}

impl Scheme {
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let display = match self {
            Scheme::Ed25519 => "Ed25519",
            Scheme::MultiEd25519 => "MultiEd25519",
            Scheme::SingleKey => "SingleKey",
            Scheme::MultiKey => "MultiKey",
            Scheme::DeriveObjectAddressFromObject => "DeriveObjectAddressFromObject",
            Scheme::DeriveObjectAddressFromGuid => "DeriveObjectAddressFromGuid",
            Scheme::DeriveObjectAddressFromSeed => "DeriveObjectAddressFromSeed",
            Scheme::DeriveResourceAccountAddress => "DeriveResourceAccountAddress",
        };
        write!(f, "Scheme::{}", display)
    }
}

/// `SHA3-256(material || scheme)`.
pub fn derive_authentication_key(material: &[u8], scheme: Scheme) -> [u8; HashValue::LENGTH] {
    HashValue::from_iter_sha3([material, &[scheme.as_byte()][..]]).into_inner()
}
