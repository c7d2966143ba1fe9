// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::transaction::authenticator::AuthenticationKey;
use aptos_crypto::{ed25519::Ed25519PublicKey, HashValue, Scheme};
pub use move_core_types::account_address::{AccountAddress, AccountAddressParseError};

/// The address of a fresh account controlled by a single Ed25519 key.
pub fn from_public_key(public_key: &Ed25519PublicKey) -> AccountAddress {
    AuthenticationKey::ed25519(public_key).account_address()
}

fn derive_address(parts: &[&[u8]], scheme: Scheme) -> AccountAddress {
    let scheme = [scheme.as_byte()];
    let hash = HashValue::from_iter_sha3(parts.iter().copied().chain(std::iter::once(&scheme[..])));
    AccountAddress::new(hash.into_inner())
}

/// The address of the resource account `address` creates with `seed`.
pub fn create_resource_address(address: AccountAddress, seed: &[u8]) -> AccountAddress {
    derive_address(
        &[address.as_ref(), seed],
        Scheme::DeriveResourceAccountAddress,
    )
}

/// The address of the named object `creator` creates with `seed`.
pub fn create_object_address(creator: AccountAddress, seed: &[u8]) -> AccountAddress {
    derive_address(
        &[creator.as_ref(), seed],
        Scheme::DeriveObjectAddressFromSeed,
    )
}

/// The address of the object that `creator` derives from the existing object `object_address`.
pub fn create_derived_object_address(
    creator: AccountAddress,
    object_address: AccountAddress,
) -> AccountAddress {
    derive_address(
        &[creator.as_ref(), object_address.as_ref()],
        Scheme::DeriveObjectAddressFromObject,
    )
}

/// The address of the object created from the `creation_num`-th GUID of `creator`.
pub fn create_object_address_from_guid(creator: AccountAddress, creation_num: u64) -> AccountAddress {
    derive_address(
        &[&creation_num.to_le_bytes()[..], creator.as_ref()],
        Scheme::DeriveObjectAddressFromGuid,
    )
}
