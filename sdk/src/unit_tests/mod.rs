// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

mod builder_test;
mod local_account_test;

use crate::transaction_builder::aptos_stdlib;
use aptos_crypto::ed25519::Ed25519PrivateKey;
use aptos_types::{
    account_address::AccountAddress,
    transaction::{TransactionPayload, TransactionSigner},
};

pub(crate) fn ed25519_key(seed: u8) -> Ed25519PrivateKey {
    Ed25519PrivateKey::from_seed(&[seed; 32]).unwrap()
}

pub(crate) fn address_of(signer: &dyn TransactionSigner) -> AccountAddress {
    signer.address()
}

pub(crate) fn transfer(amount: u64) -> TransactionPayload {
    aptos_stdlib::aptos_account_transfer(AccountAddress::TWO, amount).unwrap()
}
