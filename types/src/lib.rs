// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod account_address;
pub mod chain_id;
pub mod serde_helper;
pub mod transaction;

pub use move_core_types::{
    identifier, language_storage, parser, transaction_argument, u256,
};

#[cfg(test)]
mod unit_tests;
