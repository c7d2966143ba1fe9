// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for Move.

pub mod account_address;
pub mod identifier;
pub mod language_storage;
pub mod parser;
pub mod transaction_argument;
pub mod u256;

#[cfg(test)]
mod unit_tests;
