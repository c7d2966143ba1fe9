// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! The Aptos SDK: build, sign, submit and wait for transactions.
//!
//! Transactions are built by a [`TransactionBuilder`](transaction_builder::TransactionBuilder)
//! that fetches whatever the caller leaves unset from a node, signed by any
//! [`TransactionSigner`](types::transaction::TransactionSigner), and submitted either one at a
//! time, in batches, or through a [`SubmissionPool`](submission::SubmissionPool) that keeps many
//! transactions of one sender in flight.

pub mod bcs {
    pub use aptos_bcs::*;
}

pub mod crypto {
    pub use aptos_crypto::*;
}

pub mod move_types {
    pub use move_core_types::*;
}

pub mod rest_client {
    pub use aptos_rest_client::*;
}

pub mod types {
    pub use aptos_types::*;
}

pub mod config;
pub mod error;
pub mod local_account;
pub mod logging;
pub mod simulate;
pub mod submission;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transaction_builder;
pub mod wait;

pub use local_account::LocalAccount;

#[cfg(test)]
mod unit_tests;
