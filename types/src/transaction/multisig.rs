// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::transaction::EntryFunction;
use move_core_types::account_address::AccountAddress;
use serde::{Deserialize, Serialize};

/// A multisig transaction that allows an owner of a multisig account to execute a pre-approved
/// transaction as the multisig account.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Multisig {
    pub multisig_address: AccountAddress,

    // Transaction payload is optional if already stored on chain.
    pub transaction_payload: Option<MultisigTransactionPayload>,
}

impl Multisig {
    pub fn new(
        multisig_address: AccountAddress,
        transaction_payload: Option<MultisigTransactionPayload>,
    ) -> Self {
        Self {
            multisig_address,
            transaction_payload,
        }
    }

    /// Executes an entry function the multisig owners have already approved, carrying the payload
    /// inline.
    pub fn with_entry_function(multisig_address: AccountAddress, entry_function: EntryFunction) -> Self {
        Self::new(
            multisig_address,
            Some(MultisigTransactionPayload::EntryFunction(entry_function)),
        )
    }
}

// We use an enum here for extensibility so we can add Script payload support
// in the future for example.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum MultisigTransactionPayload {
    EntryFunction(EntryFunction),
}
