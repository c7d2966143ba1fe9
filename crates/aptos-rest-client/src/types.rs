// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! JSON views returned by the Aptos REST API.

use crate::error::AptosError;
use aptos_crypto::HashValue;
use aptos_types::{account_address::AccountAddress, transaction::authenticator::AuthenticationKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// A u64 the API encodes as a decimal string, since JSON numbers lose precision past 2^53.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct U64(pub u64);

impl U64 {
    pub fn inner(&self) -> &u64 {
        &self.0
    }
}

impl From<u64> for U64 {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<U64> for u64 {
    fn from(value: U64) -> Self {
        value.0
    }
}

impl fmt::Display for U64 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for U64 {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl Serialize for U64 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for U64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String>::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// The on-chain state of an account the transaction builder needs.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Account {
    pub authentication_key: AuthenticationKey,
    pub sequence_number: U64,
}

/// Gas unit price estimates, in octas.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GasEstimation {
    pub deprioritized_gas_estimate: Option<u64>,
    pub gas_estimate: u64,
    pub prioritized_gas_estimate: Option<u64>,
}

/// The body of the API index.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexResponse {
    pub chain_id: u8,
    pub epoch: U64,
    pub ledger_version: U64,
    pub oldest_ledger_version: U64,
    pub ledger_timestamp: U64,
    pub block_height: U64,
    pub oldest_block_height: U64,
}

/// The request part of a user transaction, as echoed by the API.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UserTransactionRequest {
    pub sender: AccountAddress,
    pub sequence_number: U64,
    pub max_gas_amount: U64,
    pub gas_unit_price: U64,
    pub expiration_timestamp_secs: U64,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PendingTransaction {
    pub hash: HashValue,
    #[serde(flatten)]
    pub request: UserTransactionRequest,
}

/// Execution results shared by every committed transaction.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TransactionInfo {
    pub version: U64,
    pub hash: HashValue,
    pub gas_used: U64,
    pub success: bool,
    pub vm_status: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UserTransaction {
    #[serde(flatten)]
    pub info: TransactionInfo,
    #[serde(flatten)]
    pub request: UserTransactionRequest,
    pub timestamp: U64,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transaction {
    PendingTransaction(PendingTransaction),
    UserTransaction(Box<UserTransaction>),
    GenesisTransaction(TransactionInfo),
    BlockMetadataTransaction(TransactionInfo),
    StateCheckpointTransaction(TransactionInfo),
    BlockEpilogueTransaction(TransactionInfo),
    ValidatorTransaction(TransactionInfo),
}

impl Transaction {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PendingTransaction(_))
    }

    pub fn hash(&self) -> HashValue {
        match self {
            Self::PendingTransaction(txn) => txn.hash,
            Self::UserTransaction(txn) => txn.info.hash,
            Self::GenesisTransaction(info)
            | Self::BlockMetadataTransaction(info)
            | Self::StateCheckpointTransaction(info)
            | Self::BlockEpilogueTransaction(info)
            | Self::ValidatorTransaction(info) => info.hash,
        }
    }

    /// Committed transactions carry a version, pending ones do not.
    pub fn version(&self) -> Option<u64> {
        self.transaction_info().map(|info| info.version.0)
    }

    pub fn success(&self) -> bool {
        self.transaction_info().is_some_and(|info| info.success)
    }

    pub fn vm_status(&self) -> Option<&str> {
        self.transaction_info().map(|info| info.vm_status.as_str())
    }

    pub fn transaction_info(&self) -> Option<&TransactionInfo> {
        match self {
            Self::PendingTransaction(_) => None,
            Self::UserTransaction(txn) => Some(&txn.info),
            Self::GenesisTransaction(info)
            | Self::BlockMetadataTransaction(info)
            | Self::StateCheckpointTransaction(info)
            | Self::BlockEpilogueTransaction(info)
            | Self::ValidatorTransaction(info) => Some(info),
        }
    }

    pub fn type_str(&self) -> &'static str {
        match self {
            Self::PendingTransaction(_) => "pending_transaction",
            Self::UserTransaction(_) => "user_transaction",
            Self::GenesisTransaction(_) => "genesis_transaction",
            Self::BlockMetadataTransaction(_) => "block_metadata_transaction",
            Self::StateCheckpointTransaction(_) => "state_checkpoint_transaction",
            Self::BlockEpilogueTransaction(_) => "block_epilogue_transaction",
            Self::ValidatorTransaction(_) => "validator_transaction",
        }
    }
}

/// One rejected entry of a batch submission.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TransactionsBatchSingleSubmissionFailure {
    pub error: AptosError,
    pub transaction_index: usize,
}

/// The batch endpoint reports only the entries it rejected.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TransactionsBatchSubmissionResult {
    pub transaction_failures: Vec<TransactionsBatchSingleSubmissionFailure>,
}

/// Query flags of the simulation endpoint.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SimulationOptions {
    pub estimate_gas_unit_price: bool,
    pub estimate_max_gas_amount: bool,
    pub estimate_prioritized_gas_unit_price: bool,
}

impl SimulationOptions {
    pub(crate) fn query(&self) -> [(&'static str, bool); 3] {
        [
            ("estimate_gas_unit_price", self.estimate_gas_unit_price),
            ("estimate_max_gas_amount", self.estimate_max_gas_amount),
            (
                "estimate_prioritized_gas_unit_price",
                self.estimate_prioritized_gas_unit_price,
            ),
        ]
    }
}
