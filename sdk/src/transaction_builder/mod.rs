// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

pub mod aptos_stdlib;

use crate::{config::TransactionConfig, error::SdkError};
use aptos_rest_client::NodeTransport;
use aptos_types::{
    account_address::AccountAddress,
    chain_id::ChainId,
    transaction::{RawTransaction, RawTransactionWithData, TransactionPayload},
};
use once_cell::sync::OnceCell;
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Per-transaction overrides. Anything left unset comes from the network or from the
/// builder's [`TransactionConfig`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TransactionOptions {
    pub max_gas_amount: Option<u64>,
    pub gas_unit_price: Option<u64>,
    /// Overrides [`TransactionConfig::estimate_gas_unit_price`] when `gas_unit_price` is unset.
    pub estimate_gas_unit_price: Option<bool>,
    pub expiration_secs: Option<u64>,
    pub sequence_number: Option<u64>,
    pub chain_id: Option<ChainId>,
    pub fee_payer: Option<AccountAddress>,
    pub secondary_signers: Vec<AccountAddress>,
}

impl TransactionOptions {
    pub fn with_sequence_number(mut self, sequence_number: u64) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }

    pub fn with_gas_unit_price(mut self, gas_unit_price: u64) -> Self {
        self.gas_unit_price = Some(gas_unit_price);
        self
    }

    pub fn with_max_gas_amount(mut self, max_gas_amount: u64) -> Self {
        self.max_gas_amount = Some(max_gas_amount);
        self
    }

    pub fn with_expiration_secs(mut self, expiration_secs: u64) -> Self {
        self.expiration_secs = Some(expiration_secs);
        self
    }

    pub fn with_chain_id(mut self, chain_id: ChainId) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_fee_payer(mut self, fee_payer: AccountAddress) -> Self {
        self.fee_payer = Some(fee_payer);
        self
    }

    pub fn with_secondary_signers(mut self, secondary_signers: Vec<AccountAddress>) -> Self {
        self.secondary_signers = secondary_signers;
        self
    }

    /// Whether the built transaction needs more than the sender's signature.
    pub fn is_multi_agent(&self) -> bool {
        self.fee_payer.is_some() || !self.secondary_signers.is_empty()
    }
}

/// What [`TransactionBuilder::build`] produces: a plain transaction, or one that needs the
/// signatures of secondary signers or a fee payer as well.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BuiltTransaction {
    Raw(RawTransaction),
    WithData(RawTransactionWithData),
}

impl BuiltTransaction {
    pub fn raw_txn(&self) -> &RawTransaction {
        match self {
            Self::Raw(raw_txn) => raw_txn,
            Self::WithData(txn) => txn.raw_txn(),
        }
    }

    pub fn into_raw_txn(self) -> RawTransaction {
        match self {
            Self::Raw(raw_txn) => raw_txn,
            Self::WithData(txn) => txn.into_raw_txn(),
        }
    }

    pub fn sequence_number(&self) -> u64 {
        self.raw_txn().sequence_number()
    }
}

/// Builds raw transactions, fetching whatever the caller left unset from the node.
pub struct TransactionBuilder {
    transport: Arc<dyn NodeTransport>,
    config: TransactionConfig,
    chain_id: OnceCell<ChainId>,
}

impl TransactionBuilder {
    pub fn new(transport: Arc<dyn NodeTransport>) -> Self {
        Self::with_config(transport, TransactionConfig::default())
    }

    pub fn with_config(transport: Arc<dyn NodeTransport>, config: TransactionConfig) -> Self {
        Self {
            transport,
            config,
            chain_id: OnceCell::new(),
        }
    }

    pub fn transport(&self) -> &Arc<dyn NodeTransport> {
        &self.transport
    }

    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    /// Builds a transaction from `sender`, wrapped for co-signing if `options` names a fee
    /// payer or secondary signers.
    pub async fn build(
        &self,
        sender: AccountAddress,
        payload: TransactionPayload,
        options: &TransactionOptions,
        cancel: &CancellationToken,
    ) -> Result<BuiltTransaction, SdkError> {
        let raw_txn = self.build_raw(sender, payload, options, cancel).await?;
        Ok(if let Some(fee_payer) = options.fee_payer {
            BuiltTransaction::WithData(RawTransactionWithData::new_fee_payer(
                raw_txn,
                options.secondary_signers.clone(),
                fee_payer,
            ))
        } else if !options.secondary_signers.is_empty() {
            BuiltTransaction::WithData(RawTransactionWithData::new_multi_agent(
                raw_txn,
                options.secondary_signers.clone(),
            ))
        } else {
            BuiltTransaction::Raw(raw_txn)
        })
    }

    /// Builds the bare raw transaction. The chain id, sequence number and gas price are
    /// fetched concurrently when unset; any failed fetch fails the build.
    pub async fn build_raw(
        &self,
        sender: AccountAddress,
        payload: TransactionPayload,
        options: &TransactionOptions,
        cancel: &CancellationToken,
    ) -> Result<RawTransaction, SdkError> {
        let (chain_id, sequence_number, gas_unit_price) = tokio::join!(
            self.resolve_chain_id(options.chain_id, cancel),
            self.resolve_sequence_number(sender, options.sequence_number, cancel),
            self.resolve_gas_unit_price(options, cancel),
        );
        let (chain_id, sequence_number, gas_unit_price) =
            (chain_id?, sequence_number?, gas_unit_price?);

        let max_gas_amount = options.max_gas_amount.unwrap_or(self.config.max_gas_amount);
        let expiration_secs = options
            .expiration_secs
            .unwrap_or(self.config.expiration_secs);
        if max_gas_amount == 0 {
            return Err(SdkError::InvalidArgument("max gas amount must be positive".into()));
        }
        if gas_unit_price == 0 {
            return Err(SdkError::InvalidArgument("gas unit price must be positive".into()));
        }
        if expiration_secs == 0 {
            return Err(SdkError::InvalidArgument(
                "expiration must lie in the future".into(),
            ));
        }
        let expiration_timestamp_secs = now_secs()?.saturating_add(expiration_secs);

        debug!(
            sender = %sender,
            sequence_number,
            gas_unit_price,
            chain_id = %chain_id,
            "built transaction"
        );
        Ok(RawTransaction::new(
            sender,
            sequence_number,
            payload,
            max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs,
            chain_id,
        ))
    }

    /// The network's chain id, fetched once and then served from cache.
    pub async fn chain_id(&self, cancel: &CancellationToken) -> Result<ChainId, SdkError> {
        if let Some(chain_id) = self.chain_id.get() {
            return Ok(*chain_id);
        }
        let chain_id = self.transport.get_chain_id(cancel).await?;
        // A concurrent first fetch may have won; the value is the same either way.
        let _ = self.chain_id.set(chain_id);
        Ok(chain_id)
    }

    async fn resolve_chain_id(
        &self,
        chain_id: Option<ChainId>,
        cancel: &CancellationToken,
    ) -> Result<ChainId, SdkError> {
        match chain_id {
            Some(chain_id) => Ok(chain_id),
            None => self.chain_id(cancel).await,
        }
    }

    async fn resolve_sequence_number(
        &self,
        sender: AccountAddress,
        sequence_number: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<u64, SdkError> {
        match sequence_number {
            Some(sequence_number) => Ok(sequence_number),
            None => Ok(self
                .transport
                .get_account(sender, cancel)
                .await?
                .sequence_number
                .0),
        }
    }

    async fn resolve_gas_unit_price(
        &self,
        options: &TransactionOptions,
        cancel: &CancellationToken,
    ) -> Result<u64, SdkError> {
        if let Some(gas_unit_price) = options.gas_unit_price {
            return Ok(gas_unit_price);
        }
        let estimate = options
            .estimate_gas_unit_price
            .unwrap_or(self.config.estimate_gas_unit_price);
        if !estimate {
            return Ok(self.config.gas_unit_price);
        }
        Ok(self.transport.estimate_gas_price(cancel).await?.gas_estimate)
    }
}

fn now_secs() -> Result<u64, SdkError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .map_err(|e| SdkError::InvalidArgument(format!("system clock is before 1970: {}", e)))
}
