// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    error::RestError,
    types::{
        Account, GasEstimation, PendingTransaction, SimulationOptions, Transaction,
        TransactionsBatchSubmissionResult, UserTransaction,
    },
    Client,
};
use aptos_crypto::HashValue;
use aptos_types::{
    account_address::AccountAddress, chain_id::ChainId, transaction::SignedTransaction,
};
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// The node operations the transaction pipeline depends on.
///
/// Every call takes a cancellation token; a cancelled call returns [`RestError::Cancelled`]
/// without waiting for the node.
#[async_trait]
pub trait NodeTransport: Send + Sync {
    async fn get_account(
        &self,
        address: AccountAddress,
        cancel: &CancellationToken,
    ) -> Result<Account, RestError>;

    async fn estimate_gas_price(&self, cancel: &CancellationToken)
        -> Result<GasEstimation, RestError>;

    async fn get_chain_id(&self, cancel: &CancellationToken) -> Result<ChainId, RestError>;

    /// Posts the BCS encoding of `txn` and returns the pending transaction the node accepted.
    async fn submit(
        &self,
        txn: &SignedTransaction,
        cancel: &CancellationToken,
    ) -> Result<PendingTransaction, RestError>;

    async fn submit_batch(
        &self,
        txns: &[SignedTransaction],
        cancel: &CancellationToken,
    ) -> Result<TransactionsBatchSubmissionResult, RestError>;

    async fn simulate(
        &self,
        txn: &SignedTransaction,
        options: SimulationOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<UserTransaction>, RestError>;

    async fn get_transaction_by_hash(
        &self,
        hash: HashValue,
        cancel: &CancellationToken,
    ) -> Result<Transaction, RestError>;

    /// Long-polls until the transaction leaves the pending state or the node gives up.
    async fn wait_transaction_by_hash(
        &self,
        hash: HashValue,
        cancel: &CancellationToken,
    ) -> Result<Transaction, RestError>;

    /// Only available on networks with a faucet.
    async fn fund(
        &self,
        address: AccountAddress,
        amount: u64,
        cancel: &CancellationToken,
    ) -> Result<(), RestError>;
}

/// Races `future` against `cancel`.
pub async fn cancellable<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = Result<T, RestError>>,
) -> Result<T, RestError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RestError::Cancelled),
        result = future => result,
    }
}

#[async_trait]
impl NodeTransport for Client {
    async fn get_account(
        &self,
        address: AccountAddress,
        cancel: &CancellationToken,
    ) -> Result<Account, RestError> {
        cancellable(cancel, async {
            Ok(Client::get_account(self, address).await?.into_inner())
        })
        .await
    }

    async fn estimate_gas_price(
        &self,
        cancel: &CancellationToken,
    ) -> Result<GasEstimation, RestError> {
        cancellable(cancel, async {
            Ok(Client::estimate_gas_price(self).await?.into_inner())
        })
        .await
    }

    async fn get_chain_id(&self, cancel: &CancellationToken) -> Result<ChainId, RestError> {
        cancellable(cancel, async {
            let index = self.get_index().await?.into_inner();
            Ok(ChainId::new(index.chain_id))
        })
        .await
    }

    async fn submit(
        &self,
        txn: &SignedTransaction,
        cancel: &CancellationToken,
    ) -> Result<PendingTransaction, RestError> {
        cancellable(cancel, async { Ok(self.submit_bcs(txn).await?.into_inner()) }).await
    }

    async fn submit_batch(
        &self,
        txns: &[SignedTransaction],
        cancel: &CancellationToken,
    ) -> Result<TransactionsBatchSubmissionResult, RestError> {
        cancellable(cancel, async {
            Ok(self.submit_batch_bcs(txns).await?.into_inner())
        })
        .await
    }

    async fn simulate(
        &self,
        txn: &SignedTransaction,
        options: SimulationOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<UserTransaction>, RestError> {
        cancellable(cancel, async {
            Ok(self.simulate_bcs(txn, options).await?.into_inner())
        })
        .await
    }

    async fn get_transaction_by_hash(
        &self,
        hash: HashValue,
        cancel: &CancellationToken,
    ) -> Result<Transaction, RestError> {
        cancellable(cancel, async {
            Ok(Client::get_transaction_by_hash(self, hash).await?.into_inner())
        })
        .await
    }

    async fn wait_transaction_by_hash(
        &self,
        hash: HashValue,
        cancel: &CancellationToken,
    ) -> Result<Transaction, RestError> {
        cancellable(cancel, async {
            Ok(Client::wait_transaction_by_hash(self, hash).await?.into_inner())
        })
        .await
    }

    async fn fund(
        &self,
        address: AccountAddress,
        amount: u64,
        cancel: &CancellationToken,
    ) -> Result<(), RestError> {
        let faucet = self.faucet().ok_or_else(|| {
            RestError::Unknown(anyhow::anyhow!("no faucet is configured for this client"))
        })?;
        cancellable(cancel, async {
            faucet.fund(address, amount).await?;
            Ok(())
        })
        .await
    }
}
