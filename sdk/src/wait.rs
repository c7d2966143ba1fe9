// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Waiting for submitted transactions to leave the pending state.

use crate::{config::WaitConfig, error::SdkError};
use aptos_crypto::HashValue;
use aptos_rest_client::{
    error::RestError,
    types::{PendingTransaction, Transaction},
    NodeTransport,
};
use aptos_types::transaction::SignedTransaction;
use futures::future::join_all;
use std::{
    future::Future,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::time::{sleep, sleep_until, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A transaction the node has not seen yet may still be propagating from the node it was
/// submitted to.
const NOT_FOUND_GRACE: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WaitOptions {
    pub poll_period: Duration,
    pub timeout: Duration,
    /// Try the node's long-poll endpoint before falling back to polling.
    pub use_long_poll: bool,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::from(&WaitConfig::default())
    }
}

impl From<&WaitConfig> for WaitOptions {
    fn from(config: &WaitConfig) -> Self {
        Self {
            poll_period: config.poll_period(),
            timeout: config.timeout(),
            use_long_poll: config.use_long_poll,
        }
    }
}

impl WaitOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_period(mut self, poll_period: Duration) -> Self {
        self.poll_period = poll_period;
        self
    }
}

/// Waits until the transaction with `hash` is committed, whatever its outcome.
pub async fn wait_for_transaction(
    transport: &dyn NodeTransport,
    hash: HashValue,
    options: &WaitOptions,
    cancel: &CancellationToken,
) -> Result<Transaction, SdkError> {
    with_deadline(
        hash,
        options,
        cancel,
        poll_until_committed(transport, hash, options, None, cancel),
    )
    .await
}

/// Like [`wait_for_transaction`], but a committed transaction that aborted is an error.
pub async fn wait_for_successful_transaction(
    transport: &dyn NodeTransport,
    hash: HashValue,
    options: &WaitOptions,
    cancel: &CancellationToken,
) -> Result<Transaction, SdkError> {
    ensure_success(wait_for_transaction(transport, hash, options, cancel).await?)
}

/// Waits for a transaction this process submitted. Once its expiration time has passed without
/// the node knowing it, it can no longer be committed and [`SdkError::TransactionExpired`] is
/// returned.
pub async fn wait_for_signed_transaction(
    transport: &dyn NodeTransport,
    txn: &SignedTransaction,
    options: &WaitOptions,
    cancel: &CancellationToken,
) -> Result<Transaction, SdkError> {
    let hash = txn.committed_hash()?;
    let expiration = txn.expiration_timestamp_secs();
    with_deadline(
        hash,
        options,
        cancel,
        poll_until_committed(transport, hash, options, Some(expiration), cancel),
    )
    .await
}

/// Waits for a transaction the node accepted through [`NodeTransport::submit`].
pub async fn wait_for_pending_transaction(
    transport: &dyn NodeTransport,
    pending: &PendingTransaction,
    options: &WaitOptions,
    cancel: &CancellationToken,
) -> Result<Transaction, SdkError> {
    let expiration = pending.request.expiration_timestamp_secs.0;
    with_deadline(
        pending.hash,
        options,
        cancel,
        poll_until_committed(transport, pending.hash, options, Some(expiration), cancel),
    )
    .await
}

/// Waits for several transactions at once, polling every outstanding hash each round.
///
/// The call itself only fails on cancellation. Each hash gets its own outcome, in input order:
/// the committed transaction, the error the node returned for it, or a timeout if it was still
/// pending at the deadline.
pub async fn wait_for_transactions(
    transport: &dyn NodeTransport,
    hashes: &[HashValue],
    options: &WaitOptions,
    cancel: &CancellationToken,
) -> Result<Vec<Result<Transaction, SdkError>>, SdkError> {
    let start = Instant::now();
    let deadline = start + options.timeout;
    let mut outcomes: Vec<Option<Result<Transaction, SdkError>>> =
        hashes.iter().map(|_| None).collect();

    loop {
        let outstanding: Vec<usize> = (0..hashes.len())
            .filter(|index| outcomes[*index].is_none())
            .collect();
        if outstanding.is_empty() || Instant::now() >= deadline {
            break;
        }

        let round = join_all(
            outstanding
                .iter()
                .map(|index| transport.get_transaction_by_hash(hashes[*index], cancel)),
        );
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SdkError::Cancelled),
            fetched = timeout_at(deadline, round) => fetched,
        };
        let Ok(fetched) = fetched else {
            break;
        };

        for (index, result) in outstanding.into_iter().zip(fetched) {
            match result {
                Ok(txn) if !txn.is_pending() => outcomes[index] = Some(Ok(txn)),
                Ok(_) => {},
                Err(e) if e.is_not_found() && start.elapsed() < NOT_FOUND_GRACE => {},
                Err(e) => outcomes[index] = Some(Err(e.into())),
            }
        }

        let next_round = std::cmp::min(Instant::now() + options.poll_period, deadline);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SdkError::Cancelled),
            _ = sleep_until(next_round) => {},
        }
    }

    Ok(hashes
        .iter()
        .zip(outcomes)
        .map(|(hash, outcome)| {
            outcome.unwrap_or_else(|| Err(SdkError::Timeout(format!("transaction {}", hash))))
        })
        .collect())
}

fn ensure_success(txn: Transaction) -> Result<Transaction, SdkError> {
    if txn.success() {
        Ok(txn)
    } else {
        Err(SdkError::TransactionFailed {
            hash: txn.hash(),
            vm_status: txn.vm_status().unwrap_or_default().to_string(),
        })
    }
}

async fn with_deadline(
    hash: HashValue,
    options: &WaitOptions,
    cancel: &CancellationToken,
    wait: impl Future<Output = Result<Transaction, SdkError>>,
) -> Result<Transaction, SdkError> {
    let deadline = Instant::now() + options.timeout;
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SdkError::Cancelled),
        result = timeout_at(deadline, wait) => match result {
            Ok(result) => result,
            Err(_) => Err(SdkError::Timeout(format!("transaction {}", hash))),
        },
    }
}

async fn poll_until_committed(
    transport: &dyn NodeTransport,
    hash: HashValue,
    options: &WaitOptions,
    expiration_timestamp_secs: Option<u64>,
    cancel: &CancellationToken,
) -> Result<Transaction, SdkError> {
    let start = Instant::now();
    if options.use_long_poll {
        match transport.wait_transaction_by_hash(hash, cancel).await {
            Ok(txn) if !txn.is_pending() => return Ok(txn),
            Ok(_) => debug!(hash = %hash, "still pending after long poll"),
            Err(RestError::Cancelled) => return Err(SdkError::Cancelled),
            Err(e) => debug!(hash = %hash, error = %e, "long poll failed, polling instead"),
        }
    }

    loop {
        match transport.get_transaction_by_hash(hash, cancel).await {
            Ok(txn) if !txn.is_pending() => return Ok(txn),
            Ok(_) => {},
            Err(e) if e.is_not_found() => match expiration_timestamp_secs {
                Some(expiration) if now_secs() > expiration => {
                    return Err(SdkError::TransactionExpired(hash));
                },
                Some(_) => {},
                None if start.elapsed() < NOT_FOUND_GRACE => {},
                None => return Err(e.into()),
            },
            Err(e) => return Err(e.into()),
        }
        sleep(options.poll_period).await;
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default()
}
