// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Concurrent build, sign and submit of many transactions from one sender.
//!
//! The pool is three stages joined by bounded channels:
//!
//! 1. a single sequence dispenser reads the sender's sequence number once and hands out
//!    consecutive numbers in input order,
//! 2. `num_workers` build workers build each transaction with its assigned number and sign it,
//! 3. `num_workers` submit workers post the signed transactions to the node.
//!
//! Every request that enters the pipeline yields exactly one [`SubmissionResponse`]. Submissions
//! may reach the node out of order, and a failed transaction keeps its sequence number.

use crate::{
    config::SubmissionConfig,
    error::SdkError,
    transaction_builder::{BuiltTransaction, TransactionBuilder, TransactionOptions},
};
use aptos_crypto::HashValue;
use aptos_rest_client::{error::AptosError, types::PendingTransaction, NodeTransport};
use aptos_types::{
    account_address::AccountAddress,
    transaction::{SignedTransaction, TransactionPayload, TransactionSigner},
};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::{future::Future, sync::Arc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Turns a built transaction into a signed one. Implementations may be remote or slow; the pool
/// never cancels a signing that has started.
#[async_trait]
pub trait SignTransaction: Send + Sync {
    async fn sign(&self, txn: BuiltTransaction) -> anyhow::Result<SignedTransaction>;
}

/// Any account signer can sign the transactions it sends alone.
#[async_trait]
impl<S: TransactionSigner + ?Sized> SignTransaction for S {
    async fn sign(&self, txn: BuiltTransaction) -> anyhow::Result<SignedTransaction> {
        match txn {
            BuiltTransaction::Raw(raw_txn) => Ok(self.sign_transaction(raw_txn)?),
            BuiltTransaction::WithData(_) => Err(anyhow::anyhow!(
                "transactions with co-signers need a signing function that holds every key"
            )),
        }
    }
}

/// Adapts an async closure into a [`SignTransaction`].
pub struct SignFn<F>(pub F);

#[async_trait]
impl<F, Fut> SignTransaction for SignFn<F>
where
    F: Fn(BuiltTransaction) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<SignedTransaction>> + Send,
{
    async fn sign(&self, txn: BuiltTransaction) -> anyhow::Result<SignedTransaction> {
        (self.0)(txn).await
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum SubmissionKind {
    #[default]
    Single,
    /// Built with co-signers; the signing function must produce every authenticator.
    MultiAgent {
        secondary_signers: Vec<AccountAddress>,
        fee_payer: Option<AccountAddress>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmissionRequest {
    pub id: u64,
    pub payload: TransactionPayload,
    pub kind: SubmissionKind,
}

impl SubmissionRequest {
    pub fn new(id: u64, payload: TransactionPayload) -> Self {
        Self {
            id,
            payload,
            kind: SubmissionKind::Single,
        }
    }
}

#[derive(Debug)]
pub struct SubmissionResponse {
    pub id: u64,
    /// The sequence number the dispenser assigned to this request.
    pub sequence_number: u64,
    pub result: Result<PendingTransaction, SdkError>,
}

struct BuildJob {
    request: SubmissionRequest,
    sequence_number: u64,
}

struct SubmitJob {
    id: u64,
    sequence_number: u64,
    txn: SignedTransaction,
}

/// Builds, signs and submits transactions for a single sender.
pub struct SubmissionPool {
    builder: Arc<TransactionBuilder>,
    signer: Arc<dyn SignTransaction>,
    config: SubmissionConfig,
}

impl SubmissionPool {
    pub fn new(
        builder: Arc<TransactionBuilder>,
        signer: Arc<dyn SignTransaction>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            builder,
            signer,
            config,
        }
    }

    /// Runs the pipeline until `requests` ends or `cancel` fires, then drops `responses`.
    ///
    /// Only the initial sequence number fetch fails the whole run, before any request is
    /// consumed. After cancellation, requests still queued inside the pipeline are answered with
    /// [`SdkError::Cancelled`] and no further requests are read.
    pub async fn run<S>(
        &self,
        sender: AccountAddress,
        requests: S,
        responses: mpsc::Sender<SubmissionResponse>,
        cancel: CancellationToken,
    ) -> Result<(), SdkError>
    where
        S: Stream<Item = SubmissionRequest> + Send + Unpin + 'static,
    {
        let transport = self.builder.transport().clone();
        let first_sequence_number = transport
            .get_account(sender, &cancel)
            .await?
            .sequence_number
            .0;
        let num_workers = self.config.num_workers.max(1);
        info!(
            sender = %sender,
            sequence_number = first_sequence_number,
            num_workers,
            "starting submission pool"
        );

        let (build_tx, build_rx) =
            async_channel::bounded::<BuildJob>(self.config.build_response_buffer.max(1));
        let (submit_tx, submit_rx) =
            async_channel::bounded::<SubmitJob>(self.config.submission_buffer.max(1));

        let mut handles = Vec::with_capacity(2 * num_workers + 1);
        handles.push(tokio::spawn(dispense_sequence_numbers(
            requests,
            build_tx,
            first_sequence_number,
            cancel.clone(),
        )));
        for worker in 0..num_workers {
            handles.push(tokio::spawn(build_worker(
                worker,
                sender,
                self.builder.clone(),
                self.signer.clone(),
                build_rx.clone(),
                submit_tx.clone(),
                responses.clone(),
                cancel.clone(),
            )));
            handles.push(tokio::spawn(submit_worker(
                worker,
                transport.clone(),
                submit_rx.clone(),
                responses.clone(),
                cancel.clone(),
            )));
        }
        // Workers hold the only remaining ends, so each stage closes when the one before ends.
        drop((build_rx, submit_tx, submit_rx, responses));

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "submission worker panicked");
            }
        }
        info!(sender = %sender, "submission pool finished");
        Ok(())
    }

    /// Runs the pipeline over `requests` and collects every response.
    pub async fn submit_all(
        &self,
        sender: AccountAddress,
        requests: Vec<SubmissionRequest>,
        cancel: CancellationToken,
    ) -> Result<Vec<SubmissionResponse>, SdkError> {
        let (responses_tx, mut responses_rx) = mpsc::channel(requests.len().max(1));
        let run = self.run(
            sender,
            futures::stream::iter(requests),
            responses_tx,
            cancel,
        );
        let collect = async {
            let mut responses = Vec::new();
            while let Some(response) = responses_rx.recv().await {
                responses.push(response);
            }
            responses
        };
        let (result, responses) = tokio::join!(run, collect);
        result?;
        Ok(responses)
    }
}

async fn dispense_sequence_numbers<S>(
    mut requests: S,
    build_tx: async_channel::Sender<BuildJob>,
    mut next_sequence_number: u64,
    cancel: CancellationToken,
) where
    S: Stream<Item = SubmissionRequest> + Unpin,
{
    loop {
        let request = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            request = requests.next() => match request {
                Some(request) => request,
                None => break,
            },
        };
        let sequence_number = next_sequence_number;
        next_sequence_number += 1;
        debug!(id = request.id, sequence_number, "assigned sequence number");
        if build_tx
            .send(BuildJob {
                request,
                sequence_number,
            })
            .await
            .is_err()
        {
            break;
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn build_worker(
    worker: usize,
    sender: AccountAddress,
    builder: Arc<TransactionBuilder>,
    signer: Arc<dyn SignTransaction>,
    build_rx: async_channel::Receiver<BuildJob>,
    submit_tx: async_channel::Sender<SubmitJob>,
    responses: mpsc::Sender<SubmissionResponse>,
    cancel: CancellationToken,
) {
    while let Ok(BuildJob {
        request,
        sequence_number,
    }) = build_rx.recv().await
    {
        let id = request.id;
        let result = if cancel.is_cancelled() {
            Err(SdkError::Cancelled)
        } else {
            build_and_sign(&builder, signer.as_ref(), sender, request, sequence_number, &cancel)
                .await
        };
        match result {
            Ok(txn) => {
                let job = SubmitJob {
                    id,
                    sequence_number,
                    txn,
                };
                if submit_tx.send(job).await.is_err() {
                    break;
                }
            },
            Err(e) => {
                debug!(worker, id, sequence_number, error = %e, "build failed");
                let response = SubmissionResponse {
                    id,
                    sequence_number,
                    result: Err(e),
                };
                if responses.send(response).await.is_err() {
                    break;
                }
            },
        }
    }
}

async fn build_and_sign(
    builder: &TransactionBuilder,
    signer: &dyn SignTransaction,
    sender: AccountAddress,
    request: SubmissionRequest,
    sequence_number: u64,
    cancel: &CancellationToken,
) -> Result<SignedTransaction, SdkError> {
    let mut options = TransactionOptions::default().with_sequence_number(sequence_number);
    if let SubmissionKind::MultiAgent {
        secondary_signers,
        fee_payer,
    } = request.kind
    {
        options.secondary_signers = secondary_signers;
        options.fee_payer = fee_payer;
    }
    let txn = builder
        .build(sender, request.payload, &options, cancel)
        .await?;
    signer.sign(txn).await.map_err(SdkError::Signing)
}

async fn submit_worker(
    worker: usize,
    transport: Arc<dyn NodeTransport>,
    submit_rx: async_channel::Receiver<SubmitJob>,
    responses: mpsc::Sender<SubmissionResponse>,
    cancel: CancellationToken,
) {
    while let Ok(SubmitJob {
        id,
        sequence_number,
        txn,
    }) = submit_rx.recv().await
    {
        let result = if cancel.is_cancelled() {
            Err(SdkError::Cancelled)
        } else {
            transport
                .submit(&txn, &cancel)
                .await
                .map_err(SdkError::from)
        };
        match &result {
            Ok(pending) => debug!(worker, id, sequence_number, hash = %pending.hash, "submitted"),
            Err(e) => warn!(worker, id, sequence_number, error = %e, "submission failed"),
        }
        let response = SubmissionResponse {
            id,
            sequence_number,
            result,
        };
        if responses.send(response).await.is_err() {
            break;
        }
    }
}

/// Submits already signed transactions in one call. The outcome of each transaction is reported
/// at its index: its committed hash if the node accepted it, the node's error otherwise.
pub async fn submit_batch(
    transport: &dyn NodeTransport,
    txns: &[SignedTransaction],
    cancel: &CancellationToken,
) -> Result<Vec<Result<HashValue, AptosError>>, SdkError> {
    let mut outcomes: Vec<Result<HashValue, AptosError>> = txns
        .iter()
        .map(|txn| Ok(Ok(txn.committed_hash()?)))
        .collect::<Result<_, SdkError>>()?;
    let result = transport.submit_batch(txns, cancel).await?;
    for failure in result.transaction_failures {
        match outcomes.get_mut(failure.transaction_index) {
            Some(outcome) => *outcome = Err(failure.error),
            None => warn!(
                index = failure.transaction_index,
                batch_size = txns.len(),
                "node reported a failure outside the batch"
            ),
        }
    }
    Ok(outcomes)
}
