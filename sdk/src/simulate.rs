// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::error::SdkError;
use aptos_crypto::HashValue;
use aptos_rest_client::{types::SimulationOptions, NodeTransport};
use aptos_types::transaction::{RawTransaction, TransactionSigner};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The outcome of running a transaction against the node's current state without committing it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SimulationResult {
    pub success: bool,
    pub vm_status: String,
    pub gas_used: u64,
    /// The price the simulation charged, which is the node's estimate if one was requested.
    pub gas_unit_price: u64,
    pub hash: HashValue,
}

/// Simulates `raw_txn` as sent by `signer`. The transaction carries zeroed signatures, so no key
/// material is used. A transaction the VM rejects is still a successful call, with
/// `success == false` and the abort in `vm_status`.
pub async fn simulate_transaction(
    transport: &dyn NodeTransport,
    signer: &dyn TransactionSigner,
    raw_txn: RawTransaction,
    options: SimulationOptions,
    cancel: &CancellationToken,
) -> Result<SimulationResult, SdkError> {
    let txn = signer.simulation_transaction(raw_txn);
    let user_txn = transport
        .simulate(&txn, options, cancel)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| SdkError::UnexpectedResponse("simulation returned no transaction".into()))?;

    let result = SimulationResult {
        success: user_txn.info.success,
        vm_status: user_txn.info.vm_status,
        gas_used: user_txn.info.gas_used.0,
        gas_unit_price: user_txn.request.gas_unit_price.0,
        hash: user_txn.info.hash,
    };
    debug!(
        sender = %txn.sender(),
        success = result.success,
        gas_used = result.gas_used,
        vm_status = %result.vm_status,
        "simulated transaction"
    );
    Ok(result)
}
