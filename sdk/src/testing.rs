// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! An in-memory [`NodeTransport`] for exercising the transaction pipeline without a node.

use aptos_crypto::HashValue;
use aptos_rest_client::{
    error::{AptosError, AptosErrorCode, AptosErrorResponse, Operation, RestError},
    types::{
        Account, GasEstimation, PendingTransaction, SimulationOptions, Transaction,
        TransactionInfo, TransactionsBatchSingleSubmissionFailure,
        TransactionsBatchSubmissionResult, UserTransaction, UserTransactionRequest, U64,
    },
    cancellable, Method, NodeTransport, StatusCode,
};
use aptos_types::{
    account_address::AccountAddress,
    chain_id::ChainId,
    transaction::{authenticator::AuthenticationKey, SignedTransaction},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};
use tokio_util::sync::CancellationToken;

pub const ABORTED_VM_STATUS: &str = "Move abort in 0x1::coin: EINSUFFICIENT_BALANCE(0x10006)";
pub const SUCCESS_VM_STATUS: &str = "Executed successfully";
const SIMULATED_GAS_USED: u64 = 7;

/// How many times each transport operation was called.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CallCounts {
    pub get_account: usize,
    pub estimate_gas_price: usize,
    pub get_chain_id: usize,
    pub submit: usize,
    pub submit_batch: usize,
    pub simulate: usize,
    pub get_transaction_by_hash: usize,
    pub wait_transaction_by_hash: usize,
    pub fund: usize,
}

#[derive(Clone, Debug)]
enum MockTxn {
    /// Reported as pending for this many more lookups.
    Pending {
        request: UserTransactionRequest,
        polls_left: usize,
        success: bool,
    },
    Committed(UserTransaction),
}

#[derive(Default)]
struct MockState {
    accounts: HashMap<AccountAddress, u64>,
    transactions: HashMap<HashValue, MockTxn>,
    submitted: Vec<SignedTransaction>,
    calls: CallCounts,
    next_version: u64,
}

pub struct MockTransport {
    chain_id: ChainId,
    gas_estimate: u64,
    fetch_delay: Duration,
    submit_delay: Duration,
    pending_polls: usize,
    long_poll_fails: bool,
    empty_simulation: bool,
    rejected_sequence_numbers: HashSet<u64>,
    aborted_sequence_numbers: HashSet<u64>,
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            gas_estimate: 100,
            fetch_delay: Duration::ZERO,
            submit_delay: Duration::ZERO,
            pending_polls: 0,
            long_poll_fails: false,
            empty_simulation: false,
            rejected_sequence_numbers: HashSet::new(),
            aborted_sequence_numbers: HashSet::new(),
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with_account(self, address: AccountAddress, sequence_number: u64) -> Self {
        self.state.lock().accounts.insert(address, sequence_number);
        self
    }

    pub fn with_gas_estimate(mut self, gas_estimate: u64) -> Self {
        self.gas_estimate = gas_estimate;
        self
    }

    /// Delays every read so concurrent fetches overlap.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    /// Submitted transactions stay pending for this many lookups.
    pub fn with_pending_polls(mut self, pending_polls: usize) -> Self {
        self.pending_polls = pending_polls;
        self
    }

    pub fn with_failing_long_poll(mut self) -> Self {
        self.long_poll_fails = true;
        self
    }

    pub fn with_empty_simulation(mut self) -> Self {
        self.empty_simulation = true;
        self
    }

    /// Submissions with this sequence number are rejected by the mempool.
    pub fn reject_sequence_number(mut self, sequence_number: u64) -> Self {
        self.rejected_sequence_numbers.insert(sequence_number);
        self
    }

    /// Transactions with this sequence number are accepted but abort when executed.
    pub fn abort_sequence_number(mut self, sequence_number: u64) -> Self {
        self.aborted_sequence_numbers.insert(sequence_number);
        self
    }

    /// Registers a transaction that nobody submitted through this transport.
    pub fn insert_transaction(&self, txn: &SignedTransaction, polls_left: usize) {
        let mut state = self.state.lock();
        let success = !self.aborted_sequence_numbers.contains(&txn.sequence_number());
        if let Ok(hash) = txn.committed_hash() {
            state.transactions.insert(hash, MockTxn::Pending {
                request: request_of(txn),
                polls_left,
                success,
            });
        }
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }

    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.state.lock().submitted.clone()
    }

    pub fn sequence_number(&self, address: AccountAddress) -> Option<u64> {
        self.state.lock().accounts.get(&address).copied()
    }

    fn accept(&self, txn: &SignedTransaction) -> Result<PendingTransaction, AptosError> {
        let hash = txn
            .committed_hash()
            .map_err(|e| aptos_error(AptosErrorCode::InvalidInput, e.to_string()))?;
        if txn.chain_id() != self.chain_id {
            return Err(aptos_error(
                AptosErrorCode::InvalidInput,
                format!("wrong chain id {}", txn.chain_id()),
            ));
        }
        if self.rejected_sequence_numbers.contains(&txn.sequence_number()) {
            return Err(aptos_error(
                AptosErrorCode::VmError,
                "SEQUENCE_NUMBER_TOO_NEW".to_string(),
            ));
        }

        let request = request_of(txn);
        let mut state = self.state.lock();
        state.submitted.push(txn.clone());
        state.transactions.insert(hash, MockTxn::Pending {
            request: request.clone(),
            polls_left: self.pending_polls,
            success: !self.aborted_sequence_numbers.contains(&txn.sequence_number()),
        });
        Ok(PendingTransaction { hash, request })
    }

    fn lookup(&self, hash: HashValue, operation: Operation) -> Result<Transaction, RestError> {
        let mut state = self.state.lock();
        let next_version = state.next_version;
        let txn = state.transactions.get_mut(&hash).ok_or_else(|| {
            not_found(
                operation,
                AptosErrorCode::TransactionNotFound,
                format!("transaction {} not found", hash),
            )
        })?;
        let committed = match txn {
            MockTxn::Committed(committed) => {
                return Ok(Transaction::UserTransaction(Box::new(committed.clone())));
            },
            MockTxn::Pending {
                request,
                polls_left,
                ..
            } if *polls_left > 0 => {
                *polls_left -= 1;
                return Ok(Transaction::PendingTransaction(PendingTransaction {
                    hash,
                    request: request.clone(),
                }));
            },
            MockTxn::Pending {
                request, success, ..
            } => UserTransaction {
                info: TransactionInfo {
                    version: U64(next_version),
                    hash,
                    gas_used: U64(SIMULATED_GAS_USED),
                    success: *success,
                    vm_status: vm_status(*success).to_string(),
                },
                request: request.clone(),
                timestamp: U64(0),
            },
        };
        *txn = MockTxn::Committed(committed.clone());
        state.next_version += 1;
        Ok(Transaction::UserTransaction(Box::new(committed)))
    }

    /// Every call goes through here, so a cancelled token fails it like the real client does.
    async fn delay(&self, delay: Duration, cancel: &CancellationToken) -> Result<(), RestError> {
        cancellable(cancel, async {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl NodeTransport for MockTransport {
    async fn get_account(
        &self,
        address: AccountAddress,
        cancel: &CancellationToken,
    ) -> Result<Account, RestError> {
        self.state.lock().calls.get_account += 1;
        self.delay(self.fetch_delay, cancel).await?;
        let sequence_number = self.sequence_number(address).ok_or_else(|| {
            not_found(
                Operation::new(Method::GET, format!("/v1/accounts/{}", address)),
                AptosErrorCode::AccountNotFound,
                format!("account {} not found", address),
            )
        })?;
        Ok(Account {
            authentication_key: AuthenticationKey::new(address.into_bytes()),
            sequence_number: U64(sequence_number),
        })
    }

    async fn estimate_gas_price(
        &self,
        cancel: &CancellationToken,
    ) -> Result<GasEstimation, RestError> {
        self.state.lock().calls.estimate_gas_price += 1;
        self.delay(self.fetch_delay, cancel).await?;
        Ok(GasEstimation {
            deprioritized_gas_estimate: Some(self.gas_estimate / 2),
            gas_estimate: self.gas_estimate,
            prioritized_gas_estimate: Some(self.gas_estimate * 2),
        })
    }

    async fn get_chain_id(&self, cancel: &CancellationToken) -> Result<ChainId, RestError> {
        self.state.lock().calls.get_chain_id += 1;
        self.delay(self.fetch_delay, cancel).await?;
        Ok(self.chain_id)
    }

    async fn submit(
        &self,
        txn: &SignedTransaction,
        cancel: &CancellationToken,
    ) -> Result<PendingTransaction, RestError> {
        self.state.lock().calls.submit += 1;
        self.delay(self.submit_delay, cancel).await?;
        self.accept(txn).map_err(|error| {
            api_error(
                Operation::new(Method::POST, "/v1/transactions"),
                StatusCode::BAD_REQUEST,
                error,
            )
        })
    }

    async fn submit_batch(
        &self,
        txns: &[SignedTransaction],
        cancel: &CancellationToken,
    ) -> Result<TransactionsBatchSubmissionResult, RestError> {
        self.state.lock().calls.submit_batch += 1;
        self.delay(self.submit_delay, cancel).await?;
        let transaction_failures = txns
            .iter()
            .enumerate()
            .filter_map(|(transaction_index, txn)| {
                self.accept(txn)
                    .err()
                    .map(|error| TransactionsBatchSingleSubmissionFailure {
                        error,
                        transaction_index,
                    })
            })
            .collect();
        Ok(TransactionsBatchSubmissionResult {
            transaction_failures,
        })
    }

    async fn simulate(
        &self,
        txn: &SignedTransaction,
        options: SimulationOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<UserTransaction>, RestError> {
        self.state.lock().calls.simulate += 1;
        self.delay(Duration::ZERO, cancel).await?;
        if self.empty_simulation {
            return Ok(vec![]);
        }
        let hash = txn.committed_hash().map_err(anyhow::Error::from)?;
        let success = !self.aborted_sequence_numbers.contains(&txn.sequence_number());
        let mut request = request_of(txn);
        if options.estimate_gas_unit_price {
            request.gas_unit_price = U64(self.gas_estimate);
        }
        Ok(vec![UserTransaction {
            info: TransactionInfo {
                version: U64(0),
                hash,
                gas_used: U64(SIMULATED_GAS_USED),
                success,
                vm_status: vm_status(success).to_string(),
            },
            request,
            timestamp: U64(0),
        }])
    }

    async fn get_transaction_by_hash(
        &self,
        hash: HashValue,
        cancel: &CancellationToken,
    ) -> Result<Transaction, RestError> {
        self.state.lock().calls.get_transaction_by_hash += 1;
        self.delay(self.fetch_delay, cancel).await?;
        self.lookup(
            hash,
            Operation::new(Method::GET, format!("/v1/transactions/by_hash/{}", hash)),
        )
    }

    async fn wait_transaction_by_hash(
        &self,
        hash: HashValue,
        cancel: &CancellationToken,
    ) -> Result<Transaction, RestError> {
        self.state.lock().calls.wait_transaction_by_hash += 1;
        self.delay(self.fetch_delay, cancel).await?;
        let operation = Operation::new(
            Method::GET,
            format!("/v1/transactions/wait_by_hash/{}", hash),
        );
        if self.long_poll_fails {
            return Err(RestError::Http {
                operation,
                status_code: StatusCode::SERVICE_UNAVAILABLE,
                body: "long poll unavailable".to_string(),
            });
        }
        self.lookup(hash, operation)
    }

    async fn fund(
        &self,
        address: AccountAddress,
        _amount: u64,
        cancel: &CancellationToken,
    ) -> Result<(), RestError> {
        self.state.lock().calls.fund += 1;
        self.delay(Duration::ZERO, cancel).await?;
        self.state.lock().accounts.entry(address).or_insert(0);
        Ok(())
    }
}

fn request_of(txn: &SignedTransaction) -> UserTransactionRequest {
    UserTransactionRequest {
        sender: txn.sender(),
        sequence_number: U64(txn.sequence_number()),
        max_gas_amount: U64(txn.max_gas_amount()),
        gas_unit_price: U64(txn.gas_unit_price()),
        expiration_timestamp_secs: U64(txn.expiration_timestamp_secs()),
    }
}

fn vm_status(success: bool) -> &'static str {
    if success {
        SUCCESS_VM_STATUS
    } else {
        ABORTED_VM_STATUS
    }
}

fn aptos_error(error_code: AptosErrorCode, message: String) -> AptosError {
    AptosError {
        message,
        error_code,
        vm_error_code: None,
    }
}

fn api_error(operation: Operation, status_code: StatusCode, error: AptosError) -> RestError {
    RestError::Api(Box::new(AptosErrorResponse {
        operation,
        status_code,
        error,
        state: None,
    }))
}

fn not_found(operation: Operation, error_code: AptosErrorCode, message: String) -> RestError {
    api_error(operation, StatusCode::NOT_FOUND, aptos_error(error_code, message))
}
