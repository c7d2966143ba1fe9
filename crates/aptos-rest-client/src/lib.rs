// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! A client for the Aptos REST API, and the [`NodeTransport`] contract the SDK's transaction
//! pipeline is written against.

pub mod error;
pub mod faucet;
pub mod state;
mod transport;
pub mod types;

pub use crate::{
    faucet::FaucetClient,
    state::State,
    transport::{cancellable, NodeTransport},
};
pub use reqwest::{Method, StatusCode};
use crate::{
    error::{AptosError, AptosErrorResponse, Operation, RestError},
    types::{
        Account, GasEstimation, IndexResponse, PendingTransaction, SimulationOptions,
        Transaction, TransactionsBatchSubmissionResult, UserTransaction,
    },
};
use aptos_crypto::HashValue;
use aptos_types::{
    account_address::AccountAddress,
    transaction::{SignedTransaction, ViewFunction},
};
use futures::{StreamExt, TryStreamExt};
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client as ReqwestClient, ClientBuilder as ReqwestClientBuilder, RequestBuilder,
};
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

pub const BCS_SIGNED_TRANSACTION: &str = "application/x.aptos.signed_transaction+bcs";
pub const BCS_VIEW_FUNCTION: &str = "application/x.aptos.view_function+bcs";
pub const JSON: &str = "application/json";
pub const DEFAULT_VERSION_PATH_BASE: &str = "v1/";
pub const USER_AGENT: &str = concat!("aptos-client-sdk-rust / ", env!("CARGO_PKG_VERSION"));

/// The largest page the account transactions endpoint serves.
pub const MAX_PAGE_SIZE: u16 = 100;

/// A response value together with the ledger state the node reported for it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response<T> {
    inner: T,
    state: State,
}

impl<T> Response<T> {
    pub fn new(inner: T, state: State) -> Self {
        Self { inner, state }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn into_parts(self) -> (T, State) {
        (self.inner, self.state)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Response<U> {
        Response::new(f(self.inner), self.state)
    }
}

/// Builder for [`Client`]
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Url,
    version_path_base: String,
    faucet_url: Option<Url>,
    inner: ReqwestClientBuilder,
}

impl ClientBuilder {
    pub fn new(base_url: Url) -> Self {
        let inner = ReqwestClient::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .cookie_store(true);
        Self {
            base_url,
            version_path_base: DEFAULT_VERSION_PATH_BASE.to_string(),
            faucet_url: None,
            inner,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    /// The path prefix every endpoint lives under, `v1/` by default.
    pub fn version_path_base(mut self, version_path_base: impl Into<String>) -> Self {
        let mut version_path_base = version_path_base.into();
        if !version_path_base.ends_with('/') {
            version_path_base.push('/');
        }
        self.version_path_base = version_path_base;
        self
    }

    pub fn faucet_url(mut self, faucet_url: Url) -> Self {
        self.faucet_url = Some(faucet_url);
        self
    }

    pub fn build(self) -> Result<Client, RestError> {
        let inner = self
            .inner
            .build()
            .map_err(|e| RestError::Unknown(anyhow::Error::new(e)))?;
        let client = Client {
            inner,
            base_url: self.base_url,
            version_path_base: self.version_path_base,
            faucet: None,
        };
        let faucet = match self.faucet_url {
            Some(faucet_url) => Some(Arc::new(FaucetClient::new(faucet_url, client.clone())?)),
            None => None,
        };
        Ok(Client { faucet, ..client })
    }
}

/// A client for the Aptos REST API
#[derive(Clone, Debug)]
pub struct Client {
    inner: ReqwestClient,
    base_url: Url,
    version_path_base: String,
    faucet: Option<Arc<FaucetClient>>,
}

impl Client {
    pub fn builder(base_url: Url) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    pub fn new(base_url: Url) -> Result<Self, RestError> {
        Self::builder(base_url).build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn faucet(&self) -> Option<&FaucetClient> {
        self.faucet.as_deref()
    }

    /// Resolves `path` under the versioned API root.
    pub fn build_path(&self, path: &str) -> Result<Url, RestError> {
        Ok(self.base_url.join(&self.version_path_base)?.join(path)?)
    }

    // -- General APIs --

    pub async fn get_index(&self) -> Result<Response<IndexResponse>, RestError> {
        let url = self.build_path("")?;
        self.get_json(url).await
    }

    /// The ledger state as reported by the index body rather than by headers.
    pub async fn get_ledger_information(&self) -> Result<Response<State>, RestError> {
        let (index, state) = self.get_index().await?.into_parts();
        let ledger = State {
            chain_id: index.chain_id,
            epoch: index.epoch.0,
            version: index.ledger_version.0,
            timestamp_usecs: index.ledger_timestamp.0,
            oldest_ledger_version: index.oldest_ledger_version.0,
            block_height: index.block_height.0,
            oldest_block_height: index.oldest_block_height.0,
            cursor: None,
        };
        Ok(Response::new(ledger, state))
    }

    pub async fn estimate_gas_price(&self) -> Result<Response<GasEstimation>, RestError> {
        let url = self.build_path("estimate_gas_price")?;
        self.get_json(url).await
    }

    // -- Account APIs --

    pub async fn get_account(
        &self,
        address: AccountAddress,
    ) -> Result<Response<Account>, RestError> {
        let url = self.build_path(&format!("accounts/{}", address.to_standard_string()))?;
        self.get_json(url).await
    }

    pub async fn get_account_sequence_number(
        &self,
        address: AccountAddress,
    ) -> Result<Response<u64>, RestError> {
        Ok(self
            .get_account(address)
            .await?
            .map(|account| account.sequence_number.0))
    }

    /// Transactions sent by `address`, starting at sequence number `start`.
    pub async fn get_account_transactions(
        &self,
        address: AccountAddress,
        start: Option<u64>,
        limit: Option<u16>,
    ) -> Result<Response<Vec<Transaction>>, RestError> {
        let url = self.build_path(&format!(
            "accounts/{}/transactions",
            address.to_standard_string()
        ))?;
        let mut request = self.inner.get(url.clone());
        if let Some(start) = start {
            request = request.query(&[("start", start)])
        }
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)])
        }
        self.send_json(Operation::new(Method::GET, url.path()), request)
            .await
    }

    /// Fetches `limit` transactions sent by `address` from sequence number `start`, with up to
    /// `max_concurrency` pages in flight. The result is sorted by version.
    pub async fn get_account_transactions_paginated(
        &self,
        address: AccountAddress,
        start: u64,
        limit: u64,
        page_size: u16,
        max_concurrency: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Transaction>, RestError> {
        let page_size = u64::from(page_size.clamp(1, MAX_PAGE_SIZE));
        let pages = (0..limit.div_ceil(page_size))
            .map(|page| -> Result<(u64, u16), RestError> {
                let offset = page * page_size;
                let page_start = start.checked_add(offset).ok_or_else(|| {
                    anyhow::anyhow!(
                        "sequence number range {}+{} overflows u64",
                        start,
                        offset
                    )
                })?;
                Ok((page_start, (limit - offset).min(page_size) as u16))
            })
            .collect::<Result<Vec<_>, _>>()?;
        cancellable(cancel, async {
            let pages: Vec<Vec<Transaction>> = futures::stream::iter(pages)
                .map(|(page_start, page_limit)| async move {
                    self.get_account_transactions(address, Some(page_start), Some(page_limit))
                        .await
                        .map(Response::into_inner)
                })
                .buffer_unordered(max_concurrency.max(1))
                .try_collect()
                .await?;
            let mut transactions: Vec<Transaction> = pages.into_iter().flatten().collect();
            transactions.sort_by_key(|txn| txn.version());
            Ok(transactions)
        })
        .await
    }

    // -- Transaction APIs --

    pub async fn submit_bcs(
        &self,
        txn: &SignedTransaction,
    ) -> Result<Response<PendingTransaction>, RestError> {
        let url = self.build_path("transactions")?;
        let body = aptos_bcs::to_bytes(txn)?;
        debug!(
            sender = %txn.sender(),
            sequence_number = txn.sequence_number(),
            "submitting transaction"
        );
        self.post_bcs(url, BCS_SIGNED_TRANSACTION, body).await
    }

    /// Submits every transaction in one call. Rejected entries are reported by index; the call
    /// itself succeeds as long as the node accepted the request.
    pub async fn submit_batch_bcs(
        &self,
        txns: &[SignedTransaction],
    ) -> Result<Response<TransactionsBatchSubmissionResult>, RestError> {
        let url = self.build_path("transactions/batch")?;
        let body = aptos_bcs::to_bytes(txns)?;
        debug!(count = txns.len(), "submitting transaction batch");
        self.post_bcs(url, BCS_SIGNED_TRANSACTION, body).await
    }

    pub async fn simulate_bcs(
        &self,
        txn: &SignedTransaction,
        options: SimulationOptions,
    ) -> Result<Response<Vec<UserTransaction>>, RestError> {
        let url = self.build_path("transactions/simulate")?;
        let body = aptos_bcs::to_bytes(txn)?;
        let request = self
            .inner
            .post(url.clone())
            .header(CONTENT_TYPE, BCS_SIGNED_TRANSACTION)
            .header(ACCEPT, JSON)
            .query(&options.query())
            .body(body);
        self.send_json(Operation::new(Method::POST, url.path()), request)
            .await
    }

    pub async fn get_transaction_by_hash(
        &self,
        hash: HashValue,
    ) -> Result<Response<Transaction>, RestError> {
        let url = self.build_path(&format!("transactions/by_hash/{}", hash.to_hex_literal()))?;
        self.get_json(url).await
    }

    /// The node holds the request open until the transaction is committed or its own wait
    /// deadline passes, in which case the transaction may still be pending.
    pub async fn wait_transaction_by_hash(
        &self,
        hash: HashValue,
    ) -> Result<Response<Transaction>, RestError> {
        let url = self.build_path(&format!(
            "transactions/wait_by_hash/{}",
            hash.to_hex_literal()
        ))?;
        self.get_json(url).await
    }

    /// Runs a view function against the ledger at `version`, or the latest one. The node
    /// answers with the function's return values as JSON.
    pub async fn view_bcs(
        &self,
        request: &ViewFunction,
        version: Option<u64>,
    ) -> Result<Response<Vec<serde_json::Value>>, RestError> {
        let mut url = self.build_path("view")?;
        if let Some(version) = version {
            url.set_query(Some(format!("ledger_version={}", version).as_str()));
        }
        let body = aptos_bcs::to_bytes(request)?;
        self.post_bcs(url, BCS_VIEW_FUNCTION, body).await
    }

    // -- Plumbing --

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Response<T>, RestError> {
        let operation = Operation::new(Method::GET, url.path());
        let request = self.inner.get(url).header(ACCEPT, JSON);
        self.send_json(operation, request).await
    }

    async fn post_bcs<T: DeserializeOwned>(
        &self,
        url: Url,
        content_type: &'static str,
        body: Vec<u8>,
    ) -> Result<Response<T>, RestError> {
        let operation = Operation::new(Method::POST, url.path());
        let request = self
            .inner
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header(ACCEPT, JSON)
            .body(body);
        self.send_json(operation, request).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<Response<T>, RestError> {
        debug!(operation = %operation, "sending request");
        let response = request
            .send()
            .await
            .map_err(|e| RestError::request(operation.clone(), e))?;
        let (response, state) = self.check_response(operation.clone(), response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RestError::request(operation, e))?;
        Ok(Response::new(serde_json::from_slice(&bytes)?, state))
    }

    async fn check_response(
        &self,
        operation: Operation,
        response: reqwest::Response,
    ) -> Result<(reqwest::Response, State), RestError> {
        let status_code = response.status();
        let state = State::from_headers(response.headers());
        if !status_code.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| RestError::request(operation.clone(), e))?;
            warn!(operation = %operation, status = %status_code, "request failed");
            return Err(match serde_json::from_str::<AptosError>(&body) {
                Ok(error) => RestError::Api(Box::new(AptosErrorResponse {
                    operation,
                    status_code,
                    error,
                    state: state.ok(),
                })),
                Err(_) => RestError::Http {
                    operation,
                    status_code,
                    body,
                },
            });
        }
        Ok((response, state?))
    }
}
