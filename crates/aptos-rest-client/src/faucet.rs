// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    error::{FaucetClientError, RestError},
    Client,
};
use aptos_crypto::HashValue;
use move_core_types::account_address::AccountAddress;
use reqwest::{Client as ReqwestClient, Url};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// How long a mint may take to commit before [`FaucetClient::fund`] gives up.
const FUND_TIMEOUT: Duration = Duration::from_secs(20);
const FUND_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct FaucetClient {
    faucet_url: Url,
    inner: ReqwestClient,
    rest_client: Client,
}

impl FaucetClient {
    pub fn new(faucet_url: Url, rest_client: Client) -> Result<Self, RestError> {
        let inner = ReqwestClient::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(FaucetClientError::request)?;
        Ok(Self {
            faucet_url,
            inner,
            rest_client,
        })
    }

    pub fn faucet_url(&self) -> &Url {
        &self.faucet_url
    }

    /// Create an account with zero balance.
    pub async fn create_account(&self, address: AccountAddress) -> Result<(), RestError> {
        self.fund(address, 0).await.map(|_| ())
    }

    /// Mints `amount` octas to `address` and waits for the mint transactions to commit.
    pub async fn fund(
        &self,
        address: AccountAddress,
        amount: u64,
    ) -> Result<Vec<HashValue>, RestError> {
        let mut url = self.faucet_url.join("mint")?;
        url.query_pairs_mut()
            .append_pair("address", &address.to_standard_string())
            .append_pair("amount", &amount.to_string());

        let response = self
            .inner
            .post(url)
            .send()
            .await
            .map_err(FaucetClientError::request)?;
        let status_code = response.status();
        let body = response.text().await.map_err(FaucetClientError::decode)?;
        if !status_code.is_success() {
            return Err(FaucetClientError::status(status_code, body).into());
        }

        // The faucet answers with the hashes of the transactions it submitted.
        let hashes: Vec<HashValue> =
            serde_json::from_str(&body).map_err(FaucetClientError::decode)?;
        debug!(address = %address, amount, count = hashes.len(), "faucet submitted mint");

        let deadline = Instant::now() + FUND_TIMEOUT;
        for hash in &hashes {
            self.wait_for_mint(*hash, deadline).await?;
        }
        Ok(hashes)
    }

    async fn wait_for_mint(&self, hash: HashValue, deadline: Instant) -> Result<(), RestError> {
        loop {
            match self.rest_client.wait_transaction_by_hash(hash).await {
                Ok(response) if !response.inner().is_pending() => {
                    return if response.inner().success() {
                        Ok(())
                    } else {
                        Err(RestError::Unknown(anyhow::anyhow!(
                            "mint transaction {} failed: {}",
                            hash,
                            response.inner().vm_status().unwrap_or("unknown")
                        )))
                    };
                },
                Ok(_) => {},
                Err(e) if e.is_not_found() => {},
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(RestError::Timeout(format!("mint transaction {}", hash)));
            }
            tokio::time::sleep(FUND_POLL_INTERVAL).await;
        }
    }
}
