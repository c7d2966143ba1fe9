// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use anyhow::anyhow;
use reqwest::header::HeaderMap;

pub const X_APTOS_CHAIN_ID: &str = "X-Aptos-Chain-Id";
pub const X_APTOS_EPOCH: &str = "X-Aptos-Epoch";
pub const X_APTOS_LEDGER_VERSION: &str = "X-Aptos-Ledger-Version";
pub const X_APTOS_LEDGER_OLDEST_VERSION: &str = "X-Aptos-Ledger-Oldest-Version";
pub const X_APTOS_LEDGER_TIMESTAMP: &str = "X-Aptos-Ledger-TimestampUsec";
pub const X_APTOS_BLOCK_HEIGHT: &str = "X-Aptos-Block-Height";
pub const X_APTOS_OLDEST_BLOCK_HEIGHT: &str = "X-Aptos-Oldest-Block-Height";
pub const X_APTOS_CURSOR: &str = "X-Aptos-Cursor";

/// The ledger state a node reported alongside a response.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct State {
    pub chain_id: u8,
    pub epoch: u64,
    pub version: u64,
    pub timestamp_usecs: u64,
    pub oldest_ledger_version: u64,
    pub block_height: u64,
    pub oldest_block_height: u64,
    pub cursor: Option<String>,
}

fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse().ok())
}

impl State {
    pub fn from_headers(headers: &HeaderMap) -> anyhow::Result<Self> {
        let maybe_chain_id = header(headers, X_APTOS_CHAIN_ID);
        let maybe_version = header(headers, X_APTOS_LEDGER_VERSION);
        let maybe_timestamp = header(headers, X_APTOS_LEDGER_TIMESTAMP);
        let maybe_epoch = header(headers, X_APTOS_EPOCH);

        let (Some(chain_id), Some(version), Some(timestamp_usecs), Some(epoch)) =
            (maybe_chain_id, maybe_version, maybe_timestamp, maybe_epoch)
        else {
            return Err(anyhow!(
                "Failed to build State from headers due to missing values in response. \
                 Chain ID: {:?}, Version: {:?}, Timestamp: {:?}, Epoch: {:?}",
                maybe_chain_id,
                maybe_version,
                maybe_timestamp,
                maybe_epoch
            ));
        };

        Ok(Self {
            chain_id,
            epoch,
            version,
            timestamp_usecs,
            oldest_ledger_version: header(headers, X_APTOS_LEDGER_OLDEST_VERSION).unwrap_or(0),
            block_height: header(headers, X_APTOS_BLOCK_HEIGHT).unwrap_or(0),
            oldest_block_height: header(headers, X_APTOS_OLDEST_BLOCK_HEIGHT).unwrap_or(0),
            cursor: header(headers, X_APTOS_CURSOR),
        })
    }

    pub fn timestamp_secs(&self) -> u64 {
        self.timestamp_usecs / 1_000_000
    }
}
