// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::error::SdkError;
use aptos_rest_client::Client;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use url::Url;

/// Everything a long-running SDK client is configured with. Loadable from YAML; every field
/// falls back to its default.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SdkConfig {
    pub node_url: String,
    pub faucet_url: Option<String>,
    pub transaction: TransactionConfig,
    pub submission: SubmissionConfig,
    pub wait: WaitConfig,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            node_url: "http://127.0.0.1:8080".to_string(),
            faucet_url: None,
            transaction: TransactionConfig::default(),
            submission: SubmissionConfig::default(),
            wait: WaitConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransactionConfig {
    pub max_gas_amount: u64,
    /// Used when no estimate is requested and none is given per transaction.
    pub gas_unit_price: u64,
    /// Seconds from the moment of building until the transaction expires.
    pub expiration_secs: u64,
    pub estimate_gas_unit_price: bool,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_gas_amount: 100_000,
            gas_unit_price: 100,
            expiration_secs: 300,
            estimate_gas_unit_price: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubmissionConfig {
    /// Number of build-and-sign workers, and of submit workers.
    pub num_workers: usize,
    /// Capacity of the queue between the sequence dispenser and the build workers.
    pub build_response_buffer: usize,
    /// Capacity of the queue between the build workers and the submit workers.
    pub submission_buffer: usize,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            num_workers: 8,
            build_response_buffer: 100,
            submission_buffer: 100,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaitConfig {
    pub poll_period_ms: u64,
    pub timeout_ms: u64,
    pub use_long_poll: bool,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: 100,
            timeout_ms: 10_000,
            use_long_poll: true,
        }
    }
}

impl WaitConfig {
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl SdkConfig {
    /// Loads and sanitizes the config at `path`.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Self, SdkError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| SdkError::ConfigIo(path.display().to_string(), e))?;
        Self::parse(&contents)
    }

    pub fn parse(serialized_config: &str) -> Result<Self, SdkError> {
        let config: Self = serde_yaml::from_str(serialized_config)?;
        config.sanitize()?;
        Ok(config)
    }

    pub fn save_config<P: AsRef<Path>>(&self, output_file: P) -> Result<(), SdkError> {
        let path = output_file.as_ref();
        let serialized_config = serde_yaml::to_string(self)?;
        fs::write(path, serialized_config)
            .map_err(|e| SdkError::ConfigIo(path.display().to_string(), e))
    }

    pub fn sanitize(&self) -> Result<(), SdkError> {
        self.node_url()?;
        self.faucet_url()?;

        let submission = &self.submission;
        if submission.num_workers == 0 {
            return Err(SdkError::Config("num_workers must be > 0".into()));
        }
        if submission.build_response_buffer == 0 || submission.submission_buffer == 0 {
            return Err(SdkError::Config(format!(
                "build_response_buffer {} and submission_buffer {} must be > 0",
                submission.build_response_buffer, submission.submission_buffer
            )));
        }

        let transaction = &self.transaction;
        if transaction.max_gas_amount == 0 || transaction.gas_unit_price == 0 {
            return Err(SdkError::Config(format!(
                "max_gas_amount {} and gas_unit_price {} must be > 0",
                transaction.max_gas_amount, transaction.gas_unit_price
            )));
        }

        if self.wait.poll_period_ms == 0 {
            return Err(SdkError::Config("poll_period_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn node_url(&self) -> Result<Url, SdkError> {
        Url::parse(&self.node_url)
            .map_err(|e| SdkError::Config(format!("node_url {}: {}", self.node_url, e)))
    }

    pub fn faucet_url(&self) -> Result<Option<Url>, SdkError> {
        self.faucet_url
            .as_deref()
            .map(|faucet_url| {
                Url::parse(faucet_url)
                    .map_err(|e| SdkError::Config(format!("faucet_url {}: {}", faucet_url, e)))
            })
            .transpose()
    }

    /// A REST client for the configured node, with a faucet if one is configured.
    pub fn build_client(&self) -> Result<Client, SdkError> {
        let mut builder = Client::builder(self.node_url()?);
        if let Some(faucet_url) = self.faucet_url()? {
            builder = builder.faucet_url(faucet_url);
        }
        Ok(builder.build()?)
    }
}
