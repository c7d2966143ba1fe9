// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use aptos_sdk::{
    config::{LogFormat, SdkConfig},
    error::{ErrorKind, SdkError},
    wait::WaitOptions,
};
use claims::{assert_err, assert_matches};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_save_and_load_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sdk.yaml");

    let mut config = SdkConfig::default();
    config.node_url = "https://fullnode.testnet.aptoslabs.com".to_string();
    config.submission.num_workers = 16;
    config.wait.timeout_ms = 30_000;
    config.log_format = LogFormat::Json;
    config.save_config(&path).unwrap();

    let loaded = SdkConfig::load_config(&path).unwrap();
    assert_eq!(loaded, config);
    let options = WaitOptions::from(&loaded.wait);
    assert_eq!(options.timeout, Duration::from_secs(30));
    assert!(options.use_long_poll);
}

#[test]
fn test_load_missing_config() {
    let dir = TempDir::new().unwrap();
    let err = assert_err!(SdkConfig::load_config(dir.path().join("missing.yaml")));
    assert_matches!(err, SdkError::ConfigIo(..));
}

#[test]
fn test_load_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sdk.yaml");
    std::fs::write(&path, "submission:\n  num_workers: 0\n").unwrap();

    let err = assert_err!(SdkConfig::load_config(&path));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
