// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use super::{address_of, ed25519_key, transfer};
use crate::{
    config::TransactionConfig,
    error::ErrorKind,
    testing::{CallCounts, MockTransport},
    transaction_builder::{BuiltTransaction, TransactionBuilder, TransactionOptions},
};
use aptos_types::{account_address::AccountAddress, chain_id::ChainId};
use claims::{assert_err, assert_matches, assert_ok};
use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};
use tokio_util::sync::CancellationToken;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[tokio::test]
async fn test_build_fetches_each_missing_field_once() {
    let sender = address_of(&ed25519_key(1));
    let transport = Arc::new(
        MockTransport::new(ChainId::test())
            .with_account(sender, 5)
            .with_gas_estimate(150)
            .with_fetch_delay(Duration::from_millis(20)),
    );
    let builder = TransactionBuilder::new(transport.clone());
    let cancel = CancellationToken::new();

    let before = now_secs();
    let start = Instant::now();
    let raw_txn = builder
        .build_raw(sender, transfer(1), &TransactionOptions::default(), &cancel)
        .await
        .unwrap();
    // Three 20ms fetches in flight together.
    assert!(start.elapsed() < Duration::from_millis(50));
    assert_eq!(raw_txn.sender(), sender);
    assert_eq!(raw_txn.sequence_number(), 5);
    assert_eq!(raw_txn.gas_unit_price(), 150);
    assert_eq!(raw_txn.max_gas_amount(), 100_000);
    assert_eq!(raw_txn.chain_id(), ChainId::test());
    let expiration = raw_txn.expiration_timestamp_secs();
    assert!(expiration >= before + 300 && expiration <= now_secs() + 300);

    let calls = transport.calls();
    assert_eq!(calls.get_chain_id, 1);
    assert_eq!(calls.get_account, 1);
    assert_eq!(calls.estimate_gas_price, 1);

    // The chain id is served from cache from now on.
    builder
        .build_raw(sender, transfer(2), &TransactionOptions::default(), &cancel)
        .await
        .unwrap();
    let calls = transport.calls();
    assert_eq!(calls.get_chain_id, 1);
    assert_eq!(calls.get_account, 2);
    assert_eq!(calls.estimate_gas_price, 2);
}

#[tokio::test]
async fn test_explicit_options_skip_fetches() {
    let sender = address_of(&ed25519_key(1));
    let transport = Arc::new(MockTransport::new(ChainId::test()));
    let builder = TransactionBuilder::new(transport.clone());
    let options = TransactionOptions::default()
        .with_sequence_number(42)
        .with_gas_unit_price(300)
        .with_max_gas_amount(2_000)
        .with_expiration_secs(10)
        .with_chain_id(ChainId::new(33));

    let raw_txn = builder
        .build_raw(sender, transfer(1), &options, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(raw_txn.sequence_number(), 42);
    assert_eq!(raw_txn.gas_unit_price(), 300);
    assert_eq!(raw_txn.max_gas_amount(), 2_000);
    assert_eq!(raw_txn.chain_id(), ChainId::new(33));
    assert!(raw_txn.expiration_timestamp_secs() <= now_secs() + 10);
    assert_eq!(transport.calls(), CallCounts::default());
}

#[tokio::test]
async fn test_configured_gas_price_without_estimate() {
    let sender = address_of(&ed25519_key(1));
    let transport = Arc::new(
        MockTransport::new(ChainId::test())
            .with_account(sender, 0)
            .with_gas_estimate(999),
    );
    let config = TransactionConfig {
        estimate_gas_unit_price: false,
        ..Default::default()
    };
    let builder = TransactionBuilder::with_config(transport.clone(), config);

    let raw_txn = builder
        .build_raw(
            sender,
            transfer(1),
            &TransactionOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(raw_txn.gas_unit_price(), 100);
    assert_eq!(transport.calls().estimate_gas_price, 0);
}

#[tokio::test]
async fn test_co_signed_transactions_carry_data() {
    let sender = address_of(&ed25519_key(1));
    let secondary = address_of(&ed25519_key(2));
    let fee_payer = address_of(&ed25519_key(3));
    let transport = Arc::new(MockTransport::new(ChainId::test()).with_account(sender, 0));
    let builder = TransactionBuilder::new(transport);
    let cancel = CancellationToken::new();

    let txn = builder
        .build(
            sender,
            transfer(1),
            &TransactionOptions::default().with_fee_payer(fee_payer),
            &cancel,
        )
        .await
        .unwrap();
    assert_matches!(
        &txn,
        BuiltTransaction::WithData(data) if data.fee_payer_address() == Some(fee_payer)
    );

    let txn = builder
        .build(
            sender,
            transfer(1),
            &TransactionOptions::default().with_secondary_signers(vec![secondary]),
            &cancel,
        )
        .await
        .unwrap();
    match &txn {
        BuiltTransaction::WithData(data) => {
            assert_eq!(data.secondary_signer_addresses(), &[secondary][..]);
            assert_eq!(data.fee_payer_address(), None);
        },
        BuiltTransaction::Raw(_) => panic!("expected a multi-agent transaction"),
    }
    assert_eq!(txn.raw_txn().sender(), sender);

    let txn = builder
        .build(sender, transfer(1), &TransactionOptions::default(), &cancel)
        .await
        .unwrap();
    assert_matches!(txn, BuiltTransaction::Raw(_));
}

#[tokio::test]
async fn test_failed_fetch_fails_build() {
    let transport = Arc::new(MockTransport::new(ChainId::test()));
    let builder = TransactionBuilder::new(transport.clone());

    let err = assert_err!(
        builder
            .build_raw(
                AccountAddress::random(),
                transfer(1),
                &TransactionOptions::default(),
                &CancellationToken::new(),
            )
            .await
    );
    assert_eq!(err.kind(), ErrorKind::NotFound);
    // The other fetches still ran to completion.
    assert_eq!(transport.calls().get_chain_id, 1);
    assert_eq!(transport.calls().estimate_gas_price, 1);
}

#[tokio::test]
async fn test_cancelled_build() {
    let sender = address_of(&ed25519_key(1));
    let transport = Arc::new(MockTransport::new(ChainId::test()).with_account(sender, 0));
    let builder = TransactionBuilder::new(transport);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = assert_err!(
        builder
            .build(sender, transfer(1), &TransactionOptions::default(), &cancel)
            .await
    );
    assert!(err.is_cancelled());

    let options = TransactionOptions::default()
        .with_sequence_number(0)
        .with_gas_unit_price(100)
        .with_chain_id(ChainId::test());
    assert_ok!(builder.build(sender, transfer(1), &options, &cancel).await);
}

#[tokio::test]
async fn test_unusable_transactions_are_rejected() {
    let sender = address_of(&ed25519_key(1));
    let transport = Arc::new(
        MockTransport::new(ChainId::test())
            .with_account(sender, 0)
            .with_gas_estimate(0),
    );
    let builder = TransactionBuilder::new(transport);
    let cancel = CancellationToken::new();
    let priced = TransactionOptions::default().with_gas_unit_price(100);

    for options in [
        priced.clone().with_max_gas_amount(0),
        priced.clone().with_expiration_secs(0),
        // The node estimated a zero gas price.
        TransactionOptions::default(),
    ] {
        let err = assert_err!(builder.build_raw(sender, transfer(1), &options, &cancel).await);
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
    assert_ok!(builder.build_raw(sender, transfer(1), &priced, &cancel).await);
}
