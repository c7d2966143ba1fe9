// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use super::{address_of, ed25519_key, transfer};
use crate::{
    error::ErrorKind,
    testing::MockTransport,
    transaction_builder::{BuiltTransaction, TransactionBuilder, TransactionOptions},
    LocalAccount,
};
use aptos_types::{
    account_address::AccountAddress,
    chain_id::ChainId,
    transaction::{authenticator::AuthenticationKey, TransactionSigner},
};
use claims::{assert_err, assert_ok};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[test]
fn test_generated_account_lives_at_its_auth_key() {
    let mut rng = StdRng::from_seed([7u8; 32]);
    let account = LocalAccount::generate(&mut rng);
    assert_eq!(account.sequence_number(), 0);
    assert_eq!(
        account.address(),
        account.authentication_key().account_address()
    );
    assert_ne!(
        LocalAccount::generate(&mut rng).address(),
        account.address()
    );
}

#[test]
fn test_sequence_number_bookkeeping() {
    let account = LocalAccount::from_signer(ed25519_key(1), 7);
    assert_eq!(account.increment_sequence_number(), 7);
    assert_eq!(account.increment_sequence_number(), 8);
    assert_eq!(account.sequence_number(), 9);
    account.set_sequence_number(2);
    assert_eq!(account.sequence_number(), 2);
}

#[test]
fn test_rotated_key_keeps_address() {
    let address = AccountAddress::from_hex_literal("0xa11ce").unwrap();
    let account = LocalAccount::new(address, ed25519_key(1), 0);
    assert_eq!(TransactionSigner::address(&account), address);
    assert_eq!(
        account.authentication_key(),
        AuthenticationKey::ed25519(&ed25519_key(1).public_key())
    );
}

#[tokio::test]
async fn test_build_and_sign_reserves_sequence_numbers() {
    let account = LocalAccount::from_signer(ed25519_key(1), 3);
    let transport = Arc::new(MockTransport::new(ChainId::test()));
    let builder = TransactionBuilder::new(transport.clone());
    let cancel = CancellationToken::new();

    for expected in 3..5 {
        let txn = account
            .build_and_sign(&builder, transfer(1), TransactionOptions::default(), &cancel)
            .await
            .unwrap();
        assert_eq!(txn.sequence_number(), expected);
        assert_eq!(txn.sender(), account.address());
        assert_ok!(txn.verify_signature());
    }
    assert_eq!(account.sequence_number(), 5);
    // The local sequence number is authoritative.
    assert_eq!(transport.calls().get_account, 0);

    let err = assert_err!(
        account
            .build_and_sign(
                &builder,
                transfer(1),
                TransactionOptions::default().with_fee_payer(AccountAddress::ONE),
                &cancel,
            )
            .await
    );
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(account.sequence_number(), 5);
}

#[tokio::test]
async fn test_sync_sequence_number() {
    let account = LocalAccount::from_signer(ed25519_key(1), 0);
    let transport = MockTransport::new(ChainId::test()).with_account(account.address(), 11);

    let synced = account
        .sync_sequence_number(&transport, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(synced, 11);
    assert_eq!(account.sequence_number(), 11);
}

#[tokio::test]
async fn test_sign_with_secondary_signer_and_fee_payer() {
    let sender = LocalAccount::from_signer(ed25519_key(1), 0);
    let secondary = LocalAccount::from_signer(ed25519_key(2), 0);
    let fee_payer = LocalAccount::from_signer(ed25519_key(3), 0);
    let transport = Arc::new(MockTransport::new(ChainId::test()).with_account(sender.address(), 0));
    let builder = TransactionBuilder::new(transport);
    let options = TransactionOptions::default()
        .with_secondary_signers(vec![secondary.address()])
        .with_fee_payer(fee_payer.address());

    let BuiltTransaction::WithData(txn) = builder
        .build(sender.address(), transfer(1), &options, &CancellationToken::new())
        .await
        .unwrap()
    else {
        panic!("expected a fee payer transaction");
    };

    assert_err!(sender.sign_multi_agent(txn.clone(), &[&secondary], None));
    assert_err!(sender.sign_multi_agent(txn.clone(), &[], Some(&fee_payer)));

    let signed = sender
        .sign_multi_agent(txn, &[&secondary], Some(&fee_payer))
        .unwrap();
    assert_ok!(signed.verify_signature());
    let authenticator = signed.authenticator();
    assert_eq!(authenticator.fee_payer_address(), Some(fee_payer.address()));
    assert_eq!(
        authenticator.secondary_signer_addresses(),
        vec![secondary.address()]
    );
    assert_eq!(address_of(&sender), signed.sender());
}

#[tokio::test]
async fn test_co_signers_must_be_the_ones_built_in() {
    let sender = LocalAccount::from_signer(ed25519_key(1), 0);
    let secondary = LocalAccount::from_signer(ed25519_key(2), 0);
    let fee_payer = LocalAccount::from_signer(ed25519_key(3), 0);
    let impostor = LocalAccount::from_signer(ed25519_key(4), 0);
    let transport = Arc::new(MockTransport::new(ChainId::test()).with_account(sender.address(), 0));
    let builder = TransactionBuilder::new(transport);
    let options = TransactionOptions::default()
        .with_secondary_signers(vec![secondary.address()])
        .with_fee_payer(fee_payer.address());

    let BuiltTransaction::WithData(txn) = builder
        .build(sender.address(), transfer(1), &options, &CancellationToken::new())
        .await
        .unwrap()
    else {
        panic!("expected a fee payer transaction");
    };

    for (secondary_signer, fee_payer_signer) in [
        (&impostor, &fee_payer),
        (&secondary, &impostor),
        (&impostor, &impostor),
    ] {
        let err = assert_err!(sender.sign_multi_agent(
            txn.clone(),
            &[secondary_signer],
            Some(fee_payer_signer)
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    // Only the sender named in the transaction may sign it.
    let err = assert_err!(impostor.sign_multi_agent(txn.clone(), &[&secondary], Some(&fee_payer)));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let signed = assert_ok!(sender.sign_multi_agent(txn, &[&secondary], Some(&fee_payer)));
    assert_eq!(
        signed.authenticator().fee_payer_address(),
        Some(fee_payer.address())
    );
}
