// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    account_address::AccountAddress,
    chain_id::ChainId,
    transaction::{
        authenticator::{AccountAuthenticator, AuthenticationError, TransactionAuthenticator},
        EntryFunction, Multisig, RawTransaction, RawTransactionWithData, Script,
        SignedTransaction, TransactionArgument, TransactionPayload, TransactionSigner,
    },
};
use aptos_crypto::{
    ed25519::{Ed25519PrivateKey, Ed25519Signature},
    hash::CryptoHash,
    traits::MessageSigner,
    HashValue,
};
use claims::{assert_err, assert_matches, assert_ok};
use move_core_types::language_storage::TypeTag;

const SENDER: &str = "08e845d10bbb594fcffceb36d934a188bb84d9cdf7362e4e2522265b185127cb";
const PUBLIC_KEY: &str = "3b6a27bcceb6a42d62a3a8d02a6f0d73653215771de243a63ac048a18b59da29";
const RAW_TXN: &str = "08e845d10bbb594fcffceb36d934a188bb84d9cdf7362e4e2522265b185127cb\
    0000000000000000\
    02\
    0000000000000000000000000000000000000000000000000000000000000001\
    0d6170746f735f6163636f756e74\
    087472616e73666572\
    00\
    02\
    200000000000000000000000000000000000000000000000000000000000000b0b\
    086400000000000000\
    a086010000000000\
    6400000000000000\
    2cf2536500000000\
    04";
const SIGNATURE: &str = "d597de188a30bd8bbb0ce9cde069e3559449d1b96dd73df4270993e97b69a7b1\
    ed06a907a63696407f764f00479d6cf5b3572bd29dbe009a0ec4e22907564400";
const RAW_TXN_SEED: &str = "b5e97db07fa0bd0e5598aa3643a9bc6f6693bddc1a9fec9e674a461eaa00b193";
const RAW_TXN_WITH_DATA_SEED: &str =
    "5efa3c4f02f83a0f4b2d69fc95c607cc02825cc4e7be536ef0992df050d9e67c";
const COMMITTED_HASH: &str = "3c2725e125c93604fb08c2a369a18d8893861874f3629daee9cf3174701b8fc1";

fn zero_seed_key() -> Ed25519PrivateKey {
    Ed25519PrivateKey::from_seed(&[0u8; 32]).unwrap()
}

fn key(seed: u8) -> Ed25519PrivateKey {
    Ed25519PrivateKey::from_seed(&[seed; 32]).unwrap()
}

fn transfer(recipient: AccountAddress, amount: u64) -> EntryFunction {
    EntryFunction::from_str_parts(
        AccountAddress::ONE,
        "aptos_account",
        "transfer",
        vec![],
        vec![
            aptos_bcs::to_bytes(&recipient).unwrap(),
            aptos_bcs::to_bytes(&amount).unwrap(),
        ],
    )
    .unwrap()
}

fn transfer_txn(sender: AccountAddress) -> RawTransaction {
    RawTransaction::new_entry_function(
        sender,
        0,
        transfer(AccountAddress::from_hex_literal("0xb0b").unwrap(), 100),
        100_000,
        100,
        1_700_000_000 + 300,
        ChainId::test(),
    )
}

fn hex_of(s: &str) -> Vec<u8> {
    hex::decode(s.replace(' ', "")).unwrap()
}

#[test]
fn test_raw_transaction_bcs() {
    let private_key = zero_seed_key();
    let sender = TransactionSigner::address(&private_key);
    assert_eq!(sender.to_hex(), SENDER);

    let raw_txn = transfer_txn(sender);
    let bytes = aptos_bcs::to_bytes(&raw_txn).unwrap();
    assert_eq!(hex::encode(&bytes), RAW_TXN.replace(' ', ""));
    assert_eq!(aptos_bcs::from_bytes::<RawTransaction>(&bytes).unwrap(), raw_txn);
}

#[test]
fn test_raw_transaction_signing_message() {
    let raw_txn = transfer_txn(AccountAddress::from_hex(SENDER).unwrap());
    let mut expected = hex_of(RAW_TXN_SEED);
    expected.extend(hex_of(RAW_TXN));
    assert_eq!(raw_txn.signing_message().unwrap(), expected);
}

#[test]
fn test_ed25519_transfer_golden() {
    let private_key = zero_seed_key();
    let raw_txn = transfer_txn(TransactionSigner::address(&private_key));
    let signed_txn = raw_txn
        .sign(&private_key, private_key.public_key())
        .unwrap()
        .into_inner();

    let bytes = signed_txn.to_bcs_bytes().unwrap();
    let expected = format!(
        "{}0020{}40{}",
        RAW_TXN.replace(' ', ""),
        PUBLIC_KEY,
        SIGNATURE.replace(' ', "")
    );
    assert_eq!(hex::encode(&bytes), expected);
    assert_eq!(
        signed_txn.committed_hash().unwrap(),
        HashValue::from_hex(COMMITTED_HASH).unwrap()
    );

    let decoded: SignedTransaction = aptos_bcs::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, signed_txn);
    assert_ok!(decoded.verify_signature());
    // The cache is not part of equality or of the wire format.
    assert_eq!(decoded.committed_hash().unwrap(), signed_txn.committed_hash().unwrap());
}

#[test]
fn test_trailing_bytes_rejected() {
    let private_key = zero_seed_key();
    let signed_txn = private_key
        .sign_transaction(transfer_txn(TransactionSigner::address(&private_key)))
        .unwrap();
    let mut bytes = signed_txn.to_bcs_bytes().unwrap();
    bytes.push(0);
    assert_err!(aptos_bcs::from_bytes::<SignedTransaction>(&bytes));
}

#[test]
fn test_fee_payer_signing_message() {
    let raw_txn = transfer_txn(AccountAddress::from_hex(SENDER).unwrap());
    let fee_payer = AccountAddress::from_hex_literal("0xfee").unwrap();
    let message = RawTransactionWithData::new_fee_payer(raw_txn, vec![], fee_payer);

    let mut expected = hex_of(RAW_TXN_WITH_DATA_SEED);
    expected.push(1);
    expected.extend(hex_of(RAW_TXN));
    expected.push(0);
    expected.extend(fee_payer.to_vec());
    assert_eq!(message.signing_message().unwrap(), expected);
    assert_eq!(message.fee_payer_address(), Some(fee_payer));
}

#[test]
fn test_multi_agent_signing_message_discriminant() {
    let raw_txn = transfer_txn(AccountAddress::ONE);
    let message = RawTransactionWithData::new_multi_agent(raw_txn.clone(), vec![
        AccountAddress::TWO,
    ]);
    let bytes = aptos_bcs::to_bytes(&message).unwrap();
    assert_eq!(bytes[0], 0);
    assert_eq!(&bytes[1..bytes.len() - 33], &aptos_bcs::to_bytes(&raw_txn).unwrap()[..]);
    assert_eq!(bytes[bytes.len() - 33], 1);
    assert_eq!(message.fee_payer_address(), None);
}

#[test]
fn test_fee_payer_transaction() {
    let sender = zero_seed_key();
    let fee_payer = key(1);
    let raw_txn = transfer_txn(TransactionSigner::address(&sender));

    let signed_txn = raw_txn
        .clone()
        .sign_fee_payer(&sender, &[], &fee_payer)
        .unwrap()
        .into_inner();
    assert_ok!(signed_txn.verify_signature());
    assert_eq!(
        signed_txn.authenticator().fee_payer_address(),
        Some(TransactionSigner::address(&fee_payer))
    );
    assert!(!signed_txn.contains_duplicate_signers());

    // Both signers sign the same message.
    let message = RawTransactionWithData::new_fee_payer(
        raw_txn,
        vec![],
        TransactionSigner::address(&fee_payer),
    );
    for authenticator in signed_txn.authenticator().all_signers() {
        assert_ok!(authenticator.verify(&message));
    }

    let bytes = signed_txn.to_bcs_bytes().unwrap();
    let decoded: SignedTransaction = aptos_bcs::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, signed_txn);
    assert_matches!(decoded.authenticator(), TransactionAuthenticator::FeePayer { .. });
}

#[test]
fn test_fee_payer_signature_over_wrong_message() {
    let sender = zero_seed_key();
    let fee_payer = key(1);
    let raw_txn = transfer_txn(TransactionSigner::address(&sender));

    // A fee payer that signed only the raw transaction is rejected.
    let bogus = fee_payer.sign(&raw_txn).unwrap();
    let message = RawTransactionWithData::new_fee_payer(
        raw_txn.clone(),
        vec![],
        TransactionSigner::address(&fee_payer),
    );
    let signed_txn = SignedTransaction::new_fee_payer(
        raw_txn,
        sender.sign_with_data(&message).unwrap(),
        vec![],
        vec![],
        TransactionSigner::address(&fee_payer),
        AccountAuthenticator::ed25519(fee_payer.public_key(), bogus),
    );
    assert_matches!(
        signed_txn.verify_signature(),
        Err(AuthenticationError::InvalidSignature(_))
    );
}

#[test]
fn test_multi_agent_transaction() {
    let sender = zero_seed_key();
    let second = key(2);
    let third = key(3);
    let raw_txn = transfer_txn(TransactionSigner::address(&sender));

    let signed_txn = raw_txn
        .sign_multi_agent(&sender, &[&second, &third])
        .unwrap()
        .into_inner();
    assert!(signed_txn.is_multi_agent());
    assert_ok!(signed_txn.clone().check_signature());
    assert_eq!(signed_txn.authenticator().secondary_signer_addresses(), vec![
        TransactionSigner::address(&second),
        TransactionSigner::address(&third),
    ]);
    assert_eq!(signed_txn.authenticator().all_signers().len(), 3);
}

#[test]
fn test_duplicate_signers() {
    let sender = zero_seed_key();
    let raw_txn = transfer_txn(TransactionSigner::address(&sender));
    let signed_txn = raw_txn
        .sign_multi_agent(&sender, &[&sender])
        .unwrap()
        .into_inner();
    assert!(signed_txn.contains_duplicate_signers());
}

#[test]
fn test_tampered_transaction_fails_verification() {
    let private_key = zero_seed_key();
    let mut raw_txn = transfer_txn(TransactionSigner::address(&private_key));
    let signature = private_key.sign(&raw_txn).unwrap();
    raw_txn.set_gas_unit_price(101);
    let signed_txn = SignedTransaction::new(raw_txn, private_key.public_key(), signature);
    assert_err!(signed_txn.check_signature());
}

#[test]
fn test_simulation_transaction_does_not_verify() {
    let private_key = zero_seed_key();
    let raw_txn = transfer_txn(TransactionSigner::address(&private_key));
    let signed_txn = private_key.simulation_transaction(raw_txn);
    match signed_txn.authenticator() {
        TransactionAuthenticator::Ed25519 { signature, .. } => {
            assert_eq!(signature, Ed25519Signature::simulation())
        },
        other => panic!("unexpected authenticator {:?}", other),
    }
    assert_err!(signed_txn.verify_signature());
}

#[test]
fn test_payload_discriminants() {
    let script = TransactionPayload::Script(Script::new(vec![0xa1], vec![], vec![]));
    assert_eq!(aptos_bcs::to_bytes(&script).unwrap(), vec![0, 1, 0xa1, 0, 0]);

    let entry_function = TransactionPayload::from(transfer(AccountAddress::TWO, 1));
    assert_eq!(aptos_bcs::to_bytes(&entry_function).unwrap()[0], 2);

    let multisig = TransactionPayload::Multisig(Multisig::new(AccountAddress::TWO, None));
    let mut expected = vec![3];
    expected.extend(AccountAddress::TWO.to_vec());
    expected.push(0);
    assert_eq!(aptos_bcs::to_bytes(&multisig).unwrap(), expected);
    assert!(multisig.is_multisig());

    let with_payload = TransactionPayload::Multisig(Multisig::with_entry_function(
        AccountAddress::TWO,
        transfer(AccountAddress::ONE, 1),
    ));
    let bytes = aptos_bcs::to_bytes(&with_payload).unwrap();
    assert_eq!(&bytes[33..35], &[1, 0]);
    assert_eq!(aptos_bcs::from_bytes::<TransactionPayload>(&bytes).unwrap(), with_payload);
}

#[test]
fn test_script_arguments() {
    let script = Script::new(
        vec![0xca, 0xfe],
        vec![TypeTag::U64],
        vec![
            TransactionArgument::Bool(true),
            TransactionArgument::U8(7),
            TransactionArgument::U16(0x0102),
            TransactionArgument::Address(AccountAddress::ONE),
            TransactionArgument::U8Vector(vec![1, 2]),
        ],
    );
    let bytes = aptos_bcs::to_bytes(&script).unwrap();
    let mut expected = vec![2, 0xca, 0xfe, 1, 2, 5, 5, 1, 0, 7, 6, 2, 1, 3];
    expected.extend(AccountAddress::ONE.to_vec());
    expected.extend([4, 2, 1, 2]);
    assert_eq!(bytes, expected);
    assert_eq!(aptos_bcs::from_bytes::<Script>(&bytes).unwrap(), script);
}

#[test]
fn test_entry_function_display_and_validation() {
    let entry_function = EntryFunction::from_str_parts(
        AccountAddress::ONE,
        "coin",
        "transfer",
        vec![TypeTag::Bool],
        vec![],
    )
    .unwrap();
    assert_eq!(entry_function.to_string(), "0x1::coin::transfer<bool>");
    assert_err!(EntryFunction::from_str_parts(
        AccountAddress::ONE,
        "coin-store",
        "transfer",
        vec![],
        vec![]
    ));
    assert_err!(EntryFunction::from_str_parts(
        AccountAddress::ONE,
        "coin",
        "1transfer",
        vec![],
        vec![]
    ));
}

#[test]
fn test_transaction_hash_is_domain_separated() {
    let private_key = zero_seed_key();
    let signed_txn = private_key
        .sign_transaction(transfer_txn(TransactionSigner::address(&private_key)))
        .unwrap();
    // The committed hash covers the whole signed transaction, not the raw one.
    assert_ne!(
        signed_txn.committed_hash().unwrap(),
        signed_txn.raw_transaction_ref().hash().unwrap()
    );
}
