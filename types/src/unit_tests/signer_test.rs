// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    account_address::AccountAddress,
    chain_id::ChainId,
    transaction::{
        authenticator::{
            AccountAuthenticator, AnyPublicKey, AuthenticationError, MultiKey,
            TransactionAuthenticator,
        },
        signer::{AnyPrivateKey, MultiEd25519Account, MultiKeyAccount, SingleKeyAccount},
        EntryFunction, RawTransaction, TransactionSigner,
    },
};
use aptos_crypto::{
    ed25519::Ed25519PrivateKey, multi_ed25519::MultiEd25519PublicKey,
    secp256k1_ecdsa::Secp256k1EcdsaPrivateKey,
};
use claims::{assert_err, assert_matches, assert_ok};

fn ed25519_key(seed: u8) -> Ed25519PrivateKey {
    Ed25519PrivateKey::from_seed(&[seed; 32]).unwrap()
}

fn secp256k1_key(last_byte: u8) -> Secp256k1EcdsaPrivateKey {
    let mut bytes = [0u8; 32];
    bytes[31] = last_byte;
    Secp256k1EcdsaPrivateKey::try_from(&bytes[..]).unwrap()
}

fn raw_txn(sender: AccountAddress) -> RawTransaction {
    let entry_function = EntryFunction::from_str_parts(
        AccountAddress::ONE,
        "aptos_account",
        "transfer",
        vec![],
        vec![
            aptos_bcs::to_bytes(&AccountAddress::TWO).unwrap(),
            aptos_bcs::to_bytes(&1u64).unwrap(),
        ],
    )
    .unwrap();
    RawTransaction::new_entry_function(
        sender,
        7,
        entry_function,
        100_000,
        100,
        u64::MAX,
        ChainId::test(),
    )
}

fn multi_key_account(threshold: u8, signer_indexes: &[u8]) -> Result<MultiKeyAccount, AuthenticationError> {
    let keys: Vec<AnyPrivateKey> = vec![
        ed25519_key(1).into(),
        secp256k1_key(2).into(),
        ed25519_key(3).into(),
    ];
    let multi_key = MultiKey::new(keys.iter().map(AnyPrivateKey::public_key).collect(), threshold)?;
    let signers = keys
        .into_iter()
        .enumerate()
        .filter(|(index, _)| signer_indexes.contains(&(*index as u8)))
        .map(|(index, key)| (index as u8, key))
        .collect();
    MultiKeyAccount::new(multi_key, signers)
}

#[test]
fn test_ed25519_signer_uses_legacy_authenticator() {
    let private_key = ed25519_key(0);
    let address = TransactionSigner::address(&private_key);
    assert_eq!(
        address.to_hex(),
        "08e845d10bbb594fcffceb36d934a188bb84d9cdf7362e4e2522265b185127cb"
    );
    let signed_txn = private_key.sign_transaction(raw_txn(address)).unwrap();
    assert_matches!(signed_txn.authenticator(), TransactionAuthenticator::Ed25519 { .. });
    assert_ok!(signed_txn.verify_signature());
}

#[test]
fn test_single_key_account() {
    for account in [
        SingleKeyAccount::new(ed25519_key(0)),
        SingleKeyAccount::new(secp256k1_key(1)),
    ] {
        let signed_txn = account.sign_transaction(raw_txn(account.address())).unwrap();
        match signed_txn.authenticator() {
            TransactionAuthenticator::SingleSender { sender } => {
                assert_matches!(sender, AccountAuthenticator::SingleKey { .. });
                assert_eq!(sender.authentication_key(), Some(account.authentication_key()));
            },
            other => panic!("unexpected authenticator {:?}", other),
        }
        assert_ok!(signed_txn.verify_signature());
        assert_err!(account.simulation_transaction(raw_txn(account.address())).verify_signature());
    }
}

#[test]
fn test_single_key_address() {
    let account = SingleKeyAccount::new(ed25519_key(0));
    assert_eq!(
        account.address().to_hex(),
        "88a8d9236470f416e88a030f2e906b842c7efe8e92af4ce929a8af09ab012fab"
    );
    assert_matches!(account.public_key(), AnyPublicKey::Ed25519 { .. });
}

#[test]
fn test_multi_key_account() {
    let account = multi_key_account(2, &[0, 1]).unwrap();
    let signed_txn = account.sign_transaction(raw_txn(account.address())).unwrap();
    assert_ok!(signed_txn.verify_signature());
    assert_eq!(signed_txn.authenticator().sender().number_of_signatures(), 2);

    let simulation = account.simulation_transaction(raw_txn(account.address()));
    assert_matches!(
        simulation.authenticator().sender(),
        AccountAuthenticator::MultiKey { .. }
    );
    assert_err!(simulation.verify_signature());
}

#[test]
fn test_multi_key_account_validation() {
    assert_matches!(
        multi_key_account(2, &[2]),
        Err(AuthenticationError::ThresholdNotMet {
            signatures: 1,
            threshold: 2
        })
    );

    let multi_key = MultiKey::new(
        vec![
            AnyPublicKey::ed25519(ed25519_key(1).public_key()),
            AnyPublicKey::ed25519(ed25519_key(2).public_key()),
        ],
        1,
    )
    .unwrap();
    // The key at index 0 does not belong to this signer.
    assert_matches!(
        MultiKeyAccount::new(multi_key.clone(), vec![(0, ed25519_key(2).into())]),
        Err(AuthenticationError::MalformedAuthenticator(_))
    );
    assert_matches!(
        MultiKeyAccount::new(multi_key.clone(), vec![(5, ed25519_key(2).into())]),
        Err(AuthenticationError::MalformedAuthenticator(_))
    );
    assert_matches!(
        MultiKeyAccount::new(multi_key, vec![
            (1, ed25519_key(2).into()),
            (1, ed25519_key(2).into())
        ]),
        Err(AuthenticationError::MalformedAuthenticator(_))
    );
}

#[test]
fn test_multi_ed25519_account() {
    let keys = vec![ed25519_key(1), ed25519_key(2), ed25519_key(3)];
    let public_key =
        MultiEd25519PublicKey::new(keys.iter().map(|key| key.public_key()).collect(), 2).unwrap();
    let signers = keys
        .into_iter()
        .enumerate()
        .skip(1)
        .map(|(index, key)| (index as u8, key))
        .collect();
    let account = MultiEd25519Account::new(public_key, signers).unwrap();

    let signed_txn = account.sign_transaction(raw_txn(account.address())).unwrap();
    assert_matches!(
        signed_txn.authenticator(),
        TransactionAuthenticator::MultiEd25519 { .. }
    );
    assert_ok!(signed_txn.verify_signature());
    assert_eq!(
        signed_txn.authenticator().sender().authentication_key(),
        Some(account.authentication_key())
    );
}

#[test]
fn test_mixed_signers_fee_payer() {
    let sender = SingleKeyAccount::new(secp256k1_key(9));
    let secondary = multi_key_account(2, &[0, 2]).unwrap();
    let fee_payer = ed25519_key(4);

    let signed_txn = raw_txn(sender.address())
        .sign_fee_payer(&sender, &[&secondary], &fee_payer)
        .unwrap()
        .into_inner();
    assert_ok!(signed_txn.verify_signature());
    assert_eq!(signed_txn.authenticator().secondary_signer_addresses(), vec![
        secondary.address()
    ]);
    assert_eq!(
        signed_txn.authenticator().fee_payer_address(),
        Some(TransactionSigner::address(&fee_payer))
    );

    let bytes = signed_txn.to_bcs_bytes().unwrap();
    assert_eq!(
        aptos_bcs::from_bytes::<crate::transaction::SignedTransaction>(&bytes).unwrap(),
        signed_txn
    );
}
