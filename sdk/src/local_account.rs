// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    error::SdkError,
    transaction_builder::{TransactionBuilder, TransactionOptions},
};
use aptos_crypto::{ed25519::Ed25519PrivateKey, traits::Uniform};
use aptos_rest_client::NodeTransport;
use aptos_types::{
    account_address::AccountAddress,
    transaction::{
        authenticator::{AccountAuthenticator, AuthenticationError, AuthenticationKey},
        RawTransaction, RawTransactionWithData, SignedTransaction, TransactionPayload,
        TransactionSigner,
    },
};
use rand::{CryptoRng, RngCore};
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};
use tokio_util::sync::CancellationToken;

/// An account whose signer lives in this process, with a locally tracked sequence number.
pub struct LocalAccount {
    address: AccountAddress,
    signer: Box<dyn TransactionSigner>,
    sequence_number: AtomicU64,
}

impl LocalAccount {
    /// An account at `address`, which may differ from the signer's authentication key if the
    /// key was rotated.
    pub fn new<S: TransactionSigner + 'static>(
        address: AccountAddress,
        signer: S,
        sequence_number: u64,
    ) -> Self {
        Self {
            address,
            signer: Box::new(signer),
            sequence_number: AtomicU64::new(sequence_number),
        }
    }

    /// An account that lives at its signer's authentication key.
    pub fn from_signer<S: TransactionSigner + 'static>(signer: S, sequence_number: u64) -> Self {
        Self::new(signer.address(), signer, sequence_number)
    }

    /// A fresh legacy Ed25519 account.
    pub fn generate<R>(rng: &mut R) -> Self
    where
        R: RngCore + CryptoRng,
    {
        Self::from_signer(Ed25519PrivateKey::generate(rng), 0)
    }

    pub fn address(&self) -> AccountAddress {
        self.address
    }

    pub fn signer(&self) -> &dyn TransactionSigner {
        self.signer.as_ref()
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number.load(Ordering::SeqCst)
    }

    /// Reserves the current sequence number for a new transaction and returns it.
    pub fn increment_sequence_number(&self) -> u64 {
        self.sequence_number.fetch_add(1, Ordering::SeqCst)
    }

    pub fn set_sequence_number(&self, sequence_number: u64) {
        self.sequence_number.store(sequence_number, Ordering::SeqCst);
    }

    /// Resets the local sequence number to the one the chain reports.
    pub async fn sync_sequence_number(
        &self,
        transport: &dyn NodeTransport,
        cancel: &CancellationToken,
    ) -> Result<u64, SdkError> {
        let sequence_number = transport
            .get_account(self.address, cancel)
            .await?
            .sequence_number
            .0;
        self.set_sequence_number(sequence_number);
        Ok(sequence_number)
    }

    /// Builds a single-sender transaction with the next local sequence number and signs it.
    /// The sequence number stays reserved even if building fails.
    pub async fn build_and_sign(
        &self,
        builder: &TransactionBuilder,
        payload: TransactionPayload,
        options: TransactionOptions,
        cancel: &CancellationToken,
    ) -> Result<SignedTransaction, SdkError> {
        if options.is_multi_agent() {
            return Err(SdkError::InvalidArgument(
                "multi-agent transactions need every co-signer; use sign_multi_agent".into(),
            ));
        }
        let options = options.with_sequence_number(self.increment_sequence_number());
        let raw_txn = builder
            .build_raw(self.address, payload, &options, cancel)
            .await?;
        Ok(self.sign_transaction(raw_txn)?)
    }

    /// Signs a transaction that needs co-signers, with this account as the sender. The sender,
    /// secondary signers and fee payer must be exactly the accounts the transaction names.
    pub fn sign_multi_agent(
        &self,
        txn: RawTransactionWithData,
        secondary_signers: &[&dyn TransactionSigner],
        fee_payer: Option<&dyn TransactionSigner>,
    ) -> Result<SignedTransaction, SdkError> {
        let secondaries_match = txn
            .secondary_signer_addresses()
            .iter()
            .copied()
            .eq(secondary_signers.iter().map(|signer| signer.address()));
        let fee_payer_matches =
            txn.fee_payer_address() == fee_payer.map(|fee_payer| fee_payer.address());
        if txn.raw_txn().sender() != self.address || !secondaries_match || !fee_payer_matches {
            return Err(SdkError::InvalidArgument(
                "co-signers do not match the transaction".into(),
            ));
        }
        let raw_txn = txn.into_raw_txn();
        let signed = match fee_payer {
            Some(fee_payer) => raw_txn.sign_fee_payer(self, secondary_signers, fee_payer)?,
            None => raw_txn.sign_multi_agent(self, secondary_signers)?,
        };
        Ok(signed.into_inner())
    }
}

impl TransactionSigner for LocalAccount {
    fn authentication_key(&self) -> AuthenticationKey {
        self.signer.authentication_key()
    }

    fn address(&self) -> AccountAddress {
        self.address
    }

    fn sign_message(&self, message: &[u8]) -> Result<AccountAuthenticator, AuthenticationError> {
        self.signer.sign_message(message)
    }

    fn simulation_authenticator(&self) -> AccountAuthenticator {
        self.signer.simulation_authenticator()
    }

    fn sign_transaction(
        &self,
        raw_txn: RawTransaction,
    ) -> Result<SignedTransaction, AuthenticationError> {
        self.signer.sign_transaction(raw_txn)
    }

    fn simulation_transaction(&self, raw_txn: RawTransaction) -> SignedTransaction {
        self.signer.simulation_transaction(raw_txn)
    }
}

impl fmt::Debug for LocalAccount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LocalAccount")
            .field("address", &self.address)
            .field("authentication_key", &self.signer.authentication_key())
            .field("sequence_number", &self.sequence_number())
            .finish()
    }
}
