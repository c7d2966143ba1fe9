// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Account-level signers.
//!
//! A [`TransactionSigner`] knows the authentication key of the account it controls and how to
//! turn a signing message into an [`AccountAuthenticator`]. The transaction-level authenticator
//! is assembled from those, either directly for single-sender transactions or by
//! [`RawTransaction::sign_multi_agent`] and [`RawTransaction::sign_fee_payer`].

use crate::{
    account_address::AccountAddress,
    transaction::{
        authenticator::{
            AccountAuthenticator, AnyPublicKey, AnySignature, AuthenticationError,
            AuthenticationKey, MultiKey, MultiKeyAuthenticator, MultiKeySignature,
            SingleKeyAuthenticator,
        },
        RawTransaction, RawTransactionWithData, SignedTransaction,
    },
};
use aptos_crypto::{
    ed25519::{Ed25519PrivateKey, Ed25519Signature},
    multi_ed25519::{MultiEd25519PublicKey, MultiEd25519Signature},
    secp256k1_ecdsa::Secp256k1EcdsaPrivateKey,
    traits::MessageSigner,
};
use std::fmt;

/// Signs on behalf of a single on-chain account.
pub trait TransactionSigner: Send + Sync {
    /// The authentication key the account is expected to carry.
    fn authentication_key(&self) -> AuthenticationKey;

    /// The account address. Accounts that never rotated their key live at their authentication
    /// key.
    fn address(&self) -> AccountAddress {
        self.authentication_key().account_address()
    }

    /// Signs an already domain-separated signing message.
    fn sign_message(&self, message: &[u8]) -> Result<AccountAuthenticator, AuthenticationError>;

    /// An authenticator with the right public keys and zero-filled signatures, accepted only by
    /// the simulation endpoint.
    fn simulation_authenticator(&self) -> AccountAuthenticator;

    /// Co-signs a multi-agent or fee payer transaction.
    fn sign_with_data(
        &self,
        txn: &RawTransactionWithData,
    ) -> Result<AccountAuthenticator, AuthenticationError> {
        self.sign_message(&txn.signing_message()?)
    }

    /// Signs a transaction this account sends alone.
    fn sign_transaction(
        &self,
        raw_txn: RawTransaction,
    ) -> Result<SignedTransaction, AuthenticationError> {
        let authenticator = self.sign_message(&raw_txn.signing_message()?)?;
        Ok(SignedTransaction::new_single_sender(raw_txn, authenticator))
    }

    fn simulation_transaction(&self, raw_txn: RawTransaction) -> SignedTransaction {
        SignedTransaction::new_single_sender(raw_txn, self.simulation_authenticator())
    }
}

/// Legacy Ed25519 accounts. Single-sender transactions use the Ed25519 transaction authenticator
/// that older nodes understand.
impl TransactionSigner for Ed25519PrivateKey {
    fn authentication_key(&self) -> AuthenticationKey {
        AuthenticationKey::new(Ed25519PrivateKey::authentication_key(self))
    }

    fn sign_message(&self, message: &[u8]) -> Result<AccountAuthenticator, AuthenticationError> {
        Ok(AccountAuthenticator::ed25519(
            self.public_key(),
            self.sign_arbitrary_message(message),
        ))
    }

    fn simulation_authenticator(&self) -> AccountAuthenticator {
        AccountAuthenticator::ed25519(self.public_key(), Ed25519Signature::simulation())
    }

    fn sign_transaction(
        &self,
        raw_txn: RawTransaction,
    ) -> Result<SignedTransaction, AuthenticationError> {
        let signature = self.sign(&raw_txn)?;
        Ok(SignedTransaction::new(raw_txn, self.public_key(), signature))
    }

    fn simulation_transaction(&self, raw_txn: RawTransaction) -> SignedTransaction {
        SignedTransaction::new(raw_txn, self.public_key(), Ed25519Signature::simulation())
    }
}

/// A private key of any scheme a single-key account may use.
pub enum AnyPrivateKey {
    Ed25519(Ed25519PrivateKey),
    Secp256k1Ecdsa(Secp256k1EcdsaPrivateKey),
}

impl AnyPrivateKey {
    pub fn public_key(&self) -> AnyPublicKey {
        match self {
            Self::Ed25519(private_key) => AnyPublicKey::ed25519(private_key.public_key()),
            Self::Secp256k1Ecdsa(private_key) => {
                AnyPublicKey::secp256k1_ecdsa(private_key.public_key())
            },
        }
    }

    pub fn sign_arbitrary_message(&self, message: &[u8]) -> AnySignature {
        match self {
            Self::Ed25519(private_key) => {
                AnySignature::ed25519(private_key.sign_arbitrary_message(message))
            },
            Self::Secp256k1Ecdsa(private_key) => {
                AnySignature::secp256k1_ecdsa(private_key.sign_arbitrary_message(message))
            },
        }
    }

    pub fn simulation_signature(&self) -> AnySignature {
        match self {
            Self::Ed25519(private_key) => AnySignature::ed25519(private_key.simulation_signature()),
            Self::Secp256k1Ecdsa(private_key) => {
                AnySignature::secp256k1_ecdsa(private_key.simulation_signature())
            },
        }
    }
}

impl From<Ed25519PrivateKey> for AnyPrivateKey {
    fn from(private_key: Ed25519PrivateKey) -> Self {
        Self::Ed25519(private_key)
    }
}

impl From<Secp256k1EcdsaPrivateKey> for AnyPrivateKey {
    fn from(private_key: Secp256k1EcdsaPrivateKey) -> Self {
        Self::Secp256k1Ecdsa(private_key)
    }
}

impl fmt::Debug for AnyPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ed25519(private_key) => write!(f, "Ed25519({:?})", private_key),
            Self::Secp256k1Ecdsa(private_key) => write!(f, "Secp256k1Ecdsa({:?})", private_key),
        }
    }
}

/// An account controlled by one key wrapped in the single-key authenticator.
#[derive(Debug)]
pub struct SingleKeyAccount {
    private_key: AnyPrivateKey,
    public_key: AnyPublicKey,
}

impl SingleKeyAccount {
    pub fn new(private_key: impl Into<AnyPrivateKey>) -> Self {
        let private_key = private_key.into();
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
        }
    }

    pub fn private_key(&self) -> &AnyPrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &AnyPublicKey {
        &self.public_key
    }
}

impl TransactionSigner for SingleKeyAccount {
    fn authentication_key(&self) -> AuthenticationKey {
        AuthenticationKey::any_key(self.public_key.clone())
    }

    fn sign_message(&self, message: &[u8]) -> Result<AccountAuthenticator, AuthenticationError> {
        let signature = self.private_key.sign_arbitrary_message(message);
        Ok(AccountAuthenticator::single_key(
            SingleKeyAuthenticator::from_parts(self.public_key.clone(), signature),
        ))
    }

    fn simulation_authenticator(&self) -> AccountAuthenticator {
        AccountAuthenticator::single_key(SingleKeyAuthenticator::from_parts(
            self.public_key.clone(),
            self.private_key.simulation_signature(),
        ))
    }
}

/// A k-of-n account holding enough of the private keys to meet the threshold.
#[derive(Debug)]
pub struct MultiKeyAccount {
    multi_key: MultiKey,
    signers: Vec<(u8, AnyPrivateKey)>,
}

impl MultiKeyAccount {
    /// Every signer must own the public key at its index, and there must be enough of them to
    /// meet the threshold.
    pub fn new(
        multi_key: MultiKey,
        mut signers: Vec<(u8, AnyPrivateKey)>,
    ) -> Result<Self, AuthenticationError> {
        signers.sort_by_key(|(index, _)| *index);
        for window in signers.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(AuthenticationError::MalformedAuthenticator(format!(
                    "duplicate signer index {}",
                    window[0].0
                )));
            }
        }
        for (index, private_key) in &signers {
            let expected = multi_key.public_keys().get(*index as usize).ok_or_else(|| {
                AuthenticationError::MalformedAuthenticator(format!(
                    "signer index {} out of range for {} keys",
                    index,
                    multi_key.len()
                ))
            })?;
            if *expected != private_key.public_key() {
                return Err(AuthenticationError::MalformedAuthenticator(format!(
                    "private key does not match public key at index {}",
                    index
                )));
            }
        }
        if signers.len() < multi_key.signatures_required() as usize {
            return Err(AuthenticationError::ThresholdNotMet {
                signatures: signers.len(),
                threshold: multi_key.signatures_required(),
            });
        }
        Ok(Self { multi_key, signers })
    }

    pub fn multi_key(&self) -> &MultiKey {
        &self.multi_key
    }

    fn authenticator(
        &self,
        sign: impl Fn(&AnyPrivateKey) -> AnySignature,
    ) -> Result<AccountAuthenticator, AuthenticationError> {
        let signatures = self
            .signers
            .iter()
            .map(|(index, private_key)| (*index, sign(private_key)))
            .collect();
        Ok(AccountAuthenticator::multi_key(MultiKeyAuthenticator::new(
            self.multi_key.clone(),
            MultiKeySignature::new(signatures)?,
        )))
    }
}

impl TransactionSigner for MultiKeyAccount {
    fn authentication_key(&self) -> AuthenticationKey {
        AuthenticationKey::multi_key(self.multi_key.clone())
    }

    fn sign_message(&self, message: &[u8]) -> Result<AccountAuthenticator, AuthenticationError> {
        self.authenticator(|private_key| private_key.sign_arbitrary_message(message))
    }

    fn simulation_authenticator(&self) -> AccountAuthenticator {
        // Signer indexes were validated on construction.
        self.authenticator(AnyPrivateKey::simulation_signature)
            .unwrap_or(AccountAuthenticator::NoAccountAuthenticator)
    }
}

/// A legacy k-of-n Ed25519 account.
#[derive(Debug)]
pub struct MultiEd25519Account {
    public_key: MultiEd25519PublicKey,
    signers: Vec<(u8, Ed25519PrivateKey)>,
}

impl MultiEd25519Account {
    pub fn new(
        public_key: MultiEd25519PublicKey,
        signers: Vec<(u8, Ed25519PrivateKey)>,
    ) -> Result<Self, AuthenticationError> {
        for (index, private_key) in &signers {
            match public_key.public_keys().get(*index as usize) {
                Some(expected) if *expected == private_key.public_key() => {},
                _ => {
                    return Err(AuthenticationError::MalformedAuthenticator(format!(
                        "private key does not match public key at index {}",
                        index
                    )))
                },
            }
        }
        if signers.len() < public_key.threshold() as usize {
            return Err(AuthenticationError::ThresholdNotMet {
                signatures: signers.len(),
                threshold: public_key.threshold(),
            });
        }
        Ok(Self {
            public_key,
            signers,
        })
    }

    pub fn public_key(&self) -> &MultiEd25519PublicKey {
        &self.public_key
    }

    fn signature(
        &self,
        sign: impl Fn(&Ed25519PrivateKey) -> Ed25519Signature,
    ) -> Result<MultiEd25519Signature, AuthenticationError> {
        let signatures = self
            .signers
            .iter()
            .map(|(index, private_key)| (sign(private_key), *index))
            .collect();
        Ok(MultiEd25519Signature::new(signatures)?)
    }
}

impl TransactionSigner for MultiEd25519Account {
    fn authentication_key(&self) -> AuthenticationKey {
        AuthenticationKey::multi_ed25519(&self.public_key)
    }

    fn sign_message(&self, message: &[u8]) -> Result<AccountAuthenticator, AuthenticationError> {
        let signature = self.signature(|private_key| private_key.sign_arbitrary_message(message))?;
        Ok(AccountAuthenticator::multi_ed25519(
            self.public_key.clone(),
            signature,
        ))
    }

    fn simulation_authenticator(&self) -> AccountAuthenticator {
        match self.signature(|_| Ed25519Signature::simulation()) {
            Ok(signature) => AccountAuthenticator::multi_ed25519(self.public_key.clone(), signature),
            Err(_) => AccountAuthenticator::NoAccountAuthenticator,
        }
    }

    fn sign_transaction(
        &self,
        raw_txn: RawTransaction,
    ) -> Result<SignedTransaction, AuthenticationError> {
        let message = raw_txn.signing_message()?;
        let signature = self.signature(|private_key| private_key.sign_arbitrary_message(&message))?;
        Ok(SignedTransaction::new_multisig(
            raw_txn,
            self.public_key.clone(),
            signature,
        ))
    }
}
