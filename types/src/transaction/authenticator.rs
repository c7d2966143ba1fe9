// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    account_address::AccountAddress,
    transaction::{RawTransaction, RawTransactionWithData},
};
use aptos_crypto::{
    ed25519::{Ed25519PublicKey, Ed25519Signature},
    hash::{signing_message, CryptoHash},
    multi_ed25519::{
        bitmap_count_ones, bitmap_get_bit, bitmap_set_bit, MultiEd25519PublicKey,
        MultiEd25519Signature, BITMAP_NUM_OF_BYTES,
    },
    secp256k1_ecdsa::{Secp256k1EcdsaPublicKey, Secp256k1EcdsaSignature},
    traits::{PublicKey as _, Signature as _},
    CryptoMaterialError, HashValue, Scheme,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Maximum number of signatures supported in `TransactionAuthenticator`,
/// across all `AccountAuthenticator`s included.
pub const MAX_NUM_OF_SIGS: usize = 32;

/// An error raised while building or checking an authenticator.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AuthenticationError {
    #[error("public key of type {public_key} cannot verify a signature of type {signature}")]
    KeyTypeMismatch {
        public_key: &'static str,
        signature: &'static str,
    },
    #[error("{signatures} signatures do not meet the threshold of {threshold}")]
    ThresholdNotMet { signatures: usize, threshold: u8 },
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    #[error("malformed authenticator: {0}")]
    MalformedAuthenticator(String),
    #[error(transparent)]
    CryptoMaterial(#[from] CryptoMaterialError),
}

fn invalid_signature(error: anyhow::Error) -> AuthenticationError {
    AuthenticationError::InvalidSignature(error.to_string())
}

/// Each transaction submitted to the Aptos blockchain contains a `TransactionAuthenticator`. During
/// transaction execution, the executor will check if every `AccountAuthenticator`'s signature on
/// the transaction hash is well-formed and whether the sha3 hash of the
/// `AccountAuthenticator`'s `AuthenticationKeyPreimage` matches the `AuthenticationKey` stored
/// under the participating signer's account address.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TransactionAuthenticator {
    /// Single Ed25519 signature
    Ed25519 {
        public_key: Ed25519PublicKey,
        signature: Ed25519Signature,
    },
    /// K-of-N multisignature
    MultiEd25519 {
        public_key: MultiEd25519PublicKey,
        signature: MultiEd25519Signature,
    },
    /// Multi-agent transaction.
    MultiAgent {
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
    },
    /// Optional Multi-agent transaction with a fee payer.
    FeePayer {
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
        fee_payer_address: AccountAddress,
        fee_payer_signer: AccountAuthenticator,
    },
    SingleSender {
        sender: AccountAuthenticator,
    },
}

impl TransactionAuthenticator {
    /// Create a single-signature ed25519 authenticator
    pub fn ed25519(public_key: Ed25519PublicKey, signature: Ed25519Signature) -> Self {
        Self::Ed25519 {
            public_key,
            signature,
        }
    }

    /// Create a (optional) multi-agent fee payer authenticator
    pub fn fee_payer(
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
        fee_payer_address: AccountAddress,
        fee_payer_signer: AccountAuthenticator,
    ) -> Self {
        Self::FeePayer {
            sender,
            secondary_signer_addresses,
            secondary_signers,
            fee_payer_address,
            fee_payer_signer,
        }
    }

    /// Create a multisignature ed25519 authenticator
    pub fn multi_ed25519(
        public_key: MultiEd25519PublicKey,
        signature: MultiEd25519Signature,
    ) -> Self {
        Self::MultiEd25519 {
            public_key,
            signature,
        }
    }

    /// Create a multi-agent authenticator
    pub fn multi_agent(
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
    ) -> Self {
        Self::MultiAgent {
            sender,
            secondary_signer_addresses,
            secondary_signers,
        }
    }

    /// Create a single-sender authenticator
    pub fn single_sender(sender: AccountAuthenticator) -> Self {
        Self::SingleSender { sender }
    }

    /// Return Ok if all AccountAuthenticator's public keys match their signatures, Err otherwise
    pub fn verify(&self, raw_txn: &RawTransaction) -> Result<(), AuthenticationError> {
        let num_sigs: usize = self.sender().number_of_signatures()
            + self
                .secondary_signers()
                .iter()
                .map(|auth| auth.number_of_signatures())
                .sum::<usize>();
        if num_sigs > MAX_NUM_OF_SIGS {
            return Err(AuthenticationError::MalformedAuthenticator(format!(
                "{} signatures exceed the limit of {}",
                num_sigs, MAX_NUM_OF_SIGS
            )));
        }
        match self {
            Self::Ed25519 {
                public_key,
                signature,
            } => signature.verify(raw_txn, public_key).map_err(invalid_signature),
            Self::MultiEd25519 {
                public_key,
                signature,
            } => signature.verify(raw_txn, public_key).map_err(invalid_signature),
            Self::MultiAgent {
                sender,
                secondary_signer_addresses,
                secondary_signers,
            } => {
                let message = RawTransactionWithData::new_multi_agent(
                    raw_txn.clone(),
                    secondary_signer_addresses.clone(),
                );
                verify_secondary_signers(secondary_signer_addresses, secondary_signers, &message)?;
                sender.verify(&message)
            },
            Self::FeePayer {
                sender,
                secondary_signer_addresses,
                secondary_signers,
                fee_payer_address,
                fee_payer_signer,
            } => {
                let message = RawTransactionWithData::new_fee_payer(
                    raw_txn.clone(),
                    secondary_signer_addresses.clone(),
                    *fee_payer_address,
                );
                verify_secondary_signers(secondary_signer_addresses, secondary_signers, &message)?;
                sender.verify(&message)?;
                fee_payer_signer.verify(&message)
            },
            Self::SingleSender { sender } => sender.verify(raw_txn),
        }
    }

    pub fn sender(&self) -> AccountAuthenticator {
        match self {
            Self::Ed25519 {
                public_key,
                signature,
            } => AccountAuthenticator::ed25519(public_key.clone(), signature.clone()),
            Self::MultiEd25519 {
                public_key,
                signature,
            } => AccountAuthenticator::multi_ed25519(public_key.clone(), signature.clone()),
            Self::MultiAgent { sender, .. }
            | Self::FeePayer { sender, .. }
            | Self::SingleSender { sender } => sender.clone(),
        }
    }

    pub fn secondary_signer_addresses(&self) -> Vec<AccountAddress> {
        match self {
            Self::Ed25519 { .. } | Self::MultiEd25519 { .. } | Self::SingleSender { .. } => {
                vec![]
            },
            Self::FeePayer {
                secondary_signer_addresses,
                ..
            }
            | Self::MultiAgent {
                secondary_signer_addresses,
                ..
            } => secondary_signer_addresses.to_vec(),
        }
    }

    pub fn secondary_signers(&self) -> Vec<AccountAuthenticator> {
        match self {
            Self::Ed25519 { .. } | Self::MultiEd25519 { .. } | Self::SingleSender { .. } => {
                vec![]
            },
            Self::FeePayer {
                secondary_signers,
                fee_payer_signer,
                ..
            } => {
                let mut signers = secondary_signers.clone();
                signers.push(fee_payer_signer.clone());
                signers
            },
            Self::MultiAgent {
                secondary_signers, ..
            } => secondary_signers.to_vec(),
        }
    }

    pub fn fee_payer_address(&self) -> Option<AccountAddress> {
        match self {
            Self::FeePayer {
                fee_payer_address, ..
            } => Some(*fee_payer_address),
            _ => None,
        }
    }

    pub fn fee_payer_signer(&self) -> Option<AccountAuthenticator> {
        match self {
            Self::FeePayer {
                fee_payer_signer, ..
            } => Some(fee_payer_signer.clone()),
            _ => None,
        }
    }

    pub fn all_signers(&self) -> Vec<AccountAuthenticator> {
        let mut signers = vec![self.sender()];
        signers.extend(self.secondary_signers());
        signers
    }
}

fn verify_secondary_signers(
    secondary_signer_addresses: &[AccountAddress],
    secondary_signers: &[AccountAuthenticator],
    message: &RawTransactionWithData,
) -> Result<(), AuthenticationError> {
    if secondary_signer_addresses.len() != secondary_signers.len() {
        return Err(AuthenticationError::MalformedAuthenticator(format!(
            "{} secondary signer addresses but {} secondary authenticators",
            secondary_signer_addresses.len(),
            secondary_signers.len()
        )));
    }
    for signer in secondary_signers {
        signer.verify(message)?;
    }
    Ok(())
}

impl fmt::Display for TransactionAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ed25519 { .. } => {
                write!(f, "TransactionAuthenticator[scheme: Ed25519, sender: {}]", self.sender())
            },
            Self::MultiEd25519 { .. } => write!(
                f,
                "TransactionAuthenticator[scheme: MultiEd25519, sender: {}]",
                self.sender()
            ),
            Self::SingleSender { sender } => write!(
                f,
                "TransactionAuthenticator[scheme: SingleSender, sender: {}]",
                sender
            ),
            Self::MultiAgent {
                sender,
                secondary_signer_addresses,
                secondary_signers,
            } => {
                let mut sec_addrs = String::new();
                for sec_addr in secondary_signer_addresses {
                    sec_addrs = format!("{}\n\t\t\t{:#?},", sec_addrs, sec_addr);
                }
                let mut sec_signers = String::new();
                for sec_signer in secondary_signers {
                    sec_signers = format!("{}\n\t\t\t{:#?},", sec_signers, sec_signer);
                }
                write!(
                    f,
                    "TransactionAuthenticator[\n\
                        \tscheme: MultiAgent, \n\
                        \tsender: {}\n\
                        \tsecondary signer addresses: {}\n\
                        \tsecondary signers: {}]",
                    sender, sec_addrs, sec_signers,
                )
            },
            Self::FeePayer {
                sender,
                secondary_signer_addresses,
                secondary_signers,
                fee_payer_address,
                fee_payer_signer,
            } => {
                let mut sec_addrs = String::new();
                for sec_addr in secondary_signer_addresses {
                    sec_addrs = format!("{}\n\t\t\t{:#?},", sec_addrs, sec_addr);
                }
                let mut sec_signers = String::new();
                for sec_signer in secondary_signers {
                    sec_signers = format!("{}\n\t\t\t{:#?},", sec_signers, sec_signer);
                }
                write!(
                    f,
                    "TransactionAuthenticator[\n\
                        \tscheme: FeePayer, \n\
                        \tsender: {}\n\
                        \tsecondary signer addresses: {}\n\
                        \tsecondary signers: {}\n\n
                        \tfee payer address: {}\n\n
                        \tfee payer signer: {}]",
                    sender, sec_addrs, sec_signers, fee_payer_address, fee_payer_signer,
                )
            },
        }
    }
}

/// An `AccountAuthenticator` is an abstraction of a signature scheme. It must know:
/// (1) How to check its signature against a message and public key
/// (2) How to convert its public key into an `AuthenticationKeyPreimage` structured as
/// (public_key | signature_scheme_id).
/// Each on-chain `Account` must store an `AuthenticationKey` (computed via a sha3 hash of `(public
/// key bytes | scheme as u8)`).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AccountAuthenticator {
    /// Ed25519 Single signature
    Ed25519 {
        public_key: Ed25519PublicKey,
        signature: Ed25519Signature,
    },
    /// Ed25519 K-of-N multisignature
    MultiEd25519 {
        public_key: MultiEd25519PublicKey,
        signature: MultiEd25519Signature,
    },
    SingleKey {
        authenticator: SingleKeyAuthenticator,
    },
    MultiKey {
        authenticator: MultiKeyAuthenticator,
    },
    /// Stands in for a signer whose signature is not checked, as in simulation.
    NoAccountAuthenticator,
}

impl AccountAuthenticator {
    /// Unique identifier for the signature scheme
    pub fn scheme(&self) -> Option<Scheme> {
        match self {
            Self::Ed25519 { .. } => Some(Scheme::Ed25519),
            Self::MultiEd25519 { .. } => Some(Scheme::MultiEd25519),
            Self::SingleKey { .. } => Some(Scheme::SingleKey),
            Self::MultiKey { .. } => Some(Scheme::MultiKey),
            Self::NoAccountAuthenticator => None,
        }
    }

    /// Create a single-signature ed25519 authenticator
    pub fn ed25519(public_key: Ed25519PublicKey, signature: Ed25519Signature) -> Self {
        Self::Ed25519 {
            public_key,
            signature,
        }
    }

    /// Create a multisignature ed25519 authenticator
    pub fn multi_ed25519(
        public_key: MultiEd25519PublicKey,
        signature: MultiEd25519Signature,
    ) -> Self {
        Self::MultiEd25519 {
            public_key,
            signature,
        }
    }

    /// Create a single-key authenticator
    pub fn single_key(authenticator: SingleKeyAuthenticator) -> Self {
        Self::SingleKey { authenticator }
    }

    /// Create a multi-key authenticator
    pub fn multi_key(authenticator: MultiKeyAuthenticator) -> Self {
        Self::MultiKey { authenticator }
    }

    /// Wraps a public key and a signature of the same scheme. Ed25519 pairs produce the legacy
    /// `Ed25519` variant, every other scheme is wrapped in `SingleKey`.
    pub fn from_key_and_signature(
        public_key: AnyPublicKey,
        signature: AnySignature,
    ) -> Result<Self, AuthenticationError> {
        match (public_key, signature) {
            (
                AnyPublicKey::Ed25519 { public_key },
                AnySignature::Ed25519 { signature },
            ) => Ok(Self::ed25519(public_key, signature)),
            (public_key, signature) => Ok(Self::single_key(SingleKeyAuthenticator::new(
                public_key, signature,
            )?)),
        }
    }

    /// Return Ok if the authenticator's public key matches its signature, Err otherwise
    pub fn verify<T: CryptoHash>(&self, message: &T) -> Result<(), AuthenticationError> {
        self.verify_arbitrary_msg(&signing_message(message)?)
    }

    /// Verifies the authenticator over an already constructed signing message.
    pub fn verify_arbitrary_msg(&self, message: &[u8]) -> Result<(), AuthenticationError> {
        match self {
            Self::Ed25519 {
                public_key,
                signature,
            } => signature
                .verify_arbitrary_msg(message, public_key)
                .map_err(invalid_signature),
            Self::MultiEd25519 {
                public_key,
                signature,
            } => signature
                .verify_arbitrary_msg(message, public_key)
                .map_err(invalid_signature),
            Self::SingleKey { authenticator } => authenticator.verify_arbitrary_msg(message),
            Self::MultiKey { authenticator } => authenticator.verify_arbitrary_msg(message),
            Self::NoAccountAuthenticator => Err(AuthenticationError::MalformedAuthenticator(
                "NoAccountAuthenticator cannot be verified".to_string(),
            )),
        }
    }

    /// Return the raw bytes of `self.public_key`
    pub fn public_key_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519 { public_key, .. } => public_key.to_bytes().to_vec(),
            Self::MultiEd25519 { public_key, .. } => public_key.to_bytes(),
            Self::SingleKey { authenticator } => authenticator.public_key().to_bytes(),
            Self::MultiKey { authenticator } => authenticator.public_keys().to_bytes(),
            Self::NoAccountAuthenticator => vec![],
        }
    }

    /// Return the raw bytes of `self.signature`
    pub fn signature_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519 { signature, .. } => signature.to_bytes().to_vec(),
            Self::MultiEd25519 { signature, .. } => signature.to_bytes(),
            Self::SingleKey { authenticator } => authenticator.signature().to_bytes(),
            Self::MultiKey { authenticator } => authenticator.signatures().to_bytes(),
            Self::NoAccountAuthenticator => vec![],
        }
    }

    /// Return an authentication key derived from `self`'s public key and scheme id
    pub fn authentication_key(&self) -> Option<AuthenticationKey> {
        match self {
            Self::Ed25519 { public_key, .. } => Some(AuthenticationKey::ed25519(public_key)),
            Self::MultiEd25519 { public_key, .. } => {
                Some(AuthenticationKey::multi_ed25519(public_key))
            },
            Self::SingleKey { authenticator } => {
                Some(AuthenticationKey::any_key(authenticator.public_key().clone()))
            },
            Self::MultiKey { authenticator } => {
                Some(AuthenticationKey::multi_key(authenticator.public_keys().clone()))
            },
            Self::NoAccountAuthenticator => None,
        }
    }

    /// Return the number of signatures included in this account authenticator.
    pub fn number_of_signatures(&self) -> usize {
        match self {
            Self::Ed25519 { .. } => 1,
            Self::MultiEd25519 { signature, .. } => signature.signatures().len(),
            Self::SingleKey { .. } => 1,
            Self::MultiKey { authenticator } => authenticator.signatures().signatures().len(),
            Self::NoAccountAuthenticator => 0,
        }
    }
}

impl fmt::Display for AccountAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let scheme = self
            .scheme()
            .map_or_else(|| "None".to_string(), |scheme| scheme.to_string());
        write!(
            f,
            "AccountAuthenticator[scheme id: {}, public key: {}, signature: {}]",
            scheme,
            hex::encode(self.public_key_bytes()),
            hex::encode(self.signature_bytes())
        )
    }
}

/// A public key of any scheme a single-key account may use.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AnyPublicKey {
    Ed25519 {
        public_key: Ed25519PublicKey,
    },
    Secp256k1Ecdsa {
        public_key: Secp256k1EcdsaPublicKey,
    },
}

impl AnyPublicKey {
    pub fn ed25519(public_key: Ed25519PublicKey) -> Self {
        Self::Ed25519 { public_key }
    }

    pub fn secp256k1_ecdsa(public_key: Secp256k1EcdsaPublicKey) -> Self {
        Self::Secp256k1Ecdsa { public_key }
    }

    fn variant(&self) -> u8 {
        match self {
            Self::Ed25519 { .. } => 0,
            Self::Secp256k1Ecdsa { .. } => 1,
        }
    }

    fn scheme_name(&self) -> &'static str {
        match self {
            Self::Ed25519 { .. } => "Ed25519",
            Self::Secp256k1Ecdsa { .. } => "Secp256k1Ecdsa",
        }
    }

    /// The raw key bytes, without the variant tag.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519 { public_key } => public_key.to_bytes().to_vec(),
            Self::Secp256k1Ecdsa { public_key } => public_key.to_bytes().to_vec(),
        }
    }

    /// `bcs(self)`. Key lengths are below 128, so the length prefix is a single byte.
    pub fn to_bcs_bytes(&self) -> Vec<u8> {
        let key = self.to_bytes();
        let mut bytes = Vec::with_capacity(2 + key.len());
        bytes.push(self.variant());
        bytes.push(key.len() as u8);
        bytes.extend_from_slice(&key);
        bytes
    }

    pub fn verify_arbitrary_msg(
        &self,
        message: &[u8],
        signature: &AnySignature,
    ) -> Result<(), AuthenticationError> {
        match (self, signature) {
            (Self::Ed25519 { public_key }, AnySignature::Ed25519 { signature }) => signature
                .verify_arbitrary_msg(message, public_key)
                .map_err(invalid_signature),
            (
                Self::Secp256k1Ecdsa { public_key },
                AnySignature::Secp256k1Ecdsa { signature },
            ) => signature
                .verify_arbitrary_msg(message, public_key)
                .map_err(invalid_signature),
            (public_key, signature) => Err(AuthenticationError::KeyTypeMismatch {
                public_key: public_key.scheme_name(),
                signature: signature.scheme_name(),
            }),
        }
    }
}

impl From<Ed25519PublicKey> for AnyPublicKey {
    fn from(public_key: Ed25519PublicKey) -> Self {
        Self::ed25519(public_key)
    }
}

impl From<Secp256k1EcdsaPublicKey> for AnyPublicKey {
    fn from(public_key: Secp256k1EcdsaPublicKey) -> Self {
        Self::secp256k1_ecdsa(public_key)
    }
}

impl fmt::Display for AnyPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(0x{})", self.scheme_name(), hex::encode(self.to_bytes()))
    }
}

/// A signature of any scheme a single-key account may use.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AnySignature {
    Ed25519 {
        signature: Ed25519Signature,
    },
    Secp256k1Ecdsa {
        signature: Secp256k1EcdsaSignature,
    },
}

impl AnySignature {
    pub fn ed25519(signature: Ed25519Signature) -> Self {
        Self::Ed25519 { signature }
    }

    pub fn secp256k1_ecdsa(signature: Secp256k1EcdsaSignature) -> Self {
        Self::Secp256k1Ecdsa { signature }
    }

    fn scheme_name(&self) -> &'static str {
        match self {
            Self::Ed25519 { .. } => "Ed25519",
            Self::Secp256k1Ecdsa { .. } => "Secp256k1Ecdsa",
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519 { signature } => signature.to_bytes().to_vec(),
            Self::Secp256k1Ecdsa { signature } => signature.to_bytes().to_vec(),
        }
    }

    /// `bcs(self)`.
    pub fn to_bcs_bytes(&self) -> Vec<u8> {
        let signature = self.to_bytes();
        let mut bytes = Vec::with_capacity(2 + signature.len());
        bytes.push(signature_variant(self));
        bytes.push(signature.len() as u8);
        bytes.extend_from_slice(&signature);
        bytes
    }
}

impl From<Ed25519Signature> for AnySignature {
    fn from(signature: Ed25519Signature) -> Self {
        Self::ed25519(signature)
    }
}

impl From<Secp256k1EcdsaSignature> for AnySignature {
    fn from(signature: Secp256k1EcdsaSignature) -> Self {
        Self::secp256k1_ecdsa(signature)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SingleKeyAuthenticator {
    public_key: AnyPublicKey,
    signature: AnySignature,
}

impl SingleKeyAuthenticator {
    /// Fails if the key and the signature belong to different schemes.
    pub fn new(
        public_key: AnyPublicKey,
        signature: AnySignature,
    ) -> Result<Self, AuthenticationError> {
        if public_key.variant() != signature_variant(&signature) {
            return Err(AuthenticationError::KeyTypeMismatch {
                public_key: public_key.scheme_name(),
                signature: signature.scheme_name(),
            });
        }
        Ok(Self {
            public_key,
            signature,
        })
    }

    /// Callers guarantee the key and the signature share a scheme.
    pub(crate) fn from_parts(public_key: AnyPublicKey, signature: AnySignature) -> Self {
        Self {
            public_key,
            signature,
        }
    }

    pub fn public_key(&self) -> &AnyPublicKey {
        &self.public_key
    }

    pub fn signature(&self) -> &AnySignature {
        &self.signature
    }

    pub fn verify<T: CryptoHash>(&self, message: &T) -> Result<(), AuthenticationError> {
        self.verify_arbitrary_msg(&signing_message(message)?)
    }

    pub fn verify_arbitrary_msg(&self, message: &[u8]) -> Result<(), AuthenticationError> {
        self.public_key.verify_arbitrary_msg(message, &self.signature)
    }
}

fn signature_variant(signature: &AnySignature) -> u8 {
    match signature {
        AnySignature::Ed25519 { .. } => 0,
        AnySignature::Secp256k1Ecdsa { .. } => 1,
    }
}

/// A k-of-n set of public keys of any single-key scheme.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MultiKey {
    public_keys: Vec<AnyPublicKey>,
    signatures_required: u8,
}

impl MultiKey {
    pub fn new(
        public_keys: Vec<AnyPublicKey>,
        signatures_required: u8,
    ) -> Result<Self, AuthenticationError> {
        if public_keys.is_empty() || public_keys.len() > MAX_NUM_OF_SIGS {
            return Err(AuthenticationError::MalformedAuthenticator(format!(
                "a multi-key holds between 1 and {} keys, got {}",
                MAX_NUM_OF_SIGS,
                public_keys.len()
            )));
        }
        if signatures_required == 0 || signatures_required as usize > public_keys.len() {
            return Err(AuthenticationError::MalformedAuthenticator(format!(
                "threshold {} is not within 1..={}",
                signatures_required,
                public_keys.len()
            )));
        }
        Ok(Self {
            public_keys,
            signatures_required,
        })
    }

    pub fn public_keys(&self) -> &[AnyPublicKey] {
        &self.public_keys
    }

    pub fn signatures_required(&self) -> u8 {
        self.signatures_required
    }

    pub fn len(&self) -> usize {
        self.public_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.public_keys.is_empty()
    }

    /// `bcs(self)`. At most 32 keys, so the count prefix is a single byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![self.public_keys.len() as u8];
        for public_key in &self.public_keys {
            bytes.extend(public_key.to_bcs_bytes());
        }
        bytes.push(self.signatures_required);
        bytes
    }
}

/// Signatures of a subset of the keys of a [`MultiKey`], ordered by key index. Bit `i` of the
/// bitmap, counted from the most significant bit of the first byte, is set if key `i` signed.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MultiKeySignature {
    signatures: Vec<AnySignature>,
    #[serde(with = "bitmap_bytes")]
    bitmap: [u8; BITMAP_NUM_OF_BYTES],
}

impl MultiKeySignature {
    /// Builds a signature from `(key index, signature)` pairs in any order.
    pub fn new(mut signatures: Vec<(u8, AnySignature)>) -> Result<Self, AuthenticationError> {
        if signatures.is_empty() || signatures.len() > MAX_NUM_OF_SIGS {
            return Err(AuthenticationError::MalformedAuthenticator(format!(
                "a multi-key signature holds between 1 and {} signatures, got {}",
                MAX_NUM_OF_SIGS,
                signatures.len()
            )));
        }
        signatures.sort_by_key(|(index, _)| *index);
        let mut bitmap = [0u8; BITMAP_NUM_OF_BYTES];
        for (index, _) in &signatures {
            let index = *index as usize;
            if index >= MAX_NUM_OF_SIGS {
                return Err(AuthenticationError::MalformedAuthenticator(format!(
                    "key index {} is out of range",
                    index
                )));
            }
            if bitmap_get_bit(bitmap, index) {
                return Err(AuthenticationError::MalformedAuthenticator(format!(
                    "duplicate signature for key index {}",
                    index
                )));
            }
            bitmap_set_bit(&mut bitmap, index);
        }
        Ok(Self {
            signatures: signatures
                .into_iter()
                .map(|(_, signature)| signature)
                .collect(),
            bitmap,
        })
    }

    pub fn signatures(&self) -> &[AnySignature] {
        &self.signatures
    }

    pub fn bitmap(&self) -> &[u8; BITMAP_NUM_OF_BYTES] {
        &self.bitmap
    }

    /// Key indexes that signed, ascending.
    pub fn signer_indexes(&self) -> Vec<usize> {
        (0..MAX_NUM_OF_SIGS)
            .filter(|index| bitmap_get_bit(self.bitmap, *index))
            .collect()
    }

    /// `bcs(self)`. Counts and signature lengths are below 128, so every length prefix is a
    /// single byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![self.signatures.len() as u8];
        for signature in &self.signatures {
            bytes.extend(signature.to_bcs_bytes());
        }
        bytes.push(BITMAP_NUM_OF_BYTES as u8);
        bytes.extend_from_slice(&self.bitmap);
        bytes
    }
}

mod bitmap_bytes {
    use aptos_crypto::multi_ed25519::BITMAP_NUM_OF_BYTES;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        bitmap: &[u8; BITMAP_NUM_OF_BYTES],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serde_bytes::Bytes::new(bitmap).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[u8; BITMAP_NUM_OF_BYTES], D::Error> {
        let bytes = serde_bytes::ByteBuf::deserialize(deserializer)?;
        <[u8; BITMAP_NUM_OF_BYTES]>::try_from(bytes.as_slice())
            .map_err(|_| D::Error::invalid_length(bytes.len(), &"a 4-byte bitmap"))
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MultiKeyAuthenticator {
    public_keys: MultiKey,
    signatures: MultiKeySignature,
}

impl MultiKeyAuthenticator {
    pub fn new(public_keys: MultiKey, signatures: MultiKeySignature) -> Self {
        Self {
            public_keys,
            signatures,
        }
    }

    pub fn public_keys(&self) -> &MultiKey {
        &self.public_keys
    }

    pub fn signatures(&self) -> &MultiKeySignature {
        &self.signatures
    }

    pub fn verify<T: CryptoHash>(&self, message: &T) -> Result<(), AuthenticationError> {
        self.verify_arbitrary_msg(&signing_message(message)?)
    }

    /// Every signer flagged in the bitmap must have signed `message` with the key at its index,
    /// and there must be at least `signatures_required` of them.
    pub fn verify_arbitrary_msg(&self, message: &[u8]) -> Result<(), AuthenticationError> {
        let signatures = &self.signatures.signatures;
        let num_signers = bitmap_count_ones(self.signatures.bitmap) as usize;
        if num_signers != signatures.len() {
            return Err(AuthenticationError::MalformedAuthenticator(format!(
                "bitmap flags {} signers, found {} signatures",
                num_signers,
                signatures.len()
            )));
        }
        let threshold = self.public_keys.signatures_required;
        if signatures.len() < threshold as usize {
            return Err(AuthenticationError::ThresholdNotMet {
                signatures: signatures.len(),
                threshold,
            });
        }
        for (index, signature) in self.signatures.signer_indexes().into_iter().zip(signatures) {
            let public_key = self.public_keys.public_keys.get(index).ok_or_else(|| {
                AuthenticationError::MalformedAuthenticator(format!(
                    "key index {} is out of range for {} keys",
                    index,
                    self.public_keys.len()
                ))
            })?;
            public_key.verify_arbitrary_msg(message, signature)?;
        }
        Ok(())
    }
}

/// A struct that represents an account authentication key. An account's address is the last 32
/// bytes of authentication key used to create it
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AuthenticationKey([u8; AuthenticationKey::LENGTH]);

impl AuthenticationKey {
    /// The number of bytes in an authentication key.
    pub const LENGTH: usize = HashValue::LENGTH;

    /// Create an authentication key from `bytes`
    pub const fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    /// Return an authentication key that is impossible (in expectation) to sign for--useful for
    /// intentionally relinquishing control of an account.
    pub const fn zero() -> Self {
        Self([0; 32])
    }

    /// Create an authentication key from a preimage by taking its sha3 hash
    pub fn from_preimage(public_key_bytes: &[u8], scheme: Scheme) -> AuthenticationKey {
        AuthenticationKey::new(aptos_crypto::derive_authentication_key(
            public_key_bytes,
            scheme,
        ))
    }

    /// Create an authentication key from an Ed25519 public key
    pub fn ed25519(public_key: &Ed25519PublicKey) -> AuthenticationKey {
        AuthenticationKey::new(public_key.authentication_key())
    }

    /// Create an authentication key from a MultiEd25519 public key
    pub fn multi_ed25519(public_key: &MultiEd25519PublicKey) -> Self {
        AuthenticationKey::new(public_key.authentication_key())
    }

    /// Create an authentication key for a single-key account
    pub fn any_key(public_key: AnyPublicKey) -> AuthenticationKey {
        Self::from_preimage(&public_key.to_bcs_bytes(), Scheme::SingleKey)
    }

    /// Create an authentication key for a multi-key account
    pub fn multi_key(public_keys: MultiKey) -> AuthenticationKey {
        Self::from_preimage(&public_keys.to_bytes(), Scheme::MultiKey)
    }

    /// Return an address derived from the last `AccountAddress::LENGTH` bytes of this
    /// authentication key.
    pub fn account_address(&self) -> AccountAddress {
        AccountAddress::new(self.0)
    }

    /// Construct a vector from this authentication key
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl TryFrom<&[u8]> for AuthenticationKey {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> std::result::Result<AuthenticationKey, CryptoMaterialError> {
        <[u8; Self::LENGTH]>::try_from(bytes)
            .map_err(|_| CryptoMaterialError::WrongLengthError)
            .map(Self)
    }
}

impl TryFrom<Vec<u8>> for AuthenticationKey {
    type Error = CryptoMaterialError;

    fn try_from(bytes: Vec<u8>) -> std::result::Result<AuthenticationKey, CryptoMaterialError> {
        AuthenticationKey::try_from(&bytes[..])
    }
}

impl FromStr for AuthenticationKey {
    type Err = CryptoMaterialError;

    fn from_str(s: &str) -> std::result::Result<Self, CryptoMaterialError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.is_empty() {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        let bytes_out = hex::decode(s).map_err(|_| CryptoMaterialError::DeserializationError)?;
        AuthenticationKey::try_from(bytes_out.as_slice())
    }
}

impl AsRef<[u8]> for AuthenticationKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::LowerHex for AuthenticationKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Display for AuthenticationKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Forward to the LowerHex impl with a "0x" prepended (the # flag).
        write!(f, "{:#x}", self)
    }
}

impl Serialize for AuthenticationKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_newtype_struct("AuthenticationKey", &self.0)
        }
    }
}

impl<'de> Deserialize<'de> for AuthenticationKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = <String>::deserialize(deserializer)?;
            AuthenticationKey::from_str(&s).map_err(serde::de::Error::custom)
        } else {
            #[derive(Deserialize)]
            #[serde(rename = "AuthenticationKey")]
            struct Value([u8; AuthenticationKey::LENGTH]);

            let value = Value::deserialize(deserializer)?;
            Ok(AuthenticationKey::new(value.0))
        }
    }
}
