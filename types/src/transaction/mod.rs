// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    account_address::AccountAddress,
    chain_id::ChainId,
    transaction::authenticator::{
        AccountAuthenticator, AnyPublicKey, AnySignature, AuthenticationError,
        SingleKeyAuthenticator, TransactionAuthenticator,
    },
};
use aptos_crypto::{
    ed25519::{Ed25519PrivateKey, Ed25519PublicKey, Ed25519Signature},
    hash::{signing_message, CryptoHash},
    multi_ed25519::{MultiEd25519PublicKey, MultiEd25519Signature},
    secp256k1_ecdsa::{
        Secp256k1EcdsaPrivateKey, Secp256k1EcdsaPublicKey, Secp256k1EcdsaSignature,
    },
    traits::MessageSigner,
    CryptoMaterialError, HashValue,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{self, Debug},
    ops::Deref,
};

pub mod authenticator;
mod multisig;
mod script;
pub mod signer;

pub use move_core_types::transaction_argument::TransactionArgument;
pub use multisig::{Multisig, MultisigTransactionPayload};
pub use script::{EntryFunction, Script, ViewFunction};
pub use signer::TransactionSigner;

/// The unsigned body of a user transaction. Field order is the BCS layout every signer
/// hashes, so it must not change.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    sender: AccountAddress,
    /// Has to equal the sender's on-chain sequence number when the transaction executes.
    sequence_number: u64,
    payload: TransactionPayload,
    max_gas_amount: u64,
    gas_unit_price: u64,
    /// Unix seconds. The chain discards the transaction once its clock reaches this value.
    expiration_timestamp_secs: u64,
    chain_id: ChainId,
}

impl CryptoHash for RawTransaction {
    const DOMAIN_NAME: &'static str = "RawTransaction";
}

impl RawTransaction {
    pub fn new(
        sender: AccountAddress,
        sequence_number: u64,
        payload: TransactionPayload,
        max_gas_amount: u64,
        gas_unit_price: u64,
        expiration_timestamp_secs: u64,
        chain_id: ChainId,
    ) -> Self {
        RawTransaction {
            sender,
            sequence_number,
            payload,
            max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs,
            chain_id,
        }
    }

    /// Create a new `RawTransaction` with an entry function.
    pub fn new_entry_function(
        sender: AccountAddress,
        sequence_number: u64,
        entry_function: EntryFunction,
        max_gas_amount: u64,
        gas_unit_price: u64,
        expiration_timestamp_secs: u64,
        chain_id: ChainId,
    ) -> Self {
        Self::new(
            sender,
            sequence_number,
            TransactionPayload::EntryFunction(entry_function),
            max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs,
            chain_id,
        )
    }

    /// Create a new `RawTransaction` executing a payload on behalf of a multisig account.
    pub fn new_multisig(
        sender: AccountAddress,
        sequence_number: u64,
        multisig: Multisig,
        max_gas_amount: u64,
        gas_unit_price: u64,
        expiration_timestamp_secs: u64,
        chain_id: ChainId,
    ) -> Self {
        Self::new(
            sender,
            sequence_number,
            TransactionPayload::Multisig(multisig),
            max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs,
            chain_id,
        )
    }

    /// Single Ed25519 signature over the raw transaction's signing message.
    pub fn sign(
        self,
        private_key: &Ed25519PrivateKey,
        public_key: Ed25519PublicKey,
    ) -> Result<SignatureCheckedTransaction, CryptoMaterialError> {
        let signature = private_key.sign(&self)?;
        Ok(SignatureCheckedTransaction(SignedTransaction::new(
            self, public_key, signature,
        )))
    }

    /// Secp256k1 signature, carried in a single-key authenticator.
    pub fn sign_secp256k1_ecdsa(
        self,
        private_key: &Secp256k1EcdsaPrivateKey,
        public_key: Secp256k1EcdsaPublicKey,
    ) -> Result<SignatureCheckedTransaction, CryptoMaterialError> {
        let signature = private_key.sign(&self)?;
        Ok(SignatureCheckedTransaction(
            SignedTransaction::new_secp256k1_ecdsa(self, public_key, signature),
        ))
    }

    /// Every party signs the same [`RawTransactionWithData::MultiAgent`] message.
    pub fn sign_multi_agent(
        self,
        sender: &dyn TransactionSigner,
        secondary_signers: &[&dyn TransactionSigner],
    ) -> Result<SignatureCheckedTransaction, AuthenticationError> {
        let secondary_signer_addresses: Vec<_> =
            secondary_signers.iter().map(|signer| signer.address()).collect();
        let message =
            RawTransactionWithData::new_multi_agent(self, secondary_signer_addresses.clone());
        let sender_authenticator = sender.sign_with_data(&message)?;
        let secondary_authenticators = secondary_signers
            .iter()
            .map(|signer| signer.sign_with_data(&message))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SignatureCheckedTransaction(
            SignedTransaction::new_multi_agent(
                message.into_raw_txn(),
                sender_authenticator,
                secondary_signer_addresses,
                secondary_authenticators,
            ),
        ))
    }

    /// Like [`Self::sign_multi_agent`], with the fee payer's address included in the message
    /// and its signature appended last.
    pub fn sign_fee_payer(
        self,
        sender: &dyn TransactionSigner,
        secondary_signers: &[&dyn TransactionSigner],
        fee_payer: &dyn TransactionSigner,
    ) -> Result<SignatureCheckedTransaction, AuthenticationError> {
        let secondary_signer_addresses: Vec<_> =
            secondary_signers.iter().map(|signer| signer.address()).collect();
        let fee_payer_address = fee_payer.address();
        let message = RawTransactionWithData::new_fee_payer(
            self,
            secondary_signer_addresses.clone(),
            fee_payer_address,
        );
        let sender_authenticator = sender.sign_with_data(&message)?;
        let secondary_authenticators = secondary_signers
            .iter()
            .map(|signer| signer.sign_with_data(&message))
            .collect::<Result<Vec<_>, _>>()?;
        let fee_payer_authenticator = fee_payer.sign_with_data(&message)?;
        Ok(SignatureCheckedTransaction(SignedTransaction::new_fee_payer(
            message.into_raw_txn(),
            sender_authenticator,
            secondary_signer_addresses,
            secondary_authenticators,
            fee_payer_address,
            fee_payer_authenticator,
        )))
    }

    pub fn payload(&self) -> &TransactionPayload {
        &self.payload
    }

    pub fn set_gas_unit_price(&mut self, gas_unit_price: u64) {
        self.gas_unit_price = gas_unit_price;
    }

    pub fn sender(&self) -> AccountAddress {
        self.sender
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn max_gas_amount(&self) -> u64 {
        self.max_gas_amount
    }

    pub fn gas_unit_price(&self) -> u64 {
        self.gas_unit_price
    }

    pub fn expiration_timestamp_secs(&self) -> u64 {
        self.expiration_timestamp_secs
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Return the signing message for creating transaction signature.
    pub fn signing_message(&self) -> Result<Vec<u8>, CryptoMaterialError> {
        signing_message(self)
    }
}

/// The message signed by every party of a multi-agent or fee payer transaction.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum RawTransactionWithData {
    MultiAgent {
        raw_txn: RawTransaction,
        secondary_signer_addresses: Vec<AccountAddress>,
    },
    MultiAgentWithFeePayer {
        raw_txn: RawTransaction,
        secondary_signer_addresses: Vec<AccountAddress>,
        fee_payer_address: AccountAddress,
    },
}

impl CryptoHash for RawTransactionWithData {
    const DOMAIN_NAME: &'static str = "RawTransactionWithData";
}

impl RawTransactionWithData {
    pub fn new_fee_payer(
        raw_txn: RawTransaction,
        secondary_signer_addresses: Vec<AccountAddress>,
        fee_payer_address: AccountAddress,
    ) -> Self {
        Self::MultiAgentWithFeePayer {
            raw_txn,
            secondary_signer_addresses,
            fee_payer_address,
        }
    }

    pub fn new_multi_agent(
        raw_txn: RawTransaction,
        secondary_signer_addresses: Vec<AccountAddress>,
    ) -> Self {
        Self::MultiAgent {
            raw_txn,
            secondary_signer_addresses,
        }
    }

    pub fn raw_txn(&self) -> &RawTransaction {
        match self {
            Self::MultiAgent { raw_txn, .. } | Self::MultiAgentWithFeePayer { raw_txn, .. } => {
                raw_txn
            },
        }
    }

    pub fn into_raw_txn(self) -> RawTransaction {
        match self {
            Self::MultiAgent { raw_txn, .. } | Self::MultiAgentWithFeePayer { raw_txn, .. } => {
                raw_txn
            },
        }
    }

    pub fn secondary_signer_addresses(&self) -> &[AccountAddress] {
        match self {
            Self::MultiAgent {
                secondary_signer_addresses,
                ..
            }
            | Self::MultiAgentWithFeePayer {
                secondary_signer_addresses,
                ..
            } => secondary_signer_addresses,
        }
    }

    pub fn fee_payer_address(&self) -> Option<AccountAddress> {
        match self {
            Self::MultiAgent { .. } => None,
            Self::MultiAgentWithFeePayer {
                fee_payer_address, ..
            } => Some(*fee_payer_address),
        }
    }

    /// Return the signing message every signer of this transaction signs.
    pub fn signing_message(&self) -> Result<Vec<u8>, CryptoMaterialError> {
        signing_message(self)
    }
}

/// Placeholder holding the retired module bundle slot, so later variants keep their
/// BCS discriminants. Never produced by this crate.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct DeprecatedPayload {
    dummy_value: u64,
}

/// What a transaction executes. Variant order is part of the wire format.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum TransactionPayload {
    Script(Script),
    ModuleBundle(DeprecatedPayload),
    /// Calls a published `public entry fun`.
    EntryFunction(EntryFunction),
    /// Executes as a multisig account on behalf of one of its owners.
    Multisig(Multisig),
}

impl TransactionPayload {
    pub fn is_multisig(&self) -> bool {
        matches!(self, Self::Multisig(_))
    }

    pub fn into_entry_function(self) -> Option<EntryFunction> {
        match self {
            Self::EntryFunction(f) => Some(f),
            _ => None,
        }
    }

}

impl From<EntryFunction> for TransactionPayload {
    fn from(entry_function: EntryFunction) -> Self {
        Self::EntryFunction(entry_function)
    }
}

impl From<Script> for TransactionPayload {
    fn from(script: Script) -> Self {
        Self::Script(script)
    }
}

/// A raw transaction together with its authenticator, in the shape posted to
/// `/transactions`. Holding one says nothing about whether the signatures verify; use
/// [`SignedTransaction::check_signature`] to get a [`SignatureCheckedTransaction`].
#[derive(Clone, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    raw_txn: RawTransaction,
    authenticator: TransactionAuthenticator,
    #[serde(skip)]
    committed_hash: OnceCell<HashValue>,
}

// The hash cache is not part of the value.
impl PartialEq for SignedTransaction {
    fn eq(&self, other: &Self) -> bool {
        self.raw_txn == other.raw_txn && self.authenticator == other.authenticator
    }
}

/// Proof that the wrapped transaction's signatures verified.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureCheckedTransaction(SignedTransaction);

impl SignatureCheckedTransaction {
    pub fn into_inner(self) -> SignedTransaction {
        self.0
    }

    pub fn into_raw_transaction(self) -> RawTransaction {
        self.0.into_raw_transaction()
    }
}

impl Deref for SignatureCheckedTransaction {
    type Target = SignedTransaction;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Debug for SignedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SignedTransaction {{ \n \
             {{ raw_txn: {:#?}, \n \
             authenticator: {:#?}, \n \
             }} \n \
             }}",
            self.raw_txn, self.authenticator
        )
    }
}

impl SignedTransaction {
    pub fn new_signed_transaction(
        raw_txn: RawTransaction,
        authenticator: TransactionAuthenticator,
    ) -> SignedTransaction {
        SignedTransaction {
            raw_txn,
            authenticator,
            committed_hash: OnceCell::new(),
        }
    }

    pub fn new(
        raw_txn: RawTransaction,
        public_key: Ed25519PublicKey,
        signature: Ed25519Signature,
    ) -> SignedTransaction {
        let authenticator = TransactionAuthenticator::ed25519(public_key, signature);
        Self::new_signed_transaction(raw_txn, authenticator)
    }

    pub fn new_fee_payer(
        raw_txn: RawTransaction,
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
        fee_payer_address: AccountAddress,
        fee_payer_signer: AccountAuthenticator,
    ) -> Self {
        let authenticator = TransactionAuthenticator::fee_payer(
            sender,
            secondary_signer_addresses,
            secondary_signers,
            fee_payer_address,
            fee_payer_signer,
        );
        Self::new_signed_transaction(raw_txn, authenticator)
    }

    pub fn new_multisig(
        raw_txn: RawTransaction,
        public_key: MultiEd25519PublicKey,
        signature: MultiEd25519Signature,
    ) -> SignedTransaction {
        let authenticator = TransactionAuthenticator::multi_ed25519(public_key, signature);
        Self::new_signed_transaction(raw_txn, authenticator)
    }

    pub fn new_multi_agent(
        raw_txn: RawTransaction,
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
    ) -> Self {
        let authenticator = TransactionAuthenticator::multi_agent(
            sender,
            secondary_signer_addresses,
            secondary_signers,
        );
        Self::new_signed_transaction(raw_txn, authenticator)
    }

    pub fn new_secp256k1_ecdsa(
        raw_txn: RawTransaction,
        public_key: Secp256k1EcdsaPublicKey,
        signature: Secp256k1EcdsaSignature,
    ) -> SignedTransaction {
        let authenticator = AccountAuthenticator::SingleKey {
            authenticator: SingleKeyAuthenticator::from_parts(
                AnyPublicKey::secp256k1_ecdsa(public_key),
                AnySignature::secp256k1_ecdsa(signature),
            ),
        };
        Self::new_single_sender(raw_txn, authenticator)
    }

    pub fn new_single_sender(
        raw_txn: RawTransaction,
        authenticator: AccountAuthenticator,
    ) -> SignedTransaction {
        Self::new_signed_transaction(
            raw_txn,
            TransactionAuthenticator::single_sender(authenticator),
        )
    }

    pub fn authenticator(&self) -> TransactionAuthenticator {
        self.authenticator.clone()
    }

    pub fn sender(&self) -> AccountAddress {
        self.raw_txn.sender
    }

    pub fn into_raw_transaction(self) -> RawTransaction {
        self.raw_txn
    }

    pub fn raw_transaction_ref(&self) -> &RawTransaction {
        &self.raw_txn
    }

    pub fn sequence_number(&self) -> u64 {
        self.raw_txn.sequence_number
    }

    pub fn chain_id(&self) -> ChainId {
        self.raw_txn.chain_id
    }

    pub fn payload(&self) -> &TransactionPayload {
        &self.raw_txn.payload
    }

    pub fn max_gas_amount(&self) -> u64 {
        self.raw_txn.max_gas_amount
    }

    pub fn gas_unit_price(&self) -> u64 {
        self.raw_txn.gas_unit_price
    }

    pub fn expiration_timestamp_secs(&self) -> u64 {
        self.raw_txn.expiration_timestamp_secs
    }

    pub fn check_signature(self) -> Result<SignatureCheckedTransaction, AuthenticationError> {
        self.authenticator.verify(&self.raw_txn)?;
        Ok(SignatureCheckedTransaction(self))
    }

    pub fn verify_signature(&self) -> Result<(), AuthenticationError> {
        self.authenticator.verify(&self.raw_txn)
    }

    pub fn contains_duplicate_signers(&self) -> bool {
        let mut all_signer_addresses = self.authenticator.secondary_signer_addresses();
        all_signer_addresses.push(self.sender());
        if let Some(fee_payer_address) = self.authenticator.fee_payer_address() {
            all_signer_addresses.push(fee_payer_address);
        }
        let mut s = BTreeSet::new();
        all_signer_addresses.iter().any(|a| !s.insert(*a))
    }

    pub fn is_multi_agent(&self) -> bool {
        matches!(
            self.authenticator,
            TransactionAuthenticator::MultiAgent { .. }
        )
    }

    /// The hash the node reports for this transaction, computed once and cached.
    pub fn committed_hash(&self) -> Result<HashValue, CryptoMaterialError> {
        self.committed_hash
            .get_or_try_init(|| Transaction::UserTransaction(self.clone()).hash())
            .copied()
    }

    /// The BCS bytes posted to the submission endpoints.
    pub fn to_bcs_bytes(&self) -> Result<Vec<u8>, aptos_bcs::Error> {
        aptos_bcs::to_bytes(self)
    }
}

/// Envelope hashed to produce a transaction's committed hash. Clients only ever build
/// user transactions, and their variant index of zero is part of the hash.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Transaction {
    UserTransaction(SignedTransaction),
}

impl CryptoHash for Transaction {
    const DOMAIN_NAME: &'static str = "Transaction";
}
