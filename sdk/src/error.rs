// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use aptos_crypto::{CryptoMaterialError, HashValue};
use aptos_rest_client::error::{AptosErrorCode, RestError};
use aptos_types::transaction::authenticator::AuthenticationError;
use move_core_types::{
    account_address::AccountAddressParseError, identifier::InvalidIdentifier,
    parser::TypeTagParseError,
};
use std::fmt;
use thiserror::Error;

pub type Result<T, E = SdkError> = std::result::Result<T, E>;

/// The stable classification every [`SdkError`] reports through [`SdkError::kind`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    RateLimited,
    Timeout,
    Unavailable,
    Internal,
    InvalidAddress,
    InvalidTypeTag,
    InvalidBcs,
    SerializationError,
    InvalidSignature,
    KeyTypeMismatch,
    ThresholdNotMet,
    SequenceMismatch,
    TransactionExpired,
    TransactionFailed,
    Cancelled,
}

impl ErrorKind {
    /// Classifies an HTTP status the node answered with.
    pub fn from_status_code(status_code: u16) -> Self {
        match status_code {
            400 => Self::InvalidArgument,
            404 => Self::NotFound,
            408 | 504 => Self::Timeout,
            429 => Self::RateLimited,
            503 => Self::Unavailable,
            _ => Self::Internal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Rest(#[from] RestError),
    #[error("BCS error: {0}")]
    Bcs(#[from] aptos_bcs::Error),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoMaterialError),
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
    #[error(transparent)]
    Address(#[from] AccountAddressParseError),
    #[error(transparent)]
    TypeTag(#[from] TypeTagParseError),
    #[error(transparent)]
    Identifier(#[from] InvalidIdentifier),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("signing failed: {0}")]
    Signing(anyhow::Error),
    #[error("transaction {0} expired before it was committed")]
    TransactionExpired(HashValue),
    #[error("transaction {hash} failed: {vm_status}")]
    TransactionFailed { hash: HashValue, vm_status: String },
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("error reading config {0}: {1}")]
    ConfigIo(String, #[source] std::io::Error),
    #[error("error parsing config: {0}")]
    ConfigYaml(#[from] serde_yaml::Error),
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Rest(e) => rest_error_kind(e),
            Self::Bcs(e) => bcs_error_kind(e),
            Self::Crypto(e) => crypto_error_kind(e),
            Self::Authentication(e) => match e {
                AuthenticationError::KeyTypeMismatch { .. } => ErrorKind::KeyTypeMismatch,
                AuthenticationError::ThresholdNotMet { .. } => ErrorKind::ThresholdNotMet,
                AuthenticationError::InvalidSignature(_) => ErrorKind::InvalidSignature,
                AuthenticationError::MalformedAuthenticator(_) => ErrorKind::InvalidArgument,
                AuthenticationError::CryptoMaterial(e) => crypto_error_kind(e),
            },
            Self::Address(_) => ErrorKind::InvalidAddress,
            Self::TypeTag(TypeTagParseError::InvalidAddress(_)) => ErrorKind::InvalidAddress,
            Self::TypeTag(_) => ErrorKind::InvalidTypeTag,
            Self::Identifier(_) | Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Config(_) | Self::ConfigIo(..) | Self::ConfigYaml(_) => {
                ErrorKind::InvalidArgument
            },
            Self::Signing(_) | Self::UnexpectedResponse(_) => ErrorKind::Internal,
            Self::TransactionExpired(_) => ErrorKind::TransactionExpired,
            Self::TransactionFailed { .. } => ErrorKind::TransactionFailed,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }

    pub fn signing<E: Into<anyhow::Error>>(e: E) -> Self {
        Self::Signing(e.into())
    }
}

fn rest_error_kind(error: &RestError) -> ErrorKind {
    match error {
        RestError::Cancelled => return ErrorKind::Cancelled,
        RestError::Bcs(_) => return ErrorKind::SerializationError,
        RestError::UrlParse(_) => return ErrorKind::InvalidArgument,
        RestError::Json(_) | RestError::Unknown(_) => return ErrorKind::Internal,
        RestError::Request { source, .. } if source.is_connect() => {
            return ErrorKind::Unavailable;
        },
        _ => {},
    }
    if error.is_timeout() {
        return ErrorKind::Timeout;
    }
    match error.error_code() {
        Some(AptosErrorCode::SequenceNumberTooOld) => return ErrorKind::SequenceMismatch,
        Some(AptosErrorCode::InvalidInput) => return ErrorKind::InvalidArgument,
        Some(code) if code.is_not_found() => return ErrorKind::NotFound,
        _ => {},
    }
    error
        .status_code()
        .map_or(ErrorKind::Internal, |status_code| {
            ErrorKind::from_status_code(status_code.as_u16())
        })
}

fn bcs_error_kind(error: &aptos_bcs::Error) -> ErrorKind {
    match error {
        aptos_bcs::Error::NotEnoughBytes { .. }
        | aptos_bcs::Error::RemainingBytes(_)
        | aptos_bcs::Error::InvalidBool(_)
        | aptos_bcs::Error::BadUleb128(_)
        | aptos_bcs::Error::InvalidOptionTag(_)
        | aptos_bcs::Error::Utf8
        | aptos_bcs::Error::NonCanonicalMap => ErrorKind::InvalidBcs,
        _ => ErrorKind::SerializationError,
    }
}

fn crypto_error_kind(error: &CryptoMaterialError) -> ErrorKind {
    match error {
        CryptoMaterialError::SerializationError => ErrorKind::SerializationError,
        CryptoMaterialError::DeserializationError => ErrorKind::InvalidBcs,
        _ => ErrorKind::InvalidSignature,
    }
}
