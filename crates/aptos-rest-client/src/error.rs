// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::state::State;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The error codes the Aptos API reports in its JSON error bodies.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AptosErrorCode {
    AccountNotFound,
    ResourceNotFound,
    ModuleNotFound,
    StructFieldNotFound,
    VersionNotFound,
    TransactionNotFound,
    TableItemNotFound,
    BlockNotFound,
    StateValueNotFound,
    VersionPruned,
    BlockPruned,
    InvalidInput,
    InvalidTransactionUpdate,
    SequenceNumberTooOld,
    VmError,
    RejectedByFilter,
    HealthCheckFailed,
    MempoolIsFull,
    InternalError,
    WebFrameworkError,
    BcsNotSupported,
    ApiDisabled,
}

impl AptosErrorCode {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound
                | Self::ResourceNotFound
                | Self::ModuleNotFound
                | Self::StructFieldNotFound
                | Self::VersionNotFound
                | Self::TransactionNotFound
                | Self::TableItemNotFound
                | Self::BlockNotFound
                | Self::StateValueNotFound
        )
    }
}

/// The JSON body of a failed API call.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AptosError {
    pub message: String,
    pub error_code: AptosErrorCode,
    pub vm_error_code: Option<u64>,
}

impl fmt::Display for AptosError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.error_code, self.message)?;
        if let Some(vm_error_code) = self.vm_error_code {
            write!(f, " (vm error code {})", vm_error_code)?;
        }
        Ok(())
    }
}

/// The request a failed call was made for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operation {
    pub method: Method,
    pub endpoint: String,
}

impl Operation {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)
    }
}

#[derive(Debug)]
pub struct AptosErrorResponse {
    pub operation: Operation,
    pub status_code: StatusCode,
    pub error: AptosError,
    pub state: Option<State>,
}

impl fmt::Display for AptosErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} returned {}: {}", self.operation, self.status_code, self.error)
    }
}

#[derive(Debug, Error)]
pub enum RestError {
    #[error("API error {0}")]
    Api(Box<AptosErrorResponse>),
    #[error("HTTP error {status_code} from {operation}: {body}")]
    Http {
        operation: Operation,
        status_code: StatusCode,
        body: String,
    },
    #[error("request {operation} failed: {source}")]
    Request {
        operation: Operation,
        source: reqwest::Error,
    },
    #[error("BCS ser/de error {0}")]
    Bcs(#[from] aptos_bcs::Error),
    #[error("JSON ser/de error {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL Parse error {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("Timeout waiting for {0}")]
    Timeout(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("Unknown error {0}")]
    Unknown(#[from] anyhow::Error),
}

impl RestError {
    pub fn request(operation: Operation, source: reqwest::Error) -> Self {
        Self::Request { operation, source }
    }

    /// The HTTP status of the failed call, if the node answered.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Api(response) => Some(response.status_code),
            Self::Http { status_code, .. } => Some(*status_code),
            Self::Request { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<AptosErrorCode> {
        match self {
            Self::Api(response) => Some(response.error.error_code),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<&Operation> {
        match self {
            Self::Api(response) => Some(&response.operation),
            Self::Http { operation, .. } | Self::Request { operation, .. } => Some(operation),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.error_code().is_some_and(|code| code.is_not_found())
            || self.status_code() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Request { source, .. } => source.is_timeout(),
            _ => self.status_code().is_some_and(|status_code| {
                status_code == StatusCode::REQUEST_TIMEOUT
                    || status_code == StatusCode::GATEWAY_TIMEOUT
            }),
        }
    }
}

#[derive(Debug, Error)]
#[error("{kind} error: {inner}")]
pub struct FaucetClientError {
    kind: FaucetErrorKind,
    inner: anyhow::Error,
}

impl FaucetClientError {
    pub fn request<E: Into<anyhow::Error>>(e: E) -> Self {
        Self {
            kind: FaucetErrorKind::Request,
            inner: e.into(),
        }
    }

    pub fn decode<E: Into<anyhow::Error>>(e: E) -> Self {
        Self {
            kind: FaucetErrorKind::Decode,
            inner: e.into(),
        }
    }

    pub fn status(status_code: StatusCode, body: String) -> Self {
        Self {
            kind: FaucetErrorKind::Status(status_code),
            inner: anyhow::anyhow!(body),
        }
    }

    pub fn kind(&self) -> FaucetErrorKind {
        self.kind
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FaucetErrorKind {
    Request,
    Decode,
    Status(StatusCode),
}

impl fmt::Display for FaucetErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Decode => write!(f, "decode"),
            Self::Status(status_code) => write!(f, "status {}", status_code),
        }
    }
}

impl From<FaucetClientError> for RestError {
    fn from(e: FaucetClientError) -> Self {
        Self::Unknown(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"message":"Transaction not found by Transaction hash(0x1)","error_code":"transaction_not_found","vm_error_code":null}"#;
        let error: AptosError = serde_json::from_str(body).unwrap();
        assert_eq!(error.error_code, AptosErrorCode::TransactionNotFound);
        assert!(error.error_code.is_not_found());

        let body = r#"{"message":"old","error_code":"sequence_number_too_old","vm_error_code":3}"#;
        let error: AptosError = serde_json::from_str(body).unwrap();
        assert_eq!(error.error_code, AptosErrorCode::SequenceNumberTooOld);
        assert_eq!(error.to_string(), "SequenceNumberTooOld: old (vm error code 3)");
    }

    #[test]
    fn test_error_accessors() {
        let error = RestError::Http {
            operation: Operation::new(Method::GET, "/v1/accounts/0x1"),
            status_code: StatusCode::GATEWAY_TIMEOUT,
            body: "upstream".to_string(),
        };
        assert!(error.is_timeout());
        assert!(!error.is_not_found());
        assert_eq!(
            error.operation().unwrap().to_string(),
            "GET /v1/accounts/0x1"
        );
    }
}
