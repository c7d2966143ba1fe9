// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use serde::{de, ser};
use std::fmt;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("not enough bytes: needed {needed}, {remaining} remaining")]
    NotEnoughBytes { needed: usize, remaining: usize },
    #[error("remaining bytes: {0} left after the top-level value")]
    RemainingBytes(usize),
    #[error("invalid bool: expected 0x00 or 0x01, found {0:#04x}")]
    InvalidBool(u8),
    #[error("bad uleb128: {0}")]
    BadUleb128(&'static str),
    #[error("invalid option tag: expected 0x00 or 0x01, found {0:#04x}")]
    InvalidOptionTag(u8),
    #[error("invalid UTF-8 in string")]
    Utf8,
    #[error("sequence length {0} exceeds the maximum")]
    ExceededMaxLen(usize),
    #[error("exceeded max container depth while entering: {0}")]
    ExceededContainerDepthLimit(&'static str),
    #[error("sequences must have a known length")]
    MissingLen,
    #[error("map keys are not in canonical order")]
    NonCanonicalMap,
    #[error("not supported by BCS: {0}")]
    NotSupported(&'static str),
    #[error("io error: {0}")]
    Io(String),
    #[error("{0}")]
    Custom(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}
