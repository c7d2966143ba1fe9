// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use hex::FromHex;
use rand::{rngs::OsRng, Rng};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// A struct that represents an account address.
#[derive(Ord, PartialOrd, Eq, PartialEq, Hash, Clone, Copy)]
pub struct AccountAddress([u8; AccountAddress::LENGTH]);

impl AccountAddress {
    pub const fn new(address: [u8; Self::LENGTH]) -> Self {
        Self(address)
    }

    /// The number of bytes in an address.
    pub const LENGTH: usize = 32;

    /// Hex address: 0x0
    pub const ZERO: Self = Self::from_suffix(0x0);
    /// Hex address: 0x1
    pub const ONE: Self = Self::from_suffix(0x1);
    /// Hex address: 0x2
    pub const TWO: Self = Self::from_suffix(0x2);
    /// Hex address: 0x3
    pub const THREE: Self = Self::from_suffix(0x3);
    /// Hex address: 0x4
    pub const FOUR: Self = Self::from_suffix(0x4);

    /// Max address: 0xff....
    pub const MAX_ADDRESS: Self = Self([0xFF; Self::LENGTH]);

    const fn from_suffix(suffix: u8) -> AccountAddress {
        let mut addr = [0u8; AccountAddress::LENGTH];
        addr[AccountAddress::LENGTH - 1] = suffix;
        AccountAddress(addr)
    }

    pub fn random() -> Self {
        let mut rng = OsRng;
        let buf: [u8; Self::LENGTH] = rng.r#gen();
        Self(buf)
    }

    /// Special addresses are the ones with the first 31 bytes zero and the last byte in
    /// `0x0..=0xf`. They are the addresses reserved for the framework.
    pub fn is_special(&self) -> bool {
        self.0[..Self::LENGTH - 1].iter().all(|b| *b == 0) && self.0[Self::LENGTH - 1] < 0x10
    }

    /// The canonical textual form: `0x<last nibble>` for special addresses, the long form
    /// otherwise.
    pub fn to_standard_string(&self) -> String {
        if self.is_special() {
            self.to_short_string()
        } else {
            self.to_hex_literal()
        }
    }

    /// `0x` followed by all 64 hex characters.
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// `0x` followed by the hex characters with leading zeros trimmed (at least one digit).
    pub fn to_short_string(&self) -> String {
        let hex = self.to_hex();
        let trimmed = hex.trim_start_matches('0');
        if trimmed.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{}", trimmed)
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex string with an optional `0x` prefix. Odd-length and short inputs are left
    /// padded with zeros, so `"0x1"`, `"1"` and `"0x00..01"` all name the same address.
    pub fn from_str_relaxed(s: &str) -> Result<Self, AccountAddressParseError> {
        let hex = s.strip_prefix("0x").unwrap_or(s);
        if hex.is_empty() {
            return Err(AccountAddressParseError::TooShort);
        }
        if hex.len() > Self::LENGTH * 2 {
            return Err(AccountAddressParseError::TooLong(hex.len()));
        }
        let mut padded = String::with_capacity(Self::LENGTH * 2);
        padded.extend(std::iter::repeat('0').take(Self::LENGTH * 2 - hex.len()));
        padded.push_str(hex);
        <[u8; Self::LENGTH]>::from_hex(&padded)
            .map_err(|_| AccountAddressParseError::InvalidHex(s.to_string()))
            .map(Self)
    }

    /// Requires the `0x` prefix.
    pub fn from_hex_literal(literal: &str) -> Result<Self, AccountAddressParseError> {
        if !literal.starts_with("0x") {
            return Err(AccountAddressParseError::MissingPrefix);
        }
        Self::from_str_relaxed(literal)
    }

    pub fn from_hex<T: AsRef<[u8]>>(hex: T) -> Result<Self, AccountAddressParseError> {
        <[u8; Self::LENGTH]>::from_hex(hex.as_ref())
            .map_err(|_| {
                AccountAddressParseError::InvalidHex(
                    String::from_utf8_lossy(hex.as_ref()).into_owned(),
                )
            })
            .map(Self)
    }

    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Self, AccountAddressParseError> {
        let bytes = bytes.as_ref();
        <[u8; Self::LENGTH]>::try_from(bytes)
            .map_err(|_| AccountAddressParseError::InvalidLength(bytes.len()))
            .map(Self)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn into_bytes(self) -> [u8; Self::LENGTH] {
        self.0
    }
}

impl AsRef<[u8]> for AccountAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::Deref for AccountAddress {
    type Target = [u8; Self::LENGTH];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_standard_string())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl fmt::LowerHex for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl From<[u8; AccountAddress::LENGTH]> for AccountAddress {
    fn from(bytes: [u8; AccountAddress::LENGTH]) -> Self {
        Self::new(bytes)
    }
}

impl TryFrom<&[u8]> for AccountAddress {
    type Error = AccountAddressParseError;

    fn try_from(bytes: &[u8]) -> Result<AccountAddress, AccountAddressParseError> {
        Self::from_bytes(bytes)
    }
}

impl From<AccountAddress> for [u8; AccountAddress::LENGTH] {
    fn from(addr: AccountAddress) -> Self {
        addr.0
    }
}

impl FromStr for AccountAddress {
    type Err = AccountAddressParseError;

    fn from_str(s: &str) -> Result<Self, AccountAddressParseError> {
        Self::from_str_relaxed(s)
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = <String>::deserialize(deserializer)?;
            AccountAddress::from_str(&s).map_err(D::Error::custom)
        } else {
            // In order to preserve the Serde data model and help analysis tools,
            // make sure to wrap our value in a container with the same name
            // as the original type.
            #[derive(::serde::Deserialize)]
            #[serde(rename = "AccountAddress")]
            struct Value([u8; AccountAddress::LENGTH]);

            let value = Value::deserialize(deserializer)?;
            Ok(AccountAddress::new(value.0))
        }
    }
}

impl Serialize for AccountAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            self.to_standard_string().serialize(serializer)
        } else {
            // See comment in deserialize.
            serializer.serialize_newtype_struct("AccountAddress", &self.0)
        }
    }
}

#[cfg(any(test, feature = "fuzzing"))]
impl proptest::arbitrary::Arbitrary for AccountAddress {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        use proptest::prelude::*;

        prop_oneof![
            (0u8..0x10).prop_map(AccountAddress::from_suffix),
            any::<[u8; AccountAddress::LENGTH]>().prop_map(AccountAddress::new),
        ]
        .boxed()
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AccountAddressParseError {
    #[error("address is too short: at least one hex digit is required")]
    TooShort,
    #[error("address is too long: {0} hex digits, at most 64 are allowed")]
    TooLong(usize),
    #[error("address contains invalid hex: {0}")]
    InvalidHex(String),
    #[error("address literal must start with 0x")]
    MissingPrefix,
    #[error("address must be {} bytes, got {0}", AccountAddress::LENGTH)]
    InvalidLength(usize),
}
