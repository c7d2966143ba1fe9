// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

const NUM_BYTES: usize = 32;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("invalid u256 literal '{0}'")]
pub struct U256FromStrError(String);

/// Move's `u256`, written in BCS as 32 little-endian bytes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct U256(ethnum::U256);

impl U256 {
    pub const MAX: Self = Self(ethnum::U256::MAX);
    pub const ONE: Self = Self(ethnum::U256::ONE);
    pub const ZERO: Self = Self(ethnum::U256::ZERO);

    pub fn from_le_bytes(bytes: [u8; NUM_BYTES]) -> Self {
        Self(ethnum::U256::from_le_bytes(bytes))
    }

    pub fn to_le_bytes(self) -> [u8; NUM_BYTES] {
        self.0.to_le_bytes()
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        self.0.checked_mul(rhs.0).map(Self)
    }

    pub fn into_inner(self) -> ethnum::U256 {
        self.0
    }
}

impl From<u8> for U256 {
    fn from(n: u8) -> Self {
        Self(ethnum::U256::from(n))
    }
}

impl From<u64> for U256 {
    fn from(n: u64) -> Self {
        Self(ethnum::U256::from(n))
    }
}

impl From<u128> for U256 {
    fn from(n: u128) -> Self {
        Self(ethnum::U256::from(n))
    }
}

impl From<ethnum::U256> for U256 {
    fn from(n: ethnum::U256) -> Self {
        Self(n)
    }
}

impl FromStr for U256 {
    type Err = U256FromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.strip_prefix("0x") {
            Some(hex) => ethnum::U256::from_str_radix(hex, 16),
            None => ethnum::U256::from_str_radix(s, 10),
        };
        parsed
            .map(Self)
            .map_err(|_| U256FromStrError(s.to_string()))
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            self.to_string().serialize(serializer)
        } else {
            // Fixed-size array, encoded without a length prefix.
            self.to_le_bytes().serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            U256::from_str(&s).map_err(D::Error::custom)
        } else {
            <[u8; NUM_BYTES]>::deserialize(deserializer).map(U256::from_le_bytes)
        }
    }
}
