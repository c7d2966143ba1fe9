// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use anyhow::{ensure, format_err, Error, Result};
use serde::{de::Visitor, Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// A registry of named chain IDs
/// Its main purpose is to improve human readability of reserved chain IDs in config files and CLI
/// When signing transactions for such chains, the numerical chain ID should still be used
/// (e.g. MAINNET has numeric chain ID 1, TESTNET has chain ID 2, etc)
#[repr(u8)]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum NamedChain {
    /// Users might accidentally initialize the ChainId field to 0, hence reserving ChainId 0 for accidental
    /// initialization.
    /// MAINNET is the Aptos mainnet production chain and is reserved for 1
    MAINNET = 1,
    // Even though these CHAIN IDs do not correspond to MAINNET, changing them should be avoided since they
    // can break test environments for various organisations.
    TESTNET = 2,
    DEVNET = 3,
    TESTING = 4,
}

impl NamedChain {
    fn str_to_chain_id(string: &str) -> Result<ChainId> {
        let named_chain = NamedChain::from_str(string)?;
        Ok(ChainId::new(named_chain.id()))
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_chain_id(chain_id: &ChainId) -> Result<NamedChain, String> {
        match chain_id.id() {
            1 => Ok(NamedChain::MAINNET),
            2 => Ok(NamedChain::TESTNET),
            3 => Ok(NamedChain::DEVNET),
            4 => Ok(NamedChain::TESTING),
            _ => Err(String::from("Not a named chain!")),
        }
    }
}

impl FromStr for NamedChain {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let named_chain = match string.to_lowercase().as_str() {
            "mainnet" => NamedChain::MAINNET,
            "testnet" => NamedChain::TESTNET,
            "devnet" => NamedChain::DEVNET,
            "testing" => NamedChain::TESTING,
            _ => {
                return Err(format_err!("Not a reserved chain: {:?}", string));
            },
        };
        Ok(named_chain)
    }
}

impl fmt::Display for NamedChain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            NamedChain::MAINNET => "mainnet",
            NamedChain::TESTNET => "testnet",
            NamedChain::DEVNET => "devnet",
            NamedChain::TESTING => "testing",
        })
    }
}

/// Note: u7 in a u8 is uleb-compatible, and any usage of this should be aware
/// that this field maybe updated to be uleb64 in the future
#[derive(Clone, Copy, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ChainId(u8);

/// Accepts either a chain name or a number in config files.
pub fn deserialize_config_chain_id<'de, D>(
    deserializer: D,
) -> std::result::Result<ChainId, D::Error>
where
    D: Deserializer<'de>,
{
    struct ChainIdVisitor;

    impl Visitor<'_> for ChainIdVisitor {
        type Value = ChainId;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("ChainId as string or u8")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            ChainId::from_str(value).map_err(serde::de::Error::custom)
        }

        fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            let id = u8::try_from(value).map_err(serde::de::Error::custom)?;
            if id == 0 {
                return Err(serde::de::Error::custom("cannot have chain ID with 0"));
            }
            Ok(ChainId::new(id))
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            let value = u64::try_from(value).map_err(serde::de::Error::custom)?;
            self.visit_u64(value)
        }
    }

    deserializer.deserialize_any(ChainIdVisitor)
}

impl fmt::Debug for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            NamedChain::from_chain_id(self)
                .map_or_else(|_| self.0.to_string(), |chain| chain.to_string())
        )
    }
}

impl FromStr for ChainId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ensure!(!s.is_empty(), "Cannot create chain ID from empty string");
        NamedChain::str_to_chain_id(s).or_else(|_err| {
            let value = s.parse::<u8>()?;
            ensure!(value > 0, "cannot have chain ID with 0");
            Ok(ChainId::new(value))
        })
    }
}

impl ChainId {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u8 {
        self.0
    }

    pub fn test() -> Self {
        ChainId::new(NamedChain::TESTING.id())
    }

    pub fn mainnet() -> Self {
        ChainId::new(NamedChain::MAINNET.id())
    }

    pub fn testnet() -> Self {
        ChainId::new(NamedChain::TESTNET.id())
    }

    pub fn is_mainnet(&self) -> bool {
        self.0 == NamedChain::MAINNET.id()
    }
}

impl From<u8> for ChainId {
    fn from(id: u8) -> Self {
        ChainId::new(id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_chain_id_from_str() {
        assert!(ChainId::from_str("").is_err());
        assert!(ChainId::from_str("0").is_err());
        assert!(ChainId::from_str("256").is_err());
        assert!(ChainId::from_str("255255").is_err());
        assert_eq!(ChainId::from_str("123").unwrap(), ChainId::new(123));
        assert_eq!(ChainId::from_str("255").unwrap(), ChainId::new(255));
    }

    #[test]
    fn test_named_chain_ids() {
        assert_eq!(ChainId::from_str("mainnet").unwrap(), ChainId::mainnet());
        assert_eq!(ChainId::from_str("TESTNET").unwrap(), ChainId::testnet());
        assert_eq!(ChainId::from_str("testing").unwrap(), ChainId::test());
        assert_eq!(ChainId::from_str("4").unwrap(), ChainId::test());
        assert_eq!(ChainId::new(3).to_string(), "devnet");
        assert_eq!(ChainId::new(42).to_string(), "42");
        assert!(NamedChain::from_chain_id(&ChainId::new(42)).is_err());
    }

    #[test]
    fn test_chain_id_bcs() {
        assert_eq!(aptos_bcs::to_bytes(&ChainId::new(4)).unwrap(), vec![4]);
    }

    #[test]
    fn test_config_chain_id() {
        #[derive(Deserialize)]
        struct Config {
            #[serde(deserialize_with = "deserialize_config_chain_id")]
            chain_id: ChainId,
        }

        let config: Config = serde_yaml::from_str("chain_id: testnet").unwrap();
        assert_eq!(config.chain_id, ChainId::testnet());
        let config: Config = serde_yaml::from_str("chain_id: 35").unwrap();
        assert_eq!(config.chain_id, ChainId::new(35));
        assert!(serde_yaml::from_str::<Config>("chain_id: 0").is_err());
    }
}
