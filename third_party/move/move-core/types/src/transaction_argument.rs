// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{account_address::AccountAddress, u256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed script argument. The variant order is the one-byte tag written before the value.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum TransactionArgument {
    U8(u8),
    U64(u64),
    U128(u128),
    Address(AccountAddress),
    U8Vector(#[serde(with = "serde_bytes")] Vec<u8>),
    Bool(bool),
    // NOTE: Added in bytecode version v6, do not reorder!
    U16(u16),
    U32(u32),
    U256(u256::U256),
}

impl fmt::Display for TransactionArgument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransactionArgument::Bool(boolean) => write!(f, "{{BOOL: {}}}", boolean),
            TransactionArgument::U8(value) => write!(f, "{{U8: {}}}", value),
            TransactionArgument::U16(value) => write!(f, "{{U16: {}}}", value),
            TransactionArgument::U32(value) => write!(f, "{{U32: {}}}", value),
            TransactionArgument::U64(value) => write!(f, "{{U64: {}}}", value),
            TransactionArgument::U128(value) => write!(f, "{{U128: {}}}", value),
            TransactionArgument::U256(value) => write!(f, "{{U256: {}}}", value),
            TransactionArgument::Address(address) => write!(f, "{{ADDRESS: {:?}}}", address),
            TransactionArgument::U8Vector(vector) => {
                write!(f, "{{U8Vector: 0x{}}}", hex::encode(vector))
            },
        }
    }
}

impl TransactionArgument {
    /// The BCS encoding of the bare value, as an entry function expects its arguments.
    pub fn to_entry_function_arg(&self) -> Result<Vec<u8>, aptos_bcs::Error> {
        match self {
            TransactionArgument::U8(v) => aptos_bcs::to_bytes(v),
            TransactionArgument::U16(v) => aptos_bcs::to_bytes(v),
            TransactionArgument::U32(v) => aptos_bcs::to_bytes(v),
            TransactionArgument::U64(v) => aptos_bcs::to_bytes(v),
            TransactionArgument::U128(v) => aptos_bcs::to_bytes(v),
            TransactionArgument::U256(v) => aptos_bcs::to_bytes(v),
            TransactionArgument::Address(v) => aptos_bcs::to_bytes(v),
            TransactionArgument::U8Vector(v) => aptos_bcs::to_bytes(v),
            TransactionArgument::Bool(v) => aptos_bcs::to_bytes(v),
        }
    }
}

impl From<bool> for TransactionArgument {
    fn from(b: bool) -> TransactionArgument {
        TransactionArgument::Bool(b)
    }
}

impl From<u64> for TransactionArgument {
    fn from(v: u64) -> TransactionArgument {
        TransactionArgument::U64(v)
    }
}

impl From<AccountAddress> for TransactionArgument {
    fn from(address: AccountAddress) -> TransactionArgument {
        TransactionArgument::Address(address)
    }
}

impl From<Vec<u8>> for TransactionArgument {
    fn from(bytes: Vec<u8>) -> TransactionArgument {
        TransactionArgument::U8Vector(bytes)
    }
}
