// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Payloads for the framework entry functions the SDK itself relies on.

use crate::error::SdkError;
use aptos_types::{
    account_address::AccountAddress,
    transaction::{EntryFunction, TransactionPayload},
};
use move_core_types::language_storage::{StructTag, TypeTag};

/// `0x1::aptos_coin::AptosCoin`
pub fn aptos_coin_type() -> Result<TypeTag, SdkError> {
    Ok(TypeTag::Struct(Box::new(StructTag::new(
        AccountAddress::ONE,
        "aptos_coin".parse()?,
        "AptosCoin".parse()?,
        vec![],
    ))))
}

/// `0x1::aptos_account::transfer(to, amount)`, which creates `to` if it does not exist yet.
pub fn aptos_account_transfer(
    to: AccountAddress,
    amount: u64,
) -> Result<TransactionPayload, SdkError> {
    entry_function(
        "aptos_account",
        "transfer",
        vec![],
        vec![aptos_bcs::to_bytes(&to)?, aptos_bcs::to_bytes(&amount)?],
    )
}

/// `0x1::coin::transfer<0x1::aptos_coin::AptosCoin>(to, amount)`
pub fn aptos_coin_transfer(to: AccountAddress, amount: u64) -> Result<TransactionPayload, SdkError> {
    coin_transfer(aptos_coin_type()?, to, amount)
}

/// `0x1::coin::transfer<coin_type>(to, amount)`
pub fn coin_transfer(
    coin_type: TypeTag,
    to: AccountAddress,
    amount: u64,
) -> Result<TransactionPayload, SdkError> {
    entry_function(
        "coin",
        "transfer",
        vec![coin_type],
        vec![aptos_bcs::to_bytes(&to)?, aptos_bcs::to_bytes(&amount)?],
    )
}

/// `0x1::aptos_account::create_account(auth_key)`
pub fn aptos_account_create_account(
    auth_key: AccountAddress,
) -> Result<TransactionPayload, SdkError> {
    entry_function(
        "aptos_account",
        "create_account",
        vec![],
        vec![aptos_bcs::to_bytes(&auth_key)?],
    )
}

fn entry_function(
    module: &str,
    function: &str,
    ty_args: Vec<TypeTag>,
    args: Vec<Vec<u8>>,
) -> Result<TransactionPayload, SdkError> {
    Ok(TransactionPayload::EntryFunction(
        EntryFunction::from_str_parts(AccountAddress::ONE, module, function, ty_args, args)?,
    ))
}
