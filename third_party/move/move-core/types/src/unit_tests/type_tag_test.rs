// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    account_address::AccountAddress,
    identifier::Identifier,
    language_storage::{ModuleId, StructTag, TypeTag},
    parser::{parse_type_tags, TypeTagParseError, MAX_TYPE_TAG_NESTING},
    transaction_argument::TransactionArgument,
    u256::U256,
};
use claims::{assert_err, assert_matches};
use proptest::{collection::vec, prelude::*};
use std::str::FromStr;

#[test]
fn coin_store_round_trip() {
    let input = "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>";
    let tag = TypeTag::from_str(input).unwrap();
    assert_eq!(tag.to_string(), input);

    let bytes = aptos_bcs::to_bytes(&tag).unwrap();
    // Struct discriminant, address, "coin", "CoinStore", one type argument which is a struct.
    assert_eq!(bytes[0], 7);
    assert_eq!(bytes[33], 4);
    assert_eq!(&bytes[34..38], b"coin");
    assert_eq!(aptos_bcs::from_bytes::<TypeTag>(&bytes).unwrap(), tag);
}

#[test]
fn whitespace_and_long_addresses_normalize() {
    let tag = TypeTag::from_str(
        "0x0000000000000000000000000000000000000000000000000000000000000001::pair::Pair< u64 ,vector< address > >",
    )
    .unwrap();
    assert_eq!(tag.to_string(), "0x1::pair::Pair<u64, vector<address>>");
}

#[test]
fn primitive_discriminants() {
    let cases = [
        ("bool", 0u8),
        ("u8", 1),
        ("u64", 2),
        ("u128", 3),
        ("address", 4),
        ("signer", 5),
        ("u16", 8),
        ("u32", 9),
        ("u256", 10),
    ];
    for (input, discriminant) in cases {
        let tag = TypeTag::from_str(input).unwrap();
        assert_eq!(aptos_bcs::to_bytes(&tag).unwrap(), vec![discriminant]);
    }
    assert_eq!(
        aptos_bcs::to_bytes(&TypeTag::from_str("vector<u8>").unwrap()).unwrap(),
        vec![6, 1]
    );
    assert_eq!(
        aptos_bcs::to_bytes(&TypeTag::from_str("T3").unwrap()).unwrap(),
        vec![11, 3, 0]
    );
    assert_eq!(
        aptos_bcs::to_bytes(&TypeTag::from_str("&signer").unwrap()).unwrap(),
        vec![12, 5]
    );
}

#[test]
fn parse_errors() {
    assert_matches!(
        TypeTag::from_str("u7"),
        Err(TypeTagParseError::UnknownType(_))
    );
    assert_matches!(
        TypeTag::from_str("vector<u8"),
        Err(TypeTagParseError::UnexpectedEnd)
    );
    assert_matches!(
        TypeTag::from_str("u8 u8"),
        Err(TypeTagParseError::UnexpectedToken { .. })
    );
    assert_matches!(
        TypeTag::from_str("0x1::coin"),
        Err(TypeTagParseError::UnexpectedEnd)
    );
    assert_matches!(
        TypeTag::from_str("0x1::1coin::C"),
        Err(TypeTagParseError::UnexpectedToken { .. })
    );
    assert_matches!(
        StructTag::from_str("vector<u8>"),
        Err(TypeTagParseError::NotAStruct(_))
    );
    let deep = format!(
        "{}u8{}",
        "vector<".repeat(MAX_TYPE_TAG_NESTING + 1),
        ">".repeat(MAX_TYPE_TAG_NESTING + 1)
    );
    assert_err!(TypeTag::from_str(&deep));
}

#[test]
fn module_ids_and_lists() {
    let module = ModuleId::from_str("0x1::aptos_account").unwrap();
    assert_eq!(module.address(), &AccountAddress::ONE);
    assert_eq!(module.name().as_str(), "aptos_account");
    assert_eq!(module.to_string(), "0x1::aptos_account");

    let tags = parse_type_tags("u8, 0x1::string::String,vector<bool>").unwrap();
    assert_eq!(tags.len(), 3);
    assert_eq!(tags[1].to_string(), "0x1::string::String");
    assert!(parse_type_tags("").unwrap().is_empty());
}

#[test]
fn script_argument_tags() {
    let args = vec![
        TransactionArgument::U8(1),
        TransactionArgument::U64(1),
        TransactionArgument::U128(1),
        TransactionArgument::Address(AccountAddress::ONE),
        TransactionArgument::U8Vector(vec![1]),
        TransactionArgument::Bool(true),
        TransactionArgument::U16(1),
        TransactionArgument::U32(1),
        TransactionArgument::U256(U256::ONE),
    ];
    for (tag, arg) in args.iter().enumerate() {
        let bytes = aptos_bcs::to_bytes(arg).unwrap();
        assert_eq!(bytes[0] as usize, tag);
        assert_eq!(&bytes[1..], arg.to_entry_function_arg().unwrap().as_slice());
    }
}

fn arb_type_tag() -> impl Strategy<Value = TypeTag> {
    let leaf = prop_oneof![
        Just(TypeTag::Bool),
        Just(TypeTag::U8),
        Just(TypeTag::U16),
        Just(TypeTag::U32),
        Just(TypeTag::U64),
        Just(TypeTag::U128),
        Just(TypeTag::U256),
        Just(TypeTag::Address),
        Just(TypeTag::Signer),
        any::<u16>().prop_map(TypeTag::Generic),
    ];
    leaf.prop_recursive(4, 16, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(TypeTag::vector),
            inner.clone().prop_map(TypeTag::reference),
            (
                any::<AccountAddress>(),
                "[a-z][a-z0-9_]{0,8}",
                "[A-Z][A-Za-z0-9]{0,8}",
                vec(inner, 0..3)
            )
                .prop_map(|(address, module, name, type_args)| {
                    TypeTag::from(StructTag::new(
                        address,
                        Identifier::new(module).unwrap(),
                        Identifier::new(name).unwrap(),
                        type_args,
                    ))
                }),
        ]
    })
}

proptest! {
    #[test]
    fn print_parse_and_bcs_agree(tag in arb_type_tag()) {
        prop_assert_eq!(TypeTag::from_str(&tag.to_string()).unwrap(), tag.clone());
        let bytes = aptos_bcs::to_bytes(&tag).unwrap();
        prop_assert_eq!(aptos_bcs::from_bytes::<TypeTag>(&bytes).unwrap(), tag);
    }
}
