// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    account_address::AccountAddress,
    identifier::Identifier,
    parser::{parse_module_id, parse_struct_tag, parse_type_tag, TypeTagParseError},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

pub const CODE_TAG: u8 = 0;
pub const RESOURCE_TAG: u8 = 1;

/// Hex address: 0x1
pub const CORE_CODE_ADDRESS: AccountAddress = AccountAddress::ONE;

/// A Move type, as it appears in type arguments of entry functions and scripts.
///
/// Variants are encoded in BCS by their position in this enum, so the order is part of the wire
/// format and new variants may only be appended.
#[derive(Serialize, Deserialize, Debug, PartialEq, Hash, Eq, Clone, PartialOrd, Ord)]
pub enum TypeTag {
    // alias for compatibility with old json serialized data.
    #[serde(rename = "bool", alias = "Bool")]
    Bool,
    #[serde(rename = "u8", alias = "U8")]
    U8,
    #[serde(rename = "u64", alias = "U64")]
    U64,
    #[serde(rename = "u128", alias = "U128")]
    U128,
    #[serde(rename = "address", alias = "Address")]
    Address,
    #[serde(rename = "signer", alias = "Signer")]
    Signer,
    #[serde(rename = "vector", alias = "Vector")]
    Vector(Box<TypeTag>),
    #[serde(rename = "struct", alias = "Struct")]
    Struct(Box<StructTag>),

    // NOTE: Added in bytecode version v6, do not reorder!
    #[serde(rename = "u16", alias = "U16")]
    U16,
    #[serde(rename = "u32", alias = "U32")]
    U32,
    #[serde(rename = "u256", alias = "U256")]
    U256,

    /// A type parameter of the enclosing function, printed as `T<index>`.
    #[serde(rename = "generic", alias = "Generic")]
    Generic(u16),
    #[serde(rename = "reference", alias = "Reference")]
    Reference(Box<TypeTag>),
}

impl TypeTag {
    pub fn vector(element: TypeTag) -> TypeTag {
        TypeTag::Vector(Box::new(element))
    }

    pub fn reference(inner: TypeTag) -> TypeTag {
        TypeTag::Reference(Box::new(inner))
    }

    /// The canonical string form, e.g. `vector<0x1::string::String>`.
    pub fn to_canonical_string(&self) -> String {
        self.to_string()
    }

    pub fn struct_tag(&self) -> Option<&StructTag> {
        match self {
            TypeTag::Struct(struct_tag) => Some(struct_tag.as_ref()),
            _ => None,
        }
    }

    /// Number of nested type tags, counting this one.
    pub fn depth(&self) -> usize {
        match self {
            TypeTag::Vector(inner) | TypeTag::Reference(inner) => 1 + inner.depth(),
            TypeTag::Struct(struct_tag) => {
                1 + struct_tag
                    .type_args
                    .iter()
                    .map(TypeTag::depth)
                    .max()
                    .unwrap_or(0)
            },
            _ => 1,
        }
    }
}

impl FromStr for TypeTag {
    type Err = TypeTagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_type_tag(s)
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            TypeTag::Struct(s) => write!(f, "{}", s),
            TypeTag::Vector(ty) => write!(f, "vector<{}>", ty),
            TypeTag::Reference(ty) => write!(f, "&{}", ty),
            TypeTag::Generic(index) => write!(f, "T{}", index),
            TypeTag::U8 => write!(f, "u8"),
            TypeTag::U16 => write!(f, "u16"),
            TypeTag::U32 => write!(f, "u32"),
            TypeTag::U64 => write!(f, "u64"),
            TypeTag::U128 => write!(f, "u128"),
            TypeTag::U256 => write!(f, "u256"),
            TypeTag::Address => write!(f, "address"),
            TypeTag::Signer => write!(f, "signer"),
            TypeTag::Bool => write!(f, "bool"),
        }
    }
}

impl From<StructTag> for TypeTag {
    fn from(t: StructTag) -> TypeTag {
        TypeTag::Struct(Box::new(t))
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Hash, Eq, Clone, PartialOrd, Ord)]
pub struct StructTag {
    pub address: AccountAddress,
    pub module: Identifier,
    pub name: Identifier,
    // alias for compatibility with old json serialized data.
    #[serde(rename = "type_args", alias = "type_params")]
    pub type_args: Vec<TypeTag>,
}

impl StructTag {
    pub fn new(
        address: AccountAddress,
        module: Identifier,
        name: Identifier,
        type_args: Vec<TypeTag>,
    ) -> Self {
        Self {
            address,
            module,
            name,
            type_args,
        }
    }

    pub fn module_id(&self) -> ModuleId {
        ModuleId::new(self.address, self.module.to_owned())
    }
}

impl FromStr for StructTag {
    type Err = TypeTagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_struct_tag(s)
    }
}

impl Display for StructTag {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}::{}::{}",
            self.address.to_standard_string(),
            self.module,
            self.name
        )?;
        if let Some(first_ty) = self.type_args.first() {
            write!(f, "<")?;
            write!(f, "{}", first_ty)?;
            for ty in self.type_args.iter().skip(1) {
                write!(f, ", {}", ty)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// Represents the initial key into global storage where we first index by the address, and then
/// the struct tag
#[derive(Serialize, Deserialize, Debug, PartialEq, Hash, Eq, Clone, PartialOrd, Ord)]
pub struct ModuleId {
    address: AccountAddress,
    name: Identifier,
}

impl From<ModuleId> for (AccountAddress, Identifier) {
    fn from(module_id: ModuleId) -> Self {
        (module_id.address, module_id.name)
    }
}

impl ModuleId {
    pub fn new(address: AccountAddress, name: Identifier) -> Self {
        ModuleId { address, name }
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    pub fn address(&self) -> &AccountAddress {
        &self.address
    }

    pub fn short_str_lossless(&self) -> String {
        format!("{}::{}", self.address.to_standard_string(), self.name)
    }
}

impl Display for ModuleId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.short_str_lossless())
    }
}

impl FromStr for ModuleId {
    type Err = TypeTagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_module_id(s)
    }
}
