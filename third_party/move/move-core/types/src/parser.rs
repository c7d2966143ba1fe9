// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

//! Parser for the Move type syntax: `u64`, `vector<u8>`, `&signer`, `T0`,
//! `0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>`. Whitespace between tokens is ignored.

use crate::{
    account_address::{AccountAddress, AccountAddressParseError},
    identifier::{self, Identifier, InvalidIdentifier},
    language_storage::{ModuleId, StructTag, TypeTag},
};
use std::{iter::Peekable, vec::IntoIter};
use thiserror::Error;

/// Deepest nesting of `vector<..>`, `&..` and struct type arguments the parser accepts.
pub const MAX_TYPE_TAG_NESTING: usize = 128;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TypeTagParseError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("expected {expected}, found '{found}'")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    #[error("unknown type '{0}'")]
    UnknownType(String),
    #[error("'{0}' is not a struct type")]
    NotAStruct(String),
    #[error("type nesting exceeds {}", MAX_TYPE_TAG_NESTING)]
    TooDeep,
    #[error(transparent)]
    InvalidAddress(#[from] AccountAddressParseError),
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Token {
    Name(String),
    Address(String),
    ColonColon,
    Lt,
    Gt,
    Comma,
    Amp,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Name(s) | Token::Address(s) => s.clone(),
            Token::ColonColon => "::".to_string(),
            Token::Lt => "<".to_string(),
            Token::Gt => ">".to_string(),
            Token::Comma => ",".to_string(),
            Token::Amp => "&".to_string(),
        }
    }
}

fn tokenize(s: &str) -> Result<Vec<Token>, TypeTagParseError> {
    let mut tokens = vec![];
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            },
            '<' | '>' | ',' | '&' => {
                chars.next();
                tokens.push(match c {
                    '<' => Token::Lt,
                    '>' => Token::Gt,
                    ',' => Token::Comma,
                    _ => Token::Amp,
                });
            },
            ':' => {
                chars.next();
                match chars.next() {
                    Some(':') => tokens.push(Token::ColonColon),
                    Some(other) => return Err(TypeTagParseError::UnexpectedChar(other)),
                    None => return Err(TypeTagParseError::UnexpectedEnd),
                }
            },
            c if c.is_ascii_digit() => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Address(literal));
            },
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if identifier::is_valid_identifier_char(d) {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(name));
            },
            other => return Err(TypeTagParseError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Peekable<IntoIter<Token>>,
}

impl Parser {
    fn new(s: &str) -> Result<Self, TypeTagParseError> {
        Ok(Self {
            tokens: tokenize(s)?.into_iter().peekable(),
        })
    }

    fn next(&mut self) -> Result<Token, TypeTagParseError> {
        self.tokens.next().ok_or(TypeTagParseError::UnexpectedEnd)
    }

    fn expect(&mut self, expected: Token) -> Result<(), TypeTagParseError> {
        let token = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err(TypeTagParseError::UnexpectedToken {
                expected: match expected {
                    Token::ColonColon => "'::'",
                    Token::Lt => "'<'",
                    Token::Gt => "'>'",
                    _ => "a separator",
                },
                found: token.describe(),
            })
        }
    }

    fn end(&mut self) -> Result<(), TypeTagParseError> {
        match self.tokens.next() {
            None => Ok(()),
            Some(token) => Err(TypeTagParseError::UnexpectedToken {
                expected: "end of input",
                found: token.describe(),
            }),
        }
    }

    fn identifier(&mut self) -> Result<Identifier, TypeTagParseError> {
        match self.next()? {
            Token::Name(name) => Ok(Identifier::new(name)?),
            other => Err(TypeTagParseError::UnexpectedToken {
                expected: "an identifier",
                found: other.describe(),
            }),
        }
    }

    fn address(&mut self) -> Result<AccountAddress, TypeTagParseError> {
        match self.next()? {
            Token::Address(literal) => Ok(AccountAddress::from_str_relaxed(&literal)?),
            other => Err(TypeTagParseError::UnexpectedToken {
                expected: "an address",
                found: other.describe(),
            }),
        }
    }

    fn type_tag(&mut self, depth: usize) -> Result<TypeTag, TypeTagParseError> {
        if depth >= MAX_TYPE_TAG_NESTING {
            return Err(TypeTagParseError::TooDeep);
        }
        match self.next()? {
            Token::Name(name) => Ok(match name.as_str() {
                "bool" => TypeTag::Bool,
                "u8" => TypeTag::U8,
                "u16" => TypeTag::U16,
                "u32" => TypeTag::U32,
                "u64" => TypeTag::U64,
                "u128" => TypeTag::U128,
                "u256" => TypeTag::U256,
                "address" => TypeTag::Address,
                "signer" => TypeTag::Signer,
                "vector" => {
                    self.expect(Token::Lt)?;
                    let element = self.type_tag(depth + 1)?;
                    self.expect(Token::Gt)?;
                    TypeTag::vector(element)
                },
                _ => match generic_index(&name) {
                    Some(index) => TypeTag::Generic(index),
                    None => return Err(TypeTagParseError::UnknownType(name)),
                },
            }),
            Token::Amp => Ok(TypeTag::reference(self.type_tag(depth + 1)?)),
            Token::Address(literal) => {
                let address = AccountAddress::from_str_relaxed(&literal)?;
                Ok(TypeTag::from(self.struct_tag_after_address(address, depth)?))
            },
            other => Err(TypeTagParseError::UnexpectedToken {
                expected: "a type",
                found: other.describe(),
            }),
        }
    }

    fn struct_tag_after_address(
        &mut self,
        address: AccountAddress,
        depth: usize,
    ) -> Result<StructTag, TypeTagParseError> {
        self.expect(Token::ColonColon)?;
        let module = self.identifier()?;
        self.expect(Token::ColonColon)?;
        let name = self.identifier()?;
        let mut type_args = vec![];
        if self.tokens.peek() == Some(&Token::Lt) {
            self.next()?;
            loop {
                type_args.push(self.type_tag(depth + 1)?);
                match self.next()? {
                    Token::Gt => break,
                    Token::Comma => {
                        // Allow a trailing comma before the closing bracket.
                        if self.tokens.peek() == Some(&Token::Gt) {
                            self.next()?;
                            break;
                        }
                    },
                    other => {
                        return Err(TypeTagParseError::UnexpectedToken {
                            expected: "',' or '>'",
                            found: other.describe(),
                        })
                    },
                }
            }
        }
        Ok(StructTag::new(address, module, name, type_args))
    }
}

/// `T0`, `T1`, ... name type parameters of the enclosing function.
fn generic_index(name: &str) -> Option<u16> {
    let digits = name.strip_prefix('T')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub fn parse_type_tag(s: &str) -> Result<TypeTag, TypeTagParseError> {
    let mut parser = Parser::new(s)?;
    let type_tag = parser.type_tag(0)?;
    parser.end()?;
    Ok(type_tag)
}

pub fn parse_type_tags(s: &str) -> Result<Vec<TypeTag>, TypeTagParseError> {
    let mut parser = Parser::new(s)?;
    let mut type_tags = vec![];
    if parser.tokens.peek().is_none() {
        return Ok(type_tags);
    }
    loop {
        type_tags.push(parser.type_tag(0)?);
        match parser.tokens.next() {
            None => return Ok(type_tags),
            Some(Token::Comma) => continue,
            Some(other) => {
                return Err(TypeTagParseError::UnexpectedToken {
                    expected: "','",
                    found: other.describe(),
                })
            },
        }
    }
}

pub fn parse_struct_tag(s: &str) -> Result<StructTag, TypeTagParseError> {
    match parse_type_tag(s)? {
        TypeTag::Struct(struct_tag) => Ok(*struct_tag),
        other => Err(TypeTagParseError::NotAStruct(other.to_string())),
    }
}

pub fn parse_module_id(s: &str) -> Result<ModuleId, TypeTagParseError> {
    let mut parser = Parser::new(s)?;
    let address = parser.address()?;
    parser.expect(Token::ColonColon)?;
    let name = parser.identifier()?;
    parser.end()?;
    Ok(ModuleId::new(address, name))
}
