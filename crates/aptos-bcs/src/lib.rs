// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Binary Canonical Serialization (BCS).
//!
//! BCS is the byte format every Aptos transaction is hashed, signed and submitted in. A value has
//! exactly one valid encoding:
//!
//! * integers are fixed-width little-endian (`u8` up to `u256`, two's complement for signed types),
//! * booleans are a single `0x00`/`0x01` byte,
//! * byte strings, UTF-8 strings and sequences are prefixed with a ULEB128 length,
//! * fixed-size arrays and tuples are written as the concatenation of their elements,
//! * `Option<T>` is a `0x00` tag, or a `0x01` tag followed by `T`,
//! * enum variants are a ULEB128 variant index followed by the variant payload,
//! * maps are length-prefixed and sorted by the encoded bytes of their keys.
//!
//! Two layers are offered. [`WriteBcsExt`] and [`BcsReader`] are the byte-level encoder and
//! cursor-based decoder. [`to_bytes`] and [`from_bytes`] drive them from `serde` derives, so that
//! any `#[derive(Serialize, Deserialize)]` struct is encoded field by field in declaration order.

mod de;
mod error;
mod reader;
mod ser;
mod writer;

#[cfg(test)]
mod unit_tests;

pub use de::{from_bytes, from_bytes_seed, from_bytes_with_limit, Deserializer};
pub use error::{Error, Result};
pub use reader::BcsReader;
pub use ser::{serialize_into, serialized_size, to_bytes, to_bytes_with_limit, Serializer};
pub use writer::WriteBcsExt;

/// Variable length sequences in BCS are limited to max length of 2^31 - 1.
pub const MAX_SEQUENCE_LENGTH: usize = (1 << 31) - 1;

/// Maximal nesting of named containers (structs and enums) accepted by the serializer and the
/// deserializer.
pub const MAX_CONTAINER_DEPTH: usize = 500;

/// The longest valid ULEB128 encoding of a `u32`.
pub const MAX_ULEB128_U32_LEN: usize = 5;
