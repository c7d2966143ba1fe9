// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{Error, Result, MAX_SEQUENCE_LENGTH};
use ethnum::{I256, U256};
use std::io::Write;

/// Byte-level BCS encoding on top of any [`Write`].
///
/// ```
/// use aptos_bcs::WriteBcsExt;
///
/// let mut out = vec![];
/// out.write_u16(0x0102).unwrap();
/// out.write_bytes(b"ab").unwrap();
/// assert_eq!(out, vec![0x02, 0x01, 0x02, b'a', b'b']);
/// ```
pub trait WriteBcsExt: Write {
    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_all(&[v])?;
        Ok(())
    }

    fn write_u16(&mut self, v: u16) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_u32(&mut self, v: u32) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_u64(&mut self, v: u64) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_u128(&mut self, v: u128) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_u256(&mut self, v: U256) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_i8(&mut self, v: i8) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_i16(&mut self, v: i16) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_i128(&mut self, v: i128) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    /// Two's complement, so negative values sign-extend over all 32 bytes.
    fn write_i256(&mut self, v: I256) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_u8(v as u8)
    }

    /// Writes a `u32` in 7-bit groups, least significant group first, with the high bit of each
    /// byte flagging a continuation.
    fn write_uleb128(&mut self, mut value: u32) -> Result<()> {
        while value >= 0x80 {
            let byte = (value & 0x7f) as u8;
            self.write_u8(byte | 0x80)?;
            value >>= 7;
        }
        self.write_u8(value as u8)
    }

    /// Length prefix for sequences, strings and byte strings.
    fn write_len(&mut self, len: usize) -> Result<()> {
        if len > MAX_SEQUENCE_LENGTH {
            return Err(Error::ExceededMaxLen(len));
        }
        self.write_uleb128(len as u32)
    }

    /// Enum variant indexes share the ULEB128 encoding of lengths.
    fn write_variant_index(&mut self, index: u32) -> Result<()> {
        self.write_uleb128(index)
    }

    /// A ULEB128 length followed by the raw bytes.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_len(bytes.len())?;
        self.write_all(bytes)?;
        Ok(())
    }

    /// Raw bytes of a statically sized array, no length prefix.
    fn write_fixed_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_bytes(s.as_bytes())
    }

    fn write_option<T, F>(&mut self, value: Option<&T>, write_some: F) -> Result<()>
    where
        Self: Sized,
        T: ?Sized,
        F: FnOnce(&mut Self, &T) -> Result<()>,
    {
        match value {
            None => self.write_u8(0),
            Some(v) => {
                self.write_u8(1)?;
                write_some(self, v)
            },
        }
    }

    fn write_sequence<T, F>(&mut self, items: &[T], mut write_item: F) -> Result<()>
    where
        Self: Sized,
        F: FnMut(&mut Self, &T) -> Result<()>,
    {
        self.write_len(items.len())?;
        for item in items {
            write_item(self, item)?;
        }
        Ok(())
    }
}

impl<W: Write + ?Sized> WriteBcsExt for W {}
