// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{Error, Result, MAX_SEQUENCE_LENGTH, MAX_ULEB128_U32_LEN};
use ethnum::{I256, U256};

/// A cursor over a borrowed byte slice that decodes BCS primitives.
///
/// Every read either consumes exactly the bytes of one value or fails with
/// [`Error::NotEnoughBytes`] without advancing.
#[derive(Clone, Debug)]
pub struct BcsReader<'de> {
    input: &'de [u8],
}

macro_rules! read_le {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self) -> Result<$ty> {
            let bytes = self.read_array::<{ std::mem::size_of::<$ty>() }>()?;
            Ok(<$ty>::from_le_bytes(bytes))
        }
    };
}

impl<'de> BcsReader<'de> {
    pub fn new(input: &'de [u8]) -> Self {
        Self { input }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> &'de [u8] {
        self.input
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Fails with [`Error::RemainingBytes`] unless the input is fully consumed.
    pub fn end(&self) -> Result<()> {
        if self.input.is_empty() {
            Ok(())
        } else {
            Err(Error::RemainingBytes(self.input.len()))
        }
    }

    pub fn read_fixed_bytes(&mut self, len: usize) -> Result<&'de [u8]> {
        if self.input.len() < len {
            return Err(Error::NotEnoughBytes {
                needed: len,
                remaining: self.input.len(),
            });
        }
        let (head, tail) = self.input.split_at(len);
        self.input = tail;
        Ok(head)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_fixed_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_fixed_bytes(1)?[0])
    }

    read_le!(read_u16, u16);
    read_le!(read_u32, u32);
    read_le!(read_u64, u64);
    read_le!(read_u128, u128);
    read_le!(read_i8, i8);
    read_le!(read_i16, i16);
    read_le!(read_i32, i32);
    read_le!(read_i64, i64);
    read_le!(read_i128, i128);

    pub fn read_u256(&mut self) -> Result<U256> {
        Ok(U256::from_le_bytes(self.read_array::<32>()?))
    }

    pub fn read_i256(&mut self) -> Result<I256> {
        Ok(I256::from_le_bytes(self.read_array::<32>()?))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::InvalidBool(other)),
        }
    }

    /// Decodes a canonical ULEB128 `u32`: at most five bytes, no trailing zero groups, no bits
    /// beyond the 32nd.
    pub fn read_uleb128(&mut self) -> Result<u32> {
        let mut value: u64 = 0;
        for shift in (0..MAX_ULEB128_U32_LEN * 7).step_by(7) {
            let byte = self.read_u8()?;
            let digit = byte & 0x7f;
            value |= u64::from(digit) << shift;
            if byte & 0x80 == 0 {
                if shift > 0 && digit == 0 {
                    return Err(Error::BadUleb128("non-canonical encoding"));
                }
                return u32::try_from(value).map_err(|_| Error::BadUleb128("overflow"));
            }
        }
        Err(Error::BadUleb128("overflow"))
    }

    pub fn read_len(&mut self) -> Result<usize> {
        let len = self.read_uleb128()? as usize;
        if len > MAX_SEQUENCE_LENGTH {
            return Err(Error::ExceededMaxLen(len));
        }
        Ok(len)
    }

    pub fn read_variant_index(&mut self) -> Result<u32> {
        self.read_uleb128()
    }

    /// A ULEB128 length followed by that many bytes.
    pub fn read_bytes(&mut self) -> Result<&'de [u8]> {
        let len = self.read_len()?;
        self.read_fixed_bytes(len)
    }

    pub fn read_str(&mut self) -> Result<&'de str> {
        std::str::from_utf8(self.read_bytes()?).map_err(|_| Error::Utf8)
    }

    pub fn read_option<T, F>(&mut self, read_some: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        match self.read_u8()? {
            0 => Ok(None),
            1 => read_some(self).map(Some),
            tag => Err(Error::InvalidOptionTag(tag)),
        }
    }

    pub fn read_sequence<T, F>(&mut self, mut read_item: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let len = self.read_len()?;
        // Never trust the prefix for preallocation: each element takes at least one byte.
        let mut items = Vec::with_capacity(len.min(self.input.len()));
        for _ in 0..len {
            items.push(read_item(self)?);
        }
        Ok(items)
    }
}
