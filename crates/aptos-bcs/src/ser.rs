// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{Error, Result, WriteBcsExt, MAX_CONTAINER_DEPTH};
use serde::{ser, Serialize};
use std::io::Write;

/// Serializes a value into a freshly allocated vector.
///
/// ```
/// #[derive(serde::Serialize)]
/// struct Coin {
///     value: u64,
///     frozen: bool,
/// }
///
/// let bytes = aptos_bcs::to_bytes(&Coin { value: 1, frozen: true }).unwrap();
/// assert_eq!(bytes, vec![1, 0, 0, 0, 0, 0, 0, 0, 1]);
/// ```
pub fn to_bytes<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut output = Vec::new();
    serialize_into(&mut output, value)?;
    Ok(output)
}

/// Same as [`to_bytes`] with a custom container depth limit.
pub fn to_bytes_with_limit<T>(value: &T, limit: usize) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    if limit > MAX_CONTAINER_DEPTH {
        return Err(Error::NotSupported("limit exceeds the max allowed depth"));
    }
    let mut output = Vec::new();
    value.serialize(Serializer::new(&mut output, limit))?;
    Ok(output)
}

pub fn serialize_into<W, T>(write: &mut W, value: &T) -> Result<()>
where
    W: ?Sized + Write,
    T: ?Sized + Serialize,
{
    value.serialize(Serializer::new(write, MAX_CONTAINER_DEPTH))
}

/// Size in bytes of the encoding of `value`, without allocating it.
pub fn serialized_size<T>(value: &T) -> Result<usize>
where
    T: ?Sized + Serialize,
{
    let mut counter = WriteCounter(0);
    serialize_into(&mut counter, value)?;
    Ok(counter.0)
}

struct WriteCounter(usize);

impl Write for WriteCounter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// `serde` serializer producing BCS.
pub struct Serializer<'a, W: ?Sized> {
    output: &'a mut W,
    max_remaining_depth: usize,
}

impl<'a, W> Serializer<'a, W>
where
    W: ?Sized + Write,
{
    pub fn new(output: &'a mut W, max_remaining_depth: usize) -> Self {
        Self {
            output,
            max_remaining_depth,
        }
    }

    fn reborrow(&mut self) -> Serializer<'_, W> {
        Serializer {
            output: self.output,
            max_remaining_depth: self.max_remaining_depth,
        }
    }

    fn enter_named_container(&mut self, name: &'static str) -> Result<()> {
        if self.max_remaining_depth == 0 {
            return Err(Error::ExceededContainerDepthLimit(name));
        }
        self.max_remaining_depth -= 1;
        Ok(())
    }
}

impl<'a, W> ser::Serializer for Serializer<'a, W>
where
    W: ?Sized + Write,
{
    type Error = Error;
    type Ok = ();
    type SerializeMap = MapSerializer<'a, W>;
    type SerializeSeq = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.output.write_bool(v)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.output.write_i8(v)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.output.write_i16(v)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.output.write_i32(v)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.output.write_i64(v)
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.output.write_i128(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.output.write_u8(v)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.output.write_u16(v)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.output.write_u32(v)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.output.write_u64(v)
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.output.write_u128(v)
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        Err(Error::NotSupported("serialize_f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        Err(Error::NotSupported("serialize_f64"))
    }

    fn serialize_char(self, _v: char) -> Result<()> {
        Err(Error::NotSupported("serialize_char"))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.output.write_str(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.output.write_bytes(v)
    }

    fn serialize_none(self) -> Result<()> {
        self.output.write_u8(0)
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.output.write_u8(1)?;
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_struct(mut self, name: &'static str) -> Result<()> {
        self.enter_named_container(name)?;
        Ok(())
    }

    fn serialize_unit_variant(
        mut self,
        name: &'static str,
        variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        self.enter_named_container(name)?;
        self.output.write_variant_index(variant_index)
    }

    fn serialize_newtype_struct<T>(mut self, name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.enter_named_container(name)?;
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        mut self,
        name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.enter_named_container(name)?;
        self.output.write_variant_index(variant_index)?;
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        match len {
            Some(len) => {
                self.output.write_len(len)?;
                Ok(self)
            },
            None => Err(Error::MissingLen),
        }
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        mut self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.enter_named_container(name)?;
        Ok(self)
    }

    fn serialize_tuple_variant(
        mut self,
        name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.enter_named_container(name)?;
        self.output.write_variant_index(variant_index)?;
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(MapSerializer::new(self))
    }

    fn serialize_struct(
        mut self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct> {
        self.enter_named_container(name)?;
        Ok(self)
    }

    fn serialize_struct_variant(
        mut self,
        name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.enter_named_container(name)?;
        self.output.write_variant_index(variant_index)?;
        Ok(self)
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

impl<W> ser::SerializeSeq for Serializer<'_, W>
where
    W: ?Sized + Write,
{
    type Error = Error;
    type Ok = ();

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self.reborrow())
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<W> ser::SerializeTuple for Serializer<'_, W>
where
    W: ?Sized + Write,
{
    type Error = Error;
    type Ok = ();

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self.reborrow())
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<W> ser::SerializeTupleStruct for Serializer<'_, W>
where
    W: ?Sized + Write,
{
    type Error = Error;
    type Ok = ();

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self.reborrow())
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<W> ser::SerializeTupleVariant for Serializer<'_, W>
where
    W: ?Sized + Write,
{
    type Error = Error;
    type Ok = ();

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self.reborrow())
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<W> ser::SerializeStruct for Serializer<'_, W>
where
    W: ?Sized + Write,
{
    type Error = Error;
    type Ok = ();

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self.reborrow())
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<W> ser::SerializeStructVariant for Serializer<'_, W>
where
    W: ?Sized + Write,
{
    type Error = Error;
    type Ok = ();

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self.reborrow())
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Buffers encoded entries so they can be written sorted by key bytes.
#[doc(hidden)]
pub struct MapSerializer<'a, W: ?Sized> {
    serializer: Serializer<'a, W>,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    next_key: Option<Vec<u8>>,
}

impl<'a, W: ?Sized> MapSerializer<'a, W> {
    fn new(serializer: Serializer<'a, W>) -> Self {
        MapSerializer {
            serializer,
            entries: Vec::new(),
            next_key: None,
        }
    }
}

impl<W> ser::SerializeMap for MapSerializer<'_, W>
where
    W: ?Sized + Write,
{
    type Error = Error;
    type Ok = ();

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if self.next_key.is_some() {
            return Err(Error::Custom("serialize_key called twice".to_string()));
        }
        let mut output = Vec::new();
        key.serialize(Serializer::new(
            &mut output,
            self.serializer.max_remaining_depth,
        ))?;
        self.next_key = Some(output);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match self.next_key.take() {
            Some(key) => {
                let mut output = Vec::new();
                value.serialize(Serializer::new(
                    &mut output,
                    self.serializer.max_remaining_depth,
                ))?;
                self.entries.push((key, output));
                Ok(())
            },
            None => Err(Error::Custom(
                "serialize_value called before serialize_key".to_string(),
            )),
        }
    }

    fn end(mut self) -> Result<()> {
        if self.next_key.is_some() {
            return Err(Error::Custom("map key without a value".to_string()));
        }
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        self.entries.dedup_by(|a, b| a.0 == b.0);

        let output = self.serializer.output;
        output.write_len(self.entries.len())?;
        for (key, value) in &self.entries {
            output.write_fixed_bytes(key)?;
            output.write_fixed_bytes(value)?;
        }
        Ok(())
    }
}
