// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use serde::{de, Deserialize, Deserializer};
use std::fmt;

/// Reads the bytes written by `impl_serde_for_crypto_material!` in the binary form.
pub(crate) fn deserialize_material_bytes<'de, D>(
    deserializer: D,
    name: &'static str,
) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    struct MaterialBytesVisitor(&'static str);

    impl<'de> de::Visitor<'de> for MaterialBytesVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            write!(formatter, "the bytes of a {}", self.0)
        }

        fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Vec<u8>, D::Error>
        where
            D: Deserializer<'de>,
        {
            serde_bytes::ByteBuf::deserialize(deserializer).map(serde_bytes::ByteBuf::into_vec)
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Vec<u8>, E> {
            Ok(v.to_vec())
        }

        fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Vec<u8>, E> {
            Ok(v)
        }
    }

    deserializer.deserialize_newtype_struct(name, MaterialBytesVisitor(name))
}

/// Keys and signatures are hex strings in human readable formats, and length-prefixed byte
/// strings wrapped in a newtype named after the type otherwise.
macro_rules! impl_serde_for_crypto_material {
    ($ty:ty, $name:expr) => {
        impl ::serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                if serializer.is_human_readable() {
                    serializer.serialize_str(
                        &$crate::traits::ValidCryptoMaterialStringExt::to_encoded_string(self),
                    )
                } else {
                    let bytes = $crate::traits::ValidCryptoMaterial::to_bytes(self);
                    serializer.serialize_newtype_struct($name, ::serde_bytes::Bytes::new(&bytes))
                }
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                if deserializer.is_human_readable() {
                    let encoded = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                    <$ty as $crate::traits::ValidCryptoMaterialStringExt>::from_encoded_string(
                        &encoded,
                    )
                    .map_err(<D::Error as ::serde::de::Error>::custom)
                } else {
                    let bytes =
                        $crate::serde_support::deserialize_material_bytes(deserializer, $name)?;
                    <$ty>::try_from(bytes.as_slice())
                        .map_err(<D::Error as ::serde::de::Error>::custom)
                }
            }
        }
    };
}

pub(crate) use impl_serde_for_crypto_material;
