/*
 *
 *    Copyright (c) 2020-2022 Project CHIP Authors
 *
 *    Licensed under the Apache License, Version 2.0 (the "License");
 *    you may not use this file except in compliance with the License.
 *    You may obtain a copy of the License at
 *
 *        http://www.apache.org/licenses/LICENSE-2.0
 *
 *    Unless required by applicable law or agreed to in writing, software
 *    distributed under the License is distributed on an "AS IS" BASIS,
 *    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *    See the License for the specific language governing permissions and
 *    limitations under the License.
 */

use crate::error::{Error, ErrorCode};

use super::{TLVReader, TLVTag, TLVValue, TLVWrite};

/// Types which can be decoded from the element a `TLVReader` is positioned on.
pub trait FromTLV<'a>: Sized {
    fn from_tlv(reader: &TLVReader<'a>) -> Result<Self, Error>;
}

/// Types which can be encoded as a single TLV element (possibly a container).
pub trait ToTLV {
    fn to_tlv<W: TLVWrite>(&self, tag: &TLVTag, tw: W) -> Result<(), Error>;
}

impl<T> ToTLV for &T
where
    T: ToTLV + ?Sized,
{
    fn to_tlv<W: TLVWrite>(&self, tag: &TLVTag, tw: W) -> Result<(), Error> {
        (**self).to_tlv(tag, tw)
    }
}

macro_rules! fromtlv_for_int {
    ($($t:ident: $($v:ident)|+;)*) => {
        $(
            impl<'a> FromTLV<'a> for $t {
                #[allow(clippy::unnecessary_cast)]
                fn from_tlv(reader: &TLVReader<'a>) -> Result<Self, Error> {
                    match reader.value()? {
                        $(TLVValue::$v(v) => Ok(*v as $t),)+
                        _ => Err(ErrorCode::WrongTLVType.into()),
                    }
                }
            }
        )*
    };
}

// Writers pick the narrowest width, so reads accept any narrower encoding
fromtlv_for_int!(
    u8: U8;
    u16: U8 | U16;
    u32: U8 | U16 | U32;
    u64: U8 | U16 | U32 | U64;
);

fromtlv_for_int!(
    i8: S8;
    i16: S8 | S16;
    i32: S8 | S16 | S32;
    i64: S8 | S16 | S32 | S64;
);

macro_rules! totlv_for {
    ($($t:ident)*) => {
        $(
            impl ToTLV for $t {
                fn to_tlv<W: TLVWrite>(&self, tag: &TLVTag, mut tw: W) -> Result<(), Error> {
                    tw.$t(tag, *self)
                }
            }
        )*
    };
}

totlv_for!(i8 u8 i16 u16 i32 u32 i64 u64 f32 f64 bool);

impl<'a> FromTLV<'a> for bool {
    fn from_tlv(reader: &TLVReader<'a>) -> Result<Self, Error> {
        match reader.value()? {
            TLVValue::True => Ok(true),
            TLVValue::False => Ok(false),
            _ => Err(ErrorCode::WrongTLVType.into()),
        }
    }
}

impl<'a> FromTLV<'a> for f32 {
    fn from_tlv(reader: &TLVReader<'a>) -> Result<Self, Error> {
        match reader.value()? {
            TLVValue::F32(v) => Ok(*v),
            _ => Err(ErrorCode::WrongTLVType.into()),
        }
    }
}

impl<'a> FromTLV<'a> for f64 {
    fn from_tlv(reader: &TLVReader<'a>) -> Result<Self, Error> {
        match reader.value()? {
            TLVValue::F32(v) => Ok(*v as f64),
            TLVValue::F64(v) => Ok(*v),
            _ => Err(ErrorCode::WrongTLVType.into()),
        }
    }
}

impl<'a> FromTLV<'a> for &'a str {
    fn from_tlv(reader: &TLVReader<'a>) -> Result<Self, Error> {
        match reader.value()? {
            TLVValue::Utf8l(s) | TLVValue::Utf16l(s) | TLVValue::Utf32l(s) | TLVValue::Utf64l(s) => {
                Ok(s)
            }
            _ => Err(ErrorCode::WrongTLVType.into()),
        }
    }
}

impl ToTLV for str {
    fn to_tlv<W: TLVWrite>(&self, tag: &TLVTag, mut tw: W) -> Result<(), Error> {
        tw.utf8(tag, self)
    }
}

impl<'a> FromTLV<'a> for TLVValue<'a> {
    fn from_tlv(reader: &TLVReader<'a>) -> Result<Self, Error> {
        reader.value().cloned()
    }
}

impl ToTLV for TLVValue<'_> {
    fn to_tlv<W: TLVWrite>(&self, tag: &TLVTag, mut tw: W) -> Result<(), Error> {
        tw.tlv(tag, self)
    }
}

/// A TLV octet string borrowed from the encoded stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct OctetStr<'a>(pub &'a [u8]);

impl<'a> OctetStr<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self(data)
    }
}

impl<'a> FromTLV<'a> for OctetStr<'a> {
    fn from_tlv(reader: &TLVReader<'a>) -> Result<Self, Error> {
        match reader.value()? {
            TLVValue::Str8l(s) | TLVValue::Str16l(s) | TLVValue::Str32l(s) | TLVValue::Str64l(s) => {
                Ok(OctetStr(s))
            }
            _ => Err(ErrorCode::WrongTLVType.into()),
        }
    }
}

impl ToTLV for OctetStr<'_> {
    fn to_tlv<W: TLVWrite>(&self, tag: &TLVTag, mut tw: W) -> Result<(), Error> {
        tw.str(tag, self.0)
    }
}

/// A value which is either `Null` on the wire or a `T`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Nullable<T> {
    #[default]
    Null,
    Some(T),
}

impl<T> Nullable<T> {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Null => None,
            Self::Some(v) => Some(v),
        }
    }
}

impl<'a, T: FromTLV<'a>> FromTLV<'a> for Nullable<T> {
    fn from_tlv(reader: &TLVReader<'a>) -> Result<Self, Error> {
        match reader.value()? {
            TLVValue::Null => Ok(Self::Null),
            _ => T::from_tlv(reader).map(Self::Some),
        }
    }
}

impl<T: ToTLV> ToTLV for Nullable<T> {
    fn to_tlv<W: TLVWrite>(&self, tag: &TLVTag, mut tw: W) -> Result<(), Error> {
        match self {
            Self::Null => tw.null(tag),
            Self::Some(v) => v.to_tlv(tag, tw),
        }
    }
}

impl<T: ToTLV> ToTLV for [T] {
    fn to_tlv<W: TLVWrite>(&self, tag: &TLVTag, mut tw: W) -> Result<(), Error> {
        tw.start_array(tag)?;
        for item in self {
            item.to_tlv(&TLVTag::Anonymous, &mut tw)?;
        }
        tw.end_container()
    }
}
