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

//! The Matter TLV (Tag-Length-Value) wire encoding.
//!
//! The encoding is a single linear byte stream. Every element starts with a control byte
//! (tag form in the upper 3 bits, element type in the lower 5 bits), followed by the tag bytes,
//! an optional length prefix (strings only) and the value. Containers carry no length and are
//! closed by an explicit end-of-container element. All multi-byte fields are little-endian.

use core::fmt;

use num_traits::FromPrimitive;

use crate::error::{Error, ErrorCode};

pub use read::*;
pub use traits::*;
pub use utils::*;
pub use write::*;

mod read;
mod traits;
mod utils;
mod write;

/// The deepest container nesting a `TLVReader` enters.
///
/// Streams nesting deeper fail with `ErrorCode::InvalidData` when the container
/// past this limit is entered, so recursive traversals stay within a bounded stack.
pub const MAX_TLV_DEPTH: usize = 64;

/// Represents the TLV tag type encoded in the control byte of each TLV element.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum TLVTagType {
    Anonymous = 0,
    Context = 1,
    CommonPrf16 = 2,
    CommonPrf32 = 3,
    ImplPrf16 = 4,
    ImplPrf32 = 5,
    FullQual48 = 6,
    FullQual64 = 7,
}

impl TLVTagType {
    /// Return the size of the tag data following the control byte
    /// in the TLV element representation.
    pub const fn size(&self) -> usize {
        match self {
            Self::Anonymous => 0,
            Self::Context => 1,
            Self::CommonPrf16 | Self::ImplPrf16 => 2,
            Self::CommonPrf32 | Self::ImplPrf32 => 4,
            Self::FullQual48 => 6,
            Self::FullQual64 => 8,
        }
    }
}

/// Represents the TLV value type encoded in the control byte of each TLV element.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum TLVValueType {
    S8 = 0,
    S16 = 1,
    S32 = 2,
    S64 = 3,
    U8 = 4,
    U16 = 5,
    U32 = 6,
    U64 = 7,
    False = 8,
    True = 9,
    F32 = 10,
    F64 = 11,
    Utf8l = 12,
    Utf16l = 13,
    Utf32l = 14,
    Utf64l = 15,
    Str8l = 16,
    Str16l = 17,
    Str32l = 18,
    Str64l = 19,
    Null = 20,
    Struct = 21,
    Array = 22,
    List = 23,
    EndCnt = 24,
}

impl TLVValueType {
    /// Return the size of the value corresponding to this value type.
    ///
    /// Strings have a variable size, for these the function returns `None`.
    pub const fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::S8 | Self::U8 => Some(1),
            Self::S16 | Self::U16 => Some(2),
            Self::S32 | Self::U32 | Self::F32 => Some(4),
            Self::S64 | Self::U64 | Self::F64 => Some(8),
            Self::Utf8l
            | Self::Utf16l
            | Self::Utf32l
            | Self::Utf64l
            | Self::Str8l
            | Self::Str16l
            | Self::Str32l
            | Self::Str64l => None,
            _ => Some(0),
        }
    }

    /// Return the size of the length prefix of string value types, or 0 for all other types.
    pub const fn variable_size_len(&self) -> usize {
        match self {
            Self::Utf8l | Self::Str8l => 1,
            Self::Utf16l | Self::Str16l => 2,
            Self::Utf32l | Self::Str32l => 4,
            Self::Utf64l | Self::Str64l => 8,
            _ => 0,
        }
    }

    pub const fn is_container_start(&self) -> bool {
        matches!(self, Self::Struct | Self::Array | Self::List)
    }

    pub const fn is_container_end(&self) -> bool {
        matches!(self, Self::EndCnt)
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::S8 | Self::S16 | Self::S32 | Self::S64)
    }

    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::False | Self::True)
    }

    /// Octet string types.
    pub const fn is_str(&self) -> bool {
        matches!(
            self,
            Self::Str8l | Self::Str16l | Self::Str32l | Self::Str64l
        )
    }

    /// UTF-8 string types.
    pub const fn is_utf8(&self) -> bool {
        matches!(
            self,
            Self::Utf8l | Self::Utf16l | Self::Utf32l | Self::Utf64l
        )
    }

    /// Return `true` if a value encoded as `self` may be stored in a slot declared
    /// as `declared`.
    ///
    /// Integer, string and octet-string types are compatible across widths,
    /// as writers always pick the narrowest encoding.
    pub const fn is_compatible_with(&self, declared: TLVValueType) -> bool {
        (self.is_signed() && declared.is_signed())
            || (self.is_unsigned() && declared.is_unsigned())
            || (self.is_bool() && declared.is_bool())
            || (self.is_utf8() && declared.is_utf8())
            || (self.is_str() && declared.is_str())
            || (*self as u8) == (declared as u8)
    }
}

impl fmt::Display for TLVValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Represents the control byte of a TLV element (i.e. the tag type and the value type).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TLVControl {
    pub tag_type: TLVTagType,
    pub value_type: TLVValueType,
}

impl TLVControl {
    const TAG_SHIFT_BITS: u8 = 5;
    const TAG_MASK: u8 = 0xe0;
    const TYPE_MASK: u8 = 0x1f;

    #[inline(always)]
    pub const fn new(tag_type: TLVTagType, value_type: TLVValueType) -> Self {
        Self {
            tag_type,
            value_type,
        }
    }

    /// Parse a raw control byte.
    ///
    /// Fails with `InvalidData` if the element type bits do not name a known type.
    #[inline(always)]
    pub fn parse(control: u8) -> Result<Self, Error> {
        let tag_type = FromPrimitive::from_u8((control & Self::TAG_MASK) >> Self::TAG_SHIFT_BITS)
            .ok_or(ErrorCode::InvalidData)?;
        let value_type =
            FromPrimitive::from_u8(control & Self::TYPE_MASK).ok_or(ErrorCode::InvalidData)?;

        Ok(Self::new(tag_type, value_type))
    }

    #[inline(always)]
    pub const fn as_raw(&self) -> u8 {
        ((self.tag_type as u8) << Self::TAG_SHIFT_BITS) | (self.value_type as u8)
    }

    #[inline(always)]
    pub fn is_container_start(&self) -> bool {
        self.value_type.is_container_start()
    }

    /// An end-of-container marker is always anonymous.
    #[inline(always)]
    pub fn is_container_end(&self) -> bool {
        matches!(self.tag_type, TLVTagType::Anonymous) && self.value_type.is_container_end()
    }
}

/// A decoded TLV header: the tag plus the value.
///
/// For containers, `value` is only the container start (`Struct`, `Array` or `List`)
/// or the container end (`EndCnt`); the members are separate `TLV`s in between.
#[derive(Debug, Clone, PartialEq)]
pub struct TLV<'a> {
    pub tag: TLVTag,
    pub value: TLVValue<'a>,
}

impl<'a> TLV<'a> {
    pub const fn new(tag: TLVTag, value: TLVValue<'a>) -> Self {
        Self { tag, value }
    }
}

impl fmt::Display for TLV<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if matches!(self.tag, TLVTag::Anonymous) {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{}: {}", self.tag, self.value)
        }
    }
}

/// A TLV tag (tag form and tag number).
///
/// The fully-qualified forms carry a 32-bit profile id split into
/// a 16-bit vendor id and a 16-bit profile number.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TLVTag {
    Anonymous,
    Context(u8),
    CommonPrf16(u16),
    CommonPrf32(u32),
    ImplPrf16(u16),
    ImplPrf32(u32),
    FullQual48 {
        vendor_id: u16,
        profile: u16,
        tag: u16,
    },
    FullQual64 {
        vendor_id: u16,
        profile: u16,
        tag: u32,
    },
}

impl TLVTag {
    pub const fn tag_type(&self) -> TLVTagType {
        match self {
            Self::Anonymous => TLVTagType::Anonymous,
            Self::Context(_) => TLVTagType::Context,
            Self::CommonPrf16(_) => TLVTagType::CommonPrf16,
            Self::CommonPrf32(_) => TLVTagType::CommonPrf32,
            Self::ImplPrf16(_) => TLVTagType::ImplPrf16,
            Self::ImplPrf32(_) => TLVTagType::ImplPrf32,
            Self::FullQual48 { .. } => TLVTagType::FullQual48,
            Self::FullQual64 { .. } => TLVTagType::FullQual64,
        }
    }

    /// The 32-bit profile id of a fully-qualified tag (`vendor_id << 16 | profile`).
    pub const fn profile_id(&self) -> Option<u32> {
        match self {
            Self::FullQual48 {
                vendor_id, profile, ..
            }
            | Self::FullQual64 {
                vendor_id, profile, ..
            } => Some(((*vendor_id as u32) << 16) | *profile as u32),
            _ => None,
        }
    }

    /// Decode the tag bytes following a control byte of the given tag type.
    ///
    /// `data` must hold at least `tag_type.size()` bytes.
    pub(crate) fn parse(tag_type: TLVTagType, data: &[u8]) -> Result<Self, Error> {
        let data = data
            .get(..tag_type.size())
            .ok_or(ErrorCode::TruncatedPacket)?;

        let u16_at = |at: usize| -> Result<u16, Error> {
            Ok(u16::from_le_bytes(data[at..at + 2].try_into()?))
        };
        let u32_at = |at: usize| -> Result<u32, Error> {
            Ok(u32::from_le_bytes(data[at..at + 4].try_into()?))
        };

        Ok(match tag_type {
            TLVTagType::Anonymous => Self::Anonymous,
            TLVTagType::Context => Self::Context(data[0]),
            TLVTagType::CommonPrf16 => Self::CommonPrf16(u16_at(0)?),
            TLVTagType::CommonPrf32 => Self::CommonPrf32(u32_at(0)?),
            TLVTagType::ImplPrf16 => Self::ImplPrf16(u16_at(0)?),
            TLVTagType::ImplPrf32 => Self::ImplPrf32(u32_at(0)?),
            TLVTagType::FullQual48 => Self::FullQual48 {
                vendor_id: u16_at(0)?,
                profile: u16_at(2)?,
                tag: u16_at(4)?,
            },
            TLVTagType::FullQual64 => Self::FullQual64 {
                vendor_id: u16_at(0)?,
                profile: u16_at(2)?,
                tag: u32_at(4)?,
            },
        })
    }
}

impl fmt::Display for TLVTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::Context(tag) => write!(f, "Context({tag})"),
            Self::CommonPrf16(tag) => write!(f, "CommonPrf16({tag})"),
            Self::CommonPrf32(tag) => write!(f, "CommonPrf32({tag})"),
            Self::ImplPrf16(tag) => write!(f, "ImplPrf16({tag})"),
            Self::ImplPrf32(tag) => write!(f, "ImplPrf32({tag})"),
            Self::FullQual48 {
                vendor_id,
                profile,
                tag,
            } => write!(f, "FullQual48(VID:{vendor_id} PRF:{profile} {tag})"),
            Self::FullQual64 {
                vendor_id,
                profile,
                tag,
            } => write!(f, "FullQual64(VID:{vendor_id} PRF:{profile} {tag})"),
        }
    }
}

/// A TLV value.
///
/// Strings and octet strings borrow from the encoded stream.
#[derive(Debug, Clone, PartialEq)]
pub enum TLVValue<'a> {
    S8(i8),
    S16(i16),
    S32(i32),
    S64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    False,
    True,
    F32(f32),
    F64(f64),
    Utf8l(&'a str),
    Utf16l(&'a str),
    Utf32l(&'a str),
    Utf64l(&'a str),
    Str8l(&'a [u8]),
    Str16l(&'a [u8]),
    Str32l(&'a [u8]),
    Str64l(&'a [u8]),
    Null,
    Struct,
    Array,
    List,
    EndCnt,
}

impl<'a> TLVValue<'a> {
    pub const fn value_type(&self) -> TLVValueType {
        match self {
            Self::S8(_) => TLVValueType::S8,
            Self::S16(_) => TLVValueType::S16,
            Self::S32(_) => TLVValueType::S32,
            Self::S64(_) => TLVValueType::S64,
            Self::U8(_) => TLVValueType::U8,
            Self::U16(_) => TLVValueType::U16,
            Self::U32(_) => TLVValueType::U32,
            Self::U64(_) => TLVValueType::U64,
            Self::False => TLVValueType::False,
            Self::True => TLVValueType::True,
            Self::F32(_) => TLVValueType::F32,
            Self::F64(_) => TLVValueType::F64,
            Self::Utf8l(_) => TLVValueType::Utf8l,
            Self::Utf16l(_) => TLVValueType::Utf16l,
            Self::Utf32l(_) => TLVValueType::Utf32l,
            Self::Utf64l(_) => TLVValueType::Utf64l,
            Self::Str8l(_) => TLVValueType::Str8l,
            Self::Str16l(_) => TLVValueType::Str16l,
            Self::Str32l(_) => TLVValueType::Str32l,
            Self::Str64l(_) => TLVValueType::Str64l,
            Self::Null => TLVValueType::Null,
            Self::Struct => TLVValueType::Struct,
            Self::Array => TLVValueType::Array,
            Self::List => TLVValueType::List,
            Self::EndCnt => TLVValueType::EndCnt,
        }
    }

    /// The narrowest signed representation of `value`.
    pub const fn i64(value: i64) -> Self {
        if value >= i8::MIN as i64 && value <= i8::MAX as i64 {
            Self::S8(value as i8)
        } else if value >= i16::MIN as i64 && value <= i16::MAX as i64 {
            Self::S16(value as i16)
        } else if value >= i32::MIN as i64 && value <= i32::MAX as i64 {
            Self::S32(value as i32)
        } else {
            Self::S64(value)
        }
    }

    /// The narrowest unsigned representation of `value`.
    pub const fn u64(value: u64) -> Self {
        if value <= u8::MAX as u64 {
            Self::U8(value as u8)
        } else if value <= u16::MAX as u64 {
            Self::U16(value as u16)
        } else if value <= u32::MAX as u64 {
            Self::U32(value as u32)
        } else {
            Self::U64(value)
        }
    }

    /// A UTF-8 string with the narrowest length prefix.
    pub const fn utf8(value: &'a str) -> Self {
        let len = value.len();

        if len <= u8::MAX as usize {
            Self::Utf8l(value)
        } else if len <= u16::MAX as usize {
            Self::Utf16l(value)
        } else if len as u64 <= u32::MAX as u64 {
            Self::Utf32l(value)
        } else {
            Self::Utf64l(value)
        }
    }

    /// An octet string with the narrowest length prefix.
    pub const fn str(value: &'a [u8]) -> Self {
        let len = value.len();

        if len <= u8::MAX as usize {
            Self::Str8l(value)
        } else if len <= u16::MAX as usize {
            Self::Str16l(value)
        } else if len as u64 <= u32::MAX as u64 {
            Self::Str32l(value)
        } else {
            Self::Str64l(value)
        }
    }

    pub const fn bool(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

impl fmt::Display for TLVValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S8(a) => write!(f, "S8({a})"),
            Self::S16(a) => write!(f, "S16({a})"),
            Self::S32(a) => write!(f, "S32({a})"),
            Self::S64(a) => write!(f, "S64({a})"),
            Self::U8(a) => write!(f, "U8(0x{a:02x})"),
            Self::U16(a) => write!(f, "U16(0x{a:04x})"),
            Self::U32(a) => write!(f, "U32(0x{a:08x})"),
            Self::U64(a) => write!(f, "U64(0x{a:016x})"),
            Self::F32(a) => write!(f, "F32({a})"),
            Self::F64(a) => write!(f, "F64({a})"),
            Self::Null => write!(f, "Null"),
            Self::Struct => write!(f, "{{"),
            Self::Array => write!(f, "["),
            Self::List => write!(f, "("),
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Utf8l(a) | Self::Utf16l(a) | Self::Utf32l(a) | Self::Utf64l(a) => {
                write!(f, "\"{a}\"")
            }
            Self::Str8l(a) | Self::Str16l(a) | Self::Str32l(a) | Self::Str64l(a) => {
                write!(f, "({}){a:02X?}", a.len())
            }
            Self::EndCnt => write!(f, ">"),
        }
    }
}

pub(crate) fn pad(ident: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for _ in 0..ident {
        write!(f, "  ")?;
    }

    Ok(())
}
