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

use core::fmt;

use strum::FromRepr;

use crate::error::{Error, ErrorCode};
use crate::tlv::{TLVTag, TLVValueType, TLVWrite};

use super::{Access, AttrId, Quality};

/// A type modeling the attribute meta-data in the Matter data model.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// The attribute ID
    pub id: AttrId,
    /// The element type values of the attribute are encoded with.
    ///
    /// Integer and string types match any width of the same kind.
    pub value_type: TLVValueType,
    /// The access control for the attribute
    pub access: Access,
    /// The quality of the attribute
    pub quality: Quality,
    /// The value reported before the attribute is first written
    pub default: AttrDefault,
}

impl Attribute {
    /// Create a new attribute with the given ID, element type, access control and quality.
    pub const fn new(
        id: AttrId,
        value_type: TLVValueType,
        access: Access,
        quality: Quality,
    ) -> Self {
        Self {
            id,
            value_type,
            access,
            quality,
            default: AttrDefault::None,
        }
    }

    /// Return a new attribute with the provided default value.
    pub const fn default(self, default: AttrDefault) -> Self {
        Self { default, ..self }
    }

    /// Return `true` if the attribute is a system one (i.e. a global attribute).
    pub fn is_system(&self) -> bool {
        Self::is_system_attr(self.id)
    }

    /// Return `true` if the attribute ID is a system one (i.e. a global attribute).
    ///
    /// Global attributes carry no manufacturer prefix, so e.g. `0xFFF1_FFF8` is not one.
    pub fn is_system_attr(attr_id: AttrId) -> bool {
        (GlobalElements::GeneratedCmdList as AttrId..=0xFFFF).contains(&attr_id)
    }

    /// Return `true` if the attribute accepts writes: it must be declared writable
    /// and must not be of the FIXED quality.
    pub fn is_writable(&self) -> bool {
        self.access.is_writable() && !self.quality.contains(Quality::FIXED)
    }

    /// Return `true` if a value of element type `value_type` may be stored in this attribute.
    pub fn accepts(&self, value_type: TLVValueType) -> bool {
        value_type.is_compatible_with(self.value_type)
            || (value_type == TLVValueType::Null && self.quality.contains(Quality::NULLABLE))
    }

    /// Encode the value of an attribute which was never written.
    ///
    /// Without an explicit default, nullable attributes report null
    /// and everything else reports the zero value of its element type.
    pub fn write_default<W: TLVWrite>(&self, tag: &TLVTag, mut tw: W) -> Result<(), Error> {
        match self.default {
            AttrDefault::None if self.quality.contains(Quality::NULLABLE) => tw.null(tag),
            AttrDefault::None => self.write_zero(tag, tw),
            AttrDefault::Null => tw.null(tag),
            AttrDefault::Bool(value) => tw.bool(tag, value),
            AttrDefault::Unsigned(value) => tw.u64(tag, value),
            AttrDefault::Signed(value) => tw.i64(tag, value),
            AttrDefault::Float(value) if self.value_type == TLVValueType::F32 => {
                tw.f32(tag, value as f32)
            }
            AttrDefault::Float(value) => tw.f64(tag, value),
            AttrDefault::Utf8(value) => tw.utf8(tag, value),
            AttrDefault::Octets(value) => tw.str(tag, value),
        }
    }

    fn write_zero<W: TLVWrite>(&self, tag: &TLVTag, mut tw: W) -> Result<(), Error> {
        let value_type = self.value_type;

        if value_type.is_signed() {
            tw.i64(tag, 0)
        } else if value_type.is_unsigned() {
            tw.u64(tag, 0)
        } else if value_type.is_bool() {
            tw.bool(tag, false)
        } else if value_type.is_utf8() {
            tw.utf8(tag, "")
        } else if value_type.is_str() {
            tw.str(tag, &[])
        } else if value_type.is_container_start() {
            tw.container(tag, value_type)?.end()
        } else {
            match value_type {
                TLVValueType::F32 => tw.f32(tag, 0.0),
                TLVValueType::F64 => tw.f64(tag, 0.0),
                TLVValueType::Null => tw.null(tag),
                _ => Err(ErrorCode::Invalid.into()),
            }
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// The value of an attribute before its first write.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AttrDefault {
    /// No explicit default
    None,
    Null,
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Utf8(&'static str),
    Octets(&'static [u8]),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum GlobalElements {
    GeneratedCmdList = 0xFFF8,
    AcceptedCmdList = 0xFFF9,
    EventList = 0xFFFA,
    AttributeList = 0xFFFB,
    FeatureMap = 0xFFFC,
    ClusterRevision = 0xFFFD,
}

impl TryFrom<AttrId> for GlobalElements {
    type Error = Error;

    fn try_from(id: AttrId) -> Result<Self, Self::Error> {
        Self::from_repr(id).ok_or_else(|| ErrorCode::AttributeNotFound.into())
    }
}

/// The descriptors of the global attributes every cluster carries.
pub const GLOBAL_ATTRIBUTES: &[Attribute] = &[
    Attribute::new(
        GlobalElements::GeneratedCmdList as _,
        TLVValueType::Array,
        Access::RV,
        Quality::NONE,
    ),
    Attribute::new(
        GlobalElements::AcceptedCmdList as _,
        TLVValueType::Array,
        Access::RV,
        Quality::NONE,
    ),
    Attribute::new(
        GlobalElements::EventList as _,
        TLVValueType::Array,
        Access::RV,
        Quality::NONE,
    ),
    Attribute::new(
        GlobalElements::AttributeList as _,
        TLVValueType::Array,
        Access::RV,
        Quality::NONE,
    ),
    Attribute::new(
        GlobalElements::FeatureMap as _,
        TLVValueType::U32,
        Access::RV,
        Quality::NONE,
    ),
    Attribute::new(
        GlobalElements::ClusterRevision as _,
        TLVValueType::U16,
        Access::RV,
        Quality::NONE,
    ),
];
