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

use core::ops::{Deref, DerefMut};

use crate::error::{Error, ErrorCode};
use crate::utils::writebuf::WriteBuf;

use super::{TLVControl, TLVTag, TLVTagType, TLVValue, TLVValueType, ToTLV};

/// A sink for a TLV stream, emitting one byte at a time.
///
/// Only `write`, `get_tail` and `rewind_to` need to be implemented, everything else
/// is provided. Integers are always emitted in the narrowest width holding the value
/// and strings with the narrowest length prefix, so equal logical trees always
/// produce identical bytes.
pub trait TLVWrite {
    type Position: Copy;

    /// Write a TLV tag and value to the TLV stream.
    ///
    /// Either the whole element is written or, on failure, nothing is.
    fn tlv(&mut self, tag: &TLVTag, value: &TLVValue) -> Result<(), Error> {
        let start = self.get_tail();

        let mut write = || -> Result<(), Error> {
            self.raw_value(tag, value.value_type(), &[])?;

            // The length must fit the prefix width the element type selects
            match value {
                TLVValue::Str8l(a) => self.write_raw_data(len_prefix::<u8>(a.len())?.to_le_bytes()),
                TLVValue::Str16l(a) => self.write_raw_data(len_prefix::<u16>(a.len())?.to_le_bytes()),
                TLVValue::Str32l(a) => self.write_raw_data(len_prefix::<u32>(a.len())?.to_le_bytes()),
                TLVValue::Str64l(a) => self.write_raw_data(len_prefix::<u64>(a.len())?.to_le_bytes()),
                TLVValue::Utf8l(a) => self.write_raw_data(len_prefix::<u8>(a.len())?.to_le_bytes()),
                TLVValue::Utf16l(a) => self.write_raw_data(len_prefix::<u16>(a.len())?.to_le_bytes()),
                TLVValue::Utf32l(a) => self.write_raw_data(len_prefix::<u32>(a.len())?.to_le_bytes()),
                TLVValue::Utf64l(a) => self.write_raw_data(len_prefix::<u64>(a.len())?.to_le_bytes()),
                _ => Ok(()),
            }?;

            match value {
                TLVValue::S8(a) => self.write_raw_data(a.to_le_bytes()),
                TLVValue::S16(a) => self.write_raw_data(a.to_le_bytes()),
                TLVValue::S32(a) => self.write_raw_data(a.to_le_bytes()),
                TLVValue::S64(a) => self.write_raw_data(a.to_le_bytes()),
                TLVValue::U8(a) => self.write_raw_data(a.to_le_bytes()),
                TLVValue::U16(a) => self.write_raw_data(a.to_le_bytes()),
                TLVValue::U32(a) => self.write_raw_data(a.to_le_bytes()),
                TLVValue::U64(a) => self.write_raw_data(a.to_le_bytes()),
                TLVValue::F32(a) => self.write_raw_data(a.to_le_bytes()),
                TLVValue::F64(a) => self.write_raw_data(a.to_le_bytes()),
                TLVValue::Utf8l(a)
                | TLVValue::Utf16l(a)
                | TLVValue::Utf32l(a)
                | TLVValue::Utf64l(a) => self.write_raw_data(a.as_bytes().iter().copied()),
                TLVValue::Str8l(a)
                | TLVValue::Str16l(a)
                | TLVValue::Str32l(a)
                | TLVValue::Str64l(a) => self.write_raw_data(a.iter().copied()),
                TLVValue::False
                | TLVValue::True
                | TLVValue::Null
                | TLVValue::Struct
                | TLVValue::Array
                | TLVValue::List
                | TLVValue::EndCnt => Ok(()),
            }
        };

        let result = write();
        if result.is_err() {
            self.rewind_to(start);
        }

        result
    }

    /// Encode `value` under `tag`.
    fn put<T: ToTLV + ?Sized>(&mut self, tag: &TLVTag, value: &T) -> Result<(), Error>
    where
        Self: Sized,
    {
        value.to_tlv(tag, self)
    }

    fn i8(&mut self, tag: &TLVTag, data: i8) -> Result<(), Error> {
        self.i64(tag, data as i64)
    }

    fn u8(&mut self, tag: &TLVTag, data: u8) -> Result<(), Error> {
        self.u64(tag, data as u64)
    }

    fn i16(&mut self, tag: &TLVTag, data: i16) -> Result<(), Error> {
        self.i64(tag, data as i64)
    }

    fn u16(&mut self, tag: &TLVTag, data: u16) -> Result<(), Error> {
        self.u64(tag, data as u64)
    }

    fn i32(&mut self, tag: &TLVTag, data: i32) -> Result<(), Error> {
        self.i64(tag, data as i64)
    }

    fn u32(&mut self, tag: &TLVTag, data: u32) -> Result<(), Error> {
        self.u64(tag, data as u64)
    }

    /// Write a signed integer as S8, S16, S32 or S64, whichever is the narrowest to hold it.
    fn i64(&mut self, tag: &TLVTag, data: i64) -> Result<(), Error> {
        self.tlv(tag, &TLVValue::i64(data))
    }

    /// Write an unsigned integer as U8, U16, U32 or U64, whichever is the narrowest to hold it.
    fn u64(&mut self, tag: &TLVTag, data: u64) -> Result<(), Error> {
        self.tlv(tag, &TLVValue::u64(data))
    }

    fn f32(&mut self, tag: &TLVTag, data: f32) -> Result<(), Error> {
        self.raw_value(tag, TLVValueType::F32, &data.to_le_bytes())
    }

    fn f64(&mut self, tag: &TLVTag, data: f64) -> Result<(), Error> {
        self.raw_value(tag, TLVValueType::F64, &data.to_le_bytes())
    }

    /// Write an octet string with the narrowest length prefix.
    fn str(&mut self, tag: &TLVTag, data: &[u8]) -> Result<(), Error> {
        self.tlv(tag, &TLVValue::str(data))
    }

    /// Write a UTF-8 string with the narrowest length prefix.
    fn utf8(&mut self, tag: &TLVTag, data: &str) -> Result<(), Error> {
        self.tlv(tag, &TLVValue::utf8(data))
    }

    /// Write the start of a Struct container.
    ///
    /// NOTE: `end_container` must be called after the last member, or else the
    /// generated stream is invalid. Prefer `container`, which closes or discards
    /// the container automatically.
    fn start_struct(&mut self, tag: &TLVTag) -> Result<(), Error> {
        self.raw_value(tag, TLVValueType::Struct, &[])
    }

    fn start_array(&mut self, tag: &TLVTag) -> Result<(), Error> {
        self.raw_value(tag, TLVValueType::Array, &[])
    }

    fn start_list(&mut self, tag: &TLVTag) -> Result<(), Error> {
        self.raw_value(tag, TLVValueType::List, &[])
    }

    fn start_container(&mut self, tag: &TLVTag, container_type: TLVValueType) -> Result<(), Error> {
        if !container_type.is_container_start() {
            Err(ErrorCode::WrongTLVType)?;
        }

        self.raw_value(tag, container_type, &[])
    }

    fn end_container(&mut self) -> Result<(), Error> {
        self.write(TLVControl::new(TLVTagType::Anonymous, TLVValueType::EndCnt).as_raw())
    }

    /// Open a container and return a guard for writing its members.
    ///
    /// `ContainerWriter::end` writes the end marker. A guard dropped without `end`
    /// (e.g. because writing a member failed) rewinds the stream to where the
    /// container started, so a partial container is never left behind.
    fn container(
        &mut self,
        tag: &TLVTag,
        container_type: TLVValueType,
    ) -> Result<ContainerWriter<'_, Self>, Error>
    where
        Self: Sized,
    {
        let start = self.get_tail();

        if let Err(err) = self.start_container(tag, container_type) {
            self.rewind_to(start);
            return Err(err);
        }

        Ok(ContainerWriter {
            tw: self,
            start: Some(start),
        })
    }

    fn null(&mut self, tag: &TLVTag) -> Result<(), Error> {
        self.raw_value(tag, TLVValueType::Null, &[])
    }

    fn bool(&mut self, tag: &TLVTag, val: bool) -> Result<(), Error> {
        self.tlv(tag, &TLVValue::bool(val))
    }

    /// Write a control byte, the tag and an already-encoded payload.
    ///
    /// The payload is whatever follows the tag in the wire format, i.e. the length prefix
    /// and value bytes, or for a container its members and end marker.
    /// Either the whole element is written or, on failure, nothing is.
    fn raw_value(
        &mut self,
        tag: &TLVTag,
        value_type: TLVValueType,
        value_payload: &[u8],
    ) -> Result<(), Error> {
        let start = self.get_tail();

        let mut write = || -> Result<(), Error> {
            self.write(TLVControl::new(tag.tag_type(), value_type).as_raw())?;

            match tag {
                TLVTag::Anonymous => Ok(()),
                TLVTag::Context(v) => self.write(*v),
                TLVTag::CommonPrf16(v) | TLVTag::ImplPrf16(v) => {
                    self.write_raw_data(v.to_le_bytes())
                }
                TLVTag::CommonPrf32(v) | TLVTag::ImplPrf32(v) => {
                    self.write_raw_data(v.to_le_bytes())
                }
                TLVTag::FullQual48 {
                    vendor_id,
                    profile,
                    tag,
                } => {
                    self.write_raw_data(vendor_id.to_le_bytes())?;
                    self.write_raw_data(profile.to_le_bytes())?;
                    self.write_raw_data(tag.to_le_bytes())
                }
                TLVTag::FullQual64 {
                    vendor_id,
                    profile,
                    tag,
                } => {
                    self.write_raw_data(vendor_id.to_le_bytes())?;
                    self.write_raw_data(profile.to_le_bytes())?;
                    self.write_raw_data(tag.to_le_bytes())
                }
            }?;

            self.write_raw_data(value_payload.iter().copied())
        };

        let result = write();
        if result.is_err() {
            self.rewind_to(start);
        }

        result
    }

    fn write_raw_data<I>(&mut self, bytes: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = u8>,
    {
        for byte in bytes {
            self.write(byte)?;
        }

        Ok(())
    }

    fn write(&mut self, byte: u8) -> Result<(), Error>;

    fn get_tail(&self) -> Self::Position;

    fn rewind_to(&mut self, pos: Self::Position);
}

impl<T> TLVWrite for &mut T
where
    T: TLVWrite,
{
    type Position = T::Position;

    fn write(&mut self, byte: u8) -> Result<(), Error> {
        (**self).write(byte)
    }

    fn get_tail(&self) -> Self::Position {
        (**self).get_tail()
    }

    fn rewind_to(&mut self, pos: Self::Position) {
        (**self).rewind_to(pos)
    }
}

impl TLVWrite for WriteBuf<'_> {
    type Position = usize;

    fn write(&mut self, byte: u8) -> Result<(), Error> {
        WriteBuf::append(self, &[byte])
    }

    fn get_tail(&self) -> Self::Position {
        WriteBuf::get_tail(self)
    }

    fn rewind_to(&mut self, pos: Self::Position) {
        WriteBuf::rewind_tail_to(self, pos)
    }
}

/// A TLVWrite implementation that counts the number of bytes written.
impl TLVWrite for usize {
    type Position = usize;

    fn write(&mut self, _byte: u8) -> Result<(), Error> {
        *self += 1;

        Ok(())
    }

    fn get_tail(&self) -> Self::Position {
        *self
    }

    fn rewind_to(&mut self, pos: Self::Position) {
        *self = pos;
    }
}

/// An open container in a TLV stream. See `TLVWrite::container`.
pub struct ContainerWriter<'w, W>
where
    W: TLVWrite,
{
    tw: &'w mut W,
    start: Option<W::Position>,
}

impl<W> ContainerWriter<'_, W>
where
    W: TLVWrite,
{
    /// Write the end marker, keeping the container in the stream.
    pub fn end(mut self) -> Result<(), Error> {
        self.tw.end_container()?;
        self.start = None;

        Ok(())
    }
}

impl<W> Deref for ContainerWriter<'_, W>
where
    W: TLVWrite,
{
    type Target = W;

    fn deref(&self) -> &Self::Target {
        self.tw
    }
}

impl<W> DerefMut for ContainerWriter<'_, W>
where
    W: TLVWrite,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.tw
    }
}

impl<W> Drop for ContainerWriter<'_, W>
where
    W: TLVWrite,
{
    fn drop(&mut self) {
        if let Some(start) = self.start.take() {
            self.tw.rewind_to(start);
        }
    }
}

fn len_prefix<T: TryFrom<usize>>(len: usize) -> Result<T, Error> {
    T::try_from(len).map_err(|_| {
        warn!("String of {} bytes does not fit its length prefix", len);
        ErrorCode::InvalidData.into()
    })
}

/// Encode `value` under `tag` into `buf` and return the encoded bytes.
///
/// If `buf` is too small, fails with `ErrorCode::NoSpace` and `Error::required_len`
/// set to the size of the complete encoding, so the caller can retry with a
/// large enough buffer.
pub fn to_tlv_buf<'b, T>(value: &T, tag: &TLVTag, buf: &'b mut [u8]) -> Result<&'b [u8], Error>
where
    T: ToTLV + ?Sized,
{
    let len = {
        let mut wb = WriteBuf::new(&mut *buf);

        match value.to_tlv(tag, &mut wb) {
            Ok(()) => wb.get_tail(),
            Err(err) if err.code() == ErrorCode::NoSpace => {
                let mut required = 0_usize;
                value.to_tlv(tag, &mut required)?;

                debug!(
                    "Encoding needs {} bytes, buffer holds {}",
                    required,
                    wb.capacity()
                );

                return Err(Error::no_space(required));
            }
            Err(err) => return Err(err),
        }
    };

    let buf: &'b [u8] = buf;

    Ok(&buf[..len])
}
