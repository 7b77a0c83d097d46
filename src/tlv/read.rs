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
use core::ops::{Deref, DerefMut};

use crate::error::{Error, ErrorCode};

use super::{pad, FromTLV, TLVControl, TLVTag, TLVValue, TLVValueType, MAX_TLV_DEPTH, TLV};

/// The element under the cursor, with its location in the stream.
#[derive(Debug, Clone, PartialEq)]
struct Current<'a> {
    tlv: TLV<'a>,
    /// Offset of the control byte.
    start: usize,
    /// Offset of the first byte after the tag (length prefix or value).
    value_start: usize,
    /// Offset right after the element. For a container start this is
    /// the offset of its first member.
    end: usize,
}

impl Current<'_> {
    fn is_container_start(&self) -> bool {
        self.tlv.value.value_type().is_container_start()
    }
}

/// A cursor over an immutable TLV byte stream.
///
/// The reader starts positioned before the first element. `next` moves the cursor
/// to the next sibling element, skipping over the members of a container the cursor
/// sits on unless the container was entered with `enter_container`.
///
/// Entering a container returns a `ContainerReader` guard. The guard dereferences to the
/// reader positioned inside the container and exits the container when dropped,
/// so container nesting always stays balanced, including on early returns.
///
/// The reader never copies the stream and never allocates. Cloning it is cheap and
/// produces an independent cursor over the same bytes.
#[derive(Clone, PartialEq)]
pub struct TLVReader<'a> {
    data: &'a [u8],
    /// Where the next element is parsed from when there is no current element.
    offset: usize,
    current: Option<Current<'a>>,
    /// The type of the innermost entered container, if any.
    container: Option<TLVValueType>,
    depth: usize,
}

impl<'a> TLVReader<'a> {
    /// Bind a new reader to the provided encoded TLV stream.
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            current: None,
            container: None,
            depth: 0,
        }
    }

    /// Return the whole stream this reader is bound to.
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Advance to the next element.
    ///
    /// Fails with:
    /// - `EndOfStream` when there are no more elements at the top level
    /// - `EndOfContainer` when the end marker of the entered container is reached;
    ///   iterating code should treat this as normal termination
    /// - `TruncatedPacket`, `InvalidData` or `Utf8Fail` on malformed input
    ///
    /// On failure the cursor does not move, so repeated calls keep returning the same error.
    pub fn next(&mut self) -> Result<(), Error> {
        let pos = self.next_offset()?;

        self.current = None;
        self.offset = pos;

        if pos >= self.data.len() {
            return Err(if self.container.is_some() {
                ErrorCode::TruncatedPacket
            } else {
                ErrorCode::EndOfStream
            }
            .into());
        }

        let current = parse(self.data, pos)?;

        if current.tlv.value == TLVValue::EndCnt {
            if self.container.is_none() {
                warn!("Unbalanced end of container at offset {}", pos);
                Err(ErrorCode::InvalidData)?;
            }

            return Err(ErrorCode::EndOfContainer.into());
        }

        self.current = Some(current);

        Ok(())
    }

    /// The type of the current element, or `None` if the cursor is not on an element.
    pub fn get_type(&self) -> Option<TLVValueType> {
        self.current.as_ref().map(|c| c.tlv.value.value_type())
    }

    /// The tag of the current element, or `None` if the cursor is not on an element.
    pub fn get_tag(&self) -> Option<&TLVTag> {
        self.current.as_ref().map(|c| &c.tlv.tag)
    }

    /// The tag and value of the current element.
    pub fn current(&self) -> Option<&TLV<'a>> {
        self.current.as_ref().map(|c| &c.tlv)
    }

    /// The value of the current element.
    ///
    /// Fails with `WrongTLVType` if the cursor is not on an element.
    pub fn value(&self) -> Result<&TLVValue<'a>, Error> {
        self.current
            .as_ref()
            .map(|c| &c.tlv.value)
            .ok_or_else(|| ErrorCode::WrongTLVType.into())
    }

    /// Decode the current element as `T`.
    pub fn get<T: FromTLV<'a>>(&self) -> Result<T, Error> {
        T::from_tlv(self)
    }

    /// Return the context tag number of the current element.
    ///
    /// Fails with `InvalidTLVTag` if the element carries a tag of any other form.
    pub fn ctx(&self) -> Result<u8, Error> {
        match self.get_tag() {
            Some(TLVTag::Context(tag)) => Ok(*tag),
            Some(_) => Err(ErrorCode::InvalidTLVTag.into()),
            None => Err(ErrorCode::WrongTLVType.into()),
        }
    }

    /// Check that the current element carries exactly `tag`.
    pub fn expect_tag(&self, tag: &TLVTag) -> Result<(), Error> {
        match self.get_tag() {
            Some(t) if t == tag => Ok(()),
            Some(_) => Err(ErrorCode::InvalidTLVTag.into()),
            None => Err(ErrorCode::WrongTLVType.into()),
        }
    }

    /// Return the number of containers entered by this reader.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Return the type of the innermost entered container, or `None` at the top level.
    pub const fn container_type(&self) -> Option<TLVValueType> {
        self.container
    }

    /// Return the complete encoding of the current element, from its control byte
    /// up to and including the end marker if the element is a container.
    pub fn raw_element(&self) -> Result<&'a [u8], Error> {
        let current = self.current.as_ref().ok_or(ErrorCode::WrongTLVType)?;

        Ok(&self.data[current.start..self.element_end(current)?])
    }

    /// Return the type of the current element and the encoding which follows its tag
    /// (length prefix, value and container members, if any).
    ///
    /// Combined with `TLVWrite::raw_value` this re-emits the element under a different tag.
    pub fn raw_value(&self) -> Result<(TLVValueType, &'a [u8]), Error> {
        let current = self.current.as_ref().ok_or(ErrorCode::WrongTLVType)?;

        Ok((
            current.tlv.value.value_type(),
            &self.data[current.value_start..self.element_end(current)?],
        ))
    }

    /// Enter the container the cursor is positioned on.
    ///
    /// The returned guard is positioned before the first member of the container.
    /// Dropping it (or calling `ContainerReader::exit`) moves this reader past the
    /// container's end marker, ready for `next` to read the following sibling.
    ///
    /// Fails with `WrongTLVType` if the current element is not a structure, array or list,
    /// and with `InvalidData` if the container would nest deeper than `MAX_TLV_DEPTH`.
    pub fn enter_container(&mut self) -> Result<ContainerReader<'_, 'a>, Error> {
        if !self
            .current
            .as_ref()
            .is_some_and(|current| current.is_container_start())
        {
            Err(ErrorCode::WrongTLVType)?;
        }

        if self.depth >= MAX_TLV_DEPTH {
            warn!("Container nesting exceeds {} levels", MAX_TLV_DEPTH);
            Err(ErrorCode::InvalidData)?;
        }

        let current = self.current.take().ok_or(ErrorCode::WrongTLVType)?;

        let outer = self.container;

        self.container = Some(current.tlv.value.value_type());
        self.depth += 1;
        self.offset = current.end;

        let depth = self.depth;

        Ok(ContainerReader {
            reader: self,
            outer,
            depth,
            exited: false,
        })
    }

    fn exit_container(&mut self, outer: Option<TLVValueType>, depth: usize) -> Result<(), Error> {
        debug_assert_eq!(
            self.depth, depth,
            "Container exited out of order (reader depth {}, guard depth {})",
            self.depth, depth
        );

        let end = self
            .next_offset()
            .and_then(|pos| skip_container(self.data, pos));

        self.container = outer;
        self.depth -= 1;
        self.current = None;

        match end {
            Ok(end) => {
                self.offset = end;
                Ok(())
            }
            Err(err) => {
                // Malformed container, nothing after it can be trusted
                self.offset = self.data.len();
                Err(err)
            }
        }
    }

    /// Where `next` continues from: past the current element, including
    /// the members of a current container which was not entered.
    fn next_offset(&self) -> Result<usize, Error> {
        match &self.current {
            Some(current) => self.element_end(current),
            None => Ok(self.offset),
        }
    }

    fn element_end(&self, current: &Current<'a>) -> Result<usize, Error> {
        if current.is_container_start() {
            skip_container(self.data, current.end)
        } else {
            Ok(current.end)
        }
    }
}

impl fmt::Debug for TLVReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.current {
            Some(current) => write!(
                f,
                "TLVReader(depth {}, @{}: {})",
                self.depth, current.start, current.tlv
            ),
            None => write!(f, "TLVReader(depth {}, @{})", self.depth, self.offset),
        }
    }
}

impl fmt::Display for TLVReader<'_> {
    /// Pretty-print the current element and everything after it at the same level.
    ///
    /// Printing stops at the first malformed element, which is reported in place.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reader = self.clone();
        if reader.current.is_none() && reader.next().is_err() {
            return Ok(());
        }

        let mut fmt_failed = false;

        let result = super::iterate(
            &reader,
            |r, depth| {
                let Some(tlv) = r.current() else {
                    return Ok(core::ops::ControlFlow::Continue(()));
                };

                if pad(depth, f).and_then(|_| writeln!(f, "{tlv}")).is_err() {
                    fmt_failed = true;
                    Err(ErrorCode::Failure)?;
                }

                Ok(core::ops::ControlFlow::Continue(()))
            },
            true,
        );

        match result {
            _ if fmt_failed => Err(fmt::Error),
            Ok(_) => Ok(()),
            Err(err) => writeln!(f, "<{}>", err),
        }
    }
}

/// A reader positioned inside a container.
///
/// Created by `TLVReader::enter_container`. Dereferences to the underlying `TLVReader`,
/// so members are read with the usual `next`/`get` calls and nested containers are
/// entered from here. The container is exited when the guard is dropped.
pub struct ContainerReader<'r, 'a> {
    reader: &'r mut TLVReader<'a>,
    outer: Option<TLVValueType>,
    depth: usize,
    exited: bool,
}

impl ContainerReader<'_, '_> {
    /// Exit the container, skipping any members which were not read.
    ///
    /// Unlike dropping the guard, this reports a malformed remainder of the container.
    pub fn exit(mut self) -> Result<(), Error> {
        self.exited = true;
        self.reader.exit_container(self.outer, self.depth)
    }
}

impl<'a> Deref for ContainerReader<'_, 'a> {
    type Target = TLVReader<'a>;

    fn deref(&self) -> &Self::Target {
        self.reader
    }
}

impl DerefMut for ContainerReader<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.reader
    }
}

impl Drop for ContainerReader<'_, '_> {
    fn drop(&mut self) {
        if !self.exited {
            if let Err(err) = self.reader.exit_container(self.outer, self.depth) {
                debug!("Dropped container reader over malformed data: {:?}", err);
            }
        }
    }
}

/// Parse the element whose control byte is at `pos`.
fn parse(data: &[u8], pos: usize) -> Result<Current<'_>, Error> {
    let control = TLVControl::parse(*data.get(pos).ok_or(ErrorCode::TruncatedPacket)?)?;

    if control.value_type.is_container_end() && !control.is_container_end() {
        warn!("Tagged end of container at offset {}", pos);
        Err(ErrorCode::InvalidData)?;
    }

    let tag_start = pos + 1;
    let tag = TLVTag::parse(control.tag_type, &data[tag_start..])?;

    let value_start = tag_start + control.tag_type.size();
    let value_type = control.value_type;

    let (value, end) = if let Some(size) = value_type.fixed_size() {
        let end = value_start + size;
        let bytes = data
            .get(value_start..end)
            .ok_or(ErrorCode::TruncatedPacket)?;

        (fixed_value(value_type, bytes)?, end)
    } else {
        let len_len = value_type.variable_size_len();
        let len_end = value_start + len_len;
        let len = le_uint(
            data.get(value_start..len_end)
                .ok_or(ErrorCode::TruncatedPacket)?,
        );

        let end = usize::try_from(len)
            .ok()
            .and_then(|len| len_end.checked_add(len))
            .ok_or(ErrorCode::TruncatedPacket)?;
        let bytes = data.get(len_end..end).ok_or(ErrorCode::TruncatedPacket)?;

        (variable_value(value_type, bytes)?, end)
    };

    Ok(Current {
        tlv: TLV::new(tag, value),
        start: pos,
        value_start,
        end,
    })
}

/// Given the offset of the first member of a container (or of any position inside it),
/// return the offset right after the container's end marker.
///
/// Nesting is tracked with a counter, so arbitrarily deep streams need no extra memory.
fn skip_container(data: &[u8], mut pos: usize) -> Result<usize, Error> {
    let mut depth = 1_usize;

    loop {
        let current = parse(data, pos)?;
        let value_type = current.tlv.value.value_type();

        if value_type.is_container_start() {
            depth += 1;
        } else if value_type.is_container_end() {
            depth -= 1;

            if depth == 0 {
                return Ok(current.end);
            }
        }

        pos = current.end;
    }
}

fn le_uint(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0_u64, |acc, byte| (acc << 8) | *byte as u64)
}

fn fixed_value(value_type: TLVValueType, bytes: &[u8]) -> Result<TLVValue<'_>, Error> {
    Ok(match value_type {
        TLVValueType::S8 => TLVValue::S8(i8::from_le_bytes(bytes.try_into()?)),
        TLVValueType::S16 => TLVValue::S16(i16::from_le_bytes(bytes.try_into()?)),
        TLVValueType::S32 => TLVValue::S32(i32::from_le_bytes(bytes.try_into()?)),
        TLVValueType::S64 => TLVValue::S64(i64::from_le_bytes(bytes.try_into()?)),
        TLVValueType::U8 => TLVValue::U8(bytes[0]),
        TLVValueType::U16 => TLVValue::U16(u16::from_le_bytes(bytes.try_into()?)),
        TLVValueType::U32 => TLVValue::U32(u32::from_le_bytes(bytes.try_into()?)),
        TLVValueType::U64 => TLVValue::U64(u64::from_le_bytes(bytes.try_into()?)),
        TLVValueType::F32 => TLVValue::F32(f32::from_le_bytes(bytes.try_into()?)),
        TLVValueType::F64 => TLVValue::F64(f64::from_le_bytes(bytes.try_into()?)),
        TLVValueType::False => TLVValue::False,
        TLVValueType::True => TLVValue::True,
        TLVValueType::Null => TLVValue::Null,
        TLVValueType::Struct => TLVValue::Struct,
        TLVValueType::Array => TLVValue::Array,
        TLVValueType::List => TLVValue::List,
        TLVValueType::EndCnt => TLVValue::EndCnt,
        _ => Err(ErrorCode::InvalidData)?,
    })
}

fn variable_value(value_type: TLVValueType, bytes: &[u8]) -> Result<TLVValue<'_>, Error> {
    Ok(match value_type {
        TLVValueType::Utf8l => TLVValue::Utf8l(core::str::from_utf8(bytes)?),
        TLVValueType::Utf16l => TLVValue::Utf16l(core::str::from_utf8(bytes)?),
        TLVValueType::Utf32l => TLVValue::Utf32l(core::str::from_utf8(bytes)?),
        TLVValueType::Utf64l => TLVValue::Utf64l(core::str::from_utf8(bytes)?),
        TLVValueType::Str8l => TLVValue::Str8l(bytes),
        TLVValueType::Str16l => TLVValue::Str16l(bytes),
        TLVValueType::Str32l => TLVValue::Str32l(bytes),
        TLVValueType::Str64l => TLVValue::Str64l(bytes),
        _ => Err(ErrorCode::InvalidData)?,
    })
}
