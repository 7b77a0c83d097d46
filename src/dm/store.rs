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

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Error, ErrorCode};
use crate::persist::PersistenceDelegate;
use crate::tlv::{TLVReader, TLVTag, TLVValueType, TLVWrite};
use crate::utils::writebuf::WriteBuf;

use super::{AttrPath, Attribute, Quality};

/// Backing storage for the attributes of statically declared clusters.
///
/// Values are kept encoded, as a single element with an anonymous tag.
/// Attributes of the PERSISTENT quality are additionally written through to
/// the persistence delegate, and loaded from it on first read.
#[derive(Debug, Default)]
pub struct AttrStore {
    values: RwLock<HashMap<AttrPath, Vec<u8>>>,
}

impl AttrStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode the current value of an attribute with an anonymous tag.
    ///
    /// Attributes never written report their persisted value, if any, and otherwise their default.
    pub fn read(
        &self,
        path: &AttrPath,
        attr: &Attribute,
        persist: Option<&dyn PersistenceDelegate>,
        max_len: usize,
        tw: &mut WriteBuf<'_>,
    ) -> Result<(), Error> {
        {
            let values = self
                .values
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            if let Some(value) = values.get(path) {
                return Self::emit(value, tw);
            }
        }

        if let Some(value) = self.load(path, attr, persist, max_len)? {
            self.emit_cached(path, value, tw)
        } else {
            attr.write_default(&TLVTag::Anonymous, tw)
        }
    }

    /// Store the value the reader is positioned on.
    ///
    /// Returns `false` if the attribute already had this very value.
    /// Fails with `ConstraintError` if the value is not of the declared element type,
    /// and with `ResourceExhausted` if its encoding is longer than `max_len`.
    pub fn write(
        &self,
        path: &AttrPath,
        attr: &Attribute,
        data: &TLVReader<'_>,
        persist: Option<&dyn PersistenceDelegate>,
        max_len: usize,
    ) -> Result<bool, Error> {
        let (value_type, payload) = data.raw_value()?;

        if !attr.accepts(value_type) {
            warn!(
                "{}: a {} value written to an attribute of type {}",
                path, value_type, attr.value_type
            );
            Err(ErrorCode::ConstraintError)?;
        }

        // Control byte, no tag
        let len = 1 + payload.len();
        if len > max_len {
            warn!("{}: a {} bytes value exceeds {} bytes", path, len, max_len);
            Err(ErrorCode::ResourceExhausted)?;
        }

        let mut value = vec![0; len];
        WriteBuf::new(&mut value).raw_value(&TLVTag::Anonymous, value_type, payload)?;

        let mut values = self
            .values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if values.get(path) == Some(&value) {
            return Ok(false);
        }

        if attr.quality.contains(Quality::PERSISTENT) {
            if let Some(persist) = persist {
                persist.store(path, &value)?;
            }
        }

        values.insert(*path, value);

        Ok(true)
    }

    fn load(
        &self,
        path: &AttrPath,
        attr: &Attribute,
        persist: Option<&dyn PersistenceDelegate>,
        max_len: usize,
    ) -> Result<Option<Vec<u8>>, Error> {
        let Some(persist) = persist.filter(|_| attr.quality.contains(Quality::PERSISTENT)) else {
            return Ok(None);
        };

        let mut buf = vec![0; max_len];
        let Some(len) = persist.load(path, &mut buf)? else {
            return Ok(None);
        };

        buf.truncate(len);

        match Self::value_type_of(&buf) {
            Ok(value_type) if attr.accepts(value_type) => Ok(Some(buf)),
            _ => {
                warn!("{}: ignoring malformed persisted value {:?}", path, buf);
                Ok(None)
            }
        }
    }

    fn emit_cached(&self, path: &AttrPath, value: Vec<u8>, tw: &mut WriteBuf<'_>) -> Result<(), Error> {
        let mut values = self
            .values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // A write which raced with the load wins
        let value = values.entry(*path).or_insert(value);

        Self::emit(value, tw)
    }

    fn emit(value: &[u8], tw: &mut WriteBuf<'_>) -> Result<(), Error> {
        let mut reader = TLVReader::new(value);
        reader.next()?;

        let (value_type, payload) = reader.raw_value()?;

        tw.raw_value(&TLVTag::Anonymous, value_type, payload)
    }

    fn value_type_of(value: &[u8]) -> Result<TLVValueType, Error> {
        let mut reader = TLVReader::new(value);
        reader.next()?;

        if reader.raw_element()?.len() != value.len() {
            Err(ErrorCode::InvalidData)?;
        }

        reader.get_type().ok_or_else(|| ErrorCode::InvalidData.into())
    }
}
