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

//! Storage for the values of attributes declared persistent.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::dm::AttrPath;
use crate::error::{Error, ErrorCode};

/// A key-value store for encoded attribute values.
///
/// Values are opaque to the delegate: a single TLV element with an anonymous tag.
pub trait PersistenceDelegate: Send + Sync {
    /// Load the value stored for `path` into `buf`.
    ///
    /// Returns the length of the value, or `None` if nothing is stored for the path.
    /// Fails with `BufferTooSmall` if the value does not fit.
    fn load(&self, path: &AttrPath, buf: &mut [u8]) -> Result<Option<usize>, Error>;

    /// Store the value for `path`, replacing the previous one.
    fn store(&self, path: &AttrPath, data: &[u8]) -> Result<(), Error>;
}

/// A delegate keeping the values in memory, for tests and for devices without storage.
#[derive(Debug, Default)]
pub struct MemPersist {
    values: Mutex<HashMap<AttrPath, Vec<u8>>>,
}

impl MemPersist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistenceDelegate for MemPersist {
    fn load(&self, path: &AttrPath, buf: &mut [u8]) -> Result<Option<usize>, Error> {
        let values = self
            .values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let Some(value) = values.get(path) else {
            return Ok(None);
        };

        let dest = buf
            .get_mut(..value.len())
            .ok_or(ErrorCode::BufferTooSmall)?;
        dest.copy_from_slice(value);

        Ok(Some(value.len()))
    }

    fn store(&self, path: &AttrPath, data: &[u8]) -> Result<(), Error> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(*path, data.to_vec());

        Ok(())
    }
}

/// A delegate keeping one file per attribute under a directory.
#[derive(Debug, Clone)]
pub struct FilePersist {
    dir: PathBuf,
}

impl FilePersist {
    /// Create a delegate storing under `dir`, creating the directory if it does not exist.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        fs::create_dir_all(dir.as_ref())?;

        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, path: &AttrPath) -> PathBuf {
        self.dir.join(format!(
            "{:04x}-{:08x}-{:08x}.tlv",
            path.endpoint, path.cluster, path.attr
        ))
    }
}

impl PersistenceDelegate for FilePersist {
    fn load(&self, path: &AttrPath, buf: &mut [u8]) -> Result<Option<usize>, Error> {
        let mut file = match fs::File::open(self.file(path)) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => Err(err)?,
        };

        let mut offset = 0;

        loop {
            if offset == buf.len() {
                // Only a full buffer at the end of the file is fine
                let mut extra = [0; 1];
                if file.read(&mut extra)? > 0 {
                    Err(ErrorCode::BufferTooSmall)?;
                }

                break;
            }

            let len = file.read(&mut buf[offset..])?;

            if len == 0 {
                break;
            }

            offset += len;
        }

        trace!("{}: loaded {} bytes {:?}", path, offset, &buf[..offset]);

        Ok(Some(offset))
    }

    fn store(&self, path: &AttrPath, data: &[u8]) -> Result<(), Error> {
        let mut file = fs::File::create(self.file(path))?;

        file.write_all(data)?;

        trace!("{}: stored {} bytes {:?}", path, data.len(), data);

        Ok(())
    }
}
