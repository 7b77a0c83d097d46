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

use crate::error::Error;

/// A bounded, append-only byte buffer over a caller-provided slice.
///
/// Appends which do not fit fail with `ErrorCode::NoSpace`, recording how many bytes
/// the buffer would have needed to hold the data written so far. Nothing is ever
/// truncated: a failed append leaves the buffer contents unchanged.
#[derive(Debug)]
pub struct WriteBuf<'a> {
    buf: &'a mut [u8],
    end: usize,
}

impl<'a> WriteBuf<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, end: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn get_tail(&self) -> usize {
        self.end
    }

    pub fn rewind_tail_to(&mut self, new_end: usize) {
        debug_assert!(new_end <= self.end);

        self.end = new_end.min(self.end);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.end]
    }

    pub fn reset(&mut self) {
        self.end = 0;
    }

    pub fn append(&mut self, src: &[u8]) -> Result<(), Error> {
        let end = self.end + src.len();

        if end > self.buf.len() {
            return Err(Error::no_space(end));
        }

        self.buf[self.end..end].copy_from_slice(src);
        self.end = end;

        Ok(())
    }
}
