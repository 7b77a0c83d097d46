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

use core::{array::TryFromSliceError, fmt, str::Utf8Error};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ErrorCode {
    AttributeNotFound,
    BufferTooSmall,
    ClusterNotFound,
    CommandNotFound,
    ConstraintError,
    Duplicate,
    EndOfContainer,
    EndOfStream,
    EndpointNotFound,
    Failure,
    Invalid,
    InvalidData,
    InvalidTLVTag,
    NoSpace,
    NotFound,
    ResourceExhausted,
    StdIoError,
    TagNotFound,
    TruncatedPacket,
    UnsupportedWrite,
    Utf8Fail,
    WrongTLVType,
}

impl ErrorCode {
    /// Return `true` for the error codes produced while decoding
    /// a malformed or unexpected TLV stream.
    pub const fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::EndOfContainer
                | Self::EndOfStream
                | Self::InvalidData
                | Self::InvalidTLVTag
                | Self::TruncatedPacket
                | Self::Utf8Fail
                | Self::WrongTLVType
        )
    }
}

impl From<ErrorCode> for Error {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Error {
    code: ErrorCode,
    required: Option<usize>,
}

impl Error {
    pub const fn new(code: ErrorCode) -> Self {
        Self {
            code,
            required: None,
        }
    }

    /// Create a `NoSpace` error which records the total number of bytes
    /// the failed operation would have needed.
    pub const fn no_space(required: usize) -> Self {
        Self {
            code: ErrorCode::NoSpace,
            required: Some(required),
        }
    }

    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// The number of bytes needed to complete the operation, if known.
    ///
    /// Only ever set for `ErrorCode::NoSpace`.
    pub const fn required_len(&self) -> Option<usize> {
        self.required
    }

    pub fn remap<F>(self, matcher: F, to: Self) -> Self
    where
        F: FnOnce(&Self) -> bool,
    {
        if matcher(&self) {
            to
        } else {
            self
        }
    }

    pub fn map_invalid(self, to: Self) -> Self {
        self.remap(
            |e| matches!(e.code(), ErrorCode::Invalid | ErrorCode::InvalidData),
            to,
        )
    }

    pub fn map_wrong_type(self) -> Self {
        self.remap(
            |e| matches!(e.code(), ErrorCode::WrongTLVType),
            Error::new(ErrorCode::ConstraintError),
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        ::log::error!("I/O error: {}", e);
        Self::new(ErrorCode::StdIoError)
    }
}

impl From<TryFromSliceError> for Error {
    fn from(_e: TryFromSliceError) -> Self {
        Self::new(ErrorCode::TruncatedPacket)
    }
}

impl From<Utf8Error> for Error {
    fn from(_e: Utf8Error) -> Self {
        Self::new(ErrorCode::Utf8Fail)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error::{}", self)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.required {
            Some(required) => write!(f, "{:?} (required {} bytes)", self.code(), required),
            None => write!(f, "{:?}", self.code()),
        }
    }
}

impl std::error::Error for Error {}
