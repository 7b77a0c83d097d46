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

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::error::{Error, ErrorCode};

/// The outcome of a provider operation, as reported to the requester.
///
/// A closed set: internal failures are collapsed into one of these and
/// their detail is logged instead of being reported.
/// The discriminants are the Interaction Model status codes.
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    Success = 0,
    Failure = 1,
    UnsupportedCommand = 0x81,
    UnsupportedAttribute = 0x86,
    ConstraintError = 0x87,
    UnsupportedWrite = 0x88,
    ResourceExhausted = 0x89,
    NotFound = 0x8b,
}

impl Status {
    pub const fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::from_u8(code)
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(0x{:02x})", self, self.code())
    }
}

impl From<ErrorCode> for Status {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::EndpointNotFound | ErrorCode::ClusterNotFound | ErrorCode::NotFound => {
                Status::NotFound
            }
            ErrorCode::AttributeNotFound => Status::UnsupportedAttribute,
            ErrorCode::CommandNotFound => Status::UnsupportedCommand,
            ErrorCode::UnsupportedWrite => Status::UnsupportedWrite,
            ErrorCode::ConstraintError | ErrorCode::WrongTLVType => Status::ConstraintError,
            ErrorCode::ResourceExhausted | ErrorCode::NoSpace | ErrorCode::BufferTooSmall => {
                Status::ResourceExhausted
            }
            _ => Status::Failure,
        }
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        let status = Status::from(err.code());

        if err.code().is_decode() {
            warn!("Decode error {} reported as {}", err, status);
        } else if status == Status::Failure {
            error!("Error {} reported as {}", err, status);
        } else {
            debug!("Error {} reported as {}", err, status);
        }

        status
    }
}
