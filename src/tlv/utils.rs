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

//! Generic traversal and search over a TLV stream.
//!
//! All utilities work on a private copy of the caller's reader, so the caller's
//! cursor is never moved. They never allocate: nesting is followed by recursion,
//! one stack frame per container level.

use core::ops::ControlFlow;

use crate::error::{Error, ErrorCode};

use super::{TLVReader, TLVTag};

/// How a traversal ended.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Traversal {
    /// Every element was visited (end of the TLV stream or of the enclosing container).
    End,
    /// The handler asked to stop.
    Stopped,
}

/// Visit every element in document order, starting at the element the reader is
/// positioned on (or at the next one, if it is not positioned on any).
///
/// The handler receives the reader positioned on each element and the element's nesting
/// depth relative to where the traversal started. Containers are descended into only if
/// `recurse` is `true`; the container element itself is always visited before its members.
///
/// Returning `ControlFlow::Break` from the handler stops the traversal with `Traversal::Stopped`,
/// returning an error stops it and propagates the error.
pub fn iterate<'a, F>(reader: &TLVReader<'a>, mut handler: F, recurse: bool) -> Result<Traversal, Error>
where
    F: FnMut(&TLVReader<'a>, usize) -> Result<ControlFlow<()>, Error>,
{
    let mut reader = reader.clone();

    if reader.current().is_none() && !advance(&mut reader)? {
        return Ok(Traversal::End);
    }

    walk(&mut reader, &mut handler, recurse, 0)
}

/// Count the elements `iterate` would visit.
pub fn count(reader: &TLVReader<'_>, recurse: bool) -> Result<usize, Error> {
    let mut count = 0;

    iterate(
        reader,
        |_, _| {
            count += 1;
            Ok(ControlFlow::Continue(()))
        },
        recurse,
    )?;

    Ok(count)
}

/// Return a reader positioned on the first element (in document order) tagged with `tag`.
///
/// Fails with `TagNotFound` if there is no such element.
pub fn find<'a>(reader: &TLVReader<'a>, tag: &TLVTag, recurse: bool) -> Result<TLVReader<'a>, Error> {
    find_with(reader, |r| Ok(r.get_tag() == Some(tag)), recurse)
}

/// Shorthand for `find` with a context tag.
pub fn find_ctx<'a>(reader: &TLVReader<'a>, tag: u8, recurse: bool) -> Result<TLVReader<'a>, Error> {
    find(reader, &TLVTag::Context(tag), recurse)
}

/// Return a reader positioned on the first element (in document order) matching `predicate`.
///
/// Fails with `TagNotFound` if no element matches, or with the first error
/// returned by the predicate.
pub fn find_with<'a, P>(reader: &TLVReader<'a>, mut predicate: P, recurse: bool) -> Result<TLVReader<'a>, Error>
where
    P: FnMut(&TLVReader<'a>) -> Result<bool, Error>,
{
    let mut found = None;

    iterate(
        reader,
        |r, _| {
            if predicate(r)? {
                found = Some(r.clone());
                Ok(ControlFlow::Break(()))
            } else {
                Ok(ControlFlow::Continue(()))
            }
        },
        recurse,
    )?;

    found.ok_or_else(|| ErrorCode::TagNotFound.into())
}

fn walk<'a, F>(reader: &mut TLVReader<'a>, handler: &mut F, recurse: bool, depth: usize) -> Result<Traversal, Error>
where
    F: FnMut(&TLVReader<'a>, usize) -> Result<ControlFlow<()>, Error>,
{
    loop {
        if handler(&*reader, depth)?.is_break() {
            return Ok(Traversal::Stopped);
        }

        let is_container = reader
            .get_type()
            .map(|t| t.is_container_start())
            .unwrap_or(false);

        if recurse && is_container {
            let mut container = reader.enter_container()?;

            if advance(&mut *container)?
                && walk(&mut *container, handler, recurse, depth + 1)? == Traversal::Stopped
            {
                return Ok(Traversal::Stopped);
            }

            container.exit()?;
        }

        if !advance(reader)? {
            return Ok(Traversal::End);
        }
    }
}

/// Move to the next element, returning `false` at the end of the stream or container.
fn advance(reader: &mut TLVReader<'_>) -> Result<bool, Error> {
    match reader.next() {
        Ok(()) => Ok(true),
        Err(err) if matches!(err.code(), ErrorCode::EndOfStream | ErrorCode::EndOfContainer) => {
            Ok(false)
        }
        Err(err) => Err(err),
    }
}
