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

use core::sync::atomic::{AtomicU32, Ordering};

use crate::utils::rand::{rand_u32, Rand};

/// A cluster data version.
///
/// Shared between request paths without locking. Wraps around on overflow,
/// which only happens after 2^32 mutations.
#[derive(Debug, Default)]
pub struct Dataver(AtomicU32);

impl Dataver {
    pub fn new_rand(rand: Rand) -> Self {
        Self::new(rand_u32(rand))
    }

    pub const fn new(initial: u32) -> Self {
        Self(AtomicU32::new(initial))
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    /// Mark the cluster as changed, returning the new version.
    pub fn changed(&self) -> u32 {
        self.0.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Start over from a fresh seed. Only valid when the owning endpoint is re-added.
    pub(crate) fn reseed(&self, rand: Rand) {
        self.0.store(rand_u32(rand), Ordering::Release);
    }
}
