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

//! The read-only view over the statically declared endpoints of a node.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use crate::error::{Error, ErrorCode};
use crate::utils::rand::Rand;

use super::{Attribute, Cluster, ClusterId, Dataver, Endpoint, EndptId, Node};

/// A single-entry cache remembering the last resolved endpoint index.
///
/// Enumerating endpoints by index during a bulk read asks for index N right after index N-1,
/// so remembering where the previous one was found turns each step into a short forward scan.
///
/// Entries are tagged with the catalog generation they were computed in and are ignored
/// as soon as the generation changes.
#[derive(Debug, Default)]
pub struct EndpointIndexCache(AtomicU64);

impl EndpointIndexCache {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Return the cached `(index, position)` pair if it was stored in `generation`.
    ///
    /// `index` counts enabled endpoints only, `position` is the slot in the node declaration.
    pub fn get(&self, generation: u32) -> Option<(usize, usize)> {
        let packed = self.0.load(Ordering::Acquire);

        // Index is stored off by one, so that a zeroed entry is empty
        let index = ((packed >> 16) & 0xffff) as usize;

        ((packed >> 32) as u32 == generation && index > 0)
            .then(|| (index - 1, (packed & 0xffff) as usize))
    }

    pub fn set(&self, generation: u32, index: usize, position: usize) {
        if index >= 0xffff || position > 0xffff {
            return;
        }

        let packed = ((generation as u64) << 32) | (((index + 1) as u64) << 16) | position as u64;

        self.0.store(packed, Ordering::Release);
    }
}

struct EndpointSlot {
    enabled: AtomicBool,
    /// One per declared cluster, in declaration order
    versions: Vec<Dataver>,
}

/// The statically declared endpoints, clusters, attributes and commands of a node,
/// plus the little runtime state attached to them: the enabled flag of each endpoint
/// and the data version of each cluster.
///
/// All lookups are safe to call with untrusted ids and fail with a not-found error code
/// for anything that is not declared or whose endpoint is disabled.
pub struct Catalog<'a> {
    node: &'a Node<'a>,
    slots: Vec<EndpointSlot>,
    generation: AtomicU32,
    hint: EndpointIndexCache,
    rand: Rand,
}

impl<'a> Catalog<'a> {
    /// Create a catalog over the provided node, with all endpoints enabled.
    ///
    /// Data versions are seeded from `rand`.
    pub fn new(node: &'a Node<'a>, rand: Rand) -> Self {
        let slots = node
            .endpoints
            .iter()
            .enumerate()
            .map(|(position, endpoint)| {
                if node.endpoint(endpoint.id).map(|(first, _)| first) != Some(position) {
                    warn!(
                        "Endpt(0x{:04x}) declared more than once, ignoring the later declaration",
                        endpoint.id
                    );
                }

                EndpointSlot {
                    enabled: AtomicBool::new(true),
                    versions: endpoint
                        .clusters
                        .iter()
                        .map(|_| Dataver::new_rand(rand))
                        .collect(),
                }
            })
            .collect();

        Self {
            node,
            slots,
            generation: AtomicU32::new(1),
            hint: EndpointIndexCache::new(),
            rand,
        }
    }

    pub fn node(&self) -> &'a Node<'a> {
        self.node
    }

    /// The structural generation, changing every time an endpoint is enabled or disabled.
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Return the number of enabled endpoints.
    pub fn endpoint_count(&self) -> usize {
        self.enabled_positions().count()
    }

    /// Return the enabled endpoints, in declaration order.
    pub fn endpoints(&self) -> impl Iterator<Item = &'a Endpoint<'a>> + '_ {
        let endpoints = self.node.endpoints;

        self.enabled_positions()
            .map(move |position| &endpoints[position])
    }

    /// Return the enabled endpoint at `index`, counting enabled endpoints only.
    pub fn endpoint_at(&self, index: usize) -> Result<&'a Endpoint<'a>, Error> {
        let generation = self.generation();

        let position = match self.hint.get(generation) {
            Some((hint_index, hint_position)) if hint_index == index => Some(hint_position),
            Some((hint_index, hint_position)) if hint_index + 1 == index => {
                self.next_enabled(hint_position + 1)
            }
            _ => self.enabled_positions().nth(index),
        }
        .ok_or(ErrorCode::EndpointNotFound)?;

        self.hint.set(generation, index, position);

        Ok(&self.node.endpoints[position])
    }

    /// Return the index `endpoint_at` serves the enabled endpoint with the given ID at.
    pub fn index_of_endpoint(&self, id: EndptId) -> Result<usize, Error> {
        let generation = self.generation();

        if let Some((index, position)) = self.hint.get(generation) {
            if self.node.endpoints.get(position).map(|endpoint| endpoint.id) == Some(id) {
                return Ok(index);
            }
        }

        let position = self.position(id)?;
        let index = self
            .enabled_positions()
            .take_while(|enabled| *enabled < position)
            .count();

        self.hint.set(generation, index, position);

        Ok(index)
    }

    /// Return the enabled endpoint with the given ID.
    pub fn endpoint(&self, id: EndptId) -> Result<&'a Endpoint<'a>, Error> {
        Ok(&self.node.endpoints[self.position(id)?])
    }

    pub fn is_enabled(&self, id: EndptId) -> bool {
        self.position(id).is_ok()
    }

    /// Return the descriptor of a server cluster on an enabled endpoint.
    ///
    /// Fails with `EndpointNotFound` or `ClusterNotFound`.
    pub fn find_cluster(
        &self,
        endpoint: EndptId,
        cluster: ClusterId,
    ) -> Result<&'a Cluster<'a>, Error> {
        self.cluster_entry(endpoint, cluster).map(|(cluster, _)| cluster)
    }

    /// Return the attribute descriptors of a server cluster, in declaration order.
    ///
    /// The global attributes are implied and not part of the result.
    pub fn attributes_of(
        &self,
        endpoint: EndptId,
        cluster: ClusterId,
    ) -> Result<&'a [Attribute], Error> {
        self.find_cluster(endpoint, cluster)
            .map(|cluster| cluster.attributes)
    }

    /// Return the version store entry of a server cluster.
    pub fn data_version(&self, endpoint: EndptId, cluster: ClusterId) -> Result<&Dataver, Error> {
        self.cluster_entry(endpoint, cluster).map(|(_, dataver)| dataver)
    }

    /// Return the server clusters of an enabled endpoint with their data versions.
    pub fn server_clusters(
        &self,
        endpoint: EndptId,
    ) -> Result<impl Iterator<Item = (&'a Cluster<'a>, &Dataver)> + '_, Error> {
        let position = self.position(endpoint)?;
        let clusters = self.node.endpoints[position].clusters;

        Ok(clusters
            .iter()
            .zip(self.slots[position].versions.iter())
            .filter(|(cluster, _)| cluster.is_server()))
    }

    /// Enable an endpoint, returning `false` if it was already enabled.
    ///
    /// An endpoint coming back starts over with freshly seeded data versions.
    pub fn enable_endpoint(&self, id: EndptId) -> Result<bool, Error> {
        let (position, _) = self.node.endpoint(id).ok_or(ErrorCode::EndpointNotFound)?;
        let slot = &self.slots[position];

        if slot.enabled.load(Ordering::Acquire) {
            return Ok(false);
        }

        for dataver in &slot.versions {
            dataver.reseed(self.rand);
        }

        slot.enabled.store(true, Ordering::Release);
        self.bump_generation();

        info!("Endpt(0x{:04x}) enabled", id);

        Ok(true)
    }

    /// Disable an endpoint, returning `false` if it was already disabled.
    pub fn disable_endpoint(&self, id: EndptId) -> Result<bool, Error> {
        let (position, _) = self.node.endpoint(id).ok_or(ErrorCode::EndpointNotFound)?;

        if !self.slots[position].enabled.swap(false, Ordering::AcqRel) {
            return Ok(false);
        }

        self.bump_generation();

        info!("Endpt(0x{:04x}) disabled", id);

        Ok(true)
    }

    /// Return the descriptor and the data version of a server cluster on an enabled endpoint.
    pub(crate) fn cluster_entry(
        &self,
        endpoint: EndptId,
        cluster: ClusterId,
    ) -> Result<(&'a Cluster<'a>, &Dataver), Error> {
        let position = self.position(endpoint)?;

        let (index, descriptor) = self.node.endpoints[position]
            .server_cluster(cluster)
            .ok_or(ErrorCode::ClusterNotFound)?;

        let dataver = self.slots[position]
            .versions
            .get(index)
            .ok_or(ErrorCode::ClusterNotFound)?;

        Ok((descriptor, dataver))
    }

    /// Position of the enabled endpoint with the given ID.
    fn position(&self, id: EndptId) -> Result<usize, Error> {
        self.node
            .endpoint(id)
            .map(|(position, _)| position)
            .filter(|position| self.slots[*position].enabled.load(Ordering::Acquire))
            .ok_or_else(|| ErrorCode::EndpointNotFound.into())
    }

    fn enabled_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(position, slot)| {
                slot.enabled.load(Ordering::Acquire) && self.is_first_declaration(*position)
            })
            .map(|(position, _)| position)
    }

    fn next_enabled(&self, from: usize) -> Option<usize> {
        self.enabled_positions().find(|position| *position >= from)
    }

    fn is_first_declaration(&self, position: usize) -> bool {
        let id = self.node.endpoints[position].id;

        self.node.endpoint(id).map(|(first, _)| first) == Some(position)
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}
