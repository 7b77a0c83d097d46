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

//! The runtime table of dynamically registered cluster implementations.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::{Error, ErrorCode};

use super::{ClusterHandler, ClusterId, EndptId};

/// A registered cluster implementation.
#[derive(Clone)]
pub struct Entry {
    pub endpoint: EndptId,
    pub cluster: ClusterId,
    pub handler: Arc<dyn ClusterHandler>,
}

impl core::fmt::Debug for Entry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Entry")
            .field("endpoint", &self.endpoint)
            .field("cluster", &self.cluster)
            .finish_non_exhaustive()
    }
}

/// An immutable view of the registry, as of the moment it was taken.
///
/// Registrations and removals completed after the snapshot was taken are not visible
/// through it, and the handlers it references stay alive for as long as it does.
#[derive(Debug, Clone)]
pub struct Snapshot(Arc<Vec<Entry>>);

impl Snapshot {
    pub fn get(&self, endpoint: EndptId, cluster: ClusterId) -> Option<&Arc<dyn ClusterHandler>> {
        self.0
            .iter()
            .find(|entry| entry.endpoint == endpoint && entry.cluster == cluster)
            .map(|entry| &entry.handler)
    }

    /// The entries registered on an endpoint, in registration order.
    pub fn on_endpoint(&self, endpoint: EndptId) -> impl Iterator<Item = &Entry> + '_ {
        self.0.iter().filter(move |entry| entry.endpoint == endpoint)
    }

    pub fn has_endpoint(&self, endpoint: EndptId) -> bool {
        self.on_endpoint(endpoint).next().is_some()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A table mapping (endpoint, cluster) pairs to cluster implementations.
///
/// Readers never block: every lookup works on a snapshot of the table.
/// Writers copy the table, modify the copy and publish it atomically, retrying if
/// another writer published in the meantime.
pub struct Registry {
    entries: ArcSwap<Vec<Entry>>,
    max_entries: usize,
}

impl Registry {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
            max_entries,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.entries.load_full())
    }

    /// Register a handler for a cluster on an endpoint.
    ///
    /// Fails with `Duplicate` if a handler is already registered for the pair, with `ResourceExhausted`
    /// if the table is full, and with `Invalid` if the handler describes a different cluster.
    pub fn register(
        &self,
        endpoint: EndptId,
        cluster: ClusterId,
        handler: Arc<dyn ClusterHandler>,
    ) -> Result<(), Error> {
        Self::check_descriptor(endpoint, cluster, &handler)?;

        self.update(|entries| {
            if entries
                .iter()
                .any(|entry| entry.endpoint == endpoint && entry.cluster == cluster)
            {
                warn!(
                    "Endpt(0x{:04x})::Cluster(0x{:04x}) already registered",
                    endpoint, cluster
                );
                Err(ErrorCode::Duplicate)?;
            }

            self.check_capacity(entries)?;

            let mut next = entries.clone();
            next.push(Entry {
                endpoint,
                cluster,
                handler: handler.clone(),
            });

            Ok((next, ()))
        })?;

        debug!(
            "Endpt(0x{:04x})::Cluster(0x{:04x}) registered",
            endpoint, cluster
        );

        Ok(())
    }

    /// Register a handler, replacing the one already registered for the pair, if any.
    ///
    /// A replaced handler keeps its position in the enumeration order.
    pub fn replace(
        &self,
        endpoint: EndptId,
        cluster: ClusterId,
        handler: Arc<dyn ClusterHandler>,
    ) -> Result<Option<Arc<dyn ClusterHandler>>, Error> {
        Self::check_descriptor(endpoint, cluster, &handler)?;

        self.update(|entries| {
            let mut next = entries.clone();

            let index = next
                .iter()
                .position(|entry| entry.endpoint == endpoint && entry.cluster == cluster);

            let replaced = match index {
                Some(index) => Some(core::mem::replace(
                    &mut next[index].handler,
                    handler.clone(),
                )),
                None => {
                    self.check_capacity(entries)?;

                    next.push(Entry {
                        endpoint,
                        cluster,
                        handler: handler.clone(),
                    });

                    None
                }
            };

            Ok((next, replaced))
        })
    }

    /// Remove the handler registered for the pair, returning it.
    ///
    /// Calls which took their snapshot before the removal keep using the handler until they complete.
    pub fn unregister(&self, endpoint: EndptId, cluster: ClusterId) -> Result<Arc<dyn ClusterHandler>, Error> {
        let handler = self.update(|entries| {
            let index = entries
                .iter()
                .position(|entry| entry.endpoint == endpoint && entry.cluster == cluster)
                .ok_or(ErrorCode::NotFound)?;

            let mut next = entries.clone();
            let removed = next.remove(index);

            Ok((next, removed.handler))
        })?;

        debug!(
            "Endpt(0x{:04x})::Cluster(0x{:04x}) unregistered",
            endpoint, cluster
        );

        Ok(handler)
    }

    pub fn get(&self, endpoint: EndptId, cluster: ClusterId) -> Option<Arc<dyn ClusterHandler>> {
        self.snapshot().get(endpoint, cluster).cloned()
    }

    /// The IDs of the clusters registered on an endpoint, in registration order.
    pub fn clusters_on_endpoint(&self, endpoint: EndptId) -> Vec<ClusterId> {
        self.snapshot()
            .on_endpoint(endpoint)
            .map(|entry| entry.cluster)
            .collect()
    }

    fn check_descriptor(
        endpoint: EndptId,
        cluster: ClusterId,
        handler: &Arc<dyn ClusterHandler>,
    ) -> Result<(), Error> {
        let described = handler.cluster().id;

        if described != cluster {
            warn!(
                "Endpt(0x{:04x})::Cluster(0x{:04x}) handler describes Cluster(0x{:04x})",
                endpoint, cluster, described
            );
            Err(ErrorCode::Invalid)?;
        }

        Ok(())
    }

    fn check_capacity(&self, entries: &[Entry]) -> Result<(), Error> {
        if entries.len() >= self.max_entries {
            warn!("Registry full ({} entries)", entries.len());
            Err(ErrorCode::ResourceExhausted)?;
        }

        Ok(())
    }

    fn update<F, R>(&self, mut f: F) -> Result<R, Error>
    where
        F: FnMut(&Vec<Entry>) -> Result<(Vec<Entry>, R), Error>,
    {
        loop {
            let cur = self.entries.load_full();
            let (next, result) = f(&cur)?;

            let prev = self.entries.compare_and_swap(&cur, Arc::new(next));
            if Arc::ptr_eq(&prev, &cur) {
                return Ok(result);
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(super::ProviderConfig::default().max_dynamic_clusters)
    }
}
