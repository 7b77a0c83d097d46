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

//! The merged view over static metadata and dynamically registered clusters.

use std::sync::Arc;

use crate::error::{Error, ErrorCode};
use crate::persist::PersistenceDelegate;
use crate::tlv::{TLVReader, TLVTag};
use crate::utils::writebuf::WriteBuf;

use super::{
    AttrPath, Attribute, AttrStore, Catalog, ChangeNotify, Cluster, ClusterFlags, ClusterHandler,
    ClusterId, ClusterPath, CmdId, CmdPath, CommandHandler, Dataver, DirtyPath, EndptId,
    GlobalElements, Registry, Snapshot, Status,
};

/// Code-level configuration of a `Provider`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ProviderConfig {
    /// How many dynamic clusters may be registered at the same time
    pub max_dynamic_clusters: usize,
    /// The longest encoded attribute value the static storage accepts
    pub max_attr_value_len: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            max_dynamic_clusters: 64,
            max_attr_value_len: 1024,
        }
    }
}

/// A server cluster as reported by `Provider::server_clusters`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ServerCluster {
    pub id: ClusterId,
    pub data_version: u32,
    pub flags: ClusterFlags,
}

/// The authoritative source for an (endpoint, cluster) pair.
#[derive(Clone)]
pub enum ClusterHandle<'a> {
    /// A registered implementation
    Dynamic(Arc<dyn ClusterHandler>),
    /// Static metadata, with values served from the attribute store
    Static {
        cluster: &'a Cluster<'a>,
        dataver: &'a Dataver,
    },
}

impl ClusterHandle<'_> {
    pub fn descriptor(&self) -> &Cluster<'_> {
        match self {
            Self::Dynamic(handler) => handler.cluster(),
            Self::Static { cluster, .. } => cluster,
        }
    }

    pub fn data_version(&self, path: &ClusterPath) -> u32 {
        match self {
            Self::Dynamic(handler) => handler.data_version(path),
            Self::Static { dataver, .. } => dataver.get(),
        }
    }

    pub fn flags(&self, path: &ClusterPath) -> ClusterFlags {
        match self {
            Self::Dynamic(handler) => handler.flags(path),
            Self::Static { cluster, .. } => cluster.flags,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl core::fmt::Debug for ClusterHandle<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Dynamic(handler) => write!(f, "Dynamic({})", handler.cluster().id),
            Self::Static { cluster, dataver } => {
                write!(f, "Static({}, dataver {})", cluster.id, dataver.get())
            }
        }
    }
}

/// The data model provider.
///
/// Answers Read, Write and Invoke requests for concrete paths by first looking for a
/// dynamically registered cluster implementation and then falling back to the static metadata
/// of the catalog, whose attribute values live in an internal store.
///
/// Requests are expected to be authorized before they reach the provider.
///
/// Every call works on one snapshot of the registry, so registrations happening on other
/// threads become visible to calls starting after they complete, and never mid-call.
pub struct Provider<'a, N = ()> {
    catalog: &'a Catalog<'a>,
    registry: Registry,
    store: AttrStore,
    persist: Option<&'a dyn PersistenceDelegate>,
    commands: Option<&'a dyn CommandHandler>,
    notify: N,
    config: ProviderConfig,
}

impl<'a> Provider<'a> {
    pub fn new(catalog: &'a Catalog<'a>, config: ProviderConfig) -> Self {
        Self {
            catalog,
            registry: Registry::new(config.max_dynamic_clusters),
            store: AttrStore::new(),
            persist: None,
            commands: None,
            notify: (),
            config,
        }
    }
}

impl<'a, N> Provider<'a, N>
where
    N: ChangeNotify,
{
    /// Return a provider reporting changes to `notify`.
    pub fn with_notify<M: ChangeNotify>(self, notify: M) -> Provider<'a, M> {
        Provider {
            catalog: self.catalog,
            registry: self.registry,
            store: self.store,
            persist: self.persist,
            commands: self.commands,
            notify,
            config: self.config,
        }
    }

    /// Return a provider storing PERSISTENT attributes of static clusters through `persist`.
    pub fn with_persist(self, persist: &'a dyn PersistenceDelegate) -> Self {
        Self {
            persist: Some(persist),
            ..self
        }
    }

    /// Return a provider running the commands of static clusters with `commands`.
    pub fn with_commands(self, commands: &'a dyn CommandHandler) -> Self {
        Self {
            commands: Some(commands),
            ..self
        }
    }

    pub fn catalog(&self) -> &'a Catalog<'a> {
        self.catalog
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Register a cluster implementation, shadowing any static metadata for the same cluster.
    pub fn register(
        &self,
        endpoint: EndptId,
        cluster: ClusterId,
        handler: Arc<dyn ClusterHandler>,
    ) -> Result<(), Error> {
        self.registry.register(endpoint, cluster, handler)?;
        self.notify.notify(&DirtyPath::endpoint(endpoint));

        Ok(())
    }

    /// Register a cluster implementation, replacing the one already registered, if any.
    pub fn replace(
        &self,
        endpoint: EndptId,
        cluster: ClusterId,
        handler: Arc<dyn ClusterHandler>,
    ) -> Result<Option<Arc<dyn ClusterHandler>>, Error> {
        let replaced = self.registry.replace(endpoint, cluster, handler)?;
        self.notify.notify(&DirtyPath::endpoint(endpoint));

        Ok(replaced)
    }

    pub fn unregister(
        &self,
        endpoint: EndptId,
        cluster: ClusterId,
    ) -> Result<Arc<dyn ClusterHandler>, Error> {
        let handler = self.registry.unregister(endpoint, cluster)?;
        self.notify.notify(&DirtyPath::endpoint(endpoint));

        Ok(handler)
    }

    pub fn enable_endpoint(&self, endpoint: EndptId) -> Result<(), Error> {
        if self.catalog.enable_endpoint(endpoint)? {
            self.notify.notify(&DirtyPath::endpoint(endpoint));
        }

        Ok(())
    }

    pub fn disable_endpoint(&self, endpoint: EndptId) -> Result<(), Error> {
        if self.catalog.disable_endpoint(endpoint)? {
            self.notify.notify(&DirtyPath::endpoint(endpoint));
        }

        Ok(())
    }

    /// Resolve the authoritative source of a cluster within a registry snapshot.
    ///
    /// Fails with `EndpointNotFound` if neither source knows the endpoint,
    /// and with `ClusterNotFound` if the endpoint exists but the cluster does not.
    pub fn resolve(
        &self,
        snapshot: &Snapshot,
        endpoint: EndptId,
        cluster: ClusterId,
    ) -> Result<ClusterHandle<'a>, Error> {
        if let Some(handler) = snapshot.get(endpoint, cluster) {
            return Ok(ClusterHandle::Dynamic(handler.clone()));
        }

        match self.catalog.cluster_entry(endpoint, cluster) {
            Ok((cluster, dataver)) => Ok(ClusterHandle::Static { cluster, dataver }),
            Err(err)
                if err.code() == ErrorCode::EndpointNotFound && snapshot.has_endpoint(endpoint) =>
            {
                Err(ErrorCode::ClusterNotFound.into())
            }
            Err(err) => Err(err),
        }
    }

    /// The IDs of all endpoints: the enabled static ones in declaration order,
    /// followed by the ones only dynamic clusters live on, ascending.
    pub fn endpoints(&self) -> Vec<EndptId> {
        let snapshot = self.registry.snapshot();

        let mut endpoints = self
            .catalog
            .endpoints()
            .map(|endpoint| endpoint.id)
            .collect::<Vec<_>>();

        let mut dynamic_only = snapshot
            .entries()
            .iter()
            .map(|entry| entry.endpoint)
            .filter(|endpoint| !self.catalog.is_enabled(*endpoint))
            .collect::<Vec<_>>();

        dynamic_only.sort_unstable();
        dynamic_only.dedup();

        endpoints.extend(dynamic_only);

        endpoints
    }

    /// The server clusters of an endpoint, each listed once.
    ///
    /// Dynamically registered clusters come first, in registration order, reporting the version
    /// and flags of their implementation. Static clusters follow, in declaration order, skipping
    /// those a dynamic registration shadows, and report the versions of the catalog.
    pub fn server_clusters(&self, endpoint: EndptId) -> Result<Vec<ServerCluster>, Status> {
        let snapshot = self.registry.snapshot();

        let statics = match self.catalog.server_clusters(endpoint) {
            Ok(clusters) => Some(clusters),
            Err(_) if snapshot.has_endpoint(endpoint) => None,
            Err(err) => {
                debug!("Endpt(0x{:04x})::ServerClusters -> {}", endpoint, err);
                Err(err)?
            }
        };

        let dynamic_count = snapshot.on_endpoint(endpoint).count();
        let static_count = self
            .catalog
            .endpoint(endpoint)
            .map(|endpoint| endpoint.clusters.len())
            .unwrap_or(0);

        // Sized for the union, duplicates are dropped below
        let mut result = Vec::with_capacity(dynamic_count + static_count);
        let mut known = Vec::with_capacity(dynamic_count);

        for entry in snapshot.on_endpoint(endpoint) {
            let path = ClusterPath::new(endpoint, entry.cluster);

            result.push(ServerCluster {
                id: entry.cluster,
                data_version: entry.handler.data_version(&path),
                flags: entry.handler.flags(&path),
            });

            known.push(entry.cluster);
        }

        known.sort_unstable();

        for (cluster, dataver) in statics.into_iter().flatten() {
            if known.binary_search(&cluster.id).is_err() {
                result.push(ServerCluster {
                    id: cluster.id,
                    data_version: dataver.get(),
                    flags: cluster.flags,
                });
            }
        }

        debug_assert!(result.len() <= dynamic_count + static_count);

        Ok(result)
    }

    /// Return the data version of a cluster.
    pub fn data_version(&self, path: &ClusterPath) -> Result<u32, Status> {
        let snapshot = self.registry.snapshot();

        Ok(self
            .resolve(&snapshot, path.endpoint, path.cluster)?
            .data_version(path))
    }

    /// Read an attribute, encoding its value in `buf` with an anonymous tag.
    ///
    /// Returns the length of the encoding.
    pub fn read(&self, path: &AttrPath, buf: &mut [u8]) -> Result<usize, Status> {
        let result = self.read_attr(path, buf);

        match &result {
            Ok(len) => debug!("{}::Read -> Ok({} bytes)", path, len),
            Err(status) => debug!("{}::Read -> {}", path, status),
        }

        result
    }

    /// Write an attribute with the value the reader is positioned on.
    ///
    /// A reader not positioned on any element is advanced to the first one.
    /// An empty stream carries no value and fails with `ConstraintError`.
    pub fn write(&self, path: &AttrPath, data: &TLVReader<'_>) -> Result<(), Status> {
        let result = self.write_attr(path, data);

        match &result {
            Ok(()) => debug!("{}::Write -> Ok", path),
            Err(status) => debug!("{}::Write -> {}", path, status),
        }

        result
    }

    /// Invoke a command with the request fields in `data`, encoding a response, if any, in `reply`.
    ///
    /// Returns the length of the response. As with `write`, a reader not positioned on any
    /// element is advanced to the first one, if there is one.
    pub fn invoke(
        &self,
        path: &CmdPath,
        data: &TLVReader<'_>,
        reply: &mut [u8],
    ) -> Result<usize, Status> {
        let result = self.invoke_cmd(path, data, reply);

        match &result {
            Ok(len) => debug!("{}::Invoke -> Ok({} bytes)", path, len),
            Err(status) => debug!("{}::Invoke -> {}", path, status),
        }

        result
    }

    /// The IDs of the commands a cluster accepts.
    pub fn accepted_commands(&self, path: &ClusterPath) -> Result<Vec<CmdId>, Status> {
        let snapshot = self.registry.snapshot();
        let handle = self.resolve(&snapshot, path.endpoint, path.cluster)?;

        let commands = handle.descriptor().accepted_commands().collect();

        Ok(commands)
    }

    /// The IDs of the commands a cluster replies with, ascending and without repetitions.
    pub fn generated_commands(&self, path: &ClusterPath) -> Result<Vec<CmdId>, Status> {
        let snapshot = self.registry.snapshot();
        let handle = self.resolve(&snapshot, path.endpoint, path.cluster)?;

        let commands = handle.descriptor().generated_commands().collect();

        Ok(commands)
    }

    fn read_attr(&self, path: &AttrPath, buf: &mut [u8]) -> Result<usize, Status> {
        let snapshot = self.registry.snapshot();
        let handle = self.resolve(&snapshot, path.endpoint, path.cluster)?;
        let attr = Self::attribute(&handle, path)?;

        if !attr.access.is_readable() {
            warn!("{}: attribute is not readable", path);
            Err(Status::UnsupportedAttribute)?;
        }

        let mut wb = WriteBuf::new(buf);

        if let Ok(global) = GlobalElements::try_from(path.attr) {
            handle
                .descriptor()
                .read_global(global, &TLVTag::Anonymous, &mut wb)?;
        } else {
            match &handle {
                ClusterHandle::Dynamic(handler) => handler.read(path, &mut wb)?,
                ClusterHandle::Static { .. } => self.store.read(
                    path,
                    attr,
                    self.persist,
                    self.config.max_attr_value_len,
                    &mut wb,
                )?,
            }
        }

        Ok(wb.get_tail())
    }

    fn write_attr(&self, path: &AttrPath, data: &TLVReader<'_>) -> Result<(), Status> {
        let snapshot = self.registry.snapshot();
        let handle = self.resolve(&snapshot, path.endpoint, path.cluster)?;
        let attr = Self::attribute(&handle, path)?;

        if Attribute::is_system_attr(path.attr) || !attr.is_writable() {
            Err(Status::UnsupportedWrite)?;
        }

        let mut data = data.clone();
        if data.current().is_none() {
            data.next().map_err(|err| match err.code() {
                ErrorCode::EndOfStream | ErrorCode::EndOfContainer => {
                    warn!("{}: no value to write", path);
                    Status::ConstraintError
                }
                _ => Status::from(err),
            })?;
        }

        match &handle {
            ClusterHandle::Dynamic(handler) => handler.write(path, &data)?,
            ClusterHandle::Static { dataver, .. } => {
                let changed = self.store.write(
                    path,
                    attr,
                    &data,
                    self.persist,
                    self.config.max_attr_value_len,
                )?;

                if !changed {
                    return Ok(());
                }

                dataver.changed();
            }
        }

        self.notify.notify(&DirtyPath::attr(path));

        Ok(())
    }

    fn invoke_cmd(
        &self,
        path: &CmdPath,
        data: &TLVReader<'_>,
        reply: &mut [u8],
    ) -> Result<usize, Status> {
        let snapshot = self.registry.snapshot();
        let handle = self.resolve(&snapshot, path.endpoint, path.cluster)?;

        if handle.descriptor().command(path.cmd).is_none() {
            Err(ErrorCode::CommandNotFound)?;
        }

        // Commands without request fields come with an empty stream
        let mut data = data.clone();
        if data.current().is_none() {
            match data.next() {
                Err(err) if err.code() == ErrorCode::EndOfStream => (),
                other => other?,
            }
        }

        let mut wb = WriteBuf::new(reply);

        match &handle {
            ClusterHandle::Dynamic(handler) => handler.invoke(path, &data, &mut wb, &self.notify)?,
            ClusterHandle::Static { dataver, .. } => {
                let Some(commands) = self.commands else {
                    warn!("{}: no command handler for static clusters", path);
                    return Err(Status::Failure);
                };

                let changes = VersionedChanges {
                    cluster: path.cluster_path(),
                    dataver,
                    notify: &self.notify,
                };

                commands.invoke(path, &data, &mut wb, &changes)?;
            }
        }

        Ok(wb.get_tail())
    }

    fn attribute<'h>(handle: &'h ClusterHandle<'_>, path: &AttrPath) -> Result<&'h Attribute, Status> {
        handle
            .descriptor()
            .attribute(path.attr)
            .ok_or(Status::UnsupportedAttribute)
    }
}

/// Bumps the data version of a static cluster for each change reported within it.
struct VersionedChanges<'r> {
    cluster: ClusterPath,
    dataver: &'r Dataver,
    notify: &'r dyn ChangeNotify,
}

impl ChangeNotify for VersionedChanges<'_> {
    fn notify(&self, path: &DirtyPath) {
        if path.endpoint == self.cluster.endpoint && path.cluster == Some(self.cluster.cluster) {
            self.dataver.changed();
        }

        self.notify.notify(path);
    }
}
