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

pub use attribute::*;
pub use cluster::*;
pub use command::*;
pub use dataver::*;
pub use endpoint::*;
pub use handler::*;
pub use node::*;
pub use privilege::*;

mod attribute;
mod cluster;
mod command;
mod dataver;
mod endpoint;
mod handler;
mod node;
mod privilege;

pub type EndptId = u16;
pub type ClusterId = u32;
pub type AttrId = u32;
pub type CmdId = u32;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DeviceType {
    pub dtype: u16,
    pub drev: u16,
}

/// A concrete cluster path.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ClusterPath {
    pub endpoint: EndptId,
    pub cluster: ClusterId,
}

impl ClusterPath {
    pub const fn new(endpoint: EndptId, cluster: ClusterId) -> Self {
        Self { endpoint, cluster }
    }
}

impl fmt::Display for ClusterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Endpt(0x{:04x})::Cluster(0x{:04x})",
            self.endpoint, self.cluster
        )
    }
}

/// A concrete attribute path, as received from the layer above the provider.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct AttrPath {
    pub endpoint: EndptId,
    pub cluster: ClusterId,
    pub attr: AttrId,
}

impl AttrPath {
    pub const fn new(endpoint: EndptId, cluster: ClusterId, attr: AttrId) -> Self {
        Self {
            endpoint,
            cluster,
            attr,
        }
    }

    pub const fn cluster_path(&self) -> ClusterPath {
        ClusterPath::new(self.endpoint, self.cluster)
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::Attr(0x{:04x})", self.cluster_path(), self.attr)
    }
}

/// A concrete command path.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CmdPath {
    pub endpoint: EndptId,
    pub cluster: ClusterId,
    pub cmd: CmdId,
}

impl CmdPath {
    pub const fn new(endpoint: EndptId, cluster: ClusterId, cmd: CmdId) -> Self {
        Self {
            endpoint,
            cluster,
            cmd,
        }
    }

    pub const fn cluster_path(&self) -> ClusterPath {
        ClusterPath::new(self.endpoint, self.cluster)
    }
}

impl fmt::Display for CmdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::Cmd(0x{:04x})", self.cluster_path(), self.cmd)
    }
}

/// The path reported to change listeners.
///
/// A missing cluster is a wildcard: the structure of the endpoint changed
/// (clusters registered or removed, endpoint enabled or disabled) without any
/// particular cluster's data version changing.
/// A missing attribute means the cluster changed as a whole.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DirtyPath {
    pub endpoint: EndptId,
    pub cluster: Option<ClusterId>,
    pub attr: Option<AttrId>,
}

impl DirtyPath {
    pub const fn endpoint(endpoint: EndptId) -> Self {
        Self {
            endpoint,
            cluster: None,
            attr: None,
        }
    }

    pub const fn cluster(endpoint: EndptId, cluster: ClusterId) -> Self {
        Self {
            endpoint,
            cluster: Some(cluster),
            attr: None,
        }
    }

    pub const fn attr(path: &AttrPath) -> Self {
        Self {
            endpoint: path.endpoint,
            cluster: Some(path.cluster),
            attr: Some(path.attr),
        }
    }

    pub const fn is_wildcard(&self) -> bool {
        self.cluster.is_none()
    }
}

impl fmt::Display for DirtyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpt(0x{:04x})", self.endpoint)?;

        match self.cluster {
            Some(cluster) => write!(f, "::Cluster(0x{:04x})", cluster)?,
            None => write!(f, "::Cluster(*)")?,
        }

        if let Some(attr) = self.attr {
            write!(f, "::Attr(0x{:04x})", attr)?;
        }

        Ok(())
    }
}
