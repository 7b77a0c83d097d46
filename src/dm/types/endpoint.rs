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

use super::{Cluster, ClusterId, DeviceType, EndptId};

/// How the child endpoints of an endpoint relate to it.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Composition {
    /// All endpoints of the node below this one are its children
    #[default]
    FullFamily,
    /// Only the endpoints which name this one as their parent are its children
    Tree,
}

#[derive(Debug, Clone)]
pub struct Endpoint<'a> {
    pub id: EndptId,
    pub device_types: &'a [DeviceType],
    pub composition: Composition,
    pub clusters: &'a [Cluster<'a>],
}

impl<'a> Endpoint<'a> {
    pub const fn new(id: EndptId) -> Self {
        Self {
            id,
            device_types: &[],
            composition: Composition::FullFamily,
            clusters: &[],
        }
    }

    pub const fn with_device_types(self, device_types: &'a [DeviceType]) -> Self {
        Self {
            device_types,
            ..self
        }
    }

    pub const fn with_composition(self, composition: Composition) -> Self {
        Self {
            composition,
            ..self
        }
    }

    pub const fn with_clusters(self, clusters: &'a [Cluster<'a>]) -> Self {
        Self { clusters, ..self }
    }

    /// Return the position and the descriptor of the server cluster with the given ID.
    pub fn server_cluster(&self, id: ClusterId) -> Option<(usize, &'a Cluster<'a>)> {
        self.clusters
            .iter()
            .enumerate()
            .find(|(_, cluster)| cluster.id == id && cluster.is_server())
    }
}

impl fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clusters:[")?;
        let mut comma = "";
        for cluster in self.clusters {
            write!(f, "{} {{ {} }}", comma, cluster)?;
            comma = ", ";
        }

        write!(f, "]")
    }
}
