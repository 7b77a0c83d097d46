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

use crate::dm::Status;
use crate::tlv::TLVReader;
use crate::utils::writebuf::WriteBuf;

use super::{AttrPath, Cluster, ClusterFlags, ClusterPath, CmdPath, DirtyPath};

/// A listener for data model changes, e.g. the subscription engine.
pub trait ChangeNotify {
    fn notify(&self, path: &DirtyPath);
}

impl ChangeNotify for () {
    fn notify(&self, _path: &DirtyPath) {
        // No-op
    }
}

impl<F> ChangeNotify for F
where
    F: Fn(&DirtyPath),
{
    fn notify(&self, path: &DirtyPath) {
        self(path)
    }
}

/// A cluster implementation registered at runtime.
///
/// The handler is the single source of truth for its (endpoint, cluster) pair:
/// its descriptor, data version and flags shadow any static metadata for the same cluster.
///
/// Statuses returned by the handler are reported to the requester verbatim.
pub trait ClusterHandler: Send + Sync {
    /// The descriptor of the cluster.
    ///
    /// The provider checks attribute and command ids against it before dispatching,
    /// and answers the global attributes from it.
    fn cluster(&self) -> &Cluster<'_>;

    fn data_version(&self, path: &ClusterPath) -> u32;

    fn flags(&self, _path: &ClusterPath) -> ClusterFlags {
        self.cluster().flags
    }

    /// Encode the value of a non-global attribute, with an anonymous tag.
    fn read(&self, path: &AttrPath, tw: &mut WriteBuf<'_>) -> Result<(), Status>;

    /// Store the value the reader is positioned on.
    ///
    /// Only called for attributes the descriptor declares writable.
    /// The handler is responsible for bumping its own data version.
    fn write(&self, _path: &AttrPath, _data: &TLVReader<'_>) -> Result<(), Status> {
        Err(Status::UnsupportedWrite)
    }

    /// Run a command whose request fields the reader is positioned on.
    ///
    /// A response, if any, is encoded in `reply`.
    /// Attributes changed by the command are reported through `notify`.
    fn invoke(
        &self,
        _path: &CmdPath,
        _data: &TLVReader<'_>,
        _reply: &mut WriteBuf<'_>,
        _notify: &dyn ChangeNotify,
    ) -> Result<(), Status> {
        Err(Status::UnsupportedCommand)
    }
}

/// The business logic behind the commands of statically declared clusters.
///
/// Each attribute reported through `notify` bumps the data version of its cluster.
pub trait CommandHandler: Send + Sync {
    fn invoke(
        &self,
        path: &CmdPath,
        data: &TLVReader<'_>,
        reply: &mut WriteBuf<'_>,
        notify: &dyn ChangeNotify,
    ) -> Result<(), Status>;
}
