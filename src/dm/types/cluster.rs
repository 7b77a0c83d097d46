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

use crate::error::Error;
use crate::tlv::{TLVTag, TLVWrite};

use super::{
    AttrId, Attribute, ClusterFlags, ClusterId, CmdId, Command, GlobalElements, GLOBAL_ATTRIBUTES,
};

/// A struct modeling the cluster meta-data
/// (i.e. what is the cluster ID, revision, features, attributes and their access, commands and their access)
/// in the Matter data model.
///
/// The global attributes are implied and must not be listed in `attributes`.
#[derive(Debug, Clone)]
pub struct Cluster<'a> {
    /// The ID of the cluster
    pub id: ClusterId,
    /// The revision of the cluster
    pub revision: u16,
    /// The feature map of the cluster
    pub feature_map: u32,
    /// Server/client role and other capability flags
    pub flags: ClusterFlags,
    /// The attributes of the cluster
    pub attributes: &'a [Attribute],
    /// The commands the cluster accepts
    pub commands: &'a [Command],
}

impl<'a> Cluster<'a> {
    /// Create a new cluster without attributes or commands.
    pub const fn new(id: ClusterId, revision: u16, feature_map: u32, flags: ClusterFlags) -> Self {
        Self {
            id,
            revision,
            feature_map,
            flags,
            attributes: &[],
            commands: &[],
        }
    }

    /// Return a new cluster with the provided attributes
    pub const fn with_attributes(self, attributes: &'a [Attribute]) -> Self {
        Self { attributes, ..self }
    }

    /// Return a new cluster with the provided commands
    pub const fn with_commands(self, commands: &'a [Command]) -> Self {
        Self { commands, ..self }
    }

    /// Return a new cluster with a modified revision
    pub const fn with_revision(self, revision: u16) -> Self {
        Self { revision, ..self }
    }

    /// Return a new cluster with a modified feature map
    pub const fn with_features(self, feature_map: u32) -> Self {
        Self {
            feature_map,
            ..self
        }
    }

    pub const fn is_server(&self) -> bool {
        self.flags.contains(ClusterFlags::SERVER)
    }

    /// Return a reference to the attribute with the given ID, if it exists.
    ///
    /// Global attributes are always found.
    pub fn attribute(&self, id: AttrId) -> Option<&Attribute> {
        self.attributes
            .iter()
            .chain(GLOBAL_ATTRIBUTES)
            .find(|attr| attr.id == id)
    }

    /// Return a reference to the command with the given ID, if it exists.
    pub fn command(&self, id: CmdId) -> Option<&Command> {
        self.commands.iter().find(|cmd| cmd.id == id)
    }

    /// The IDs of all attributes, the global ones included.
    pub fn attribute_ids(&self) -> impl Iterator<Item = AttrId> + '_ {
        self.attributes
            .iter()
            .chain(GLOBAL_ATTRIBUTES)
            .map(|attr| attr.id)
    }

    /// The IDs of the commands the cluster accepts, in declaration order.
    pub fn accepted_commands(&self) -> impl Iterator<Item = CmdId> + '_ {
        self.commands.iter().map(|cmd| cmd.id)
    }

    /// The IDs of the commands the cluster replies with, ascending and without repetitions.
    pub fn generated_commands(&self) -> impl Iterator<Item = CmdId> + '_ {
        // Selection over the response ids, so that no buffer is necessary
        let mut last = None;

        core::iter::from_fn(move || {
            let next = self
                .commands
                .iter()
                .filter_map(|cmd| cmd.resp_id)
                .filter(|id| last.map(|last| *id > last).unwrap_or(true))
                .min();

            if next.is_some() {
                last = next;
            }

            next
        })
    }

    /// Encode the value of a global attribute.
    pub fn read_global<W: TLVWrite>(
        &self,
        global: GlobalElements,
        tag: &TLVTag,
        mut tw: W,
    ) -> Result<(), Error> {
        match global {
            GlobalElements::GeneratedCmdList => {
                Self::encode_ids(tag, &mut tw, self.generated_commands())
            }
            GlobalElements::AcceptedCmdList => {
                Self::encode_ids(tag, &mut tw, self.accepted_commands())
            }
            GlobalElements::EventList => Self::encode_ids(tag, &mut tw, core::iter::empty()),
            GlobalElements::AttributeList => Self::encode_ids(tag, &mut tw, self.attribute_ids()),
            GlobalElements::FeatureMap => {
                debug!(
                    "Cluster(0x{:04x})::Attr::FeatureMap(0xfffc)::Read -> Ok({:08x})",
                    self.id, self.feature_map
                );
                tw.u32(tag, self.feature_map)
            }
            GlobalElements::ClusterRevision => {
                debug!(
                    "Cluster(0x{:04x})::Attr::ClusterRevision(0xfffd)::Read -> Ok({})",
                    self.id, self.revision
                );
                tw.u16(tag, self.revision)
            }
        }
    }

    fn encode_ids<W, I>(tag: &TLVTag, tw: &mut W, ids: I) -> Result<(), Error>
    where
        W: TLVWrite,
        I: Iterator<Item = u32>,
    {
        let mut array = tw.container(tag, crate::tlv::TLVValueType::Array)?;

        for id in ids {
            array.u32(&TLVTag::Anonymous, id)?;
        }

        array.end()
    }
}

impl fmt::Display for Cluster<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id: {}, ", self.id)?;

        write!(f, "attrs [")?;
        for (index, attr) in self.attributes.iter().enumerate() {
            if index > 0 {
                write!(f, ", {}", attr)?;
            } else {
                write!(f, "{}", attr)?;
            }
        }

        write!(f, "], cmds [")?;
        for (index, cmd) in self.commands.iter().enumerate() {
            if index > 0 {
                write!(f, ", {}", cmd)?;
            } else {
                write!(f, "{}", cmd)?;
            }
        }

        write!(f, "]")
    }
}
