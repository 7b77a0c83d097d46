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

use matter_dm_core::dm::{
    Access, AttrPath, Attribute, ChangeNotify, Cluster, ClusterFlags, ClusterHandler, ClusterId,
    ClusterPath, CmdPath, Command, DirtyPath, Quality, Status,
};
use matter_dm_core::tlv::{TLVReader, TLVTag, TLVValueType, TLVWrite};
use matter_dm_core::utils::writebuf::WriteBuf;

pub const ATTR_MEASURED: u32 = 0x0000;
pub const ATTR_SETPOINT: u32 = 0x0001;

pub const CMD_ECHO: u32 = 0x00;
pub const CMD_ECHO_RESP: u32 = 0x01;

const ATTRIBUTES: &[Attribute] = &[
    Attribute::new(ATTR_MEASURED, TLVValueType::U32, Access::RV, Quality::NONE),
    Attribute::new(ATTR_SETPOINT, TLVValueType::U32, Access::RWVO, Quality::NONE),
];

const COMMANDS: &[Command] = &[Command::new(CMD_ECHO, Some(CMD_ECHO_RESP), Access::WO)];

/// The descriptor of an echo cluster published under `id`.
pub const fn descriptor(id: ClusterId) -> Cluster<'static> {
    Cluster::new(id, 1, 0, ClusterFlags::SERVER)
        .with_attributes(ATTRIBUTES)
        .with_commands(COMMANDS)
}

/// A cluster implementation which keeps a single setpoint.
///
/// Writing a zero setpoint fails with `ConstraintError`, the `Echo` command replies
/// with a struct holding the request's field 0 and stores it as the new setpoint.
pub struct EchoCluster {
    cluster: Cluster<'static>,
    version: AtomicU32,
    setpoint: AtomicU32,
}

impl EchoCluster {
    pub const fn new(id: ClusterId, version: u32) -> Self {
        Self {
            cluster: descriptor(id),
            version: AtomicU32::new(version),
            setpoint: AtomicU32::new(1),
        }
    }

    pub fn setpoint(&self) -> u32 {
        self.setpoint.load(Ordering::SeqCst)
    }

    fn set(&self, value: u32) {
        self.setpoint.store(value, Ordering::SeqCst);
        self.version.fetch_add(1, Ordering::SeqCst);
    }
}

impl ClusterHandler for EchoCluster {
    fn cluster(&self) -> &Cluster<'_> {
        &self.cluster
    }

    fn data_version(&self, _path: &ClusterPath) -> u32 {
        self.version.load(Ordering::SeqCst)
    }

    fn read(&self, path: &AttrPath, tw: &mut WriteBuf<'_>) -> Result<(), Status> {
        match path.attr {
            ATTR_MEASURED => tw.u32(&TLVTag::Anonymous, 42)?,
            ATTR_SETPOINT => tw.u32(&TLVTag::Anonymous, self.setpoint())?,
            _ => Err(Status::UnsupportedAttribute)?,
        }

        Ok(())
    }

    fn write(&self, path: &AttrPath, data: &TLVReader<'_>) -> Result<(), Status> {
        if path.attr != ATTR_SETPOINT {
            return Err(Status::UnsupportedWrite);
        }

        let value: u32 = data.get()?;
        if value == 0 {
            return Err(Status::ConstraintError);
        }

        self.set(value);

        Ok(())
    }

    fn invoke(
        &self,
        path: &CmdPath,
        data: &TLVReader<'_>,
        reply: &mut WriteBuf<'_>,
        notify: &dyn ChangeNotify,
    ) -> Result<(), Status> {
        if path.cmd != CMD_ECHO {
            return Err(Status::UnsupportedCommand);
        }

        let mut fields = data.clone();
        let mut container = fields.enter_container()?;
        container.next()?;
        let value: u32 = container.get()?;
        container.exit()?;

        let mut resp = reply.container(&TLVTag::Anonymous, TLVValueType::Struct)?;
        resp.u32(&TLVTag::Context(0), value)?;
        resp.end()?;

        self.set(value);
        notify.notify(&DirtyPath::attr(&AttrPath::new(
            path.endpoint,
            path.cluster,
            ATTR_SETPOINT,
        )));

        Ok(())
    }
}
