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

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use matter_dm_core::dm::{
    AttrPath, Catalog, ChangeNotify, ClusterPath, CmdPath, CommandHandler, DirtyPath, Provider,
    ProviderConfig, Status,
};
use matter_dm_core::tlv::{TLVReader, TLVTag, TLVValueType, TLVWrite};
use matter_dm_core::utils::rand::dummy_rand;
use matter_dm_core::utils::writebuf::WriteBuf;

use crate::common::echo_cluster::{EchoCluster, ATTR_SETPOINT, CMD_ECHO, CMD_ECHO_RESP};
use crate::common::{
    init_env_logger, Marks, CMD_MOVE_TO_LEVEL, CMD_OFF, CMD_ON, CMD_TOGGLE, LEVEL_CONTROL, NODE,
    ON_OFF, ON_OFF_ATTR,
};

/// Runs the commands of the static On/Off clusters.
#[derive(Default)]
struct Lights {
    on: AtomicBool,
}

impl CommandHandler for Lights {
    fn invoke(
        &self,
        path: &CmdPath,
        _data: &TLVReader<'_>,
        _reply: &mut WriteBuf<'_>,
        notify: &dyn ChangeNotify,
    ) -> Result<(), Status> {
        if path.cluster != ON_OFF {
            return Err(Status::UnsupportedCommand);
        }

        let on = match path.cmd {
            CMD_OFF => false,
            CMD_ON => true,
            CMD_TOGGLE => !self.on.load(Ordering::SeqCst),
            _ => return Err(Status::UnsupportedCommand),
        };

        if self.on.swap(on, Ordering::SeqCst) != on {
            notify.notify(&DirtyPath::attr(&AttrPath::new(
                path.endpoint,
                path.cluster,
                ON_OFF_ATTR,
            )));
        }

        Ok(())
    }
}

fn echo_request(value: u32) -> Vec<u8> {
    let mut buf = [0; 16];
    let mut wb = WriteBuf::new(&mut buf);

    let mut fields = wb.container(&TLVTag::Anonymous, TLVValueType::Struct).unwrap();
    fields.u32(&TLVTag::Context(0), value).unwrap();
    fields.end().unwrap();

    wb.as_slice().to_vec()
}

#[test]
fn test_invoke_dynamic() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let marks = Marks::default();
    let provider = Provider::new(&catalog, ProviderConfig::default()).with_notify(marks.notifier());

    let echo = Arc::new(EchoCluster::new(0xfc00, 1));
    provider.register(1, 0xfc00, echo.clone()).unwrap();
    marks.take();

    let request = echo_request(0x1234);
    let mut reply = [0; 16];

    let len = provider
        .invoke(&CmdPath::new(1, 0xfc00, CMD_ECHO), &TLVReader::new(&request), &mut reply)
        .unwrap();

    assert_eq!(&reply[..len], &[0x15, 0x25, 0x00, 0x34, 0x12, 0x18]);
    assert_eq!(echo.setpoint(), 0x1234);
    assert_eq!(
        marks.take(),
        [DirtyPath::attr(&AttrPath::new(1, 0xfc00, ATTR_SETPOINT))]
    );

    assert_eq!(
        provider.invoke(
            &CmdPath::new(1, 0xfc00, CMD_ECHO_RESP),
            &TLVReader::new(&request),
            &mut reply
        ),
        Err(Status::UnsupportedCommand)
    );

    // A request without the mandatory field
    assert_eq!(
        provider.invoke(
            &CmdPath::new(1, 0xfc00, CMD_ECHO),
            &TLVReader::new(&[0x15, 0x18]),
            &mut reply
        ),
        Err(Status::Failure)
    );
}

#[test]
fn test_invoke_static_without_handler() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());

    let mut reply = [0; 16];

    assert_eq!(
        provider.invoke(&CmdPath::new(1, ON_OFF, CMD_ON), &TLVReader::new(&[]), &mut reply),
        Err(Status::Failure)
    );
    assert_eq!(
        provider.invoke(&CmdPath::new(1, ON_OFF, 0x40), &TLVReader::new(&[]), &mut reply),
        Err(Status::UnsupportedCommand)
    );
    assert_eq!(
        provider.invoke(&CmdPath::new(7, ON_OFF, CMD_ON), &TLVReader::new(&[]), &mut reply),
        Err(Status::NotFound)
    );
}

#[test]
fn test_invoke_static() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let lights = Lights::default();
    let marks = Marks::default();
    let provider = Provider::new(&catalog, ProviderConfig::default())
        .with_commands(&lights)
        .with_notify(marks.notifier());

    let cluster = ClusterPath::new(2, ON_OFF);
    let initial = provider.data_version(&cluster).unwrap();
    let mut reply = [0; 16];

    let len = provider
        .invoke(&CmdPath::new(2, ON_OFF, CMD_TOGGLE), &TLVReader::new(&[]), &mut reply)
        .unwrap();
    assert_eq!(len, 0);
    assert_eq!(provider.data_version(&cluster), Ok(initial.wrapping_add(1)));
    assert_eq!(
        marks.take(),
        [DirtyPath::attr(&AttrPath::new(2, ON_OFF, ON_OFF_ATTR))]
    );

    // Already on, nothing changes
    provider
        .invoke(&CmdPath::new(2, ON_OFF, CMD_ON), &TLVReader::new(&[]), &mut reply)
        .unwrap();
    assert_eq!(provider.data_version(&cluster), Ok(initial.wrapping_add(1)));
    assert!(marks.take().is_empty());

    // The handler's own status is reported as is
    assert_eq!(
        provider.invoke(
            &CmdPath::new(2, LEVEL_CONTROL, CMD_MOVE_TO_LEVEL),
            &TLVReader::new(&[]),
            &mut reply
        ),
        Err(Status::UnsupportedCommand)
    );
}

#[test]
fn test_command_lists() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());

    let on_off = ClusterPath::new(1, ON_OFF);
    assert_eq!(
        provider.accepted_commands(&on_off),
        Ok(vec![CMD_OFF, CMD_ON, CMD_TOGGLE])
    );
    assert_eq!(provider.generated_commands(&on_off), Ok(vec![]));

    provider
        .register(1, ON_OFF, Arc::new(EchoCluster::new(ON_OFF, 1)))
        .unwrap();

    assert_eq!(provider.accepted_commands(&on_off), Ok(vec![CMD_ECHO]));
    assert_eq!(provider.generated_commands(&on_off), Ok(vec![CMD_ECHO_RESP]));

    assert_eq!(
        provider.accepted_commands(&ClusterPath::new(1, 0x0300)),
        Err(Status::NotFound)
    );
}
