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

use std::sync::Arc;

use matter_dm_core::dm::{
    AttrPath, Catalog, ClusterPath, DirtyPath, GlobalElements, Provider, ProviderConfig, Status,
};
use matter_dm_core::persist::MemPersist;
use matter_dm_core::tlv::{Nullable, TLVReader, TLVValue};
use matter_dm_core::utils::rand::dummy_rand;
use rstest::rstest;

use crate::common::echo_cluster::{EchoCluster, ATTR_MEASURED, ATTR_SETPOINT};
use crate::common::{
    decode, init_env_logger, tlv, Marks, BASIC_INFO, CURRENT_LEVEL, LEVEL_CONTROL, NODE,
    NODE_LABEL, ON_LEVEL, ON_OFF, ON_OFF_ATTR, VENDOR_CLUSTER, VENDOR_NAME, VENDOR_SETTING,
};

fn read<N: matter_dm_core::dm::ChangeNotify>(
    provider: &Provider<'_, N>,
    path: &AttrPath,
) -> Result<Vec<u8>, Status> {
    let mut buf = [0; 128];
    let len = provider.read(path, &mut buf)?;

    Ok(buf[..len].to_vec())
}

fn write<N: matter_dm_core::dm::ChangeNotify>(
    provider: &Provider<'_, N>,
    path: &AttrPath,
    value: &[u8],
) -> Result<(), Status> {
    provider.write(path, &TLVReader::new(value))
}

#[rstest]
#[case::no_endpoint(AttrPath::new(9, ON_OFF, ON_OFF_ATTR), Status::NotFound)]
#[case::no_cluster(AttrPath::new(1, 0x0300, 0x0000), Status::NotFound)]
#[case::client_cluster(AttrPath::new(1, 0x0003, 0x0000), Status::NotFound)]
#[case::no_attribute(AttrPath::new(1, ON_OFF, 0x4000), Status::UnsupportedAttribute)]
fn test_read_not_found(#[case] path: AttrPath, #[case] status: Status) {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());

    assert_eq!(read(&provider, &path), Err(status));
}

#[test]
fn test_read_defaults() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());

    let value = read(&provider, &AttrPath::new(0, BASIC_INFO, VENDOR_NAME)).unwrap();
    assert_eq!(decode::<&str>(&value), "CHIP");

    let value = read(&provider, &AttrPath::new(0, BASIC_INFO, NODE_LABEL)).unwrap();
    assert_eq!(decode::<&str>(&value), "");

    let value = read(&provider, &AttrPath::new(1, ON_OFF, ON_OFF_ATTR)).unwrap();
    assert!(!decode::<bool>(&value));

    let value = read(&provider, &AttrPath::new(1, LEVEL_CONTROL, CURRENT_LEVEL)).unwrap();
    assert_eq!(decode::<Nullable<u8>>(&value), Nullable::Null);

    let value = read(&provider, &AttrPath::new(1, LEVEL_CONTROL, ON_LEVEL)).unwrap();
    assert_eq!(decode::<Nullable<u8>>(&value), Nullable::Some(254));
}

#[test]
fn test_read_globals() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());

    let global = |attr: GlobalElements| {
        read(&provider, &AttrPath::new(1, LEVEL_CONTROL, attr as u32)).unwrap()
    };

    assert_eq!(decode::<u16>(&global(GlobalElements::ClusterRevision)), 5);
    assert_eq!(decode::<u32>(&global(GlobalElements::FeatureMap)), 1);
    assert_eq!(
        global(GlobalElements::AcceptedCmdList),
        [0x16, 0x04, 0x00, 0x18]
    );
    assert_eq!(global(GlobalElements::GeneratedCmdList), [0x16, 0x18]);
    assert_eq!(global(GlobalElements::EventList), [0x16, 0x18]);
    assert_eq!(
        global(GlobalElements::AttributeList),
        [
            0x16, 0x04, 0x00, 0x04, 0x11, 0x05, 0xf8, 0xff, 0x05, 0xf9, 0xff, 0x05, 0xfa, 0xff,
            0x05, 0xfb, 0xff, 0x05, 0xfc, 0xff, 0x05, 0xfd, 0xff, 0x18
        ]
    );
}

#[test]
fn test_read_buffer_too_small() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());

    let mut buf = [0; 3];
    assert_eq!(
        provider.read(&AttrPath::new(0, BASIC_INFO, VENDOR_NAME), &mut buf),
        Err(Status::ResourceExhausted)
    );
}

#[test]
fn test_write_read_only() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let marks = Marks::default();
    let provider = Provider::new(&catalog, ProviderConfig::default()).with_notify(marks.notifier());

    let version = provider
        .data_version(&ClusterPath::new(0, BASIC_INFO))
        .unwrap();

    assert_eq!(
        write(&provider, &AttrPath::new(0, BASIC_INFO, VENDOR_NAME), &tlv("ACME")),
        Err(Status::UnsupportedWrite)
    );
    assert_eq!(
        write(&provider, &AttrPath::new(1, ON_OFF, ON_OFF_ATTR), &tlv(&true)),
        Err(Status::UnsupportedWrite)
    );
    assert_eq!(
        write(
            &provider,
            &AttrPath::new(1, ON_OFF, GlobalElements::ClusterRevision as u32),
            &tlv(&7_u16)
        ),
        Err(Status::UnsupportedWrite)
    );

    assert!(marks.take().is_empty());
    assert_eq!(
        provider.data_version(&ClusterPath::new(0, BASIC_INFO)),
        Ok(version)
    );
}

#[test]
fn test_write_static() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let marks = Marks::default();
    let provider = Provider::new(&catalog, ProviderConfig::default()).with_notify(marks.notifier());

    let path = AttrPath::new(1, LEVEL_CONTROL, ON_LEVEL);
    let cluster = path.cluster_path();
    let initial = provider.data_version(&cluster).unwrap();

    write(&provider, &path, &tlv(&100_u8)).unwrap();

    let after_first = provider.data_version(&cluster).unwrap();
    assert_eq!(after_first, initial.wrapping_add(1));
    assert_eq!(decode::<u8>(&read(&provider, &path).unwrap()), 100);
    assert_eq!(marks.take(), [DirtyPath::attr(&path)]);

    // Same value again, nothing changes
    write(&provider, &path, &tlv(&100_u8)).unwrap();
    assert_eq!(provider.data_version(&cluster), Ok(after_first));
    assert!(marks.take().is_empty());

    write(&provider, &path, &tlv(&TLVValue::Null)).unwrap();
    assert_eq!(provider.data_version(&cluster), Ok(after_first.wrapping_add(1)));
    assert_eq!(
        decode::<Nullable<u8>>(&read(&provider, &path).unwrap()),
        Nullable::Null
    );

    // The other endpoint keeps its own value and version
    let other = AttrPath::new(2, LEVEL_CONTROL, ON_LEVEL);
    assert_eq!(
        decode::<Nullable<u8>>(&read(&provider, &other).unwrap()),
        Nullable::Some(254)
    );
    assert_eq!(provider.data_version(&other.cluster_path()), Ok(initial));
}

#[test]
fn test_write_type_mismatch() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let marks = Marks::default();
    let provider = Provider::new(&catalog, ProviderConfig::default()).with_notify(marks.notifier());

    let path = AttrPath::new(1, LEVEL_CONTROL, ON_LEVEL);
    let initial = provider.data_version(&path.cluster_path()).unwrap();

    assert_eq!(
        write(&provider, &path, &tlv("high")),
        Err(Status::ConstraintError)
    );
    assert_eq!(
        write(&provider, &AttrPath::new(0, BASIC_INFO, NODE_LABEL), &tlv(&5_u8)),
        Err(Status::ConstraintError)
    );

    // Malformed request data is reported as a failure
    assert_eq!(write(&provider, &path, &[0x04]), Err(Status::Failure));

    assert_eq!(provider.data_version(&path.cluster_path()), Ok(initial));
    assert!(marks.take().is_empty());
}

#[test]
fn test_write_manufacturer_attribute() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let marks = Marks::default();
    let provider = Provider::new(&catalog, ProviderConfig::default()).with_notify(marks.notifier());

    let path = AttrPath::new(0, VENDOR_CLUSTER, VENDOR_SETTING);
    let initial = provider.data_version(&path.cluster_path()).unwrap();

    assert_eq!(decode::<u8>(&read(&provider, &path).unwrap()), 0);

    write(&provider, &path, &tlv(&7_u8)).unwrap();

    assert_eq!(decode::<u8>(&read(&provider, &path).unwrap()), 7);
    assert_eq!(
        provider.data_version(&path.cluster_path()),
        Ok(initial.wrapping_add(1))
    );
    assert_eq!(marks.take(), [DirtyPath::attr(&path)]);

    // Only the unprefixed ids are global
    assert_eq!(
        read(&provider, &AttrPath::new(0, VENDOR_CLUSTER, 0xFFF1_FFFD)),
        Err(Status::UnsupportedAttribute)
    );
    assert_eq!(
        write(&provider, &AttrPath::new(0, VENDOR_CLUSTER, 0xFFF1_FFFD), &tlv(&1_u16)),
        Err(Status::UnsupportedAttribute)
    );
}

#[test]
fn test_write_without_value() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let marks = Marks::default();
    let provider = Provider::new(&catalog, ProviderConfig::default()).with_notify(marks.notifier());

    let path = AttrPath::new(1, LEVEL_CONTROL, ON_LEVEL);
    let initial = provider.data_version(&path.cluster_path()).unwrap();

    assert_eq!(write(&provider, &path, &[]), Err(Status::ConstraintError));

    // A reader already exhausted inside a container has no value either
    let data = [0x15, 0x18];
    let mut reader = TLVReader::new(&data);
    reader.next().unwrap();
    let members = reader.enter_container().unwrap();
    assert_eq!(provider.write(&path, &members), Err(Status::ConstraintError));

    assert_eq!(provider.data_version(&path.cluster_path()), Ok(initial));
    assert!(marks.take().is_empty());
}

#[test]
fn test_write_too_long() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(
        &catalog,
        ProviderConfig {
            max_attr_value_len: 8,
            ..Default::default()
        },
    );

    let path = AttrPath::new(0, BASIC_INFO, NODE_LABEL);

    write(&provider, &path, &tlv("short")).unwrap();
    assert_eq!(
        write(&provider, &path, &tlv("a much longer label")),
        Err(Status::ResourceExhausted)
    );
    assert_eq!(decode::<&str>(&read(&provider, &path).unwrap()), "short");
}

#[test]
fn test_persisted_value() {
    init_env_logger();

    let persist = MemPersist::new();
    let path = AttrPath::new(0, BASIC_INFO, NODE_LABEL);

    {
        let catalog = Catalog::new(&NODE, dummy_rand);
        let provider = Provider::new(&catalog, ProviderConfig::default()).with_persist(&persist);

        write(&provider, &path, &tlv("kitchen")).unwrap();

        // Not a persistent attribute
        write(&provider, &AttrPath::new(1, LEVEL_CONTROL, ON_LEVEL), &tlv(&1_u8)).unwrap();
    }

    assert_eq!(persist.len(), 1);

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default()).with_persist(&persist);

    assert_eq!(decode::<&str>(&read(&provider, &path).unwrap()), "kitchen");
    assert_eq!(
        decode::<Nullable<u8>>(
            &read(&provider, &AttrPath::new(1, LEVEL_CONTROL, ON_LEVEL)).unwrap()
        ),
        Nullable::Some(254)
    );
}

#[test]
fn test_dynamic_attributes() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let marks = Marks::default();
    let provider = Provider::new(&catalog, ProviderConfig::default()).with_notify(marks.notifier());

    let echo = Arc::new(EchoCluster::new(ON_OFF, 7));
    provider.register(1, ON_OFF, echo.clone()).unwrap();
    marks.take();

    // The static OnOff attribute is shadowed
    assert_eq!(
        read(&provider, &AttrPath::new(1, ON_OFF, ON_OFF_ATTR)).map(|v| decode::<u32>(&v)),
        Ok(42)
    );
    assert_eq!(ATTR_MEASURED, ON_OFF_ATTR);

    let setpoint = AttrPath::new(1, ON_OFF, ATTR_SETPOINT);
    assert_eq!(
        read(&provider, &setpoint).map(|v| decode::<u32>(&v)),
        Ok(1)
    );

    write(&provider, &setpoint, &tlv(&500_u32)).unwrap();
    assert_eq!(echo.setpoint(), 500);
    assert_eq!(provider.data_version(&setpoint.cluster_path()), Ok(8));
    assert_eq!(marks.take(), [DirtyPath::attr(&setpoint)]);

    // The handler's own status is reported as is
    assert_eq!(
        write(&provider, &setpoint, &tlv(&0_u32)),
        Err(Status::ConstraintError)
    );
    assert_eq!(
        write(&provider, &AttrPath::new(1, ON_OFF, ATTR_MEASURED), &tlv(&1_u32)),
        Err(Status::UnsupportedWrite)
    );
    assert!(marks.take().is_empty());
    assert_eq!(provider.data_version(&setpoint.cluster_path()), Ok(8));

    // Globals come from the registered descriptor
    assert_eq!(
        read(
            &provider,
            &AttrPath::new(1, ON_OFF, GlobalElements::GeneratedCmdList as u32)
        ),
        Ok(vec![0x16, 0x04, 0x01, 0x18])
    );
}

#[test]
fn test_version_monotonic() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());

    let path = AttrPath::new(2, LEVEL_CONTROL, ON_LEVEL);
    let mut last = provider.data_version(&path.cluster_path()).unwrap();

    for value in [1_u8, 1, 2, 3, 3, 3, 200, 1] {
        let before = decode::<Nullable<u8>>(&read(&provider, &path).unwrap());
        write(&provider, &path, &tlv(&value)).unwrap();

        let version = provider.data_version(&path.cluster_path()).unwrap();
        if before == Nullable::Some(value) {
            assert_eq!(version, last);
        } else {
            assert!(version > last);
        }

        last = version;
    }
}
