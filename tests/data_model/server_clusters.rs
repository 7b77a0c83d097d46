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
    Catalog, ClusterFlags, ClusterPath, DirtyPath, Provider, ProviderConfig, ServerCluster,
    Status,
};
use matter_dm_core::error::ErrorCode;
use matter_dm_core::utils::rand::dummy_rand;

use crate::common::echo_cluster::EchoCluster;
use crate::common::{init_env_logger, Marks, IDENTIFY, LEVEL_CONTROL, NODE, ON_OFF};

const SEED_VERSION: u32 = 0x03020100;

#[test]
fn test_dynamic_shadows_static() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let marks = Marks::default();
    let provider = Provider::new(&catalog, ProviderConfig::default()).with_notify(marks.notifier());

    provider
        .register(1, ON_OFF, Arc::new(EchoCluster::new(ON_OFF, 7)))
        .unwrap();

    assert_eq!(
        provider.server_clusters(1).unwrap(),
        [
            ServerCluster {
                id: ON_OFF,
                data_version: 7,
                flags: ClusterFlags::SERVER,
            },
            ServerCluster {
                id: LEVEL_CONTROL,
                data_version: SEED_VERSION,
                flags: ClusterFlags::SERVER,
            },
        ]
    );

    assert_eq!(
        provider.data_version(&ClusterPath::new(1, ON_OFF)),
        Ok(7)
    );
    assert_eq!(marks.take(), [DirtyPath::endpoint(1)]);

    // The other endpoint still sees its static cluster
    let ids = provider
        .server_clusters(2)
        .unwrap()
        .into_iter()
        .map(|cluster| (cluster.id, cluster.data_version))
        .collect::<Vec<_>>();
    assert_eq!(ids, [(ON_OFF, SEED_VERSION), (LEVEL_CONTROL, SEED_VERSION)]);
}

#[test]
fn test_unregister_restores_static() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let marks = Marks::default();
    let provider = Provider::new(&catalog, ProviderConfig::default()).with_notify(marks.notifier());

    provider
        .register(1, LEVEL_CONTROL, Arc::new(EchoCluster::new(LEVEL_CONTROL, 100)))
        .unwrap();
    assert_eq!(
        provider.data_version(&ClusterPath::new(1, LEVEL_CONTROL)),
        Ok(100)
    );

    provider.unregister(1, LEVEL_CONTROL).unwrap();
    assert_eq!(
        provider.data_version(&ClusterPath::new(1, LEVEL_CONTROL)),
        Ok(SEED_VERSION)
    );

    assert_eq!(
        provider.unregister(1, LEVEL_CONTROL).map(|_| ()).map_err(|e| e.code()),
        Err(ErrorCode::NotFound)
    );
    assert_eq!(marks.take(), [DirtyPath::endpoint(1), DirtyPath::endpoint(1)]);
}

#[test]
fn test_duplicate_registration() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());

    provider
        .register(1, ON_OFF, Arc::new(EchoCluster::new(ON_OFF, 7)))
        .unwrap();

    assert_eq!(
        provider
            .register(1, ON_OFF, Arc::new(EchoCluster::new(ON_OFF, 8)))
            .map_err(|e| e.code()),
        Err(ErrorCode::Duplicate)
    );

    let replaced = provider
        .replace(1, ON_OFF, Arc::new(EchoCluster::new(ON_OFF, 9)))
        .unwrap();
    assert!(replaced.is_some());

    let clusters = provider.server_clusters(1).unwrap();
    assert_eq!(clusters.iter().filter(|c| c.id == ON_OFF).count(), 1);
    assert_eq!(clusters[0].data_version, 9);
    assert_eq!(clusters.len(), 2);
}

#[test]
fn test_descriptor_must_match() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());

    assert_eq!(
        provider
            .register(1, ON_OFF, Arc::new(EchoCluster::new(LEVEL_CONTROL, 1)))
            .map_err(|e| e.code()),
        Err(ErrorCode::Invalid)
    );
}

#[test]
fn test_registry_capacity() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(
        &catalog,
        ProviderConfig {
            max_dynamic_clusters: 2,
            ..Default::default()
        },
    );

    provider
        .register(1, 0xfc00, Arc::new(EchoCluster::new(0xfc00, 1)))
        .unwrap();
    provider
        .register(1, 0xfc01, Arc::new(EchoCluster::new(0xfc01, 1)))
        .unwrap();

    assert_eq!(
        provider
            .register(1, 0xfc02, Arc::new(EchoCluster::new(0xfc02, 1)))
            .map_err(|e| e.code()),
        Err(ErrorCode::ResourceExhausted)
    );
    assert_eq!(provider.server_clusters(1).unwrap().len(), 4);
}

#[test]
fn test_dynamic_only_endpoint() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());

    assert_eq!(provider.server_clusters(5), Err(Status::NotFound));

    provider
        .register(5, 0xfc00, Arc::new(EchoCluster::new(0xfc00, 3)))
        .unwrap();

    assert_eq!(provider.endpoints(), [0, 1, 2, 5]);
    assert_eq!(
        provider.server_clusters(5).unwrap(),
        [ServerCluster {
            id: 0xfc00,
            data_version: 3,
            flags: ClusterFlags::SERVER,
        }]
    );
    assert_eq!(
        provider.data_version(&ClusterPath::new(5, ON_OFF)),
        Err(Status::NotFound)
    );
}

#[test]
fn test_client_clusters_excluded() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());

    let clusters = provider.server_clusters(1).unwrap();
    assert!(clusters.iter().all(|cluster| cluster.id != IDENTIFY));
    assert_eq!(
        provider.data_version(&ClusterPath::new(1, IDENTIFY)),
        Err(Status::NotFound)
    );
}

#[test]
fn test_disable_enable_endpoint() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let marks = Marks::default();
    let provider = Provider::new(&catalog, ProviderConfig::default()).with_notify(marks.notifier());

    provider.disable_endpoint(2).unwrap();
    // Already disabled, nothing to report
    provider.disable_endpoint(2).unwrap();

    assert_eq!(provider.endpoints(), [0, 1]);
    assert_eq!(provider.server_clusters(2), Err(Status::NotFound));
    assert_eq!(marks.take(), [DirtyPath::endpoint(2)]);

    provider.enable_endpoint(2).unwrap();

    assert_eq!(provider.endpoints(), [0, 1, 2]);
    assert_eq!(provider.server_clusters(2).unwrap().len(), 2);
    assert_eq!(marks.take(), [DirtyPath::endpoint(2)]);

    assert_eq!(
        provider.enable_endpoint(9).map_err(|e| e.code()),
        Err(ErrorCode::EndpointNotFound)
    );
}
