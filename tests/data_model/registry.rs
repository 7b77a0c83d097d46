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
use std::thread;

use matter_dm_core::dm::{AttrPath, Catalog, ClusterHandler, Provider, ProviderConfig, Status};
use matter_dm_core::utils::rand::dummy_rand;

use crate::common::echo_cluster::{EchoCluster, ATTR_MEASURED};
use crate::common::{decode, init_env_logger, NODE, ON_OFF};

#[test]
fn test_snapshot_isolation() {
    init_env_logger();

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());

    let before = provider.registry().snapshot();

    provider
        .register(3, 0xfc00, Arc::new(EchoCluster::new(0xfc00, 1)))
        .unwrap();

    assert!(before.is_empty());
    assert!(before.get(3, 0xfc00).is_none());

    let after = provider.registry().snapshot();
    assert_eq!(after.len(), 1);
    assert!(after.get(3, 0xfc00).is_some());

    provider.unregister(3, 0xfc00).unwrap();

    // Still usable after the registration is gone
    let handler = after.get(3, 0xfc00).unwrap();
    assert_eq!(handler.cluster().id, 0xfc00);
}

#[test]
fn test_concurrent_register_and_read() {
    init_env_logger();

    const ROUNDS: usize = 200;

    let catalog = Catalog::new(&NODE, dummy_rand);
    let provider = Provider::new(&catalog, ProviderConfig::default());
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            for round in 0..ROUNDS {
                let cluster = 0xfc00 + (round % 4) as u32;
                let handler: Arc<dyn ClusterHandler> = Arc::new(EchoCluster::new(cluster, 1));

                provider.register(4, cluster, handler).unwrap();
                provider.register(1, cluster, Arc::new(EchoCluster::new(cluster, 1))).unwrap();
                provider.unregister(4, cluster).unwrap();
                provider.unregister(1, cluster).unwrap();
            }

            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..2 {
            s.spawn(|| {
                let mut buf = [0; 16];

                while !done.load(Ordering::SeqCst) {
                    for cluster in 0xfc00..0xfc04 {
                        match provider.read(&AttrPath::new(4, cluster, ATTR_MEASURED), &mut buf) {
                            Ok(len) => assert_eq!(decode::<u32>(&buf[..len]), 42),
                            Err(status) => assert_eq!(status, Status::NotFound),
                        }
                    }

                    let clusters = provider.server_clusters(1).unwrap();
                    let mut ids = clusters.iter().map(|c| c.id).collect::<Vec<_>>();
                    let len = ids.len();
                    ids.sort_unstable();
                    ids.dedup();
                    assert_eq!(ids.len(), len);
                    assert!(ids.contains(&ON_OFF));
                }
            });
        }
    });

    assert!(provider.registry().snapshot().is_empty());
}
