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

//! The request-handling core of a Matter data model.
//!
//! The crate is split in two layers:
//! - [`tlv`]: a zero-copy cursor reader and a buffer writer for the Matter TLV encoding,
//!   plus allocation-free tree utilities (iterate, count, find) on top of the reader
//! - [`dm`]: the data model provider, which merges statically declared endpoint metadata
//!   with dynamically registered cluster implementations and dispatches typed
//!   Read, Write and Invoke requests against the merged view
//!
//! # Example
//! ```
//! use matter_dm_core::dm::{
//!     Access, AttrDefault, AttrPath, Attribute, Catalog, Cluster, ClusterFlags, Endpoint, Node,
//!     Provider, ProviderConfig, Quality,
//! };
//! use matter_dm_core::tlv::{TLVReader, TLVValueType};
//! use matter_dm_core::utils::rand::dummy_rand;
//!
//! const NODE: Node<'static> = Node::new(
//!     0,
//!     &[Endpoint::new(1).with_clusters(&[Cluster::new(0x0006, 4, 0, ClusterFlags::SERVER)
//!         .with_attributes(&[Attribute::new(0x0000, TLVValueType::True, Access::RV, Quality::NONE)
//!             .default(AttrDefault::Bool(true))])])],
//! );
//!
//! let catalog = Catalog::new(&NODE, dummy_rand);
//! let provider = Provider::new(&catalog, ProviderConfig::default());
//!
//! let mut buf = [0; 16];
//! let len = provider.read(&AttrPath::new(1, 0x0006, 0x0000), &mut buf).unwrap();
//!
//! let mut reader = TLVReader::new(&buf[..len]);
//! reader.next().unwrap();
//! assert!(reader.get::<bool>().unwrap());
//! ```

#[macro_use]
extern crate log;

pub mod dm;
pub mod error;
pub mod persist;
pub mod tlv;
pub mod utils;
