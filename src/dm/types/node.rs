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

use super::{Endpoint, EndptId};

/// The metadata of a whole Matter Node, as declared at build time.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    /// The ID of the node.
    pub id: u16,
    /// The endpoints of the node.
    pub endpoints: &'a [Endpoint<'a>],
}

impl<'a> Node<'a> {
    /// Create a new node with the given ID and endpoints.
    pub const fn new(id: u16, endpoints: &'a [Endpoint<'a>]) -> Self {
        Self { id, endpoints }
    }

    /// Return the position and the descriptor of the endpoint with the given ID, if it exists.
    ///
    /// Should the node declare an ID more than once, the first declaration wins.
    pub fn endpoint(&self, id: EndptId) -> Option<(usize, &'a Endpoint<'a>)> {
        self.endpoints
            .iter()
            .enumerate()
            .find(|(_, endpoint)| endpoint.id == id)
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "node:")?;
        for (index, endpoint) in self.endpoints.iter().enumerate() {
            writeln!(f, "endpoint {}: {}", index, endpoint)?;
        }

        write!(f, "")
    }
}
