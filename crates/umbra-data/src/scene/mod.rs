// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The hierarchical transform graph.
//!
//! Nodes live in a [`SceneGraph`] arena and refer to their children by
//! [`NodeId`]. Parents never own children: destroying a node leaves its
//! children alive, and handles to destroyed nodes are skipped wherever they
//! are still referenced.

mod error;
mod graph;
mod node;

pub use self::error::SceneError;
pub use self::graph::{NodeId, SceneGraph, Subtree};
pub use self::node::{NodePayload, SpatialNode};
