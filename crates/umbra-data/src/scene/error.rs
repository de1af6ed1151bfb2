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

use super::NodeId;
use std::fmt;

/// An error raised when editing the scene hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The handle does not refer to a live node.
    UnknownNode(NodeId),
    /// A node cannot be its own child.
    SelfParenting(NodeId),
    /// Attaching the child would make the parent its own descendant.
    CycleDetected {
        /// The node that would become the parent.
        parent: NodeId,
        /// The node that would become the child.
        child: NodeId,
    },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::UnknownNode(id) => write!(f, "Scene node {id:?} does not exist"),
            SceneError::SelfParenting(id) => {
                write!(f, "Scene node {id:?} cannot be its own child")
            }
            SceneError::CycleDetected { parent, child } => write!(
                f,
                "Attaching {child:?} under {parent:?} would create a cycle"
            ),
        }
    }
}

impl std::error::Error for SceneError {}
