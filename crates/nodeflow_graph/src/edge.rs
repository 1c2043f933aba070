// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions: directed connections between an output and an input port.

use crate::node::NodeId;
use crate::port::{PortDirection, PortRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub Uuid);

impl EdgeId {
    /// Create a new random edge ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed connection from an output port to an input port.
///
/// Two edges are equal when they address the same endpoint ports; the
/// instance `id` is excluded so duplicate connections are detected
/// regardless of which `Edge` value carries them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Unique instance ID
    pub id: EdgeId,
    /// Source endpoint; addresses an output port
    pub source: PortRef,
    /// Target endpoint; addresses an input port
    pub target: PortRef,
}

impl Edge {
    /// Create a new edge between two port addresses.
    ///
    /// No validation happens here: speculative edges (a drag in progress)
    /// are built before validation succeeds or fails. Use
    /// [`Graph::connect`](crate::graph::Graph::connect) to validate and
    /// register in one step.
    pub fn new(source: PortRef, target: PortRef) -> Self {
        Self {
            id: EdgeId::new(),
            source,
            target,
        }
    }

    /// Check if this edge touches a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.source.node == node_id || self.target.node == node_id
    }

    /// Check if this edge touches a specific port
    pub fn involves_port(&self, port: PortRef) -> bool {
        self.source == port || self.target == port
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.target == other.target
    }
}

impl Eq for Edge {}

/// Error when validating a connection between two ports
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Endpoint node not found in the graph
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Endpoint port not found on its node
    #[error("Port not found: {0:?}")]
    PortNotFound(PortRef),

    /// Both ports belong to the same node
    #[error("Cannot connect two ports of the same node")]
    SameNode,

    /// Both ports share a direction (in-in or out-out)
    #[error("Cannot connect two {0:?} ports")]
    SameDirection(PortDirection),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;

    #[test]
    fn test_edge_equality_ignores_id() {
        let a = NodeId::new();
        let b = NodeId::new();
        let e1 = Edge::new(PortRef::output(a, 0), PortRef::input(b, 1));
        let e2 = Edge::new(PortRef::output(a, 0), PortRef::input(b, 1));
        assert_ne!(e1.id, e2.id);
        assert_eq!(e1, e2);
    }

    #[test]
    fn test_edge_inequality_on_endpoints() {
        let a = NodeId::new();
        let b = NodeId::new();
        let e1 = Edge::new(PortRef::output(a, 0), PortRef::input(b, 0));
        let e2 = Edge::new(PortRef::output(a, 0), PortRef::input(b, 1));
        assert_ne!(e1, e2);
    }

    #[test]
    fn test_involves() {
        let a = NodeId::new();
        let b = NodeId::new();
        let edge = Edge::new(PortRef::output(a, 0), PortRef::input(b, 0));
        assert!(edge.involves_node(a));
        assert!(edge.involves_node(b));
        assert!(!edge.involves_node(NodeId::new()));
        assert!(edge.involves_port(PortRef::output(a, 0)));
        assert!(!edge.involves_port(PortRef::input(a, 0)));
    }
}
