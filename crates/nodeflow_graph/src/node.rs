// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph engine.

use crate::port::{Port, PortDirection, PortRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attribute key under which a node's display position is stored
pub const POS_ATTR: &str = "pos";

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Display state of a node. The engine only stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Idle
    #[default]
    Normal,
    /// Currently active
    Running,
    /// Failed
    Error,
}

/// A node instance in the graph.
///
/// Port order within `input_ports`/`output_ports` is stable and defines
/// each port's index, used for layout tie-breaking and for edge
/// (de)serialization. `id` is a stable per-instance identity independent
/// of the mutable display `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node kind, resolved against the blueprint registry
    pub type_name: String,
    /// Display name (can be customized)
    pub name: String,
    /// Display state
    pub status: NodeStatus,
    /// Input ports, in index order
    pub input_ports: Vec<Port>,
    /// Output ports, in index order
    pub output_ports: Vec<Port>,
    /// Free-form persisted metadata; holds `"pos"` once the node is placed
    pub attrs: IndexMap<String, serde_json::Value>,
    /// Opaque per-node style payload, persisted verbatim
    pub setting: Option<serde_json::Value>,
}

impl Node {
    /// Create a new node with explicit port lists
    pub fn new(
        type_name: impl Into<String>,
        name: impl Into<String>,
        input_ports: Vec<Port>,
        output_ports: Vec<Port>,
    ) -> Self {
        Self {
            id: NodeId::new(),
            type_name: type_name.into(),
            name: name.into(),
            status: NodeStatus::Normal,
            input_ports,
            output_ports,
            attrs: IndexMap::new(),
            setting: None,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.set_position([x, y]);
        self
    }

    /// Get the display position, if the node has been placed
    pub fn position(&self) -> Option<[f32; 2]> {
        let value = self.attrs.get(POS_ATTR)?;
        let xy = value.as_array()?;
        match (xy.first()?.as_f64(), xy.get(1)?.as_f64()) {
            (Some(x), Some(y)) => Some([x as f32, y as f32]),
            _ => None,
        }
    }

    /// Set the display position
    pub fn set_position(&mut self, pos: [f32; 2]) {
        self.attrs.insert(
            POS_ATTR.to_string(),
            serde_json::json!([pos[0], pos[1]]),
        );
    }

    /// Get an input port by index
    pub fn input(&self, index: usize) -> Option<&Port> {
        self.input_ports.get(index)
    }

    /// Get an output port by index
    pub fn output(&self, index: usize) -> Option<&Port> {
        self.output_ports.get(index)
    }

    /// Resolve a port address against this node
    pub fn port(&self, port: &PortRef) -> Option<&Port> {
        debug_assert_eq!(port.node, self.id);
        match port.direction {
            PortDirection::In => self.input_ports.get(port.index),
            PortDirection::Out => self.output_ports.get(port.index),
        }
    }

    /// Resolve a port address against this node, mutably
    pub fn port_mut(&mut self, port: &PortRef) -> Option<&mut Port> {
        debug_assert_eq!(port.node, self.id);
        match port.direction {
            PortDirection::In => self.input_ports.get_mut(port.index),
            PortDirection::Out => self.output_ports.get_mut(port.index),
        }
    }

    /// All ports, inputs first
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.input_ports.iter().chain(self.output_ports.iter())
    }

    /// Addresses of all ports of this node, inputs first
    pub fn port_refs(&self) -> impl Iterator<Item = PortRef> + '_ {
        let id = self.id;
        (0..self.input_ports.len())
            .map(move |i| PortRef::input(id, i))
            .chain((0..self.output_ports.len()).map(move |i| PortRef::output(id, i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_construction() {
        let node = Node::new(
            "TestNode",
            "TestNode1",
            vec![Port::input("in1"), Port::input("in2")],
            vec![Port::output("out1")],
        );
        assert_eq!(node.type_name, "TestNode");
        assert_eq!(node.input_ports.len(), 2);
        assert_eq!(node.output_ports.len(), 1);
        assert_eq!(node.status, NodeStatus::Normal);
        assert!(node.position().is_none());
    }

    #[test]
    fn test_position_round_trip() {
        let mut node = Node::new("TestNode", "n", vec![], vec![]);
        node.set_position([10.0, -3.5]);
        assert_eq!(node.position(), Some([10.0, -3.5]));
        assert!(node.attrs.contains_key(POS_ATTR));
    }

    #[test]
    fn test_port_lookup_by_ref() {
        let node = Node::new(
            "TestNode",
            "n",
            vec![Port::input("in1")],
            vec![Port::output("out1"), Port::output("out2")],
        );
        let out2 = PortRef::output(node.id, 1);
        assert_eq!(node.port(&out2).unwrap().name, "out2");
        assert!(node.port(&PortRef::input(node.id, 5)).is_none());
        assert_eq!(node.port_refs().count(), 3);
    }
}
