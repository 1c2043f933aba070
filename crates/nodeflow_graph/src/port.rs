// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::edge::EdgeId;
use crate::node::NodeId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    #[serde(rename = "in")]
    In,
    /// Output port
    #[serde(rename = "out")]
    Out,
}

/// Data kind carried by a typed (data) port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// Integer value
    #[serde(rename = "int")]
    Int,
    /// Floating point value
    #[serde(rename = "float")]
    Float,
    /// String value
    #[serde(rename = "str")]
    Str,
    /// Boolean value
    #[serde(rename = "bool")]
    Bool,
}

/// Typed-port payload: the editable value slot behind a data port.
///
/// Plain ports have none of this; a data port additionally carries its data
/// kind, an optional inclusive range, an optional default, opaque arguments
/// for the editing control, and the live `value` the control currently holds.
/// The engine stores `value` but never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortData {
    /// Data kind of the port
    pub data_type: DataType,
    /// Inclusive value range, if constrained
    pub data_range: Option<serde_json::Value>,
    /// Default value, if any
    pub data_default: Option<serde_json::Value>,
    /// Opaque construction arguments for the editing control
    pub widget_args: Option<serde_json::Value>,
    /// Live editable value; persisted at save time
    pub value: Option<serde_json::Value>,
}

impl PortData {
    /// Create a data payload of the given kind with no range or default
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            data_range: None,
            data_default: None,
            widget_args: None,
            value: None,
        }
    }

    /// Set the inclusive value range
    pub fn with_range(mut self, range: serde_json::Value) -> Self {
        self.data_range = Some(range);
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.data_default = Some(default);
        self
    }
}

/// A connection point owned by exactly one node.
///
/// The owning node embeds its ports in its `input_ports`/`output_ports`
/// lists; a port's position in that list is its index, stable for the
/// node's lifetime. The incident-edge set is maintained exclusively by
/// [`Graph`](crate::graph::Graph) edge mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Port name
    pub name: String,
    /// Port direction; never changes after the port is attached to a node
    pub direction: PortDirection,
    /// Typed-port payload, present only on data ports
    pub data: Option<PortData>,
    /// Opaque per-port style payload, persisted verbatim
    pub setting: Option<serde_json::Value>,
    /// Edges incident to this port; owned by graph mutation
    #[serde(skip)]
    pub(crate) edges: IndexSet<EdgeId>,
}

impl Port {
    /// Create a new plain input port
    pub fn input(name: impl Into<String>) -> Self {
        Self::new(name, PortDirection::In)
    }

    /// Create a new plain output port
    pub fn output(name: impl Into<String>) -> Self {
        Self::new(name, PortDirection::Out)
    }

    /// Create a new plain port
    pub fn new(name: impl Into<String>, direction: PortDirection) -> Self {
        Self {
            name: name.into(),
            direction,
            data: None,
            setting: None,
            edges: IndexSet::new(),
        }
    }

    /// Attach a typed-port payload
    pub fn with_data(mut self, data: PortData) -> Self {
        self.data = Some(data);
        self
    }

    /// Whether this is a data (typed) port
    pub fn is_data(&self) -> bool {
        self.data.is_some()
    }

    /// Edges incident to this port
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().copied()
    }

    /// Number of edges incident to this port
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Arena-style address of a port: owning node, direction, and position in
/// the node's port list for that direction.
///
/// Cross-references between nodes, ports, and edges are identifier lookups,
/// never owning pointers, so removal can never leave anything dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// Owning node
    pub node: NodeId,
    /// Which port list of the node this address points into
    pub direction: PortDirection,
    /// Position in that list
    pub index: usize,
}

impl PortRef {
    /// Address an input port of `node` by index
    pub fn input(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: PortDirection::In,
            index,
        }
    }

    /// Address an output port of `node` by index
    pub fn output(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: PortDirection::Out,
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_construction() {
        let port = Port::input("in1");
        assert_eq!(port.name, "in1");
        assert_eq!(port.direction, PortDirection::In);
        assert!(!port.is_data());
        assert_eq!(port.edge_count(), 0);
    }

    #[test]
    fn test_data_port() {
        let port = Port::input("value").with_data(
            PortData::new(DataType::Int)
                .with_range(serde_json::json!([0, 100]))
                .with_default(serde_json::json!(42)),
        );
        assert!(port.is_data());
        let data = port.data.unwrap();
        assert_eq!(data.data_type, DataType::Int);
        assert_eq!(data.data_default, Some(serde_json::json!(42)));
    }

    #[test]
    fn test_direction_serialized_names() {
        assert_eq!(
            serde_json::to_value(PortDirection::In).unwrap(),
            serde_json::json!("in")
        );
        assert_eq!(
            serde_json::to_value(PortDirection::Out).unwrap(),
            serde_json::json!("out")
        );
        assert_eq!(
            serde_json::to_value(DataType::Str).unwrap(),
            serde_json::json!("str")
        );
    }
}
