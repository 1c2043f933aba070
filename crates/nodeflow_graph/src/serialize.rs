// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistence: converting a graph (or an induced subgraph) to and from
//! its JSON representation.
//!
//! Node identity on the wire is a process-local integer valid for one
//! serialization pass only; edges reference endpoints as
//! `(node_id, port_idx)` pairs. Loading resolves node kinds against a
//! [`NodeRegistry`] and rebuilds fresh nodes from their blueprints, so
//! identity values never survive a round trip even though structure does.

use crate::edge::Edge;
use crate::graph::{Graph, SubGraph};
use crate::node::{Node, NodeId};
use crate::port::{DataType, Port, PortDirection, PortRef};
use crate::registry::{NodeRegistry, UnknownTypeError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error when loading or storing a persisted graph
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// Node kind has no registered blueprint; the whole load aborts
    #[error(transparent)]
    UnknownType(#[from] UnknownTypeError),

    /// Edge references a node id absent from the node list
    #[error("Unknown node id in edge: {0}")]
    MissingNode(u64),

    /// Edge references a port index its node does not have
    #[error("Port index {index} out of range for node {node_id}")]
    PortIndexOutOfRange {
        /// Wire id of the offending node
        node_id: u64,
        /// Offending port index
        index: usize,
    },

    /// Malformed JSON text
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Wire form of a graph or subgraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    /// `"subgraph"` for induced-selection payloads, absent for full graphs
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Nodes, in graph iteration order
    pub nodes: Vec<NodeRecord>,
    /// Edges, in graph iteration order
    pub edges: Vec<EdgeRecord>,
}

impl GraphRecord {
    /// Encode as UTF-8 JSON text
    pub fn to_json(&self) -> Result<String, SerializeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from UTF-8 JSON text
    pub fn from_json(text: &str) -> Result<Self, SerializeError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Wire form of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Process-local identity, stable within one serialization pass
    pub id: u64,
    /// Node kind
    pub type_name: String,
    /// Display name
    pub name: String,
    /// Input ports, in index order
    pub input_ports: Vec<PortRecord>,
    /// Output ports, in index order
    pub output_ports: Vec<PortRecord>,
    /// Free-form persisted metadata
    pub attrs: IndexMap<String, serde_json::Value>,
    /// Opaque per-node style payload
    pub setting: Option<serde_json::Value>,
}

/// Wire form of a port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    /// Port name
    pub name: String,
    /// `"in"` or `"out"`
    #[serde(rename = "type")]
    pub direction: PortDirection,
    /// Opaque per-port style payload
    pub setting: Option<serde_json::Value>,
    /// Typed-port extension, present only for data ports
    #[serde(flatten)]
    pub data: Option<DataRecord>,
}

/// Typed-port extension of [`PortRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    /// Data kind
    pub data_type: DataType,
    /// Inclusive value range
    pub data_range: Option<serde_json::Value>,
    /// Default value
    pub data_default: Option<serde_json::Value>,
    /// Opaque construction arguments for the editing control
    pub widget_args: Option<serde_json::Value>,
    /// Live editable value at save time
    pub widget_value: Option<serde_json::Value>,
}

/// Wire form of an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Output endpoint
    pub source: EndpointRecord,
    /// Input endpoint
    pub target: EndpointRecord,
}

/// One edge endpoint, as node identity plus port index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    /// Wire id of the endpoint node
    pub node_id: u64,
    /// Port index within the endpoint's directional port list
    pub port_idx: usize,
}

/// Serialize a whole graph: nodes then edges, both in iteration order
pub fn serialize_graph(graph: &Graph) -> GraphRecord {
    let ids = assign_ids(graph.node_ids());
    GraphRecord {
        kind: None,
        nodes: graph
            .nodes()
            .map(|node| serialize_node(node, ids[&node.id]))
            .collect(),
        edges: graph
            .edges()
            .map(|edge| serialize_edge(edge, &ids))
            .collect(),
    }
}

/// Serialize an induced subgraph, tagged `"type": "subgraph"`
pub fn serialize_sub_graph(graph: &Graph, sub: &SubGraph) -> GraphRecord {
    let ids = assign_ids(sub.nodes().iter().copied());
    GraphRecord {
        kind: Some("subgraph".to_string()),
        nodes: sub
            .nodes()
            .iter()
            .filter_map(|id| graph.node(*id))
            .map(|node| serialize_node(node, ids[&node.id]))
            .collect(),
        edges: sub
            .edges()
            .iter()
            .filter_map(|id| graph.edge(*id))
            .map(|edge| serialize_edge(edge, &ids))
            .collect(),
    }
}

fn assign_ids(nodes: impl Iterator<Item = NodeId>) -> HashMap<NodeId, u64> {
    nodes.enumerate().map(|(i, id)| (id, i as u64)).collect()
}

fn serialize_node(node: &Node, id: u64) -> NodeRecord {
    NodeRecord {
        id,
        type_name: node.type_name.clone(),
        name: node.name.clone(),
        input_ports: node.input_ports.iter().map(serialize_port).collect(),
        output_ports: node.output_ports.iter().map(serialize_port).collect(),
        attrs: node.attrs.clone(),
        setting: node.setting.clone(),
    }
}

fn serialize_port(port: &Port) -> PortRecord {
    PortRecord {
        name: port.name.clone(),
        direction: port.direction,
        setting: port.setting.clone(),
        data: port.data.as_ref().map(|data| DataRecord {
            data_type: data.data_type,
            data_range: data.data_range.clone(),
            data_default: data.data_default.clone(),
            widget_args: data.widget_args.clone(),
            widget_value: data.value.clone(),
        }),
    }
}

fn serialize_edge(edge: &Edge, ids: &HashMap<NodeId, u64>) -> EdgeRecord {
    EdgeRecord {
        source: EndpointRecord {
            node_id: ids[&edge.source.node],
            port_idx: edge.source.index,
        },
        target: EndpointRecord {
            node_id: ids[&edge.target.node],
            port_idx: edge.target.index,
        },
    }
}

/// Rebuild a graph from its wire form.
///
/// Each node is constructed fresh from its registered blueprint, then
/// overwritten with the saved name, attrs, and style payload; saved
/// `widget_value`s are staged onto the freshly blueprinted data ports.
/// Edges resolve through the node id map and register without connection
/// validation (a saved graph is assumed previously valid). Any error
/// aborts the entire load; nothing is imported partially.
pub fn deserialize_graph(
    record: &GraphRecord,
    registry: &mut NodeRegistry,
) -> Result<Graph, SerializeError> {
    let mut nodes = Vec::with_capacity(record.nodes.len());
    let mut id_map: HashMap<u64, NodeId> = HashMap::new();
    for node_record in &record.nodes {
        let node = deserialize_node(node_record, registry)?;
        id_map.insert(node_record.id, node.id);
        nodes.push(node);
    }

    let mut edges = Vec::with_capacity(record.edges.len());
    for edge_record in &record.edges {
        edges.push(deserialize_edge(edge_record, &id_map, &nodes)?);
    }

    let mut graph = Graph::new();
    graph.add_nodes(nodes);
    graph.add_edges(edges);
    Ok(graph)
}

fn deserialize_node(
    record: &NodeRecord,
    registry: &mut NodeRegistry,
) -> Result<Node, SerializeError> {
    let mut node = registry.create_node(&record.type_name)?;
    node.name = record.name.clone();
    node.attrs = record.attrs.clone();
    node.setting = record.setting.clone();
    stage_port_values(&mut node.input_ports, &record.input_ports);
    stage_port_values(&mut node.output_ports, &record.output_ports);
    Ok(node)
}

fn stage_port_values(ports: &mut [Port], records: &[PortRecord]) {
    for (port, record) in ports.iter_mut().zip(records) {
        if let (Some(data), Some(saved)) = (port.data.as_mut(), record.data.as_ref()) {
            data.value = saved.widget_value.clone();
        }
    }
}

fn deserialize_edge(
    record: &EdgeRecord,
    id_map: &HashMap<u64, NodeId>,
    nodes: &[Node],
) -> Result<Edge, SerializeError> {
    let source = resolve_endpoint(&record.source, PortDirection::Out, id_map, nodes)?;
    let target = resolve_endpoint(&record.target, PortDirection::In, id_map, nodes)?;
    Ok(Edge::new(source, target))
}

fn resolve_endpoint(
    record: &EndpointRecord,
    direction: PortDirection,
    id_map: &HashMap<u64, NodeId>,
    nodes: &[Node],
) -> Result<PortRef, SerializeError> {
    let node_id = *id_map
        .get(&record.node_id)
        .ok_or(SerializeError::MissingNode(record.node_id))?;
    let node = nodes
        .iter()
        .find(|n| n.id == node_id)
        .ok_or(SerializeError::MissingNode(record.node_id))?;
    let ports = match direction {
        PortDirection::In => &node.input_ports,
        PortDirection::Out => &node.output_ports,
    };
    if record.port_idx >= ports.len() {
        return Err(SerializeError::PortIndexOutOfRange {
            node_id: record.node_id,
            index: record.port_idx,
        });
    }
    Ok(PortRef {
        node: node_id,
        direction,
        index: record.port_idx,
    })
}
