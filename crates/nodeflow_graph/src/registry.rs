// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of node blueprints: the factory behind "create node by type name".

use crate::node::Node;
use crate::port::{Port, PortData, PortDirection};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Port template inside a node blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortBlueprint {
    /// Port name
    pub name: String,
    /// Typed-port payload template, present only for data ports
    pub data: Option<PortData>,
}

impl PortBlueprint {
    /// A plain port template
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }

    /// A data port template
    pub fn data(name: impl Into<String>, data: PortData) -> Self {
        Self {
            name: name.into(),
            data: Some(data),
        }
    }

    fn instantiate(&self, direction: PortDirection) -> Port {
        let mut port = Port::new(self.name.clone(), direction);
        port.data = self.data.clone();
        port
    }
}

/// Node kind template: the port lists every instance of this kind starts
/// with. Templates are cloned per instance, so distinct nodes never share
/// port values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBlueprint {
    /// Unique kind name
    pub type_name: String,
    /// Input port templates, in index order
    pub input_ports: Vec<PortBlueprint>,
    /// Output port templates, in index order
    pub output_ports: Vec<PortBlueprint>,
}

impl NodeBlueprint {
    /// Create a blueprint with the given port templates
    pub fn new(
        type_name: impl Into<String>,
        input_ports: Vec<PortBlueprint>,
        output_ports: Vec<PortBlueprint>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            input_ports,
            output_ports,
        }
    }

    /// Instantiate a node from this blueprint under the given display name
    pub fn instantiate(&self, name: impl Into<String>) -> Node {
        Node::new(
            self.type_name.clone(),
            name,
            self.input_ports
                .iter()
                .map(|p| p.instantiate(PortDirection::In))
                .collect(),
            self.output_ports
                .iter()
                .map(|p| p.instantiate(PortDirection::Out))
                .collect(),
        )
    }
}

/// Error when a type name has no registered blueprint
#[derive(Debug, thiserror::Error)]
#[error("Unknown node type: {0}")]
pub struct UnknownTypeError(pub String);

/// Registry of available node kinds.
///
/// Default display names come from a per-kind counter held on the registry
/// instance, not in static state, so registries stay independent of each
/// other and of test order.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    blueprints: IndexMap<String, NodeBlueprint>,
    name_counters: IndexMap<String, u64>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a blueprint, replacing any previous one of the same kind
    pub fn register(&mut self, blueprint: NodeBlueprint) {
        self.blueprints
            .insert(blueprint.type_name.clone(), blueprint);
    }

    /// Get a blueprint by kind name
    pub fn get(&self, type_name: &str) -> Option<&NodeBlueprint> {
        self.blueprints.get(type_name)
    }

    /// Whether a kind is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.blueprints.contains_key(type_name)
    }

    /// All registered blueprints, in registration order
    pub fn blueprints(&self) -> impl Iterator<Item = &NodeBlueprint> {
        self.blueprints.values()
    }

    /// Create a node by kind name with the next default display name
    /// (`TypeName1`, `TypeName2`, ...)
    pub fn create_node(&mut self, type_name: &str) -> Result<Node, UnknownTypeError> {
        let blueprint = self
            .blueprints
            .get(type_name)
            .ok_or_else(|| UnknownTypeError(type_name.to_string()))?;
        let counter = self.name_counters.entry(type_name.to_string()).or_insert(0);
        *counter += 1;
        let name = format!("{type_name}{counter}");
        Ok(blueprint.instantiate(name))
    }
}
