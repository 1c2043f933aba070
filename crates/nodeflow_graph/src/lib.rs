// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph engine for the nodeflow editor.
//!
//! This crate is the rendering-agnostic core of an interactive node-graph
//! editor: typed nodes connected through directional ports, with
//! invariant-preserving mutation and change notification, a reversible
//! command log, deterministic DAG auto-layout, and JSON persistence.
//!
//! ## Architecture
//!
//! - Nodes, ports, and edges live in identifier-keyed tables; every
//!   cross-reference is an id lookup, never an owning pointer
//! - Mutation flows through [`Graph`], which keeps referential closure
//!   and fires events synchronously
//! - Edits wrap into [`Command`]s on a bounded [`CommandStack`]
//! - Rendering, interaction, and node kind catalogs are external
//!   collaborators: views subscribe to [`GraphEvent`]s, supply node sizes
//!   to [`layout_graph`], and register [`NodeBlueprint`]s

pub mod command;
pub mod edge;
pub mod graph;
pub mod layout;
pub mod node;
pub mod port;
pub mod registry;
pub mod serialize;

pub use command::{Command, CommandStack};
pub use edge::{ConnectError, Edge, EdgeId};
pub use graph::{Graph, GraphEvent, SubGraph};
pub use layout::{layout_graph, CycleError, LayoutDirection, LayoutOptions};
pub use node::{Node, NodeId, NodeStatus};
pub use port::{DataType, Port, PortData, PortDirection, PortRef};
pub use registry::{NodeBlueprint, NodeRegistry, PortBlueprint, UnknownTypeError};
pub use serialize::{deserialize_graph, serialize_graph, serialize_sub_graph, GraphRecord, SerializeError};
