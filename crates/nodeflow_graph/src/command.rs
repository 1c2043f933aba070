// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reversible edit commands and the bounded undo/redo stack.
//!
//! A command wraps one user-visible edit as an `apply`/`revert` pair. The
//! stack never runs a freshly pushed command's `apply`: the mutation
//! already happened as a side effect of the interactive action that
//! produced the command, and only a later redo re-runs it.

use crate::edge::Edge;
use crate::graph::Graph;
use crate::node::{Node, NodeId};

/// Default maximum undo history depth
pub const MAX_HISTORY: usize = 100;

/// A reversible unit of editing.
///
/// Once editing begins, all graph mutation is expected to flow through the
/// command log; reverting or applying a command whose target no longer
/// exists is a contract violation, asserted in debug builds and safely
/// ignored in release builds.
#[derive(Debug, Clone)]
pub enum Command {
    /// A node was created and added to the graph
    CreateNode(Node),
    /// An edge was created and added to the graph
    CreateEdge(Edge),
    /// A batch of nodes and edges was removed together
    RemoveItems {
        /// Removed nodes, in original iteration order
        nodes: Vec<Node>,
        /// Removed edges, in original iteration order
        edges: Vec<Edge>,
    },
    /// A group of nodes was moved by a single rigid-body offset
    MoveNodes {
        /// Members of the moved selection
        nodes: Vec<NodeId>,
        /// Position delta shared by the whole selection
        delta: [f32; 2],
    },
}

impl Command {
    /// Human-readable description of this command
    pub fn description(&self) -> &'static str {
        match self {
            Self::CreateNode(_) => "Create Node",
            Self::CreateEdge(_) => "Create Edge",
            Self::RemoveItems { .. } => "Remove Items",
            Self::MoveNodes { .. } => "Move Nodes",
        }
    }

    /// Re-run the edit (redo path)
    pub fn apply(&self, graph: &mut Graph) {
        match self {
            Self::CreateNode(node) => {
                graph.add_node(node.clone());
            }
            Self::CreateEdge(edge) => {
                graph.add_edge(edge.clone());
            }
            Self::RemoveItems { nodes, edges } => {
                for node in nodes {
                    if graph.remove_node(node.id).is_none() {
                        contract_violation("redo remove: node already absent");
                    }
                }
                for edge in edges {
                    // incident edges may already be gone via node cascade
                    graph.remove_edge(edge.id);
                }
            }
            Self::MoveNodes { nodes, delta } => {
                translate(graph, nodes, *delta);
            }
        }
    }

    /// Undo the edit
    pub fn revert(&self, graph: &mut Graph) {
        match self {
            Self::CreateNode(node) => {
                if graph.remove_node(node.id).is_none() {
                    contract_violation("undo create: node already absent");
                }
            }
            Self::CreateEdge(edge) => {
                if graph.remove_edge(edge.id).is_none() {
                    contract_violation("undo create: edge already absent");
                }
            }
            Self::RemoveItems { nodes, edges } => {
                // nodes first, so edges never return before their endpoints
                for node in nodes {
                    graph.add_node(node.clone());
                }
                for edge in edges {
                    graph.add_edge(edge.clone());
                }
            }
            Self::MoveNodes { nodes, delta } => {
                translate(graph, nodes, [-delta[0], -delta[1]]);
            }
        }
    }
}

fn translate(graph: &mut Graph, nodes: &[NodeId], delta: [f32; 2]) {
    for node_id in nodes {
        let Some(node) = graph.node_mut(*node_id) else {
            contract_violation("move: node no longer in graph");
            continue;
        };
        let pos = node.position().unwrap_or([0.0, 0.0]);
        node.set_position([pos[0] + delta[0], pos[1] + delta[1]]);
    }
}

fn contract_violation(message: &str) {
    debug_assert!(false, "{message}");
    tracing::warn!(message, "command contract violation");
}

/// Bounded linear undo/redo stack with a cursor.
///
/// Entries between the bottom and the cursor are undoable; entries between
/// the cursor and the top are redoable. Pushing truncates the redoable
/// tail, and the oldest entry is dropped once the stack exceeds its
/// maximum depth.
#[derive(Debug, Default)]
pub struct CommandStack {
    commands: Vec<Command>,
    cursor: usize,
    max_depth: usize,
}

impl CommandStack {
    /// Create a stack with the default maximum depth
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create a stack with a custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            commands: Vec::new(),
            cursor: 0,
            max_depth,
        }
    }

    /// Push a command whose mutation has already happened.
    ///
    /// The command's `apply` is not called here; only a subsequent
    /// [`CommandStack::redo`] runs it.
    pub fn push(&mut self, command: Command) {
        self.commands.truncate(self.cursor);
        self.commands.push(command);
        if self.commands.len() > self.max_depth {
            self.commands.remove(0);
        }
        self.cursor = self.commands.len();
    }

    /// Undo the most recent command. Returns `false` at the bottom of the
    /// stack.
    pub fn undo(&mut self, graph: &mut Graph) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.commands[self.cursor].revert(graph);
        true
    }

    /// Redo the most recently undone command. Returns `false` at the top
    /// of the stack.
    pub fn redo(&mut self, graph: &mut Graph) -> bool {
        if self.cursor == self.commands.len() {
            return false;
        }
        self.commands[self.cursor].apply(graph);
        self.cursor += 1;
        true
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    /// Number of undoable commands
    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    /// Number of redoable commands
    pub fn redo_depth(&self) -> usize {
        self.commands.len() - self.cursor
    }

    /// Description of the next undo, if any
    pub fn undo_description(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .map(|i| self.commands[i].description())
    }

    /// Description of the next redo, if any
    pub fn redo_description(&self) -> Option<&str> {
        self.commands.get(self.cursor).map(Command::description)
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.commands.clear();
        self.cursor = 0;
    }
}
