// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deterministic auto-layout for a DAG: longest-path leveling, stable
//! in-level ordering, and offset accumulation along the layout direction.
//!
//! Node rendered sizes are supplied by the caller (the view layer owns
//! them); the engine only writes resulting positions back onto nodes.

use crate::graph::Graph;
use crate::node::{Node, NodeId};
use std::collections::HashMap;

/// Flow direction of the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutDirection {
    /// Levels flow left-to-right, nodes stack top-to-bottom
    #[default]
    LeftToRight,
    /// Levels flow top-to-bottom, nodes stack left-to-right
    TopToBottom,
}

/// Layout parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Flow direction
    pub direction: LayoutDirection,
    /// Gap between consecutive levels, along the flow axis
    pub level_gap: f32,
    /// Gap between consecutive nodes within a level, along the cross axis
    pub node_gap: f32,
    /// Top-left origin of the arrangement
    pub start_pos: [f32; 2],
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: LayoutDirection::LeftToRight,
            level_gap: 100.0,
            node_gap: 20.0,
            start_pos: [10.0, 10.0],
        }
    }
}

/// Error when the graph contains a cycle, which has no level assignment
#[derive(Debug, thiserror::Error)]
#[error("Graph contains a cycle")]
pub struct CycleError;

/// Arrange the graph's nodes by DAG depth, writing each node's position
/// attribute directly.
///
/// A node's level is the longest path from any source node (level 0, no
/// input edges) to it. Within a level, nodes order by the maximum
/// target-port index among their outgoing edges (no outgoing edges sorts
/// first), ties keeping prior relative order. Re-running on an unchanged
/// graph with the same size provider yields identical positions.
///
/// Fails with [`CycleError`] before any position is written if the graph
/// is not a DAG.
pub fn layout_graph(
    graph: &mut Graph,
    options: &LayoutOptions,
    size_of: impl Fn(&Node) -> [f32; 2],
) -> Result<(), CycleError> {
    let levels = determine_levels(graph)?;
    let level_to_nodes = group_by_level(graph, &levels);

    let mut level_offset = 0.0f32;
    for nodes in level_to_nodes {
        let mut node_offset = 0.0f32;
        let mut max_size = 0.0f32;
        for node_id in nodes {
            let Some([width, height]) = graph.node(node_id).map(&size_of) else {
                continue;
            };
            let pos = match options.direction {
                LayoutDirection::LeftToRight => {
                    let pos = [
                        options.start_pos[0] + level_offset,
                        options.start_pos[1] + node_offset,
                    ];
                    node_offset += height + options.node_gap;
                    max_size = max_size.max(width);
                    pos
                }
                LayoutDirection::TopToBottom => {
                    let pos = [
                        options.start_pos[0] + node_offset,
                        options.start_pos[1] + level_offset,
                    ];
                    node_offset += width + options.node_gap;
                    max_size = max_size.max(height);
                    pos
                }
            };
            if let Some(node) = graph.node_mut(node_id) {
                node.set_position(pos);
            }
        }
        level_offset += max_size + options.level_gap;
    }
    Ok(())
}

/// Level of every node: longest path from any source, sources at 0.
pub fn determine_levels(graph: &Graph) -> Result<HashMap<NodeId, usize>, CycleError> {
    let mut levels = HashMap::new();
    let mut on_stack = Vec::new();
    for node_id in graph.node_ids() {
        level_of(graph, node_id, &mut levels, &mut on_stack)?;
    }
    Ok(levels)
}

fn level_of(
    graph: &Graph,
    node_id: NodeId,
    levels: &mut HashMap<NodeId, usize>,
    on_stack: &mut Vec<NodeId>,
) -> Result<usize, CycleError> {
    if let Some(level) = levels.get(&node_id) {
        return Ok(*level);
    }
    if on_stack.contains(&node_id) {
        return Err(CycleError);
    }
    on_stack.push(node_id);
    let mut level = 0;
    for edge in graph.input_edges(node_id) {
        let predecessor = level_of(graph, edge.source.node, levels, on_stack)?;
        level = level.max(predecessor + 1);
    }
    on_stack.pop();
    levels.insert(node_id, level);
    Ok(level)
}

/// Group nodes by level, ascending, each level sorted by its stable key.
fn group_by_level(graph: &Graph, levels: &HashMap<NodeId, usize>) -> Vec<Vec<NodeId>> {
    let max_level = levels.values().copied().max().unwrap_or(0);
    let mut grouped: Vec<Vec<NodeId>> = vec![Vec::new(); max_level + 1];
    for node_id in graph.node_ids() {
        grouped[levels[&node_id]].push(node_id);
    }
    for nodes in &mut grouped {
        nodes.sort_by_key(|id| sort_key(graph, *id));
    }
    grouped
}

/// In-level sort key: the maximum target-port index among outgoing edges,
/// so ordering roughly follows downstream fan-in slot order.
fn sort_key(graph: &Graph, node_id: NodeId) -> usize {
    graph
        .output_edges(node_id)
        .map(|edge| edge.target.index)
        .max()
        .unwrap_or(0)
}
