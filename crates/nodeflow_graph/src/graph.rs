// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph container: invariant-preserving mutation over nodes and edges,
//! with synchronous change notification.

use crate::edge::{ConnectError, Edge, EdgeId};
use crate::node::{Node, NodeId};
use crate::port::{Port, PortDirection, PortRef};
use indexmap::{IndexMap, IndexSet};

/// Change notification fired synchronously by graph mutation.
///
/// Every successful mutation fires its specific event first, immediately
/// followed by [`GraphEvent::ElementsChanged`]. Batched operations fire
/// per element in argument order, with no coalescing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    /// A node entered the graph
    NodeAdded(NodeId),
    /// A node left the graph (its incident edges were removed first)
    NodeRemoved(NodeId),
    /// An edge entered the graph
    EdgeAdded(EdgeId),
    /// An edge left the graph
    EdgeRemoved(EdgeId),
    /// Something structural changed; fired after every specific event
    ElementsChanged,
}

/// Listener callback for [`GraphEvent`]s
pub type Listener = Box<dyn FnMut(&GraphEvent)>;

/// The mutable container of nodes and edges.
///
/// Node and edge iteration follows insertion order. All mutation goes
/// through the methods here, which maintain referential closure: every
/// edge's endpoints belong to nodes in the graph, and every port's
/// incident-edge set matches exactly the edges that reference it.
///
/// Events are delivered synchronously on the mutating call; the engine is
/// single-threaded and takes no locks.
#[derive(Default)]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes)
            .field("edges", &self.edges)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a listener to change events
    pub fn subscribe(&mut self, listener: impl FnMut(&GraphEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Drop all listeners
    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    fn emit(&mut self, event: GraphEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    /// Add a node to the graph.
    ///
    /// No-op if the node is already present (guards against
    /// double-registration from concurrent UI paths). Emits
    /// `NodeAdded` then `ElementsChanged` on insertion.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            tracing::debug!(node = ?id, "add_node: already present");
            return id;
        }
        self.nodes.insert(id, node);
        self.emit(GraphEvent::NodeAdded(id));
        self.emit(GraphEvent::ElementsChanged);
        id
    }

    /// Add several nodes, applying [`Graph::add_node`] in argument order
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) {
        for node in nodes {
            self.add_node(node);
        }
    }

    /// Remove a node and cascade-remove every edge incident to any of its
    /// ports.
    ///
    /// No-op if absent. Cascaded edges go through [`Graph::remove_edge`],
    /// so their side effects and events run uniformly; `EdgeRemoved`
    /// events fire before `NodeRemoved`.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let mut node = self.nodes.shift_remove(&node_id)?;
        let incident: Vec<EdgeId> = node.ports().flat_map(Port::edges).collect();
        for edge_id in incident {
            self.remove_edge(edge_id);
        }
        // the cascade unregistered the surviving endpoints; the removed
        // node's own incident sets must not keep naming dead edges either,
        // or re-adding the returned node would dangle
        for port in node
            .input_ports
            .iter_mut()
            .chain(node.output_ports.iter_mut())
        {
            port.edges.clear();
        }
        self.emit(GraphEvent::NodeRemoved(node_id));
        self.emit(GraphEvent::ElementsChanged);
        Some(node)
    }

    /// Add an edge to the graph.
    ///
    /// No-op if an equal edge (same endpoint addresses) already exists;
    /// the existing edge's id is returned. Performs no semantic
    /// validation, since speculative edges are constructed while a drag
    /// is still in progress; callers validate through [`Graph::connect`]
    /// first. The edge and both endpoint ports' incident sets are
    /// updated together, then `EdgeAdded` and `ElementsChanged` fire.
    pub fn add_edge(&mut self, edge: Edge) -> EdgeId {
        if let Some(existing) = self.edges.values().find(|e| **e == edge) {
            tracing::debug!(edge = ?existing.id, "add_edge: duplicate suppressed");
            return existing.id;
        }
        if self.port(&edge.source).is_none() || self.port(&edge.target).is_none() {
            debug_assert!(false, "add_edge endpoints must exist in the graph");
            tracing::warn!(edge = ?edge.id, "add_edge: endpoint missing, ignoring");
            return edge.id;
        }
        let id = edge.id;
        let (source, target) = (edge.source, edge.target);
        self.edges.insert(id, edge);
        if let Some(port) = self.port_mut(&source) {
            port.edges.insert(id);
        }
        if let Some(port) = self.port_mut(&target) {
            port.edges.insert(id);
        }
        self.emit(GraphEvent::EdgeAdded(id));
        self.emit(GraphEvent::ElementsChanged);
        id
    }

    /// Add several edges, applying [`Graph::add_edge`] in argument order
    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = Edge>) {
        for edge in edges {
            self.add_edge(edge);
        }
    }

    /// Remove an edge, unregistering it from both endpoints' incident
    /// sets. No-op if absent. An endpoint node that is itself being
    /// cascaded away may already be gone; its incident set left with it.
    pub fn remove_edge(&mut self, edge_id: EdgeId) -> Option<Edge> {
        let edge = self.edges.shift_remove(&edge_id)?;
        for endpoint in [edge.source, edge.target] {
            if let Some(port) = self.port_mut(&endpoint) {
                port.edges.shift_remove(&edge_id);
            }
        }
        self.emit(GraphEvent::EdgeRemoved(edge_id));
        self.emit(GraphEvent::ElementsChanged);
        Some(edge)
    }

    /// Validate a prospective connection between two port addresses.
    ///
    /// Rejects unknown endpoints, two ports of the same node, and two
    /// ports of the same direction. On success returns the endpoints
    /// ordered as `(source, target)`, since a connection may be dragged
    /// from either end.
    pub fn validate_connection(
        &self,
        a: PortRef,
        b: PortRef,
    ) -> Result<(PortRef, PortRef), ConnectError> {
        for endpoint in [a, b] {
            let node = self
                .nodes
                .get(&endpoint.node)
                .ok_or(ConnectError::NodeNotFound(endpoint.node))?;
            node.port(&endpoint)
                .ok_or(ConnectError::PortNotFound(endpoint))?;
        }
        if a.direction == b.direction {
            return Err(ConnectError::SameDirection(a.direction));
        }
        if a.node == b.node {
            return Err(ConnectError::SameNode);
        }
        Ok(match a.direction {
            PortDirection::Out => (a, b),
            PortDirection::In => (b, a),
        })
    }

    /// Build a connection between two ports: validate, then register via
    /// [`Graph::add_edge`]. On failure the graph is untouched.
    pub fn connect(&mut self, a: PortRef, b: PortRef) -> Result<EdgeId, ConnectError> {
        let (source, target) = self.validate_connection(a, b)?;
        Ok(self.add_edge(Edge::new(source, target)))
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node IDs, in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get an edge by ID
    pub fn edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        self.edges.get(&edge_id)
    }

    /// All edges, in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Resolve a port address
    pub fn port(&self, port: &PortRef) -> Option<&Port> {
        self.nodes.get(&port.node)?.port(port)
    }

    /// Resolve a port address, mutably
    pub fn port_mut(&mut self, port: &PortRef) -> Option<&mut Port> {
        self.nodes.get_mut(&port.node)?.port_mut(port)
    }

    /// Edges arriving at a node's input ports
    pub fn input_edges(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| e.target.node == node_id)
    }

    /// Edges leaving a node's output ports
    pub fn output_edges(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| e.source.node == node_id)
    }

    /// Build the read-only induced subgraph over a chosen node subset:
    /// the nodes, plus every edge whose *both* endpoints lie in the
    /// subset, discovered by scanning each candidate's incident sets.
    pub fn sub_graph(&self, nodes: &[NodeId]) -> SubGraph {
        let chosen: IndexSet<NodeId> = nodes.iter().copied().collect();
        let mut edges: IndexSet<EdgeId> = IndexSet::new();
        for node_id in &chosen {
            let Some(node) = self.nodes.get(node_id) else {
                continue;
            };
            for edge_id in node.ports().flat_map(Port::edges) {
                let Some(edge) = self.edges.get(&edge_id) else {
                    continue;
                };
                if chosen.contains(&edge.source.node) && chosen.contains(&edge.target.node) {
                    edges.insert(edge_id);
                }
            }
        }
        SubGraph {
            nodes: chosen.into_iter().collect(),
            edges: edges.into_iter().collect(),
        }
    }
}

/// Read-only induced view over a subset of a graph's nodes and the edges
/// fully contained within that subset. Not mutable independently of the
/// parent graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubGraph {
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
}

impl SubGraph {
    /// Chosen nodes, in selection order
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Induced edges
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::port::Port;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn source_node(name: &str) -> Node {
        Node::new("Source", name, vec![], vec![Port::output("out1")])
    }

    fn sink_node(name: &str) -> Node {
        Node::new("Sink", name, vec![Port::input("in1")], vec![])
    }

    /// Every edge's endpoints resolve, and every port's incident set
    /// matches exactly the edges that reference it.
    fn assert_referential_closure(graph: &Graph) {
        for edge in graph.edges() {
            assert!(graph.port(&edge.source).is_some());
            assert!(graph.port(&edge.target).is_some());
        }
        for node in graph.nodes() {
            for port_ref in node.port_refs() {
                let port = node.port(&port_ref).unwrap();
                let referencing: Vec<EdgeId> = graph
                    .edges()
                    .filter(|e| e.involves_port(port_ref))
                    .map(|e| e.id)
                    .collect();
                let incident: Vec<EdgeId> = port.edges().collect();
                assert_eq!(incident.len(), referencing.len());
                for id in referencing {
                    assert!(port.edges.contains(&id));
                }
            }
        }
    }

    #[test]
    fn test_basic_connect_scenario() {
        let mut graph = Graph::new();
        let a = source_node("A");
        let b = sink_node("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.add_nodes([a, b]);

        let edge_id = graph
            .connect(PortRef::output(a_id, 0), PortRef::input(b_id, 0))
            .unwrap();

        assert_eq!(graph.edge_count(), 1);
        let out1 = graph.port(&PortRef::output(a_id, 0)).unwrap();
        let in1 = graph.port(&PortRef::input(b_id, 0)).unwrap();
        assert_eq!(out1.edges().collect::<Vec<_>>(), vec![edge_id]);
        assert_eq!(in1.edges().collect::<Vec<_>>(), vec![edge_id]);
        assert_referential_closure(&graph);
    }

    #[test]
    fn test_cascading_delete_scenario() {
        let mut graph = Graph::new();
        let a = source_node("A");
        let b = sink_node("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.add_nodes([a, b]);
        graph
            .connect(PortRef::output(a_id, 0), PortRef::input(b_id, 0))
            .unwrap();

        graph.remove_node(a_id);

        assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec![b_id]);
        assert_eq!(graph.edge_count(), 0);
        let in1 = graph.port(&PortRef::input(b_id, 0)).unwrap();
        assert_eq!(in1.edge_count(), 0);
        assert_referential_closure(&graph);
    }

    #[test]
    fn test_readded_node_has_no_stale_incident_edges() {
        let mut graph = Graph::new();
        let a = source_node("A");
        let b = sink_node("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.add_nodes([a, b]);
        graph
            .connect(PortRef::output(a_id, 0), PortRef::input(b_id, 0))
            .unwrap();

        // a caller doing its own remove/restore re-adds the returned node
        let removed = graph.remove_node(a_id).unwrap();
        graph.add_node(removed);

        let out1 = graph.port(&PortRef::output(a_id, 0)).unwrap();
        assert_eq!(out1.edges().collect::<Vec<_>>(), Vec::new());
        assert_eq!(graph.edge_count(), 0);
        assert_referential_closure(&graph);
    }

    #[test]
    fn test_connection_drag_from_either_end() {
        let mut graph = Graph::new();
        let a = source_node("A");
        let b = sink_node("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.add_nodes([a, b]);

        // input first: endpoints get normalized to (source, target)
        let id = graph
            .connect(PortRef::input(b_id, 0), PortRef::output(a_id, 0))
            .unwrap();
        let edge = graph.edge(id).unwrap();
        assert_eq!(edge.source.node, a_id);
        assert_eq!(edge.target.node, b_id);
    }

    #[test]
    fn test_reject_bad_edge() {
        let mut graph = Graph::new();
        let both = Node::new(
            "Both",
            "Both1",
            vec![Port::input("in1")],
            vec![Port::output("out1")],
        );
        let both_id = both.id;
        let other = sink_node("B");
        let other_id = other.id;
        graph.add_nodes([both, other]);

        // same node
        assert!(matches!(
            graph.connect(PortRef::output(both_id, 0), PortRef::input(both_id, 0)),
            Err(ConnectError::SameNode)
        ));
        // in-in
        assert!(matches!(
            graph.connect(PortRef::input(both_id, 0), PortRef::input(other_id, 0)),
            Err(ConnectError::SameDirection(PortDirection::In))
        ));
        // unknown port index
        assert!(matches!(
            graph.connect(PortRef::output(both_id, 5), PortRef::input(other_id, 0)),
            Err(ConnectError::PortNotFound(_))
        ));
        // rejection never mutates
        assert_eq!(graph.edge_count(), 0);
        assert_referential_closure(&graph);
    }

    #[test]
    fn test_add_node_idempotent() {
        let mut graph = Graph::new();
        let node = source_node("A");
        let id = graph.add_node(node.clone());
        graph.add_node(node);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node_ids().next(), Some(id));
    }

    #[test]
    fn test_add_edge_idempotent_by_endpoints() {
        let mut graph = Graph::new();
        let a = source_node("A");
        let b = sink_node("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.add_nodes([a, b]);

        let first = graph.add_edge(Edge::new(
            PortRef::output(a_id, 0),
            PortRef::input(b_id, 0),
        ));
        // a distinct Edge value with the same endpoints is the same edge
        let second = graph.add_edge(Edge::new(
            PortRef::output(a_id, 0),
            PortRef::input(b_id, 0),
        ));
        assert_eq!(first, second);
        assert_eq!(graph.edge_count(), 1);
        let out1 = graph.port(&PortRef::output(a_id, 0)).unwrap();
        assert_eq!(out1.edge_count(), 1);
    }

    #[test]
    fn test_remove_edge_never_removes_nodes() {
        let mut graph = Graph::new();
        let a = source_node("A");
        let b = sink_node("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.add_nodes([a, b]);
        let id = graph
            .connect(PortRef::output(a_id, 0), PortRef::input(b_id, 0))
            .unwrap();

        assert!(graph.remove_edge(id).is_some());
        assert!(graph.remove_edge(id).is_none());
        assert_eq!(graph.node_count(), 2);
        assert_referential_closure(&graph);
    }

    #[test]
    fn test_cascade_removes_only_incident_edges() {
        let mut graph = Graph::new();
        let a = source_node("A");
        let b = Node::new(
            "Relay",
            "B",
            vec![Port::input("in1")],
            vec![Port::output("out1")],
        );
        let c = sink_node("C");
        let d = sink_node("D");
        let (a_id, b_id, c_id, d_id) = (a.id, b.id, c.id, d.id);
        graph.add_nodes([a, b, c, d]);
        graph
            .connect(PortRef::output(a_id, 0), PortRef::input(b_id, 0))
            .unwrap();
        let bc = graph
            .connect(PortRef::output(b_id, 0), PortRef::input(c_id, 0))
            .unwrap();
        let ad = graph
            .connect(PortRef::output(a_id, 0), PortRef::input(d_id, 0))
            .unwrap();

        graph.remove_node(b_id);

        let remaining: Vec<EdgeId> = graph.edges().map(|e| e.id).collect();
        assert_eq!(remaining, vec![ad]);
        assert!(graph.edge(bc).is_none());
        assert_referential_closure(&graph);
    }

    #[test]
    fn test_event_order() {
        let events: Rc<RefCell<Vec<GraphEvent>>> = Rc::default();
        let mut graph = Graph::new();
        let sink = Rc::clone(&events);
        graph.subscribe(move |event| sink.borrow_mut().push(*event));

        let a = source_node("A");
        let b = sink_node("B");
        let (a_id, b_id) = (a.id, b.id);
        graph.add_nodes([a, b]);
        graph
            .connect(PortRef::output(a_id, 0), PortRef::input(b_id, 0))
            .unwrap();
        graph.remove_node(a_id);

        let fired = events.borrow();
        let edge_id = match fired[4] {
            GraphEvent::EdgeAdded(id) => id,
            other => panic!("expected EdgeAdded, got {other:?}"),
        };
        assert_eq!(
            *fired,
            vec![
                GraphEvent::NodeAdded(a_id),
                GraphEvent::ElementsChanged,
                GraphEvent::NodeAdded(b_id),
                GraphEvent::ElementsChanged,
                GraphEvent::EdgeAdded(edge_id),
                GraphEvent::ElementsChanged,
                // cascade: edge removal precedes node removal
                GraphEvent::EdgeRemoved(edge_id),
                GraphEvent::ElementsChanged,
                GraphEvent::NodeRemoved(a_id),
                GraphEvent::ElementsChanged,
            ]
        );
    }

    #[test]
    fn test_sub_graph_induces_inner_edges_only() {
        let mut graph = Graph::new();
        let a = source_node("A");
        let b = Node::new(
            "Relay",
            "B",
            vec![Port::input("in1")],
            vec![Port::output("out1")],
        );
        let c = sink_node("C");
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        graph.add_nodes([a, b, c]);
        let ab = graph
            .connect(PortRef::output(a_id, 0), PortRef::input(b_id, 0))
            .unwrap();
        graph
            .connect(PortRef::output(b_id, 0), PortRef::input(c_id, 0))
            .unwrap();

        let sub = graph.sub_graph(&[a_id, b_id]);
        assert_eq!(sub.nodes(), &[a_id, b_id]);
        assert_eq!(sub.edges(), &[ab]);
    }
}
