// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and edges.
//!
//! The graph is plain data as sent by the editor. Nothing here checks types
//! or ports; that is the validator's job. The compiler only ever borrows a
//! graph, it never mutates the caller's copy.

use crate::value::ParamValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Unique identifier for a node within a graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Unique identifier for an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Generate a new unique edge ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node instance in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "NodeWire")]
pub struct GraphNode {
    /// Node ID, unique within the graph
    pub id: NodeId,
    /// Node type ID in the registry
    pub type_id: String,
    /// Parameter overrides; unset names use the definition default
    #[serde(default)]
    pub parameter_values: BTreeMap<String, ParamValue>,
}

/// Node as it arrives on the wire.
///
/// Accepts the canonical `{id, typeId, parameterValues}` form and the
/// editor's React Flow form, where the top-level `type` is the renderer tag
/// (`"shaderNode"`) and the shader node lives under `data`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeWire {
    id: NodeId,
    #[serde(default)]
    type_id: Option<String>,
    #[serde(default, rename = "type")]
    tag: Option<String>,
    #[serde(default)]
    parameter_values: Option<BTreeMap<String, ParamValue>>,
    #[serde(default)]
    parameters: Option<BTreeMap<String, ParamValue>>,
    #[serde(default)]
    data: Option<NodeWireData>,
}

#[derive(Deserialize)]
struct NodeWireData {
    #[serde(default, rename = "type")]
    type_id: Option<String>,
    #[serde(default)]
    parameters: Option<BTreeMap<String, ParamValue>>,
}

impl TryFrom<NodeWire> for GraphNode {
    type Error = String;

    /// `typeId` wins over `data.type`, which wins over a bare `type`
    fn try_from(wire: NodeWire) -> Result<Self, Self::Error> {
        let (data_type, data_parameters) = match wire.data {
            Some(data) => (data.type_id, data.parameters),
            None => (None, None),
        };
        let type_id = wire
            .type_id
            .or(data_type)
            .or(wire.tag)
            .ok_or_else(|| format!("node '{}' has no type (expected typeId or data.type)", wire.id))?;
        let parameter_values = wire
            .parameter_values
            .or(data_parameters)
            .or(wire.parameters)
            .unwrap_or_default();

        Ok(Self {
            id: wire.id,
            type_id,
            parameter_values,
        })
    }
}

impl GraphNode {
    /// Create a node with no parameter overrides
    pub fn new(id: impl Into<NodeId>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            parameter_values: BTreeMap::new(),
        }
    }

    /// Set a parameter value
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameter_values.insert(name.into(), value.into());
        self
    }
}

/// A directed edge from an output port to an input port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Edge ID
    #[serde(default = "EdgeId::generate")]
    pub id: EdgeId,
    /// Source node
    #[serde(alias = "source")]
    pub source_node_id: NodeId,
    /// Output port name or positional alias; `None` means the first output
    #[serde(default, alias = "sourceHandle", skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,
    /// Target node
    #[serde(alias = "target")]
    pub target_node_id: NodeId,
    /// Input port name or positional alias; `None` means the first input
    #[serde(default, alias = "targetHandle", skip_serializing_if = "Option::is_none")]
    pub target_port: Option<String>,
}

impl GraphEdge {
    /// Create an edge with a generated ID
    pub fn new(
        source: impl Into<NodeId>,
        source_port: Option<&str>,
        target: impl Into<NodeId>,
        target_port: Option<&str>,
    ) -> Self {
        Self {
            id: EdgeId::generate(),
            source_node_id: source.into(),
            source_port: source_port.map(str::to_string),
            target_node_id: target.into(),
            target_port: target_port.map(str::to_string),
        }
    }

    /// Check if this edge touches a node
    pub fn involves_node(&self, node_id: &NodeId) -> bool {
        &self.source_node_id == node_id || &self.target_node_id == node_id
    }
}

/// A shader graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes in the graph
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    /// Edges between nodes
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: GraphNode) -> Result<(), GraphError> {
        if self.node(&node.id).is_some() {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node and its edges
    pub fn remove_node(&mut self, node_id: &NodeId) -> Option<GraphNode> {
        let index = self.nodes.iter().position(|n| &n.id == node_id)?;
        self.edges.retain(|e| !e.involves_node(node_id));
        Some(self.nodes.remove(index))
    }

    /// Connect two ports. Only node existence is checked here.
    pub fn connect(
        &mut self,
        source: impl Into<NodeId>,
        source_port: &str,
        target: impl Into<NodeId>,
        target_port: &str,
    ) -> Result<EdgeId, GraphError> {
        let source = source.into();
        let target = target.into();
        for id in [&source, &target] {
            if self.node(id).is_none() {
                return Err(GraphError::NodeNotFound(id.clone()));
            }
        }

        let edge = GraphEdge::new(source, Some(source_port), target, Some(target_port));
        let id = edge.id.clone();
        self.edges.push(edge);
        Ok(id)
    }

    /// Remove an edge
    pub fn disconnect(&mut self, edge_id: &EdgeId) -> Option<GraphEdge> {
        let index = self.edges.iter().position(|e| &e.id == edge_id)?;
        Some(self.edges.remove(index))
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == node_id)
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges arriving at a node
    pub fn incoming<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| &e.target_node_id == node_id)
    }

    /// Edges leaving a node
    pub fn outgoing<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| &e.source_node_id == node_id)
    }

    /// Node-level adjacency, independent of node and edge order.
    ///
    /// Every node id appears as a key. Edges with an endpoint that is not a
    /// node are skipped; parallel edges collapse into one link.
    pub fn adjacency(&self) -> Adjacency<'_> {
        let mut adjacency = Adjacency::default();
        for node in &self.nodes {
            adjacency.predecessors.entry(&node.id).or_default();
            adjacency.successors.entry(&node.id).or_default();
        }
        for edge in &self.edges {
            let (source, target) = (&edge.source_node_id, &edge.target_node_id);
            if !adjacency.successors.contains_key(source) || !adjacency.predecessors.contains_key(target) {
                continue;
            }
            adjacency.successors.entry(source).or_default().insert(target);
            adjacency.predecessors.entry(target).or_default().insert(source);
        }
        adjacency
    }
}

/// Predecessor and successor sets per node, in id order
#[derive(Debug, Clone, Default)]
pub struct Adjacency<'g> {
    /// Nodes feeding each node
    pub predecessors: BTreeMap<&'g NodeId, BTreeSet<&'g NodeId>>,
    /// Nodes fed by each node
    pub successors: BTreeMap<&'g NodeId, BTreeSet<&'g NodeId>>,
}

impl<'g> Adjacency<'g> {
    /// All node ids, ascending
    pub fn nodes(&self) -> impl Iterator<Item = &'g NodeId> + '_ {
        self.successors.keys().copied()
    }

    /// Direct predecessors of a node
    pub fn predecessors_of(&self, node_id: &NodeId) -> impl Iterator<Item = &'g NodeId> + '_ {
        self.predecessors.get(node_id).into_iter().flatten().copied()
    }

    /// Direct successors of a node
    pub fn successors_of(&self, node_id: &NodeId) -> impl Iterator<Item = &'g NodeId> + '_ {
        self.successors.get(node_id).into_iter().flatten().copied()
    }
}

/// Error when editing a graph through the builder API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Node ID already in use
    #[error("duplicate node id '{0}'")]
    DuplicateNode(NodeId),

    /// Node not found
    #[error("node not found: '{0}'")]
    NodeNotFound(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Graph {
        let mut graph = Graph::new();
        graph.add_node(GraphNode::new("a", "time_input")).unwrap();
        graph.add_node(GraphNode::new("b", "sin")).unwrap();
        graph.add_node(GraphNode::new("c", "fragment_output")).unwrap();
        graph.connect("a", "time", "b", "value").unwrap();
        graph.connect("b", "result", "c", "color").unwrap();
        graph
    }

    #[test]
    fn test_add_node_rejects_duplicates() {
        let mut graph = sample();
        assert_eq!(
            graph.add_node(GraphNode::new("a", "sin")),
            Err(GraphError::DuplicateNode(NodeId::from("a")))
        );
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_connect_requires_existing_nodes() {
        let mut graph = sample();
        let err = graph.connect("a", "time", "zzz", "value").unwrap_err();
        assert_eq!(err, GraphError::NodeNotFound(NodeId::from("zzz")));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_remove_node_drops_its_edges() {
        let mut graph = sample();
        let removed = graph.remove_node(&NodeId::from("b")).unwrap();
        assert_eq!(removed.type_id, "sin");
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.remove_node(&NodeId::from("b")).is_none());
    }

    #[test]
    fn test_disconnect() {
        let mut graph = sample();
        let id = graph.edges[0].id.clone();
        assert!(graph.disconnect(&id).is_some());
        assert!(graph.disconnect(&id).is_none());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_adjacency() {
        let mut graph = sample();
        graph.edges.push(GraphEdge::new("ghost", None, "c", None));
        let adjacency = graph.adjacency();
        let b = NodeId::from("b");
        assert_eq!(adjacency.nodes().count(), 3);
        assert_eq!(adjacency.predecessors_of(&b).collect::<Vec<_>>(), vec![&NodeId::from("a")]);
        assert_eq!(adjacency.successors_of(&b).collect::<Vec<_>>(), vec![&NodeId::from("c")]);
        assert_eq!(adjacency.predecessors_of(&NodeId::from("c")).count(), 1);
        assert_eq!(graph.incoming(&b).count(), 1);
        assert_eq!(graph.outgoing(&b).count(), 1);
    }

    #[test]
    fn test_editor_json_aliases() {
        let graph: Graph = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "n1", "type": "float_constant", "parameters": {"value": 0.5}},
                    {"id": "n2", "typeId": "fragment_output"}
                ],
                "edges": [
                    {"id": "e1", "source": "n1", "sourceHandle": "value", "target": "n2", "targetHandle": "input"},
                    {"sourceNodeId": "n1", "targetNodeId": "n2"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(graph.nodes[0].type_id, "float_constant");
        assert_eq!(graph.nodes[0].parameter_values["value"], ParamValue::Float(0.5));
        assert!(graph.nodes[1].parameter_values.is_empty());
        assert_eq!(graph.edges[0].target_port.as_deref(), Some("input"));
        assert_eq!(graph.edges[1].source_port, None);
        assert!(!graph.edges[1].id.0.is_empty());
    }

    #[test]
    fn test_react_flow_node_shape() {
        let graph: Graph = serde_json::from_str(
            r#"{
                "nodes": [
                    {
                        "id": "node-1",
                        "type": "shaderNode",
                        "position": {"x": 10.0, "y": 20.0},
                        "data": {"label": "Float", "type": "float_constant", "parameters": {"value": 2.0}}
                    },
                    {"id": "node-2", "typeId": "fragment_output", "type": "shaderNode"}
                ],
                "edges": []
            }"#,
        )
        .unwrap();

        assert_eq!(graph.nodes[0].type_id, "float_constant");
        assert_eq!(graph.nodes[0].parameter_values["value"], ParamValue::Float(2.0));
        assert_eq!(graph.nodes[1].type_id, "fragment_output");
    }

    #[test]
    fn test_node_without_type_is_rejected() {
        let err = serde_json::from_str::<GraphNode>(r#"{"id": "x", "data": {"label": "?"}}"#).unwrap_err();
        assert!(err.to_string().contains("node 'x' has no type"));
    }

    #[test]
    fn test_node_serializes_canonical_form() {
        let node = GraphNode::new("n", "sin");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json, serde_json::json!({"id": "n", "typeId": "sin", "parameterValues": {}}));
        assert_eq!(serde_json::from_value::<GraphNode>(json).unwrap(), node);
    }
}
