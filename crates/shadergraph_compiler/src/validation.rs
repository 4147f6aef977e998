// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph validation against a node registry.
//!
//! Every check runs; nothing short-circuits, so one pass gives the editor
//! complete feedback. Checks iterate nodes by id and edges by endpoint so
//! the diagnostic list does not depend on input order.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::graph::{Graph, GraphEdge, GraphNode, NodeId};
use crate::node::{NodeCategory, NodeRegistry, NodeTypeDefinition};
use crate::port::{resolve_port, PortDef, PortDirection};
use crate::schedule::{Scheduler, SchedulerError};
use std::collections::BTreeMap;

/// An edge with both endpoints resolved to declared ports
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedEdge<'a> {
    pub source: &'a GraphNode,
    pub source_port: &'a PortDef,
    pub target: &'a GraphNode,
    pub target_index: usize,
    pub target_port: &'a PortDef,
}

/// Why an edge could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EdgeProblem<'a> {
    /// Endpoint is not a node in the graph
    UnknownNode(&'a NodeId),
    /// Endpoint's type is unknown; already reported per node
    UnknownType,
    /// Handle does not resolve to a port of the endpoint
    UnknownPort {
        node: &'a NodeId,
        direction: PortDirection,
        handle: Option<&'a str>,
    },
}

impl EdgeProblem<'_> {
    /// Diagnostic for the problem, if it is not reported elsewhere
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        match self {
            Self::UnknownNode(node) => Some(Diagnostic::new(
                DiagnosticKind::UnknownNode,
                format!("edge references unknown node '{node}'"),
            )),
            Self::UnknownType => None,
            Self::UnknownPort { node, direction, handle } => {
                let diagnostic = match handle {
                    Some(handle) => Diagnostic::new(
                        DiagnosticKind::UnknownPort,
                        format!("unknown {} port", direction.alias_stem()),
                    )
                    .at_port(*handle),
                    None => Diagnostic::new(
                        DiagnosticKind::UnknownPort,
                        format!("node has no {} ports", direction.alias_stem()),
                    ),
                };
                Some(diagnostic.at_node(node))
            }
        }
    }
}

/// Resolve both endpoints of an edge
pub(crate) fn resolve_edge<'a>(
    registry: &'a NodeRegistry,
    graph: &'a Graph,
    edge: &'a GraphEdge,
) -> Result<ResolvedEdge<'a>, EdgeProblem<'a>> {
    let endpoint = |id: &'a NodeId| -> Result<(&'a GraphNode, &'a NodeTypeDefinition), EdgeProblem<'a>> {
        let node = graph.node(id).ok_or(EdgeProblem::UnknownNode(id))?;
        let def = registry.lookup(&node.type_id).ok_or(EdgeProblem::UnknownType)?;
        Ok((node, def))
    };

    let (source, source_def) = endpoint(&edge.source_node_id)?;
    let (target, target_def) = endpoint(&edge.target_node_id)?;

    let port = |node: &'a NodeId, def: &'a NodeTypeDefinition, direction, handle: &'a Option<String>| {
        let handle = handle.as_deref();
        resolve_port(def.ports(direction), direction, handle)
            .ok_or(EdgeProblem::UnknownPort { node, direction, handle })
    };

    let source_index = port(&source.id, source_def, PortDirection::Output, &edge.source_port)?;
    let target_index = port(&target.id, target_def, PortDirection::Input, &edge.target_port)?;

    Ok(ResolvedEdge {
        source,
        source_port: &source_def.outputs[source_index],
        target,
        target_index,
        target_port: &target_def.inputs[target_index],
    })
}

/// Edges sorted by endpoints instead of by position in the input
pub(crate) fn sorted_edges(graph: &Graph) -> Vec<&GraphEdge> {
    let mut edges: Vec<&GraphEdge> = graph.edges.iter().collect();
    edges.sort_by(|a, b| {
        (&a.target_node_id, &a.target_port, &a.source_node_id, &a.source_port).cmp(&(
            &b.target_node_id,
            &b.target_port,
            &b.source_node_id,
            &b.source_port,
        ))
    });
    edges
}

/// Graph validator
pub struct GraphValidator<'r> {
    registry: &'r NodeRegistry,
}

impl<'r> GraphValidator<'r> {
    /// Create a validator over a registry
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self { registry }
    }

    /// Validate a graph. An empty result means it is compilable.
    pub fn validate(&self, graph: &Graph) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let mut nodes: BTreeMap<&NodeId, (&GraphNode, usize)> = BTreeMap::new();
        for node in &graph.nodes {
            nodes.entry(&node.id).or_insert((node, 0)).1 += 1;
        }

        for (id, (_, count)) in &nodes {
            if *count > 1 {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::DuplicateNodeId, format!("duplicate node id ({count} nodes)"))
                        .at_node(id),
                );
            }
        }

        // 1. Unknown node types
        let mut known: BTreeMap<&NodeId, (&GraphNode, &NodeTypeDefinition)> = BTreeMap::new();
        for (id, (node, _)) in &nodes {
            match self.registry.lookup(&node.type_id) {
                Some(def) => {
                    known.insert(*id, (*node, def));
                }
                None => diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::UnknownNodeType,
                        format!("unknown node type '{}'", node.type_id),
                    )
                    .at_node(id),
                ),
            }
        }

        // 2. Unknown nodes and ports on edges
        let mut wired: BTreeMap<(&NodeId, usize), Vec<ResolvedEdge<'_>>> = BTreeMap::new();
        for edge in sorted_edges(graph) {
            match resolve_edge(self.registry, graph, edge) {
                Ok(resolved) => wired
                    .entry((&resolved.target.id, resolved.target_index))
                    .or_default()
                    .push(resolved),
                Err(problem) => diagnostics.extend(problem.to_diagnostic()),
            }
        }

        // 3. Required inputs without an edge
        for (id, (_, def)) in &known {
            for (index, port) in def.inputs.iter().enumerate() {
                if port.is_required() && !wired.contains_key(&(*id, index)) {
                    diagnostics.push(
                        Diagnostic::new(DiagnosticKind::UnconnectedInput, "unconnected input")
                            .at_node(id)
                            .at_port(&port.name),
                    );
                }
            }
        }

        // 4. More than one edge into an input
        for ((id, _), edges) in &wired {
            if let [first, _, ..] = edges.as_slice() {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::InputAlreadyConnected,
                        format!("input port already connected ({} edges)", edges.len()),
                    )
                    .at_node(id)
                    .at_port(&first.target_port.name),
                );
            }
        }

        // 5. Port types
        for ((id, _), edges) in &wired {
            for edge in edges {
                let (expected, got) = (edge.target_port.data_type, edge.source_port.data_type);
                if !got.can_connect_to(expected) {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::TypeMismatch,
                            format!("type mismatch: expected {expected} got {got}"),
                        )
                        .at_node(id)
                        .at_port(&edge.target_port.name),
                    );
                }
            }
        }

        // 6. Parameter values
        for (id, (node, def)) in &known {
            for (name, value) in &node.parameter_values {
                let message = match def.parameter_def(name) {
                    None => format!("unknown parameter '{name}'"),
                    Some(param) => match param.resolve(value) {
                        Ok(_) => continue,
                        Err(err) => format!("invalid parameter '{name}': {err}"),
                    },
                };
                diagnostics.push(Diagnostic::new(DiagnosticKind::InvalidParameter, message).at_node(id));
            }
        }

        // 7. Output nodes
        let output_count = known
            .values()
            .filter(|(_, def)| def.category == NodeCategory::Output)
            .count();
        if output_count == 0 {
            diagnostics.push(Diagnostic::new(DiagnosticKind::NoOutputNode, "no output node"));
        }

        // 8. Cycles, then dead branches
        match Scheduler::new(self.registry).schedule(graph, true) {
            Ok(schedule) => {
                if output_count > 1 {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::MultipleOutputNodes,
                            format!("{output_count} output nodes; only this one is used"),
                        )
                        .at_node(&schedule.output),
                    );
                }
                for group in &schedule.unused_groups {
                    let diagnostic = match group.as_slice() {
                        [only] => Diagnostic::new(DiagnosticKind::UnusedNodes, "unused node with no path to the output")
                            .at_node(only),
                        _ => {
                            let names: Vec<&str> = group.iter().map(NodeId::as_str).collect();
                            Diagnostic::new(
                                DiagnosticKind::UnusedNodes,
                                format!("unused nodes with no path to the output: {}", names.join(", ")),
                            )
                        }
                    };
                    diagnostics.push(diagnostic);
                }
            }
            Err(err @ SchedulerError::Cycle { .. }) => {
                if output_count > 1 {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::MultipleOutputNodes,
                        format!("{output_count} output nodes; only the first in order is used"),
                    ));
                }
                diagnostics.extend(err.to_diagnostics());
            }
            Err(SchedulerError::NoOutputNode) => {}
        }

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            diagnostics = diagnostics.len(),
            "validated graph"
        );
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;
    use serde_json::json;

    fn validate(value: serde_json::Value) -> Vec<Diagnostic> {
        let graph: Graph = serde_json::from_value(value).unwrap();
        GraphValidator::new(NodeRegistry::builtin()).validate(&graph)
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_valid_graph_has_no_diagnostics() {
        let diagnostics = validate(json!({
            "nodes": [
                {"id": "c", "type": "color_picker", "parameters": {"color": "#00ff00"}},
                {"id": "out", "type": "fragment_output"}
            ],
            "edges": [{"source": "c", "target": "out"}]
        }));
        assert!(diagnostics.is_empty(), "{:?}", messages(&diagnostics));
    }

    #[test]
    fn test_unknown_type_and_port() {
        let diagnostics = validate(json!({
            "nodes": [
                {"id": "a", "type": "warp_drive"},
                {"id": "t", "type": "time_input"},
                {"id": "out", "type": "fragment_output"}
            ],
            "edges": [
                {"source": "a", "target": "out"},
                {"source": "t", "sourceHandle": "speed", "target": "out"},
                {"source": "ghost", "target": "out"}
            ]
        }));
        assert_eq!(
            messages(&diagnostics),
            vec![
                "node 'a': unknown node type 'warp_drive'",
                "edge references unknown node 'ghost'",
                "node 't' port 'speed': unknown output port",
                "node 'out' port 'color': unconnected input",
            ]
        );
    }

    #[test]
    fn test_all_checks_run() {
        let diagnostics = validate(json!({
            "nodes": [
                {"id": "v", "type": "vec3_constant", "parameters": {"x": 50, "w": 1}},
                {"id": "s", "type": "sin"},
                {"id": "s2", "type": "sin"}
            ],
            "edges": [{"source": "v", "target": "s"}]
        }));
        let kinds: Vec<DiagnosticKind> = diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::UnconnectedInput,
                DiagnosticKind::TypeMismatch,
                DiagnosticKind::InvalidParameter,
                DiagnosticKind::InvalidParameter,
                DiagnosticKind::NoOutputNode,
            ]
        );
        assert_eq!(diagnostics[1].to_string(), "node 's' port 'value': type mismatch: expected float got vec3");
        assert_eq!(diagnostics[2].to_string(), "node 'v': unknown parameter 'w'");
        assert!(diagnostics[3].message.starts_with("invalid parameter 'x'"));
    }

    #[test]
    fn test_duplicate_ids_reported() {
        let diagnostics = validate(json!({
            "nodes": [
                {"id": "out", "type": "fragment_output"},
                {"id": "c", "type": "color_picker"},
                {"id": "c", "type": "color_picker"}
            ],
            "edges": [{"source": "c", "target": "out"}]
        }));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::DuplicateNodeId);
    }

    #[test]
    fn test_multiple_outputs_warn() {
        let diagnostics = validate(json!({
            "nodes": [
                {"id": "c", "type": "color_picker"},
                {"id": "out_b", "type": "fragment_output"},
                {"id": "out_a", "type": "fragment_output"}
            ],
            "edges": [
                {"source": "c", "target": "out_a"},
                {"source": "c", "target": "out_b"}
            ]
        }));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].node_id, Some(NodeId::from("out_a")));
    }

    #[test]
    fn test_unused_nodes_grouped() {
        let diagnostics = validate(json!({
            "nodes": [
                {"id": "c", "type": "color_picker"},
                {"id": "out", "type": "fragment_output"},
                {"id": "t", "type": "time_input"},
                {"id": "s", "type": "sin"},
                {"id": "m", "type": "mouse_input"}
            ],
            "edges": [
                {"source": "c", "target": "out"},
                {"source": "t", "target": "s"}
            ]
        }));
        assert_eq!(
            messages(&diagnostics),
            vec![
                "node 'm': unused node with no path to the output",
                "unused nodes with no path to the output: s, t",
            ]
        );
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Warning));
    }

    #[test]
    fn test_optional_inputs_may_stay_unconnected() {
        let diagnostics = validate(json!({
            "nodes": [
                {"id": "t", "type": "time_input"},
                {"id": "k", "type": "clamp"},
                {"id": "v", "type": "float_to_vec3"},
                {"id": "out", "type": "fragment_output"}
            ],
            "edges": [
                {"source": "t", "target": "k", "targetHandle": "value"},
                {"source": "k", "target": "v"},
                {"source": "v", "target": "out"}
            ]
        }));
        assert!(diagnostics.is_empty(), "{:?}", messages(&diagnostics));
    }
}
