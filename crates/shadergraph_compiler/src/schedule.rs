// SPDX-License-Identifier: MIT OR Apache-2.0
//! Topological scheduling of graph nodes.
//!
//! Kahn's algorithm with an ordered ready set, so ties always break by
//! ascending node id and the order never depends on how the caller happened
//! to list nodes or edges. Nodes left over when the ready set runs dry sit
//! on or behind a cycle; Tarjan's algorithm then picks out the actual
//! cycles so each one is reported once.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::graph::{Adjacency, Graph, NodeId};
use crate::node::{NodeCategory, NodeRegistry};
use std::collections::{BTreeMap, BTreeSet};

/// Emission plan for a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Nodes to emit, dependencies first
    pub order: Vec<NodeId>,
    /// Output node whose statement writes the result
    pub output: NodeId,
    /// Nodes with no path to the output, grouped by connectivity.
    /// Other output nodes are not listed here.
    pub unused_groups: Vec<Vec<NodeId>>,
}

/// Error when a graph cannot be scheduled
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// One or more dependency cycles; each entry lists the participating
    /// node ids in ascending order
    #[error("graph contains {} cycle(s)", .cycles.len())]
    Cycle {
        /// Participants of each cycle
        cycles: Vec<Vec<NodeId>>,
    },

    /// No node of the output category
    #[error("no output node")]
    NoOutputNode,
}

impl SchedulerError {
    /// One diagnostic per cycle, or one for the missing output
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Self::Cycle { cycles } => cycles
                .iter()
                .map(|cycle| {
                    let names: Vec<&str> = cycle.iter().map(NodeId::as_str).collect();
                    Diagnostic::new(DiagnosticKind::Cycle, format!("cycle between nodes: {}", names.join(", ")))
                })
                .collect(),
            Self::NoOutputNode => vec![Diagnostic::new(DiagnosticKind::NoOutputNode, "no output node")],
        }
    }
}

/// Total order over all nodes, or the cycles that prevent one
pub fn topological_order(graph: &Graph) -> Result<Vec<NodeId>, SchedulerError> {
    let adjacency = graph.adjacency();
    let mut in_degree: BTreeMap<&NodeId, usize> = adjacency
        .predecessors
        .iter()
        .map(|(node, preds)| (*node, preds.len()))
        .collect();
    let mut ready: BTreeSet<&NodeId> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(node, _)| *node)
        .collect();

    let mut order = Vec::with_capacity(in_degree.len());
    while let Some(node) = ready.pop_first() {
        order.push(node.clone());
        for next in adjacency.successors_of(node) {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(next);
                }
            }
        }
    }

    if order.len() == in_degree.len() {
        return Ok(order);
    }

    let emitted: BTreeSet<&NodeId> = order.iter().collect();
    let remaining: Vec<&NodeId> = adjacency.nodes().filter(|n| !emitted.contains(n)).collect();
    Err(SchedulerError::Cycle {
        cycles: find_cycles(&adjacency, &remaining),
    })
}

/// Strongly connected components among `nodes` that form real cycles
fn find_cycles(adjacency: &Adjacency<'_>, nodes: &[&NodeId]) -> Vec<Vec<NodeId>> {
    let mut tarjan = Tarjan::new(adjacency, nodes);
    for index in 0..nodes.len() {
        if tarjan.indices[index].is_none() {
            tarjan.visit(index);
        }
    }

    let mut cycles: Vec<Vec<NodeId>> = tarjan
        .components
        .into_iter()
        .filter(|component| match component.as_slice() {
            [single] => adjacency.successors_of(nodes[*single]).any(|s| s == nodes[*single]),
            _ => true,
        })
        .map(|component| {
            let mut ids: Vec<NodeId> = component.iter().map(|i| nodes[*i].clone()).collect();
            ids.sort();
            ids
        })
        .collect();
    cycles.sort();
    cycles
}

struct Tarjan<'a> {
    nodes: &'a [&'a NodeId],
    edges: Vec<Vec<usize>>,
    next_index: usize,
    indices: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    components: Vec<Vec<usize>>,
}

impl<'a> Tarjan<'a> {
    fn new(adjacency: &Adjacency<'_>, nodes: &'a [&'a NodeId]) -> Self {
        let position: BTreeMap<&NodeId, usize> = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let edges = nodes
            .iter()
            .map(|node| {
                adjacency
                    .successors_of(node)
                    .filter_map(|s| position.get(s).copied())
                    .collect()
            })
            .collect();
        Self {
            nodes,
            edges,
            next_index: 0,
            indices: vec![None; nodes.len()],
            lowlink: vec![0; nodes.len()],
            on_stack: vec![false; nodes.len()],
            stack: Vec::new(),
            components: Vec::new(),
        }
    }

    fn visit(&mut self, node: usize) {
        self.indices[node] = Some(self.next_index);
        self.lowlink[node] = self.next_index;
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack[node] = true;

        for next in self.edges[node].clone() {
            match self.indices[next] {
                None => {
                    self.visit(next);
                    self.lowlink[node] = self.lowlink[node].min(self.lowlink[next]);
                }
                Some(index) if self.on_stack[next] => {
                    self.lowlink[node] = self.lowlink[node].min(index);
                }
                Some(_) => {}
            }
        }

        if Some(self.lowlink[node]) == self.indices[node] {
            let mut component = Vec::new();
            while let Some(member) = self.stack.pop() {
                self.on_stack[member] = false;
                component.push(member);
                if member == node {
                    break;
                }
            }
            tracing::trace!(size = component.len(), root = %self.nodes[node], "strongly connected component");
            self.components.push(component);
        }
    }
}

/// Orders nodes for emission and picks the output node
pub struct Scheduler<'r> {
    registry: &'r NodeRegistry,
}

impl<'r> Scheduler<'r> {
    /// Create a scheduler over a registry
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self { registry }
    }

    /// Schedule a graph.
    ///
    /// With `prune` set, only nodes with a path to the chosen output are
    /// kept. Without it every node stays except the output nodes that were
    /// not chosen. Unused groups are reported either way.
    pub fn schedule(&self, graph: &Graph, prune: bool) -> Result<Schedule, SchedulerError> {
        let full_order = topological_order(graph)?;

        let outputs: BTreeSet<&NodeId> = graph
            .nodes
            .iter()
            .filter(|n| self.is_output(&n.type_id))
            .map(|n| &n.id)
            .collect();
        let output = full_order
            .iter()
            .find(|id| outputs.contains(id))
            .cloned()
            .ok_or(SchedulerError::NoOutputNode)?;

        let adjacency = graph.adjacency();
        let live = reaching(&adjacency, &output);

        let unused: BTreeSet<&NodeId> = adjacency
            .nodes()
            .filter(|n| !live.contains(n) && !outputs.contains(n))
            .collect();
        let unused_groups = connected_groups(&adjacency, &unused);

        let order = full_order
            .into_iter()
            .filter(|id| {
                if prune {
                    live.contains(id)
                } else {
                    id == &output || !outputs.contains(id)
                }
            })
            .collect();

        Ok(Schedule {
            order,
            output,
            unused_groups,
        })
    }

    fn is_output(&self, type_id: &str) -> bool {
        self.registry
            .lookup(type_id)
            .is_some_and(|def| def.category == NodeCategory::Output)
    }
}

/// Nodes with a path to `target`, including `target`
fn reaching<'g>(adjacency: &Adjacency<'g>, target: &NodeId) -> BTreeSet<&'g NodeId> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<&'g NodeId> = adjacency.nodes().filter(|n| *n == target).collect();
    while let Some(node) = stack.pop() {
        if seen.insert(node) {
            stack.extend(adjacency.predecessors_of(node));
        }
    }
    seen
}

/// Weakly connected components of `members`, each sorted, ordered by first id
fn connected_groups(adjacency: &Adjacency<'_>, members: &BTreeSet<&NodeId>) -> Vec<Vec<NodeId>> {
    let mut assigned: BTreeSet<&NodeId> = BTreeSet::new();
    let mut groups = Vec::new();

    for start in members {
        if assigned.contains(start) {
            continue;
        }
        let mut group = BTreeSet::new();
        let mut stack = vec![*start];
        while let Some(node) = stack.pop() {
            if !group.insert(node) {
                continue;
            }
            assigned.insert(node);
            let neighbours = adjacency.predecessors_of(node).chain(adjacency.successors_of(node));
            stack.extend(neighbours.filter(|n| members.contains(n) && !group.contains(n)));
        }
        groups.push(group.into_iter().cloned().collect());
    }

    groups
}
