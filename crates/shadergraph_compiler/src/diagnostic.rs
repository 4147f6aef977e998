// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiler diagnostics.

use crate::graph::NodeId;
use serde::Serialize;
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks compilation
    Error,
    /// Reported alongside a successful compile
    Warning,
}

/// Broad class of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticClass {
    /// Malformed graph shape
    Structural,
    /// Port or parameter type problem
    Type,
    /// Dead branch
    UnusedNode,
    /// More than one output node
    MultipleOutputs,
    /// Defect in a node definition
    Internal,
    /// Problem in emitted or submitted GLSL source
    GeneratedSource,
}

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// Two nodes share an id
    DuplicateNodeId,
    /// Node type not in the registry
    UnknownNodeType,
    /// Edge endpoint is not a node in the graph
    UnknownNode,
    /// Edge handle does not resolve to a port
    UnknownPort,
    /// Required input has no incoming edge
    UnconnectedInput,
    /// More than one edge into an input
    InputAlreadyConnected,
    /// Source and target port types differ
    TypeMismatch,
    /// Parameter unknown, wrong type or out of bounds
    InvalidParameter,
    /// No output node in the graph
    NoOutputNode,
    /// More than one output node in the graph
    MultipleOutputNodes,
    /// Dependency cycle
    Cycle,
    /// Nodes that do not reach the output
    UnusedNodes,
    /// Template or registry defect
    Internal,
    /// GLSL source that will not compile
    InvalidSource,
    /// Suspicious GLSL source
    SourceWarning,
}

impl DiagnosticKind {
    /// Severity implied by the kind
    pub fn severity(self) -> Severity {
        match self {
            Self::MultipleOutputNodes | Self::UnusedNodes | Self::SourceWarning => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Class of the kind
    pub fn class(self) -> DiagnosticClass {
        match self {
            Self::TypeMismatch | Self::InvalidParameter => DiagnosticClass::Type,
            Self::UnusedNodes => DiagnosticClass::UnusedNode,
            Self::MultipleOutputNodes => DiagnosticClass::MultipleOutputs,
            Self::Internal => DiagnosticClass::Internal,
            Self::InvalidSource | Self::SourceWarning => DiagnosticClass::GeneratedSource,
            _ => DiagnosticClass::Structural,
        }
    }
}

/// A single compiler message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Kind
    pub kind: DiagnosticKind,
    /// Message without location context
    pub message: String,
    /// Node the diagnostic refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    /// Port the diagnostic refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_name: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the kind's default severity
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            message: message.into(),
            node_id: None,
            port_name: None,
        }
    }

    /// Attach a node
    pub fn at_node(mut self, node_id: &NodeId) -> Self {
        self.node_id = Some(node_id.clone());
        self
    }

    /// Attach a port
    pub fn at_port(mut self, port_name: impl Into<String>) -> Self {
        self.port_name = Some(port_name.into());
        self
    }

    /// Whether this blocks compilation
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Message with its node/port context embedded, as shown to users
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.node_id, &self.port_name) {
            (Some(node), Some(port)) => write!(f, "node '{node}' port '{port}': {}", self.message),
            (Some(node), None) => write!(f, "node '{node}': {}", self.message),
            (None, Some(port)) => write!(f, "port '{port}': {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_embeds_context() {
        let diagnostic = Diagnostic::new(DiagnosticKind::UnconnectedInput, "unconnected input")
            .at_node(&NodeId::from("n3"))
            .at_port("b");
        assert_eq!(diagnostic.to_string(), "node 'n3' port 'b': unconnected input");

        let plain = Diagnostic::new(DiagnosticKind::NoOutputNode, "no output node");
        assert_eq!(plain.to_string(), "no output node");
    }

    #[test]
    fn test_severity_follows_kind() {
        assert!(Diagnostic::new(DiagnosticKind::Cycle, "cycle").is_error());
        assert!(!Diagnostic::new(DiagnosticKind::UnusedNodes, "unused").is_error());
        assert_eq!(DiagnosticKind::MultipleOutputNodes.severity(), Severity::Warning);
        assert_eq!(DiagnosticKind::TypeMismatch.class(), DiagnosticClass::Type);
        assert_eq!(DiagnosticKind::Cycle.class(), DiagnosticClass::Structural);
        assert_eq!(DiagnosticKind::SourceWarning.severity(), Severity::Warning);
        assert_eq!(DiagnosticKind::InvalidSource.class(), DiagnosticClass::GeneratedSource);
    }
}
