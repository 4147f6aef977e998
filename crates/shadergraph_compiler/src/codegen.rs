// SPDX-License-Identifier: MIT OR Apache-2.0
//! GLSL code generation.
//!
//! The generator walks a [`Schedule`], renders each node's template into a
//! [`Statement`] and only then assembles text. Emitted code has this shape
//! for [`EntryPoint::Main`]:
//!
//! ```glsl
//! precision highp float;
//!
//! uniform float iTime;
//! uniform vec2 iResolution;
//! uniform vec2 iMouse;
//!
//! varying vec2 vUv;
//!
//! // helper functions
//!
//! void main() {
//!     vec2 fragCoord = vUv * iResolution;
//!     vec4 fragColor = vec4(0.0, 0.0, 0.0, 1.0);
//!     // node statements
//!     gl_FragColor = fragColor;
//! }
//! ```
//!
//! [`EntryPoint::MainImage`] drops the precision and varying lines and wraps
//! the statements in `void mainImage(out vec4 fragColor, in vec2 fragCoord)`.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::graph::{Graph, GraphNode, NodeId};
use crate::node::{NodeRegistry, NodeTypeDefinition};
use crate::port::{DataType, PortDef};
use crate::schedule::Schedule;
use crate::template::{Bindings, Template, TemplateError};
use crate::validation::{resolve_edge, sorted_edges, EdgeProblem};
use crate::value::{Literal, ParameterError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Variable the output node writes into
pub const RESULT_VARIABLE: &str = "fragColor";

/// Shader entry-point convention
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryPoint {
    /// `void main()` writing `gl_FragColor`, with `vUv` as a varying
    #[default]
    Main,
    /// Shadertoy `void mainImage(out vec4 fragColor, in vec2 fragCoord)`
    #[serde(alias = "mainImage")]
    MainImage,
}

impl EntryPoint {
    /// Kebab-case name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::MainImage => "main-image",
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Self::Main),
            "main-image" | "mainImage" => Ok(Self::MainImage),
            other => Err(format!("unknown entry point '{other}' (expected main or main-image)")),
        }
    }
}

/// One node's contribution to the entry function body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    /// Node that produced the statement
    pub node: NodeId,
    /// Variables the statement declares
    pub declares: Vec<String>,
    /// Rendered GLSL, one statement per line
    pub text: String,
}

/// A uniform the host must supply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniformDescriptor {
    /// GLSL name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub data_type: DataType,
    /// Initial value, when the graph provides one
    pub value: Option<Literal>,
}

impl UniformDescriptor {
    fn builtin(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            value: None,
        }
    }
}

/// Uniforms every generated shader declares, in declaration order
pub fn builtin_uniforms() -> Vec<UniformDescriptor> {
    vec![
        UniformDescriptor::builtin("iTime", DataType::Float),
        UniformDescriptor::builtin("iResolution", DataType::Vec2),
        UniformDescriptor::builtin("iMouse", DataType::Vec2),
    ]
}

/// Output of the generator
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedShader {
    /// Complete shader source
    pub code: String,
    /// Uniforms, built-ins first
    pub uniforms: Vec<UniformDescriptor>,
    /// Helper functions included, in emission order
    pub functions: Vec<String>,
    /// Body statements, in emission order
    pub statements: Vec<Statement>,
}

/// Error during code generation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodegenError {
    /// Scheduled node is missing from the graph
    #[error("node '{0}' is not in the graph")]
    NodeNotFound(NodeId),

    /// Node type not registered
    #[error("node '{node}' has unknown type '{type_id}'")]
    UnknownNodeType {
        /// Node
        node: NodeId,
        /// Unknown type
        type_id: String,
    },

    /// Edge into a node does not resolve to declared ports
    #[error("node '{node}': edge does not resolve to a declared port")]
    UnresolvedEdge {
        /// Target node
        node: NodeId,
    },

    /// Required input without an edge
    #[error("node '{node}' port '{port}': unconnected input")]
    MissingInput {
        /// Node
        node: NodeId,
        /// Input port
        port: String,
    },

    /// More than one edge into an input
    #[error("node '{node}' port '{port}': input port already connected")]
    InputAlreadyConnected {
        /// Node
        node: NodeId,
        /// Input port
        port: String,
    },

    /// Parameter value does not fit its definition
    #[error("node '{node}': invalid parameter '{name}': {source}")]
    Parameter {
        /// Node
        node: NodeId,
        /// Parameter name
        name: String,
        /// Cause
        #[source]
        source: ParameterError,
    },

    /// Node type template is malformed
    #[error("node '{node}': template of type '{type_id}' failed: {source}")]
    Template {
        /// Node being emitted
        node: NodeId,
        /// Offending node type
        type_id: String,
        /// Cause
        #[source]
        source: TemplateError,
    },

    /// Node type or helper requires a helper that is not registered
    #[error("'{owner}' requires unknown helper '{helper}'")]
    UnknownHelper {
        /// Node type or helper that declared the requirement
        owner: String,
        /// Missing helper
        helper: String,
    },
}

impl CodegenError {
    /// Whether this is a defect in the registry rather than in the graph
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Template { .. } | Self::UnknownHelper { .. })
    }

    /// User-facing diagnostic. Internal causes are not included.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::NodeNotFound(node) => {
                Diagnostic::new(DiagnosticKind::UnknownNode, format!("unknown node '{node}'"))
            }
            Self::UnknownNodeType { node, type_id } => {
                Diagnostic::new(DiagnosticKind::UnknownNodeType, format!("unknown node type '{type_id}'"))
                    .at_node(node)
            }
            Self::UnresolvedEdge { node } => {
                Diagnostic::new(DiagnosticKind::UnknownPort, "edge does not resolve to a declared port").at_node(node)
            }
            Self::MissingInput { node, port } => {
                Diagnostic::new(DiagnosticKind::UnconnectedInput, "unconnected input")
                    .at_node(node)
                    .at_port(port)
            }
            Self::InputAlreadyConnected { node, port } => {
                Diagnostic::new(DiagnosticKind::InputAlreadyConnected, "input port already connected")
                    .at_node(node)
                    .at_port(port)
            }
            Self::Parameter { node, name, source } => Diagnostic::new(
                DiagnosticKind::InvalidParameter,
                format!("invalid parameter '{name}': {source}"),
            )
            .at_node(node),
            Self::Template { node, type_id, .. } => Diagnostic::new(
                DiagnosticKind::Internal,
                format!("internal error: node type '{type_id}' could not be emitted"),
            )
            .at_node(node),
            Self::UnknownHelper { owner, .. } => Diagnostic::new(
                DiagnosticKind::Internal,
                format!("internal error: '{owner}' could not be emitted"),
            ),
        }
    }
}

/// Variable prefix for a node id.
///
/// `v_` followed by the id with every run of non-alphanumeric characters
/// folded into one `_`, and no trailing `_`.
pub fn variable_prefix(id: &str) -> String {
    let mut prefix = String::from("v_");
    let mut pending_separator = false;
    for c in id.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && prefix.len() > 2 {
                prefix.push('_');
            }
            pending_separator = false;
            prefix.push(c);
        } else {
            pending_separator = true;
        }
    }
    if prefix.len() == 2 {
        prefix.push_str("node");
    }
    prefix
}

fn output_variable(prefix: &str, port: &PortDef) -> String {
    if port.uniform {
        format!("u_{prefix}_{}", port.name)
    } else {
        format!("{prefix}_{}", port.name)
    }
}

/// Turns a scheduled graph into GLSL
pub struct CodeGenerator<'r> {
    registry: &'r NodeRegistry,
    entry_point: EntryPoint,
}

impl<'r> CodeGenerator<'r> {
    /// Create a generator using the default entry point
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self {
            registry,
            entry_point: EntryPoint::default(),
        }
    }

    /// Select the entry-point convention
    pub fn with_entry_point(mut self, entry_point: EntryPoint) -> Self {
        self.entry_point = entry_point;
        self
    }

    /// Generate shader source for a schedule of `graph`
    pub fn generate(&self, graph: &Graph, schedule: &Schedule) -> Result<GeneratedShader, CodegenError> {
        let prefixes = self.assign_prefixes(graph);
        let mut uniforms = builtin_uniforms();
        let mut statements = Vec::with_capacity(schedule.order.len());
        let mut needed_helpers: BTreeMap<String, String> = BTreeMap::new();

        for id in &schedule.order {
            let node = graph.node(id).ok_or_else(|| CodegenError::NodeNotFound(id.clone()))?;
            let def = self.definition(node)?;
            let template = def.parse_template().map_err(|source| CodegenError::Template {
                node: id.clone(),
                type_id: def.id.clone(),
                source,
            })?;
            let prefix = prefixes.get(id).cloned().unwrap_or_else(|| variable_prefix(id.as_str()));

            let mut bindings = Bindings {
                local_prefix: prefix.clone(),
                result: RESULT_VARIABLE.to_string(),
                ..Default::default()
            };
            let mut declares = Vec::new();

            for port in &def.outputs {
                let variable = output_variable(&prefix, port);
                if port.uniform {
                    uniforms.push(UniformDescriptor {
                        name: variable.clone(),
                        data_type: port.data_type,
                        value: self.uniform_value(node, def, &port.name)?,
                    });
                } else {
                    declares.push(variable.clone());
                }
                bindings.outputs.insert(port.name.clone(), variable);
            }
            declares.extend(template.locals().into_iter().map(|local| bindings.local_name(local)));

            bindings.inputs = self.bind_inputs(graph, node, def, &prefixes)?;

            for param in &def.parameters {
                let literal = match node.parameter_values.get(&param.name) {
                    Some(value) => param.resolve(value).map_err(|source| CodegenError::Parameter {
                        node: id.clone(),
                        name: param.name.clone(),
                        source,
                    })?,
                    None => param.default.clone(),
                };
                bindings.params.insert(param.name.clone(), literal.to_glsl());
            }

            for helper in &def.helpers {
                needed_helpers.entry(helper.clone()).or_insert_with(|| def.id.clone());
            }

            if template.is_empty() {
                continue;
            }
            let text = template.render(&bindings).map_err(|source| CodegenError::Template {
                node: id.clone(),
                type_id: def.id.clone(),
                source,
            })?;
            statements.push(Statement {
                node: id.clone(),
                declares,
                text,
            });
        }

        let functions = self.expand_helpers(needed_helpers)?;
        let code = self.assemble(&uniforms, &functions, &statements);

        tracing::trace!(
            statements = statements.len(),
            helpers = functions.len(),
            bytes = code.len(),
            "generated shader"
        );

        Ok(GeneratedShader {
            code,
            uniforms,
            functions,
            statements,
        })
    }

    fn definition(&self, node: &GraphNode) -> Result<&'r NodeTypeDefinition, CodegenError> {
        self.registry
            .lookup(&node.type_id)
            .ok_or_else(|| CodegenError::UnknownNodeType {
                node: node.id.clone(),
                type_id: node.type_id.clone(),
            })
    }

    /// Prefix per node id. Ids are visited in sorted order and a numeric
    /// suffix is added until none of the node's variables clash with a
    /// variable already claimed.
    fn assign_prefixes<'g>(&self, graph: &'g Graph) -> BTreeMap<&'g NodeId, String> {
        let ids: BTreeSet<&NodeId> = graph.nodes.iter().map(|n| &n.id).collect();
        let mut claimed: BTreeSet<String> = BTreeSet::new();
        let mut prefixes = BTreeMap::new();

        for id in ids {
            let def = graph.node(id).and_then(|n| self.registry.lookup(&n.type_id));
            let variables = |prefix: &str| -> Vec<String> {
                let mut names = vec![prefix.to_string()];
                if let Some(def) = def {
                    names.extend(def.outputs.iter().map(|port| output_variable(prefix, port)));
                    if let Ok(template) = Template::parse(&def.template) {
                        names.extend(template.locals().iter().map(|local| format!("{prefix}_{local}")));
                    }
                }
                names
            };

            let base = variable_prefix(id.as_str());
            let mut candidate = base.clone();
            let mut suffix = 1;
            while variables(&candidate).iter().any(|name| claimed.contains(name)) {
                suffix += 1;
                candidate = format!("{base}_{suffix}");
            }

            claimed.extend(variables(&candidate));
            prefixes.insert(id, candidate);
        }

        prefixes
    }

    fn bind_inputs(
        &self,
        graph: &Graph,
        node: &GraphNode,
        def: &NodeTypeDefinition,
        prefixes: &BTreeMap<&NodeId, String>,
    ) -> Result<BTreeMap<String, String>, CodegenError> {
        let mut wired: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for edge in sorted_edges(graph).into_iter().filter(|e| e.target_node_id == node.id) {
            let resolved = resolve_edge(self.registry, graph, edge).map_err(|problem| match problem {
                EdgeProblem::UnknownNode(missing) => CodegenError::NodeNotFound(missing.clone()),
                EdgeProblem::UnknownType | EdgeProblem::UnknownPort { .. } => CodegenError::UnresolvedEdge {
                    node: node.id.clone(),
                },
            })?;
            let source_prefix = prefixes
                .get(&resolved.source.id)
                .cloned()
                .unwrap_or_else(|| variable_prefix(resolved.source.id.as_str()));
            wired
                .entry(resolved.target_index)
                .or_default()
                .push(output_variable(&source_prefix, resolved.source_port));
        }

        let mut inputs = BTreeMap::new();
        for (index, port) in def.inputs.iter().enumerate() {
            let expression = match wired.remove(&index).as_deref() {
                Some([variable]) => variable.clone(),
                Some([_, _, ..]) => {
                    return Err(CodegenError::InputAlreadyConnected {
                        node: node.id.clone(),
                        port: port.name.clone(),
                    })
                }
                Some([]) | None => match &port.default_value {
                    Some(literal) => literal.to_glsl(),
                    None => {
                        return Err(CodegenError::MissingInput {
                            node: node.id.clone(),
                            port: port.name.clone(),
                        })
                    }
                },
            };
            inputs.insert(port.name.clone(), expression);
        }
        Ok(inputs)
    }

    /// Initial value of a uniform-backed output: the parameter of the same name
    fn uniform_value(
        &self,
        node: &GraphNode,
        def: &NodeTypeDefinition,
        port_name: &str,
    ) -> Result<Option<Literal>, CodegenError> {
        let Some(param) = def.parameter_def(port_name) else {
            return Ok(None);
        };
        match node.parameter_values.get(port_name) {
            Some(value) => param.resolve(value).map(Some).map_err(|source| CodegenError::Parameter {
                node: node.id.clone(),
                name: port_name.to_string(),
                source,
            }),
            None => Ok(Some(param.default.clone())),
        }
    }

    /// Close the helper set over requirements and order it by registration
    fn expand_helpers(&self, needed: BTreeMap<String, String>) -> Result<Vec<String>, CodegenError> {
        let mut included: BTreeSet<String> = BTreeSet::new();
        let mut pending: Vec<(String, String)> = needed.into_iter().collect();

        while let Some((name, owner)) = pending.pop() {
            if included.contains(&name) {
                continue;
            }
            let helper = self.registry.helper(&name).ok_or_else(|| CodegenError::UnknownHelper {
                owner,
                helper: name.clone(),
            })?;
            pending.extend(helper.requires.iter().map(|dep| (dep.clone(), name.clone())));
            included.insert(name);
        }

        Ok(self
            .registry
            .helpers()
            .filter(|h| included.contains(&h.name))
            .map(|h| h.name.clone())
            .collect())
    }

    fn assemble(&self, uniforms: &[UniformDescriptor], functions: &[String], statements: &[Statement]) -> String {
        let mut code = String::new();

        if self.entry_point == EntryPoint::Main {
            code.push_str("precision highp float;\n\n");
        }
        for uniform in uniforms {
            code.push_str(&format!("uniform {} {};\n", uniform.data_type.glsl_name(), uniform.name));
        }
        if self.entry_point == EntryPoint::Main {
            code.push_str("\nvarying vec2 vUv;\n");
        }

        for helper in functions.iter().filter_map(|name| self.registry.helper(name)) {
            code.push('\n');
            code.push_str(helper.source.trim_end());
            code.push('\n');
        }

        code.push('\n');
        match self.entry_point {
            EntryPoint::Main => {
                code.push_str("void main() {\n");
                code.push_str("    vec2 fragCoord = vUv * iResolution;\n");
                code.push_str(&format!("    vec4 {RESULT_VARIABLE} = vec4(0.0, 0.0, 0.0, 1.0);\n"));
            }
            EntryPoint::MainImage => {
                code.push_str(&format!("void mainImage(out vec4 {RESULT_VARIABLE}, in vec2 fragCoord) {{\n"));
                code.push_str(&format!("    {RESULT_VARIABLE} = vec4(0.0, 0.0, 0.0, 1.0);\n"));
            }
        }

        for statement in statements {
            for line in statement.text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                code.push_str("    ");
                code.push_str(line);
                code.push('\n');
            }
        }

        if self.entry_point == EntryPoint::Main {
            code.push_str(&format!("    gl_FragColor = {RESULT_VARIABLE};\n"));
        }
        code.push_str("}\n");
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphEdge;
    use crate::node::{HelperFunction, NodeCategory};
    use crate::schedule::Scheduler;
    use crate::value::ParameterDef;

    fn generate(graph: &Graph, registry: &NodeRegistry) -> Result<GeneratedShader, CodegenError> {
        let schedule = Scheduler::new(registry).schedule(graph, true).unwrap();
        CodeGenerator::new(registry).generate(graph, &schedule)
    }

    fn chain(nodes: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for (id, type_id) in nodes {
            graph.add_node(GraphNode::new(*id, *type_id)).unwrap();
        }
        for pair in nodes.windows(2) {
            graph.edges.push(GraphEdge::new(pair[0].0, None, pair[1].0, None));
        }
        graph
    }

    #[test]
    fn test_variable_prefix() {
        assert_eq!(variable_prefix("n1"), "v_n1");
        assert_eq!(variable_prefix("node-1"), "v_node_1");
        assert_eq!(variable_prefix("a--b__c"), "v_a_b_c");
        assert_eq!(variable_prefix("_x_"), "v_x");
        assert_eq!(variable_prefix("---"), "v_node");
        assert_eq!(variable_prefix("7"), "v_7");
    }

    #[test]
    fn test_colliding_prefixes_get_suffixes() {
        let graph = chain(&[("c-1", "color_picker"), ("c_1", "fragment_output")]);
        let registry = NodeRegistry::builtin();
        let prefixes = CodeGenerator::new(registry).assign_prefixes(&graph);
        assert_eq!(prefixes[&NodeId::from("c-1")], "v_c_1");
        assert_eq!(prefixes[&NodeId::from("c_1")], "v_c_1_2");
    }

    #[test]
    fn test_defaults_fill_optional_inputs() {
        let graph = chain(&[("p", "vec3_constant"), ("s", "sdf_sphere"), ("v", "float_to_vec3"), ("out", "fragment_output")]);
        let shader = generate(&graph, NodeRegistry::builtin()).unwrap();
        assert!(shader.code.contains("float v_s_distance = length(v_p_vec) - 0.5;"), "{}", shader.code);
        assert!(shader.code.contains("fragColor = vec4(v_v_vec, 1.0);"));
    }

    #[test]
    fn test_locals_are_declared_per_node() {
        let graph = chain(&[("p", "vec3_constant"), ("box", "sdf_box"), ("v", "float_to_vec3"), ("out", "fragment_output")]);
        let shader = generate(&graph, NodeRegistry::builtin()).unwrap();
        let statement = shader.statements.iter().find(|s| s.node == NodeId::from("box")).unwrap();
        assert_eq!(statement.declares, vec!["v_box_distance", "v_box_q"]);
        assert!(statement.text.starts_with("vec3 v_box_q = abs(v_p_vec) - vec3(0.5, 0.5, 0.5);"));
    }

    #[test]
    fn test_helpers_expand_transitively_in_registry_order() {
        let mut graph = chain(&[("uv", "uv_input"), ("f", "fbm"), ("v", "float_to_vec3"), ("out", "fragment_output")]);
        graph.nodes[1] = GraphNode::new("f", "fbm").with_parameter("octaves", 6);
        let shader = generate(&graph, NodeRegistry::builtin()).unwrap();
        assert_eq!(shader.functions, vec!["hash12", "perlin", "fbmNoise"]);
        assert!(shader.code.contains("float v_f_fbm = fbmNoise(v_uv_uv * 1.0, 6);"));
        let hash = shader.code.find("float hash12").unwrap();
        let perlin = shader.code.find("float perlin").unwrap();
        let main = shader.code.find("void main()").unwrap();
        assert!(hash < perlin && perlin < main);
    }

    #[test]
    fn test_main_image_entry_point() {
        let graph = chain(&[("c", "color_picker"), ("out", "fragment_output")]);
        let registry = NodeRegistry::builtin();
        let schedule = Scheduler::new(registry).schedule(&graph, true).unwrap();
        let shader = CodeGenerator::new(registry)
            .with_entry_point(EntryPoint::MainImage)
            .generate(&graph, &schedule)
            .unwrap();
        assert!(!shader.code.contains("precision"));
        assert!(!shader.code.contains("gl_FragColor"));
        assert!(shader.code.contains("void mainImage(out vec4 fragColor, in vec2 fragCoord) {\n"));
        assert!(shader.code.contains("    vec3 v_c_color = vec3(1.0, 0.0, 0.0);\n    fragColor = vec4(v_c_color, 1.0);\n}"));
    }

    #[test]
    fn test_uniform_backed_output() {
        let mut registry = NodeRegistry::new();
        registry.register(
            NodeTypeDefinition::new("tint", "Tint", NodeCategory::Input)
                .output(PortDef::output("tint", DataType::Color).uniform_backed())
                .parameter(ParameterDef::color("tint", [0.2, 0.4, 0.6])),
        );
        registry.register(
            NodeTypeDefinition::new("out", "Out", NodeCategory::Output)
                .input(PortDef::input("color", DataType::Color))
                .emit("{result} = vec4({in.color}, 1.0);"),
        );
        let mut graph = chain(&[("t", "tint"), ("o", "out")]);
        graph.nodes[0] = GraphNode::new("t", "tint").with_parameter("tint", "#ff0000");

        let shader = generate(&graph, &registry).unwrap();
        assert_eq!(shader.uniforms.len(), 4);
        assert_eq!(shader.uniforms[3].name, "u_v_t_tint");
        assert_eq!(shader.uniforms[3].value, Some(Literal::Color([1.0, 0.0, 0.0])));
        assert!(shader.code.contains("uniform vec3 u_v_t_tint;\n"));
        assert!(shader.code.contains("fragColor = vec4(u_v_t_tint, 1.0);"));
        assert_eq!(shader.statements.len(), 1);
    }

    #[test]
    fn test_broken_template_is_internal() {
        let mut registry = NodeRegistry::new();
        registry.register(
            NodeTypeDefinition::new("out", "Out", NodeCategory::Output)
                .input(PortDef::input("color", DataType::Vec3).with_default(Literal::Vec3([0.0; 3])))
                .emit("{result} = vec4({in.colour}, 1.0);"),
        );
        let graph = chain(&[("o", "out")]);
        let err = generate(&graph, &registry).unwrap_err();
        assert!(err.is_internal());
        let diagnostic = err.to_diagnostic();
        assert_eq!(diagnostic.kind, DiagnosticKind::Internal);
        assert!(!diagnostic.message.contains("colour"));
    }

    #[test]
    fn test_missing_helper_is_internal() {
        let mut registry = NodeRegistry::new();
        registry.register_helper(HelperFunction::new("wobble", "float wobble(float x) { return x; }").requires("jitter"));
        registry.register(
            NodeTypeDefinition::new("out", "Out", NodeCategory::Output)
                .emit("{result} = vec4(vec3(wobble(1.0)), 1.0);")
                .helper("wobble"),
        );
        let err = generate(&chain(&[("o", "out")]), &registry).unwrap_err();
        assert_eq!(
            err,
            CodegenError::UnknownHelper {
                owner: "wobble".into(),
                helper: "jitter".into()
            }
        );
    }

    #[test]
    fn test_entry_point_parse() {
        assert_eq!("main".parse::<EntryPoint>(), Ok(EntryPoint::Main));
        assert_eq!("main-image".parse::<EntryPoint>(), Ok(EntryPoint::MainImage));
        assert!("vertex".parse::<EntryPoint>().is_err());
    }
}
