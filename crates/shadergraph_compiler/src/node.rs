// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node type definitions and the registry that holds them.

use crate::port::{PortDef, PortDirection};
use crate::template::{Segment, Template, TemplateError};
use crate::value::ParameterDef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    /// Value sources (coordinates, time, constants)
    Input,
    /// Scalar math
    Operation,
    /// Vector construction and geometry
    Vector,
    /// Color conversion and mixing
    Color,
    /// Noise, SDF primitives, conversions
    Utility,
    /// Texture sampling
    Texture,
    /// Terminal nodes that write the fragment color
    Output,
}

impl NodeCategory {
    /// Get all categories
    pub fn all() -> &'static [NodeCategory] {
        &[
            Self::Input,
            Self::Operation,
            Self::Vector,
            Self::Color,
            Self::Utility,
            Self::Texture,
            Self::Output,
        ]
    }

    /// Lowercase name as used on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Operation => "operation",
            Self::Vector => "vector",
            Self::Color => "color",
            Self::Utility => "utility",
            Self::Texture => "texture",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown node category '{s}'"))
    }
}

/// Node type definition
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeDefinition {
    /// Unique type identifier
    pub id: String,
    /// Display name
    pub label: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Input ports, in positional order
    pub inputs: Vec<PortDef>,
    /// Output ports, in positional order
    pub outputs: Vec<PortDef>,
    /// Parameters baked into the emitted code
    pub parameters: Vec<ParameterDef>,
    /// GLSL emission template (see [`crate::template`])
    pub template: String,
    /// Helper functions the template calls
    pub helpers: Vec<String>,
}

impl NodeTypeDefinition {
    /// Start a definition with no ports, parameters or template
    pub fn new(id: impl Into<String>, label: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category,
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
            template: String::new(),
            helpers: Vec::new(),
        }
    }

    /// Set the description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append an input port
    pub fn input(mut self, port: PortDef) -> Self {
        self.inputs.push(port);
        self
    }

    /// Append an output port
    pub fn output(mut self, port: PortDef) -> Self {
        self.outputs.push(port);
        self
    }

    /// Append a parameter
    pub fn parameter(mut self, parameter: ParameterDef) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set the emission template
    pub fn emit(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Declare a helper function the template calls
    pub fn helper(mut self, name: impl Into<String>) -> Self {
        self.helpers.push(name.into());
        self
    }

    /// Get a parameter definition by name
    pub fn parameter_def(&self, name: &str) -> Option<&ParameterDef> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Ports of one direction
    pub fn ports(&self, direction: PortDirection) -> &[PortDef] {
        match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        }
    }

    /// Parse the template and check that every placeholder is declared
    pub fn parse_template(&self) -> Result<Template, TemplateError> {
        let template = Template::parse(&self.template)?;
        for segment in template.segments() {
            let declared = match segment {
                Segment::Input(name) => self.inputs.iter().any(|p| &p.name == name),
                Segment::Output(name) => self.outputs.iter().any(|p| &p.name == name),
                Segment::Param(name) => self.parameter_def(name).is_some(),
                Segment::Text(_) | Segment::Local(_) | Segment::Result => true,
            };
            if !declared {
                return Err(TemplateError::Unbound(segment.clone()));
            }
        }
        Ok(template)
    }
}

/// A GLSL function emitted ahead of the entry point when a node needs it
#[derive(Debug, Clone, Serialize)]
pub struct HelperFunction {
    /// Function name
    pub name: String,
    /// Full GLSL definition
    pub source: String,
    /// Helpers this one calls
    pub requires: Vec<String>,
}

impl HelperFunction {
    /// Create a helper
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            requires: Vec::new(),
        }
    }

    /// Declare a helper this one depends on
    pub fn requires(mut self, name: impl Into<String>) -> Self {
        self.requires.push(name.into());
        self
    }
}

/// Registry of available node types and helper functions.
///
/// Built once and read-only afterwards. The compiler components borrow a
/// registry instead of reaching for a global, so tests can inject their own.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    /// Registered node types by ID
    types: IndexMap<String, NodeTypeDefinition>,
    /// Registered helpers by name, in emission order
    helpers: IndexMap<String, HelperFunction>,
}

static BUILTIN: LazyLock<NodeRegistry> = LazyLock::new(crate::graphs::create_shader_registry);

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog, built on first use
    pub fn builtin() -> &'static NodeRegistry {
        &BUILTIN
    }

    /// Register a node type
    pub fn register(&mut self, node_type: NodeTypeDefinition) {
        self.types.insert(node_type.id.clone(), node_type);
    }

    /// Register a helper function. Helpers are emitted in registration
    /// order, so register dependencies first.
    pub fn register_helper(&mut self, helper: HelperFunction) {
        self.helpers.insert(helper.name.clone(), helper);
    }

    /// Get a node type by ID
    pub fn lookup(&self, id: &str) -> Option<&NodeTypeDefinition> {
        self.types.get(id)
    }

    /// Get all registered types, in table order
    pub fn list_all(&self) -> impl Iterator<Item = &NodeTypeDefinition> {
        self.types.values()
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeTypeDefinition> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Number of registered node types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no node types are registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Get a helper by name
    pub fn helper(&self, name: &str) -> Option<&HelperFunction> {
        self.helpers.get(name)
    }

    /// All helpers, in emission order
    pub fn helpers(&self) -> impl Iterator<Item = &HelperFunction> {
        self.helpers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::DataType;

    #[test]
    fn test_category_round_trip() {
        for category in NodeCategory::all() {
            assert_eq!(category.as_str().parse::<NodeCategory>(), Ok(*category));
        }
        assert!("shader".parse::<NodeCategory>().is_err());
    }

    #[test]
    fn test_template_check_catches_undeclared_names() {
        let def = NodeTypeDefinition::new("broken", "Broken", NodeCategory::Operation)
            .input(PortDef::input("a", DataType::Float))
            .output(PortDef::output("result", DataType::Float))
            .emit("float {out.result} = {in.a} + {in.b};");
        assert_eq!(
            def.parse_template(),
            Err(TemplateError::Unbound(Segment::Input("b".into())))
        );
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = NodeRegistry::new();
        assert!(registry.is_empty());
        registry.register(NodeTypeDefinition::new("time_input", "Time", NodeCategory::Input));
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("time_input").is_some());
        assert!(registry.lookup("nope").is_none());
        assert_eq!(registry.types_in_category(NodeCategory::Input).count(), 1);
        assert_eq!(registry.types_in_category(NodeCategory::Output).count(), 0);
    }

    #[test]
    fn test_builtin_templates_are_well_formed() {
        let registry = NodeRegistry::builtin();
        for def in registry.list_all() {
            if let Err(err) = def.parse_template() {
                panic!("node type '{}' has a broken template: {err}", def.id);
            }
            for helper in &def.helpers {
                assert!(registry.helper(helper).is_some(), "{} uses unknown helper {helper}", def.id);
            }
            for param in &def.parameters {
                if let (Some(min), Some(max)) = (param.min, param.max) {
                    assert!(min <= max, "{}.{} has inverted bounds", def.id, param.name);
                }
            }
        }
    }

    #[test]
    fn test_builtin_helper_dependencies_precede_dependents() {
        let registry = NodeRegistry::builtin();
        let names: Vec<&str> = registry.helpers().map(|h| h.name.as_str()).collect();
        for (index, helper) in registry.helpers().enumerate() {
            for dep in &helper.requires {
                let dep_index = names.iter().position(|n| n == dep);
                assert!(dep_index.is_some_and(|d| d < index), "{} requires {dep}", helper.name);
            }
        }
    }
}
