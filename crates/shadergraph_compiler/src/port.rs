// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::value::Literal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl PortDirection {
    /// Positional alias stem used by editors (`input`, `input2`, `output`, ...)
    pub fn alias_stem(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// Data type that can flow through ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Floating point value
    Float,
    /// Integer value
    Int,
    /// 2D vector
    Vec2,
    /// 3D vector
    Vec3,
    /// 4D vector
    Vec4,
    /// RGB color, stored as a `vec3`
    Color,
    /// Texture sampler
    #[serde(rename = "sampler2D")]
    Sampler2D,
}

impl DataType {
    /// GLSL type name used when declaring variables and uniforms
    pub fn glsl_name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Vec2 => "vec2",
            Self::Vec3 | Self::Color => "vec3",
            Self::Vec4 => "vec4",
            Self::Sampler2D => "sampler2D",
        }
    }

    /// Number of scalar components
    pub fn components(self) -> usize {
        match self {
            Self::Float | Self::Int => 1,
            Self::Vec2 => 2,
            Self::Vec3 | Self::Color => 3,
            Self::Vec4 => 4,
            Self::Sampler2D => 0,
        }
    }

    /// Check if an output of this type may feed an input of `target` type.
    ///
    /// No implicit conversions are inserted: scalars are never broadcast to
    /// vectors. The only interchangeable pair is `color`/`vec3`.
    pub fn can_connect_to(self, target: DataType) -> bool {
        self.connection_class() == target.connection_class()
    }

    fn connection_class(self) -> DataType {
        match self {
            Self::Color => Self::Vec3,
            other => other,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Color => "color",
            Self::Sampler2D => "sampler2D",
        };
        f.write_str(name)
    }
}

/// A port declared on a node type
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDef {
    /// Port name, unique per direction within a node type
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Data type
    pub data_type: DataType,
    /// Literal substituted when an input is left unconnected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Literal>,
    /// Output backed by a runtime uniform instead of a local variable
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub uniform: bool,
}

impl PortDef {
    /// Create a new input port
    pub fn input(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Input,
            data_type,
            default_value: None,
            uniform: false,
        }
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Output,
            data_type,
            default_value: None,
            uniform: false,
        }
    }

    /// Set the value used when the input has no incoming edge
    pub fn with_default(mut self, value: Literal) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Mark an output as uniform-backed.
    ///
    /// The generator declares `uniform <type> u_<node>_<port>;` for it and
    /// reports it in the artifact's uniform list. The uniform's initial value
    /// is the node parameter with the same name as the port, if there is one.
    pub fn uniform_backed(mut self) -> Self {
        self.uniform = true;
        self
    }

    /// Whether an incoming edge is mandatory
    pub fn is_required(&self) -> bool {
        self.direction == PortDirection::Input && self.default_value.is_none()
    }
}

/// Resolve an edge handle to a port index.
///
/// A literal port name wins. Otherwise the positional aliases `input`,
/// `input1`, `input2`, ... (or `output`, `output1`, ...) select ports by
/// position, starting at one. An omitted handle means the first port.
pub fn resolve_port(ports: &[PortDef], direction: PortDirection, handle: Option<&str>) -> Option<usize> {
    let Some(handle) = handle else {
        return (!ports.is_empty()).then_some(0);
    };

    if let Some(index) = ports.iter().position(|p| p.name == handle) {
        return Some(index);
    }

    let suffix = handle.strip_prefix(direction.alias_stem())?;
    let index = if suffix.is_empty() {
        0
    } else {
        suffix.parse::<usize>().ok()?.checked_sub(1)?
    };

    (index < ports.len()).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports() -> Vec<PortDef> {
        vec![
            PortDef::input("a", DataType::Float),
            PortDef::input("b", DataType::Float),
            PortDef::input("t", DataType::Float),
        ]
    }

    #[test]
    fn test_color_and_vec3_interchangeable() {
        assert!(DataType::Color.can_connect_to(DataType::Vec3));
        assert!(DataType::Vec3.can_connect_to(DataType::Color));
        assert!(DataType::Vec2.can_connect_to(DataType::Vec2));
    }

    #[test]
    fn test_no_implicit_broadcast() {
        assert!(!DataType::Float.can_connect_to(DataType::Vec3));
        assert!(!DataType::Vec3.can_connect_to(DataType::Float));
        assert!(!DataType::Int.can_connect_to(DataType::Float));
        assert!(!DataType::Vec3.can_connect_to(DataType::Vec4));
    }

    #[test]
    fn test_resolve_by_name_and_alias() {
        let ports = ports();
        assert_eq!(resolve_port(&ports, PortDirection::Input, Some("b")), Some(1));
        assert_eq!(resolve_port(&ports, PortDirection::Input, Some("input")), Some(0));
        assert_eq!(resolve_port(&ports, PortDirection::Input, Some("input1")), Some(0));
        assert_eq!(resolve_port(&ports, PortDirection::Input, Some("input3")), Some(2));
        assert_eq!(resolve_port(&ports, PortDirection::Input, None), Some(0));
    }

    #[test]
    fn test_resolve_rejects_bad_handles() {
        let ports = ports();
        assert_eq!(resolve_port(&ports, PortDirection::Input, Some("input4")), None);
        assert_eq!(resolve_port(&ports, PortDirection::Input, Some("input0")), None);
        assert_eq!(resolve_port(&ports, PortDirection::Input, Some("output")), None);
        assert_eq!(resolve_port(&ports, PortDirection::Input, Some("c")), None);
        assert_eq!(resolve_port(&[], PortDirection::Input, None), None);
    }

    #[test]
    fn test_default_makes_input_optional() {
        let port = PortDef::input("min", DataType::Float).with_default(Literal::Float(0.0));
        assert!(!port.is_required());
        assert!(PortDef::input("x", DataType::Float).is_required());
        assert!(!PortDef::output("x", DataType::Float).is_required());
    }

    #[test]
    fn test_glsl_names() {
        assert_eq!(DataType::Color.glsl_name(), "vec3");
        assert_eq!(DataType::Color.to_string(), "color");
        assert_eq!(DataType::Sampler2D.glsl_name(), "sampler2D");
    }
}
