// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parameter values and their GLSL literal rendering.
//!
//! Values arrive from the editor as loosely typed JSON ([`ParamValue`]).
//! [`ParameterDef::resolve`] narrows them to a [`Literal`] of the
//! parameter's declared type, checking bounds and options on the way. Only
//! resolved literals ever reach the code generator.

use crate::port::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameter value as stored on a graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean (never valid, kept so the graph still deserializes)
    Bool(bool),
    /// Integral number
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Vector components
    Vector(Vec<f64>),
    /// Text: select options and `#rrggbb` colors
    Text(String),
}

impl ParamValue {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Vector(_) => "vector",
            Self::Text(_) => "text",
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<const N: usize> From<[f32; N]> for ParamValue {
    fn from(value: [f32; N]) -> Self {
        Self::Vector(value.iter().map(|v| f64::from(*v)).collect())
    }
}

/// A typed literal, ready to be baked into shader source
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    /// Float
    Float(f32),
    /// Integer
    Int(i32),
    /// 2D vector
    Vec2([f32; 2]),
    /// 3D vector
    Vec3([f32; 3]),
    /// 4D vector
    Vec4([f32; 4]),
    /// RGB color, components in `[0, 1]`
    Color([f32; 3]),
    /// Chosen option of a select parameter (an identifier or swizzle)
    Select(String),
}

impl Literal {
    /// Render as GLSL source text
    pub fn to_glsl(&self) -> String {
        match self {
            Self::Float(v) => format_float(*v),
            Self::Int(v) => v.to_string(),
            Self::Vec2(v) => format!("vec2({})", join_floats(v)),
            Self::Vec3(v) | Self::Color(v) => format!("vec3({})", join_floats(v)),
            Self::Vec4(v) => format!("vec4({})", join_floats(v)),
            Self::Select(v) => v.clone(),
        }
    }

    /// Data type of the literal when used as a port value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Float(_) => Some(DataType::Float),
            Self::Int(_) => Some(DataType::Int),
            Self::Vec2(_) => Some(DataType::Vec2),
            Self::Vec3(_) => Some(DataType::Vec3),
            Self::Vec4(_) => Some(DataType::Vec4),
            Self::Color(_) => Some(DataType::Color),
            Self::Select(_) => None,
        }
    }
}

/// Format a float so that GLSL always parses it as a float literal.
///
/// Rust's `Display` for floats never uses exponent notation, so appending
/// `.0` to integral values is enough.
pub fn format_float(value: f32) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

fn join_floats(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| format_float(*v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Declared type of a node parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// Float
    Float,
    /// Integer
    Int,
    /// 2D vector
    Vec2,
    /// 3D vector
    Vec3,
    /// 4D vector
    Vec4,
    /// RGB color (`#rrggbb` or three components)
    Color,
    /// One of a fixed set of identifiers
    Select,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Color => "color",
            Self::Select => "select",
        };
        f.write_str(name)
    }
}

/// Error when a parameter value does not satisfy its definition
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    /// Value has the wrong shape for the declared type
    #[error("expected {expected}, got {found}")]
    WrongType {
        /// Declared type
        expected: ParameterType,
        /// Kind of value supplied
        found: &'static str,
    },

    /// Vector has the wrong number of components
    #[error("expected {expected} components, got {found}")]
    WrongLength {
        /// Declared component count
        expected: usize,
        /// Supplied component count
        found: usize,
    },

    /// NaN or infinite component
    #[error("value is not a finite number")]
    NotFinite,

    /// Numeric value outside the declared bounds
    #[error("value {value} is outside [{}, {}]", fmt_bound(.min), fmt_bound(.max))]
    OutOfRange {
        /// Offending value
        value: f64,
        /// Lower bound
        min: Option<f64>,
        /// Upper bound
        max: Option<f64>,
    },

    /// Select value not among the options
    #[error("'{value}' is not one of: {}", .options.join(", "))]
    UnknownOption {
        /// Offending value
        value: String,
        /// Allowed options
        options: Vec<String>,
    },

    /// Color text that is not `#rgb` or `#rrggbb`
    #[error("malformed color '{0}'")]
    MalformedColor(String),
}

fn fmt_bound(bound: &Option<f64>) -> String {
    bound.map_or_else(|| "..".to_string(), |b| b.to_string())
}

/// A parameter declared on a node type
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDef {
    /// Parameter name (also its template placeholder)
    pub name: String,
    /// Declared type
    pub param_type: ParameterType,
    /// Value used when the node does not set one
    pub default: Literal,
    /// Inclusive lower bound for numeric components
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound for numeric components
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Allowed values for select parameters
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl ParameterDef {
    /// Float parameter with inclusive bounds
    pub fn float(name: impl Into<String>, default: f32, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Float,
            default: Literal::Float(default),
            min: Some(min),
            max: Some(max),
            options: Vec::new(),
        }
    }

    /// Integer parameter with inclusive bounds
    pub fn int(name: impl Into<String>, default: i32, min: i32, max: i32) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Int,
            default: Literal::Int(default),
            min: Some(f64::from(min)),
            max: Some(f64::from(max)),
            options: Vec::new(),
        }
    }

    /// Unbounded vector parameter of 2, 3 or 4 components
    pub fn vector(name: impl Into<String>, default: Literal) -> Self {
        let param_type = match default {
            Literal::Vec2(_) => ParameterType::Vec2,
            Literal::Vec4(_) => ParameterType::Vec4,
            _ => ParameterType::Vec3,
        };
        Self {
            name: name.into(),
            param_type,
            default,
            min: None,
            max: None,
            options: Vec::new(),
        }
    }

    /// Color parameter
    pub fn color(name: impl Into<String>, default: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Color,
            default: Literal::Color(default),
            min: Some(0.0),
            max: Some(1.0),
            options: Vec::new(),
        }
    }

    /// Select parameter; the default must be one of the options
    pub fn select(name: impl Into<String>, default: &str, options: &[&str]) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Select,
            default: Literal::Select(default.to_string()),
            min: None,
            max: None,
            options: options.iter().map(|o| (*o).to_string()).collect(),
        }
    }

    /// Narrow a raw value to a literal of this parameter's type
    pub fn resolve(&self, value: &ParamValue) -> Result<Literal, ParameterError> {
        match self.param_type {
            ParameterType::Float => {
                let v = self.number(value)?;
                Ok(Literal::Float(narrow(v)?))
            }
            ParameterType::Int => {
                let v = self.number(value)?;
                if v.fract() != 0.0 || v < f64::from(i32::MIN) || v > f64::from(i32::MAX) {
                    return Err(self.wrong_type(value));
                }
                Ok(Literal::Int(v as i32))
            }
            ParameterType::Vec2 => {
                let [x, y] = self.components::<2>(value)?;
                Ok(Literal::Vec2([x, y]))
            }
            ParameterType::Vec3 => Ok(Literal::Vec3(self.components::<3>(value)?)),
            ParameterType::Vec4 => Ok(Literal::Vec4(self.components::<4>(value)?)),
            ParameterType::Color => match value {
                ParamValue::Text(text) => parse_hex_color(text).map(Literal::Color),
                _ => Ok(Literal::Color(self.components::<3>(value)?)),
            },
            ParameterType::Select => match value {
                ParamValue::Text(text) if self.options.iter().any(|o| o == text) => {
                    Ok(Literal::Select(text.clone()))
                }
                ParamValue::Text(text) => Err(ParameterError::UnknownOption {
                    value: text.clone(),
                    options: self.options.clone(),
                }),
                other => Err(self.wrong_type(other)),
            },
        }
    }

    fn wrong_type(&self, value: &ParamValue) -> ParameterError {
        ParameterError::WrongType {
            expected: self.param_type,
            found: value.kind_name(),
        }
    }

    fn number(&self, value: &ParamValue) -> Result<f64, ParameterError> {
        let v = value.as_number().ok_or_else(|| self.wrong_type(value))?;
        self.check_bounds(v)?;
        Ok(v)
    }

    fn components<const N: usize>(&self, value: &ParamValue) -> Result<[f32; N], ParameterError> {
        let ParamValue::Vector(items) = value else {
            return Err(self.wrong_type(value));
        };
        if items.len() != N {
            return Err(ParameterError::WrongLength {
                expected: N,
                found: items.len(),
            });
        }
        let mut out = [0.0; N];
        for (slot, v) in out.iter_mut().zip(items) {
            self.check_bounds(*v)?;
            *slot = narrow(*v)?;
        }
        Ok(out)
    }

    fn check_bounds(&self, value: f64) -> Result<(), ParameterError> {
        if !value.is_finite() {
            return Err(ParameterError::NotFinite);
        }
        let below = self.min.is_some_and(|min| value < min);
        let above = self.max.is_some_and(|max| value > max);
        if below || above {
            return Err(ParameterError::OutOfRange {
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Narrow to `f32`, rejecting values that overflow to infinity
fn narrow(value: f64) -> Result<f32, ParameterError> {
    let narrowed = value as f32;
    if narrowed.is_finite() {
        Ok(narrowed)
    } else {
        Err(ParameterError::NotFinite)
    }
}

/// Parse `#rgb` / `#rrggbb` into components in `[0, 1]`
fn parse_hex_color(text: &str) -> Result<[f32; 3], ParameterError> {
    let malformed = || ParameterError::MalformedColor(text.to_string());
    let hex = text.strip_prefix('#').ok_or_else(malformed)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed());
    }

    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| malformed());
    let bytes = match hex.len() {
        6 => [channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?],
        3 => {
            let mut out = [0u8; 3];
            for (slot, digit) in out.iter_mut().zip(hex.chars()) {
                let doubled: String = [digit, digit].iter().collect();
                *slot = channel(&doubled)?;
            }
            out
        }
        _ => return Err(malformed()),
    };

    Ok(bytes.map(|b| f32::from(b) / 255.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_rendering_has_decimal_point() {
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(-3.0), "-3.0");
        assert_eq!(format_float(100.0), "100.0");
        assert_eq!(Literal::Int(4).to_glsl(), "4");
    }

    #[test]
    fn test_vector_and_color_rendering() {
        assert_eq!(Literal::Vec2([1.0, 0.25]).to_glsl(), "vec2(1.0, 0.25)");
        assert_eq!(Literal::Color([1.0, 0.0, 0.0]).to_glsl(), "vec3(1.0, 0.0, 0.0)");
        assert_eq!(Literal::Select("y".into()).to_glsl(), "y");
    }

    #[test]
    fn test_float_parameter_bounds() {
        let def = ParameterDef::float("scale", 1.0, 0.1, 10.0);
        assert_eq!(def.resolve(&ParamValue::Float(2.5)), Ok(Literal::Float(2.5)));
        assert_eq!(def.resolve(&ParamValue::Int(3)), Ok(Literal::Float(3.0)));
        assert!(matches!(
            def.resolve(&ParamValue::Float(12.0)),
            Err(ParameterError::OutOfRange { .. })
        ));
        assert!(matches!(
            def.resolve(&ParamValue::Text("big".into())),
            Err(ParameterError::WrongType { .. })
        ));
        assert_eq!(def.resolve(&ParamValue::Float(f64::NAN)), Err(ParameterError::NotFinite));
    }

    #[test]
    fn test_int_parameter_rejects_fractions() {
        let def = ParameterDef::int("octaves", 4, 1, 8);
        assert_eq!(def.resolve(&ParamValue::Int(6)), Ok(Literal::Int(6)));
        assert_eq!(def.resolve(&ParamValue::Float(5.0)), Ok(Literal::Int(5)));
        assert!(def.resolve(&ParamValue::Float(5.5)).is_err());
        assert!(def.resolve(&ParamValue::Int(9)).is_err());
    }

    #[test]
    fn test_color_parameter() {
        let def = ParameterDef::color("color", [1.0, 0.0, 0.0]);
        assert_eq!(
            def.resolve(&ParamValue::Text("#ff0000".into())),
            Ok(Literal::Color([1.0, 0.0, 0.0]))
        );
        assert_eq!(
            def.resolve(&ParamValue::Text("#0f0".into())),
            Ok(Literal::Color([0.0, 1.0, 0.0]))
        );
        assert_eq!(
            def.resolve(&ParamValue::from([0.0f32, 0.5, 1.0])),
            Ok(Literal::Color([0.0, 0.5, 1.0]))
        );
        assert!(matches!(
            def.resolve(&ParamValue::Text("red".into())),
            Err(ParameterError::MalformedColor(_))
        ));
        assert!(def.resolve(&ParamValue::from([0.0f32, 2.0, 1.0])).is_err());
    }

    #[test]
    fn test_select_parameter() {
        let def = ParameterDef::select("component", "x", &["x", "y"]);
        assert_eq!(
            def.resolve(&ParamValue::Text("y".into())),
            Ok(Literal::Select("y".into()))
        );
        let err = def.resolve(&ParamValue::Text("w".into())).unwrap_err();
        assert_eq!(err.to_string(), "'w' is not one of: x, y");
    }

    #[test]
    fn test_vector_length_checked() {
        let def = ParameterDef::vector("offset", Literal::Vec2([0.0, 0.0]));
        assert_eq!(
            def.resolve(&ParamValue::from([1.0f32, 2.0])),
            Ok(Literal::Vec2([1.0, 2.0]))
        );
        assert_eq!(
            def.resolve(&ParamValue::from([1.0f32, 2.0, 3.0])),
            Err(ParameterError::WrongLength { expected: 2, found: 3 })
        );
    }

    #[test]
    fn test_values_beyond_f32_range_are_rejected() {
        let offset = ParameterDef::vector("offset", Literal::Vec3([0.0; 3]));
        assert_eq!(
            offset.resolve(&ParamValue::Vector(vec![1e39, 0.0, 0.0])),
            Err(ParameterError::NotFinite)
        );
        assert_eq!(
            offset.resolve(&ParamValue::Vector(vec![-1e39, 0.0, 0.0])),
            Err(ParameterError::NotFinite)
        );
        assert_eq!(
            offset.resolve(&ParamValue::Vector(vec![3.0e38, 0.0, 0.0])),
            Ok(Literal::Vec3([3.0e38, 0.0, 0.0]))
        );

        let value = ParameterDef::float("value", 0.0, f64::MIN, f64::MAX);
        assert_eq!(value.resolve(&ParamValue::Float(1e300)), Err(ParameterError::NotFinite));
    }

    #[test]
    fn test_untagged_json_values() {
        let values: Vec<ParamValue> = serde_json::from_str(r##"[1, 0.5, [1, 2], "#fff", true]"##).unwrap();
        assert_eq!(values[0], ParamValue::Int(1));
        assert_eq!(values[1], ParamValue::Float(0.5));
        assert_eq!(values[2], ParamValue::Vector(vec![1.0, 2.0]));
        assert_eq!(values[3], ParamValue::Text("#fff".into()));
        assert_eq!(values[4], ParamValue::Bool(true));
    }
}
