// SPDX-License-Identifier: MIT OR Apache-2.0
//! Emission templates.
//!
//! A template is GLSL text with placeholders:
//!
//! | Placeholder     | Replaced by                                        |
//! |-----------------|----------------------------------------------------|
//! | `{in.NAME}`     | variable (or default literal) wired to input NAME  |
//! | `{out.NAME}`    | variable declared for output NAME                  |
//! | `{param.NAME}`  | literal value of parameter NAME                    |
//! | `{local.NAME}`  | node-scoped temporary variable                     |
//! | `{result}`      | the entry function's result variable               |
//!
//! `{{` and `}}` produce literal braces. Each line of a template is one
//! statement in the emitted body.

use std::collections::BTreeMap;
use std::fmt;

/// One piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal GLSL text
    Text(String),
    /// Input port reference
    Input(String),
    /// Output port reference
    Output(String),
    /// Parameter reference
    Param(String),
    /// Node-scoped temporary
    Local(String),
    /// Result variable of the entry function
    Result,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Input(name) => write!(f, "{{in.{name}}}"),
            Self::Output(name) => write!(f, "{{out.{name}}}"),
            Self::Param(name) => write!(f, "{{param.{name}}}"),
            Self::Local(name) => write!(f, "{{local.{name}}}"),
            Self::Result => f.write_str("{result}"),
        }
    }
}

/// Error in a node type's template. Always a defect in the node table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// `{` without a closing `}`
    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),

    /// Stray `}` outside a placeholder
    #[error("unmatched '}}' at byte {0}")]
    Unmatched(usize),

    /// Placeholder with an unknown kind, e.g. `{foo.bar}`
    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),

    /// Placeholder naming a port or parameter the node type does not declare
    #[error("template references undeclared {0}")]
    Unbound(Segment),
}

/// A parsed emission template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template source
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|(_, next)| *next == '{') => {
                    chars.next();
                    text.push('{');
                }
                '}' if chars.peek().is_some_and(|(_, next)| *next == '}') => {
                    chars.next();
                    text.push('}');
                }
                '}' => return Err(TemplateError::Unmatched(offset)),
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unterminated(offset));
                    }
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(parse_placeholder(&name)?);
                }
                c => text.push(c),
            }
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self { segments })
    }

    /// Parsed segments in source order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the `{local.*}` temporaries, deduplicated in first-use order
    pub fn locals(&self) -> Vec<&str> {
        let mut locals: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Local(name) = segment {
                if !locals.contains(&name.as_str()) {
                    locals.push(name);
                }
            }
        }
        locals
    }

    /// Whether the template renders to nothing
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Text(t) if t.trim().is_empty()))
    }

    /// Substitute every placeholder
    pub fn render(&self, bindings: &Bindings) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            let value = match segment {
                Segment::Text(text) => text.as_str(),
                Segment::Input(name) => bindings.inputs.get(name).map(String::as_str).ok_or_else(|| unbound(segment))?,
                Segment::Output(name) => bindings.outputs.get(name).map(String::as_str).ok_or_else(|| unbound(segment))?,
                Segment::Param(name) => bindings.params.get(name).map(String::as_str).ok_or_else(|| unbound(segment))?,
                Segment::Local(name) => {
                    out.push_str(&bindings.local_name(name));
                    continue;
                }
                Segment::Result => bindings.result.as_str(),
            };
            out.push_str(value);
        }
        Ok(out)
    }
}

fn unbound(segment: &Segment) -> TemplateError {
    TemplateError::Unbound(segment.clone())
}

fn parse_placeholder(name: &str) -> Result<Segment, TemplateError> {
    if name == "result" {
        return Ok(Segment::Result);
    }
    let unknown = || TemplateError::UnknownPlaceholder(name.to_string());
    let (kind, ident) = name.split_once('.').ok_or_else(unknown)?;
    if ident.is_empty() {
        return Err(unknown());
    }
    let ident = ident.to_string();
    match kind {
        "in" => Ok(Segment::Input(ident)),
        "out" => Ok(Segment::Output(ident)),
        "param" => Ok(Segment::Param(ident)),
        "local" => Ok(Segment::Local(ident)),
        _ => Err(unknown()),
    }
}

/// Values substituted into a template for one node
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    /// Input port name -> expression
    pub inputs: BTreeMap<String, String>,
    /// Output port name -> variable
    pub outputs: BTreeMap<String, String>,
    /// Parameter name -> literal
    pub params: BTreeMap<String, String>,
    /// Prefix for `{local.*}` temporaries
    pub local_prefix: String,
    /// Entry function result variable
    pub result: String,
}

impl Bindings {
    /// Variable name for a node-scoped temporary
    pub fn local_name(&self, name: &str) -> String {
        format!("{}_{name}", self.local_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings() -> Bindings {
        let mut b = Bindings {
            local_prefix: "v_n1".to_string(),
            result: "fragColor".to_string(),
            ..Default::default()
        };
        b.inputs.insert("a".into(), "v_n2_value".into());
        b.inputs.insert("b".into(), "0.5".into());
        b.outputs.insert("result".into(), "v_n1_result".into());
        b.params.insert("scale".into(), "2.0".into());
        b
    }

    #[test]
    fn test_parse_and_render() {
        let template = Template::parse("float {out.result} = ({in.a} + {in.b}) * {param.scale};").unwrap();
        assert_eq!(
            template.render(&bindings()).unwrap(),
            "float v_n1_result = (v_n2_value + 0.5) * 2.0;"
        );
    }

    #[test]
    fn test_locals_and_result() {
        let template = Template::parse("vec3 {local.q} = abs({in.a});\n{result} = vec4({local.q}, 1.0);").unwrap();
        assert_eq!(template.locals(), vec!["q"]);
        assert_eq!(
            template.render(&bindings()).unwrap(),
            "vec3 v_n1_q = abs(v_n2_value);\nfragColor = vec4(v_n1_q, 1.0);"
        );
    }

    #[test]
    fn test_escaped_braces() {
        let template = Template::parse("if ({in.a} > 0.0) {{ {result} = vec4(1.0); }}").unwrap();
        assert_eq!(
            template.render(&bindings()).unwrap(),
            "if (v_n2_value > 0.0) { fragColor = vec4(1.0); }"
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Template::parse("float x = {in.a;"), Err(TemplateError::Unterminated(10)));
        assert_eq!(Template::parse("x }"), Err(TemplateError::Unmatched(2)));
        assert_eq!(
            Template::parse("{foo.bar}"),
            Err(TemplateError::UnknownPlaceholder("foo.bar".into()))
        );
        assert!(Template::parse("{in.}").is_err());
    }

    #[test]
    fn test_unbound_placeholder_is_reported() {
        let template = Template::parse("float {out.result} = {in.missing};").unwrap();
        let err = template.render(&bindings()).unwrap_err();
        assert_eq!(err.to_string(), "template references undeclared {in.missing}");
    }

    #[test]
    fn test_empty_template() {
        assert!(Template::parse("").unwrap().is_empty());
        assert!(Template::parse("  \n").unwrap().is_empty());
        assert!(!Template::parse("x;").unwrap().is_empty());
    }
}
