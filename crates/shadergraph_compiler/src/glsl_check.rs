// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural check of emitted GLSL source.
//!
//! Runs after code generation and on source handed in directly. Blocking
//! problems are an empty source, unbalanced brackets, a syntax error, a
//! missing entry point and a float initialized from a vector. Unknown uniform
//! types, names used before their declaration and calls to undeclared
//! functions are reported as warnings, with suggestions where a fix is known.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use glsl::parser::Parse;
use glsl::syntax::{
    Expr, ExternalDeclaration, FunIdentifier, FunctionParameterDeclarator, FunctionPrototype, Initializer,
    SingleDeclaration, SingleDeclarationNoType, StorageQualifier, TranslationUnit, TypeQualifierSpec,
    TypeSpecifierNonArray,
};
use glsl::visitor::{Host, Visit, Visitor};
use std::collections::BTreeSet;

/// Variables the fragment stage provides without a declaration
const BUILTIN_VARIABLES: &[&str] = &["gl_FragColor", "gl_FragCoord", "gl_FragData", "gl_FrontFacing", "gl_PointCoord"];

/// GLSL ES built-in functions and constructors
const BUILTIN_FUNCTIONS: &[&str] = &[
    "abs", "acos", "all", "any", "asin", "atan", "bool", "bvec2", "bvec3", "bvec4", "ceil", "clamp", "cos",
    "cross", "degrees", "distance", "dot", "equal", "exp", "exp2", "faceforward", "float", "floor", "fract",
    "greaterThan", "greaterThanEqual", "int", "inversesqrt", "ivec2", "ivec3", "ivec4", "length", "lessThan",
    "lessThanEqual", "log", "log2", "mat2", "mat3", "mat4", "matrixCompMult", "max", "min", "mix", "mod",
    "normalize", "not", "notEqual", "pow", "radians", "reflect", "refract", "sign", "sin", "smoothstep", "sqrt",
    "step", "tan", "texture", "texture2D", "texture2DProj", "textureCube", "vec2", "vec3", "vec4", "dFdx",
    "dFdy", "fwidth",
];

/// Uniforms the host supplies to every shader, with their types
const HOST_UNIFORMS: &[(&str, &str)] = &[("iTime", "float"), ("iResolution", "vec2"), ("iMouse", "vec2")];

/// Outcome of checking a GLSL source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReport {
    /// Errors and warnings in check order
    pub diagnostics: Vec<Diagnostic>,
    /// Fixes for reported problems
    pub suggestions: Vec<String>,
}

impl SourceReport {
    /// Whether any blocking problem was found
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    fn error(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(DiagnosticKind::InvalidSource, message));
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(DiagnosticKind::SourceWarning, message));
    }

    fn suggest(&mut self, suggestion: String) {
        if !self.suggestions.contains(&suggestion) {
            self.suggestions.push(suggestion);
        }
    }
}

/// Check a fragment shader source
pub fn check_source(code: &str) -> SourceReport {
    let mut report = SourceReport::default();

    if code.trim().is_empty() {
        report.error("empty shader source");
        return report;
    }

    if let Err(message) = check_brackets(code) {
        report.error(message);
        return report;
    }

    let unit = match TranslationUnit::parse(code) {
        Ok(unit) => unit,
        Err(err) => {
            let detail = err.info.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or("unexpected input");
            report.error(format!("syntax error: {detail}"));
            return report;
        }
    };

    let has_entry_point = unit.0 .0.iter().any(|declaration| match declaration {
        ExternalDeclaration::FunctionDefinition(function) => {
            matches!(function.prototype.name.0.as_str(), "main" | "mainImage")
        }
        _ => false,
    });
    if !has_entry_point {
        report.error("missing entry point: expected main or mainImage");
    }

    let mut walk = ScopeWalk::default();
    unit.visit(&mut walk);
    walk.finish(&mut report);

    report
}

/// Bracket pairing with line:column positions, skipping comments
fn check_brackets(code: &str) -> Result<(), String> {
    let mut open: Vec<(char, usize, usize)> = Vec::new();
    let mut chars = code.chars().peekable();
    let (mut line, mut column) = (1, 0);

    while let Some(c) = chars.next() {
        column += 1;
        match c {
            '\n' => {
                line += 1;
                column = 0;
            }
            '/' if chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        line += 1;
                        column = 0;
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                column += 1;
                let mut previous = ' ';
                for skipped in chars.by_ref() {
                    column += 1;
                    if skipped == '\n' {
                        line += 1;
                        column = 0;
                    }
                    if previous == '*' && skipped == '/' {
                        break;
                    }
                    previous = skipped;
                }
            }
            '(' | '[' | '{' => open.push((c, line, column)),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match open.pop() {
                    None => return Err(format!("unmatched '{c}' at {line}:{column}")),
                    Some((opener, _, _)) if opener != expected => {
                        return Err(format!(
                            "mismatched '{c}' at {line}:{column}, expected '{}'",
                            closer(opener)
                        ));
                    }
                    Some(_) => {}
                }
            }
            _ => {}
        }
    }

    match open.pop() {
        Some((opener, line, column)) => Err(format!("unclosed '{opener}' at {line}:{column}")),
        None => Ok(()),
    }
}

fn closer(opener: char) -> char {
    match opener {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Source-order walk tracking declared names
#[derive(Default)]
struct ScopeWalk {
    declared: BTreeSet<String>,
    functions: BTreeSet<String>,
    callees: BTreeSet<String>,
    undeclared: Vec<String>,
    unknown_calls: Vec<String>,
    unknown_uniform_types: Vec<(String, String)>,
    narrowing: Vec<(String, String)>,
}

impl ScopeWalk {
    fn declare(&mut self, name: &str) {
        self.declared.insert(name.to_string());
    }

    fn use_variable(&mut self, name: &str) {
        if !self.declared.contains(name)
            && !self.callees.contains(name)
            && !BUILTIN_VARIABLES.contains(&name)
            && !self.undeclared.iter().any(|seen| seen == name)
        {
            self.undeclared.push(name.to_string());
        }
    }

    fn call(&mut self, name: &str) {
        if !self.functions.contains(name)
            && !BUILTIN_FUNCTIONS.contains(&name)
            && !self.unknown_calls.iter().any(|seen| seen == name)
        {
            self.unknown_calls.push(name.to_string());
        }
    }

    fn finish(self, report: &mut SourceReport) {
        for (name, found) in self.narrowing {
            report.error(format!("float '{name}' initialized with {found}"));
        }
        for (name, type_name) in self.unknown_uniform_types {
            report.warning(format!("uniform '{name}' has unknown type '{type_name}'"));
        }
        for name in self.undeclared {
            report.warning(format!("'{name}' used before declaration"));
            if let Some((_, ty)) = HOST_UNIFORMS.iter().find(|(uniform, _)| *uniform == name) {
                report.suggest(format!("declare 'uniform {ty} {name};'"));
            }
        }
        for name in self.unknown_calls {
            report.warning(format!("call to undeclared function '{name}'"));
            report.suggest(format!("add an implementation of '{name}' before its first use"));
        }
    }
}

impl Visitor for ScopeWalk {
    fn visit_function_prototype(&mut self, prototype: &FunctionPrototype) -> Visit {
        self.functions.insert(prototype.name.0.clone());
        Visit::Children
    }

    fn visit_function_parameter_declarator(&mut self, declarator: &FunctionParameterDeclarator) -> Visit {
        self.declare(declarator.ident.ident.0.as_str());
        Visit::Children
    }

    fn visit_single_declaration(&mut self, declaration: &SingleDeclaration) -> Visit {
        let Some(name) = &declaration.name else {
            return Visit::Children;
        };

        let is_uniform = declaration.ty.qualifier.as_ref().is_some_and(|qualifier| {
            qualifier
                .qualifiers
                .0
                .iter()
                .any(|spec| matches!(spec, TypeQualifierSpec::Storage(StorageQualifier::Uniform)))
        });
        if let (true, TypeSpecifierNonArray::TypeName(type_name)) = (is_uniform, &declaration.ty.ty.ty) {
            self.unknown_uniform_types.push((name.0.clone(), type_name.0.clone()));
        }

        if declaration.ty.ty.ty == TypeSpecifierNonArray::Float {
            if let Some(vector) = declaration.initializer.as_ref().and_then(vector_constructor) {
                self.narrowing.push((name.0.clone(), vector));
            }
        }

        self.declare(name.0.as_str());
        Visit::Children
    }

    fn visit_single_declaration_no_type(&mut self, declaration: &SingleDeclarationNoType) -> Visit {
        self.declare(declaration.ident.ident.0.as_str());
        Visit::Children
    }

    fn visit_expr(&mut self, expr: &Expr) -> Visit {
        match expr {
            Expr::Variable(ident) => self.use_variable(ident.0.as_str()),
            Expr::FunCall(FunIdentifier::Identifier(ident), _) => self.call(ident.0.as_str()),
            Expr::FunCall(FunIdentifier::Expr(callee), _) => {
                if let Expr::Variable(ident) = callee.as_ref() {
                    self.callees.insert(ident.0.clone());
                    self.call(ident.0.as_str());
                }
            }
            _ => {}
        }
        Visit::Children
    }
}

/// `vec2`/`vec3`/`vec4` when the initializer is a vector constructor call
fn vector_constructor(initializer: &Initializer) -> Option<String> {
    let Initializer::Simple(expr) = initializer else {
        return None;
    };
    let Expr::FunCall(FunIdentifier::Identifier(ident), _) = expr.as_ref() else {
        return None;
    };
    matches!(ident.0.as_str(), "vec2" | "vec3" | "vec4").then(|| ident.0.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "\
precision highp float;
uniform float iTime;
varying vec2 vUv;

float wave(float t) {
    return sin(t) * 0.5 + 0.5;
}

void main() {
    float v = wave(iTime);
    gl_FragColor = vec4(vec3(v), 1.0);
}
";

    fn messages(report: &SourceReport) -> Vec<String> {
        report.diagnostics.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_valid_source_is_clean() {
        let report = check_source(VALID);
        assert!(report.diagnostics.is_empty(), "{:?}", messages(&report));
        assert!(report.suggestions.is_empty());
    }

    #[test]
    fn test_empty_source() {
        let report = check_source("  \n");
        assert_eq!(messages(&report), ["empty shader source"]);
        assert!(report.has_errors());
    }

    #[test]
    fn test_bracket_positions() {
        assert_eq!(check_brackets("void main() {\n    f(1.0;\n}"), Err("mismatched '}' at 3:1, expected ')'".into()));
        assert_eq!(check_brackets("void main() { }}"), Err("unmatched '}' at 1:16".into()));
        assert_eq!(check_brackets("void main() {\n  x[0];\n"), Err("unclosed '{' at 1:13".into()));
        assert_eq!(check_brackets("// (\n/* [ */ void main() {}"), Ok(()));
    }

    #[test]
    fn test_unbalanced_source_stops_early() {
        let report = check_source("void main() {\n    gl_FragColor = vec4(1.0);\n");
        assert_eq!(messages(&report), ["unclosed '{' at 1:13"]);
    }

    #[test]
    fn test_missing_semicolon_is_syntax_error() {
        let report = check_source("void main() {\n    gl_FragColor = vec4(1.0)\n}\n");
        assert!(report.has_errors());
        assert!(messages(&report)[0].starts_with("syntax error"), "{:?}", messages(&report));
    }

    #[test]
    fn test_missing_entry_point() {
        let report = check_source("float f(float x) {\n    return x;\n}\n");
        assert_eq!(messages(&report), ["missing entry point: expected main or mainImage"]);
    }

    #[test]
    fn test_main_image_parameters_are_declared() {
        let report = check_source(
            "uniform vec2 iResolution;\nvoid mainImage(out vec4 fragColor, in vec2 fragCoord) {\n    fragColor = vec4(fragCoord / iResolution, 0.0, 1.0);\n}\n",
        );
        assert!(report.diagnostics.is_empty(), "{:?}", messages(&report));
    }

    #[test]
    fn test_float_from_vector_is_error() {
        let report = check_source("void main() {\n    float x = vec3(1.0);\n    gl_FragColor = vec4(x);\n}\n");
        assert_eq!(messages(&report), ["float 'x' initialized with vec3"]);
    }

    #[test]
    fn test_undeclared_names_warn_with_suggestions() {
        let report = check_source("void main() {\n    float n = perlin(vec2(iTime));\n    gl_FragColor = vec4(n);\n}\n");
        assert!(!report.has_errors());
        assert_eq!(
            messages(&report),
            ["'iTime' used before declaration", "call to undeclared function 'perlin'"]
        );
        assert_eq!(
            report.suggestions,
            [
                "declare 'uniform float iTime;'",
                "add an implementation of 'perlin' before its first use"
            ]
        );
    }

    #[test]
    fn test_unknown_uniform_type_warns() {
        let report = check_source("struct Light { vec3 color; };\nuniform Light light;\nvoid main() {\n    gl_FragColor = vec4(1.0);\n}\n");
        assert_eq!(messages(&report), ["uniform 'light' has unknown type 'Light'"]);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::SourceWarning);
    }
}
