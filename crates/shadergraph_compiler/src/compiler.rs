// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiler facade: validate, schedule, generate.
//!
//! User-caused problems always come back as diagnostics inside a normal
//! result. A defect in a node definition is logged with its cause and
//! surfaced as a single internal diagnostic.

use crate::codegen::{CodeGenerator, EntryPoint, GeneratedShader, UniformDescriptor};
use crate::diagnostic::{Diagnostic, Severity};
use crate::glsl_check;
use crate::graph::Graph;
use crate::node::NodeRegistry;
use crate::schedule::Scheduler;
use crate::validation::GraphValidator;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Target shading language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderLanguage {
    /// GLSL ES fragment shader
    #[default]
    Glsl,
}

/// Options for a compile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Target language
    pub language: ShaderLanguage,
    /// Drop nodes with no path to the output
    pub optimize: bool,
    /// Entry-point convention
    pub entry_point: EntryPoint,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            language: ShaderLanguage::Glsl,
            optimize: true,
            entry_point: EntryPoint::Main,
        }
    }
}

/// Compiled shader, or the reason there is none
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompiledArtifact {
    /// Shader source; empty whenever `error` is set
    pub code: String,
    /// Uniforms the host must supply
    pub uniforms: Vec<UniformDescriptor>,
    /// Helper functions included
    pub functions: Vec<String>,
    /// Why compilation failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Non-blocking diagnostics
    pub warnings: Vec<String>,
}

impl CompiledArtifact {
    fn failed(errors: &[Diagnostic]) -> Self {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        Self {
            error: Some(messages.join("; ")),
            ..Default::default()
        }
    }

    fn from_shader(shader: GeneratedShader) -> Self {
        Self {
            code: shader.code,
            uniforms: shader.uniforms,
            functions: shader.functions,
            error: None,
            warnings: Vec::new(),
        }
    }
}

/// Diagnostics split by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    /// No errors
    pub is_valid: bool,
    /// Error messages with node/port context
    pub errors: Vec<String>,
    /// Warning messages with node/port context
    pub warnings: Vec<String>,
    /// Structured diagnostics, errors and warnings in check order
    pub diagnostics: Vec<Diagnostic>,
    /// Fixes proposed by the source check
    pub suggestions: Vec<String>,
}

impl ValidationSummary {
    /// Summarize a diagnostic list
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        let messages = |severity: Severity| -> Vec<String> {
            diagnostics
                .iter()
                .filter(|d| d.severity == severity)
                .map(ToString::to_string)
                .collect()
        };
        let errors = messages(Severity::Error);
        let warnings = messages(Severity::Warning);
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            diagnostics,
            suggestions: Vec::new(),
        }
    }

    /// Attach suggestions
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

/// Result of [`ShaderCompiler::compile_and_validate`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileResult {
    /// Compiled artifact
    pub compilation: CompiledArtifact,
    /// Validation outcome
    pub validation: ValidationSummary,
}

/// A compile request as sent by the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileRequest {
    /// Graph to compile
    pub graph: Graph,
    /// Target language
    #[serde(default)]
    pub language: ShaderLanguage,
    /// Drop nodes with no path to the output
    #[serde(default = "default_optimize")]
    pub optimize: bool,
}

fn default_optimize() -> bool {
    true
}

impl CompileRequest {
    /// Request with default language and optimization
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            language: ShaderLanguage::Glsl,
            optimize: true,
        }
    }
}

/// Response to a [`CompileRequest`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileResponse {
    /// Compiled without errors
    pub success: bool,
    /// Compiled artifact
    pub compilation: CompiledArtifact,
    /// Validation outcome
    pub validation: ValidationSummary,
    /// Wall time spent compiling, in milliseconds
    #[serde(rename = "totalTime")]
    pub total_time_ms: f64,
}

/// Stateless compiler over a node registry
#[derive(Debug, Clone, Copy)]
pub struct ShaderCompiler<'r> {
    registry: &'r NodeRegistry,
    options: CompileOptions,
}

impl ShaderCompiler<'static> {
    /// Compiler over the built-in catalog
    pub fn builtin() -> Self {
        Self::new(NodeRegistry::builtin())
    }
}

impl<'r> ShaderCompiler<'r> {
    /// Create a compiler with default options
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self {
            registry,
            options: CompileOptions::default(),
        }
    }

    /// Replace the options
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Registry in use
    pub fn registry(&self) -> &'r NodeRegistry {
        self.registry
    }

    /// Generate code for a graph assumed to be valid. Problems the validator
    /// would have caught still end up in `error`, never as a panic.
    pub fn compile(&self, graph: &Graph) -> CompiledArtifact {
        match self.generate(graph) {
            Ok(shader) => CompiledArtifact::from_shader(shader),
            Err(errors) => CompiledArtifact::failed(&errors),
        }
    }

    /// Validate, then generate if there are no errors
    pub fn compile_and_validate(&self, graph: &Graph) -> CompileResult {
        let started = Instant::now();
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            optimize = self.options.optimize,
            "compiling shader graph"
        );

        let mut diagnostics = GraphValidator::new(self.registry).validate(graph);
        let mut suggestions = Vec::new();
        let compilation = if diagnostics.iter().any(Diagnostic::is_error) {
            let errors: Vec<Diagnostic> = diagnostics.iter().filter(|d| d.is_error()).cloned().collect();
            tracing::warn!(errors = errors.len(), "shader graph rejected");
            CompiledArtifact::failed(&errors)
        } else {
            match self.generate(graph) {
                Ok(shader) => {
                    let report = glsl_check::check_source(&shader.code);
                    suggestions = report.suggestions;
                    let artifact = if report.diagnostics.iter().any(Diagnostic::is_error) {
                        let errors: Vec<Diagnostic> =
                            report.diagnostics.iter().filter(|d| d.is_error()).cloned().collect();
                        tracing::error!(errors = errors.len(), "generated shader source failed its check");
                        CompiledArtifact::failed(&errors)
                    } else {
                        CompiledArtifact::from_shader(shader)
                    };
                    diagnostics.extend(report.diagnostics);
                    artifact
                }
                Err(errors) => {
                    let artifact = CompiledArtifact::failed(&errors);
                    diagnostics.extend(errors);
                    artifact
                }
            }
        };

        let validation = ValidationSummary::new(diagnostics).with_suggestions(suggestions);
        let compilation = CompiledArtifact {
            warnings: validation.warnings.clone(),
            ..compilation
        };

        tracing::debug!(
            success = compilation.error.is_none(),
            warnings = validation.warnings.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "compiled shader graph"
        );

        CompileResult { compilation, validation }
    }

    /// Check GLSL source on its own, without a graph
    pub fn check_source(&self, code: &str) -> ValidationSummary {
        let report = glsl_check::check_source(code);
        tracing::debug!(diagnostics = report.diagnostics.len(), "checked shader source");
        ValidationSummary::new(report.diagnostics).with_suggestions(report.suggestions)
    }

    /// Handle a wire request; its `optimize` flag overrides the compiler's
    pub fn compile_request(&self, request: &CompileRequest) -> CompileResponse {
        let started = Instant::now();
        let compiler = self.with_options(CompileOptions {
            language: request.language,
            optimize: request.optimize,
            ..self.options
        });
        let result = compiler.compile_and_validate(&request.graph);
        CompileResponse {
            success: result.validation.is_valid && result.compilation.error.is_none(),
            compilation: result.compilation,
            validation: result.validation,
            total_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        }
    }

    fn generate(&self, graph: &Graph) -> Result<GeneratedShader, Vec<Diagnostic>> {
        let schedule = Scheduler::new(self.registry)
            .schedule(graph, self.options.optimize)
            .map_err(|err| err.to_diagnostics())?;

        CodeGenerator::new(self.registry)
            .with_entry_point(self.options.entry_point)
            .generate(graph, &schedule)
            .map_err(|err| {
                if err.is_internal() {
                    tracing::error!(error = %err, "node definition defect during code generation");
                }
                vec![err.to_diagnostic()]
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph(value: serde_json::Value) -> Graph {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_fast_path_reports_instead_of_panicking() {
        let artifact = ShaderCompiler::builtin().compile(&graph(json!({
            "nodes": [{"id": "a", "type": "sin"}, {"id": "out", "type": "fragment_output"}],
            "edges": [{"source": "a", "target": "out"}]
        })));
        assert!(artifact.code.is_empty());
        assert_eq!(artifact.error.as_deref(), Some("node 'a' port 'value': unconnected input"));
    }

    #[test]
    fn test_fast_path_compiles_valid_graph() {
        let artifact = ShaderCompiler::builtin().compile(&graph(json!({
            "nodes": [{"id": "c", "type": "color_picker"}, {"id": "out", "type": "fragment_output"}],
            "edges": [{"source": "c", "target": "out"}]
        })));
        assert!(artifact.error.is_none());
        assert!(artifact.code.contains("fragColor = vec4(v_c_color, 1.0);"));
        assert_eq!(artifact.uniforms.len(), 3);
    }

    #[test]
    fn test_request_defaults_and_response_shape() {
        let request: CompileRequest = serde_json::from_value(json!({
            "graph": {
                "nodes": [{"id": "c", "type": "color_picker"}, {"id": "out", "type": "fragment_output"}],
                "edges": [{"source": "c", "target": "out"}]
            }
        }))
        .unwrap();
        assert!(request.optimize);
        assert_eq!(request.language, ShaderLanguage::Glsl);

        let response = ShaderCompiler::builtin().compile_request(&request);
        assert!(response.success);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["validation"]["is_valid"], json!(true));
        assert_eq!(value["compilation"]["uniforms"][0], json!({"name": "iTime", "type": "float", "value": null}));
        assert!(value["compilation"].get("error").is_none());
        assert!(value["totalTime"].as_f64().unwrap() >= 0.0);
        assert!(value.get("total_time_ms").is_none());
    }

    #[test]
    fn test_check_source_summary() {
        let summary = ShaderCompiler::builtin()
            .check_source("void main() {\n    gl_FragColor = vec4(hsvToRgb(vec3(1.0)), 1.0);\n}\n");
        assert!(summary.is_valid);
        assert_eq!(summary.warnings, ["call to undeclared function 'hsvToRgb'"]);
        assert_eq!(summary.suggestions, ["add an implementation of 'hsvToRgb' before its first use"]);

        let broken = ShaderCompiler::builtin().check_source("");
        assert!(!broken.is_valid);
        assert_eq!(broken.errors, ["empty shader source"]);
    }

    #[test]
    fn test_unknown_language_is_rejected_by_serde() {
        let request = serde_json::from_value::<CompileRequest>(json!({
            "graph": {"nodes": [], "edges": []},
            "language": "hlsl"
        }));
        assert!(request.is_err());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: CompileOptions = serde_json::from_value(json!({"entryPoint": "main-image"})).unwrap();
        assert!(options.optimize);
        assert_eq!(options.entry_point, EntryPoint::MainImage);
    }
}
