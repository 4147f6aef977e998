// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader node graph compiler.
//!
//! Turns a visual node graph (nodes with typed ports, connected by edges)
//! into a GLSL fragment shader.
//!
//! ## Architecture
//!
//! - [`node`]: node type catalog with port, parameter and template metadata
//! - [`validation`]: structural and type checks producing [`Diagnostic`]s
//! - [`schedule`]: topological ordering, cycle detection, dead-node pruning
//! - [`codegen`]: template expansion, helper inclusion, final assembly
//! - [`glsl_check`]: parse-level check of the emitted source
//! - [`compiler`]: the public facade tying the passes together
//! - [`session`]: debounced latest-wins compiling for interactive editors
//!
//! ```
//! use shadergraph_compiler::{Graph, GraphNode, ShaderCompiler};
//!
//! let mut graph = Graph::new();
//! graph.add_node(GraphNode::new("color", "color_picker")).unwrap();
//! graph.add_node(GraphNode::new("out", "fragment_output")).unwrap();
//! graph.connect("color", "color", "out", "color").unwrap();
//!
//! let result = ShaderCompiler::builtin().compile_and_validate(&graph);
//! assert!(result.validation.is_valid);
//! assert!(result.compilation.code.contains("gl_FragColor = fragColor;"));
//! ```

pub mod codegen;
pub mod compiler;
pub mod config;
pub mod diagnostic;
pub mod glsl_check;
pub mod graph;
pub mod graphs;
pub mod node;
pub mod port;
pub mod schedule;
pub mod session;
pub mod template;
pub mod validation;
pub mod value;

pub use codegen::{CodeGenerator, CodegenError, EntryPoint, GeneratedShader, UniformDescriptor};
pub use compiler::{
    CompileOptions, CompileRequest, CompileResponse, CompileResult, CompiledArtifact, ShaderCompiler,
    ShaderLanguage, ValidationSummary,
};
pub use config::{CompilerConfig, ConfigError, SessionConfig};
pub use diagnostic::{Diagnostic, DiagnosticClass, DiagnosticKind, Severity};
pub use glsl_check::{check_source, SourceReport};
pub use graph::{EdgeId, Graph, GraphEdge, GraphError, GraphNode, NodeId};
pub use node::{HelperFunction, NodeCategory, NodeRegistry, NodeTypeDefinition};
pub use port::{DataType, PortDef, PortDirection};
pub use schedule::{Schedule, Scheduler, SchedulerError};
pub use session::{CompileSession, SessionOutcome, SessionStats};
pub use validation::GraphValidator;
pub use value::{Literal, ParamValue, ParameterDef, ParameterType};
