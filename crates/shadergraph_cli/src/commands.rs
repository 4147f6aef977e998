// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subcommands

use clap::{Args, Parser, Subcommand};
use shadergraph_compiler::{
    CompileOptions, CompileRequest, CompilerConfig, ConfigError, EntryPoint, Graph, NodeCategory, NodeRegistry,
    ShaderCompiler,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "shadergraph")]
#[command(version)]
#[command(about = "Compile shader node graphs to GLSL", long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile a graph JSON file and print the response
    Compile(CompileArgs),

    /// Check a GLSL fragment shader file and print the summary
    Check {
        /// Shader source file
        source: PathBuf,
    },

    /// List the node catalog as JSON
    Nodes {
        /// Only list one category (input, operation, vector, color, utility, texture, output)
        #[arg(short, long)]
        category: Option<NodeCategory>,
    },
}

/// Arguments of `compile`
#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Graph file (JSON)
    pub graph: PathBuf,

    /// Compiler configuration (RON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Keep nodes with no path to the output
    #[arg(long)]
    pub no_optimize: bool,

    /// Entry point: main or main-image
    #[arg(short, long)]
    pub entry: Option<EntryPoint>,

    /// Print only the shader source
    #[arg(long)]
    pub code_only: bool,
}

/// Successful run result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report
    Success,
    /// The graph had errors
    Rejected,
}

impl Outcome {
    /// 0 on success, 1 when the graph was rejected
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Success => ExitCode::SUCCESS,
            Self::Rejected => ExitCode::from(1),
        }
    }
}

/// Failure before the compiler produced a response
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Input file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Cause
        source: std::io::Error,
    },

    /// Graph file is not valid graph JSON
    #[error("invalid graph in {}: {source}", .path.display())]
    Json {
        /// File path
        path: PathBuf,
        /// Cause
        source: serde_json::Error,
    },

    /// Configuration file could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Response could not be serialized
    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Exit status 2
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(2)
    }
}

/// Config file, then flags
pub fn resolve_options(args: &CompileArgs) -> Result<CompileOptions, CliError> {
    let mut options = match &args.config {
        Some(path) => CompilerConfig::load(path)?.options,
        None => CompileOptions::default(),
    };
    if args.no_optimize {
        options.optimize = false;
    }
    if let Some(entry) = args.entry {
        options.entry_point = entry;
    }
    Ok(options)
}

fn read_graph(path: &Path) -> Result<Graph, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Compile a graph file and print the response
pub fn compile(args: &CompileArgs) -> Result<Outcome, CliError> {
    let options = resolve_options(args)?;
    let graph = read_graph(&args.graph)?;
    tracing::info!(path = %args.graph.display(), nodes = graph.node_count(), "compiling");

    let request = CompileRequest {
        graph,
        language: options.language,
        optimize: options.optimize,
    };
    let response = ShaderCompiler::builtin().with_options(options).compile_request(&request);

    if args.code_only {
        if response.success {
            print!("{}", response.compilation.code);
        } else {
            for error in &response.validation.errors {
                eprintln!("error: {error}");
            }
        }
        for warning in &response.validation.warnings {
            eprintln!("warning: {warning}");
        }
        for suggestion in &response.validation.suggestions {
            eprintln!("help: {suggestion}");
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    Ok(if response.success {
        Outcome::Success
    } else {
        Outcome::Rejected
    })
}

/// Check a shader source file and print the validation summary
pub fn check(source: &Path) -> Result<Outcome, CliError> {
    let code = std::fs::read_to_string(source).map_err(|err| CliError::Io {
        path: source.to_path_buf(),
        source: err,
    })?;
    let summary = ShaderCompiler::builtin().check_source(&code);
    tracing::info!(path = %source.display(), errors = summary.errors.len(), "checked shader source");
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(if summary.is_valid {
        Outcome::Success
    } else {
        Outcome::Rejected
    })
}

/// Print node definitions as JSON
pub fn nodes(category: Option<NodeCategory>) -> Result<Outcome, CliError> {
    let registry = NodeRegistry::builtin();
    let definitions: Vec<_> = match category {
        Some(category) => registry.types_in_category(category).collect(),
        None => registry.list_all().collect(),
    };
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(Outcome::Success)
}
