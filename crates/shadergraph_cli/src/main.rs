// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader graph compiler command line.
//!
//! ```text
//! shadergraph compile graph.json --entry main-image
//! shadergraph check shader.frag
//! shadergraph nodes --category color
//! ```

mod commands;

use clap::Parser;
use commands::{Cli, Command};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shadergraph=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("shadergraph v{}", env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Command::Compile(args) => commands::compile(args),
        Command::Check { source } => commands::check(source),
        Command::Nodes { category } => commands::nodes(*category),
    };

    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            tracing::error!("{e}");
            e.exit_code()
        }
    }
}
