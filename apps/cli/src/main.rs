//! tessera - schema-driven code generator
//!
//! Reads the schema directory and regenerates every managed output
//! directory. With no arguments the fixed default locations apply.

mod config;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tessera_codegen::{RunMode, RunSummary};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "tessera", version, about = "Generate models, operations and infrastructure from schema documents")]
struct Cli {
    /// Configuration file (defaults to tessera.toml when present)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Report stale or out-of-date artifacts without writing anything
    #[arg(long)]
    check: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref())
        .and_then(|c| c.validate().map(|_| c))
        .context("Failed to load configuration")
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let _logging_guard = match logging::init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let mode = if cli.check { RunMode::Check } else { RunMode::Write };
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        schema_dir = %config.codegen.schema_dir.display(),
        mode = ?mode,
        "Starting generation"
    );

    match tessera_codegen::run(&config.codegen, mode) {
        Ok(summary) => report(&summary, mode),
        Err(e) => {
            tracing::error!(error = %e, "Generation failed");
            ExitCode::FAILURE
        }
    }
}

fn report(summary: &RunSummary, mode: RunMode) -> ExitCode {
    match mode {
        RunMode::Write => {
            tracing::info!(
                entities = summary.entities,
                enums = summary.enums,
                written = summary.written.len(),
                unchanged = summary.unchanged,
                removed = summary.removed.len(),
                "Generation complete"
            );
            ExitCode::SUCCESS
        }
        RunMode::Check if summary.is_up_to_date() => {
            tracing::info!(files = summary.unchanged, "Generated artifacts are up to date");
            ExitCode::SUCCESS
        }
        RunMode::Check => {
            for path in &summary.written {
                tracing::warn!(path = %path.display(), "would write");
            }
            for path in &summary.removed {
                tracing::warn!(path = %path.display(), "would remove");
            }
            tracing::error!(
                stale = summary.written.len() + summary.removed.len(),
                "Generated artifacts are out of date"
            );
            ExitCode::FAILURE
        }
    }
}
