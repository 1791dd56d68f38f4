// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `taskdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskdag",
    version,
    about = "Run a dependency graph of tasks, then redo parts of it.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the recipe file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Parse + validate, print the graph, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Complete one random task at a time instead of running the
    /// concurrent coordinator.
    #[arg(long)]
    pub sequential: bool,

    /// RNG seed for `--sequential`; overrides `[config].seed`.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// After the first run, redo this task and everything downstream of it,
    /// then run again. May be repeated.
    #[arg(long, value_name = "TASK")]
    pub redo: Vec<String>,

    /// After the first run (and any `--redo`), redo this task together with
    /// everything upstream and downstream of it, then run again.
    /// May be repeated.
    #[arg(long, value_name = "TASK")]
    pub cooking_redo: Vec<String>,

    /// Write a Graphviz rendering of the final state to this path.
    #[arg(long, value_name = "PATH")]
    pub dot: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
