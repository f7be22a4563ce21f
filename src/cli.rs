//! Command-line interface, built on clap.
//!
//! Defines the [`Cli`] struct with subcommands [`Command`] (run, plan,
//! status, demo) and global flags (--config, --budget, --verbose).

use clap::{Parser, Subcommand};

/// Monarch — guild-based AI workforce orchestrator.
#[derive(Debug, Parser)]
#[command(name = "monarch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file (defaults to monarch.toml).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Budget ceiling for this job, overriding the configured default.
    #[arg(long, global = true)]
    pub budget: Option<i64>,

    /// Print the full job report after execution.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute a request through the guild workflow engine.
    Run {
        /// The natural-language work request.
        request: String,
    },

    /// Decompose an open-ended request into a plan and execute it.
    Plan {
        /// The natural-language work request.
        request: String,
    },

    /// Show the treasury balance and the worker roster.
    Status,

    /// Run the built-in demonstration (one writing job, one coding job).
    Demo,
}
