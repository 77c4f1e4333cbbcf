//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// shlint - ShellCheck language server and runner
#[derive(Parser)]
#[command(name = "shlint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// ShellCheck executable to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub executable: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint shell scripts once
    Check {
        /// Files to lint
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Apply every non-conflicting quick fix
        #[arg(long)]
        fix: bool,

        /// Preview fixes without writing them
        #[arg(long, requires = "fix")]
        dry_run: bool,
    },

    /// Start the LSP server
    Lsp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
