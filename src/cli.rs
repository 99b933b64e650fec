//! CLI argument definitions.

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `boardwatch`.
#[derive(Debug, Parser)]
#[command(name = "boardwatch", version, about = "Watch a project board and announce changes to Slack")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute one poll, diff, and notify cycle.
    Run {
        /// Compute and print the change set without posting or persisting.
        #[arg(long)]
        dry_run: bool,
    },
    /// Resolve the board and create its snapshot object if absent.
    Init,
}
