//! Defines the command-line arguments and subcommands for the arbor CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::demo::Demo;
use crate::config::OutputFormat;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "arbor",
    version,
    about = "Runs nested test suites with deterministic setup and teardown hooks."
)]
pub struct ArborArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a bundled suite tree and print its report.
    Run {
        /// Which suite tree to run.
        #[arg(value_enum, default_value_t = Demo::Hooks)]
        demo: Demo,
        /// Output format; overrides the configuration file.
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Only run cases whose full title contains this text.
        #[arg(long)]
        filter: Option<String>,
        /// Path to a YAML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Disable coloured output.
        #[arg(long)]
        no_color: bool,
        /// List every hook invocation, not only the failing ones.
        #[arg(long)]
        show_hooks: bool,
    },
    /// Print the structure of a bundled suite tree without running it.
    List {
        #[arg(value_enum, default_value_t = Demo::Hooks)]
        demo: Demo,
    },
}
