//! The arbor command-line interface.
//!
//! The CLI is a host for the engine: it builds a suite tree, runs it, renders
//! the report and maps the result to an exit code.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use crate::cli::args::{ArborArgs, Command};
use crate::cli::demo::Demo;
use crate::config::{ArborConfig, OutputFormat};
use crate::render::render;
use crate::scheduler::Runner;
use crate::tree::{Entry, HookKind, Layout, Mark, SuiteId};

pub mod args;
pub mod demo;

/// Options for the `run` subcommand after argument parsing.
struct RunOptions {
    demo: Demo,
    format: Option<OutputFormat>,
    filter: Option<String>,
    config: Option<PathBuf>,
    no_color: bool,
    show_hooks: bool,
}

/// The main entry point for the CLI.
pub fn run() -> ExitCode {
    init_tracing();
    let args = ArborArgs::parse();

    let result = match args.command {
        Command::Run {
            demo,
            format,
            filter,
            config,
            no_color,
            show_hooks,
        } => handle_run(RunOptions {
            demo,
            format,
            filter,
            config,
            no_color,
            show_hooks,
        }),
        Command::List { demo } => handle_list(demo),
    };

    match result {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{:?}", report);
            ExitCode::from(2)
        }
    }
}

/// Logs go to stderr; `ARBOR_LOG` takes the usual `tracing` filter syntax.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("ARBOR_LOG").unwrap_or_else(|_| EnvFilter::new("error"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Handles the `run` subcommand.
fn handle_run(options: RunOptions) -> miette::Result<ExitCode> {
    let mut config = match &options.config {
        Some(path) => ArborConfig::load(path)?,
        None => ArborConfig::default(),
    };
    if let Some(format) = options.format {
        config.render.format = format;
    }
    if options.filter.is_some() {
        config.run.filter = options.filter;
    }
    if options.no_color {
        config.render.use_colors = false;
    }
    if options.show_hooks {
        config.render.show_hooks = true;
    }

    let tree = options.demo.build()?;
    let report = Runner::new(config.run.clone()).run(tree)?;

    let mut stdout = StandardStream::stdout(config.render.color_choice());
    render(&report, &config.render, &mut stdout).into_diagnostic()?;
    stdout.flush().into_diagnostic()?;

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Handles the `list` subcommand.
fn handle_list(demo: Demo) -> miette::Result<ExitCode> {
    let mut tree = demo.build()?;
    tree.finalize()?;
    let mut stdout = StandardStream::stdout(ColorChoice::Never);
    print_suite(tree.layout(), tree.root(), 0, &mut stdout).into_diagnostic()?;
    Ok(ExitCode::SUCCESS)
}

fn print_suite(
    layout: &Layout,
    suite: SuiteId,
    depth: usize,
    out: &mut impl Write,
) -> std::io::Result<()> {
    let indent = "  ".repeat(depth);
    let name = match layout.suite_name(suite) {
        "" => "(root)",
        name => name,
    };
    writeln!(out, "{}{}{}", indent, name, mark_suffix(layout.suite_mark(suite)))?;
    for kind in HookKind::ALL {
        for hook in layout.hooks(suite, kind) {
            writeln!(out, "{}  {}", indent, layout.hook_title(hook))?;
        }
    }
    for entry in layout.entries(suite) {
        match *entry {
            Entry::Suite(child) => print_suite(layout, child, depth + 1, out)?,
            Entry::Case(case) => writeln!(
                out,
                "{}  - {}{}",
                indent,
                layout.case_name(case),
                mark_suffix(layout.case_mark(case))
            )?,
        }
    }
    Ok(())
}

fn mark_suffix(mark: Mark) -> &'static str {
    match mark {
        Mark::None => "",
        Mark::Skip => " [skip]",
        Mark::Only => " [only]",
    }
}
