//! Turns a [`Report`] into text or JSON.
//!
//! Text output is a nested listing of suites and cases followed by a summary
//! line and a numbered list of failures. Mismatches that carry both sides are
//! shown as a line diff. Colour is controlled by the writer: pass a
//! `termcolor::Buffer::no_color()` or a `StandardStream` built from
//! [`RenderConfig::color_choice`].

use std::io::{self, Write};

use difference::{Changeset, Difference};
use termcolor::{Color, ColorSpec, WriteColor};

use crate::collector::{CaseReport, CaseStatus, HookReport, Report, ReportEntry, SuiteReport};
use crate::config::{OutputFormat, RenderConfig};
use crate::outcome::Outcome;

pub fn render<W: WriteColor + ?Sized>(
    report: &Report,
    config: &RenderConfig,
    out: &mut W,
) -> io::Result<()> {
    match config.format {
        OutputFormat::Text => render_text(report, config, out),
        OutputFormat::Json => render_json(report, out),
    }
}

pub fn render_json<W: Write + ?Sized>(report: &Report, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}

pub fn render_text<W: WriteColor + ?Sized>(
    report: &Report,
    config: &RenderConfig,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out)?;
    render_suite(&report.root, 0, config, out)?;
    render_summary(report, out)?;
    render_failures(report, out)
}

fn render_suite<W: WriteColor + ?Sized>(
    suite: &SuiteReport,
    depth: usize,
    config: &RenderConfig,
    out: &mut W,
) -> io::Result<()> {
    // An unnamed root only groups its children.
    let (depth, child_depth) = if suite.name.is_empty() {
        (depth, depth)
    } else {
        (depth, depth + 1)
    };
    let indent = "  ".repeat(depth + 1);
    if !suite.name.is_empty() {
        write!(out, "{}{}", indent, suite.name)?;
        if suite.blocked {
            write!(out, " ")?;
            paint(out, Color::Yellow, "(blocked)")?;
        }
        writeln!(out)?;
    }

    let hook_indent = "  ".repeat(child_depth + 1);
    for hook in &suite.setup_outcomes {
        render_hook(hook, &hook_indent, config, out)?;
    }
    for entry in suite.entries() {
        match entry {
            ReportEntry::Case(case) => render_case(case, child_depth, config, out)?,
            ReportEntry::Suite(child) => render_suite(child, child_depth, config, out)?,
        }
    }
    for hook in &suite.teardown_outcomes {
        render_hook(hook, &hook_indent, config, out)?;
    }
    Ok(())
}

fn render_case<W: WriteColor + ?Sized>(
    case: &CaseReport,
    depth: usize,
    config: &RenderConfig,
    out: &mut W,
) -> io::Result<()> {
    let indent = "  ".repeat(depth + 1);
    let (label, color) = match case.status {
        CaseStatus::Passed => ("PASS", Color::Green),
        CaseStatus::Failed => ("FAIL", Color::Red),
        CaseStatus::Errored => ("ERROR", Color::Red),
        CaseStatus::Skipped => ("SKIP", Color::Yellow),
    };
    write!(out, "{}", indent)?;
    paint(out, color, label)?;
    write!(out, ": {}", case.name)?;
    if let Some(note) = &case.note {
        write!(out, " ({})", note)?;
    }
    writeln!(out)?;

    let hook_indent = format!("{}    ", indent);
    for hook in &case.setup_chain_outcomes {
        render_hook(hook, &hook_indent, config, out)?;
    }
    for hook in &case.teardown_chain_outcomes {
        render_hook(hook, &hook_indent, config, out)?;
    }
    Ok(())
}

/// Hooks are listed when they fail, or always with `show_hooks`.
fn render_hook<W: WriteColor + ?Sized>(
    hook: &HookReport,
    indent: &str,
    config: &RenderConfig,
    out: &mut W,
) -> io::Result<()> {
    if hook.outcome.is_pass() && !config.show_hooks {
        return Ok(());
    }
    write!(out, "{}", indent)?;
    match &hook.outcome {
        Outcome::Pass => paint(out, Color::Cyan, "hook")?,
        _ => paint(out, Color::Red, "HOOK FAILED")?,
    }
    writeln!(out, ": {} ({})", hook.title, hook.outcome)
}

fn render_summary<W: WriteColor + ?Sized>(report: &Report, out: &mut W) -> io::Result<()> {
    let s = report.summary();
    writeln!(out)?;
    write!(out, "  total {}, ", s.total)?;
    paint(out, Color::Green, &format!("{} passed", s.passed))?;
    write!(out, ", ")?;
    paint(out, Color::Red, &format!("{} failed", s.failed))?;
    write!(out, ", ")?;
    paint(out, Color::Red, &format!("{} errored", s.errored))?;
    write!(out, ", ")?;
    paint(out, Color::Yellow, &format!("{} skipped", s.skipped))?;
    if s.hook_failures > 0 {
        write!(out, " ({} hook failures)", s.hook_failures)?;
    }
    writeln!(out)
}

fn render_failures<W: WriteColor + ?Sized>(report: &Report, out: &mut W) -> io::Result<()> {
    let failures = report.failures();
    if failures.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    for (i, failure) in failures.iter().enumerate() {
        write!(out, "  {}) ", i + 1)?;
        paint(out, Color::Red, &failure.title)?;
        writeln!(out, " [{}]", failure.kind)?;
        if let Some(message) = failure.outcome.message() {
            for line in message.lines() {
                writeln!(out, "     {}", line)?;
            }
        }
        if let Some(mismatch) = failure.outcome.failure() {
            if let (Some(expected), Some(actual)) = (&mismatch.expected, &mismatch.actual) {
                render_diff(expected, actual, out)?;
            }
        }
    }
    Ok(())
}

fn render_diff<W: WriteColor + ?Sized>(
    expected: &str,
    actual: &str,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "     Diff (- expected, + actual):")?;
    let changeset = Changeset::new(expected, actual, "\n");
    for diff in &changeset.diffs {
        match diff {
            Difference::Same(text) => {
                for line in text.lines() {
                    writeln!(out, "       {}", line)?;
                }
            }
            Difference::Rem(text) => {
                for line in text.lines() {
                    paint(out, Color::Green, &format!("     - {}", line))?;
                    writeln!(out)?;
                }
            }
            Difference::Add(text) => {
                for line in text.lines() {
                    paint(out, Color::Red, &format!("     + {}", line))?;
                    writeln!(out)?;
                }
            }
        }
    }
    Ok(())
}

fn paint<W: WriteColor + ?Sized>(out: &mut W, color: Color, text: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)))?;
    write!(out, "{}", text)?;
    out.reset()
}
