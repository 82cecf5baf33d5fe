//! Outcomes and the executable-unit contract.
//!
//! Hooks and case bodies are both [`Executable`] units: they receive a
//! [`Context`] and return an [`Outcome`]. The engine never looks inside an
//! outcome beyond "passed or not"; the message payload is carried through to
//! the report untouched.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use crate::fixture::Context;

/// Details of a failed expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    /// A failure that carries both sides of a comparison so renderers can diff them.
    pub fn mismatch(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            expected: Some(expected.into()),
            actual: Some(actual.into()),
        }
    }
}

/// Result of running one hook or case body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    /// The unit ran and its expectations did not hold.
    Fail(Failure),
    /// The unit could not complete (returned an error or panicked).
    Error { message: String },
}

impl Outcome {
    pub fn fail(message: impl Into<String>) -> Self {
        Outcome::Fail(Failure::new(message))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Error {
            message: message.into(),
        }
    }

    /// Passes when `condition` holds, otherwise fails with `message`.
    pub fn ensure(condition: bool, message: impl Into<String>) -> Self {
        if condition {
            Outcome::Pass
        } else {
            Outcome::fail(message)
        }
    }

    /// Compares two values, recording both sides on mismatch.
    pub fn expect_eq<T>(actual: T, expected: T) -> Self
    where
        T: PartialEq + fmt::Debug,
    {
        if actual == expected {
            return Outcome::Pass;
        }
        let expected = format!("{:#?}", expected);
        let actual = format!("{:#?}", actual);
        Outcome::Fail(Failure::mismatch(
            format!("expected {}, got {}", expected, actual),
            expected,
            actual,
        ))
    }

    /// Keeps the first non-passing outcome.
    pub fn and(self, next: Outcome) -> Outcome {
        if self.is_pass() {
            next
        } else {
            self
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    /// Short status word used in logs and text reports.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Fail(_) => "fail",
            Outcome::Error { .. } => "error",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Pass => None,
            Outcome::Fail(failure) => Some(&failure.message),
            Outcome::Error { message } => Some(message),
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Fail(failure) => Some(failure),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {}", self.label(), message),
            None => write!(f, "{}", self.label()),
        }
    }
}

impl<E: fmt::Display> From<Result<(), E>> for Outcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Outcome::Pass,
            Err(e) => Outcome::error(e.to_string()),
        }
    }
}

/// What happened to a case, as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseOutcome {
    /// The body ran and produced this outcome.
    Ran { outcome: Outcome },
    /// A case-setup hook in the inherited chain failed; the body did not run.
    SetupFailed,
    /// A suite-setup hook of an enclosing suite failed; nothing ran for this case.
    Blocked,
    /// The case was excluded by a mark or filter.
    Skipped { reason: String },
}

impl CaseOutcome {
    pub fn body(&self) -> Option<&Outcome> {
        match self {
            CaseOutcome::Ran { outcome } => Some(outcome),
            _ => None,
        }
    }
}

/// A single unit of work bound to a suite: a hook or a case body.
pub trait Executable {
    fn execute(&mut self, ctx: &mut Context<'_>) -> Outcome;
}

impl<F> Executable for F
where
    F: FnMut(&mut Context<'_>) -> Outcome,
{
    fn execute(&mut self, ctx: &mut Context<'_>) -> Outcome {
        self(ctx)
    }
}

/// Runs a unit, turning a panic into an [`Outcome::Error`] when `catch_panics` is set.
pub(crate) fn invoke(
    unit: &mut dyn Executable,
    ctx: &mut Context<'_>,
    catch_panics: bool,
) -> Outcome {
    if !catch_panics {
        return unit.execute(ctx);
    }
    match panic::catch_unwind(AssertUnwindSafe(|| unit.execute(ctx))) {
        Ok(outcome) => outcome,
        Err(payload) => Outcome::error(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Fixtures;

    fn with_context<R>(f: impl FnOnce(&mut Context<'_>) -> R) -> R {
        let mut frames = vec![Fixtures::default()];
        let mut ctx = Context::new(&mut frames, "unit", None);
        f(&mut ctx)
    }

    #[test]
    fn expect_eq_records_both_sides() {
        let outcome = Outcome::expect_eq(2 + 2, 5);
        let failure = outcome.failure().expect("mismatch should fail");
        assert_eq!(failure.expected.as_deref(), Some("5"));
        assert_eq!(failure.actual.as_deref(), Some("4"));
        assert_eq!(Outcome::expect_eq("a", "a"), Outcome::Pass);
    }

    #[test]
    fn result_conversion_maps_err_to_error() {
        let ok: Result<(), String> = Ok(());
        let err: Result<(), String> = Err("disk full".to_string());
        assert_eq!(Outcome::from(ok), Outcome::Pass);
        assert_eq!(Outcome::from(err), Outcome::error("disk full"));
    }

    #[test]
    fn panics_become_errors() {
        let mut unit = |_: &mut Context<'_>| -> Outcome { panic!("boom") };
        let outcome = with_context(|ctx| invoke(&mut unit, ctx, true));
        assert_eq!(outcome, Outcome::error("panicked: boom"));
    }

    #[test]
    fn formatted_panics_keep_their_message() {
        let mut unit = |_: &mut Context<'_>| -> Outcome { panic!("left {} right {}", 1, 2) };
        let outcome = with_context(|ctx| invoke(&mut unit, ctx, true));
        assert_eq!(outcome.message(), Some("panicked: left 1 right 2"));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::fail("nope")).unwrap();
        assert_eq!(json["status"], "fail");
        assert_eq!(json["message"], "nope");
        let json = serde_json::to_value(Outcome::error("io")).unwrap();
        assert_eq!(json["status"], "error");
    }
}
