//! Arbor error handling.
//!
//! Only the build phase can fail with a Rust `Err`: every problem with the
//! shape of a suite tree is a [`StructuralError`], reported through `miette`
//! so hosts get a code and a help line. Failures that happen while the tree is
//! running are never raised; they are recorded in the report and classified by
//! [`FailureKind`].

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

/// Fatal problems with the suite tree, raised before any unit runs.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Structural error: cannot add {what} '{name}' after the suite tree was finalized")]
    #[diagnostic(
        code(arbor::structure::finalized),
        help("declare every suite, case and hook before calling finalize() or running the tree")
    )]
    Finalized { what: &'static str, name: String },

    #[error("Structural error: suite tree '{root}' contains no cases")]
    #[diagnostic(
        code(arbor::structure::empty),
        help("add at least one case to the root suite or one of its descendants")
    )]
    EmptyTree { root: String },

    #[error("Structural error: unknown suite id {id}")]
    #[diagnostic(
        code(arbor::structure::unknown_suite),
        help("suite ids are only valid for the tree that created them")
    )]
    UnknownSuite { id: usize },

    #[error("Structural error: unknown case id {id}")]
    #[diagnostic(
        code(arbor::structure::unknown_case),
        help("case ids are only valid for the tree that created them")
    )]
    UnknownCase { id: usize },

    #[error("Structural error: {what} name must not be empty")]
    #[diagnostic(code(arbor::structure::empty_name))]
    EmptyName { what: &'static str },
}

impl StructuralError {
    pub(crate) fn finalized(what: &'static str, name: impl Into<String>) -> Self {
        Self::Finalized {
            what,
            name: name.into(),
        }
    }
}

/// Problems loading a configuration file for the host driver.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Config error: failed to read '{path}'")]
    #[diagnostic(code(arbor::config::read))]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: '{path}' is not a valid arbor configuration")]
    #[diagnostic(
        code(arbor::config::parse),
        help("expected a YAML mapping with optional `run` and `render` sections")
    )]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Classification of run-time failures as they appear in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A setup or teardown hook failed, errored or panicked.
    HookFailure,
    /// A case body failed, errored or panicked.
    CaseFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::HookFailure => "HookFailure",
            FailureKind::CaseFailure => "CaseFailure",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalized_error_names_the_offending_item() {
        let err = StructuralError::finalized("case", "late arrival");
        assert_eq!(
            err.to_string(),
            "Structural error: cannot add case 'late arrival' after the suite tree was finalized"
        );
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("arbor::structure::finalized"));
    }

    #[test]
    fn failure_kind_display() {
        assert_eq!(FailureKind::HookFailure.to_string(), "HookFailure");
        assert_eq!(FailureKind::CaseFailure.to_string(), "CaseFailure");
    }
}
