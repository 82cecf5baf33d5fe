pub use crate::collector::{
    CaseReport, CaseStatus, Fanout, FailureEntry, HookReport, Observer, Report, ReportEntry,
    ResultCollector, SuiteReport, Summary,
};
pub use crate::config::{ArborConfig, OutputFormat, RenderConfig, RunConfig};
pub use crate::errors::{ConfigError, FailureKind, StructuralError};
pub use crate::fixture::{Context, Fixtures};
pub use crate::outcome::{CaseOutcome, Executable, Failure, Outcome};
pub use crate::scheduler::{run, Runner};
pub use crate::scope::ScopeResolver;
pub use crate::tree::{CaseId, Entry, HookKind, HookRef, Layout, Mark, SuiteId, SuiteTree};

pub mod cli;
pub mod collector;
pub mod config;
pub mod errors;
pub mod fixture;
pub mod outcome;
pub mod render;
pub mod scheduler;
pub mod scope;
pub mod tree;
