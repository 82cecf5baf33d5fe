//! # Arbor Test Helpers
//!
//! Recording hooks and observers shared by the integration tests. Every
//! recorded entry is a plain string so assertions read like the expected
//! execution transcript.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use arbor::{CaseId, CaseOutcome, Context, HookRef, Layout, Observer, Outcome, SuiteId};

/// Shared transcript written by recording units.
pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::default()
}

pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

/// A unit that appends `entry` to `log` and passes.
pub fn record(log: &Log, entry: &str) -> impl FnMut(&mut Context<'_>) -> Outcome {
    record_then(log, entry, Outcome::Pass)
}

/// A unit that appends `entry` to `log` and returns `outcome`.
pub fn record_then(
    log: &Log,
    entry: &str,
    outcome: Outcome,
) -> impl FnMut(&mut Context<'_>) -> Outcome {
    let log = Rc::clone(log);
    let entry = entry.to_string();
    move |_: &mut Context<'_>| {
        log.borrow_mut().push(entry.clone());
        outcome.clone()
    }
}

/// Observer that writes every scheduler event as one line.
#[derive(Debug, Default)]
pub struct EventTrace {
    layout: Option<Layout>,
    pub events: Vec<String>,
}

impl EventTrace {
    fn layout(&self) -> &Layout {
        self.layout.as_ref().expect("run started")
    }
}

impl Observer for EventTrace {
    fn on_run_start(&mut self, layout: &Layout) {
        self.layout = Some(layout.clone());
    }

    fn on_suite_enter(&mut self, suite: SuiteId) {
        let line = format!("enter {}", self.layout().suite_name(suite));
        self.events.push(line);
    }

    fn on_hook_result(&mut self, hook: HookRef, case: Option<CaseId>, outcome: &Outcome) {
        let layout = self.layout();
        let line = match case {
            Some(case) => format!(
                "{} {} for {}: {}",
                layout.suite_name(hook.suite),
                layout.hook_title(hook),
                layout.case_name(case),
                outcome.label()
            ),
            None => format!(
                "{} {}: {}",
                layout.suite_name(hook.suite),
                layout.hook_title(hook),
                outcome.label()
            ),
        };
        self.events.push(line);
    }

    fn on_case_result(&mut self, case: CaseId, outcome: &CaseOutcome) {
        let status = match outcome {
            CaseOutcome::Ran { outcome } => outcome.label().to_string(),
            CaseOutcome::SetupFailed => "setup failed".to_string(),
            CaseOutcome::Blocked => "blocked".to_string(),
            CaseOutcome::Skipped { reason } => format!("skipped ({})", reason),
        };
        let line = format!("case {}: {}", self.layout().case_name(case), status);
        self.events.push(line);
    }

    fn on_suite_exit(&mut self, suite: SuiteId) {
        let line = format!("exit {}", self.layout().suite_name(suite));
        self.events.push(line);
    }
}
