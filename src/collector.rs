//! Result collection.
//!
//! The scheduler reports every transition to an [`Observer`] as it happens.
//! [`ResultCollector`] is the observer that turns the event stream into a
//! [`Report`]; other observers can watch the same run through a [`Fanout`].

use serde::Serialize;

use crate::errors::FailureKind;
use crate::outcome::{CaseOutcome, Outcome};
use crate::tree::{CaseId, Entry, HookKind, HookRef, Layout, SuiteId};

/// Synchronous sink for scheduler events.
pub trait Observer {
    /// Called once, before the first suite is entered.
    fn on_run_start(&mut self, _layout: &Layout) {}
    fn on_suite_enter(&mut self, suite: SuiteId);
    /// `case` is set for case-setup and case-teardown hooks.
    fn on_hook_result(&mut self, hook: HookRef, case: Option<CaseId>, outcome: &Outcome);
    fn on_case_result(&mut self, case: CaseId, outcome: &CaseOutcome);
    fn on_suite_exit(&mut self, suite: SuiteId);
    fn on_run_end(&mut self) {}
}

/// Forwards every event to each wrapped observer, in order.
#[derive(Default)]
pub struct Fanout<'a> {
    observers: Vec<&'a mut dyn Observer>,
}

impl<'a> Fanout<'a> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn with(mut self, observer: &'a mut dyn Observer) -> Self {
        self.observers.push(observer);
        self
    }
}

impl Observer for Fanout<'_> {
    fn on_run_start(&mut self, layout: &Layout) {
        for observer in self.observers.iter_mut() {
            observer.on_run_start(layout);
        }
    }

    fn on_suite_enter(&mut self, suite: SuiteId) {
        for observer in self.observers.iter_mut() {
            observer.on_suite_enter(suite);
        }
    }

    fn on_hook_result(&mut self, hook: HookRef, case: Option<CaseId>, outcome: &Outcome) {
        for observer in self.observers.iter_mut() {
            observer.on_hook_result(hook, case, outcome);
        }
    }

    fn on_case_result(&mut self, case: CaseId, outcome: &CaseOutcome) {
        for observer in self.observers.iter_mut() {
            observer.on_case_result(case, outcome);
        }
    }

    fn on_suite_exit(&mut self, suite: SuiteId) {
        for observer in self.observers.iter_mut() {
            observer.on_suite_exit(suite);
        }
    }

    fn on_run_end(&mut self) {
        for observer in self.observers.iter_mut() {
            observer.on_run_end();
        }
    }
}

// =============================================================================
// REPORT
// =============================================================================

/// One hook invocation as it appears in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookReport {
    pub title: String,
    pub kind: HookKind,
    /// Name of the suite the hook is declared on.
    pub suite: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    /// The body ran and did not pass.
    Failed,
    /// A hook prevented or spoiled the case.
    Errored,
    Skipped,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Passed => "passed",
            CaseStatus::Failed => "failed",
            CaseStatus::Errored => "errored",
            CaseStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub full_title: String,
    pub status: CaseStatus,
    /// Position in execution order, starting at 0.
    pub sequence: usize,
    pub setup_chain_outcomes: Vec<HookReport>,
    pub body_outcome: Option<Outcome>,
    pub teardown_chain_outcomes: Vec<HookReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Position of an entry in `SuiteReport::cases` or `SuiteReport::children`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Slot {
    Case(usize),
    Suite(usize),
}

/// A case or nested suite of a [`SuiteReport`], in declaration order.
#[derive(Debug, Clone, Copy)]
pub enum ReportEntry<'r> {
    Case(&'r CaseReport),
    Suite(&'r SuiteReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    pub name: String,
    /// True when an enclosing suite's setup failed and none of this suite's hooks ran.
    pub blocked: bool,
    pub setup_outcomes: Vec<HookReport>,
    pub teardown_outcomes: Vec<HookReport>,
    pub cases: Vec<CaseReport>,
    pub children: Vec<SuiteReport>,
    /// Declaration order across `cases` and `children`, e.g. `[{"case": 0}, {"suite": 0}]`.
    #[serde(rename = "entries")]
    order: Vec<Slot>,
}

impl SuiteReport {
    /// Cases and nested suites interleaved as they were declared.
    pub fn entries(&self) -> impl Iterator<Item = ReportEntry<'_>> {
        self.order.iter().map(move |slot| match *slot {
            Slot::Case(i) => ReportEntry::Case(&self.cases[i]),
            Slot::Suite(i) => ReportEntry::Suite(&self.children[i]),
        })
    }

    pub fn setup_failed(&self) -> bool {
        self.setup_outcomes.iter().any(|h| !h.outcome.is_pass())
    }

    fn walk<'r>(&'r self, visit: &mut dyn FnMut(&'r SuiteReport)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub hook_failures: usize,
}

/// A single failure surfaced by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub kind: FailureKind,
    pub title: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub root: SuiteReport,
}

impl Report {
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn all_passed(&self) -> bool {
        let s = &self.summary;
        s.failed == 0 && s.errored == 0 && s.hook_failures == 0
    }

    /// Every case report, in the order the cases were reached.
    pub fn cases_in_order(&self) -> Vec<&CaseReport> {
        let mut cases = Vec::new();
        self.root.walk(&mut |suite| cases.extend(suite.cases.iter()));
        cases.sort_by_key(|case| case.sequence);
        cases
    }

    pub fn find_case(&self, full_title: &str) -> Option<&CaseReport> {
        self.cases_in_order()
            .into_iter()
            .find(|case| case.full_title == full_title)
    }

    /// Hook and case failures, grouped by suite in tree order.
    pub fn failures(&self) -> Vec<FailureEntry> {
        let mut failures = Vec::new();
        self.root.walk(&mut |suite| {
            let suite_hooks = suite.setup_outcomes.iter().chain(&suite.teardown_outcomes);
            for hook in suite_hooks.filter(|h| !h.outcome.is_pass()) {
                failures.push(FailureEntry {
                    kind: FailureKind::HookFailure,
                    title: join_title(&hook.suite, &hook.title),
                    outcome: hook.outcome.clone(),
                });
            }
            for case in &suite.cases {
                let case_hooks = case
                    .setup_chain_outcomes
                    .iter()
                    .chain(&case.teardown_chain_outcomes);
                for hook in case_hooks.filter(|h| !h.outcome.is_pass()) {
                    failures.push(FailureEntry {
                        kind: FailureKind::HookFailure,
                        title: format!("{} for \"{}\"", hook.title, case.full_title),
                        outcome: hook.outcome.clone(),
                    });
                }
                if let Some(body) = case.body_outcome.as_ref().filter(|o| !o.is_pass()) {
                    failures.push(FailureEntry {
                        kind: FailureKind::CaseFailure,
                        title: case.full_title.clone(),
                        outcome: body.clone(),
                    });
                }
            }
        });
        failures
    }
}

fn join_title(prefix: &str, rest: &str) -> String {
    if prefix.is_empty() {
        rest.to_string()
    } else {
        format!("{} {}", prefix, rest)
    }
}

// =============================================================================
// COLLECTOR
// =============================================================================

/// Per-case record, created the first time the case shows up in an event.
#[derive(Debug, Default)]
struct ExecutionRecord {
    setup: Vec<(HookRef, Outcome)>,
    teardown: Vec<(HookRef, Outcome)>,
    outcome: Option<CaseOutcome>,
    sequence: Option<usize>,
}

#[derive(Debug, Default)]
struct SuiteTrace {
    setup: Vec<(HookRef, Outcome)>,
    teardown: Vec<(HookRef, Outcome)>,
    blocked: bool,
}

/// Observer that assembles a [`Report`].
#[derive(Debug, Default)]
pub struct ResultCollector {
    layout: Option<Layout>,
    suites: Vec<Option<SuiteTrace>>,
    records: Vec<Option<ExecutionRecord>>,
    open: Vec<SuiteId>,
    next_sequence: usize,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn trace(&mut self, suite: SuiteId) -> &mut SuiteTrace {
        grow(&mut self.suites, suite.index()).get_or_insert_with(SuiteTrace::default)
    }

    fn record(&mut self, case: CaseId) -> &mut ExecutionRecord {
        grow(&mut self.records, case.index()).get_or_insert_with(ExecutionRecord::default)
    }

    fn enclosing_setup_failed(&self) -> bool {
        self.open.iter().any(|suite| {
            self.suites
                .get(suite.index())
                .and_then(Option::as_ref)
                .is_some_and(|t| t.blocked || t.setup.iter().any(|(_, o)| !o.is_pass()))
        })
    }

    /// Builds the report. A collector that never saw a run yields an empty report.
    pub fn into_report(self) -> Report {
        let Some(layout) = self.layout.as_ref() else {
            return Report {
                summary: Summary::default(),
                root: empty_suite(String::new()),
            };
        };
        let mut summary = Summary::default();
        let root = self.build_suite(layout, layout.root(), &mut summary);
        Report { summary, root }
    }

    fn build_suite(&self, layout: &Layout, suite: SuiteId, summary: &mut Summary) -> SuiteReport {
        let mut report = empty_suite(layout.suite_name(suite).to_string());
        if let Some(trace) = self.suites.get(suite.index()).and_then(Option::as_ref) {
            report.blocked = trace.blocked;
            report.setup_outcomes = hook_reports(layout, &trace.setup);
            report.teardown_outcomes = hook_reports(layout, &trace.teardown);
        }
        summary.hook_failures += count_failures(&report.setup_outcomes);
        summary.hook_failures += count_failures(&report.teardown_outcomes);

        for entry in layout.entries(suite) {
            match *entry {
                Entry::Case(case) => {
                    let case_report = self.build_case(layout, case, summary);
                    report.order.push(Slot::Case(report.cases.len()));
                    report.cases.push(case_report);
                }
                Entry::Suite(child) => {
                    let child_report = self.build_suite(layout, child, summary);
                    report.order.push(Slot::Suite(report.children.len()));
                    report.children.push(child_report);
                }
            }
        }
        report
    }

    fn build_case(&self, layout: &Layout, case: CaseId, summary: &mut Summary) -> CaseReport {
        let record = self.records.get(case.index()).and_then(Option::as_ref);
        let setup = record.map(|r| hook_reports(layout, &r.setup)).unwrap_or_default();
        let teardown = record
            .map(|r| hook_reports(layout, &r.teardown))
            .unwrap_or_default();
        let outcome = record.and_then(|r| r.outcome.as_ref());

        let (status, note) = match outcome {
            None => (CaseStatus::Errored, Some("case was never reached".to_string())),
            Some(CaseOutcome::Skipped { reason }) => (CaseStatus::Skipped, Some(reason.clone())),
            Some(CaseOutcome::Blocked) => (
                CaseStatus::Errored,
                Some("blocked by a failing \"before all\" hook".to_string()),
            ),
            Some(CaseOutcome::SetupFailed) => (
                CaseStatus::Errored,
                Some("a \"before each\" hook failed".to_string()),
            ),
            Some(CaseOutcome::Ran { outcome }) if !outcome.is_pass() => (CaseStatus::Failed, None),
            Some(CaseOutcome::Ran { .. }) if count_failures(&teardown) > 0 => (
                CaseStatus::Errored,
                Some("an \"after each\" hook failed".to_string()),
            ),
            Some(CaseOutcome::Ran { .. }) => (CaseStatus::Passed, None),
        };

        summary.total += 1;
        match status {
            CaseStatus::Passed => summary.passed += 1,
            CaseStatus::Failed => summary.failed += 1,
            CaseStatus::Errored => summary.errored += 1,
            CaseStatus::Skipped => summary.skipped += 1,
        }
        summary.hook_failures += count_failures(&setup) + count_failures(&teardown);

        CaseReport {
            name: layout.case_name(case).to_string(),
            full_title: layout.full_title(case),
            status,
            sequence: record.and_then(|r| r.sequence).unwrap_or(usize::MAX),
            setup_chain_outcomes: setup,
            body_outcome: outcome.and_then(CaseOutcome::body).cloned(),
            teardown_chain_outcomes: teardown,
            note,
        }
    }
}

impl Observer for ResultCollector {
    fn on_run_start(&mut self, layout: &Layout) {
        self.layout = Some(layout.clone());
    }

    fn on_suite_enter(&mut self, suite: SuiteId) {
        let blocked = self.enclosing_setup_failed();
        self.trace(suite).blocked = blocked;
        self.open.push(suite);
    }

    fn on_hook_result(&mut self, hook: HookRef, case: Option<CaseId>, outcome: &Outcome) {
        let entry = (hook, outcome.clone());
        match (case, hook.kind) {
            (Some(case), HookKind::CaseSetup) => self.record(case).setup.push(entry),
            (Some(case), _) => self.record(case).teardown.push(entry),
            (None, HookKind::SuiteSetup) => self.trace(hook.suite).setup.push(entry),
            (None, _) => self.trace(hook.suite).teardown.push(entry),
        }
    }

    fn on_case_result(&mut self, case: CaseId, outcome: &CaseOutcome) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let record = self.record(case);
        record.outcome = Some(outcome.clone());
        record.sequence = Some(sequence);
    }

    fn on_suite_exit(&mut self, suite: SuiteId) {
        if let Some(position) = self.open.iter().rposition(|open| *open == suite) {
            self.open.truncate(position);
        }
    }
}

fn grow<T>(items: &mut Vec<Option<T>>, index: usize) -> &mut Option<T> {
    if items.len() <= index {
        items.resize_with(index + 1, || None);
    }
    &mut items[index]
}

fn empty_suite(name: String) -> SuiteReport {
    SuiteReport {
        name,
        blocked: false,
        setup_outcomes: Vec::new(),
        teardown_outcomes: Vec::new(),
        cases: Vec::new(),
        children: Vec::new(),
        order: Vec::new(),
    }
}

fn hook_reports(layout: &Layout, hooks: &[(HookRef, Outcome)]) -> Vec<HookReport> {
    hooks
        .iter()
        .map(|(hook, outcome)| HookReport {
            title: layout.hook_title(*hook).to_string(),
            kind: hook.kind,
            suite: layout.suite_title(hook.suite),
            outcome: outcome.clone(),
        })
        .collect()
}

fn count_failures(hooks: &[HookReport]) -> usize {
    hooks.iter().filter(|h| !h.outcome.is_pass()).count()
}
