//! The execution scheduler.
//!
//! A run is one depth-first walk over the suite tree in declaration order.
//! On entering a suite its suite-setup hooks run once; every case reached
//! below it then runs the inherited case-setup chain (outermost suite first),
//! its body, and the inherited case-teardown chain (innermost suite first).
//! When the suite's subtree is done its suite-teardown hooks run once.
//!
//! Failure rules:
//! - a failing suite-setup hook blocks the suite's subtree: no case hooks, no
//!   bodies and no nested suite hooks run below it, but the suite's own
//!   suite-teardown hooks still run;
//! - a failing case-setup hook skips the rest of that case's setup chain and
//!   its body, while the full case-teardown chain still runs;
//! - teardown hooks never stop at a failure.
//!
//! Nothing aborts the walk once it has started.

use tracing::{debug, info, warn};

use crate::collector::{Fanout, Observer, Report, ResultCollector};
use crate::config::RunConfig;
use crate::errors::StructuralError;
use crate::fixture::{Context, Fixtures};
use crate::outcome::{invoke, CaseOutcome, Outcome};
use crate::scope::ScopeResolver;
use crate::tree::{CaseId, Entry, HookKind, HookRef, Layout, Mark, SuiteId, SuiteTree, Units};

/// Runs suite trees with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    config: RunConfig,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Runs `tree` to completion and returns its report.
    pub fn run(&self, tree: SuiteTree) -> Result<Report, StructuralError> {
        let mut collector = ResultCollector::new();
        self.drive(tree, &mut collector)?;
        Ok(finish(collector))
    }

    /// Like [`Runner::run`], also forwarding every event to `observer`.
    pub fn run_observed(
        &self,
        tree: SuiteTree,
        observer: &mut dyn Observer,
    ) -> Result<Report, StructuralError> {
        let mut collector = ResultCollector::new();
        {
            let mut fanout = Fanout::new().with(&mut collector).with(observer);
            self.drive(tree, &mut fanout)?;
        }
        Ok(finish(collector))
    }

    /// Finalizes `tree` if needed and walks it, reporting to `observer` only.
    pub fn drive<O>(&self, mut tree: SuiteTree, observer: &mut O) -> Result<(), StructuralError>
    where
        O: Observer + ?Sized,
    {
        tree.finalize()?;
        let (layout, mut units) = tree.into_parts();
        let resolver = ScopeResolver::new(&layout);
        let exclusive = resolver
            .descendant_cases(layout.root())
            .any(|case| marked(&layout, &resolver, case, Mark::Only));

        info!(
            suites = layout.suite_count(),
            cases = layout.case_count(),
            exclusive,
            "starting run"
        );
        observer.on_run_start(&layout);
        let mut walk = Walk {
            layout: &layout,
            resolver: &resolver,
            units: &mut units,
            observer,
            config: &self.config,
            frames: Vec::new(),
            exclusive,
        };
        walk.visit_suite(layout.root(), false);
        walk.observer.on_run_end();
        info!("run complete");
        Ok(())
    }
}

fn finish(collector: ResultCollector) -> Report {
    let report = collector.into_report();
    let s = report.summary;
    info!(
        total = s.total,
        passed = s.passed,
        failed = s.failed,
        errored = s.errored,
        skipped = s.skipped,
        hook_failures = s.hook_failures,
        "run summary"
    );
    report
}

/// Runs `tree` with the default configuration.
pub fn run(tree: SuiteTree) -> Result<Report, StructuralError> {
    Runner::default().run(tree)
}

/// True when `case` or any suite enclosing it carries `mark`.
fn marked(layout: &Layout, resolver: &ScopeResolver<'_>, case: CaseId, mark: Mark) -> bool {
    layout.case_mark(case) == mark
        || resolver
            .chain(case)
            .iter()
            .any(|&suite| layout.suite_mark(suite) == mark)
}

struct Walk<'r, O: Observer + ?Sized> {
    layout: &'r Layout,
    resolver: &'r ScopeResolver<'r>,
    units: &'r mut Units,
    observer: &'r mut O,
    config: &'r RunConfig,
    /// One fixture map per entered suite, root first.
    frames: Vec<Fixtures>,
    exclusive: bool,
}

impl<O: Observer + ?Sized> Walk<'_, O> {
    fn visit_suite(&mut self, suite: SuiteId, inherited_block: bool) {
        let layout = self.layout;
        debug!(
            suite = layout.suite_name(suite),
            planned = self.resolver.descendant_cases(suite).count(),
            blocked = inherited_block,
            "entering suite"
        );
        self.observer.on_suite_enter(suite);
        self.frames.push(Fixtures::default());

        let blocked = inherited_block || !self.run_suite_setup(suite);
        for entry in layout.entries(suite) {
            match *entry {
                Entry::Suite(child) => self.visit_suite(child, blocked),
                Entry::Case(case) => self.visit_case(case, blocked),
            }
        }
        if !inherited_block {
            for hook in layout.hooks(suite, HookKind::SuiteTeardown) {
                self.invoke_hook(hook, None);
            }
        }

        self.frames.pop();
        self.observer.on_suite_exit(suite);
        debug!(suite = layout.suite_name(suite), "left suite");
    }

    /// Runs the suite-setup hooks in order, stopping at the first failure.
    fn run_suite_setup(&mut self, suite: SuiteId) -> bool {
        for hook in self.layout.hooks(suite, HookKind::SuiteSetup) {
            if !self.invoke_hook(hook, None).is_pass() {
                let skipped = self.layout.hook_count(suite, HookKind::SuiteSetup) - hook.index - 1;
                warn!(
                    suite = self.layout.suite_name(suite),
                    skipped_hooks = skipped,
                    "suite setup failed; blocking its subtree"
                );
                return false;
            }
        }
        true
    }

    fn visit_case(&mut self, case: CaseId, blocked: bool) {
        if blocked {
            debug!(case = self.layout.case_name(case), "case blocked");
            self.observer.on_case_result(case, &CaseOutcome::Blocked);
            return;
        }
        if let Some(reason) = self.skip_reason(case) {
            debug!(case = self.layout.case_name(case), %reason, "case skipped");
            self.observer
                .on_case_result(case, &CaseOutcome::Skipped { reason });
            return;
        }

        let mut setup_ok = true;
        for hook in self.resolver.case_setup_chain(case) {
            if !self.invoke_hook(hook, Some(case)).is_pass() {
                setup_ok = false;
                break;
            }
        }

        let result = if setup_ok {
            let outcome = self.invoke_body(case);
            CaseOutcome::Ran { outcome }
        } else {
            CaseOutcome::SetupFailed
        };
        self.observer.on_case_result(case, &result);

        for hook in self.resolver.case_teardown_chain(case) {
            self.invoke_hook(hook, Some(case));
        }
    }

    fn invoke_hook(&mut self, hook: HookRef, case: Option<CaseId>) -> Outcome {
        let layout = self.layout;
        let title = layout.hook_title(hook);
        let owner = layout.suite_depth(hook.suite);
        let case_name = case.map(|c| layout.case_name(c));

        let unit = self.units.hook_mut(hook);
        let mut ctx = Context::new(&mut self.frames[..=owner], title, case_name);
        let outcome = invoke(unit, &mut ctx, self.config.catch_panics);

        if outcome.is_pass() {
            debug!(hook = title, suite = layout.suite_name(hook.suite), "hook passed");
        } else {
            warn!(
                hook = title,
                suite = layout.suite_name(hook.suite),
                case = case_name.unwrap_or(""),
                outcome = %outcome,
                "hook failed"
            );
        }
        self.observer.on_hook_result(hook, case, &outcome);
        outcome
    }

    fn invoke_body(&mut self, case: CaseId) -> Outcome {
        let layout = self.layout;
        let name = layout.case_name(case);
        let unit = self.units.case_mut(case);
        let mut ctx = Context::new(&mut self.frames, name, Some(name));
        let outcome = invoke(unit, &mut ctx, self.config.catch_panics);
        debug!(case = name, outcome = outcome.label(), "case finished");
        outcome
    }

    fn skip_reason(&self, case: CaseId) -> Option<String> {
        if marked(self.layout, self.resolver, case, Mark::Skip) {
            return Some("marked skip".to_string());
        }
        if self.exclusive && !marked(self.layout, self.resolver, case, Mark::Only) {
            return Some("not marked only while other cases are".to_string());
        }
        if let Some(filter) = self.config.filter.as_deref() {
            let title = self.layout.full_title(case).to_lowercase();
            if !title.contains(&filter.to_lowercase()) {
                return Some(format!("filtered out by \"{}\"", filter));
            }
        }
        None
    }
}
