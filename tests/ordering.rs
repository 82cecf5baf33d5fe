// Execution order of suite hooks, case hooks and case bodies.

mod common;

use arbor::{run, Context, HookKind, Outcome, SuiteTree};
use common::{entries, log, record};

#[test]
fn shared_log_sees_suite_setup_once_and_case_setup_per_case() {
    let log = log();
    let mut tree = SuiteTree::new("root");
    let root = tree.root();
    tree.add_hook(root, HookKind::SuiteSetup, record(&log, "S")).unwrap();
    tree.add_hook(root, HookKind::CaseSetup, record(&log, "C")).unwrap();
    tree.add_case(root, "first", |_: &mut Context<'_>| Outcome::Pass).unwrap();
    tree.add_case(root, "second", |_: &mut Context<'_>| Outcome::Pass).unwrap();

    run(tree).unwrap();
    assert_eq!(entries(&log), ["S", "C", "C"]);
}

#[test]
fn case_setup_resets_state_for_every_case() {
    #[derive(Debug)]
    struct Counter(u32);

    let mut tree = SuiteTree::new("");
    let math = tree.add_suite(tree.root(), "Math").unwrap();
    tree.add_hook(math, HookKind::CaseSetup, |ctx: &mut Context<'_>| {
        ctx.set(Counter(0));
        ctx.with::<Counter, _>(|c| {
            c.0 += 1;
            Outcome::Pass
        })
    })
    .unwrap();
    for name in ["adds", "subtracts", "multiplies"] {
        tree.add_case(math, name, |ctx: &mut Context<'_>| {
            ctx.with::<Counter, _>(|c| Outcome::expect_eq(c.0, 1))
        })
        .unwrap();
    }

    let report = run(tree).unwrap();
    assert!(report.all_passed(), "{:#?}", report.failures());
    assert_eq!(report.summary.passed, 3);
}

#[test]
fn inherited_case_hooks_wrap_the_body_symmetrically() {
    let log = log();
    let mut tree = SuiteTree::new("root");
    let root = tree.root();
    let outer = tree.add_suite(root, "outer").unwrap();
    let inner = tree.add_suite(outer, "inner").unwrap();
    for (suite, name) in [(root, "root"), (outer, "outer"), (inner, "inner")] {
        tree.add_hook(suite, HookKind::CaseSetup, record(&log, &format!("before {}", name)))
            .unwrap();
        tree.add_hook(suite, HookKind::CaseTeardown, record(&log, &format!("after {}", name)))
            .unwrap();
    }
    let body_log = log.clone();
    tree.add_case(inner, "deep", move |_: &mut Context<'_>| {
        body_log.borrow_mut().push("body".to_string());
        Outcome::fail("the body fails")
    })
    .unwrap();

    run(tree).unwrap();
    assert_eq!(
        entries(&log),
        [
            "before root",
            "before outer",
            "before inner",
            "body",
            "after inner",
            "after outer",
            "after root",
        ]
    );
}

#[test]
fn every_suite_runs_its_suite_hooks_exactly_once() {
    let log = log();
    let mut tree = SuiteTree::new("root");
    let root = tree.root();
    let busy = tree.add_suite(root, "busy").unwrap();
    let empty = tree.add_suite(root, "empty").unwrap();
    let nested = tree.add_suite(busy, "nested").unwrap();
    for (suite, name) in [(root, "root"), (busy, "busy"), (empty, "empty"), (nested, "nested")] {
        tree.add_hook(suite, HookKind::SuiteSetup, record(&log, &format!("setup {}", name)))
            .unwrap();
        tree.add_hook(suite, HookKind::SuiteTeardown, record(&log, &format!("teardown {}", name)))
            .unwrap();
    }
    for i in 0..3 {
        tree.add_case(busy, format!("busy {}", i), record(&log, &format!("case busy {}", i)))
            .unwrap();
        tree.add_case(nested, format!("nested {}", i), record(&log, &format!("case nested {}", i)))
            .unwrap();
    }

    run(tree).unwrap();
    assert_eq!(
        entries(&log),
        [
            "setup root",
            "setup busy",
            "setup nested",
            "case nested 0",
            "case nested 1",
            "case nested 2",
            "teardown nested",
            "case busy 0",
            "case busy 1",
            "case busy 2",
            "teardown busy",
            "setup empty",
            "teardown empty",
            "teardown root",
        ]
    );
}

#[test]
fn suite_hooks_of_one_kind_run_in_declaration_order() {
    let log = log();
    let mut tree = SuiteTree::new("root");
    let root = tree.root();
    tree.add_named_hook(root, HookKind::SuiteSetup, "b", record(&log, "setup b")).unwrap();
    tree.add_named_hook(root, HookKind::SuiteSetup, "a", record(&log, "setup a")).unwrap();
    tree.add_named_hook(root, HookKind::CaseTeardown, "z", record(&log, "after z")).unwrap();
    tree.add_named_hook(root, HookKind::CaseTeardown, "y", record(&log, "after y")).unwrap();
    tree.add_case(root, "case", record(&log, "case")).unwrap();

    run(tree).unwrap();
    assert_eq!(entries(&log), ["setup b", "setup a", "case", "after z", "after y"]);
}

#[test]
fn report_lists_sibling_suites_in_declaration_order() {
    let mut tree = SuiteTree::new("");
    let root = tree.root();
    let a = tree.add_suite(root, "A").unwrap();
    let b = tree.add_suite(root, "B").unwrap();
    for suite in [a, b] {
        tree.add_case(suite, "case1", |_: &mut Context<'_>| Outcome::Pass).unwrap();
        tree.add_case(suite, "case2", |_: &mut Context<'_>| Outcome::Pass).unwrap();
    }

    let report = run(tree).unwrap();
    let titles: Vec<_> = report
        .cases_in_order()
        .iter()
        .map(|c| c.full_title.clone())
        .collect();
    assert_eq!(titles, ["A case1", "A case2", "B case1", "B case2"]);
}

#[test]
fn interleaved_cases_and_suites_keep_declaration_order() {
    let log = log();
    let mut tree = SuiteTree::new("root");
    let root = tree.root();
    tree.add_case(root, "before nested", record(&log, "before nested")).unwrap();
    let nested = tree.add_suite(root, "nested").unwrap();
    tree.add_hook(nested, HookKind::SuiteSetup, record(&log, "enter nested")).unwrap();
    tree.add_hook(nested, HookKind::SuiteTeardown, record(&log, "leave nested")).unwrap();
    tree.add_case(nested, "inside", record(&log, "inside")).unwrap();
    tree.add_case(root, "after nested", record(&log, "after nested")).unwrap();

    let report = run(tree).unwrap();
    assert_eq!(
        entries(&log),
        ["before nested", "enter nested", "inside", "leave nested", "after nested"]
    );
    let sequence: Vec<_> = report.cases_in_order().iter().map(|c| c.name.clone()).collect();
    assert_eq!(sequence, ["before nested", "inside", "after nested"]);
}

#[test]
fn fixtures_are_dropped_after_the_owning_suite_tears_down() {
    struct Guard(common::Log);

    impl Drop for Guard {
        fn drop(&mut self) {
            self.0.borrow_mut().push("fixture dropped".to_string());
        }
    }

    let log = log();
    let mut tree = SuiteTree::new("root");
    let root = tree.root();
    let suite = tree.add_suite(root, "owner").unwrap();
    let guard_log = log.clone();
    tree.add_hook(suite, HookKind::SuiteSetup, move |ctx: &mut Context<'_>| {
        ctx.set(Guard(guard_log.clone()));
        Outcome::Pass
    })
    .unwrap();
    tree.add_hook(suite, HookKind::SuiteTeardown, record(&log, "teardown owner")).unwrap();
    tree.add_case(suite, "uses guard", |ctx: &mut Context<'_>| {
        Outcome::ensure(ctx.get::<Guard>().is_some(), "guard missing")
    })
    .unwrap();
    tree.add_case(root, "sibling", |ctx: &mut Context<'_>| {
        Outcome::ensure(ctx.get::<Guard>().is_none(), "guard leaked out of its suite")
    })
    .unwrap();

    let report = run(tree).unwrap();
    assert!(report.all_passed(), "{:#?}", report.failures());
    assert_eq!(entries(&log), ["teardown owner", "fixture dropped"]);
}
