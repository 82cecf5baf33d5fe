//! Scope resolution: which suites enclose a case, and which case hooks apply to it.

use std::slice;

use crate::tree::{CaseId, Entry, HookKind, HookRef, Layout, SuiteId};

/// Resolves scope chains over a finalized [`Layout`].
///
/// Chains are computed once up front; the layout cannot change while a
/// resolver borrows it.
#[derive(Debug)]
pub struct ScopeResolver<'l> {
    layout: &'l Layout,
    chains: Vec<Vec<SuiteId>>,
}

impl<'l> ScopeResolver<'l> {
    pub fn new(layout: &'l Layout) -> Self {
        let mut chains: Vec<Vec<SuiteId>> = Vec::with_capacity(layout.suite_count());
        for suite in layout.suite_ids() {
            // Parents are always declared before their children.
            let mut chain = match layout.suite_parent(suite) {
                Some(parent) => chains[parent.index()].clone(),
                None => Vec::new(),
            };
            chain.push(suite);
            chains.push(chain);
        }
        Self { layout, chains }
    }

    pub fn layout(&self) -> &'l Layout {
        self.layout
    }

    /// Suites from the root down to the case's immediate parent.
    pub fn chain(&self, case: CaseId) -> &[SuiteId] {
        self.suite_chain(self.layout.case_parent(case))
    }

    /// Suites from the root down to and including `suite`.
    pub fn suite_chain(&self, suite: SuiteId) -> &[SuiteId] {
        &self.chains[suite.index()]
    }

    /// Case-setup hooks for `case`, outermost suite first, declaration order within a suite.
    pub fn case_setup_chain(&self, case: CaseId) -> Vec<HookRef> {
        self.chain(case)
            .iter()
            .flat_map(|&suite| self.layout.hooks(suite, HookKind::CaseSetup))
            .collect()
    }

    /// Case-teardown hooks for `case`, innermost suite first, declaration order within a suite.
    pub fn case_teardown_chain(&self, case: CaseId) -> Vec<HookRef> {
        self.chain(case)
            .iter()
            .rev()
            .flat_map(|&suite| self.layout.hooks(suite, HookKind::CaseTeardown))
            .collect()
    }

    /// Every case nested under `suite`, lazily, in execution order.
    pub fn descendant_cases(&self, suite: SuiteId) -> DescendantCases<'l> {
        DescendantCases {
            layout: self.layout,
            stack: vec![self.layout.entries(suite).iter()],
        }
    }

    pub fn encloses(&self, suite: SuiteId, case: CaseId) -> bool {
        self.chain(case).contains(&suite)
    }
}

/// Depth-first iterator over the cases below a suite.
pub struct DescendantCases<'l> {
    layout: &'l Layout,
    stack: Vec<slice::Iter<'l, Entry>>,
}

impl Iterator for DescendantCases<'_> {
    type Item = CaseId;

    fn next(&mut self) -> Option<CaseId> {
        loop {
            let next = self.stack.last_mut()?.next();
            let entry = match next {
                Some(entry) => *entry,
                None => {
                    self.stack.pop();
                    continue;
                }
            };
            match entry {
                Entry::Case(case) => return Some(case),
                Entry::Suite(suite) => self.stack.push(self.layout.entries(suite).iter()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;
    use crate::tree::SuiteTree;
    use crate::Context;

    fn pass(_: &mut Context<'_>) -> Outcome {
        Outcome::Pass
    }

    struct Fixture {
        tree: SuiteTree,
        outer: SuiteId,
        inner: SuiteId,
        shallow: CaseId,
        deep: CaseId,
        trailing: CaseId,
    }

    fn nested() -> Fixture {
        let mut tree = SuiteTree::new("root");
        let root = tree.root();
        let outer = tree.add_suite(root, "outer").unwrap();
        let shallow = tree.add_case(outer, "shallow", pass).unwrap();
        let inner = tree.add_suite(outer, "inner").unwrap();
        let deep = tree.add_case(inner, "deep", pass).unwrap();
        let trailing = tree.add_case(root, "trailing", pass).unwrap();

        tree.add_named_hook(root, HookKind::CaseSetup, "root-1", pass).unwrap();
        tree.add_named_hook(root, HookKind::CaseSetup, "root-2", pass).unwrap();
        tree.add_named_hook(inner, HookKind::CaseSetup, "inner", pass).unwrap();
        tree.add_named_hook(root, HookKind::CaseTeardown, "root-1", pass).unwrap();
        tree.add_named_hook(root, HookKind::CaseTeardown, "root-2", pass).unwrap();
        tree.add_named_hook(outer, HookKind::CaseTeardown, "outer", pass).unwrap();
        tree.add_named_hook(inner, HookKind::CaseTeardown, "inner", pass).unwrap();
        tree.finalize().unwrap();

        Fixture {
            tree,
            outer,
            inner,
            shallow,
            deep,
            trailing,
        }
    }

    fn titles(layout: &Layout, hooks: &[HookRef]) -> Vec<String> {
        hooks.iter().map(|h| layout.hook_title(*h).to_string()).collect()
    }

    #[test]
    fn chain_runs_root_to_parent() {
        let f = nested();
        let resolver = ScopeResolver::new(f.tree.layout());
        let root = f.tree.root();
        assert_eq!(resolver.chain(f.deep), &[root, f.outer, f.inner]);
        assert_eq!(resolver.chain(f.shallow), &[root, f.outer]);
        assert_eq!(resolver.chain(f.trailing), &[root]);
        assert!(resolver.encloses(f.outer, f.deep));
        assert!(!resolver.encloses(f.inner, f.shallow));
    }

    #[test]
    fn setup_chain_is_ancestor_first() {
        let f = nested();
        let layout = f.tree.layout();
        let resolver = ScopeResolver::new(layout);
        assert_eq!(
            titles(layout, &resolver.case_setup_chain(f.deep)),
            [
                "\"before each\" hook: root-1",
                "\"before each\" hook: root-2",
                "\"before each\" hook: inner",
            ]
        );
    }

    #[test]
    fn teardown_chain_is_innermost_first() {
        let f = nested();
        let layout = f.tree.layout();
        let resolver = ScopeResolver::new(layout);
        assert_eq!(
            titles(layout, &resolver.case_teardown_chain(f.deep)),
            [
                "\"after each\" hook: inner",
                "\"after each\" hook: outer",
                "\"after each\" hook: root-1",
                "\"after each\" hook: root-2",
            ]
        );
        assert_eq!(
            titles(layout, &resolver.case_teardown_chain(f.trailing)),
            ["\"after each\" hook: root-1", "\"after each\" hook: root-2"]
        );
    }

    #[test]
    fn descendant_cases_follow_declaration_order() {
        let f = nested();
        let resolver = ScopeResolver::new(f.tree.layout());
        let all: Vec<_> = resolver.descendant_cases(f.tree.root()).collect();
        assert_eq!(all, vec![f.shallow, f.deep, f.trailing]);
        let under_outer: Vec<_> = resolver.descendant_cases(f.outer).collect();
        assert_eq!(under_outer, vec![f.shallow, f.deep]);
        assert_eq!(resolver.descendant_cases(f.inner).last(), Some(f.deep));
    }
}
