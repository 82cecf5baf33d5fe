//! The suite tree and its build API.
//!
//! A [`SuiteTree`] is declared once, finalized, run once and dropped. Its
//! structure lives in a [`Layout`] (names, nesting, marks, hook titles) that
//! is read-only while running; the executable bodies live beside it so the
//! scheduler can call them mutably while the layout stays shared.

use serde::Serialize;

use crate::errors::StructuralError;
use crate::outcome::Executable;

/// Identifies a suite within the tree that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SuiteId(pub(crate) usize);

/// Identifies a case within the tree that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CaseId(pub(crate) usize);

impl SuiteId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl CaseId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The four lifecycle hook kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Runs once before anything else in the suite.
    SuiteSetup,
    /// Runs once after everything else in the suite.
    SuiteTeardown,
    /// Runs before every case nested anywhere under the suite.
    CaseSetup,
    /// Runs after every case nested anywhere under the suite.
    CaseTeardown,
}

impl HookKind {
    pub const ALL: [HookKind; 4] = [
        HookKind::SuiteSetup,
        HookKind::SuiteTeardown,
        HookKind::CaseSetup,
        HookKind::CaseTeardown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HookKind::SuiteSetup => "before all",
            HookKind::SuiteTeardown => "after all",
            HookKind::CaseSetup => "before each",
            HookKind::CaseTeardown => "after each",
        }
    }

    fn slot(&self) -> usize {
        match self {
            HookKind::SuiteSetup => 0,
            HookKind::SuiteTeardown => 1,
            HookKind::CaseSetup => 2,
            HookKind::CaseTeardown => 3,
        }
    }
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A hook declared on a suite: the `index`-th hook of `kind` on `suite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HookRef {
    pub suite: SuiteId,
    pub kind: HookKind,
    pub index: usize,
}

/// A child of a suite, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Suite(SuiteId),
    Case(CaseId),
}

/// Selection mark on a suite or case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    #[default]
    None,
    Skip,
    Only,
}

#[derive(Debug, Clone)]
struct SuiteNode {
    name: String,
    parent: Option<SuiteId>,
    depth: usize,
    entries: Vec<Entry>,
    hook_titles: [Vec<String>; 4],
    mark: Mark,
}

#[derive(Debug, Clone)]
struct CaseNode {
    name: String,
    parent: SuiteId,
    mark: Mark,
}

/// Read-only structure of a suite tree.
#[derive(Debug, Clone)]
pub struct Layout {
    suites: Vec<SuiteNode>,
    cases: Vec<CaseNode>,
}

impl Layout {
    pub fn root(&self) -> SuiteId {
        SuiteId(0)
    }

    pub fn suite_count(&self) -> usize {
        self.suites.len()
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    pub fn suite_name(&self, suite: SuiteId) -> &str {
        &self.suites[suite.0].name
    }

    pub fn case_name(&self, case: CaseId) -> &str {
        &self.cases[case.0].name
    }

    pub fn suite_parent(&self, suite: SuiteId) -> Option<SuiteId> {
        self.suites[suite.0].parent
    }

    pub fn case_parent(&self, case: CaseId) -> SuiteId {
        self.cases[case.0].parent
    }

    /// Nesting depth of a suite; the root is 0.
    pub fn suite_depth(&self, suite: SuiteId) -> usize {
        self.suites[suite.0].depth
    }

    pub fn entries(&self, suite: SuiteId) -> &[Entry] {
        &self.suites[suite.0].entries
    }

    pub fn suite_mark(&self, suite: SuiteId) -> Mark {
        self.suites[suite.0].mark
    }

    pub fn case_mark(&self, case: CaseId) -> Mark {
        self.cases[case.0].mark
    }

    pub fn hook_count(&self, suite: SuiteId, kind: HookKind) -> usize {
        self.suites[suite.0].hook_titles[kind.slot()].len()
    }

    /// Hooks of one kind on one suite, in declaration order.
    pub fn hooks(&self, suite: SuiteId, kind: HookKind) -> impl Iterator<Item = HookRef> {
        (0..self.hook_count(suite, kind)).map(move |index| HookRef { suite, kind, index })
    }

    pub fn hook_title(&self, hook: HookRef) -> &str {
        &self.suites[hook.suite.0].hook_titles[hook.kind.slot()][hook.index]
    }

    pub fn suite_ids(&self) -> impl Iterator<Item = SuiteId> {
        (0..self.suites.len()).map(SuiteId)
    }

    pub fn case_ids(&self) -> impl Iterator<Item = CaseId> {
        (0..self.cases.len()).map(CaseId)
    }

    /// Suite names from the outermost non-empty name down to `suite`, space separated.
    pub fn suite_title(&self, suite: SuiteId) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(suite);
        while let Some(id) = cursor {
            let node = &self.suites[id.0];
            if !node.name.is_empty() {
                names.push(node.name.as_str());
            }
            cursor = node.parent;
        }
        names.reverse();
        names.join(" ")
    }

    /// Full title of a case: enclosing suite names followed by the case name.
    pub fn full_title(&self, case: CaseId) -> String {
        let prefix = self.suite_title(self.case_parent(case));
        if prefix.is_empty() {
            self.case_name(case).to_string()
        } else {
            format!("{} {}", prefix, self.case_name(case))
        }
    }

    fn contains_suite(&self, suite: SuiteId) -> bool {
        suite.0 < self.suites.len()
    }
}

/// Executable bodies of a tree, indexed in step with its [`Layout`].
pub(crate) struct Units {
    hooks: Vec<[Vec<Box<dyn Executable>>; 4]>,
    cases: Vec<Box<dyn Executable>>,
}

impl Units {
    pub(crate) fn hook_mut(&mut self, hook: HookRef) -> &mut dyn Executable {
        self.hooks[hook.suite.0][hook.kind.slot()][hook.index].as_mut()
    }

    pub(crate) fn case_mut(&mut self, case: CaseId) -> &mut dyn Executable {
        self.cases[case.0].as_mut()
    }
}

/// A tree of suites, cases and hooks under construction.
pub struct SuiteTree {
    layout: Layout,
    units: Units,
    finalized: bool,
}

impl SuiteTree {
    /// Creates a tree whose root suite is called `root_name`. The root name may be empty.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            layout: Layout {
                suites: vec![SuiteNode {
                    name: root_name.into(),
                    parent: None,
                    depth: 0,
                    entries: Vec::new(),
                    hook_titles: Default::default(),
                    mark: Mark::None,
                }],
                cases: Vec::new(),
            },
            units: Units {
                hooks: vec![Default::default()],
                cases: Vec::new(),
            },
            finalized: false,
        }
    }

    pub fn root(&self) -> SuiteId {
        self.layout.root()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn add_suite(
        &mut self,
        parent: SuiteId,
        name: impl Into<String>,
    ) -> Result<SuiteId, StructuralError> {
        let name = name.into();
        self.check_open("suite", &name)?;
        self.check_suite(parent)?;
        if name.is_empty() {
            return Err(StructuralError::EmptyName { what: "suite" });
        }
        let id = SuiteId(self.layout.suites.len());
        let depth = self.layout.suites[parent.0].depth + 1;
        self.layout.suites.push(SuiteNode {
            name,
            parent: Some(parent),
            depth,
            entries: Vec::new(),
            hook_titles: Default::default(),
            mark: Mark::None,
        });
        self.units.hooks.push(Default::default());
        self.layout.suites[parent.0].entries.push(Entry::Suite(id));
        Ok(id)
    }

    pub fn add_case<E>(
        &mut self,
        parent: SuiteId,
        name: impl Into<String>,
        body: E,
    ) -> Result<CaseId, StructuralError>
    where
        E: Executable + 'static,
    {
        let name = name.into();
        self.check_open("case", &name)?;
        self.check_suite(parent)?;
        if name.is_empty() {
            return Err(StructuralError::EmptyName { what: "case" });
        }
        let id = CaseId(self.layout.cases.len());
        self.layout.cases.push(CaseNode {
            name,
            parent,
            mark: Mark::None,
        });
        self.units.cases.push(Box::new(body));
        self.layout.suites[parent.0].entries.push(Entry::Case(id));
        Ok(id)
    }

    /// Adds an unnamed hook, titled after its kind (e.g. `"before each" hook`).
    pub fn add_hook<E>(
        &mut self,
        suite: SuiteId,
        kind: HookKind,
        body: E,
    ) -> Result<HookRef, StructuralError>
    where
        E: Executable + 'static,
    {
        let title = format!("\"{}\" hook", kind.label());
        self.push_hook(suite, kind, title, Box::new(body))
    }

    /// Adds a hook titled `"<kind>" hook: <name>`.
    pub fn add_named_hook<E>(
        &mut self,
        suite: SuiteId,
        kind: HookKind,
        name: impl AsRef<str>,
        body: E,
    ) -> Result<HookRef, StructuralError>
    where
        E: Executable + 'static,
    {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(StructuralError::EmptyName { what: "hook" });
        }
        let title = format!("\"{}\" hook: {}", kind.label(), name);
        self.push_hook(suite, kind, title, Box::new(body))
    }

    pub fn skip_suite(&mut self, suite: SuiteId) -> Result<(), StructuralError> {
        self.mark_suite(suite, Mark::Skip)
    }

    pub fn only_suite(&mut self, suite: SuiteId) -> Result<(), StructuralError> {
        self.mark_suite(suite, Mark::Only)
    }

    pub fn skip_case(&mut self, case: CaseId) -> Result<(), StructuralError> {
        self.mark_case(case, Mark::Skip)
    }

    pub fn only_case(&mut self, case: CaseId) -> Result<(), StructuralError> {
        self.mark_case(case, Mark::Only)
    }

    /// Validates the tree and freezes its structure. Calling it again is a no-op.
    pub fn finalize(&mut self) -> Result<(), StructuralError> {
        if self.finalized {
            return Ok(());
        }
        if self.layout.cases.is_empty() {
            return Err(StructuralError::EmptyTree {
                root: self.layout.suites[0].name.clone(),
            });
        }
        self.finalized = true;
        Ok(())
    }

    pub(crate) fn into_parts(self) -> (Layout, Units) {
        (self.layout, self.units)
    }

    fn push_hook(
        &mut self,
        suite: SuiteId,
        kind: HookKind,
        title: String,
        body: Box<dyn Executable>,
    ) -> Result<HookRef, StructuralError> {
        self.check_open("hook", &title)?;
        self.check_suite(suite)?;
        let titles = &mut self.layout.suites[suite.0].hook_titles[kind.slot()];
        let index = titles.len();
        titles.push(title);
        self.units.hooks[suite.0][kind.slot()].push(body);
        Ok(HookRef { suite, kind, index })
    }

    fn mark_suite(&mut self, suite: SuiteId, mark: Mark) -> Result<(), StructuralError> {
        self.check_suite(suite)?;
        self.check_open("mark on suite", &self.layout.suites[suite.0].name)?;
        self.layout.suites[suite.0].mark = mark;
        Ok(())
    }

    fn mark_case(&mut self, case: CaseId, mark: Mark) -> Result<(), StructuralError> {
        let node = self
            .layout
            .cases
            .get(case.0)
            .ok_or(StructuralError::UnknownCase { id: case.0 })?;
        self.check_open("mark on case", &node.name)?;
        self.layout.cases[case.0].mark = mark;
        Ok(())
    }

    fn check_open(&self, what: &'static str, name: &str) -> Result<(), StructuralError> {
        if self.finalized {
            Err(StructuralError::finalized(what, name))
        } else {
            Ok(())
        }
    }

    fn check_suite(&self, suite: SuiteId) -> Result<(), StructuralError> {
        if self.layout.contains_suite(suite) {
            Ok(())
        } else {
            Err(StructuralError::UnknownSuite { id: suite.0 })
        }
    }
}

impl std::fmt::Debug for SuiteTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteTree")
            .field("layout", &self.layout)
            .field("finalized", &self.finalized)
            .finish()
    }
}
