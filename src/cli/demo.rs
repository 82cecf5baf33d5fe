//! Bundled suite trees for the CLI.
//!
//! The subjects under test here are deliberately trivial. They exist so the
//! reports show the hook ordering and isolation rules at work.

use crate::errors::StructuralError;
use crate::fixture::Context;
use crate::outcome::Outcome;
use crate::tree::{HookKind, SuiteId, SuiteTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Demo {
    /// Suites whose hooks all pass.
    Hooks,
    /// Suites showing how hook and case failures are contained.
    Failures,
}

impl Demo {
    pub fn build(self) -> Result<SuiteTree, StructuralError> {
        match self {
            Demo::Hooks => hooks_tree(),
            Demo::Failures => failures_tree(),
        }
    }
}

// =============================================================================
// SUBJECTS
// =============================================================================

#[derive(Debug, Default)]
struct Counter(u32);

#[derive(Debug, Default)]
struct EventLog(Vec<&'static str>);

#[derive(Debug, Default)]
struct DatabaseManager {
    initialized: bool,
    init_count: u32,
    connections: Vec<String>,
}

impl DatabaseManager {
    fn initialize(&mut self) {
        self.initialized = true;
        self.init_count += 1;
    }

    fn connect(&mut self, name: &str) -> Result<(), String> {
        if !self.initialized {
            return Err(format!("cannot open '{}': database is not initialized", name));
        }
        self.connections.push(name.to_string());
        Ok(())
    }

    fn cleanup(&mut self) {
        self.connections.clear();
        self.initialized = false;
    }
}

#[derive(Debug, Default)]
struct UserGenerator {
    next_id: u32,
}

impl UserGenerator {
    fn generate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn reset(&mut self) {
        self.next_id = 0;
    }
}

#[derive(Debug, Default)]
struct Cache(Vec<(String, String)>);

impl Cache {
    fn set(&mut self, key: &str, value: &str) {
        self.0.retain(|(k, _)| k != key);
        self.0.push((key.to_string(), value.to_string()));
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

fn add(a: i64, b: i64) -> i64 {
    a + b
}

fn divide(a: i64, b: i64) -> Result<i64, String> {
    if b == 0 {
        return Err("division by zero".to_string());
    }
    Ok(a / b)
}

// =============================================================================
// TREES
// =============================================================================

fn hooks_tree() -> Result<SuiteTree, StructuralError> {
    let mut tree = SuiteTree::new("");
    let root = tree.root();
    isolation_suite(&mut tree, root)?;
    shared_log_suite(&mut tree, root)?;
    database_suite(&mut tree, root)?;
    generator_suite(&mut tree, root)?;
    Ok(tree)
}

/// Case setup resets the counter, so every case starts from a clean slate.
fn isolation_suite(tree: &mut SuiteTree, parent: SuiteId) -> Result<(), StructuralError> {
    let math = tree.add_suite(parent, "Math")?;
    tree.add_named_hook(math, HookKind::CaseSetup, "reset counter", |ctx: &mut Context<'_>| {
        ctx.set(Counter(0));
        ctx.with::<Counter, _>(|c| {
            c.0 += 1;
            Outcome::Pass
        })
    })?;
    tree.add_case(math, "add(2, 3) returns 5", |ctx: &mut Context<'_>| {
        ctx.with::<Counter, _>(|c| Outcome::expect_eq(c.0, 1))
            .and(Outcome::expect_eq(add(2, 3), 5))
    })?;
    tree.add_case(math, "counter is fresh for the next case", |ctx: &mut Context<'_>| {
        ctx.with::<Counter, _>(|c| Outcome::expect_eq(c.0, 1))
    })?;
    Ok(())
}

/// Suite setup runs once while case setup runs per case: the log ends as S, C, C.
fn shared_log_suite(tree: &mut SuiteTree, parent: SuiteId) -> Result<(), StructuralError> {
    let suite = tree.add_suite(parent, "Shared log")?;
    tree.add_hook(suite, HookKind::SuiteSetup, |ctx: &mut Context<'_>| {
        ctx.set(EventLog(vec!["S"]));
        Outcome::Pass
    })?;
    tree.add_hook(suite, HookKind::CaseSetup, |ctx: &mut Context<'_>| {
        ctx.with::<EventLog, _>(|log| {
            log.0.push("C");
            Outcome::Pass
        })
    })?;
    tree.add_case(suite, "first case sees one setup", |ctx: &mut Context<'_>| {
        ctx.with::<EventLog, _>(|log| Outcome::expect_eq(log.0.clone(), vec!["S", "C"]))
    })?;
    tree.add_case(suite, "second case sees two", |ctx: &mut Context<'_>| {
        ctx.with::<EventLog, _>(|log| Outcome::expect_eq(log.0.clone(), vec!["S", "C", "C"]))
    })?;
    // Cases may be filtered out, so only the once-per-suite entry is checked here.
    tree.add_hook(suite, HookKind::SuiteTeardown, |ctx: &mut Context<'_>| {
        ctx.with::<EventLog, _>(|log| {
            Outcome::expect_eq(log.0.iter().filter(|entry| **entry == "S").count(), 1)
        })
    })?;
    Ok(())
}

/// An expensive resource initialized once and shared by every case.
fn database_suite(tree: &mut SuiteTree, parent: SuiteId) -> Result<(), StructuralError> {
    let suite = tree.add_suite(parent, "Database manager")?;
    tree.add_named_hook(suite, HookKind::SuiteSetup, "initialize", |ctx: &mut Context<'_>| {
        let mut db = DatabaseManager::default();
        db.initialize();
        ctx.set(db);
        Outcome::Pass
    })?;
    tree.add_named_hook(suite, HookKind::SuiteTeardown, "cleanup", |ctx: &mut Context<'_>| {
        ctx.with::<DatabaseManager, _>(|db| {
            db.cleanup();
            Outcome::ensure(!db.initialized, "database still initialized after cleanup")
        })
    })?;
    tree.add_case(suite, "creates connections", |ctx: &mut Context<'_>| {
        ctx.with::<DatabaseManager, _>(|db| {
            Outcome::from(db.connect("conn1").and_then(|_| db.connect("conn2")))
                .and(Outcome::expect_eq(db.connections.len(), 2))
        })
    })?;
    tree.add_case(
        suite,
        "keeps connections from the previous case",
        |ctx: &mut Context<'_>| {
            ctx.with::<DatabaseManager, _>(|db| {
                Outcome::expect_eq(db.connections.len(), 2)
                    .and(Outcome::expect_eq(db.init_count, 1))
            })
        },
    )?;
    Ok(())
}

/// Shared resources created once, reset before each case, at two nesting levels.
fn generator_suite(tree: &mut SuiteTree, parent: SuiteId) -> Result<(), StructuralError> {
    let suite = tree.add_suite(parent, "User generator")?;
    tree.add_hook(suite, HookKind::SuiteSetup, |ctx: &mut Context<'_>| {
        ctx.set(UserGenerator::default());
        ctx.set(Cache::default());
        Outcome::Pass
    })?;
    tree.add_named_hook(suite, HookKind::CaseSetup, "reset", |ctx: &mut Context<'_>| {
        ctx.with::<UserGenerator, _>(|g| {
            g.reset();
            Outcome::Pass
        })
        .and(ctx.with::<Cache, _>(|c| {
            c.clear();
            Outcome::Pass
        }))
    })?;
    tree.add_case(suite, "generates user 1", |ctx: &mut Context<'_>| {
        ctx.with::<UserGenerator, _>(|g| Outcome::expect_eq(g.generate(), 1))
    })?;
    tree.add_case(suite, "generates user 1 again", |ctx: &mut Context<'_>| {
        ctx.with::<UserGenerator, _>(|g| Outcome::expect_eq(g.generate(), 1))
    })?;

    let cached = tree.add_suite(suite, "with a warm cache")?;
    tree.add_named_hook(cached, HookKind::CaseSetup, "warm", |ctx: &mut Context<'_>| {
        ctx.with::<Cache, _>(|c| {
            c.set("greeting", "hello");
            Outcome::Pass
        })
    })?;
    tree.add_named_hook(cached, HookKind::CaseTeardown, "evict", |ctx: &mut Context<'_>| {
        ctx.with::<Cache, _>(|c| {
            c.clear();
            Outcome::Pass
        })
    })?;
    tree.add_case(cached, "holds exactly one entry", |ctx: &mut Context<'_>| {
        ctx.with::<Cache, _>(|c| Outcome::expect_eq(c.0.len(), 1))
    })?;
    tree.add_case(cached, "still holds exactly one entry", |ctx: &mut Context<'_>| {
        ctx.with::<Cache, _>(|c| {
            c.set("greeting", "hi");
            Outcome::expect_eq(c.0.len(), 1)
        })
    })?;
    Ok(())
}

fn failures_tree() -> Result<SuiteTree, StructuralError> {
    let mut tree = SuiteTree::new("");
    let root = tree.root();

    let broken = tree.add_suite(root, "Unreachable database")?;
    tree.add_named_hook(broken, HookKind::SuiteSetup, "connect", |_: &mut Context<'_>| {
        Outcome::error("connection refused")
    })?;
    tree.add_named_hook(broken, HookKind::SuiteTeardown, "disconnect", |_: &mut Context<'_>| {
        Outcome::Pass
    })?;
    tree.add_case(broken, "never runs", |_: &mut Context<'_>| Outcome::Pass)?;
    let nested = tree.add_suite(broken, "nested queries")?;
    tree.add_case(nested, "never runs either", |_: &mut Context<'_>| Outcome::Pass)?;

    let flaky = tree.add_suite(root, "Flaky setup")?;
    tree.add_named_hook(flaky, HookKind::CaseSetup, "seed data", |ctx: &mut Context<'_>| {
        let first = ctx.case_name() == Some("first");
        Outcome::ensure(!first, "seed file is locked")
    })?;
    tree.add_named_hook(flaky, HookKind::CaseTeardown, "drop data", |_: &mut Context<'_>| {
        Outcome::Pass
    })?;
    tree.add_case(flaky, "first", |_: &mut Context<'_>| Outcome::Pass)?;
    tree.add_case(flaky, "second", |_: &mut Context<'_>| Outcome::Pass)?;

    let arithmetic = tree.add_suite(root, "Arithmetic")?;
    tree.add_case(arithmetic, "add(2, 2) returns 5", |_: &mut Context<'_>| {
        Outcome::expect_eq(add(2, 2), 5)
    })?;
    tree.add_case(arithmetic, "divide(1, 0) returns 0", |_: &mut Context<'_>| {
        divide(1, 0).map_or_else(Outcome::error, |q| Outcome::expect_eq(q, 0))
    })?;
    tree.add_case(arithmetic, "still runs after its siblings failed", |_: &mut Context<'_>| {
        Outcome::expect_eq(add(-1, 3), 2)
    })?;
    Ok(tree)
}
