//! Fixture state shared between a suite's hooks and its descendants.
//!
//! Every suite owns one [`Fixtures`] map for the duration of its run. The map
//! is created empty when the suite is entered and dropped after its
//! suite-teardown hooks have run. Units see the maps of the suite they are
//! bound to and of every enclosing suite through a [`Context`].

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::outcome::Outcome;

/// A type-indexed map holding at most one value per Rust type.
#[derive(Default)]
pub struct Fixtures {
    values: HashMap<TypeId, Box<dyn Any>>,
}

impl Fixtures {
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.values
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Fixtures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixtures")
            .field("len", &self.values.len())
            .finish()
    }
}

/// Handle passed to every hook and case body.
///
/// `frames` runs from the root suite to the suite that owns the running unit;
/// the last frame is the owner.
pub struct Context<'a> {
    frames: &'a mut [Fixtures],
    title: &'a str,
    case: Option<&'a str>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(frames: &'a mut [Fixtures], title: &'a str, case: Option<&'a str>) -> Self {
        debug_assert!(!frames.is_empty(), "a unit always has an owning suite");
        Self {
            frames,
            title,
            case,
        }
    }

    /// Title of the running hook or case.
    pub fn title(&self) -> &str {
        self.title
    }

    /// Name of the case this unit runs for; `None` for suite-level hooks.
    pub fn case_name(&self) -> Option<&str> {
        self.case
    }

    /// Depth of the owning suite; the root suite is 0.
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// Stores `value` in the owning suite's fixtures, returning any previous value of that type.
    pub fn set<T: 'static>(&mut self, value: T) -> Option<T> {
        self.frames.last_mut().and_then(|owner| owner.insert(value))
    }

    /// Nearest value of type `T`, searching from the owning suite out to the root.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.frames.iter().rev().find_map(|frame| frame.get::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.get_mut::<T>())
    }

    /// Removes the nearest value of type `T`.
    pub fn take<T: 'static>(&mut self) -> Option<T> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.remove::<T>())
    }

    /// Runs `f` against the nearest `T`, or errors when no enclosing suite provides one.
    pub fn with<T, F>(&mut self, f: F) -> Outcome
    where
        T: 'static,
        F: FnOnce(&mut T) -> Outcome,
    {
        match self.get_mut::<T>() {
            Some(value) => f(value),
            None => Outcome::error(format!("fixture `{}` is not available", type_name::<T>())),
        }
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("title", &self.title)
            .field("case", &self.case)
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);

    #[test]
    fn set_writes_to_the_owning_frame() {
        let mut frames = vec![Fixtures::default(), Fixtures::default()];
        {
            let mut ctx = Context::new(&mut frames, "\"before all\" hook", None);
            assert_eq!(ctx.set(Counter(1)), None);
            assert_eq!(ctx.set(Counter(2)), Some(Counter(1)));
        }
        assert!(frames[0].is_empty());
        assert_eq!(frames[1].get::<Counter>(), Some(&Counter(2)));
    }

    #[test]
    fn lookups_prefer_the_nearest_frame() {
        let mut outer = Fixtures::default();
        outer.insert(Counter(1));
        outer.insert("outer only");
        let mut inner = Fixtures::default();
        inner.insert(Counter(10));
        let mut frames = vec![outer, inner];

        let mut ctx = Context::new(&mut frames, "case", Some("case"));
        assert_eq!(ctx.get::<Counter>(), Some(&Counter(10)));
        assert_eq!(ctx.get::<&str>(), Some(&"outer only"));
        assert_eq!(ctx.take::<Counter>(), Some(Counter(10)));
        assert_eq!(ctx.get::<Counter>(), Some(&Counter(1)));
    }

    #[test]
    fn with_reports_missing_fixtures() {
        let mut frames = vec![Fixtures::default()];
        let mut ctx = Context::new(&mut frames, "case", Some("case"));
        let outcome = ctx.with::<Counter, _>(|c| Outcome::expect_eq(c.0, 0));
        assert!(matches!(outcome, Outcome::Error { .. }));

        ctx.set(Counter(0));
        let outcome = ctx.with::<Counter, _>(|c| {
            c.0 += 1;
            Outcome::expect_eq(c.0, 1)
        });
        assert_eq!(outcome, Outcome::Pass);
    }
}
