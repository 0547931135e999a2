//! Ordered, mutation-resilient collection of pipeline steps
//!
//! Steps live in an arena of doubly-linked nodes with an identity index, so
//! "insert after X" is O(1) and a cursor that only remembers a node index keeps
//! working while the collection grows underneath it.

use crate::core::step::{step_key, StepRef};
use std::collections::HashMap;
use thiserror::Error;

/// Validation errors raised by the steps collection
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepsError {
    #[error("Step '{0}' is not part of the pipeline")]
    PredecessorNotFound(String),

    #[error("Step '{0}' was already added to the pipeline")]
    DuplicateStep(String),

    #[error("Enumeration has not started; call move_next first")]
    EnumerationNotStarted,

    #[error("Cursor position {0} does not belong to this collection")]
    CursorOutOfRange(usize),
}

#[derive(Clone)]
struct Node {
    step: StepRef,
    prev: Option<usize>,
    next: Option<usize>,
    removed: bool,
}

/// An ordered sequence of steps supporting insertion during enumeration
#[derive(Clone, Default)]
pub struct StepsCollection {
    nodes: Vec<Node>,
    index: HashMap<usize, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl StepsCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, step: &StepRef) -> bool {
        self.index.contains_key(&step_key(step))
    }

    /// Append a step at the tail
    pub fn add(&mut self, step: StepRef) -> Result<(), StepsError> {
        self.ensure_absent(&step)?;
        self.link_after(self.tail, step);
        Ok(())
    }

    /// Append all steps at the tail.
    ///
    /// Every step is validated before any is added, so a failure leaves the
    /// collection untouched.
    pub fn add_range(&mut self, steps: Vec<StepRef>) -> Result<(), StepsError> {
        self.ensure_all_absent(&steps)?;
        for step in steps {
            self.link_after(self.tail, step);
        }
        Ok(())
    }

    /// Insert `step` immediately after `predecessor`
    pub fn insert(&mut self, predecessor: &StepRef, step: StepRef) -> Result<(), StepsError> {
        self.insert_range(predecessor, vec![step])
    }

    /// Insert `steps`, in order, immediately after `predecessor`
    pub fn insert_range(
        &mut self,
        predecessor: &StepRef,
        steps: Vec<StepRef>,
    ) -> Result<(), StepsError> {
        let mut anchor = *self
            .index
            .get(&step_key(predecessor))
            .ok_or_else(|| StepsError::PredecessorNotFound(predecessor.name()))?;
        self.ensure_all_absent(&steps)?;

        for step in steps {
            anchor = self.link_after(Some(anchor), step);
        }
        Ok(())
    }

    /// Unlink a step. Returns whether it was present.
    ///
    /// The removed node keeps its forward link so a cursor parked on it can
    /// still advance.
    pub fn remove(&mut self, step: &StepRef) -> bool {
        let Some(position) = self.index.remove(&step_key(step)) else {
            return false;
        };

        let (prev, next) = {
            let node = &mut self.nodes[position];
            node.removed = true;
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }

        self.len -= 1;
        true
    }

    /// Borrowing iterator over the current contents
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            collection: self,
            next: self.head,
        }
    }

    /// A detached cursor positioned before the first step
    pub fn cursor(&self) -> StepsCursor {
        StepsCursor::default()
    }

    fn ensure_absent(&self, step: &StepRef) -> Result<(), StepsError> {
        if self.contains(step) {
            return Err(StepsError::DuplicateStep(step.name()));
        }
        Ok(())
    }

    fn ensure_all_absent(&self, steps: &[StepRef]) -> Result<(), StepsError> {
        let mut seen = std::collections::HashSet::new();
        for step in steps {
            self.ensure_absent(step)?;
            if !seen.insert(step_key(step)) {
                return Err(StepsError::DuplicateStep(step.name()));
            }
        }
        Ok(())
    }

    /// Link a new node after `anchor` (or at the head when `None` and the
    /// collection is empty) and return its position
    fn link_after(&mut self, anchor: Option<usize>, step: StepRef) -> usize {
        let position = self.nodes.len();
        let key = step_key(&step);

        let next = match anchor {
            Some(anchor) => self.nodes[anchor].next,
            None => self.head,
        };

        self.nodes.push(Node {
            step,
            prev: anchor,
            next,
            removed: false,
        });

        match anchor {
            Some(anchor) => self.nodes[anchor].next = Some(position),
            None => self.head = Some(position),
        }
        match next {
            Some(next) => self.nodes[next].prev = Some(position),
            None => self.tail = Some(position),
        }

        self.index.insert(key, position);
        self.len += 1;
        position
    }

    fn first_live_from(&self, mut position: Option<usize>) -> Option<usize> {
        while let Some(current) = position {
            if !self.nodes[current].removed {
                return Some(current);
            }
            position = self.nodes[current].next;
        }
        None
    }
}

impl std::fmt::Debug for StepsCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|step| step.name()))
            .finish()
    }
}

impl<'a> IntoIterator for &'a StepsCollection {
    type Item = &'a StepRef;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing iterator over a steps collection
pub struct Iter<'a> {
    collection: &'a StepsCollection,
    next: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a StepRef;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.collection.first_live_from(self.next)?;
        let node = &self.collection.nodes[position];
        self.next = node.next;
        Some(&node.step)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum CursorState {
    #[default]
    BeforeStart,
    At(usize),
}

/// Forward-only cursor that tolerates mutation of the collection between moves.
///
/// The cursor stores only a node position, so it never holds a borrow of the
/// collection. Once it reaches the tail it stays parked on the last step and
/// picks up anything appended later.
#[derive(Debug, Clone, Default)]
pub struct StepsCursor {
    state: CursorState,
}

impl StepsCursor {
    /// Advance to the next step. Returns `false` when no step follows.
    pub fn move_next(&mut self, collection: &StepsCollection) -> bool {
        let candidate = match self.state {
            CursorState::BeforeStart => collection.head,
            CursorState::At(position) => match collection.nodes.get(position) {
                Some(node) => node.next,
                None => return false,
            },
        };

        match collection.first_live_from(candidate) {
            Some(position) => {
                self.state = CursorState::At(position);
                true
            }
            None => false,
        }
    }

    /// The step under the cursor
    pub fn current<'a>(&self, collection: &'a StepsCollection) -> Result<&'a StepRef, StepsError> {
        match self.state {
            CursorState::BeforeStart => Err(StepsError::EnumerationNotStarted),
            CursorState::At(position) => collection
                .nodes
                .get(position)
                .map(|node| &node.step)
                .ok_or(StepsError::CursorOutOfRange(position)),
        }
    }

    /// Rewind to before the first step
    pub fn reset(&mut self) {
        self.state = CursorState::BeforeStart;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::step::{same_step, PipelineHandle, Step};
    use crate::core::context::ApplicationContext;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Named(&'static str);

    #[async_trait]
    impl Step for Named {
        fn name(&self) -> String {
            self.0.to_string()
        }

        async fn execute(
            &self,
            _context: &mut ApplicationContext,
            _pipeline: &mut PipelineHandle<'_>,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn step(name: &'static str) -> StepRef {
        Arc::new(Named(name))
    }

    fn names(collection: &StepsCollection) -> Vec<String> {
        collection.iter().map(|s| s.name()).collect()
    }

    #[test]
    fn test_add_keeps_order() {
        let mut steps = StepsCollection::new();
        steps.add(step("a")).unwrap();
        steps.add_range(vec![step("b"), step("c")]).unwrap();

        assert_eq!(names(&steps), ["a", "b", "c"]);
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn test_insert_range_follows_predecessor_in_order() {
        let mut steps = StepsCollection::new();
        let a = step("a");
        steps.add_range(vec![a.clone(), step("d")]).unwrap();

        steps.insert_range(&a, vec![step("b"), step("c")]).unwrap();

        assert_eq!(names(&steps), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_insert_after_tail_updates_tail() {
        let mut steps = StepsCollection::new();
        let a = step("a");
        steps.add(a.clone()).unwrap();
        steps.insert(&a, step("b")).unwrap();
        steps.add(step("c")).unwrap();

        assert_eq!(names(&steps), ["a", "b", "c"]);
    }

    #[test]
    fn test_insert_after_unknown_predecessor_fails() {
        let mut steps = StepsCollection::new();
        steps.add(step("a")).unwrap();
        let stranger = step("stranger");

        let result = steps.insert(&stranger, step("b"));
        assert_eq!(
            result,
            Err(StepsError::PredecessorNotFound("stranger".to_string()))
        );
        assert_eq!(names(&steps), ["a"]);
    }

    #[test]
    fn test_same_step_cannot_be_added_twice() {
        let mut steps = StepsCollection::new();
        let a = step("a");
        steps.add(a.clone()).unwrap();

        assert!(matches!(steps.add(a.clone()), Err(StepsError::DuplicateStep(_))));
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_add_range_is_atomic() {
        let mut steps = StepsCollection::new();
        let a = step("a");
        steps.add(a.clone()).unwrap();

        let result = steps.add_range(vec![step("b"), a.clone()]);
        assert!(result.is_err());
        assert_eq!(names(&steps), ["a"]);
    }

    #[test]
    fn test_equal_looking_steps_are_distinct() {
        let mut steps = StepsCollection::new();
        let first = step("same");
        let second = step("same");
        steps.add_range(vec![first.clone(), second.clone()]).unwrap();

        assert!(!same_step(&first, &second));
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_cursor_current_before_first_move_fails() {
        let mut steps = StepsCollection::new();
        steps.add(step("a")).unwrap();
        let cursor = steps.cursor();

        assert!(matches!(
            cursor.current(&steps),
            Err(StepsError::EnumerationNotStarted)
        ));
    }

    #[test]
    fn test_cursor_from_larger_collection_does_not_panic() {
        let mut large = StepsCollection::new();
        large.add_range(vec![step("a"), step("b"), step("c")]).unwrap();
        let mut small = StepsCollection::new();
        small.add(step("x")).unwrap();

        let mut cursor = large.cursor();
        while cursor.move_next(&large) {}

        assert!(matches!(
            cursor.current(&small),
            Err(StepsError::CursorOutOfRange(2))
        ));
        assert!(!cursor.move_next(&small));
    }

    #[test]
    fn test_cursor_sees_insertions_after_current() {
        let mut steps = StepsCollection::new();
        let a = step("a");
        steps.add_range(vec![a.clone(), step("d")]).unwrap();

        let mut cursor = steps.cursor();
        let mut seen = Vec::new();

        assert!(cursor.move_next(&steps));
        seen.push(cursor.current(&steps).unwrap().name());

        // Mutate while the cursor sits on "a"
        let b = step("b");
        steps.insert(&a, b.clone()).unwrap();
        steps.insert(&b, step("c")).unwrap();
        steps.add(step("e")).unwrap();

        while cursor.move_next(&steps) {
            seen.push(cursor.current(&steps).unwrap().name());
        }

        assert_eq!(seen, ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_cursor_does_not_see_insertions_behind_it() {
        let mut steps = StepsCollection::new();
        let a = step("a");
        let b = step("b");
        steps.add_range(vec![a.clone(), b.clone()]).unwrap();

        let mut cursor = steps.cursor();
        cursor.move_next(&steps);
        cursor.move_next(&steps);
        steps.insert(&a, step("behind")).unwrap();

        assert!(!cursor.move_next(&steps));
        assert_eq!(cursor.current(&steps).unwrap().name(), "b");
    }

    #[test]
    fn test_parked_cursor_picks_up_appended_steps() {
        let mut steps = StepsCollection::new();
        let mut cursor = steps.cursor();
        assert!(!cursor.move_next(&steps));

        steps.add(step("late")).unwrap();
        assert!(cursor.move_next(&steps));
        assert_eq!(cursor.current(&steps).unwrap().name(), "late");

        assert!(!cursor.move_next(&steps));
        steps.add(step("later")).unwrap();
        assert!(cursor.move_next(&steps));
        assert_eq!(cursor.current(&steps).unwrap().name(), "later");
    }

    #[test]
    fn test_cursor_reset_restarts() {
        let mut steps = StepsCollection::new();
        steps.add_range(vec![step("a"), step("b")]).unwrap();

        let mut cursor = steps.cursor();
        while cursor.move_next(&steps) {}
        cursor.reset();

        assert!(cursor.current(&steps).is_err());
        assert!(cursor.move_next(&steps));
        assert_eq!(cursor.current(&steps).unwrap().name(), "a");
    }

    #[test]
    fn test_remove_under_cursor_keeps_forward_progress() {
        let mut steps = StepsCollection::new();
        let a = step("a");
        let b = step("b");
        steps.add_range(vec![a.clone(), b.clone(), step("c")]).unwrap();

        let mut cursor = steps.cursor();
        cursor.move_next(&steps);
        cursor.move_next(&steps);
        assert!(steps.remove(&b));
        assert!(!steps.remove(&b));

        assert!(cursor.move_next(&steps));
        assert_eq!(cursor.current(&steps).unwrap().name(), "c");
        assert_eq!(names(&steps), ["a", "c"]);
        assert!(steps.insert(&b, step("x")).is_err());
    }

    #[test]
    fn test_iter_is_restartable() {
        let mut steps = StepsCollection::new();
        steps.add_range(vec![step("a"), step("b")]).unwrap();

        assert_eq!(steps.iter().count(), 2);
        assert_eq!(steps.iter().count(), 2);
        assert_eq!((&steps).into_iter().next().unwrap().name(), "a");
    }
}
