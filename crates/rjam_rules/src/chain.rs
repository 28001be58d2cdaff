//! Append-only chains of targets and actions.

use crate::ids::{RuleId, TargetId};

/// An append-only ordered chain with O(1) append at the tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain<T> {
    items: Vec<T>,
}

impl<T> Chain<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append `item` at the tail and return the chain.
    #[must_use]
    pub fn append(mut self, item: T) -> Self {
        self.items.push(item);
        self
    }

    /// Append `item` at the tail in place.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn head(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn tail(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a Chain<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Dependency or build-order list of targets.
pub type TargetChain = Chain<TargetId>;

/// One invocation of a rule's actions on a set of targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub rule: RuleId,
    pub targets: TargetChain,
    pub sources: TargetChain,
}

impl Action {
    pub fn new(rule: RuleId, targets: TargetChain, sources: TargetChain) -> Self {
        Self {
            rule,
            targets,
            sources,
        }
    }
}

/// The actions queued against a target.
pub type ActionChain = Chain<Action>;
