//! Per-node storage of mutually non-dominated labels.
//!
//! Labels live in a `typed_arena::Arena` for the duration of one directional
//! search. The arena reference is the label's identity: the priority queue and
//! the frontier hold the same `&StoredLabel`, and eviction from a frontier is
//! signalled to the queue through the `was_dominated` flag instead of a search
//! through the heap.

use std::cell::Cell;

use typed_arena::Arena;

use crate::label::{CycleRule, Direction, Label};

/// Label as stored during a search.
#[derive(Debug)]
pub struct StoredLabel {
    label: Label,
    seq: u64,
    was_dominated: Cell<bool>,
}

impl StoredLabel {
    pub fn new(label: Label, seq: u64) -> Self {
        Self {
            label,
            seq,
            was_dominated: Cell::new(false),
        }
    }

    #[must_use]
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Arrival order, used as deterministic tie-break
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Evicted from its frontier after being queued
    #[must_use]
    pub fn is_dominated(&self) -> bool {
        self.was_dominated.get()
    }
}

/// The pruning relation a frontier enforces.
///
/// Under a cycle rule a label only prunes another if every continuation of
/// the other is still open to it, otherwise the pruned label might have been
/// the only one able to continue.
#[derive(Clone, Copy, Debug)]
pub struct DominanceRule {
    pub direction: Direction,
    pub cycles: CycleRule,
}

impl DominanceRule {
    #[must_use]
    pub fn dominates(&self, a: &Label, b: &Label) -> bool {
        a.dominates(b, self.direction) && self.cycles.leaves_open(a, b)
    }

    /// `candidate` repeats the state of `existing` and can go nowhere `existing` cannot
    #[must_use]
    pub fn duplicates(&self, existing: &Label, candidate: &Label) -> bool {
        existing.cost() == candidate.cost()
            && existing.state_key() == candidate.state_key()
            && self.cycles.leaves_open(existing, candidate)
    }
}

/// Result of [`Frontier::insert`]
#[derive(Debug)]
pub enum Insertion<'a> {
    /// Dominated by a member, or a duplicate of one.
    Rejected,
    /// Stored; `evicted` members were dominated by it and removed.
    Stored { label: &'a StoredLabel, evicted: usize },
}

/// Non-dominated labels at one node, sorted by ascending cost.
/// Equal-cost labels keep their insertion order.
#[derive(Debug, Default)]
pub struct Frontier<'a> {
    labels: Vec<&'a StoredLabel>,
}

impl<'a> Frontier<'a> {
    pub fn new() -> Self {
        Self { labels: Vec::new() }
    }

    /// Inserts `candidate` unless a member dominates it or shares its state key,
    /// evicting every member it dominates.
    ///
    /// The storage is sorted by cost and stays sorted:
    /// - only cheaper members can dominate the candidate, so the scan for
    ///   that stops at the first more expensive member
    /// - the candidate goes after all members that are not more expensive
    /// - only more expensive members can be dominated by the candidate
    pub fn insert(
        &mut self,
        arena: &'a Arena<StoredLabel>,
        candidate: Label,
        seq: u64,
        rule: DominanceRule,
    ) -> Insertion<'a> {
        // phase one: is the candidate itself dominated?
        let mut i = 0;
        while i < self.labels.len() {
            let existing = &self.labels[i].label;
            if existing.cost() > candidate.cost() {
                break;
            }
            if rule.dominates(existing, &candidate) {
                return Insertion::Rejected;
            }
            // first inserted wins on a full tie
            if rule.duplicates(existing, &candidate) {
                return Insertion::Rejected;
            }
            i += 1;
        }

        let added: &'a StoredLabel = arena.alloc(StoredLabel::new(candidate, seq));

        // phase two: drop the more expensive members the candidate dominates
        let tail = self.labels.split_off(i);
        self.labels.push(added);
        let mut evicted = 0;
        for existing in tail {
            if rule.dominates(&added.label, &existing.label) {
                existing.was_dominated.set(true);
                evicted += 1;
            } else {
                self.labels.push(existing);
            }
        }

        Insertion::Stored { label: added, evicted }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Label> + '_ {
        self.labels.iter().copied().map(StoredLabel::label)
    }

    /// Owned copies of the members, cheapest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<Label> {
        self.iter().cloned().collect()
    }
}
