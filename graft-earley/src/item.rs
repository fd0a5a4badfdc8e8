//! Earley items: a rule, a cursor into its body, and the grammar the
//! match runs under.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::local_prelude::*;

/// The set of items whose next expected symbol is a predicted item's
/// head, used to route completions back to their predictors.
///
/// This is the live `expecting` index of the column where the prediction
/// happened: predictions made later in the same column hook onto the same
/// list, and a completion arriving from a later column reads the final
/// contents. Parent sets are compared by identity — two columns can hold
/// structurally equal expectation lists that must not be confused.
pub type ParentSet<V> = Rc<RefCell<Vec<Rc<Item<V>>>>>;

/// A dotted rule: `(grammar, rule, origin, parents, progress, values)`.
///
/// `values` holds the outputs of the *selected* positions among the first
/// `progress` body symbols, in body order. The grammar is the one in
/// force for the remainder of this rule; constructing an item applies
/// every graft registered in the slot just before `progress`, so holders
/// never observe a half-transformed grammar.
pub struct Item<V> {
    grammar: Grammar<V>,
    rule: Rule<V>,
    origin: usize,
    parents: Option<ParentSet<V>>,
    progress: usize,
    values: Vec<V>,
}

impl<V: ParseValue> Item<V> {
    /// Creates an item at progress 0, as produced by prediction (or
    /// seeding, when `parents` is `None`).
    pub fn predict(
        grammar: Grammar<V>,
        rule: Rule<V>,
        origin: usize,
        parents: Option<ParentSet<V>>,
    ) -> Result<Self, Error<V>> {
        Self::construct(grammar, rule, origin, parents, 0, Vec::new())
    }

    /// Advances past one body position with the value it matched and the
    /// grammar to carry forward: the item's own grammar after a scan or a
    /// nullable shortcut, the completion's grammar after a completion.
    pub fn advance(&self, value: V, grammar: Grammar<V>) -> Result<Self, Error<V>> {
        let mut values = self.values.clone();
        self.rule.consume(self.progress, &mut values, value);
        Self::construct(
            grammar,
            self.rule.clone(),
            self.origin,
            self.parents.clone(),
            self.progress + 1,
            values,
        )
    }

    fn construct(
        mut grammar: Grammar<V>,
        rule: Rule<V>,
        origin: usize,
        parents: Option<ParentSet<V>>,
        progress: usize,
        values: Vec<V>,
    ) -> Result<Self, Error<V>> {
        for transform in rule.transforms(progress) {
            grammar = (**transform)(&grammar, &values);
        }
        if !grammar.contains_rule(&rule) {
            return Err(Error::RetractedRule {
                head: rule.head().clone(),
                body: rule.body().to_vec(),
            });
        }
        Ok(Item {
            grammar,
            rule,
            origin,
            parents,
            progress,
            values,
        })
    }

    /// The grammar in force for this item.
    pub fn grammar(&self) -> &Grammar<V> {
        &self.grammar
    }

    /// The rule being matched.
    pub fn rule(&self) -> &Rule<V> {
        &self.rule
    }

    /// The column where this item started.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// The parent set this item's completion feeds, or `None` for seeded
    /// top-level items.
    pub fn parents(&self) -> Option<&ParentSet<V>> {
        self.parents.as_ref()
    }

    /// How many body positions have matched.
    pub fn progress(&self) -> usize {
        self.progress
    }

    /// Whether the whole body has matched.
    pub fn is_complete(&self) -> bool {
        self.progress == self.rule.len()
    }

    /// The next symbol this item is waiting for, or `None` when complete.
    pub fn expected(&self) -> Option<&Symbol> {
        self.rule.body().get(self.progress)
    }

    /// The rule's result. Only meaningful on complete items.
    pub fn finish(&self) -> V {
        debug_assert!(self.is_complete());
        self.rule.finish(self.values.clone())
    }

    pub(crate) fn dedup_key(&self) -> ItemKey {
        ItemKey {
            grammar: self.grammar.fingerprint(),
            rule: self.rule.fingerprint(),
            origin: self.origin,
            progress: self.progress,
            parents: self
                .parents
                .as_ref()
                .map_or(0, |parents| Rc::as_ptr(parents) as usize),
        }
    }
}

impl<V: ParseValue> PartialEq for Item<V> {
    /// Items are equal by value, except that parent sets are compared by
    /// identity.
    fn eq(&self, other: &Self) -> bool {
        self.progress == other.progress
            && self.origin == other.origin
            && self.rule == other.rule
            && match (&self.parents, &other.parents) {
                (None, None) => true,
                (Some(left), Some(right)) => Rc::ptr_eq(left, right),
                _ => false,
            }
            && self.values == other.values
            && self.grammar == other.grammar
    }
}

impl<V: ParseValue> Eq for Item<V> {}

impl<V: fmt::Debug> fmt::Debug for Item<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Item({:?} @ {} from {}, values {:?})",
            self.rule, self.progress, self.origin, self.values
        )
    }
}

/// Hashable part of an item's identity. Values and the full grammar are
/// left out; the column compares them inside the bucket.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct ItemKey {
    grammar: u64,
    rule: u64,
    origin: usize,
    progress: usize,
    parents: usize,
}
