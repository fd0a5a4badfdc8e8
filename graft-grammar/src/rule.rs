//! Grammar rules: head, body, selector mask, graft slots and fold.

use std::fmt;
use std::hash::Hasher;
use std::rc::Rc;

use bit_vec::BitVec;
use fnv::FnvHasher;

use crate::grammar::Grammar;
use crate::value::ParseValue;
use graft_symbol::Symbol;

/// Folds the selected values of a completed rule into a single result.
pub type Fold<V> = Rc<dyn Fn(Vec<V>) -> V>;

/// A mid-rule grammar transform.
///
/// Receives the grammar currently in force and the selected values matched
/// so far, and returns the grammar under which the remainder of the rule
/// (and anything predicted afterwards) parses. Must be pure for parses to
/// be deterministic.
pub type Transform<V> = Rc<dyn Fn(&Grammar<V>, &[V]) -> Grammar<V>>;

/// One element of a rule body as written by the grammar author.
///
/// `Keep` and `Skip` occupy a body position; `Graft` occupies none and is
/// collected into the slot between the surrounding positions.
pub enum BodyElement<V> {
    /// A symbol whose matched value contributes to the rule's output.
    Keep(Symbol),
    /// A symbol consumed for recognition only.
    Skip(Symbol),
    /// A transform to run once every element before it has matched.
    Graft(Transform<V>),
}

/// Marks a body symbol as selected.
pub fn keep<V>(symbol: impl Into<Symbol>) -> BodyElement<V> {
    BodyElement::Keep(symbol.into())
}

/// Marks a body symbol as suppressed.
pub fn skip<V>(symbol: impl Into<Symbol>) -> BodyElement<V> {
    BodyElement::Skip(symbol.into())
}

/// Registers a mid-rule transform at the current slot.
pub fn graft<V: 'static>(
    transform: impl Fn(&Grammar<V>, &[V]) -> Grammar<V> + 'static,
) -> BodyElement<V> {
    BodyElement::Graft(Rc::new(transform))
}

struct RuleInner<V> {
    head: Symbol,
    body: Rc<[Symbol]>,
    /// One bit per body position; set means the position is selected.
    selector: BitVec,
    /// `body.len() + 1` slots; slot `k` runs after position `k - 1` has
    /// matched and before position `k` is attempted.
    transforms: Vec<Vec<Transform<V>>>,
    fold: Option<Fold<V>>,
    /// Hash of `(head, body)`, the rule's identity.
    fingerprint: u64,
}

/// A single grammar rule.
///
/// Two rules are the same rule exactly when their heads and bodies are
/// equal; the selector, grafts and fold are carried along but do not
/// participate in identity. Cloning shares the underlying storage.
pub struct Rule<V> {
    inner: Rc<RuleInner<V>>,
}

impl<V> Clone for Rule<V> {
    fn clone(&self) -> Self {
        Rule {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V> Rule<V> {
    pub(crate) fn from_elements(
        head: Symbol,
        elements: impl IntoIterator<Item = BodyElement<V>>,
        fold: Option<Fold<V>>,
    ) -> Self {
        let mut body = Vec::new();
        let mut selector = BitVec::new();
        let mut transforms = vec![Vec::new()];
        for element in elements {
            match element {
                BodyElement::Keep(symbol) => {
                    body.push(symbol);
                    selector.push(true);
                    transforms.push(Vec::new());
                }
                BodyElement::Skip(symbol) => {
                    body.push(symbol);
                    selector.push(false);
                    transforms.push(Vec::new());
                }
                BodyElement::Graft(transform) => {
                    let slot = transforms
                        .last_mut()
                        .expect("transform slots start non-empty");
                    slot.push(transform);
                }
            }
        }
        let body: Rc<[Symbol]> = body.into();
        let fingerprint = fingerprint(&head, &body);
        Rule {
            inner: Rc::new(RuleInner {
                head,
                body,
                selector,
                transforms,
                fold,
                fingerprint,
            }),
        }
    }

    /// The rule's head symbol.
    pub fn head(&self) -> &Symbol {
        &self.inner.head
    }

    /// The rule's body symbols, grafts excluded.
    pub fn body(&self) -> &Rc<[Symbol]> {
        &self.inner.body
    }

    /// The number of body positions.
    pub fn len(&self) -> usize {
        self.inner.body.len()
    }

    /// Whether this is an ε-rule.
    pub fn is_empty(&self) -> bool {
        self.inner.body.is_empty()
    }

    /// Whether the value matched at `position` contributes to the output.
    pub fn is_selected(&self, position: usize) -> bool {
        self.inner.selector.get(position).unwrap_or(false)
    }

    /// The transforms registered in the given inter-position slot.
    pub fn transforms(&self, slot: usize) -> &[Transform<V>] {
        self.inner
            .transforms
            .get(slot)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Hash of the rule's identity, `(head, body)`.
    pub fn fingerprint(&self) -> u64 {
        self.inner.fingerprint
    }

    /// Whether this rule has the given identity.
    pub fn matches(&self, head: &Symbol, body: &[Symbol]) -> bool {
        self.inner.head == *head && *self.inner.body == *body
    }

    /// Appends `value` to the accumulated values if the position that just
    /// matched was selected.
    pub fn consume(&self, position: usize, values: &mut Vec<V>, value: V) {
        if self.is_selected(position) {
            values.push(value);
        }
    }
}

impl<V: ParseValue> Rule<V> {
    /// Produces the rule's result from its selected values, in body order:
    /// the fold's output when a fold is present, the value tuple otherwise.
    pub fn finish(&self, values: Vec<V>) -> V {
        match &self.inner.fold {
            Some(fold) => (**fold)(values),
            None => V::sequence(values),
        }
    }
}

impl<V> PartialEq for Rule<V> {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        self.inner.fingerprint == other.inner.fingerprint
            && self.inner.head == other.inner.head
            && self.inner.body == other.inner.body
    }
}

impl<V> Eq for Rule<V> {}

impl<V> fmt::Debug for Rule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ::=", self.inner.head)?;
        if self.inner.body.is_empty() {
            write!(f, " ()")?;
        }
        for (position, symbol) in self.inner.body.iter().enumerate() {
            if self.is_selected(position) {
                write!(f, " {}", symbol)?;
            } else {
                write!(f, " ~{}", symbol)?;
            }
        }
        Ok(())
    }
}

fn fingerprint(head: &Symbol, body: &[Symbol]) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(head.as_str().as_bytes());
    for symbol in body {
        hasher.write_u8(0);
        hasher.write(symbol.as_str().as_bytes());
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(elements: Vec<BodyElement<u32>>) -> Rule<u32> {
        Rule::from_elements(Symbol::new("r"), elements, None)
    }

    #[test]
    fn grafts_occupy_no_position() {
        let rule = rule(vec![
            keep("a"),
            graft(|grammar, _| grammar.clone()),
            skip("b"),
            graft(|grammar, _| grammar.clone()),
        ]);
        assert_eq!(rule.len(), 2);
        assert!(rule.is_selected(0));
        assert!(!rule.is_selected(1));
        assert_eq!(rule.transforms(0).len(), 0);
        assert_eq!(rule.transforms(1).len(), 1);
        assert_eq!(rule.transforms(2).len(), 1);
    }

    #[test]
    fn leading_grafts_land_in_slot_zero() {
        let rule = rule(vec![graft(|grammar, _| grammar.clone()), keep("a")]);
        assert_eq!(rule.transforms(0).len(), 1);
        assert_eq!(rule.transforms(1).len(), 0);
    }

    #[test]
    fn identity_ignores_selectors_and_folds() {
        let left = Rule::<u32>::from_elements(
            Symbol::new("r"),
            vec![keep("a"), skip("b")],
            None,
        );
        let fold: Fold<u32> = Rc::new(|_| 7);
        let right = Rule::<u32>::from_elements(
            Symbol::new("r"),
            vec![skip("a"), keep("b")],
            Some(fold),
        );
        assert_eq!(left, right);
        assert_eq!(left.fingerprint(), right.fingerprint());
    }

    #[test]
    fn consume_respects_the_selector() {
        let rule = rule(vec![keep("a"), skip("b"), keep("c")]);
        let mut values = Vec::new();
        rule.consume(0, &mut values, 1);
        rule.consume(1, &mut values, 2);
        rule.consume(2, &mut values, 3);
        assert_eq!(values, [1, 3]);
    }

    #[test]
    fn finish_without_a_fold_builds_the_sequence() {
        let rule = rule(vec![keep("a"), keep("b")]);
        assert_eq!(rule.finish(vec![1, 2]), 3);
    }
}
