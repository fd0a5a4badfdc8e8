//! The grammar type: a persistent mapping from head symbols to rules.

use std::cell::OnceCell;
use std::fmt;
use std::fmt::Write;
use std::rc::Rc;

use fnv::FnvHashSet;
use log::trace;
use rpds::HashTrieMap;

use crate::local_prelude::*;

/// An immutable-by-value grammar.
///
/// Every mutator returns a new grammar; the receiver stays valid, so any
/// parse state that still holds it keeps parsing against the rules it saw
/// when it was created. Rule storage is a persistent map, shared
/// structurally between the old and the new value, which makes `put` and
/// `drop` cheap enough to run from inside a parse.
///
/// A symbol is a non-terminal of a grammar iff the grammar holds at least
/// one rule headed by it; every other symbol is a terminal.
pub struct Grammar<V> {
    rules: HashTrieMap<Symbol, Rc<Vec<Rule<V>>>>,
    rule_count: usize,
    /// Order-independent XOR of rule fingerprints; equal grammars have
    /// equal shapes, so this doubles as a cheap hash and inequality test.
    shape: u64,
    /// Lazily computed set of non-terminals that derive ε.
    nullable: OnceCell<Rc<FnvHashSet<Symbol>>>,
}

impl<V> Clone for Grammar<V> {
    fn clone(&self) -> Self {
        Grammar {
            rules: self.rules.clone(),
            rule_count: self.rule_count,
            shape: self.shape,
            nullable: self.nullable.clone(),
        }
    }
}

impl<V> Default for Grammar<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Grammar<V> {
    /// Creates an empty grammar.
    pub fn new() -> Self {
        Grammar {
            rules: HashTrieMap::new(),
            rule_count: 0,
            shape: 0,
            nullable: OnceCell::new(),
        }
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rule_count
    }

    /// Checks whether the grammar has no rules.
    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }

    /// Returns an iterator over the rules headed by the given symbol, in
    /// the order they were first put.
    pub fn rules_for<'a>(&'a self, head: &Symbol) -> impl Iterator<Item = &'a Rule<V>>
    where
        V: 'a,
    {
        self.rules
            .get(head)
            .into_iter()
            .flat_map(|alternatives| alternatives.iter())
    }

    /// Looks up the rule with the given identity.
    pub fn rule(&self, head: &Symbol, body: &[Symbol]) -> Option<&Rule<V>> {
        self.rules
            .get(head)?
            .iter()
            .find(|rule| rule.matches(head, body))
    }

    /// Whether a rule with the given rule's identity is present.
    pub fn contains_rule(&self, rule: &Rule<V>) -> bool {
        self.rules
            .get(rule.head())
            .is_some_and(|alternatives| alternatives.iter().any(|candidate| candidate == rule))
    }

    /// Returns an iterator over the grammar's non-terminals.
    pub fn heads(&self) -> impl Iterator<Item = &Symbol> {
        self.rules.keys()
    }

    /// Whether the symbol is a terminal under this grammar, that is,
    /// whether no rule is headed by it.
    pub fn is_terminal(&self, symbol: &Symbol) -> bool {
        !self.rules.contains_key(symbol)
    }

    /// The grammar's structural fingerprint.
    ///
    /// Equal grammars have equal fingerprints; distinct grammars collide
    /// only as often as the underlying 64-bit hash does.
    pub fn fingerprint(&self) -> u64 {
        self.shape ^ self.rule_count as u64
    }

    /// Formats the grammar to a `String`, one rule per line, suppressed
    /// positions marked with `~`:
    ///
    /// ```ignore
    /// expr ::= expr ~+ term;
    /// term ::= digit;
    /// ```
    pub fn stringify(&self) -> String {
        let mut heads: Vec<&Symbol> = self.heads().collect();
        heads.sort();
        let mut result = String::new();
        for head in heads {
            for rule in self.rules_for(head) {
                writeln!(&mut result, "{:?};", rule).expect("writing to String failed");
            }
        }
        result
    }
}

impl<V: ParseValue> Grammar<V> {
    /// Returns a grammar extended with the rule `head ::= elements`,
    /// replacing any existing rule with the same `(head, body)`.
    ///
    /// Elements are written with [`keep`], [`skip`] and [`graft`]; graft
    /// entries occupy no body position and run between the surrounding
    /// positions once everything before them has matched.
    ///
    /// Without a fold, the rule produces the tuple of its selected values.
    ///
    /// # Panics
    ///
    /// Panics if the head or any body symbol is empty.
    ///
    /// [`keep`]: crate::rule::keep
    /// [`skip`]: crate::rule::skip
    /// [`graft`]: crate::rule::graft
    pub fn put(
        &self,
        head: impl Into<Symbol>,
        elements: impl IntoIterator<Item = BodyElement<V>>,
    ) -> Self {
        self.put_rule(Rule::from_elements(head.into(), elements, None))
    }

    /// Like [`put`], with a fold applied to the selected values when the
    /// rule completes.
    ///
    /// [`put`]: Self::put
    pub fn put_with(
        &self,
        head: impl Into<Symbol>,
        elements: impl IntoIterator<Item = BodyElement<V>>,
        fold: impl Fn(Vec<V>) -> V + 'static,
    ) -> Self {
        let fold: Fold<V> = Rc::new(fold);
        self.put_rule(Rule::from_elements(head.into(), elements, Some(fold)))
    }

    fn put_rule(&self, rule: Rule<V>) -> Self {
        trace!("put {:?}", rule);
        let head = rule.head().clone();
        let mut alternatives: Vec<Rule<V>> = self
            .rules
            .get(&head)
            .map(|existing| existing.as_ref().clone())
            .unwrap_or_default();
        let mut shape = self.shape;
        let mut rule_count = self.rule_count;
        match alternatives
            .iter_mut()
            .find(|existing| **existing == rule)
        {
            Some(existing) => *existing = rule,
            None => {
                shape ^= rule.fingerprint();
                rule_count += 1;
                alternatives.push(rule);
            }
        }
        Grammar {
            rules: self.rules.insert(head, Rc::new(alternatives)),
            rule_count,
            shape,
            nullable: OnceCell::new(),
        }
    }

    /// Returns a grammar without any rule headed by the given symbol.
    /// No-op if there are none.
    pub fn drop(&self, head: impl Into<Symbol>) -> Self {
        let head = head.into();
        let Some(alternatives) = self.rules.get(&head) else {
            return self.clone();
        };
        trace!("drop {} ({} rules)", head, alternatives.len());
        let mut shape = self.shape;
        for rule in alternatives.iter() {
            shape ^= rule.fingerprint();
        }
        Grammar {
            rule_count: self.rule_count - alternatives.len(),
            rules: self.rules.remove(&head),
            shape,
            nullable: OnceCell::new(),
        }
    }

    /// Returns a grammar without the one rule `head ::= body`. No-op if
    /// that rule is absent.
    pub fn drop_rule(&self, head: impl Into<Symbol>, body: &[Symbol]) -> Self {
        let head = head.into();
        let Some(alternatives) = self.rules.get(&head) else {
            return self.clone();
        };
        let Some(position) = alternatives
            .iter()
            .position(|rule| rule.matches(&head, body))
        else {
            return self.clone();
        };
        trace!("drop {} ::= {:?}", head, body);
        let mut alternatives = alternatives.as_ref().clone();
        let removed = alternatives.remove(position);
        let rules = if alternatives.is_empty() {
            self.rules.remove(&head)
        } else {
            self.rules.insert(head, Rc::new(alternatives))
        };
        Grammar {
            rules,
            rule_count: self.rule_count - 1,
            shape: self.shape ^ removed.fingerprint(),
            nullable: OnceCell::new(),
        }
    }

    /// Whether the symbol derives ε under this grammar.
    pub fn is_nullable(&self, symbol: &Symbol) -> bool {
        self.nullable_set().contains(symbol)
    }

    /// The result of a complete empty derivation of the given symbol:
    /// the finish of its direct ε-rule when it has one, otherwise the
    /// finish of its first wholly-nullable rule over the empty results
    /// of that rule's selected symbols. Matching what an actual empty
    /// completion produces is what lets the parser's nullable shortcut
    /// deduplicate against the completion it short-circuits.
    ///
    /// Falls back to the empty tuple for terminals and for derivations
    /// that only close through a cycle.
    pub fn null_result(&self, symbol: &Symbol) -> V {
        self.null_result_guarded(symbol, &mut Vec::new())
    }

    fn null_result_guarded(&self, symbol: &Symbol, visiting: &mut Vec<Symbol>) -> V {
        if visiting.iter().any(|seen| seen == symbol) {
            return V::sequence(Vec::new());
        }
        if let Some(epsilon) = self.rules_for(symbol).find(|rule| rule.is_empty()) {
            return epsilon.finish(Vec::new());
        }
        let nullable_rule = self.rules_for(symbol).find(|rule| {
            rule.body()
                .iter()
                .all(|part| self.nullable_set().contains(part))
        });
        let Some(rule) = nullable_rule else {
            return V::sequence(Vec::new());
        };
        visiting.push(symbol.clone());
        let mut values = Vec::new();
        for (position, part) in rule.body().iter().enumerate() {
            let value = self.null_result_guarded(part, visiting);
            rule.consume(position, &mut values, value);
        }
        visiting.pop();
        rule.finish(values)
    }

    /// The set of nullable non-terminals, computed once per grammar value
    /// as a monotone fixed point: seed with the heads of ε-rules, then
    /// keep adding heads that have a wholly-nullable body until a pass
    /// adds nothing.
    fn nullable_set(&self) -> &FnvHashSet<Symbol> {
        self.nullable.get_or_init(|| {
            let mut nullable = FnvHashSet::default();
            for (head, alternatives) in self.rules.iter() {
                if alternatives.iter().any(|rule| rule.is_empty()) {
                    nullable.insert(head.clone());
                }
            }
            let mut added = true;
            while added {
                added = false;
                for (head, alternatives) in self.rules.iter() {
                    if nullable.contains(head) {
                        continue;
                    }
                    let wholly_nullable = alternatives.iter().any(|rule| {
                        rule.body().iter().all(|symbol| nullable.contains(symbol))
                    });
                    if wholly_nullable {
                        nullable.insert(head.clone());
                        added = true;
                    }
                }
            }
            trace!("nullable set has {} symbols", nullable.len());
            Rc::new(nullable)
        })
    }
}

impl<V> PartialEq for Grammar<V> {
    /// Structural equality over the set of rule identities. Selectors,
    /// grafts and folds do not participate: putting the same `(head,
    /// body)` twice must yield equal grammars for completions to
    /// deduplicate, so rule factories are assumed referentially
    /// transparent.
    fn eq(&self, other: &Self) -> bool {
        if self.shape != other.shape || self.rule_count != other.rule_count {
            return false;
        }
        self.rules.iter().all(|(head, alternatives)| {
            other.rules.get(head).is_some_and(|others| {
                alternatives.len() == others.len()
                    && alternatives
                        .iter()
                        .all(|rule| others.iter().any(|candidate| candidate == rule))
            })
        })
    }
}

impl<V> Eq for Grammar<V> {}

impl<V> fmt::Debug for Grammar<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Grammar({} rules, shape {:016x})",
            self.rule_count, self.shape
        )?;
        if f.alternate() {
            write!(f, "\n{}", self.stringify())?;
        }
        Ok(())
    }
}
