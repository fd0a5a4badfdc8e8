//! The Earley driver: predict/scan/complete over a pull-based token
//! source.

use std::collections::BTreeSet;
use std::iter::Fuse;
use std::mem;
use std::rc::Rc;

use log::{debug, trace};

use crate::column::Column;
use crate::item::Item;
use crate::local_prelude::*;

/// The default start symbol.
pub const START: &str = "__start__";

/// Decides whether a token satisfies a terminal symbol, and with which
/// value. `None` drops the state silently; a rejection only surfaces as a
/// parse error once every state of a position has been dropped.
pub type Matcher<V, T> = Box<dyn Fn(&T, &Symbol) -> Option<V>>;

/// A matcher for raw character input: a token matches the terminal whose
/// name is exactly that character.
pub fn char_matcher<V: From<char>>() -> impl Fn(&char, &Symbol) -> Option<V> {
    |&character, symbol| {
        let name = symbol.as_str();
        if name.len() == character.len_utf8() && name.starts_with(character) {
            Some(V::from(character))
        } else {
            None
        }
    }
}

/// Parses tokens against a grammar with default settings: start symbol
/// [`START`], the token's own symbol/value as the matcher, no partial
/// results, ambiguity allowed.
pub fn parse<V, T, I>(grammar: &Grammar<V>, tokens: I) -> Parse<V, T, I::IntoIter>
where
    V: ParseValue,
    T: Token<Value = V> + 'static,
    I: IntoIterator<Item = T>,
{
    Parser::new(grammar).parse(tokens)
}

/// Parse configuration, built up in the usual chaining style.
pub struct Parser<V, T> {
    grammar: Grammar<V>,
    start: Symbol,
    matcher: Matcher<V, T>,
    allow_partial: bool,
    allow_ambiguous: bool,
}

impl<V, T> Parser<V, T>
where
    V: ParseValue,
    T: Token<Value = V> + 'static,
{
    /// Creates a parser with the default matcher: a token matches the
    /// terminal equal to its own symbol and contributes its own value.
    pub fn new(grammar: &Grammar<V>) -> Self {
        Self::with_matcher(grammar, |token: &T, symbol: &Symbol| {
            if token.symbol() == *symbol {
                Some(token.value())
            } else {
                None
            }
        })
    }
}

impl<V, T> Parser<V, T>
where
    V: ParseValue,
    T: 'static,
{
    /// Creates a parser with a custom terminal matcher.
    pub fn with_matcher(
        grammar: &Grammar<V>,
        matcher: impl Fn(&T, &Symbol) -> Option<V> + 'static,
    ) -> Self {
        Parser {
            grammar: grammar.clone(),
            start: Symbol::new(START),
            matcher: Box::new(matcher),
            allow_partial: false,
            allow_ambiguous: true,
        }
    }

    /// Replaces the start symbol.
    pub fn start(mut self, symbol: impl Into<Symbol>) -> Self {
        self.start = symbol.into();
        self
    }

    /// When set, every top-level completion is emitted as it is observed,
    /// at any column boundary, instead of only at end-of-input.
    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    /// When cleared, more than one top-level result at end-of-input is an
    /// error carrying all candidates.
    pub fn allow_ambiguous(mut self, allow: bool) -> Self {
        self.allow_ambiguous = allow;
        self
    }

    /// Runs the parse over the given tokens, lazily.
    pub fn parse<I>(self, tokens: I) -> Parse<V, T, I::IntoIter>
    where
        I: IntoIterator<Item = T>,
    {
        Parse::new(self, tokens.into_iter())
    }
}

enum State<V> {
    Running,
    Failed(Error<V>),
    Draining(usize),
    Finished,
}

enum Step<V> {
    Emit(V),
    Fail(Error<V>),
    End,
}

/// A parse in progress; an iterator over results.
///
/// In the default mode the whole input is consumed on the first call to
/// `next`, every top-level result at the end column is gathered, and the
/// results (or the failure) are handed out one by one. In partial mode
/// results stream out as soon as they are observed.
pub struct Parse<V, T, I> {
    matcher: Matcher<V, T>,
    tokens: Fuse<I>,
    lookahead: Option<T>,
    column: Column<V>,
    next_column: Column<V>,
    cursor: usize,
    position: usize,
    allow_partial: bool,
    allow_ambiguous: bool,
    candidates: Vec<V>,
    emitted: usize,
    last_expected: BTreeSet<Symbol>,
    state: State<V>,
}

impl<V, T, I> Parse<V, T, I>
where
    V: ParseValue,
    I: Iterator<Item = T>,
{
    fn new(options: Parser<V, T>, tokens: I) -> Self {
        let Parser {
            grammar,
            start,
            matcher,
            allow_partial,
            allow_ambiguous,
        } = options;
        let mut tokens = tokens.fuse();
        let lookahead = tokens.next();
        let mut column = Column::new();
        let mut state = State::Running;
        let seeds: Vec<Rule<V>> = grammar.rules_for(&start).cloned().collect();
        if seeds.is_empty() {
            state = State::Failed(Error::Parse {
                position: 0,
                expected: [start.clone()].into_iter().collect(),
            });
        }
        for rule in seeds {
            match Item::predict(grammar.clone(), rule, 0, None) {
                Ok(item) => {
                    column.push(item);
                }
                Err(error) => {
                    state = State::Failed(error);
                    break;
                }
            }
        }
        debug!("parse from {:?}: {} seed items", start.as_str(), column.len());
        Parse {
            matcher,
            tokens,
            lookahead,
            column,
            next_column: Column::new(),
            cursor: 0,
            position: 0,
            allow_partial,
            allow_ambiguous,
            candidates: Vec::new(),
            emitted: 0,
            last_expected: BTreeSet::new(),
            state,
        }
    }

    /// One pass of the column worklist, until something worth reporting
    /// happens.
    fn drive(&mut self) -> Step<V> {
        loop {
            while let Some(item) = self.column.get(self.cursor) {
                self.cursor += 1;
                if item.is_complete() {
                    match item.parents() {
                        // A parentless completion is a top-level result.
                        // Partial mode streams it out now; the default
                        // mode picks it up from the end column's
                        // completed-items index once input runs out.
                        None => {
                            if self.allow_partial {
                                self.emitted += 1;
                                return Step::Emit(item.finish());
                            }
                        }
                        // Route the result to every item that was waiting
                        // for this head. The parent's grammar is
                        // discarded; the completion's grammar moves
                        // forward.
                        Some(parents) => {
                            let result = item.finish();
                            let parents: Vec<_> = parents.borrow().clone();
                            for parent in parents {
                                match parent.advance(result.clone(), item.grammar().clone()) {
                                    Ok(advanced) => {
                                        self.column.push(advanced);
                                    }
                                    Err(error) => return Step::Fail(error),
                                }
                            }
                        }
                    }
                    continue;
                }
                let Some(expected) = item.expected().cloned() else {
                    continue;
                };
                if !item.grammar().is_terminal(&expected) {
                    // Predict. A nullable symbol also advances the item
                    // in place, with the result of an empty derivation.
                    if item.grammar().is_nullable(&expected) {
                        let shortcut = item.grammar().null_result(&expected);
                        match item.advance(shortcut, item.grammar().clone()) {
                            Ok(advanced) => {
                                self.column.push(advanced);
                            }
                            Err(error) => return Step::Fail(error),
                        }
                    }
                    let parents = self.column.items_expecting(&expected);
                    let rules: Vec<Rule<V>> =
                        item.grammar().rules_for(&expected).cloned().collect();
                    for rule in rules {
                        let predicted = Item::predict(
                            item.grammar().clone(),
                            rule,
                            self.position,
                            Some(Rc::clone(&parents)),
                        );
                        match predicted {
                            Ok(predicted) => {
                                self.column.push(predicted);
                            }
                            Err(error) => return Step::Fail(error),
                        }
                    }
                } else if let Some(token) = &self.lookahead {
                    // Scan into the next column. A rejected matcher just
                    // drops this item.
                    if let Some(value) = (self.matcher)(token, &expected) {
                        match item.advance(value, item.grammar().clone()) {
                            Ok(advanced) => {
                                self.next_column.push(advanced);
                            }
                            Err(error) => return Step::Fail(error),
                        }
                    }
                }
            }
            // The column is closed.
            if self.lookahead.is_none() {
                return Step::End;
            }
            self.last_expected = self.column.expected_symbols();
            self.lookahead = self.tokens.next();
            self.column = mem::take(&mut self.next_column);
            self.cursor = 0;
            if self.column.is_empty() {
                if self.lookahead.is_some() {
                    // The token at `position` fed no item: hard failure.
                    return Step::Fail(Error::Parse {
                        position: self.position,
                        expected: mem::take(&mut self.last_expected),
                    });
                }
                // Input exhausted into an empty column; report at the end.
                return Step::End;
            }
            self.position += 1;
            trace!(
                "column {}: {} items to process",
                self.position,
                self.column.len()
            );
        }
    }

    fn end_expected(&mut self) -> BTreeSet<Symbol> {
        if self.column.is_empty() {
            mem::take(&mut self.last_expected)
        } else {
            self.column.expected_symbols()
        }
    }

    /// Collects the top-level results of the end column, in order of
    /// first completion.
    fn gather_candidates(&mut self) {
        self.candidates = self
            .column
            .completions()
            .filter(|item| item.parents().is_none())
            .map(|item| item.finish())
            .collect();
    }
}

impl<V, T, I> Iterator for Parse<V, T, I>
where
    V: ParseValue,
    I: Iterator<Item = T>,
{
    type Item = Result<V, Error<V>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match mem::replace(&mut self.state, State::Finished) {
                State::Finished => return None,
                State::Failed(error) => return Some(Err(error)),
                State::Draining(index) => {
                    if index < self.candidates.len() {
                        self.state = State::Draining(index + 1);
                        return Some(Ok(self.candidates[index].clone()));
                    }
                    return None;
                }
                State::Running => match self.drive() {
                    Step::Emit(value) => {
                        self.state = State::Running;
                        return Some(Ok(value));
                    }
                    Step::Fail(error) => return Some(Err(error)),
                    Step::End => {
                        if !self.allow_partial {
                            self.gather_candidates();
                        }
                        debug!(
                            "input exhausted at column {}: {} results",
                            self.position,
                            if self.allow_partial {
                                self.emitted
                            } else {
                                self.candidates.len()
                            }
                        );
                        if self.allow_partial {
                            if self.emitted == 0 {
                                let expected = self.end_expected();
                                return Some(Err(Error::Parse {
                                    position: self.position,
                                    expected,
                                }));
                            }
                            return None;
                        }
                        if self.candidates.is_empty() {
                            let expected = self.end_expected();
                            return Some(Err(Error::Parse {
                                position: self.position,
                                expected,
                            }));
                        }
                        if self.candidates.len() > 1 && !self.allow_ambiguous {
                            return Some(Err(Error::Ambiguous {
                                candidates: mem::take(&mut self.candidates),
                            }));
                        }
                        self.state = State::Draining(0);
                    }
                },
            }
        }
    }
}
