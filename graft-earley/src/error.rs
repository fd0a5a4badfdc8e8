//! Parse failure conditions.

use std::collections::BTreeSet;
use std::fmt;

use graft_symbol::Symbol;

/// Why a parse failed.
///
/// Matcher rejections are not failures; a rejected state is simply
/// dropped, and only becomes `Parse` once no state survives a position.
#[derive(Clone, Debug, PartialEq)]
pub enum Error<V> {
    /// No state survived past the given token position.
    Parse {
        /// Index of the token that nothing could consume; equivalently,
        /// the number of tokens recognized before the parse got stuck.
        position: usize,
        /// The symbols some state was waiting for at the furthest
        /// position reached.
        expected: BTreeSet<Symbol>,
    },
    /// More than one top-level result with ambiguity disallowed. Carries
    /// every candidate, in order of first completion.
    Ambiguous { candidates: Vec<V> },
    /// A mid-rule graft removed the rule it was registered on while that
    /// rule was being matched. This is a programmer error in the grammar.
    RetractedRule {
        head: Symbol,
        body: Vec<Symbol>,
    },
}

impl<V> fmt::Display for Error<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse { position, expected } => {
                write!(f, "parse failed at position {}", position)?;
                if !expected.is_empty() {
                    write!(f, "; expected one of:")?;
                    for symbol in expected {
                        write!(f, " {:?}", symbol.as_str())?;
                    }
                }
                Ok(())
            }
            Error::Ambiguous { candidates } => {
                write!(f, "ambiguous parse with {} results", candidates.len())
            }
            Error::RetractedRule { head, body } => {
                write!(
                    f,
                    "a graft retracted the rule being matched: {} ::=",
                    head
                )?;
                for symbol in body {
                    write!(f, " {}", symbol)?;
                }
                Ok(())
            }
        }
    }
}

impl<V: fmt::Debug> std::error::Error for Error<V> {}
