//! Earley recognizer/parser for grammars that change while parsing.
//!
//! The unusual part of this parser is that the grammar is not a constant
//! of the parse: every in-flight state carries the grammar it was created
//! under, and a completed sub-parse propagates *its* grammar — possibly
//! rewritten by a mid-rule graft — to the state it advances. Rules
//! published by a graft are therefore visible to every symbol matched
//! after it, inside the same rule and beyond.

#![deny(unsafe_code)]
#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![cfg_attr(test, deny(warnings))]

pub mod column;
pub mod error;
pub mod item;
pub mod parse;

pub use crate::column::Column;
pub use crate::error::Error;
pub use crate::item::{Item, ParentSet};
pub use crate::parse::{char_matcher, parse, Parse, Parser, START};

mod local_prelude {
    pub use crate::error::Error;
    pub use graft_grammar::{Grammar, ParseValue, Rule};
    pub use graft_symbol::{Symbol, Token};
}
