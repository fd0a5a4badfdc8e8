//! Facade over the graft crates: a dynamically extensible Earley parser
//! and the small host language built on top of it.
//!
//! The parser accepts grammars whose rules carry per-position selectors,
//! fold callbacks, and mid-rule grafts that rewrite the grammar while a
//! rule is partially matched. The `lang` module uses those grafts to let
//! programs extend their own syntax with `macro` statements.

#![deny(unsafe_code)]
#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![cfg_attr(test, deny(warnings))]

pub use graft_earley::{char_matcher, parse, Column, Error, Item, Parse, ParentSet, Parser, START};
pub use graft_grammar::{
    graft, keep, skip, BodyElement, Fold, Grammar, ParseValue, Rule, Transform,
};
pub use graft_symbol::{Symbol, Token};

pub use graft_lang as lang;
