//! Library for grammars that change while they are being used.
//!
//! A [`Grammar`] here is a value: `put` and `drop` return a new grammar and
//! leave the receiver untouched, so a partially-finished parse can keep
//! using the grammar it started with while later parts of the same parse
//! run against an extended one. Rule storage is shared structurally
//! between the old and the new value.

#![deny(unsafe_code)]
#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![cfg_attr(test, deny(warnings))]

pub mod grammar;
pub mod rule;
pub mod value;

pub use crate::grammar::Grammar;
pub use crate::rule::{graft, keep, skip, BodyElement, Fold, Rule, Transform};
pub use crate::value::ParseValue;

mod local_prelude {
    pub use crate::rule::{BodyElement, Fold, Rule, Transform};
    pub use crate::value::ParseValue;
    pub use graft_symbol::Symbol;
}
