//! Symbol and token types shared by the graft grammar and parser crates.

#![deny(unsafe_code)]
#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![cfg_attr(test, deny(warnings))]

pub mod symbol;
pub mod token;

pub use crate::symbol::Symbol;
pub use crate::token::Token;
