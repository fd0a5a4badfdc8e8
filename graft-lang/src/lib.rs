//! The graft host language: a character-level grammar parsed with the
//! graft Earley parser, a tree-walking interpreter, and a module loader.
//!
//! The language's `macro` statement is where the parser's mid-rule
//! grammar transforms earn their keep: the statement's own rule carries a
//! graft that publishes the new production before the rest of the module
//! is parsed, so code following a macro definition can already use it.

#![deny(unsafe_code)]
#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![cfg_attr(test, deny(warnings))]

pub mod ast;
pub mod builtins;
pub mod context;
pub mod core_grammar;
pub mod error;
pub mod loader;
pub mod tokenize;
pub mod value;

pub use crate::ast::{BinaryOp, Flow, MacroParameter, Node, UnaryOp};
pub use crate::builtins::OutSink;
pub use crate::context::Context;
pub use crate::core_grammar::core_grammar;
pub use crate::error::EvalError;
pub use crate::loader::{LoadError, Loader, Module};
pub use crate::tokenize::{tokenize, CharToken};
pub use crate::value::Value;
