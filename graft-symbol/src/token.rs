//! The minimal token interface.
//!
//! The parser itself never inspects tokens. A matcher callback decides
//! whether a token satisfies a terminal symbol and, if so, which value the
//! match contributes. This trait only exists so that the common case — a
//! token that knows its own symbol and payload — gets a default matcher
//! for free.

use crate::symbol::Symbol;

/// A token with a grammar symbol and a value payload.
///
/// Token sources are finite, forward-only sequences; the driver appends
/// its own end-of-input marker, so the token type does not need one.
pub trait Token {
    /// The value fed into a rule when this token is matched.
    type Value;

    /// The terminal symbol this token stands for.
    fn symbol(&self) -> Symbol;

    /// The value contributed when the token matches.
    fn value(&self) -> Self::Value;
}
