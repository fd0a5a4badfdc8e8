//! Definitions for our grammar symbol type.
//!
//! A symbol is a non-empty name. Whether it acts as a terminal or as a
//! non-terminal is not a property of the symbol itself: a symbol is a
//! non-terminal exactly in those grammars that hold at least one rule
//! headed by it. The same symbol may therefore be a terminal under one
//! grammar and a non-terminal under another, which is what lets a mid-rule
//! graft turn plain input characters into structured syntax.

use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

/// Our common grammar symbol type.
///
/// Cloning is cheap: the name is shared behind a reference count.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Symbol {
    name: Rc<str>,
}

impl Symbol {
    /// Creates a symbol with the given name.
    ///
    /// # Panics
    ///
    /// Panics if the name is empty. An empty symbol in a rule body is a
    /// programmer error in the grammar and is reported immediately.
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        assert!(!name.is_empty(), "a symbol must not be an empty string");
        Symbol { name: name.into() }
    }

    /// Returns the symbol's name.
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl From<&String> for Symbol {
    fn from(name: &String) -> Self {
        Symbol::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        assert!(!name.is_empty(), "a symbol must not be an empty string");
        Symbol {
            name: name.into_boxed_str().into(),
        }
    }
}

impl From<char> for Symbol {
    fn from(character: char) -> Self {
        let mut buffer = [0u8; 4];
        Symbol::new(character.encode_utf8(&mut buffer))
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::Symbol;
    use serde::de::{Deserializer, Error, Unexpected, Visitor};
    use serde::ser::Serializer;
    use serde::{Deserialize, Serialize};
    use std::fmt;

    impl Serialize for Symbol {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(self.as_str())
        }
    }

    struct SymbolVisitor;

    impl<'de> Visitor<'de> for SymbolVisitor {
        type Value = Symbol;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-empty symbol name")
        }

        fn visit_str<E: Error>(self, name: &str) -> Result<Symbol, E> {
            if name.is_empty() {
                Err(E::invalid_value(Unexpected::Str(name), &self))
            } else {
                Ok(Symbol::new(name))
            }
        }
    }

    impl<'de> Deserialize<'de> for Symbol {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Symbol, D::Error> {
            deserializer.deserialize_str(SymbolVisitor)
        }
    }
}
