//! Lexically nested execution contexts.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use fnv::FnvHashMap;

use crate::ast::MacroParameter;
use crate::error::EvalError;
use crate::loader::{Loader, LoaderShared};
use crate::value::Value;

/// A macro's identity: its head together with its parameter list.
pub type MacroKey = (String, Vec<MacroParameter>);

/// A lexical scope: variables, macro definitions, and an optional parent.
///
/// Cloning hands out another reference to the same scope; child scopes
/// keep their parent alive. Declaration is idempotent; assignment walks
/// outward to the nearest declaration; access stops at the nearest
/// declaration and fails if that declaration is still unassigned.
#[derive(Clone)]
pub struct Context {
    data: Rc<ContextData>,
}

struct ContextData {
    parent: Option<Context>,
    variables: RefCell<FnvHashMap<String, Option<Value>>>,
    macros: RefCell<FnvHashMap<MacroKey, Value>>,
    /// Present on module top-level contexts only; lets `import` find the
    /// loader without threading it through every call.
    loader: Option<Weak<LoaderShared>>,
}

impl Context {
    /// Creates a free-standing context, with no loader attached.
    pub fn new() -> Self {
        Context {
            data: Rc::new(ContextData {
                parent: None,
                variables: RefCell::new(FnvHashMap::default()),
                macros: RefCell::new(FnvHashMap::default()),
                loader: None,
            }),
        }
    }

    pub(crate) fn top_level(loader: Weak<LoaderShared>) -> Self {
        Context {
            data: Rc::new(ContextData {
                parent: None,
                variables: RefCell::new(FnvHashMap::default()),
                macros: RefCell::new(FnvHashMap::default()),
                loader: Some(loader),
            }),
        }
    }

    /// Creates a child scope of this one.
    pub fn child(&self) -> Self {
        Context {
            data: Rc::new(ContextData {
                parent: Some(self.clone()),
                variables: RefCell::new(FnvHashMap::default()),
                macros: RefCell::new(FnvHashMap::default()),
                loader: None,
            }),
        }
    }

    /// Declares a name in this scope. A no-op if it is already declared
    /// here; outer declarations are shadowed, not touched.
    pub fn declare(&self, name: &str) {
        self.data
            .variables
            .borrow_mut()
            .entry(name.to_string())
            .or_insert(None);
    }

    /// Assigns to the nearest enclosing declaration of the name.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), EvalError> {
        {
            let mut variables = self.data.variables.borrow_mut();
            if let Some(slot) = variables.get_mut(name) {
                *slot = Some(value);
                return Ok(());
            }
        }
        match &self.data.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(EvalError::AssignmentToUndeclared(name.to_string())),
        }
    }

    /// Declares the name here and assigns it in one step.
    pub fn declare_and_assign(&self, name: &str, value: Value) {
        self.data
            .variables
            .borrow_mut()
            .insert(name.to_string(), Some(value));
    }

    /// Reads the nearest enclosing declaration of the name. The special
    /// name `__context__` reads back this context itself.
    pub fn access(&self, name: &str) -> Result<Value, EvalError> {
        if name == "__context__" {
            return Ok(Value::Context(self.clone()));
        }
        if let Some(slot) = self.data.variables.borrow().get(name) {
            return match slot {
                Some(value) => Ok(value.clone()),
                None => Err(EvalError::UnassignedVariable(name.to_string())),
            };
        }
        match &self.data.parent {
            Some(parent) => parent.access(name),
            None => Err(EvalError::UndeclaredVariable(name.to_string())),
        }
    }

    /// The value assigned to the name in this scope, if any. Does not
    /// walk outward; used when collecting a module's exports.
    pub fn local_value(&self, name: &str) -> Option<Value> {
        self.data.variables.borrow().get(name).cloned().flatten()
    }

    /// Defines (or redefines) a macro in this scope.
    pub fn define_macro(&self, key: MacroKey, definition: Value) {
        self.data.macros.borrow_mut().insert(key, definition);
    }

    /// Looks a macro up along the scope chain.
    pub fn macro_definition(&self, key: &MacroKey) -> Option<Value> {
        if let Some(definition) = self.data.macros.borrow().get(key) {
            return Some(definition.clone());
        }
        self.data
            .parent
            .as_ref()
            .and_then(|parent| parent.macro_definition(key))
    }

    /// The module loader this context executes under, if any.
    pub fn loader(&self) -> Option<Loader> {
        match &self.data.loader {
            Some(loader) => loader.upgrade().map(Loader::from_shared),
            None => self
                .data
                .parent
                .as_ref()
                .and_then(|parent| parent.loader()),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_is_idempotent() {
        let context = Context::new();
        context.declare("x");
        context.assign("x", Value::Number(1.0)).expect("declared");
        context.declare("x");
        assert_eq!(context.access("x").expect("assigned"), Value::Number(1.0));
    }

    #[test]
    fn assignment_walks_outward() {
        let outer = Context::new();
        outer.declare("x");
        let inner = outer.child();
        inner.assign("x", Value::Number(2.0)).expect("declared outside");
        assert_eq!(outer.access("x").expect("assigned"), Value::Number(2.0));
    }

    #[test]
    fn shadowing_stops_the_walk() {
        let outer = Context::new();
        outer.declare_and_assign("x", Value::Number(1.0));
        let inner = outer.child();
        inner.declare("x");
        inner.assign("x", Value::Number(2.0)).expect("declared inside");
        assert_eq!(outer.access("x").expect("assigned"), Value::Number(1.0));
        assert_eq!(inner.access("x").expect("assigned"), Value::Number(2.0));
    }

    #[test]
    fn access_fails_on_declared_but_unassigned() {
        let context = Context::new();
        context.declare("x");
        assert_eq!(
            context.access("x"),
            Err(EvalError::UnassignedVariable("x".to_string()))
        );
    }

    #[test]
    fn access_fails_on_undeclared() {
        let context = Context::new();
        assert_eq!(
            context.access("x"),
            Err(EvalError::UndeclaredVariable("x".to_string()))
        );
    }

    #[test]
    fn assignment_fails_on_undeclared() {
        let context = Context::new();
        assert_eq!(
            context.assign("x", Value::Unit),
            Err(EvalError::AssignmentToUndeclared("x".to_string()))
        );
    }

    #[test]
    fn macros_are_found_along_the_chain() {
        let outer = Context::new();
        let key: MacroKey = ("twice".to_string(), vec![]);
        outer.define_macro(key.clone(), Value::Number(1.0));
        let inner = outer.child();
        assert_eq!(inner.macro_definition(&key), Some(Value::Number(1.0)));
    }

    #[test]
    fn context_reads_back_as_a_value() {
        let context = Context::new();
        match context.access("__context__") {
            Ok(Value::Context(read)) => assert!(read == context),
            other => panic!("expected the context itself, got {:?}", other),
        }
    }
}
