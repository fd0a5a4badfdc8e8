//! Run-time (and parse-time) values of the host language.
//!
//! The same value domain flows through both passes: the parser's folds
//! build characters into strings, strings into syntax nodes and node
//! lists; the interpreter then computes with numbers, strings, functions
//! and objects. This mirrors how the grammar's folds and the executed
//! program hand values back and forth through macros.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use graft_grammar::ParseValue;

use crate::ast::{MacroParameter, Node};
use crate::context::Context;
use crate::error::EvalError;

/// A host-language value.
#[derive(Clone)]
pub enum Value {
    /// The absent value: `None`, or a function falling through.
    Unit,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    /// A tuple of values; also what selector-only rules produce.
    Tuple(Rc<[Value]>),
    /// A syntax fragment, as carried by macro uses.
    Node(Rc<Node>),
    /// A macro parameter, produced while parsing macro statements.
    Param(Rc<MacroParameter>),
    /// A function literal closed over its defining context.
    Function(Rc<Function>),
    /// A built-in function.
    Native(NativeFn),
    /// A mutable attribute bag.
    Object(Object),
    /// A reference to a lexical context, as passed to macro transforms.
    Context(Context),
}

/// A function value: parameters, body, and the captured defining scope.
pub struct Function {
    pub parameters: Vec<String>,
    pub body: Rc<Node>,
    pub captured: Context,
}

/// A built-in function with a display name.
#[derive(Clone)]
pub struct NativeFn {
    name: &'static str,
    call: Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>,
}

impl NativeFn {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call(&self, arguments: &[Value]) -> Result<Value, EvalError> {
        (*self.call)(arguments)
    }
}

/// A mutable bag of named attributes.
#[derive(Clone, Default)]
pub struct Object {
    attributes: Rc<RefCell<BTreeMap<String, Value>>>,
}

impl Object {
    pub fn new() -> Self {
        Object::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Value) {
        self.attributes.borrow_mut().insert(name.to_string(), value);
    }
}

impl Value {
    /// Creates a built-in function value.
    pub fn native(
        name: &'static str,
        call: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        Value::Native(NativeFn {
            name,
            call: Rc::new(call),
        })
    }

    /// Creates a string value.
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::Str(text.as_ref().into())
    }

    /// Wraps a syntax node.
    pub fn node(node: Node) -> Self {
        Value::Node(Rc::new(node))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "none",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::Str(_) => "a string",
            Value::Tuple(_) => "a tuple",
            Value::Node(_) => "a syntax node",
            Value::Param(_) => "a macro parameter",
            Value::Function(_) => "a function",
            Value::Native(_) => "a built-in function",
            Value::Object(_) => "an object",
            Value::Context(_) => "a context",
        }
    }

    /// The concatenated text of a lexical value: nested tuples of strings
    /// flatten, in order. Used by the folds that assemble identifiers,
    /// numbers and string literals from characters.
    pub fn text(&self) -> String {
        fn collect(value: &Value, into: &mut String) {
            match value {
                Value::Str(text) => into.push_str(text),
                Value::Tuple(values) => {
                    for value in values.iter() {
                        collect(value, into);
                    }
                }
                _ => {}
            }
        }
        let mut text = String::new();
        collect(self, &mut text);
        text
    }

    /// Unwraps a syntax node.
    ///
    /// # Panics
    ///
    /// Panics when the value is not a node; the core grammar's folds only
    /// call this where the rule shape guarantees one.
    pub fn into_node(self) -> Rc<Node> {
        match self {
            Value::Node(node) => node,
            other => panic!("expected a syntax node, got {}", other.type_name()),
        }
    }

    /// Unwraps a tuple. Panics like [`Value::into_node`].
    pub fn into_tuple(self) -> Rc<[Value]> {
        match self {
            Value::Tuple(values) => values,
            other => panic!("expected a tuple, got {}", other.type_name()),
        }
    }

    /// Unwraps a boolean. Panics like [`Value::into_node`].
    pub fn into_bool(self) -> bool {
        match self {
            Value::Bool(value) => value,
            other => panic!("expected a boolean, got {}", other.type_name()),
        }
    }

    /// Unwraps a number. Panics like [`Value::into_node`].
    pub fn into_number(self) -> f64 {
        match self {
            Value::Number(value) => value,
            other => panic!("expected a number, got {}", other.type_name()),
        }
    }

    /// Unwraps a macro parameter. Panics like [`Value::into_node`].
    pub fn into_param(self) -> Rc<MacroParameter> {
        match self {
            Value::Param(parameter) => parameter,
            other => panic!("expected a macro parameter, got {}", other.type_name()),
        }
    }
}

impl ParseValue for Value {
    fn sequence(values: Vec<Value>) -> Value {
        Value::Tuple(values.into())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::Number(left), Value::Number(right)) => left == right,
            (Value::Str(left), Value::Str(right)) => left == right,
            (Value::Tuple(left), Value::Tuple(right)) => left == right,
            (Value::Node(left), Value::Node(right)) => left == right,
            (Value::Param(left), Value::Param(right)) => left == right,
            (Value::Function(left), Value::Function(right)) => Rc::ptr_eq(left, right),
            (Value::Native(left), Value::Native(right)) => Rc::ptr_eq(&left.call, &right.call),
            (Value::Object(left), Value::Object(right)) => {
                Rc::ptr_eq(&left.attributes, &right.attributes)
            }
            (Value::Context(left), Value::Context(right)) => left == right,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "none"),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Number(value) => {
                if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{}", value)
                }
            }
            Value::Str(text) => write!(f, "{}", text),
            Value::Tuple(values) => {
                write!(f, "(")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, ")")
            }
            Value::Node(node) => write!(f, "<{} node>", node.kind()),
            Value::Param(_) => write!(f, "<macro parameter>"),
            Value::Function(_) => write!(f, "<function>"),
            Value::Native(native) => write!(f, "<built-in {}>", native.name),
            Value::Object(_) => write!(f, "<object>"),
            Value::Context(_) => write!(f, "<context>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(text) => write!(f, "{:?}", text),
            Value::Node(node) => write!(f, "{:?}", node),
            Value::Tuple(values) => f.debug_list().entries(values.iter()).finish(),
            Value::Param(parameter) => write!(f, "{:?}", parameter),
            other => write!(f, "{}", other),
        }
    }
}
