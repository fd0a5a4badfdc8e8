//! Interpreter failure conditions.

use std::fmt;

/// A fatal error raised while executing a syntax tree.
///
/// There is no recovery: errors surface to the module loader verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalError {
    /// A name was read before any enclosing scope declared it.
    UndeclaredVariable(String),
    /// A name was read after declaration but before assignment.
    UnassignedVariable(String),
    /// A name was assigned without any enclosing scope declaring it.
    AssignmentToUndeclared(String),
    /// A call supplied the wrong number of arguments.
    ArityMismatch { expected: usize, found: usize },
    /// `continue` or `break` escaped every loop.
    UncaughtLoopControl(&'static str),
    /// `return` escaped every function.
    ReturnOutsideFunction,
    /// The callee of a call is not callable.
    NotCallable(&'static str),
    /// Attribute access or assignment on a value without attributes.
    NoAttributes(&'static str),
    /// The attribute is not present on the object.
    NoSuchAttribute(String),
    /// An operation met a value of the wrong type.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    DivisionByZero,
    /// A macro use without a matching definition in scope.
    UndefinedMacro(String),
    /// A statement-only node was evaluated for a value.
    NotAnExpression(&'static str),
    /// Loading an imported module failed; carries the loader's message.
    Import(String),
    /// The output sink failed.
    Output(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UndeclaredVariable(name) => {
                write!(f, "use of undeclared variable '{}'", name)
            }
            EvalError::UnassignedVariable(name) => {
                write!(f, "use of unassigned variable '{}'", name)
            }
            EvalError::AssignmentToUndeclared(name) => {
                write!(f, "assignment to undeclared variable '{}'", name)
            }
            EvalError::ArityMismatch { expected, found } => {
                write!(f, "expected {} arguments, got {}", expected, found)
            }
            EvalError::UncaughtLoopControl(keyword) => {
                write!(f, "'{}' outside of a loop", keyword)
            }
            EvalError::ReturnOutsideFunction => write!(f, "'return' outside of a function"),
            EvalError::NotCallable(kind) => write!(f, "{} is not callable", kind),
            EvalError::NoAttributes(kind) => write!(f, "{} has no attributes", kind),
            EvalError::NoSuchAttribute(name) => write!(f, "no attribute '{}'", name),
            EvalError::TypeMismatch { expected, found } => {
                write!(f, "expected {}, got {}", expected, found)
            }
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::UndefinedMacro(head) => {
                write!(f, "use of undefined macro '{}'", head)
            }
            EvalError::NotAnExpression(kind) => {
                write!(f, "{} cannot be evaluated for a value", kind)
            }
            EvalError::Import(message) => write!(f, "import failed: {}", message),
            EvalError::Output(message) => write!(f, "output failed: {}", message),
        }
    }
}

impl std::error::Error for EvalError {}
