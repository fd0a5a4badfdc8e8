//! The executable syntax tree and its tree-walking interpreter.
//!
//! Non-local control transfers are ordinary return values: every
//! statement steps to a [`Flow`], and the enclosing construct pattern
//! matches on it. `Forever` is the only catcher of `Continue`/`Break`;
//! a function call is the only catcher of `Return`; anything escaping
//! further is a hard error.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::EvalError;
use crate::value::{Function, Value};

/// One element of a macro's parameter list.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum MacroParameter {
    /// A fixed sequence of symbols the user must type.
    Terminal(Vec<String>),
    /// An existing grammar non-terminal. When named, the matched value is
    /// passed to the macro's transform under that name.
    Nonterminal {
        symbol: String,
        name: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    Greater,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum UnaryOp {
    Negative,
    Positive,
}

/// A syntax tree node. Statements and expressions share the type; a
/// statement executes to a [`Flow`], an expression evaluates to a
/// [`Value`], and expression nodes in statement position evaluate and
/// discard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// The empty statement; also the absent `else` branch.
    Nothing,
    StatementSequence(Vec<Node>),
    Import {
        exported: bool,
        path: String,
    },
    VariableDeclaration {
        exported: bool,
        name: String,
    },
    MacroDefinition {
        exported: bool,
        head: String,
        parameters: Vec<MacroParameter>,
        /// An expression producing the macro's transform; in practice a
        /// function literal over `__usage_context__` and the named
        /// parameters.
        definition: Box<Node>,
    },
    MacroUndefinition {
        exported: bool,
        head: String,
        parameters: Vec<MacroParameter>,
    },
    Block(Box<Node>),
    If {
        condition: Box<Node>,
        true_clause: Box<Node>,
        false_clause: Box<Node>,
    },
    Forever(Box<Node>),
    Continue,
    Break,
    Return(Box<Node>),
    VariableAssignment {
        name: String,
        value: Box<Node>,
    },
    AttributeAssignment {
        object: Box<Node>,
        attribute: String,
        value: Box<Node>,
    },
    VariableAccess(String),
    AttributeAccess {
        object: Box<Node>,
        attribute: String,
    },
    Call {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    NumberLiteral(f64),
    StringLiteral(String),
    FunctionLiteral {
        parameters: Vec<String>,
        body: Box<Node>,
    },
    BinaryOperation {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryOperation {
        op: UnaryOp,
        operand: Box<Node>,
    },
    /// A parsed macro use, kept opaque until execution looks up the
    /// definition and substitutes its result. Children are the raw
    /// sub-trees of the named parameters.
    MacroUse {
        head: String,
        parameters: Vec<MacroParameter>,
        children: Vec<Node>,
    },
}

/// How a statement finished.
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    /// Fall through to the next statement.
    Next,
    Continue,
    Break,
    Return(Value),
}

impl Node {
    /// A short name for messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Nothing => "nothing",
            Node::StatementSequence(_) => "statement sequence",
            Node::Import { .. } => "import",
            Node::VariableDeclaration { .. } => "variable declaration",
            Node::MacroDefinition { .. } => "macro definition",
            Node::MacroUndefinition { .. } => "macro undefinition",
            Node::Block(_) => "block",
            Node::If { .. } => "if",
            Node::Forever(_) => "forever",
            Node::Continue => "continue",
            Node::Break => "break",
            Node::Return(_) => "return",
            Node::VariableAssignment { .. } => "variable assignment",
            Node::AttributeAssignment { .. } => "attribute assignment",
            Node::VariableAccess(_) => "variable access",
            Node::AttributeAccess { .. } => "attribute access",
            Node::Call { .. } => "call",
            Node::NumberLiteral(_) => "number literal",
            Node::StringLiteral(_) => "string literal",
            Node::FunctionLiteral { .. } => "function literal",
            Node::BinaryOperation { .. } => "binary operation",
            Node::UnaryOperation { .. } => "unary operation",
            Node::MacroUse { .. } => "macro use",
        }
    }

    /// The paths imported by this module body, in order.
    pub fn imports(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        if let Node::StatementSequence(statements) = self {
            for statement in statements {
                if let Node::Import { path, .. } = statement {
                    paths.push(path.as_str());
                }
            }
        }
        paths
    }

    /// Executes this node as a statement.
    pub fn execute(&self, context: &Context) -> Result<Flow, EvalError> {
        match self {
            Node::Nothing => Ok(Flow::Next),
            Node::StatementSequence(statements) => {
                for statement in statements {
                    match statement.execute(context)? {
                        Flow::Next => {}
                        other => return Ok(other),
                    }
                }
                Ok(Flow::Next)
            }
            Node::Import { path, .. } => {
                let loader = context
                    .loader()
                    .ok_or_else(|| EvalError::Import("no module loader in scope".to_string()))?;
                let module = loader
                    .import(path)
                    .map_err(|error| EvalError::Import(error.to_string()))?;
                for (name, value) in module.exported_variables() {
                    context.declare_and_assign(name, value.clone());
                }
                for (key, definition) in module.exported_macros() {
                    context.define_macro(key.clone(), definition.clone());
                }
                Ok(Flow::Next)
            }
            Node::VariableDeclaration { name, .. } => {
                context.declare(name);
                Ok(Flow::Next)
            }
            Node::MacroDefinition {
                head,
                parameters,
                definition,
                ..
            } => {
                let transform = definition.evaluate(context)?;
                context.define_macro((head.clone(), parameters.clone()), transform);
                Ok(Flow::Next)
            }
            // The grammar effect of `unmacro` happened at parse time.
            Node::MacroUndefinition { .. } => Ok(Flow::Next),
            Node::Block(body) => body.execute(&context.child()),
            Node::If {
                condition,
                true_clause,
                false_clause,
            } => {
                // The taken clause runs in this scope; it is a block, and
                // the block opens its own.
                if truthy(condition.evaluate(context)?, context)? {
                    true_clause.execute(context)
                } else {
                    false_clause.execute(context)
                }
            }
            Node::Forever(body) => {
                loop {
                    match body.execute(context)? {
                        Flow::Next | Flow::Continue => {}
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                    }
                }
                Ok(Flow::Next)
            }
            Node::Continue => Ok(Flow::Continue),
            Node::Break => Ok(Flow::Break),
            Node::Return(value) => Ok(Flow::Return(value.evaluate(context)?)),
            Node::VariableAssignment { name, value } => {
                let value = value.evaluate(context)?;
                context.assign(name, value)?;
                Ok(Flow::Next)
            }
            Node::AttributeAssignment {
                object,
                attribute,
                value,
            } => {
                let value = value.evaluate(context)?;
                match object.evaluate(context)? {
                    Value::Object(object) => {
                        object.set(attribute, value);
                        Ok(Flow::Next)
                    }
                    other => Err(EvalError::NoAttributes(other.type_name())),
                }
            }
            Node::MacroUse { .. } => {
                // A statement-position macro whose result is syntax runs
                // in place of the use.
                match self.expand_macro(context)? {
                    Value::Node(node) => node.execute(context),
                    _ => Ok(Flow::Next),
                }
            }
            // An expression in statement position: evaluate and discard.
            _ => {
                self.evaluate(context)?;
                Ok(Flow::Next)
            }
        }
    }

    /// Evaluates this node as an expression.
    pub fn evaluate(&self, context: &Context) -> Result<Value, EvalError> {
        match self {
            Node::VariableAccess(name) => context.access(name),
            Node::AttributeAccess { object, attribute } => {
                match object.evaluate(context)? {
                    Value::Object(object) => object
                        .get(attribute)
                        .ok_or_else(|| EvalError::NoSuchAttribute(attribute.clone())),
                    other => Err(EvalError::NoAttributes(other.type_name())),
                }
            }
            Node::Call { callee, arguments } => {
                let mut evaluated = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    evaluated.push(argument.evaluate(context)?);
                }
                let callee = callee.evaluate(context)?;
                call_value(callee, evaluated)
            }
            Node::NumberLiteral(value) => Ok(Value::Number(*value)),
            Node::StringLiteral(text) => Ok(Value::string(text)),
            Node::FunctionLiteral { parameters, body } => {
                Ok(Value::Function(Rc::new(Function {
                    parameters: parameters.clone(),
                    body: Rc::new(body.as_ref().clone()),
                    captured: context.clone(),
                })))
            }
            Node::BinaryOperation { op, left, right } => {
                let left = operand(left.evaluate(context)?, context)?;
                let right = operand(right.evaluate(context)?, context)?;
                binary(*op, left, right)
            }
            Node::UnaryOperation { op, operand: inner } => {
                let value = operand(inner.evaluate(context)?, context)?;
                match (op, value) {
                    (UnaryOp::Negative, Value::Number(value)) => Ok(Value::Number(-value)),
                    (UnaryOp::Positive, Value::Number(value)) => Ok(Value::Number(value)),
                    (_, other) => Err(EvalError::TypeMismatch {
                        expected: "a number",
                        found: other.type_name(),
                    }),
                }
            }
            Node::MacroUse { .. } => {
                // The definition's result stands in for the use; if it is
                // itself syntax, evaluate that syntax here.
                match self.expand_macro(context)? {
                    Value::Node(node) => node.evaluate(context),
                    other => Ok(other),
                }
            }
            other => Err(EvalError::NotAnExpression(other.kind())),
        }
    }

    /// Looks up the macro definition for a use and calls it with the
    /// usage context and the raw child trees.
    fn expand_macro(&self, context: &Context) -> Result<Value, EvalError> {
        let Node::MacroUse {
            head,
            parameters,
            children,
        } = self
        else {
            unreachable!("expand_macro is only called on macro uses");
        };
        let key = (head.clone(), parameters.clone());
        let definition = context
            .macro_definition(&key)
            .ok_or_else(|| EvalError::UndefinedMacro(head.clone()))?;
        let mut arguments = Vec::with_capacity(children.len() + 1);
        arguments.push(Value::Context(context.clone()));
        for child in children {
            arguments.push(Value::node(child.clone()));
        }
        call_value(definition, arguments)
    }
}

/// Calls a callable value with already-evaluated arguments.
pub fn call_value(callee: Value, arguments: Vec<Value>) -> Result<Value, EvalError> {
    match callee {
        Value::Function(function) => {
            if function.parameters.len() != arguments.len() {
                return Err(EvalError::ArityMismatch {
                    expected: function.parameters.len(),
                    found: arguments.len(),
                });
            }
            // A call's scope is a child of the captured defining scope,
            // not of the caller.
            let local = function.captured.child();
            for (name, value) in function.parameters.iter().zip(arguments) {
                local.declare_and_assign(name, value);
            }
            match function.body.execute(&local)? {
                Flow::Return(value) => Ok(value),
                Flow::Next => Ok(Value::Unit),
                Flow::Continue => Err(EvalError::UncaughtLoopControl("continue")),
                Flow::Break => Err(EvalError::UncaughtLoopControl("break")),
            }
        }
        Value::Native(native) => native.call(&arguments),
        other => Err(EvalError::NotCallable(other.type_name())),
    }
}

/// Coerces an operand of an arithmetic or comparison operator: a syntax
/// node — a macro's raw child — is evaluated in place.
fn operand(value: Value, context: &Context) -> Result<Value, EvalError> {
    match value {
        Value::Node(node) => node.evaluate(context),
        other => Ok(other),
    }
}

/// A condition must be a boolean; syntax nodes coerce like operands.
fn truthy(value: Value, context: &Context) -> Result<bool, EvalError> {
    match operand(value, context)? {
        Value::Bool(value) => Ok(value),
        other => Err(EvalError::TypeMismatch {
            expected: "a boolean",
            found: other.type_name(),
        }),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Equal => return Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => return Ok(Value::Bool(left != right)),
        _ => {}
    }
    match (op, left, right) {
        (BinaryOp::Add, Value::Number(left), Value::Number(right)) => {
            Ok(Value::Number(left + right))
        }
        (BinaryOp::Add, Value::Str(left), Value::Str(right)) => {
            Ok(Value::string(format!("{}{}", left, right)))
        }
        (BinaryOp::Subtract, Value::Number(left), Value::Number(right)) => {
            Ok(Value::Number(left - right))
        }
        (BinaryOp::Multiply, Value::Number(left), Value::Number(right)) => {
            Ok(Value::Number(left * right))
        }
        (BinaryOp::Divide, Value::Number(_), Value::Number(right)) if right == 0.0 => {
            Err(EvalError::DivisionByZero)
        }
        (BinaryOp::Divide, Value::Number(left), Value::Number(right)) => {
            Ok(Value::Number(left / right))
        }
        (BinaryOp::Less, Value::Number(left), Value::Number(right)) => {
            Ok(Value::Bool(left < right))
        }
        (BinaryOp::Greater, Value::Number(left), Value::Number(right)) => {
            Ok(Value::Bool(left > right))
        }
        (BinaryOp::Less, Value::Str(left), Value::Str(right)) => Ok(Value::Bool(left < right)),
        (BinaryOp::Greater, Value::Str(left), Value::Str(right)) => Ok(Value::Bool(left > right)),
        (_, left, _) => Err(EvalError::TypeMismatch {
            expected: "a number",
            found: left.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: f64) -> Box<Node> {
        Box::new(Node::NumberLiteral(value))
    }

    fn sequence(statements: Vec<Node>) -> Node {
        Node::StatementSequence(statements)
    }

    #[test]
    fn loop_control_outside_a_loop_is_an_error() {
        let context = Context::new();
        assert_eq!(Node::Continue.execute(&context), Ok(Flow::Continue));
        // The flow value itself is fine; it is the top level that must
        // reject it, as the loader does.
        let body = sequence(vec![Node::Break]);
        assert_eq!(body.execute(&context), Ok(Flow::Break));
    }

    #[test]
    fn forever_catches_continue_and_break() {
        let context = Context::new();
        context.declare_and_assign("n", Value::Number(0.0));
        // forever { n = n + 1; if n < 3 { continue; } else {} break; }
        let body = Node::Forever(Box::new(Node::Block(Box::new(sequence(vec![
            Node::VariableAssignment {
                name: "n".to_string(),
                value: Box::new(Node::BinaryOperation {
                    op: BinaryOp::Add,
                    left: Box::new(Node::VariableAccess("n".to_string())),
                    right: number(1.0),
                }),
            },
            Node::If {
                condition: Box::new(Node::BinaryOperation {
                    op: BinaryOp::Less,
                    left: Box::new(Node::VariableAccess("n".to_string())),
                    right: number(3.0),
                }),
                true_clause: Box::new(Node::Block(Box::new(sequence(vec![Node::Continue])))),
                false_clause: Box::new(Node::Nothing),
            },
            Node::Break,
        ])))));
        assert_eq!(body.execute(&context), Ok(Flow::Next));
        assert_eq!(context.access("n"), Ok(Value::Number(3.0)));
    }

    #[test]
    fn forever_reraises_return() {
        let context = Context::new();
        let body = Node::Forever(Box::new(sequence(vec![Node::Return(number(7.0))])));
        assert_eq!(
            body.execute(&context),
            Ok(Flow::Return(Value::Number(7.0)))
        );
    }

    #[test]
    fn functions_capture_their_defining_scope() {
        let outer = Context::new();
        outer.declare_and_assign("x", Value::Number(10.0));
        let literal = Node::FunctionLiteral {
            parameters: vec!["y".to_string()],
            body: Box::new(sequence(vec![Node::Return(Box::new(
                Node::BinaryOperation {
                    op: BinaryOp::Add,
                    left: Box::new(Node::VariableAccess("x".to_string())),
                    right: Box::new(Node::VariableAccess("y".to_string())),
                },
            ))])),
        };
        let function = literal.evaluate(&outer).expect("function literal");

        // Call from an unrelated scope: the body still sees `x`.
        let result = call_value(function, vec![Value::Number(5.0)]);
        assert_eq!(result, Ok(Value::Number(15.0)));
    }

    #[test]
    fn arity_mismatch_is_fatal() {
        let context = Context::new();
        let literal = Node::FunctionLiteral {
            parameters: vec!["a".to_string(), "b".to_string()],
            body: Box::new(sequence(vec![])),
        };
        let function = literal.evaluate(&context).expect("function literal");
        assert_eq!(
            call_value(function, vec![Value::Number(1.0)]),
            Err(EvalError::ArityMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn fallthrough_returns_the_unit_value() {
        let context = Context::new();
        let literal = Node::FunctionLiteral {
            parameters: vec![],
            body: Box::new(sequence(vec![])),
        };
        let function = literal.evaluate(&context).expect("function literal");
        assert_eq!(call_value(function, vec![]), Ok(Value::Unit));
    }

    #[test]
    fn loop_control_escaping_a_function_is_an_error() {
        let context = Context::new();
        let literal = Node::FunctionLiteral {
            parameters: vec![],
            body: Box::new(sequence(vec![Node::Continue])),
        };
        let function = literal.evaluate(&context).expect("function literal");
        assert_eq!(
            call_value(function, vec![]),
            Err(EvalError::UncaughtLoopControl("continue"))
        );
    }

    #[test]
    fn blocks_scope_their_declarations() {
        let context = Context::new();
        let block = Node::Block(Box::new(sequence(vec![Node::VariableDeclaration {
            exported: false,
            name: "hidden".to_string(),
        }])));
        assert_eq!(block.execute(&context), Ok(Flow::Next));
        assert_eq!(
            context.access("hidden"),
            Err(EvalError::UndeclaredVariable("hidden".to_string()))
        );
    }

    #[test]
    fn macro_uses_substitute_their_definition() {
        let context = Context::new();
        // macro twice over one named expression child, defined directly
        // as a function value.
        let parameters = vec![MacroParameter::Nonterminal {
            symbol: "expression".to_string(),
            name: Some("expression".to_string()),
        }];
        let definition = Node::FunctionLiteral {
            parameters: vec!["__usage_context__".to_string(), "expression".to_string()],
            body: Box::new(sequence(vec![Node::Return(Box::new(
                Node::BinaryOperation {
                    op: BinaryOp::Multiply,
                    left: Box::new(Node::VariableAccess("expression".to_string())),
                    right: number(2.0),
                },
            ))])),
        };
        Node::MacroDefinition {
            exported: false,
            head: "twice".to_string(),
            parameters: parameters.clone(),
            definition: Box::new(definition),
        }
        .execute(&context)
        .expect("definition executes");

        let usage = Node::MacroUse {
            head: "twice".to_string(),
            parameters,
            children: vec![Node::NumberLiteral(21.0)],
        };
        assert_eq!(usage.evaluate(&context), Ok(Value::Number(42.0)));
    }

    #[test]
    fn undefined_macros_are_an_error() {
        let context = Context::new();
        let usage = Node::MacroUse {
            head: "gone".to_string(),
            parameters: vec![],
            children: vec![],
        };
        assert_eq!(
            usage.evaluate(&context),
            Err(EvalError::UndefinedMacro("gone".to_string()))
        );
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let context = Context::new();
        let division = Node::BinaryOperation {
            op: BinaryOp::Divide,
            left: number(1.0),
            right: number(0.0),
        };
        assert_eq!(division.evaluate(&context), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn attribute_round_trip() {
        let context = Context::new();
        context.declare_and_assign("o", Value::Object(crate::value::Object::new()));
        let assignment = Node::AttributeAssignment {
            object: Box::new(Node::VariableAccess("o".to_string())),
            attribute: "size".to_string(),
            value: number(3.0),
        };
        assert_eq!(assignment.execute(&context), Ok(Flow::Next));
        let access = Node::AttributeAccess {
            object: Box::new(Node::VariableAccess("o".to_string())),
            attribute: "size".to_string(),
        };
        assert_eq!(access.evaluate(&context), Ok(Value::Number(3.0)));
    }
}
