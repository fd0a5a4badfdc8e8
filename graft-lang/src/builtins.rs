//! The built-in variable table installed into every module's top-level
//! context.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::context::Context;
use crate::error::EvalError;
use crate::value::{Object, Value};

/// Where `print` writes. Shared so tests can capture output.
pub type OutSink = Rc<RefCell<dyn Write>>;

/// Installs the built-ins: `None`, `True`, `False`, `print`, `object`.
pub fn install(context: &Context, out: &OutSink) {
    context.declare_and_assign("None", Value::Unit);
    context.declare_and_assign("True", Value::Bool(true));
    context.declare_and_assign("False", Value::Bool(false));

    let sink = Rc::clone(out);
    context.declare_and_assign(
        "print",
        Value::native("print", move |arguments| {
            let mut sink = sink.borrow_mut();
            let mut separate = false;
            for argument in arguments {
                if separate {
                    write!(sink, " ").map_err(output_error)?;
                }
                write!(sink, "{}", argument).map_err(output_error)?;
                separate = true;
            }
            writeln!(sink).map_err(output_error)?;
            Ok(Value::Unit)
        }),
    );

    context.declare_and_assign(
        "object",
        Value::native("object", |_arguments| Ok(Value::Object(Object::new()))),
    );
}

fn output_error(error: std::io::Error) -> EvalError {
    EvalError::Output(error.to_string())
}
