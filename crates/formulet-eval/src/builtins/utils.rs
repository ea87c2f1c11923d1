use crate::coercion::{flatten_value, to_number};
use crate::function::ArgumentHandle;
use formulet_common::{EngineError, Value};

/// Evaluate every argument and deep-flatten into one left-to-right list.
/// Sequences unwrap recursively; strings and records stay intact.
pub fn flatten_args<'a, 'b>(
    args: &'a [ArgumentHandle<'a, 'b>],
) -> Result<Vec<Value>, EngineError> {
    let mut out = Vec::new();
    for arg in args {
        flatten_value(arg.value()?.as_ref(), &mut out);
    }
    Ok(out)
}

/// Coerce one argument to a number. Arity is already enforced by the
/// interpreter, so callers index freely.
pub fn numeric_arg<'a, 'b>(arg: &ArgumentHandle<'a, 'b>) -> Result<f64, EngineError> {
    to_number(arg.value()?.as_ref())
}

/// Require a string argument; anything else is `#VALUE!`.
pub fn text_arg_strict<'a, 'b>(arg: &ArgumentHandle<'a, 'b>) -> Result<String, EngineError> {
    match arg.value()?.as_ref() {
        Value::Text(s) => Ok(s.clone()),
        other => Err(EngineError::new_value()
            .with_message(format!("Expected a string, got {other:?}"))),
    }
}

/// Materialize an argument as a sequence: null becomes empty, scalars wrap
/// into a singleton, nested sequences flatten.
pub fn sequence_arg<'a, 'b>(
    arg: &ArgumentHandle<'a, 'b>,
) -> Result<Vec<Value>, EngineError> {
    let v = arg.value()?;
    Ok(match v.as_ref() {
        Value::Null => Vec::new(),
        other => {
            let mut out = Vec::new();
            flatten_value(other, &mut out);
            out
        }
    })
}
