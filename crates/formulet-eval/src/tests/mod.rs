mod guard;
mod interpreter;

use crate::environment::Params;
use crate::interpreter::{Interpreter, Session};
use formulet_common::{EngineError, ErrorKind, Value};

/// Parse and evaluate a formula against a parameter environment.
pub(crate) fn evaluate(formula: &str, params: &Params) -> Result<Value, EngineError> {
    let ast = formulet_parse::parse(formula)
        .map_err(|e| EngineError::new(ErrorKind::Compile).with_message(e.to_string()))?;
    let session = Session::new(params, None);
    Interpreter::new(&session).evaluate(&ast)
}

pub(crate) fn record(fields: &[(&str, Value)]) -> Value {
    Value::Record(
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    )
}

pub(crate) fn number(result: Result<Value, EngineError>) -> f64 {
    match result.expect("evaluation succeeded") {
        Value::Number(n) => n,
        other => panic!("expected a number, got {other:?}"),
    }
}
