use crate::coercion::numeric_view;
use crate::function::{ArgumentHandle, EvalContext, Function};
use formulet_common::{EngineError, Value};

/* ─────────────────────────── ISBLANK() ──────────────────────────── */

#[derive(Debug)]
pub struct IsBlankFn;

/// True for null and for strings that are empty or all whitespace.
impl Function for IsBlankFn {
    fn name(&self) -> &'static str {
        "ISBLANK"
    }
    fn min_args(&self) -> usize {
        1
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let v = args[0].value()?;
        let blank = match v.as_ref() {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        };
        Ok(Value::Bool(blank))
    }
}

/* ─────────────────────────── ISNUMBER() ──────────────────────────── */

#[derive(Debug)]
pub struct IsNumberFn;

/// True for numbers (including `NaN`) and strings that fully parse as a
/// decimal.
impl Function for IsNumberFn {
    fn name(&self) -> &'static str {
        "ISNUMBER"
    }
    fn min_args(&self) -> usize {
        1
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let v = args[0].value()?;
        Ok(Value::Bool(numeric_view(v.as_ref()).is_some()))
    }
}

pub fn register_builtins() {
    use std::sync::Arc;
    crate::function_registry::register_function(Arc::new(IsBlankFn));
    crate::function_registry::register_function(Arc::new(IsNumberFn));
}
