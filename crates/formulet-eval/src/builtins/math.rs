use super::utils::numeric_arg;
use crate::function::{ArgumentHandle, EvalContext, Function};
use crate::interpreter::power;
use formulet_common::{EngineError, Value};

/* ─────────────────────────── ROUND() ──────────────────────────── */

#[derive(Debug)]
pub struct RoundFn;

/// Rounds half away from zero. A negative digit count rounds to powers of
/// ten: `ROUND(1234.5, -2)` is `1200`.
impl Function for RoundFn {
    fn name(&self) -> &'static str {
        "ROUND"
    }
    fn min_args(&self) -> usize {
        2
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let n = numeric_arg(&args[0])?;
        let digits = numeric_arg(&args[1])?.trunc() as i32;
        let factor = 10f64.powi(digits);
        Ok(Value::Number((n * factor).round() / factor))
    }
}

/* ─────────────────────────── ABS() ──────────────────────────── */

#[derive(Debug)]
pub struct AbsFn;

impl Function for AbsFn {
    fn name(&self) -> &'static str {
        "ABS"
    }
    fn min_args(&self) -> usize {
        1
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        Ok(Value::Number(numeric_arg(&args[0])?.abs()))
    }
}

/* ─────────────────────────── INT() ──────────────────────────── */

#[derive(Debug)]
pub struct IntFn;

/// Truncates toward zero.
impl Function for IntFn {
    fn name(&self) -> &'static str {
        "INT"
    }
    fn min_args(&self) -> usize {
        1
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        Ok(Value::Number(numeric_arg(&args[0])?.trunc()))
    }
}

/* ─────────────────────────── SQRT() ──────────────────────────── */

#[derive(Debug)]
pub struct SqrtFn;

impl Function for SqrtFn {
    fn name(&self) -> &'static str {
        "SQRT"
    }
    fn min_args(&self) -> usize {
        1
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let n = numeric_arg(&args[0])?;
        if n < 0.0 {
            return Err(EngineError::new_num()
                .with_message("SQRT of a negative number"));
        }
        Ok(Value::Number(n.sqrt()))
    }
}

/* ─────────────────────────── POWER() ──────────────────────────── */

#[derive(Debug)]
pub struct PowerFn;

impl Function for PowerFn {
    fn name(&self) -> &'static str {
        "POWER"
    }
    fn min_args(&self) -> usize {
        2
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let base = numeric_arg(&args[0])?;
        let exp = numeric_arg(&args[1])?;
        Ok(Value::Number(power(base, exp)?))
    }
}

/* ─────────────────────────── MOD() ──────────────────────────── */

#[derive(Debug)]
pub struct ModFn;

/// Remainder whose sign follows the divisor, matching spreadsheet
/// convention: `MOD(-3, 2)` is `1`.
impl Function for ModFn {
    fn name(&self) -> &'static str {
        "MOD"
    }
    fn min_args(&self) -> usize {
        2
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let a = numeric_arg(&args[0])?;
        let b = numeric_arg(&args[1])?;
        if b == 0.0 {
            return Err(EngineError::new_div().with_message("MOD divisor is zero"));
        }
        Ok(Value::Number(a - b * (a / b).floor()))
    }
}

pub fn register_builtins() {
    use std::sync::Arc;
    crate::function_registry::register_function(Arc::new(RoundFn));
    crate::function_registry::register_function(Arc::new(AbsFn));
    crate::function_registry::register_function(Arc::new(IntFn));
    crate::function_registry::register_function(Arc::new(SqrtFn));
    crate::function_registry::register_function(Arc::new(PowerFn));
    crate::function_registry::register_function(Arc::new(ModFn));
}
