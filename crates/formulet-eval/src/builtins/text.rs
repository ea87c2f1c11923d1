//! Text functions.
//!
//! Leniency varies on purpose: `UPPER`/`LOWER` map non-strings to the
//! empty string, while `PROPER`/`LEN`/`REPLACE` (and the first argument of
//! `LEFT`/`MID`/`RIGHT`) insist on a string and raise `#VALUE!`.

use super::utils::{flatten_args, numeric_arg, text_arg_strict};
use crate::coercion::to_text;
use crate::function::{ArgumentHandle, EvalContext, Function};
use formulet_common::{EngineError, Value};

/* ─────────────────────────── CONCAT() ──────────────────────────── */

#[derive(Debug)]
pub struct ConcatFn;

/// Flattens, stringifies and joins with nothing in between. This is the
/// one place where null stringifies to the empty string.
impl Function for ConcatFn {
    fn name(&self) -> &'static str {
        "CONCAT"
    }
    fn min_args(&self) -> usize {
        0
    }
    fn variadic(&self) -> bool {
        true
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let mut out = String::new();
        for el in &flatten_args(args)? {
            out.push_str(&to_text(el));
        }
        Ok(Value::Text(out))
    }
}

/* ─────────────────────── LEFT() / RIGHT() ─────────────────────── */

#[derive(Debug)]
pub struct LeftFn;

impl Function for LeftFn {
    fn name(&self) -> &'static str {
        "LEFT"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let s = text_arg_strict(&args[0])?;
        let n = count_arg(args.get(1))?;
        let chars: Vec<char> = s.chars().collect();
        let take = n.min(chars.len());
        Ok(Value::Text(chars[..take].iter().collect()))
    }
}

#[derive(Debug)]
pub struct RightFn;

impl Function for RightFn {
    fn name(&self) -> &'static str {
        "RIGHT"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let s = text_arg_strict(&args[0])?;
        let n = count_arg(args.get(1))?;
        let chars: Vec<char> = s.chars().collect();
        let start = chars.len().saturating_sub(n);
        Ok(Value::Text(chars[start..].iter().collect()))
    }
}

/// Optional character count: defaults to 1, clamps below at zero.
fn count_arg<'a, 'b>(
    arg: Option<&ArgumentHandle<'a, 'b>>,
) -> Result<usize, EngineError> {
    match arg {
        Some(a) => {
            let n = numeric_arg(a)?.trunc();
            Ok(if n < 0.0 { 0 } else { n as usize })
        }
        None => Ok(1),
    }
}

/* ─────────────────────────── MID() ──────────────────────────── */

#[derive(Debug)]
pub struct MidFn;

/// `MID(text, start, count)` with a 1-based start. A start before the
/// first character is out of range; a start past the end yields the empty
/// string.
impl Function for MidFn {
    fn name(&self) -> &'static str {
        "MID"
    }
    fn min_args(&self) -> usize {
        3
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let s = text_arg_strict(&args[0])?;
        let start = numeric_arg(&args[1])?.trunc();
        if start < 1.0 {
            return Err(EngineError::new_value()
                .with_message("MID start index is 1-based"));
        }
        let count = numeric_arg(&args[2])?.trunc();
        let count = if count < 0.0 { 0 } else { count as usize };
        let chars: Vec<char> = s.chars().collect();
        let from = (start as usize - 1).min(chars.len());
        let to = (from + count).min(chars.len());
        Ok(Value::Text(chars[from..to].iter().collect()))
    }
}

/* ─────────────────────────── TRIM() ──────────────────────────── */

#[derive(Debug)]
pub struct TrimFn;

/// Strips leading and trailing whitespace. Null propagates.
impl Function for TrimFn {
    fn name(&self) -> &'static str {
        "TRIM"
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
        Ok(match v.as_ref() {
            Value::Null => Value::Null,
            Value::Text(s) => Value::Text(s.trim().to_string()),
            other => Value::Text(to_text(other).trim().to_string()),
        })
    }
}

/* ───────────────────── UPPER() / LOWER() ─────────────────────── */

#[derive(Debug)]
pub struct UpperFn;

impl Function for UpperFn {
    fn name(&self) -> &'static str {
        "UPPER"
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
        Ok(match v.as_ref() {
            Value::Text(s) => Value::Text(s.to_uppercase()),
            _ => Value::Text(String::new()),
        })
    }
}

#[derive(Debug)]
pub struct LowerFn;

impl Function for LowerFn {
    fn name(&self) -> &'static str {
        "LOWER"
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
        Ok(match v.as_ref() {
            Value::Text(s) => Value::Text(s.to_lowercase()),
            _ => Value::Text(String::new()),
        })
    }
}

/* ─────────────────────────── PROPER() ──────────────────────────── */

#[derive(Debug)]
pub struct ProperFn;

impl Function for ProperFn {
    fn name(&self) -> &'static str {
        "PROPER"
    }
    fn min_args(&self) -> usize {
        1
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let s = text_arg_strict(&args[0])?;
        Ok(Value::Text(ctx.locale().title_case(&s)))
    }
}

/* ─────────────────────────── LEN() ──────────────────────────── */

#[derive(Debug)]
pub struct LenFn;

impl Function for LenFn {
    fn name(&self) -> &'static str {
        "LEN"
    }
    fn min_args(&self) -> usize {
        1
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let s = text_arg_strict(&args[0])?;
        Ok(Value::Number(s.chars().count() as f64))
    }
}

/* ─────────────────────────── REPLACE() ──────────────────────────── */

#[derive(Debug)]
pub struct ReplaceFn;

/// `REPLACE(text, old, new)` substitutes every occurrence of `old`.
impl Function for ReplaceFn {
    fn name(&self) -> &'static str {
        "REPLACE"
    }
    fn min_args(&self) -> usize {
        3
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let s = text_arg_strict(&args[0])?;
        let old = replace_operand(&args[1])?;
        if old.is_empty() {
            return Err(EngineError::new_value()
                .with_message("REPLACE search string is empty"));
        }
        let new = replace_operand(&args[2])?;
        Ok(Value::Text(s.replace(&old, &new)))
    }
}

fn replace_operand<'a, 'b>(arg: &ArgumentHandle<'a, 'b>) -> Result<String, EngineError> {
    let v = arg.value()?;
    match v.as_ref() {
        Value::Null => Err(EngineError::new_value()
            .with_message("REPLACE operands must not be null")),
        other => Ok(to_text(other)),
    }
}

pub fn register_builtins() {
    use std::sync::Arc;
    crate::function_registry::register_function(Arc::new(ConcatFn));
    crate::function_registry::register_function(Arc::new(LeftFn));
    crate::function_registry::register_function(Arc::new(RightFn));
    crate::function_registry::register_function(Arc::new(MidFn));
    crate::function_registry::register_function(Arc::new(TrimFn));
    crate::function_registry::register_function(Arc::new(UpperFn));
    crate::function_registry::register_function(Arc::new(LowerFn));
    crate::function_registry::register_function(Arc::new(ProperFn));
    crate::function_registry::register_function(Arc::new(LenFn));
    crate::function_registry::register_function(Arc::new(ReplaceFn));
}
