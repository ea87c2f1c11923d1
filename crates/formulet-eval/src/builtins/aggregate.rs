//! Variadic arithmetic aggregates.
//!
//! The nullability policies here differ on purpose: `SUM` coerces scalar
//! argument groups and filters sequence elements to numbers, `AVERAGE` and
//! `MAX` turn an uncoercible element into a visible `NaN`, and `MIN`
//! raises. Tests encode the differences; do not normalize them.

use super::utils::flatten_args;
use crate::coercion::{flatten_value, to_number};
use crate::function::{ArgumentHandle, EvalContext, Function};
use formulet_common::{EngineError, Value};

/* ─────────────────────────── SUM() ──────────────────────────── */

#[derive(Debug)]
pub struct SumFn;

/// Adds numeric values across scalars and sequences.
///
/// Scalar arguments are coerced (an unparseable scalar is `#VALUE!`);
/// sequence elements contribute only when they are numbers. Nulls
/// contribute nothing.
impl Function for SumFn {
    fn name(&self) -> &'static str {
        "SUM"
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
        let mut total = 0.0;
        for arg in args {
            let v = arg.value()?;
            match v.as_ref() {
                Value::Seq(_) => {
                    let mut flat = Vec::new();
                    flatten_value(v.as_ref(), &mut flat);
                    for el in &flat {
                        if let Value::Number(n) = el {
                            total += n;
                        }
                    }
                }
                Value::Null => {}
                scalar => total += to_number(scalar)?,
            }
        }
        Ok(Value::Number(total))
    }
}

/* ─────────────────────────── AVERAGE() ──────────────────────────── */

#[derive(Debug)]
pub struct AverageFn;

/// Arithmetic mean over the flattened arguments.
///
/// Nulls are skipped; any non-null element that fails numeric coercion
/// makes the whole result `NaN`, as does an empty input.
impl Function for AverageFn {
    fn name(&self) -> &'static str {
        "AVERAGE"
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
        let elements = flatten_args(args)?;
        let mut sum = 0.0;
        let mut count = 0usize;
        for el in &elements {
            if el.is_null() {
                continue;
            }
            match to_number(el) {
                Ok(n) => {
                    sum += n;
                    count += 1;
                }
                Err(_) => return Ok(Value::Number(f64::NAN)),
            }
        }
        if count == 0 {
            return Ok(Value::Number(f64::NAN));
        }
        Ok(Value::Number(sum / count as f64))
    }
}

/* ─────────────────────────── MAX() ──────────────────────────── */

#[derive(Debug)]
pub struct MaxFn;

impl Function for MaxFn {
    fn name(&self) -> &'static str {
        "MAX"
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
        let elements = flatten_args(args)?;
        let mut best: Option<f64> = None;
        for el in &elements {
            if el.is_null() {
                continue;
            }
            match to_number(el) {
                Ok(n) => {
                    best = Some(match best {
                        Some(b) if b >= n => b,
                        _ => n,
                    });
                }
                Err(_) => return Ok(Value::Number(f64::NAN)),
            }
        }
        Ok(Value::Number(best.unwrap_or(f64::NAN)))
    }
}

/* ─────────────────────────── MIN() ──────────────────────────── */

#[derive(Debug)]
pub struct MinFn;

/// Minimum over the non-null elements. Unlike `MAX`, an uncoercible
/// element raises `#VALUE!` instead of producing `NaN`.
impl Function for MinFn {
    fn name(&self) -> &'static str {
        "MIN"
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
        let elements = flatten_args(args)?;
        let mut best: Option<f64> = None;
        for el in &elements {
            if el.is_null() {
                continue;
            }
            let n = to_number(el)?;
            best = Some(match best {
                Some(b) if b <= n => b,
                _ => n,
            });
        }
        Ok(Value::Number(best.unwrap_or(f64::NAN)))
    }
}

/* ─────────────────────────── COUNT() ──────────────────────────── */

#[derive(Debug)]
pub struct CountFn;

/// Counts elements of numeric type only.
impl Function for CountFn {
    fn name(&self) -> &'static str {
        "COUNT"
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
        let elements = flatten_args(args)?;
        let count = elements
            .iter()
            .filter(|el| matches!(el, Value::Number(_)))
            .count();
        Ok(Value::Number(count as f64))
    }
}

/* ─────────────────────────── COUNTA() ──────────────────────────── */

#[derive(Debug)]
pub struct CountAFn;

/// Counts non-null elements of any type.
impl Function for CountAFn {
    fn name(&self) -> &'static str {
        "COUNTA"
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
        let elements = flatten_args(args)?;
        let count = elements.iter().filter(|el| !el.is_null()).count();
        Ok(Value::Number(count as f64))
    }
}

pub fn register_builtins() {
    use std::sync::Arc;
    crate::function_registry::register_function(Arc::new(SumFn));
    crate::function_registry::register_function(Arc::new(AverageFn));
    crate::function_registry::register_function(Arc::new(MaxFn));
    crate::function_registry::register_function(Arc::new(MinFn));
    crate::function_registry::register_function(Arc::new(CountFn));
    crate::function_registry::register_function(Arc::new(CountAFn));
}
