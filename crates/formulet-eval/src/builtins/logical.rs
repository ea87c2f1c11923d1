//! Logical aggregates and conditionals.
//!
//! The branch arguments of `IF`, `IFS` and `SWITCH` are received as lazy
//! handles; only the selected branch is ever evaluated.

use super::utils::flatten_args;
use crate::coercion::{loose_eq, to_logical};
use crate::function::{ArgumentHandle, EvalContext, Function};
use formulet_common::{EngineError, Value};

/* ─────────────────────────── AND() ──────────────────────────── */

#[derive(Debug)]
pub struct AndFn;

/// All elements truthy after boolean coercion; nulls count as false. An
/// uncoercible element is `#VALUE!`.
impl Function for AndFn {
    fn name(&self) -> &'static str {
        "AND"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn variadic(&self) -> bool {
        true
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        for el in &flatten_args(args)? {
            if !to_logical(el)? {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    }
}

/* ─────────────────────────── OR() ──────────────────────────── */

#[derive(Debug)]
pub struct OrFn;

/// Any element truthy. Never raises on mixed types; elements that cannot
/// be coerced simply do not count.
impl Function for OrFn {
    fn name(&self) -> &'static str {
        "OR"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn variadic(&self) -> bool {
        true
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        for el in &flatten_args(args)? {
            if to_logical(el).unwrap_or(false) {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    }
}

/* ─────────────────────────── XOR() ──────────────────────────── */

#[derive(Debug)]
pub struct XorFn;

/// Parity of the truthy count.
impl Function for XorFn {
    fn name(&self) -> &'static str {
        "XOR"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn variadic(&self) -> bool {
        true
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let mut true_count = 0usize;
        for el in &flatten_args(args)? {
            if to_logical(el)? {
                true_count += 1;
            }
        }
        Ok(Value::Bool(true_count % 2 == 1))
    }
}

/* ─────────────────────────── NOT() ──────────────────────────── */

#[derive(Debug)]
pub struct NotFn;

/// Null negates to true; everything else goes through boolean coercion.
impl Function for NotFn {
    fn name(&self) -> &'static str {
        "NOT"
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
        Ok(Value::Bool(!to_logical(v.as_ref())?))
    }
}

/* ─────────────────────────── IF() ──────────────────────────── */

#[derive(Debug)]
pub struct IfFn;

impl Function for IfFn {
    fn name(&self) -> &'static str {
        "IF"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let cond = to_logical(args[0].value()?.as_ref())?;
        if cond {
            args[1].value().map(|v| v.into_owned())
        } else {
            match args.get(2) {
                Some(arg) => arg.value().map(|v| v.into_owned()),
                None => Ok(Value::Null),
            }
        }
    }
}

/* ─────────────────────────── IFS() ──────────────────────────── */

#[derive(Debug)]
pub struct IfsFn;

/// `IFS(c1, v1, c2, v2, …)`: the value paired with the first truthy
/// condition; null when nothing matches; `#VALUE!` on an odd argument
/// count.
impl Function for IfsFn {
    fn name(&self) -> &'static str {
        "IFS"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn variadic(&self) -> bool {
        true
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        if args.len() % 2 != 0 {
            return Err(EngineError::new_value()
                .with_message("IFS expects condition/value pairs"));
        }
        for pair in args.chunks(2) {
            if to_logical(pair[0].value()?.as_ref())? {
                return pair[1].value().map(|v| v.into_owned());
            }
        }
        Ok(Value::Null)
    }
}

/* ─────────────────────────── SWITCH() ──────────────────────────── */

#[derive(Debug)]
pub struct SwitchFn;

/// `SWITCH(key, c1, v1, …, [default])`: same-kind equality against each
/// case; a trailing odd argument is the default.
impl Function for SwitchFn {
    fn name(&self) -> &'static str {
        "SWITCH"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn variadic(&self) -> bool {
        true
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let key = args[0].value()?.into_owned();
        let mut i = 1;
        while i + 1 < args.len() {
            let case = args[i].value()?;
            if loose_eq(&key, case.as_ref()) {
                return args[i + 1].value().map(|v| v.into_owned());
            }
            i += 2;
        }
        if i < args.len() {
            // Trailing odd argument is the default branch.
            return args[i].value().map(|v| v.into_owned());
        }
        Ok(Value::Null)
    }
}

pub fn register_builtins() {
    use std::sync::Arc;
    crate::function_registry::register_function(Arc::new(AndFn));
    crate::function_registry::register_function(Arc::new(OrFn));
    crate::function_registry::register_function(Arc::new(XorFn));
    crate::function_registry::register_function(Arc::new(NotFn));
    crate::function_registry::register_function(Arc::new(IfFn));
    crate::function_registry::register_function(Arc::new(IfsFn));
    crate::function_registry::register_function(Arc::new(SwitchFn));
}
