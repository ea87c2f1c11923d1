//! Criterion-driven aggregation: COUNTIF, SUMIF, AVERAGEIF.
//!
//! A criterion is a string shaped as `op value` where the prefix is
//! detected in the order `>=`, `<=`, `<>`, `>`, `<`, `=`, then bare text.
//! Relational criteria require a numeric operand; equality compares by
//! string form, or numerically within `1e-7` when both sides parse.

use super::utils::sequence_arg;
use crate::coercion::{numeric_view, parse_decimal, to_number, to_text};
use crate::function::{ArgumentHandle, EvalContext, Function};
use dashmap::DashMap;
use formulet_common::{EngineError, Value};
use once_cell::sync::Lazy;

const NUMERIC_EQ_EPSILON: f64 = 1e-7;

/// Parsed criterion predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    Gt(f64),
    Ge(f64),
    Lt(f64),
    Le(f64),
    /// `<>` is a string-inequality test on the stringified element.
    NeText(String),
    /// `=` prefix and bare criteria.
    EqLoose(String),
}

// Parsed criteria are memoized process-wide; the facade reports this
// map's occupancy as the second half of its cache statistics.
static CRITERIA_CACHE: Lazy<DashMap<String, Criteria>> = Lazy::new(DashMap::new);
const CRITERIA_CACHE_CAP: usize = 512;

pub fn criteria_cache_len() -> usize {
    CRITERIA_CACHE.len()
}

pub fn clear_criteria_cache() {
    CRITERIA_CACHE.clear();
}

pub fn parse_criteria(raw: &str) -> Result<Criteria, EngineError> {
    if let Some(hit) = CRITERIA_CACHE.get(raw) {
        return Ok(hit.value().clone());
    }
    let parsed = parse_criteria_uncached(raw)?;
    if CRITERIA_CACHE.len() >= CRITERIA_CACHE_CAP {
        // Coarse reset; criteria strings are short and cheap to re-parse.
        CRITERIA_CACHE.clear();
    }
    CRITERIA_CACHE.insert(raw.to_string(), parsed.clone());
    Ok(parsed)
}

fn parse_criteria_uncached(raw: &str) -> Result<Criteria, EngineError> {
    let t = raw.trim();
    for prefix in [">=", "<=", "<>", ">", "<", "="] {
        let Some(rest) = t.strip_prefix(prefix) else {
            continue;
        };
        return match prefix {
            "<>" => Ok(Criteria::NeText(rest.trim().to_string())),
            "=" => Ok(Criteria::EqLoose(rest.trim().to_string())),
            _ => {
                let n = parse_decimal(rest).ok_or_else(|| {
                    EngineError::new_value()
                        .with_message(format!("Criterion '{t}' needs a numeric operand"))
                })?;
                Ok(match prefix {
                    ">=" => Criteria::Ge(n),
                    "<=" => Criteria::Le(n),
                    ">" => Criteria::Gt(n),
                    "<" => Criteria::Lt(n),
                    _ => unreachable!(),
                })
            }
        };
    }
    Ok(Criteria::EqLoose(t.to_string()))
}

/// Does one element satisfy the criterion?
pub fn criteria_match(c: &Criteria, v: &Value) -> bool {
    match c {
        Criteria::Gt(n) => numeric_view(v).is_some_and(|x| x > *n),
        Criteria::Ge(n) => numeric_view(v).is_some_and(|x| x >= *n),
        Criteria::Lt(n) => numeric_view(v).is_some_and(|x| x < *n),
        Criteria::Le(n) => numeric_view(v).is_some_and(|x| x <= *n),
        Criteria::NeText(s) => to_text(v) != *s,
        Criteria::EqLoose(s) => {
            if let (Some(a), Some(b)) = (numeric_view(v), parse_decimal(s)) {
                (a - b).abs() < NUMERIC_EQ_EPSILON
            } else {
                to_text(v) == *s
            }
        }
    }
}

fn criterion_arg<'a, 'b>(arg: &ArgumentHandle<'a, 'b>) -> Result<Criteria, EngineError> {
    let v = arg.value()?;
    match v.as_ref() {
        Value::Text(s) => parse_criteria(s),
        // Non-string criteria compare by their string form.
        other => parse_criteria(&to_text(other)),
    }
}

/// Pair element `i` of the range with element `i` of the companion; a
/// missing companion position contributes nothing.
fn paired_aggregate<'a, 'b>(
    args: &'a [ArgumentHandle<'a, 'b>],
) -> Result<(f64, usize), EngineError> {
    let range = sequence_arg(&args[0])?;
    let criteria = criterion_arg(&args[1])?;
    let companion = match args.get(2) {
        Some(arg) => Some(sequence_arg(arg)?),
        None => None,
    };

    let mut sum = 0.0;
    let mut count = 0usize;
    for (i, el) in range.iter().enumerate() {
        if !criteria_match(&criteria, el) {
            continue;
        }
        let target = match &companion {
            Some(seq) => seq.get(i).unwrap_or(&Value::Null),
            None => el,
        };
        if target.is_null() {
            continue;
        }
        if let Ok(n) = to_number(target) {
            sum += n;
            count += 1;
        }
    }
    Ok((sum, count))
}

/* ─────────────────────────── COUNTIF() ──────────────────────────── */

#[derive(Debug)]
pub struct CountIfFn;

impl Function for CountIfFn {
    fn name(&self) -> &'static str {
        "COUNTIF"
    }
    fn min_args(&self) -> usize {
        2
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let range = sequence_arg(&args[0])?;
        let criteria = criterion_arg(&args[1])?;
        let count = range
            .iter()
            .filter(|el| criteria_match(&criteria, el))
            .count();
        Ok(Value::Number(count as f64))
    }
}

/* ─────────────────────────── SUMIF() ──────────────────────────── */

#[derive(Debug)]
pub struct SumIfFn;

/// `SUMIF(range, criteria, [sum_range])`.
impl Function for SumIfFn {
    fn name(&self) -> &'static str {
        "SUMIF"
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
        let (sum, _) = paired_aggregate(args)?;
        Ok(Value::Number(sum))
    }
}

/* ─────────────────────────── AVERAGEIF() ──────────────────────────── */

#[derive(Debug)]
pub struct AverageIfFn;

/// `AVERAGEIF(range, criteria, [avg_range])`. No matching numeric element
/// is `#DIV/0!`.
impl Function for AverageIfFn {
    fn name(&self) -> &'static str {
        "AVERAGEIF"
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
        let (sum, count) = paired_aggregate(args)?;
        if count == 0 {
            return Err(EngineError::new_div()
                .with_message("AVERAGEIF matched no numeric elements"));
        }
        Ok(Value::Number(sum / count as f64))
    }
}

pub fn register_builtins() {
    use std::sync::Arc;
    crate::function_registry::register_function(Arc::new(CountIfFn));
    crate::function_registry::register_function(Arc::new(SumIfFn));
    crate::function_registry::register_function(Arc::new(AverageIfFn));
}
