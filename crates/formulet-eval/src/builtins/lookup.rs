//! Data lookup functions over sequences and records.

use super::utils::flatten_args;
use crate::coercion::{loose_eq, numeric_view, to_number};
use crate::function::{ArgumentHandle, EvalContext, Function};
use formulet_common::{EngineError, Value};

/* ─────────────────────────── INDEX() ──────────────────────────── */

#[derive(Debug)]
pub struct IndexFn;

/// `INDEX(range, row, [col])` with 1-based indices.
///
/// `col` is either a 1-based position (into a row sequence or a record's
/// insertion-ordered values) or a string key for record lookup. Anything
/// out of bounds is `#REF!`.
impl Function for IndexFn {
    fn name(&self) -> &'static str {
        "INDEX"
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
        let range = args[0].value()?;
        let rows: Vec<Value> = match range.as_ref() {
            Value::Null => Vec::new(),
            Value::Seq(items) => items.clone(),
            scalar => vec![scalar.clone()],
        };
        let row = to_number(args[1].value()?.as_ref())?.trunc();
        if row < 1.0 || row as usize > rows.len() {
            return Err(EngineError::new_ref()
                .with_message(format!("INDEX row {row} is out of bounds")));
        }
        let element = &rows[row as usize - 1];

        let Some(col_arg) = args.get(2) else {
            return Ok(element.clone());
        };
        let col = col_arg.value()?;
        match col.as_ref() {
            Value::Text(key) => element.record_get(key).cloned().ok_or_else(|| {
                EngineError::new_ref().with_message(format!("INDEX key '{key}' not found"))
            }),
            other => {
                let c = to_number(other)?.trunc();
                if c < 1.0 {
                    return Err(EngineError::new_ref()
                        .with_message("INDEX column index is 1-based"));
                }
                let values: Vec<&Value> = match element {
                    Value::Seq(items) => items.iter().collect(),
                    Value::Record(_) => element.record_values().expect("record"),
                    _ => {
                        return Err(EngineError::new_value().with_message(
                            "INDEX column lookup requires a sequence or record row",
                        ));
                    }
                };
                values
                    .get(c as usize - 1)
                    .map(|v| (*v).clone())
                    .ok_or_else(|| {
                        EngineError::new_ref()
                            .with_message(format!("INDEX column {c} is out of bounds"))
                    })
            }
        }
    }
}

/* ─────────────────────────── VLOOKUP() ──────────────────────────── */

#[derive(Debug)]
pub struct VLookupFn;

/// `VLOOKUP(key, range, colIndex, [exactMatch])` over a sequence of
/// records.
///
/// The first key of each record is the match column. With `exactMatch`
/// false and both sides reading as numbers, the record with the largest
/// first-column value not exceeding the key wins. No match is `#N/A`.
impl Function for VLookupFn {
    fn name(&self) -> &'static str {
        "VLOOKUP"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn max_args(&self) -> Option<usize> {
        Some(4)
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError> {
        let key = args[0].value()?.into_owned();
        let range = args[1].value()?;
        let Value::Seq(records) = range.as_ref() else {
            return Err(EngineError::new_value()
                .with_message("VLOOKUP range must be a sequence of records"));
        };
        let col = to_number(args[2].value()?.as_ref())?.trunc();
        if col < 1.0 {
            return Err(EngineError::new_ref()
                .with_message("VLOOKUP column index is 1-based"));
        }
        let exact = match args.get(3) {
            Some(arg) => crate::coercion::to_logical(arg.value()?.as_ref())?,
            None => true,
        };

        let mut best: Option<(&Value, f64)> = None;
        for rec in records {
            let Value::Record(fields) = rec else {
                return Err(EngineError::new_value()
                    .with_message("VLOOKUP range must contain records"));
            };
            let Some((_, first)) = fields.first() else {
                continue;
            };
            if loose_eq(&key, first) {
                return project_column(rec, col as usize);
            }
            if !exact {
                if let (Some(k), Some(f)) = (numeric_view(&key), numeric_view(first)) {
                    if f <= k && best.map_or(true, |(_, b)| f > b) {
                        best = Some((rec, f));
                    }
                }
            }
        }
        if let Some((rec, _)) = best {
            return project_column(rec, col as usize);
        }
        Err(EngineError::new_na().with_message("VLOOKUP found no match"))
    }
}

fn project_column(rec: &Value, col: usize) -> Result<Value, EngineError> {
    let values = rec.record_values().expect("record");
    values.get(col - 1).map(|v| (*v).clone()).ok_or_else(|| {
        EngineError::new_ref().with_message(format!("VLOOKUP column {col} is out of bounds"))
    })
}

/* ─────────────────────────── UNIQUE() ──────────────────────────── */

#[derive(Debug)]
pub struct UniqueFn;

/// Deep-flattens, then deduplicates preserving first-seen order. Returns
/// a fresh sequence; inputs are never mutated.
impl Function for UniqueFn {
    fn name(&self) -> &'static str {
        "UNIQUE"
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
        let mut out: Vec<Value> = Vec::new();
        for el in flatten_args(args)? {
            if !out.iter().any(|seen| loose_eq(seen, &el)) {
                out.push(el);
            }
        }
        Ok(Value::Seq(out))
    }
}

pub fn register_builtins() {
    use std::sync::Arc;
    crate::function_registry::register_function(Arc::new(IndexFn));
    crate::function_registry::register_function(Arc::new(VLookupFn));
    crate::function_registry::register_function(Arc::new(UniqueFn));
}
