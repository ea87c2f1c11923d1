//! Coercion and equality utilities shared by the interpreter and the
//! built-in library.

use formulet_common::{EngineError, Value};

/// Parse a decimal string: optional sign, digits, optional `.` fraction.
/// The whole string must be consumed. Exponents and locale separators are
/// rejected.
pub fn parse_decimal(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    let body = t.strip_prefix(['+', '-']).unwrap_or(t);
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    t.parse::<f64>().ok()
}

/// Numeric coercion.
///
/// Booleans map to 0/1; strings must fully parse as a decimal; null is
/// `#N/A` (value required but absent); sequences and records are `#VALUE!`.
pub fn to_number(v: &Value) -> Result<f64, EngineError> {
    match v {
        Value::Number(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => parse_decimal(s).ok_or_else(|| {
            EngineError::new_value().with_message(format!("Cannot convert '{s}' to number"))
        }),
        Value::Null => Err(EngineError::new_na().with_message("Value is not available")),
        Value::Seq(_) | Value::Record(_) => {
            Err(EngineError::new_value().with_message("Expected a scalar number"))
        }
    }
}

/// Boolean coercion.
///
/// Null is false at call time; numbers are `!= 0`; the strings
/// `"true"`/`"false"` (any case) are accepted, all other strings are
/// `#VALUE!`.
pub fn to_logical(v: &Value) -> Result<bool, EngineError> {
    match v {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(*n != 0.0),
        Value::Text(s) => {
            if s.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if s.eq_ignore_ascii_case("false") {
                Ok(false)
            } else {
                Err(EngineError::new_value()
                    .with_message(format!("Cannot convert '{s}' to boolean")))
            }
        }
        Value::Seq(_) | Value::Record(_) => {
            Err(EngineError::new_value().with_message("Expected a scalar boolean"))
        }
    }
}

/// Stringification. Numbers use round-trip decimal; null renders empty.
///
/// Call sites where null must propagate instead (everywhere except
/// `CONCAT` and criterion matching) check for null before calling this.
pub fn to_text(v: &Value) -> String {
    v.to_string()
}

/// Recursively unwrap sequences (but not strings and not records) into a
/// flat left-to-right list. Returns fresh values; inputs are untouched.
pub fn flatten_value(v: &Value, out: &mut Vec<Value>) {
    match v {
        Value::Seq(items) => {
            for item in items {
                flatten_value(item, out);
            }
        }
        other => out.push(other.clone()),
    }
}

/// Deep-flatten a value into an owned flat sequence.
pub fn flatten(v: &Value) -> Vec<Value> {
    let mut out = Vec::new();
    flatten_value(v, &mut out);
    out
}

/// Numeric reading without coercion of booleans: a number, or a string
/// that fully parses as a decimal. Used by `ISNUMBER`, approximate
/// `VLOOKUP` and criterion matching.
pub fn numeric_view(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => Some(*n),
        Value::Text(s) => parse_decimal(s),
        _ => None,
    }
}

/// Strict same-kind equality used by `SWITCH`, `UNIQUE` and criterion
/// matching: both null, both numbers comparing equal, both strings equal,
/// or both booleans equal. No cross-kind equality.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulet_common::ErrorKind;

    #[test]
    fn decimal_parsing_is_strict() {
        assert_eq!(parse_decimal("42"), Some(42.0));
        assert_eq!(parse_decimal(" -1.5 "), Some(-1.5));
        assert_eq!(parse_decimal("+0.25"), Some(0.25));
        assert_eq!(parse_decimal("1e5"), None);
        assert_eq!(parse_decimal("nan"), None);
        assert_eq!(parse_decimal("12x"), None);
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("-"), None);
    }

    #[test]
    fn number_coercion() {
        assert_eq!(to_number(&Value::Bool(true)).unwrap(), 1.0);
        assert_eq!(to_number(&Value::Text("3.5".into())).unwrap(), 3.5);
        assert_eq!(to_number(&Value::Text("x".into())).unwrap_err().kind, ErrorKind::Value);
        assert_eq!(to_number(&Value::Null).unwrap_err().kind, ErrorKind::Na);
        assert_eq!(
            to_number(&Value::Seq(vec![Value::Number(1.0)])).unwrap_err().kind,
            ErrorKind::Value
        );
    }

    #[test]
    fn logical_coercion() {
        assert!(!to_logical(&Value::Null).unwrap());
        assert!(to_logical(&Value::Number(2.0)).unwrap());
        assert!(to_logical(&Value::Text("TRUE".into())).unwrap());
        assert!(!to_logical(&Value::Text("False".into())).unwrap());
        assert_eq!(
            to_logical(&Value::Text("yes".into())).unwrap_err().kind,
            ErrorKind::Value
        );
    }

    #[test]
    fn flatten_unwraps_nested_sequences_only() {
        let v = Value::Seq(vec![
            Value::Number(1.0),
            Value::Seq(vec![Value::Number(2.0), Value::Seq(vec![Value::Text("x".into())])]),
            Value::Record(vec![("k".into(), Value::Number(9.0))]),
        ]);
        let flat = flatten(&v);
        assert_eq!(flat.len(), 4);
        assert_eq!(flat[0], Value::Number(1.0));
        assert_eq!(flat[2], Value::Text("x".into()));
        assert!(flat[3].is_record());
    }

    #[test]
    fn loose_equality_has_no_cross_kind_matches() {
        assert!(loose_eq(&Value::Null, &Value::Null));
        assert!(loose_eq(&Value::Number(2.0), &Value::Number(2.0)));
        assert!(!loose_eq(&Value::Number(1.0), &Value::Bool(true)));
        assert!(!loose_eq(&Value::Text("1".into()), &Value::Number(1.0)));
    }
}
