//! Caller-supplied parameter environment.
//!
//! `@name` references resolve against a [`Params`] map at evaluation time.
//! The map exposes four dereferencing forms; the interpreter itself
//! resolves references lazily and lets each built-in's argument contract
//! drive coercion, which produces the same observable behavior.

use crate::coercion::{flatten, to_number};
use formulet_common::{EngineError, Value};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct Params {
    map: FxHashMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.map.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.map.insert(name.into(), value.into());
    }

    /// Raw lookup; the key must match exactly.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn lookup(&self, name: &str) -> Result<&Value, EngineError> {
        self.map.get(name).ok_or_else(|| {
            EngineError::new_ref().with_message(format!("Unknown parameter '@{name}'"))
        })
    }

    /// Scalar dereference: null is `#N/A`; a sequence passes through raw
    /// for the caller to flatten.
    pub fn scalar(&self, name: &str) -> Result<&Value, EngineError> {
        let v = self.lookup(name)?;
        if v.is_null() {
            return Err(EngineError::new_na()
                .with_message(format!("Parameter '@{name}' has no value")));
        }
        Ok(v)
    }

    /// Sequence dereference: scalars wrap into a singleton, null becomes
    /// an empty sequence, nested sequences are flattened.
    pub fn sequence(&self, name: &str) -> Result<Vec<Value>, EngineError> {
        let v = self.lookup(name)?;
        Ok(match v {
            Value::Null => Vec::new(),
            other => flatten(other),
        })
    }

    /// Numeric dereference; sequences are not allowed here.
    pub fn number(&self, name: &str) -> Result<f64, EngineError> {
        to_number(self.lookup(name)?)
    }

    /// Numeric-sequence dereference: each element is coerced.
    pub fn numeric_sequence(&self, name: &str) -> Result<Vec<f64>, EngineError> {
        self.sequence(name)?.iter().map(to_number).collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params {
            map: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<FxHashMap<String, Value>> for Params {
    fn from(map: FxHashMap<String, Value>) -> Self {
        Params { map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulet_common::ErrorKind;

    #[test]
    fn unknown_name_is_a_ref_error_in_every_form() {
        let p = Params::new();
        assert_eq!(p.scalar("x").unwrap_err().kind, ErrorKind::Ref);
        assert_eq!(p.sequence("x").unwrap_err().kind, ErrorKind::Ref);
        assert_eq!(p.number("x").unwrap_err().kind, ErrorKind::Ref);
        assert_eq!(p.numeric_sequence("x").unwrap_err().kind, ErrorKind::Ref);
    }

    #[test]
    fn scalar_form_rejects_null_with_na() {
        let p = Params::new().with("x", Value::Null);
        assert_eq!(p.scalar("x").unwrap_err().kind, ErrorKind::Na);
    }

    #[test]
    fn sequence_form_wraps_and_empties() {
        let p = Params::new()
            .with("s", 5i64)
            .with("n", Value::Null)
            .with("a", vec![1i64, 2, 3]);
        assert_eq!(p.sequence("s").unwrap(), vec![Value::Number(5.0)]);
        assert!(p.sequence("n").unwrap().is_empty());
        assert_eq!(p.sequence("a").unwrap().len(), 3);
    }

    #[test]
    fn numeric_forms_coerce() {
        let p = Params::new()
            .with("x", "2.5")
            .with("a", vec!["1", "2"])
            .with("bad", vec!["1", "x"]);
        assert_eq!(p.number("x").unwrap(), 2.5);
        assert_eq!(p.numeric_sequence("a").unwrap(), vec![1.0, 2.0]);
        assert_eq!(p.numeric_sequence("bad").unwrap_err().kind, ErrorKind::Value);
    }
}
