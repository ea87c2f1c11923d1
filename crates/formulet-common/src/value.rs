use std::fmt::{self, Display};

/// A value the interpreter produces or consumes.
///
/// The numeric representation is an IEEE-754 double; integer-like host
/// inputs are widened on construction via the `From` impls below. `NaN` is
/// a valid number and flows through aggregates unchanged.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value. A valid top-level result, distinct from every error.
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Ordered, zero-indexed sequence. Elements may themselves be sequences.
    Seq(Vec<Value>),
    /// Insertion-ordered mapping from string keys to values.
    Record(Vec<(String, Value)>),
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_seq(&self) -> bool {
        matches!(self, Value::Seq(_))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Value::Record(_))
    }

    /// Scalar means: not a sequence and not a record.
    pub fn is_scalar(&self) -> bool {
        !self.is_seq() && !self.is_record()
    }

    /// A sequence whose every element is a record.
    pub fn is_record_seq(&self) -> bool {
        match self {
            Value::Seq(items) => !items.is_empty() && items.iter().all(Value::is_record),
            _ => false,
        }
    }

    /// Key lookup on a record, by exact key match.
    pub fn record_get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// The record's values in insertion order.
    pub fn record_values(&self) -> Option<Vec<&Value>> {
        match self {
            Value::Record(fields) => Some(fields.iter().map(|(_, v)| v).collect()),
            _ => None,
        }
    }
}

/* ───────────────────── Host-side constructors ─────────────────────── */

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
