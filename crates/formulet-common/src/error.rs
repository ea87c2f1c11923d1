//! Spreadsheet-style error representation for the evaluation engine.
//!
//! - **`ErrorKind`**   : the closed set of error kinds the engine can raise
//! - **`EngineError`** : kind + optional human-readable message
//!
//! The six spreadsheet kinds render exactly as a spreadsheet shows them
//! (`#DIV/0!`, `#N/A`, …). The three engine-internal kinds (`Unsafe`,
//! `Compile`, `Expression`) get stable codes of the same shape so hosts can
//! log and dispatch on them uniformly.

use std::{error::Error, fmt};

/// All error kinds the engine can produce.
///
/// Names are CamelCase (idiomatic Rust) while `Display` renders the
/// canonical short codes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad type or failed coercion.
    Value,
    /// Unknown parameter name, or an index outside its collection.
    Ref,
    /// Call to an unregistered function.
    Name,
    /// Numerically invalid operation.
    Num,
    /// Division (or `MOD`) by zero.
    Div,
    /// Value not available.
    Na,
    /// Rejected by the safety gate before parsing.
    Unsafe,
    /// Lexer/parser failure.
    Compile,
    /// Runtime failure not attributable to a more specific kind.
    Expression,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl ErrorKind {
    /// The stable short code used as this kind's string form.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Value => "#VALUE!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Num => "#NUM!",
            Self::Div => "#DIV/0!",
            Self::Na => "#N/A",
            Self::Unsafe => "#UNSAFE!",
            Self::Compile => "#COMPILE!",
            Self::Expression => "#ERROR!",
        }
    }

    /// Parse a short code back into its kind.
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "#VALUE!" => Some(Self::Value),
            "#REF!" => Some(Self::Ref),
            "#NAME?" => Some(Self::Name),
            "#NUM!" => Some(Self::Num),
            "#DIV/0!" => Some(Self::Div),
            "#N/A" => Some(Self::Na),
            "#UNSAFE!" => Some(Self::Unsafe),
            "#COMPILE!" => Some(Self::Compile),
            "#ERROR!" => Some(Self::Expression),
            _ => None,
        }
    }
}

/// The single error struct the engine passes around.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineError {
    pub kind: ErrorKind,
    pub message: Option<String>,
}

/* ───────────────────── Constructors & helpers ─────────────────────── */

impl From<ErrorKind> for EngineError {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }
}

impl EngineError {
    /// Basic constructor (no message).
    pub fn new(kind: ErrorKind) -> Self {
        kind.into()
    }

    /// Attach a human-readable explanation.
    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    pub fn new_value() -> Self {
        Self::new(ErrorKind::Value)
    }
    pub fn new_ref() -> Self {
        Self::new(ErrorKind::Ref)
    }
    pub fn new_name() -> Self {
        Self::new(ErrorKind::Name)
    }
    pub fn new_num() -> Self {
        Self::new(ErrorKind::Num)
    }
    pub fn new_div() -> Self {
        Self::new(ErrorKind::Div)
    }
    pub fn new_na() -> Self {
        Self::new(ErrorKind::Na)
    }

    /// The stable short code for this error's kind.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/* ───────────────────────── Display / Error ────────────────────────── */

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(ref msg) = self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl Error for EngineError {}

impl From<EngineError> for String {
    fn from(error: EngineError) -> Self {
        format!("{error}")
    }
}

impl PartialEq<str> for ErrorKind {
    fn eq(&self, other: &str) -> bool {
        self.code() == other
    }
}

impl PartialEq<&str> for EngineError {
    fn eq(&self, other: &&str) -> bool {
        self.code() == *other
    }
}

impl PartialEq<str> for EngineError {
    fn eq(&self, other: &str) -> bool {
        self.code() == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for kind in [
            ErrorKind::Value,
            ErrorKind::Ref,
            ErrorKind::Name,
            ErrorKind::Num,
            ErrorKind::Div,
            ErrorKind::Na,
            ErrorKind::Unsafe,
            ErrorKind::Compile,
            ErrorKind::Expression,
        ] {
            assert_eq!(ErrorKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ErrorKind::from_code("#BOGUS!"), None);
    }

    #[test]
    fn display_includes_message() {
        let e = EngineError::new_div().with_message("MOD divisor is zero");
        assert_eq!(e.to_string(), "#DIV/0!: MOD divisor is zero");
        assert_eq!(e, "#DIV/0!");
    }

    #[test]
    fn kind_compares_against_code() {
        assert!(ErrorKind::Na == *"#N/A");
        assert_eq!(EngineError::new_name().code(), "#NAME?");
    }
}
