//! Pre-parse safety gate.
//!
//! A purely textual validator applied before any tokenization. The patterns
//! below define the documented attack surface: none of them has a legitimate
//! use inside the formula grammar, so rejecting them outright is cheap and
//! independent of the evaluator backend.

use formulet_common::{EngineError, ErrorKind};
use once_cell::sync::Lazy;
use regex::RegexSet;

/// Maximum accepted expression length, in characters.
pub const MAX_EXPRESSION_LEN: usize = 10_000;

static UNSAFE_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        // Capability blocklist (whole word, case-insensitive).
        r"(?i)\bimport\b",
        r"(?i)\busing\s+System\.IO\b",
        r"(?i)\bProcess\b",
        r"(?i)\bAssembly\b",
        r"(?i)\bFile\b",
        r"(?i)\bDirectory\b",
        r"(?i)\bThread\b",
        r"(?i)\bTask\.Run\b",
        r"(?i)\bEnvironment\b",
        r"(?i)\bReflection\b",
        r"(?i)\bDllImport\b",
        r"(?i)\bConsole\b",
        r"(?i)\bWindow\b",
        r"(?i)\bRegistry\b",
        r"(?i)\bActivator\b",
        r"(?i)\bAppDomain\b",
        r"(?i)\bGC\.Collect\b",
        r"(?i)\bnew\s+\w*(?:Stream|Reader|Writer)\b",
        // Reflection shapes.
        r"(?i)GetType\s*\(\s*\)",
        r"(?i)GetMethod\s*\(",
        r"(?i)GetProperty\s*\(",
        r"(?i)InvokeMember\s*\(",
        r"(?i)\bInvoke\s*\(",
        r"(?i)\.CreateInstance\s*\(",
        r"(?i)Type\.GetType\s*\(",
        r"(?i)\btypeof\s*\(",
        r"(?i)System\.Reflection",
        r"(?i)this\.GetType",
        // Injection shapes.
        r"[;{}]",
        r"(?i)\bclass\s+\w+",
        r"(?i)\bnamespace\s+\w+",
        r"(?i)while\s*\(\s*true\s*\)",
        r"(?i)for\s*\(\s*;\s*;\s*\)",
        r"(?i)#\s*(?:region|endregion|if|else|endif)\b",
    ])
    .expect("unsafe pattern set compiles")
});

/// Validate an expression before parsing. Rejection kind is always `Unsafe`.
pub fn check(expression: &str) -> Result<(), EngineError> {
    if expression.chars().count() > MAX_EXPRESSION_LEN {
        tracing::debug!(len = expression.len(), "safety gate rejected oversized expression");
        return Err(EngineError::new(ErrorKind::Unsafe)
            .with_message(format!("Expression exceeds {MAX_EXPRESSION_LEN} characters")));
    }
    if UNSAFE_PATTERNS.is_match(expression) {
        tracing::debug!("safety gate rejected expression with disallowed construct");
        return Err(EngineError::new(ErrorKind::Unsafe)
            .with_message("Expression contains a disallowed construct"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulet_common::ErrorKind;

    #[test]
    fn ordinary_formulas_pass() {
        for expr in [
            "SUM(1,2,3)",
            "IF(AND(ISNUMBER(@x), NOT(ISBLANK(@x))), ABS(@x), 0)",
            "CONCAT('a', \"b\")",
            "@filename_like + 1", // substring, not whole word
        ] {
            assert!(check(expr).is_ok(), "rejected benign expression {expr:?}");
        }
    }

    #[test]
    fn blocklist_is_case_insensitive_and_positional() {
        for expr in ["file", "FILE", "SUM(1) + process", "a + IMPORT + b"] {
            let err = check(expr).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Unsafe, "accepted {expr:?}");
        }
    }

    #[test]
    fn injection_characters_rejected() {
        for expr in ["1;2", "{1}", "a}b", "while(true)", "for(;;)", "# region x"] {
            assert!(check(expr).is_err(), "accepted {expr:?}");
        }
    }

    #[test]
    fn stream_constructor_shape_rejected() {
        assert!(check("new FileStream").is_err());
        assert!(check("new   MemoryStream").is_err());
        assert!(check("new StringReader").is_err());
        assert!(check("new StreamWriter").is_err());
    }

    #[test]
    fn length_cap() {
        let long = "1+".repeat(5_001);
        let err = check(&long).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsafe);
        let ok = "1+".repeat(4_999);
        assert!(check(&format!("{ok}1")).is_ok());
    }
}
