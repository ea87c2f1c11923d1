use std::error::Error;
use std::fmt::{self, Display};

/// A custom error type for the tokenizer.
#[derive(Debug)]
pub struct TokenizerError {
    pub message: String,
    pub pos: usize,
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenizerError at position {}: {}", self.pos, self.message)
    }
}

impl Error for TokenizerError {}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Decimal number literal, optional fraction, no exponent.
    Number,
    /// String literal; `value` holds the decoded content.
    Str,
    /// Identifier (function name or bare keyword literal).
    Ident,
    /// `@name` parameter reference; `value` holds the name without `@`.
    ParamRef,
    LParen,
    RParen,
    Comma,
    /// One- or two-character operator glyph.
    Op,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A token in a formula expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} value: {}>", self.kind, self.value)
    }
}

impl Token {
    pub fn new(value: impl Into<String>, kind: TokenKind, start: usize, end: usize) -> Self {
        Token {
            value: value.into(),
            kind,
            start,
            end,
        }
    }
}

const TWO_CHAR_OPS: &[&str] = &["==", "!=", "<=", ">=", "&&", "||", "<<", ">>"];

/// A tokenizer for formula expressions.
///
/// Scans byte-by-byte over the source. Whitespace between tokens is
/// insignificant. Both `"…"` and `'…'` string forms are accepted and decode
/// to the same token kind; `\"`, `\'` and `\\` are the recognized escapes.
#[derive(Debug)]
pub struct Tokenizer {
    source: String,
    pub items: Vec<Token>,
    offset: usize,
}

impl Tokenizer {
    /// Create a new tokenizer and immediately scan the expression.
    pub fn new(source: &str) -> Result<Self, TokenizerError> {
        let mut tokenizer = Tokenizer {
            source: source.to_string(),
            items: Vec::with_capacity(source.len() / 2),
            offset: 0,
        };
        tokenizer.scan()?;
        Ok(tokenizer)
    }

    #[inline]
    fn current_byte(&self) -> Option<u8> {
        self.source.as_bytes().get(self.offset).copied()
    }

    fn scan(&mut self) -> Result<(), TokenizerError> {
        while let Some(b) = self.current_byte() {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.offset += 1,
                b'"' | b'\'' => self.scan_string(b)?,
                b'@' => self.scan_param_ref()?,
                b'0'..=b'9' => self.scan_number()?,
                b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.scan_ident(),
                b'(' => self.push_punct(TokenKind::LParen),
                b')' => self.push_punct(TokenKind::RParen),
                b',' => self.push_punct(TokenKind::Comma),
                b'+' | b'-' | b'*' | b'/' | b'%' | b'^' | b'=' | b'!' | b'<' | b'>' | b'&'
                | b'|' => self.scan_operator(),
                other => {
                    return Err(TokenizerError {
                        message: format!("Unexpected character '{}'", other as char),
                        pos: self.offset,
                    });
                }
            }
        }
        Ok(())
    }

    fn push_punct(&mut self, kind: TokenKind) {
        let ch = self.source.as_bytes()[self.offset] as char;
        self.items
            .push(Token::new(ch.to_string(), kind, self.offset, self.offset + 1));
        self.offset += 1;
    }

    /// Scan a string literal delimited by `"` or `'`.
    fn scan_string(&mut self, delim: u8) -> Result<(), TokenizerError> {
        let start = self.offset;
        self.offset += 1; // opening delimiter
        let bytes = self.source.as_bytes();
        let mut decoded = String::new();

        while self.offset < bytes.len() {
            let b = bytes[self.offset];
            if b == b'\\' && self.offset + 1 < bytes.len() {
                let next = bytes[self.offset + 1];
                if next == delim || next == b'\\' {
                    decoded.push(next as char);
                    self.offset += 2;
                    continue;
                }
                // Backslash before anything else stays literal.
                decoded.push('\\');
                self.offset += 1;
                continue;
            }
            if b == delim {
                self.offset += 1;
                self.items
                    .push(Token::new(decoded, TokenKind::Str, start, self.offset));
                return Ok(());
            }
            // Multi-byte UTF-8 sequences are copied through untouched.
            let ch_len = utf8_len(b);
            decoded.push_str(&self.source[self.offset..self.offset + ch_len]);
            self.offset += ch_len;
        }

        Err(TokenizerError {
            message: "Reached end of expression while parsing string".to_string(),
            pos: self.offset,
        })
    }

    /// Scan `@` immediately followed by an identifier.
    fn scan_param_ref(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;
        self.offset += 1; // '@'
        let name_start = self.offset;
        let bytes = self.source.as_bytes();
        if self
            .current_byte()
            .is_none_or(|b| !(b.is_ascii_alphabetic() || b == b'_'))
        {
            return Err(TokenizerError {
                message: "'@' must be immediately followed by a parameter name".to_string(),
                pos: start,
            });
        }
        while self.offset < bytes.len()
            && (bytes[self.offset].is_ascii_alphanumeric() || bytes[self.offset] == b'_')
        {
            self.offset += 1;
        }
        self.items.push(Token::new(
            &self.source[name_start..self.offset],
            TokenKind::ParamRef,
            start,
            self.offset,
        ));
        Ok(())
    }

    /// Scan a decimal number with an optional fractional part.
    fn scan_number(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;
        let bytes = self.source.as_bytes();
        while self.offset < bytes.len() && bytes[self.offset].is_ascii_digit() {
            self.offset += 1;
        }
        if self.offset + 1 < bytes.len()
            && bytes[self.offset] == b'.'
            && bytes[self.offset + 1].is_ascii_digit()
        {
            self.offset += 1;
            while self.offset < bytes.len() && bytes[self.offset].is_ascii_digit() {
                self.offset += 1;
            }
        }
        self.items.push(Token::new(
            &self.source[start..self.offset],
            TokenKind::Number,
            start,
            self.offset,
        ));
        Ok(())
    }

    fn scan_ident(&mut self) {
        let start = self.offset;
        let bytes = self.source.as_bytes();
        while self.offset < bytes.len()
            && (bytes[self.offset].is_ascii_alphanumeric() || bytes[self.offset] == b'_')
        {
            self.offset += 1;
        }
        self.items.push(Token::new(
            &self.source[start..self.offset],
            TokenKind::Ident,
            start,
            self.offset,
        ));
    }

    /// Scan an operator glyph, longest match first.
    fn scan_operator(&mut self) {
        // Operator glyphs are ASCII; compare bytes so a multi-byte
        // character after the operator cannot split a char boundary.
        let bytes = self.source.as_bytes();
        if let Some(&next) = bytes.get(self.offset + 1) {
            let pair = [bytes[self.offset], next];
            if TWO_CHAR_OPS.iter().any(|op| op.as_bytes() == pair) {
                self.items.push(Token::new(
                    &self.source[self.offset..self.offset + 2],
                    TokenKind::Op,
                    self.offset,
                    self.offset + 2,
                ));
                self.offset += 2;
                return;
            }
        }
        let one = &self.source[self.offset..self.offset + 1];
        self.items.push(Token::new(
            one,
            TokenKind::Op,
            self.offset,
            self.offset + 1,
        ));
        self.offset += 1;
    }
}

#[inline]
fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

impl TryFrom<&str> for Tokenizer {
    type Error = TokenizerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Tokenizer::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Tokenizer::new(src).unwrap().items.iter().map(|t| t.kind).collect()
    }

    fn values(src: &str) -> Vec<String> {
        Tokenizer::new(src)
            .unwrap()
            .items
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn numbers_and_operators() {
        assert_eq!(values("1 + 2.5*3"), vec!["1", "+", "2.5", "*", "3"]);
        assert_eq!(
            kinds("1+2"),
            vec![TokenKind::Number, TokenKind::Op, TokenKind::Number]
        );
    }

    #[test]
    fn two_char_operators_win_over_one_char() {
        assert_eq!(values("a<=b"), vec!["a", "<=", "b"]);
        assert_eq!(values("a<b"), vec!["a", "<", "b"]);
        assert_eq!(values("x==y!=z"), vec!["x", "==", "y", "!=", "z"]);
        assert_eq!(values("p&&q||r"), vec!["p", "&&", "q", "||", "r"]);
        assert_eq!(values("1<<2"), vec!["1", "<<", "2"]);
    }

    #[test]
    fn string_forms_are_equivalent() {
        assert_eq!(values(r#""abc""#), vec!["abc"]);
        assert_eq!(values("'abc'"), vec!["abc"]);
        assert_eq!(kinds("'abc'"), vec![TokenKind::Str]);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(values(r#""a\"b""#), vec![r#"a"b"#]);
        assert_eq!(values(r"'a\'b'"), vec!["a'b"]);
        assert_eq!(values(r#""a\\b""#), vec![r"a\b"]);
    }

    #[test]
    fn param_refs() {
        let toks = Tokenizer::new("@rate * 100").unwrap().items;
        assert_eq!(toks[0].kind, TokenKind::ParamRef);
        assert_eq!(toks[0].value, "rate");
    }

    #[test]
    fn call_shape() {
        assert_eq!(
            kinds("SUM(1,2)"),
            vec![
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::Number,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(Tokenizer::new("\"abc").is_err());
    }

    #[test]
    fn bare_at_sign_is_an_error() {
        let err = Tokenizer::new("@ x").unwrap_err();
        assert_eq!(err.pos, 0);
    }

    #[test]
    fn error_position_points_at_offending_byte() {
        let err = Tokenizer::new("1 + $").unwrap_err();
        assert_eq!(err.pos, 4);
    }
}
