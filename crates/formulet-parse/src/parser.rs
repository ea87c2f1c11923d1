use crate::tokenizer::{Token, TokenKind, Tokenizer, TokenizerError};
use formulet_common::Value;
use smallvec::SmallVec;
use std::error::Error;
use std::fmt::{self, Display};

/// A custom error type for the parser.
#[derive(Debug)]
pub struct ParserError {
    pub message: String,
    pub position: Option<usize>,
}

impl Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pos) = self.position {
            write!(f, "ParserError at position {}: {}", pos, self.message)
        } else {
            write!(f, "ParserError: {}", self.message)
        }
    }
}

impl Error for ParserError {}

impl From<TokenizerError> for ParserError {
    fn from(err: TokenizerError) -> Self {
        ParserError {
            message: err.message,
            position: Some(err.pos),
        }
    }
}

/// Represents operator associativity.
#[derive(Debug, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        })
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Pow => "^",
        })
    }
}

impl BinOp {
    fn from_glyph(glyph: &str) -> Option<Self> {
        Some(match glyph {
            "||" => BinOp::Or,
            "&&" => BinOp::And,
            "==" => BinOp::Eq,
            "!=" => BinOp::Ne,
            "<" => BinOp::Lt,
            "<=" => BinOp::Le,
            ">" => BinOp::Gt,
            ">=" => BinOp::Ge,
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Rem,
            "^" => BinOp::Pow,
            _ => return None,
        })
    }

    pub fn precedence(self) -> (u8, Associativity) {
        match self {
            BinOp::Or => (1, Associativity::Left),
            BinOp::And => (2, Associativity::Left),
            BinOp::Eq | BinOp::Ne => (3, Associativity::Left),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => (4, Associativity::Left),
            BinOp::Add | BinOp::Sub => (5, Associativity::Left),
            BinOp::Mul | BinOp::Div | BinOp::Rem => (6, Associativity::Left),
            BinOp::Pow => (7, Associativity::Right),
        }
    }
}

/// A parsed expression tree.
///
/// `IfError` is a parser-level construct: its fallback branch is a string
/// literal fixed at parse time and must never be evaluated unless the
/// protected subtree raises.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Literal(Value),
    ParamRef(String),
    UnaryOp {
        op: UnaryOp,
        expr: Box<AstNode>,
    },
    BinaryOp {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    Call {
        name: String,
        args: Vec<AstNode>,
    },
    IfError {
        inner: Box<AstNode>,
        fallback: String,
    },
}

/// A parser for converting tokens into an AST.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            position: 0,
        }
    }

    /// Parse the tokens into an AST, requiring every token to be consumed.
    pub fn parse(&mut self) -> Result<AstNode, ParserError> {
        if self.tokens.is_empty() {
            return Err(ParserError {
                message: "Empty expression".to_string(),
                position: None,
            });
        }
        let ast = self.parse_expression()?;
        if self.position < self.tokens.len() {
            let tok = &self.tokens[self.position];
            return Err(ParserError {
                message: format!("Unexpected token '{}'", tok.value),
                position: Some(tok.start),
            });
        }
        Ok(ast)
    }

    fn parse_expression(&mut self) -> Result<AstNode, ParserError> {
        self.parse_binary_op(0)
    }

    fn parse_binary_op(&mut self, min_precedence: u8) -> Result<AstNode, ParserError> {
        let mut left = self.parse_unary_op()?;

        while self.position < self.tokens.len() {
            let token = &self.tokens[self.position];
            if token.kind != TokenKind::Op {
                break;
            }
            // Prefix glyphs reached here are infix misuses and fall through
            // to the glyph check below.
            let op = match BinOp::from_glyph(&token.value) {
                Some(op) => op,
                None => {
                    return Err(self.op_error(token));
                }
            };
            let (precedence, associativity) = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.position += 1;

            let next_min_precedence = if associativity == Associativity::Left {
                precedence + 1
            } else {
                precedence
            };
            let right = self.parse_binary_op(next_min_precedence)?;
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn op_error(&self, token: &Token) -> ParserError {
        let message = match token.value.as_str() {
            "<<" | ">>" => format!("Operator '{}' is reserved", token.value),
            other => format!("Unknown operator '{other}'"),
        };
        ParserError {
            message,
            position: Some(token.start),
        }
    }

    fn parse_unary_op(&mut self) -> Result<AstNode, ParserError> {
        if self.position < self.tokens.len() {
            let token = &self.tokens[self.position];
            if token.kind == TokenKind::Op {
                let op = match token.value.as_str() {
                    "-" => Some(UnaryOp::Neg),
                    "+" => Some(UnaryOp::Plus),
                    "!" => Some(UnaryOp::Not),
                    _ => None,
                };
                if let Some(op) = op {
                    self.position += 1;
                    let expr = self.parse_unary_op()?;
                    return Ok(AstNode::UnaryOp {
                        op,
                        expr: Box::new(expr),
                    });
                }
            }
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<AstNode, ParserError> {
        let token = match self.tokens.get(self.position) {
            Some(t) => t.clone(),
            None => {
                return Err(ParserError {
                    message: "Unexpected end of expression".to_string(),
                    position: self.tokens.last().map(|t| t.end),
                });
            }
        };

        match token.kind {
            TokenKind::Number => {
                self.position += 1;
                let value = token.value.parse::<f64>().map_err(|_| ParserError {
                    message: format!("Invalid number: {}", token.value),
                    position: Some(token.start),
                })?;
                Ok(AstNode::Literal(Value::Number(value)))
            }
            TokenKind::Str => {
                self.position += 1;
                Ok(AstNode::Literal(Value::Text(token.value)))
            }
            TokenKind::ParamRef => {
                self.position += 1;
                Ok(AstNode::ParamRef(token.value))
            }
            TokenKind::Ident => {
                self.position += 1;
                let is_call = self
                    .tokens
                    .get(self.position)
                    .is_some_and(|t| t.kind == TokenKind::LParen);
                if is_call {
                    self.position += 1; // '('
                    return self.parse_call(token);
                }
                if token.value.eq_ignore_ascii_case("true") {
                    return Ok(AstNode::Literal(Value::Bool(true)));
                }
                if token.value.eq_ignore_ascii_case("false") {
                    return Ok(AstNode::Literal(Value::Bool(false)));
                }
                Err(ParserError {
                    message: format!("Unexpected identifier '{}'", token.value),
                    position: Some(token.start),
                })
            }
            TokenKind::LParen => {
                self.position += 1;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, ")")?;
                Ok(expr)
            }
            _ => Err(ParserError {
                message: format!("Unexpected token '{}'", token.value),
                position: Some(token.start),
            }),
        }
    }

    /// Parse a call's argument list; the opening paren is already consumed.
    ///
    /// `IFERROR` is lowered to its dedicated AST node here so its fallback
    /// stays inert until the protected branch raises.
    fn parse_call(&mut self, name_token: Token) -> Result<AstNode, ParserError> {
        let mut args: SmallVec<[AstNode; 4]> = SmallVec::new();

        if self
            .tokens
            .get(self.position)
            .is_some_and(|t| t.kind == TokenKind::RParen)
        {
            self.position += 1;
        } else {
            loop {
                args.push(self.parse_expression()?);
                let token = match self.tokens.get(self.position) {
                    Some(t) => t,
                    None => {
                        return Err(ParserError {
                            message: "Expected ',' or ')' in argument list".to_string(),
                            position: self.tokens.last().map(|t| t.end),
                        });
                    }
                };
                match token.kind {
                    TokenKind::Comma => self.position += 1,
                    TokenKind::RParen => {
                        self.position += 1;
                        break;
                    }
                    _ => {
                        return Err(ParserError {
                            message: format!(
                                "Expected ',' or ')' in argument list, got '{}'",
                                token.value
                            ),
                            position: Some(token.start),
                        });
                    }
                }
            }
        }

        if name_token.value.eq_ignore_ascii_case("IFERROR") {
            return self.lower_iferror(&name_token, args.into_vec());
        }

        Ok(AstNode::Call {
            name: name_token.value,
            args: args.into_vec(),
        })
    }

    fn lower_iferror(
        &self,
        name_token: &Token,
        mut args: Vec<AstNode>,
    ) -> Result<AstNode, ParserError> {
        if args.len() != 2 {
            return Err(ParserError {
                message: format!("IFERROR expects 2 arguments, got {}", args.len()),
                position: Some(name_token.start),
            });
        }
        let fallback = args.pop().expect("two args checked");
        let inner = args.pop().expect("two args checked");
        match fallback {
            AstNode::Literal(Value::Text(s)) => Ok(AstNode::IfError {
                inner: Box::new(inner),
                fallback: s,
            }),
            _ => Err(ParserError {
                message: "IFERROR fallback must be a string literal".to_string(),
                position: Some(name_token.start),
            }),
        }
    }

    fn expect(&mut self, kind: TokenKind, glyph: &str) -> Result<(), ParserError> {
        match self.tokens.get(self.position) {
            Some(t) if t.kind == kind => {
                self.position += 1;
                Ok(())
            }
            Some(t) => Err(ParserError {
                message: format!("Expected '{}', got '{}'", glyph, t.value),
                position: Some(t.start),
            }),
            None => Err(ParserError {
                message: format!("Expected '{glyph}'"),
                position: self.tokens.last().map(|t| t.end),
            }),
        }
    }
}

/// Tokenize and parse an expression in one step.
pub fn parse(source: &str) -> Result<AstNode, ParserError> {
    let tokenizer = Tokenizer::new(source)?;
    let mut parser = Parser::new(tokenizer.items);
    parser.parse()
}
