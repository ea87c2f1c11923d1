pub mod parser;
pub mod tokenizer;

pub use parser::{AstNode, Associativity, BinOp, Parser, ParserError, UnaryOp, parse};
pub use tokenizer::{Token, TokenKind, Tokenizer, TokenizerError};

// Re-export common types
pub use formulet_common::{EngineError, ErrorKind, Value};
