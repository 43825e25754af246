//! Parser module for posish scripts
//!
//! This module contains the lexer and the recursive descent parser that turn
//! shell source into the AST.

pub mod types;
pub mod lexer;
pub mod arithmetic_parser;
pub mod word_parser;
pub mod compound_parser;
pub mod parser;

// Re-exports
pub use types::ParseException;
pub use lexer::{Lexer, Token, TokenType, LexerError};
pub use arithmetic_parser::parse_arithmetic_expression;
pub use parser::{parse, Parser};
