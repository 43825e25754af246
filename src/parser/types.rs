//! Parser Types and Constants
//!
//! Shared types and token predicates used across parser modules.

use crate::parser::lexer::{LexerError, Token, TokenType};
use std::fmt;
use thiserror::Error;

/// Max recursion depth for nested constructs
pub const MAX_PARSER_DEPTH: usize = 200;

/// Check if a token type is a redirection operator
pub fn is_redirection_token(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::Less
            | TokenType::Great
            | TokenType::DLess
            | TokenType::DGreat
            | TokenType::LessAnd
            | TokenType::GreatAnd
            | TokenType::LessGreat
            | TokenType::DLessDash
            | TokenType::Clobber
    )
}

/// Tokens that may stand for a plain word in argument position
pub fn is_word_token(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::Word | TokenType::Name | TokenType::Number | TokenType::AssignmentWord
    ) || t.is_reserved_word()
}

/// A syntax error. The whole input unit is rejected when one is raised.
#[derive(Debug, Clone, Error)]
pub struct ParseException {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub token: Option<Token>,
}

impl fmt::Display for ParseException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl ParseException {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            token: None,
        }
    }

    pub fn with_token(message: impl Into<String>, token: Token) -> Self {
        Self {
            message: message.into(),
            line: token.line,
            column: token.column,
            token: Some(token),
        }
    }

    /// The standard message for a token that cannot appear where it was found
    pub fn unexpected(token: Token) -> Self {
        let message = if token.token_type == TokenType::Eof {
            "syntax error: unexpected end of file".to_string()
        } else if token.token_type == TokenType::Newline {
            "syntax error near unexpected token `newline'".to_string()
        } else {
            format!("syntax error near unexpected token `{}'", token.value)
        };
        Self::with_token(message, token)
    }
}

impl From<LexerError> for ParseException {
    fn from(e: LexerError) -> Self {
        ParseException::new(format!("syntax error: {}", e.message), e.line, e.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_messages() {
        let fi = Token::new(TokenType::Fi, "fi", 0, 2, 3, 1);
        let err = ParseException::unexpected(fi);
        assert_eq!(err.to_string(), "line 3: syntax error near unexpected token `fi'");

        let eof = Token::new(TokenType::Eof, "", 0, 0, 1, 1);
        assert!(ParseException::unexpected(eof).message.contains("end of file"));
    }

    #[test]
    fn test_word_tokens_include_reserved_words() {
        assert!(is_word_token(TokenType::Done));
        assert!(is_word_token(TokenType::Name));
        assert!(!is_word_token(TokenType::Semicolon));
        assert!(is_redirection_token(TokenType::Clobber));
    }
}
