//! Abstract Syntax Tree (AST) Types for posish
//!
//! Architecture:
//!   Input → Lexer → Parser → AST → Expander → Executor → Exit status

pub mod types;
