//! posish - A POSIX-compatible command-line shell
//!
//! This library provides the lexer and parser that turn shell source into
//! an AST, and the interpreter that executes it with real processes.

pub mod ast;
pub mod interpreter;
pub mod parser;
pub mod shell;

pub use ast::types::*;
pub use parser::{parse, ParseException, Parser};
pub use shell::{Shell, ShellConfig};
