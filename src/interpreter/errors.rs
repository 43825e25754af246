//! Interpreter Errors
//!
//! Runtime failures that are fatal to a single command. Control flow
//! (break, continue, return, exit) is not an error; it travels as a
//! [`Flow`](crate::interpreter::types::Flow) value instead.
//!
//! Any error that escapes a command is printed as `posish: <message>` and
//! becomes that command's exit status.

use crate::interpreter::helpers::bytes::encode_text;
use crate::interpreter::process::write_all_fd;
use crate::parser::types::ParseException;
use std::ffi::CStr;
use std::fmt;
use std::io;
use thiserror::Error;

/// Failures while evaluating `$(( ... ))`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
    /// Malformed expression; the message already names the expression
    #[error("{0}")]
    Syntax(String),
}

impl From<ParseException> for ArithmeticError {
    fn from(e: ParseException) -> Self {
        ArithmeticError::Syntax(e.message)
    }
}

#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    #[error("{name}: readonly variable")]
    Readonly { name: String },

    /// `${v:?word}` and `${v?word}`
    #[error("{name}: {message}")]
    ParameterNotSet { name: String, message: String },

    /// Unset variable expanded under `set -u`
    #[error("{name}: parameter not set")]
    Unbound { name: String },

    /// Syntax errors raised by `eval`, `.` and alias bodies
    #[error(transparent)]
    Parse(#[from] ParseException),

    /// Opening or duplicating a redirection target failed
    #[error("{context}: {}", os_error_text(.source))]
    Redirection {
        context: String,
        #[source]
        source: io::Error,
    },

    /// fork, pipe or wait failed
    #[error("{context}: {}", os_error_text(.source))]
    Process {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}: maximum function nesting level exceeded")]
    FunctionDepth(String),

    #[error("{0}")]
    Redirect(String),
}

impl InterpreterError {
    pub fn redirection(context: impl Into<String>, source: io::Error) -> Self {
        InterpreterError::Redirection {
            context: context.into(),
            source,
        }
    }

    pub fn process(context: impl Into<String>, source: io::Error) -> Self {
        InterpreterError::Process {
            context: context.into(),
            source,
        }
    }

    /// Status the failing command reports
    pub fn exit_status(&self) -> i32 {
        match self {
            InterpreterError::Parse(_) => 2,
            _ => 1,
        }
    }

    /// Errors that terminate a non-interactive shell rather than just the
    /// failing command: `${v?}` failures and unset variables under `set -u`
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            InterpreterError::ParameterNotSet { .. } | InterpreterError::Unbound { .. }
        )
    }
}

/// Write `posish: <message>` to standard error
pub fn report_error(message: impl fmt::Display) {
    let line = format!("posish: {}\n", message);
    let _ = write_all_fd(2, &encode_text(&line));
}

/// The C library's text for an OS error, without Rust's "(os error N)" suffix
pub fn os_error_text(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => {
            // SAFETY: strerror returns a pointer to a static, NUL-terminated message
            let text = unsafe { CStr::from_ptr(libc::strerror(code)) };
            text.to_string_lossy().into_owned()
        }
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = InterpreterError::Readonly { name: "X".into() };
        assert_eq!(err.to_string(), "X: readonly variable");

        let err: InterpreterError = ArithmeticError::DivisionByZero.into();
        assert_eq!(err.to_string(), "division by zero");
        assert_eq!(err.exit_status(), 1);
        assert!(!err.is_fatal());
        assert!(InterpreterError::Unbound { name: "x".into() }.is_fatal());
    }

    #[test]
    fn test_os_error_text_drops_code_suffix() {
        let err = io::Error::from_raw_os_error(libc::ENOENT);
        assert_eq!(os_error_text(&err), "No such file or directory");

        let err = InterpreterError::redirection("missing.txt", err);
        assert_eq!(err.to_string(), "missing.txt: No such file or directory");
    }

    #[test]
    fn test_parse_errors_report_status_two() {
        let err: InterpreterError = ParseException::new("syntax error", 1, 1).into();
        assert_eq!(err.exit_status(), 2);
    }
}
