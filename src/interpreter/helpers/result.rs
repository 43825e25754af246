//! BuiltinResult and its factory functions.
//!
//! Builtins return their output as text plus a status; the executor writes
//! the text to the (possibly redirected) descriptors 1 and 2 afterwards.

use crate::interpreter::types::Flow;

/// Result type for builtin commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltinResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Control-flow signal raised by break, continue, return, exit and
    /// by builtins that run shell code
    pub flow: Option<Flow>,
}

impl BuiltinResult {
    /// A successful result with no output.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Create a successful result with stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// Create a failure result with a stderr message and exit code.
    pub fn failure(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stderr: stderr.into(),
            exit_code,
            ..Self::default()
        }
    }

    /// Status only
    pub fn status(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::default()
        }
    }

    /// Carry a control-flow signal
    pub fn flow(flow: Flow) -> Self {
        Self {
            exit_code: flow.status(),
            flow: Some(flow),
            ..Self::default()
        }
    }

    /// The flow the executor continues with
    pub fn to_flow(&self) -> Flow {
        self.flow.unwrap_or(Flow::Normal(self.exit_code))
    }
}

/// Convert a boolean test result: true = 0, false = 1.
pub fn test_result(passed: bool) -> BuiltinResult {
    BuiltinResult::status(if passed { 0 } else { 1 })
}
