//! exit - Exit shell builtin
//!
//! exit [n]
//!
//! Leaves the shell (or the current subshell) with status n, defaulting
//! to the status of the last command.

use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::{Flow, InterpreterState};

/// Parse the optional status operand of exit/return. `Err` carries the
/// diagnostic for a non-numeric operand.
pub(crate) fn status_operand(name: &str, state: &InterpreterState, args: &[String]) -> Result<i32, String> {
    match args.first() {
        None => Ok(state.last_exit_code),
        Some(arg) => arg
            .parse::<i64>()
            .map(|n| n.rem_euclid(256) as i32)
            .map_err(|_| format!("posish: {}: {}: numeric argument required\n", name, arg)),
    }
}

pub fn handle_exit(state: &InterpreterState, args: &[String]) -> BuiltinResult {
    match status_operand("exit", state, args) {
        Ok(status) => BuiltinResult::flow(Flow::Exit(status)),
        Err(message) => BuiltinResult {
            stderr: message,
            ..BuiltinResult::flow(Flow::Exit(2))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_no_args_uses_last_status() {
        let mut state = InterpreterState::default();
        state.last_exit_code = 42;
        assert_eq!(handle_exit(&state, &[]).to_flow(), Flow::Exit(42));
    }

    #[test]
    fn test_exit_wraps_modulo_256() {
        let state = InterpreterState::default();
        assert_eq!(handle_exit(&state, &["300".into()]).to_flow(), Flow::Exit(44));
        assert_eq!(handle_exit(&state, &["-1".into()]).to_flow(), Flow::Exit(255));
    }

    #[test]
    fn test_exit_non_numeric() {
        let state = InterpreterState::default();
        let result = handle_exit(&state, &["abc".into()]);
        assert_eq!(result.to_flow(), Flow::Exit(2));
        assert_eq!(result.stderr, "posish: exit: abc: numeric argument required\n");
    }
}
