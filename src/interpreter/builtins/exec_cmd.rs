//! exec - Replace the shell or make redirections permanent
//!
//! Usage:
//!   exec cmd [arg...]   - replace the shell process with cmd
//!   exec                - keep this command's redirections for the rest
//!                         of the shell
//!
//! When the program cannot be executed the shell exits with 126 or 127.

use crate::interpreter::command_resolution::{lookup_path, ResolvedCommand};
use crate::interpreter::errors::{report_error, InterpreterError};
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::process::flush_stdout;
use crate::interpreter::redirections::RedirectionGuard;
use crate::interpreter::types::{Flow, InterpreterState};

pub fn handle_exec(
    engine: &ExecutionEngine<'_>,
    state: &mut InterpreterState,
    args: &[String],
    guard: &mut RedirectionGuard,
) -> Result<BuiltinResult, InterpreterError> {
    let words = match args.first() {
        Some(first) if first == "--" => &args[1..],
        _ => args,
    };
    if words.is_empty() {
        tracing::trace!("redirections made permanent");
        guard.persist();
        return Ok(BuiltinResult::ok());
    }

    let name = &words[0];
    let status = match lookup_path(state, name) {
        ResolvedCommand::External(path) => {
            tracing::debug!(path = %path.display(), "exec");
            flush_stdout();
            engine.exec_program(&path, words, state.vars.exported_environment())
        }
        ResolvedCommand::PermissionDenied(_) => {
            report_error(format!("exec: {}: Permission denied", name));
            126
        }
        _ => {
            report_error(format!("exec: {}: not found", name));
            127
        }
    };
    Ok(BuiltinResult::flow(Flow::Exit(status)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::types::ExecutionLimits;

    #[test]
    fn test_exec_missing_program_exits() {
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        let mut state = InterpreterState::default();
        state.assign("PATH", "/nonexistent-posish").unwrap();
        let mut guard = RedirectionGuard::new();

        let result = handle_exec(&engine, &mut state, &["nope".to_string()], &mut guard).unwrap();
        assert_eq!(result.to_flow(), Flow::Exit(127));
    }

    #[test]
    fn test_exec_without_command() {
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        let mut state = InterpreterState::default();
        let mut guard = RedirectionGuard::new();
        let result = handle_exec(&engine, &mut state, &[], &mut guard).unwrap();
        assert_eq!(result.to_flow(), Flow::Normal(0));
    }
}
