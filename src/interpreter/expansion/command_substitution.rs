//! Command Substitution
//!
//! `$(...)` and `` `...` `` run their body in a forked child whose standard
//! output is a pipe back to the shell. The child works on its own copy of
//! the interpreter state, so nothing it assigns leaks back.

use crate::ast::types::ScriptNode;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::helpers::bytes::decode_bytes;
use crate::interpreter::process::{
    create_pipe, exit_child, fork_process, move_onto, read_all_fd, wait_for_pid, ForkResult,
};
use crate::interpreter::types::InterpreterState;
use std::os::fd::AsRawFd;

/// Remove every trailing newline (and only newlines)
pub fn strip_trailing_newlines(mut output: String) -> String {
    let trimmed = output.trim_end_matches('\n').len();
    output.truncate(trimmed);
    output
}

impl<'a> ExecutionEngine<'a> {
    /// Run `body` in a child and return its captured output.
    ///
    /// The child's status is remembered in `last_substitution_status` so an
    /// assignment-only command can report it; `$?` itself is not touched.
    pub fn command_substitution(
        &self,
        state: &mut InterpreterState,
        body: &ScriptNode,
    ) -> Result<String, InterpreterError> {
        let (reader, writer) = create_pipe()?;

        let pid = match fork_process()? {
            ForkResult::Child => {
                drop(reader);
                if move_onto(writer, 1).is_err() {
                    exit_child(1);
                }
                self.run_in_child(state, |engine, state| engine.execute_script(state, body));
            }
            ForkResult::Parent(pid) => pid,
        };

        drop(writer);
        let captured = read_all_fd(reader.as_raw_fd());
        drop(reader);
        let status = wait_for_pid(pid)?;
        let bytes = captured.map_err(|e| InterpreterError::process("command substitution", e))?;

        tracing::debug!(pid, status, bytes = bytes.len(), "command substitution finished");
        state.last_substitution_status = Some(status);
        Ok(strip_trailing_newlines(decode_bytes(&bytes)))
    }
}
