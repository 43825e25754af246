//! Subshell Execution
//!
//! `( ... )` runs in a forked child. The child starts from a copy of the
//! parent's state, so assignments, `cd`, function definitions and `exit`
//! inside it never reach the parent. Groups `{ ...; }` run in place and
//! are handled by the execution engine directly.

use crate::ast::types::SubshellNode;
use crate::interpreter::builtins::trap_cmd::reset_traps_for_subshell;
use crate::interpreter::errors::{report_error, InterpreterError};
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::process::{exit_child, fork_process, wait_for_pid, ForkResult};
use crate::interpreter::types::{Flow, InterpreterState};

impl<'a> ExecutionEngine<'a> {
    /// Execute a subshell and wait for it
    pub fn execute_subshell(&self, state: &mut InterpreterState, node: &SubshellNode) -> Result<Flow, InterpreterError> {
        match fork_process()? {
            ForkResult::Child => self.run_in_child(state, |engine, state| {
                engine.apply_redirections(state, &node.redirections, None)?;
                engine.execute_statements(state, &node.body)
            }),
            ForkResult::Parent(pid) => Ok(Flow::Normal(wait_for_pid(pid)?)),
        }
    }

    /// Finish a freshly forked child: run `body`, then leave the process
    /// with the resulting status. Never returns.
    pub fn run_in_child<F>(&self, state: &mut InterpreterState, body: F) -> !
    where
        F: FnOnce(&Self, &mut InterpreterState) -> Result<Flow, InterpreterError>,
    {
        state.is_subshell = true;
        state.jobs.clear();
        reset_traps_for_subshell(state);

        let status = match body(self, state) {
            Ok(flow) => flow.status(),
            Err(e) => {
                report_error(&e);
                e.exit_status()
            }
        };
        let status = self.run_exit_trap(state, status);
        exit_child(status)
    }
}
