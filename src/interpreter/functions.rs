//! Function Handling
//!
//! Function invocation: a new scope carrying the call's arguments as
//! positional parameters, the body, then the scope is popped again. A
//! `return` inside the body ends the call with its status.

use crate::ast::types::FunctionDefNode;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::types::{Flow, InterpreterState};
use std::rc::Rc;

impl<'a> ExecutionEngine<'a> {
    /// Call a shell function with the given arguments
    pub fn call_function(
        &self,
        state: &mut InterpreterState,
        function: Rc<FunctionDefNode>,
        args: Vec<String>,
    ) -> Result<Flow, InterpreterError> {
        if state.call_depth >= self.limits.max_call_depth {
            return Err(InterpreterError::FunctionDepth(function.name.clone()));
        }
        tracing::trace!(name = %function.name, depth = state.call_depth + 1, "calling function");

        state.vars.push_scope(args);
        state.call_depth += 1;
        // Loops of the caller are not visible to break/continue in the body
        let saved_loop_depth = std::mem::replace(&mut state.loop_depth, 0);

        let result = self.execute_compound(state, &function.body);

        state.loop_depth = saved_loop_depth;
        state.call_depth -= 1;
        state.vars.pop_scope();

        Ok(match result? {
            Flow::Return(status) => Flow::Normal(status),
            Flow::Break(_) | Flow::Continue(_) => Flow::Normal(state.last_exit_code),
            other => other,
        })
    }
}
