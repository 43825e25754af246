//! continue - Continue to the next loop iteration builtin
//!
//! continue [n]
//!
//! Resumes the n-th enclosing loop (default 1), clamped to the current
//! loop nesting; outside any loop continue does nothing.

use super::break_cmd::loop_count;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::{Flow, InterpreterState};

pub fn handle_continue(state: &InterpreterState, args: &[String]) -> BuiltinResult {
    let levels = match loop_count("continue", args) {
        Ok(n) => n,
        Err(result) => return result,
    };
    if state.loop_depth == 0 {
        return BuiltinResult::ok();
    }
    BuiltinResult::flow(Flow::Continue(levels.min(state.loop_depth)))
}
