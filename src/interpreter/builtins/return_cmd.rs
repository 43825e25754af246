//! return - Return from a function or a sourced file
//!
//! return [n]
//!
//! Outside of any function or `.` file it behaves like `exit`.

use super::exit_cmd::status_operand;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::{Flow, InterpreterState};

pub fn handle_return(state: &InterpreterState, args: &[String]) -> BuiltinResult {
    let returnable = state.in_function() || state.source_depth > 0;
    match status_operand("return", state, args) {
        Ok(status) if returnable => BuiltinResult::flow(Flow::Return(status)),
        Ok(status) => BuiltinResult::flow(Flow::Exit(status)),
        Err(message) => BuiltinResult {
            stderr: message,
            ..BuiltinResult::flow(if returnable { Flow::Return(2) } else { Flow::Exit(2) })
        },
    }
}
