//! break - Exit from loops builtin
//!
//! break [n]
//!
//! Leaves n enclosing loops (default 1). n larger than the current loop
//! nesting leaves all of them; outside any loop break does nothing.

use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::{Flow, InterpreterState};

/// Parse a loop count operand, n >= 1
pub(crate) fn loop_count(name: &str, args: &[String]) -> Result<u32, BuiltinResult> {
    match args.first() {
        None => Ok(1),
        Some(arg) => match arg.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(BuiltinResult::failure(
                format!("posish: {}: {}: loop count out of range\n", name, arg),
                1,
            )),
        },
    }
}

pub fn handle_break(state: &InterpreterState, args: &[String]) -> BuiltinResult {
    let levels = match loop_count("break", args) {
        Ok(n) => n,
        Err(result) => return result,
    };
    if state.loop_depth == 0 {
        return BuiltinResult::ok();
    }
    BuiltinResult::flow(Flow::Break(levels.min(state.loop_depth)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_outside_loop_is_noop() {
        let state = InterpreterState::default();
        assert_eq!(handle_break(&state, &[]).to_flow(), Flow::Normal(0));
    }

    #[test]
    fn test_break_levels_clamped() {
        let mut state = InterpreterState::default();
        state.loop_depth = 2;
        assert_eq!(handle_break(&state, &[]).to_flow(), Flow::Break(1));
        assert_eq!(handle_break(&state, &["5".into()]).to_flow(), Flow::Break(2));
    }

    #[test]
    fn test_break_bad_count() {
        let mut state = InterpreterState::default();
        state.loop_depth = 1;
        let result = handle_break(&state, &["0".into()]);
        assert_eq!(result.exit_code, 1);
        assert!(result.flow.is_none());
    }
}
