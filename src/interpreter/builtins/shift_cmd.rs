//! shift - Shift positional parameters
//!
//! shift [n]
//!
//! Shifts positional parameters to the left by n (default 1).
//! $n+1 becomes $1, $n+2 becomes $2, etc. A count larger than $#
//! is an error and leaves the parameters untouched.

use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::InterpreterState;

pub fn handle_shift(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let n = match args.first() {
        None => 1,
        Some(arg) => match arg.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                return BuiltinResult::failure(format!("posish: shift: {}: numeric argument required\n", arg), 2);
            }
        },
    };

    if state.vars.shift(n) {
        BuiltinResult::ok()
    } else {
        BuiltinResult::failure("posish: shift: can't shift that many\n", 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_shift_default_and_count() {
        let mut state = InterpreterState::default();
        state.vars.set_positional(args(&["a", "b", "c", "d"]));
        handle_shift(&mut state, &[]);
        assert_eq!(state.vars.positional(), args(&["b", "c", "d"]).as_slice());
        handle_shift(&mut state, &args(&["2"]));
        assert_eq!(state.vars.positional(), args(&["d"]).as_slice());
    }

    #[test]
    fn test_shift_too_many() {
        let mut state = InterpreterState::default();
        state.vars.set_positional(args(&["a"]));
        let result = handle_shift(&mut state, &args(&["2"]));
        assert_eq!(result.exit_code, 1);
        assert_eq!(state.vars.positional().len(), 1);
    }
}
