//! unset - Remove variables or functions
//!
//! unset [-v|-f] name...
//!
//! -v (default) removes variables, -f removes functions. Read-only
//! variables cannot be unset.

use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::InterpreterState;

pub fn handle_unset(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let mut functions = false;
    let mut rest = args;
    while let Some(first) = rest.first() {
        match first.as_str() {
            "-f" => functions = true,
            "-v" => functions = false,
            "--" => {
                rest = &rest[1..];
                break;
            }
            _ => break,
        }
        rest = &rest[1..];
    }

    let mut result = BuiltinResult::ok();
    for name in rest {
        if functions {
            state.functions.remove(name.as_str());
            continue;
        }
        if let Err(e) = state.vars.unset(name) {
            result.stderr.push_str(&format!("posish: unset: {}\n", e));
            result.exit_code = 1;
        }
    }
    result
}
