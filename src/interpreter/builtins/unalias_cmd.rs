//! unalias - Remove alias definitions
//!
//! unalias [-a] name...
//!
//! -a removes every alias.

use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::InterpreterState;

pub fn handle_unalias(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    if args.first().is_some_and(|a| a == "-a") {
        state.aliases.clear();
        return BuiltinResult::ok();
    }
    let names = match args.first() {
        Some(first) if first == "--" => &args[1..],
        _ => args,
    };
    if names.is_empty() {
        return BuiltinResult::failure("posish: unalias: usage: unalias [-a] name...\n", 2);
    }

    let mut result = BuiltinResult::ok();
    for name in names {
        if state.aliases.shift_remove(name.as_str()).is_none() {
            result.stderr.push_str(&format!("posish: unalias: {}: not found\n", name));
            result.exit_code = 1;
        }
    }
    result
}
