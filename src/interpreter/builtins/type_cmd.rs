//! type - Describe how names would be interpreted as commands
//!
//! type name...
//!
//! Prints one line per name; an unknown name is reported on stderr and
//! makes the status 1.

use crate::interpreter::command_resolution::ResolvedCommand;
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::helpers::shell_constants::is_shell_keyword;
use crate::interpreter::types::InterpreterState;

/// One-line description of a command name, None when it cannot be found
pub(crate) fn describe_command(engine: &ExecutionEngine<'_>, state: &InterpreterState, name: &str) -> Option<String> {
    if let Some(value) = state.aliases.get(name) {
        return Some(format!("{} is an alias for {}", name, value));
    }
    if is_shell_keyword(name) {
        return Some(format!("{} is a shell keyword", name));
    }
    match engine.resolve_command(state, name, false) {
        ResolvedCommand::Function(_) => Some(format!("{} is a function", name)),
        ResolvedCommand::Builtin(builtin) if builtin.is_special() => {
            Some(format!("{} is a special shell builtin", name))
        }
        ResolvedCommand::Builtin(_) => Some(format!("{} is a shell builtin", name)),
        ResolvedCommand::External(path) | ResolvedCommand::PermissionDenied(path) => {
            Some(format!("{} is {}", name, path.display()))
        }
        ResolvedCommand::Alias(_) | ResolvedCommand::NotFound => None,
    }
}

pub fn handle_type(engine: &ExecutionEngine<'_>, state: &InterpreterState, args: &[String]) -> BuiltinResult {
    let mut result = BuiltinResult::ok();
    for name in args {
        match describe_command(engine, state, name) {
            Some(line) => {
                result.stdout.push_str(&line);
                result.stdout.push('\n');
            }
            None => {
                result.stderr.push_str(&format!("posish: type: {}: not found\n", name));
                result.exit_code = 1;
            }
        }
    }
    result
}
