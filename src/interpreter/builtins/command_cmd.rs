//! command - Run a command bypassing functions and aliases
//!
//! Usage:
//!   command name [arg...]   - run the builtin or external program `name`
//!   command -v name...      - print how each name resolves
//!   command -V name...      - describe each name (like `type`)
//!
//! -p is accepted and ignored.

use super::type_cmd::describe_command;
use crate::interpreter::command_resolution::{lookup_path, ResolvedCommand};
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::helpers::quoting::single_quote;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::helpers::shell_constants::is_shell_keyword;
use crate::interpreter::redirections::RedirectionGuard;
use crate::interpreter::types::InterpreterState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    Short,
    Verbose,
}

/// `command -v` text for one name
fn short_description(engine: &ExecutionEngine<'_>, state: &InterpreterState, name: &str) -> Option<String> {
    if let Some(value) = state.aliases.get(name) {
        return Some(format!("alias {}={}", name, single_quote(value)));
    }
    if is_shell_keyword(name) {
        return Some(name.to_string());
    }
    match engine.resolve_command(state, name, false) {
        ResolvedCommand::Function(_) | ResolvedCommand::Builtin(_) => Some(name.to_string()),
        ResolvedCommand::External(path) => Some(path.display().to_string()),
        ResolvedCommand::PermissionDenied(_) | ResolvedCommand::Alias(_) | ResolvedCommand::NotFound => None,
    }
}

pub fn handle_command(
    engine: &ExecutionEngine<'_>,
    state: &mut InterpreterState,
    args: &[String],
    guard: &mut RedirectionGuard,
) -> Result<BuiltinResult, InterpreterError> {
    let mut mode = Mode::Run;
    let mut rest = args;
    while let Some(first) = rest.first() {
        match first.as_str() {
            "-v" => mode = Mode::Short,
            "-V" => mode = Mode::Verbose,
            "-p" => {}
            "--" => {
                rest = &rest[1..];
                break;
            }
            _ => break,
        }
        rest = &rest[1..];
    }
    if rest.is_empty() {
        return Ok(BuiltinResult::ok());
    }

    if mode != Mode::Run {
        let mut result = BuiltinResult::ok();
        for name in rest {
            let line = match mode {
                Mode::Short => short_description(engine, state, name),
                _ => describe_command(engine, state, name),
            };
            match line {
                Some(line) => {
                    result.stdout.push_str(&line);
                    result.stdout.push('\n');
                }
                None => {
                    if mode == Mode::Verbose {
                        result.stderr.push_str(&format!("posish: command: {}: not found\n", name));
                    }
                    result.exit_code = 1;
                }
            }
        }
        return Ok(result);
    }

    let name = &rest[0];
    if let Some(builtin) = super::Builtin::from_name(name) {
        return engine.run_builtin(state, builtin, &rest[1..], guard);
    }
    match lookup_path(state, name) {
        ResolvedCommand::External(path) => {
            let flow = engine.execute_external(state, &[], &[], &path, rest)?;
            Ok(BuiltinResult::flow(flow))
        }
        ResolvedCommand::PermissionDenied(_) => {
            Ok(BuiltinResult::failure(format!("posish: {}: Permission denied\n", name), 126))
        }
        _ => Ok(BuiltinResult::failure(format!("posish: {}: command not found\n", name), 127)),
    }
}
