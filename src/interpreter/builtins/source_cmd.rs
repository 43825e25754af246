//! . - Run a file in the current shell
//!
//! . file [arg...]
//!
//! A file name without `/` is searched for in PATH. Arguments, when
//! given, replace the positional parameters while the file runs. A
//! `return` in the file ends it.

use crate::interpreter::errors::{os_error_text, InterpreterError};
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::helpers::bytes::decode_bytes;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::helpers::shell_constants::DEFAULT_PATH;
use crate::interpreter::types::{Flow, InterpreterState};
use std::fs;
use std::path::{Path, PathBuf};

/// Locate a sourced file: paths are used as given, bare names come from PATH
fn find_source_file(state: &InterpreterState, name: &str) -> Option<PathBuf> {
    if name.contains('/') {
        return Some(PathBuf::from(name));
    }
    let search = state.var("PATH").unwrap_or(DEFAULT_PATH);
    search
        .split(':')
        .map(|dir| Path::new(if dir.is_empty() { "." } else { dir }).join(name))
        .find(|candidate| candidate.is_file())
}

pub fn handle_source(
    engine: &ExecutionEngine<'_>,
    state: &mut InterpreterState,
    args: &[String],
) -> Result<BuiltinResult, InterpreterError> {
    let Some(name) = args.first() else {
        return Ok(BuiltinResult::failure("posish: .: filename argument required\n", 2));
    };
    let Some(path) = find_source_file(state, name) else {
        return Ok(BuiltinResult::failure(format!("posish: .: {}: not found\n", name), 1));
    };
    let text = match fs::read(&path) {
        Ok(bytes) => decode_bytes(&bytes),
        Err(e) => {
            return Ok(BuiltinResult::failure(
                format!("posish: .: {}: {}\n", name, os_error_text(&e)),
                1,
            ));
        }
    };
    tracing::debug!(path = %path.display(), "sourcing file");

    let saved = (args.len() > 1).then(|| state.vars.set_positional(args[1..].to_vec()));
    state.source_depth += 1;
    let result = engine.execute_source_text(state, &text);
    state.source_depth -= 1;
    if let Some(saved) = saved {
        state.vars.set_positional(saved);
    }

    Ok(match result? {
        Flow::Return(status) => BuiltinResult::status(status),
        flow => BuiltinResult::flow(flow),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::types::ExecutionLimits;

    fn write_script(tag: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("posish-source-{}-{}.sh", std::process::id(), tag));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_source_sets_variables_and_positionals() {
        let script = write_script("return", "sourced=$1; return 3; after=1\n");
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        let mut state = InterpreterState::default();
        state.vars.set_positional(vec!["outer".into()]);

        let path = script.display().to_string();
        let result = handle_source(&engine, &mut state, &[path, "inner".into()]).unwrap();
        fs::remove_file(&script).unwrap();
        assert_eq!(result.to_flow(), Flow::Normal(3));
        assert_eq!(state.var("sourced"), Some("inner"));
        assert_eq!(state.var("after"), None);
        assert_eq!(state.vars.positional(), ["outer".to_string()]);
        assert_eq!(state.source_depth, 0);
    }

    #[test]
    fn test_source_missing_file() {
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        let mut state = InterpreterState::default();
        state.assign("PATH", "/nonexistent-posish").unwrap();
        let result = handle_source(&engine, &mut state, &["nofile".into()]).unwrap();
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "posish: .: nofile: not found\n");
    }
}
