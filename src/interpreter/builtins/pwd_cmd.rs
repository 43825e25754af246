//! pwd - Print the working directory
//!
//! Prints `$PWD` when it is an absolute path naming the current directory,
//! otherwise the physical path reported by the OS.

use crate::interpreter::errors::os_error_text;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::InterpreterState;
use std::env;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// True when `logical` names the same directory as `physical`
pub(crate) fn same_directory(logical: &str, physical: &Path) -> bool {
    if !logical.starts_with('/') {
        return false;
    }
    match (fs::metadata(logical), fs::metadata(physical)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

pub fn handle_pwd(state: &InterpreterState, _args: &[String]) -> BuiltinResult {
    let physical = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => return BuiltinResult::failure(format!("posish: pwd: {}\n", os_error_text(&e)), 1),
    };

    match state.var("PWD") {
        Some(logical) if same_directory(logical, &physical) => BuiltinResult::success(format!("{}\n", logical)),
        _ => BuiltinResult::success(format!("{}\n", physical.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_pwd_falls_back_to_physical() {
        let mut state = InterpreterState::default();
        state.assign("PWD", "/definitely/not/here").unwrap();
        let result = handle_pwd(&state, &[]);
        let expected = format!("{}\n", env::current_dir().unwrap().display());
        assert_eq!(result.stdout, expected);
    }

    #[test]
    fn test_relative_pwd_is_ignored() {
        assert!(!same_directory(".", Path::new("/")));
        assert!(same_directory("/", Path::new("/")));
    }
}
