//! cd - Change directory builtin
//!
//! Supports:
//! - cd - change to $HOME
//! - cd dir - change to directory
//! - cd - - change to $OLDPWD and print it
//!
//! PWD keeps the logical path (symlinks as spelled) when it still names
//! the new directory; OLDPWD receives the previous PWD.

use super::pwd_cmd::same_directory;
use crate::interpreter::errors::{os_error_text, InterpreterError};
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::InterpreterState;
use std::env;
use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` lexically
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    result
}

/// The logical name of `target` relative to the previous logical directory
fn logical_path(previous: Option<&str>, target: &str) -> Option<PathBuf> {
    if target.starts_with('/') {
        return Some(normalize_path(Path::new(target)));
    }
    let base = previous.filter(|p| p.starts_with('/'))?;
    Some(normalize_path(&Path::new(base).join(target)))
}

/// Handle the cd builtin command
pub fn handle_cd(state: &mut InterpreterState, args: &[String]) -> Result<BuiltinResult, InterpreterError> {
    let operands: Vec<&String> = match args.first() {
        Some(first) if first == "--" => args[1..].iter().collect(),
        _ => args.iter().collect(),
    };

    let mut print_path = false;
    let target = match operands.first() {
        None => match state.var("HOME") {
            Some(home) if !home.is_empty() => home.to_string(),
            _ => return Ok(BuiltinResult::failure("posish: cd: HOME not set\n", 1)),
        },
        Some(dir) if dir.as_str() == "-" => match state.var("OLDPWD") {
            Some(old) => {
                print_path = true;
                old.to_string()
            }
            None => return Ok(BuiltinResult::failure("posish: cd: OLDPWD not set\n", 1)),
        },
        Some(dir) => dir.to_string(),
    };

    let previous = state
        .var("PWD")
        .map(str::to_string)
        .or_else(|| env::current_dir().ok().map(|p| p.display().to_string()));

    if let Err(e) = env::set_current_dir(&target) {
        return Ok(BuiltinResult::failure(
            format!("posish: cd: {}: {}\n", target, os_error_text(&e)),
            1,
        ));
    }
    tracing::debug!(%target, "changed directory");

    let physical = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            return Ok(BuiltinResult::failure(format!("posish: cd: {}\n", os_error_text(&e)), 1));
        }
    };
    let new_pwd = match logical_path(previous.as_deref(), &target) {
        Some(logical) if same_directory(&logical.to_string_lossy(), &physical) => {
            logical.to_string_lossy().into_owned()
        }
        _ => physical.display().to_string(),
    };

    if let Some(previous) = previous {
        state.assign("OLDPWD", previous)?;
    }
    state.assign("PWD", new_pwd.clone())?;

    if print_path {
        return Ok(BuiltinResult::success(format!("{}\n", new_pwd)));
    }
    Ok(BuiltinResult::ok())
}
