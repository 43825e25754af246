//! Tilde Expansion
//!
//! `~` becomes `$HOME`; `~user` becomes that user's home directory from the
//! password database. Anything unresolvable stays literal.

use crate::interpreter::types::InterpreterState;
use std::ffi::{CStr, CString};

/// Home directory of a named user
fn user_home(user: &str) -> Option<String> {
    let name = CString::new(user).ok()?;
    // SAFETY: getpwnam returns NULL or a pointer to static storage that
    // stays valid until the next getpw* call; the string is copied at once
    unsafe {
        let entry = libc::getpwnam(name.as_ptr());
        if entry.is_null() || (*entry).pw_dir.is_null() {
            return None;
        }
        Some(CStr::from_ptr((*entry).pw_dir).to_string_lossy().into_owned())
    }
}

/// Home directory of the current user when HOME is unset
fn own_home() -> Option<String> {
    // SAFETY: as in user_home; getuid has no preconditions
    unsafe {
        let entry = libc::getpwuid(libc::getuid());
        if entry.is_null() || (*entry).pw_dir.is_null() {
            return None;
        }
        Some(CStr::from_ptr((*entry).pw_dir).to_string_lossy().into_owned())
    }
}

/// Expand a tilde prefix. Returns the literal `~user` text when the home
/// directory cannot be determined.
pub fn expand_tilde(state: &InterpreterState, user: Option<&str>) -> String {
    let home = match user {
        None => state.var("HOME").map(str::to_string).or_else(own_home),
        Some(user) => user_home(user),
    };
    home.unwrap_or_else(|| format!("~{}", user.unwrap_or("")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tilde_uses_home() {
        let mut state = InterpreterState::default();
        state.assign("HOME", "/home/tester").unwrap();
        assert_eq!(expand_tilde(&state, None), "/home/tester");
    }

    #[test]
    fn test_unknown_user_stays_literal() {
        let state = InterpreterState::default();
        assert_eq!(
            expand_tilde(&state, Some("no-such-user-posish")),
            "~no-such-user-posish"
        );
    }

    #[test]
    fn test_root_home() {
        let state = InterpreterState::default();
        assert!(expand_tilde(&state, Some("root")).starts_with('/'));
    }
}
