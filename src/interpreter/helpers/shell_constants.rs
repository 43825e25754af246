//! Shell Constants
//!
//! Constants for shell builtins, keywords, and POSIX special builtins.

use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    /// POSIX special built-in commands. Prefix assignments before them
    /// persist after the command finishes.
    pub static ref POSIX_SPECIAL_BUILTINS: HashSet<&'static str> = HashSet::from([
        ":", ".", "break", "continue", "eval", "exec", "exit", "export", "readonly", "return",
        "set", "shift", "times", "trap", "unset",
    ]);

    /// Reserved words, as reported by `type` and `command -V`
    pub static ref SHELL_KEYWORDS: HashSet<&'static str> = HashSet::from([
        "if", "then", "else", "elif", "fi", "case", "esac", "for", "while", "until", "do",
        "done", "in", "{", "}", "!",
    ]);
}

/// Check if a command name is a POSIX special built-in
pub fn is_posix_special_builtin(name: &str) -> bool {
    POSIX_SPECIAL_BUILTINS.contains(name)
}

/// Check if a name is a shell keyword
pub fn is_shell_keyword(name: &str) -> bool {
    SHELL_KEYWORDS.contains(name)
}

/// Search path used when PATH is unset
pub const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        assert!(is_posix_special_builtin("export"));
        assert!(!is_posix_special_builtin("echo"));
        assert!(is_shell_keyword("esac"));
        assert!(!is_shell_keyword("echo"));
    }
}
