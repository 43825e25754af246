//! Parameter Lookup
//!
//! Values of named variables, positional parameters and the special
//! parameters (`$? $# $$ $! $- $0 $@ $*`). Special parameters are computed
//! from the current state on every lookup.

use crate::interpreter::helpers::shellopts::option_flags;
use crate::interpreter::types::InterpreterState;

/// Check if a parameter name is one of the single-character specials
pub fn is_special_parameter(name: &str) -> bool {
    matches!(name, "?" | "#" | "$" | "!" | "-" | "@" | "*")
}

/// Value of a parameter, None when unset
pub fn parameter_value(state: &InterpreterState, name: &str) -> Option<String> {
    match name {
        "?" => Some(state.last_exit_code.to_string()),
        "#" => Some(state.vars.positional().len().to_string()),
        "$" => Some(state.shell_pid.to_string()),
        "!" => state.last_background_pid.map(|pid| pid.to_string()),
        "-" => Some(option_flags(&state.options)),
        "0" => Some(state.script_name.clone()),
        "@" | "*" => {
            let params = state.vars.positional();
            if params.is_empty() {
                None
            } else {
                Some(params.join(" "))
            }
        }
        _ if name.chars().all(|c| c.is_ascii_digit()) => {
            let index: usize = name.parse().ok()?;
            state.vars.positional().get(index.checked_sub(1)?).cloned()
        }
        _ => state.var(name).map(str::to_string),
    }
}

/// True when the operator's "unset" branch applies
pub fn is_unset_or_null(value: Option<&str>, check_empty: bool) -> bool {
    match value {
        None => true,
        Some(v) => check_empty && v.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_parameters() {
        let mut state = InterpreterState::default();
        state.last_exit_code = 3;
        state.vars.set_positional(vec!["a".into(), "b".into()]);
        assert_eq!(parameter_value(&state, "?").as_deref(), Some("3"));
        assert_eq!(parameter_value(&state, "#").as_deref(), Some("2"));
        assert_eq!(parameter_value(&state, "2").as_deref(), Some("b"));
        assert_eq!(parameter_value(&state, "3"), None);
        assert_eq!(parameter_value(&state, "*").as_deref(), Some("a b"));
        assert_eq!(parameter_value(&state, "!"), None);
    }

    #[test]
    fn test_option_flags_parameter() {
        let mut state = InterpreterState::default();
        state.options.errexit = true;
        state.options.nounset = true;
        assert_eq!(parameter_value(&state, "-").as_deref(), Some("eu"));
    }

    #[test]
    fn test_unset_or_null() {
        assert!(is_unset_or_null(None, false));
        assert!(!is_unset_or_null(Some(""), false));
        assert!(is_unset_or_null(Some(""), true));
        assert!(!is_unset_or_null(Some("x"), true));
    }
}
