//! xtrace (set -x) helper functions
//!
//! PS4 controls the prefix (default "+ "). Trace lines go to stderr.

use crate::interpreter::types::InterpreterState;

/// Default PS4 value when not set
pub const DEFAULT_PS4: &str = "+ ";

/// Build the trace line for a command about to run
pub fn format_trace(state: &InterpreterState, assignments: &[(String, String)], words: &[String]) -> String {
    let prefix = state.var("PS4").unwrap_or(DEFAULT_PS4);
    let mut items: Vec<String> = assignments
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    items.extend(words.iter().cloned());
    format!("{}{}\n", prefix, items.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_trace() {
        let mut state = InterpreterState::default();
        let words = vec!["echo".to_string(), "a b".to_string()];
        assert_eq!(format_trace(&state, &[], &words), "+ echo a b\n");

        state.assign("PS4", ">> ").unwrap();
        let assignments = vec![("X".to_string(), "1".to_string())];
        assert_eq!(format_trace(&state, &assignments, &words[..1]), ">> X=1 echo\n");
    }
}
