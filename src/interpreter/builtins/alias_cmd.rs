//! alias - Define or display aliases
//!
//! Usage:
//!   alias              - list all aliases
//!   alias name         - show one alias
//!   alias name=value   - define an alias

use super::export_cmd::split_assignment;
use crate::interpreter::helpers::quoting::single_quote;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::InterpreterState;

fn format_alias(name: &str, value: &str) -> String {
    format!("alias {}={}\n", name, single_quote(value))
}

pub fn handle_alias(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let args = match args.first() {
        Some(first) if first == "--" => &args[1..],
        _ => args,
    };

    if args.is_empty() {
        let listing: String = state
            .aliases
            .iter()
            .map(|(name, value)| format_alias(name, value))
            .collect();
        return BuiltinResult::success(listing);
    }

    let mut result = BuiltinResult::ok();
    for arg in args {
        match split_assignment(arg) {
            (name, Some(value)) => {
                tracing::trace!(%name, %value, "alias defined");
                state.aliases.insert(name.to_string(), value);
            }
            (name, None) => match state.aliases.get(name) {
                Some(value) => result.stdout.push_str(&format_alias(name, value)),
                None => {
                    result.stderr.push_str(&format!("posish: alias: {}: not found\n", name));
                    result.exit_code = 1;
                }
            },
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_define_and_print() {
        let mut state = InterpreterState::default();
        handle_alias(&mut state, &args(&["ll=ls -l", "q=it's"]));
        assert_eq!(state.aliases.get("ll").map(String::as_str), Some("ls -l"));

        let result = handle_alias(&mut state, &args(&["ll"]));
        assert_eq!(result.stdout, "alias ll='ls -l'\n");

        let listing = handle_alias(&mut state, &[]).stdout;
        assert_eq!(listing, "alias ll='ls -l'\nalias q='it'\\''s'\n");
    }

    #[test]
    fn test_unknown_alias() {
        let mut state = InterpreterState::default();
        let result = handle_alias(&mut state, &args(&["nope"]));
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "posish: alias: nope: not found\n");
    }
}
