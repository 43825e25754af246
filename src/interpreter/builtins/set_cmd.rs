//! set - Set/unset shell options and positional parameters
//!
//! Usage:
//!   set                  - list all variables as name='value'
//!   set -o / set +o      - list options (as a table / as commands)
//!   set -eux / set +eux  - enable / disable options by letter
//!   set -o name          - enable option by long name (+o disables)
//!   set [--] args...     - replace the positional parameters

use crate::interpreter::helpers::quoting::single_quote;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::helpers::shellopts::{
    list_options, list_options_as_commands, set_option_flag, set_option_name,
};
use crate::interpreter::types::InterpreterState;

/// Every variable with a value, sorted by name
fn list_all_variables(state: &InterpreterState) -> String {
    state
        .vars
        .visible()
        .into_iter()
        .filter_map(|(name, var)| {
            var.value
                .as_ref()
                .map(|value| format!("{}={}\n", name, single_quote(value)))
        })
        .collect()
}

fn invalid_option(text: &str) -> BuiltinResult {
    BuiltinResult::failure(format!("posish: set: {}: invalid option\n", text), 2)
}

/// Handle the set builtin command.
pub fn handle_set(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    if args.is_empty() {
        return BuiltinResult::success(list_all_variables(state));
    }

    let mut i = 0;
    let mut positional: Option<Vec<String>> = None;
    while i < args.len() {
        let arg = args[i].as_str();
        let enable = arg.starts_with('-');

        if arg == "--" {
            positional = Some(args[i + 1..].to_vec());
            break;
        }
        if arg == "-" || arg == "+" {
            if i + 1 < args.len() {
                positional = Some(args[i + 1..].to_vec());
            }
            break;
        }
        if !(arg.starts_with('-') || arg.starts_with('+')) {
            positional = Some(args[i..].to_vec());
            break;
        }

        if arg == "-o" || arg == "+o" {
            match args.get(i + 1) {
                None if enable => return BuiltinResult::success(list_options(&state.options)),
                None => return BuiltinResult::success(list_options_as_commands(&state.options)),
                Some(name) => {
                    if !set_option_name(&mut state.options, name, enable) {
                        return BuiltinResult::failure(format!("posish: set: {}: invalid option name\n", name), 2);
                    }
                    i += 2;
                    continue;
                }
            }
        }

        for flag in arg.chars().skip(1) {
            if !set_option_flag(&mut state.options, flag, enable) {
                return invalid_option(&format!("{}{}", &arg[..1], flag));
            }
        }
        i += 1;
    }

    if let Some(params) = positional {
        state.vars.set_positional(params);
    }
    BuiltinResult::ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_flags() {
        let mut state = InterpreterState::default();
        handle_set(&mut state, &args(&["-eu"]));
        assert!(state.options.errexit);
        assert!(state.options.nounset);

        handle_set(&mut state, &args(&["+e", "-o", "noglob"]));
        assert!(!state.options.errexit);
        assert!(state.options.noglob);
    }

    #[test]
    fn test_set_positional_params() {
        let mut state = InterpreterState::default();
        handle_set(&mut state, &args(&["--", "a", "-b"]));
        assert_eq!(state.vars.positional(), args(&["a", "-b"]).as_slice());

        handle_set(&mut state, &args(&["-x", "c"]));
        assert!(state.options.xtrace);
        assert_eq!(state.vars.positional(), args(&["c"]).as_slice());

        handle_set(&mut state, &args(&["--"]));
        assert!(state.vars.positional().is_empty());
    }

    #[test]
    fn test_set_invalid_option() {
        let mut state = InterpreterState::default();
        let result = handle_set(&mut state, &args(&["-z"]));
        assert_eq!(result.exit_code, 2);
        assert_eq!(result.stderr, "posish: set: -z: invalid option\n");

        let result = handle_set(&mut state, &args(&["-o", "bogus"]));
        assert_eq!(result.exit_code, 2);
    }

    #[test]
    fn test_set_lists_variables() {
        let mut state = InterpreterState::default();
        state.assign("B", "two words").unwrap();
        state.assign("A", "1").unwrap();
        assert_eq!(handle_set(&mut state, &[]).stdout, "A='1'\nB='two words'\n");
        assert!(handle_set(&mut state, &args(&["-o"])).stdout.contains("errexit\toff\n"));
        assert!(handle_set(&mut state, &args(&["+o"])).stdout.contains("set +o xtrace\n"));
    }
}
