//! export - Mark variables for the environment of child processes
//!
//! Usage:
//!   export              - List all exported variables
//!   export -p           - Same, as re-inputtable `export name='value'` lines
//!   export NAME=value   - Set and export variable
//!   export NAME         - Export existing variable (or mark an unset name)

use crate::interpreter::errors::InterpreterError;
use crate::interpreter::helpers::quoting::single_quote;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::scope::Variable;
use crate::interpreter::types::InterpreterState;
use crate::parser::lexer::is_valid_name;

/// Split `name=value` into its parts; a bare name has no value
pub(crate) fn split_assignment(arg: &str) -> (&str, Option<String>) {
    match arg.split_once('=') {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (arg, None),
    }
}

/// `<command> name='value'` lines for every variable matching `filter`
pub(crate) fn list_variables<F>(state: &InterpreterState, command: &str, filter: F) -> String
where
    F: Fn(&Variable) -> bool,
{
    let mut output = String::new();
    for (name, var) in state.vars.visible() {
        if !filter(var) {
            continue;
        }
        match &var.value {
            Some(value) => output.push_str(&format!("{} {}={}\n", command, name, single_quote(value))),
            None => output.push_str(&format!("{} {}\n", command, name)),
        }
    }
    output
}

/// Operands after an optional leading `-p` / `--`; `None` means list
pub(crate) fn declaration_operands(args: &[String]) -> Option<&[String]> {
    let mut rest = args;
    while let Some(first) = rest.first() {
        match first.as_str() {
            "-p" => rest = &rest[1..],
            "--" => {
                rest = &rest[1..];
                break;
            }
            _ => break,
        }
    }
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Handle the export builtin command.
pub fn handle_export(state: &mut InterpreterState, args: &[String]) -> Result<BuiltinResult, InterpreterError> {
    let Some(operands) = declaration_operands(args) else {
        return Ok(BuiltinResult::success(list_variables(state, "export", |v| v.exported)));
    };

    let mut result = BuiltinResult::ok();
    for arg in operands {
        let (name, value) = split_assignment(arg);
        if !is_valid_name(name) {
            result.stderr.push_str(&format!("posish: export: {}: bad variable name\n", name));
            result.exit_code = 1;
            continue;
        }
        state.vars.export(name, value)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_export_and_list() {
        let mut state = InterpreterState::default();
        state.assign("LOCAL_ONLY", "x").unwrap();
        handle_export(&mut state, &args(&["A=it's", "B"])).unwrap();

        let listing = handle_export(&mut state, &args(&["-p"])).unwrap().stdout;
        assert_eq!(listing, "export A='it'\\''s'\nexport B\n");
        assert!(state.vars.get("A").unwrap().exported);
    }

    #[test]
    fn test_bad_name() {
        let mut state = InterpreterState::default();
        let result = handle_export(&mut state, &args(&["1x=2", "OK=1"])).unwrap();
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "posish: export: 1x: bad variable name\n");
        assert_eq!(state.var("OK"), Some("1"));
    }

    #[test]
    fn test_readonly_rejects_value() {
        let mut state = InterpreterState::default();
        state.vars.set_readonly("R", Some("1".into())).unwrap();
        assert!(handle_export(&mut state, &args(&["R=2"])).is_err());
        assert!(handle_export(&mut state, &args(&["R"])).is_ok());
    }
}
