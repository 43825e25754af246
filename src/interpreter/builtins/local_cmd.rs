//! local - Declare variables local to the current function
//!
//! local name[=value]...
//!
//! A name given without a value starts out with the value visible at the
//! point of declaration. Only valid inside a function body.

use super::export_cmd::split_assignment;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::InterpreterState;
use crate::parser::lexer::is_valid_name;

pub fn handle_local(state: &mut InterpreterState, args: &[String]) -> Result<BuiltinResult, InterpreterError> {
    if !state.in_function() {
        return Ok(BuiltinResult::failure("posish: local: not in a function\n", 1));
    }

    let mut result = BuiltinResult::ok();
    for arg in args {
        let (name, value) = split_assignment(arg);
        if !is_valid_name(name) {
            result.stderr.push_str(&format!("posish: local: {}: bad variable name\n", name));
            result.exit_code = 1;
            continue;
        }
        state.vars.declare_local(name, value)?;
        if state.options.allexport {
            state.vars.export(name, None)?;
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_outside_function() {
        let mut state = InterpreterState::default();
        let result = handle_local(&mut state, &["x=1".to_string()]).unwrap();
        assert_eq!(result.exit_code, 1);
        assert_eq!(state.var("x"), None);
    }

    #[test]
    fn test_local_inherits_visible_value() {
        let mut state = InterpreterState::default();
        state.assign("x", "outer").unwrap();
        state.vars.push_scope(vec![]);
        state.call_depth = 1;

        handle_local(&mut state, &["x".to_string()]).unwrap();
        assert_eq!(state.var("x"), Some("outer"));
        state.assign("x", "inner").unwrap();

        state.vars.pop_scope();
        assert_eq!(state.var("x"), Some("outer"));
    }
}
