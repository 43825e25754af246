//! readonly - Mark variables read-only
//!
//! readonly [-p] [name[=value]...]
//!
//! Without operands lists read-only variables as `readonly name='value'`.

use super::export_cmd::{declaration_operands, list_variables, split_assignment};
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::InterpreterState;
use crate::parser::lexer::is_valid_name;

pub fn handle_readonly(state: &mut InterpreterState, args: &[String]) -> Result<BuiltinResult, InterpreterError> {
    let Some(operands) = declaration_operands(args) else {
        return Ok(BuiltinResult::success(list_variables(state, "readonly", |v| v.readonly)));
    };

    let mut result = BuiltinResult::ok();
    for arg in operands {
        let (name, value) = split_assignment(arg);
        if !is_valid_name(name) {
            result.stderr.push_str(&format!("posish: readonly: {}: bad variable name\n", name));
            result.exit_code = 1;
            continue;
        }
        state.vars.set_readonly(name, value)?;
        if state.options.allexport {
            state.vars.export(name, None)?;
        }
    }
    Ok(result)
}
