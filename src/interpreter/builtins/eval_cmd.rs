//! eval - Run arguments as shell code
//!
//! eval [arg...]
//!
//! The arguments are joined with single spaces, parsed and executed in
//! the current shell context. A syntax error is reported with status 2.

use crate::interpreter::errors::InterpreterError;
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::InterpreterState;

pub fn handle_eval(
    engine: &ExecutionEngine<'_>,
    state: &mut InterpreterState,
    args: &[String],
) -> Result<BuiltinResult, InterpreterError> {
    let args = match args.first() {
        Some(first) if first == "--" => &args[1..],
        _ => args,
    };
    let source = args.join(" ");
    if source.trim().is_empty() {
        return Ok(BuiltinResult::ok());
    }
    let flow = engine.execute_source_text(state, &source)?;
    Ok(BuiltinResult::flow(flow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::types::{ExecutionLimits, Flow};

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_eval_runs_in_current_context() {
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        let mut state = InterpreterState::default();
        state.assign("cmd", "z=7").unwrap();

        let result = handle_eval(&engine, &mut state, &args(&["y=$cmd"])).unwrap();
        assert_eq!(result.to_flow(), Flow::Normal(0));
        assert_eq!(state.var("y"), Some("z=7"));

        handle_eval(&engine, &mut state, &args(&["x=5;", "y=$x"])).unwrap();
        assert_eq!(state.var("y"), Some("5"));

        let result = handle_eval(&engine, &mut state, &args(&["return", "4"])).unwrap();
        assert_eq!(result.to_flow(), Flow::Exit(4));
    }

    #[test]
    fn test_eval_syntax_error() {
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        let mut state = InterpreterState::default();
        let err = handle_eval(&engine, &mut state, &args(&["if", "then"])).unwrap_err();
        assert_eq!(err.exit_status(), 2);
    }
}
