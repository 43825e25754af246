//! Interpreter module
//!
//! Executes the AST produced by the parser against real processes and
//! file descriptors. The entry point is [`ExecutionEngine`]; all mutable
//! shell state lives in [`InterpreterState`].

pub mod alias_expansion;
pub mod arithmetic;
pub mod builtins;
pub mod command_resolution;
pub mod control_flow;
pub mod errors;
pub mod execution_engine;
pub mod expansion;
pub mod functions;
pub mod helpers;
pub mod pipeline_execution;
pub mod process;
pub mod redirections;
pub mod scope;
pub mod subshell_group;
pub mod types;
pub mod word_expansion;

pub use arithmetic::evaluate_arithmetic;
pub use builtins::Builtin;
pub use errors::{report_error, ArithmeticError, InterpreterError};
pub use execution_engine::ExecutionEngine;
pub use helpers::result::BuiltinResult;
pub use redirections::RedirectionGuard;
pub use scope::{Variable, VariableStore};
pub use types::{ExecutionLimits, Flow, InterpreterState, Job, ShellOptions};
