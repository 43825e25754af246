//! Shell
//!
//! Main entry point for running shell source. Ties together the parser and
//! the interpreter: a [`Shell`] owns the interpreter state and the
//! execution limits, and runs whole units of source against them.

use crate::interpreter::builtins::pwd_cmd::same_directory;
use crate::interpreter::errors::report_error;
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::helpers::bytes::encode_text;
use crate::interpreter::helpers::xtrace::DEFAULT_PS4;
use crate::interpreter::process::{flush_stdout, write_all_fd};
use crate::interpreter::types::{ExecutionLimits, Flow, InterpreterState};
use crate::parser::Parser;

/// Settings for creating a shell.
#[derive(Debug, Default)]
pub struct ShellConfig {
    /// Inherited environment, imported as exported variables
    pub env: Vec<(String, String)>,
    /// `$0`
    pub script_name: Option<String>,
    /// `$1..`
    pub args: Vec<String>,
    /// `-x`
    pub xtrace: bool,
    /// `-e`
    pub errexit: bool,
    /// Execution limits
    pub limits: Option<ExecutionLimits>,
}

/// A non-interactive shell.
pub struct Shell {
    limits: ExecutionLimits,
    state: InterpreterState,
}

impl Shell {
    /// Create a shell from the given options.
    pub fn new(options: ShellConfig) -> Self {
        let mut state = InterpreterState::from_environment(options.env);

        if let Ok(cwd) = std::env::current_dir() {
            let inherited = state.var("PWD").is_some_and(|pwd| same_directory(pwd, &cwd));
            if !inherited {
                let _ = state.vars.export("PWD", Some(cwd.to_string_lossy().into_owned()));
            }
        }
        if state.var("PS4").is_none() {
            let _ = state.assign("PS4", DEFAULT_PS4);
        }

        if let Some(name) = options.script_name {
            state.script_name = name;
        }
        state.vars.set_positional(options.args);
        state.options.xtrace = options.xtrace;
        state.options.errexit = options.errexit;

        Self {
            limits: options.limits.unwrap_or_default(),
            state,
        }
    }

    /// Parse and run a unit of source. Returns the resulting status; a
    /// syntax error runs nothing and yields 2.
    pub fn run(&mut self, source: &str) -> i32 {
        if self.state.options.verbose {
            let _ = write_all_fd(2, &encode_text(source));
        }

        let script = match Parser::new().parse(source) {
            Ok(script) => script,
            Err(e) => {
                tracing::debug!(error = %e, "parse failed");
                report_error(&e);
                return 2;
            }
        };
        tracing::debug!(statements = script.statements.len(), "parsed unit");

        let engine = ExecutionEngine::new(&self.limits);
        let status = match engine.execute_script(&mut self.state, &script) {
            Ok(Flow::Normal(status)) => status,
            Ok(flow) => flow.status(),
            Err(e) => {
                report_error(&e);
                e.exit_status()
            }
        };
        self.state.last_exit_code = status;
        flush_stdout();
        status
    }

    /// Leave the shell with `status`: runs the EXIT trap, if any, and
    /// returns the status to exit the process with.
    pub fn exit(&mut self, status: i32) -> i32 {
        let engine = ExecutionEngine::new(&self.limits);
        let status = engine.run_exit_trap(&mut self.state, status);
        flush_stdout();
        status
    }

    /// The interpreter state, for inspection
    pub fn state(&self) -> &InterpreterState {
        &self.state
    }
}
