//! Execution Engine
//!
//! The core execution engine that ties all interpreter components together.
//! Implements the full AST execution chain:
//!
//! execute_script -> execute_statement -> execute_pipeline -> execute_command
//!
//! Every step returns a [`Flow`]. Errors that escape a command are reported
//! at the pipeline level and turned into that pipeline's status.

use crate::ast::types::{
    CommandNode, CompoundCommandNode, PipelineNode, ScriptNode, StatementNode, StatementOperator,
};
use crate::interpreter::errors::{report_error, InterpreterError};
use crate::interpreter::pipeline_execution::reap_jobs;
use crate::interpreter::redirections::RedirectionGuard;
use crate::interpreter::types::{ExecutionLimits, Flow, InterpreterState};
use crate::parser::Parser;
use std::rc::Rc;

/// The execution engine that ties all interpreter components together.
pub struct ExecutionEngine<'a> {
    /// Execution limits (function nesting depth)
    pub limits: &'a ExecutionLimits,
}

impl<'a> ExecutionEngine<'a> {
    /// Create a new execution engine.
    pub fn new(limits: &'a ExecutionLimits) -> Self {
        Self { limits }
    }

    /// Execute a complete script (list of statements).
    pub fn execute_script(&self, state: &mut InterpreterState, ast: &ScriptNode) -> Result<Flow, InterpreterError> {
        self.execute_statements(state, &ast.statements)
    }

    /// Parse `source` and run it in the current context (`eval`, `.`).
    pub fn execute_source_text(&self, state: &mut InterpreterState, source: &str) -> Result<Flow, InterpreterError> {
        let script = Parser::new().parse(source)?;
        self.execute_script(state, &script)
    }

    /// Run statements in order. A non-normal flow stops the list and is
    /// handed to the caller.
    pub fn execute_statements(
        &self,
        state: &mut InterpreterState,
        statements: &[StatementNode],
    ) -> Result<Flow, InterpreterError> {
        let mut status = 0;
        for statement in statements {
            if state.options.noexec {
                break;
            }
            if !state.jobs.is_empty() {
                reap_jobs(state);
            }
            match self.execute_statement(state, statement)? {
                Flow::Normal(s) => {
                    status = s;
                    state.last_exit_code = s;
                }
                other => return Ok(other),
            }
            if let Some(flow) = self.run_pending_traps(state)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal(status))
    }

    /// Run statements as a condition (`if`, `while`, `until`), where a
    /// failure never triggers errexit.
    pub fn execute_condition(
        &self,
        state: &mut InterpreterState,
        statements: &[StatementNode],
    ) -> Result<Flow, InterpreterError> {
        state.errexit_suppressed += 1;
        let result = self.execute_statements(state, statements);
        state.errexit_suppressed -= 1;
        result
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Execute a statement (AND-OR list, possibly in the background).
    pub fn execute_statement(&self, state: &mut InterpreterState, statement: &StatementNode) -> Result<Flow, InterpreterError> {
        if statement.background {
            return self.execute_background(state, statement);
        }
        self.execute_and_or(state, statement)
    }

    /// Run the pipelines of an AND-OR list with short-circuiting
    pub fn execute_and_or(&self, state: &mut InterpreterState, statement: &StatementNode) -> Result<Flow, InterpreterError> {
        let last = statement.pipelines.len().saturating_sub(1);
        let mut flow = Flow::Normal(state.last_exit_code);

        for (i, pipeline) in statement.pipelines.iter().enumerate() {
            if i > 0 {
                let previous = state.last_exit_code;
                let run = match statement.operators[i - 1] {
                    StatementOperator::And => previous == 0,
                    StatementOperator::Or => previous != 0,
                };
                if !run {
                    continue;
                }
            }

            let is_operand = i < last;
            if is_operand {
                state.errexit_suppressed += 1;
            }
            let result = self.execute_pipeline(state, pipeline);
            if is_operand {
                state.errexit_suppressed -= 1;
            }

            flow = result?;
            let Flow::Normal(status) = flow else {
                return Ok(flow);
            };
            state.last_exit_code = status;

            if i == last && status != 0 && !pipeline.negated && self.errexit_applies(state) {
                tracing::debug!(status, "errexit");
                return Ok(Flow::Exit(status));
            }
        }
        Ok(flow)
    }

    fn errexit_applies(&self, state: &InterpreterState) -> bool {
        state.options.errexit && state.errexit_suppressed == 0
    }

    // ========================================================================
    // Pipelines
    // ========================================================================

    /// Execute a pipeline, reporting any error that escapes it.
    pub fn execute_pipeline(&self, state: &mut InterpreterState, pipeline: &PipelineNode) -> Result<Flow, InterpreterError> {
        if pipeline.negated {
            state.errexit_suppressed += 1;
        }
        let result = match pipeline.commands.as_slice() {
            [single] => self.execute_command(state, single),
            commands => self.execute_multi_stage(state, commands),
        };
        if pipeline.negated {
            state.errexit_suppressed -= 1;
        }

        let flow = match result {
            Ok(flow) => flow,
            Err(e) => {
                tracing::debug!(error = %e, "command failed");
                report_error(&e);
                if e.is_fatal() {
                    Flow::Exit(e.exit_status())
                } else {
                    Flow::Normal(e.exit_status())
                }
            }
        };

        Ok(match flow {
            Flow::Normal(status) if pipeline.negated => Flow::Normal(if status == 0 { 1 } else { 0 }),
            other => other,
        })
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Execute a single command node
    pub fn execute_command(&self, state: &mut InterpreterState, command: &CommandNode) -> Result<Flow, InterpreterError> {
        match command {
            CommandNode::Simple(simple) => self.execute_simple_command(state, simple),
            CommandNode::Compound(compound) => self.execute_compound(state, compound),
            CommandNode::FunctionDef(def) => {
                tracing::trace!(name = %def.name, "function defined");
                state.functions.insert(def.name.clone(), Rc::new(def.clone()));
                Ok(Flow::Normal(0))
            }
        }
    }

    /// Execute a compound command with its trailing redirections
    pub fn execute_compound(&self, state: &mut InterpreterState, compound: &CompoundCommandNode) -> Result<Flow, InterpreterError> {
        match compound {
            CompoundCommandNode::Subshell(node) => self.execute_subshell(state, node),
            other => {
                let mut guard = RedirectionGuard::new();
                self.apply_redirections(state, other.redirections(), Some(&mut guard))?;
                self.execute_compound_body(state, other)
            }
        }
    }

    /// The body of a compound command, in the current process. A subshell's
    /// body lands here once its child has been forked.
    pub(crate) fn execute_compound_body(
        &self,
        state: &mut InterpreterState,
        compound: &CompoundCommandNode,
    ) -> Result<Flow, InterpreterError> {
        match compound {
            CompoundCommandNode::If(node) => self.execute_if(state, node),
            CompoundCommandNode::For(node) => self.execute_for(state, node),
            CompoundCommandNode::While(node) => self.execute_while(state, node),
            CompoundCommandNode::Until(node) => self.execute_until(state, node),
            CompoundCommandNode::Case(node) => self.execute_case(state, node),
            CompoundCommandNode::Group(node) => self.execute_statements(state, &node.body),
            CompoundCommandNode::Subshell(node) => self.execute_statements(state, &node.body),
        }
    }
}
