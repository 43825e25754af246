//! Alias Expansion
//!
//! Alias expansion rules:
//! 1. Only a command name that is a literal unquoted word is looked up
//! 2. A replacement that is a single plain simple command has its words
//!    spliced in front of the remaining arguments
//! 3. Any other replacement (pipelines, lists, compound commands) is run
//!    through `eval` with the arguments appended, shell-quoted
//! 4. An alias is never expanded again while its own replacement runs

use crate::ast::types::{CommandNode, RedirectionNode, ScriptNode, SimpleCommandNode};
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::helpers::quoting::single_quote;
use crate::interpreter::redirections::RedirectionGuard;
use crate::interpreter::types::{Flow, InterpreterState};
use crate::parser::Parser;

/// The replacement's simple command when it is nothing more than words
fn as_plain_command(script: &ScriptNode) -> Option<&SimpleCommandNode> {
    let [statement] = script.statements.as_slice() else {
        return None;
    };
    if statement.background || statement.pipelines.len() != 1 {
        return None;
    }
    let pipeline = &statement.pipelines[0];
    if pipeline.negated || pipeline.commands.len() != 1 {
        return None;
    }
    match &pipeline.commands[0] {
        CommandNode::Simple(simple) if simple.assignments.is_empty() && simple.redirections.is_empty() => Some(simple),
        _ => None,
    }
}

/// Replacement text followed by the quoted arguments, for `eval`
fn alias_eval_text(value: &str, args: &[String]) -> String {
    let mut text = value.to_string();
    for arg in args {
        text.push(' ');
        text.push_str(&single_quote(arg));
    }
    text
}

impl<'a> ExecutionEngine<'a> {
    /// Run a command whose name resolved to an alias
    pub(crate) fn execute_alias(
        &self,
        state: &mut InterpreterState,
        redirections: &[RedirectionNode],
        assignments: &[(String, String)],
        value: &str,
        words: Vec<String>,
    ) -> Result<Flow, InterpreterError> {
        tracing::trace!(alias = %words[0], %value, "expanding alias");
        state.alias_stack.push(words[0].clone());
        let result = self.run_alias_replacement(state, redirections, assignments, value, words);
        state.alias_stack.pop();
        result
    }

    fn run_alias_replacement(
        &self,
        state: &mut InterpreterState,
        redirections: &[RedirectionNode],
        assignments: &[(String, String)],
        value: &str,
        words: Vec<String>,
    ) -> Result<Flow, InterpreterError> {
        let script = Parser::new().parse(value)?;

        if let Some(simple) = as_plain_command(&script) {
            let mut spliced = Vec::new();
            if let Some(name) = &simple.name {
                spliced.extend(self.expand_word_fields(state, name)?);
            }
            spliced.extend(self.expand_words(state, &simple.args)?);
            spliced.extend(words.into_iter().skip(1));
            if spliced.is_empty() {
                return Ok(Flow::Normal(0));
            }
            return self.dispatch_command(state, redirections, assignments, spliced, true);
        }

        let text = alias_eval_text(value, &words[1..]);
        self.with_temp_bindings(state, assignments, |engine, state| {
            let mut guard = RedirectionGuard::new();
            engine.apply_redirections(state, redirections, Some(&mut guard))?;
            engine.execute_source_text(state, &text)
        })
    }
}
