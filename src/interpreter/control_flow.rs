//! Control Flow Execution
//!
//! Handles control flow constructs:
//! - if/elif/else
//! - for loops
//! - while loops
//! - until loops
//! - case statements
//!
//! break and continue arrive here as [`Flow::Break`] / [`Flow::Continue`]
//! with the number of loop levels still to unwind.

use crate::ast::types::{CaseNode, ForNode, IfNode, StatementNode, UntilNode, WhileNode};
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::expansion::pattern::matches_pattern;
use crate::interpreter::types::{Flow, InterpreterState};

/// What a loop does after its body (or condition) produced a flow
#[derive(Debug, PartialEq, Eq)]
enum LoopAction {
    /// Go on with the next iteration
    Next,
    /// Leave the loop, handing this flow to the enclosing command
    Leave(Flow),
}

fn loop_action(flow: Flow) -> LoopAction {
    match flow {
        Flow::Normal(_) | Flow::Continue(1) => LoopAction::Next,
        Flow::Break(1) => LoopAction::Leave(Flow::Normal(0)),
        Flow::Break(n) => LoopAction::Leave(Flow::Break(n - 1)),
        Flow::Continue(n) => LoopAction::Leave(Flow::Continue(n - 1)),
        other => LoopAction::Leave(other),
    }
}

impl<'a> ExecutionEngine<'a> {
    /// Execute an if/elif/else statement.
    pub fn execute_if(&self, state: &mut InterpreterState, node: &IfNode) -> Result<Flow, InterpreterError> {
        for clause in &node.clauses {
            match self.execute_condition(state, &clause.condition)? {
                Flow::Normal(0) => return self.execute_statements(state, &clause.body),
                Flow::Normal(_) => continue,
                other => return Ok(other),
            }
        }
        match &node.else_body {
            Some(body) => self.execute_statements(state, body),
            None => Ok(Flow::Normal(0)),
        }
    }

    /// Execute a for loop. Without an `in` list the loop walks the
    /// positional parameters. The variable keeps its last value afterwards.
    pub fn execute_for(&self, state: &mut InterpreterState, node: &ForNode) -> Result<Flow, InterpreterError> {
        let items = match &node.words {
            Some(words) => self.expand_words(state, words)?,
            None => state.vars.positional().to_vec(),
        };

        state.loop_depth += 1;
        let result = self.run_for_items(state, node, items);
        state.loop_depth -= 1;
        result
    }

    fn run_for_items(&self, state: &mut InterpreterState, node: &ForNode, items: Vec<String>) -> Result<Flow, InterpreterError> {
        let mut status = 0;
        for item in items {
            state.assign(&node.variable, item)?;
            match loop_action(self.execute_statements(state, &node.body)?) {
                LoopAction::Next => status = state.last_exit_code,
                LoopAction::Leave(flow) => return Ok(flow),
            }
        }
        Ok(Flow::Normal(status))
    }

    /// Execute a while loop.
    pub fn execute_while(&self, state: &mut InterpreterState, node: &WhileNode) -> Result<Flow, InterpreterError> {
        self.execute_conditional_loop(state, &node.condition, &node.body, false)
    }

    /// Execute an until loop.
    pub fn execute_until(&self, state: &mut InterpreterState, node: &UntilNode) -> Result<Flow, InterpreterError> {
        self.execute_conditional_loop(state, &node.condition, &node.body, true)
    }

    fn execute_conditional_loop(
        &self,
        state: &mut InterpreterState,
        condition: &[StatementNode],
        body: &[StatementNode],
        until: bool,
    ) -> Result<Flow, InterpreterError> {
        state.loop_depth += 1;
        let result = self.run_conditional_loop(state, condition, body, until);
        state.loop_depth -= 1;
        result
    }

    fn run_conditional_loop(
        &self,
        state: &mut InterpreterState,
        condition: &[StatementNode],
        body: &[StatementNode],
        until: bool,
    ) -> Result<Flow, InterpreterError> {
        let mut status = 0;
        loop {
            let succeeded = match self.execute_condition(state, condition)? {
                Flow::Normal(s) => s == 0,
                other => match loop_action(other) {
                    LoopAction::Next => continue,
                    LoopAction::Leave(flow) => return Ok(flow),
                },
            };
            if succeeded == until {
                break;
            }
            match loop_action(self.execute_statements(state, body)?) {
                LoopAction::Next => status = state.last_exit_code,
                LoopAction::Leave(flow) => return Ok(flow),
            }
        }
        Ok(Flow::Normal(status))
    }

    /// Execute a case statement: the first matching item runs, then stop.
    pub fn execute_case(&self, state: &mut InterpreterState, node: &CaseNode) -> Result<Flow, InterpreterError> {
        let subject = self.expand_word_string(state, &node.word)?;

        for item in &node.items {
            for pattern in &item.patterns {
                let pattern = self.expand_pattern(state, pattern)?;
                if matches_pattern(&pattern, &subject) {
                    return self.execute_statements(state, &item.body);
                }
            }
        }
        Ok(Flow::Normal(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::types::ExecutionLimits;

    fn run(state: &mut InterpreterState, source: &str) -> Flow {
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        engine.execute_source_text(state, source).unwrap()
    }

    #[test]
    fn test_loop_action() {
        assert_eq!(loop_action(Flow::Normal(3)), LoopAction::Next);
        assert_eq!(loop_action(Flow::Continue(1)), LoopAction::Next);
        assert_eq!(loop_action(Flow::Break(1)), LoopAction::Leave(Flow::Normal(0)));
        assert_eq!(loop_action(Flow::Break(3)), LoopAction::Leave(Flow::Break(2)));
        assert_eq!(loop_action(Flow::Continue(2)), LoopAction::Leave(Flow::Continue(1)));
        assert_eq!(loop_action(Flow::Exit(4)), LoopAction::Leave(Flow::Exit(4)));
    }

    #[test]
    fn test_if_elif_else() {
        let mut state = InterpreterState::default();
        run(&mut state, "if false; then r=1; elif true; then r=2; else r=3; fi");
        assert_eq!(state.var("r"), Some("2"));
        run(&mut state, "if false; then r=1; else r=3; fi");
        assert_eq!(state.var("r"), Some("3"));
        assert_eq!(run(&mut state, "if false; then :; fi"), Flow::Normal(0));
    }

    #[test]
    fn test_for_loop_and_break() {
        let mut state = InterpreterState::default();
        run(&mut state, "acc=; for i in a b c d; do if [ $i = c ]; then break; fi; acc=$acc$i; done");
        assert_eq!(state.var("acc"), Some("ab"));
        assert_eq!(state.var("i"), Some("c"));
        assert_eq!(state.loop_depth, 0);
    }

    #[test]
    fn test_nested_continue() {
        let mut state = InterpreterState::default();
        run(
            &mut state,
            "acc=; for i in 1 2; do for j in x y; do continue 2; acc=bad; done; acc=bad2; done; acc=$acc$i",
        );
        assert_eq!(state.var("acc"), Some("2"));
    }

    #[test]
    fn test_while_and_until() {
        let mut state = InterpreterState::default();
        run(&mut state, "n=0; while [ $n -lt 5 ]; do n=$((n+1)); done");
        assert_eq!(state.var("n"), Some("5"));
        run(&mut state, "until [ $n -eq 0 ]; do n=$((n-1)); done");
        assert_eq!(state.var("n"), Some("0"));
    }

    #[test]
    fn test_for_over_positional_parameters() {
        let mut state = InterpreterState::default();
        state.vars.set_positional(vec!["p".into(), "q".into()]);
        run(&mut state, "acc=; for x; do acc=$acc$x; done");
        assert_eq!(state.var("acc"), Some("pq"));
    }

    #[test]
    fn test_case_first_match_wins() {
        let mut state = InterpreterState::default();
        run(&mut state, "case hello in h*) r=glob;; hello) r=exact;; esac");
        assert_eq!(state.var("r"), Some("glob"));
        run(&mut state, "case test in hello) r=match;; *) r=nomatch;; esac");
        assert_eq!(state.var("r"), Some("nomatch"));
        run(&mut state, "case 'a*' in 'a*') r=quoted;; esac");
        assert_eq!(state.var("r"), Some("quoted"));
        run(&mut state, "case b in a|b) r=alt;; esac");
        assert_eq!(state.var("r"), Some("alt"));
    }
}
