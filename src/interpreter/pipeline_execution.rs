//! Pipeline Execution
//!
//! Handles execution of command pipelines (cmd1 | cmd2 | cmd3) and of
//! background lists (`cmd &`).
//!
//! Every stage of a multi-command pipeline runs in its own child. All
//! stages are started before any of them is waited for; the pipeline's
//! status is the last stage's.

use crate::ast::types::{CommandNode, StatementNode};
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::process::{
    create_pipe, current_pgid, exit_child, fork_process, move_onto, try_reap, wait_for_pid, ForkResult,
};
use crate::interpreter::types::{Flow, InterpreterState, Job};
use std::fs::File;
use std::os::fd::OwnedFd;

/// Short label for a background job
fn describe_statement(statement: &StatementNode) -> String {
    let first = statement.pipelines.first().and_then(|p| p.commands.first());
    match first {
        Some(CommandNode::Simple(simple)) => simple
            .name
            .as_ref()
            .and_then(|w| w.literal_text())
            .unwrap_or_else(|| "(command)".to_string()),
        Some(CommandNode::Compound(_)) => "(compound)".to_string(),
        Some(CommandNode::FunctionDef(def)) => def.name.clone(),
        None => String::new(),
    }
}

impl<'a> ExecutionEngine<'a> {
    /// Run a pipeline of two or more commands
    pub fn execute_multi_stage(&self, state: &mut InterpreterState, commands: &[CommandNode]) -> Result<Flow, InterpreterError> {
        let mut pids = Vec::with_capacity(commands.len());
        let mut previous_read: Option<OwnedFd> = None;

        for (i, command) in commands.iter().enumerate() {
            let pipe = if i + 1 < commands.len() {
                Some(create_pipe()?)
            } else {
                None
            };

            match fork_process()? {
                ForkResult::Child => {
                    let output = pipe.map(|(reader, writer)| {
                        drop(reader);
                        writer
                    });
                    if let Some(input) = previous_read.take() {
                        if move_onto(input, 0).is_err() {
                            exit_child(1);
                        }
                    }
                    if let Some(output) = output {
                        if move_onto(output, 1).is_err() {
                            exit_child(1);
                        }
                    }
                    self.run_in_child(state, |engine, state| engine.execute_command(state, command));
                }
                ForkResult::Parent(pid) => {
                    pids.push(pid);
                    previous_read = pipe.map(|(reader, writer)| {
                        drop(writer);
                        reader
                    });
                }
            }
        }
        drop(previous_read);

        let mut status = 0;
        for pid in pids {
            status = wait_for_pid(pid)?;
        }
        Ok(Flow::Normal(status))
    }

    /// Launch a statement in the background without waiting for it
    pub fn execute_background(&self, state: &mut InterpreterState, statement: &StatementNode) -> Result<Flow, InterpreterError> {
        reap_jobs(state);
        match fork_process()? {
            ForkResult::Child => {
                if let Ok(null) = File::open("/dev/null") {
                    let _ = move_onto(OwnedFd::from(null), 0);
                }
                self.run_in_child(state, |engine, state| engine.execute_and_or(state, statement))
            }
            ForkResult::Parent(pid) => {
                let command = describe_statement(statement);
                tracing::debug!(pid, %command, "background job started");
                state.last_background_pid = Some(pid);
                state.jobs.push(Job {
                    pid,
                    pgid: current_pgid(),
                    command,
                    status: None,
                });
                Ok(Flow::Normal(0))
            }
        }
    }
}

/// Finished jobs whose status is still kept for `wait`
const FINISHED_JOBS_KEPT: usize = 64;

/// Collect background children that have exited so none linger as
/// zombies. Their statuses stay available to `wait`; the oldest finished
/// entries are forgotten once too many pile up, except `$!`.
pub fn reap_jobs(state: &mut InterpreterState) {
    for job in state.jobs.iter_mut().filter(|job| job.status.is_none()) {
        if let Some(status) = try_reap(job.pid) {
            tracing::debug!(pid = job.pid, command = %job.command, status, "background job reaped");
            job.status = Some(status);
        }
    }

    let finished = state.jobs.iter().filter(|job| job.status.is_some()).count();
    let mut excess = finished.saturating_sub(FINISHED_JOBS_KEPT);
    let keep_pid = state.last_background_pid;
    state.jobs.retain(|job| {
        if excess > 0 && job.status.is_some() && Some(job.pid) != keep_pid {
            excess -= 1;
            return false;
        }
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::CommandNode;
    use crate::parser::parse;

    #[test]
    fn test_describe_statement() {
        let script = parse("sleep 1 &").unwrap();
        assert_eq!(describe_statement(&script.statements[0]), "sleep");
        let script = parse("{ :; } &").unwrap();
        assert!(matches!(
            script.statements[0].pipelines[0].commands[0],
            CommandNode::Compound(_)
        ));
        assert_eq!(describe_statement(&script.statements[0]), "(compound)");
    }

    #[test]
    fn test_finished_jobs_are_reaped() {
        use crate::interpreter::types::ExecutionLimits;
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        let mut state = InterpreterState::default();
        engine.execute_source_text(&mut state, "(exit 3) &").unwrap();
        let pid = state.last_background_pid.unwrap();

        std::thread::sleep(std::time::Duration::from_millis(300));
        reap_jobs(&mut state);
        assert_eq!(state.jobs[0].status, Some(3));
        // Already collected: the kernel no longer knows the child
        assert_eq!(try_reap(pid), None);
    }

    #[test]
    fn test_old_finished_jobs_are_forgotten() {
        let mut state = InterpreterState::default();
        for pid in 1..=(FINISHED_JOBS_KEPT as libc::pid_t + 10) {
            state.jobs.push(Job {
                pid,
                pgid: 0,
                command: "true".into(),
                status: Some(0),
            });
        }
        state.last_background_pid = Some(1);
        reap_jobs(&mut state);
        assert_eq!(state.jobs.len(), FINISHED_JOBS_KEPT);
        assert!(state.jobs.iter().any(|job| job.pid == 1));
    }
}
