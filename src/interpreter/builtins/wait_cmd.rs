//! wait - Wait for background jobs
//!
//! wait [pid...]
//!
//! Without operands waits for every background job. The status is that
//! of the last job waited for; a pid that is not a known child gives 127.

use crate::interpreter::errors::InterpreterError;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::process::wait_for_pid;
use crate::interpreter::types::{InterpreterState, Job};

/// Collect a job's status, waiting only the first time
fn collect(job: &mut Job) -> Result<i32, InterpreterError> {
    if let Some(status) = job.status {
        return Ok(status);
    }
    let status = wait_for_pid(job.pid)?;
    tracing::debug!(pid = job.pid, command = %job.command, status, "job collected");
    job.status = Some(status);
    Ok(status)
}

pub fn handle_wait(state: &mut InterpreterState, args: &[String]) -> Result<BuiltinResult, InterpreterError> {
    if args.is_empty() {
        let mut status = 0;
        for job in state.jobs.iter_mut() {
            status = collect(job)?;
        }
        state.jobs.clear();
        return Ok(BuiltinResult::status(status));
    }

    let mut result = BuiltinResult::ok();
    for arg in args {
        let job = arg
            .parse::<libc::pid_t>()
            .ok()
            .and_then(|pid| state.jobs.iter_mut().find(|job| job.pid == pid));
        match job {
            Some(job) => result.exit_code = collect(job)?,
            None => {
                result.stderr.push_str(&format!("posish: wait: pid {} is not a child of this shell\n", arg));
                result.exit_code = 127;
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::execution_engine::ExecutionEngine;
    use crate::interpreter::types::ExecutionLimits;

    #[test]
    fn test_wait_for_background_status() {
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        let mut state = InterpreterState::default();
        engine.execute_source_text(&mut state, "(exit 7) &").unwrap();
        let pid = state.last_background_pid.unwrap();

        let result = handle_wait(&mut state, &[pid.to_string()]).unwrap();
        assert_eq!(result.exit_code, 7);
        let again = handle_wait(&mut state, &[pid.to_string()]).unwrap();
        assert_eq!(again.exit_code, 7);

        let all = handle_wait(&mut state, &[]).unwrap();
        assert_eq!(all.exit_code, 7);
        assert!(state.jobs.is_empty());
    }

    #[test]
    fn test_wait_unknown_pid() {
        let mut state = InterpreterState::default();
        let result = handle_wait(&mut state, &["999999".to_string()]).unwrap();
        assert_eq!(result.exit_code, 127);
    }
}
