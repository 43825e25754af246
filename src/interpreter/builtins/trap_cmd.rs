//! trap - Run commands on shell exit or on signals
//!
//! Usage:
//!   trap                      - list the traps in effect
//!   trap action condition...  - set the action ('' ignores the signal)
//!   trap - condition...       - restore the default action
//!   trap n condition...       - same as `-` when the first operand is a number
//!
//! Conditions are EXIT (or 0) and signal names with or without the SIG
//! prefix, or their numbers. A caught signal is recorded by the process
//! layer; its action runs once the current command has finished.

use crate::interpreter::errors::{report_error, InterpreterError};
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::helpers::quoting::single_quote;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::process::{catch_signal, default_signal, ignore_signal, take_pending_signals};
use crate::interpreter::types::{Flow, InterpreterState};

const EXIT_CONDITION: &str = "EXIT";

/// Trappable conditions in listing order
const CONDITIONS: &[(&str, libc::c_int)] = &[
    (EXIT_CONDITION, 0),
    ("HUP", libc::SIGHUP),
    ("INT", libc::SIGINT),
    ("QUIT", libc::SIGQUIT),
    ("ABRT", libc::SIGABRT),
    ("USR1", libc::SIGUSR1),
    ("USR2", libc::SIGUSR2),
    ("PIPE", libc::SIGPIPE),
    ("ALRM", libc::SIGALRM),
    ("TERM", libc::SIGTERM),
    ("CHLD", libc::SIGCHLD),
];

fn lookup_condition(word: &str) -> Option<(&'static str, libc::c_int)> {
    if let Ok(number) = word.parse::<libc::c_int>() {
        return CONDITIONS.iter().find(|(_, n)| *n == number).copied();
    }
    let name = word.strip_prefix("SIG").unwrap_or(word);
    CONDITIONS.iter().find(|(n, _)| *n == name).copied()
}

fn condition_name(signal: libc::c_int) -> Option<&'static str> {
    CONDITIONS.iter().find(|(_, n)| *n == signal).map(|(name, _)| *name)
}

fn list_traps(state: &InterpreterState) -> String {
    CONDITIONS
        .iter()
        .filter_map(|(name, _)| {
            state
                .traps
                .get(*name)
                .map(|action| format!("trap -- {} {}\n", single_quote(action), name))
        })
        .collect()
}

/// Install `action` (None resets) for one condition
fn set_trap(state: &mut InterpreterState, name: &str, signal: libc::c_int, action: Option<&str>) -> std::io::Result<()> {
    if signal != 0 {
        match action {
            None => default_signal(signal)?,
            Some("") => ignore_signal(signal)?,
            Some(_) => catch_signal(signal)?,
        }
    }
    match action {
        Some(action) => {
            tracing::debug!(condition = name, %action, "trap set");
            state.traps.insert(name.to_string(), action.to_string());
        }
        None => {
            tracing::debug!(condition = name, "trap reset");
            state.traps.shift_remove(name);
        }
    }
    Ok(())
}

pub fn handle_trap(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let args = match args.first() {
        Some(first) if first == "--" => &args[1..],
        _ => args,
    };

    let Some(first) = args.first() else {
        return BuiltinResult::success(list_traps(state));
    };
    if first == "-p" && args.len() == 1 {
        return BuiltinResult::success(list_traps(state));
    }

    let (action, conditions) = if first == "-" {
        (None, &args[1..])
    } else if first.parse::<u32>().is_ok() {
        (None, args)
    } else {
        (Some(first.as_str()), &args[1..])
    };
    if conditions.is_empty() {
        return BuiltinResult::failure("posish: trap: condition argument required\n", 2);
    }

    let mut result = BuiltinResult::ok();
    for word in conditions {
        let Some((name, signal)) = lookup_condition(word) else {
            result.stderr.push_str(&format!("posish: trap: {}: bad trap\n", word));
            result.exit_code = 1;
            continue;
        };
        if let Err(e) = set_trap(state, name, signal, action) {
            result.stderr.push_str(&format!("posish: trap: {}: {}\n", word, e));
            result.exit_code = 1;
        }
    }
    result
}

/// Entering a subshell: caught signals and the EXIT action go back to
/// their defaults, ignored signals stay ignored.
pub fn reset_traps_for_subshell(state: &mut InterpreterState) {
    let caught: Vec<String> = state
        .traps
        .iter()
        .filter(|(_, action)| !action.is_empty())
        .map(|(name, _)| name.clone())
        .collect();
    for name in caught {
        if let Some((_, signal)) = lookup_condition(&name) {
            if signal != 0 {
                let _ = default_signal(signal);
            }
        }
        state.traps.shift_remove(&name);
    }
}

impl<'a> ExecutionEngine<'a> {
    /// Run one trap action. `$?` is restored afterwards unless the action
    /// leaves the shell.
    fn run_trap_action(&self, state: &mut InterpreterState, action: &str) -> Option<Flow> {
        let saved = state.last_exit_code;
        let flow = match self.execute_source_text(state, action) {
            Ok(flow) => flow,
            Err(e) => {
                report_error(&e);
                Flow::Normal(e.exit_status())
            }
        };
        state.last_exit_code = saved;
        match flow {
            Flow::Exit(status) => Some(Flow::Exit(status)),
            _ => None,
        }
    }

    /// Run the actions of signals caught since the last check
    pub fn run_pending_traps(&self, state: &mut InterpreterState) -> Result<Option<Flow>, InterpreterError> {
        for signal in take_pending_signals() {
            let Some(action) = condition_name(signal).and_then(|name| state.traps.get(name)).cloned() else {
                continue;
            };
            tracing::debug!(signal, %action, "running signal trap");
            if let Some(flow) = self.run_trap_action(state, &action) {
                return Ok(Some(flow));
            }
        }
        Ok(None)
    }

    /// Run the EXIT action, at most once, as the shell leaves with
    /// `status`. Returns the status the shell finally exits with.
    pub fn run_exit_trap(&self, state: &mut InterpreterState, status: i32) -> i32 {
        let Some(action) = state.traps.shift_remove(EXIT_CONDITION) else {
            return status;
        };
        tracing::debug!(%action, status, "running exit trap");
        state.last_exit_code = status;
        match self.run_trap_action(state, &action) {
            Some(flow) => flow.status(),
            None => status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::types::ExecutionLimits;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_list_and_reset_exit_trap() {
        let mut state = InterpreterState::default();
        assert_eq!(handle_trap(&mut state, &args(&["echo bye", "EXIT"])).exit_code, 0);
        assert_eq!(handle_trap(&mut state, &[]).stdout, "trap -- 'echo bye' EXIT\n");

        handle_trap(&mut state, &args(&["-", "0"]));
        assert!(state.traps.is_empty());
        assert_eq!(handle_trap(&mut state, &[]).stdout, "");
    }

    #[test]
    fn test_condition_spellings() {
        assert_eq!(lookup_condition("SIGTERM"), Some(("TERM", libc::SIGTERM)));
        assert_eq!(lookup_condition("2"), Some(("INT", libc::SIGINT)));
        assert_eq!(lookup_condition("0"), Some(("EXIT", 0)));
        assert_eq!(lookup_condition("KILL"), None);
    }

    #[test]
    fn test_bad_condition() {
        let mut state = InterpreterState::default();
        let result = handle_trap(&mut state, &args(&["echo x", "NOPE"]));
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "posish: trap: NOPE: bad trap\n");
    }

    #[test]
    fn test_exit_trap_runs_once_and_may_change_status() {
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        let mut state = InterpreterState::default();
        engine.execute_source_text(&mut state, "trap 'seen=$?' EXIT").unwrap();
        assert_eq!(engine.run_exit_trap(&mut state, 4), 4);
        assert_eq!(state.var("seen"), Some("4"));
        assert_eq!(engine.run_exit_trap(&mut state, 5), 5);

        engine.execute_source_text(&mut state, "trap 'exit 9' EXIT").unwrap();
        assert_eq!(engine.run_exit_trap(&mut state, 0), 9);
    }

    #[test]
    fn test_subshell_keeps_only_ignored_traps() {
        let mut state = InterpreterState::default();
        state.traps.insert("EXIT".into(), "echo x".into());
        state.traps.insert("QUIT".into(), String::new());
        reset_traps_for_subshell(&mut state);
        assert_eq!(state.traps.len(), 1);
        assert_eq!(state.traps.get("QUIT").map(String::as_str), Some(""));
    }
}
