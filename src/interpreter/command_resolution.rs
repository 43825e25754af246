//! Command Resolution
//!
//! Simple command execution: expand the words, resolve the command name and
//! dispatch it. Resolution order is function, builtin, alias, then a search
//! of PATH for an external program.

use crate::ast::types::{AssignmentNode, FunctionDefNode, RedirectionNode, SimpleCommandNode, WordNode};
use crate::interpreter::builtins::Builtin;
use crate::interpreter::errors::{os_error_text, report_error, InterpreterError};
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::helpers::bytes::{decode_bytes, encode_text, to_os_string};
use crate::interpreter::helpers::shell_constants::DEFAULT_PATH;
use crate::interpreter::helpers::xtrace::format_trace;
use crate::interpreter::process::{exit_child, fork_process, wait_for_pid, write_all_fd, ForkResult};
use crate::interpreter::redirections::RedirectionGuard;
use crate::interpreter::types::{Flow, InterpreterState};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;

/// How a command name resolved
#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Function(Rc<FunctionDefNode>),
    Builtin(Builtin),
    /// Alias replacement text
    Alias(String),
    External(PathBuf),
    /// Found on PATH but not executable
    PermissionDenied(PathBuf),
    NotFound,
}

impl ResolvedCommand {
    fn kind(&self) -> &'static str {
        match self {
            ResolvedCommand::Function(_) => "function",
            ResolvedCommand::Builtin(_) => "builtin",
            ResolvedCommand::Alias(_) => "alias",
            ResolvedCommand::External(_) => "external",
            ResolvedCommand::PermissionDenied(_) => "not executable",
            ResolvedCommand::NotFound => "not found",
        }
    }
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Search PATH for an external program. A name containing `/` is taken
/// as a path and left for exec to judge.
pub fn lookup_path(state: &InterpreterState, name: &str) -> ResolvedCommand {
    if name.contains('/') {
        return ResolvedCommand::External(PathBuf::from(name));
    }

    let search = state.var("PATH").unwrap_or(DEFAULT_PATH);
    let mut denied = None;
    for dir in search.split(':') {
        let dir = if dir.is_empty() { "." } else { dir };
        let candidate = Path::new(dir).join(name);
        if !candidate.is_file() {
            continue;
        }
        if is_executable(&candidate) {
            return ResolvedCommand::External(candidate);
        }
        denied.get_or_insert(candidate);
    }
    match denied {
        Some(path) => ResolvedCommand::PermissionDenied(path),
        None => ResolvedCommand::NotFound,
    }
}

/// Exported variables plus the command's prefix assignments
fn child_environment(state: &InterpreterState, assignments: &[(String, String)]) -> Vec<(String, String)> {
    let mut env = state.vars.exported_environment();
    for (name, value) in assignments {
        match env.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.clone(),
            None => env.push((name.clone(), value.clone())),
        }
    }
    env
}

impl<'a> ExecutionEngine<'a> {
    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve a command name. Aliases are only considered when the name
    /// came from an unquoted literal word and is not already being expanded.
    pub fn resolve_command(&self, state: &InterpreterState, name: &str, alias_ok: bool) -> ResolvedCommand {
        if let Some(function) = state.functions.get(name) {
            return ResolvedCommand::Function(Rc::clone(function));
        }
        if let Some(builtin) = Builtin::from_name(name) {
            return ResolvedCommand::Builtin(builtin);
        }
        if alias_ok && !state.alias_stack.iter().any(|a| a == name) {
            if let Some(value) = state.aliases.get(name) {
                return ResolvedCommand::Alias(value.clone());
            }
        }
        lookup_path(state, name)
    }

    // ========================================================================
    // Simple Commands
    // ========================================================================

    fn assignment_value(&self, state: &mut InterpreterState, assignment: &AssignmentNode) -> Result<String, InterpreterError> {
        match &assignment.value {
            Some(word) => self.expand_word_string(state, word),
            None => Ok(String::new()),
        }
    }

    fn trace_command(&self, state: &InterpreterState, assignments: &[(String, String)], words: &[String]) {
        if state.options.xtrace {
            let _ = write_all_fd(2, &encode_text(&format_trace(state, assignments, words)));
        }
    }

    /// Execute a simple command
    pub fn execute_simple_command(&self, state: &mut InterpreterState, node: &SimpleCommandNode) -> Result<Flow, InterpreterError> {
        state.last_substitution_status = None;

        let mut words = Vec::new();
        if let Some(name) = &node.name {
            words.extend(self.expand_word_fields(state, name)?);
        }
        words.extend(self.expand_words(state, &node.args)?);

        if words.is_empty() {
            return self.execute_assignment_only(state, node);
        }

        let mut assignments = Vec::with_capacity(node.assignments.len());
        for assignment in &node.assignments {
            let value = self.assignment_value(state, assignment)?;
            assignments.push((assignment.name.clone(), value));
        }
        self.trace_command(state, &assignments, &words);

        let alias_ok = node
            .name
            .as_ref()
            .and_then(WordNode::literal_text)
            .is_some_and(|name| name == words[0]);
        self.dispatch_command(state, &node.redirections, &assignments, words, alias_ok)
    }

    /// No command word: assignments persist, redirections are still
    /// performed, and the status comes from the last command substitution.
    fn execute_assignment_only(&self, state: &mut InterpreterState, node: &SimpleCommandNode) -> Result<Flow, InterpreterError> {
        let mut traced = Vec::new();
        for assignment in &node.assignments {
            let value = self.assignment_value(state, assignment)?;
            state.assign(&assignment.name, value.clone())?;
            traced.push((assignment.name.clone(), value));
        }
        if !traced.is_empty() {
            self.trace_command(state, &traced, &[]);
        }

        let mut guard = RedirectionGuard::new();
        self.apply_redirections(state, &node.redirections, Some(&mut guard))?;
        Ok(Flow::Normal(state.last_substitution_status.unwrap_or(0)))
    }

    /// Run an already-expanded command
    pub(crate) fn dispatch_command(
        &self,
        state: &mut InterpreterState,
        redirections: &[RedirectionNode],
        assignments: &[(String, String)],
        words: Vec<String>,
        alias_ok: bool,
    ) -> Result<Flow, InterpreterError> {
        let resolved = self.resolve_command(state, &words[0], alias_ok);
        tracing::trace!(name = %words[0], kind = resolved.kind(), "resolved command");

        match resolved {
            ResolvedCommand::Function(function) => self.with_temp_bindings(state, assignments, |engine, state| {
                let mut guard = RedirectionGuard::new();
                engine.apply_redirections(state, redirections, Some(&mut guard))?;
                engine.call_function(state, function, words[1..].to_vec())
            }),
            ResolvedCommand::Builtin(builtin) if builtin.is_special() => {
                for (name, value) in assignments {
                    state.assign(name, value.clone())?;
                }
                self.invoke_builtin(state, redirections, builtin, &words)
            }
            ResolvedCommand::Builtin(builtin) => self.with_temp_bindings(state, assignments, |engine, state| {
                engine.invoke_builtin(state, redirections, builtin, &words)
            }),
            ResolvedCommand::Alias(value) => self.execute_alias(state, redirections, assignments, &value, words),
            ResolvedCommand::External(path) => self.execute_external(state, redirections, assignments, &path, &words),
            ResolvedCommand::PermissionDenied(_) => {
                self.command_failure(state, redirections, format!("{}: Permission denied", words[0]), 126)
            }
            ResolvedCommand::NotFound => {
                self.command_failure(state, redirections, format!("{}: command not found", words[0]), 127)
            }
        }
    }

    /// Run `body` with prefix assignments bound in a temporary scope
    pub(crate) fn with_temp_bindings<F>(
        &self,
        state: &mut InterpreterState,
        assignments: &[(String, String)],
        body: F,
    ) -> Result<Flow, InterpreterError>
    where
        F: FnOnce(&Self, &mut InterpreterState) -> Result<Flow, InterpreterError>,
    {
        if assignments.is_empty() {
            return body(self, state);
        }
        state.vars.push_temp_scope(assignments)?;
        let result = body(self, state);
        state.vars.pop_scope();
        result
    }

    fn command_failure(
        &self,
        state: &mut InterpreterState,
        redirections: &[RedirectionNode],
        message: String,
        status: i32,
    ) -> Result<Flow, InterpreterError> {
        let mut guard = RedirectionGuard::new();
        self.apply_redirections(state, redirections, Some(&mut guard))?;
        report_error(message);
        Ok(Flow::Normal(status))
    }

    // ========================================================================
    // Builtins
    // ========================================================================

    /// Run a builtin with its redirections in place and write its output
    pub(crate) fn invoke_builtin(
        &self,
        state: &mut InterpreterState,
        redirections: &[RedirectionNode],
        builtin: Builtin,
        words: &[String],
    ) -> Result<Flow, InterpreterError> {
        let mut guard = RedirectionGuard::new();
        self.apply_redirections(state, redirections, Some(&mut guard))?;
        let result = self.run_builtin(state, builtin, &words[1..], &mut guard)?;

        if !result.stdout.is_empty() {
            if let Err(e) = write_all_fd(1, &encode_text(&result.stdout)) {
                report_error(format!("{}: write error: {}", builtin.name(), os_error_text(&e)));
                return Ok(Flow::Normal(1));
            }
        }
        if !result.stderr.is_empty() {
            let _ = write_all_fd(2, &encode_text(&result.stderr));
        }
        Ok(result.to_flow())
    }

    // ========================================================================
    // External Commands
    // ========================================================================

    /// Fork, apply redirections in the child, exec the program and wait
    pub(crate) fn execute_external(
        &self,
        state: &mut InterpreterState,
        redirections: &[RedirectionNode],
        assignments: &[(String, String)],
        path: &Path,
        words: &[String],
    ) -> Result<Flow, InterpreterError> {
        match fork_process()? {
            ForkResult::Child => {
                if let Err(e) = self.apply_redirections(state, redirections, None) {
                    report_error(&e);
                    exit_child(1);
                }
                let env = child_environment(state, assignments);
                let status = self.exec_program(path, words, env);
                exit_child(status)
            }
            ForkResult::Parent(pid) => Ok(Flow::Normal(wait_for_pid(pid)?)),
        }
    }

    /// Replace the current process image. Only returns on failure, with
    /// the status the shell should exit with.
    pub(crate) fn exec_program(&self, path: &Path, words: &[String], env: Vec<(String, String)>) -> i32 {
        let err = Command::new(path)
            .arg0(to_os_string(&words[0]))
            .args(words[1..].iter().map(|w| to_os_string(w)))
            .env_clear()
            .envs(env.iter().map(|(k, v)| (to_os_string(k), to_os_string(v))))
            .exec();

        match err.raw_os_error() {
            Some(libc::ENOEXEC) => self.run_script_file(path, words, env),
            Some(libc::ENOENT) => {
                report_error(format!("{}: {}", words[0], os_error_text(&err)));
                127
            }
            _ => {
                report_error(format!("{}: {}", words[0], os_error_text(&err)));
                126
            }
        }
    }

    /// A file without a recognised executable format is run as a shell
    /// script in a fresh shell context.
    fn run_script_file(&self, path: &Path, words: &[String], env: Vec<(String, String)>) -> i32 {
        let text = match fs::read(path) {
            Ok(bytes) => decode_bytes(&bytes),
            Err(e) => {
                report_error(format!("{}: {}", words[0], os_error_text(&e)));
                return 126;
            }
        };
        tracing::debug!(path = %path.display(), "running file as a shell script");

        let mut script_state = InterpreterState::from_environment(env);
        script_state.script_name = words[0].clone();
        script_state.vars.set_positional(words[1..].to_vec());
        let status = match self.execute_source_text(&mut script_state, &text) {
            Ok(flow) => flow.status(),
            Err(e) => {
                report_error(&e);
                e.exit_status()
            }
        };
        self.run_exit_trap(&mut script_state, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::types::ExecutionLimits;

    #[test]
    fn test_resolution_order() {
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        let mut state = InterpreterState::default();
        state.assign("PATH", "/bin:/usr/bin").unwrap();

        assert!(matches!(engine.resolve_command(&state, "echo", true), ResolvedCommand::Builtin(Builtin::Echo)));
        assert!(matches!(engine.resolve_command(&state, "sh", true), ResolvedCommand::External(_)));
        assert!(matches!(
            engine.resolve_command(&state, "no-such-command-posish", true),
            ResolvedCommand::NotFound
        ));

        state.aliases.insert("ll".into(), "echo long".into());
        assert!(matches!(engine.resolve_command(&state, "ll", true), ResolvedCommand::Alias(_)));
        assert!(matches!(engine.resolve_command(&state, "ll", false), ResolvedCommand::NotFound));
        state.alias_stack.push("ll".into());
        assert!(matches!(engine.resolve_command(&state, "ll", true), ResolvedCommand::NotFound));
    }

    #[test]
    fn test_function_wins_over_builtin() {
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        let mut state = InterpreterState::default();
        engine.execute_source_text(&mut state, "echo() { :; }").unwrap();
        assert!(matches!(engine.resolve_command(&state, "echo", true), ResolvedCommand::Function(_)));
    }

    #[test]
    fn test_child_environment_overrides() {
        let mut state = InterpreterState::default();
        state.vars.export("A", Some("1".into())).unwrap();
        state.assign("HIDDEN", "x").unwrap();
        let env = child_environment(&state, &[("A".into(), "2".into()), ("B".into(), "3".into())]);
        assert!(env.contains(&("A".to_string(), "2".to_string())));
        assert!(env.contains(&("B".to_string(), "3".to_string())));
        assert!(!env.iter().any(|(n, _)| n == "HIDDEN"));
    }

    #[test]
    fn test_assignment_only_status() {
        let limits = ExecutionLimits::default();
        let engine = ExecutionEngine::new(&limits);
        let mut state = InterpreterState::default();
        let flow = engine.execute_source_text(&mut state, "x=$(exit 3)").unwrap();
        assert_eq!(flow, Flow::Normal(3));
        let flow = engine.execute_source_text(&mut state, "a=1 b=$a").unwrap();
        assert_eq!(flow, Flow::Normal(0));
        assert_eq!(state.var("b"), Some("1"));
    }
}
