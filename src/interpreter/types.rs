//! Interpreter Types
//!
//! Type definitions for the interpreter state and the control-flow result
//! every execution function returns.

use crate::ast::types::FunctionDefNode;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::scope::VariableStore;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::rc::Rc;

/// Result of executing any node.
///
/// `Normal` carries an exit status. The other variants unwind enclosing
/// loops, functions or the whole shell until something consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Normal(i32),
    /// Leave this many enclosing loops
    Break(u32),
    /// Skip to the next iteration of the n-th enclosing loop
    Continue(u32),
    /// Leave the current function or sourced file
    Return(i32),
    /// Terminate the shell (or the current subshell)
    Exit(i32),
}

impl Flow {
    /// Exit status associated with the signal
    pub fn status(&self) -> i32 {
        match self {
            Flow::Normal(s) | Flow::Return(s) | Flow::Exit(s) => *s,
            Flow::Break(_) | Flow::Continue(_) => 0,
        }
    }
}

/// Shell options (set -e, etc.)
#[derive(Debug, Clone, Default)]
pub struct ShellOptions {
    /// set -a: Export all variables
    pub allexport: bool,
    /// set -C: Prevent overwriting files with redirection
    pub noclobber: bool,
    /// set -e: Exit immediately if a command exits with non-zero status
    pub errexit: bool,
    /// set -f: Disable filename expansion (globbing)
    pub noglob: bool,
    /// set -n: Read commands but do not execute them
    pub noexec: bool,
    /// set -u: Treat unset variables as an error when substituting
    pub nounset: bool,
    /// set -v: Print shell input as it is read
    pub verbose: bool,
    /// set -x: Print commands and their arguments as they are executed
    pub xtrace: bool,
}

/// Execution limits configuration.
#[derive(Debug, Clone)]
pub struct ExecutionLimits {
    /// Maximum nesting of function calls
    pub max_call_depth: u32,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_call_depth: 1000,
        }
    }
}

/// A background child started with `&`
#[derive(Debug, Clone)]
pub struct Job {
    pub pid: libc::pid_t,
    pub pgid: libc::pid_t,
    /// Short description of the launched command, for diagnostics
    pub command: String,
    /// Collected status once the job has been waited for
    pub status: Option<i32>,
}

/// Complete interpreter state.
///
/// Forked children (subshells, pipeline stages, command substitutions)
/// receive a copy of this value through fork, so nothing they change is
/// visible to the parent.
#[derive(Debug, Clone)]
pub struct InterpreterState {
    // ---- Environment ----
    /// Variables, positional parameters and the function scope chain
    pub vars: VariableStore,
    /// Function definitions (name -> AST node, shared with running calls)
    pub functions: HashMap<String, Rc<FunctionDefNode>>,
    /// Alias definitions in definition order
    pub aliases: IndexMap<String, String>,
    /// Aliases currently being expanded (stops self-referencing aliases)
    pub alias_stack: Vec<String>,
    pub options: ShellOptions,

    // ---- Execution Tracking ----
    /// Exit code of last executed command ($?)
    pub last_exit_code: i32,
    /// $0
    pub script_name: String,
    /// Status of the last command substitution in the current simple command
    pub last_substitution_status: Option<i32>,

    // ---- Process ----
    /// $$ (stays the top-level shell's pid inside subshells)
    pub shell_pid: libc::pid_t,
    /// PID of last background job ($!)
    pub last_background_pid: Option<libc::pid_t>,
    pub jobs: Vec<Job>,
    /// True inside forked subshells and pipeline stages
    pub is_subshell: bool,

    // ---- Control Flow ----
    /// Current loop nesting depth (for break/continue)
    pub loop_depth: u32,
    /// Current function call depth
    pub call_depth: u32,
    /// Current `.` nesting depth (for return in sourced files)
    pub source_depth: u32,
    /// Nonzero while running a condition, a `&&`/`||` operand or a negated pipeline
    pub errexit_suppressed: u32,

    // ---- Builtin State ----
    /// getopts progress inside a grouped option word: (OPTIND it belongs
    /// to, character index). Ignored once OPTIND is changed by the script.
    pub getopts_position: Option<(usize, usize)>,
    /// Trap actions keyed by condition (`EXIT`, `INT`, ...); an empty
    /// action means the signal is ignored
    pub traps: IndexMap<String, String>,
}

impl Default for InterpreterState {
    fn default() -> Self {
        Self {
            vars: VariableStore::new(),
            functions: HashMap::new(),
            aliases: IndexMap::new(),
            alias_stack: Vec::new(),
            options: ShellOptions::default(),
            last_exit_code: 0,
            script_name: String::from("posish"),
            last_substitution_status: None,
            // SAFETY: getpid has no preconditions
            shell_pid: unsafe { libc::getpid() },
            last_background_pid: None,
            jobs: Vec::new(),
            is_subshell: false,
            loop_depth: 0,
            call_depth: 0,
            source_depth: 0,
            errexit_suppressed: 0,
            getopts_position: None,
            traps: IndexMap::new(),
        }
    }
}

impl InterpreterState {
    /// State seeded with an inherited environment; every entry is exported.
    pub fn from_environment<I>(env: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut state = Self::default();
        for (name, value) in env {
            state.vars.import(&name, value);
        }
        state
    }

    /// Assign a variable, honoring `set -a`
    pub fn assign(&mut self, name: &str, value: impl Into<String>) -> Result<(), InterpreterError> {
        self.vars.set(name, value.into())?;
        if self.options.allexport {
            self.vars.export(name, None)?;
        }
        Ok(())
    }

    /// Value of a named shell variable (not special parameters)
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.value(name)
    }

    /// True while a function body is executing
    pub fn in_function(&self) -> bool {
        self.call_depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_status() {
        assert_eq!(Flow::Normal(3).status(), 3);
        assert_eq!(Flow::Exit(99).status(), 99);
        assert_eq!(Flow::Break(2).status(), 0);
    }

    #[test]
    fn test_allexport_marks_assignments() {
        let mut state = InterpreterState::default();
        state.assign("A", "1").unwrap();
        assert!(!state.vars.get("A").unwrap().exported);

        state.options.allexport = true;
        state.assign("B", "2").unwrap();
        assert!(state.vars.get("B").unwrap().exported);
    }

    #[test]
    fn test_environment_is_exported() {
        let state = InterpreterState::from_environment(vec![("HOME".to_string(), "/h".to_string())]);
        assert_eq!(state.var("HOME"), Some("/h"));
        assert!(state
            .vars
            .exported_environment()
            .contains(&("HOME".to_string(), "/h".to_string())));
    }
}
