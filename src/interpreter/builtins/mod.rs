//! Builtin Commands
//!
//! This module contains implementations of shell builtin commands, one
//! file per builtin. Each handler receives the already-expanded arguments
//! (without the command name) and returns a [`BuiltinResult`]; the
//! executor writes the collected output to descriptors 1 and 2.

pub mod alias_cmd;
pub mod break_cmd;
pub mod cd_cmd;
pub mod command_cmd;
pub mod continue_cmd;
pub mod echo_cmd;
pub mod eval_cmd;
pub mod exec_cmd;
pub mod exit_cmd;
pub mod export_cmd;
pub mod getopts_cmd;
pub mod local_cmd;
pub mod printf_cmd;
pub mod pwd_cmd;
pub mod read_cmd;
pub mod readonly_cmd;
pub mod return_cmd;
pub mod set_cmd;
pub mod shift_cmd;
pub mod source_cmd;
pub mod test_cmd;
pub mod times_cmd;
pub mod trap_cmd;
pub mod true_cmd;
pub mod type_cmd;
pub mod umask_cmd;
pub mod unalias_cmd;
pub mod unset_cmd;
pub mod wait_cmd;

pub use alias_cmd::handle_alias;
pub use break_cmd::handle_break;
pub use cd_cmd::handle_cd;
pub use command_cmd::handle_command;
pub use continue_cmd::handle_continue;
pub use echo_cmd::handle_echo;
pub use eval_cmd::handle_eval;
pub use exec_cmd::handle_exec;
pub use exit_cmd::handle_exit;
pub use export_cmd::handle_export;
pub use getopts_cmd::handle_getopts;
pub use local_cmd::handle_local;
pub use printf_cmd::handle_printf;
pub use pwd_cmd::handle_pwd;
pub use read_cmd::handle_read;
pub use readonly_cmd::handle_readonly;
pub use return_cmd::handle_return;
pub use set_cmd::handle_set;
pub use shift_cmd::handle_shift;
pub use source_cmd::handle_source;
pub use test_cmd::{handle_bracket, handle_test};
pub use times_cmd::handle_times;
pub use trap_cmd::handle_trap;
pub use true_cmd::{handle_false, handle_true};
pub use type_cmd::handle_type;
pub use umask_cmd::handle_umask;
pub use unalias_cmd::handle_unalias;
pub use unset_cmd::handle_unset;
pub use wait_cmd::handle_wait;

use crate::interpreter::errors::InterpreterError;
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::helpers::shell_constants::is_posix_special_builtin;
use crate::interpreter::redirections::RedirectionGuard;
use crate::interpreter::types::InterpreterState;

/// Every command the shell implements itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Colon,
    True,
    False,
    Echo,
    Printf,
    Test,
    Bracket,
    Cd,
    Pwd,
    Export,
    Readonly,
    Unset,
    Local,
    Set,
    Shift,
    Read,
    Exit,
    Return,
    Break,
    Continue,
    Alias,
    Unalias,
    Getopts,
    Eval,
    Source,
    Command,
    Type,
    Wait,
    Exec,
    Trap,
    Umask,
    Times,
}

/// (name, builtin) pairs; `.` is the only spelling of `source`
const BUILTIN_NAMES: &[(&str, Builtin)] = &[
    (":", Builtin::Colon),
    ("true", Builtin::True),
    ("false", Builtin::False),
    ("echo", Builtin::Echo),
    ("printf", Builtin::Printf),
    ("test", Builtin::Test),
    ("[", Builtin::Bracket),
    ("cd", Builtin::Cd),
    ("pwd", Builtin::Pwd),
    ("export", Builtin::Export),
    ("readonly", Builtin::Readonly),
    ("unset", Builtin::Unset),
    ("local", Builtin::Local),
    ("set", Builtin::Set),
    ("shift", Builtin::Shift),
    ("read", Builtin::Read),
    ("exit", Builtin::Exit),
    ("return", Builtin::Return),
    ("break", Builtin::Break),
    ("continue", Builtin::Continue),
    ("alias", Builtin::Alias),
    ("unalias", Builtin::Unalias),
    ("getopts", Builtin::Getopts),
    ("eval", Builtin::Eval),
    (".", Builtin::Source),
    ("command", Builtin::Command),
    ("type", Builtin::Type),
    ("wait", Builtin::Wait),
    ("exec", Builtin::Exec),
    ("trap", Builtin::Trap),
    ("umask", Builtin::Umask),
    ("times", Builtin::Times),
];

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        BUILTIN_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, b)| *b)
    }

    pub fn name(&self) -> &'static str {
        BUILTIN_NAMES
            .iter()
            .find(|(_, b)| b == self)
            .map(|(n, _)| *n)
            .unwrap_or("builtin")
    }

    /// POSIX special builtins: prefix assignments before them persist
    pub fn is_special(&self) -> bool {
        is_posix_special_builtin(self.name())
    }
}

impl<'a> ExecutionEngine<'a> {
    /// Run a builtin with its arguments. `guard` holds the command's
    /// redirections so `exec` can make them permanent.
    pub fn run_builtin(
        &self,
        state: &mut InterpreterState,
        builtin: Builtin,
        args: &[String],
        guard: &mut RedirectionGuard,
    ) -> Result<BuiltinResult, InterpreterError> {
        match builtin {
            Builtin::Colon | Builtin::True => Ok(handle_true()),
            Builtin::False => Ok(handle_false()),
            Builtin::Echo => Ok(handle_echo(args)),
            Builtin::Printf => Ok(handle_printf(args)),
            Builtin::Test => Ok(handle_test(args)),
            Builtin::Bracket => Ok(handle_bracket(args)),
            Builtin::Cd => handle_cd(state, args),
            Builtin::Pwd => Ok(handle_pwd(state, args)),
            Builtin::Export => handle_export(state, args),
            Builtin::Readonly => handle_readonly(state, args),
            Builtin::Unset => Ok(handle_unset(state, args)),
            Builtin::Local => handle_local(state, args),
            Builtin::Set => Ok(handle_set(state, args)),
            Builtin::Shift => Ok(handle_shift(state, args)),
            Builtin::Read => handle_read(state, args),
            Builtin::Exit => Ok(handle_exit(state, args)),
            Builtin::Return => Ok(handle_return(state, args)),
            Builtin::Break => Ok(handle_break(state, args)),
            Builtin::Continue => Ok(handle_continue(state, args)),
            Builtin::Alias => Ok(handle_alias(state, args)),
            Builtin::Unalias => Ok(handle_unalias(state, args)),
            Builtin::Getopts => handle_getopts(state, args),
            Builtin::Eval => handle_eval(self, state, args),
            Builtin::Source => handle_source(self, state, args),
            Builtin::Command => handle_command(self, state, args, guard),
            Builtin::Type => Ok(handle_type(self, state, args)),
            Builtin::Wait => handle_wait(state, args),
            Builtin::Exec => handle_exec(self, state, args, guard),
            Builtin::Trap => Ok(handle_trap(state, args)),
            Builtin::Umask => Ok(handle_umask(args)),
            Builtin::Times => Ok(handle_times()),
        }
    }
}
