//! Shell option table.
//!
//! Maps the single-letter flags and long names accepted by `set` onto
//! [`ShellOptions`] fields, and renders `$-` and the `set -o` listings.

use crate::interpreter::types::ShellOptions;

type Getter = fn(&ShellOptions) -> bool;
type Setter = fn(&mut ShellOptions, bool);

/// (flag letter, long name, getter, setter), in `$-` order
const SHELL_OPTIONS: &[(char, &str, Getter, Setter)] = &[
    ('a', "allexport", |o| o.allexport, |o, v| o.allexport = v),
    ('C', "noclobber", |o| o.noclobber, |o, v| o.noclobber = v),
    ('e', "errexit", |o| o.errexit, |o, v| o.errexit = v),
    ('f', "noglob", |o| o.noglob, |o, v| o.noglob = v),
    ('n', "noexec", |o| o.noexec, |o, v| o.noexec = v),
    ('u', "nounset", |o| o.nounset, |o, v| o.nounset = v),
    ('v', "verbose", |o| o.verbose, |o, v| o.verbose = v),
    ('x', "xtrace", |o| o.xtrace, |o, v| o.xtrace = v),
];

/// Set a flag by letter; false when the letter is unknown
pub fn set_option_flag(options: &mut ShellOptions, flag: char, enable: bool) -> bool {
    match SHELL_OPTIONS.iter().find(|(c, ..)| *c == flag) {
        Some((_, _, _, setter)) => {
            setter(options, enable);
            true
        }
        None => false,
    }
}

/// Set an option by its long name; false when the name is unknown
pub fn set_option_name(options: &mut ShellOptions, name: &str, enable: bool) -> bool {
    match SHELL_OPTIONS.iter().find(|(_, n, ..)| *n == name) {
        Some((_, _, _, setter)) => {
            setter(options, enable);
            true
        }
        None => false,
    }
}

/// Value of `$-`
pub fn option_flags(options: &ShellOptions) -> String {
    SHELL_OPTIONS
        .iter()
        .filter(|(_, _, getter, _)| getter(options))
        .map(|(c, ..)| *c)
        .collect()
}

/// `set -o` output: one `name<TAB>on|off` line per option
pub fn list_options(options: &ShellOptions) -> String {
    let mut names: Vec<(&str, bool)> = SHELL_OPTIONS
        .iter()
        .map(|(_, name, getter, _)| (*name, getter(options)))
        .collect();
    names.sort_by(|a, b| a.0.cmp(b.0));
    names
        .into_iter()
        .map(|(name, on)| format!("{}\t{}\n", name, if on { "on" } else { "off" }))
        .collect()
}

/// `set +o` output: commands that recreate the current settings
pub fn list_options_as_commands(options: &ShellOptions) -> String {
    let mut names: Vec<(&str, bool)> = SHELL_OPTIONS
        .iter()
        .map(|(_, name, getter, _)| (*name, getter(options)))
        .collect();
    names.sort_by(|a, b| a.0.cmp(b.0));
    names
        .into_iter()
        .map(|(name, on)| format!("set {}o {}\n", if on { '-' } else { '+' }, name))
        .collect()
}
