//! getopts - Parse positional parameters as options
//!
//! getopts optstring name [arg...]
//!
//! Parses options from positional parameters (or provided args).
//! - optstring: string of valid option characters
//! - If a character is followed by ':', it requires an argument
//! - If optstring starts with ':', silent error reporting mode
//! - name: variable to store the current option
//! - OPTARG: set to the option argument (if any)
//! - OPTIND: index of next argument to process (starts at 1)
//!
//! Returns 0 if an option was found, 1 at the end of the options.

use crate::interpreter::errors::InterpreterError;
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::types::InterpreterState;
use crate::parser::lexer::is_valid_name;

/// Where the next call resumes, and what this call reports
struct Outcome {
    optind: usize,
    char_index: usize,
    option: String,
    optarg: Option<String>,
    stderr: String,
    status: i32,
}

impl Outcome {
    fn end(optind: usize) -> Self {
        Self {
            optind,
            char_index: 0,
            option: "?".to_string(),
            optarg: None,
            stderr: String::new(),
            status: 1,
        }
    }
}

fn scan(optstring: &str, params: &[String], optind: usize, char_index: usize) -> Outcome {
    let silent = optstring.starts_with(':');
    let spec = optstring.strip_prefix(':').unwrap_or(optstring);

    let Some(arg) = params.get(optind - 1) else {
        return Outcome::end(optind);
    };
    let mut index = char_index;
    if index == 0 {
        if arg == "--" {
            return Outcome::end(optind + 1);
        }
        if !arg.starts_with('-') || arg == "-" {
            return Outcome::end(optind);
        }
        index = 1;
    }

    let chars: Vec<char> = arg.chars().collect();
    let Some(&opt) = chars.get(index) else {
        return Outcome::end(optind);
    };
    index += 1;
    let at_end = index >= chars.len();
    let (next_optind, next_index) = if at_end { (optind + 1, 0) } else { (optind, index) };

    let mut outcome = Outcome {
        optind: next_optind,
        char_index: next_index,
        option: opt.to_string(),
        optarg: None,
        stderr: String::new(),
        status: 0,
    };

    let position = if opt == ':' { None } else { spec.find(opt) };
    let Some(position) = position else {
        outcome.option = "?".to_string();
        if silent {
            outcome.optarg = Some(opt.to_string());
        } else {
            outcome.stderr = format!("posish: getopts: illegal option -- {}\n", opt);
        }
        return outcome;
    };

    let requires_argument = spec[position + opt.len_utf8()..].starts_with(':');
    if !requires_argument {
        return outcome;
    }

    outcome.char_index = 0;
    if !at_end {
        outcome.optarg = Some(chars[index..].iter().collect());
        outcome.optind = optind + 1;
    } else if let Some(value) = params.get(optind) {
        outcome.optarg = Some(value.clone());
        outcome.optind = optind + 2;
    } else if silent {
        outcome.option = ":".to_string();
        outcome.optarg = Some(opt.to_string());
        outcome.optind = optind + 1;
    } else {
        outcome.option = "?".to_string();
        outcome.stderr = format!("posish: getopts: option requires an argument -- {}\n", opt);
        outcome.optind = optind + 1;
    }
    outcome
}

/// Handle the getopts builtin command.
pub fn handle_getopts(state: &mut InterpreterState, args: &[String]) -> Result<BuiltinResult, InterpreterError> {
    if args.len() < 2 {
        return Ok(BuiltinResult::failure(
            "posish: getopts: usage: getopts optstring name [arg...]\n",
            2,
        ));
    }
    let optstring = &args[0];
    let name = &args[1];
    if !is_valid_name(name) {
        return Ok(BuiltinResult::failure(
            format!("posish: getopts: {}: bad variable name\n", name),
            2,
        ));
    }

    let params: Vec<String> = if args.len() > 2 {
        args[2..].to_vec()
    } else {
        state.vars.positional().to_vec()
    };
    let optind = state
        .var("OPTIND")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let char_index = match state.getopts_position {
        Some((at, index)) if at == optind => index,
        _ => 0,
    };

    let outcome = scan(optstring, &params, optind, char_index);

    state.getopts_position = (outcome.char_index > 0).then_some((outcome.optind, outcome.char_index));
    state.assign("OPTIND", outcome.optind.to_string())?;
    state.assign(name, outcome.option)?;
    match outcome.optarg {
        Some(value) => state.assign("OPTARG", value)?,
        None => state.vars.unset("OPTARG")?,
    }

    Ok(BuiltinResult {
        stderr: outcome.stderr,
        exit_code: outcome.status,
        ..BuiltinResult::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn next(state: &mut InterpreterState, optstring: &str) -> (i32, String, Option<String>) {
        let result = handle_getopts(state, &args(&[optstring, "opt"])).unwrap();
        (
            result.exit_code,
            state.var("opt").unwrap_or_default().to_string(),
            state.var("OPTARG").map(str::to_string),
        )
    }

    #[test]
    fn test_grouped_options_and_arguments() {
        let mut state = InterpreterState::default();
        state.vars.set_positional(args(&["-ab", "-c", "val", "-cX", "rest"]));

        assert_eq!(next(&mut state, "abc:"), (0, "a".into(), None));
        assert_eq!(next(&mut state, "abc:"), (0, "b".into(), None));
        assert_eq!(state.var("OPTIND"), Some("2"));
        assert_eq!(next(&mut state, "abc:"), (0, "c".into(), Some("val".into())));
        assert_eq!(next(&mut state, "abc:"), (0, "c".into(), Some("X".into())));
        assert_eq!(next(&mut state, "abc:"), (1, "?".into(), None));
        assert_eq!(state.var("OPTIND"), Some("5"));
    }

    #[test]
    fn test_double_dash_ends_options() {
        let mut state = InterpreterState::default();
        state.vars.set_positional(args(&["--", "-a"]));
        assert_eq!(next(&mut state, "a"), (1, "?".into(), None));
        assert_eq!(state.var("OPTIND"), Some("2"));
    }

    #[test]
    fn test_illegal_option_reporting() {
        let mut state = InterpreterState::default();
        state.vars.set_positional(args(&["-z"]));
        let result = handle_getopts(&mut state, &args(&["a", "opt"])).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stderr, "posish: getopts: illegal option -- z\n");
        assert_eq!(state.var("opt"), Some("?"));

        let mut state = InterpreterState::default();
        state.vars.set_positional(args(&["-z"]));
        let result = handle_getopts(&mut state, &args(&[":a", "opt"])).unwrap();
        assert!(result.stderr.is_empty());
        assert_eq!(state.var("OPTARG"), Some("z"));
    }

    #[test]
    fn test_missing_argument_silent_mode() {
        let mut state = InterpreterState::default();
        state.vars.set_positional(args(&["-c"]));
        assert_eq!(next(&mut state, ":c:"), (0, ":".into(), Some("c".into())));
    }

    #[test]
    fn test_explicit_arguments() {
        let mut state = InterpreterState::default();
        let result = handle_getopts(&mut state, &args(&["x", "opt", "-x"])).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(state.var("opt"), Some("x"));
    }
}
