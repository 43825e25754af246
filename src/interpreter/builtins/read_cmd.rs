//! read - Read a line from standard input into variables
//!
//! read [-r] [-p prompt] [name...]
//!
//! Reads one line from descriptor 0 a byte at a time, so nothing past the
//! newline is consumed and later commands see the rest of the input.
//! Without -r a backslash escapes the next character and a trailing
//! backslash continues the line. The line is split on IFS; the last name
//! receives the remainder. With no names the line goes to REPLY.

use crate::interpreter::errors::{os_error_text, InterpreterError};
use crate::interpreter::helpers::bytes::{decode_bytes, encode_text};
use crate::interpreter::helpers::ifs::{get_ifs, split_for_read};
use crate::interpreter::helpers::result::BuiltinResult;
use crate::interpreter::process::{read_fd, write_all_fd};
use crate::interpreter::types::InterpreterState;
use crate::parser::lexer::is_valid_name;
use std::io;
use std::os::fd::RawFd;

/// One physical line without its newline; None at end of input
fn read_physical_line(fd: RawFd) -> io::Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        if read_fd(fd, &mut byte)? == 0 {
            return Ok(if line.is_empty() { None } else { Some(line) });
        }
        if byte[0] == b'\n' {
            return Ok(Some(line));
        }
        line.push(byte[0]);
    }
}

/// Remove backslash escapes from one physical line
fn unescape(segment: &str) -> String {
    let mut result = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// A logical line, following backslash-newline continuations unless raw
pub(crate) fn read_logical_line(fd: RawFd, raw: bool) -> io::Result<Option<String>> {
    let mut line = String::new();
    let mut any = false;
    while let Some(bytes) = read_physical_line(fd)? {
        any = true;
        let segment = decode_bytes(&bytes);
        if raw {
            return Ok(Some(segment));
        }
        let trailing = segment.len() - segment.trim_end_matches('\\').len();
        if trailing % 2 == 1 {
            line.push_str(&unescape(&segment[..segment.len() - 1]));
            continue;
        }
        line.push_str(&unescape(&segment));
        return Ok(Some(line));
    }
    Ok(any.then_some(line))
}

pub fn handle_read(state: &mut InterpreterState, args: &[String]) -> Result<BuiltinResult, InterpreterError> {
    let mut raw = false;
    let mut prompt = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-r" => raw = true,
            "-p" => {
                i += 1;
                match args.get(i) {
                    Some(text) => prompt = Some(text.clone()),
                    None => return Ok(BuiltinResult::failure("posish: read: -p: option requires an argument\n", 2)),
                }
            }
            "--" => {
                i += 1;
                break;
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                return Ok(BuiltinResult::failure(format!("posish: read: {}: invalid option\n", arg), 2));
            }
            _ => break,
        }
        i += 1;
    }

    let mut names: Vec<&str> = args[i..].iter().map(String::as_str).collect();
    if names.is_empty() {
        names.push("REPLY");
    }
    if let Some(bad) = names.iter().find(|n| !is_valid_name(n)) {
        return Ok(BuiltinResult::failure(format!("posish: read: {}: bad variable name\n", bad), 2));
    }

    if let Some(prompt) = prompt {
        let _ = write_all_fd(2, &encode_text(&prompt));
    }

    let line = match read_logical_line(0, raw) {
        Ok(line) => line,
        Err(e) => {
            return Ok(BuiltinResult::failure(format!("posish: read: {}\n", os_error_text(&e)), 1));
        }
    };
    let status = if line.is_some() { 0 } else { 1 };
    let line = line.unwrap_or_default();

    let fields = split_for_read(&line, get_ifs(state), names.len());
    for (index, name) in names.iter().enumerate() {
        let value = fields.get(index).cloned().unwrap_or_default();
        state.assign(name, value)?;
    }
    Ok(BuiltinResult::status(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::process::create_pipe;
    use std::os::fd::AsRawFd;

    fn lines_from(input: &str, raw: bool) -> Vec<Option<String>> {
        let (reader, writer) = create_pipe().unwrap();
        write_all_fd(writer.as_raw_fd(), input.as_bytes()).unwrap();
        drop(writer);
        (0..3)
            .map(|_| read_logical_line(reader.as_raw_fd(), raw).unwrap())
            .collect()
    }

    #[test]
    fn test_reads_one_line_at_a_time() {
        assert_eq!(
            lines_from("first\nsecond", false),
            vec![Some("first".into()), Some("second".into()), None]
        );
    }

    #[test]
    fn test_backslash_continuation() {
        assert_eq!(lines_from("a\\\nb\n", false)[0], Some("ab".into()));
        assert_eq!(lines_from("a\\\nb\n", true)[0], Some("a\\".into()));
        assert_eq!(lines_from("x\\ty\\\\\n", false)[0], Some("xty\\".into()));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\ b\\c"), r"a b\c");
    }

    #[test]
    fn test_bad_name() {
        let mut state = InterpreterState::default();
        let result = handle_read(&mut state, &["1x".to_string()]).unwrap();
        assert_eq!(result.exit_code, 2);
    }
}
