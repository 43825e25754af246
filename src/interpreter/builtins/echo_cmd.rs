//! echo - Write arguments to standard output
//!
//! echo [-n] [arg...]
//!
//! Arguments are joined with single spaces and followed by a newline
//! unless the first argument is exactly `-n`. Backslash sequences are
//! written as-is.

use crate::interpreter::helpers::result::BuiltinResult;

pub fn handle_echo(args: &[String]) -> BuiltinResult {
    let (newline, words) = match args.first() {
        Some(first) if first == "-n" => (false, &args[1..]),
        _ => (true, args),
    };

    let mut output = words.join(" ");
    if newline {
        output.push('\n');
    }
    BuiltinResult::success(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_echo_joins_with_spaces() {
        assert_eq!(handle_echo(&args(&["a", "b c"])).stdout, "a b c\n");
        assert_eq!(handle_echo(&[]).stdout, "\n");
    }

    #[test]
    fn test_echo_suppresses_newline() {
        assert_eq!(handle_echo(&args(&["-n", "x"])).stdout, "x");
        assert_eq!(handle_echo(&args(&["-e", "a\\nb"])).stdout, "-e a\\nb\n");
    }
}
