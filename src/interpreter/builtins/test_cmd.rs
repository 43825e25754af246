//! test / [ - Evaluate conditional expressions
//!
//! Follows the POSIX rules for zero to four arguments, and a recursive
//! grammar (`!`, `-a`, `-o`, parentheses) beyond that:
//!
//! - strings: `-n s`, `-z s`, `s1 = s2`, `s1 != s2`, `s1 < s2`, `s1 > s2`
//! - integers: `-eq -ne -lt -le -gt -ge`
//! - files: `-e -f -d -r -w -x -s -L -h -p -S -b -c`, and `-t fd`
//!
//! Status 0 for true, 1 for false, 2 for a malformed expression.

use crate::interpreter::helpers::result::{test_result, BuiltinResult};
use std::ffi::CString;
use std::fs;
use std::os::unix::fs::FileTypeExt;

type TestResult = Result<bool, String>;

fn is_unary_operator(op: &str) -> bool {
    matches!(
        op,
        "-n" | "-z" | "-e" | "-f" | "-d" | "-r" | "-w" | "-x" | "-s" | "-L" | "-h" | "-p" | "-S" | "-b"
            | "-c" | "-t"
    )
}

fn is_binary_operator(op: &str) -> bool {
    matches!(
        op,
        "=" | "==" | "!=" | "<" | ">" | "-eq" | "-ne" | "-lt" | "-le" | "-gt" | "-ge" | "-a" | "-o"
    )
}

/// access(2) check for -r, -w and -x
fn has_access(path: &str, mode: libc::c_int) -> bool {
    let Ok(path) = CString::new(path) else {
        return false;
    };
    // SAFETY: path is a valid NUL-terminated string
    unsafe { libc::access(path.as_ptr(), mode) == 0 }
}

fn parse_integer(text: &str) -> Result<i64, String> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| format!("{}: bad number", text))
}

fn unary_test(op: &str, operand: &str) -> TestResult {
    let metadata = || fs::metadata(operand).ok();
    Ok(match op {
        "-n" => !operand.is_empty(),
        "-z" => operand.is_empty(),
        "-e" => metadata().is_some(),
        "-f" => metadata().is_some_and(|m| m.is_file()),
        "-d" => metadata().is_some_and(|m| m.is_dir()),
        "-s" => metadata().is_some_and(|m| m.len() > 0),
        "-p" => metadata().is_some_and(|m| m.file_type().is_fifo()),
        "-S" => metadata().is_some_and(|m| m.file_type().is_socket()),
        "-b" => metadata().is_some_and(|m| m.file_type().is_block_device()),
        "-c" => metadata().is_some_and(|m| m.file_type().is_char_device()),
        "-L" | "-h" => fs::symlink_metadata(operand).is_ok_and(|m| m.file_type().is_symlink()),
        "-r" => has_access(operand, libc::R_OK),
        "-w" => has_access(operand, libc::W_OK),
        "-x" => has_access(operand, libc::X_OK),
        "-t" => {
            let fd = parse_integer(operand)?;
            let Ok(fd) = libc::c_int::try_from(fd) else {
                return Ok(false);
            };
            // SAFETY: isatty only inspects the descriptor
            unsafe { libc::isatty(fd) == 1 }
        }
        _ => return Err(format!("{}: unary operator expected", op)),
    })
}

fn binary_test(left: &str, op: &str, right: &str) -> TestResult {
    Ok(match op {
        "=" | "==" => left == right,
        "!=" => left != right,
        "<" => left < right,
        ">" => left > right,
        "-a" => !left.is_empty() && !right.is_empty(),
        "-o" => !left.is_empty() || !right.is_empty(),
        _ => {
            let (l, r) = (parse_integer(left)?, parse_integer(right)?);
            match op {
                "-eq" => l == r,
                "-ne" => l != r,
                "-lt" => l < r,
                "-le" => l <= r,
                "-gt" => l > r,
                "-ge" => l >= r,
                _ => return Err(format!("{}: binary operator expected", op)),
            }
        }
    })
}

/// POSIX evaluation by argument count, falling back to the grammar
fn evaluate(args: &[&str]) -> TestResult {
    match args {
        [] => Ok(false),
        [one] => Ok(!one.is_empty()),
        ["!", operand] => Ok(operand.is_empty()),
        [op, operand] if is_unary_operator(op) => unary_test(op, operand),
        [op, _] => Err(format!("{}: unary operator expected", op)),
        [left, op, right] if is_binary_operator(op) => binary_test(left, op, right),
        ["!", rest @ ..] if args.len() <= 4 => evaluate(rest).map(|b| !b),
        ["(", inner, ")"] => Ok(!inner.is_empty()),
        ["(", inner @ .., ")"] if args.len() == 4 => evaluate(inner),
        _ => {
            let mut parser = ExpressionParser { args, pos: 0 };
            let result = parser.or_expression()?;
            match parser.peek() {
                None => Ok(result),
                Some(extra) => Err(format!("{}: unexpected operator", extra)),
            }
        }
    }
}

/// Recursive grammar for long expressions
struct ExpressionParser<'a> {
    args: &'a [&'a str],
    pos: usize,
}

impl<'a> ExpressionParser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.args.get(self.pos).copied()
    }

    fn next(&mut self) -> Result<&'a str, String> {
        let token = self.peek().ok_or_else(|| "argument expected".to_string())?;
        self.pos += 1;
        Ok(token)
    }

    fn or_expression(&mut self) -> TestResult {
        let mut result = self.and_expression()?;
        while self.peek() == Some("-o") {
            self.pos += 1;
            let right = self.and_expression()?;
            result = result || right;
        }
        Ok(result)
    }

    fn and_expression(&mut self) -> TestResult {
        let mut result = self.not_expression()?;
        while self.peek() == Some("-a") {
            self.pos += 1;
            let right = self.not_expression()?;
            result = result && right;
        }
        Ok(result)
    }

    fn not_expression(&mut self) -> TestResult {
        if self.peek() == Some("!") {
            self.pos += 1;
            return self.not_expression().map(|b| !b);
        }
        self.primary()
    }

    fn primary(&mut self) -> TestResult {
        let token = self.next()?;
        if token == "(" {
            let result = self.or_expression()?;
            return match self.next() {
                Ok(")") => Ok(result),
                _ => Err("')' expected".to_string()),
            };
        }
        if is_unary_operator(token) && self.pos < self.args.len() {
            let operand = self.next()?;
            return unary_test(token, operand);
        }
        match self.peek() {
            Some(op) if is_binary_operator(op) && op != "-a" && op != "-o" => {
                self.pos += 1;
                let right = self.next()?;
                binary_test(token, op, right)
            }
            _ => Ok(!token.is_empty()),
        }
    }
}

fn run_test(name: &str, args: &[String]) -> BuiltinResult {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match evaluate(&args) {
        Ok(passed) => test_result(passed),
        Err(message) => BuiltinResult::failure(format!("posish: {}: {}\n", name, message), 2),
    }
}

pub fn handle_test(args: &[String]) -> BuiltinResult {
    run_test("test", args)
}

/// `[ expr ]`: the last argument must be `]`
pub fn handle_bracket(args: &[String]) -> BuiltinResult {
    match args.split_last() {
        Some((last, rest)) if last == "]" => run_test("[", rest),
        _ => BuiltinResult::failure("posish: [: missing ]\n", 2),
    }
}
