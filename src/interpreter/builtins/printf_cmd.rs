//! printf - Formatted output
//!
//! printf format [argument...]
//!
//! Conversions: %s %b %c %d %i %u %o %x %X %%, with the flags `-+ 0#`,
//! a field width and a precision, either of which may be `*` (taken from
//! the next argument). The format is reused while arguments remain.
//! Missing arguments read as "" or 0. An argument that is not a valid
//! number is reported and makes the status 1.

use crate::interpreter::helpers::bytes::raw_byte_char;
use crate::interpreter::helpers::result::BuiltinResult;

/// A parsed `%` conversion
#[derive(Debug, Default, Clone)]
struct Conversion {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alternate: bool,
    width: Option<usize>,
    precision: Option<usize>,
    kind: char,
}

/// Output plus the state carried across conversions
struct Formatter<'a> {
    args: &'a [String],
    next_arg: usize,
    output: String,
    stderr: String,
    failed: bool,
    /// `\c` inside a %b argument: stop all output
    stopped: bool,
}

/// Value of up to `max` octal digits starting at `chars[i]`
fn octal_value(chars: &[char], i: &mut usize, max: usize) -> u32 {
    let mut value = 0;
    let mut taken = 0;
    while taken < max && *i < chars.len() && ('0'..='7').contains(&chars[*i]) {
        value = value * 8 + chars[*i].to_digit(8).unwrap_or(0);
        *i += 1;
        taken += 1;
    }
    value
}

fn byte_char(value: u32) -> char {
    raw_byte_char((value & 0xff) as u8)
}

/// Character for a simple one-letter escape
fn simple_escape(c: char) -> Option<char> {
    Some(match c {
        '\\' => '\\',
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\x0b',
        _ => return None,
    })
}

/// Interpret a %b argument. Returns the text and whether `\c` was seen.
fn expand_b_escapes(arg: &str) -> (String, bool) {
    let chars: Vec<char> = arg.chars().collect();
    let mut result = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' || i + 1 >= chars.len() {
            result.push(chars[i]);
            i += 1;
            continue;
        }
        let c = chars[i + 1];
        i += 2;
        if c == 'c' {
            return (result, true);
        }
        if let Some(e) = simple_escape(c) {
            result.push(e);
        } else if c == '0' {
            result.push(byte_char(octal_value(&chars, &mut i, 3)));
        } else if ('1'..='7').contains(&c) {
            i -= 1;
            result.push(byte_char(octal_value(&chars, &mut i, 3)));
        } else {
            result.push('\\');
            result.push(c);
        }
    }
    (result, false)
}

/// Parse a numeric argument the way C's strtol does with base 0, plus the
/// `'c` / `"c` character-code form.
fn parse_number(arg: &str) -> Result<i64, i64> {
    let arg = arg.trim_start();
    if arg.is_empty() {
        return Ok(0);
    }
    if let Some(rest) = arg.strip_prefix('\'').or_else(|| arg.strip_prefix('"')) {
        return Ok(rest.chars().next().map(|c| c as i64).unwrap_or(0));
    }

    let (negative, unsigned) = match arg.as_bytes()[0] {
        b'-' => (true, &arg[1..]),
        b'+' => (false, &arg[1..]),
        _ => (false, arg),
    };
    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (16, hex)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, &unsigned[1..])
    } else {
        (10, unsigned)
    };

    let valid_len = digits
        .char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    let magnitude = if valid_len == 0 {
        0
    } else {
        match i64::from_str_radix(&digits[..valid_len], radix) {
            Ok(v) => v,
            Err(_) => i64::MAX,
        }
    };
    let value = if negative { magnitude.wrapping_neg() } else { magnitude };

    let nothing_parsed = valid_len == 0 && radix != 8;
    if valid_len < digits.len() || nothing_parsed {
        Err(value)
    } else {
        Ok(value)
    }
}

/// Pad `body` (with an optional sign/prefix kept in front of zeros)
fn pad(conversion: &Conversion, prefix: &str, body: &str, zero_allowed: bool) -> String {
    let len = prefix.chars().count() + body.chars().count();
    let width = conversion.width.unwrap_or(0);
    if len >= width {
        return format!("{}{}", prefix, body);
    }
    let fill = width - len;
    if conversion.left {
        format!("{}{}{}", prefix, body, " ".repeat(fill))
    } else if conversion.zero && zero_allowed {
        format!("{}{}{}", prefix, "0".repeat(fill), body)
    } else {
        format!("{}{}{}", " ".repeat(fill), prefix, body)
    }
}

fn format_integer(conversion: &Conversion, value: i64) -> String {
    let (prefix, mut digits) = match conversion.kind {
        'd' | 'i' => {
            let sign = if value < 0 {
                "-"
            } else if conversion.plus {
                "+"
            } else if conversion.space {
                " "
            } else {
                ""
            };
            (sign.to_string(), value.unsigned_abs().to_string())
        }
        'u' => (String::new(), (value as u64).to_string()),
        'o' => (String::new(), format!("{:o}", value as u64)),
        'x' => {
            let prefix = if conversion.alternate && value != 0 { "0x" } else { "" };
            (prefix.to_string(), format!("{:x}", value as u64))
        }
        _ => {
            let prefix = if conversion.alternate && value != 0 { "0X" } else { "" };
            (prefix.to_string(), format!("{:X}", value as u64))
        }
    };

    if let Some(precision) = conversion.precision {
        if precision == 0 && value == 0 {
            digits.clear();
        }
        if digits.len() < precision {
            digits = format!("{}{}", "0".repeat(precision - digits.len()), digits);
        }
    }
    if conversion.kind == 'o' && conversion.alternate && !digits.starts_with('0') {
        digits.insert(0, '0');
    }
    pad(conversion, &prefix, &digits, conversion.precision.is_none())
}

impl<'a> Formatter<'a> {
    fn new(args: &'a [String]) -> Self {
        Self {
            args,
            next_arg: 0,
            output: String::new(),
            stderr: String::new(),
            failed: false,
            stopped: false,
        }
    }

    fn take_arg(&mut self) -> Option<&'a str> {
        let arg = self.args.get(self.next_arg).map(String::as_str);
        if arg.is_some() {
            self.next_arg += 1;
        }
        arg
    }

    fn take_number(&mut self) -> i64 {
        let Some(arg) = self.take_arg() else {
            return 0;
        };
        match parse_number(arg) {
            Ok(value) => value,
            Err(partial) => {
                self.stderr.push_str(&format!("posish: printf: {}: invalid number\n", arg));
                self.failed = true;
                partial
            }
        }
    }

    /// A width or precision: digits or `*`
    fn take_count(&mut self, chars: &[char], i: &mut usize) -> Option<i64> {
        if chars.get(*i) == Some(&'*') {
            *i += 1;
            return Some(self.take_number());
        }
        let start = *i;
        while *i < chars.len() && chars[*i].is_ascii_digit() {
            *i += 1;
        }
        if *i == start {
            return None;
        }
        chars[start..*i].iter().collect::<String>().parse().ok()
    }

    /// Parse and apply one conversion starting after the `%`
    fn conversion(&mut self, chars: &[char], i: &mut usize) {
        let start = *i - 1;
        let mut conversion = Conversion::default();
        while let Some(&c) = chars.get(*i) {
            match c {
                '-' => conversion.left = true,
                '+' => conversion.plus = true,
                ' ' => conversion.space = true,
                '0' => conversion.zero = true,
                '#' => conversion.alternate = true,
                _ => break,
            }
            *i += 1;
        }
        if let Some(width) = self.take_count(chars, i) {
            if width < 0 {
                conversion.left = true;
            }
            conversion.width = Some(width.unsigned_abs() as usize);
        }
        if chars.get(*i) == Some(&'.') {
            *i += 1;
            let precision = self.take_count(chars, i).unwrap_or(0);
            conversion.precision = (precision >= 0).then_some(precision as usize);
        }

        let Some(&kind) = chars.get(*i) else {
            self.output.extend(&chars[start..]);
            return;
        };
        *i += 1;
        conversion.kind = kind;

        match kind {
            's' => {
                let arg = self.take_arg().unwrap_or("");
                let text: String = match conversion.precision {
                    Some(p) => arg.chars().take(p).collect(),
                    None => arg.to_string(),
                };
                self.output.push_str(&pad(&conversion, "", &text, false));
            }
            'b' => {
                let (text, stop) = expand_b_escapes(self.take_arg().unwrap_or(""));
                let text: String = match conversion.precision {
                    Some(p) => text.chars().take(p).collect(),
                    None => text,
                };
                self.output.push_str(&pad(&conversion, "", &text, false));
                self.stopped = stop;
            }
            'c' => {
                let text: String = self.take_arg().and_then(|a| a.chars().next()).into_iter().collect();
                self.output.push_str(&pad(&conversion, "", &text, false));
            }
            'd' | 'i' | 'u' | 'o' | 'x' | 'X' => {
                let value = self.take_number();
                self.output.push_str(&format_integer(&conversion, value));
            }
            '%' => self.output.push('%'),
            _ => {
                self.stderr.push_str(&format!("posish: printf: %{}: invalid directive\n", kind));
                self.failed = true;
                self.output.extend(&chars[start..*i]);
            }
        }
    }

    /// One pass over the format. Returns true if any argument was used.
    fn run_format(&mut self, chars: &[char]) -> bool {
        let before = self.next_arg;
        let mut i = 0;
        while i < chars.len() && !self.stopped {
            match chars[i] {
                '\\' if i + 1 < chars.len() => {
                    let c = chars[i + 1];
                    i += 2;
                    if let Some(e) = simple_escape(c) {
                        self.output.push(e);
                    } else if ('0'..='7').contains(&c) {
                        i -= 1;
                        self.output.push(byte_char(octal_value(chars, &mut i, 3)));
                    } else {
                        self.output.push('\\');
                        self.output.push(c);
                    }
                }
                '%' => {
                    i += 1;
                    self.conversion(chars, &mut i);
                }
                c => {
                    self.output.push(c);
                    i += 1;
                }
            }
        }
        self.next_arg > before
    }
}

pub fn handle_printf(args: &[String]) -> BuiltinResult {
    let args = match args.first() {
        Some(first) if first == "--" => &args[1..],
        _ => args,
    };
    let Some(format) = args.first() else {
        return BuiltinResult::failure("posish: printf: usage: printf format [arguments]\n", 2);
    };

    let chars: Vec<char> = format.chars().collect();
    let mut formatter = Formatter::new(&args[1..]);
    loop {
        let consumed = formatter.run_format(&chars);
        if formatter.stopped || !consumed || formatter.next_arg >= formatter.args.len() {
            break;
        }
    }

    BuiltinResult {
        stdout: formatter.output,
        stderr: formatter.stderr,
        exit_code: if formatter.failed { 1 } else { 0 },
        flow: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printf(items: &[&str]) -> BuiltinResult {
        let args: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        handle_printf(&args)
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(printf(&["Hello %s\\n", "world"]).stdout, "Hello world\n");
        assert_eq!(printf(&["[%5s|%-5s]", "ab", "cd"]).stdout, "[   ab|cd   ]");
        assert_eq!(printf(&["%.2s", "abcdef"]).stdout, "ab");
        assert_eq!(printf(&["\\101\\t\\102"]).stdout, "A\tB");
        assert_eq!(printf(&["100%%"]).stdout, "100%");
    }

    #[test]
    fn test_integers() {
        assert_eq!(printf(&["%d %i", "42", "-7"]).stdout, "42 -7");
        assert_eq!(printf(&["%05d|%-4d|%+d", "42", "3", "5"]).stdout, "00042|3   |+5");
        assert_eq!(printf(&["%x %X %o %#x %#o", "255", "255", "8", "255", "8"]).stdout, "ff FF 10 0xff 010");
        assert_eq!(printf(&["%.3d", "7"]).stdout, "007");
        assert_eq!(printf(&["%u", "-1"]).stdout, "18446744073709551615");
        assert_eq!(printf(&["%d %d", "0x10", "010"]).stdout, "16 8");
        assert_eq!(printf(&["%d", "'A"]).stdout, "65");
    }

    #[test]
    fn test_star_width() {
        assert_eq!(printf(&["%*d|", "4", "7"]).stdout, "   7|");
        assert_eq!(printf(&["%-*s|", "3", "a"]).stdout, "a  |");
        assert_eq!(printf(&["%.*s", "1", "xyz"]).stdout, "x");
    }

    #[test]
    fn test_format_reuse_and_missing_arguments() {
        assert_eq!(printf(&["%s-", "a", "b", "c"]).stdout, "a-b-c-");
        assert_eq!(printf(&["%s=%d\\n", "x", "1", "y"]).stdout, "x=1\ny=0\n");
        assert_eq!(printf(&["plain\\n", "ignored"]).stdout, "plain\n");
    }

    #[test]
    fn test_b_and_c() {
        assert_eq!(printf(&["%b", "a\\tb"]).stdout, "a\tb");
        assert_eq!(printf(&["%b|%s", "stop\\chere", "x"]).stdout, "stop");
        assert_eq!(printf(&["%c%c", "hello", "w"]).stdout, "hw");
    }

    #[test]
    fn test_invalid_number() {
        let result = printf(&["%d", "12abc"]);
        assert_eq!(result.stdout, "12");
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "posish: printf: 12abc: invalid number\n");

        let result = printf(&["%d", "abc"]);
        assert_eq!(result.stdout, "0");
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn test_octal_escapes_emit_raw_bytes() {
        use crate::interpreter::helpers::bytes::encode_text;
        assert_eq!(encode_text(&printf(&["\\377"]).stdout), vec![0xFF]);
        assert_eq!(encode_text(&printf(&["%b", "a\\0200"]).stdout), vec![b'a', 0x80]);
    }

    #[test]
    fn test_missing_format() {
        assert_eq!(printf(&[]).exit_code, 2);
    }
}
