//! Pattern Matching
//!
//! Converts shell patterns to regex equivalents for `case` items and the
//! `${var%pattern}` family. A backslash makes the next character literal;
//! the expander escapes quoted text this way before calling in here.
//!
//! An unclosed bracket (`[abc`) is treated as a literal `[`.

use regex_lite::Regex;
use std::collections::HashMap;

lazy_static::lazy_static! {
    /// Valid POSIX character class names
    static ref POSIX_CLASSES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("alnum", "a-zA-Z0-9");
        m.insert("alpha", "a-zA-Z");
        m.insert("blank", " \\t");
        m.insert("cntrl", "\\x00-\\x1F\\x7F");
        m.insert("digit", "0-9");
        m.insert("graph", "!-~");
        m.insert("lower", "a-z");
        m.insert("print", " -~");
        m.insert("punct", "!-/:-@\\[-`{-~");
        m.insert("space", " \\t\\n\\r\\x0C\\x0B");
        m.insert("upper", "A-Z");
        m.insert("xdigit", "0-9A-Fa-f");
        m
    };
}

/// Escape pattern metacharacters so `text` matches only itself
pub fn escape_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn push_class_char(out: &mut String, c: char) {
    if matches!(c, '\\' | '[' | ']' | '^' | '-' | '&' | '~') {
        out.push('\\');
    }
    out.push(c);
}

/// Translate `[...]` starting at `start` (the `[`). Returns the regex class
/// and the index after the closing `]`, or None when unclosed.
fn convert_bracket(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start + 1;
    let mut class = String::from("[");

    if i < chars.len() && (chars[i] == '!' || chars[i] == '^') {
        class.push('^');
        i += 1;
    }

    let mut first = true;
    while i < chars.len() {
        let c = chars[i];
        if c == ']' && !first {
            class.push(']');
            return Some((class, i + 1));
        }
        first = false;

        if c == '[' && chars.get(i + 1) == Some(&':') {
            let rest: String = chars[i + 2..].iter().collect();
            if let Some(end) = rest.find(":]") {
                let name = &rest[..end];
                if let Some(range) = POSIX_CLASSES.get(name) {
                    class.push_str(range);
                    i += 2 + name.chars().count() + 2;
                    continue;
                }
            }
        }

        if c == '\\' && i + 1 < chars.len() {
            push_class_char(&mut class, chars[i + 1]);
            i += 2;
            continue;
        }

        // Range: a-z (a trailing '-' is literal)
        if chars.get(i + 1) == Some(&'-') && chars.get(i + 2).is_some_and(|n| *n != ']') {
            push_class_char(&mut class, c);
            class.push('-');
            push_class_char(&mut class, chars[i + 2]);
            i += 3;
            continue;
        }

        push_class_char(&mut class, c);
        i += 1;
    }
    None
}

/// Convert a shell pattern to an anchored regex string.
pub fn pattern_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut regex = String::from("(?s)^");
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                match chars.get(i + 1) {
                    Some(next) => regex.push_str(&regex_lite::escape(&next.to_string())),
                    None => regex.push_str("\\\\"),
                }
                i += 2;
            }
            '*' => {
                regex.push_str(".*");
                i += 1;
            }
            '?' => {
                regex.push('.');
                i += 1;
            }
            '[' => match convert_bracket(&chars, i) {
                Some((class, next)) => {
                    regex.push_str(&class);
                    i = next;
                }
                None => {
                    regex.push_str("\\[");
                    i += 1;
                }
            },
            _ => {
                regex.push_str(&regex_lite::escape(&c.to_string()));
                i += 1;
            }
        }
    }

    regex.push('$');
    regex
}

/// Remove backslash escapes, for patterns that fail to compile
fn unescape_pattern(pattern: &str) -> String {
    let mut out = String::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Compile a pattern once for repeated matching
pub fn compile_pattern(pattern: &str) -> Option<Regex> {
    Regex::new(&pattern_to_regex(pattern)).ok()
}

/// Whole-string match of `text` against a shell pattern
pub fn matches_pattern(pattern: &str, text: &str) -> bool {
    match compile_pattern(pattern) {
        Some(re) => re.is_match(text),
        None => unescape_pattern(pattern) == text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcards() {
        assert!(matches_pattern("*", ""));
        assert!(matches_pattern("h*o", "hello"));
        assert!(matches_pattern("h?llo", "hello"));
        assert!(!matches_pattern("h?llo", "hllo"));
        assert!(matches_pattern("*.txt", "a.b.txt"));
        assert!(matches_pattern("a*", "a\nb"));
    }

    #[test]
    fn test_brackets() {
        assert!(matches_pattern("[abc]x", "bx"));
        assert!(!matches_pattern("[!abc]x", "bx"));
        assert!(matches_pattern("[a-c]", "b"));
        assert!(matches_pattern("[]]", "]"));
        assert!(matches_pattern("[a-]", "-"));
        assert!(matches_pattern("[[:digit:]]*", "7up"));
        assert!(matches_pattern("a[b", "a[b"));
    }

    #[test]
    fn test_escapes_make_characters_literal() {
        assert!(matches_pattern("\\*", "*"));
        assert!(!matches_pattern("\\*", "x"));
        assert!(matches_pattern(&escape_pattern("a?b"), "a?b"));
        assert!(!matches_pattern(&escape_pattern("a?b"), "axb"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches_pattern("a.c", "a.c"));
        assert!(!matches_pattern("a.c", "abc"));
        assert!(matches_pattern("(x)|+", "(x)|+"));
    }
}
