//! Shell value quoting utilities
//!
//! Quotes values so the output of `set`, `export -p`, `readonly -p` and
//! `alias` can be fed back to the shell.

/// Characters that never need quoting
fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '/' | '.' | ':' | '-' | '@' | '%' | '+' | ',' | '=')
}

/// Always wrap in single quotes, escaping embedded single quotes as '\''
pub fn single_quote(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    result.push('\'');
    for c in value.chars() {
        if c == '\'' {
            result.push_str("'\\''");
        } else {
            result.push(c);
        }
    }
    result.push('\'');
    result
}

/// Quote only when the value would not survive re-parsing as one word
pub fn quote_if_needed(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_safe_char) {
        value.to_string()
    } else {
        single_quote(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_quote() {
        assert_eq!(single_quote("a b"), "'a b'");
        assert_eq!(single_quote("it's"), "'it'\\''s'");
        assert_eq!(single_quote(""), "''");
    }

    #[test]
    fn test_quote_if_needed() {
        assert_eq!(quote_if_needed("plain/path.txt"), "plain/path.txt");
        assert_eq!(quote_if_needed("two words"), "'two words'");
        assert_eq!(quote_if_needed("$HOME"), "'$HOME'");
        assert_eq!(quote_if_needed(""), "''");
    }
}
