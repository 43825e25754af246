//! IFS (Internal Field Separator) Handling
//!
//! Utilities shared by word expansion, `"$*"` joining and the read builtin.

use crate::interpreter::types::InterpreterState;

/// Default IFS value: space, tab, newline
pub const DEFAULT_IFS: &str = " \t\n";

/// Effective IFS. Unset means the default; an empty value disables splitting.
pub fn get_ifs(state: &InterpreterState) -> &str {
    state.var("IFS").unwrap_or(DEFAULT_IFS)
}

/// Check if a character is IFS whitespace.
pub fn is_ifs_whitespace(c: char, ifs: &str) -> bool {
    matches!(c, ' ' | '\t' | '\n') && ifs.contains(c)
}

/// Separator used to join `"$*"`: the first IFS character, a space when IFS
/// is unset, nothing when IFS is empty.
pub fn get_ifs_separator(state: &InterpreterState) -> String {
    match state.var("IFS") {
        None => " ".to_string(),
        Some(ifs) => ifs.chars().next().map(String::from).unwrap_or_default(),
    }
}

/// Split a line for `read`: at most `max_fields` fields, the last one taking
/// the rest of the line with trailing IFS whitespace removed.
pub fn split_for_read(input: &str, ifs: &str, max_fields: usize) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut pos = 0;
    let mut fields = Vec::new();

    let skip_whitespace = |pos: &mut usize| {
        while *pos < len && is_ifs_whitespace(chars[*pos], ifs) {
            *pos += 1;
        }
    };

    if ifs.is_empty() || max_fields == 0 {
        return vec![input.to_string()];
    }

    skip_whitespace(&mut pos);
    while pos < len && fields.len() + 1 < max_fields {
        let start = pos;
        while pos < len && !ifs.contains(chars[pos]) {
            pos += 1;
        }
        fields.push(chars[start..pos].iter().collect());

        skip_whitespace(&mut pos);
        if pos < len && ifs.contains(chars[pos]) && !is_ifs_whitespace(chars[pos], ifs) {
            pos += 1;
            skip_whitespace(&mut pos);
        }
    }

    if pos < len {
        let mut end = len;
        while end > pos && is_ifs_whitespace(chars[end - 1], ifs) {
            end -= 1;
        }
        fields.push(chars[pos..end].iter().collect());
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator() {
        let mut state = InterpreterState::default();
        assert_eq!(get_ifs_separator(&state), " ");
        state.assign("IFS", ":-").unwrap();
        assert_eq!(get_ifs_separator(&state), ":");
        state.assign("IFS", "").unwrap();
        assert_eq!(get_ifs_separator(&state), "");
    }

    #[test]
    fn test_split_for_read_last_field_takes_rest() {
        assert_eq!(
            split_for_read("  one two  three  ", DEFAULT_IFS, 2),
            vec!["one".to_string(), "two  three".to_string()]
        );
        assert_eq!(
            split_for_read("a b", DEFAULT_IFS, 5),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_split_for_read_with_colons() {
        assert_eq!(
            split_for_read("root:x::0", ":", 4),
            vec!["root".to_string(), "x".to_string(), "".to_string(), "0".to_string()]
        );
    }
}
