//! Pathname Expansion
//!
//! Turns split fields into final arguments. Fields with live pattern
//! characters are matched against the file system with the `glob` crate;
//! a pattern matching nothing stays as written.

use crate::interpreter::expansion::word_split::SplitField;
use crate::interpreter::helpers::bytes::from_os_string;
use glob::MatchOptions;

/// A field ready for pathname expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedField {
    /// The field's text with quoting removed
    pub value: String,
    /// Pattern for the glob crate, quoted metacharacters bracket-escaped
    pub glob_pattern: String,
    pub has_glob: bool,
}

impl From<&SplitField> for ExpandedField {
    fn from(field: &SplitField) -> Self {
        let mut value = String::new();
        let mut glob_pattern = String::new();
        let mut has_glob = false;

        for piece in &field.pieces {
            value.push_str(&piece.text);
            for c in piece.text.chars() {
                match c {
                    '*' | '?' | '[' | ']' if !piece.is_glob => {
                        glob_pattern.push('[');
                        glob_pattern.push(c);
                        glob_pattern.push(']');
                    }
                    '*' | '?' | '[' => {
                        has_glob = true;
                        glob_pattern.push(c);
                    }
                    _ => glob_pattern.push(c),
                }
            }
        }

        ExpandedField {
            value,
            glob_pattern,
            has_glob,
        }
    }
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    }
}

/// Expand one field into sorted matching paths, or itself when nothing matches
pub fn expand_field(field: &ExpandedField, noglob: bool) -> Vec<String> {
    if noglob || !field.has_glob {
        return vec![field.value.clone()];
    }

    let paths = match glob::glob_with(&field.glob_pattern, match_options()) {
        Ok(paths) => paths,
        Err(_) => return vec![field.value.clone()],
    };

    let mut matches: Vec<String> = paths
        .filter_map(Result::ok)
        .map(|p| from_os_string(p.into_os_string()))
        .collect();

    if matches.is_empty() {
        tracing::trace!(pattern = %field.glob_pattern, "no glob match");
        return vec![field.value.clone()];
    }
    matches.sort();
    matches
}

/// Pathname-expand every field of a word
pub fn expand_fields(fields: &[SplitField], noglob: bool) -> Vec<String> {
    fields
        .iter()
        .flat_map(|f| expand_field(&ExpandedField::from(f), noglob))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::expansion::word_split::FieldPiece;
    use std::fs;

    fn field(pieces: &[(&str, bool)]) -> SplitField {
        SplitField {
            pieces: pieces
                .iter()
                .map(|(t, g)| FieldPiece {
                    text: t.to_string(),
                    is_glob: *g,
                })
                .collect(),
        }
    }

    #[test]
    fn test_quoted_metacharacters_are_escaped() {
        let f = ExpandedField::from(&field(&[("a*", false), ("*", true)]));
        assert_eq!(f.value, "a**");
        assert_eq!(f.glob_pattern, "a[*]*");
        assert!(f.has_glob);

        let f = ExpandedField::from(&field(&[("[x]", false)]));
        assert!(!f.has_glob);
    }

    #[test]
    fn test_no_match_keeps_pattern() {
        let f = ExpandedField::from(&field(&[("/nonexistent-posish-dir/", false), ("*", true)]));
        assert_eq!(expand_field(&f, false), vec!["/nonexistent-posish-dir/*".to_string()]);
    }

    #[test]
    fn test_matches_are_sorted_and_skip_dotfiles() {
        let dir = std::env::temp_dir().join(format!("posish-glob-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["b.txt", "a.txt", ".hidden.txt"] {
            fs::write(dir.join(name), "").unwrap();
        }
        let prefix = format!("{}/", dir.display());
        let f = ExpandedField::from(&field(&[(&prefix, false), ("*", true), (".txt", false)]));
        let result = expand_field(&f, false);
        assert_eq!(
            result,
            vec![format!("{}a.txt", prefix), format!("{}b.txt", prefix)]
        );
        assert_eq!(expand_field(&f, true), vec![format!("{}*.txt", prefix)]);
        fs::remove_dir_all(&dir).unwrap();
    }
}
