//! Pattern Removal
//!
//! `${var#pat}`, `${var##pat}`, `${var%pat}` and `${var%%pat}`.

use crate::ast::types::PatternRemovalSide;
use crate::interpreter::expansion::pattern::compile_pattern;

/// Remove the shortest (or, when greedy, longest) prefix or suffix of
/// `value` that matches `pattern`. No match leaves the value unchanged.
pub fn apply_pattern_removal(value: &str, pattern: &str, side: PatternRemovalSide, greedy: bool) -> String {
    let Some(re) = compile_pattern(pattern) else {
        return value.to_string();
    };

    let mut boundaries: Vec<usize> = value.char_indices().map(|(i, _)| i).collect();
    boundaries.push(value.len());

    match side {
        PatternRemovalSide::Prefix => {
            let candidate = |end: usize| re.is_match(&value[..end]);
            let found = if greedy {
                boundaries.iter().copied().rev().find(|&e| candidate(e))
            } else {
                boundaries.iter().copied().find(|&e| candidate(e))
            };
            match found {
                Some(end) => value[end..].to_string(),
                None => value.to_string(),
            }
        }
        PatternRemovalSide::Suffix => {
            let candidate = |start: usize| re.is_match(&value[start..]);
            let found = if greedy {
                boundaries.iter().copied().find(|&s| candidate(s))
            } else {
                boundaries.iter().copied().rev().find(|&s| candidate(s))
            };
            match found {
                Some(start) => value[..start].to_string(),
                None => value.to_string(),
            }
        }
    }
}
