//! Expansion building blocks
//!
//! The pieces word expansion is assembled from: parameter lookup, pattern
//! matching and removal, tilde expansion, command substitution, field
//! splitting and pathname expansion. The driver lives in
//! [`word_expansion`](crate::interpreter::word_expansion).

pub mod command_substitution;
pub mod parameter_ops;
pub mod pattern;
pub mod pattern_removal;
pub mod tilde;
pub mod word_glob_expansion;
pub mod word_split;

pub use parameter_ops::{is_special_parameter, parameter_value};
pub use pattern::{escape_pattern, matches_pattern};
pub use word_split::{split_segments, SplitField, WordSegment};
