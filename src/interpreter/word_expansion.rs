//! Word Expansion
//!
//! Main entry point for shell word expansion.
//!
//! A word is expanded in one pass over its parts into [`WordSegment`]s that
//! remember their quoting provenance:
//! - Tilde expansion (~, ~user)
//! - Parameter expansion ($VAR, ${VAR op word}, special parameters)
//! - Command substitution $(...) and `...`
//! - Arithmetic expansion $((...))
//!
//! The segments are then split on IFS and pathname-expanded. Callers that
//! need a single string (assignments, `case` subjects, here-documents) join
//! the segments instead.

use crate::ast::types::{ParameterExpansionPart, ParameterOperation, WordNode, WordPart};
use crate::interpreter::arithmetic::evaluate_arithmetic;
use crate::interpreter::errors::{ArithmeticError, InterpreterError};
use crate::interpreter::execution_engine::ExecutionEngine;
use crate::interpreter::expansion::parameter_ops::{is_special_parameter, is_unset_or_null, parameter_value};
use crate::interpreter::expansion::pattern::escape_pattern;
use crate::interpreter::expansion::pattern_removal::apply_pattern_removal;
use crate::interpreter::expansion::tilde::expand_tilde;
use crate::interpreter::expansion::word_glob_expansion::expand_fields;
use crate::interpreter::expansion::word_split::{split_segments, WordSegment};
use crate::interpreter::helpers::ifs::{get_ifs, get_ifs_separator};
use crate::interpreter::types::InterpreterState;
use crate::parser::arithmetic_parser::parse_arithmetic_expression;

/// Concatenate segments without splitting; `$@` boundaries become spaces
fn join_segments(segments: &[WordSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            WordSegment::Text(seg) => out.push_str(&seg.value),
            WordSegment::FieldBreak => out.push(' '),
        }
    }
    out
}

/// A double-quoted part holding nothing but `$@` with no positional
/// parameters expands to no field at all
fn is_empty_quoted_at(parts: &[WordPart], state: &InterpreterState) -> bool {
    match parts {
        [WordPart::ParameterExpansion(p)] => {
            p.parameter == "@" && p.operation.is_none() && state.vars.positional().is_empty()
        }
        _ => false,
    }
}

fn is_positional_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}

impl<'a> ExecutionEngine<'a> {
    // ========================================================================
    // Entry Points
    // ========================================================================

    /// Expand a list of words into the final argument vector
    pub fn expand_words(&self, state: &mut InterpreterState, words: &[WordNode]) -> Result<Vec<String>, InterpreterError> {
        let mut out = Vec::new();
        for word in words {
            out.extend(self.expand_word_fields(state, word)?);
        }
        Ok(out)
    }

    /// Full expansion of one word: expansions, field splitting, globbing
    pub fn expand_word_fields(&self, state: &mut InterpreterState, word: &WordNode) -> Result<Vec<String>, InterpreterError> {
        let segments = self.expand_word_segments(state, &word.parts, false)?;
        let fields = split_segments(segments, get_ifs(state));
        Ok(expand_fields(&fields, state.options.noglob))
    }

    /// Expand a word to one string with no splitting or globbing
    pub fn expand_word_string(&self, state: &mut InterpreterState, word: &WordNode) -> Result<String, InterpreterError> {
        let segments = self.expand_word_segments(state, &word.parts, false)?;
        Ok(join_segments(&segments))
    }

    /// Expand a redirection target, which must produce exactly one field
    pub fn expand_redirect_target(&self, state: &mut InterpreterState, word: &WordNode) -> Result<String, InterpreterError> {
        let mut fields = self.expand_word_fields(state, word)?;
        if fields.len() != 1 {
            return Err(InterpreterError::Redirect("ambiguous redirect".to_string()));
        }
        Ok(fields.remove(0))
    }

    /// Expand a word used as a pattern (`case` items, `${v#pat}`). Quoted
    /// text is escaped so it matches literally.
    pub fn expand_pattern(&self, state: &mut InterpreterState, word: &WordNode) -> Result<String, InterpreterError> {
        let segments = self.expand_word_segments(state, &word.parts, false)?;
        let mut pattern = String::new();
        for segment in &segments {
            match segment {
                WordSegment::Text(seg) if seg.is_glob => pattern.push_str(&seg.value),
                WordSegment::Text(seg) => pattern.push_str(&escape_pattern(&seg.value)),
                WordSegment::FieldBreak => pattern.push(' '),
            }
        }
        Ok(pattern)
    }

    /// Expand, parse and evaluate an arithmetic expression word
    pub fn expand_arithmetic(&self, state: &mut InterpreterState, word: &WordNode) -> Result<i64, InterpreterError> {
        let text = self.expand_word_string(state, word)?;
        if text.trim().is_empty() {
            return Ok(0);
        }
        let expr = parse_arithmetic_expression(&text).map_err(ArithmeticError::from)?;
        evaluate_arithmetic(state, &expr)
    }

    // ========================================================================
    // Parts
    // ========================================================================

    /// Expand word parts into segments; `in_quotes` is true inside "..."
    pub fn expand_word_segments(
        &self,
        state: &mut InterpreterState,
        parts: &[WordPart],
        in_quotes: bool,
    ) -> Result<Vec<WordSegment>, InterpreterError> {
        let mut segments = Vec::new();

        for part in parts {
            match part {
                WordPart::Literal(text) => {
                    segments.push(if in_quotes {
                        WordSegment::quoted(text.clone())
                    } else {
                        WordSegment::literal(text.clone())
                    });
                }
                WordPart::SingleQuoted(text) | WordPart::Escaped(text) => {
                    segments.push(WordSegment::quoted(text.clone()));
                }
                WordPart::DoubleQuoted(inner) => {
                    if is_empty_quoted_at(inner, state) {
                        continue;
                    }
                    segments.push(WordSegment::quoted(""));
                    segments.extend(self.expand_word_segments(state, inner, true)?);
                }
                WordPart::Glob(text) => {
                    segments.push(if in_quotes {
                        WordSegment::quoted(text.clone())
                    } else {
                        WordSegment::glob(text.clone())
                    });
                }
                WordPart::TildeExpansion(user) => {
                    segments.push(WordSegment::quoted(expand_tilde(state, user.as_deref())));
                }
                WordPart::ParameterExpansion(param) => {
                    self.expand_parameter(state, param, in_quotes, &mut segments)?;
                }
                WordPart::CommandSubstitution(sub) => {
                    let output = self.command_substitution(state, &sub.body)?;
                    segments.push(WordSegment::expanded(output, in_quotes));
                }
                WordPart::ArithmeticExpansion(arith) => {
                    let value = self.expand_arithmetic(state, &arith.expression)?;
                    segments.push(WordSegment::expanded(value.to_string(), in_quotes));
                }
            }
        }

        Ok(segments)
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    fn expand_positional_list(&self, state: &InterpreterState, name: &str, in_quotes: bool, out: &mut Vec<WordSegment>) {
        let params = state.vars.positional();
        if in_quotes && name == "*" {
            out.push(WordSegment::quoted(params.join(&get_ifs_separator(state))));
            return;
        }
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                out.push(WordSegment::FieldBreak);
            }
            out.push(WordSegment::expanded(param.clone(), in_quotes));
        }
    }

    /// Expand the word operand of `${v op word}`. Unquoted literal text in
    /// the operand is subject to field splitting like the expansion itself.
    fn expand_operand(&self, state: &mut InterpreterState, word: &WordNode, in_quotes: bool) -> Result<Vec<WordSegment>, InterpreterError> {
        let mut segments = self.expand_word_segments(state, &word.parts, in_quotes)?;
        if !in_quotes {
            for segment in &mut segments {
                if let WordSegment::Text(seg) = segment {
                    if !seg.is_quoted {
                        seg.is_splittable = true;
                    }
                }
            }
        }
        Ok(segments)
    }

    fn expand_parameter(
        &self,
        state: &mut InterpreterState,
        part: &ParameterExpansionPart,
        in_quotes: bool,
        out: &mut Vec<WordSegment>,
    ) -> Result<(), InterpreterError> {
        let name = part.parameter.as_str();
        let is_list = name == "@" || name == "*";

        let Some(operation) = &part.operation else {
            if is_list {
                self.expand_positional_list(state, name, in_quotes, out);
                return Ok(());
            }
            return match parameter_value(state, name) {
                Some(value) => {
                    out.push(WordSegment::expanded(value, in_quotes));
                    Ok(())
                }
                None if state.options.nounset => Err(InterpreterError::Unbound { name: name.to_string() }),
                None => {
                    out.push(WordSegment::expanded("", in_quotes));
                    Ok(())
                }
            };
        };

        let value = parameter_value(state, name);

        match operation {
            ParameterOperation::DefaultValue { word, check_empty } => {
                if is_unset_or_null(value.as_deref(), *check_empty) {
                    out.extend(self.expand_operand(state, word, in_quotes)?);
                } else if is_list {
                    self.expand_positional_list(state, name, in_quotes, out);
                } else {
                    out.push(WordSegment::expanded(value.unwrap_or_default(), in_quotes));
                }
            }
            ParameterOperation::AssignDefault { word, check_empty } => {
                if is_unset_or_null(value.as_deref(), *check_empty) {
                    if is_special_parameter(name) || is_positional_name(name) {
                        return Err(InterpreterError::ParameterNotSet {
                            name: format!("${}", name),
                            message: "cannot assign in this way".to_string(),
                        });
                    }
                    let assigned = join_segments(&self.expand_word_segments(state, &word.parts, in_quotes)?);
                    state.assign(name, assigned.clone())?;
                    out.push(WordSegment::expanded(assigned, in_quotes));
                } else {
                    out.push(WordSegment::expanded(value.unwrap_or_default(), in_quotes));
                }
            }
            ParameterOperation::UseAlternative { word, check_empty } => {
                if is_unset_or_null(value.as_deref(), *check_empty) {
                    out.push(WordSegment::expanded("", in_quotes));
                } else {
                    out.extend(self.expand_operand(state, word, in_quotes)?);
                }
            }
            ParameterOperation::ErrorIfUnset { word, check_empty } => {
                if is_unset_or_null(value.as_deref(), *check_empty) {
                    let message = match word {
                        Some(word) => self.expand_word_string(state, word)?,
                        None if *check_empty => "parameter null or not set".to_string(),
                        None => "parameter not set".to_string(),
                    };
                    return Err(InterpreterError::ParameterNotSet {
                        name: name.to_string(),
                        message,
                    });
                }
                if is_list {
                    self.expand_positional_list(state, name, in_quotes, out);
                } else {
                    out.push(WordSegment::expanded(value.unwrap_or_default(), in_quotes));
                }
            }
            ParameterOperation::Length => {
                let length = if is_list {
                    state.vars.positional().len()
                } else {
                    match &value {
                        Some(v) => v.chars().count(),
                        None if state.options.nounset => {
                            return Err(InterpreterError::Unbound { name: name.to_string() })
                        }
                        None => 0,
                    }
                };
                out.push(WordSegment::expanded(length.to_string(), in_quotes));
            }
            ParameterOperation::PatternRemoval { pattern, side, greedy } => {
                if value.is_none() && !is_list && state.options.nounset {
                    return Err(InterpreterError::Unbound { name: name.to_string() });
                }
                let pattern = self.expand_pattern(state, pattern)?;
                let result = apply_pattern_removal(value.as_deref().unwrap_or(""), &pattern, *side, *greedy);
                out.push(WordSegment::expanded(result, in_quotes));
            }
        }
        Ok(())
    }
}
