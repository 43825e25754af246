//! Word Parsing
//!
//! Turns the raw text of a word token into `WordPart`s: quoting,
//! parameter/command/arithmetic expansions, glob characters and tildes.
//! Command substitution bodies are parsed here, up front, so a syntax error
//! inside `$( )` rejects the whole unit before anything runs.

use crate::ast::types::{
    ArithmeticExpansionPart, AssignmentNode, CommandSubstitutionPart, ParameterExpansionPart,
    ParameterOperation, PatternRemovalSide, WordNode, WordPart, AST,
};
use crate::parser::lexer::is_valid_name;
use crate::parser::parser::Parser;
use crate::parser::types::ParseException;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteMode {
    Unquoted,
    DoubleQuoted,
    /// Here-document bodies and arithmetic text: like double quotes,
    /// except that `"` is an ordinary character.
    HereDoc,
}

/// Parse the raw text of a word token
pub fn parse_word(raw: &str, line: usize) -> Result<WordNode, ParseException> {
    WordParser::new(raw, line).parse(QuoteMode::Unquoted)
}

/// Parse an unquoted here-document body
pub fn parse_heredoc_body(raw: &str, line: usize) -> Result<WordNode, ParseException> {
    WordParser::new(raw, line).parse(QuoteMode::HereDoc)
}

/// Split an ASSIGNMENT_WORD token into name and value
pub fn parse_assignment(raw: &str, line: usize) -> Result<AssignmentNode, ParseException> {
    let eq = raw
        .find('=')
        .ok_or_else(|| ParseException::new(format!("`{}': not an assignment", raw), line, 0))?;
    let value_text = &raw[eq + 1..];
    let value = if value_text.is_empty() {
        None
    } else {
        Some(parse_word(value_text, line)?)
    };
    Ok(AssignmentNode {
        name: raw[..eq].to_string(),
        value,
    })
}

/// Find the index of the bracket closing the one at `open_idx`, skipping
/// quoted text. Pairing uses a depth counter.
fn find_matching(chars: &[char], open_idx: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open_idx;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                i += 2;
                continue;
            }
            '\'' => {
                i += 1;
                while i < chars.len() && chars[i] != '\'' {
                    i += 1;
                }
            }
            '"' => {
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            '`' => {
                i += 1;
                while i < chars.len() && chars[i] != '`' {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ if c == open => depth += 1,
            _ if c == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn is_special_parameter(c: char) -> bool {
    matches!(c, '@' | '*' | '#' | '?' | '$' | '!' | '-')
}

/// Names accepted after `${#`
fn is_parameter_name(s: &str) -> bool {
    is_valid_name(s)
        || (!s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        || (s.chars().count() == 1 && s.chars().all(is_special_parameter))
}

fn bad_substitution(inner: &str, line: usize) -> ParseException {
    ParseException::new(format!("${{{}}}: bad substitution", inner), line, 0)
}

/// Parse the inside of `${ ... }`
fn parse_braced_parameter(inner: &str, line: usize) -> Result<WordPart, ParseException> {
    let chars: Vec<char> = inner.chars().collect();

    if chars.len() > 1 && chars[0] == '#' {
        let rest: String = chars[1..].iter().collect();
        if is_parameter_name(&rest) {
            return Ok(WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: rest,
                operation: Some(ParameterOperation::Length),
            }));
        }
    }

    let consumed = match chars.first() {
        Some(c) if c.is_ascii_alphabetic() || *c == '_' => chars
            .iter()
            .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
            .count(),
        Some(c) if c.is_ascii_digit() => chars.iter().take_while(|c| c.is_ascii_digit()).count(),
        Some(c) if is_special_parameter(*c) => 1,
        _ => return Err(bad_substitution(inner, line)),
    };
    let parameter: String = chars[..consumed].iter().collect();
    let rest: String = chars[consumed..].iter().collect();

    if rest.is_empty() {
        return Ok(WordPart::ParameterExpansion(ParameterExpansionPart {
            parameter,
            operation: None,
        }));
    }

    let operand = |text: &str| parse_word(text, line);
    let (check_empty, op_text) = match rest.strip_prefix(':') {
        Some(stripped) => (true, stripped),
        None => (false, rest.as_str()),
    };

    let mut op_chars = op_text.chars();
    let operation = match op_chars.next() {
        Some('-') => ParameterOperation::DefaultValue {
            word: operand(op_chars.as_str())?,
            check_empty,
        },
        Some('=') => ParameterOperation::AssignDefault {
            word: operand(op_chars.as_str())?,
            check_empty,
        },
        Some('+') => ParameterOperation::UseAlternative {
            word: operand(op_chars.as_str())?,
            check_empty,
        },
        Some('?') => {
            let text = op_chars.as_str();
            ParameterOperation::ErrorIfUnset {
                word: if text.is_empty() { None } else { Some(operand(text)?) },
                check_empty,
            }
        }
        Some(c @ ('#' | '%')) if !check_empty => {
            let side = if c == '#' {
                PatternRemovalSide::Prefix
            } else {
                PatternRemovalSide::Suffix
            };
            let remaining = op_chars.as_str();
            let (greedy, pattern_text) = match remaining.strip_prefix(c) {
                Some(p) => (true, p),
                None => (false, remaining),
            };
            ParameterOperation::PatternRemoval {
                pattern: operand(pattern_text)?,
                side,
                greedy,
            }
        }
        _ => return Err(bad_substitution(inner, line)),
    };

    Ok(WordPart::ParameterExpansion(ParameterExpansionPart {
        parameter,
        operation: Some(operation),
    }))
}

/// Cursor over the characters of one word
struct WordParser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl WordParser {
    fn new(raw: &str, line: usize) -> Self {
        Self {
            chars: raw.chars().collect(),
            pos: 0,
            line,
        }
    }

    fn parse(mut self, mode: QuoteMode) -> Result<WordNode, ParseException> {
        let parts = self.parse_parts(mode)?;
        Ok(AST::word(parts))
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn parse_parts(&mut self, mode: QuoteMode) -> Result<Vec<WordPart>, ParseException> {
        let mut parts = Vec::new();
        let mut literal = String::new();

        fn flush(literal: &mut String, parts: &mut Vec<WordPart>) {
            if !literal.is_empty() {
                parts.push(WordPart::Literal(std::mem::take(literal)));
            }
        }

        while let Some(c) = self.current() {
            match c {
                '"' if mode == QuoteMode::DoubleQuoted => {
                    self.pos += 1;
                    break;
                }
                '"' if mode == QuoteMode::Unquoted => {
                    flush(&mut literal, &mut parts);
                    self.pos += 1;
                    let inner = self.parse_parts(QuoteMode::DoubleQuoted)?;
                    parts.push(WordPart::DoubleQuoted(inner));
                }
                '\'' if mode == QuoteMode::Unquoted => {
                    flush(&mut literal, &mut parts);
                    let start = self.pos + 1;
                    let end = (start..self.chars.len())
                        .find(|&i| self.chars[i] == '\'')
                        .ok_or_else(|| {
                            ParseException::new("unterminated single quote", self.line, 0)
                        })?;
                    parts.push(WordPart::SingleQuoted(self.slice(start, end)));
                    self.pos = end + 1;
                }
                '\\' => self.parse_backslash(mode, &mut literal, &mut parts),
                '$' => match self.parse_dollar()? {
                    Some(part) => {
                        flush(&mut literal, &mut parts);
                        parts.push(part);
                    }
                    None => literal.push('$'),
                },
                '`' => {
                    flush(&mut literal, &mut parts);
                    let part = self.parse_backquote(mode)?;
                    parts.push(part);
                }
                '*' | '?' if mode == QuoteMode::Unquoted => {
                    flush(&mut literal, &mut parts);
                    parts.push(WordPart::Glob(c.to_string()));
                    self.pos += 1;
                }
                '[' if mode == QuoteMode::Unquoted => match self.bracket_end() {
                    Some(end) => {
                        flush(&mut literal, &mut parts);
                        parts.push(WordPart::Glob(self.slice(self.pos, end + 1)));
                        self.pos = end + 1;
                    }
                    None => {
                        literal.push('[');
                        self.pos += 1;
                    }
                },
                '~' if mode == QuoteMode::Unquoted && self.pos == 0 => match self.parse_tilde() {
                    Some(part) => parts.push(part),
                    None => {
                        literal.push('~');
                        self.pos += 1;
                    }
                },
                _ => {
                    literal.push(c);
                    self.pos += 1;
                }
            }
        }

        flush(&mut literal, &mut parts);
        Ok(parts)
    }

    fn parse_backslash(&mut self, mode: QuoteMode, literal: &mut String, parts: &mut Vec<WordPart>) {
        let next = self.peek(1);
        if next == Some('\n') {
            self.pos += 2;
            return;
        }
        let escapes = match (mode, next) {
            (_, None) => false,
            (QuoteMode::Unquoted, Some(_)) => true,
            (QuoteMode::DoubleQuoted, Some(n)) => matches!(n, '$' | '`' | '"' | '\\'),
            (QuoteMode::HereDoc, Some(n)) => matches!(n, '$' | '`' | '\\'),
        };
        match next {
            Some(n) if escapes => {
                if !literal.is_empty() {
                    parts.push(WordPart::Literal(std::mem::take(literal)));
                }
                parts.push(WordPart::Escaped(n.to_string()));
                self.pos += 2;
            }
            _ => {
                literal.push('\\');
                self.pos += 1;
            }
        }
    }

    /// End index of a `[...]` bracket expression starting at `pos`
    fn bracket_end(&self) -> Option<usize> {
        let mut i = self.pos + 1;
        if matches!(self.chars.get(i), Some('!') | Some('^')) {
            i += 1;
        }
        if self.chars.get(i) == Some(&']') {
            i += 1;
        }
        while let Some(&c) = self.chars.get(i) {
            match c {
                ']' => return Some(i),
                '\'' | '"' | '\\' | '$' | '`' => return None,
                _ => i += 1,
            }
        }
        None
    }

    fn parse_tilde(&mut self) -> Option<WordPart> {
        let end = (self.pos + 1..self.chars.len())
            .find(|&i| self.chars[i] == '/')
            .unwrap_or(self.chars.len());
        let user = self.slice(self.pos + 1, end);
        if !user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return None;
        }
        self.pos = end;
        Some(WordPart::TildeExpansion(if user.is_empty() { None } else { Some(user) }))
    }

    /// Parse an expansion introduced by `$`. Returns None (and consumes the
    /// `$`) when the dollar sign is literal.
    fn parse_dollar(&mut self) -> Result<Option<WordPart>, ParseException> {
        match self.peek(1) {
            Some('{') => {
                let end = find_matching(&self.chars, self.pos + 1, '{', '}').ok_or_else(|| {
                    ParseException::new("unterminated parameter expansion", self.line, 0)
                })?;
                let inner = self.slice(self.pos + 2, end);
                self.pos = end + 1;
                Ok(Some(parse_braced_parameter(&inner, self.line)?))
            }
            Some('(') => {
                let close = find_matching(&self.chars, self.pos + 1, '(', ')').ok_or_else(|| {
                    ParseException::new("unterminated command substitution", self.line, 0)
                })?;
                if self.peek(2) == Some('(') {
                    if let Some(inner_close) = find_matching(&self.chars, self.pos + 2, '(', ')') {
                        if inner_close + 1 == close {
                            let text = self.slice(self.pos + 3, inner_close);
                            self.pos = close + 1;
                            let expression = WordParser::new(&text, self.line).parse(QuoteMode::HereDoc)?;
                            return Ok(Some(WordPart::ArithmeticExpansion(ArithmeticExpansionPart {
                                expression,
                            })));
                        }
                    }
                }
                let body_text = self.slice(self.pos + 2, close);
                self.pos = close + 1;
                let body = Parser::new().parse(&body_text)?;
                Ok(Some(WordPart::CommandSubstitution(CommandSubstitutionPart {
                    body,
                    legacy: false,
                })))
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let start = self.pos + 1;
                let mut end = start;
                while matches!(self.chars.get(end), Some(c) if c.is_ascii_alphanumeric() || *c == '_') {
                    end += 1;
                }
                let name = self.slice(start, end);
                self.pos = end;
                Ok(Some(AST::parameter(name)))
            }
            Some(c) if c.is_ascii_digit() || is_special_parameter(c) => {
                self.pos += 2;
                Ok(Some(AST::parameter(c.to_string())))
            }
            _ => {
                self.pos += 1;
                Ok(None)
            }
        }
    }

    fn parse_backquote(&mut self, mode: QuoteMode) -> Result<WordPart, ParseException> {
        let mut inner = String::new();
        let mut i = self.pos + 1;
        loop {
            let c = *self.chars.get(i).ok_or_else(|| {
                ParseException::new("unterminated command substitution (missing `)", self.line, 0)
            })?;
            match c {
                '`' => break,
                '\\' => {
                    let next = self.chars.get(i + 1).copied();
                    let unescape = matches!(next, Some('$') | Some('`') | Some('\\'))
                        || (mode == QuoteMode::DoubleQuoted && next == Some('"'));
                    match next {
                        Some(n) if unescape => {
                            inner.push(n);
                            i += 2;
                        }
                        _ => {
                            inner.push('\\');
                            i += 1;
                        }
                    }
                }
                _ => {
                    inner.push(c);
                    i += 1;
                }
            }
        }
        self.pos = i + 1;
        let body = Parser::new().parse(&inner)?;
        Ok(WordPart::CommandSubstitution(CommandSubstitutionPart { body, legacy: true }))
    }
}
