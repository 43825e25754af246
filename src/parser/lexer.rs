//! Lexer for posish
//!
//! The lexer tokenizes input into a stream of tokens that the parser consumes.
//! It handles:
//! - Operators and delimiters
//! - Words, with their quoting kept intact for the word parser
//! - Comments and line continuations
//! - Here-documents, whose bodies are attached to the `<<` operator token
//!
//! Nested `$( )`, `${ }` and backquotes are paired with an explicit depth
//! counter so that quotes and parentheses inside them do not end the word.

use std::collections::HashMap;
use thiserror::Error;

/// Token types for the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // End of input
    Eof,

    // Newlines and separators
    Newline,
    Semicolon,
    Amp, // &

    // Operators
    Pipe,   // |
    AndAnd, // &&
    OrOr,   // ||
    Bang,   // !

    // Redirections
    Less,      // <
    Great,     // >
    DLess,     // <<
    DGreat,    // >>
    LessAnd,   // <&
    GreatAnd,  // >&
    LessGreat, // <>
    DLessDash, // <<-
    Clobber,   // >|

    // Grouping
    LParen, // (
    RParen, // )
    LBrace, // {
    RBrace, // }

    // Case item terminator
    DSemi, // ;;

    // Reserved words
    If,
    Then,
    Else,
    Elif,
    Fi,
    For,
    While,
    Until,
    Do,
    Done,
    Case,
    Esac,
    In,

    // Words and identifiers
    Word,
    Name,           // Valid variable name
    Number,         // IO number, as in 2>&1
    AssignmentWord, // VAR=value
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Newline => "newline",
            Self::Semicolon => ";",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Bang => "!",
            Self::Less => "<",
            Self::Great => ">",
            Self::DLess => "<<",
            Self::DGreat => ">>",
            Self::LessAnd => "<&",
            Self::GreatAnd => ">&",
            Self::LessGreat => "<>",
            Self::DLessDash => "<<-",
            Self::Clobber => ">|",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::DSemi => ";;",
            Self::If => "if",
            Self::Then => "then",
            Self::Else => "else",
            Self::Elif => "elif",
            Self::Fi => "fi",
            Self::For => "for",
            Self::While => "while",
            Self::Until => "until",
            Self::Do => "do",
            Self::Done => "done",
            Self::Case => "case",
            Self::Esac => "esac",
            Self::In => "in",
            Self::Word => "WORD",
            Self::Name => "NAME",
            Self::Number => "NUMBER",
            Self::AssignmentWord => "ASSIGNMENT_WORD",
        }
    }

    /// Reserved words and the brace/bang words that are only special
    /// in command position.
    pub fn is_reserved_word(&self) -> bool {
        matches!(
            self,
            Self::If
                | Self::Then
                | Self::Else
                | Self::Elif
                | Self::Fi
                | Self::For
                | Self::While
                | Self::Until
                | Self::Do
                | Self::Done
                | Self::Case
                | Self::Esac
                | Self::In
                | Self::LBrace
                | Self::RBrace
                | Self::Bang
        )
    }
}

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    /// Raw text, quotes and escapes included
    pub value: String,
    /// Original position in input
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    /// The raw text contains quotes or backslash escapes
    pub quoted: bool,
    /// Body of a here-document, set on `<<` and `<<-` tokens
    pub heredoc: Option<String>,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        value: impl Into<String>,
        start: usize,
        end: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            token_type,
            value: value.into(),
            start,
            end,
            line,
            column,
            quoted: false,
            heredoc: None,
        }
    }
}

/// Error raised when the lexer encounters invalid input
#[derive(Debug, Clone, Error)]
#[error("line {line}: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl LexerError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// A here-document whose body starts after the next newline
#[derive(Debug, Clone)]
struct PendingHeredoc {
    delimiter: String,
    strip_tabs: bool,
    /// Index of the `<<` token that receives the body
    token_index: usize,
}

lazy_static::lazy_static! {
    /// Reserved words
    static ref RESERVED_WORDS: HashMap<&'static str, TokenType> = {
        let mut m = HashMap::new();
        m.insert("if", TokenType::If);
        m.insert("then", TokenType::Then);
        m.insert("else", TokenType::Else);
        m.insert("elif", TokenType::Elif);
        m.insert("fi", TokenType::Fi);
        m.insert("for", TokenType::For);
        m.insert("while", TokenType::While);
        m.insert("until", TokenType::Until);
        m.insert("do", TokenType::Do);
        m.insert("done", TokenType::Done);
        m.insert("case", TokenType::Case);
        m.insert("esac", TokenType::Esac);
        m.insert("in", TokenType::In);
        m.insert("{", TokenType::LBrace);
        m.insert("}", TokenType::RBrace);
        m.insert("!", TokenType::Bang);
        m
    };
}

/// Operators, longest first
const OPERATORS: &[(&str, TokenType)] = &[
    ("<<-", TokenType::DLessDash),
    ("&&", TokenType::AndAnd),
    ("||", TokenType::OrOr),
    (";;", TokenType::DSemi),
    ("<<", TokenType::DLess),
    (">>", TokenType::DGreat),
    ("<&", TokenType::LessAnd),
    (">&", TokenType::GreatAnd),
    ("<>", TokenType::LessGreat),
    (">|", TokenType::Clobber),
    ("|", TokenType::Pipe),
    ("&", TokenType::Amp),
    (";", TokenType::Semicolon),
    ("<", TokenType::Less),
    (">", TokenType::Great),
    ("(", TokenType::LParen),
    (")", TokenType::RParen),
];

/// Check if a string is a valid variable name
pub fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Check if a character is a word boundary (ends a word token)
fn is_word_boundary(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | ';' | '&' | '|' | '(' | ')' | '<' | '>')
}

/// Strip quotes and backslashes from raw word text.
/// Used for here-document delimiters.
pub fn remove_quotes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                for inner in chars.by_ref() {
                    if inner == '\'' {
                        break;
                    }
                    out.push(inner);
                }
            }
            '"' => {
                while let Some(inner) = chars.next() {
                    match inner {
                        '"' => break,
                        '\\' => {
                            if let Some(&next) = chars.peek() {
                                if matches!(next, '$' | '`' | '"' | '\\') {
                                    out.push(next);
                                    chars.next();
                                    continue;
                                }
                            }
                            out.push('\\');
                        }
                        _ => out.push(inner),
                    }
                }
            }
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Lexer class
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    pending_heredocs: Vec<PendingHeredoc>,
    /// A `<<` operator waiting for its delimiter word: (token index, strip tabs)
    heredoc_operator: Option<(usize, bool)>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            pending_heredocs: Vec::new(),
            heredoc_operator: None,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        loop {
            self.skip_whitespace();

            let c = match self.current() {
                Some(c) => c,
                None => break,
            };
            let start_pos = self.pos;
            let line = self.line;
            let column = self.column;

            if c == '#' {
                self.skip_comment();
                continue;
            }

            if c == '\n' {
                self.advance();
                self.heredoc_operator = None;
                self.tokens.push(Token::new(
                    TokenType::Newline,
                    "\n",
                    start_pos,
                    self.pos,
                    line,
                    column,
                ));
                if !self.pending_heredocs.is_empty() {
                    self.read_heredoc_bodies()?;
                }
                continue;
            }

            if let Some((token_type, text)) = self.match_operator() {
                for _ in 0..text.len() {
                    self.advance();
                }
                self.heredoc_operator = None;
                if matches!(token_type, TokenType::DLess | TokenType::DLessDash) {
                    self.heredoc_operator =
                        Some((self.tokens.len(), token_type == TokenType::DLessDash));
                }
                self.tokens.push(Token::new(
                    token_type, text, start_pos, self.pos, line, column,
                ));
                continue;
            }

            let token = self.read_word()?;
            self.tokens.push(token);
        }

        if let Some(pending) = self.pending_heredocs.first() {
            return Err(LexerError::new(
                format!(
                    "here-document delimited by end-of-file (wanted `{}')",
                    pending.delimiter
                ),
                self.line,
                self.column,
            ));
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            "",
            self.pos,
            self.pos,
            self.line,
            self.column,
        ));

        Ok(self.tokens)
    }

    // ===========================================================================
    // CHARACTER CURSOR
    // ===========================================================================

    fn current(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek(i) == Some(c))
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            match c {
                ' ' | '\t' => {
                    self.advance();
                }
                '\\' if self.peek(1) == Some('\n') => {
                    // Line continuation
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn match_operator(&self) -> Option<(TokenType, &'static str)> {
        OPERATORS
            .iter()
            .find(|(text, _)| self.starts_with(text))
            .map(|(text, token_type)| (*token_type, *text))
    }

    // ===========================================================================
    // WORDS
    // ===========================================================================

    fn read_word(&mut self) -> Result<Token, LexerError> {
        let start_pos = self.pos;
        let line = self.line;
        let column = self.column;
        let mut value = String::new();
        let mut quoted = false;

        while let Some(c) = self.current() {
            if is_word_boundary(c) {
                break;
            }
            match c {
                '\\' => {
                    if self.peek(1) == Some('\n') {
                        self.advance();
                        self.advance();
                        continue;
                    }
                    quoted = true;
                    value.push(c);
                    self.advance();
                    if let Some(next) = self.advance() {
                        value.push(next);
                    }
                }
                '\'' => {
                    quoted = true;
                    self.read_single_quoted(&mut value)?;
                }
                '"' => {
                    quoted = true;
                    self.read_double_quoted(&mut value)?;
                }
                '`' => self.read_backquoted(&mut value)?,
                '$' => self.read_dollar(&mut value)?,
                _ => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        let mut token = Token::new(TokenType::Word, value, start_pos, self.pos, line, column);
        token.quoted = quoted;

        if let Some((token_index, strip_tabs)) = self.heredoc_operator.take() {
            self.pending_heredocs.push(PendingHeredoc {
                delimiter: remove_quotes(&token.value),
                strip_tabs,
                token_index,
            });
            return Ok(token);
        }

        token.token_type = self.classify_word(&token.value, quoted);
        Ok(token)
    }

    fn classify_word(&self, value: &str, quoted: bool) -> TokenType {
        if !quoted {
            if let Some(token_type) = RESERVED_WORDS.get(value) {
                return *token_type;
            }
            if value.chars().all(|c| c.is_ascii_digit())
                && matches!(self.current(), Some('<') | Some('>'))
            {
                return TokenType::Number;
            }
        }
        if let Some(eq) = value.find('=') {
            if eq > 0 && is_valid_name(&value[..eq]) {
                return TokenType::AssignmentWord;
            }
        }
        if is_valid_name(value) {
            TokenType::Name
        } else {
            TokenType::Word
        }
    }

    fn read_single_quoted(&mut self, value: &mut String) -> Result<(), LexerError> {
        let (line, column) = (self.line, self.column);
        value.push('\'');
        self.advance();
        loop {
            match self.advance() {
                None => {
                    return Err(LexerError::new("unterminated single quote", line, column))
                }
                Some('\'') => {
                    value.push('\'');
                    return Ok(());
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn read_double_quoted(&mut self, value: &mut String) -> Result<(), LexerError> {
        let (line, column) = (self.line, self.column);
        value.push('"');
        self.advance();
        loop {
            match self.current() {
                None => {
                    return Err(LexerError::new("unterminated double quote", line, column))
                }
                Some('"') => {
                    value.push('"');
                    self.advance();
                    return Ok(());
                }
                Some('\\') => {
                    value.push('\\');
                    self.advance();
                    if let Some(next) = self.advance() {
                        value.push(next);
                    }
                }
                Some('$') => self.read_dollar(value)?,
                Some('`') => self.read_backquoted(value)?,
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    fn read_backquoted(&mut self, value: &mut String) -> Result<(), LexerError> {
        let (line, column) = (self.line, self.column);
        value.push('`');
        self.advance();
        loop {
            match self.advance() {
                None => {
                    return Err(LexerError::new(
                        "unterminated command substitution (missing `)",
                        line,
                        column,
                    ))
                }
                Some('\\') => {
                    value.push('\\');
                    if let Some(next) = self.advance() {
                        value.push(next);
                    }
                }
                Some('`') => {
                    value.push('`');
                    return Ok(());
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn read_dollar(&mut self, value: &mut String) -> Result<(), LexerError> {
        value.push('$');
        self.advance();
        match self.current() {
            Some('(') => self.read_balanced(value, '(', ')', "unterminated command substitution"),
            Some('{') => self.read_balanced(value, '{', '}', "unterminated parameter expansion"),
            _ => Ok(()),
        }
    }

    /// Copy a bracketed construct, pairing `open` and `close` with a depth
    /// counter. Quotes and nested substitutions are copied whole.
    fn read_balanced(
        &mut self,
        value: &mut String,
        open: char,
        close: char,
        message: &str,
    ) -> Result<(), LexerError> {
        let (line, column) = (self.line, self.column);
        let mut depth = 0usize;
        loop {
            let c = match self.current() {
                Some(c) => c,
                None => return Err(LexerError::new(message, line, column)),
            };
            match c {
                '\\' => {
                    value.push(c);
                    self.advance();
                    if let Some(next) = self.advance() {
                        value.push(next);
                    }
                }
                '\'' => self.read_single_quoted(value)?,
                '"' => self.read_double_quoted(value)?,
                '`' => self.read_backquoted(value)?,
                '$' => self.read_dollar(value)?,
                _ if c == open => {
                    depth += 1;
                    value.push(c);
                    self.advance();
                }
                _ if c == close => {
                    depth -= 1;
                    value.push(c);
                    self.advance();
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    // ===========================================================================
    // HERE-DOCUMENTS
    // ===========================================================================

    /// Read the bodies of every here-document opened on the line just ended,
    /// in the order their operators appeared.
    fn read_heredoc_bodies(&mut self) -> Result<(), LexerError> {
        let pending = std::mem::take(&mut self.pending_heredocs);
        for heredoc in pending {
            let (line, column) = (self.line, self.column);
            let mut body = String::new();
            loop {
                if self.current().is_none() {
                    return Err(LexerError::new(
                        format!(
                            "here-document delimited by end-of-file (wanted `{}')",
                            heredoc.delimiter
                        ),
                        line,
                        column,
                    ));
                }
                let mut text = String::new();
                while let Some(c) = self.current() {
                    if c == '\n' {
                        break;
                    }
                    text.push(c);
                    self.advance();
                }
                if self.current() == Some('\n') {
                    self.advance();
                }
                let text = if heredoc.strip_tabs {
                    text.trim_start_matches('\t').to_string()
                } else {
                    text
                };
                if text == heredoc.delimiter {
                    break;
                }
                body.push_str(&text);
                body.push('\n');
            }
            if let Some(token) = self.tokens.get_mut(heredoc.token_index) {
                token.heredoc = Some(body);
            }
        }
        Ok(())
    }
}
