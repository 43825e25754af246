//! Recursive Descent Parser for posish
//!
//! Builds the AST from the token stream. Grammar, loosest binding first:
//!
//! ```text
//! script    := linebreak (and_or (sep and_or)*)? linebreak EOF
//! and_or    := pipeline (('&&' | '||') linebreak pipeline)* ['&']
//! pipeline  := ['!'] command ('|' linebreak command)*
//! command   := compound redirect* | funcdef | simple
//! simple    := (assignment | redirect)* [word (word | redirect)*]
//! ```
//!
//! The whole input is parsed before anything runs; any syntax error rejects
//! the unit.

use crate::ast::types::{
    CommandNode, HereDocNode, PipelineNode, RedirectionNode, RedirectionOperator,
    RedirectionTarget, ScriptNode, SimpleCommandNode, StatementNode, StatementOperator, WordNode,
    AST,
};
use crate::parser::lexer::{remove_quotes, Lexer, Token, TokenType};
use crate::parser::types::{is_redirection_token, is_word_token, ParseException, MAX_PARSER_DEPTH};
use crate::parser::word_parser::{parse_assignment, parse_heredoc_body, parse_word};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Create a new parser instance
    pub fn new() -> Self {
        Parser {
            tokens: Vec::new(),
            pos: 0,
            depth: 0,
        }
    }

    /// Parse a complete input unit
    pub fn parse(&mut self, input: &str) -> Result<ScriptNode, ParseException> {
        self.tokens = Lexer::new(input).tokenize()?;
        self.pos = 0;
        self.depth = 0;
        self.parse_script()
    }

    // ===========================================================================
    // HELPER METHODS
    // ===========================================================================

    pub(crate) fn current(&self) -> Token {
        self.peek(0)
    }

    pub(crate) fn peek(&self, offset: usize) -> Token {
        let idx = self.pos + offset;
        match self.tokens.get(idx).or_else(|| self.tokens.last()) {
            Some(token) => token.clone(),
            None => Token::new(TokenType::Eof, "", 0, 0, 1, 1),
        }
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn check(&self, types: &[TokenType]) -> bool {
        let current_type = self.tokens.get(self.pos).map(|t| t.token_type);
        types.iter().any(|t| current_type == Some(*t))
    }

    pub(crate) fn expect(&mut self, token_type: TokenType) -> Result<Token, ParseException> {
        if self.check(&[token_type]) {
            Ok(self.advance())
        } else {
            Err(ParseException::unexpected(self.current()))
        }
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.check(&[TokenType::Newline]) {
            self.advance();
        }
    }

    /// Any token usable as a word in argument position
    pub(crate) fn is_word(&self) -> bool {
        is_word_token(self.current().token_type)
    }

    pub(crate) fn enter(&mut self) -> Result<(), ParseException> {
        self.depth += 1;
        if self.depth > MAX_PARSER_DEPTH {
            let token = self.current();
            return Err(ParseException::new(
                "syntax error: nesting too deep",
                token.line,
                token.column,
            ));
        }
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }

    fn is_command_start(&self) -> bool {
        let t = self.current().token_type;
        matches!(
            t,
            TokenType::Word
                | TokenType::Name
                | TokenType::Number
                | TokenType::AssignmentWord
                | TokenType::If
                | TokenType::For
                | TokenType::While
                | TokenType::Until
                | TokenType::Case
                | TokenType::LParen
                | TokenType::LBrace
                | TokenType::Bang
        ) || is_redirection_token(t)
    }

    /// Parse the raw text of the current token into a word
    pub(crate) fn parse_word_token(&mut self) -> Result<WordNode, ParseException> {
        let token = self.advance();
        parse_word(&token.value, token.line)
    }

    // ===========================================================================
    // SCRIPT PARSING
    // ===========================================================================

    fn parse_script(&mut self) -> Result<ScriptNode, ParseException> {
        let mut statements = Vec::new();

        loop {
            self.skip_newlines();
            if self.check(&[TokenType::Eof]) {
                break;
            }
            if !self.is_command_start() {
                return Err(ParseException::unexpected(self.current()));
            }

            let statement = self.parse_statement()?;
            let background = statement.background;
            statements.push(statement);

            if self.check(&[TokenType::Semicolon, TokenType::Newline]) {
                self.advance();
            } else if !background && !self.check(&[TokenType::Eof]) {
                return Err(ParseException::unexpected(self.current()));
            }
        }

        Ok(AST::script(statements))
    }

    /// Parse statements until a token that cannot start a command.
    /// Used for the bodies of compound commands.
    pub fn parse_compound_list(&mut self) -> Result<Vec<StatementNode>, ParseException> {
        let mut statements = Vec::new();

        loop {
            self.skip_newlines();
            if !self.is_command_start() {
                break;
            }

            let statement = self.parse_statement()?;
            let background = statement.background;
            statements.push(statement);

            if self.check(&[TokenType::Semicolon, TokenType::Newline]) {
                self.advance();
            } else if !background {
                break;
            }
        }

        self.skip_newlines();
        Ok(statements)
    }

    // ===========================================================================
    // STATEMENT PARSING
    // ===========================================================================

    pub fn parse_statement(&mut self) -> Result<StatementNode, ParseException> {
        let line = self.current().line;
        let mut pipelines = vec![self.parse_pipeline()?];
        let mut operators = Vec::new();

        while self.check(&[TokenType::AndAnd, TokenType::OrOr]) {
            let op = self.advance();
            operators.push(if op.token_type == TokenType::AndAnd {
                StatementOperator::And
            } else {
                StatementOperator::Or
            });
            self.skip_newlines();
            pipelines.push(self.parse_pipeline()?);
        }

        let background = if self.check(&[TokenType::Amp]) {
            self.advance();
            true
        } else {
            false
        };

        Ok(AST::statement(pipelines, operators, background, line))
    }

    // ===========================================================================
    // PIPELINE PARSING
    // ===========================================================================

    fn parse_pipeline(&mut self) -> Result<PipelineNode, ParseException> {
        let mut negated = false;
        while self.check(&[TokenType::Bang]) {
            self.advance();
            negated = !negated;
        }

        let mut commands = vec![self.parse_command()?];
        while self.check(&[TokenType::Pipe]) {
            self.advance();
            self.skip_newlines();
            commands.push(self.parse_command()?);
        }

        Ok(AST::pipeline(commands, negated))
    }

    // ===========================================================================
    // COMMAND PARSING
    // ===========================================================================

    fn parse_command(&mut self) -> Result<CommandNode, ParseException> {
        self.enter()?;
        let result = self.parse_command_inner();
        self.leave();
        result
    }

    fn parse_command_inner(&mut self) -> Result<CommandNode, ParseException> {
        if self.check(&[
            TokenType::If,
            TokenType::For,
            TokenType::While,
            TokenType::Until,
            TokenType::Case,
            TokenType::LParen,
            TokenType::LBrace,
        ]) {
            return Ok(CommandNode::Compound(self.parse_compound_command()?));
        }

        // Function definition: name () compound-command
        if self.check(&[TokenType::Name, TokenType::Word])
            && self.peek(1).token_type == TokenType::LParen
            && self.peek(2).token_type == TokenType::RParen
        {
            return self.parse_function_def();
        }

        self.parse_simple_command()
    }

    fn parse_simple_command(&mut self) -> Result<CommandNode, ParseException> {
        let line = self.current().line;
        let mut assignments = Vec::new();
        let mut name: Option<WordNode> = None;
        let mut args = Vec::new();
        let mut redirections = Vec::new();

        loop {
            if self.is_redirection() {
                redirections.push(self.parse_redirection()?);
                continue;
            }
            if name.is_none() && self.check(&[TokenType::AssignmentWord]) {
                let token = self.advance();
                assignments.push(parse_assignment(&token.value, token.line)?);
                continue;
            }
            if name.is_none() {
                if self.check(&[TokenType::Word, TokenType::Name, TokenType::Number]) {
                    name = Some(self.parse_word_token()?);
                    continue;
                }
                break;
            }
            if self.is_word() {
                args.push(self.parse_word_token()?);
                continue;
            }
            break;
        }

        if assignments.is_empty() && name.is_none() && redirections.is_empty() {
            return Err(ParseException::unexpected(self.current()));
        }

        Ok(CommandNode::Simple(SimpleCommandNode {
            assignments,
            name,
            args,
            redirections,
            line,
        }))
    }

    // ===========================================================================
    // REDIRECTIONS
    // ===========================================================================

    fn is_redirection(&self) -> bool {
        let t = self.current().token_type;
        is_redirection_token(t)
            || (t == TokenType::Number && is_redirection_token(self.peek(1).token_type))
    }

    pub(crate) fn parse_redirection(&mut self) -> Result<RedirectionNode, ParseException> {
        let fd = if self.check(&[TokenType::Number]) {
            let token = self.advance();
            let fd = token
                .value
                .parse::<i32>()
                .map_err(|_| ParseException::with_token("bad file descriptor", token.clone()))?;
            Some(fd)
        } else {
            None
        };

        let op_token = self.advance();
        let operator = match op_token.token_type {
            TokenType::Less => RedirectionOperator::Less,
            TokenType::Great => RedirectionOperator::Great,
            TokenType::DGreat => RedirectionOperator::DGreat,
            TokenType::LessAnd => RedirectionOperator::LessAnd,
            TokenType::GreatAnd => RedirectionOperator::GreatAnd,
            TokenType::LessGreat => RedirectionOperator::LessGreat,
            TokenType::Clobber => RedirectionOperator::Clobber,
            TokenType::DLess => RedirectionOperator::DLess,
            TokenType::DLessDash => RedirectionOperator::DLessDash,
            _ => return Err(ParseException::unexpected(op_token)),
        };

        if !self.is_word() {
            return Err(ParseException::unexpected(self.current()));
        }

        if matches!(
            operator,
            RedirectionOperator::DLess | RedirectionOperator::DLessDash
        ) {
            let delimiter_token = self.advance();
            let body = op_token.heredoc.clone().ok_or_else(|| {
                ParseException::with_token("here-document without body", op_token.clone())
            })?;
            let quoted = delimiter_token.quoted;
            let content = if quoted {
                AST::word(vec![AST::literal(body)])
            } else {
                parse_heredoc_body(&body, delimiter_token.line)?
            };
            return Ok(RedirectionNode {
                fd,
                operator,
                target: RedirectionTarget::HereDoc(HereDocNode {
                    delimiter: remove_quotes(&delimiter_token.value),
                    content,
                    strip_tabs: operator == RedirectionOperator::DLessDash,
                    quoted,
                }),
            });
        }

        let target = self.parse_word_token()?;
        Ok(RedirectionNode {
            fd,
            operator,
            target: RedirectionTarget::Word(target),
        })
    }

    /// Redirections trailing a compound command
    pub(crate) fn parse_optional_redirections(
        &mut self,
    ) -> Result<Vec<RedirectionNode>, ParseException> {
        let mut redirections = Vec::new();
        while self.is_redirection() {
            redirections.push(self.parse_redirection()?);
        }
        Ok(redirections)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to parse a script
pub fn parse(input: &str) -> Result<ScriptNode, ParseException> {
    Parser::new().parse(input)
}
