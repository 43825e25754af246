//! Compound Command Parser
//!
//! Handles if, for, while, until, case, subshells, brace groups and
//! function definitions.

use crate::ast::types::{
    CaseItemNode, CaseNode, CommandNode, CompoundCommandNode, ForNode, FunctionDefNode, GroupNode,
    IfClause, IfNode, StatementNode, SubshellNode, UntilNode, WhileNode,
};
use crate::parser::lexer::{is_valid_name, TokenType};
use crate::parser::parser::Parser;
use crate::parser::types::ParseException;

impl Parser {
    pub(crate) fn parse_compound_command(&mut self) -> Result<CompoundCommandNode, ParseException> {
        let token = self.current();
        match token.token_type {
            TokenType::If => self.parse_if(),
            TokenType::For => self.parse_for(),
            TokenType::While => self.parse_while(),
            TokenType::Until => self.parse_until(),
            TokenType::Case => self.parse_case(),
            TokenType::LParen => self.parse_subshell(),
            TokenType::LBrace => self.parse_group(),
            _ => Err(ParseException::unexpected(token)),
        }
    }

    /// A compound list that must hold at least one command
    fn parse_required_list(&mut self) -> Result<Vec<StatementNode>, ParseException> {
        let body = self.parse_compound_list()?;
        if body.is_empty() {
            return Err(ParseException::unexpected(self.current()));
        }
        Ok(body)
    }

    // ===========================================================================
    // IF
    // ===========================================================================

    fn parse_if(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::If)?;
        let mut clauses = Vec::new();

        let condition = self.parse_required_list()?;
        self.expect(TokenType::Then)?;
        let body = self.parse_required_list()?;
        clauses.push(IfClause { condition, body });

        while self.check(&[TokenType::Elif]) {
            self.advance();
            let condition = self.parse_required_list()?;
            self.expect(TokenType::Then)?;
            let body = self.parse_required_list()?;
            clauses.push(IfClause { condition, body });
        }

        let else_body = if self.check(&[TokenType::Else]) {
            self.advance();
            Some(self.parse_required_list()?)
        } else {
            None
        };

        self.expect(TokenType::Fi)?;
        let redirections = self.parse_optional_redirections()?;

        Ok(CompoundCommandNode::If(IfNode {
            clauses,
            else_body,
            redirections,
        }))
    }

    // ===========================================================================
    // LOOPS
    // ===========================================================================

    fn parse_for(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::For)?;

        let var_token = self.current();
        if !self.is_word() || !is_valid_name(&var_token.value) {
            return Err(ParseException::with_token(
                format!("syntax error: `{}': not a valid identifier", var_token.value),
                var_token,
            ));
        }
        self.advance();

        self.skip_newlines();
        let words = if self.check(&[TokenType::In]) {
            self.advance();
            let mut words = Vec::new();
            while self.is_word() && !self.check(&[TokenType::Do]) {
                words.push(self.parse_word_token()?);
            }
            if self.check(&[TokenType::Semicolon, TokenType::Newline]) {
                self.advance();
            } else if !self.check(&[TokenType::Do]) {
                return Err(ParseException::unexpected(self.current()));
            }
            Some(words)
        } else {
            if self.check(&[TokenType::Semicolon]) {
                self.advance();
            }
            None
        };

        self.skip_newlines();
        let body = self.parse_do_group()?;
        let redirections = self.parse_optional_redirections()?;

        Ok(CompoundCommandNode::For(ForNode {
            variable: var_token.value,
            words,
            body,
            redirections,
        }))
    }

    fn parse_while(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::While)?;
        let condition = self.parse_required_list()?;
        let body = self.parse_do_group()?;
        let redirections = self.parse_optional_redirections()?;

        Ok(CompoundCommandNode::While(WhileNode {
            condition,
            body,
            redirections,
        }))
    }

    fn parse_until(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::Until)?;
        let condition = self.parse_required_list()?;
        let body = self.parse_do_group()?;
        let redirections = self.parse_optional_redirections()?;

        Ok(CompoundCommandNode::Until(UntilNode {
            condition,
            body,
            redirections,
        }))
    }

    /// do LIST done
    fn parse_do_group(&mut self) -> Result<Vec<StatementNode>, ParseException> {
        self.expect(TokenType::Do)?;
        let body = self.parse_required_list()?;
        self.expect(TokenType::Done)?;
        Ok(body)
    }

    // ===========================================================================
    // CASE
    // ===========================================================================

    fn parse_case(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::Case)?;

        if !self.is_word() {
            return Err(ParseException::unexpected(self.current()));
        }
        let word = self.parse_word_token()?;

        self.skip_newlines();
        self.expect(TokenType::In)?;

        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            if self.check(&[TokenType::Esac]) {
                break;
            }

            if self.check(&[TokenType::LParen]) {
                self.advance();
            }

            let mut patterns = Vec::new();
            loop {
                if !self.is_word() {
                    return Err(ParseException::unexpected(self.current()));
                }
                patterns.push(self.parse_word_token()?);
                if self.check(&[TokenType::Pipe]) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect(TokenType::RParen)?;

            let body = self.parse_compound_list()?;
            items.push(CaseItemNode { patterns, body });

            if self.check(&[TokenType::DSemi]) {
                self.advance();
            } else if !self.check(&[TokenType::Esac]) {
                return Err(ParseException::unexpected(self.current()));
            }
        }

        self.expect(TokenType::Esac)?;
        let redirections = self.parse_optional_redirections()?;

        Ok(CompoundCommandNode::Case(CaseNode {
            word,
            items,
            redirections,
        }))
    }

    // ===========================================================================
    // GROUPING
    // ===========================================================================

    fn parse_subshell(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::LParen)?;
        let body = self.parse_required_list()?;
        self.expect(TokenType::RParen)?;
        let redirections = self.parse_optional_redirections()?;

        Ok(CompoundCommandNode::Subshell(SubshellNode { body, redirections }))
    }

    fn parse_group(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::LBrace)?;
        let body = self.parse_required_list()?;
        self.expect(TokenType::RBrace)?;
        let redirections = self.parse_optional_redirections()?;

        Ok(CompoundCommandNode::Group(GroupNode { body, redirections }))
    }

    // ===========================================================================
    // FUNCTIONS
    // ===========================================================================

    pub(crate) fn parse_function_def(&mut self) -> Result<CommandNode, ParseException> {
        let name_token = self.advance();
        if !is_valid_name(&name_token.value) {
            return Err(ParseException::with_token(
                format!("syntax error: `{}': not a valid identifier", name_token.value),
                name_token,
            ));
        }
        self.expect(TokenType::LParen)?;
        self.expect(TokenType::RParen)?;
        self.skip_newlines();

        if !self.check(&[
            TokenType::If,
            TokenType::For,
            TokenType::While,
            TokenType::Until,
            TokenType::Case,
            TokenType::LParen,
            TokenType::LBrace,
        ]) {
            return Err(ParseException::unexpected(self.current()));
        }
        let body = self.parse_compound_command()?;

        Ok(CommandNode::FunctionDef(FunctionDefNode {
            name: name_token.value,
            body: Box::new(body),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::types::{CommandNode, CompoundCommandNode, ScriptNode};
    use crate::parser::parser::parse;

    fn compound(script: &ScriptNode) -> &CompoundCommandNode {
        match &script.statements[0].pipelines[0].commands[0] {
            CommandNode::Compound(c) => c,
            other => panic!("expected compound command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_elif_else() {
        let script = parse("if a; then b; elif c; then d; else e; fi").unwrap();
        match compound(&script) {
            CompoundCommandNode::If(node) => {
                assert_eq!(node.clauses.len(), 2);
                assert!(node.else_body.is_some());
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_for_forms() {
        let script = parse("for x in a b c; do echo $x; done").unwrap();
        match compound(&script) {
            CompoundCommandNode::For(node) => {
                assert_eq!(node.variable, "x");
                assert_eq!(node.words.as_ref().map(|w| w.len()), Some(3));
            }
            other => panic!("expected for, got {:?}", other),
        }

        let script = parse("for x\ndo\necho $x\ndone").unwrap();
        match compound(&script) {
            CompoundCommandNode::For(node) => assert!(node.words.is_none()),
            other => panic!("expected for, got {:?}", other),
        }

        let script = parse("for x in; do echo never; done").unwrap();
        match compound(&script) {
            CompoundCommandNode::For(node) => assert_eq!(node.words, Some(vec![])),
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_while_and_until() {
        assert!(matches!(
            compound(&parse("while true; do break; done").unwrap()),
            CompoundCommandNode::While(_)
        ));
        assert!(matches!(
            compound(&parse("until false\ndo\n:\ndone >log").unwrap()),
            CompoundCommandNode::Until(_)
        ));
    }

    #[test]
    fn test_parse_case() {
        let script = parse("case $x in\n a|b) echo ab ;;\n (c) ;;\n *) echo other\nesac").unwrap();
        match compound(&script) {
            CompoundCommandNode::Case(node) => {
                assert_eq!(node.items.len(), 3);
                assert_eq!(node.items[0].patterns.len(), 2);
                assert!(node.items[1].body.is_empty());
            }
            other => panic!("expected case, got {:?}", other),
        }
        assert!(parse("case x in esac").is_ok());
    }

    #[test]
    fn test_parse_groups_with_redirections() {
        let script = parse("{ echo a; echo b; } >out").unwrap();
        match compound(&script) {
            CompoundCommandNode::Group(node) => {
                assert_eq!(node.body.len(), 2);
                assert_eq!(node.redirections.len(), 1);
            }
            other => panic!("expected group, got {:?}", other),
        }
        assert!(matches!(
            compound(&parse("(cd /tmp; pwd)").unwrap()),
            CompoundCommandNode::Subshell(_)
        ));
    }

    #[test]
    fn test_empty_bodies_are_errors() {
        assert!(parse("if true; then fi").is_err());
        assert!(parse("while true; do done").is_err());
        assert!(parse("{ }").is_err());
        assert!(parse("( )").is_err());
    }

    #[test]
    fn test_unterminated_constructs() {
        assert!(parse("if true; then echo").is_err());
        assert!(parse("for x in a; do echo").is_err());
        assert!(parse("case x in a) echo").is_err());
        assert!(parse("f() echo").is_err());
    }
}
