//! Arithmetic Expression Parser
//!
//! Parses the (already expanded) text of `$(( ... ))`:
//! - $((1 + 2 * 3))
//! - $(( (a + 1) % 4 ))
//! - $((x += 2))
//! - $((a > b ? a : b))
//!
//! Precedence, low to high: assignment, `?:`, `||`, `&&`, `|`, `^`, `&`,
//! equality, relational, shifts, `+ -`, `* / %`, unary.

use crate::ast::types::{ArithAssignOp, ArithBinaryOp, ArithExpr, ArithUnaryOp};
use crate::parser::types::ParseException;

#[derive(Debug, Clone, PartialEq)]
enum ArithToken {
    Number(i64),
    Name(String),
    Op(&'static str),
    LParen,
    RParen,
}

/// Operators, longest first
const ARITH_OPERATORS: &[&str] = &[
    "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=", "-=", "*=", "/=", "%=", "+", "-", "*",
    "/", "%", "<", ">", "=", "!", "~", "&", "|", "^", "?", ":",
];

/// Binary operator levels, loosest first
const BINARY_LEVELS: &[&[(&str, ArithBinaryOp)]] = &[
    &[("||", ArithBinaryOp::LogicalOr)],
    &[("&&", ArithBinaryOp::LogicalAnd)],
    &[("|", ArithBinaryOp::BitOr)],
    &[("^", ArithBinaryOp::BitXor)],
    &[("&", ArithBinaryOp::BitAnd)],
    &[("==", ArithBinaryOp::Eq), ("!=", ArithBinaryOp::Ne)],
    &[
        ("<", ArithBinaryOp::Lt),
        ("<=", ArithBinaryOp::Le),
        (">", ArithBinaryOp::Gt),
        (">=", ArithBinaryOp::Ge),
    ],
    &[("<<", ArithBinaryOp::Shl), (">>", ArithBinaryOp::Shr)],
    &[("+", ArithBinaryOp::Add), ("-", ArithBinaryOp::Sub)],
    &[
        ("*", ArithBinaryOp::Mul),
        ("/", ArithBinaryOp::Div),
        ("%", ArithBinaryOp::Mod),
    ],
];

const ASSIGN_OPS: &[(&str, ArithAssignOp)] = &[
    ("=", ArithAssignOp::Assign),
    ("+=", ArithAssignOp::Add),
    ("-=", ArithAssignOp::Sub),
    ("*=", ArithAssignOp::Mul),
    ("/=", ArithAssignOp::Div),
    ("%=", ArithAssignOp::Mod),
];

/// Parse an integer literal: decimal, octal with a leading `0`, or hex
/// with `0x`. Surrounding whitespace and one leading sign are accepted.
pub fn parse_arith_number(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() {
        return None;
    }
    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()? as i64
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).ok()? as i64
    } else {
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u64>().ok()? as i64
    };
    Some(if negative { value.wrapping_neg() } else { value })
}

fn syntax_error(input: &str, token: &str) -> ParseException {
    ParseException::new(
        format!(
            "{}: syntax error in expression (error token is \"{}\")",
            input.trim(),
            token
        ),
        0,
        0,
    )
}

fn tokenize_arith(input: &str) -> Result<Vec<ArithToken>, ParseException> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value = parse_arith_number(&text).ok_or_else(|| syntax_error(input, &text))?;
            tokens.push(ArithToken::Number(value));
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(ArithToken::Name(chars[start..i].iter().collect()));
            continue;
        }
        if c == '(' {
            tokens.push(ArithToken::LParen);
            i += 1;
            continue;
        }
        if c == ')' {
            tokens.push(ArithToken::RParen);
            i += 1;
            continue;
        }
        let op = ARITH_OPERATORS.iter().find(|op| {
            op.chars()
                .enumerate()
                .all(|(k, oc)| chars.get(i + k) == Some(&oc))
        });
        match op {
            Some(op) => {
                tokens.push(ArithToken::Op(*op));
                i += op.len();
            }
            None => {
                let rest: String = chars[i..].iter().collect();
                return Err(syntax_error(input, &rest));
            }
        }
    }
    Ok(tokens)
}

/// Parse an arithmetic expression string into an AST node.
/// An empty expression evaluates to 0.
pub fn parse_arithmetic_expression(input: &str) -> Result<ArithExpr, ParseException> {
    let tokens = tokenize_arith(input)?;
    if tokens.is_empty() {
        return Ok(ArithExpr::Number(0));
    }
    let mut parser = ArithParser {
        input,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_arith_assignment()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error_here());
    }
    Ok(expr)
}

struct ArithParser<'a> {
    input: &'a str,
    tokens: Vec<ArithToken>,
    pos: usize,
}

impl<'a> ArithParser<'a> {
    fn peek_op(&self, offset: usize) -> Option<&'static str> {
        match self.tokens.get(self.pos + offset) {
            Some(ArithToken::Op(op)) => Some(*op),
            _ => None,
        }
    }

    fn error_here(&self) -> ParseException {
        let token = match self.tokens.get(self.pos) {
            Some(ArithToken::Number(n)) => n.to_string(),
            Some(ArithToken::Name(n)) => n.clone(),
            Some(ArithToken::Op(op)) => op.to_string(),
            Some(ArithToken::LParen) => "(".to_string(),
            Some(ArithToken::RParen) => ")".to_string(),
            None => String::new(),
        };
        if token.is_empty() {
            ParseException::new(
                format!("{}: syntax error: operand expected", self.input.trim()),
                0,
                0,
            )
        } else {
            syntax_error(self.input, &token)
        }
    }

    fn parse_arith_assignment(&mut self) -> Result<ArithExpr, ParseException> {
        if let Some(ArithToken::Name(name)) = self.tokens.get(self.pos) {
            if let Some(op_text) = self.peek_op(1) {
                if let Some((_, op)) = ASSIGN_OPS.iter().find(|(text, _)| *text == op_text) {
                    let name = name.clone();
                    self.pos += 2;
                    let value = self.parse_arith_assignment()?;
                    return Ok(ArithExpr::Assignment {
                        op: *op,
                        name,
                        value: Box::new(value),
                    });
                }
            }
        }
        self.parse_arith_ternary()
    }

    fn parse_arith_ternary(&mut self) -> Result<ArithExpr, ParseException> {
        let condition = self.parse_arith_binary(0)?;
        if self.peek_op(0) != Some("?") {
            return Ok(condition);
        }
        self.pos += 1;
        let then_branch = self.parse_arith_assignment()?;
        if self.peek_op(0) != Some(":") {
            return Err(self.error_here());
        }
        self.pos += 1;
        let else_branch = self.parse_arith_ternary()?;
        Ok(ArithExpr::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_arith_binary(&mut self, level: usize) -> Result<ArithExpr, ParseException> {
        if level >= BINARY_LEVELS.len() {
            return self.parse_arith_unary();
        }
        let mut left = self.parse_arith_binary(level + 1)?;
        while let Some(op_text) = self.peek_op(0) {
            let op = match BINARY_LEVELS[level].iter().find(|(text, _)| *text == op_text) {
                Some((_, op)) => *op,
                None => break,
            };
            self.pos += 1;
            let right = self.parse_arith_binary(level + 1)?;
            left = ArithExpr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_arith_unary(&mut self) -> Result<ArithExpr, ParseException> {
        let op = match self.peek_op(0) {
            Some("+") => Some(ArithUnaryOp::Plus),
            Some("-") => Some(ArithUnaryOp::Minus),
            Some("!") => Some(ArithUnaryOp::Not),
            Some("~") => Some(ArithUnaryOp::BitNot),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                let operand = self.parse_arith_unary()?;
                Ok(ArithExpr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.parse_arith_primary(),
        }
    }

    fn parse_arith_primary(&mut self) -> Result<ArithExpr, ParseException> {
        match self.tokens.get(self.pos).cloned() {
            Some(ArithToken::Number(n)) => {
                self.pos += 1;
                Ok(ArithExpr::Number(n))
            }
            Some(ArithToken::Name(name)) => {
                self.pos += 1;
                Ok(ArithExpr::Variable(name))
            }
            Some(ArithToken::LParen) => {
                self.pos += 1;
                let inner = self.parse_arith_assignment()?;
                if self.tokens.get(self.pos) != Some(&ArithToken::RParen) {
                    return Err(self.error_here());
                }
                self.pos += 1;
                Ok(inner)
            }
            _ => Err(self.error_here()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i64) -> Box<ArithExpr> {
        Box::new(ArithExpr::Number(n))
    }

    #[test]
    fn test_precedence_mul_over_add() {
        let expr = parse_arithmetic_expression("2+3*4").unwrap();
        assert_eq!(
            expr,
            ArithExpr::Binary {
                op: ArithBinaryOp::Add,
                left: num(2),
                right: Box::new(ArithExpr::Binary {
                    op: ArithBinaryOp::Mul,
                    left: num(3),
                    right: num(4),
                }),
            }
        );
    }

    #[test]
    fn test_parentheses_and_left_associativity() {
        let expr = parse_arithmetic_expression(" (2+3)*4 ").unwrap();
        assert!(matches!(expr, ArithExpr::Binary { op: ArithBinaryOp::Mul, .. }));

        let expr = parse_arithmetic_expression("10-4-3").unwrap();
        match expr {
            ArithExpr::Binary { op, left, right } => {
                assert_eq!(op, ArithBinaryOp::Sub);
                assert_eq!(*right, ArithExpr::Number(3));
                assert!(matches!(*left, ArithExpr::Binary { op: ArithBinaryOp::Sub, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unary_and_variables() {
        let expr = parse_arithmetic_expression("-x").unwrap();
        assert_eq!(
            expr,
            ArithExpr::Unary {
                op: ArithUnaryOp::Minus,
                operand: Box::new(ArithExpr::Variable("x".into())),
            }
        );
    }

    #[test]
    fn test_assignment_and_ternary() {
        assert!(matches!(
            parse_arithmetic_expression("i += 2").unwrap(),
            ArithExpr::Assignment { op: ArithAssignOp::Add, .. }
        ));
        assert!(matches!(
            parse_arithmetic_expression("a > b ? a : b").unwrap(),
            ArithExpr::Ternary { .. }
        ));
    }

    #[test]
    fn test_number_formats() {
        assert_eq!(parse_arith_number("42"), Some(42));
        assert_eq!(parse_arith_number(" -7 "), Some(-7));
        assert_eq!(parse_arith_number("0x1f"), Some(31));
        assert_eq!(parse_arith_number("010"), Some(8));
        assert_eq!(parse_arith_number("abc"), None);
        assert_eq!(parse_arith_number(""), None);
    }

    #[test]
    fn test_empty_expression_is_zero() {
        assert_eq!(parse_arithmetic_expression("  ").unwrap(), ArithExpr::Number(0));
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(parse_arithmetic_expression("1 +").is_err());
        assert!(parse_arithmetic_expression("(1").is_err());
        assert!(parse_arithmetic_expression("1 2").is_err());
        assert!(parse_arithmetic_expression("3 @ 4").is_err());
        assert!(parse_arithmetic_expression("09").is_err());
    }
}
