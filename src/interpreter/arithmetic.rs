//! Arithmetic Evaluation
//!
//! Evaluates parsed `$(( ... ))` expressions over 64-bit signed integers:
//! - Basic operators (+, -, *, /, %), division truncating toward zero
//! - Comparison operators (<, <=, >, >=, ==, !=)
//! - Bitwise operators (&, |, ^, ~, <<, >>)
//! - Logical operators (&&, ||, !) with short-circuit evaluation
//! - Assignment operators (=, +=, -=, *=, /=, %=)
//! - Ternary operator (? :)
//!
//! Overflow wraps. A variable that is unset, empty or not a number reads
//! as 0.

use crate::ast::types::{ArithAssignOp, ArithBinaryOp, ArithExpr, ArithUnaryOp};
use crate::interpreter::errors::{ArithmeticError, InterpreterError};
use crate::interpreter::types::InterpreterState;
use crate::parser::arithmetic_parser::parse_arith_number;

// ============================================================================
// Binary Operators
// ============================================================================

/// Pure binary operator evaluation (the logical operators are handled by
/// the caller because they short-circuit).
fn apply_binary_op(left: i64, right: i64, operator: ArithBinaryOp) -> Result<i64, ArithmeticError> {
    let flag = |b: bool| if b { 1 } else { 0 };
    Ok(match operator {
        ArithBinaryOp::Add => left.wrapping_add(right),
        ArithBinaryOp::Sub => left.wrapping_sub(right),
        ArithBinaryOp::Mul => left.wrapping_mul(right),
        ArithBinaryOp::Div => {
            if right == 0 {
                return Err(ArithmeticError::DivisionByZero);
            }
            left.wrapping_div(right)
        }
        ArithBinaryOp::Mod => {
            if right == 0 {
                return Err(ArithmeticError::DivisionByZero);
            }
            left.wrapping_rem(right)
        }
        ArithBinaryOp::Shl => left.wrapping_shl((right & 63) as u32),
        ArithBinaryOp::Shr => left.wrapping_shr((right & 63) as u32),
        ArithBinaryOp::Lt => flag(left < right),
        ArithBinaryOp::Le => flag(left <= right),
        ArithBinaryOp::Gt => flag(left > right),
        ArithBinaryOp::Ge => flag(left >= right),
        ArithBinaryOp::Eq => flag(left == right),
        ArithBinaryOp::Ne => flag(left != right),
        ArithBinaryOp::BitAnd => left & right,
        ArithBinaryOp::BitXor => left ^ right,
        ArithBinaryOp::BitOr => left | right,
        ArithBinaryOp::LogicalAnd => flag(left != 0 && right != 0),
        ArithBinaryOp::LogicalOr => flag(left != 0 || right != 0),
    })
}

fn assign_op_to_binary(op: ArithAssignOp) -> Option<ArithBinaryOp> {
    match op {
        ArithAssignOp::Assign => None,
        ArithAssignOp::Add => Some(ArithBinaryOp::Add),
        ArithAssignOp::Sub => Some(ArithBinaryOp::Sub),
        ArithAssignOp::Mul => Some(ArithBinaryOp::Mul),
        ArithAssignOp::Div => Some(ArithBinaryOp::Div),
        ArithAssignOp::Mod => Some(ArithBinaryOp::Mod),
    }
}

// ============================================================================
// Variables
// ============================================================================

fn read_variable(state: &InterpreterState, name: &str) -> Result<i64, InterpreterError> {
    match state.var(name) {
        Some(text) => Ok(parse_arith_number(text).unwrap_or(0)),
        None if state.options.nounset => Err(InterpreterError::Unbound {
            name: name.to_string(),
        }),
        None => Ok(0),
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluate an arithmetic expression tree
pub fn evaluate_arithmetic(state: &mut InterpreterState, expr: &ArithExpr) -> Result<i64, InterpreterError> {
    match expr {
        ArithExpr::Number(n) => Ok(*n),
        ArithExpr::Variable(name) => read_variable(state, name),
        ArithExpr::Unary { op, operand } => {
            let value = evaluate_arithmetic(state, operand)?;
            Ok(match op {
                ArithUnaryOp::Plus => value,
                ArithUnaryOp::Minus => value.wrapping_neg(),
                ArithUnaryOp::Not => i64::from(value == 0),
                ArithUnaryOp::BitNot => !value,
            })
        }
        ArithExpr::Binary { op, left, right } => {
            let left = evaluate_arithmetic(state, left)?;
            match op {
                ArithBinaryOp::LogicalAnd if left == 0 => return Ok(0),
                ArithBinaryOp::LogicalOr if left != 0 => return Ok(1),
                _ => {}
            }
            let right = evaluate_arithmetic(state, right)?;
            Ok(apply_binary_op(left, right, *op)?)
        }
        ArithExpr::Ternary {
            condition,
            then_branch,
            else_branch,
        } => {
            if evaluate_arithmetic(state, condition)? != 0 {
                evaluate_arithmetic(state, then_branch)
            } else {
                evaluate_arithmetic(state, else_branch)
            }
        }
        ArithExpr::Assignment { op, name, value } => {
            let rhs = evaluate_arithmetic(state, value)?;
            let result = match assign_op_to_binary(*op) {
                None => rhs,
                Some(binary) => apply_binary_op(read_variable(state, name)?, rhs, binary)?,
            };
            state.assign(name, result.to_string())?;
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::arithmetic_parser::parse_arithmetic_expression;

    fn eval(state: &mut InterpreterState, text: &str) -> Result<i64, InterpreterError> {
        let expr = parse_arithmetic_expression(text).unwrap();
        evaluate_arithmetic(state, &expr)
    }

    #[test]
    fn test_precedence() {
        let mut state = InterpreterState::default();
        assert_eq!(eval(&mut state, "2+3*4").unwrap(), 14);
        assert_eq!(eval(&mut state, "(2+3)*4").unwrap(), 20);
        assert_eq!(eval(&mut state, "-7/2").unwrap(), -3);
        assert_eq!(eval(&mut state, "7%-3").unwrap(), 1);
    }

    #[test]
    fn test_division_by_zero() {
        let mut state = InterpreterState::default();
        assert!(matches!(
            eval(&mut state, "1/0"),
            Err(InterpreterError::Arithmetic(ArithmeticError::DivisionByZero))
        ));
        assert!(eval(&mut state, "5%0").is_err());
    }

    #[test]
    fn test_variables() {
        let mut state = InterpreterState::default();
        state.assign("x", "5").unwrap();
        state.assign("word", "abc").unwrap();
        assert_eq!(eval(&mut state, "x*2").unwrap(), 10);
        assert_eq!(eval(&mut state, "word+1").unwrap(), 1);
        assert_eq!(eval(&mut state, "missing").unwrap(), 0);
        state.assign("expr", "2+3").unwrap();
        assert_eq!(eval(&mut state, "expr*2").unwrap(), 0);

        state.options.nounset = true;
        assert!(eval(&mut state, "missing").is_err());
    }

    #[test]
    fn test_assignment_and_short_circuit() {
        let mut state = InterpreterState::default();
        assert_eq!(eval(&mut state, "y = 3").unwrap(), 3);
        assert_eq!(eval(&mut state, "y += 4").unwrap(), 7);
        assert_eq!(state.var("y"), Some("7"));

        assert_eq!(eval(&mut state, "0 && (z = 1)").unwrap(), 0);
        assert_eq!(state.var("z"), None);
        assert_eq!(eval(&mut state, "1 || 1/0").unwrap(), 1);
    }

    #[test]
    fn test_ternary_and_bitwise() {
        let mut state = InterpreterState::default();
        assert_eq!(eval(&mut state, "1 ? 10 : 20").unwrap(), 10);
        assert_eq!(eval(&mut state, "0 ? 10 : 20").unwrap(), 20);
        assert_eq!(eval(&mut state, "6 & 3 | 8 ^ 1").unwrap(), 11);
        assert_eq!(eval(&mut state, "1 << 4 >> 2").unwrap(), 4);
        assert_eq!(eval(&mut state, "~0").unwrap(), -1);
        assert_eq!(eval(&mut state, "!5").unwrap(), 0);
    }
}
