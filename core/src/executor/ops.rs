//! Operator semantics
//!
//! Short-circuit operators (`&&`, `||`, `??`) are handled by the expression
//! evaluator since their right operand is evaluated lazily.

use super::errors::{self, ErrorInfo};
use super::types::{BinaryOp, UnaryOp, Val};

fn type_error(message: String) -> Val {
    Val::Error(ErrorInfo::new(errors::TYPE_ERROR, message))
}

/// Apply an eager binary operator to two evaluated operands
pub fn binary_op(op: BinaryOp, left: &Val, right: &Val) -> Result<Val, Val> {
    match op {
        BinaryOp::Eq => Ok(Val::Bool(left == right)),
        BinaryOp::Ne => Ok(Val::Bool(left != right)),

        BinaryOp::Add => match (left, right) {
            (Val::Num(a), Val::Num(b)) => Ok(Val::Num(a + b)),
            (Val::Str(_), _) | (_, Val::Str(_)) => Ok(Val::Str(format!(
                "{}{}",
                left.display_string(),
                right.display_string()
            ))),
            _ => Err(type_error(format!(
                "Cannot add {} and {}",
                left.type_name(),
                right.type_name()
            ))),
        },

        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let (Val::Num(a), Val::Num(b)) = (left, right) else {
                return Err(type_error(format!(
                    "Arithmetic requires numbers, got {} and {}",
                    left.type_name(),
                    right.type_name()
                )));
            };
            Ok(Val::Num(match op {
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            }))
        }

        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            let ordering = match (left, right) {
                (Val::Num(a), Val::Num(b)) => a.partial_cmp(b),
                (Val::Str(a), Val::Str(b)) => Some(a.cmp(b)),
                _ => {
                    return Err(type_error(format!(
                        "Cannot compare {} with {}",
                        left.type_name(),
                        right.type_name()
                    )))
                }
            };
            // NaN compares false with everything
            let Some(ordering) = ordering else {
                return Ok(Val::Bool(false));
            };
            Ok(Val::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Lte => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }

        BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => Err(type_error(format!(
            "{:?} must be evaluated lazily",
            op
        ))),
    }
}

pub fn unary_op(op: UnaryOp, operand: &Val) -> Result<Val, Val> {
    match op {
        UnaryOp::Not => Ok(Val::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match operand {
            Val::Num(n) => Ok(Val::Num(-n)),
            other => Err(type_error(format!(
                "Cannot negate {}",
                other.type_name()
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(result: Result<Val, Val>) -> String {
        match result {
            Err(Val::Error(info)) => info.code,
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_add_concatenates_when_either_side_is_string() {
        assert_eq!(
            binary_op(BinaryOp::Add, &Val::Str("n=".into()), &Val::Num(3.0)),
            Ok(Val::Str("n=3".into()))
        );
        assert_eq!(
            binary_op(BinaryOp::Add, &Val::Bool(true), &Val::Str("!".into())),
            Ok(Val::Str("true!".into()))
        );
    }

    #[test]
    fn test_arithmetic_on_non_numbers_is_type_error() {
        assert_eq!(
            code(binary_op(BinaryOp::Sub, &Val::Str("a".into()), &Val::Num(1.0))),
            errors::TYPE_ERROR
        );
        assert_eq!(
            code(binary_op(BinaryOp::Add, &Val::Null, &Val::Num(1.0))),
            errors::TYPE_ERROR
        );
    }

    #[test]
    fn test_equality_is_structural() {
        let a = Val::List(vec![Val::Num(1.0), Val::Str("x".into())]);
        let b = Val::List(vec![Val::Num(1.0), Val::Str("x".into())]);
        assert_eq!(binary_op(BinaryOp::Eq, &a, &b), Ok(Val::Bool(true)));
        assert_eq!(
            binary_op(BinaryOp::Ne, &a, &Val::List(vec![])),
            Ok(Val::Bool(true))
        );
    }

    #[test]
    fn test_comparison() {
        assert_eq!(
            binary_op(BinaryOp::Lte, &Val::Num(2.0), &Val::Num(2.0)),
            Ok(Val::Bool(true))
        );
        assert_eq!(
            binary_op(BinaryOp::Gt, &Val::Str("b".into()), &Val::Str("a".into())),
            Ok(Val::Bool(true))
        );
        assert_eq!(
            code(binary_op(BinaryOp::Lt, &Val::Num(1.0), &Val::Null)),
            errors::TYPE_ERROR
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary_op(UnaryOp::Not, &Val::Str("".into())), Ok(Val::Bool(true)));
        assert_eq!(unary_op(UnaryOp::Neg, &Val::Num(4.0)), Ok(Val::Num(-4.0)));
        assert_eq!(code(unary_op(UnaryOp::Neg, &Val::Null)), errors::TYPE_ERROR);
    }
}
