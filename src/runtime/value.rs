use std::cmp::Ordering;
use std::fmt;

use super::RuntimeErrorKind;
use crate::ast::BinaryOperator;

/// A runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Boolean(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Boolean(_) => "boolean",
        }
    }

    /// Booleans count as 0 and 1
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Str(_) => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
        }
    }

    /// Evaluate `lhs op rhs` with both operands already computed
    ///
    /// This is the single definition of operator semantics. For `&&` and `||` it only
    /// combines truthiness, skipping the right operand is up to the caller.
    pub fn apply(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        let mismatch = || RuntimeErrorKind::TypeMismatch {
            op,
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        };

        match op {
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div => {
                let (Some(l), Some(r)) = (lhs.as_number(), rhs.as_number()) else {
                    return Err(mismatch());
                };
                let n = match op {
                    BinaryOperator::Add => l + r,
                    BinaryOperator::Sub => l - r,
                    BinaryOperator::Mul => l * r,
                    _ if r == 0.0 => return Err(RuntimeErrorKind::DivisionByZero),
                    _ => l / r,
                };
                Ok(Value::Number(n))
            }
            BinaryOperator::Less
            | BinaryOperator::Greater
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterEqual => {
                let ordering = lhs.compare(rhs).ok_or_else(mismatch)?;
                let holds = match op {
                    BinaryOperator::Less => ordering == Ordering::Less,
                    BinaryOperator::Greater => ordering == Ordering::Greater,
                    BinaryOperator::LessEqual => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                Ok(Value::Boolean(holds))
            }
            BinaryOperator::Equal => Ok(Value::Boolean(lhs.loosely_equals(rhs))),
            BinaryOperator::NotEqual => Ok(Value::Boolean(!lhs.loosely_equals(rhs))),
            BinaryOperator::And => Ok(Value::Boolean(lhs.is_truthy() && rhs.is_truthy())),
            BinaryOperator::Or => Ok(Value::Boolean(lhs.is_truthy() || rhs.is_truthy())),
        }
    }

    fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
            _ => self.as_number()?.partial_cmp(&other.as_number()?),
        }
    }

    fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(l), Value::Str(r)) => l == r,
            _ => match (self.as_number(), other.as_number()) {
                (Some(l), Some(r)) => l == r,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Boolean(b) => f.write_str(if *b { "1" } else { "0" }),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
