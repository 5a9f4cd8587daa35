//! Execution
//!
//! Two executors share the [Value] model and the [Environment]:
//! - [interpreter] walks the AST and is the reference for program behavior
//! - [vm] runs the flat instruction list from [ir](crate::ir)
//!
//! A run that fails keeps the output printed before the failure, see [Execution].

use std::collections::BTreeMap;

use miette::{Diagnostic, LabeledSpan};
use thiserror::Error;

use crate::ast::{BinaryOperator, Ident};
use crate::{Label, Span, Temp};

pub mod interpreter;
mod value;
pub mod vm;

pub use value::Value;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeErrorKind {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Operator `{op}` cannot be applied to a {lhs} and a {rhs}")]
    TypeMismatch {
        op: BinaryOperator,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("Variable `{0}` has no value")]
    UnboundVariable(Ident),

    #[error("Execution stopped after {0} steps")]
    StepLimitExceeded(u64),

    #[error("Temporary {0} is read before it is written")]
    UndefinedTemporary(Temp),

    #[error("Jump to unknown label {0}")]
    UnknownLabel(Label),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    /// Where in the source the failing expression is, if known
    pub span: Option<Span>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind) -> Self {
        Self { kind, span: None }
    }

    pub fn at(kind: RuntimeErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: Some(span),
        }
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        Self::new(kind)
    }
}

impl Diagnostic for RuntimeError {
    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self.kind {
            RuntimeErrorKind::StepLimitExceeded(_) => {
                Some(Box::new("The program may loop forever, or needs a larger limit"))
            }
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(String::from("while evaluating this")),
            span,
        ))))
    }
}

/// The variable store of one run
///
/// There is a single store for the whole program. Block structure only matters to
/// [semantic analysis](crate::semantic).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    values: BTreeMap<Ident, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        match self.values.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.values.insert(name.to_string(), value);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ident, &Value)> {
        self.values.iter()
    }

    pub fn into_bindings(self) -> BTreeMap<Ident, Value> {
        self.values
    }
}

/// What a run produced
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// One entry per executed `print`, including those before a failure
    pub output: Vec<String>,
    pub outcome: Result<(), RuntimeError>,
}

/// Counts executed steps against an optional limit
#[derive(Debug, Clone, Copy, Default)]
struct StepCounter {
    limit: Option<u64>,
    taken: u64,
}

impl StepCounter {
    fn new(limit: Option<u64>) -> Self {
        Self { limit, taken: 0 }
    }

    fn tick(&mut self) -> Result<(), RuntimeErrorKind> {
        self.taken += 1;
        match self.limit {
            Some(limit) if self.taken > limit => Err(RuntimeErrorKind::StepLimitExceeded(limit)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites() {
        let mut env = Environment::new();
        env.set("x", Value::Number(1.0));
        env.set("x", Value::from("one"));
        assert_eq!(env.get("x"), Some(&Value::from("one")));
        assert_eq!(env.iter().count(), 1);
    }

    #[test]
    fn step_counter_allows_exactly_limit() {
        let mut steps = StepCounter::new(Some(2));
        assert!(steps.tick().is_ok());
        assert!(steps.tick().is_ok());
        assert_eq!(steps.tick(), Err(RuntimeErrorKind::StepLimitExceeded(2)));

        let mut unlimited = StepCounter::new(None);
        assert!((0..10_000).all(|_| unlimited.tick().is_ok()));
    }

    #[test]
    fn runtime_error_labels_its_span() {
        let err = RuntimeError::at(RuntimeErrorKind::DivisionByZero, Span::default());
        assert_eq!(err.to_string(), "Division by zero");
        assert_eq!(err.labels().map(|labels| labels.count()), Some(1));
        assert!(RuntimeError::new(RuntimeErrorKind::DivisionByZero).labels().is_none());
    }
}
