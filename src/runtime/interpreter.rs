//! Tree-walking interpreter
//!
//! This is the reference executor: whatever it prints is what a program means.

use tracing::debug;

use super::{Environment, Execution, RuntimeError, RuntimeErrorKind, StepCounter, Value};
use crate::ast::{BinaryOperator, Expression, ExpressionKind, Program, Statement, StatementKind};

type Result<T> = std::result::Result<T, RuntimeError>;

/// Run `program` against `env` without a step limit
pub fn run(program: &Program, env: &mut Environment) -> Execution {
    Interpreter::new(env).run(program)
}

pub struct Interpreter<'env> {
    env: &'env mut Environment,
    output: Vec<String>,
    steps: StepCounter,
}

impl<'env> Interpreter<'env> {
    pub fn new(env: &'env mut Environment) -> Self {
        Self {
            env,
            output: Vec::new(),
            steps: StepCounter::default(),
        }
    }

    /// Stop with [RuntimeErrorKind::StepLimitExceeded] after `limit` statements and loop rounds
    pub fn with_step_limit(mut self, limit: Option<u64>) -> Self {
        self.steps = StepCounter::new(limit);
        self
    }

    pub fn run(mut self, program: &Program) -> Execution {
        let outcome = self.exec_block(&program.statements);
        debug!(
            lines = self.output.len(),
            failed = outcome.is_err(),
            "interpreter finished"
        );
        Execution {
            output: self.output,
            outcome,
        }
    }

    fn tick(&mut self, stmt: &Statement) -> Result<()> {
        self.steps
            .tick()
            .map_err(|kind| RuntimeError::at(kind, stmt.span))
    }

    fn exec_block(&mut self, statements: &[Statement]) -> Result<()> {
        for stmt in statements {
            self.exec(stmt)?;
        }
        Ok(())
    }

    fn exec(&mut self, stmt: &Statement) -> Result<()> {
        self.tick(stmt)?;

        match &stmt.kind {
            StatementKind::VarDecl {
                name, init: value, ..
            }
            | StatementKind::Assign { name, value, .. } => {
                let value = self.eval(value)?;
                self.env.set(name, value);
            }
            StatementKind::While { condition, body } => {
                while self.eval(condition)?.is_truthy() {
                    self.exec_block(body)?;
                    self.tick(stmt)?;
                }
            }
            StatementKind::If {
                condition,
                then_body,
                else_body,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.exec_block(then_body)?;
                } else if let Some(else_body) = else_body {
                    self.exec_block(else_body)?;
                }
            }
            StatementKind::Print { value } => {
                let value = self.eval(value)?;
                self.output.push(value.to_string());
            }
        }

        Ok(())
    }

    fn eval(&mut self, expr: &Expression) -> Result<Value> {
        // the left spine is walked in a loop, `1 + 1 + ... + 1` must not grow the stack
        let mut pending = Vec::new();
        let mut node = expr;
        let mut value = loop {
            match &node.kind {
                ExpressionKind::Binary { op, lhs, rhs } => {
                    pending.push((*op, rhs.as_ref(), node.span));
                    node = lhs.as_ref();
                }
                ExpressionKind::Number(n) => break Value::Number(*n),
                ExpressionKind::String(s) => break Value::Str(s.clone()),
                ExpressionKind::Identifier { name, .. } => {
                    break self.env.get(name).cloned().ok_or_else(|| {
                        RuntimeError::at(RuntimeErrorKind::UnboundVariable(name.clone()), node.span)
                    })?
                }
            }
        };

        while let Some((op, rhs, span)) = pending.pop() {
            // the right operand is skipped once the left one decides the result
            value = match op {
                BinaryOperator::And if !value.is_truthy() => Value::Boolean(false),
                BinaryOperator::Or if value.is_truthy() => Value::Boolean(true),
                _ => {
                    let rhs = self.eval(rhs)?;
                    Value::apply(op, &value, &rhs).map_err(|kind| RuntimeError::at(kind, span))?
                }
            };
        }

        Ok(value)
    }
}
