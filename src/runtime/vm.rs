//! IR executor
//!
//! Runs an [ir::Program] instruction by instruction with a program counter. Temporaries live
//! in their own table, named variables in the shared [Environment].

use std::collections::HashMap;

use tracing::debug;

use super::{Environment, Execution, RuntimeError, RuntimeErrorKind, StepCounter, Value};
use crate::ir::{self, Instruction, Operand, Place};
use crate::{Label, Temp};

type Result<T> = std::result::Result<T, RuntimeError>;

/// Run `program` against `env` without a step limit
pub fn run(program: &ir::Program, env: &mut Environment) -> Execution {
    Vm::new(env).run(program)
}

pub struct Vm<'env> {
    env: &'env mut Environment,
    temps: HashMap<Temp, Value>,
    output: Vec<String>,
    steps: StepCounter,
}

impl<'env> Vm<'env> {
    pub fn new(env: &'env mut Environment) -> Self {
        Self {
            env,
            temps: HashMap::new(),
            output: Vec::new(),
            steps: StepCounter::default(),
        }
    }

    /// Stop with [RuntimeErrorKind::StepLimitExceeded] after `limit` instructions
    pub fn with_step_limit(mut self, limit: Option<u64>) -> Self {
        self.steps = StepCounter::new(limit);
        self
    }

    pub fn run(mut self, program: &ir::Program) -> Execution {
        let outcome = self.exec(&program.instructions);
        debug!(
            lines = self.output.len(),
            failed = outcome.is_err(),
            "vm finished"
        );
        Execution {
            output: self.output,
            outcome,
        }
    }

    fn exec(&mut self, instructions: &[Instruction]) -> Result<()> {
        let labels: HashMap<Label, usize> = instructions
            .iter()
            .enumerate()
            .filter_map(|(index, instruction)| match instruction {
                Instruction::Label(label) => Some((*label, index)),
                _ => None,
            })
            .collect();
        let target = |label: &Label| {
            labels
                .get(label)
                .copied()
                .ok_or(RuntimeErrorKind::UnknownLabel(*label))
        };

        let mut pc = 0;
        while let Some(instruction) = instructions.get(pc) {
            self.steps.tick()?;
            pc += 1;

            match instruction {
                Instruction::Assign { dest, src } => {
                    let value = self.read(src)?;
                    self.write(dest, value);
                }
                Instruction::BinOp { dest, op, lhs, rhs } => {
                    let lhs = self.read(lhs)?;
                    let rhs = self.read(rhs)?;
                    let value = Value::apply(*op, &lhs, &rhs)?;
                    self.temps.insert(*dest, value);
                }
                Instruction::Label(_) => {}
                Instruction::Jump(label) => pc = target(label)?,
                Instruction::JumpIfFalse { cond, target: label } => {
                    if !self.read(cond)?.is_truthy() {
                        pc = target(label)?;
                    }
                }
                Instruction::Print(value) => {
                    let value = self.read(value)?;
                    self.output.push(value.to_string());
                }
            }
        }

        Ok(())
    }

    fn read(&self, operand: &Operand) -> std::result::Result<Value, RuntimeErrorKind> {
        match operand {
            Operand::Temp(temp) => self
                .temps
                .get(temp)
                .cloned()
                .ok_or(RuntimeErrorKind::UndefinedTemporary(*temp)),
            Operand::Var(name) => self
                .env
                .get(name)
                .cloned()
                .ok_or_else(|| RuntimeErrorKind::UnboundVariable(name.clone())),
            Operand::Const(value) => Ok(value.clone()),
        }
    }

    fn write(&mut self, place: &Place, value: Value) {
        match place {
            Place::Temp(temp) => {
                self.temps.insert(*temp, value);
            }
            Place::Var(name) => self.env.set(name, value),
        }
    }
}
