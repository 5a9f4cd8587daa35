//! Lowering
//!
//! This module is responsible for lowering the checked AST down to our intermediate
//! representation ([ir]). The main interface is the [lower] function.
//!
//! Expressions are decomposed in post-order: operands first, then one BINOP into a fresh
//! temporary. Structured control flow becomes labels and jumps.

use tracing::debug;

use crate::ast::{BinaryOperator, Expression, ExpressionKind, Program, Statement, StatementKind};
use crate::ir::{self, Instruction, Operand, Place};
use crate::runtime::Value;
use crate::{Label, Temp};

/// Turn an analyzed AST into IR
pub fn lower(program: &Program) -> ir::Program {
    let mut lowerer = Lowerer::default();
    lowerer.lower_statements(&program.statements);

    debug!(instructions = lowerer.instructions.len(), "lowered program");
    ir::Program {
        instructions: lowerer.instructions,
    }
}

/// The main state during lowering
///
/// Keeps track of the next unused temporary and label, and the instructions emitted so far.
#[derive(Debug, Default)]
struct Lowerer {
    fresh_temp: Temp,
    fresh_label: Label,
    instructions: Vec<Instruction>,
}

impl Lowerer {
    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn lower_statements(&mut self, statements: &[Statement]) {
        for stmt in statements {
            self.lower_statement(stmt);
        }
    }

    fn lower_statement(&mut self, stmt: &Statement) {
        match &stmt.kind {
            StatementKind::VarDecl {
                name, init: value, ..
            }
            | StatementKind::Assign { name, value, .. } => {
                let src = self.lower_expression(value);
                self.emit(Instruction::Assign {
                    dest: Place::Var(name.clone()),
                    src,
                });
            }
            StatementKind::While { condition, body } => {
                let start = self.fresh_label();
                let end = self.fresh_label();

                self.emit(Instruction::Label(start));
                let cond = self.lower_expression(condition);
                self.emit(Instruction::JumpIfFalse { cond, target: end });
                self.lower_statements(body);
                self.emit(Instruction::Jump(start));
                self.emit(Instruction::Label(end));
            }
            StatementKind::If {
                condition,
                then_body,
                else_body,
            } => {
                let cond = self.lower_expression(condition);
                match else_body {
                    Some(else_body) => {
                        let otherwise = self.fresh_label();
                        let end = self.fresh_label();

                        self.emit(Instruction::JumpIfFalse {
                            cond,
                            target: otherwise,
                        });
                        self.lower_statements(then_body);
                        self.emit(Instruction::Jump(end));
                        self.emit(Instruction::Label(otherwise));
                        self.lower_statements(else_body);
                        self.emit(Instruction::Label(end));
                    }
                    None => {
                        let end = self.fresh_label();

                        self.emit(Instruction::JumpIfFalse { cond, target: end });
                        self.lower_statements(then_body);
                        self.emit(Instruction::Label(end));
                    }
                }
            }
            StatementKind::Print { value } => {
                let value = self.lower_expression(value);
                self.emit(Instruction::Print(value));
            }
        }
    }

    fn lower_expression(&mut self, expr: &Expression) -> Operand {
        match &expr.kind {
            ExpressionKind::Number(n) => Operand::Const(Value::Number(*n)),
            ExpressionKind::String(s) => Operand::Const(Value::Str(s.clone())),
            ExpressionKind::Identifier { name, .. } => Operand::Var(name.clone()),
            ExpressionKind::Binary {
                op: BinaryOperator::And,
                lhs,
                rhs,
            } => self.lower_and(lhs, rhs),
            ExpressionKind::Binary {
                op: BinaryOperator::Or,
                lhs,
                rhs,
            } => self.lower_or(lhs, rhs),
            ExpressionKind::Binary { .. } => self.lower_arithmetic(expr),
        }
    }

    /// A run of non-logical operators down the left spine, lowered in one loop
    fn lower_arithmetic(&mut self, expr: &Expression) -> Operand {
        let mut pending = Vec::new();
        let mut node = expr;
        while let ExpressionKind::Binary { op, lhs, rhs } = &node.kind {
            if op.is_logical() {
                break;
            }
            pending.push((*op, rhs.as_ref()));
            node = lhs.as_ref();
        }

        let mut lhs = self.lower_expression(node);
        while let Some((op, rhs)) = pending.pop() {
            let rhs = self.lower_expression(rhs);
            let dest = self.fresh_temp();
            self.emit(Instruction::BinOp { dest, op, lhs, rhs });
            lhs = Operand::Temp(dest);
        }
        lhs
    }

    /// `lhs && rhs`, the right side only runs if the left one is truthy
    fn lower_and(&mut self, lhs: &Expression, rhs: &Expression) -> Operand {
        let result = self.fresh_temp();
        let short = self.fresh_label();
        let end = self.fresh_label();

        let cond = self.lower_expression(lhs);
        self.emit(Instruction::JumpIfFalse {
            cond,
            target: short,
        });
        let cond = self.lower_expression(rhs);
        self.emit(Instruction::JumpIfFalse {
            cond,
            target: short,
        });
        self.set_bool(result, true);
        self.emit(Instruction::Jump(end));
        self.emit(Instruction::Label(short));
        self.set_bool(result, false);
        self.emit(Instruction::Label(end));

        Operand::Temp(result)
    }

    /// `lhs || rhs`, the right side only runs if the left one is falsy
    fn lower_or(&mut self, lhs: &Expression, rhs: &Expression) -> Operand {
        let result = self.fresh_temp();
        let check_rhs = self.fresh_label();
        let falsy = self.fresh_label();
        let end = self.fresh_label();

        let cond = self.lower_expression(lhs);
        self.emit(Instruction::JumpIfFalse {
            cond,
            target: check_rhs,
        });
        self.set_bool(result, true);
        self.emit(Instruction::Jump(end));
        self.emit(Instruction::Label(check_rhs));
        let cond = self.lower_expression(rhs);
        self.emit(Instruction::JumpIfFalse {
            cond,
            target: falsy,
        });
        self.set_bool(result, true);
        self.emit(Instruction::Jump(end));
        self.emit(Instruction::Label(falsy));
        self.set_bool(result, false);
        self.emit(Instruction::Label(end));

        Operand::Temp(result)
    }

    fn set_bool(&mut self, temp: Temp, value: bool) {
        self.emit(Instruction::Assign {
            dest: Place::Temp(temp),
            src: Operand::Const(Value::Boolean(value)),
        });
    }

    fn fresh_temp(&mut self) -> Temp {
        let fresh = self.fresh_temp;
        self.fresh_temp.advance();
        fresh
    }

    fn fresh_label(&mut self) -> Label {
        let fresh = self.fresh_label;
        self.fresh_label.advance();
        fresh
    }
}
