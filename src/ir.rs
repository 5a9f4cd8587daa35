//! Intermediate representation
//!
//! A flat list of three-address instructions. Control flow is expressed only through
//! [Instruction::Label], [Instruction::Jump] and [Instruction::JumpIfFalse].

use std::fmt;

use crate::ast::{BinaryOperator, Ident};
use crate::runtime::Value;
use crate::{Label, Temp};

/// Something an instruction reads
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Temp(Temp),
    Var(Ident),
    Const(Value),
}

impl Operand {
    /// The storage location this operand reads, if it is not a constant
    pub fn as_place(&self) -> Option<Place> {
        match self {
            Operand::Temp(temp) => Some(Place::Temp(*temp)),
            Operand::Var(name) => Some(Place::Var(name.clone())),
            Operand::Const(_) => None,
        }
    }
}

impl From<Place> for Operand {
    fn from(place: Place) -> Self {
        match place {
            Place::Temp(temp) => Operand::Temp(temp),
            Place::Var(name) => Operand::Var(name),
        }
    }
}

/// Something an instruction writes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Place {
    Temp(Temp),
    Var(Ident),
}

impl Place {
    pub fn as_temp(&self) -> Option<Temp> {
        match self {
            Place::Temp(temp) => Some(*temp),
            Place::Var(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Assign,
    BinOp,
    Label,
    Jump,
    JumpIfFalse,
    Print,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Opcode::Assign => "ASSIGN",
            Opcode::BinOp => "BINOP",
            Opcode::Label => "LABEL",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfFalse => "JUMP_IF_FALSE",
            Opcode::Print => "PRINT",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Assign {
        dest: Place,
        src: Operand,
    },
    BinOp {
        dest: Temp,
        op: BinaryOperator,
        lhs: Operand,
        rhs: Operand,
    },
    Label(Label),
    Jump(Label),
    JumpIfFalse {
        cond: Operand,
        target: Label,
    },
    Print(Operand),
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Assign { .. } => Opcode::Assign,
            Instruction::BinOp { .. } => Opcode::BinOp,
            Instruction::Label(_) => Opcode::Label,
            Instruction::Jump(_) => Opcode::Jump,
            Instruction::JumpIfFalse { .. } => Opcode::JumpIfFalse,
            Instruction::Print(_) => Opcode::Print,
        }
    }

    pub fn dest(&self) -> Option<Place> {
        match self {
            Instruction::Assign { dest, .. } => Some(dest.clone()),
            Instruction::BinOp { dest, .. } => Some(Place::Temp(*dest)),
            _ => None,
        }
    }

    pub fn sources(&self) -> Vec<&Operand> {
        match self {
            Instruction::Assign { src, .. } => vec![src],
            Instruction::BinOp { lhs, rhs, .. } => vec![lhs, rhs],
            Instruction::JumpIfFalse { cond, .. } => vec![cond],
            Instruction::Print(value) => vec![value],
            Instruction::Label(_) | Instruction::Jump(_) => vec![],
        }
    }

    pub fn sources_mut(&mut self) -> Vec<&mut Operand> {
        match self {
            Instruction::Assign { src, .. } => vec![src],
            Instruction::BinOp { lhs, rhs, .. } => vec![lhs, rhs],
            Instruction::JumpIfFalse { cond, .. } => vec![cond],
            Instruction::Print(value) => vec![value],
            Instruction::Label(_) | Instruction::Jump(_) => vec![],
        }
    }

    /// Whether the instruction can change control flow
    pub fn is_branch(&self) -> bool {
        matches!(self, Instruction::Jump(_) | Instruction::JumpIfFalse { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Temp(temp) => write!(f, "{temp}"),
            Operand::Var(name) => f.write_str(name),
            Operand::Const(Value::Str(s)) => write!(f, "{s:?}"),
            Operand::Const(Value::Boolean(b)) => write!(f, "{b}"),
            Operand::Const(value) => write!(f, "{value}"),
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Temp(temp) => write!(f, "{temp}"),
            Place::Var(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Assign { dest, src } => write!(f, "{dest} = {src}"),
            Instruction::BinOp { dest, op, lhs, rhs } => write!(f, "{dest} = {lhs} {op} {rhs}"),
            Instruction::Label(label) => write!(f, "{label}:"),
            Instruction::Jump(label) => write!(f, "goto {label}"),
            Instruction::JumpIfFalse { cond, target } => write!(f, "if_false {cond} goto {target}"),
            Instruction::Print(value) => write!(f, "print {value}"),
        }
    }
}

/// One instruction per line, everything but labels indented
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            match instruction {
                Instruction::Label(_) => writeln!(f, "{instruction}")?,
                _ => writeln!(f, "    {instruction}")?,
            }
        }
        Ok(())
    }
}
