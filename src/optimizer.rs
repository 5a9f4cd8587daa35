//! Optimization
//!
//! Local passes over the [ir], run in a fixed order until none of them changes anything.
//! Every pass uses [Value::apply] for arithmetic, so an optimized program prints exactly
//! what the unoptimized one prints.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::ir::{self, Instruction, Operand, Place};
use crate::runtime::Value;
use crate::Temp;

/// Upper bound on rounds of all passes
pub const MAX_ITERATIONS: usize = 16;

type Pass = fn(&mut Vec<Instruction>) -> bool;

const PASSES: [(&str, Pass); 3] = [
    ("constant folding", fold_constants as Pass),
    ("constant propagation", propagate_constants as Pass),
    ("dead code elimination", eliminate_dead_code as Pass),
];

/// Run all passes to a fixed point
pub fn optimize(program: ir::Program) -> ir::Program {
    let mut instructions = program.instructions;
    let before = instructions.len();

    let mut rounds = 0;
    while rounds < MAX_ITERATIONS {
        rounds += 1;

        let mut changed = false;
        for (name, pass) in PASSES {
            if pass(&mut instructions) {
                debug!(pass = name, round = rounds, "pass changed the program");
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    info!(
        before,
        after = instructions.len(),
        rounds,
        "optimized program"
    );
    ir::Program { instructions }
}

/// Replace a BINOP on two constants by an ASSIGN of its result
///
/// Operations that would fail at run time are left alone.
pub fn fold_constants(instructions: &mut Vec<Instruction>) -> bool {
    let mut changed = false;
    for instruction in instructions.iter_mut() {
        let folded = match instruction {
            Instruction::BinOp {
                dest,
                op,
                lhs: Operand::Const(lhs),
                rhs: Operand::Const(rhs),
            } => Value::apply(*op, lhs, rhs).ok().map(|value| Instruction::Assign {
                dest: Place::Temp(*dest),
                src: Operand::Const(value),
            }),
            _ => None,
        };

        if let Some(folded) = folded {
            *instruction = folded;
            changed = true;
        }
    }
    changed
}

/// Substitute known constants for temporaries and variables
///
/// Knowledge only flows forward through straight-line code. A label may be reached from
/// elsewhere and a jump leaves the block, so both discard everything known.
pub fn propagate_constants(instructions: &mut Vec<Instruction>) -> bool {
    let mut known: HashMap<Place, Value> = HashMap::new();
    let mut changed = false;

    for instruction in instructions.iter_mut() {
        if let Instruction::Label(_) = instruction {
            known.clear();
            continue;
        }

        for operand in instruction.sources_mut() {
            let Some(value) = operand.as_place().and_then(|place| known.get(&place)) else {
                continue;
            };
            *operand = Operand::Const(value.clone());
            changed = true;
        }

        if let Some(dest) = instruction.dest() {
            match instruction {
                Instruction::Assign {
                    src: Operand::Const(value),
                    ..
                } => {
                    known.insert(dest, value.clone());
                }
                _ => {
                    known.remove(&dest);
                }
            }
        }

        if instruction.is_branch() {
            known.clear();
        }
    }

    changed
}

/// Remove writes to temporaries that no instruction reads
pub fn eliminate_dead_code(instructions: &mut Vec<Instruction>) -> bool {
    let read: HashSet<Temp> = instructions
        .iter()
        .flat_map(Instruction::sources)
        .filter_map(|operand| match operand {
            Operand::Temp(temp) => Some(*temp),
            _ => None,
        })
        .collect();

    let before = instructions.len();
    instructions.retain(|instruction| {
        let dead = instruction
            .dest()
            .and_then(|dest| dest.as_temp())
            .is_some_and(|temp| !read.contains(&temp));
        !(dead && is_pure(instruction))
    });
    instructions.len() != before
}

/// Whether executing `instruction` can never fail
fn is_pure(instruction: &Instruction) -> bool {
    match instruction {
        Instruction::Assign { .. } => true,
        Instruction::BinOp {
            op,
            lhs: Operand::Const(lhs),
            rhs: Operand::Const(rhs),
            ..
        } => Value::apply(*op, lhs, rhs).is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOperator;
    use crate::lowering::lower;
    use crate::parsing::{parse, tokenize};
    use crate::Label;

    fn optimized(src: &str) -> String {
        optimize(lower(&parse(&tokenize(src).unwrap()).unwrap())).to_string()
    }

    fn num(n: f64) -> Operand {
        Operand::Const(Value::Number(n))
    }

    #[test]
    fn constants_fold_and_propagate() {
        assert_eq!(
            optimized("var x = 2 * 3 + 4;\nprint(x);\nprint(x - 1);"),
            "    x = 10\n    print 10\n    print 9\n"
        );
    }

    #[test]
    fn division_by_zero_is_not_folded() {
        let listing = optimized("print(5 / 0);");
        assert_eq!(listing, "    t0 = 5 / 0\n    print t0\n");
    }

    #[test]
    fn unfoldable_dead_operation_is_kept() {
        let mut instructions = vec![Instruction::BinOp {
            dest: Temp::new(0),
            op: BinaryOperator::Div,
            lhs: num(1.0),
            rhs: num(0.0),
        }];
        assert!(!eliminate_dead_code(&mut instructions));
        assert_eq!(instructions.len(), 1);
    }

    #[test]
    fn variable_writes_are_never_dead() {
        let mut instructions = vec![
            Instruction::Assign {
                dest: Place::Var(String::from("x")),
                src: num(1.0),
            },
            Instruction::Assign {
                dest: Place::Temp(Temp::new(0)),
                src: num(2.0),
            },
        ];
        assert!(eliminate_dead_code(&mut instructions));
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].dest(), Some(Place::Var(String::from("x"))));
    }

    #[test]
    fn propagation_stops_at_labels() {
        let x = || Operand::Var(String::from("x"));
        let mut instructions = vec![
            Instruction::Assign {
                dest: Place::Var(String::from("x")),
                src: num(1.0),
            },
            Instruction::Print(x()),
            Instruction::Label(Label::new(0)),
            Instruction::Print(x()),
        ];

        assert!(propagate_constants(&mut instructions));
        assert_eq!(instructions[1], Instruction::Print(num(1.0)));
        assert_eq!(instructions[3], Instruction::Print(x()));
    }

    #[test]
    fn propagation_stops_after_jumps() {
        let mut instructions = vec![
            Instruction::Assign {
                dest: Place::Var(String::from("x")),
                src: num(1.0),
            },
            Instruction::JumpIfFalse {
                cond: Operand::Var(String::from("c")),
                target: Label::new(0),
            },
            Instruction::Print(Operand::Var(String::from("x"))),
        ];

        assert!(!propagate_constants(&mut instructions));
    }

    #[test]
    fn reassignment_forgets_the_constant() {
        let mut instructions = vec![
            Instruction::Assign {
                dest: Place::Var(String::from("x")),
                src: num(1.0),
            },
            Instruction::Assign {
                dest: Place::Var(String::from("x")),
                src: Operand::Var(String::from("y")),
            },
            Instruction::Print(Operand::Var(String::from("x"))),
        ];

        assert!(!propagate_constants(&mut instructions));
        assert_eq!(
            instructions[2],
            Instruction::Print(Operand::Var(String::from("x")))
        );
    }

    #[test]
    fn loops_keep_their_variables() {
        let listing = optimized("var i = 0;\nwhile (i < 3) { i = i + 1; }\nprint(i);");
        assert!(listing.contains("t0 = i < 3"), "{listing}");
        assert!(listing.contains("t1 = i + 1"), "{listing}");
        assert!(listing.contains("print i"), "{listing}");
    }

    #[test]
    fn rounds_are_bounded() {
        // each round folds one link of the chain and propagates it into the next
        let terms = vec!["1"; 40].join(" + ");
        let program = lower(&parse(&tokenize(&format!("print({terms});")).unwrap()).unwrap());
        let binops = |program: &ir::Program| {
            program
                .instructions
                .iter()
                .filter(|instruction| matches!(instruction, Instruction::BinOp { .. }))
                .count()
        };
        assert_eq!(binops(&program), 39);

        let once = optimize(program);
        assert_eq!(binops(&once), 39 - MAX_ITERATIONS);

        let mut env = crate::runtime::Environment::new();
        let execution = crate::runtime::vm::run(&once, &mut env);
        assert_eq!(execution.output, ["40"]);

        // a second run picks up where the first one stopped
        let twice = optimize(once);
        assert_eq!(binops(&twice), 39 - 2 * MAX_ITERATIONS);
    }

    #[test]
    fn fixed_point_is_stable() {
        let once = optimize(lower(
            &parse(&tokenize("var a = 1;\nvar b = a + 2;\nprint(b * b);").unwrap()).unwrap(),
        ));
        let twice = optimize(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.to_string(), "    a = 1\n    b = 3\n    print 9\n");
    }
}
