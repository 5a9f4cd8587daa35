//! Semantic analysis
//!
//! Walks the AST once, tracking declarations in a [SymbolTable], and reports every use of an
//! undeclared variable and every redeclaration within one frame. On success, identifiers and
//! assignments in the returned program carry the depth of the frame that resolved them.

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::ast::{Block, Expression, ExpressionKind, Ident, Program, Statement, StatementKind};
use crate::Span;

mod scope;

pub use scope::{Symbol, SymbolTable};

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum SemanticError {
    #[error("Variable `{name}` is not declared")]
    #[diagnostic(help("Declare it first with `var {name} = ...;`"))]
    Undeclared {
        name: Ident,

        #[label("not declared in this scope")]
        span: Span,
    },

    #[error("Variable `{name}` is already declared in this scope")]
    Redeclared {
        name: Ident,

        #[label("declared again here")]
        span: Span,

        #[label("first declared here")]
        previous: Span,
    },
}

impl SemanticError {
    pub fn span(&self) -> Span {
        match self {
            SemanticError::Undeclared { span, .. } | SemanticError::Redeclared { span, .. } => {
                *span
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub program: Program,
    pub symbols: SymbolTable,
    pub diagnostics: Vec<SemanticError>,
}

impl Analysis {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Check every name in `program`
///
/// Errors are collected over the whole walk instead of stopping at the first one.
pub fn analyze(mut program: Program) -> Analysis {
    let mut analyzer = Analyzer {
        table: SymbolTable::new(),
        diagnostics: Vec::new(),
    };
    analyzer.check_statements(&mut program.statements);

    debug!(
        symbols = analyzer.table.symbols().len(),
        errors = analyzer.diagnostics.len(),
        "semantic analysis finished"
    );

    Analysis {
        program,
        symbols: analyzer.table,
        diagnostics: analyzer.diagnostics,
    }
}

struct Analyzer {
    table: SymbolTable,
    diagnostics: Vec<SemanticError>,
}

impl Analyzer {
    fn check_block(&mut self, block: &mut Block) {
        self.table.push_frame();
        self.check_statements(block);
        self.table.pop_frame();
    }

    fn check_statements(&mut self, statements: &mut [Statement]) {
        for stmt in statements {
            match &mut stmt.kind {
                StatementKind::VarDecl {
                    name,
                    name_span,
                    init,
                } => {
                    self.check_expr(init);
                    if let Err(previous) = self.table.declare(name, *name_span) {
                        self.diagnostics.push(SemanticError::Redeclared {
                            name: name.clone(),
                            span: *name_span,
                            previous: previous.span,
                        });
                    }
                }
                StatementKind::Assign {
                    name,
                    name_span,
                    value,
                    scope,
                } => {
                    self.check_expr(value);
                    *scope = self.resolve(name, *name_span);
                }
                StatementKind::While { condition, body } => {
                    self.check_expr(condition);
                    self.check_block(body);
                }
                StatementKind::If {
                    condition,
                    then_body,
                    else_body,
                } => {
                    self.check_expr(condition);
                    self.check_block(then_body);
                    if let Some(else_body) = else_body {
                        self.check_block(else_body);
                    }
                }
                StatementKind::Print { value } => self.check_expr(value),
            }
        }
    }

    fn check_expr(&mut self, expr: &mut Expression) {
        // right operands wait on a stack while the left spine is walked
        let mut pending = Vec::new();
        let mut node = expr;
        loop {
            match &mut node.kind {
                ExpressionKind::Number(_) | ExpressionKind::String(_) => break,
                ExpressionKind::Identifier { name, scope } => {
                    *scope = self.resolve(name, node.span);
                    break;
                }
                ExpressionKind::Binary { lhs, rhs, .. } => {
                    pending.push(rhs.as_mut());
                    node = lhs.as_mut();
                }
            }
        }

        while let Some(rhs) = pending.pop() {
            self.check_expr(rhs);
        }
    }

    /// Depth of the frame holding `name`, or a diagnostic if there is none
    fn resolve(&mut self, name: &str, span: Span) -> Option<usize> {
        match self.table.resolve(name) {
            Some(symbol) => Some(symbol.depth),
            None => {
                self.diagnostics.push(SemanticError::Undeclared {
                    name: name.to_string(),
                    span,
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{parse, tokenize};

    fn check(src: &str) -> Analysis {
        analyze(parse(&tokenize(src).unwrap()).unwrap())
    }

    #[test]
    fn declared_names_resolve() {
        let analysis = check("var x = 1;\nx = x + 1;\nprint(x);");
        assert!(analysis.is_ok(), "{:?}", analysis.diagnostics);
        assert_eq!(analysis.symbols.symbols().len(), 1);
    }

    #[test]
    fn operands_are_checked_left_to_right() {
        let analysis = check("print(a + b * c - d);");
        let names: Vec<_> = analysis
            .diagnostics
            .iter()
            .map(|err| match err {
                SemanticError::Undeclared { name, .. } => name.as_str(),
                other => panic!("unexpected diagnostic {other:?}"),
            })
            .collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn undeclared_assignment() {
        let analysis = check("x = 1;");
        match analysis.diagnostics.as_slice() {
            [SemanticError::Undeclared { name, span }] => {
                assert_eq!(name, "x");
                assert_eq!((span.start.line, span.start.column), (1, 1));
            }
            other => panic!("unexpected diagnostics {other:?}"),
        }
    }

    #[test]
    fn block_variables_do_not_escape() {
        let analysis = check("var i = 0;\nwhile (i < 3) {\n  var tmp = i;\n  i = i + 1;\n}\nprint(tmp);");
        match analysis.diagnostics.as_slice() {
            [SemanticError::Undeclared { name, span }] => {
                assert_eq!(name, "tmp");
                assert_eq!(span.start.line, 6);
            }
            other => panic!("unexpected diagnostics {other:?}"),
        }

        let analysis = check("if (1) { var a = 1; } else { print(a); }");
        assert!(matches!(
            analysis.diagnostics.as_slice(),
            [SemanticError::Undeclared { name, .. }] if name == "a"
        ));
    }

    #[test]
    fn redeclaration_in_same_frame() {
        let analysis = check("var x = 1;\nvar x = 2;");
        match analysis.diagnostics.as_slice() {
            [SemanticError::Redeclared {
                name,
                span,
                previous,
            }] => {
                assert_eq!(name, "x");
                assert_eq!(span.start.line, 2);
                assert_eq!(previous.start.line, 1);
            }
            other => panic!("unexpected diagnostics {other:?}"),
        }
    }

    #[test]
    fn shadowing_in_nested_frame_is_allowed() {
        let analysis = check("var x = 1;\nif (x) { var x = 2; print(x); }");
        assert!(analysis.is_ok(), "{:?}", analysis.diagnostics);

        let depths: Vec<_> = analysis.symbols.symbols().iter().map(|s| s.depth).collect();
        assert_eq!(depths, vec![0, 1]);
    }

    #[test]
    fn initializer_cannot_see_its_own_name() {
        let analysis = check("var x = x;");
        assert!(matches!(
            analysis.diagnostics.as_slice(),
            [SemanticError::Undeclared { name, .. }] if name == "x"
        ));
    }

    #[test]
    fn errors_are_accumulated() {
        let analysis = check("a = 1;\nprint(b);\nvar c = 1;\nvar c = d;");
        assert_eq!(analysis.diagnostics.len(), 4);
    }

    #[test]
    fn resolved_names_are_annotated() {
        let analysis = check("var x = 1;\nwhile (x < 2) { var y = x; y = 3; }");
        let StatementKind::While { condition, body } = &analysis.program.statements[1].kind else {
            panic!("expected while");
        };

        let ExpressionKind::Binary { lhs, .. } = &condition.kind else {
            panic!("expected comparison");
        };
        assert_eq!(
            lhs.kind,
            ExpressionKind::Identifier {
                name: String::from("x"),
                scope: Some(0),
            }
        );
        assert!(matches!(
            body[1].kind,
            StatementKind::Assign { scope: Some(1), .. }
        ));
    }
}
