use std::borrow::Cow;
use std::{fmt, io};

use ptree::{print_tree, write_tree, Style, TreeItem};

use crate::Span;

pub type Ident = String;

pub type Block = Vec<Statement>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    VarDecl {
        name: Ident,
        name_span: Span,
        init: Expression,
    },

    /// `scope` is the depth of the frame the target resolved to, filled in by semantic analysis
    Assign {
        name: Ident,
        name_span: Span,
        value: Expression,
        scope: Option<usize>,
    },

    While {
        condition: Expression,
        body: Block,
    },

    If {
        condition: Expression,
        then_body: Block,
        else_body: Option<Block>,
    },

    Print {
        value: Expression,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Number(f64),
    String(String),

    /// `scope` is the depth of the frame the name resolved to, filled in by semantic analysis
    Identifier {
        name: Ident,
        scope: Option<usize>,
    },

    Binary {
        op: BinaryOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOperator {
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
        };
        f.write_str(symbol)
    }
}

impl Program {
    pub fn pretty_print(&self) -> io::Result<()> {
        print_tree(&Node::Block("PROGRAM", &self.statements))
    }

    /// Render the tree the way [pretty_print](Program::pretty_print) shows it
    pub fn render_tree(&self) -> io::Result<String> {
        let mut out = Vec::new();
        write_tree(&Node::Block("PROGRAM", &self.statements), &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// A borrowed view of the tree for [ptree]
#[derive(Debug, Clone)]
enum Node<'a> {
    Block(&'static str, &'a [Statement]),
    Statement(&'a Statement),
    Expression(&'a Expression),
}

impl TreeItem for Node<'_> {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, style: &Style) -> io::Result<()> {
        match self {
            Node::Block(label, _) => write!(f, "{}", style.paint(label)),
            Node::Statement(stmt) => match &stmt.kind {
                StatementKind::VarDecl { name, .. } => {
                    write!(f, "{}", style.paint(format!("VAR {name}")))
                }
                StatementKind::Assign { name, .. } => {
                    write!(f, "{}", style.paint(format!("ASSIGN {name}")))
                }
                StatementKind::While { .. } => write!(f, "{}", style.paint("WHILE")),
                StatementKind::If { .. } => write!(f, "{}", style.paint("IF")),
                StatementKind::Print { .. } => write!(f, "{}", style.paint("PRINT")),
            },
            Node::Expression(expr) => match &expr.kind {
                ExpressionKind::Number(n) => write!(f, "{}", style.paint(n)),
                ExpressionKind::String(s) => write!(f, "{}", style.paint(format!("{s:?}"))),
                ExpressionKind::Identifier { name, .. } => write!(f, "{}", style.paint(name)),
                ExpressionKind::Binary { op, .. } => write!(f, "{}", style.paint(op)),
            },
        }
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        match self {
            Node::Block(_, statements) => statements
                .iter()
                .map(Node::Statement)
                .collect::<Vec<_>>()
                .into(),
            Node::Statement(stmt) => match &stmt.kind {
                StatementKind::VarDecl { init: value, .. }
                | StatementKind::Assign { value, .. }
                | StatementKind::Print { value } => Cow::from(vec![Node::Expression(value)]),
                StatementKind::While { condition, body } => Cow::from(vec![
                    Node::Expression(condition),
                    Node::Block("DO", body.as_slice()),
                ]),
                StatementKind::If {
                    condition,
                    then_body,
                    else_body,
                } => {
                    let mut children = vec![
                        Node::Expression(condition),
                        Node::Block("THEN", then_body.as_slice()),
                    ];
                    if let Some(else_body) = else_body {
                        children.push(Node::Block("ELSE", else_body.as_slice()));
                    }
                    Cow::from(children)
                }
            },
            Node::Expression(expr) => match &expr.kind {
                ExpressionKind::Binary { lhs, rhs, .. } => {
                    Cow::from(vec![Node::Expression(lhs), Node::Expression(rhs)])
                }
                _ => Cow::from(vec![]),
            },
        }
    }
}
