use chumsky::prelude::*;
use chumsky::BoxedParser;

use super::token::{Keyword, Lexeme, Operator, Separator};
use crate::ast::{self, BinaryOperator, Expression, ExpressionKind, Statement, StatementKind};
use crate::Span;

pub(super) type ParseErr = Simple<Lexeme, Span>;

fn keyword(kw: Keyword) -> impl Parser<Lexeme, Lexeme, Error = ParseErr> + Clone {
    just(Lexeme::Keyword(kw))
}

fn separator(sep: Separator) -> impl Parser<Lexeme, Lexeme, Error = ParseErr> + Clone {
    just(Lexeme::Separator(sep))
}

fn operator(
    op: Operator,
    kind: BinaryOperator,
) -> impl Parser<Lexeme, BinaryOperator, Error = ParseErr> + Clone {
    just(Lexeme::Operator(op)).to(kind)
}

/// One precedence tier: `operand (op operand)*`, folded to the left
fn binary_level<'a, P, O>(operand: P, op: O) -> BoxedParser<'a, Lexeme, Expression, ParseErr>
where
    P: Parser<Lexeme, Expression, Error = ParseErr> + Clone + 'a,
    O: Parser<Lexeme, BinaryOperator, Error = ParseErr> + 'a,
{
    operand
        .clone()
        .then(op.then(operand).repeated())
        .foldl(|lhs, (op, rhs)| {
            let span = lhs.span.to(rhs.span);
            Expression {
                kind: ExpressionKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            }
        })
        .boxed()
}

pub(super) fn expression<'a>() -> impl Parser<Lexeme, Expression, Error = ParseErr> + Clone + 'a {
    recursive(|expr| {
        let number = filter_map(|span: Span, lexeme: Lexeme| match lexeme {
            Lexeme::Number(text) => text
                .parse::<f64>()
                .map(ExpressionKind::Number)
                .map_err(|_| Simple::custom(span, format!("malformed number `{text}`"))),
            other => Err(Simple::expected_input_found(span, Vec::new(), Some(other))),
        });

        let value = select! {
            Lexeme::Str(text) => ExpressionKind::String(text),
            Lexeme::Ident(name) => ExpressionKind::Identifier { name, scope: None },
        };

        let primary = number
            .or(value)
            .map_with_span(|kind, span: Span| Expression { kind, span })
            .labelled("expression")
            .or(expr.delimited_by(
                separator(Separator::ParenOpen),
                separator(Separator::ParenClose),
            ));

        let multiplicative = binary_level(
            primary,
            operator(Operator::Star, BinaryOperator::Mul)
                .or(operator(Operator::Slash, BinaryOperator::Div)),
        );

        let additive = binary_level(
            multiplicative,
            operator(Operator::Plus, BinaryOperator::Add)
                .or(operator(Operator::Minus, BinaryOperator::Sub)),
        );

        let comparison = binary_level(
            additive,
            choice((
                operator(Operator::Less, BinaryOperator::Less),
                operator(Operator::Greater, BinaryOperator::Greater),
                operator(Operator::LessEqual, BinaryOperator::LessEqual),
                operator(Operator::GreaterEqual, BinaryOperator::GreaterEqual),
            )),
        );

        let equality = binary_level(
            comparison,
            operator(Operator::EqualEqual, BinaryOperator::Equal)
                .or(operator(Operator::BangEqual, BinaryOperator::NotEqual)),
        );

        let logical_and = binary_level(equality, operator(Operator::AndAnd, BinaryOperator::And));

        binary_level(logical_and, operator(Operator::OrOr, BinaryOperator::Or))
    })
}

pub(super) fn parser<'a>() -> impl Parser<Lexeme, ast::Program, Error = ParseErr> + 'a {
    let ident = select! { Lexeme::Ident(ident) => ident }
        .labelled("identifier")
        .map_with_span(|name, span: Span| (name, span));

    let expr = expression();

    let statement = recursive(move |statement| {
        let semicolon = separator(Separator::Semicolon);
        let assign_op = just(Lexeme::Operator(Operator::Assign));

        let condition = expr.clone().delimited_by(
            separator(Separator::ParenOpen),
            separator(Separator::ParenClose),
        );

        let block = statement
            .repeated()
            .delimited_by(
                separator(Separator::CurlyOpen),
                separator(Separator::CurlyClose),
            )
            .boxed();

        let var_decl = keyword(Keyword::Var)
            .ignore_then(ident.clone())
            .then_ignore(assign_op.clone())
            .then(expr.clone())
            .then_ignore(semicolon.clone())
            .map(|((name, name_span), init)| StatementKind::VarDecl {
                name,
                name_span,
                init,
            });

        let assign = ident
            .then_ignore(assign_op)
            .then(expr.clone())
            .then_ignore(semicolon.clone())
            .map(|((name, name_span), value)| StatementKind::Assign {
                name,
                name_span,
                value,
                scope: None,
            });

        let while_loop = keyword(Keyword::While)
            .ignore_then(condition.clone())
            .then(block.clone())
            .map(|(condition, body)| StatementKind::While { condition, body });

        let if_else = keyword(Keyword::If)
            .ignore_then(condition.clone())
            .then(block.clone())
            .then(keyword(Keyword::Else).ignore_then(block).or_not())
            .map(|((condition, then_body), else_body)| StatementKind::If {
                condition,
                then_body,
                else_body,
            });

        let print = keyword(Keyword::Print)
            .ignore_then(condition)
            .then_ignore(semicolon)
            .map(|value| StatementKind::Print { value });

        choice((var_decl, assign, while_loop, if_else, print))
            .map_with_span(|kind, span: Span| Statement { kind, span })
    });

    statement
        .repeated()
        .then_ignore(end())
        .map(|statements| ast::Program { statements })
}
