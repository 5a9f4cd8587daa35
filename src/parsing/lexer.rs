use chumsky::prelude::*;

use super::token::{Keyword, Lexeme, Operator, Separator};
use crate::{Position, Span};

pub(super) type LexErr = Simple<char, Span>;

/// One scanned item
///
/// The scanner itself never fails. Characters that start no token and strings that never
/// close are handed back as items so [tokenize](super::tokenize) can report them with
/// their position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Scanned {
    Lexeme(Lexeme),
    Invalid(char),
    UnterminatedString,
}

/// Attach a span to every character of `source`, plus the span marking the end of input
pub(super) fn spanned_chars(source: &str) -> (Vec<(char, Span)>, Span) {
    let mut position = Position::START;
    let mut chars = Vec::with_capacity(source.len());
    for c in source.chars() {
        let start = position;
        position.advance(c);
        chars.push((c, Span::new(start, position)));
    }
    (chars, Span::marker(position))
}

pub(super) fn lex() -> impl Parser<char, Vec<(Scanned, Span)>, Error = LexErr> {
    let frac = just('.').chain(text::digits(10));
    let number = text::digits(10)
        .chain::<char, _, _>(frac.or_not().flatten())
        .collect::<String>()
        .map(Lexeme::Number);

    let escape = just('\\').ignore_then(choice((
        just('n').to('\n'),
        just('t').to('\t'),
        any(),
    )));

    let string = just('"')
        .ignore_then(
            filter(|c: &char| *c != '"' && *c != '\\')
                .or(escape)
                .repeated()
                .collect::<String>(),
        )
        .then(just('"').or_not())
        .map(|(text, close)| match close {
            Some(_) => Scanned::Lexeme(Lexeme::Str(text)),
            None => Scanned::UnterminatedString,
        });

    // two character operators first so `<=` never splits into `<` and `=`
    let operator = choice((
        just("<=").to(Operator::LessEqual),
        just(">=").to(Operator::GreaterEqual),
        just("==").to(Operator::EqualEqual),
        just("!=").to(Operator::BangEqual),
        just("&&").to(Operator::AndAnd),
        just("||").to(Operator::OrOr),
        just('+').to(Operator::Plus),
        just('-').to(Operator::Minus),
        just('*').to(Operator::Star),
        just('/').to(Operator::Slash),
        just('=').to(Operator::Assign),
        just('<').to(Operator::Less),
        just('>').to(Operator::Greater),
        just('!').to(Operator::Bang),
    ))
    .map(Lexeme::Operator);

    let separator = choice((
        just('(').to(Separator::ParenOpen),
        just(')').to(Separator::ParenClose),
        just('{').to(Separator::CurlyOpen),
        just('}').to(Separator::CurlyClose),
        just(';').to(Separator::Semicolon),
        just(',').to(Separator::Comma),
    ))
    .map(Lexeme::Separator);

    let kw_or_ident = text::ident().map(|ident: String| match Keyword::lookup(&ident) {
        Some(kw) => Lexeme::Keyword(kw),
        None => Lexeme::Ident(ident),
    });

    let token = string
        .or(choice((number, kw_or_ident, operator, separator)).map(Scanned::Lexeme))
        .or(any().map(Scanned::Invalid));

    let comment = just('#')
        .then(filter(|c: &char| *c != '\n').repeated())
        .ignored();
    let trivia = filter(|c: &char| c.is_whitespace())
        .ignored()
        .or(comment)
        .repeated()
        .ignored();

    trivia
        .clone()
        .ignore_then(
            token
                .map_with_span(|tok, span: Span| (tok, span))
                .then_ignore(trivia)
                .repeated(),
        )
        .then_ignore(end())
}
