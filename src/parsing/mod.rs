//! Parsing
//!
//! This module is responsible for turning the source code from its string form into an AST.
//! It works in two phases, both built on the [chumsky] crate:
//! - [tokenize] scans the source text and turns it into a sequence of [Token]s
//! - [parse] builds an [ast::Program] from these tokens by recursive descent
//!
//! Both phases stop at the first error. There is no recovery.

use miette::Diagnostic;
use thiserror::Error;

use chumsky::error::SimpleReason;
use chumsky::{Parser, Stream};

use crate::{ast, Span};

mod lexer;
mod parser;
mod token;

pub use token::{Keyword, Lexeme, Operator, Separator, Token, TokenKind};

use lexer::Scanned;

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum LexError {
    #[error("Unexpected character `{character}`")]
    InvalidCharacter {
        character: char,

        #[label("not the start of any token")]
        span: Span,
    },

    #[error("Unterminated string literal")]
    #[diagnostic(help("Close the string with a `\"`"))]
    UnterminatedString {
        #[label("string starts here")]
        span: Span,
    },

    #[error("{msg}")]
    Custom {
        msg: String,

        #[label("here")]
        span: Span,
    },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::InvalidCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::Custom { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum SyntaxError {
    #[error("Expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,

        #[label("here")]
        span: Span,
    },

    #[error("`{keyword}` is a reserved keyword")]
    #[diagnostic(help("`for`, `function` and `return` are reserved but not part of the language"))]
    ReservedKeyword {
        keyword: String,

        #[label("reserved")]
        span: Span,
    },

    #[error("Found an unclosed delimiter: {delimiter}")]
    #[diagnostic(help("Must be closed before: {must_close_before}"))]
    UnclosedDelimiter {
        delimiter: String,
        must_close_before: String,

        #[label("unclosed delimiter")]
        span: Span,
    },

    #[error("{msg}")]
    Custom {
        msg: String,

        #[label("here")]
        span: Span,
    },
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::UnexpectedToken { span, .. }
            | SyntaxError::ReservedKeyword { span, .. }
            | SyntaxError::UnclosedDelimiter { span, .. }
            | SyntaxError::Custom { span, .. } => *span,
        }
    }
}

/// Scan MEL source code into tokens
///
/// The returned sequence always ends with a single [TokenKind::Eof] token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let (chars, end_of_input) = lexer::spanned_chars(source);

    let scanned = lexer::lex()
        .parse(Stream::from_iter(end_of_input, chars.into_iter()))
        .map_err(|errs| match errs.into_iter().next() {
            Some(err) => match err.found() {
                Some(&character) => LexError::InvalidCharacter {
                    character,
                    span: err.span(),
                },
                None => LexError::Custom {
                    msg: String::from("Unexpected end of input"),
                    span: err.span(),
                },
            },
            None => LexError::Custom {
                msg: String::from("Failed to scan the source"),
                span: end_of_input,
            },
        })?;

    let mut tokens = Vec::with_capacity(scanned.len() + 1);
    for (item, span) in scanned {
        match item {
            Scanned::Lexeme(lexeme) => tokens.push(Token::new(lexeme, span)),
            Scanned::Invalid(character) => {
                return Err(LexError::InvalidCharacter { character, span })
            }
            Scanned::UnterminatedString => return Err(LexError::UnterminatedString { span }),
        }
    }
    tokens.push(Token::new(Lexeme::Eof, end_of_input));

    Ok(tokens)
}

/// Parse a token sequence into an AST
pub fn parse(tokens: &[Token]) -> Result<ast::Program, SyntaxError> {
    let end_of_input = tokens
        .iter()
        .find(|token| token.lexeme == Lexeme::Eof)
        .or(tokens.last())
        .map(|token| Span::marker(token.span.start))
        .unwrap_or_default();

    let stream = tokens
        .iter()
        .filter(|token| token.lexeme != Lexeme::Eof)
        .map(|token| (token.lexeme.clone(), token.span));

    parser::parser()
        .parse(Stream::from_iter(end_of_input, stream))
        .map_err(|errs| match errs.into_iter().next() {
            Some(err) => build_error(err),
            None => SyntaxError::Custom {
                msg: String::from("Failed to parse the program"),
                span: end_of_input,
            },
        })
}

/// Turn a chumsky error into our error type
fn build_error(err: parser::ParseErr) -> SyntaxError {
    let eof = String::from("end of input");

    if let Some(Lexeme::Keyword(kw)) = err.found() {
        if kw.is_reserved() {
            return SyntaxError::ReservedKeyword {
                keyword: kw.as_str().to_string(),
                span: err.span(),
            };
        }
    }

    let found = err
        .found()
        .map(|tok| format!("`{tok}`"))
        .unwrap_or_else(|| eof.clone());

    match err.reason() {
        SimpleReason::Unexpected => {
            // a label names a class of tokens, it joins the concrete ones
            let mut expected: Vec<String> = err
                .expected()
                .map(|tok| match tok {
                    Some(tok) => format!("`{tok}`"),
                    None => eof.clone(),
                })
                .chain(err.label().map(str::to_string))
                .collect();
            expected.sort();
            expected.dedup();

            let expected = match expected.len() {
                0 => String::from("something else"),
                1 => expected.remove(0),
                _ => format!("one of {}", expected.join(", ")),
            };

            SyntaxError::UnexpectedToken {
                expected,
                found,
                span: err.span(),
            }
        }
        SimpleReason::Unclosed { span, delimiter } => SyntaxError::UnclosedDelimiter {
            delimiter: delimiter.to_string(),
            must_close_before: found,
            span: *span,
        },
        SimpleReason::Custom(msg) => SyntaxError::Custom {
            msg: msg.clone(),
            span: err.span(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_text(src: &str) -> Vec<(TokenKind, String)> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|tok| (tok.kind, tok.text))
            .collect()
    }

    #[test]
    fn every_keyword_is_one_token() {
        for kw in Keyword::ALL {
            let tokens = kinds_and_text(kw.as_str());
            assert_eq!(
                tokens,
                vec![
                    (TokenKind::Keyword, kw.as_str().to_string()),
                    (TokenKind::Eof, String::new()),
                ]
            );
        }
    }

    #[test]
    fn keyword_prefix_is_an_identifier() {
        let tokens = kinds_and_text("variable iffy");
        assert_eq!(tokens[0], (TokenKind::Identifier, String::from("variable")));
        assert_eq!(tokens[1], (TokenKind::Identifier, String::from("iffy")));
    }

    #[test]
    fn two_character_operators_stay_whole() {
        for op in ["<=", ">=", "==", "!=", "&&", "||"] {
            let tokens = kinds_and_text(&format!("a {op} b"));
            assert_eq!(tokens.len(), 4, "{op} was split");
            assert_eq!(tokens[1], (TokenKind::Operator, op.to_string()));
        }
    }

    #[test]
    fn operators_without_spaces() {
        let tokens = kinds_and_text("i<=n");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Identifier, String::from("i")),
                (TokenKind::Operator, String::from("<=")),
                (TokenKind::Identifier, String::from("n")),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn numbers_share_one_kind() {
        let tokens = kinds_and_text("42 3.25");
        assert_eq!(tokens[0], (TokenKind::Number, String::from("42")));
        assert_eq!(tokens[1], (TokenKind::Number, String::from("3.25")));
    }

    #[test]
    fn strings_are_decoded() {
        let tokens = kinds_and_text(r#"print("say \"hi\"\n");"#);
        assert_eq!(tokens[2], (TokenKind::String, String::from("say \"hi\"\n")));
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        let tokens = kinds_and_text("# leading comment\nvar x = 1; # trailing\n\n# last line");
        let kinds: Vec<_> = tokens.into_iter().map(|(kind, _)| kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Number,
                TokenKind::Separator,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(kinds_and_text("  \n "), vec![(TokenKind::Eof, String::new())]);
    }

    #[test]
    fn positions_are_tracked() {
        let tokens = tokenize("var x = 1;\n  print(x);").unwrap();
        let print = &tokens[5];
        assert_eq!(print.text, "print");
        assert_eq!((print.line(), print.column()), (2, 3));

        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!((eof.line(), eof.column()), (2, 12));
    }

    #[test]
    fn invalid_character() {
        let err = tokenize("var x = 1;\nvar y = @;").unwrap_err();
        match err {
            LexError::InvalidCharacter { character, span } => {
                assert_eq!(character, '@');
                assert_eq!((span.start.line, span.start.column), (2, 9));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unterminated_string_points_at_its_start() {
        let err = tokenize("print(1);\nprint(\"oops);").unwrap_err();
        match err {
            LexError::UnterminatedString { span } => {
                assert_eq!((span.start.line, span.start.column), (2, 7));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_semicolon() {
        let tokens = tokenize("var x = 1\nprint(x);").unwrap();
        let err = parse(&tokens).unwrap_err();
        match err {
            SyntaxError::UnexpectedToken { found, span, .. } => {
                assert_eq!(found, "`print`");
                assert_eq!((span.start.line, span.start.column), (2, 1));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    fn syntax_error(src: &str) -> (String, String) {
        match parse(&tokenize(src).unwrap()).unwrap_err() {
            SyntaxError::UnexpectedToken {
                expected, found, ..
            } => (expected, found),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unclosed_parenthesis_expects_the_closing_one() {
        let (expected, found) = syntax_error("var x = (1 + 2;");
        assert!(expected.contains("`)`"), "{expected}");
        assert!(!expected.contains("expression"), "{expected}");
        assert_eq!(found, "`;`");
    }

    #[test]
    fn every_statement_start_is_expected() {
        let (expected, found) = syntax_error("var x = 1;\n}");
        for start in ["`var`", "`while`", "`if`", "`print`", "identifier"] {
            assert!(expected.contains(start), "{start} missing from {expected}");
        }
        assert_eq!(found, "`}`");
    }

    #[test]
    fn missing_operand_expects_an_expression() {
        let (expected, found) = syntax_error("print(1 + );");
        assert!(expected.contains("expression"), "{expected}");
        assert!(expected.contains("`(`"), "{expected}");
        assert_eq!(found, "`)`");
    }

    #[test]
    fn strings_may_span_lines() {
        let tokens = tokenize("print(\"first\nsecond\");").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(tokens[2].text, "first\nsecond");

        let close = &tokens[3];
        assert_eq!(close.text, ")");
        assert_eq!((close.line(), close.column()), (2, 8));
    }

    #[test]
    fn lone_pipe_and_ampersand_are_invalid() {
        for (src, bad) in [("a | b", '|'), ("a & b", '&')] {
            match tokenize(src).unwrap_err() {
                LexError::InvalidCharacter { character, span } => {
                    assert_eq!(character, bad);
                    assert_eq!(span.start.column, 3);
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn unexpected_end_of_input() {
        let tokens = tokenize("while (x < 3) {").unwrap();
        match parse(&tokens).unwrap_err() {
            SyntaxError::UnexpectedToken { found, .. } => assert_eq!(found, "end of input"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn reserved_keywords_are_rejected() {
        let tokens = tokenize("for (i < 3) { }").unwrap();
        match parse(&tokens).unwrap_err() {
            SyntaxError::ReservedKeyword { keyword, .. } => assert_eq!(keyword, "for"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn statements_and_blocks() {
        let src = r#"
var n = 3;
while (n > 0) {
    if (n == 2) { print("two"); } else { print(n); }
    n = n - 1;
}
"#;
        let program = parse(&tokenize(src).unwrap()).unwrap();
        assert_eq!(program.statements.len(), 2);

        match &program.statements[1].kind {
            ast::StatementKind::While { body, .. } => {
                assert_eq!(body.len(), 2);
                assert!(matches!(
                    &body[0].kind,
                    ast::StatementKind::If {
                        else_body: Some(_),
                        ..
                    }
                ));
            }
            other => panic!("expected while, got {other:?}"),
        }
    }

    #[test]
    fn if_without_else() {
        let program = parse(&tokenize("if (1) { print(1); }").unwrap()).unwrap();
        assert!(matches!(
            &program.statements[0].kind,
            ast::StatementKind::If { else_body: None, .. }
        ));
    }

    #[test]
    fn assignment_records_target_span() {
        let program = parse(&tokenize("\n  total = 1;").unwrap()).unwrap();
        match &program.statements[0].kind {
            ast::StatementKind::Assign { name, name_span, .. } => {
                assert_eq!(name, "total");
                assert_eq!((name_span.start.line, name_span.start.column), (2, 3));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }
}
