use std::fmt;

use crate::Span;

/// The token kinds shown to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    String,
    Operator,
    Separator,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Separator => "SEPARATOR",
            TokenKind::Eof => "EOF",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Var,
    If,
    Else,
    While,
    For,
    Print,
    Function,
    Return,
}

impl Keyword {
    pub const ALL: [Keyword; 8] = [
        Keyword::Var,
        Keyword::If,
        Keyword::Else,
        Keyword::While,
        Keyword::For,
        Keyword::Print,
        Keyword::Function,
        Keyword::Return,
    ];

    pub fn lookup(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kw| kw.as_str() == word)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Var => "var",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::For => "for",
            Keyword::Print => "print",
            Keyword::Function => "function",
            Keyword::Return => "return",
        }
    }

    /// Keywords that are reserved but have no grammar
    pub fn is_reserved(self) -> bool {
        matches!(self, Keyword::For | Keyword::Function | Keyword::Return)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    EqualEqual,
    BangEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    AndAnd,
    OrOr,
    Bang,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Assign => "=",
            Operator::EqualEqual => "==",
            Operator::BangEqual => "!=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
            Operator::AndAnd => "&&",
            Operator::OrOr => "||",
            Operator::Bang => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separator {
    ParenOpen,
    ParenClose,
    CurlyOpen,
    CurlyClose,
    Semicolon,
    Comma,
}

impl Separator {
    pub fn as_str(self) -> &'static str {
        match self {
            Separator::ParenOpen => "(",
            Separator::ParenClose => ")",
            Separator::CurlyOpen => "{",
            Separator::CurlyClose => "}",
            Separator::Semicolon => ";",
            Separator::Comma => ",",
        }
    }
}

/// What the parser consumes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lexeme {
    Keyword(Keyword),
    Ident(String),
    Number(String),
    Str(String),
    Operator(Operator),
    Separator(Separator),
    Eof,
}

impl Lexeme {
    pub fn kind(&self) -> TokenKind {
        match self {
            Lexeme::Keyword(_) => TokenKind::Keyword,
            Lexeme::Ident(_) => TokenKind::Identifier,
            Lexeme::Number(_) => TokenKind::Number,
            Lexeme::Str(_) => TokenKind::String,
            Lexeme::Operator(_) => TokenKind::Operator,
            Lexeme::Separator(_) => TokenKind::Separator,
            Lexeme::Eof => TokenKind::Eof,
        }
    }

    /// The literal text of the lexeme, strings without their quotes
    pub fn text(&self) -> &str {
        match self {
            Lexeme::Keyword(kw) => kw.as_str(),
            Lexeme::Ident(text) | Lexeme::Number(text) | Lexeme::Str(text) => text.as_str(),
            Lexeme::Operator(op) => op.as_str(),
            Lexeme::Separator(sep) => sep.as_str(),
            Lexeme::Eof => "",
        }
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lexeme::Str(text) => write!(f, "\"{text}\""),
            Lexeme::Eof => write!(f, "end of input"),
            other => f.write_str(other.text()),
        }
    }
}

/// A token as produced by [tokenize](super::tokenize)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    pub(crate) lexeme: Lexeme,
}

impl Token {
    pub(crate) fn new(lexeme: Lexeme, span: Span) -> Self {
        Self {
            kind: lexeme.kind(),
            text: lexeme.text().to_string(),
            span,
            lexeme,
        }
    }

    pub fn line(&self) -> u32 {
        self.span.start.line
    }

    pub fn column(&self) -> u32 {
        self.span.start.column
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>4}:{:<4} {:<10} {}",
            self.line(),
            self.column(),
            self.kind,
            self.lexeme
        )
    }
}
