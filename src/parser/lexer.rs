//! Lexer for template text using logos
//!
//! Only the characters that can carry structure get their own token. Whether a
//! brace or a backslash is an escape is decided by the parser, because the
//! answer depends on the escape mode.

use logos::Logos;

use crate::error::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("\\")]
    Backslash,

    #[regex(r"[^{}:.,\\]+", |lex| lex.slice().to_string())]
    Text(String),
}

impl Token {
    /// The character a single-character token stands for
    pub fn as_char(&self) -> Option<char> {
        match self {
            Token::BraceOpen => Some('{'),
            Token::BraceClose => Some('}'),
            Token::Colon => Some(':'),
            Token::Dot => Some('.'),
            Token::Comma => Some(','),
            Token::Backslash => Some('\\'),
            Token::Text(_) => None,
        }
    }
}

/// Lex a template into tokens with spans
///
/// Every character belongs to some token, so the stream covers the whole input.
pub fn lex(input: &str) -> Vec<(Token, Span)> {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| match tok {
            Ok(t) => (t, span),
            Err(()) => (Token::Text(input[span.clone()].to_string()), span),
        })
        .collect()
}
