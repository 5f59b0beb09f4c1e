//! Recursive-descent parser over lexer tokens

use crate::config::EscapeMode;
use crate::error::{FormatSyntaxError, Span, SyntaxErrorKind};
use crate::parser::ast::*;
use crate::parser::lexer::{lex, Token};

/// Where literal text is being collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Top level of the template; a bare `}` is an error
    Root,
    /// Inside a format specifier; a bare `}` ends it
    Format,
}

/// Parse a template under the given escape mode
pub fn parse(input: &str, mode: EscapeMode) -> Result<Template, FormatSyntaxError> {
    let mut parser = Parser {
        source: input,
        tokens: lex(input),
        pos: 0,
        mode,
    };
    let nodes = parser.parse_nodes(Scope::Root)?;
    Ok(Template::new(nodes))
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<(Token, Span)>,
    pos: usize,
    mode: EscapeMode,
}

/// Accumulates decoded literal text and the source span it came from
#[derive(Default)]
struct LiteralBuf {
    text: String,
    span: Option<Span>,
}

impl LiteralBuf {
    fn push_str(&mut self, s: &str, span: Span) {
        self.text.push_str(s);
        self.extend(span);
    }

    fn push(&mut self, c: char, span: Span) {
        self.text.push(c);
        self.extend(span);
    }

    fn extend(&mut self, span: Span) {
        self.span = Some(match self.span.take() {
            Some(current) => current.start..span.end,
            None => span,
        });
    }

    fn flush(&mut self, nodes: &mut Vec<Node>) {
        if let Some(span) = self.span.take() {
            nodes.push(Node::Literal(Literal {
                text: std::mem::take(&mut self.text),
                span,
            }));
        }
    }
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Option<&(Token, Span)> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|(t, _)| t)
    }

    fn nth_token(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(t, _)| t)
    }

    fn bump(&mut self) -> Option<(Token, Span)> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn doubled(&self) -> bool {
        self.mode == EscapeMode::DoubledBrace
    }

    fn parse_nodes(&mut self, scope: Scope) -> Result<Vec<Node>, FormatSyntaxError> {
        let mut nodes = Vec::new();
        let mut literal = LiteralBuf::default();

        while let Some((tok, span)) = self.peek().cloned() {
            match tok {
                Token::BraceOpen if self.doubled() && self.nth_token(1) == Some(&Token::BraceOpen) => {
                    self.pos += 2;
                    literal.push('{', span.start..span.end + 1);
                }
                Token::BraceClose if self.doubled() && self.nth_token(1) == Some(&Token::BraceClose) => {
                    self.pos += 2;
                    literal.push('}', span.start..span.end + 1);
                }
                Token::BraceOpen => {
                    literal.flush(&mut nodes);
                    let placeholder = self.parse_placeholder()?;
                    nodes.push(Node::Placeholder(placeholder));
                }
                Token::BraceClose => match scope {
                    Scope::Root => {
                        return Err(FormatSyntaxError::new(SyntaxErrorKind::UnexpectedClose, span))
                    }
                    Scope::Format => break,
                },
                Token::Backslash if self.mode == EscapeMode::Backslash => {
                    self.pos += 1;
                    let (c, escape_span) = self.parse_escape(span)?;
                    literal.push(c, escape_span);
                }
                Token::Text(s) => {
                    self.pos += 1;
                    literal.push_str(&s, span);
                }
                other => {
                    self.pos += 1;
                    if let Some(c) = other.as_char() {
                        literal.push(c, span);
                    }
                }
            }
        }

        literal.flush(&mut nodes);
        Ok(nodes)
    }

    /// Decode the character after a backslash that has already been consumed
    fn parse_escape(&mut self, backslash: Span) -> Result<(char, Span), FormatSyntaxError> {
        let Some((tok, span)) = self.peek().cloned() else {
            return Err(FormatSyntaxError::new(
                SyntaxErrorKind::InvalidEscape(None),
                backslash,
            ));
        };

        if let Some(c) = tok.as_char() {
            self.pos += 1;
            return Ok((c, backslash.start..span.end));
        }

        let Token::Text(text) = tok else {
            unreachable!("every non-text token maps to a character");
        };
        let Some(first) = text.chars().next() else {
            return Err(FormatSyntaxError::new(
                SyntaxErrorKind::InvalidEscape(None),
                backslash,
            ));
        };
        let decoded = match first {
            'n' => '\n',
            't' => '\t',
            other => {
                return Err(FormatSyntaxError::new(
                    SyntaxErrorKind::InvalidEscape(Some(other)),
                    backslash.start..span.start + other.len_utf8(),
                ))
            }
        };

        // Only the first character of the text token belongs to the escape
        let split = span.start + first.len_utf8();
        if split == span.end {
            self.pos += 1;
        } else {
            self.tokens[self.pos] = (Token::Text(text[first.len_utf8()..].to_string()), split..span.end);
        }
        Ok((decoded, backslash.start..split))
    }

    fn parse_placeholder(&mut self) -> Result<Placeholder, FormatSyntaxError> {
        let Some((_, open)) = self.bump() else {
            unreachable!("parse_placeholder is only called at an opening brace");
        };
        let start = open.start;
        if !self.has_closing_brace() {
            return Err(unclosed(start));
        }

        let selectors = self.parse_selectors(start)?;

        let alignment = if self.peek_token() == Some(&Token::Comma) {
            let (_, comma) = self.bump().ok_or_else(|| unclosed(start))?;
            Some(self.parse_alignment(comma)?)
        } else {
            None
        };

        let format = if self.peek_token() == Some(&Token::Colon) {
            let (_, colon) = self.bump().ok_or_else(|| unclosed(start))?;
            let nodes = self.parse_nodes(Scope::Format)?;
            let end = self.peek().map(|(_, s)| s.start).unwrap_or(self.source.len());
            let template = Template::new(nodes);
            let head = FormatterHead::extract(&template);
            Some(Format {
                template,
                head,
                span: colon.end..end,
            })
        } else {
            None
        };

        match self.bump() {
            Some((Token::BraceClose, close)) => Ok(Placeholder {
                selectors,
                alignment,
                format,
                raw: self.source[start..close.end].to_string(),
                span: start..close.end,
            }),
            Some((tok, span)) => Err(unexpected(&tok, span)),
            None => Err(unclosed(start)),
        }
    }

    /// Whether a `}` closes the placeholder whose `{` was just consumed
    fn has_closing_brace(&self) -> bool {
        let mut depth = 0usize;
        let mut tokens = self.tokens[self.pos..].iter();
        while let Some((tok, _)) = tokens.next() {
            match tok {
                Token::Backslash if self.mode == EscapeMode::Backslash => {
                    tokens.next();
                }
                Token::BraceOpen => depth += 1,
                Token::BraceClose if depth == 0 => return true,
                Token::BraceClose => depth -= 1,
                _ => {}
            }
        }
        false
    }

    fn parse_selectors(&mut self, open: usize) -> Result<Vec<Selector>, FormatSyntaxError> {
        let mut selectors = Vec::new();

        loop {
            match self.peek().cloned() {
                Some((Token::Text(text), span)) => {
                    self.pos += 1;
                    validate_segment(&text, &span)?;
                    let leading = selectors.is_empty();
                    selectors.push(Selector::new(text, span, leading));
                }
                Some((Token::BraceClose | Token::Colon | Token::Comma, span)) => {
                    return Err(if selectors.is_empty() {
                        FormatSyntaxError::new(SyntaxErrorKind::EmptySelector, open..span.end)
                    } else {
                        FormatSyntaxError::new(SyntaxErrorKind::EmptySegment, span)
                    });
                }
                Some((Token::Dot, span)) => {
                    return Err(FormatSyntaxError::new(SyntaxErrorKind::EmptySegment, span));
                }
                Some((tok, span)) => return Err(unexpected(&tok, span)),
                None => return Err(unclosed(open)),
            }

            if self.peek_token() == Some(&Token::Dot) {
                self.pos += 1;
            } else {
                return Ok(selectors);
            }
        }
    }

    fn parse_alignment(&mut self, comma: Span) -> Result<i32, FormatSyntaxError> {
        match self.peek().cloned() {
            Some((Token::Text(text), span)) => {
                self.pos += 1;
                text.parse().map_err(|_| {
                    FormatSyntaxError::new(SyntaxErrorKind::InvalidAlignment(text.clone()), span)
                })
            }
            _ => Err(FormatSyntaxError::new(
                SyntaxErrorKind::InvalidAlignment(String::new()),
                comma,
            )),
        }
    }
}

fn validate_segment(text: &str, span: &Span) -> Result<(), FormatSyntaxError> {
    match text
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_' || c == '-'))
    {
        Some((i, c)) => {
            let offset = span.start + i;
            Err(FormatSyntaxError::new(
                SyntaxErrorKind::InvalidSelectorChar(c),
                offset..offset + c.len_utf8(),
            ))
        }
        None => Ok(()),
    }
}

fn unclosed(open: usize) -> FormatSyntaxError {
    FormatSyntaxError::at(SyntaxErrorKind::UnclosedPlaceholder, open)
}

fn unexpected(tok: &Token, span: Span) -> FormatSyntaxError {
    let c = match tok {
        Token::Text(s) => s.chars().next().unwrap_or(' '),
        other => other.as_char().unwrap_or(' '),
    };
    FormatSyntaxError::new(SyntaxErrorKind::UnexpectedChar(c), span)
}
