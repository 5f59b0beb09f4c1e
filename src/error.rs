//! Error types for parsing and resolution

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in template text
pub type Span = std::ops::Range<usize>;

/// What made a template malformed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("placeholder is never closed")]
    UnclosedPlaceholder,
    #[error("unescaped '}}' has no matching '{{'")]
    UnexpectedClose,
    #[error("placeholder has an empty selector path")]
    EmptySelector,
    #[error("selector path has an empty segment")]
    EmptySegment,
    #[error("invalid character {0:?} in selector")]
    InvalidSelectorChar(char),
    #[error("unexpected {0:?} in placeholder")]
    UnexpectedChar(char),
    #[error("alignment {0:?} is not an integer")]
    InvalidAlignment(String),
    #[error("invalid escape sequence {}", describe_escape(.0))]
    InvalidEscape(Option<char>),
}

fn describe_escape(escaped: &Option<char>) -> String {
    match escaped {
        Some(c) => format!("'\\{}'", c),
        None => "'\\' at end of input".to_string(),
    }
}

/// A template could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at offset {offset}: {kind}")]
pub struct FormatSyntaxError {
    pub kind: SyntaxErrorKind,
    /// Byte offset of the offending character
    pub offset: usize,
    pub span: Span,
}

impl FormatSyntaxError {
    pub fn new(kind: SyntaxErrorKind, span: Span) -> Self {
        Self {
            kind,
            offset: span.start,
            span,
        }
    }

    /// Error pointing at the single character starting at `offset`
    pub fn at(kind: SyntaxErrorKind, offset: usize) -> Self {
        Self::new(kind, offset..offset + 1)
    }

    /// Format the error with template context using ariadne
    pub fn report(&self, template: &str, name: &str) -> String {
        render_report(template, name, self.span.clone(), &self.to_string(), &self.kind.to_string())
    }
}

/// Why a selector could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionErrorKind {
    /// No value source claimed the selector
    #[error("no value source could resolve it")]
    NotFound,
    #[error("index {index} is out of range for a list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("index {0} is negative")]
    NegativeIndex(i64),
    /// A custom source rejected a selector it owns
    #[error("{0}")]
    Source(String),
    /// A formatter failed while rendering the resolved value
    #[error("formatter '{name}' failed: {message}")]
    Formatter { name: String, message: String },
}

/// A placeholder could not be rendered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve selector '{selector}' at depth {depth} in {placeholder}: {kind}")]
pub struct FormatResolutionError {
    pub kind: ResolutionErrorKind,
    /// Source text of the placeholder
    pub placeholder: String,
    pub span: Span,
    /// The selector that failed (empty when the failure happened after resolution)
    pub selector: String,
    /// Index of the failing selector within the placeholder's path
    pub depth: usize,
    /// Selectors that resolved before the failure
    pub resolved: Vec<String>,
}

impl FormatResolutionError {
    /// Dotted path of the selectors that resolved successfully
    pub fn resolved_path(&self) -> String {
        self.resolved.join(".")
    }

    /// Format the error with template context using ariadne
    pub fn report(&self, template: &str, name: &str) -> String {
        let label = if self.resolved.is_empty() {
            self.kind.to_string()
        } else {
            format!("after '{}': {}", self.resolved_path(), self.kind)
        };
        render_report(template, name, self.span.clone(), &self.to_string(), &label)
    }
}

/// Errors that can occur during a format call
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Syntax(#[from] FormatSyntaxError),

    #[error(transparent)]
    Resolution(#[from] FormatResolutionError),
}

impl FormatError {
    /// Format the error with template context using ariadne
    pub fn report(&self, template: &str, name: &str) -> String {
        match self {
            FormatError::Syntax(e) => e.report(template, name),
            FormatError::Resolution(e) => e.report(template, name),
        }
    }
}

fn render_report(template: &str, name: &str, span: Span, message: &str, label: &str) -> String {
    let end = span.end.min(template.len()).max(span.start);
    let span = span.start.min(end)..end;

    let mut buf = Vec::new();
    let written = Report::build(ReportKind::Error, name, span.start)
        .with_config(Config::default().with_color(false))
        .with_message(message)
        .with_label(
            Label::new((name, span))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .write((name, Source::from(template)), &mut buf);

    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => message.to_string(),
    }
}
