//! Parsed template tree

use crate::error::Span;

/// A parsed template: literal text interleaved with placeholders
///
/// Templates are immutable once parsed and can be shared between threads and
/// reused across format calls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub nodes: Vec<Node>,
}

impl Template {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Whether any node is a placeholder
    pub fn has_placeholders(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| matches!(n, Node::Placeholder(_)))
    }

    /// Iterate over the top-level placeholders
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Placeholder(p) => Some(p),
            Node::Literal(_) => None,
        })
    }

    /// Concatenated decoded text of the top-level literal nodes
    pub fn literal_text(&self) -> String {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Literal(l) => Some(l.text.as_str()),
                Node::Placeholder(_) => None,
            })
            .collect()
    }
}

/// One element of a template
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(Literal),
    Placeholder(Placeholder),
}

/// Literal text with escapes already decoded
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub text: String,
    pub span: Span,
}

/// A `{...}` region to resolve and render
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub selectors: Vec<Selector>,
    /// Field width; negative values left-align
    pub alignment: Option<i32>,
    pub format: Option<Format>,
    /// Source text of the whole placeholder, braces included
    pub raw: String,
    pub span: Span,
}

impl Placeholder {
    /// Dotted selector path as written
    pub fn path(&self) -> String {
        self.selectors
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// How a selector navigates from one value to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    /// Member name or mapping key
    Name,
    /// Integer in a non-leading position: a list index or integer key
    Index(i64),
    /// Non-negative integer in the leading position: an argument index
    Positional(usize),
}

/// One segment of a placeholder's dotted path
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub text: String,
    pub kind: SelectorKind,
    pub span: Span,
}

impl Selector {
    /// Classify a segment; `leading` is true for the first segment of a path
    pub fn new(text: impl Into<String>, span: Span, leading: bool) -> Self {
        let text = text.into();
        let kind = match parse_integer(&text) {
            Some(n) if leading && n >= 0 => SelectorKind::Positional(n as usize),
            Some(n) => SelectorKind::Index(n),
            None => SelectorKind::Name,
        };
        Self { text, kind, span }
    }

    /// The integer this selector denotes, if any
    pub fn index(&self) -> Option<i64> {
        match self.kind {
            SelectorKind::Index(n) => Some(n),
            SelectorKind::Positional(n) => i64::try_from(n).ok(),
            SelectorKind::Name => None,
        }
    }

    /// Reinterpret a positional selector as a list index against the implicit root
    pub fn as_index(&self) -> Selector {
        match self.kind {
            SelectorKind::Positional(n) => Selector {
                text: self.text.clone(),
                kind: SelectorKind::Index(n as i64),
                span: self.span.clone(),
            },
            _ => self.clone(),
        }
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// The part of a placeholder after `:`
#[derive(Debug, Clone, PartialEq)]
pub struct Format {
    /// Parsed specifier; plain specifiers are a single literal node
    pub template: Template,
    /// Leading `name(options):` token, if the specifier starts with one
    pub head: Option<FormatterHead>,
    pub span: Span,
}

impl Format {
    /// Decoded specifier text when it contains no placeholders
    pub fn plain_text(&self) -> Option<String> {
        if self.template.has_placeholders() {
            None
        } else {
            Some(self.template.literal_text())
        }
    }
}

/// A `name(options):` prefix naming a formatter
#[derive(Debug, Clone, PartialEq)]
pub struct FormatterHead {
    pub name: String,
    pub options: Option<String>,
    /// The specifier with the head removed
    pub body: Template,
}

impl FormatterHead {
    /// Split a formatter head off the front of a parsed specifier
    pub fn extract(template: &Template) -> Option<Self> {
        let Some(Node::Literal(first)) = template.nodes.first() else {
            return None;
        };
        let (name, options, consumed) = split_head(&first.text)?;

        let rest = &first.text[consumed..];
        let mut nodes = Vec::with_capacity(template.nodes.len());
        if !rest.is_empty() {
            let start = (first.span.start + consumed).min(first.span.end);
            nodes.push(Node::Literal(Literal {
                text: rest.to_string(),
                span: start..first.span.end,
            }));
        }
        nodes.extend(template.nodes[1..].iter().cloned());

        Some(Self {
            name: name.to_string(),
            options: options.map(str::to_string),
            body: Template::new(nodes),
        })
    }
}

/// Recognise `name:`, `name(opts)` and `name(opts):`; returns the bytes consumed
fn split_head(text: &str) -> Option<(&str, Option<&str>, usize)> {
    let name_len = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_alphabetic() || c == '_' || (i > 0 && c.is_ascii_digit())))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    if name_len == 0 {
        return None;
    }
    let name = &text[..name_len];
    let mut pos = name_len;

    let mut options = None;
    if text[pos..].starts_with('(') {
        let close = text[pos..].find(')')? + pos;
        options = Some(&text[pos + 1..close]);
        pos = close + 1;
    }

    if text[pos..].starts_with(':') {
        pos += 1;
    } else if options.is_none() {
        return None;
    }
    Some((name, options, pos))
}
