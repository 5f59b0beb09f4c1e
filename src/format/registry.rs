//! Formatter registry and dispatch

use std::collections::HashMap;
use std::fmt;
use std::slice;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::error::FormatResolutionError;
use crate::parser::ast::{Format, Template};
use crate::resolve::Resolver;
use crate::value::Value;

use super::default::DefaultFormatter;

/// Errors a formatter can return
#[derive(Debug, Error)]
pub enum FormatterError {
    /// The formatter rejected the value or its options
    #[error("{0}")]
    Failed(String),

    /// Rendering a nested template failed
    #[error(transparent)]
    Render(#[from] FormatResolutionError),
}

impl FormatterError {
    pub fn failed(message: impl Into<String>) -> Self {
        FormatterError::Failed(message.into())
    }
}

/// A rendering strategy for resolved values
///
/// Returning `Ok(false)` declines the value; dispatch then continues as if the
/// formatter had not been named.
pub trait Formatter: Send + Sync {
    fn format(&self, call: &mut FormatCall<'_>) -> Result<bool, FormatterError>;
}

/// Everything a formatter sees for one placeholder
pub struct FormatCall<'a> {
    /// The resolved value
    pub value: &'a Value,
    /// Text inside the parentheses of a `name(options):` head
    pub options: Option<&'a str>,
    /// The specifier, without the head when one named this formatter
    pub format: Option<&'a Template>,
    resolver: &'a Resolver<'a>,
    out: &'a mut String,
}

impl<'a> FormatCall<'a> {
    /// Plain text of the specifier; empty when there is none or it has placeholders
    pub fn hint(&self) -> String {
        match self.format {
            Some(template) if !template.has_placeholders() => template.literal_text(),
            _ => String::new(),
        }
    }

    pub fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Render `template` with `value` as its only argument, appending to the output
    pub fn render(&mut self, template: &Template, value: &Value) -> Result<(), FormatterError> {
        self.resolver
            .render_into(template, slice::from_ref(value), self.out)?;
        Ok(())
    }

    /// Render `template` with `value` as its only argument into a new string
    pub fn render_to_string(&self, template: &Template, value: &Value) -> Result<String, FormatterError> {
        Ok(self.resolver.render(template, slice::from_ref(value))?)
    }
}

/// A formatter failure, tagged with the formatter that produced it
#[derive(Debug)]
pub(crate) struct FormatterFailure {
    pub name: String,
    pub error: FormatterError,
}

/// Formatters by name, plus the default used when none is named
#[derive(Clone)]
pub struct FormatterRegistry {
    named: HashMap<String, Arc<dyn Formatter>>,
    default: Arc<dyn Formatter>,
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self {
            named: HashMap::new(),
            default: Arc::new(DefaultFormatter),
        }
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.named.keys().collect();
        names.sort();
        f.debug_struct("FormatterRegistry")
            .field("named", &names)
            .finish_non_exhaustive()
    }
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a formatter; the empty name replaces the default formatter
    pub fn add(&mut self, name: impl Into<String>, formatter: impl Formatter + 'static) {
        let name = name.into();
        if name.is_empty() {
            self.default = Arc::new(formatter);
        } else {
            self.named.insert(name, Arc::new(formatter));
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Render `value` according to a placeholder's format specifier
    ///
    /// Order: a registered formatter named by the specifier's head, then a
    /// nested template rendered against the value, then the default formatter
    /// with the whole specifier as its hint.
    pub(crate) fn dispatch(
        &self,
        resolver: &Resolver<'_>,
        format: Option<&Format>,
        value: &Value,
        out: &mut String,
    ) -> Result<(), FormatterFailure> {
        if let Some(head) = format.and_then(|f| f.head.as_ref()) {
            if let Some(formatter) = self.named.get(&head.name) {
                let mut call = FormatCall {
                    value,
                    options: head.options.as_deref(),
                    format: Some(&head.body),
                    resolver,
                    out: &mut *out,
                };
                let claimed = formatter.format(&mut call).map_err(|error| FormatterFailure {
                    name: head.name.clone(),
                    error,
                })?;
                if claimed {
                    return Ok(());
                }
                debug!(formatter = %head.name, "formatter declined, using default");
            }
        }

        if let Some(format) = format.filter(|f| f.template.has_placeholders()) {
            return resolver
                .render_into(&format.template, slice::from_ref(value), out)
                .map_err(|e| FormatterFailure {
                    name: String::new(),
                    error: FormatterError::Render(e),
                });
        }

        let mut call = FormatCall {
            value,
            options: None,
            format: format.map(|f| &f.template),
            resolver,
            out,
        };
        self.default
            .format(&mut call)
            .map(|_| ())
            .map_err(|error| FormatterFailure {
                name: "default".to_string(),
                error,
            })
    }
}
