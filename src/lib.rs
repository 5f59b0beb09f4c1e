//! smartfmt - runtime string templating over heterogeneous values
//!
//! Templates contain placeholders such as `{Numbers.Two}` or nested
//! `{Person:{First} {Last}}`. Each placeholder's dotted path is resolved
//! against the arguments through an ordered chain of value sources (typed
//! objects, key-value maps, dynamic records, lists), and the resolved value is
//! rendered by a formatter.
//!
//! # Example
//!
//! ```rust
//! use smartfmt::{format, Settings, Value};
//!
//! let numbers = Value::map([("One", 1), ("Two", 2)]);
//! let args = [Value::map([("Numbers", numbers)])];
//!
//! let out = format("Chained: {0.Numbers.One} {Numbers.Two}", &args, &Settings::default()).unwrap();
//! assert_eq!(out, "Chained: 1 2");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod parser;
pub mod resolve;
pub mod value;

pub use config::{CaseSensitivity, ErrorAction, EscapeMode, Settings, SettingsError};
pub use engine::SmartFormatter;
pub use error::{FormatError, FormatResolutionError, FormatSyntaxError, ResolutionErrorKind, Span, SyntaxErrorKind};
pub use format::{DefaultFormatter, FormatCall, Formatter, FormatterError, FormatterRegistry};
pub use parser::{parse, Placeholder, Selector, SelectorKind, Template};
pub use resolve::{CustomSource, SourceChain, SourceOutcome, ValueSource};
pub use value::{DynamicRecord, Key, Map, MemberError, Record, TypedObject, Value};

/// Render `template` against `args` with the built-in value sources and formatters
///
/// Parses on every call; use a [`SmartFormatter`] to reuse parsed templates or
/// to register custom sources and formatters.
pub fn format(template: &str, args: &[Value], settings: &Settings) -> Result<String, FormatError> {
    let formatter = SmartFormatter::with_settings(settings.clone().with_template_cache(false));
    formatter.format(template, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_literal_only() {
        let out = format("no placeholders here", &[], &Settings::default()).unwrap();
        assert_eq!(out, "no placeholders here");
    }

    #[test]
    fn test_format_reports_syntax_error() {
        let err = format("Hello {Name", &[], &Settings::default()).unwrap_err();
        let FormatError::Syntax(syntax) = err else {
            panic!("expected a syntax error");
        };
        assert_eq!(syntax.offset, 6);
        assert_eq!(syntax.kind, SyntaxErrorKind::UnclosedPlaceholder);
    }

    #[test]
    fn test_format_with_settings_from_toml() {
        let settings = Settings::from_toml_str(
            r#"
            case_sensitivity = "insensitive"
            error_action = "substitute"
            fallback_token = "?"
            "#,
        )
        .unwrap();
        let args = [Value::map([("Name", "Ada")])];
        assert_eq!(format("{name} {age}", &args, &settings).unwrap(), "Ada ?");
    }
}
