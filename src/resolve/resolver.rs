//! Resolution engine: turns a parsed template and arguments into text

use tracing::debug;

use crate::config::{ErrorAction, Settings};
use crate::error::{FormatResolutionError, ResolutionErrorKind};
use crate::format::{FormatterError, FormatterFailure, FormatterRegistry};
use crate::parser::ast::{Node, Placeholder, Selector, SelectorKind, Template};
use crate::value::Value;

use super::source::{SourceChain, SourceOutcome};

/// Callback observing placeholder failures that were substituted instead of raised
pub type ErrorCallback = dyn Fn(&FormatResolutionError) + Send + Sync;

/// State for resolving one placeholder
#[derive(Debug, Clone)]
pub struct ResolutionContext<'a> {
    /// Root arguments of the current (possibly nested) template
    pub args: &'a [Value],
    /// The value narrowed so far
    pub current: Value,
    /// Index of the next selector to resolve
    pub depth: usize,
    /// Selectors resolved so far
    pub resolved: Vec<String>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(args: &'a [Value]) -> Self {
        Self {
            args,
            current: Value::Null,
            depth: 0,
            resolved: Vec::new(),
        }
    }

    /// Move to `value` after `selector` resolved
    fn advance(&mut self, selector: &Selector, value: Value) {
        self.current = value;
        self.resolved.push(selector.text.clone());
        self.depth += 1;
    }

    /// Build an error for the selector at the current depth
    fn fail(&self, placeholder: &Placeholder, selector: &str, kind: ResolutionErrorKind) -> FormatResolutionError {
        FormatResolutionError {
            kind,
            placeholder: placeholder.raw.clone(),
            span: placeholder.span.clone(),
            selector: selector.to_string(),
            depth: self.depth,
            resolved: self.resolved.clone(),
        }
    }
}

/// Read-only view of a formatter's configuration for one format call
pub struct Resolver<'e> {
    pub settings: &'e Settings,
    pub sources: &'e SourceChain,
    pub formatters: &'e FormatterRegistry,
    pub on_error: Option<&'e ErrorCallback>,
}

impl<'e> Resolver<'e> {
    /// Render `template` against `args`
    pub fn render(&self, template: &Template, args: &[Value]) -> Result<String, FormatResolutionError> {
        let mut out = String::new();
        self.render_into(template, args, &mut out)?;
        Ok(out)
    }

    /// Render `template` against `args`, appending to `out`
    pub fn render_into(
        &self,
        template: &Template,
        args: &[Value],
        out: &mut String,
    ) -> Result<(), FormatResolutionError> {
        for node in &template.nodes {
            match node {
                Node::Literal(literal) => out.push_str(&literal.text),
                Node::Placeholder(placeholder) => {
                    let mut rendered = String::new();
                    match self.render_placeholder(placeholder, args, &mut rendered) {
                        Ok(()) => out.push_str(&align(rendered, placeholder.alignment)),
                        Err(err) => self.recover(placeholder, err, out)?,
                    }
                }
            }
        }
        Ok(())
    }

    fn render_placeholder(
        &self,
        placeholder: &Placeholder,
        args: &[Value],
        out: &mut String,
    ) -> Result<(), FormatResolutionError> {
        let mut ctx = ResolutionContext::new(args);
        self.establish_root(placeholder, &mut ctx)?;

        let case = self.settings.case_sensitivity;
        for selector in &placeholder.selectors[ctx.depth..] {
            match self.sources.resolve(selector, &ctx.current, case) {
                SourceOutcome::Resolved(next) => ctx.advance(selector, next),
                SourceOutcome::NotApplicable => {
                    return Err(ctx.fail(placeholder, &selector.text, ResolutionErrorKind::NotFound))
                }
                SourceOutcome::Error(kind) => return Err(ctx.fail(placeholder, &selector.text, kind)),
            }
        }

        self.formatters
            .dispatch(self, placeholder.format.as_ref(), &ctx.current, out)
            .map_err(|failure| match failure {
                FormatterFailure {
                    error: FormatterError::Render(err),
                    ..
                } => err,
                FormatterFailure {
                    name,
                    error: FormatterError::Failed(message),
                } => ctx.fail(
                    placeholder,
                    "",
                    ResolutionErrorKind::Formatter { name, message },
                ),
            })
    }

    /// Pick the value the selector path starts from
    ///
    /// A leading argument index that is in range selects that argument. Otherwise
    /// the first selector is tried against each argument in order and the first
    /// argument it resolves against wins.
    fn establish_root(
        &self,
        placeholder: &Placeholder,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<(), FormatResolutionError> {
        let Some(first) = placeholder.selectors.first() else {
            ctx.current = ctx.args.first().cloned().unwrap_or_default();
            return Ok(());
        };

        if let SelectorKind::Positional(index) = first.kind {
            if let Some(arg) = ctx.args.get(index) {
                ctx.advance(first, arg.clone());
                return Ok(());
            }
        }

        let selector = first.as_index();
        let case = self.settings.case_sensitivity;
        for arg in ctx.args {
            match self.sources.resolve(&selector, arg, case) {
                SourceOutcome::Resolved(next) => {
                    ctx.advance(first, next);
                    return Ok(());
                }
                SourceOutcome::NotApplicable => continue,
                SourceOutcome::Error(kind) => return Err(ctx.fail(placeholder, &first.text, kind)),
            }
        }
        Err(ctx.fail(placeholder, &first.text, ResolutionErrorKind::NotFound))
    }

    /// Apply the configured error action to a failed placeholder
    fn recover(
        &self,
        placeholder: &Placeholder,
        err: FormatResolutionError,
        out: &mut String,
    ) -> Result<(), FormatResolutionError> {
        let replacement = match self.settings.error_action {
            ErrorAction::Abort => return Err(err),
            ErrorAction::Substitute => self.settings.fallback_token.as_str(),
            ErrorAction::MaintainTokens => placeholder.raw.as_str(),
        };
        debug!(placeholder = %placeholder.raw, error = %err, "placeholder failed, substituting");
        if let Some(callback) = self.on_error {
            callback(&err);
        }
        out.push_str(replacement);
        Ok(())
    }
}

/// Widest padding an alignment may request
pub const MAX_ALIGNMENT: usize = 4096;

/// Pad `text` to the alignment width; negative widths left-align
fn align(text: String, alignment: Option<i32>) -> String {
    let Some(width) = alignment else {
        return text;
    };
    let target = (width.unsigned_abs() as usize).min(MAX_ALIGNMENT);
    let len = text.chars().count();
    if len >= target {
        return text;
    }
    let padding = " ".repeat(target - len);
    if width < 0 {
        text + &padding
    } else {
        padding + &text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EscapeMode;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn render_with(settings: &Settings, template: &str, args: &[Value]) -> Result<String, FormatResolutionError> {
        let sources = SourceChain::default();
        let formatters = FormatterRegistry::default();
        let resolver = Resolver {
            settings,
            sources: &sources,
            formatters: &formatters,
            on_error: None,
        };
        let template = parse(template, settings.escape_mode).expect("Should parse");
        resolver.render(&template, args)
    }

    fn render(template: &str, args: &[Value]) -> Result<String, FormatResolutionError> {
        render_with(&Settings::default(), template, args)
    }

    #[test]
    fn test_align() {
        assert_eq!(align("ab".to_string(), Some(5)), "   ab");
        assert_eq!(align("ab".to_string(), Some(-5)), "ab   ");
        assert_eq!(align("abcdef".to_string(), Some(3)), "abcdef");
        assert_eq!(align("ab".to_string(), None), "ab");
    }

    #[test]
    fn test_align_width_is_clamped() {
        assert_eq!(align("ab".to_string(), Some(2_000_000_000)).len(), MAX_ALIGNMENT);
        assert_eq!(align("ab".to_string(), Some(i32::MIN)).len(), MAX_ALIGNMENT);
        assert!(align("ab".to_string(), Some(i32::MIN)).starts_with("ab"));
    }

    #[test]
    fn test_positional_arguments() {
        let args = [Value::from("a"), Value::from("b")];
        assert_eq!(render("{1}{0}{1}", &args).unwrap(), "bab");
    }

    #[test]
    fn test_positional_out_of_range_falls_back_to_list_index() {
        let args = [Value::from(vec!["x", "y", "z"])];
        assert_eq!(render("{2}", &args).unwrap(), "z");
    }

    #[test]
    fn test_implicit_root_searches_arguments_in_order() {
        let args = [
            Value::map([("A", "first")]),
            Value::map([("A", "second"), ("B", "only-second")]),
        ];
        assert_eq!(render("{A} {B}", &args).unwrap(), "first only-second");
    }

    #[test]
    fn test_no_arguments() {
        let err = render("{Name}", &[]).unwrap_err();
        assert_eq!(err.kind, ResolutionErrorKind::NotFound);
        assert_eq!(err.depth, 0);
    }

    #[test]
    fn test_error_carries_resolved_prefix() {
        let args = [Value::map([("Numbers", Value::map([("One", 1)]))])];
        let err = render("{0.Numbers.Four}", &args).unwrap_err();
        assert_eq!(err.selector, "Four");
        assert_eq!(err.depth, 2);
        assert_eq!(err.resolved_path(), "0.Numbers");
        assert_eq!(err.placeholder, "{0.Numbers.Four}");
    }

    #[test]
    fn test_nested_template_scopes_to_value() {
        let args = [Value::map([("Person", Value::map([("First", "Ada"), ("Last", "L")]))])];
        let settings = Settings::default().with_escape_mode(EscapeMode::Backslash);
        assert_eq!(
            render_with(&settings, "{Person:{First} {Last}!}", &args).unwrap(),
            "Ada L!"
        );
    }

    #[test]
    fn test_substitute_and_maintain_tokens() {
        let args = [Value::map([("A", 1)])];
        let settings = Settings::default().with_fallback_token("?");
        assert_eq!(render_with(&settings, "{A}-{B}", &args).unwrap(), "1-?");

        let settings = Settings::default().with_error_action(ErrorAction::MaintainTokens);
        assert_eq!(render_with(&settings, "{A}-{B.C}", &args).unwrap(), "1-{B.C}");
    }

    #[test]
    fn test_alignment_applies_to_rendered_value() {
        let args = [Value::map([("N", 7)])];
        assert_eq!(render("[{N,4}|{N,-4}|{N,3:D2}]", &args).unwrap(), "[   7|7   | 07]");
    }

    #[test]
    fn test_context_tracks_depth() {
        let args = [Value::from(1)];
        let mut ctx = ResolutionContext::new(&args);
        let selector = Selector::new("A", 0..1, true);
        ctx.advance(&selector, Value::from(2));
        assert_eq!(ctx.depth, 1);
        assert_eq!(ctx.resolved, vec!["A".to_string()]);
        assert_eq!(ctx.current.to_string(), "2");
    }
}
