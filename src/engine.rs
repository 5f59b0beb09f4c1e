//! The configured formatter

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::config::{CaseSensitivity, ErrorAction, EscapeMode, Settings};
use crate::error::{FormatError, FormatResolutionError, FormatSyntaxError};
use crate::format::{Formatter, FormatterRegistry};
use crate::parser::{self, Template};
use crate::resolve::{ErrorCallback, Resolver, SourceChain, ValueSource};
use crate::value::Value;

/// Settings, value sources and formatters bundled for repeated format calls
///
/// A `SmartFormatter` is `Sync`: concurrent `format` calls share the parsed
/// template cache. Reconfiguration takes `&mut self` and so cannot race with
/// in-flight calls.
///
/// ```
/// use smartfmt::{SmartFormatter, Value};
///
/// let formatter = SmartFormatter::new();
/// let args = [Value::map([("Name", "Ada")])];
/// assert_eq!(formatter.format("Hello {Name}", &args).unwrap(), "Hello Ada");
/// ```
pub struct SmartFormatter {
    settings: Settings,
    sources: SourceChain,
    formatters: FormatterRegistry,
    on_error: Option<Arc<ErrorCallback>>,
    cache: RwLock<HashMap<String, Arc<Template>>>,
}

impl Default for SmartFormatter {
    fn default() -> Self {
        Self::with_settings(Settings::default())
    }
}

impl fmt::Debug for SmartFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartFormatter")
            .field("settings", &self.settings)
            .field("sources", &self.sources)
            .field("formatters", &self.formatters)
            .field("on_error", &self.on_error.is_some())
            .field("cached_templates", &self.cached_templates())
            .finish()
    }
}

impl SmartFormatter {
    /// A formatter with default settings and the built-in value sources
    pub fn new() -> Self {
        Self::default()
    }

    /// A formatter with the built-in value sources
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            sources: SourceChain::default(),
            formatters: FormatterRegistry::default(),
            on_error: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// A formatter with no value sources; register them with [`add_source`](Self::add_source)
    pub fn empty(settings: Settings) -> Self {
        Self {
            sources: SourceChain::empty(),
            ..Self::with_settings(settings)
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace all settings; the template cache is dropped when it no longer fits them
    pub fn set_settings(&mut self, settings: Settings) {
        if settings.escape_mode != self.settings.escape_mode
            || !settings.cache_templates
            || settings.cache_capacity < self.cached_templates()
        {
            self.clear_cache();
        }
        self.settings = settings;
    }

    pub fn set_case_sensitivity(&mut self, mode: CaseSensitivity) {
        self.settings.case_sensitivity = mode;
    }

    pub fn set_escape_mode(&mut self, mode: EscapeMode) {
        if self.settings.escape_mode != mode {
            self.clear_cache();
        }
        self.settings.escape_mode = mode;
    }

    pub fn set_error_action(&mut self, action: ErrorAction) {
        self.settings.error_action = action;
    }

    /// Append a value source after those already registered
    pub fn add_source(&mut self, source: ValueSource) -> &mut Self {
        self.sources.push(source);
        self
    }

    pub fn sources(&self) -> &SourceChain {
        &self.sources
    }

    /// Register a formatter selected by `{value:name(options):format}`
    ///
    /// The empty name replaces the default formatter.
    pub fn add_formatter(&mut self, name: impl Into<String>, formatter: impl Formatter + 'static) -> &mut Self {
        self.formatters.add(name, formatter);
        self
    }

    pub fn formatters(&self) -> &FormatterRegistry {
        &self.formatters
    }

    /// Observe placeholder failures that a non-abort [`ErrorAction`] recovered from
    pub fn on_error(&mut self, callback: impl Fn(&FormatResolutionError) + Send + Sync + 'static) -> &mut Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Parse `template` with the configured escape mode, reusing a cached tree when possible
    pub fn parse(&self, template: &str) -> Result<Arc<Template>, FormatSyntaxError> {
        let capacity = self.settings.cache_capacity;
        if !self.settings.cache_templates || capacity == 0 {
            return parser::parse(template, self.settings.escape_mode).map(Arc::new);
        }

        if let Ok(cache) = self.cache.read() {
            if let Some(parsed) = cache.get(template) {
                debug!(template, "template cache hit");
                return Ok(Arc::clone(parsed));
            }
        }

        debug!(template, "template cache miss");
        let parsed = Arc::new(parser::parse(template, self.settings.escape_mode)?);
        if let Ok(mut cache) = self.cache.write() {
            if cache.len() >= capacity {
                debug!(capacity, "template cache full, clearing");
                cache.clear();
            }
            cache.insert(template.to_string(), Arc::clone(&parsed));
        }
        Ok(parsed)
    }

    /// Render `template` against `args`
    pub fn format(&self, template: &str, args: &[Value]) -> Result<String, FormatError> {
        let parsed = self.parse(template)?;
        Ok(self.format_template(&parsed, args)?)
    }

    /// Render an already parsed template against `args`
    pub fn format_template(&self, template: &Template, args: &[Value]) -> Result<String, FormatResolutionError> {
        self.resolver().render(template, args)
    }

    /// Number of parsed templates currently cached
    pub fn cached_templates(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Drop every cached template
    pub fn clear_cache(&self) {
        match self.cache.write() {
            Ok(mut cache) => cache.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver {
            settings: &self.settings,
            sources: &self.sources,
            formatters: &self.formatters,
            on_error: self.on_error.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolutionErrorKind;
    use crate::format::{FormatCall, FormatterError};
    use std::sync::Mutex;

    struct Upper;

    impl Formatter for Upper {
        fn format(&self, call: &mut FormatCall<'_>) -> Result<bool, FormatterError> {
            let text = call.value.to_string().to_uppercase();
            call.write(&text);
            Ok(true)
        }
    }

    fn person() -> Value {
        Value::map([("Name", "ada")])
    }

    #[test]
    fn test_format_uses_cache() {
        let formatter = SmartFormatter::new();
        assert_eq!(formatter.cached_templates(), 0);
        formatter.format("{Name}", &[person()]).unwrap();
        formatter.format("{Name}", &[person()]).unwrap();
        assert_eq!(formatter.cached_templates(), 1);

        let first = formatter.parse("{Name}").unwrap();
        let second = formatter.parse("{Name}").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_cache_disabled() {
        let formatter = SmartFormatter::with_settings(Settings::default().with_template_cache(false));
        formatter.format("{Name}", &[person()]).unwrap();
        assert_eq!(formatter.cached_templates(), 0);
    }

    #[test]
    fn test_cache_stays_bounded() {
        let formatter = SmartFormatter::with_settings(Settings::default().with_cache_capacity(4));
        for i in 0..50 {
            let template = format!("{{Name}} #{}", i);
            assert_eq!(formatter.format(&template, &[person()]).unwrap(), format!("ada #{}", i));
            assert!(formatter.cached_templates() <= 4);
        }
        assert!(formatter.cached_templates() > 0);
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let formatter = SmartFormatter::with_settings(Settings::default().with_cache_capacity(0));
        formatter.format("{Name}", &[person()]).unwrap();
        assert_eq!(formatter.cached_templates(), 0);
    }

    #[test]
    fn test_clear_cache() {
        let formatter = SmartFormatter::new();
        formatter.format("{Name}", &[person()]).unwrap();
        formatter.format("{Name}!", &[person()]).unwrap();
        assert_eq!(formatter.cached_templates(), 2);
        formatter.clear_cache();
        assert_eq!(formatter.cached_templates(), 0);
    }

    #[test]
    fn test_escape_mode_change_clears_cache() {
        let mut formatter = SmartFormatter::new();
        assert_eq!(formatter.format("a{{b}}", &[]).unwrap(), "a{b}");
        assert_eq!(formatter.cached_templates(), 1);

        formatter.set_escape_mode(EscapeMode::Backslash);
        assert_eq!(formatter.cached_templates(), 0);
        assert_eq!(formatter.format("a\\{b\\}", &[]).unwrap(), "a{b}");
    }

    #[test]
    fn test_syntax_errors_are_not_cached() {
        let formatter = SmartFormatter::new();
        let err = formatter.format("{Name", &[person()]).unwrap_err();
        assert!(matches!(err, FormatError::Syntax(_)));
        assert_eq!(formatter.cached_templates(), 0);
    }

    #[test]
    fn test_custom_formatter() {
        let mut formatter = SmartFormatter::new();
        formatter.add_formatter("upper", Upper);
        assert!(formatter.formatters().contains("upper"));
        assert_eq!(formatter.format("{Name:upper:}", &[person()]).unwrap(), "ADA");
    }

    #[test]
    fn test_replacing_default_formatter() {
        let mut formatter = SmartFormatter::new();
        formatter.add_formatter("", Upper);
        assert_eq!(formatter.format("{Name}!", &[person()]).unwrap(), "ADA!");
    }

    #[test]
    fn test_empty_formatter_resolves_nothing() {
        let formatter = SmartFormatter::empty(Settings::default());
        assert!(formatter.sources().is_empty());
        let err = formatter.format("{Name}", &[person()]).unwrap_err();
        match err {
            FormatError::Resolution(e) => assert_eq!(e.kind, ResolutionErrorKind::NotFound),
            other => panic!("expected resolution error, got {:?}", other),
        }

        let mut formatter = formatter;
        formatter.add_source(ValueSource::Mapping);
        assert_eq!(formatter.format("{Name}", &[person()]).unwrap(), "ada");
    }

    #[test]
    fn test_on_error_observes_substitutions() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut formatter = SmartFormatter::with_settings(Settings::default().with_fallback_token("-"));
        formatter.on_error(move |e| sink.lock().unwrap().push(e.selector.clone()));

        let out = formatter.format("{Name} {Age} {Address.City}", &[person()]).unwrap();
        assert_eq!(out, "ada - -");
        assert_eq!(*seen.lock().unwrap(), vec!["Age".to_string(), "Address".to_string()]);
    }

    #[test]
    fn test_set_error_action() {
        let mut formatter = SmartFormatter::new();
        assert!(formatter.format("{Missing}", &[person()]).is_err());
        formatter.set_error_action(ErrorAction::MaintainTokens);
        assert_eq!(formatter.format("{Missing}", &[person()]).unwrap(), "{Missing}");
    }

    #[test]
    fn test_shared_across_threads() {
        let formatter = Arc::new(SmartFormatter::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let formatter = Arc::clone(&formatter);
                std::thread::spawn(move || {
                    let args = [Value::map([("N", i)])];
                    formatter.format("n={N}", &args).unwrap()
                })
            })
            .collect();
        let mut outputs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        outputs.sort();
        assert_eq!(outputs, vec!["n=0", "n=1", "n=2", "n=3"]);
    }
}
