//! Formatter settings
//!
//! Settings are a plain value: build one with the `with_*` methods or load it
//! from TOML, then hand it to a [`SmartFormatter`](crate::SmartFormatter) or to
//! [`format`](crate::format). A format call only ever reads them.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// How selector names are compared against member names and mapping keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseSensitivity {
    #[default]
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    /// Compare a selector name with a candidate name under this mode
    pub fn matches(self, selector: &str, candidate: &str) -> bool {
        match self {
            CaseSensitivity::Sensitive => selector == candidate,
            CaseSensitivity::Insensitive => selector
                .chars()
                .flat_map(char::to_lowercase)
                .eq(candidate.chars().flat_map(char::to_lowercase)),
        }
    }
}

/// How literal braces are written in a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeMode {
    /// `{{` and `}}` produce literal braces
    #[default]
    DoubledBrace,
    /// `\{` and `\}` produce literal braces; bare braces always delimit placeholders
    Backslash,
}

/// What happens when a placeholder cannot be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorAction {
    /// Fail the whole format call
    #[default]
    Abort,
    /// Write the configured fallback token instead of the placeholder
    Substitute,
    /// Write the placeholder's source text unchanged
    MaintainTokens,
}

/// Default bound on the number of cached templates
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Configuration read by the parser and the resolution engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub case_sensitivity: CaseSensitivity,
    pub escape_mode: EscapeMode,
    pub error_action: ErrorAction,
    /// Text written for a failed placeholder under [`ErrorAction::Substitute`]
    pub fallback_token: String,
    /// Keep parsed templates keyed by their source text
    pub cache_templates: bool,
    /// Most parsed templates kept; the cache is emptied when it fills up
    pub cache_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            case_sensitivity: CaseSensitivity::default(),
            escape_mode: EscapeMode::default(),
            error_action: ErrorAction::default(),
            fallback_token: String::new(),
            cache_templates: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl Settings {
    /// Create settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load settings from a TOML string; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the case sensitivity used for selector matching
    pub fn with_case_sensitivity(mut self, mode: CaseSensitivity) -> Self {
        self.case_sensitivity = mode;
        self
    }

    /// Set the escape mode used by the parser
    pub fn with_escape_mode(mut self, mode: EscapeMode) -> Self {
        self.escape_mode = mode;
        self
    }

    /// Set the action taken when a placeholder fails
    pub fn with_error_action(mut self, action: ErrorAction) -> Self {
        self.error_action = action;
        self
    }

    /// Substitute failed placeholders with `token`
    pub fn with_fallback_token(mut self, token: impl Into<String>) -> Self {
        self.error_action = ErrorAction::Substitute;
        self.fallback_token = token.into();
        self
    }

    /// Enable or disable the parsed template cache
    pub fn with_template_cache(mut self, enabled: bool) -> Self {
        self.cache_templates = enabled;
        self
    }

    /// Bound the parsed template cache to `capacity` entries
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.case_sensitivity, CaseSensitivity::Sensitive);
        assert_eq!(settings.escape_mode, EscapeMode::DoubledBrace);
        assert_eq!(settings.error_action, ErrorAction::Abort);
        assert!(settings.fallback_token.is_empty());
        assert!(settings.cache_templates);
        assert_eq!(settings.cache_capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn test_builder_pattern() {
        let settings = Settings::new()
            .with_case_sensitivity(CaseSensitivity::Insensitive)
            .with_escape_mode(EscapeMode::Backslash)
            .with_fallback_token("??")
            .with_template_cache(false);

        assert_eq!(settings.case_sensitivity, CaseSensitivity::Insensitive);
        assert_eq!(settings.escape_mode, EscapeMode::Backslash);
        assert_eq!(settings.error_action, ErrorAction::Substitute);
        assert_eq!(settings.fallback_token, "??");
        assert!(!settings.cache_templates);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
case_sensitivity = "insensitive"
escape_mode = "backslash"
error_action = "maintain_tokens"
cache_capacity = 16
"#;
        let settings = Settings::from_toml_str(toml_str).expect("Should parse");
        assert_eq!(settings.case_sensitivity, CaseSensitivity::Insensitive);
        assert_eq!(settings.escape_mode, EscapeMode::Backslash);
        assert_eq!(settings.error_action, ErrorAction::MaintainTokens);
        assert_eq!(settings.cache_capacity, 16);
        assert!(settings.cache_templates);
    }

    #[test]
    fn test_parse_empty_toml_uses_defaults() {
        let settings = Settings::from_toml_str("").expect("Should parse");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_invalid_toml_error() {
        let result = Settings::from_toml_str("escape_mode = \"sideways\"");
        assert!(matches!(result, Err(SettingsError::Toml(_))));
    }

    #[test]
    fn test_case_matching() {
        assert!(CaseSensitivity::Sensitive.matches("Name", "Name"));
        assert!(!CaseSensitivity::Sensitive.matches("name", "Name"));
        assert!(CaseSensitivity::Insensitive.matches("name", "NAME"));
        assert!(!CaseSensitivity::Insensitive.matches("straße", "STRASSE"));
        assert!(CaseSensitivity::Insensitive.matches("Ünïcode", "üNÏCODE"));
    }
}
