//! The default formatter: canonical string conversion

use crate::value::Value;

use super::registry::{FormatCall, Formatter, FormatterError};

/// Renders values through their canonical string form
///
/// A plain specifier is treated as a hint. Numeric values understand `F<n>` /
/// `N<n>` (fixed decimals), `D<n>` (zero-padded integers) and `X`/`x`
/// (hexadecimal integers); every other hint is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn format(&self, call: &mut FormatCall<'_>) -> Result<bool, FormatterError> {
        let value = call.value;
        if let Some(template) = call.format.filter(|t| t.has_placeholders()) {
            call.render(template, value)?;
            return Ok(true);
        }
        let text = render_with_hint(value, &call.hint());
        call.write(&text);
        Ok(true)
    }
}

/// Largest decimal count or zero-padding width a hint may request
pub const MAX_HINT_PRECISION: usize = 64;

/// Canonical string form of `value`, adjusted by a numeric hint when one applies
pub fn render_with_hint(value: &Value, hint: &str) -> String {
    let hint = hint.trim();
    if hint.is_empty() {
        return value.to_string();
    }

    let mut chars = hint.chars();
    let Some(code) = chars.next() else {
        return value.to_string();
    };
    let digits = chars.as_str();
    let precision: Option<usize> = if digits.is_empty() {
        None
    } else {
        match digits.parse::<usize>() {
            Ok(p) => Some(p.min(MAX_HINT_PRECISION)),
            Err(_) => return value.to_string(),
        }
    };

    match (code, value) {
        ('F' | 'f' | 'N' | 'n', Value::Float(x)) => format!("{:.*}", precision.unwrap_or(2), x),
        ('F' | 'f' | 'N' | 'n', Value::Int(n)) => format!("{:.*}", precision.unwrap_or(2), *n as f64),
        ('D' | 'd', Value::Int(n)) => {
            let width = precision.unwrap_or(0);
            if *n < 0 {
                format!("-{:0width$}", n.unsigned_abs(), width = width)
            } else {
                format!("{:0width$}", n, width = width)
            }
        }
        ('X', Value::Int(n)) => format!("{:0width$X}", n, width = precision.unwrap_or(0)),
        ('x', Value::Int(n)) => format!("{:0width$x}", n, width = precision.unwrap_or(0)),
        _ => value.to_string(),
    }
}
