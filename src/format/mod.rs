//! Formatters: strategies that turn a resolved value into text
//!
//! A placeholder's format specifier picks the strategy. `{Price:N2}` hands the
//! hint `N2` to the default formatter, `{Items:join(, ):{Name}}` asks a
//! formatter registered as `join` to render the value, and `{Person:{Name}}`
//! renders the nested template with the resolved value as its argument.

mod default;
mod registry;

pub use default::{render_with_hint, DefaultFormatter, MAX_HINT_PRECISION};
pub(crate) use registry::FormatterFailure;
pub use registry::{FormatCall, Formatter, FormatterError, FormatterRegistry};
