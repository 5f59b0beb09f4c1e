//! Selector resolution
//!
//! A placeholder's path is resolved one selector at a time. Each step asks the
//! [`SourceChain`] which source owns the selector for the current value; the
//! first source that claims it produces the next value.

mod resolver;
mod source;

pub(crate) use resolver::Resolver;
pub use resolver::{ErrorCallback, ResolutionContext, MAX_ALIGNMENT};
pub use source::{CustomSource, SourceChain, SourceOutcome, ValueSource};
