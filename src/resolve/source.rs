//! Value sources: strategies that resolve one selector against one value
//!
//! Each source first decides whether it owns a (selector, value) pair and only
//! then attempts the lookup. A [`SourceChain`] asks its sources in registration
//! order and stops at the first that resolves or reports an error.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::config::CaseSensitivity;
use crate::error::ResolutionErrorKind;
use crate::parser::ast::{Selector, SelectorKind};
use crate::value::{DynamicRecord, Key, Map, MemberError, TypedObject, Value};

/// Result of asking a source to resolve a selector
#[derive(Debug, Clone)]
pub enum SourceOutcome {
    Resolved(Value),
    /// The source does not own the pair or found nothing; later sources may try
    NotApplicable,
    /// The source owns the pair but the access is invalid; the chain stops
    Error(ResolutionErrorKind),
}

/// A caller-supplied resolution strategy
pub trait CustomSource: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Whether this source owns the pair
    fn claims(&self, selector: &Selector, value: &Value) -> bool;

    fn resolve(&self, selector: &Selector, value: &Value, case: CaseSensitivity) -> SourceOutcome;
}

/// One entry of a [`SourceChain`]
#[derive(Clone)]
pub enum ValueSource {
    /// Named member access on [`Value::Object`]
    TypedObject,
    /// Key lookup on [`Value::Map`]
    Mapping,
    /// Dynamic member lookup on [`Value::Record`]
    DynamicRecord,
    /// Integer indexing on [`Value::List`]
    List,
    Custom(Arc<dyn CustomSource>),
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Custom(source) => write!(f, "Custom({})", source.name()),
            other => f.write_str(other.name()),
        }
    }
}

impl ValueSource {
    /// Wrap a caller-supplied source
    pub fn custom(source: impl CustomSource + 'static) -> Self {
        ValueSource::Custom(Arc::new(source))
    }

    pub fn name(&self) -> &str {
        match self {
            ValueSource::TypedObject => "TypedObject",
            ValueSource::Mapping => "Mapping",
            ValueSource::DynamicRecord => "DynamicRecord",
            ValueSource::List => "List",
            ValueSource::Custom(source) => source.name(),
        }
    }

    /// Whether this source owns the (selector, value) pair
    pub fn claims(&self, selector: &Selector, value: &Value) -> bool {
        match (self, value) {
            (ValueSource::TypedObject, Value::Object(_)) => selector.kind == SelectorKind::Name,
            (ValueSource::Mapping, Value::Map(_)) => true,
            (ValueSource::DynamicRecord, Value::Record(_)) => true,
            (ValueSource::List, Value::List(_)) => selector.index().is_some(),
            (ValueSource::Custom(source), value) => source.claims(selector, value),
            _ => false,
        }
    }

    /// Resolve `selector` against `value`
    pub fn resolve(&self, selector: &Selector, value: &Value, case: CaseSensitivity) -> SourceOutcome {
        if !self.claims(selector, value) {
            return SourceOutcome::NotApplicable;
        }
        match (self, value) {
            (ValueSource::TypedObject, Value::Object(object)) => {
                resolve_member(object.as_ref(), selector, case)
            }
            (ValueSource::Mapping, Value::Map(map)) => resolve_key(map, selector, case),
            (ValueSource::DynamicRecord, Value::Record(record)) => {
                resolve_dynamic(record.as_ref(), selector, case)
            }
            (ValueSource::List, Value::List(items)) => resolve_index(items, selector),
            (ValueSource::Custom(source), value) => source.resolve(selector, value, case),
            _ => SourceOutcome::NotApplicable,
        }
    }
}

fn resolve_member(object: &dyn TypedObject, selector: &Selector, case: CaseSensitivity) -> SourceOutcome {
    let member = match case {
        CaseSensitivity::Sensitive => object.member(&selector.text),
        CaseSensitivity::Insensitive => object
            .member_names()
            .iter()
            .find(|name| case.matches(&selector.text, name))
            .and_then(|name| object.member(name)),
    };
    member.map_or(SourceOutcome::NotApplicable, SourceOutcome::Resolved)
}

fn key_matches(key: &Key, selector: &Selector, case: CaseSensitivity) -> bool {
    match key {
        Key::Str(s) => case.matches(&selector.text, s),
        Key::Int(n) => selector.index() == Some(*n),
    }
}

fn resolve_key(map: &Map, selector: &Selector, case: CaseSensitivity) -> SourceOutcome {
    let found = match case {
        CaseSensitivity::Sensitive => map
            .get(&Key::Str(selector.text.clone()))
            .or_else(|| selector.index().and_then(|n| map.get(&Key::Int(n)))),
        // First match in insertion order wins when keys differ only by case
        CaseSensitivity::Insensitive => map
            .iter()
            .find(|(key, _)| key_matches(key, selector, case))
            .map(|(_, v)| v),
    };
    found.map_or(SourceOutcome::NotApplicable, |v| {
        SourceOutcome::Resolved(v.clone())
    })
}

fn resolve_dynamic(record: &dyn DynamicRecord, selector: &Selector, case: CaseSensitivity) -> SourceOutcome {
    match record.get_member(&selector.text, case) {
        Ok(value) => SourceOutcome::Resolved(value),
        Err(MemberError::Missing(_)) => {
            trace!(selector = %selector.text, "dynamic member missing");
            SourceOutcome::NotApplicable
        }
        Err(MemberError::Failed(message)) => SourceOutcome::Error(ResolutionErrorKind::Source(message)),
    }
}

fn resolve_index(items: &[Value], selector: &Selector) -> SourceOutcome {
    let Some(index) = selector.index() else {
        return SourceOutcome::NotApplicable;
    };
    if index < 0 {
        return SourceOutcome::Error(ResolutionErrorKind::NegativeIndex(index));
    }
    match usize::try_from(index).ok().and_then(|i| items.get(i)) {
        Some(value) => SourceOutcome::Resolved(value.clone()),
        None => SourceOutcome::Error(ResolutionErrorKind::IndexOutOfRange {
            index,
            len: items.len(),
        }),
    }
}

/// Ordered list of value sources
#[derive(Debug, Clone)]
pub struct SourceChain {
    sources: Vec<ValueSource>,
}

impl Default for SourceChain {
    fn default() -> Self {
        Self {
            sources: vec![
                ValueSource::TypedObject,
                ValueSource::Mapping,
                ValueSource::DynamicRecord,
                ValueSource::List,
            ],
        }
    }
}

impl SourceChain {
    /// A chain with no sources
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Append a source; it is asked after every source already registered
    pub fn push(&mut self, source: ValueSource) {
        self.sources.push(source);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValueSource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Ask each source in order; `NotApplicable` means no source resolved the selector
    pub fn resolve(&self, selector: &Selector, value: &Value, case: CaseSensitivity) -> SourceOutcome {
        for source in &self.sources {
            if !source.claims(selector, value) {
                continue;
            }
            match source.resolve(selector, value, case) {
                SourceOutcome::Resolved(next) => {
                    trace!(
                        source = source.name(),
                        selector = %selector.text,
                        kind = next.kind_name(),
                        "selector resolved"
                    );
                    return SourceOutcome::Resolved(next);
                }
                SourceOutcome::NotApplicable => continue,
                SourceOutcome::Error(kind) => return SourceOutcome::Error(kind),
            }
        }
        SourceOutcome::NotApplicable
    }
}
