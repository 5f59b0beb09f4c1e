//! Argument values
//!
//! A [`Value`] is what placeholders resolve against. Containers are reference
//! counted, so narrowing a value during resolution never deep-copies the data.
//!
//! Four shapes can be navigated with selectors:
//! - [`Map`]: key-value mappings with string or integer keys
//! - [`TypedObject`]: structured values with a fixed set of named members
//! - [`DynamicRecord`]: values answering member lookups at runtime (see [`Record`])
//! - lists, navigated by integer index

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::config::CaseSensitivity;

/// A structured value with a fixed set of named members
///
/// ```rust
/// use smartfmt::{TypedObject, Value};
///
/// #[derive(Debug)]
/// struct City {
///     name: String,
/// }
///
/// impl TypedObject for City {
///     fn type_name(&self) -> &str {
///         "City"
///     }
///
///     fn member_names(&self) -> &[&'static str] {
///         &["Name"]
///     }
///
///     fn member(&self, name: &str) -> Option<Value> {
///         match name {
///             "Name" => Some(self.name.clone().into()),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait TypedObject: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    /// Names accepted by [`member`](Self::member), in declaration order
    fn member_names(&self) -> &[&'static str];

    /// Look up a member by its exact name
    fn member(&self, name: &str) -> Option<Value>;

    /// Canonical string form used when the object itself is rendered
    fn to_text(&self) -> String {
        self.type_name().to_string()
    }
}

/// Failure of a dynamic member lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberError {
    #[error("member '{0}' does not exist")]
    Missing(String),
    #[error("member lookup failed: {0}")]
    Failed(String),
}

/// A value that answers member lookups at runtime
pub trait DynamicRecord: fmt::Debug + Send + Sync {
    /// Look up a member, comparing names under `case`
    fn get_member(&self, name: &str, case: CaseSensitivity) -> Result<Value, MemberError>;

    /// Canonical string form used when the record itself is rendered
    fn to_text(&self) -> String {
        "Record".to_string()
    }
}

/// An insertion-ordered dynamic record whose members are added at runtime
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a member
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Add or replace a member, builder style
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl DynamicRecord for Record {
    fn get_member(&self, name: &str, case: CaseSensitivity) -> Result<Value, MemberError> {
        let found = match case {
            CaseSensitivity::Sensitive => self.fields.get(name),
            CaseSensitivity::Insensitive => self
                .fields
                .iter()
                .find(|(field, _)| case.matches(name, field))
                .map(|(_, v)| v),
        };
        found
            .cloned()
            .ok_or_else(|| MemberError::Missing(name.to_string()))
    }
}

/// Key of a [`Map`] entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Str(String),
    Int(i64),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => write!(f, "{}", s),
            Key::Int(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Int(n.into())
    }
}

/// Insertion-ordered key-value mapping
#[derive(Debug, Clone, Default)]
pub struct Map {
    entries: IndexMap<Key, Value>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any entry with an identical key
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Insert an entry, builder style
    pub fn with(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A format argument or a value reached while resolving a placeholder
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Arc<Vec<Value>>),
    Map(Arc<Map>),
    Object(Arc<dyn TypedObject>),
    Record(Arc<dyn DynamicRecord>),
}

impl Value {
    /// Wrap a typed object
    pub fn object(object: impl TypedObject + 'static) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Wrap a dynamic record
    pub fn record(record: impl DynamicRecord + 'static) -> Self {
        Value::Record(Arc::new(record))
    }

    /// Build a list from anything convertible to values
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::List(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build a mapping from key-value pairs
    pub fn map<K: Into<Key>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Map(Arc::new(entries.into_iter().collect()))
    }

    /// Short name of the representation, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Record(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Object(o) => f.write_str(&o.to_text()),
            Value::Record(r) => f.write_str(&r.to_text()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        match i64::try_from(n) {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Float(n as f64),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(Arc::new(map))
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(Arc::new(record))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::list(items),
            serde_json::Value::Object(fields) => Value::map(fields),
        }
    }
}
