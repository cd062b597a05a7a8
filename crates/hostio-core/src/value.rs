//! Thread-safe result values.
//!
//! A [`TypedValue`] is what an async handler produces on a worker thread. It
//! holds no host state and is converted into a [`HostValue`] exactly once, on
//! the interpreter thread, when the pending operation settles.

use std::collections::HashMap;

use crate::host::{HostValue, Realm};

/// Closed, recursive, `Send` value built off the interpreter thread.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypedValue {
    /// No value. Converts to `undefined`.
    #[default]
    Unit,
    /// Boolean.
    Bool(bool),
    /// Double-precision number.
    Number(f64),
    /// UTF-8 string.
    String(String),
    /// Byte sequence. Converts to a freshly allocated `ArrayBuffer`.
    Bytes(Vec<u8>),
    /// Ordered list. Converts to an array.
    List(Vec<TypedValue>),
    /// String-keyed map. Converts to a plain object.
    Map(HashMap<String, TypedValue>),
}

impl TypedValue {
    /// Build a map from key/value pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, TypedValue)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Variant name, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Convert into a host value. Must run on the interpreter thread, which
    /// holding a `&Realm` guarantees.
    #[must_use]
    pub fn into_host(self, realm: &Realm) -> HostValue {
        match self {
            Self::Unit => HostValue::Undefined,
            Self::Bool(b) => HostValue::Bool(b),
            Self::Number(n) => HostValue::Number(n),
            Self::String(s) => HostValue::String(s),
            Self::Bytes(bytes) => HostValue::ArrayBuffer(realm.new_array_buffer(&bytes)),
            Self::List(items) => {
                let array = realm.new_array();
                for item in items {
                    array.push(item.into_host(realm));
                }
                HostValue::Array(array)
            },
            Self::Map(entries) => {
                let object = realm.new_object();
                for (key, value) in entries {
                    object.set(key, value.into_host(realm));
                }
                HostValue::Object(object)
            },
        }
    }

    /// Inverse of [`TypedValue::into_host`] for data-only host values.
    ///
    /// Returns `None` for functions, promises, errors and host objects,
    /// which have no typed representation.
    #[must_use]
    pub fn from_host(value: &HostValue) -> Option<Self> {
        Some(match value {
            HostValue::Undefined => Self::Unit,
            HostValue::Bool(b) => Self::Bool(*b),
            HostValue::Number(n) => Self::Number(*n),
            HostValue::String(s) => Self::String(s.clone()),
            HostValue::ArrayBuffer(b) => Self::Bytes(b.to_vec()),
            HostValue::Array(a) => Self::List(
                a.to_vec()
                    .iter()
                    .map(Self::from_host)
                    .collect::<Option<Vec<_>>>()?,
            ),
            HostValue::Object(o) => {
                let mut entries = HashMap::with_capacity(o.len());
                for key in o.keys() {
                    let v = o.get(&key).unwrap_or_default();
                    entries.insert(key, Self::from_host(&v)?);
                }
                Self::Map(entries)
            },
            HostValue::Null
            | HostValue::Function(_)
            | HostValue::Promise(_)
            | HostValue::Error(_)
            | HostValue::HostObject(_) => return None,
        })
    }
}

impl From<()> for TypedValue {
    fn from((): ()) -> Self {
        Self::Unit
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for TypedValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for TypedValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u64> for TypedValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<usize> for TypedValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Vec<u8>> for TypedValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<TypedValue>> for TypedValue {
    fn from(value: Vec<TypedValue>) -> Self {
        Self::List(value)
    }
}

impl From<HashMap<String, TypedValue>> for TypedValue {
    fn from(value: HashMap<String, TypedValue>) -> Self {
        Self::Map(value)
    }
}
