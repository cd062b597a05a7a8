use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::{Function, HostError, HostObject, Promise, Realm};

/// A value living inside a [`Realm`].
///
/// Composite variants have reference semantics: cloning an [`Array`] or
/// [`Object`] yields another reference to the same storage. None of these
/// types are `Send`.
#[derive(Clone, Default)]
pub enum HostValue {
    /// `undefined`.
    #[default]
    Undefined,
    /// `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Double-precision number.
    Number(f64),
    /// UTF-8 string.
    String(String),
    /// Binary buffer.
    ArrayBuffer(ArrayBuffer),
    /// Ordered array.
    Array(Array),
    /// Plain string-keyed object.
    Object(Object),
    /// Callable.
    Function(Function),
    /// Pending or settled promise.
    Promise(Promise),
    /// Error object.
    Error(HostError),
    /// Object whose property access is served by native code.
    HostObject(Rc<dyn HostObject>),
}

impl HostValue {
    /// Name of the value's kind, as used in argument error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::ArrayBuffer(_) => "ArrayBuffer",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Function(_) => "function",
            Self::Promise(_) => "promise",
            Self::Error(_) => "error",
            Self::HostObject(_) => "host object",
        }
    }

    /// True for `undefined` and `null`.
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Boolean payload, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric payload, if any.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Buffer reference, if any.
    #[must_use]
    pub fn as_array_buffer(&self) -> Option<&ArrayBuffer> {
        match self {
            Self::ArrayBuffer(b) => Some(b),
            _ => None,
        }
    }

    /// Array reference, if any.
    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Object reference, if any.
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Function reference, if any.
    #[must_use]
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Promise reference, if any.
    #[must_use]
    pub fn as_promise(&self) -> Option<&Promise> {
        match self {
            Self::Promise(p) => Some(p),
            _ => None,
        }
    }

    /// Error payload, if any.
    #[must_use]
    pub fn as_error(&self) -> Option<&HostError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Read a named property.
    ///
    /// # Errors
    ///
    /// Reading from `undefined` or `null` is a `TypeError`; errors raised by
    /// a host object's getter are passed through.
    pub fn get(&self, realm: &Realm, name: &str) -> Result<HostValue, HostError> {
        match self {
            Self::Undefined | Self::Null => Err(HostError::type_error(format!(
                "cannot read property '{name}' of {}",
                self.type_name()
            ))),
            Self::Object(o) => Ok(o.get(name).unwrap_or_default()),
            Self::HostObject(h) => h.get(realm, name),
            Self::Array(a) if name == "length" => Ok(HostValue::from(a.len())),
            Self::ArrayBuffer(b) if name == "byteLength" => Ok(HostValue::from(b.len())),
            Self::String(s) if name == "length" => Ok(HostValue::from(s.chars().count())),
            _ => Ok(Self::Undefined),
        }
    }

    /// Write a named property.
    ///
    /// # Errors
    ///
    /// Writing to a primitive is a `TypeError`; host object setters may fail.
    pub fn set(&self, realm: &Realm, name: &str, value: HostValue) -> Result<(), HostError> {
        match self {
            Self::Object(o) => {
                o.set(name, value);
                Ok(())
            },
            Self::HostObject(h) => h.set(realm, name, value),
            other => Err(HostError::type_error(format!(
                "cannot set property '{name}' on {}",
                other.type_name()
            ))),
        }
    }

    /// Look up `name` and call it with `args`.
    ///
    /// # Errors
    ///
    /// Returns a `TypeError` if the property is not callable, or whatever the
    /// callee throws.
    pub fn call_method(
        &self,
        realm: &Realm,
        name: &str,
        args: &[HostValue],
    ) -> Result<HostValue, HostError> {
        match self.get(realm, name)? {
            Self::Function(f) => f.call(realm, args),
            other => Err(HostError::type_error(format!(
                "'{name}' is a {}, not a function",
                other.type_name()
            ))),
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::ArrayBuffer(b) => write!(f, "ArrayBuffer({} bytes)", b.len()),
            Self::Array(a) => f.debug_list().entries(a.to_vec()).finish(),
            Self::Object(o) => {
                let mut map = f.debug_map();
                for key in o.keys() {
                    map.entry(&key, &o.get(&key).unwrap_or_default());
                }
                map.finish()
            },
            Self::Function(func) => write!(f, "function {}()", func.name()),
            Self::Promise(p) => write!(f, "Promise({:?})", p.state()),
            Self::Error(e) => write!(f, "{e}"),
            Self::HostObject(h) => write!(f, "HostObject({:?})", h.property_names()),
        }
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for HostValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<usize> for HostValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<ArrayBuffer> for HostValue {
    fn from(value: ArrayBuffer) -> Self {
        Self::ArrayBuffer(value)
    }
}

impl From<Array> for HostValue {
    fn from(value: Array) -> Self {
        Self::Array(value)
    }
}

impl From<Object> for HostValue {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Function> for HostValue {
    fn from(value: Function) -> Self {
        Self::Function(value)
    }
}

impl From<Promise> for HostValue {
    fn from(value: Promise) -> Self {
        Self::Promise(value)
    }
}

impl From<HostError> for HostValue {
    fn from(value: HostError) -> Self {
        Self::Error(value)
    }
}

/// Binary buffer with shared backing storage.
#[derive(Clone, Debug, Default)]
pub struct ArrayBuffer(Rc<RefCell<Vec<u8>>>);

impl ArrayBuffer {
    /// Wrap `bytes` without copying.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Rc::new(RefCell::new(bytes)))
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// True if the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Owned copy of the contents.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    /// True if both handles refer to the same storage.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

/// Ordered array with shared backing storage.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<HostValue>>>);

impl Array {
    /// Empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Array holding `items`.
    #[must_use]
    pub fn from_vec(items: Vec<HostValue>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// True if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<HostValue> {
        self.0.borrow().get(index).cloned()
    }

    /// Append an element.
    pub fn push(&self, value: HostValue) {
        self.0.borrow_mut().push(value);
    }

    /// Snapshot of the elements.
    #[must_use]
    pub fn to_vec(&self) -> Vec<HostValue> {
        self.0.borrow().clone()
    }
}

/// Plain string-keyed object with shared backing storage.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<HashMap<String, HostValue>>>);

impl Object {
    /// Empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Property value, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<HostValue> {
        self.0.borrow().get(key).cloned()
    }

    /// Set or replace a property.
    pub fn set(&self, key: impl Into<String>, value: HostValue) {
        self.0.borrow_mut().insert(key.into(), value);
    }

    /// True if the property exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Property names, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.0.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// True if the object has no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}
