use std::fmt;
use std::rc::Rc;

use super::{HostError, HostValue, Realm};

type NativeCallback = dyn Fn(&Realm, &[HostValue]) -> Result<HostValue, HostError>;

/// A host-callable function backed by a native closure.
#[derive(Clone)]
pub struct Function(Rc<FunctionInner>);

struct FunctionInner {
    name: String,
    length: usize,
    callback: Box<NativeCallback>,
}

impl Function {
    /// Wrap `callback` as a function named `name` with declared arity `length`.
    pub fn new<F>(name: impl Into<String>, length: usize, callback: F) -> Self
    where
        F: Fn(&Realm, &[HostValue]) -> Result<HostValue, HostError> + 'static,
    {
        Self(Rc::new(FunctionInner {
            name: name.into(),
            length,
            callback: Box::new(callback),
        }))
    }

    /// Function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Declared parameter count.
    #[must_use]
    pub fn length(&self) -> usize {
        self.0.length
    }

    /// Invoke the function.
    ///
    /// # Errors
    ///
    /// Returns whatever the callback throws.
    pub fn call(&self, realm: &Realm, args: &[HostValue]) -> Result<HostValue, HostError> {
        (self.0.callback)(realm, args)
    }

    /// True if both handles refer to the same function object.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.0.name)
            .field("length", &self.0.length)
            .finish_non_exhaustive()
    }
}
