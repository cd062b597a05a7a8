//! Single-threaded host interpreter model.
//!
//! Values, functions, promises and the realm that owns the microtask queue
//! and pending-operation table. Everything here is `!Send`: the compiler
//! keeps host values on the thread that created them.

mod error;
mod function;
mod promise;
mod realm;
mod value;

pub use error::{ErrorKind, HostError};
pub use function::Function;
pub use promise::{Promise, PromiseState};
pub use realm::{PendingId, Realm, RealmId};
pub use value::{Array, ArrayBuffer, HostValue, Object};

/// An object whose property reads and writes are served by native code.
pub trait HostObject {
    /// Read property `name`. Unknown names yield `undefined`.
    ///
    /// # Errors
    ///
    /// Returns a host error if a property getter fails.
    fn get(&self, realm: &Realm, name: &str) -> Result<HostValue, HostError>;

    /// Write property `name`.
    ///
    /// # Errors
    ///
    /// Returns a host error if a property setter fails.
    fn set(&self, realm: &Realm, name: &str, value: HostValue) -> Result<(), HostError>;

    /// All names this object answers to.
    fn property_names(&self) -> Vec<String>;
}
