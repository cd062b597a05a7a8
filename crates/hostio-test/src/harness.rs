//! Event-loop driver for tests.

use std::sync::Arc;
use std::time::Duration;

use hostio_core::host::{HostObject, HostValue, Realm};
use hostio_core::{BridgeError, EventLoop, MainThreadInvoker};

/// How long [`TestLoop`] waits for a promise before failing the test.
pub const DEFAULT_AWAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wraps an [`EventLoop`] with panicking helpers for tests.
///
/// All helpers panic with a descriptive message instead of returning
/// errors, so test bodies stay linear.
#[derive(Debug)]
pub struct TestLoop {
    event_loop: EventLoop,
    timeout: Duration,
}

impl TestLoop {
    /// Create a loop around a fresh realm.
    ///
    /// # Panics
    ///
    /// Panics if the event loop runtime cannot start.
    #[must_use]
    pub fn new() -> Self {
        let event_loop = match EventLoop::new() {
            Ok(event_loop) => event_loop,
            Err(e) => panic!("failed to start test event loop: {e}"),
        };
        Self {
            event_loop,
            timeout: DEFAULT_AWAIT_TIMEOUT,
        }
    }

    /// Override the await timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The realm driven by this loop.
    #[must_use]
    pub fn realm(&self) -> &Realm {
        self.event_loop.realm()
    }

    /// An invoker feeding this loop.
    #[must_use]
    pub fn invoker(&self) -> Arc<dyn MainThreadInvoker> {
        self.event_loop.invoker()
    }

    /// Mutable access to the underlying loop.
    pub fn event_loop(&mut self) -> &mut EventLoop {
        &mut self.event_loop
    }

    /// Run queued work until idle.
    pub fn run_until_idle(&mut self) -> usize {
        self.event_loop.run_until_idle()
    }

    /// Call method `name` on `object` with `args`.
    ///
    /// # Errors
    ///
    /// Returns the host error thrown by the call.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a function on `object`.
    pub fn call(
        &self,
        object: &dyn HostObject,
        name: &str,
        args: &[HostValue],
    ) -> Result<HostValue, hostio_core::HostError> {
        let member = object.get(self.realm(), name)?;
        let Some(function) = member.as_function() else {
            panic!("{name} is not a function (got {})", member.type_name());
        };
        function.call(self.realm(), args)
    }

    /// Wait for `value` (a promise) to settle.
    ///
    /// Returns `Ok(value)` on fulfilment and `Err(reason)` on rejection.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not a promise or does not settle in time.
    pub fn settle(&mut self, value: &HostValue) -> Result<HostValue, HostValue> {
        let Some(promise) = value.as_promise() else {
            panic!("expected a promise, got {}", value.type_name());
        };
        match self.event_loop.block_on(promise, self.timeout) {
            Ok(outcome) => outcome,
            Err(BridgeError::Timeout(t)) => panic!("promise did not settle within {t:?}"),
            Err(e) => panic!("event loop failed: {e}"),
        }
    }

    /// Wait for `value` to fulfil and return the result.
    ///
    /// # Panics
    ///
    /// Panics if the promise rejects.
    pub fn await_ok(&mut self, value: &HostValue) -> HostValue {
        match self.settle(value) {
            Ok(v) => v,
            Err(reason) => panic!("promise rejected: {}", describe(&reason)),
        }
    }

    /// Wait for `value` to reject and return the rejection message.
    ///
    /// # Panics
    ///
    /// Panics if the promise fulfils.
    pub fn await_err(&mut self, value: &HostValue) -> String {
        match self.settle(value) {
            Ok(v) => panic!("promise fulfilled unexpectedly with {}", describe(&v)),
            Err(reason) => describe(&reason),
        }
    }

    /// Call an async method and wait for it to fulfil.
    ///
    /// # Panics
    ///
    /// Panics if the call throws or the promise rejects.
    pub fn call_await(
        &mut self,
        object: &dyn HostObject,
        name: &str,
        args: &[HostValue],
    ) -> HostValue {
        let promise = match self.call(object, name, args) {
            Ok(p) => p,
            Err(e) => panic!("{name} threw: {e}"),
        };
        self.await_ok(&promise)
    }
}

impl Default for TestLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a host value for assertion messages.
#[must_use]
pub fn describe(value: &HostValue) -> String {
    match value {
        HostValue::Error(e) => e.message().to_owned(),
        HostValue::String(s) => s.clone(),
        other => format!("{other:?}"),
    }
}

/// Read property `name` of the plain object `value`.
///
/// # Panics
///
/// Panics if `value` is not an object or lacks `name`.
#[must_use]
pub fn field(value: &HostValue, name: &str) -> HostValue {
    let Some(object) = value.as_object() else {
        panic!("expected an object, got {}", value.type_name());
    };
    match object.get(name) {
        Some(v) => v,
        None => panic!("object has no field {name}; keys: {:?}", object.keys()),
    }
}
