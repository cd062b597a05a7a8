//! Host object bridge: registration and dispatch.
//!
//! A [`Bridge`] maps member names to one of three handler kinds:
//!
//! - **sync methods** run on the interpreter thread and return a host value;
//! - **async methods** receive only owned [`AsyncArgs`], run on the task
//!   executor and produce a [`TypedValue`] that is converted back on the
//!   interpreter thread through the main-thread invoker;
//! - **properties** are computed on every read, with an optional setter.
//!
//! The member map is populated once by [`BridgeBuilder`] and read without
//! locking afterwards. Handler errors and panics never cross the boundary:
//! they become host errors (sync) or rejections (async).

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::args::AsyncArgs;
use crate::error::{BridgeError, BridgeResult};
use crate::executor::TaskExecutor;
use crate::host::{Function, HostError, HostObject, HostValue, PendingId, Promise, Realm, RealmId};
use crate::invoker::MainThreadInvoker;
use crate::value::TypedValue;

/// Handler of a synchronous method.
pub type SyncHandler = Rc<dyn Fn(&Realm, &[HostValue]) -> BridgeResult<HostValue>>;

/// Handler of an asynchronous method. It cannot see the realm.
pub type AsyncHandler = Arc<dyn Fn(&AsyncArgs) -> BridgeResult<TypedValue> + Send + Sync>;

/// Property getter.
pub type PropertyGetter = Rc<dyn Fn(&Realm) -> BridgeResult<HostValue>>;

/// Property setter.
pub type PropertySetter = Rc<dyn Fn(&Realm, HostValue) -> BridgeResult<()>>;

enum Member {
    Sync {
        min_args: usize,
        handler: SyncHandler,
    },
    Async {
        min_args: usize,
        handler: AsyncHandler,
    },
    Property {
        getter: PropertyGetter,
        setter: Option<PropertySetter>,
    },
}

#[derive(Clone)]
struct AsyncWiring {
    executor: Arc<dyn TaskExecutor>,
    invoker: Arc<dyn MainThreadInvoker>,
}

/// Collects members and wiring, then validates them into a [`Bridge`].
pub struct BridgeBuilder {
    name: String,
    members: HashMap<String, Member>,
    executor: Option<Arc<dyn TaskExecutor>>,
    invoker: Option<Arc<dyn MainThreadInvoker>>,
}

impl BridgeBuilder {
    /// Start a bridge called `name` (used in logs).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: HashMap::new(),
            executor: None,
            invoker: None,
        }
    }

    /// Executor for async method bodies.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn TaskExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Invoker used to settle async calls on the interpreter thread.
    #[must_use]
    pub fn with_invoker(mut self, invoker: Arc<dyn MainThreadInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// Register a synchronous method requiring at least `min_args` arguments.
    pub fn register_sync<F>(&mut self, name: &str, min_args: usize, handler: F) -> &mut Self
    where
        F: Fn(&Realm, &[HostValue]) -> BridgeResult<HostValue> + 'static,
    {
        self.insert(
            name,
            Member::Sync {
                min_args,
                handler: Rc::new(handler),
            },
        )
    }

    /// Register an asynchronous method requiring at least `min_args`
    /// arguments.
    pub fn register_async<F>(&mut self, name: &str, min_args: usize, handler: F) -> &mut Self
    where
        F: Fn(&AsyncArgs) -> BridgeResult<TypedValue> + Send + Sync + 'static,
    {
        self.insert(
            name,
            Member::Async {
                min_args,
                handler: Arc::new(handler),
            },
        )
    }

    /// Register a read-only property.
    pub fn register_property<G>(&mut self, name: &str, getter: G) -> &mut Self
    where
        G: Fn(&Realm) -> BridgeResult<HostValue> + 'static,
    {
        self.insert(
            name,
            Member::Property {
                getter: Rc::new(getter),
                setter: None,
            },
        )
    }

    /// Register a read-write property.
    pub fn register_property_rw<G, S>(&mut self, name: &str, getter: G, setter: S) -> &mut Self
    where
        G: Fn(&Realm) -> BridgeResult<HostValue> + 'static,
        S: Fn(&Realm, HostValue) -> BridgeResult<()> + 'static,
    {
        self.insert(
            name,
            Member::Property {
                getter: Rc::new(getter),
                setter: Some(Rc::new(setter)),
            },
        )
    }

    fn insert(&mut self, name: &str, member: Member) -> &mut Self {
        if self.members.insert(name.to_owned(), member).is_some() {
            warn!(bridge = %self.name, member = name, "member registered twice; keeping the later one");
        }
        self
    }

    /// Validate and freeze the registration.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Configuration`] if any async method is
    /// registered but the executor or the invoker is missing.
    pub fn build(self) -> BridgeResult<Bridge> {
        let needs_async = self
            .members
            .values()
            .any(|m| matches!(m, Member::Async { .. }));

        let wiring = if needs_async {
            let executor = self.executor.ok_or_else(|| {
                BridgeError::Configuration(format!(
                    "{} registers async methods but has no task executor",
                    self.name
                ))
            })?;
            let invoker = self.invoker.ok_or_else(|| {
                BridgeError::Configuration(format!(
                    "{} registers async methods but has no main-thread invoker",
                    self.name
                ))
            })?;
            Some(AsyncWiring { executor, invoker })
        } else {
            None
        };

        debug!(bridge = %self.name, members = self.members.len(), "bridge built");
        Ok(Bridge {
            name: self.name,
            members: self.members,
            wiring,
            cache: RefCell::new(FunctionCache::default()),
        })
    }
}

#[derive(Default)]
struct FunctionCache {
    realm: Option<RealmId>,
    functions: HashMap<String, Function>,
}

/// Dispatcher exposing registered members to the host.
pub struct Bridge {
    name: String,
    members: HashMap<String, Member>,
    wiring: Option<AsyncWiring>,
    cache: RefCell<FunctionCache>,
}

impl Bridge {
    /// Bridge name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if `name` is registered.
    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    fn cached_function(&self, realm: &Realm, name: &str, member: &Member) -> Function {
        let mut cache = self.cache.borrow_mut();
        if cache.realm != Some(realm.id()) {
            if cache.realm.is_some() {
                debug!(bridge = %self.name, "realm changed; clearing function cache");
            }
            cache.functions.clear();
            cache.realm = Some(realm.id());
        }
        if let Some(f) = cache.functions.get(name) {
            return f.clone();
        }
        let f = self.make_function(name, member);
        cache.functions.insert(name.to_owned(), f.clone());
        f
    }

    fn make_function(&self, name: &str, member: &Member) -> Function {
        match member {
            Member::Sync { min_args, handler } => {
                sync_function(name, *min_args, Rc::clone(handler))
            },
            Member::Async { min_args, handler } => match &self.wiring {
                Some(wiring) => {
                    async_function(name, *min_args, Arc::clone(handler), wiring.clone())
                },
                None => {
                    let message = format!("{name} is async but the bridge has no executor");
                    Function::new(name, *min_args, move |_, _| Err(HostError::new(&message)))
                },
            },
            Member::Property { .. } => {
                Function::new(name, 0, |_, _| Ok(HostValue::Undefined))
            },
        }
    }
}

impl HostObject for Bridge {
    fn get(&self, realm: &Realm, name: &str) -> Result<HostValue, HostError> {
        let Some(member) = self.members.get(name) else {
            return Ok(HostValue::Undefined);
        };
        match member {
            Member::Property { getter, .. } => getter(realm).map_err(HostError::from),
            Member::Sync { .. } | Member::Async { .. } => Ok(HostValue::Function(
                self.cached_function(realm, name, member),
            )),
        }
    }

    fn set(&self, realm: &Realm, name: &str, value: HostValue) -> Result<(), HostError> {
        match self.members.get(name) {
            Some(Member::Property {
                setter: Some(setter),
                ..
            }) => setter(realm, value).map_err(HostError::from),
            _ => {
                trace!(bridge = %self.name, member = name, "ignoring write to read-only member");
                Ok(())
            },
        }
    }

    fn property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.members.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("name", &self.name)
            .field("members", &self.members.len())
            .field("async", &self.wiring.is_some())
            .finish_non_exhaustive()
    }
}

fn check_arity(method: &str, min_args: usize, got: usize) -> Result<(), HostError> {
    if got < min_args {
        return Err(HostError::type_error(format!(
            "{method} expects at least {min_args} argument(s), got {got}"
        )));
    }
    Ok(())
}

fn sync_function(name: &str, min_args: usize, handler: SyncHandler) -> Function {
    let method = name.to_owned();
    Function::new(name, min_args, move |realm, args| {
        check_arity(&method, min_args, args.len())?;
        match panic::catch_unwind(AssertUnwindSafe(|| handler(realm, args))) {
            Ok(result) => result.map_err(HostError::from),
            Err(payload) => {
                warn!(method = %method, "sync handler panicked");
                Err(HostError::new(format!(
                    "{method} panicked: {}",
                    panic_message(payload.as_ref())
                )))
            },
        }
    })
}

fn async_function(
    name: &str,
    min_args: usize,
    handler: AsyncHandler,
    wiring: AsyncWiring,
) -> Function {
    let method = name.to_owned();
    Function::new(name, min_args, move |realm, args| {
        check_arity(&method, min_args, args.len())?;
        let extracted = AsyncArgs::extract(&method, args).map_err(HostError::from)?;

        let (promise, resolve, reject) = Promise::with_resolvers();
        let id = realm.register_pending(resolve, reject);
        debug!(method = %method, pending = ?id, "dispatching async call");

        let completion = Completion {
            id,
            method: method.clone(),
            invoker: Arc::clone(&wiring.invoker),
            sent: false,
        };
        let handler = Arc::clone(&handler);
        wiring.executor.execute(Box::new(move || {
            let outcome = run_async_handler(&completion.method, &handler, &extracted);
            completion.complete(outcome);
        }));

        Ok(HostValue::Promise(promise))
    })
}

fn run_async_handler(
    method: &str,
    handler: &AsyncHandler,
    args: &AsyncArgs,
) -> Result<TypedValue, String> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(args))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            debug!(method, error = %err, "async handler failed");
            let message = err.to_string();
            if message.is_empty() {
                Err(format!("{method} failed"))
            } else {
                Err(message)
            }
        },
        Err(payload) => {
            warn!(method, "async handler panicked");
            Err(format!(
                "{method} panicked: {}",
                panic_message(payload.as_ref())
            ))
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Worker-side half of a pending operation.
///
/// Sends exactly one settlement to the interpreter thread: the handler's
/// outcome via [`Completion::complete`], or a rejection from `Drop` if the
/// executor discarded the task without running it.
struct Completion {
    id: PendingId,
    method: String,
    invoker: Arc<dyn MainThreadInvoker>,
    sent: bool,
}

impl Completion {
    fn complete(mut self, outcome: Result<TypedValue, String>) {
        self.sent = true;
        self.send(outcome);
    }

    fn send(&self, outcome: Result<TypedValue, String>) {
        let id = self.id;
        self.invoker.invoke_async(Box::new(move |realm| {
            realm.settle_pending(id, outcome);
        }));
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.sent {
            warn!(method = %self.method, pending = ?self.id, "async task dropped before it ran");
            self.send(Err(format!(
                "{}: operation was dropped before it ran",
                self.method
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::executor::Task;
    use crate::host::ErrorKind;

    /// Executor that runs tasks inline on the calling thread.
    struct InlineExecutor;

    impl TaskExecutor for InlineExecutor {
        fn execute(&self, task: Task) {
            task();
        }
    }

    /// Executor that discards every task.
    struct DiscardingExecutor;

    impl TaskExecutor for DiscardingExecutor {
        fn execute(&self, task: Task) {
            drop(task);
        }
    }

    /// Invoker that stores tasks for the test to run.
    #[derive(Default)]
    struct QueueInvoker(Mutex<Vec<crate::invoker::MainThreadTask>>);

    impl QueueInvoker {
        fn run_all(&self, realm: &Realm) -> usize {
            let tasks: Vec<_> = self.0.lock().unwrap().drain(..).collect();
            let n = tasks.len();
            for task in tasks {
                task(realm);
            }
            n
        }
    }

    impl MainThreadInvoker for QueueInvoker {
        fn invoke_async(&self, task: crate::invoker::MainThreadTask) {
            self.0.lock().unwrap().push(task);
        }
    }

    fn call(bridge: &Bridge, realm: &Realm, name: &str, args: &[HostValue]) -> Result<HostValue, HostError> {
        let f = bridge.get(realm, name)?;
        f.as_function().unwrap().call(realm, args)
    }

    #[test]
    fn test_async_without_executor_fails_build() {
        let mut builder = BridgeBuilder::new("fs");
        builder.register_async("exists", 1, |_| Ok(TypedValue::Unit));
        let err = builder.build().unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(_)));
    }

    #[test]
    fn test_async_without_invoker_fails_build() {
        let mut builder = BridgeBuilder::new("fs").with_executor(Arc::new(InlineExecutor));
        builder.register_async("exists", 1, |_| Ok(TypedValue::Unit));
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_sync_only_bridge_needs_no_wiring() {
        let mut builder = BridgeBuilder::new("platform");
        builder.register_property("platform", |_| Ok(HostValue::from("linux")));
        let bridge = builder.build().unwrap();
        let realm = Realm::new();
        assert_eq!(bridge.get(&realm, "platform").unwrap().as_str(), Some("linux"));
        assert!(matches!(bridge.get(&realm, "missing").unwrap(), HostValue::Undefined));
    }

    #[test]
    fn test_sync_errors_become_host_errors() {
        let mut builder = BridgeBuilder::new("fs");
        builder.register_sync("fail", 0, |_, _| Err(BridgeError::Native("disk on fire".into())));
        builder.register_sync("boom", 0, |_, _| panic!("kaboom"));
        let bridge = builder.build().unwrap();
        let realm = Realm::new();

        let err = call(&bridge, &realm, "fail", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Error);
        assert_eq!(err.message(), "disk on fire");

        let err = call(&bridge, &realm, "boom", &[]).unwrap_err();
        assert!(err.message().contains("kaboom"));
    }

    #[test]
    fn test_arity_shortfall_is_type_error() {
        let mut builder = BridgeBuilder::new("fs");
        builder.register_sync("two", 2, |_, _| Ok(HostValue::Undefined));
        let bridge = builder.build().unwrap();
        let realm = Realm::new();
        let err = call(&bridge, &realm, "two", &[HostValue::from(1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeError);
    }

    #[test]
    fn test_function_cache_is_per_realm() {
        let mut builder = BridgeBuilder::new("fs");
        builder.register_sync("noop", 0, |_, _| Ok(HostValue::Undefined));
        let bridge = builder.build().unwrap();

        let first = Realm::new();
        let a = bridge.get(&first, "noop").unwrap();
        let b = bridge.get(&first, "noop").unwrap();
        assert!(Function::ptr_eq(a.as_function().unwrap(), b.as_function().unwrap()));

        let second = Realm::new();
        let c = bridge.get(&second, "noop").unwrap();
        assert!(!Function::ptr_eq(a.as_function().unwrap(), c.as_function().unwrap()));
    }

    #[test]
    fn test_read_only_write_is_ignored() {
        let stored = Rc::new(RefCell::new(String::from("a")));
        let mut builder = BridgeBuilder::new("obj");
        builder.register_property("version", |_| Ok(HostValue::from("1.0.0")));
        let getter_value = Rc::clone(&stored);
        let setter_value = Rc::clone(&stored);
        builder.register_property_rw(
            "label",
            move |_| Ok(HostValue::from(getter_value.borrow().clone())),
            move |_, v| {
                *setter_value.borrow_mut() = v.as_str().unwrap_or_default().to_owned();
                Ok(())
            },
        );
        let bridge = builder.build().unwrap();
        let realm = Realm::new();

        bridge.set(&realm, "version", HostValue::from("9")).unwrap();
        assert_eq!(bridge.get(&realm, "version").unwrap().as_str(), Some("1.0.0"));

        bridge.set(&realm, "label", HostValue::from("b")).unwrap();
        assert_eq!(bridge.get(&realm, "label").unwrap().as_str(), Some("b"));
        assert_eq!(bridge.property_names(), vec!["label", "version"]);
    }

    #[test]
    fn test_async_resolves_through_invoker() {
        let invoker = Arc::new(QueueInvoker::default());
        let mut builder = BridgeBuilder::new("fs")
            .with_executor(Arc::new(InlineExecutor))
            .with_invoker(invoker.clone());
        builder.register_async("echo", 1, |args| Ok(TypedValue::from(args.string(0)?)));
        let bridge = builder.build().unwrap();
        let realm = Realm::new();

        let value = call(&bridge, &realm, "echo", &[HostValue::from("hi")]).unwrap();
        let promise = value.as_promise().unwrap().clone();
        assert!(promise.is_pending());

        assert_eq!(invoker.run_all(&realm), 1);
        match promise.state() {
            crate::host::PromiseState::Fulfilled(v) => assert_eq!(v.as_str(), Some("hi")),
            other => panic!("unexpected state {other:?}"),
        }
        assert_eq!(realm.pending_count(), 0);
    }

    #[test]
    fn test_dropped_task_still_rejects() {
        let invoker = Arc::new(QueueInvoker::default());
        let mut builder = BridgeBuilder::new("fs")
            .with_executor(Arc::new(DiscardingExecutor))
            .with_invoker(invoker.clone());
        builder.register_async("never", 0, |_| Ok(TypedValue::Unit));
        let bridge = builder.build().unwrap();
        let realm = Realm::new();

        let value = call(&bridge, &realm, "never", &[]).unwrap();
        assert_eq!(invoker.run_all(&realm), 1);
        match value.as_promise().unwrap().state() {
            crate::host::PromiseState::Rejected(reason) => {
                assert!(reason.as_error().unwrap().message().contains("dropped"));
            },
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_async_argument_error_throws_synchronously() {
        let invoker = Arc::new(QueueInvoker::default());
        let mut builder = BridgeBuilder::new("fs")
            .with_executor(Arc::new(InlineExecutor))
            .with_invoker(invoker.clone());
        builder.register_async("exists", 1, |_| Ok(TypedValue::Unit));
        let bridge = builder.build().unwrap();
        let realm = Realm::new();

        let err = call(&bridge, &realm, "exists", &[crate::host::Object::new().into()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeError);
        assert_eq!(realm.pending_count(), 0);
        assert_eq!(invoker.run_all(&realm), 0);
    }
}
