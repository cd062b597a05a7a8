use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::{Array, ArrayBuffer, Function, HostError, HostValue, Object};
use crate::value::TypedValue;

static NEXT_REALM_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a realm, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RealmId(u64);

/// Key of an in-flight asynchronous call in a realm's pending table.
///
/// This is the only piece of a pending operation that may leave the
/// interpreter thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingId(u64);

type Microtask = Box<dyn FnOnce(&Realm)>;

struct PendingOperation {
    resolve: Function,
    reject: Function,
}

/// A single-threaded host interpreter context.
///
/// Owns the microtask queue and the table of pending operations. Cloning
/// yields another handle to the same realm.
#[derive(Clone)]
pub struct Realm(Rc<RealmInner>);

struct RealmInner {
    id: RealmId,
    microtasks: RefCell<VecDeque<Microtask>>,
    pending: RefCell<HashMap<PendingId, PendingOperation>>,
    next_pending: Cell<u64>,
}

impl Realm {
    /// Create a fresh realm with a process-unique id.
    #[must_use]
    pub fn new() -> Self {
        Self(Rc::new(RealmInner {
            id: RealmId(NEXT_REALM_ID.fetch_add(1, Ordering::Relaxed)),
            microtasks: RefCell::new(VecDeque::new()),
            pending: RefCell::new(HashMap::new()),
            next_pending: Cell::new(1),
        }))
    }

    /// Realm identity.
    #[must_use]
    pub fn id(&self) -> RealmId {
        self.0.id
    }

    /// Allocate a buffer holding a copy of `bytes`.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn new_array_buffer(&self, bytes: &[u8]) -> ArrayBuffer {
        ArrayBuffer::new(bytes.to_vec())
    }

    /// Allocate an empty array.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn new_array(&self) -> Array {
        Array::new()
    }

    /// Allocate an empty object.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn new_object(&self) -> Object {
        Object::new()
    }

    /// Queue a microtask.
    pub fn enqueue_microtask(&self, task: impl FnOnce(&Realm) + 'static) {
        self.0.microtasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run microtasks until the queue is empty, including ones queued while
    /// draining. Returns how many ran.
    pub fn run_microtasks(&self) -> usize {
        let mut ran = 0usize;
        loop {
            let next = self.0.microtasks.borrow_mut().pop_front();
            let Some(task) = next else { break };
            task(self);
            ran = ran.saturating_add(1);
        }
        ran
    }

    /// Number of queued microtasks.
    #[must_use]
    pub fn microtask_count(&self) -> usize {
        self.0.microtasks.borrow().len()
    }

    /// Record the resolvers of a newly created promise.
    pub fn register_pending(&self, resolve: Function, reject: Function) -> PendingId {
        let id = PendingId(self.0.next_pending.get());
        self.0.next_pending.set(id.0.wrapping_add(1));
        self.0
            .pending
            .borrow_mut()
            .insert(id, PendingOperation { resolve, reject });
        id
    }

    /// Settle a pending operation.
    ///
    /// `Ok` values are converted into host values here, on the interpreter
    /// thread, and passed to `resolve`. `Err` messages become an `Error`
    /// passed to `reject`. The entry is removed first, so a second call for
    /// the same id does nothing and returns `false`.
    pub fn settle_pending(&self, id: PendingId, outcome: Result<TypedValue, String>) -> bool {
        let entry = self.0.pending.borrow_mut().remove(&id);
        let Some(op) = entry else {
            debug!(?id, "pending operation already settled");
            return false;
        };

        let result = match outcome {
            Ok(value) => {
                let value = value.into_host(self);
                op.resolve.call(self, &[value])
            },
            Err(message) => op
                .reject
                .call(self, &[HostValue::Error(HostError::new(message))]),
        };
        if let Err(e) = result {
            warn!(?id, error = %e, "promise resolver threw");
        }
        true
    }

    /// Number of operations still awaiting settlement.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.0.pending.borrow().len()
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Realm")
            .field("id", &self.0.id)
            .field("pending", &self.pending_count())
            .field("microtasks", &self.microtask_count())
            .finish()
    }
}
