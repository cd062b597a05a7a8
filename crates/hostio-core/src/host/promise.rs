use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use super::{Function, HostValue, Realm};

/// Settlement state of a [`Promise`].
#[derive(Debug, Clone, Default)]
pub enum PromiseState {
    /// Not yet settled.
    #[default]
    Pending,
    /// Resolved with a value.
    Fulfilled(HostValue),
    /// Rejected with a reason.
    Rejected(HostValue),
}

type Reaction = Box<dyn FnOnce(&Realm, Result<HostValue, HostValue>)>;

/// A host promise.
///
/// Settles at most once; later resolve/reject calls are no-ops. Reactions
/// registered with [`Promise::then`] run as realm microtasks.
#[derive(Clone, Default)]
pub struct Promise(Rc<RefCell<PromiseInner>>);

#[derive(Default)]
struct PromiseInner {
    state: PromiseState,
    reactions: Vec<Reaction>,
}

impl Promise {
    /// Create a pending promise together with its `resolve` and `reject`
    /// functions.
    #[must_use]
    pub fn with_resolvers() -> (Self, Function, Function) {
        let promise = Self::default();

        let target = promise.clone();
        let resolve = Function::new("resolve", 1, move |realm, args| {
            target.settle(realm, Ok(args.first().cloned().unwrap_or_default()));
            Ok(HostValue::Undefined)
        });

        let target = promise.clone();
        let reject = Function::new("reject", 1, move |realm, args| {
            target.settle(realm, Err(args.first().cloned().unwrap_or_default()));
            Ok(HostValue::Undefined)
        });

        (promise, resolve, reject)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PromiseState {
        self.0.borrow().state.clone()
    }

    /// True until the promise settles.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.0.borrow().state, PromiseState::Pending)
    }

    /// Register a reaction to settlement.
    ///
    /// The reaction always runs as a microtask, even when the promise has
    /// already settled.
    pub fn then<F>(&self, realm: &Realm, reaction: F)
    where
        F: FnOnce(&Realm, Result<HostValue, HostValue>) + 'static,
    {
        let settled = {
            let mut inner = self.0.borrow_mut();
            let settled = match &inner.state {
                PromiseState::Pending => None,
                PromiseState::Fulfilled(v) => Some(Ok(v.clone())),
                PromiseState::Rejected(e) => Some(Err(e.clone())),
            };
            let Some(settled) = settled else {
                inner.reactions.push(Box::new(reaction));
                return;
            };
            settled
        };
        realm.enqueue_microtask(move |realm| reaction(realm, settled));
    }

    fn settle(&self, realm: &Realm, outcome: Result<HostValue, HostValue>) {
        let reactions = {
            let mut inner = self.0.borrow_mut();
            if !matches!(inner.state, PromiseState::Pending) {
                return;
            }
            inner.state = match &outcome {
                Ok(v) => PromiseState::Fulfilled(v.clone()),
                Err(e) => PromiseState::Rejected(e.clone()),
            };
            mem::take(&mut inner.reactions)
        };
        for reaction in reactions {
            let outcome = outcome.clone();
            realm.enqueue_microtask(move |realm| reaction(realm, outcome));
        }
    }
}
