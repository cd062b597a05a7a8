//! Scheduling work back onto the interpreter thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{BridgeError, BridgeResult};
use crate::host::{HostValue, Promise, PromiseState, Realm};

/// A closure to run on the interpreter thread.
pub type MainThreadTask = Box<dyn FnOnce(&Realm) + Send + 'static>;

/// The only legal path from a worker thread back to the interpreter.
///
/// Tasks run eventually, one at a time, never concurrently with other realm
/// activity. Ordering between tasks is whatever the underlying queue gives.
pub trait MainThreadInvoker: Send + Sync {
    /// Queue `task` for the interpreter thread.
    fn invoke_async(&self, task: MainThreadTask);
}

/// Invoker feeding an [`EventLoop`].
#[derive(Clone)]
pub struct LoopInvoker {
    tx: mpsc::UnboundedSender<MainThreadTask>,
}

impl MainThreadInvoker for LoopInvoker {
    fn invoke_async(&self, task: MainThreadTask) {
        if self.tx.send(task).is_err() {
            warn!("event loop has shut down; dropping main-thread task");
        }
    }
}

/// Interpreter-thread event loop.
///
/// Owns the [`Realm`] and the receiving end of the main-thread queue. The
/// embedder pumps it with [`EventLoop::run_until_idle`] or
/// [`EventLoop::block_on`].
pub struct EventLoop {
    realm: Realm,
    tx: mpsc::UnboundedSender<MainThreadTask>,
    rx: mpsc::UnboundedReceiver<MainThreadTask>,
    runtime: Runtime,
}

impl EventLoop {
    /// Create a loop around a fresh realm.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Runtime`] if the timer runtime cannot be built.
    pub fn new() -> BridgeResult<Self> {
        Self::with_realm(Realm::new())
    }

    /// Create a loop around an existing realm.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Runtime`] if the timer runtime cannot be built.
    pub fn with_realm(realm: Realm) -> BridgeResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| BridgeError::Runtime(format!("failed to start event loop: {e}")))?;
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self {
            realm,
            tx,
            rx,
            runtime,
        })
    }

    /// The realm this loop drives.
    #[must_use]
    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// An invoker that queues onto this loop.
    #[must_use]
    pub fn invoker(&self) -> Arc<dyn MainThreadInvoker> {
        Arc::new(LoopInvoker {
            tx: self.tx.clone(),
        })
    }

    /// Run queued tasks and microtasks until both queues are empty.
    /// Returns how many units of work ran.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0usize;
        loop {
            ran = ran.saturating_add(self.realm.run_microtasks());
            match self.rx.try_recv() {
                Ok(task) => {
                    task(&self.realm);
                    ran = ran.saturating_add(1);
                },
                Err(_) => break,
            }
        }
        ran
    }

    /// Pump the loop until `promise` settles.
    ///
    /// Returns `Ok(Ok(value))` on fulfilment and `Ok(Err(reason))` on
    /// rejection.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Timeout`] if nothing settles the promise within
    /// `timeout`.
    pub fn block_on(
        &mut self,
        promise: &Promise,
        timeout: Duration,
    ) -> BridgeResult<Result<HostValue, HostValue>> {
        let deadline = Instant::now()
            .checked_add(timeout)
            .ok_or(BridgeError::Timeout(timeout))?;
        loop {
            self.realm.run_microtasks();
            match promise.state() {
                PromiseState::Fulfilled(value) => return Ok(Ok(value)),
                PromiseState::Rejected(reason) => return Ok(Err(reason)),
                PromiseState::Pending => {},
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(BridgeError::Timeout(timeout));
            }

            let rx = &mut self.rx;
            let next = self
                .runtime
                .block_on(async { tokio::time::timeout(remaining, rx.recv()).await });
            match next {
                Ok(Some(task)) => task(&self.realm),
                Ok(None) => {
                    return Err(BridgeError::Runtime("main-thread queue closed".to_owned()));
                },
                Err(_) => return Err(BridgeError::Timeout(timeout)),
            }
        }
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypedValue;

    #[test]
    fn test_tasks_run_on_loop_thread() {
        let mut event_loop = EventLoop::new().unwrap();
        let invoker = event_loop.invoker();
        let loop_thread = std::thread::current().id();

        let handle = std::thread::spawn(move || {
            invoker.invoke_async(Box::new(move |_realm| {
                assert_eq!(std::thread::current().id(), loop_thread);
            }));
        });
        handle.join().unwrap();

        assert_eq!(event_loop.run_until_idle(), 1);
    }

    #[test]
    fn test_block_on_settles_from_worker() {
        let mut event_loop = EventLoop::new().unwrap();
        let (promise, resolve, reject) = Promise::with_resolvers();
        let id = event_loop.realm().register_pending(resolve, reject);
        let invoker = event_loop.invoker();

        std::thread::spawn(move || {
            invoker.invoke_async(Box::new(move |realm| {
                realm.settle_pending(id, Ok(TypedValue::from("done")));
            }));
        });

        let outcome = event_loop
            .block_on(&promise, Duration::from_secs(5))
            .unwrap();
        assert_eq!(outcome.unwrap().as_str(), Some("done"));
        assert_eq!(event_loop.realm().pending_count(), 0);
    }

    #[test]
    fn test_block_on_times_out() {
        let mut event_loop = EventLoop::new().unwrap();
        let (promise, _resolve, _reject) = Promise::with_resolvers();
        let err = event_loop
            .block_on(&promise, Duration::from_millis(20))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Timeout(_)));
    }

    #[test]
    fn test_send_after_loop_dropped_is_ignored() {
        let event_loop = EventLoop::new().unwrap();
        let invoker = event_loop.invoker();
        drop(event_loop);
        invoker.invoke_async(Box::new(|_| {}));
    }
}
