//! Integer handles for native resources.
//!
//! Worker threads reach an open resource through its handle id without
//! touching host state. Ids come from a monotonic counter and are never
//! reused while the table lives, so a late operation can never land on a
//! different resource that happens to share its id. Once the counter runs
//! out, registration fails instead of wrapping.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{trace, warn};

use crate::error::{BridgeError, BridgeResult};

/// Thread-safe map from handle ids to shared resources.
///
/// The lock covers only map insert, lookup and erase. Constructing a
/// resource and tearing one down both happen outside it.
pub struct HandleTable<T> {
    entries: Mutex<HashMap<u32, Arc<T>>>,
    next_id: AtomicU32,
}

impl<T> HandleTable<T> {
    /// Create an empty table. The first id handed out is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, Arc<T>>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("handle table lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Construct a resource with `open` (outside the lock) and register it.
    ///
    /// # Errors
    ///
    /// Propagates the constructor's error; no id is consumed in that case.
    /// Fails with [`BridgeError::HandlesExhausted`] when no id is left.
    pub fn open_with<E, F>(&self, open: F) -> Result<u32, E>
    where
        E: From<BridgeError>,
        F: FnOnce() -> Result<T, E>,
    {
        let resource = open()?;
        Ok(self.insert(resource)?)
    }

    /// Register an already constructed resource and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::HandlesExhausted`] once the counter reaches
    /// `u32::MAX`.
    pub fn insert(&self, resource: T) -> BridgeResult<u32> {
        let id = self
            .next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
            .map_err(|_| BridgeError::HandlesExhausted)?;
        self.lock().insert(id, Arc::new(resource));
        trace!(id, "handle registered");
        Ok(id)
    }

    /// Shared reference to the resource behind `id`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidHandle`] if `id` is unknown or removed.
    pub fn get(&self, id: u32) -> BridgeResult<Arc<T>> {
        self.lock()
            .get(&id)
            .cloned()
            .ok_or(BridgeError::InvalidHandle(id))
    }

    /// Unregister `id` and hand back ownership for teardown.
    ///
    /// Operations that already hold the resource keep it alive until they
    /// finish.
    pub fn remove(&self, id: u32) -> Option<Arc<T>> {
        let removed = self.lock().remove(&id);
        trace!(id, found = removed.is_some(), "handle removed");
        removed
    }

    /// Unregister every handle, returning the resources for teardown.
    pub fn drain(&self) -> Vec<Arc<T>> {
        self.lock().drain().map(|(_, resource)| resource).collect()
    }

    /// Number of live handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no handles are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for HandleTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleTable")
            .field("live", &self.len())
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}
