//! Shared Store
//!
//! The store itself is strictly single-caller. `SharedStore` is the
//! external lock for callers that need to reach one store from several
//! threads: every call is serialized behind one mutex.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::medium::Medium;
use crate::store::Store;

/// Cloneable, mutex-serialized handle to a `Store`
pub struct SharedStore<M: Medium> {
    inner: Arc<Mutex<Store<M>>>,
}

impl<M: Medium> SharedStore<M> {
    pub fn new(store: Store<M>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Exclusive access until the guard is dropped
    ///
    /// Hold the guard across several calls to make them one unit, e.g.
    /// `find` followed by `get`.
    pub fn lock(&self) -> MutexGuard<'_, Store<M>> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access
    pub fn with<R>(&self, f: impl FnOnce(&mut Store<M>) -> R) -> R {
        let mut store = self.inner.lock();
        f(&mut store)
    }
}

impl<M: Medium> Clone for SharedStore<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
