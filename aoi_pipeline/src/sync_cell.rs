//! Shared mutable value guarded by a mutex

use crate::types::Marker;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A value shared between threads. Clones share the same storage.
pub struct SynchronizedCell<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for SynchronizedCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SynchronizedCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    // A panicking writer leaves the value whole (every write replaces or
    // draws under the lock), so poisoning is not treated as an error.
    fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the value
    pub fn set(&self, value: T) {
        *self.lock() = value;
    }

    /// Read-modify-write under the lock
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }
}

impl<T: Clone> SynchronizedCell<T> {
    /// Copy of the current value
    pub fn get(&self) -> T {
        self.lock().clone()
    }
}

impl<T: Default> SynchronizedCell<T> {
    /// Move the value out, leaving the default behind
    pub fn take(&self) -> T {
        std::mem::take(&mut *self.lock())
    }
}

impl<T: Default> Default for SynchronizedCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Latest marker batch, written whole by workers and read whole by the UI
pub type MarkerSnapshot = SynchronizedCell<Vec<Marker>>;
