//! Minimal change-notification substrate.
//!
//! An [`Observable`] is a shared cell that calls its listeners with the old
//! and new value after every write. Hosts with their own reactive system
//! feed the engine by calling [`Observable::set`] from their signals.

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Listener<T> = Arc<dyn Fn(&T, &T) + Send + Sync>;

struct Shared<T> {
    value: RwLock<T>,
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    next_id: AtomicU64,
}

/// A shared, observable value.
///
/// Clones share the same cell.
pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                value: RwLock::new(value),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.shared.value.read().clone()
    }

    /// Runs `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.shared.value.read())
    }

    /// Replaces the value and notifies every listener.
    ///
    /// Listeners run on the caller's thread after the write lock is released,
    /// so they may read this observable or subscribe to it.
    pub fn set(&self, value: T) {
        let old = std::mem::replace(&mut *self.shared.value.write(), value.clone());
        self.notify(&old, &value);
    }

    /// Modifies the value in place and notifies every listener.
    ///
    /// `f` runs under the write lock, so concurrent updates never overwrite
    /// each other; it must not touch this observable.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let (old, new) = {
            let mut value = self.shared.value.write();
            let old = value.clone();
            f(&mut *value);
            (old, value.clone())
        };
        self.notify(&old, &new);
    }

    /// Registers `listener`; it stays registered until the returned
    /// [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared.listeners.lock().push((id, Arc::new(listener)));

        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        Subscription::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.listeners.lock().retain(|(lid, _)| *lid != id);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.lock().len()
    }

    fn notify(&self, old: &T, new: &T) {
        let listeners: Vec<Listener<T>> = self
            .shared
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(old, new);
        }
    }
}

impl<T: Clone + Send + Sync + 'static> From<T> for Observable<T> {
    fn from(value: T) -> Self {
        Observable::new(value)
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for Observable<T> {
    fn default() -> Self {
        Observable::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.shared.value.read())
            .field("listeners", &self.shared.listeners.lock().len())
            .finish()
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribes now.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
