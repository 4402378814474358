//! Observable state container shared by every store in the crate.
//!
//! A [`Store`] owns an immutable snapshot behind an [`Arc`]. Mutations build
//! a complete next state and swap it in, so a reader holding a snapshot never
//! sees a half-applied change. After each swap every subscriber is called
//! synchronously with `(current, previous)`.
//!
//! Listener callbacks run without any internal lock held, so a callback may
//! subscribe or drop its own [`Subscription`] while being notified.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Callback invoked after a state transition with `(current, previous)`.
pub type Listener<S> = Arc<dyn Fn(&S, &S) + Send + Sync>;

struct ListenerSet<S> {
    next_id: u64,
    entries: Vec<(u64, Listener<S>)>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A single-owner state cell with synchronous change notification.
pub struct Store<S> {
    name: &'static str,
    state: Arc<S>,
    listeners: Arc<Mutex<ListenerSet<S>>>,
}

impl<S: Send + Sync + 'static> Store<S> {
    /// Create a store holding `initial`. `name` tags log lines.
    pub fn new(name: &'static str, initial: S) -> Self {
        Self {
            name,
            state: Arc::new(initial),
            listeners: Arc::new(Mutex::new(ListenerSet {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Borrow the current state.
    pub fn get(&self) -> &S {
        &self.state
    }

    /// Cheap shared handle to the current state.
    pub fn snapshot(&self) -> Arc<S> {
        Arc::clone(&self.state)
    }

    /// Register a listener. Dropping the returned handle unsubscribes it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&S, &S) + Send + Sync + 'static,
    {
        let id = {
            let mut set = lock(&self.listeners);
            let id = set.next_id;
            set.next_id = set.next_id.wrapping_add(1);
            set.entries.push((id, Arc::new(listener)));
            id
        };
        tracing::debug!(store = self.name, subscription = id, "listener subscribed");

        let weak: Weak<Mutex<ListenerSet<S>>> = Arc::downgrade(&self.listeners);
        let name = self.name;
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    lock(&listeners).entries.retain(|(entry_id, _)| *entry_id != id);
                    tracing::debug!(store = name, subscription = id, "listener unsubscribed");
                }
            })),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }

    /// Compute the next state from the current one and publish it.
    ///
    /// Returning `None` from `f` leaves the state untouched and notifies
    /// nobody. Returns whether a transition happened.
    pub fn update<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&S) -> Option<S>,
    {
        let Some(next) = f(&self.state) else {
            return false;
        };
        let previous = std::mem::replace(&mut self.state, Arc::new(next));
        self.notify(&previous);
        true
    }

    fn notify(&self, previous: &S) {
        let listeners: Vec<Listener<S>> = lock(&self.listeners)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        tracing::trace!(store = self.name, listeners = listeners.len(), "notifying");
        for listener in listeners {
            listener(&self.state, previous);
        }
    }
}

/// Handle returned by [`Store::subscribe`].
///
/// The listener stays registered for as long as this handle lives.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}
