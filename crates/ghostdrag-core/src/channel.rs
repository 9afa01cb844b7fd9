//! Synchronous broadcast channels.
//!
//! A [`Channel`] is an ordered registry of subscriber callbacks. Emission is
//! synchronous and in subscription order: every subscriber has run before
//! [`Channel::emit`] returns.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Registry<E> {
    next_id: u64,
    subscribers: Vec<(u64, Callback<E>)>,
}

/// Clonable handle to a broadcast channel.
pub struct Channel<E> {
    inner: Rc<RefCell<Registry<E>>>,
}

impl<E: 'static> Channel<E> {
    /// Create a channel with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Register a callback. It stays registered until the returned
    /// [`Subscription`] is released.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&E) + 'static,
    {
        let mut registry = self.inner.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        let callback: Callback<E> = Rc::new(RefCell::new(callback));
        registry.subscribers.push((id, callback));

        let weak: Weak<RefCell<Registry<E>>> = Rc::downgrade(&self.inner);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().subscribers.retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    /// Deliver an event to every current subscriber.
    ///
    /// Subscribers are snapshotted when emission starts, so callbacks may
    /// subscribe or unsubscribe while running. A callback that is already
    /// running further up the stack is skipped.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Callback<E>> = self
            .inner
            .borrow()
            .subscribers
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();

        for callback in snapshot {
            match callback.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(event),
                Err(_) => log::warn!("Skipping re-entrant channel subscriber"),
            }
        }
    }

    /// Number of current subscribers.
    pub fn len(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for Channel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Channel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for Channel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("subscribers", &self.inner.borrow().subscribers.len())
            .finish()
    }
}

/// Handle to one registered callback.
///
/// Releasing is idempotent. Dropping the handle releases it too.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Remove the callback from its channel.
    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Check if the callback is still registered through this handle.
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
