//! Buffering single-consumer hand-off between OS callbacks and application code.
//!
//! Producers may [`EventChannel::push`] before anything is ready to consume.
//! The first consumer passed to [`EventChannel::attach`] receives everything
//! buffered so far, in push order, and from then on every push is delivered
//! to it directly.
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Callback receiving delivered values.
pub type Consumer<T> = Box<dyn FnMut(T) + Send>;

struct Inner<T> {
    pending: VecDeque<T>,
    consumer: Option<Consumer<T>>,
}

/// A typed hand-off slot with an ordered backlog and at most one consumer.
///
/// Delivery happens while the internal lock is held, so a push that races an
/// attach is ordered strictly before or after it and never reordered. A
/// consumer must therefore not push into the channel it is attached to.
pub struct EventChannel<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Send> EventChannel<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                pending: VecDeque::new(),
                consumer: None,
            }),
        }
    }

    /// Delivers `value` to the attached consumer, or buffers it if none is attached yet.
    pub fn push(&self, value: T) {
        let mut inner = self.lock();
        match inner.consumer.as_mut() {
            Some(consumer) => consumer(value),
            None => inner.pending.push_back(value),
        }
    }

    /// Installs `consumer`, replacing any previous one, and drains the backlog into it.
    pub fn attach<F>(&self, consumer: F)
    where
        F: FnMut(T) + Send + 'static,
    {
        let mut inner = self.lock();
        let mut consumer: Consumer<T> = Box::new(consumer);
        while let Some(value) = inner.pending.pop_front() {
            consumer(value);
        }
        inner.consumer = Some(consumer);
    }

    /// Number of values waiting for a consumer.
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    // A consumer that panicked leaves the state intact; keep serving it.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}
