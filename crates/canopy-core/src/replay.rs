//! Replay-latest channels and coalescing caches.
//!
//! [`ReplayLatest`] is the session's unit of shared state: it keeps the
//! most recent value, hands it to every new subscriber, and pushes later
//! values to all current subscribers. It is backed by a
//! [`tokio::sync::watch`] channel, so publishing never blocks and never
//! fails for lack of receivers.
//!
//! [`ReplayCache`] wraps a `ReplayLatest` with coalesced lazy
//! initialisation: exactly one caller runs the async initializer while
//! concurrent callers wait for and share its result.

use std::fmt;
use std::future::Future;

use tokio::sync::{OnceCell, watch};

/// A replay-latest value channel.
pub struct ReplayLatest<T> {
    sender: watch::Sender<Option<T>>,
}

impl<T: Clone> ReplayLatest<T> {
    /// Create an empty channel. Subscribers wait until a value is published.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Create a channel holding an initial value.
    #[must_use]
    pub fn with_value(value: T) -> Self {
        let (sender, _) = watch::channel(Some(value));
        Self { sender }
    }

    /// Publish a value, replacing the current one.
    pub fn publish(&self, value: T) {
        self.sender.send_replace(Some(value));
    }

    /// Publish a value only if the channel does not hold one yet.
    ///
    /// Returns `true` if the value was stored.
    pub fn publish_if_empty(&self, value: T) -> bool {
        self.sender.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(value);
                true
            } else {
                false
            }
        })
    }

    /// Mutate the current value in place and notify subscribers.
    ///
    /// Does nothing and returns `false` when the channel is empty.
    pub fn modify(&self, f: impl FnOnce(&mut T)) -> bool {
        self.sender.send_if_modified(|current| match current {
            Some(value) => {
                f(value);
                true
            },
            None => false,
        })
    }

    /// The most recently published value, if any.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.sender.borrow().clone()
    }

    /// Whether a value has been published.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// Subscribe to the channel.
    ///
    /// The first call to [`ReplayReceiver::next`] yields the current value
    /// (if any); later calls wait for new publications.
    #[must_use]
    pub fn subscribe(&self) -> ReplayReceiver<T> {
        ReplayReceiver {
            receiver: self.sender.subscribe(),
            replayed: false,
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> Default for ReplayLatest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ReplayLatest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayLatest")
            .field("has_value", &self.sender.borrow().is_some())
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

/// Receiving side of a [`ReplayLatest`].
pub struct ReplayReceiver<T> {
    receiver: watch::Receiver<Option<T>>,
    replayed: bool,
}

impl<T: Clone> ReplayReceiver<T> {
    /// Wait for the next value.
    ///
    /// Returns `None` once the publishing side has been dropped.
    pub async fn next(&mut self) -> Option<T> {
        if !self.replayed {
            self.replayed = true;
            if let Some(value) = self.receiver.borrow_and_update().clone() {
                return Some(value);
            }
        }
        loop {
            if self.receiver.changed().await.is_err() {
                return None;
            }
            if let Some(value) = self.receiver.borrow_and_update().clone() {
                return Some(value);
            }
        }
    }

    /// The current value without waiting.
    #[must_use]
    pub fn current(&self) -> Option<T> {
        self.receiver.borrow().clone()
    }
}

impl<T> fmt::Debug for ReplayReceiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayReceiver")
            .field("replayed", &self.replayed)
            .finish_non_exhaustive()
    }
}

/// A lazily initialised [`ReplayLatest`] with coalesced initialisation.
pub struct ReplayCache<T> {
    channel: ReplayLatest<T>,
    initial: OnceCell<T>,
}

impl<T: Clone> ReplayCache<T> {
    /// Create an uninitialised cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channel: ReplayLatest::new(),
            initial: OnceCell::new(),
        }
    }

    /// Return the current value, running `init` if no value exists yet.
    ///
    /// Only one initializer runs even under concurrent calls; the others
    /// wait for it. A failed initializer leaves the cache uninitialised so
    /// the next caller retries.
    ///
    /// # Errors
    ///
    /// Returns the initializer's error.
    pub async fn get_or_try_init<E, F, Fut>(&self, init: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.channel.latest() {
            return Ok(value);
        }
        let initial = self.initial.get_or_try_init(init).await?.clone();
        self.channel.publish_if_empty(initial.clone());
        Ok(self.channel.latest().unwrap_or(initial))
    }

    /// Replace the cached value.
    pub fn publish(&self, value: T) {
        self.channel.publish(value);
    }

    /// Mutate the cached value in place. Returns `false` if uninitialised.
    pub fn modify(&self, f: impl FnOnce(&mut T)) -> bool {
        self.channel.modify(f)
    }

    /// The current value without triggering initialisation.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.channel.latest()
    }

    /// Whether a value is available.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.channel.has_value()
    }

    /// Subscribe to the cached value and its replacements.
    #[must_use]
    pub fn subscribe(&self) -> ReplayReceiver<T> {
        self.channel.subscribe()
    }
}

impl<T: Clone> Default for ReplayCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ReplayCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayCache")
            .field("channel", &self.channel)
            .field("initialized", &self.initial.initialized())
            .finish()
    }
}
