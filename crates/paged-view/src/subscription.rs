//! Progressive delivery of a page that keeps filling in after it was returned.
//!
//! A client returns a live [`PagingResult`](crate::PagingResult) together with
//! a [`LiveFeed`] it keeps a clone of. Each [`LiveFeed::append`] reaches the
//! view through a [`PagingSubscription`] and is appended to the page without
//! another round-trip. The subscription lives as long as its result is the
//! active page.
//!
//! Items appended before the view attaches are buffered and delivered on
//! attach; items appended after the subscription ended are dropped.

use std::sync::Arc;

use parking_lot::Mutex;
use paged_view_core::{ConnectionGuard, Signal};

use crate::targets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedPhase {
    Unattached,
    Attached,
    Detached,
    Closed,
}

struct FeedState<T> {
    phase: FeedPhase,
    pending: Vec<T>,
}

struct FeedInner<T> {
    state: Mutex<FeedState<T>>,
    appended: Arc<Signal<Vec<T>>>,
}

/// Producer handle for a live page result.
///
/// Cloning yields another handle to the same feed.
pub struct LiveFeed<T> {
    inner: Arc<FeedInner<T>>,
}

impl<T> Clone for LiveFeed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for LiveFeed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> LiveFeed<T> {
    /// Creates a feed with no consumer yet.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(FeedInner {
                state: Mutex::new(FeedState {
                    phase: FeedPhase::Unattached,
                    pending: Vec::new(),
                }),
                appended: Arc::new(Signal::new()),
            }),
        }
    }

    /// Delivers more items of the page.
    ///
    /// Returns `false` if nobody will ever see them: the consumer detached or
    /// the feed was closed.
    pub fn append(&self, items: Vec<T>) -> bool {
        if items.is_empty() {
            return true;
        }
        {
            let mut state = self.inner.state.lock();
            match state.phase {
                FeedPhase::Unattached => {
                    state.pending.extend(items);
                    return true;
                }
                FeedPhase::Detached | FeedPhase::Closed => {
                    tracing::trace!(
                        target: targets::FETCH,
                        dropped = items.len(),
                        "live feed has no consumer, dropping items"
                    );
                    return false;
                }
                FeedPhase::Attached => {}
            }
        }
        self.inner.appended.emit(items);
        true
    }

    /// Marks the page as complete. Later appends are dropped.
    pub fn close(&self) {
        self.inner.state.lock().phase = FeedPhase::Closed;
    }

    /// Returns `true` while a consumer is attached.
    pub fn is_attached(&self) -> bool {
        self.inner.state.lock().phase == FeedPhase::Attached
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().phase == FeedPhase::Closed
    }
}

/// The view's attachment to a [`LiveFeed`].
///
/// Dropping the subscription disconnects it; the feed then drops further
/// appends.
pub struct PagingSubscription<T: 'static> {
    feed: LiveFeed<T>,
    connection: ConnectionGuard<Vec<T>>,
    generation: u64,
}

impl<T: Clone + Send + Sync + 'static> PagingSubscription<T> {
    /// Attaches `on_append` to `feed` for the result of fetch `generation`.
    ///
    /// Items buffered before the attach are handed to `on_append` right away.
    /// The feed keeps buffering until the buffer is drained, so appends made
    /// meanwhile still arrive in order.
    pub fn attach<F>(feed: LiveFeed<T>, generation: u64, on_append: F) -> Self
    where
        F: Fn(&Vec<T>) + Send + Sync + 'static,
    {
        let on_append = Arc::new(on_append);
        let connection = loop {
            let buffered = {
                let mut state = feed.inner.state.lock();
                if state.pending.is_empty() {
                    let slot = Arc::clone(&on_append);
                    let connection = feed.inner.appended.connect_guarded(move |items| slot(items));
                    if state.phase == FeedPhase::Unattached {
                        state.phase = FeedPhase::Attached;
                    }
                    break connection;
                }
                std::mem::take(&mut state.pending)
            };
            on_append(&buffered);
        };

        Self {
            feed,
            connection,
            generation,
        }
    }

    /// The fetch generation whose result this subscription extends.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }
}

impl<T: 'static> Drop for PagingSubscription<T> {
    fn drop(&mut self) {
        self.connection.disconnect();
        let mut state = self.feed.inner.state.lock();
        if state.phase != FeedPhase::Closed {
            state.phase = FeedPhase::Detached;
        }
        state.pending.clear();
    }
}

impl<T: 'static> std::fmt::Debug for PagingSubscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagingSubscription")
            .field("generation", &self.generation)
            .field("connection", &self.connection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> (Arc<Mutex<Vec<Vec<u32>>>>, impl Fn(&Vec<u32>) + Send + Sync + 'static) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let recv = received.clone();
        (received, move |items: &Vec<u32>| recv.lock().push(items.clone()))
    }

    #[test]
    fn test_appends_reach_subscriber() {
        let feed = LiveFeed::new();
        let (received, on_append) = collector();
        let subscription = PagingSubscription::attach(feed.clone(), 1, on_append);

        assert!(feed.is_attached());
        assert!(feed.append(vec![1, 2]));
        assert!(feed.append(vec![3]));
        assert!(subscription.is_connected());
        assert_eq!(*received.lock(), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_items_before_attach_are_buffered() {
        let feed = LiveFeed::new();
        assert!(feed.append(vec![7, 8]));

        let (received, on_append) = collector();
        let _subscription = PagingSubscription::attach(feed.clone(), 4, on_append);
        assert_eq!(*received.lock(), vec![vec![7, 8]]);
    }

    #[test]
    fn test_appends_during_buffered_delivery_keep_order() {
        let feed = LiveFeed::new();
        assert!(feed.append(vec![1, 2]));

        let received = Arc::new(Mutex::new(Vec::new()));
        let recv = received.clone();
        let producer = feed.clone();
        let _subscription = PagingSubscription::attach(feed.clone(), 1, move |items: &Vec<u32>| {
            recv.lock().push(items.clone());
            if items[0] == 1 {
                assert!(producer.append(vec![3]));
            }
        });
        assert!(feed.append(vec![4]));

        assert_eq!(*received.lock(), vec![vec![1, 2], vec![3], vec![4]]);
    }

    #[test]
    fn test_drop_detaches() {
        let feed = LiveFeed::new();
        let (received, on_append) = collector();
        let subscription = PagingSubscription::attach(feed.clone(), 1, on_append);
        drop(subscription);

        assert!(!feed.is_attached());
        assert!(!feed.append(vec![1]));
        assert!(received.lock().is_empty());
    }

    #[test]
    fn test_close_stops_delivery() {
        let feed = LiveFeed::new();
        let (received, on_append) = collector();
        let _subscription = PagingSubscription::attach(feed.clone(), 1, on_append);

        feed.close();
        assert!(feed.is_closed());
        assert!(!feed.append(vec![1]));
        assert!(received.lock().is_empty());
    }
}
