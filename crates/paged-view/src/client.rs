//! The paging client contract and two ready-made clients.
//!
//! A [`PagingClient`] turns a [`PagingRequest`] into a [`PagingResult`]. The
//! view awaits exactly one client call per issued fetch and never retries;
//! the client owns transport, sorting and any retry policy.
//!
//! - [`FnPagingClient`] adapts an async closure.
//! - [`InMemoryPagingClient`] pages a local `Vec`, useful for tests and
//!   demos.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::PagingError;
use crate::sort::{SortDescriptor, SortDirection};
use crate::subscription::LiveFeed;
use crate::targets;

/// A request for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingRequest {
    /// Zero-based page index.
    pub page_index: usize,
    /// Number of items to return. Already reduced by the frozen item count.
    pub page_size: usize,
    /// Sort criteria in priority order.
    pub sort_descriptors: Vec<SortDescriptor>,
}

impl PagingRequest {
    pub fn new(page_index: usize, page_size: usize, sort_descriptors: Vec<SortDescriptor>) -> Self {
        Self {
            page_index,
            page_size,
            sort_descriptors,
        }
    }

    /// Index of the first item of the page in the full dataset.
    pub fn offset(&self) -> usize {
        self.page_index.saturating_mul(self.page_size)
    }
}

/// One page of items plus the size of the whole dataset.
pub struct PagingResult<T> {
    /// Items of the page.
    pub items: Vec<T>,
    /// Number of items in the dataset, frozen items excluded.
    pub total_count: u64,
    live: Option<LiveFeed<T>>,
}

impl<T> PagingResult<T> {
    /// Creates a complete result.
    pub fn new(items: Vec<T>, total_count: u64) -> Self {
        Self {
            items,
            total_count,
            live: None,
        }
    }

    /// Creates a result that keeps filling in through `feed`.
    pub fn live(items: Vec<T>, total_count: u64, feed: LiveFeed<T>) -> Self {
        Self {
            items,
            total_count,
            live: Some(feed),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub(crate) fn into_parts(self) -> (Vec<T>, u64, Option<LiveFeed<T>>) {
        (self.items, self.total_count, self.live)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PagingResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagingResult")
            .field("items", &self.items)
            .field("total_count", &self.total_count)
            .field("is_live", &self.is_live())
            .finish()
    }
}

/// Source of pages for a [`PagedCollectionView`](crate::PagedCollectionView).
pub trait PagingClient<T>: Send + Sync {
    /// Fetches one page.
    fn fetch(
        &self,
        request: PagingRequest,
    ) -> impl Future<Output = Result<PagingResult<T>, PagingError>> + Send;
}

impl<T, C> PagingClient<T> for Arc<C>
where
    C: PagingClient<T>,
{
    fn fetch(
        &self,
        request: PagingRequest,
    ) -> impl Future<Output = Result<PagingResult<T>, PagingError>> + Send {
        (**self).fetch(request)
    }
}

/// A [`PagingClient`] backed by an async closure.
///
/// ```
/// use paged_view::{FnPagingClient, PagingError, PagingRequest, PagingResult};
///
/// let client = FnPagingClient::new(|request: PagingRequest| async move {
///     let start = request.offset() as u32;
///     let items: Vec<u32> = (start..start + request.page_size as u32).collect();
///     Ok::<_, PagingError>(PagingResult::new(items, 100))
/// });
/// # let _ = client;
/// ```
pub struct FnPagingClient<F> {
    fetch: F,
}

impl<F> FnPagingClient<F> {
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

impl<T, F, Fut> PagingClient<T> for FnPagingClient<F>
where
    F: Fn(PagingRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PagingResult<T>, PagingError>> + Send,
{
    fn fetch(
        &self,
        request: PagingRequest,
    ) -> impl Future<Output = Result<PagingResult<T>, PagingError>> + Send {
        (self.fetch)(request)
    }
}

impl<F> std::fmt::Debug for FnPagingClient<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnPagingClient").finish_non_exhaustive()
    }
}

/// Comparison function for one sort key.
pub type SortKeyFn<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A [`PagingClient`] that pages an in-memory `Vec`.
///
/// Sort descriptors are honored for keys registered with
/// [`with_sort_key`](Self::with_sort_key); unknown keys are ignored with a
/// warning. With [`with_live_chunks`](Self::with_live_chunks) pages are
/// returned as live results delivering the rest of the page in chunks,
/// `latency` apart.
pub struct InMemoryPagingClient<T> {
    items: RwLock<Vec<T>>,
    sort_keys: HashMap<String, SortKeyFn<T>>,
    latency: Option<Duration>,
    live_chunk: Option<usize>,
    fetch_count: AtomicUsize,
}

impl<T: Clone + Send + Sync + 'static> InMemoryPagingClient<T> {
    /// Creates a client over `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            sort_keys: HashMap::new(),
            latency: None,
            live_chunk: None,
            fetch_count: AtomicUsize::new(0),
        }
    }

    /// Registers the comparison used for sort key `key`.
    pub fn with_sort_key<F>(mut self, key: impl Into<String>, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.sort_keys.insert(key.into(), Arc::new(compare));
        self
    }

    /// Delays every fetch (and every live chunk) by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns pages as live results whose first `chunk` items arrive with
    /// the result and the rest through the feed, `chunk` at a time.
    ///
    /// Live delivery spawns onto the current tokio runtime.
    pub fn with_live_chunks(mut self, chunk: usize) -> Self {
        self.live_chunk = Some(chunk.max(1));
        self
    }

    /// Replaces the dataset. Takes effect on the next fetch.
    pub fn set_items(&self, items: Vec<T>) {
        *self.items.write() = items;
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(AtomicOrdering::SeqCst)
    }

    fn compare(&self, descriptors: &[SortDescriptor], a: &T, b: &T) -> Ordering {
        for descriptor in descriptors {
            let Some(compare) = self.sort_keys.get(&descriptor.key) else {
                continue;
            };
            let ordering = match descriptor.direction {
                SortDirection::Ascending => compare(a, b),
                SortDirection::Descending => compare(a, b).reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn page(&self, request: &PagingRequest) -> (Vec<T>, u64) {
        for descriptor in &request.sort_descriptors {
            if !self.sort_keys.contains_key(&descriptor.key) {
                tracing::warn!(
                    target: targets::FETCH,
                    key = %descriptor.key,
                    "no comparison registered for sort key, ignoring"
                );
            }
        }

        let mut items = self.items.read().clone();
        if !request.sort_descriptors.is_empty() {
            items.sort_by(|a, b| self.compare(&request.sort_descriptors, a, b));
        }

        let total = items.len() as u64;
        let start = request.offset().min(items.len());
        let end = start.saturating_add(request.page_size).min(items.len());
        (items.drain(start..end).collect(), total)
    }

    fn spawn_live(&self, mut rest: Vec<T>, chunk: usize) -> LiveFeed<T> {
        let feed = LiveFeed::new();
        let producer = feed.clone();
        let latency = self.latency;
        tokio::spawn(async move {
            while !rest.is_empty() {
                if let Some(latency) = latency {
                    tokio::time::sleep(latency).await;
                } else {
                    tokio::task::yield_now().await;
                }
                let tail = rest.split_off(chunk.min(rest.len()));
                let batch = std::mem::replace(&mut rest, tail);
                if !producer.append(batch) {
                    break;
                }
            }
            producer.close();
        });
        feed
    }
}

impl<T: Clone + Send + Sync + 'static> PagingClient<T> for InMemoryPagingClient<T> {
    async fn fetch(&self, request: PagingRequest) -> Result<PagingResult<T>, PagingError> {
        self.fetch_count.fetch_add(1, AtomicOrdering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let (mut items, total) = self.page(&request);
        tracing::trace!(
            target: targets::FETCH,
            page_index = request.page_index,
            returned = items.len(),
            total,
            "in-memory page served"
        );

        match self.live_chunk {
            Some(chunk) if items.len() > chunk => {
                let rest = items.split_off(chunk);
                let feed = self.spawn_live(rest, chunk);
                Ok(PagingResult::live(items, total, feed))
            }
            _ => Ok(PagingResult::new(items, total)),
        }
    }
}

impl<T> std::fmt::Debug for InMemoryPagingClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPagingClient")
            .field("len", &self.items.read().len())
            .field("sort_keys", &self.sort_keys.keys().collect::<Vec<_>>())
            .field("latency", &self.latency)
            .field("live_chunk", &self.live_chunk)
            .finish()
    }
}
