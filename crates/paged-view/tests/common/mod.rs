//! Shared helpers for the paged view integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Once};

use paged_view::{
    LiveFeed, PagedCollectionView, PagingClient, PagingError, PagingRequest, PagingResult,
    ViewConfig,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;

static TRACING: Once = Once::new();

/// Installs a test subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A paging client over the integers `0..total` that records every request.
///
/// Fetches can be made to fail, held until released, or served as live
/// results the test keeps feeding.
#[derive(Default)]
pub struct ScriptedClient {
    total: Mutex<u64>,
    requests: Mutex<Vec<PagingRequest>>,
    failure: Mutex<Option<PagingError>>,
    gates: Mutex<HashMap<usize, oneshot::Receiver<()>>>,
    live: Mutex<Option<(usize, LiveFeed<u32>)>>,
}

impl ScriptedClient {
    pub fn new(total: u64) -> Self {
        Self {
            total: Mutex::new(total),
            ..Default::default()
        }
    }

    pub fn set_total(&self, total: u64) {
        *self.total.lock() = total;
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<PagingRequest> {
        self.requests.lock().clone()
    }

    /// Page indices of every request received so far.
    pub fn requested_pages(&self) -> Vec<usize> {
        self.requests.lock().iter().map(|r| r.page_index).collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Makes the next fetch fail with `error`.
    pub fn fail_next(&self, error: PagingError) {
        *self.failure.lock() = Some(error);
    }

    /// Holds the next fetch of `page_index` until the returned sender fires.
    pub fn gate(&self, page_index: usize) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(page_index, rx);
        tx
    }

    /// Serves the next fetch as a live result holding its first `initial`
    /// items. The returned feed delivers the rest.
    pub fn serve_live(&self, initial: usize) -> LiveFeed<u32> {
        let feed = LiveFeed::new();
        *self.live.lock() = Some((initial, feed.clone()));
        feed
    }

    fn page(&self, request: &PagingRequest) -> (Vec<u32>, u64) {
        let total = *self.total.lock();
        let start = (request.offset() as u64).min(total);
        let end = (start + request.page_size as u64).min(total);
        ((start as u32..end as u32).collect(), total)
    }
}

impl PagingClient<u32> for ScriptedClient {
    async fn fetch(&self, request: PagingRequest) -> Result<PagingResult<u32>, PagingError> {
        self.requests.lock().push(request.clone());

        let gate = self.gates.lock().remove(&request.page_index);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let failure = self.failure.lock().take();
        if let Some(error) = failure {
            return Err(error);
        }

        let (mut items, total) = self.page(&request);
        let live = self.live.lock().take();
        match live {
            Some((initial, feed)) => {
                items.truncate(initial);
                Ok(PagingResult::live(items, total, feed))
            }
            None => Ok(PagingResult::new(items, total)),
        }
    }
}

pub type ScriptedView = PagedCollectionView<u32, Arc<ScriptedClient>>;

/// A view over `total` items with the default configuration.
pub fn scripted_view(total: u64) -> (ScriptedView, Arc<ScriptedClient>) {
    scripted_view_with(total, ViewConfig::default())
}

pub fn scripted_view_with(total: u64, config: ViewConfig) -> (ScriptedView, Arc<ScriptedClient>) {
    init_tracing();
    let client = Arc::new(ScriptedClient::new(total));
    let view = PagedCollectionView::with_config(client.clone(), config)
        .expect("valid test configuration");
    (view, client)
}

/// Collects every emission of a signal.
pub fn record<A: Clone + Send + 'static>(
    signal: &paged_view_core::Signal<A>,
) -> Arc<Mutex<Vec<A>>> {
    let received = Arc::new(Mutex::new(Vec::new()));
    let recv = received.clone();
    signal.connect(move |args: &A| recv.lock().push(args.clone()));
    received
}
