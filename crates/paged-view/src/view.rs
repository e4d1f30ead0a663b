//! The paged collection view and its refresh engine.
//!
//! [`PagedCollectionView`] materializes one page of a server-backed dataset
//! plus the consumer's frozen items. Page moves, sort edits, frozen edits and
//! defer scope exits all funnel into a single refresh path that either
//! records the request (while deferred) or issues a fetch through the
//! [`PagingClient`]. The fetch is the only suspension point; everything else
//! runs synchronously on the caller's context.
//!
//! # Threading
//!
//! The view is driven from one logical execution context. Internal state
//! sits behind `parking_lot` locks so the view is `Send + Sync`, but no lock
//! is held across the fetch or while a signal is emitted, so slots may call
//! back into the view.
//!
//! # Overlapping fetches
//!
//! Calls are not serialized: a page move issued while another fetch is in
//! flight issues its own fetch. Each fetch carries a generation number and
//! the configured [`OverlapPolicy`] decides whether an older result that
//! completes late is applied or discarded.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Instrument;

use crate::client::{PagingClient, PagingRequest, PagingResult};
use crate::config::{OverlapPolicy, ViewConfig, validate_page_size};
use crate::defer::{DeferExit, DeferGuard};
use crate::error::{Error, Result};
use crate::events::{CollectionChange, ViewSignals};
use crate::frozen::{
    FrozenAction, FrozenChange, FrozenItems, FrozenOverlay, WindowLayout, compose,
};
use crate::observable::Attachment;
use crate::sort::{SortChange, SortDescriptorList, SortMediator};
use crate::state::{
    PageWindowState, PendingTrigger, PropertySnapshot, TakenRequests, effective_page_size,
};
use crate::subscription::PagingSubscription;
use crate::targets;

/// Equality used to find items in the window.
pub type ItemComparer<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// How a refresh request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A page was fetched and is now shown.
    Applied,
    /// A defer scope is open; the request was recorded.
    Deferred,
    /// A `page_changing` slot declined the page change.
    Canceled,
    /// The fetch completed after a newer result was applied and was dropped.
    Superseded,
    /// There was nothing to refresh.
    Skipped,
}

enum Prepared {
    Canceled,
    Deferred,
    Fetch {
        request: PagingRequest,
        generation: u64,
        taken: TakenRequests,
    },
}

/// State shared between the view and the slots it connects to its
/// collaborators.
struct Shared<T: 'static> {
    state: Mutex<PageWindowState<T>>,
    frozen: FrozenItems<T>,
    sort: SortDescriptorList,
    signals: ViewSignals<T>,
    comparer: ItemComparer<T>,
    mediator: SortMediator,
    overlap_policy: OverlapPolicy,
    subscription: Mutex<Option<PagingSubscription<T>>>,
}

impl<T: Clone + Send + Sync + 'static> Shared<T> {
    fn snapshot(&self) -> PropertySnapshot<T> {
        let frozen_count = self.frozen.len();
        self.state.lock().snapshot(frozen_count)
    }

    /// Emits `property_changed` for everything that differs from `before`.
    fn notify(&self, before: &PropertySnapshot<T>) {
        let after = self.snapshot();
        let changed = before.diff(&after, |a, b| (self.comparer)(a, b));
        self.signals.emit_properties(&changed);
    }

    fn window(&self) -> Vec<T> {
        let frozen = self.frozen.snapshot();
        let position = self.frozen.position();
        let state = self.state.lock();
        compose(&frozen, &state.unfrozen, position)
    }

    fn index_of(&self, item: &T) -> Option<usize> {
        self.window()
            .iter()
            .position(|candidate| (self.comparer)(candidate, item))
    }

    /// Everything `refresh_page_index` does before the fetch.
    fn prepare_fetch(&self, index: usize) -> Result<Prepared> {
        let before = self.snapshot();
        let page_change = {
            let mut state = self.state.lock();
            if state.disposed {
                return Err(Error::Disposed);
            }
            let page_change = state.page_index != Some(index);
            if page_change {
                state.is_page_changing = true;
            }
            page_change
        };

        if page_change {
            self.notify(&before);
            if self.signals.emit_page_changing(index) {
                let before = self.snapshot();
                self.state.lock().is_page_changing = false;
                self.notify(&before);
                tracing::trace!(target: targets::VIEW, page_index = index, "page change canceled");
                return Ok(Prepared::Canceled);
            }
        }

        let frozen_count = self.frozen.len();
        let sort_descriptors = self.sort.snapshot();
        let mut state = self.state.lock();
        if state.disposed {
            return Err(Error::Disposed);
        }
        if state.defer.is_deferred() {
            state.defer.record(index);
            tracing::debug!(
                target: targets::DEFER,
                page_index = index,
                level = state.defer.level(),
                "refresh deferred"
            );
            return Ok(Prepared::Deferred);
        }

        state.generation += 1;
        state.in_flight += 1;
        let taken = state.take_requests();
        let request = PagingRequest::new(
            index,
            effective_page_size(state.page_size, frozen_count),
            sort_descriptors,
        );
        Ok(Prepared::Fetch {
            request,
            generation: state.generation,
            taken,
        })
    }

    /// Bookkeeping for a fetch that completed without being applied.
    fn settle_unapplied(&self) {
        self.settle_failed(TakenRequests::default());
    }

    /// Like [`settle_unapplied`](Self::settle_unapplied), and hands the
    /// requests the fetch consumed back to the next refresh.
    fn settle_failed(&self, taken: TakenRequests) {
        let before = self.snapshot();
        {
            let mut state = self.state.lock();
            if !state.disposed {
                state.restore_requests(taken);
            }
            state.in_flight = state.in_flight.saturating_sub(1);
            if state.in_flight == 0 {
                state.is_page_changing = false;
            }
        }
        self.notify(&before);
    }

    fn is_stale(&self, state: &PageWindowState<T>, generation: u64) -> bool {
        state.disposed
            || (self.overlap_policy == OverlapPolicy::LatestRequestWins
                && generation < state.applied_generation)
    }

    fn apply_result(
        self: &Arc<Self>,
        index: usize,
        generation: u64,
        result: PagingResult<T>,
    ) -> RefreshOutcome {
        let (items, total_count, live) = result.into_parts();

        let reset_cursor = {
            let state = self.state.lock();
            if self.is_stale(&state, generation) {
                tracing::debug!(
                    target: targets::FETCH,
                    page_index = index,
                    generation,
                    applied = state.applied_generation,
                    "discarding superseded page result"
                );
                drop(state);
                self.settle_unapplied();
                return RefreshOutcome::Superseded;
            }
            !state.cursor.is_before_first()
        };

        if reset_cursor {
            self.signals.emit_current_changing(false);
        }

        let before = self.snapshot();
        let (page_changed, previous) = {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.applied_generation = generation;
            state.unfrozen = items;
            state.item_count = Some(total_count);
            state.cursor.reset();
            let page_changed = state.page_index != Some(index);
            state.page_index = Some(index);
            if state.in_flight == 0 {
                state.is_page_changing = false;
            }
            (page_changed, self.subscription.lock().take())
        };
        drop(previous);

        tracing::debug!(
            target: targets::FETCH,
            page_index = index,
            generation,
            total_count,
            "page applied"
        );

        self.signals.collection_changed.emit(CollectionChange::Reset);
        self.notify(&before);
        if reset_cursor {
            self.signals.current_changed.emit(());
        }
        if page_changed {
            self.signals.page_changed.emit(index);
        }

        if let Some(feed) = live {
            let weak = Arc::downgrade(self);
            let subscription = PagingSubscription::attach(feed, generation, move |items: &Vec<T>| {
                if let Some(shared) = weak.upgrade() {
                    shared.append_live(generation, items);
                }
            });
            let current = {
                let state = self.state.lock();
                !state.disposed && state.applied_generation == generation
            };
            if current {
                let replaced = self.subscription.lock().replace(subscription);
                drop(replaced);
            }
        }

        RefreshOutcome::Applied
    }

    fn append_live(&self, generation: u64, items: &[T]) {
        let position = self.frozen.position();
        let frozen_count = self.frozen.len();
        let index = {
            let mut state = self.state.lock();
            if state.disposed || state.applied_generation != generation {
                return;
            }
            let layout = WindowLayout {
                position,
                frozen: frozen_count,
                unfrozen: state.unfrozen.len(),
            };
            let index = layout.unfrozen_to_window(state.unfrozen.len());
            state.unfrozen.extend_from_slice(items);
            index
        };

        tracing::trace!(
            target: targets::FETCH,
            generation,
            appended = items.len(),
            "live items appended"
        );
        self.signals.collection_changed.emit(CollectionChange::Added {
            index,
            items: items.to_vec(),
        });
    }

    fn set_current(&self, position: isize) -> bool {
        let before = self.snapshot();
        let frozen = self.frozen.snapshot();
        let frozen_position = self.frozen.position();
        let moved = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let layout = WindowLayout {
                position: frozen_position,
                frozen: frozen.len(),
                unfrozen: state.unfrozen.len(),
            };
            let unfrozen = &state.unfrozen;
            state
                .cursor
                .move_to(position, layout.count(), |index| match layout.locate(index)? {
                    Ok(frozen_index) => frozen.get(frozen_index).cloned(),
                    Err(unfrozen_index) => unfrozen.get(unfrozen_index).cloned(),
                })
        };

        self.signals.current_changed.emit(());
        self.notify(&before);
        moved
    }

    fn on_sort_changed(&self, change: &SortChange) {
        let mut state = self.state.lock();
        if state.disposed || !self.mediator.requires_reset(change, state.has_refreshed()) {
            return;
        }
        if state.defer.is_deferred() {
            state.defer.record(0);
        } else {
            state.record_pending(PendingTrigger::FirstPage);
        }
        tracing::debug!(target: targets::SORT, ?change, "sort change resets to the first page");
    }

    fn on_frozen_changed(&self, change: &FrozenChange<T>) {
        let frozen = self.frozen.snapshot();
        let position = self.frozen.position();
        let (before, current, unfrozen, page_size, refreshed, on_last_page) = {
            let state = self.state.lock();
            if state.disposed {
                return;
            }
            (
                state.snapshot(change.old_count),
                state.cursor.item().cloned(),
                state.unfrozen.clone(),
                state.page_size,
                state.has_refreshed(),
                state.is_on_last_page(),
            )
        };

        let window = compose(&frozen, &unfrozen, position);
        let relocated = current.map(|item| {
            window
                .iter()
                .position(|candidate| (self.comparer)(candidate, &item))
        });
        let lost = matches!(relocated, Some(None));
        if lost {
            self.signals.emit_current_changing(false);
        }

        {
            let mut state = self.state.lock();
            match relocated {
                Some(index) => {
                    state.cursor.relocate(index);
                }
                None if !state.cursor.is_before_first() => {
                    state.cursor.move_to(window.len() as isize, window.len(), |_| None);
                }
                None => {}
            }
        }

        let layout_before = WindowLayout {
            position,
            frozen: change.old_count,
            unfrozen: unfrozen.len(),
        };
        let layout_after = WindowLayout {
            position,
            frozen: change.new_count,
            unfrozen: unfrozen.len(),
        };
        let collection_change = match &change.action {
            FrozenAction::Added { index, item } => CollectionChange::Added {
                index: layout_after.frozen_to_window(*index),
                items: vec![item.clone()],
            },
            FrozenAction::Removed { index, item } => CollectionChange::Removed {
                index: layout_before.frozen_to_window(*index),
                items: vec![item.clone()],
            },
            FrozenAction::Reset | FrozenAction::PositionChanged(_) => CollectionChange::Reset,
        };
        self.signals.collection_changed.emit(collection_change);
        if lost {
            self.signals.current_changed.emit(());
        }
        self.notify(&before);

        if !refreshed {
            return;
        }
        let overlay = FrozenOverlay {
            page_size,
            on_last_page,
        };
        if overlay.requires_refresh(change, window.len()) {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            match state.page_index {
                Some(page) if state.defer.is_deferred() => {
                    if state.defer.deferred_page().is_none() {
                        state.defer.record(page);
                    }
                }
                _ => state.record_pending(PendingTrigger::CurrentPage),
            }
            tracing::debug!(
                target: targets::FROZEN,
                old_count = change.old_count,
                new_count = change.new_count,
                window_count = window.len(),
                "frozen edit requires re-fetching the current page"
            );
        }
    }
}

/// A virtualized, paginated view over a server-backed dataset.
///
/// See the [crate documentation](crate) for an overview.
pub struct PagedCollectionView<T, C>
where
    T: Clone + Send + Sync + 'static,
    C: PagingClient<T>,
{
    shared: Arc<Shared<T>>,
    client: C,
    sort_attachment: Mutex<Attachment>,
    frozen_attachment: Mutex<Attachment>,
}

impl<T, C> PagedCollectionView<T, C>
where
    T: Clone + Send + Sync + PartialEq + 'static,
    C: PagingClient<T>,
{
    /// Creates a view with the default configuration, comparing items with
    /// `PartialEq`.
    pub fn new(client: C) -> Self {
        Self::build(client, ViewConfig::default(), Arc::new(|a: &T, b: &T| a == b))
    }

    /// Creates a view with `config`, comparing items with `PartialEq`.
    pub fn with_config(client: C, config: ViewConfig) -> Result<Self> {
        Self::with_comparer(client, config, |a: &T, b: &T| a == b)
    }
}

impl<T, C> PagedCollectionView<T, C>
where
    T: Clone + Send + Sync + 'static,
    C: PagingClient<T>,
{
    /// Creates a view with `config` and a custom item equality.
    pub fn with_comparer<F>(client: C, config: ViewConfig, comparer: F) -> Result<Self>
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        config.validate()?;
        Ok(Self::build(client, config, Arc::new(comparer)))
    }

    fn build(client: C, config: ViewConfig, comparer: ItemComparer<T>) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(PageWindowState::new(config.page_size)),
            frozen: FrozenItems::new(config.frozen_position),
            sort: SortDescriptorList::new(),
            signals: ViewSignals::new(),
            comparer,
            mediator: SortMediator::new(config.sort_reset_policy),
            overlap_policy: config.overlap_policy,
            subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&shared);
        let sort_attachment = Attachment::attach(&shared.sort, move |change: &SortChange| {
            if let Some(shared) = weak.upgrade() {
                shared.on_sort_changed(change);
            }
        });
        let weak = Arc::downgrade(&shared);
        let frozen_attachment = Attachment::attach(&shared.frozen, move |change: &FrozenChange<T>| {
            if let Some(shared) = weak.upgrade() {
                shared.on_frozen_changed(change);
            }
        });

        tracing::debug!(
            target: targets::VIEW,
            page_size = config.page_size,
            overlap_policy = ?config.overlap_policy,
            "paged collection view created"
        );

        Self {
            shared,
            client,
            sort_attachment: Mutex::new(sort_attachment),
            frozen_attachment: Mutex::new(frozen_attachment),
        }
    }

    // =========================================================================
    // Collaborators
    // =========================================================================

    /// Notifications emitted by this view.
    pub fn signals(&self) -> &ViewSignals<T> {
        &self.shared.signals
    }

    /// The sort criteria. Edits take effect on the next [`flush`](Self::flush).
    pub fn sort_descriptors(&self) -> &SortDescriptorList {
        &self.shared.sort
    }

    /// The frozen items. Edits take effect on the next [`flush`](Self::flush).
    pub fn frozen_items(&self) -> &FrozenItems<T> {
        &self.shared.frozen
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn overlap_policy(&self) -> OverlapPolicy {
        self.shared.overlap_policy
    }

    // =========================================================================
    // Page state
    // =========================================================================

    /// Index of the page shown, `None` before the first refresh.
    pub fn page_index(&self) -> Option<usize> {
        self.shared.state.lock().page_index
    }

    pub fn page_size(&self) -> usize {
        self.shared.state.lock().page_size
    }

    /// Number of pages, zero before the first refresh.
    pub fn page_count(&self) -> usize {
        self.shared.state.lock().page_count()
    }

    /// Highest page [`move_to_page`](Self::move_to_page) accepts, `None`
    /// before the first refresh.
    pub fn last_page_index(&self) -> Option<usize> {
        self.shared.state.lock().last_page_index()
    }

    /// Dataset size without frozen items, `None` before the first refresh.
    pub fn item_count(&self) -> Option<u64> {
        self.shared.state.lock().item_count
    }

    /// Dataset size with frozen items, `None` before the first refresh.
    pub fn total_item_count(&self) -> Option<u64> {
        let frozen_count = self.shared.frozen.len() as u64;
        self.item_count().map(|count| count + frozen_count)
    }

    pub fn has_refreshed(&self) -> bool {
        self.shared.state.lock().has_refreshed()
    }

    pub fn is_page_changing(&self) -> bool {
        self.shared.state.lock().is_page_changing
    }

    pub fn can_change_page(&self) -> bool {
        !self.shared.state.lock().disposed
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.state.lock().disposed
    }

    /// Changes the page size and, once refreshed, goes back to the first page.
    pub async fn set_page_size(&self, page_size: usize) -> Result<()> {
        validate_page_size(page_size)?;
        let before = self.shared.snapshot();
        let refreshed = {
            let mut state = self.shared.state.lock();
            if state.page_size == page_size {
                return Ok(());
            }
            state.page_size = page_size;
            state.has_refreshed()
        };
        self.shared.notify(&before);

        if refreshed {
            self.move_to_first_page().await?;
        }
        Ok(())
    }

    // =========================================================================
    // Page navigation
    // =========================================================================

    /// Moves to `page_index`.
    ///
    /// Returns `Ok(false)` if the page is beyond the last page; otherwise
    /// `Ok(true)` once the request was handled, even if a slot canceled it or
    /// a defer scope postponed it. Fetch failures are returned as errors and
    /// leave the view unchanged.
    pub async fn move_to_page(&self, page_index: usize) -> Result<bool> {
        {
            let state = self.shared.state.lock();
            if state.disposed {
                return Err(Error::Disposed);
            }
            if state.last_page_index().is_some_and(|last| page_index > last) {
                tracing::trace!(target: targets::VIEW, page_index, "page index out of range");
                return Ok(false);
            }
        }
        self.refresh_page_index(page_index).await?;
        Ok(true)
    }

    pub async fn move_to_first_page(&self) -> Result<bool> {
        self.move_to_page(0).await
    }

    /// Moves to the last page. Declined before the first refresh.
    pub async fn move_to_last_page(&self) -> Result<bool> {
        match self.last_page_index() {
            Some(last) => self.move_to_page(last).await,
            None => Ok(false),
        }
    }

    pub async fn move_to_next_page(&self) -> Result<bool> {
        let next = self.page_index().map_or(0, |index| index + 1);
        self.move_to_page(next).await
    }

    /// Moves to the previous page. Declined on the first page.
    pub async fn move_to_previous_page(&self) -> Result<bool> {
        match self.page_index() {
            Some(index) if index > 0 => self.move_to_page(index - 1).await,
            _ => Ok(false),
        }
    }

    /// Re-fetches the page the view should show.
    ///
    /// That is the page recorded while deferred, else the page a pending
    /// trigger asks for, else the current page, else the first page.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let target = {
            let state = self.shared.state.lock();
            if state.disposed {
                return Err(Error::Disposed);
            }
            if state.defer.is_deferred() {
                tracing::trace!(target: targets::DEFER, "refresh while deferred");
                return Ok(RefreshOutcome::Deferred);
            }
            match (state.defer.deferred_page(), state.pending) {
                (Some(page), _) => page,
                (None, Some(trigger)) => state.resolve(trigger),
                (None, None) => state.page_index.unwrap_or(0),
            }
        };
        self.refresh_page_index(target).await
    }

    /// Issues the refresh pending from sort or frozen edits, if any.
    ///
    /// Returns `Ok(None)` when nothing was pending. A failed fetch leaves the
    /// refresh pending.
    pub async fn flush(&self) -> Result<Option<RefreshOutcome>> {
        let target = {
            let state = self.shared.state.lock();
            if state.disposed {
                return Err(Error::Disposed);
            }
            let Some(trigger) = state.pending else {
                return Ok(None);
            };
            if state.defer.is_deferred() {
                return Ok(Some(RefreshOutcome::Deferred));
            }
            state.resolve(trigger)
        };
        self.refresh_page_index(target).await.map(Some)
    }

    /// Runs `edit` on the sort criteria, then [`flush`](Self::flush)es.
    pub async fn edit_sort<F>(&self, edit: F) -> Result<Option<RefreshOutcome>>
    where
        F: FnOnce(&SortDescriptorList),
    {
        edit(&self.shared.sort);
        self.flush().await
    }

    /// Runs `edit` on the frozen items, then [`flush`](Self::flush)es.
    pub async fn edit_frozen<F>(&self, edit: F) -> Result<Option<RefreshOutcome>>
    where
        F: FnOnce(&FrozenItems<T>),
    {
        edit(&self.shared.frozen);
        self.flush().await
    }

    async fn refresh_page_index(&self, index: usize) -> Result<RefreshOutcome> {
        let (request, generation, taken) = match self.shared.prepare_fetch(index)? {
            Prepared::Canceled => return Ok(RefreshOutcome::Canceled),
            Prepared::Deferred => return Ok(RefreshOutcome::Deferred),
            Prepared::Fetch {
                request,
                generation,
                taken,
            } => (request, generation, taken),
        };

        let page_size = request.page_size;
        tracing::debug!(
            target: targets::FETCH,
            page_index = index,
            page_size,
            generation,
            "issuing page fetch"
        );
        let span = tracing::debug_span!(
            target: targets::FETCH,
            "page_fetch",
            page_index = index,
            page_size,
            generation
        );

        match self.client.fetch(request).instrument(span).await {
            Ok(result) => Ok(self.shared.apply_result(index, generation, result)),
            Err(err) => {
                tracing::warn!(
                    target: targets::FETCH,
                    page_index = index,
                    generation,
                    error = %err,
                    "page fetch failed"
                );
                self.shared.settle_failed(taken);
                Err(Error::Fetch(err))
            }
        }
    }

    // =========================================================================
    // Deferral
    // =========================================================================

    /// Opens a defer scope and returns the new level.
    pub fn begin_defer(&self) -> usize {
        let level = self.shared.state.lock().defer.begin();
        tracing::trace!(target: targets::DEFER, level, "defer scope opened");
        level
    }

    /// Closes a defer scope. Closing the outermost scope runs
    /// [`refresh`](Self::refresh) once.
    pub async fn end_defer(&self) -> Result<RefreshOutcome> {
        let exit = self.shared.state.lock().defer.end();
        match exit {
            DeferExit::Nested(level) => {
                tracing::trace!(target: targets::DEFER, level, "defer scope closed");
                Ok(RefreshOutcome::Deferred)
            }
            DeferExit::Unbalanced => {
                tracing::warn!(
                    target: targets::DEFER,
                    "end_defer called without a matching begin_defer"
                );
                Ok(RefreshOutcome::Skipped)
            }
            DeferExit::Released => {
                tracing::debug!(target: targets::DEFER, "outermost defer scope closed");
                self.refresh().await
            }
        }
    }

    /// Opens a defer scope closed by the returned guard.
    pub fn defer_refresh(&self) -> DeferGuard<'_, T, C> {
        DeferGuard::new(self)
    }

    pub fn is_deferred(&self) -> bool {
        self.shared.state.lock().defer.is_deferred()
    }

    pub fn defer_level(&self) -> usize {
        self.shared.state.lock().defer.level()
    }

    /// Closes a scope whose guard was dropped without `finish`.
    ///
    /// The outermost scope leaves its refresh pending for the next
    /// [`flush`](Self::flush). A page change recorded in the scope is no
    /// longer in progress.
    pub(crate) fn abandon_defer(&self) {
        let before = self.shared.snapshot();
        {
            let mut state = self.shared.state.lock();
            match state.defer.end() {
                DeferExit::Released => {
                    state.record_pending(PendingTrigger::Refresh);
                    if state.in_flight == 0 {
                        state.is_page_changing = false;
                    }
                    tracing::warn!(
                        target: targets::DEFER,
                        "defer scope dropped without finish, refresh left pending"
                    );
                }
                DeferExit::Nested(level) => {
                    tracing::trace!(target: targets::DEFER, level, "defer scope dropped");
                    return;
                }
                DeferExit::Unbalanced => return,
            }
        }
        self.shared.notify(&before);
    }

    // =========================================================================
    // Window
    // =========================================================================

    /// Number of items in the window, frozen items included.
    pub fn count(&self) -> usize {
        let frozen_count = self.shared.frozen.len();
        frozen_count + self.shared.state.lock().unfrozen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Item at `index` of the window.
    pub fn get(&self, index: usize) -> Option<T> {
        let frozen = self.shared.frozen.snapshot();
        let position = self.shared.frozen.position();
        let state = self.shared.state.lock();
        let layout = WindowLayout {
            position,
            frozen: frozen.len(),
            unfrozen: state.unfrozen.len(),
        };
        match layout.locate(index)? {
            Ok(frozen_index) => frozen.get(frozen_index).cloned(),
            Err(unfrozen_index) => state.unfrozen.get(unfrozen_index).cloned(),
        }
    }

    /// The materialized window in display order.
    pub fn items(&self) -> Vec<T> {
        self.shared.window()
    }

    /// The items of the current page only.
    pub fn unfrozen_items(&self) -> Vec<T> {
        self.shared.state.lock().unfrozen.clone()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.shared.index_of(item).is_some()
    }

    /// Window index of the first item equal to `item` under the comparer.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.shared.index_of(item)
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    pub fn current_item(&self) -> Option<T> {
        self.shared.state.lock().cursor.item().cloned()
    }

    /// Cursor position: `-1` before the first item, `count()` after the last.
    pub fn current_position(&self) -> isize {
        self.shared.state.lock().cursor.position()
    }

    pub fn is_current_before_first(&self) -> bool {
        self.shared.state.lock().cursor.is_before_first()
    }

    pub fn is_current_after_last(&self) -> bool {
        let count = self.count();
        self.shared.state.lock().cursor.is_after_last(count)
    }

    /// Moves the cursor to `position`.
    ///
    /// Returns `true` if the cursor now sits on an item. Positions outside
    /// the window park the cursor before the first or after the last item.
    pub fn move_current_to_position(&self, position: isize, cancelable: bool) -> bool {
        let noop = {
            let state = self.shared.state.lock();
            state.cursor.is_noop(position, state.is_page_changing)
        };
        if noop {
            return false;
        }
        if self.shared.signals.emit_current_changing(cancelable) {
            tracing::trace!(target: targets::CURSOR, position, "current change canceled");
            return false;
        }
        self.shared.set_current(position)
    }

    /// Makes `item` current. Returns `false` if it is not in the window or
    /// already current.
    pub fn move_current_to(&self, item: &T) -> bool {
        let Some(index) = self.shared.index_of(item) else {
            return false;
        };
        let already_current = self
            .current_item()
            .is_some_and(|current| (self.shared.comparer)(&current, item));
        if already_current {
            return false;
        }
        if self.shared.signals.emit_current_changing(true) {
            tracing::trace!(target: targets::CURSOR, index, "current change canceled");
            return false;
        }
        self.shared.set_current(index as isize)
    }

    pub fn move_current_to_first(&self) -> bool {
        self.move_current_to_position(0, true)
    }

    pub fn move_current_to_last(&self) -> bool {
        self.move_current_to_position(self.count() as isize - 1, true)
    }

    pub fn move_current_to_next(&self) -> bool {
        self.move_current_to_position(self.current_position() + 1, true)
    }

    pub fn move_current_to_previous(&self) -> bool {
        self.move_current_to_position(self.current_position() - 1, true)
    }

    // =========================================================================
    // Disposal
    // =========================================================================

    /// Detaches from the sort and frozen collections and the live result.
    ///
    /// A fetch in flight is not canceled; its result is ignored. Later calls
    /// that would fetch return [`Error::Disposed`].
    pub fn dispose(&self) {
        let before = self.shared.snapshot();
        {
            let mut state = self.shared.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.pending = None;
        }

        self.sort_attachment.lock().detach(&self.shared.sort);
        self.frozen_attachment.lock().detach(&self.shared.frozen);
        let subscription = self.shared.subscription.lock().take();
        drop(subscription);

        tracing::debug!(target: targets::VIEW, "paged collection view disposed");
        self.shared.notify(&before);
    }
}

impl<T, C> Drop for PagedCollectionView<T, C>
where
    T: Clone + Send + Sync + 'static,
    C: PagingClient<T>,
{
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T, C> std::fmt::Debug for PagedCollectionView<T, C>
where
    T: Clone + Send + Sync + 'static,
    C: PagingClient<T>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let frozen_count = self.shared.frozen.len();
        let state = self.shared.state.lock();
        f.debug_struct("PagedCollectionView")
            .field("page_index", &state.page_index)
            .field("page_size", &state.page_size)
            .field("item_count", &state.item_count)
            .field("frozen_count", &frozen_count)
            .field("unfrozen_count", &state.unfrozen.len())
            .field("defer_level", &state.defer.level())
            .field("disposed", &state.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryPagingClient;

    fn view(total: u32) -> PagedCollectionView<u32, InMemoryPagingClient<u32>> {
        PagedCollectionView::new(InMemoryPagingClient::new((0..total).collect()))
    }

    #[test]
    fn test_new_view_has_no_page() {
        let view = view(35);
        assert_eq!(view.page_index(), None);
        assert_eq!(view.page_count(), 0);
        assert_eq!(view.total_item_count(), None);
        assert_eq!(view.current_position(), -1);
        assert!(view.can_change_page());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let client = InMemoryPagingClient::<u32>::new(Vec::new());
        let result = PagedCollectionView::with_config(client, ViewConfig::default().with_page_size(0));
        assert!(matches!(result, Err(Error::InvalidPageSize { page_size: 0 })));
    }

    #[tokio::test]
    async fn test_refresh_loads_first_page() {
        let view = view(35);
        assert_eq!(view.refresh().await.unwrap(), RefreshOutcome::Applied);
        assert_eq!(view.page_index(), Some(0));
        assert_eq!(view.items(), (0..10).collect::<Vec<_>>());
        assert_eq!(view.page_count(), 4);
    }

    #[tokio::test]
    async fn test_cursor_moves_within_window() {
        let view = view(35);
        view.refresh().await.unwrap();

        assert!(view.move_current_to_first());
        assert!(view.move_current_to_next());
        assert_eq!(view.current_item(), Some(1));
        assert!(view.move_current_to(&7));
        assert_eq!(view.current_position(), 7);
        assert!(!view.move_current_to(&7));
        assert!(!view.move_current_to(&99));

        assert!(!view.move_current_to_position(50, true));
        assert_eq!(view.current_position(), 10);
        assert!(view.is_current_after_last());
        assert_eq!(view.current_item(), None);
    }

    #[tokio::test]
    async fn test_dispose_stops_fetching() {
        let view = view(35);
        view.refresh().await.unwrap();
        view.dispose();

        assert!(!view.can_change_page());
        assert!(matches!(view.move_to_page(1).await, Err(Error::Disposed)));
        assert_eq!(view.client().fetch_count(), 1);
    }
}
