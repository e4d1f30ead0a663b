//! Mutable bookkeeping of the page window.

use crate::cursor::CursorTracker;
use crate::defer::DeferCoordinator;
use crate::events::ViewProperty;

/// A refresh requested by a sort or frozen edit, issued on the next flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum PendingTrigger {
    /// Re-fetch the current page.
    CurrentPage,
    /// Re-run the deferred refresh of a scope closed without finishing.
    Refresh,
    /// Go back to the first page.
    FirstPage,
}

impl PendingTrigger {
    /// Combines two triggers; a first-page reset absorbs everything else.
    pub(crate) fn merge(current: Option<Self>, next: Self) -> Self {
        current.map_or(next, |current| current.max(next))
    }
}

/// State of the page window. Only the refresh engine mutates it.
#[derive(Debug)]
pub(crate) struct PageWindowState<T> {
    /// `None` until the first page was applied.
    pub page_index: Option<usize>,
    pub page_size: usize,
    /// Dataset size without frozen items; `None` until the first page was applied.
    pub item_count: Option<u64>,
    pub is_page_changing: bool,
    /// Fetches issued and not yet completed.
    pub in_flight: usize,
    pub unfrozen: Vec<T>,
    pub cursor: CursorTracker<T>,
    pub defer: DeferCoordinator,
    /// Generation of the most recently issued fetch.
    pub generation: u64,
    /// Generation of the result currently shown.
    pub applied_generation: u64,
    pub pending: Option<PendingTrigger>,
    pub disposed: bool,
}

impl<T: Clone> PageWindowState<T> {
    pub(crate) fn new(page_size: usize) -> Self {
        Self {
            page_index: None,
            page_size,
            item_count: None,
            is_page_changing: false,
            in_flight: 0,
            unfrozen: Vec::new(),
            cursor: CursorTracker::new(),
            defer: DeferCoordinator::new(),
            generation: 0,
            applied_generation: 0,
            pending: None,
            disposed: false,
        }
    }

    pub(crate) fn has_refreshed(&self) -> bool {
        self.item_count.is_some()
    }

    /// `ceil(item_count / page_size)`, zero before the first refresh.
    pub(crate) fn page_count(&self) -> usize {
        match self.item_count {
            Some(count) => count.div_ceil(self.page_size as u64) as usize,
            None => 0,
        }
    }

    /// Highest reachable page; page 0 stays reachable for an empty dataset.
    pub(crate) fn last_page_index(&self) -> Option<usize> {
        self.item_count
            .map(|_| self.page_count().saturating_sub(1))
    }

    pub(crate) fn is_on_last_page(&self) -> bool {
        match (self.page_index, self.last_page_index()) {
            (Some(index), Some(last)) => index >= last,
            _ => false,
        }
    }

    pub(crate) fn record_pending(&mut self, trigger: PendingTrigger) {
        self.pending = Some(PendingTrigger::merge(self.pending, trigger));
    }

    /// Turns a pending trigger into the page it should fetch.
    pub(crate) fn resolve(&self, trigger: PendingTrigger) -> usize {
        match trigger {
            PendingTrigger::FirstPage => 0,
            PendingTrigger::CurrentPage => self.page_index.unwrap_or(0),
            PendingTrigger::Refresh => self
                .defer
                .deferred_page()
                .or(self.page_index)
                .unwrap_or(0),
        }
    }

    /// Clears the pending trigger and the deferred page for an issued fetch.
    pub(crate) fn take_requests(&mut self) -> TakenRequests {
        TakenRequests {
            pending: self.pending.take(),
            deferred_page: self.defer.take_deferred_page(),
        }
    }

    /// Puts back what [`take_requests`](Self::take_requests) cleared, unless
    /// newer requests were recorded meanwhile.
    pub(crate) fn restore_requests(&mut self, taken: TakenRequests) {
        if let Some(trigger) = taken.pending {
            self.record_pending(trigger);
        }
        if let Some(page) = taken.deferred_page
            && self.defer.deferred_page().is_none()
        {
            self.defer.record(page);
        }
    }

    pub(crate) fn snapshot(&self, frozen_count: usize) -> PropertySnapshot<T> {
        PropertySnapshot {
            page_index: self.page_index,
            page_count: self.page_count(),
            item_count: self.item_count,
            total_item_count: self.item_count.map(|count| count + frozen_count as u64),
            current_item: self.cursor.item().cloned(),
            current_position: self.cursor.position(),
            is_page_changing: self.is_page_changing,
            can_change_page: !self.disposed,
            page_size: self.page_size,
        }
    }
}

/// Refresh requests an issued fetch consumed, kept until it succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TakenRequests {
    pub pending: Option<PendingTrigger>,
    pub deferred_page: Option<usize>,
}

/// Page size sent to the client: the page size less the frozen items, at
/// least one.
pub(crate) fn effective_page_size(page_size: usize, frozen_count: usize) -> usize {
    page_size.saturating_sub(frozen_count).max(1)
}

/// Values of every consumer-visible property at one point in time.
#[derive(Debug, Clone)]
pub(crate) struct PropertySnapshot<T> {
    pub page_index: Option<usize>,
    pub page_count: usize,
    pub item_count: Option<u64>,
    pub total_item_count: Option<u64>,
    pub current_item: Option<T>,
    pub current_position: isize,
    pub is_page_changing: bool,
    pub can_change_page: bool,
    pub page_size: usize,
}

impl<T> PropertySnapshot<T> {
    /// Properties that differ from `after`, in notification order.
    pub(crate) fn diff<F>(&self, after: &Self, same_item: F) -> Vec<ViewProperty>
    where
        F: Fn(&T, &T) -> bool,
    {
        let mut changed = Vec::new();
        if self.page_index != after.page_index {
            changed.push(ViewProperty::PageIndex);
        }
        if self.page_count != after.page_count {
            changed.push(ViewProperty::PageCount);
        }
        if self.item_count != after.item_count {
            changed.push(ViewProperty::ItemCount);
        }
        if self.total_item_count != after.total_item_count {
            changed.push(ViewProperty::TotalItemCount);
        }
        let item_changed = match (&self.current_item, &after.current_item) {
            (Some(before), Some(after)) => !same_item(before, after),
            (None, None) => false,
            _ => true,
        };
        if item_changed {
            changed.push(ViewProperty::CurrentItem);
        }
        if self.current_position != after.current_position {
            changed.push(ViewProperty::CurrentPosition);
        }
        if self.is_page_changing != after.is_page_changing {
            changed.push(ViewProperty::IsPageChanging);
        }
        if self.can_change_page != after.can_change_page {
            changed.push(ViewProperty::CanChangePage);
        }
        if self.page_size != after.page_size {
            changed.push(ViewProperty::PageSize);
        }
        changed
    }
}
