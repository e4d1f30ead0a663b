//! Notifications emitted by the paged collection view.
//!
//! Views emit these signals so bindings can stay synchronized without
//! polling. Every signal is dispatched on the caller's execution context and
//! never while the view holds an internal lock, so slots may call back into
//! the view.
//!
//! # Signal Usage
//!
//! - **Before a page fetch**: `page_changing` (cancelable)
//! - **After a page is applied**: `collection_changed` (`Reset`), then
//!   `property_changed` for each property that moved, then `page_changed`
//! - **Cursor moves**: `current_changing` (cancelable unless stated), then
//!   `current_changed`
//! - **Progressive results and frozen edits**: `collection_changed`
//!   (`Added` / `Removed`)

use paged_view_core::{CancelFlag, Signal};

/// A consumer-visible property of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewProperty {
    PageIndex,
    PageCount,
    ItemCount,
    TotalItemCount,
    CurrentItem,
    CurrentPosition,
    IsPageChanging,
    CanChangePage,
    PageSize,
}

/// Change to the materialized window.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionChange<T> {
    /// The whole window was replaced.
    Reset,
    /// Items were inserted starting at `index` of the window.
    Added { index: usize, items: Vec<T> },
    /// Items were removed starting at `index` of the window.
    Removed { index: usize, items: Vec<T> },
}

/// Payload of [`ViewSignals::page_changing`].
///
/// Any slot may call [`cancel`](Self::cancel) to decline the page change;
/// the view then issues no fetch.
#[derive(Debug, Clone)]
pub struct PageChangingArgs {
    new_page_index: usize,
    cancel: CancelFlag,
}

impl PageChangingArgs {
    pub(crate) fn new(new_page_index: usize) -> Self {
        Self {
            new_page_index,
            cancel: CancelFlag::new(),
        }
    }

    /// The page the view is about to move to.
    pub fn new_page_index(&self) -> usize {
        self.new_page_index
    }

    /// Decline the page change.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` if any slot declined the change.
    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }
}

/// Payload of [`ViewSignals::current_changing`].
#[derive(Debug, Clone)]
pub struct CurrentChangingArgs {
    is_cancelable: bool,
    cancel: CancelFlag,
}

impl CurrentChangingArgs {
    pub(crate) fn new(is_cancelable: bool) -> Self {
        Self {
            is_cancelable,
            cancel: CancelFlag::new(),
        }
    }

    /// Whether [`cancel`](Self::cancel) has any effect.
    pub fn is_cancelable(&self) -> bool {
        self.is_cancelable
    }

    /// Decline the cursor move. Ignored for non-cancelable moves.
    pub fn cancel(&self) {
        if self.is_cancelable {
            self.cancel.cancel();
        } else {
            tracing::warn!(
                target: crate::targets::CURSOR,
                "cancel requested on a non-cancelable current change, ignoring"
            );
        }
    }

    /// Returns `true` if a slot declined a cancelable move.
    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }
}

/// Collection of signals emitted by a paged collection view.
pub struct ViewSignals<T> {
    /// Emitted before a page fetch for a different page is issued.
    pub page_changing: Signal<PageChangingArgs>,

    /// Emitted after a page change has been applied. Args: the new page index.
    pub page_changed: Signal<usize>,

    /// Emitted before the cursor moves.
    pub current_changing: Signal<CurrentChangingArgs>,

    /// Emitted after the cursor moved.
    pub current_changed: Signal<()>,

    /// Emitted once per property whose value changed.
    pub property_changed: Signal<ViewProperty>,

    /// Emitted when the materialized window changes.
    pub collection_changed: Signal<CollectionChange<T>>,
}

impl<T: 'static> Default for ViewSignals<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ViewSignals<T> {
    /// Creates a new set of view signals.
    pub fn new() -> Self {
        Self {
            page_changing: Signal::new(),
            page_changed: Signal::new(),
            current_changing: Signal::new(),
            current_changed: Signal::new(),
            property_changed: Signal::new(),
            collection_changed: Signal::new(),
        }
    }

    /// Emits `property_changed` for each property in order.
    pub(crate) fn emit_properties(&self, changed: &[ViewProperty]) {
        for property in changed {
            self.property_changed.emit(*property);
        }
    }

    /// Emits a cancelable `page_changing` and reports whether it was declined.
    pub(crate) fn emit_page_changing(&self, new_page_index: usize) -> bool {
        let args = PageChangingArgs::new(new_page_index);
        self.page_changing.emit(args.clone());
        args.is_canceled()
    }

    /// Emits `current_changing` and reports whether a cancelable move was declined.
    pub(crate) fn emit_current_changing(&self, is_cancelable: bool) -> bool {
        let args = CurrentChangingArgs::new(is_cancelable);
        self.current_changing.emit(args.clone());
        args.is_canceled()
    }
}
