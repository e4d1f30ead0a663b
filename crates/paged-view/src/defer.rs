//! Nested batching of refresh requests.
//!
//! While a defer scope is open, every refresh trigger only records the page
//! it wants. Closing the outermost scope issues one fetch for the last
//! recorded page.

use crate::client::PagingClient;
use crate::error::Result;
use crate::view::{PagedCollectionView, RefreshOutcome};

/// Result of closing one defer level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferExit {
    /// An outer scope is still open; `level` remain.
    Nested(usize),
    /// The outermost scope closed.
    Released,
    /// No scope was open.
    Unbalanced,
}

/// Defer level and the page requested while deferred.
#[derive(Debug, Clone, Default)]
pub struct DeferCoordinator {
    level: usize,
    deferred_page: Option<usize>,
}

impl DeferCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a scope and returns the new level.
    pub fn begin(&mut self) -> usize {
        self.level += 1;
        self.level
    }

    /// Closes a scope.
    pub fn end(&mut self) -> DeferExit {
        match self.level {
            0 => DeferExit::Unbalanced,
            1 => {
                self.level = 0;
                DeferExit::Released
            }
            _ => {
                self.level -= 1;
                DeferExit::Nested(self.level)
            }
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.level > 0
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Records `page_index` as the target of the deferred refresh. The last
    /// recorded page wins.
    pub fn record(&mut self, page_index: usize) {
        self.deferred_page = Some(page_index);
    }

    pub fn deferred_page(&self) -> Option<usize> {
        self.deferred_page
    }

    /// Takes the recorded page, leaving none.
    pub fn take_deferred_page(&mut self) -> Option<usize> {
        self.deferred_page.take()
    }
}

/// A defer scope opened by [`PagedCollectionView::defer_refresh`].
///
/// Call [`finish`](Self::finish) to close the scope and run the coalesced
/// refresh. A guard dropped without `finish` still closes its level exactly
/// once; if it was the outermost scope the refresh is left pending for the
/// next [`PagedCollectionView::flush`].
#[must_use = "dropping a DeferGuard closes the scope without fetching"]
pub struct DeferGuard<'a, T, C>
where
    T: Clone + Send + Sync + 'static,
    C: PagingClient<T>,
{
    view: &'a PagedCollectionView<T, C>,
    finished: bool,
}

impl<'a, T, C> DeferGuard<'a, T, C>
where
    T: Clone + Send + Sync + 'static,
    C: PagingClient<T>,
{
    pub(crate) fn new(view: &'a PagedCollectionView<T, C>) -> Self {
        view.begin_defer();
        Self {
            view,
            finished: false,
        }
    }

    /// Closes the scope. Runs the refresh if this was the outermost scope.
    pub async fn finish(mut self) -> Result<RefreshOutcome> {
        self.finished = true;
        self.view.end_defer().await
    }
}

impl<T, C> Drop for DeferGuard<'_, T, C>
where
    T: Clone + Send + Sync + 'static,
    C: PagingClient<T>,
{
    fn drop(&mut self) {
        if !self.finished {
            self.view.abandon_defer();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting_releases_once() {
        let mut defer = DeferCoordinator::new();
        assert_eq!(defer.begin(), 1);
        assert_eq!(defer.begin(), 2);
        assert!(defer.is_deferred());

        assert_eq!(defer.end(), DeferExit::Nested(1));
        assert_eq!(defer.end(), DeferExit::Released);
        assert!(!defer.is_deferred());
        assert_eq!(defer.end(), DeferExit::Unbalanced);
        assert_eq!(defer.level(), 0);
    }

    #[test]
    fn test_last_recorded_page_wins() {
        let mut defer = DeferCoordinator::new();
        defer.begin();
        defer.record(1);
        defer.record(3);
        defer.record(2);
        assert_eq!(defer.deferred_page(), Some(2));
        assert_eq!(defer.take_deferred_page(), Some(2));
        assert_eq!(defer.take_deferred_page(), None);
    }
}
