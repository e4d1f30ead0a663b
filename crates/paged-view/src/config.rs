//! Construction configuration for [`PagedCollectionView`](crate::PagedCollectionView).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frozen::FrozenItemPosition;
use crate::sort::SortResetPolicy;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// How results of overlapping fetches are reconciled.
///
/// Every issued fetch carries a generation number that grows with each
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// A result older than the last applied one is discarded.
    #[default]
    LatestRequestWins,
    /// Every successful result is applied in completion order.
    LastCompletionWins,
}

/// Configuration for a paged collection view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Items per page, frozen items included. Must be greater than zero.
    pub page_size: usize,
    /// Where frozen items sit in the window.
    pub frozen_position: FrozenItemPosition,
    /// Reconciliation of overlapping fetches.
    pub overlap_policy: OverlapPolicy,
    /// When sort edits send the view back to the first page.
    pub sort_reset_policy: SortResetPolicy,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            frozen_position: FrozenItemPosition::Leading,
            overlap_policy: OverlapPolicy::LatestRequestWins,
            sort_reset_policy: SortResetPolicy::KeepSortedAfterRemove,
        }
    }
}

impl ViewConfig {
    /// Set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the frozen item position.
    pub fn with_frozen_position(mut self, position: FrozenItemPosition) -> Self {
        self.frozen_position = position;
        self
    }

    /// Set the overlap policy.
    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    /// Set the sort reset policy.
    pub fn with_sort_reset_policy(mut self, policy: SortResetPolicy) -> Self {
        self.sort_reset_policy = policy;
        self
    }

    /// Checks the configuration's preconditions.
    pub fn validate(&self) -> Result<()> {
        validate_page_size(self.page_size)
    }
}

pub(crate) fn validate_page_size(page_size: usize) -> Result<()> {
    if page_size == 0 {
        return Err(Error::InvalidPageSize { page_size });
    }
    Ok(())
}
