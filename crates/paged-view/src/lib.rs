//! A virtualized, paginated collection view.
//!
//! [`PagedCollectionView`] shows a bounded window over a server-backed,
//! sortable dataset: one page fetched through a [`PagingClient`], plus any
//! number of frozen items pinned before or after it. It keeps a cancelable
//! current-item cursor, coalesces refresh requests inside defer scopes, and
//! absorbs pages that keep filling in after they were returned.
//!
//! # Example
//!
//! ```
//! use paged_view::{InMemoryPagingClient, PagedCollectionView, SortDescriptor, ViewConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> paged_view::Result<()> {
//! let client = InMemoryPagingClient::new((0..35u32).collect())
//!     .with_sort_key("value", |a: &u32, b: &u32| a.cmp(b));
//! let view = PagedCollectionView::with_config(client, ViewConfig::default())?;
//!
//! view.refresh().await?;
//! assert_eq!(view.page_count(), 4);
//! assert!(view.move_to_page(3).await?);
//! assert_eq!(view.items(), vec![30, 31, 32, 33, 34]);
//!
//! // Sort edits send the view back to the first page.
//! view.edit_sort(|sort| sort.push(SortDescriptor::descending("value")))
//!     .await?;
//! assert_eq!(view.page_index(), Some(0));
//! assert_eq!(view.get(0), Some(34));
//! # Ok(())
//! # }
//! ```
//!
//! # Notifications
//!
//! All notifications are [`paged_view_core::Signal`]s grouped in
//! [`ViewSignals`]. Sort and frozen edits made directly on
//! [`PagedCollectionView::sort_descriptors`] or
//! [`PagedCollectionView::frozen_items`] are recorded and fetched by the
//! next [`PagedCollectionView::flush`].

mod client;
mod config;
mod cursor;
mod defer;
mod error;
mod events;
mod frozen;
mod observable;
mod sort;
mod state;
mod subscription;
mod view;

pub use client::{
    FnPagingClient, InMemoryPagingClient, PagingClient, PagingRequest, PagingResult, SortKeyFn,
};
pub use config::{DEFAULT_PAGE_SIZE, OverlapPolicy, ViewConfig};
pub use cursor::{BEFORE_FIRST, CursorTracker};
pub use defer::{DeferCoordinator, DeferExit, DeferGuard};
pub use error::{Error, PagingError, Result};
pub use events::{
    CollectionChange, CurrentChangingArgs, PageChangingArgs, ViewProperty, ViewSignals,
};
pub use frozen::{
    FrozenAction, FrozenChange, FrozenItemPosition, FrozenItems, FrozenOverlay, WindowLayout,
    compose,
};
pub use observable::ObservableCollection;
pub use sort::{
    SortChange, SortDescriptor, SortDescriptorList, SortDirection, SortMediator, SortResetPolicy,
};
pub use subscription::{LiveFeed, PagingSubscription};
pub use view::{ItemComparer, PagedCollectionView, RefreshOutcome};

/// Logging target names used by this crate.
pub mod targets {
    /// View lifecycle.
    pub const VIEW: &str = "paged_view::view";
    /// Fetch issuance, completion and live appends.
    pub const FETCH: &str = "paged_view::fetch";
    /// Cursor moves.
    pub const CURSOR: &str = "paged_view::cursor";
    /// Sort-triggered resets.
    pub const SORT: &str = "paged_view::sort";
    /// Frozen overlay rebalancing.
    pub const FROZEN: &str = "paged_view::frozen";
    /// Defer scopes.
    pub const DEFER: &str = "paged_view::defer";
}
