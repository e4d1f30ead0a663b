//! Error types for the paged collection view.

/// Result type alias for view operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a [`PagedCollectionView`](crate::PagedCollectionView).
///
/// Declined requests (an out-of-range page, a canceled `page_changing` or
/// `current_changing`) are not errors; those paths return `false`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured page size was zero.
    #[error("Invalid page size {page_size}: page size must be greater than zero")]
    InvalidPageSize { page_size: usize },

    /// The paging client failed to produce a page.
    #[error("Page fetch failed: {0}")]
    Fetch(#[from] PagingError),

    /// The view has been disposed and no longer issues fetches.
    #[error("The view has been disposed")]
    Disposed,
}

/// Errors reported by a [`PagingClient`](crate::PagingClient).
#[derive(Debug, thiserror::Error)]
pub enum PagingError {
    /// The transport carrying the request failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server rejected the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The request was canceled by the client itself.
    #[error("Request was cancelled")]
    Cancelled,

    /// Any other client-specific failure.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for PagingError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Other(err)
    }
}

impl PagingError {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}
