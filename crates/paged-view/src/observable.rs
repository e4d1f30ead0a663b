//! Capability interface for collections the view can watch.
//!
//! Collaborators that report their own mutations implement
//! [`ObservableCollection`]; the view attaches to them through this trait
//! instead of probing for notification support at runtime.

use paged_view_core::{ConnectionId, Signal};

/// A collection that emits a change notification after every mutation.
pub trait ObservableCollection {
    /// The change payload.
    type Change: 'static;

    /// The signal emitted after each mutation, once the collection's own
    /// lock has been released.
    fn changes(&self) -> &Signal<Self::Change>;
}

/// An attachment of a listener to an [`ObservableCollection`].
///
/// Detaching is explicit; the owner calls [`detach`](Self::detach) from its
/// dispose path.
#[derive(Debug, Default)]
pub(crate) struct Attachment {
    id: Option<ConnectionId>,
}

impl Attachment {
    pub(crate) fn attach<C, F>(collection: &C, listener: F) -> Self
    where
        C: ObservableCollection,
        F: Fn(&C::Change) + Send + Sync + 'static,
    {
        Self {
            id: Some(collection.changes().connect(listener)),
        }
    }

    /// Disconnects the listener. Returns `false` if it was already detached.
    pub(crate) fn detach<C: ObservableCollection>(&mut self, collection: &C) -> bool {
        match self.id.take() {
            Some(id) => collection.changes().disconnect(id),
            None => false,
        }
    }
}
