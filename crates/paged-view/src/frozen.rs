//! Frozen (pinned) items shown outside the paged window.
//!
//! Frozen items are owned by the consumer and always part of the
//! materialized window, either before or after the page's items. The view
//! only observes the collection; the [`FrozenOverlay`] decides when an edit
//! needs a re-fetch so the visible window keeps its size.

use parking_lot::RwLock;
use paged_view_core::{Property, Signal};
use serde::{Deserialize, Serialize};

use crate::observable::ObservableCollection;

/// Where frozen items sit relative to the page's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrozenItemPosition {
    #[default]
    Leading,
    Trailing,
}

/// What happened to the frozen collection.
#[derive(Debug, Clone, PartialEq)]
pub enum FrozenAction<T> {
    Added { index: usize, item: T },
    Removed { index: usize, item: T },
    /// Cleared or replaced wholesale.
    Reset,
    /// Only the [`FrozenItemPosition`] changed.
    PositionChanged(FrozenItemPosition),
}

/// Payload of [`FrozenItems::changed`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenChange<T> {
    pub action: FrozenAction<T>,
    pub old_count: usize,
    pub new_count: usize,
}

/// The consumer-mutable set of pinned items.
pub struct FrozenItems<T> {
    items: RwLock<Vec<T>>,
    position: Property<FrozenItemPosition>,
    /// Emitted after every mutation.
    pub changed: Signal<FrozenChange<T>>,
}

impl<T: Clone + Send + Sync + 'static> FrozenItems<T> {
    /// Creates an empty collection.
    pub fn new(position: FrozenItemPosition) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            position: Property::new(position),
            changed: Signal::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Returns a copy of the frozen items in order.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.read().clone()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.items.read().get(index).cloned()
    }

    pub fn position(&self) -> FrozenItemPosition {
        self.position.get()
    }

    /// Moves the frozen block to the other end of the window.
    pub fn set_position(&self, position: FrozenItemPosition) {
        if self.position.set(position) {
            let count = self.len();
            self.changed.emit(FrozenChange {
                action: FrozenAction::PositionChanged(position),
                old_count: count,
                new_count: count,
            });
        }
    }

    /// Appends an item.
    pub fn push(&self, item: T) {
        let (index, old_count) = {
            let mut items = self.items.write();
            items.push(item.clone());
            (items.len() - 1, items.len() - 1)
        };
        self.emit(FrozenAction::Added { index, item }, old_count, old_count + 1);
    }

    /// Inserts an item at `index`, clamped to the collection length.
    pub fn insert(&self, index: usize, item: T) {
        let (index, old_count) = {
            let mut items = self.items.write();
            let index = index.min(items.len());
            let old_count = items.len();
            items.insert(index, item.clone());
            (index, old_count)
        };
        self.emit(FrozenAction::Added { index, item }, old_count, old_count + 1);
    }

    /// Removes the item at `index`.
    pub fn remove_at(&self, index: usize) -> Option<T> {
        let (item, old_count) = {
            let mut items = self.items.write();
            if index >= items.len() {
                return None;
            }
            let old_count = items.len();
            (items.remove(index), old_count)
        };
        self.emit(
            FrozenAction::Removed {
                index,
                item: item.clone(),
            },
            old_count,
            old_count - 1,
        );
        Some(item)
    }

    /// Removes the first item matching `predicate`.
    pub fn remove_first<F>(&self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        let index = self.items.read().iter().position(predicate)?;
        self.remove_at(index)
    }

    /// Removes every item.
    pub fn clear(&self) {
        self.set_items(Vec::new());
    }

    /// Replaces the whole collection.
    pub fn set_items(&self, items: Vec<T>) {
        let new_count = items.len();
        let old_count = std::mem::replace(&mut *self.items.write(), items).len();
        self.emit(FrozenAction::Reset, old_count, new_count);
    }

    fn emit(&self, action: FrozenAction<T>, old_count: usize, new_count: usize) {
        self.changed.emit(FrozenChange {
            action,
            old_count,
            new_count,
        });
    }
}

impl<T: 'static> ObservableCollection for FrozenItems<T> {
    type Change = FrozenChange<T>;

    fn changes(&self) -> &Signal<FrozenChange<T>> {
        &self.changed
    }
}

/// Layout of the materialized window: frozen items plus page items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLayout {
    pub position: FrozenItemPosition,
    pub frozen: usize,
    pub unfrozen: usize,
}

impl WindowLayout {
    pub fn count(&self) -> usize {
        self.frozen + self.unfrozen
    }

    /// Window index of the frozen item at `frozen_index`.
    pub fn frozen_to_window(&self, frozen_index: usize) -> usize {
        match self.position {
            FrozenItemPosition::Leading => frozen_index,
            FrozenItemPosition::Trailing => self.unfrozen + frozen_index,
        }
    }

    /// Window index of the page item at `unfrozen_index`.
    pub fn unfrozen_to_window(&self, unfrozen_index: usize) -> usize {
        match self.position {
            FrozenItemPosition::Leading => self.frozen + unfrozen_index,
            FrozenItemPosition::Trailing => unfrozen_index,
        }
    }

    /// Resolves a window index to a frozen (`Ok`) or page (`Err`) index.
    pub fn locate(&self, window_index: usize) -> Option<Result<usize, usize>> {
        if window_index >= self.count() {
            return None;
        }
        Some(match self.position {
            FrozenItemPosition::Leading if window_index < self.frozen => Ok(window_index),
            FrozenItemPosition::Leading => Err(window_index - self.frozen),
            FrozenItemPosition::Trailing if window_index < self.unfrozen => Err(window_index),
            FrozenItemPosition::Trailing => Ok(window_index - self.unfrozen),
        })
    }
}

/// Concatenates frozen and page items in window order.
pub fn compose<T: Clone>(frozen: &[T], unfrozen: &[T], position: FrozenItemPosition) -> Vec<T> {
    let (first, second) = match position {
        FrozenItemPosition::Leading => (frozen, unfrozen),
        FrozenItemPosition::Trailing => (unfrozen, frozen),
    };
    let mut window = Vec::with_capacity(first.len() + second.len());
    window.extend_from_slice(first);
    window.extend_from_slice(second);
    window
}

/// Decides when a frozen edit must re-fetch the current page.
///
/// The effective page size shrinks as frozen items are added, so the window
/// would overflow the page size after growth, or leave a gap after shrinking
/// on any page but the last.
#[derive(Debug, Clone, Copy)]
pub struct FrozenOverlay {
    pub page_size: usize,
    pub on_last_page: bool,
}

impl FrozenOverlay {
    /// Returns `true` if `change`, applied to a window now holding
    /// `window_count` items, requires re-fetching the current page.
    pub fn requires_refresh<T>(&self, change: &FrozenChange<T>, window_count: usize) -> bool {
        if change.new_count > change.old_count {
            window_count >= self.page_size
        } else if change.new_count < change.old_count {
            window_count < self.page_size && !self.on_last_page
        } else {
            false
        }
    }
}
