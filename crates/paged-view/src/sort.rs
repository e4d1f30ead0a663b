//! Sort descriptors and the policy that turns sort edits into page resets.
//!
//! Item ordering is computed by the server, so the view cannot re-sort the
//! materialized window locally. Instead the [`SortMediator`] watches the
//! [`SortDescriptorList`] and asks the view to go back to the first page
//! whenever a change makes the current page meaningless.

use parking_lot::RwLock;
use paged_view_core::Signal;
use serde::{Deserialize, Serialize};

use crate::observable::ObservableCollection;

/// Direction of a sort criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// One sort criterion: a server-side key and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortDescriptor {
    pub key: String,
    pub direction: SortDirection,
}

impl SortDescriptor {
    /// Creates a descriptor.
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    /// Creates an ascending descriptor.
    pub fn ascending(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Ascending)
    }

    /// Creates a descending descriptor.
    pub fn descending(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Descending)
    }
}

/// Mutation reported by [`SortDescriptorList::changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortChange {
    /// A descriptor was inserted at `index`.
    Added { index: usize, descriptor: SortDescriptor },
    /// The descriptor at `index` was replaced.
    Replaced {
        index: usize,
        old: SortDescriptor,
        new: SortDescriptor,
    },
    /// The descriptor at `index` was removed; `remaining` descriptors are left.
    Removed {
        index: usize,
        descriptor: SortDescriptor,
        remaining: usize,
    },
    /// The list was cleared or replaced wholesale; it now holds `len` descriptors.
    Reset { len: usize },
}

/// Ordered, observable list of sort criteria.
///
/// Order defines priority: index 0 is the primary key.
pub struct SortDescriptorList {
    descriptors: RwLock<Vec<SortDescriptor>>,
    /// Emitted after every mutation.
    pub changed: Signal<SortChange>,
}

impl Default for SortDescriptorList {
    fn default() -> Self {
        Self::new()
    }
}

impl SortDescriptorList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            descriptors: RwLock::new(Vec::new()),
            changed: Signal::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.read().is_empty()
    }

    /// Returns a copy of the descriptors in priority order.
    pub fn snapshot(&self) -> Vec<SortDescriptor> {
        self.descriptors.read().clone()
    }

    /// Returns the position of the first descriptor for `key`.
    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.descriptors.read().iter().position(|d| d.key == key)
    }

    /// Appends a lowest-priority descriptor.
    pub fn push(&self, descriptor: SortDescriptor) {
        let index = {
            let mut descriptors = self.descriptors.write();
            descriptors.push(descriptor.clone());
            descriptors.len() - 1
        };
        self.changed.emit(SortChange::Added { index, descriptor });
    }

    /// Inserts a descriptor at `index`, clamped to the list length.
    pub fn insert(&self, index: usize, descriptor: SortDescriptor) {
        let index = {
            let mut descriptors = self.descriptors.write();
            let index = index.min(descriptors.len());
            descriptors.insert(index, descriptor.clone());
            index
        };
        self.changed.emit(SortChange::Added { index, descriptor });
    }

    /// Replaces the descriptor at `index`, returning the old one.
    ///
    /// Returns `None` and emits nothing if `index` is out of range.
    pub fn replace(&self, index: usize, descriptor: SortDescriptor) -> Option<SortDescriptor> {
        let old = {
            let mut descriptors = self.descriptors.write();
            let slot = descriptors.get_mut(index)?;
            std::mem::replace(slot, descriptor.clone())
        };
        self.changed.emit(SortChange::Replaced {
            index,
            old: old.clone(),
            new: descriptor,
        });
        Some(old)
    }

    /// Removes the descriptor at `index`.
    pub fn remove(&self, index: usize) -> Option<SortDescriptor> {
        let (descriptor, remaining) = {
            let mut descriptors = self.descriptors.write();
            if index >= descriptors.len() {
                return None;
            }
            let descriptor = descriptors.remove(index);
            (descriptor, descriptors.len())
        };
        self.changed.emit(SortChange::Removed {
            index,
            descriptor: descriptor.clone(),
            remaining,
        });
        Some(descriptor)
    }

    /// Removes the first descriptor for `key`.
    pub fn remove_key(&self, key: &str) -> Option<SortDescriptor> {
        let index = self.position_of(key)?;
        self.remove(index)
    }

    /// Removes every descriptor.
    pub fn clear(&self) {
        self.set_all(Vec::new());
    }

    /// Replaces the whole list.
    pub fn set_all(&self, descriptors: Vec<SortDescriptor>) {
        let len = descriptors.len();
        *self.descriptors.write() = descriptors;
        self.changed.emit(SortChange::Reset { len });
    }
}

impl ObservableCollection for SortDescriptorList {
    type Change = SortChange;

    fn changes(&self) -> &Signal<SortChange> {
        &self.changed
    }
}

impl std::fmt::Debug for SortDescriptorList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortDescriptorList")
            .field("descriptors", &*self.descriptors.read())
            .finish()
    }
}

/// When a sort edit sends the view back to the first page.
///
/// Adds and replacements always reset. Removals are asymmetric by default:
/// removing the last remaining criterion leaves the current page in place.
/// Replacing the whole list resets unless it leaves the list empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortResetPolicy {
    /// Reset after a removal only while other criteria remain in effect.
    /// Clearing the list never resets.
    #[default]
    KeepSortedAfterRemove,
    /// Reset after every change, including removals and clears.
    AlwaysReset,
}

/// Translates [`SortChange`]s into first-page resets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortMediator {
    policy: SortResetPolicy,
}

impl SortMediator {
    pub fn new(policy: SortResetPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SortResetPolicy {
        self.policy
    }

    /// Returns `true` if `change` requires moving to the first page.
    ///
    /// Nothing resets before the view has refreshed at least once; the first
    /// refresh picks up the current criteria anyway.
    pub fn requires_reset(&self, change: &SortChange, has_refreshed: bool) -> bool {
        if !has_refreshed {
            return false;
        }
        match (change, self.policy) {
            (SortChange::Added { .. } | SortChange::Replaced { .. }, _) => true,
            (SortChange::Removed { remaining, .. }, SortResetPolicy::KeepSortedAfterRemove) => {
                *remaining > 0
            }
            (SortChange::Reset { len }, SortResetPolicy::KeepSortedAfterRemove) => *len > 0,
            (SortChange::Removed { .. } | SortChange::Reset { .. }, SortResetPolicy::AlwaysReset) => {
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recording(list: &SortDescriptorList) -> Arc<Mutex<Vec<SortChange>>> {
        let received = Arc::new(Mutex::new(Vec::new()));
        let recv = received.clone();
        list.changed.connect(move |change| recv.lock().push(change.clone()));
        received
    }

    #[test]
    fn test_push_insert_and_priority_order() {
        let list = SortDescriptorList::new();
        let changes = recording(&list);

        list.push(SortDescriptor::ascending("name"));
        list.insert(0, SortDescriptor::descending("age"));
        list.insert(99, SortDescriptor::ascending("id"));

        let keys: Vec<_> = list.snapshot().into_iter().map(|d| d.key).collect();
        assert_eq!(keys, vec!["age", "name", "id"]);

        let changes = changes.lock();
        assert_eq!(changes.len(), 3);
        assert!(matches!(changes[2], SortChange::Added { index: 2, .. }));
    }

    #[test]
    fn test_replace_and_remove_report_changes() {
        let list = SortDescriptorList::new();
        list.push(SortDescriptor::ascending("name"));
        list.push(SortDescriptor::ascending("age"));
        let changes = recording(&list);

        let old = list.replace(1, SortDescriptor::descending("age"));
        assert_eq!(old, Some(SortDescriptor::ascending("age")));
        assert_eq!(list.replace(5, SortDescriptor::ascending("x")), None);

        assert_eq!(list.remove_key("name"), Some(SortDescriptor::ascending("name")));
        assert_eq!(list.remove(3), None);

        let changes = changes.lock();
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[1],
            SortChange::Removed {
                index: 0,
                descriptor: SortDescriptor::ascending("name"),
                remaining: 1,
            }
        );
    }

    #[test]
    fn test_mediator_ignores_changes_before_first_refresh() {
        let mediator = SortMediator::default();
        let change = SortChange::Added {
            index: 0,
            descriptor: SortDescriptor::ascending("name"),
        };
        assert!(!mediator.requires_reset(&change, false));
        assert!(mediator.requires_reset(&change, true));
    }

    #[test]
    fn test_removal_rule_is_asymmetric_by_default() {
        let mediator = SortMediator::default();
        let removed = |remaining| SortChange::Removed {
            index: 0,
            descriptor: SortDescriptor::ascending("name"),
            remaining,
        };

        assert!(mediator.requires_reset(&removed(1), true));
        assert!(!mediator.requires_reset(&removed(0), true));
        assert!(!mediator.requires_reset(&SortChange::Reset { len: 0 }, true));
        assert!(mediator.requires_reset(&SortChange::Reset { len: 2 }, true));
        assert!(!mediator.requires_reset(&SortChange::Reset { len: 2 }, false));
    }

    #[test]
    fn test_always_reset_policy() {
        let mediator = SortMediator::new(SortResetPolicy::AlwaysReset);
        let removed = SortChange::Removed {
            index: 0,
            descriptor: SortDescriptor::ascending("name"),
            remaining: 0,
        };
        assert!(mediator.requires_reset(&removed, true));
        assert!(mediator.requires_reset(&SortChange::Reset { len: 0 }, true));
    }
}
