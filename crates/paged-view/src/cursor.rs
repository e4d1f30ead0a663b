//! The current-item cursor.
//!
//! The cursor position ranges over `[-1, count]`: `-1` is before the first
//! item, `count` is after the last one, and only positions in between carry a
//! current item. The view raises `current_changing` before consulting the
//! tracker, so the tracker itself only holds state and clamping rules.

/// Position value meaning "before the first item".
pub const BEFORE_FIRST: isize = -1;

/// Tracks the current position and item of a view.
#[derive(Debug, Clone)]
pub struct CursorTracker<T> {
    position: isize,
    item: Option<T>,
}

impl<T> Default for CursorTracker<T> {
    fn default() -> Self {
        Self {
            position: BEFORE_FIRST,
            item: None,
        }
    }
}

impl<T: Clone> CursorTracker<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> isize {
        self.position
    }

    pub fn item(&self) -> Option<&T> {
        self.item.as_ref()
    }

    pub fn is_before_first(&self) -> bool {
        self.position < 0
    }

    pub fn is_after_last(&self, count: usize) -> bool {
        self.position >= count as isize
    }

    /// A move to `position` is a no-op when the cursor is already there and
    /// no page change is pending; a pending page change invalidates the
    /// current item even at the same position.
    pub fn is_noop(&self, position: isize, is_page_changing: bool) -> bool {
        position == self.position && !is_page_changing
    }

    /// Moves to `position` within a window of `count` items.
    ///
    /// Out-of-range positions clamp to before-first or after-last and clear
    /// the item. Returns `true` if the cursor landed on an item.
    pub fn move_to<F>(&mut self, position: isize, count: usize, item_at: F) -> bool
    where
        F: FnOnce(usize) -> Option<T>,
    {
        if position < 0 {
            self.position = BEFORE_FIRST;
            self.item = None;
            return false;
        }
        let index = position as usize;
        if index >= count {
            self.position = count as isize;
            self.item = None;
            return false;
        }
        match item_at(index) {
            Some(item) => {
                self.position = position;
                self.item = Some(item);
                true
            }
            None => {
                self.position = BEFORE_FIRST;
                self.item = None;
                false
            }
        }
    }

    /// Moves back to before-first. Returns `true` if anything changed.
    pub fn reset(&mut self) -> bool {
        let changed = self.position != BEFORE_FIRST || self.item.is_some();
        self.position = BEFORE_FIRST;
        self.item = None;
        changed
    }

    /// Re-seats the cursor after the window shifted underneath it.
    ///
    /// `index` is where the current item now lives, if it is still present.
    pub fn relocate(&mut self, index: Option<usize>) -> bool {
        match index {
            Some(index) if self.item.is_some() => {
                let changed = self.position != index as isize;
                self.position = index as isize;
                changed
            }
            _ => self.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> Vec<char> {
        vec!['a', 'b', 'c']
    }

    #[test]
    fn test_starts_before_first() {
        let cursor = CursorTracker::<char>::new();
        assert_eq!(cursor.position(), -1);
        assert!(cursor.item().is_none());
        assert!(cursor.is_before_first());
    }

    #[test]
    fn test_move_in_range() {
        let items = window();
        let mut cursor = CursorTracker::new();
        assert!(cursor.move_to(1, items.len(), |i| items.get(i).copied()));
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.item(), Some(&'b'));
    }

    #[test]
    fn test_out_of_range_clamps_and_clears() {
        let items = window();
        let mut cursor = CursorTracker::new();
        cursor.move_to(0, items.len(), |i| items.get(i).copied());

        assert!(!cursor.move_to(7, items.len(), |i| items.get(i).copied()));
        assert_eq!(cursor.position(), 3);
        assert!(cursor.item().is_none());
        assert!(cursor.is_after_last(items.len()));

        assert!(!cursor.move_to(-5, items.len(), |i| items.get(i).copied()));
        assert_eq!(cursor.position(), -1);
        assert!(cursor.item().is_none());
    }

    #[test]
    fn test_noop_unless_page_changing() {
        let mut cursor = CursorTracker::<char>::new();
        assert!(cursor.is_noop(-1, false));
        assert!(!cursor.is_noop(-1, true));
        cursor.move_to(0, 1, |_| Some('a'));
        assert!(!cursor.is_noop(1, false));
    }

    #[test]
    fn test_relocate_follows_item_or_resets() {
        let mut cursor = CursorTracker::new();
        cursor.move_to(0, 1, |_| Some('a'));

        assert!(cursor.relocate(Some(2)));
        assert_eq!(cursor.position(), 2);
        assert!(!cursor.relocate(Some(2)));

        assert!(cursor.relocate(None));
        assert_eq!(cursor.position(), -1);
        assert!(!cursor.reset());
    }
}
