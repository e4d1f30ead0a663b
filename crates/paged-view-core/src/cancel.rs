//! Cancelable notification support.
//!
//! A [`CancelFlag`] travels inside the payload of a "changing" notification.
//! Every slot sees the same flag; the emitter inspects it once dispatch has
//! finished to decide whether to proceed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared, one-way cancel flag.
///
/// Clones observe the same state. Once canceled the flag stays canceled.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    canceled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a flag in the not-canceled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!flag.is_canceled());

        other.cancel();
        assert!(flag.is_canceled());
        assert!(other.is_canceled());
    }
}
