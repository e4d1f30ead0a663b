//! Core systems for paged-view.
//!
//! This crate provides the observer plumbing the paged collection view is
//! built on:
//!
//! - **Signal/Slot System**: Type-safe notifications with direct dispatch
//! - **Property System**: Values with change detection
//! - **Cancel Flags**: Shared flags for cancelable "changing" notifications
//! - **Logging**: `tracing` target names
//!
//! # Cancelable Notification Example
//!
//! ```
//! use paged_view_core::{CancelFlag, Signal};
//!
//! let changing = Signal::<(usize, CancelFlag)>::new();
//! changing.connect(|(target, flag)| {
//!     if *target > 3 {
//!         flag.cancel();
//!     }
//! });
//!
//! let flag = CancelFlag::new();
//! changing.emit((5, flag.clone()));
//! assert!(flag.is_canceled());
//! ```

mod cancel;
pub mod logging;
pub mod property;
pub mod signal;

pub use cancel::CancelFlag;
pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
