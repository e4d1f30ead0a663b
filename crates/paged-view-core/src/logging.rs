//! Logging facilities for paged-view.
//!
//! paged-view uses the `tracing` crate for instrumentation and never installs
//! a subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("paged_view=debug")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "paged_view_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "paged_view_core::signal";
    /// Property system target.
    pub const PROPERTY: &str = "paged_view_core::property";
}
