//! Logging facilities for Horizon Tags.
//!
//! Horizon Tags uses the `tracing` crate for instrumentation and never
//! installs a subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_tags=debug,horizon_tags_core=trace")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core plumbing target.
    pub const CORE: &str = "horizon_tags_core";
    /// Event bus dispatch.
    pub const BUS: &str = "horizon_tags_core::bus";
    /// Debounce timers.
    pub const DEBOUNCE: &str = "horizon_tags_core::debounce";
    /// Runtime bridge.
    pub const RUNTIME: &str = "horizon_tags_core::runtime";
    /// Tag list mutations.
    pub const TAG_LIST: &str = "horizon_tags::tag_list";
    /// Suggestion loading and selection.
    pub const SUGGESTIONS: &str = "horizon_tags::suggestions";
    /// Veto gate decisions.
    pub const VETO: &str = "horizon_tags::veto";
    /// Option resolution.
    pub const CONFIG: &str = "horizon_tags::config";
    /// Input controllers.
    pub const INPUT: &str = "horizon_tags::input";
}
