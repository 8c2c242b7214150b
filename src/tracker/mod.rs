//! Tab association tracking
//!
//! Keeps the tab -> container mapping for tabs the engine opened, and the
//! short-lived dedup tables that stop a redirect chain from creating more
//! than one container for the same navigation.

mod dedup;
mod tabs;

pub use dedup::DedupTable;
pub use tabs::TabTracker;
