//! Compatibility engine
//!
//! - [`manager`]: `VersionManager`, the single source of truth for the update status
//! - [`publisher`]: observable status with filtered subscriptions
//! - [`debug_tool`]: developer hooks for forcing a status on a test device

pub mod debug_tool;
pub mod manager;
pub mod publisher;

pub use debug_tool::VersioningDebugTool;
pub use manager::{PlatformServices, VersionManager, VersionManagerDeps};
pub use publisher::{StatusPublisher, StatusSubscription};
