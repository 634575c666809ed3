//! Fae updater: application update facade backed by a platform checker.
//!
//! # Architecture
//!
//! - **Platform**: [`platform::UpdateBackend`] creates a checker; Sparkle on
//!   macOS, a no-op stub elsewhere
//! - **Manager**: [`UpdateManager`] owns the checker and its lifecycle
//!   (`init` → checks / toggle → `shutdown`)
//! - **Events**: checker callbacks, logged and optionally forwarded
//! - **FFI**: C ABI so the native app shell can own a manager

pub mod config;
pub mod error;
pub mod events;
pub mod ffi;
pub mod platform;
pub mod update;

pub use config::UpdaterConfig;
pub use error::{Result, UpdaterError};
pub use events::{ChannelEvents, LoggingEvents, UpdateEvent, UpdateEvents, VersionInfo};
pub use platform::{Capability, CheckerHandle, FeedSettings, UpdateBackend, create_backend};
pub use update::{InitStatus, RequestStatus, SkipReason, StateSnapshot, UpdateManager};
