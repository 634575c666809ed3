//! Platform update-checker abstractions.
//!
//! Provides the [`UpdateBackend`] / [`CheckerHandle`] capability traits the
//! update manager drives. On macOS the checker is Sparkle, reached through
//! the Objective-C runtime. On other platforms a no-op stub reports the
//! capability as unavailable so callers never branch on platform.

use std::sync::Arc;

use crate::error::Result;
use crate::events::UpdateEvents;

#[cfg(target_os = "macos")]
mod sparkle;
#[cfg(not(target_os = "macos"))]
mod stub;
// Re-export stub for tests on all platforms.
#[cfg(test)]
#[cfg(target_os = "macos")]
#[path = "stub.rs"]
mod stub;

pub mod recording;

#[cfg(target_os = "macos")]
pub use sparkle::SparkleBackend;
#[cfg(not(target_os = "macos"))]
pub use stub::StubBackend;

/// Whether a backend can actually reach an update checker in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// A checker can be created and driven.
    Available,
    /// No checker exists for this build or process; operations are no-ops.
    Unavailable,
}

/// Feed configuration handed to the checker at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    /// Appcast URL.
    pub feed_url: String,
    /// Public key the checker uses to authenticate the feed.
    pub verification_key: String,
}

/// Factory for platform update checkers.
pub trait UpdateBackend: Send + Sync {
    /// Short identifier used in logs and status reports.
    fn name(&self) -> &'static str;

    /// Whether [`create_checker`](UpdateBackend::create_checker) can succeed
    /// in this process.
    fn capability(&self) -> Capability;

    /// Construct a checker for `feed`, wiring `events` as its delegate.
    ///
    /// The returned handle is not started yet; the caller follows up with
    /// [`CheckerHandle::start_in_background`].
    fn create_checker(
        &self,
        feed: &FeedSettings,
        events: Arc<dyn UpdateEvents>,
    ) -> Result<Box<dyn CheckerHandle>>;
}

/// A live update checker, exclusively owned by the update manager.
///
/// Requests only enqueue work with the checker and return immediately. A
/// request that returns `Err` was not enqueued and left the checker as it was.
pub trait CheckerHandle: Send {
    /// Start the checker's scheduler. Calling it again is a no-op.
    fn start_in_background(&mut self) -> Result<()>;

    /// Ask for a user-visible check; the checker owns all UI.
    fn request_interactive_check(&mut self) -> Result<()>;

    /// Ask for a silent check that must not present blocking UI.
    fn request_background_check(&mut self) -> Result<()>;

    /// Toggle the checker's scheduled automatic checks.
    fn set_automatic_checking(&mut self, enabled: bool) -> Result<()>;

    /// Tear the checker down. Consumes the handle so it cannot be reused.
    fn release(self: Box<Self>);
}

/// Create the platform-appropriate update backend.
///
/// Returns the Sparkle backend on macOS, or a no-op stub on all other
/// platforms.
pub fn create_backend() -> Box<dyn UpdateBackend> {
    #[cfg(target_os = "macos")]
    {
        Box::new(sparkle::SparkleBackend::new())
    }
    #[cfg(not(target_os = "macos"))]
    {
        Box::new(stub::StubBackend)
    }
}
