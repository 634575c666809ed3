//! Lifecycle state owned by the update manager.
//!
//! Holds the feed configuration, the mirrored automatic-check flag and the
//! exclusively owned checker handle. Only `mark_initialized` installs a
//! handle and only `reset` gives it up, so no other path can create or
//! destroy the checker. The feed from the first successful `init` is kept
//! across `reset` and pins every later `init`.

use serde::Serialize;

use crate::platform::{Capability, CheckerHandle, FeedSettings};
use crate::update::preferences::CheckKind;

/// Manager lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// `init` has not succeeded yet, or `shutdown` ran.
    #[default]
    Uninitialized,
    /// Configuration stored; requests are accepted.
    Initialized,
}

/// Why a request did not reach a checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Called before `init` or after `shutdown`.
    NotInitialized,
    /// No update checker exists for this platform.
    Unavailable,
    /// The checker rejected the request; Sparkle does this off the main
    /// thread. Nothing was enqueued and the mirrored flag is unchanged.
    Refused,
    /// The last background check is more recent than the configured interval.
    NotDue,
}

/// Outcome of a check or toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RequestStatus {
    /// Handed to the checker.
    Forwarded,
    /// Not enqueued with a checker.
    Skipped(SkipReason),
}

impl RequestStatus {
    /// Returns `true` if the request reached the checker.
    pub fn is_forwarded(self) -> bool {
        matches!(self, Self::Forwarded)
    }
}

/// Observable copy of the manager state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    /// Current lifecycle.
    pub lifecycle: Lifecycle,
    /// Feed URL from the first successful `init`, while initialized.
    pub feed_url: Option<String>,
    /// Verification key from the first successful `init`, while initialized.
    pub verification_key: Option<String>,
    /// Mirrored automatic-check flag.
    pub automatic_check_enabled: bool,
    /// Whether a checker handle is currently owned.
    pub checker_active: bool,
    /// Backend identifier.
    pub backend: &'static str,
    /// Backend capability.
    pub capability: Capability,
}

/// Mutable manager state. Always accessed under the manager's lock.
#[derive(Default)]
pub struct UpdateManagerState {
    lifecycle: Lifecycle,
    feed: Option<FeedSettings>,
    automatic_check_enabled: bool,
    checker: Option<Box<dyn CheckerHandle>>,
}

impl UpdateManagerState {
    /// Returns `true` once `init` has succeeded and until `shutdown`.
    pub fn is_initialized(&self) -> bool {
        self.lifecycle == Lifecycle::Initialized
    }

    /// Current lifecycle.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Feed settings, while initialized.
    pub fn feed(&self) -> Option<&FeedSettings> {
        self.feed.as_ref().filter(|_| self.is_initialized())
    }

    /// Feed settings from the first successful `init`, kept after `shutdown`.
    pub fn configured_feed(&self) -> Option<&FeedSettings> {
        self.feed.as_ref()
    }

    /// Mirrored automatic-check flag.
    pub fn automatic_check_enabled(&self) -> bool {
        self.automatic_check_enabled
    }

    /// Whether a checker handle is owned.
    pub fn has_checker(&self) -> bool {
        self.checker.is_some()
    }

    /// Store configuration and take ownership of `checker`.
    ///
    /// `checker` is `None` when the platform has no updater.
    pub(crate) fn mark_initialized(
        &mut self,
        feed: FeedSettings,
        checker: Option<Box<dyn CheckerHandle>>,
    ) {
        debug_assert!(!self.is_initialized(), "checker replaced while initialized");
        debug_assert!(
            self.feed.as_ref().is_none_or(|f| *f == feed),
            "feed changed after first init"
        );
        self.lifecycle = Lifecycle::Initialized;
        self.feed = Some(feed);
        self.automatic_check_enabled = false;
        self.checker = checker;
    }

    /// Return to Uninitialized, handing back the checker for release.
    pub(crate) fn reset(&mut self) -> Option<Box<dyn CheckerHandle>> {
        self.lifecycle = Lifecycle::Uninitialized;
        self.automatic_check_enabled = false;
        self.checker.take()
    }

    /// Forward a check of `kind` to the checker, if allowed.
    pub(crate) fn request_check(&mut self, kind: CheckKind) -> RequestStatus {
        if !self.is_initialized() {
            return RequestStatus::Skipped(SkipReason::NotInitialized);
        }
        let Some(checker) = self.checker.as_mut() else {
            return RequestStatus::Skipped(SkipReason::Unavailable);
        };
        let sent = match kind {
            CheckKind::Interactive => checker.request_interactive_check(),
            CheckKind::Background => checker.request_background_check(),
        };
        match sent {
            Ok(()) => RequestStatus::Forwarded,
            Err(e) => {
                tracing::warn!(?kind, error = %e, "update checker refused check request");
                RequestStatus::Skipped(SkipReason::Refused)
            }
        }
    }

    /// Forward `enabled` to the checker and mirror it once accepted.
    ///
    /// Without a checker the local flag still follows, so UI bound to it
    /// stays consistent on every platform. A refused toggle leaves the
    /// mirror untouched.
    pub(crate) fn set_automatic(&mut self, enabled: bool) -> RequestStatus {
        if !self.is_initialized() {
            return RequestStatus::Skipped(SkipReason::NotInitialized);
        }
        let Some(checker) = self.checker.as_mut() else {
            self.automatic_check_enabled = enabled;
            return RequestStatus::Skipped(SkipReason::Unavailable);
        };
        match checker.set_automatic_checking(enabled) {
            Ok(()) => {
                self.automatic_check_enabled = enabled;
                RequestStatus::Forwarded
            }
            Err(e) => {
                tracing::warn!(enabled, error = %e, "update checker refused automatic-check toggle");
                RequestStatus::Skipped(SkipReason::Refused)
            }
        }
    }
}

impl std::fmt::Debug for UpdateManagerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateManagerState")
            .field("lifecycle", &self.lifecycle)
            .field("feed", &self.feed)
            .field("automatic_check_enabled", &self.automatic_check_enabled)
            .field("checker", &self.checker.is_some())
            .finish()
    }
}
