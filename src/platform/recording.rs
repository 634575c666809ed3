//! In-memory [`UpdateBackend`] that records every call.
//!
//! Used to exercise the update manager without a native updater: tests (and
//! host applications' own tests) inspect the call log, count live handles,
//! inject creation/start failures, refuse requests the way a main-thread-only
//! checker does, and fire delegate callbacks by hand.

use std::sync::{Arc, Mutex};

use super::{Capability, CheckerHandle, FeedSettings, UpdateBackend};
use crate::error::{Result, UpdaterError};
use crate::events::{UpdateEvents, VersionInfo};

/// One capability call observed by the recording backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckerCall {
    /// `create_checker` succeeded.
    Create {
        /// Feed URL passed to the checker.
        feed_url: String,
        /// Verification key passed to the checker.
        verification_key: String,
    },
    /// `start_in_background`.
    Start,
    /// `request_interactive_check`.
    InteractiveCheck,
    /// `request_background_check`.
    BackgroundCheck,
    /// `set_automatic_checking`.
    SetAutomaticChecking(bool),
    /// `release`.
    Release,
}

#[derive(Default)]
struct Shared {
    calls: Vec<CheckerCall>,
    live_handles: usize,
    fail_next_create: Option<String>,
    fail_next_start: Option<String>,
    refuse_requests: bool,
    events: Option<Arc<dyn UpdateEvents>>,
}

/// Recording backend; clones share the same log.
#[derive(Clone)]
pub struct RecordingBackend {
    capability: Capability,
    shared: Arc<Mutex<Shared>>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    /// A backend that reports [`Capability::Available`].
    pub fn new() -> Self {
        Self {
            capability: Capability::Available,
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// A backend that reports [`Capability::Unavailable`], mirroring the
    /// platform stub while still recording any stray calls.
    pub fn unavailable() -> Self {
        Self {
            capability: Capability::Unavailable,
            ..Self::new()
        }
    }

    fn shared(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of every call so far, oldest first.
    pub fn calls(&self) -> Vec<CheckerCall> {
        self.shared().calls.clone()
    }

    /// Number of times `call` was recorded.
    pub fn count(&self, call: &CheckerCall) -> usize {
        self.shared().calls.iter().filter(|c| *c == call).count()
    }

    /// Number of handles created and not yet released.
    pub fn live_handles(&self) -> usize {
        self.shared().live_handles
    }

    /// Make the next `create_checker` fail with `reason`.
    pub fn fail_next_create(&self, reason: &str) {
        self.shared().fail_next_create = Some(reason.to_owned());
    }

    /// Make the next `start_in_background` fail with `reason`.
    pub fn fail_next_start(&self, reason: &str) {
        self.shared().fail_next_start = Some(reason.to_owned());
    }

    /// While `refuse` is set, checkers drop every check and toggle request
    /// unrecorded and report an error.
    pub fn refuse_requests(&self, refuse: bool) {
        self.shared().refuse_requests = refuse;
    }

    /// Delegate wired into the most recently created checker, if any.
    pub fn delegate(&self) -> Option<Arc<dyn UpdateEvents>> {
        self.shared().events.clone()
    }

    /// Simulate the checker reporting an aborted check.
    pub fn emit_check_aborted(&self, error: &str) {
        if let Some(events) = self.delegate() {
            events.on_check_aborted(error);
        }
    }

    /// Simulate the checker reporting an available update.
    pub fn emit_update_found(&self, version: &VersionInfo) {
        if let Some(events) = self.delegate() {
            events.on_update_found(version);
        }
    }

    /// Simulate the checker reporting that the app is current.
    pub fn emit_no_update_found(&self) {
        if let Some(events) = self.delegate() {
            events.on_no_update_found();
        }
    }
}

impl UpdateBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    fn create_checker(
        &self,
        feed: &FeedSettings,
        events: Arc<dyn UpdateEvents>,
    ) -> Result<Box<dyn CheckerHandle>> {
        let mut shared = self.shared();
        if let Some(reason) = shared.fail_next_create.take() {
            return Err(UpdaterError::Backend(reason));
        }
        shared.calls.push(CheckerCall::Create {
            feed_url: feed.feed_url.clone(),
            verification_key: feed.verification_key.clone(),
        });
        shared.live_handles += 1;
        shared.events = Some(events);
        Ok(Box::new(RecordingChecker {
            shared: Arc::clone(&self.shared),
            started: false,
        }))
    }
}

struct RecordingChecker {
    shared: Arc<Mutex<Shared>>,
    started: bool,
}

impl RecordingChecker {
    fn record(&self, call: CheckerCall) {
        self.shared
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .push(call);
    }

    fn request(&self, call: CheckerCall) -> Result<()> {
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        if shared.refuse_requests {
            return Err(UpdaterError::Backend(format!("checker refused {call:?}")));
        }
        shared.calls.push(call);
        Ok(())
    }
}

impl CheckerHandle for RecordingChecker {
    fn start_in_background(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        let failure = self
            .shared
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fail_next_start
            .take();
        if let Some(reason) = failure {
            return Err(UpdaterError::Backend(reason));
        }
        self.record(CheckerCall::Start);
        self.started = true;
        Ok(())
    }

    fn request_interactive_check(&mut self) -> Result<()> {
        self.request(CheckerCall::InteractiveCheck)
    }

    fn request_background_check(&mut self) -> Result<()> {
        self.request(CheckerCall::BackgroundCheck)
    }

    fn set_automatic_checking(&mut self, enabled: bool) -> Result<()> {
        self.request(CheckerCall::SetAutomaticChecking(enabled))
    }

    fn release(self: Box<Self>) {
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        shared.calls.push(CheckerCall::Release);
        shared.live_handles = shared.live_handles.saturating_sub(1);
    }
}
