//! Update manager facade.
//!
//! The single entry point the host app drives: `init` once at startup, then
//! interactive/background checks and the automatic-check toggle, then
//! `shutdown`. Every operation serializes on one lock, never panics, and
//! never raises to the caller; misuse is logged and reported as a status.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::config::UpdaterConfig;
use crate::error::{Result, UpdaterError};
use crate::events::{LoggingEvents, UpdateEvents};
use crate::platform::{Capability, CheckerHandle, FeedSettings, UpdateBackend, create_backend};
use crate::update::preferences::{CheckKind, PreferenceStore, UpdatePreferences};
use crate::update::state::{RequestStatus, SkipReason, StateSnapshot, UpdateManagerState};

/// Successful outcome of [`UpdateManager::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStatus {
    /// Configuration stored and (where available) the checker started.
    Initialized,
    /// A previous `init` already succeeded; nothing changed.
    AlreadyInitialized,
}

/// Owns the update checker and its lifecycle.
///
/// `Send + Sync`; share it through an `Arc` when several threads drive it.
pub struct UpdateManager {
    backend: Box<dyn UpdateBackend>,
    events: Arc<dyn UpdateEvents>,
    preferences: Option<PreferenceStore>,
    state: Mutex<UpdateManagerState>,
}

impl UpdateManager {
    /// Manager over `backend` with log-only delegate callbacks and no
    /// persisted preferences.
    pub fn new(backend: Box<dyn UpdateBackend>) -> Self {
        Self {
            backend,
            events: Arc::new(LoggingEvents),
            preferences: None,
            state: Mutex::new(UpdateManagerState::default()),
        }
    }

    /// Manager over the platform-appropriate backend.
    pub fn for_current_platform() -> Self {
        Self::new(create_backend())
    }

    /// Route checker callbacks to `events` instead of the logging default.
    pub fn with_events(mut self, events: Arc<dyn UpdateEvents>) -> Self {
        self.events = events;
        self
    }

    /// Persist the automatic-check choice and check timestamps in `store`.
    pub fn with_preferences(mut self, store: PreferenceStore) -> Self {
        self.preferences = Some(store);
        self
    }

    fn lock(&self) -> MutexGuard<'_, UpdateManagerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store the feed configuration and start the platform checker.
    ///
    /// Only the first successful call has any effect; later calls log a
    /// warning and return [`InitStatus::AlreadyInitialized`]. On a platform
    /// without an updater the manager still becomes initialized, but no
    /// checker is created. After `shutdown`, `init` may run again with the
    /// same feed URL and key; the configuration never changes once set.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::InvalidConfig`] for an empty feed URL or key,
    /// or for one that differs from the first successful `init`, and
    /// [`UpdaterError::Backend`] if the checker cannot be created or started.
    /// In every case the manager stays uninitialized.
    pub fn init(&self, feed_url: &str, verification_key: &str) -> Result<InitStatus> {
        let mut state = self.lock();
        self.init_locked(&mut state, feed_url, verification_key)
    }

    /// [`init`](Self::init) from a config, applying its automatic-check
    /// default unless the user already chose one. The default is not
    /// persisted, so it keeps following the config.
    ///
    /// # Errors
    ///
    /// Same as [`init`](Self::init).
    pub fn init_from_config(&self, config: &UpdaterConfig) -> Result<InitStatus> {
        let mut state = self.lock();
        let status = self.init_locked(&mut state, &config.feed_url, &config.verification_key)?;
        if status == InitStatus::Initialized && self.stored_automatic_checks().is_none() {
            tracing::debug!(
                enabled = config.automatic_checks,
                "applying configured automatic-check default"
            );
            state.set_automatic(config.automatic_checks);
        }
        Ok(status)
    }

    fn init_locked(
        &self,
        state: &mut UpdateManagerState,
        feed_url: &str,
        verification_key: &str,
    ) -> Result<InitStatus> {
        if state.is_initialized() {
            tracing::warn!(feed_url, "update manager already initialized; ignoring init");
            return Ok(InitStatus::AlreadyInitialized);
        }

        let feed = validate_feed(feed_url, verification_key)?;
        if let Some(configured) = state.configured_feed()
            && *configured != feed
        {
            let e = UpdaterError::InvalidConfig(
                "feed URL and verification key cannot change after the first init".to_owned(),
            );
            tracing::error!(
                feed_url = %feed.feed_url,
                configured_feed_url = %configured.feed_url,
                error = %e,
                "refusing to re-initialize update manager"
            );
            return Err(e);
        }

        let checker = match self.backend.capability() {
            Capability::Available => Some(self.start_checker(&feed)?),
            Capability::Unavailable => {
                tracing::info!(
                    backend = self.backend.name(),
                    "no update checker on this platform; update requests will be no-ops"
                );
                None
            }
        };

        tracing::info!(
            backend = self.backend.name(),
            feed_url = %feed.feed_url,
            checker = checker.is_some(),
            "update manager initialized"
        );
        state.mark_initialized(feed, checker);

        if let Some(enabled) = self.stored_automatic_checks() {
            tracing::debug!(enabled, "restoring saved automatic-check preference");
            state.set_automatic(enabled);
        }

        Ok(InitStatus::Initialized)
    }

    fn start_checker(&self, feed: &FeedSettings) -> Result<Box<dyn CheckerHandle>> {
        let mut checker = self
            .backend
            .create_checker(feed, Arc::clone(&self.events))
            .inspect_err(|e| {
                tracing::error!(
                    backend = self.backend.name(),
                    error = %e,
                    "failed to create update checker"
                );
            })?;

        if let Err(e) = checker.start_in_background() {
            tracing::error!(
                backend = self.backend.name(),
                error = %e,
                "failed to start update checker"
            );
            checker.release();
            return Err(e);
        }
        Ok(checker)
    }

    /// Request a user-visible update check.
    pub fn check_interactive(&self) -> RequestStatus {
        self.request_check(CheckKind::Interactive)
    }

    /// Request a silent update check.
    pub fn check_background(&self) -> RequestStatus {
        self.request_check(CheckKind::Background)
    }

    /// Request a silent update check unless one was forwarded less than
    /// `interval_hours` ago, according to the preference store.
    ///
    /// Without a preference store every call is due.
    pub fn check_background_if_due(&self, interval_hours: u64) -> RequestStatus {
        let mut state = self.lock();
        if state.is_initialized() && !self.background_check_due(interval_hours) {
            log_skip("update check", SkipReason::NotDue);
            return RequestStatus::Skipped(SkipReason::NotDue);
        }
        self.forward_check(&mut state, CheckKind::Background)
    }

    fn request_check(&self, kind: CheckKind) -> RequestStatus {
        let mut state = self.lock();
        self.forward_check(&mut state, kind)
    }

    fn forward_check(&self, state: &mut UpdateManagerState, kind: CheckKind) -> RequestStatus {
        let status = state.request_check(kind);
        match status {
            RequestStatus::Forwarded => {
                tracing::debug!(?kind, "update check requested");
                self.persist(|p| p.mark_checked(kind));
            }
            RequestStatus::Skipped(reason) => log_skip("update check", reason),
        }
        status
    }

    /// Turn the checker's scheduled automatic checks on or off.
    ///
    /// Does not start or cancel a check already in flight.
    pub fn set_automatic_check_enabled(&self, enabled: bool) -> RequestStatus {
        let mut state = self.lock();
        let status = state.set_automatic(enabled);
        match status {
            RequestStatus::Forwarded | RequestStatus::Skipped(SkipReason::Unavailable) => {
                tracing::info!(enabled, "automatic update checks toggled");
                self.persist(|p| p.automatic_checks = Some(enabled));
            }
            RequestStatus::Skipped(reason) => log_skip("automatic-check toggle", reason),
        }
        status
    }

    /// Release the checker and return to the uninitialized state.
    ///
    /// Safe to call in any state; a second call is a no-op.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        if !state.is_initialized() {
            tracing::debug!("update manager not initialized; shutdown is a no-op");
            return;
        }
        if let Some(checker) = state.reset() {
            checker.release();
        }
        tracing::info!(backend = self.backend.name(), "update manager shut down");
    }

    /// Returns `true` between a successful `init` and `shutdown`.
    pub fn is_initialized(&self) -> bool {
        self.lock().is_initialized()
    }

    /// Capability of the underlying backend.
    pub fn capability(&self) -> Capability {
        self.backend.capability()
    }

    /// Copy of the observable state.
    pub fn snapshot(&self) -> StateSnapshot {
        let state = self.lock();
        StateSnapshot {
            lifecycle: state.lifecycle(),
            feed_url: state.feed().map(|f| f.feed_url.clone()),
            verification_key: state.feed().map(|f| f.verification_key.clone()),
            automatic_check_enabled: state.automatic_check_enabled(),
            checker_active: state.has_checker(),
            backend: self.backend.name(),
            capability: self.backend.capability(),
        }
    }

    fn background_check_due(&self, interval_hours: u64) -> bool {
        self.preferences
            .as_ref()
            .is_none_or(|store| store.load().background_check_is_stale(interval_hours))
    }

    fn stored_automatic_checks(&self) -> Option<bool> {
        self.preferences
            .as_ref()
            .and_then(|store| store.load().automatic_checks)
    }

    fn persist(&self, edit: impl FnOnce(&mut UpdatePreferences)) {
        if let Some(store) = &self.preferences
            && let Err(e) = store.update(edit)
        {
            tracing::warn!(error = %e, "failed to save update preferences");
        }
    }
}

impl Drop for UpdateManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for UpdateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateManager")
            .field("backend", &self.backend.name())
            .field("preferences", &self.preferences)
            .field("state", &*self.lock())
            .finish()
    }
}

fn validate_feed(feed_url: &str, verification_key: &str) -> Result<FeedSettings> {
    let feed_url = feed_url.trim();
    let verification_key = verification_key.trim();

    if feed_url.is_empty() || verification_key.is_empty() {
        let e = UpdaterError::InvalidConfig(
            "feed URL and verification key must both be non-empty".to_owned(),
        );
        tracing::error!(error = %e, "refusing to initialize update manager");
        return Err(e);
    }

    // The feed format belongs to the checker; only flag obvious typos.
    if let Err(e) = url::Url::parse(feed_url) {
        tracing::warn!(feed_url, error = %e, "feed URL does not parse as a URL");
    }

    Ok(FeedSettings {
        feed_url: feed_url.to_owned(),
        verification_key: verification_key.to_owned(),
    })
}

fn log_skip(what: &'static str, reason: SkipReason) {
    match reason {
        SkipReason::NotInitialized => {
            tracing::warn!(what, "update manager not initialized; request ignored");
        }
        SkipReason::Unavailable => {
            tracing::debug!(what, "no update checker on this platform; request ignored");
        }
        SkipReason::Refused => {
            tracing::debug!(what, "update checker refused request; state unchanged");
        }
        SkipReason::NotDue => {
            tracing::debug!(what, "background check ran recently; request ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::events::{ChannelEvents, UpdateEvent, VersionInfo};
    use crate::platform::recording::{CheckerCall, RecordingBackend};

    const FEED: &str = "https://feed.example/appcast.xml";
    const KEY: &str = "key123";

    fn recording_manager() -> (UpdateManager, RecordingBackend) {
        let backend = RecordingBackend::new();
        (UpdateManager::new(Box::new(backend.clone())), backend)
    }

    #[test]
    fn manager_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UpdateManager>();
    }

    #[test]
    fn second_init_keeps_first_configuration() {
        let (manager, backend) = recording_manager();
        assert_eq!(manager.init(FEED, KEY).unwrap(), InitStatus::Initialized);
        assert_eq!(
            manager
                .init("https://other.example/appcast.xml", "other-key")
                .unwrap(),
            InitStatus::AlreadyInitialized
        );

        let snapshot = manager.snapshot();
        assert_eq!(snapshot.feed_url.as_deref(), Some(FEED));
        assert_eq!(snapshot.verification_key.as_deref(), Some(KEY));
        assert_eq!(backend.live_handles(), 1);
    }

    #[test]
    fn init_rejects_empty_arguments() {
        let (manager, backend) = recording_manager();
        assert!(matches!(
            manager.init("", KEY),
            Err(UpdaterError::InvalidConfig(_))
        ));
        assert!(matches!(
            manager.init(FEED, "  "),
            Err(UpdaterError::InvalidConfig(_))
        ));
        assert!(!manager.is_initialized());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn init_trims_arguments() {
        let (manager, backend) = recording_manager();
        manager.init(" url1 ", "key1\n").unwrap();
        assert_eq!(
            backend.calls()[0],
            CheckerCall::Create {
                feed_url: "url1".to_owned(),
                verification_key: "key1".to_owned(),
            }
        );
    }

    #[test]
    fn create_failure_leaves_manager_retryable() {
        let (manager, backend) = recording_manager();
        backend.fail_next_create("framework missing");

        assert!(matches!(
            manager.init(FEED, KEY),
            Err(UpdaterError::Backend(_))
        ));
        assert!(!manager.is_initialized());
        assert_eq!(backend.live_handles(), 0);

        assert_eq!(manager.init(FEED, KEY).unwrap(), InitStatus::Initialized);
        assert_eq!(backend.live_handles(), 1);
    }

    #[test]
    fn start_failure_releases_partial_checker() {
        let (manager, backend) = recording_manager();
        backend.fail_next_start("no host bundle");

        assert!(manager.init(FEED, KEY).is_err());
        assert!(!manager.is_initialized());
        assert_eq!(backend.live_handles(), 0);
        assert_eq!(backend.count(&CheckerCall::Release), 1);
    }

    #[test]
    fn checks_before_init_never_touch_a_checker() {
        let (manager, backend) = recording_manager();
        let skipped = RequestStatus::Skipped(SkipReason::NotInitialized);

        assert_eq!(manager.check_interactive(), skipped);
        assert_eq!(manager.check_background(), skipped);
        assert_eq!(manager.set_automatic_check_enabled(true), skipped);
        assert!(backend.calls().is_empty());
        assert!(!manager.snapshot().automatic_check_enabled);
    }

    #[test]
    fn interactive_check_issues_exactly_one_request() {
        let (manager, backend) = recording_manager();
        manager.init(FEED, KEY).unwrap();
        assert_eq!(manager.check_interactive(), RequestStatus::Forwarded);
        assert_eq!(backend.count(&CheckerCall::InteractiveCheck), 1);
        assert_eq!(backend.count(&CheckerCall::BackgroundCheck), 0);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let (manager, backend) = recording_manager();
        manager.shutdown();
        manager.init(FEED, KEY).unwrap();
        manager.shutdown();
        manager.shutdown();

        assert!(!manager.is_initialized());
        assert_eq!(backend.count(&CheckerCall::Release), 1);
        assert_eq!(backend.live_handles(), 0);
        assert_eq!(manager.snapshot().feed_url, None);
    }

    #[test]
    fn unavailable_backend_still_tracks_lifecycle() {
        let backend = RecordingBackend::unavailable();
        let manager = UpdateManager::new(Box::new(backend.clone()));

        assert_eq!(manager.init(FEED, KEY).unwrap(), InitStatus::Initialized);
        assert!(manager.is_initialized());
        assert_eq!(
            manager.check_interactive(),
            RequestStatus::Skipped(SkipReason::Unavailable)
        );
        assert_eq!(
            manager.check_background(),
            RequestStatus::Skipped(SkipReason::Unavailable)
        );
        assert_eq!(
            manager.set_automatic_check_enabled(true),
            RequestStatus::Skipped(SkipReason::Unavailable)
        );
        assert!(manager.snapshot().automatic_check_enabled);
        assert!(!manager.snapshot().checker_active);

        manager.shutdown();
        assert!(!manager.is_initialized());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn dropping_manager_releases_checker() {
        let (manager, backend) = recording_manager();
        manager.init(FEED, KEY).unwrap();
        drop(manager);
        assert_eq!(backend.live_handles(), 0);
        assert_eq!(backend.count(&CheckerCall::Release), 1);
    }

    #[test]
    fn delegate_callbacks_reach_events_without_changing_state() {
        let backend = RecordingBackend::new();
        let (events, rx) = ChannelEvents::unbounded();
        let manager = UpdateManager::new(Box::new(backend.clone())).with_events(Arc::new(events));
        manager.init(FEED, KEY).unwrap();
        let before = manager.snapshot();

        backend.emit_check_aborted("feed unreachable");
        backend.emit_update_found(&VersionInfo {
            version: "412".to_owned(),
            display_version: "0.8.0".to_owned(),
            release_notes_url: None,
        });
        backend.emit_no_update_found();

        assert_eq!(manager.snapshot(), before);
        let received: Vec<UpdateEvent> = rx.try_iter().collect();
        assert_eq!(received.len(), 3);
        assert!(matches!(received[0], UpdateEvent::CheckAborted { .. }));
    }

    #[test]
    fn toggle_is_persisted_and_restored() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));

        let backend = RecordingBackend::new();
        let manager =
            UpdateManager::new(Box::new(backend.clone())).with_preferences(store.clone());
        manager.init(FEED, KEY).unwrap();
        manager.set_automatic_check_enabled(false);
        manager.check_background();
        drop(manager);

        let saved = store.load();
        assert_eq!(saved.automatic_checks, Some(false));
        assert!(saved.last_background_check.is_some());

        let backend = RecordingBackend::new();
        let manager = UpdateManager::new(Box::new(backend.clone())).with_preferences(store);
        manager.init(FEED, KEY).unwrap();
        assert!(!manager.snapshot().automatic_check_enabled);
        assert_eq!(
            backend.count(&CheckerCall::SetAutomaticChecking(false)),
            1
        );
    }

    #[test]
    fn init_from_config_applies_default_only_without_saved_choice() {
        let config = UpdaterConfig::new(FEED, KEY);

        let (manager, backend) = recording_manager();
        manager.init_from_config(&config).unwrap();
        assert!(manager.snapshot().automatic_check_enabled);
        assert_eq!(backend.count(&CheckerCall::SetAutomaticChecking(true)), 1);

        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));
        store
            .save(&UpdatePreferences {
                automatic_checks: Some(false),
                ..Default::default()
            })
            .unwrap();
        let backend = RecordingBackend::new();
        let manager = UpdateManager::new(Box::new(backend.clone())).with_preferences(store);
        manager.init_from_config(&config).unwrap();
        assert!(!manager.snapshot().automatic_check_enabled);
        assert_eq!(backend.count(&CheckerCall::SetAutomaticChecking(true)), 0);
    }

    #[test]
    fn refused_requests_are_reported_and_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));
        let backend = RecordingBackend::new();
        let manager =
            UpdateManager::new(Box::new(backend.clone())).with_preferences(store.clone());
        manager.init(FEED, KEY).unwrap();
        backend.refuse_requests(true);

        let refused = RequestStatus::Skipped(SkipReason::Refused);
        assert_eq!(manager.set_automatic_check_enabled(true), refused);
        assert_eq!(manager.check_background(), refused);
        assert_eq!(manager.check_interactive(), refused);

        assert!(!manager.snapshot().automatic_check_enabled);
        let saved = store.load();
        assert_eq!(saved.automatic_checks, None);
        assert!(saved.last_background_check.is_none());
        assert!(saved.last_interactive_check.is_none());
    }

    #[test]
    fn reinit_after_shutdown_keeps_the_first_feed() {
        let (manager, backend) = recording_manager();
        manager.init("url1", "key1").unwrap();
        manager.shutdown();

        assert!(matches!(
            manager.init("url2", "key2"),
            Err(UpdaterError::InvalidConfig(_))
        ));
        assert!(!manager.is_initialized());
        assert_eq!(backend.live_handles(), 0);

        assert_eq!(manager.init("url1", "key1").unwrap(), InitStatus::Initialized);
        let snapshot = manager.snapshot();
        assert_eq!(snapshot.feed_url.as_deref(), Some("url1"));
        assert_eq!(snapshot.verification_key.as_deref(), Some("key1"));
        assert!(!backend.calls().iter().any(|c| matches!(
            c,
            CheckerCall::Create { feed_url, .. } if feed_url == "url2"
        )));
    }

    #[test]
    fn failed_first_init_does_not_pin_the_feed() {
        let (manager, backend) = recording_manager();
        backend.fail_next_create("framework missing");
        assert!(manager.init("url1", "key1").is_err());
        assert_eq!(manager.init("url2", "key2").unwrap(), InitStatus::Initialized);
        assert_eq!(manager.snapshot().feed_url.as_deref(), Some("url2"));
    }

    #[test]
    fn init_from_config_with_empty_store_applies_default_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));
        let backend = RecordingBackend::new();
        let manager =
            UpdateManager::new(Box::new(backend.clone())).with_preferences(store.clone());

        let mut config = UpdaterConfig::new(FEED, KEY);
        config.automatic_checks = false;
        manager.init_from_config(&config).unwrap();

        assert!(!manager.snapshot().automatic_check_enabled);
        assert_eq!(backend.count(&CheckerCall::SetAutomaticChecking(false)), 1);
        assert_eq!(store.load().automatic_checks, None);
        assert!(!store.path().exists());
    }

    #[test]
    fn unwritable_store_does_not_change_request_status() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = PreferenceStore::new(blocker.join("prefs.json"));

        let backend = RecordingBackend::new();
        let manager = UpdateManager::new(Box::new(backend.clone())).with_preferences(store);
        manager.init(FEED, KEY).unwrap();

        assert_eq!(manager.check_background(), RequestStatus::Forwarded);
        assert_eq!(manager.set_automatic_check_enabled(true), RequestStatus::Forwarded);
        assert!(manager.snapshot().automatic_check_enabled);
        assert_eq!(backend.count(&CheckerCall::BackgroundCheck), 1);
    }

    #[test]
    fn background_check_if_due_follows_the_interval() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));
        let backend = RecordingBackend::new();
        let manager =
            UpdateManager::new(Box::new(backend.clone())).with_preferences(store.clone());

        assert_eq!(
            manager.check_background_if_due(24),
            RequestStatus::Skipped(SkipReason::NotInitialized)
        );

        manager.init(FEED, KEY).unwrap();
        assert_eq!(manager.check_background_if_due(24), RequestStatus::Forwarded);
        assert!(store.load().last_background_check.is_some());

        assert_eq!(
            manager.check_background_if_due(24),
            RequestStatus::Skipped(SkipReason::NotDue)
        );
        assert_eq!(manager.check_background_if_due(0), RequestStatus::Forwarded);
        assert_eq!(backend.count(&CheckerCall::BackgroundCheck), 2);
    }

    #[test]
    fn background_check_is_always_due_without_a_store() {
        let (manager, backend) = recording_manager();
        manager.init(FEED, KEY).unwrap();
        assert!(manager.check_background_if_due(24).is_forwarded());
        assert!(manager.check_background_if_due(24).is_forwarded());
        assert_eq!(backend.count(&CheckerCall::BackgroundCheck), 2);
    }

    #[test]
    fn concurrent_callers_create_one_checker() {
        let backend = RecordingBackend::new();
        let manager = Arc::new(UpdateManager::new(Box::new(backend.clone())));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || {
                    let _ = manager.init(FEED, KEY);
                    manager.check_background();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(backend.live_handles(), 1);
        assert_eq!(backend.count(&CheckerCall::Start), 1);
        assert_eq!(backend.count(&CheckerCall::BackgroundCheck), 8);
    }
}
