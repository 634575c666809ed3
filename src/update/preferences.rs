//! Persisted update preferences.
//!
//! Tracks the user's automatic-check choice and the last check timestamps so
//! they survive restarts. Stored as pretty JSON at a caller-chosen path.

use crate::error::{Result, UpdaterError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which kind of check a timestamp refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    /// User-requested check.
    Interactive,
    /// Silent check.
    Background,
}

/// Persistent update preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePreferences {
    /// Explicit automatic-check choice; `None` until the user toggles it.
    pub automatic_checks: Option<bool>,
    /// RFC 3339 timestamp of the last forwarded interactive check.
    pub last_interactive_check: Option<String>,
    /// RFC 3339 timestamp of the last forwarded background check.
    pub last_background_check: Option<String>,
}

impl UpdatePreferences {
    /// Record that a check of `kind` was requested now.
    pub fn mark_checked(&mut self, kind: CheckKind) {
        let now = Some(Utc::now().to_rfc3339());
        match kind {
            CheckKind::Interactive => self.last_interactive_check = now,
            CheckKind::Background => self.last_background_check = now,
        }
    }

    /// Returns `true` if the last background check was at least `hours` hours
    /// ago, or if none has been recorded (or the timestamp is unreadable).
    pub fn background_check_is_stale(&self, hours: u64) -> bool {
        let Some(timestamp) = &self.last_background_check else {
            return true;
        };
        let Ok(last) = DateTime::parse_from_rfc3339(timestamp) else {
            return true;
        };
        let elapsed = Utc::now().signed_duration_since(last.with_timezone(&Utc));
        elapsed.num_hours() >= i64::try_from(hours).unwrap_or(i64::MAX)
    }
}

/// File-backed store for [`UpdatePreferences`].
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Store backed by `path`. Nothing is read or written until used.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location: `<config dir>/fae/update-preferences.json`.
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|d| Self::new(d.join("fae").join("update-preferences.json")))
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences. Returns defaults if the file is missing or cannot
    /// be parsed.
    pub fn load(&self) -> UpdatePreferences {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable update preferences");
                UpdatePreferences::default()
            }),
            Err(_) => UpdatePreferences::default(),
        }
    }

    /// Persist `prefs`, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot
    /// be written.
    pub fn save(&self, prefs: &UpdatePreferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                UpdaterError::Preferences(format!(
                    "cannot create preferences directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(prefs)
            .map_err(|e| UpdaterError::Preferences(format!("cannot serialize preferences: {e}")))?;

        std::fs::write(&self.path, json).map_err(|e| {
            UpdaterError::Preferences(format!(
                "cannot write preferences to {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Load, apply `edit`, and save.
    ///
    /// # Errors
    ///
    /// Propagates [`save`](Self::save) failures.
    pub fn update(&self, edit: impl FnOnce(&mut UpdatePreferences)) -> Result<()> {
        let mut prefs = self.load();
        edit(&mut prefs);
        self.save(&prefs)
    }
}
