//! Delegate callbacks raised by the platform update checker.
//!
//! Callbacks are purely observational: they never touch manager state and may
//! arrive on whatever thread the checker uses. The default implementation
//! only logs; [`ChannelEvents`] additionally forwards each event to the host.

use serde::{Deserialize, Serialize};

/// Version details reported when the checker finds an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Machine-comparable version (Sparkle's `sparkle:version`).
    pub version: String,
    /// Human-facing version string shown in UI.
    pub display_version: String,
    /// Release notes link, when the feed provides one.
    pub release_notes_url: Option<String>,
}

/// An observed checker outcome, in a form that can cross threads or FFI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UpdateEvent {
    /// The check was aborted (network failure, bad signature, ...).
    CheckAborted {
        /// Checker-provided description of the failure.
        error: String,
    },
    /// A newer version is available.
    UpdateFound {
        /// Details of the available version.
        version: VersionInfo,
    },
    /// The check completed and the app is up to date.
    NoUpdateFound,
}

/// Receiver for checker callbacks.
///
/// Every method has a logging default, so an implementation only overrides
/// what it wants to surface.
pub trait UpdateEvents: Send + Sync {
    /// The checker aborted a check cycle.
    fn on_check_aborted(&self, error: &str) {
        tracing::error!(error, "update check aborted");
    }

    /// The checker found a valid update.
    fn on_update_found(&self, version: &VersionInfo) {
        tracing::info!(
            version = %version.version,
            display_version = %version.display_version,
            "update available"
        );
    }

    /// The checker found no newer version.
    fn on_no_update_found(&self) {
        tracing::info!("no update available");
    }
}

/// Log-only event receiver.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEvents;

impl UpdateEvents for LoggingEvents {}

/// Logs every event and forwards it over a channel.
///
/// A disconnected receiver is not an error; the event is still logged.
#[derive(Debug, Clone)]
pub struct ChannelEvents {
    tx: crossbeam_channel::Sender<UpdateEvent>,
}

impl ChannelEvents {
    /// Create a forwarder and the receiving end for the host.
    pub fn unbounded() -> (Self, crossbeam_channel::Receiver<UpdateEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    fn forward(&self, event: UpdateEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("update event receiver dropped");
        }
    }
}

impl UpdateEvents for ChannelEvents {
    fn on_check_aborted(&self, error: &str) {
        LoggingEvents.on_check_aborted(error);
        self.forward(UpdateEvent::CheckAborted {
            error: error.to_owned(),
        });
    }

    fn on_update_found(&self, version: &VersionInfo) {
        LoggingEvents.on_update_found(version);
        self.forward(UpdateEvent::UpdateFound {
            version: version.clone(),
        });
    }

    fn on_no_update_found(&self) {
        LoggingEvents.on_no_update_found();
        self.forward(UpdateEvent::NoUpdateFound);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn sample_version() -> VersionInfo {
        VersionInfo {
            version: "412".to_owned(),
            display_version: "0.8.0".to_owned(),
            release_notes_url: Some("https://feed.example/notes/0.8.0.html".to_owned()),
        }
    }

    #[test]
    fn channel_events_forward_in_order() {
        let (events, rx) = ChannelEvents::unbounded();
        events.on_no_update_found();
        events.on_update_found(&sample_version());
        events.on_check_aborted("signature mismatch");

        let received: Vec<UpdateEvent> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                UpdateEvent::NoUpdateFound,
                UpdateEvent::UpdateFound {
                    version: sample_version()
                },
                UpdateEvent::CheckAborted {
                    error: "signature mismatch".to_owned()
                },
            ]
        );
    }

    #[test]
    fn channel_events_survive_dropped_receiver() {
        let (events, rx) = ChannelEvents::unbounded();
        drop(rx);
        // Must not panic.
        events.on_check_aborted("offline");
    }

    #[test]
    fn update_event_json_is_tagged() {
        let json = serde_json::to_value(UpdateEvent::UpdateFound {
            version: sample_version(),
        })
        .unwrap();
        assert_eq!(json["event"], "update_found");
        assert_eq!(json["version"]["display_version"], "0.8.0");

        let json = serde_json::to_value(UpdateEvent::NoUpdateFound).unwrap();
        assert_eq!(json["event"], "no_update_found");
    }
}
