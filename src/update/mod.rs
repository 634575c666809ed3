//! Update-check state manager.
//!
//! Gates one-time initialization of the platform update checker, tracks the
//! automatic-check setting, and serializes interactive and background check
//! requests. Preferences persist the user's toggle across restarts.

pub mod manager;
pub mod preferences;
pub mod state;

pub use manager::{InitStatus, UpdateManager};
pub use preferences::{CheckKind, PreferenceStore, UpdatePreferences};
pub use state::{Lifecycle, RequestStatus, SkipReason, StateSnapshot, UpdateManagerState};
