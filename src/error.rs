//! Error types for the update facade.

/// Top-level error type for the updater.
#[derive(Debug, thiserror::Error)]
pub enum UpdaterError {
    /// Feed URL or verification key rejected before reaching the backend.
    #[error("invalid update configuration: {0}")]
    InvalidConfig(String),

    /// The platform update checker could not be created or started.
    #[error("update backend error: {0}")]
    Backend(String),

    /// Configuration file could not be parsed or serialized.
    #[error("config error: {0}")]
    Config(String),

    /// Preference state could not be persisted.
    #[error("preferences error: {0}")]
    Preferences(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, UpdaterError>;
