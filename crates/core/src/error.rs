/// Result alias that carries the custom [`ZellijError`] type.
pub type Result<T> = std::result::Result<T, ZellijError>;

/// Common error type for the core crate.
///
/// Geometry precondition violations are not represented here: they signal a
/// bug in a controller's index tables and panic instead.
#[derive(Debug, thiserror::Error)]
pub enum ZellijError {
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Config files and transcripts are JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// The pulse must be positive and no longer than [`crate::timeline::MAX_PULSE`].
    #[error("pulse interval must be positive and at most an hour, got {0:?}")]
    InvalidPulse(std::time::Duration),
    /// A timeline needs at least one state to start from.
    #[error("timeline must contain at least one state")]
    EmptyTimeline,
    /// `start` was called while the scheduler was still running.
    #[error("scheduler is already running; stop it before starting again")]
    AlreadyRunning,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
