use thiserror::Error;

use crate::core::config::ConfigError;

/// Errors surfaced by the engine's own lifecycle. Portal failures never show
/// up here: they end in the log text (see [`crate::auth::AuthError`]).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The worker pool needs at least one thread.
    #[error("invalid worker thread count: {0}")]
    InvalidThreadCount(usize),

    /// Building the async runtime failed.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    /// The log file could not be opened.
    #[error("logging error: {0}")]
    Logging(std::io::Error),

    /// The engine was constructed outside of a runtime context.
    #[error("no async runtime available")]
    NoRuntime,

    /// The action queue is closed.
    #[error("engine is shutting down")]
    ShutdownInProgress,

    /// Loading or resolving the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
