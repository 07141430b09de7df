//! Error types for the editor runtime
//!
//! Only failures a caller must act on are errors. Calls made before the
//! engine is loaded, out-of-order lifecycle calls and engine-side command
//! rejections are reported as values (`LifecycleOutcome`, `CommandResult`).

use thiserror::Error;

/// Result type alias using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failure reported by the engine module.
///
/// Cloneable so one failed initialization can be handed to every caller
/// that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "unspecified engine error".to_string()
        } else {
            message
        };
        Self { message }
    }
}

/// Errors that can occur in the runtime bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Module load or GPU/engine setup failed; a later call may retry
    #[error("Runtime initialization failed: {0}")]
    Initialization(String),

    /// Engine module not loaded yet
    #[error("Runtime not initialized")]
    NotInitialized,

    /// View id unusable for a host
    #[error("Invalid view: {0}")]
    InvalidView(String),

    /// Engine call rejected
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
