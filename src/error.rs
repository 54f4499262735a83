//! Error types for the registry
//!
//! Startup failures (connection, deferred setup) are fatal and propagate to
//! the caller; shutdown never surfaces an error for already-terminal states.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The transport reported a failure before the connection was confirmed live.
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    /// A server heartbeat failed during connection establishment.
    /// The full event context is carried for diagnosability.
    #[error("Server heartbeat failed: {context}")]
    HeartbeatFailed { context: String },

    /// The connect race was won by the timeout signal.
    #[error("Connection timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// A deferred setup action rejected while the batch was running.
    #[error("Deferred setup failed: {message}")]
    SetupFailed { message: String },

    /// A resource was requested before the root connection was established,
    /// or after the registry reached a state that no longer accepts it.
    #[error("Registry is not ready: {message}")]
    NotReady { message: String },

    /// A second root registration was attempted for this registry.
    #[error("A root connection is already registered")]
    AlreadyConnected,

    /// Lookup for a token that no registration ever produced.
    #[error("No resource registered under token {token}")]
    NotRegistered { token: String },

    /// The connection options could not be parsed by the driver.
    #[error("Invalid connection options: {message}")]
    InvalidOptions { message: String },
}

impl Error {
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    pub fn heartbeat_failed(context: impl Into<String>) -> Self {
        Self::HeartbeatFailed {
            context: context.into(),
        }
    }

    pub fn setup_failed(message: impl Into<String>) -> Self {
        Self::SetupFailed {
            message: message.into(),
        }
    }

    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::NotReady {
            message: message.into(),
        }
    }

    pub fn not_registered(token: impl ToString) -> Self {
        Self::NotRegistered {
            token: token.to_string(),
        }
    }

    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }
}
