//! Error types for the reservoir runtime.
//!
//! Every fallible operation in this crate returns one of the variants below.
//! Construction failures are fatal (the caller aborts and surfaces the error
//! to the CLI); lifecycle failures are recoverable state errors that the
//! admin layer translates into HTTP status codes.

use std::error::Error;

use thiserror::Error;

/// Errors produced while assembling or operating a single reservoir.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A plugin component (queue, ingester, digester, or expeller) failed to
    /// instantiate during reservoir construction.
    #[error("failed to instantiate component '{location}' for reservoir '{reservoir}': {source}")]
    Instantiation {
        reservoir: String,
        location: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    /// A lifecycle operation was attempted from a state that forbids it.
    #[error(transparent)]
    State(#[from] StateError),

    /// A per-name operation referenced a reservoir that doesn't exist.
    #[error("reservoir '{0}' not found")]
    NotFound(String),

    /// Reservoir or admin response failed to serialize to JSON.
    #[error("failed to serialize response: {0}")]
    Serialization(#[source] serde_json::Error),
}

/// Recoverable state-machine violations.
///
/// These surface to HTTP clients as 4xx responses carrying the reservoir
/// name and a human-readable reason; they never panic and never poison the
/// reservoir's state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("reservoir '{0}' is disposed")]
    Disposed(String),

    #[error("reservoir '{0}' is already started")]
    AlreadyStarted(String),

    #[error("reservoir '{0}' is already stopped")]
    AlreadyStopped(String),

    #[error("reservoir '{0}' is not disposed")]
    NotDisposed(String),

    #[error("reservoir '{0}' is running")]
    Running(String),
}

impl StateError {
    /// Reservoir name this error is about.
    pub fn reservoir_name(&self) -> &str {
        match self {
            StateError::Disposed(n)
            | StateError::AlreadyStarted(n)
            | StateError::AlreadyStopped(n)
            | StateError::NotDisposed(n)
            | StateError::Running(n) => n,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
