//! The CLI's error taxonomy. Every variant here is fatal — by the time an
//! error reaches `main`, the only thing left to do is log it and pick an
//! exit code (`0` normal, `1` everything else).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read manifest '{path}': {source}")]
    ManifestRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest '{path}': {source}")]
    ManifestParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] reservoir_core::CoreError),

    #[error("failed to bind HTTP listener on {address}: {source}")]
    Listen {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

pub type CliResult<T> = Result<T, CliError>;
