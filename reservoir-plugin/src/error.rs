use thiserror::Error;

/// Failures resolving a manifest `location` string into a live plugin
/// object. Always fatal during reservoir construction: the caller wraps
/// these into [`reservoir_core::CoreError::Instantiation`].
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("location '{0}' is missing the required 'lib:' or 'mem:' scheme prefix")]
    BadLocation(String),

    #[error("no plugin registered under '{0}'")]
    UnknownLocation(String),

    #[error("failed to load dynamic library '{path}': {source}")]
    LibraryLoad {
        path: String,
        #[source]
        source: libloading::Error,
    },

    #[error("symbol '{symbol}' not found in '{path}': {source}")]
    SymbolLookup {
        path: String,
        symbol: String,
        #[source]
        source: libloading::Error,
    },

    #[error("factory at '{0}' returned a null object")]
    FactoryFailed(String),
}

pub type PluginResult<T> = Result<T, PluginError>;
