//! The capability-resolution boundary between the runtime core and
//! concrete stage/queue implementations.
//!
//! Neither implementation in this crate does any `Any`-based downcasting:
//! a registry either knows how to build the named concrete type and hands
//! back an already-typed trait object, or it returns
//! [`crate::error::PluginError::UnknownLocation`].

use std::sync::Arc;

use reservoir_core::{Digester, Expeller, Ingester, Queue};

use crate::error::PluginResult;

/// Resolves manifest `location` strings into live plugin objects.
///
/// `location` carries a scheme prefix identifying which registry
/// implementation should handle it (`lib:` for [`crate::dylib::DylibPluginRegistry`],
/// `mem:` for [`crate::mem::InMemoryPluginRegistry`]); `config` is the
/// opaque per-instance config string from the manifest, passed through
/// unparsed.
pub trait PluginRegistry: Send + Sync {
    fn resolve_queue(&self, location: &str, config: &str) -> PluginResult<Arc<dyn Queue>>;
    fn resolve_ingester(&self, location: &str, config: &str) -> PluginResult<Box<dyn Ingester>>;
    fn resolve_digester(&self, location: &str, config: &str) -> PluginResult<Box<dyn Digester>>;
    fn resolve_expeller(&self, location: &str, config: &str) -> PluginResult<Box<dyn Expeller>>;
}

/// Splits `"<scheme>:<rest>"` into its two halves, failing if `location`
/// doesn't carry the expected scheme prefix.
pub(crate) fn strip_scheme<'a>(location: &'a str, scheme: &str) -> PluginResult<&'a str> {
    location
        .strip_prefix(scheme)
        .ok_or_else(|| crate::error::PluginError::BadLocation(location.to_string()))
}
