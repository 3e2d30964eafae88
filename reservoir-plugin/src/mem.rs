//! A name -> constructor-closure registry: the `mem:` scheme. Used by
//! every test in the workspace and by the CLI for the bundled reference
//! plugins, with no filesystem or dynamic-library involvement.

use std::collections::HashMap;
use std::sync::Arc;

use reservoir_core::{Digester, Expeller, Ingester, Queue};

use crate::error::{PluginError, PluginResult};
use crate::registry::{strip_scheme, PluginRegistry};

type QueueFactory = Box<dyn Fn(&str) -> PluginResult<Arc<dyn Queue>> + Send + Sync>;
type IngesterFactory = Box<dyn Fn(&str) -> PluginResult<Box<dyn Ingester>> + Send + Sync>;
type DigesterFactory = Box<dyn Fn(&str) -> PluginResult<Box<dyn Digester>> + Send + Sync>;
type ExpellerFactory = Box<dyn Fn(&str) -> PluginResult<Box<dyn Expeller>> + Send + Sync>;

/// An in-process registry: `location` is `mem:<name>`, resolved by direct
/// lookup into whichever factory map was registered under `<name>`. No
/// unchecked downcasting anywhere — each factory already returns the
/// correctly-typed trait object.
#[derive(Default)]
pub struct InMemoryPluginRegistry {
    queues: HashMap<String, QueueFactory>,
    ingesters: HashMap<String, IngesterFactory>,
    digesters: HashMap<String, DigesterFactory>,
    expellers: HashMap<String, ExpellerFactory>,
}

impl InMemoryPluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_queue(&mut self, name: impl Into<String>, factory: impl Fn(&str) -> PluginResult<Arc<dyn Queue>> + Send + Sync + 'static) {
        self.queues.insert(name.into(), Box::new(factory));
    }

    pub fn register_ingester(&mut self, name: impl Into<String>, factory: impl Fn(&str) -> PluginResult<Box<dyn Ingester>> + Send + Sync + 'static) {
        self.ingesters.insert(name.into(), Box::new(factory));
    }

    pub fn register_digester(&mut self, name: impl Into<String>, factory: impl Fn(&str) -> PluginResult<Box<dyn Digester>> + Send + Sync + 'static) {
        self.digesters.insert(name.into(), Box::new(factory));
    }

    pub fn register_expeller(&mut self, name: impl Into<String>, factory: impl Fn(&str) -> PluginResult<Box<dyn Expeller>> + Send + Sync + 'static) {
        self.expellers.insert(name.into(), Box::new(factory));
    }

    /// An `InMemoryPluginRegistry` pre-populated with the reference
    /// plugins: a line-oriented stdin ingester (`mem:stdin`), an identity
    /// digester (`mem:echo`), a stdout expeller that also records into an
    /// in-memory list (`mem:stdout`), and a bounded channel queue
    /// (`mem:channel`).
    pub fn with_reference_plugins() -> Self {
        let mut registry = Self::new();

        registry.register_queue("channel", |config| Ok(crate::reference::channel_queue::ChannelQueue::from_config("channel", config)));

        registry.register_ingester("stdin", |_config| {
            let ingester: Box<dyn Ingester> = Box::new(crate::reference::stdin_ingester::StdinIngester::new());
            Ok(ingester)
        });

        registry.register_digester("echo", |_config| {
            let digester: Box<dyn Digester> = Box::new(crate::reference::echo_digester::EchoDigester);
            Ok(digester)
        });

        registry.register_expeller("stdout", |_config| {
            let expeller: Box<dyn Expeller> = Box::new(crate::reference::stdout_expeller::StdoutExpeller::new());
            Ok(expeller)
        });

        registry
    }
}

impl PluginRegistry for InMemoryPluginRegistry {
    fn resolve_queue(&self, location: &str, config: &str) -> PluginResult<Arc<dyn Queue>> {
        let name = strip_scheme(location, "mem:")?;
        let factory = self.queues.get(name).ok_or_else(|| PluginError::UnknownLocation(location.to_string()))?;
        factory(config)
    }

    fn resolve_ingester(&self, location: &str, config: &str) -> PluginResult<Box<dyn Ingester>> {
        let name = strip_scheme(location, "mem:")?;
        let factory = self.ingesters.get(name).ok_or_else(|| PluginError::UnknownLocation(location.to_string()))?;
        factory(config)
    }

    fn resolve_digester(&self, location: &str, config: &str) -> PluginResult<Box<dyn Digester>> {
        let name = strip_scheme(location, "mem:")?;
        let factory = self.digesters.get(name).ok_or_else(|| PluginError::UnknownLocation(location.to_string()))?;
        factory(config)
    }

    fn resolve_expeller(&self, location: &str, config: &str) -> PluginResult<Box<dyn Expeller>> {
        let name = strip_scheme(location, "mem:")?;
        let factory = self.expellers.get(name).ok_or_else(|| PluginError::UnknownLocation(location.to_string()))?;
        factory(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn reference_plugins_resolve_by_name() {
        let registry = InMemoryPluginRegistry::with_reference_plugins();
        assert!(registry.resolve_queue("mem:channel", "").is_ok());
        assert!(registry.resolve_ingester("mem:stdin", "").is_ok());
        assert!(registry.resolve_digester("mem:echo", "").is_ok());
        assert!(registry.resolve_expeller("mem:stdout", "").is_ok());
    }

    #[test]
    fn unknown_name_is_reported() {
        let registry = InMemoryPluginRegistry::new();
        let err = registry.resolve_queue("mem:nope", "").unwrap_err();
        assert!(matches!(err, PluginError::UnknownLocation(loc) if loc == "mem:nope"));
    }

    #[test]
    fn missing_scheme_is_rejected() {
        let registry = InMemoryPluginRegistry::new();
        let err = registry.resolve_queue("channel", "").unwrap_err();
        assert!(matches!(err, PluginError::BadLocation(_)));
    }
}
