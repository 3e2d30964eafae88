//! Dynamic-library-backed plugin registry.
//!
//! Mirrors the registrar-extension pattern a Rust plugin loader typically
//! uses: each shared object exports a single `register_reservoir_plugins`
//! symbol that receives a `&mut dyn PluginRegistrar` and populates it with
//! named factories, rather than handing back raw pointers to trait
//! objects across the FFI boundary directly. This module is the one place
//! in the workspace where an unchecked cast (the `libloading` symbol
//! lookup) happens; every resolver above it only ever sees already-typed
//! trait objects.
//!
//! Illustrative ABI — no test in this workspace links a real shared
//! object, since doing so would require a compiled `.so`/`.dylib`
//! fixture on disk.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use libloading::{Library, Symbol};
use parking_lot::Mutex;
use reservoir_core::{Digester, Expeller, Ingester, Queue};

use crate::error::{PluginError, PluginResult};
use crate::registry::{strip_scheme, PluginRegistry};

type QueueFactory = Box<dyn Fn(&str) -> PluginResult<Arc<dyn Queue>> + Send + Sync>;
type IngesterFactory = Box<dyn Fn(&str) -> PluginResult<Box<dyn Ingester>> + Send + Sync>;
type DigesterFactory = Box<dyn Fn(&str) -> PluginResult<Box<dyn Digester>> + Send + Sync>;
type ExpellerFactory = Box<dyn Fn(&str) -> PluginResult<Box<dyn Expeller>> + Send + Sync>;

/// Receives factory registrations from a loaded plugin library. A plugin
/// author implements `register_reservoir_plugins` and calls back into
/// whatever concrete type the host passes as `&mut dyn PluginRegistrar`.
pub trait PluginRegistrar {
    fn register_queue(&mut self, name: &str, factory: QueueFactory);
    fn register_ingester(&mut self, name: &str, factory: IngesterFactory);
    fn register_digester(&mut self, name: &str, factory: DigesterFactory);
    fn register_expeller(&mut self, name: &str, factory: ExpellerFactory);
}

/// The symbol every plugin shared object must export.
pub type RegisterFn = unsafe extern "C" fn(&mut dyn PluginRegistrar);

#[derive(Default)]
struct Factories {
    queues: HashMap<String, QueueFactory>,
    ingesters: HashMap<String, IngesterFactory>,
    digesters: HashMap<String, DigesterFactory>,
    expellers: HashMap<String, ExpellerFactory>,
}

impl PluginRegistrar for Factories {
    fn register_queue(&mut self, name: &str, factory: QueueFactory) {
        self.queues.insert(name.to_string(), factory);
    }

    fn register_ingester(&mut self, name: &str, factory: IngesterFactory) {
        self.ingesters.insert(name.to_string(), factory);
    }

    fn register_digester(&mut self, name: &str, factory: DigesterFactory) {
        self.digesters.insert(name.to_string(), factory);
    }

    fn register_expeller(&mut self, name: &str, factory: ExpellerFactory) {
        self.expellers.insert(name.to_string(), factory);
    }
}

/// Opens shared objects named by `lib:<path>` or `lib:<path>#<name>`
/// locations (`name` defaults to `"default"`, letting one shared object
/// export several named factories of the same kind). Loaded libraries are
/// cached for the process lifetime so their factories' code stays mapped
/// for as long as anything they constructed might still be running.
pub struct DylibPluginRegistry {
    loaded: Mutex<HashMap<String, Arc<Library>>>,
    factories: Mutex<Factories>,
}

impl Default for DylibPluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DylibPluginRegistry {
    pub fn new() -> Self {
        Self {
            loaded: Mutex::new(HashMap::new()),
            factories: Mutex::new(Factories::default()),
        }
    }

    fn parse_location<'a>(location: &'a str) -> PluginResult<(&'a str, &'a str)> {
        let rest = strip_scheme(location, "lib:")?;
        Ok(rest.split_once('#').unwrap_or((rest, "default")))
    }

    fn ensure_loaded(&self, path: &str) -> PluginResult<()> {
        let mut loaded = self.loaded.lock();
        if loaded.contains_key(path) {
            return Ok(());
        }

        tracing::info!(path, "dylib registry: loading plugin library");
        let lib = unsafe { Library::new(Path::new(path)) }.map_err(|source| PluginError::LibraryLoad {
            path: path.to_string(),
            source,
        })?;

        let symbol = b"register_reservoir_plugins";
        let register: Symbol<RegisterFn> = unsafe { lib.get(symbol) }.map_err(|source| PluginError::SymbolLookup {
            path: path.to_string(),
            symbol: String::from_utf8_lossy(symbol).into_owned(),
            source,
        })?;

        {
            let mut factories = self.factories.lock();
            unsafe { register(&mut *factories) };
        }

        loaded.insert(path.to_string(), Arc::new(lib));
        Ok(())
    }
}

impl PluginRegistry for DylibPluginRegistry {
    fn resolve_queue(&self, location: &str, config: &str) -> PluginResult<Arc<dyn Queue>> {
        let (path, name) = Self::parse_location(location)?;
        self.ensure_loaded(path)?;
        let factories = self.factories.lock();
        let factory = factories.queues.get(name).ok_or_else(|| PluginError::FactoryFailed(location.to_string()))?;
        factory(config)
    }

    fn resolve_ingester(&self, location: &str, config: &str) -> PluginResult<Box<dyn Ingester>> {
        let (path, name) = Self::parse_location(location)?;
        self.ensure_loaded(path)?;
        let factories = self.factories.lock();
        let factory = factories.ingesters.get(name).ok_or_else(|| PluginError::FactoryFailed(location.to_string()))?;
        factory(config)
    }

    fn resolve_digester(&self, location: &str, config: &str) -> PluginResult<Box<dyn Digester>> {
        let (path, name) = Self::parse_location(location)?;
        self.ensure_loaded(path)?;
        let factories = self.factories.lock();
        let factory = factories.digesters.get(name).ok_or_else(|| PluginError::FactoryFailed(location.to_string()))?;
        factory(config)
    }

    fn resolve_expeller(&self, location: &str, config: &str) -> PluginResult<Box<dyn Expeller>> {
        let (path, name) = Self::parse_location(location)?;
        self.ensure_loaded(path)?;
        let factories = self.factories.lock();
        let factory = factories.expellers.get(name).ok_or_else(|| PluginError::FactoryFailed(location.to_string()))?;
        factory(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_path_with_default_name() {
        let (path, name) = DylibPluginRegistry::parse_location("lib:/opt/plugins/stages.so").unwrap();
        assert_eq!(path, "/opt/plugins/stages.so");
        assert_eq!(name, "default");
    }

    #[test]
    fn parses_named_factory() {
        let (path, name) = DylibPluginRegistry::parse_location("lib:/opt/plugins/stages.so#fanout").unwrap();
        assert_eq!(path, "/opt/plugins/stages.so");
        assert_eq!(name, "fanout");
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(DylibPluginRegistry::parse_location("/opt/plugins/stages.so").is_err());
    }

    #[test]
    fn unresolved_library_reports_unknown_location() {
        let registry = DylibPluginRegistry::new();
        let err = registry.resolve_queue("lib:/nonexistent/path/to/lib.so", "").unwrap_err();
        assert!(matches!(err, PluginError::LibraryLoad { .. }));
    }
}
