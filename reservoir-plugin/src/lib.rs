//! Plugin resolution for reservoird.
//!
//! Defines the [`PluginRegistry`] trait boundary the runtime core uses to
//! turn a manifest's `location` strings into live `Queue`/`Ingester`/
//! `Digester`/`Expeller` objects, plus three implementations: a
//! [`mem::InMemoryPluginRegistry`] of in-process constructors, a
//! [`dylib::DylibPluginRegistry`] that opens shared objects via
//! `libloading`, and a [`CompositeRegistry`] that dispatches between the
//! two by scheme prefix. The bundled [`reference`] plugins are registered
//! under `mem:` locations by [`mem::InMemoryPluginRegistry::with_reference_plugins`].

pub mod dylib;
pub mod error;
pub mod mem;
pub mod reference;
pub mod registry;

pub use error::{PluginError, PluginResult};
pub use registry::PluginRegistry;

use std::sync::Arc;

use reservoir_core::{Digester, Expeller, Ingester, Queue};

/// Dispatches `mem:` locations to an [`mem::InMemoryPluginRegistry`] and
/// `lib:` locations to a [`dylib::DylibPluginRegistry`]. This is the
/// registry the CLI wires up by default: the bundled reference plugins
/// stay available for manifests that use them, alongside whatever real
/// shared objects the deployment names.
pub struct CompositeRegistry {
    mem: mem::InMemoryPluginRegistry,
    dylib: dylib::DylibPluginRegistry,
}

impl CompositeRegistry {
    pub fn new(mem: mem::InMemoryPluginRegistry, dylib: dylib::DylibPluginRegistry) -> Self {
        Self { mem, dylib }
    }

    /// A composite registry wired with the bundled reference plugins and
    /// an empty (but ready) dynamic-library loader.
    pub fn with_reference_plugins() -> Self {
        Self::new(mem::InMemoryPluginRegistry::with_reference_plugins(), dylib::DylibPluginRegistry::new())
    }

    fn scheme(location: &str) -> PluginResult<&'static str> {
        if location.starts_with("mem:") {
            Ok("mem")
        } else if location.starts_with("lib:") {
            Ok("lib")
        } else {
            Err(PluginError::BadLocation(location.to_string()))
        }
    }
}

impl PluginRegistry for CompositeRegistry {
    fn resolve_queue(&self, location: &str, config: &str) -> PluginResult<Arc<dyn Queue>> {
        match Self::scheme(location)? {
            "mem" => self.mem.resolve_queue(location, config),
            _ => self.dylib.resolve_queue(location, config),
        }
    }

    fn resolve_ingester(&self, location: &str, config: &str) -> PluginResult<Box<dyn Ingester>> {
        match Self::scheme(location)? {
            "mem" => self.mem.resolve_ingester(location, config),
            _ => self.dylib.resolve_ingester(location, config),
        }
    }

    fn resolve_digester(&self, location: &str, config: &str) -> PluginResult<Box<dyn Digester>> {
        match Self::scheme(location)? {
            "mem" => self.mem.resolve_digester(location, config),
            _ => self.dylib.resolve_digester(location, config),
        }
    }

    fn resolve_expeller(&self, location: &str, config: &str) -> PluginResult<Box<dyn Expeller>> {
        match Self::scheme(location)? {
            "mem" => self.mem.resolve_expeller(location, config),
            _ => self.dylib.resolve_expeller(location, config),
        }
    }
}
