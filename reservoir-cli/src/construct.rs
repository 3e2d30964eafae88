//! Bottom-up reservoir construction: resolves every `location` in a
//! [`Manifest`] through a [`PluginRegistry`] and assembles the owning
//! adapter tree. No tasks are spawned during construction — that happens
//! later, when the reservoir starts.

use reservoir_core::adapter::{DigesterAdapter, ExpellerAdapter, IngesterAdapter};
use reservoir_core::control::control_pair;
use reservoir_core::manifest::{DigesterConfig, ExpellerConfig, IngesterConfig, Manifest};
use reservoir_core::{ControlHandle, CoreError, CoreResult, QueueAdapter, Reservoir, ReservoirMap};
use reservoir_plugin::PluginRegistry;

fn placeholder_handle() -> ControlHandle {
    control_pair().1
}

fn instantiation_error(reservoir: &str, location: &str, source: reservoir_plugin::PluginError) -> CoreError {
    CoreError::Instantiation {
        reservoir: reservoir.to_string(),
        location: location.to_string(),
        source: Box::new(source),
    }
}

fn build_digester(cfg: &DigesterConfig, registry: &dyn PluginRegistry, reservoir: &str) -> CoreResult<DigesterAdapter> {
    let queue = registry
        .resolve_queue(&cfg.queue.location, &cfg.queue.config)
        .map_err(|err| instantiation_error(reservoir, &cfg.queue.location, err))?;
    let digester = registry
        .resolve_digester(&cfg.location, &cfg.config)
        .map_err(|err| instantiation_error(reservoir, &cfg.location, err))?;

    let queue_adapter = QueueAdapter::new(queue, placeholder_handle());
    Ok(DigesterAdapter::new(digester, queue_adapter, placeholder_handle(), placeholder_handle()))
}

fn build_ingester(cfg: &IngesterConfig, registry: &dyn PluginRegistry, reservoir: &str) -> CoreResult<IngesterAdapter> {
    let queue = registry
        .resolve_queue(&cfg.queue.location, &cfg.queue.config)
        .map_err(|err| instantiation_error(reservoir, &cfg.queue.location, err))?;
    let ingester = registry
        .resolve_ingester(&cfg.location, &cfg.config)
        .map_err(|err| instantiation_error(reservoir, &cfg.location, err))?;

    let digesters = cfg.digesters.iter().map(|d| build_digester(d, registry, reservoir)).collect::<CoreResult<Vec<_>>>()?;

    let queue_adapter = QueueAdapter::new(queue, placeholder_handle());
    Ok(IngesterAdapter::new(ingester, queue_adapter, digesters, placeholder_handle(), placeholder_handle()))
}

fn build_expeller(cfg: &ExpellerConfig, registry: &dyn PluginRegistry, reservoir: &str) -> CoreResult<ExpellerAdapter> {
    let expeller = registry
        .resolve_expeller(&cfg.location, &cfg.config)
        .map_err(|err| instantiation_error(reservoir, &cfg.location, err))?;

    let ingesters = cfg.ingesters.iter().map(|i| build_ingester(i, registry, reservoir)).collect::<CoreResult<Vec<_>>>()?;

    Ok(ExpellerAdapter::new(expeller, ingesters, placeholder_handle(), placeholder_handle()))
}

/// Instantiates every reservoir named in `manifest` against `registry`
/// and returns them assembled into a fresh [`ReservoirMap`]. Aborts on
/// the first instantiation failure, naming the failing component's
/// location.
pub async fn build_reservoir_map(manifest: &Manifest, registry: &dyn PluginRegistry) -> CoreResult<ReservoirMap> {
    let map = ReservoirMap::new();
    for reservoir_cfg in &manifest.reservoirs {
        let expeller_adapter = build_expeller(&reservoir_cfg.expeller, registry, &reservoir_cfg.name)?;
        map.insert(Reservoir::new(reservoir_cfg.name.clone(), expeller_adapter)).await;
    }
    Ok(map)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use reservoir_plugin::mem::InMemoryPluginRegistry;

    fn manifest_with_one_reservoir() -> Manifest {
        let json = r#"{
            "reservoirs": [
                { "name": "r1",
                  "expeller": {
                    "location": "mem:stdout", "config": "",
                    "ingesters": [
                      { "location": "mem:stdin", "config": "",
                        "queue": { "location": "mem:channel", "config": "" },
                        "digesters": []
                      }
                    ]
                  }
                }
            ]
        }"#;
        Manifest::from_json(json).expect("valid manifest")
    }

    #[tokio::test]
    async fn builds_one_reservoir_per_manifest_entry() {
        let manifest = manifest_with_one_reservoir();
        let registry = InMemoryPluginRegistry::with_reference_plugins();
        let map = build_reservoir_map(&manifest, &registry).await.expect("construction succeeds");
        assert_eq!(map.reservoir_count().await, 1);
        assert_eq!(map.get_flow("r1").await.unwrap(), vec!["stdin", "channel", "stdout"]);
    }

    #[tokio::test]
    async fn unknown_plugin_location_fails_construction() {
        let json = r#"{
            "reservoirs": [
                { "name": "r1",
                  "expeller": {
                    "location": "mem:does-not-exist", "config": "",
                    "ingesters": []
                  }
                }
            ]
        }"#;
        let manifest = Manifest::from_json(json).expect("valid manifest");
        let registry = InMemoryPluginRegistry::with_reference_plugins();
        let err = build_reservoir_map(&manifest, &registry).await.unwrap_err();
        assert!(matches!(err, CoreError::Instantiation { reservoir, .. } if reservoir == "r1"));
    }
}
