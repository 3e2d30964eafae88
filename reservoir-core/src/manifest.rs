//! JSON manifest schema: the declarative description of every reservoir's
//! topology, resolved against a [`crate::plugin::PluginRegistry`] (the
//! trait lives in `reservoir-plugin`; this crate only knows the shape of
//! the config).
//!
//! Unknown keys are rejected (`deny_unknown_fields`) so a typo in a
//! manifest fails fast at startup rather than silently loading defaults.

use serde::{Deserialize, Serialize};

/// Top-level manifest: a list of independent reservoir topologies. An empty
/// list is legal and yields a server with no reservoirs.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub reservoirs: Vec<ReservoirConfig>,
}

/// One named topology: an expeller and everything beneath it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReservoirConfig {
    pub name: String,
    pub expeller: ExpellerConfig,
}

/// A queue's plugin location and opaque config path. `location` is resolved
/// through the active plugin registry: `lib:<path>` for a dynamic library,
/// `mem:<name>` for an in-process reference plugin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    pub location: String,
    pub config: String,
}

/// One digester and the queue it writes to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DigesterConfig {
    pub location: String,
    pub config: String,
    pub queue: QueueConfig,
}

/// One ingester, the queue it writes to, and its downstream digester chain
/// (possibly empty).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngesterConfig {
    pub location: String,
    pub config: String,
    pub queue: QueueConfig,
    #[serde(default)]
    pub digesters: Vec<DigesterConfig>,
}

/// The expeller and every ingester chain feeding it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExpellerConfig {
    pub location: String,
    pub config: String,
    pub ingesters: Vec<IngesterConfig>,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_topology() {
        let json = r#"{
            "reservoirs": [
                { "name": "r1",
                  "expeller": {
                    "location": "mem:stdout", "config": "",
                    "ingesters": [
                      { "location": "mem:stdin", "config": "",
                        "queue": { "location": "mem:channel", "config": "cap=16" },
                        "digesters": [
                          { "location": "mem:echo", "config": "",
                            "queue": { "location": "mem:channel", "config": "cap=16" } }
                        ]
                      }
                    ]
                  }
                }
            ]
        }"#;

        let manifest = Manifest::from_json(json).expect("valid manifest");
        assert_eq!(manifest.reservoirs.len(), 1);
        let r1 = &manifest.reservoirs[0];
        assert_eq!(r1.name, "r1");
        assert_eq!(r1.expeller.ingesters.len(), 1);
        assert_eq!(r1.expeller.ingesters[0].digesters.len(), 1);
    }

    #[test]
    fn rejects_unknown_fields() {
        let json = r#"{ "reservoirs": [], "bogus": true }"#;
        assert!(Manifest::from_json(json).is_err());
    }

    #[test]
    fn empty_reservoir_list_is_legal() {
        let json = r#"{ "reservoirs": [] }"#;
        let manifest = Manifest::from_json(json).expect("valid manifest");
        assert!(manifest.reservoirs.is_empty());
    }
}
