//! Bundled reference plugins, supplementing the core with small
//! in-process fixtures for manual testing and demos: a line-oriented
//! stdin ingester, an identity digester, a stdout expeller that doubles
//! as an in-memory recorder, and a bounded in-memory channel queue.
//! Registered under `mem:` locations by
//! [`crate::mem::InMemoryPluginRegistry::with_reference_plugins`].

pub mod channel_queue;
pub mod echo_digester;
pub mod stdin_ingester;
pub mod stdout_expeller;
