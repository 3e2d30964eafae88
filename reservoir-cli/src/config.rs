//! Layered configuration: CLI flags over environment variables over
//! defaults, assembled once at startup into an immutable [`AppConfig`].

use std::path::PathBuf;

use crate::error::{CliError, CliResult};

const DEFAULT_ADDRESS: &str = ":5514";
const DEFAULT_STATS_INTERVAL_MS: u64 = 1000;

/// The process-wide configuration, fixed for the lifetime of one `run`
/// invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub manifest_path: PathBuf,
    pub address: String,
    pub debug: bool,
    pub stats_interval_ms: u64,
}

impl AppConfig {
    /// Merges CLI-provided overrides with `RESERVOIRD_*` environment
    /// variables and hardcoded defaults, CLI winning ties.
    pub fn assemble(manifest_path: PathBuf, cli_address: Option<String>, cli_debug: bool) -> CliResult<Self> {
        let address = cli_address
            .or_else(|| std::env::var("RESERVOIRD_ADDRESS").ok())
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        let debug = cli_debug
            || std::env::var("RESERVOIRD_DEBUG")
                .ok()
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false);

        let stats_interval_ms = match std::env::var("RESERVOIRD_STATS_INTERVAL_MS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| CliError::Config(format!("RESERVOIRD_STATS_INTERVAL_MS must be an integer, got '{raw}'")))?,
            Err(_) => DEFAULT_STATS_INTERVAL_MS,
        };

        Ok(Self {
            manifest_path,
            address,
            debug,
            stats_interval_ms,
        })
    }

    /// `address` accepts the bare `:<port>` shorthand for "bind every
    /// interface"; normalize it to a `std::net::SocketAddr`-parseable
    /// form.
    pub fn socket_addr(&self) -> CliResult<std::net::SocketAddr> {
        let normalized = if let Some(port) = self.address.strip_prefix(':') {
            format!("0.0.0.0:{port}")
        } else {
            self.address.clone()
        };
        normalized
            .parse()
            .map_err(|_| CliError::Config(format!("invalid --address '{}': expected host:port", self.address)))
    }
}
