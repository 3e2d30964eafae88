//! Shared application state handed to every axum handler.

use reservoir_core::ReservoirMap;

/// The registry, cloned cheaply into every handler (it's `Arc`-backed
/// internally) via axum's `State` extractor.
#[derive(Clone)]
pub struct AdminState {
    pub reservoirs: ReservoirMap,
}

impl AdminState {
    pub fn new(reservoirs: ReservoirMap) -> Self {
        Self { reservoirs }
    }
}
