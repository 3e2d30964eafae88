//! The HTTP admin surface for reservoird: `axum` handlers over a
//! [`reservoir_core::ReservoirMap`], plus the background stats poller
//! that keeps every component's cached snapshot fresh for those
//! handlers to read.

pub mod error;
pub mod poller;
pub mod router;
pub mod state;

pub use error::AdminError;
pub use router::build_router;
pub use state::AdminState;
