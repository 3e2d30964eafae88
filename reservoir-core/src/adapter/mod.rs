//! Role-specialized adapters around plugin stage objects.
//!
//! Mirrors [`crate::queue::QueueAdapter`] one level up: each adapter owns a
//! plugin stage plus everything the reservoir needs to schedule and tear
//! it down, but (per the REDESIGN FLAGS) holds it as a concrete trait
//! object rather than doing structural type assertions at call sites.

mod digester;
mod expeller;
mod ingester;

pub use digester::DigesterAdapter;
pub use expeller::ExpellerAdapter;
pub use ingester::IngesterAdapter;
