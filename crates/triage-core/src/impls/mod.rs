//! In-memory adapters for the ports.
//!
//! These back the test suites and the demo binary. Production deployments
//! swap in real adapters behind the same ports.

pub mod feed;
pub mod intent;
pub mod memory;
pub mod record;
pub mod static_catalog;

pub use feed::InMemoryFeed;
pub use intent::HeuristicIntentModel;
pub use memory::InMemoryStore;
pub use record::InMemoryRecord;
pub use static_catalog::StaticCatalog;
