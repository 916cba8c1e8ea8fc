//! Ports - the seams to everything external.
//!
//! Each trait hides one collaborator: the LLM provider, the system of
//! record, the reference catalog, the session feed, replay endpoints, and
//! persistence. Production adapters and the in-memory development
//! implementations in `impls/` are interchangeable behind these.

pub mod catalog;
pub mod clock;
pub mod cursor;
pub mod id_generator;
pub mod intent_model;
pub mod replay_target;
pub mod result_store;
pub mod session_feed;
pub mod system_of_record;

pub use self::catalog::{CatalogEntry, CatalogKind, ReferenceCatalog};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::cursor::CursorStore;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::intent_model::{ClassifyError, IntentModel};
pub use self::replay_target::{ReplayTarget, TargetError, TargetResponse};
pub use self::result_store::{ClassificationFilter, ResultFilter, ResultStore};
pub use self::session_feed::{FeedError, FeedPage, SessionFeed, Watermark};
pub use self::system_of_record::{LookupError, RecordQuery, SystemOfRecord};
