pub mod crypto;
pub mod events;
pub mod store;

// Convenience re-exports
pub use crypto::{chain_root, content_hash};
pub use events::{AuditAction, AuditEvent};
pub use store::{EventStore, EventStoreError, EventStoreResult, InMemoryEventStore, NdjsonEventStore};
