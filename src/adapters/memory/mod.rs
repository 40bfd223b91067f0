//! In-memory adapter for testing.

mod store;

pub use store::InMemoryStore;
