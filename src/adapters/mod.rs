//! Adapters layer.
//!
//! Concrete implementations of the port traits. Postgres is the
//! production storage; the in-memory store backs tests.

pub mod memory;
pub mod postgres;
