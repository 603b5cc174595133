//! Infrastructure layer: identity store adapters (Postgres, in-memory).

pub mod identity;

pub use identity::{InMemoryIdentityStore, PostgresIdentityStore};
