//! Adapters for the `IdentityStore` port.
//!
//! Both adapters are read-mostly from the access-control layer's point of
//! view; the in-memory one also exposes mutators so tests and local runs can
//! seed accounts.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryIdentityStore;
pub use postgres::PostgresIdentityStore;
