//! SQLite storage backend.
//!
//! Uses `rusqlite` for the synchronous work and `tokio-rusqlite` to run it
//! on a dedicated thread. Records are stored as JSON documents next to the
//! columns needed for listing, uniqueness and reference lookups.

mod conversions;
mod error;
mod repository;
mod schema;

pub use repository::SqliteRepository;
