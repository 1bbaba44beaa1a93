//! Storage backend implementations.
//!
//! Concrete implementations of the repository traits defined in
//! `doctrips_core::storage`, selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): everything lives in process memory
//! - `sqlite`: SQLite storage using `rusqlite` and `tokio-rusqlite`
//!
//! Build with SQLite:
//! ```bash
//! cargo build -p doctrips --no-default-features --features sqlite
//! ```

#[cfg(any(feature = "inmemory", test))]
pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "inmemory", test))]
pub use inmemory::InMemoryRepository;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepository;
