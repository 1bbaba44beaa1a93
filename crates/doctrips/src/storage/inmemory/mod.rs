//! In-memory storage backend.
//!
//! Stores years, users, the timetable and every record in maps behind a
//! single `Arc<RwLock<_>>`. Data is lost when the process exits, which makes
//! this backend the default for development and the one used by tests.

mod repository;

pub use repository::InMemoryRepository;
