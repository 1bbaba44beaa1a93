//! CAS authentication for doctrips.
//!
//! This crate provides:
//! - The CAS login/callback flow against a real server, or a mock login page (`mock` feature)
//! - Session storage (in-memory, or SQLite via the `sqlite` feature)
//! - Axum extractors for authentication

mod config;
mod error;
mod extractors;
mod handlers;
#[cfg(feature = "mock")]
mod mock_cas;
mod providers;
mod sessions;
mod state;

pub use config::AuthConfig;
pub use error::AuthError;
pub use extractors::{CurrentUser, OptionalUser};
pub use handlers::auth_routes;
pub use providers::CasServer;
#[cfg(feature = "mock")]
pub use providers::MockCas;
pub use sessions::InMemorySessionStore;
#[cfg(feature = "sqlite")]
pub use sessions::SqliteSessionStore;
pub use state::AuthState;
