//! Application state with repository-based storage.
//!
//! The shared state passed to all request handlers. Storage is reached
//! through repository trait objects and the backend is chosen by feature
//! flag.

use std::sync::Arc;
use std::time::Duration;

use doctrips_auth::{AuthConfig, AuthState};
use doctrips_core::permissions::User;
use doctrips_core::record::Record;
use doctrips_core::storage::{
    RecordStore, RepositoryError, Table, TimetableRepository, TripsYearRepository, UserRepository,
};
use doctrips_core::years::TripsYear;

use crate::config::Config;
use crate::services::{DartmouthDirectory, DirectionsClient, Directory, MapsApi};

// ============================================================================
// Compile-time feature validation
// ============================================================================

#[cfg(all(feature = "sqlite", feature = "inmemory"))]
compile_error!(
    "Features 'sqlite' and 'inmemory' are mutually exclusive. \
    Example: cargo build -p doctrips --no-default-features --features sqlite"
);

#[cfg(not(any(feature = "inmemory", feature = "sqlite")))]
compile_error!("Must enable exactly one storage feature: 'inmemory' or 'sqlite'");

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub years: Arc<dyn TripsYearRepository>,
    pub users: Arc<dyn UserRepository>,
    pub timetable: Arc<dyn TimetableRepository>,
    pub records: Arc<dyn RecordStore>,
    pub auth: AuthState,
    pub directory: Arc<dyn Directory>,
    pub maps: Arc<dyn DirectionsClient>,
    pub request_timeout: Duration,
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}

impl AppState {
    /// Creates a new AppState from one repository implementing every trait.
    fn build<R>(
        repo: Arc<R>,
        auth: AuthState,
        directory: Arc<dyn Directory>,
        maps: Arc<dyn DirectionsClient>,
        request_timeout: Duration,
    ) -> Self
    where
        R: TripsYearRepository + UserRepository + TimetableRepository + RecordStore + 'static,
    {
        Self {
            years: repo.clone(),
            users: repo.clone(),
            timetable: repo.clone(),
            records: repo,
            auth,
            directory,
            maps,
            request_timeout,
        }
    }

    fn services(config: &Config) -> (Arc<dyn Directory>, Arc<dyn DirectionsClient>) {
        let directory = Arc::new(DartmouthDirectory::new(
            config.dartdm_url.clone(),
            config.dndprofiles_url.clone(),
        ));
        let maps = Arc::new(MapsApi::new(
            config.maps_api_url.clone(),
            config.maps_api_key.clone(),
            config.maps_timeout(),
        ));
        (directory, maps)
    }

    /// Typed access to the records of one kind.
    pub fn table<T: Record>(&self) -> Table<T> {
        Table::new(self.records.clone())
    }

    /// Gets a year, failing with `NotFound` when it does not exist.
    pub async fn require_year(&self, year: i32) -> Result<TripsYear, RepositoryError> {
        self.years
            .get_year(year)
            .await?
            .ok_or_else(|| RepositoryError::not_found("trips_year", year))
    }

    /// The current year, failing with `NotFound` when the database is empty.
    pub async fn require_current_year(&self) -> Result<TripsYear, RepositoryError> {
        self.years
            .current_year()
            .await?
            .ok_or_else(|| RepositoryError::not_found("trips_year", "current"))
    }

    /// Makes sure every listed netid has a superuser account.
    pub async fn promote_superusers(&self, netids: &[String]) -> Result<(), RepositoryError> {
        for netid in netids {
            match self.users.get_user_by_netid(netid).await? {
                Some(user) if user.is_superuser => {}
                Some(mut user) => {
                    user.is_superuser = true;
                    self.users.update_user(&user).await?;
                    tracing::info!(netid = %netid, "Promoted user to superuser");
                }
                None => {
                    let email = match self.directory.lookup_email(netid).await {
                        Ok(email) => email,
                        Err(e) => {
                            tracing::warn!(netid = %netid, error = %e, "Could not resolve superuser email");
                            String::new()
                        }
                    };
                    let mut user = User::new(netid.clone(), netid.clone(), email);
                    user.is_superuser = true;
                    self.users.create_user(&user).await?;
                    tracing::info!(netid = %netid, "Created superuser");
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Factory functions for different backends
// ============================================================================

#[cfg(feature = "inmemory")]
mod inmemory {
    use super::*;
    use crate::storage::InMemoryRepository;
    use doctrips_auth::InMemorySessionStore;

    impl AppState {
        /// Creates AppState with in-memory storage.
        pub async fn new(config: &Config, auth_config: AuthConfig) -> Result<Self, anyhow::Error> {
            let repo = Arc::new(InMemoryRepository::new());
            let auth = AuthState::new(
                Arc::new(InMemorySessionStore::new()),
                repo.clone(),
                auth_config,
            );
            let (directory, maps) = Self::services(config);

            tracing::info!("Using in-memory storage");
            Ok(Self::build(
                repo,
                auth,
                directory,
                maps,
                config.request_timeout(),
            ))
        }
    }
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use crate::storage::SqliteRepository;
    use doctrips_auth::SqliteSessionStore;

    impl AppState {
        /// Creates AppState with SQLite storage for records and sessions.
        pub async fn new(config: &Config, auth_config: AuthConfig) -> Result<Self, anyhow::Error> {
            let repo = Arc::new(SqliteRepository::new(&config.sqlite_path).await?);

            let sessions = SqliteSessionStore::connect(&config.sqlite_path).await?;
            sessions.migrate().await?;

            let auth = AuthState::new(Arc::new(sessions), repo.clone(), auth_config);
            let (directory, maps) = Self::services(config);

            tracing::info!(path = %config.sqlite_path, "Using SQLite storage");
            Ok(Self::build(
                repo,
                auth,
                directory,
                maps,
                config.request_timeout(),
            ))
        }
    }
}
