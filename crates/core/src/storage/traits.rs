use async_trait::async_trait;
use uuid::Uuid;

use crate::permissions::User;
use crate::record::{RecordKind, StoredRecord};
use crate::timetable::Timetable;
use crate::years::TripsYear;

use super::{RepositoryError, Result};

/// A single write applied by [`RecordStore::commit`].
#[derive(Debug, Clone)]
pub enum Change {
    /// Insert a new record. Fails with `AlreadyExists` on an id or unique key clash.
    Insert(StoredRecord),
    /// Replace an existing record. Fails with `NotFound` if it does not exist.
    Update(StoredRecord),
    /// Delete a record. Fails with `NotFound` if it does not exist.
    Delete { kind: RecordKind, id: Uuid },
}

/// Repository for trips years.
#[async_trait]
pub trait TripsYearRepository: Send + Sync {
    /// Lists all years, newest first.
    async fn list_years(&self) -> Result<Vec<TripsYear>>;

    async fn get_year(&self, year: i32) -> Result<Option<TripsYear>>;

    /// Gets the year currently marked as current.
    async fn current_year(&self) -> Result<Option<TripsYear>>;

    /// Creates a year.
    async fn create_year(&self, year: &TripsYear) -> Result<()>;

    /// Atomically retires `from`, creates `to` as the current year and
    /// applies `changes`: the records forwarded into `to` plus any rewrites
    /// of `from` that must land in the same transaction.
    async fn advance(&self, from: i32, to: &TripsYear, changes: Vec<Change>) -> Result<()>;
}

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn get_user_by_netid(&self, netid: &str) -> Result<Option<User>>;

    async fn list_users(&self) -> Result<Vec<User>>;

    /// Creates a user. Netids are unique.
    async fn create_user(&self, user: &User) -> Result<()>;

    async fn update_user(&self, user: &User) -> Result<()>;
}

/// Repository for the singleton timetable.
#[async_trait]
pub trait TimetableRepository: Send + Sync {
    /// Gets the timetable, creating it with default dates on first access.
    async fn get_timetable(&self) -> Result<Timetable>;

    async fn update_timetable(&self, timetable: &Timetable) -> Result<()>;
}

/// Document store for year-scoped records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, kind: RecordKind, id: Uuid) -> Result<Option<StoredRecord>>;

    /// Lists records of one kind in one year, ordered by sort key.
    async fn list(&self, kind: RecordKind, trips_year: i32) -> Result<Vec<StoredRecord>>;

    /// Lists every record holding a reference to `target`.
    async fn referencing(&self, target: Uuid) -> Result<Vec<StoredRecord>>;

    /// Applies all changes or none of them.
    async fn commit(&self, changes: Vec<Change>) -> Result<()>;

    async fn insert(&self, record: StoredRecord) -> Result<()> {
        self.commit(vec![Change::Insert(record)]).await
    }

    async fn update(&self, record: StoredRecord) -> Result<()> {
        self.commit(vec![Change::Update(record)]).await
    }

    async fn delete(&self, kind: RecordKind, id: Uuid) -> Result<()> {
        self.commit(vec![Change::Delete { kind, id }]).await
    }

    /// Gets a record that must exist in the given year.
    async fn require(&self, kind: RecordKind, trips_year: i32, id: Uuid) -> Result<StoredRecord> {
        match self.get(kind, id).await? {
            Some(record) if record.trips_year == trips_year => Ok(record),
            _ => Err(RepositoryError::not_found(kind.as_str(), id)),
        }
    }
}
