//! SQLite repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Transaction};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use doctrips_core::permissions::User;
use doctrips_core::record::{RecordKind, StoredRecord};
use doctrips_core::storage::{
    Change, RecordStore, RepositoryError, Result, TimetableRepository, TripsYearRepository,
    UserRepository,
};
use doctrips_core::timetable::Timetable;
use doctrips_core::years::TripsYear;

use super::conversions::{
    references_to_json, row_to_record, row_to_timetable, row_to_user, row_to_year,
};
use super::error::{abort, map_rusqlite_error, map_tokio_rusqlite_error};
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// SQLite-based repository implementation.
///
/// Multi-record writes run inside a single transaction on the connection
/// thread, so a failed commit leaves nothing behind.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Opens (or creates) a database file and ensures the schema exists.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Creates a repository backed by an in-memory database.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }
}

fn write_references(tx: &Transaction<'_>, record: &StoredRecord) -> rusqlite::Result<()> {
    let source = record.id.to_string();
    tx.execute(schema::DELETE_REFERENCES, params![source])?;
    for reference in &record.references {
        tx.execute(
            schema::INSERT_REFERENCE,
            params![source, reference.target.to_string()],
        )?;
    }
    Ok(())
}

/// Runs INSERT_RECORD or UPDATE_RECORD, which share their parameter order.
fn write_record(tx: &Transaction<'_>, sql: &str, record: &StoredRecord) -> rusqlite::Result<usize> {
    tx.execute(
        sql,
        params![
            record.id.to_string(),
            record.kind.as_str(),
            record.trips_year,
            record.label,
            record.sort_key,
            record.unique_key,
            references_to_json(&record.references),
            record.data.to_string(),
        ],
    )
}

/// Applies one change inside an open transaction.
fn apply(tx: &Transaction<'_>, change: Change) -> tokio_rusqlite::Result<()> {
    match change {
        Change::Insert(record) => {
            let kind = record.kind.as_str();
            let clash: Option<i64> = tx
                .query_row(
                    schema::RECORD_EXISTS,
                    params![record.id.to_string()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(wrap_err)?;
            if clash.is_some() {
                return Err(abort(RepositoryError::already_exists(kind, record.id)));
            }

            write_record(tx, schema::INSERT_RECORD, &record).map_err(|e| {
                abort(map_rusqlite_error(
                    &e,
                    kind,
                    record.unique_key.as_deref().unwrap_or_default(),
                ))
            })?;
            write_references(tx, &record).map_err(wrap_err)?;
        }
        Change::Update(record) => {
            let kind = record.kind.as_str();
            let changed = write_record(tx, schema::UPDATE_RECORD, &record).map_err(|e| {
                abort(map_rusqlite_error(
                    &e,
                    kind,
                    record.unique_key.as_deref().unwrap_or_default(),
                ))
            })?;
            if changed == 0 {
                return Err(abort(RepositoryError::not_found(kind, record.id)));
            }
            write_references(tx, &record).map_err(wrap_err)?;
        }
        Change::Delete { kind, id } => {
            let source = id.to_string();
            let removed = tx
                .execute(schema::DELETE_RECORD, params![source, kind.as_str()])
                .map_err(wrap_err)?;
            if removed == 0 {
                return Err(abort(RepositoryError::not_found(kind.as_str(), id)));
            }
            tx.execute(schema::DELETE_REFERENCES, params![source])
                .map_err(wrap_err)?;
        }
    }
    Ok(())
}

/// Applies `changes` and then checks referential integrity of the result:
/// written records must point at live records of the same kind and year, and
/// deleted records must have no remaining referencers.
fn apply_all(tx: &Transaction<'_>, changes: Vec<Change>) -> tokio_rusqlite::Result<()> {
    let mut written = Vec::new();
    let mut deleted = Vec::new();
    for change in changes {
        match &change {
            Change::Insert(record) | Change::Update(record) => {
                written.push((record.id, record.trips_year, record.references.clone()));
            }
            Change::Delete { kind, id } => deleted.push((*kind, *id)),
        }
        apply(tx, change)?;
    }

    for (id, trips_year, references) in written {
        if deleted.iter().any(|(_, gone)| *gone == id) {
            continue;
        }
        for reference in references {
            let target: Option<(String, i32)> = tx
                .query_row(
                    schema::SELECT_RECORD_KIND_YEAR,
                    params![reference.target.to_string()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(wrap_err)?;
            let live = target.is_some_and(|(kind, year)| {
                kind == reference.kind.as_str() && year == trips_year
            });
            if !live {
                return Err(abort(RepositoryError::dangling(
                    reference.kind,
                    reference.target,
                    trips_year,
                )));
            }
        }
    }

    for (kind, id) in deleted {
        let mut stmt = tx
            .prepare_cached(schema::LIST_REFERENCING_LABELS)
            .map_err(wrap_err)?;
        let labels = stmt
            .query_map(params![id.to_string()], |row| row.get::<_, String>(0))
            .map_err(wrap_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(wrap_err)?;
        if !labels.is_empty() {
            return Err(abort(RepositoryError::protected(kind.as_str(), id, labels)));
        }
    }
    Ok(())
}

fn find_year(tx: &Transaction<'_>, year: i32) -> rusqlite::Result<Option<TripsYear>> {
    tx.query_row(schema::SELECT_YEAR, params![year], row_to_year)
        .optional()
}

// ============================================================================
// TripsYearRepository implementation
// ============================================================================

#[async_trait]
impl TripsYearRepository for SqliteRepository {
    async fn list_years(&self) -> Result<Vec<TripsYear>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(schema::LIST_YEARS).map_err(wrap_err)?;
                let years = stmt
                    .query_map([], row_to_year)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(years)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "trips_year", ""))
    }

    async fn get_year(&self, year: i32) -> Result<Option<TripsYear>> {
        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_YEAR, params![year], row_to_year)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "trips_year", year.to_string()))
    }

    async fn current_year(&self) -> Result<Option<TripsYear>> {
        self.conn
            .call(|conn| {
                conn.query_row(schema::SELECT_CURRENT_YEAR, [], row_to_year)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "trips_year", ""))
    }

    async fn create_year(&self, year: &TripsYear) -> Result<()> {
        let year = *year;
        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                if find_year(&tx, year.year).map_err(wrap_err)?.is_some() {
                    return Err(abort(RepositoryError::already_exists(
                        "trips_year",
                        year.year,
                    )));
                }
                if year.is_current {
                    tx.execute(schema::CLEAR_CURRENT_YEAR, [])
                        .map_err(wrap_err)?;
                }
                tx.execute(schema::INSERT_YEAR, params![year.year, year.is_current])
                    .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "trips_year", year.year.to_string()))
    }

    async fn advance(&self, from: i32, to: &TripsYear, changes: Vec<Change>) -> Result<()> {
        let to = *to;
        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                match find_year(&tx, from).map_err(wrap_err)? {
                    Some(year) if year.is_current => {}
                    Some(_) => {
                        return Err(abort(RepositoryError::InvalidData(format!(
                            "trips year {from} is not the current year"
                        ))))
                    }
                    None => return Err(abort(RepositoryError::not_found("trips_year", from))),
                }
                if find_year(&tx, to.year).map_err(wrap_err)?.is_some() {
                    return Err(abort(RepositoryError::already_exists("trips_year", to.year)));
                }

                apply_all(&tx, changes)?;
                tx.execute(schema::CLEAR_CURRENT_YEAR, [])
                    .map_err(wrap_err)?;
                tx.execute(schema::INSERT_YEAR, params![to.year, to.is_current])
                    .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "trips_year", to.year.to_string()))
    }
}

// ============================================================================
// UserRepository implementation
// ============================================================================

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let id_str = id.to_string();
        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_USER, params![id_str], row_to_user)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "user", id.to_string()))
    }

    async fn get_user_by_netid(&self, netid: &str) -> Result<Option<User>> {
        let netid = netid.to_string();
        let netid_for_err = netid.clone();
        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_USER_BY_NETID, params![netid], row_to_user)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "user", netid_for_err))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(schema::LIST_USERS).map_err(wrap_err)?;
                let users = stmt
                    .query_map([], row_to_user)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(users)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "user", ""))
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        let user = user.clone();
        let netid = user.netid.clone();
        let groups = serde_json::to_string(&user.groups)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_USER,
                    params![
                        user.id.to_string(),
                        user.netid,
                        user.name,
                        user.email,
                        user.is_superuser,
                        groups
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "user", netid))
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let user = user.clone();
        let id = user.id;
        let groups = serde_json::to_string(&user.groups)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        self.conn
            .call(move |conn| {
                let changed = conn
                    .execute(
                        schema::UPDATE_USER,
                        params![
                            user.id.to_string(),
                            user.netid,
                            user.name,
                            user.email,
                            user.is_superuser,
                            groups
                        ],
                    )
                    .map_err(wrap_err)?;
                if changed == 0 {
                    return Err(abort(RepositoryError::not_found("user", user.id)));
                }
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "user", id.to_string()))
    }
}

// ============================================================================
// TimetableRepository implementation
// ============================================================================

#[async_trait]
impl TimetableRepository for SqliteRepository {
    async fn get_timetable(&self) -> Result<Timetable> {
        self.conn
            .call(|conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let existing = tx
                    .query_row(schema::SELECT_TIMETABLE, [], row_to_timetable)
                    .optional()
                    .map_err(wrap_err)?;
                let timetable = match existing {
                    Some(timetable) => timetable,
                    None => {
                        let timetable = Timetable::starting_at(Utc::now());
                        let data = serde_json::to_string(&timetable).map_err(|e| {
                            abort(RepositoryError::Serialization(e.to_string()))
                        })?;
                        tx.execute(schema::UPSERT_TIMETABLE, params![data])
                            .map_err(wrap_err)?;
                        timetable
                    }
                };
                tx.commit().map_err(wrap_err)?;
                Ok(timetable)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "timetable", "1"))
    }

    async fn update_timetable(&self, timetable: &Timetable) -> Result<()> {
        let data = serde_json::to_string(timetable)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        self.conn
            .call(move |conn| {
                conn.execute(schema::UPSERT_TIMETABLE, params![data])
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "timetable", "1"))
    }
}

// ============================================================================
// RecordStore implementation
// ============================================================================

#[async_trait]
impl RecordStore for SqliteRepository {
    async fn get(&self, kind: RecordKind, id: Uuid) -> Result<Option<StoredRecord>> {
        let id_str = id.to_string();
        self.conn
            .call(move |conn| {
                conn.query_row(
                    schema::SELECT_RECORD,
                    params![id_str, kind.as_str()],
                    row_to_record,
                )
                .optional()
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, kind.as_str(), id.to_string()))
    }

    async fn list(&self, kind: RecordKind, trips_year: i32) -> Result<Vec<StoredRecord>> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::LIST_RECORDS).map_err(wrap_err)?;
                let records = stmt
                    .query_map(params![kind.as_str(), trips_year], row_to_record)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(records)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, kind.as_str(), ""))
    }

    async fn referencing(&self, target: Uuid) -> Result<Vec<StoredRecord>> {
        let target_str = target.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::LIST_REFERENCING).map_err(wrap_err)?;
                let records = stmt
                    .query_map(params![target_str], row_to_record)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(records)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "record", target.to_string()))
    }

    async fn commit(&self, changes: Vec<Change>) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let count = changes.len();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                apply_all(&tx, changes)?;
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "record", ""))?;
        tracing::debug!(changes = count, "Committed record changes");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use doctrips_core::applications::Croo;
    use doctrips_core::storage::Table;
    use doctrips_core::transport::{Route, RouteCategory, Stop, Vehicle};
    use doctrips_core::trips::Section;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    async fn repo() -> Arc<SqliteRepository> {
        Arc::new(SqliteRepository::new_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_records_round_trip_and_sort() {
        let repo = repo().await;
        let sections: Table<Section> = Table::new(repo.clone());

        let b = Section::new(2024, "B", date(9, 2));
        let a = Section::new(2024, "A", date(9, 1));
        sections.insert(&b).await.unwrap();
        sections.insert(&a).await.unwrap();
        sections
            .insert(&Section::new(2023, "A", date(9, 1)))
            .await
            .unwrap();

        let listed = sections.list(2024).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);

        assert_eq!(sections.get(2024, a.id).await.unwrap(), Some(a.clone()));
        assert_eq!(sections.get(2023, a.id).await.unwrap(), None);
        assert!(repo.get(RecordKind::Croo, a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_key_is_scoped_to_year() {
        let repo = repo().await;
        let sections: Table<Section> = Table::new(repo.clone());

        sections
            .insert(&Section::new(2024, "A", date(9, 1)))
            .await
            .unwrap();
        let clash = sections.insert(&Section::new(2024, "A", date(9, 3))).await;
        assert!(matches!(clash, Err(RepositoryError::AlreadyExists { .. })));

        sections
            .insert(&Section::new(2025, "A", date(9, 1)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_and_delete_require_existing_record() {
        let repo = repo().await;
        let section = Section::new(2024, "A", date(9, 1));
        let stored = StoredRecord::encode(&section).unwrap();

        let missing = repo.update(stored.clone()).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));

        repo.insert(stored.clone()).await.unwrap();
        let mut renamed = stored.clone();
        renamed.label = "Z".to_string();
        renamed.sort_key = "Z".to_string();
        repo.update(renamed).await.unwrap();
        let fetched = repo.get(RecordKind::Section, section.id).await.unwrap().unwrap();
        assert_eq!(fetched.label, "Z");

        let wrong_kind = repo.delete(RecordKind::Croo, section.id).await;
        assert!(matches!(wrong_kind, Err(RepositoryError::NotFound { .. })));
        repo.delete(RecordKind::Section, section.id).await.unwrap();
        assert!(repo.get(RecordKind::Section, section.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let repo = repo().await;
        let croos: Table<Croo> = Table::new(repo.clone());

        let first = Croo::new(2024, "Lodge");
        let result = croos
            .insert_all(&[Croo::new(2024, "Lodge"), first.clone(), first.clone()])
            .await;
        assert!(result.is_err());
        assert!(croos.list(2024).await.unwrap().is_empty());

        croos.insert(&first).await.unwrap();
        let missing = repo
            .commit(vec![
                Change::Delete {
                    kind: RecordKind::Croo,
                    id: first.id,
                },
                Change::Delete {
                    kind: RecordKind::Croo,
                    id: Uuid::new_v4(),
                },
            ])
            .await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));
        assert_eq!(croos.list(2024).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_referencing_finds_sources() {
        let repo = repo().await;
        let vehicle = Vehicle::new(2024, "Van", 12);
        let route = Route::new(2024, "Blue", RouteCategory::Internal, vehicle.id);
        let mut stop = Stop::new(2024, "Boston", 100);
        stop.route = Some(route.id);

        Table::<Vehicle>::new(repo.clone()).insert(&vehicle).await.unwrap();
        Table::<Route>::new(repo.clone()).insert(&route).await.unwrap();
        Table::<Stop>::new(repo.clone()).insert(&stop).await.unwrap();

        let sources = repo.referencing(route.id).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, stop.id);
        assert_eq!(sources[0].references, StoredRecord::encode(&stop).unwrap().references);

        repo.delete(RecordKind::Stop, stop.id).await.unwrap();
        assert!(repo.referencing(route.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_rejects_reference_to_missing_or_other_year_record() {
        let repo = repo().await;
        let routes: Table<Route> = Table::new(repo.clone());

        let ghost = Route::new(2024, "Green", RouteCategory::Internal, Uuid::new_v4());
        let err = routes.insert(&ghost).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidData(_)));

        let old_bus = Vehicle::new(2023, "Bus", 56);
        Table::<Vehicle>::new(repo.clone()).insert(&old_bus).await.unwrap();
        let cross = Route::new(2024, "Green", RouteCategory::Internal, old_bus.id);
        let err = routes.insert(&cross).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidData(_)));
        assert!(routes.list(2024).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_of_referenced_record_is_protected() {
        let repo = repo().await;
        let vehicle = Vehicle::new(2024, "Van", 12);
        let route = Route::new(2024, "Blue", RouteCategory::Internal, vehicle.id);
        Table::<Vehicle>::new(repo.clone()).insert(&vehicle).await.unwrap();
        Table::<Route>::new(repo.clone()).insert(&route).await.unwrap();

        let err = repo.delete(RecordKind::Vehicle, vehicle.id).await.unwrap_err();
        assert_eq!(
            err,
            RepositoryError::protected("vehicle", vehicle.id, vec!["Blue".to_string()])
        );
        assert!(repo.get(RecordKind::Vehicle, vehicle.id).await.unwrap().is_some());

        repo.commit(vec![
            Change::Delete {
                kind: RecordKind::Route,
                id: route.id,
            },
            Change::Delete {
                kind: RecordKind::Vehicle,
                id: vehicle.id,
            },
        ])
        .await
        .unwrap();
        assert!(repo.get(RecordKind::Vehicle, vehicle.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_create_and_delete_never_dangles() {
        let repo = repo().await;
        let vehicles: Table<Vehicle> = Table::new(repo.clone());
        let routes: Table<Route> = Table::new(repo.clone());

        for i in 0..100 {
            let vehicle = Vehicle::new(2024, format!("Van {i}"), 12);
            vehicles.insert(&vehicle).await.unwrap();
            let route = Route::new(2024, format!("Route {i}"), RouteCategory::Internal, vehicle.id);

            let (created, deleted) = tokio::join!(
                routes.insert(&route),
                repo.delete(RecordKind::Vehicle, vehicle.id)
            );
            assert!(created.is_ok() != deleted.is_ok());
        }

        for route in routes.list(2024).await.unwrap() {
            let target = repo.get(RecordKind::Vehicle, route.vehicle).await.unwrap();
            assert!(target.is_some(), "route {} points at a deleted vehicle", route.name);
        }
    }

    #[tokio::test]
    async fn test_years_and_advance() {
        let repo = repo().await;
        repo.create_year(&TripsYear::new(2024, true)).await.unwrap();
        assert!(repo.create_year(&TripsYear::new(2024, false)).await.is_err());

        let section = Section::new(2025, "A", date(9, 1));
        repo.advance(
            2024,
            &TripsYear::new(2025, true),
            vec![Change::Insert(StoredRecord::encode(&section).unwrap())],
        )
        .await
        .unwrap();

        assert_eq!(repo.current_year().await.unwrap().map(|y| y.year), Some(2025));
        let years: Vec<i32> = repo.list_years().await.unwrap().iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2025, 2024]);
        assert_eq!(repo.list(RecordKind::Section, 2025).await.unwrap().len(), 1);

        let again = repo.advance(2024, &TripsYear::new(2026, true), vec![]).await;
        assert!(matches!(again, Err(RepositoryError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_failed_advance_leaves_year_current() {
        let repo = repo().await;
        repo.create_year(&TripsYear::new(2024, true)).await.unwrap();
        let section = StoredRecord::encode(&Section::new(2025, "A", date(9, 1))).unwrap();

        let result = repo
            .advance(
                2024,
                &TripsYear::new(2025, true),
                vec![Change::Insert(section.clone()), Change::Insert(section)],
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
        assert_eq!(repo.current_year().await.unwrap().map(|y| y.year), Some(2024));
        assert!(repo.get_year(2025).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_users_are_unique_by_netid() {
        let repo = repo().await;
        let user = User::new("d12345a", "Jane", "jane@dartmouth.edu");
        repo.create_user(&user).await.unwrap();

        let dup = User::new("D12345A", "Jane", "jane@dartmouth.edu");
        assert!(matches!(
            repo.create_user(&dup).await,
            Err(RepositoryError::AlreadyExists { .. })
        ));

        let found = repo.get_user_by_netid("D12345A").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        let mut promoted = found.clone();
        promoted.is_superuser = true;
        repo.update_user(&promoted).await.unwrap();
        assert_eq!(repo.get_user(user.id).await.unwrap(), Some(promoted));
        assert_eq!(repo.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_timetable_is_created_on_first_read() {
        let repo = repo().await;
        let first = repo.get_timetable().await.unwrap();
        let second = repo.get_timetable().await.unwrap();
        assert_eq!(first, second);
    }
}
