//! In-memory repository implementation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use doctrips_core::permissions::User;
use doctrips_core::record::{RecordKind, StoredRecord};
use doctrips_core::storage::{
    Change, RecordStore, RepositoryError, Result, TimetableRepository, TripsYearRepository,
    UserRepository,
};
use doctrips_core::timetable::Timetable;
use doctrips_core::years::TripsYear;

#[derive(Debug, Default)]
struct Inner {
    years: BTreeMap<i32, TripsYear>,
    users: HashMap<Uuid, User>,
    timetable: Option<Timetable>,
    records: Records,
}

/// In-memory storage backend.
///
/// One lock guards everything so multi-record commits and year advancement
/// are atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

type UniqueKey = (RecordKind, i32, String);

/// Records by id, with the unique-key and reverse-reference indexes kept in step.
#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<Uuid, StoredRecord>,
    unique: HashMap<UniqueKey, Uuid>,
    referrers: HashMap<Uuid, HashSet<Uuid>>,
}

fn unique_key(record: &StoredRecord) -> Option<UniqueKey> {
    record
        .unique_key
        .clone()
        .map(|key| (record.kind, record.trips_year, key))
}

impl Records {
    fn get(&self, id: &Uuid) -> Option<&StoredRecord> {
        self.by_id.get(id)
    }

    fn values(&self) -> impl Iterator<Item = &StoredRecord> {
        self.by_id.values()
    }

    fn unique_clash(&self, record: &StoredRecord) -> bool {
        unique_key(record)
            .and_then(|key| self.unique.get(&key))
            .is_some_and(|owner| *owner != record.id)
    }

    /// Stores `record`, returning the version it replaced.
    fn put(&mut self, record: StoredRecord) -> Option<StoredRecord> {
        let previous = self.remove(&record.id);
        if let Some(key) = unique_key(&record) {
            self.unique.insert(key, record.id);
        }
        for reference in &record.references {
            self.referrers
                .entry(reference.target)
                .or_default()
                .insert(record.id);
        }
        self.by_id.insert(record.id, record);
        previous
    }

    fn remove(&mut self, id: &Uuid) -> Option<StoredRecord> {
        let record = self.by_id.remove(id)?;
        if let Some(key) = unique_key(&record) {
            if self.unique.get(&key) == Some(id) {
                self.unique.remove(&key);
            }
        }
        for reference in &record.references {
            if let Some(sources) = self.referrers.get_mut(&reference.target) {
                sources.remove(id);
                if sources.is_empty() {
                    self.referrers.remove(&reference.target);
                }
            }
        }
        Some(record)
    }

    fn referencing(&self, target: &Uuid) -> Vec<&StoredRecord> {
        self.referrers
            .get(target)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id))
            .collect()
    }

    /// Applies `changes` in place. On failure every applied change is undone.
    fn apply(&mut self, changes: Vec<Change>) -> Result<()> {
        let mut undo: Vec<(Uuid, Option<StoredRecord>)> = Vec::new();
        let result = self.apply_logged(changes, &mut undo);
        if result.is_err() {
            for (id, previous) in undo.into_iter().rev() {
                match previous {
                    Some(record) => {
                        self.put(record);
                    }
                    None => {
                        self.remove(&id);
                    }
                }
            }
        }
        result
    }

    fn apply_logged(
        &mut self,
        changes: Vec<Change>,
        undo: &mut Vec<(Uuid, Option<StoredRecord>)>,
    ) -> Result<()> {
        let mut written = Vec::new();
        let mut deleted = Vec::new();
        for change in changes {
            match change {
                Change::Insert(record) => {
                    if self.by_id.contains_key(&record.id) {
                        return Err(RepositoryError::already_exists(
                            record.kind.as_str(),
                            record.id,
                        ));
                    }
                    if self.unique_clash(&record) {
                        return Err(RepositoryError::already_exists(
                            record.kind.as_str(),
                            record.unique_key.unwrap_or_default(),
                        ));
                    }
                    written.push(record.id);
                    undo.push((record.id, self.put(record)));
                }
                Change::Update(record) => {
                    match self.by_id.get(&record.id) {
                        Some(existing) if existing.kind == record.kind => {}
                        _ => return Err(RepositoryError::not_found(record.kind.as_str(), record.id)),
                    }
                    if self.unique_clash(&record) {
                        return Err(RepositoryError::already_exists(
                            record.kind.as_str(),
                            record.unique_key.unwrap_or_default(),
                        ));
                    }
                    written.push(record.id);
                    undo.push((record.id, self.put(record)));
                }
                Change::Delete { kind, id } => match self.by_id.get(&id) {
                    Some(existing) if existing.kind == kind => {
                        deleted.push((kind, id));
                        undo.push((id, self.remove(&id)));
                    }
                    _ => return Err(RepositoryError::not_found(kind.as_str(), id)),
                },
            }
        }
        self.check_references(&written, &deleted)
    }

    /// Every written record must point at live records of its own year, and
    /// nothing may still point at a deleted one.
    fn check_references(&self, written: &[Uuid], deleted: &[(RecordKind, Uuid)]) -> Result<()> {
        for record in written.iter().filter_map(|id| self.by_id.get(id)) {
            for reference in &record.references {
                match self.by_id.get(&reference.target) {
                    Some(target)
                        if target.kind == reference.kind
                            && target.trips_year == record.trips_year => {}
                    _ => {
                        return Err(RepositoryError::dangling(
                            reference.kind,
                            reference.target,
                            record.trips_year,
                        ))
                    }
                }
            }
        }
        for (kind, id) in deleted {
            if self.by_id.contains_key(id) {
                continue;
            }
            let mut labels: Vec<String> = self
                .referencing(id)
                .into_iter()
                .map(|source| source.label.clone())
                .collect();
            if !labels.is_empty() {
                labels.sort();
                labels.dedup();
                return Err(RepositoryError::protected(kind.as_str(), id, labels));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TripsYearRepository for InMemoryRepository {
    async fn list_years(&self) -> Result<Vec<TripsYear>> {
        let inner = self.inner.read().await;
        Ok(inner.years.values().rev().copied().collect())
    }

    async fn get_year(&self, year: i32) -> Result<Option<TripsYear>> {
        let inner = self.inner.read().await;
        Ok(inner.years.get(&year).copied())
    }

    async fn current_year(&self) -> Result<Option<TripsYear>> {
        let inner = self.inner.read().await;
        Ok(inner.years.values().find(|y| y.is_current).copied())
    }

    async fn create_year(&self, year: &TripsYear) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.years.contains_key(&year.year) {
            return Err(RepositoryError::already_exists("trips_year", year.year));
        }
        if year.is_current {
            for existing in inner.years.values_mut() {
                existing.is_current = false;
            }
        }
        inner.years.insert(year.year, *year);
        Ok(())
    }

    async fn advance(&self, from: i32, to: &TripsYear, changes: Vec<Change>) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.years.get(&from) {
            Some(year) if year.is_current => {}
            Some(_) => {
                return Err(RepositoryError::InvalidData(format!(
                    "trips year {from} is not the current year"
                )))
            }
            None => return Err(RepositoryError::not_found("trips_year", from)),
        }
        if inner.years.contains_key(&to.year) {
            return Err(RepositoryError::already_exists("trips_year", to.year));
        }

        inner.records.apply(changes)?;
        if let Some(year) = inner.years.get_mut(&from) {
            year.is_current = false;
        }
        inner.years.insert(to.year, *to);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn get_user_by_netid(&self, netid: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.netid.eq_ignore_ascii_case(netid))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| a.netid.cmp(&b.netid));
        Ok(users)
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.id)
            || inner
                .users
                .values()
                .any(|u| u.netid.eq_ignore_ascii_case(&user.netid))
        {
            return Err(RepositoryError::already_exists("user", &user.netid));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user.id) {
            return Err(RepositoryError::not_found("user", user.id));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl TimetableRepository for InMemoryRepository {
    async fn get_timetable(&self) -> Result<Timetable> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .timetable
            .get_or_insert_with(|| Timetable::starting_at(Utc::now()))
            .clone())
    }

    async fn update_timetable(&self, timetable: &Timetable) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.timetable = Some(timetable.clone());
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRepository {
    async fn get(&self, kind: RecordKind, id: Uuid) -> Result<Option<StoredRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(&id).filter(|r| r.kind == kind).cloned())
    }

    async fn list(&self, kind: RecordKind, trips_year: i32) -> Result<Vec<StoredRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<StoredRecord> = inner
            .records
            .values()
            .filter(|r| r.kind == kind && r.trips_year == trips_year)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.sort_key.cmp(&b.sort_key).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn referencing(&self, target: Uuid) -> Result<Vec<StoredRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<StoredRecord> = inner
            .records
            .referencing(&target)
            .into_iter()
            .cloned()
            .collect();
        records.sort_by(|a, b| a.sort_key.cmp(&b.sort_key).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn commit(&self, changes: Vec<Change>) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.records.apply(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use doctrips_core::applications::Croo;
    use doctrips_core::record::Record;
    use doctrips_core::storage::Table;
    use doctrips_core::transport::{Route, RouteCategory, Stop, Vehicle};
    use doctrips_core::trips::Section;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_records_round_trip_and_sort() {
        let repo = Arc::new(InMemoryRepository::new());
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
    }

    #[tokio::test]
    async fn test_unique_key_is_scoped_to_year() {
        let repo = Arc::new(InMemoryRepository::new());
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
    async fn test_commit_is_all_or_nothing() {
        let repo = Arc::new(InMemoryRepository::new());
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
        let repo = Arc::new(InMemoryRepository::new());
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

        let sources = repo.referencing(vehicle.id).await.unwrap();
        assert_eq!(sources[0].id, route.id);
    }

    #[tokio::test]
    async fn test_commit_rejects_reference_to_missing_or_other_year_record() {
        let repo = Arc::new(InMemoryRepository::new());
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
        let repo = Arc::new(InMemoryRepository::new());
        let vehicle = Vehicle::new(2024, "Van", 12);
        let route = Route::new(2024, "Blue", RouteCategory::Internal, vehicle.id);
        Table::<Vehicle>::new(repo.clone()).insert(&vehicle).await.unwrap();
        Table::<Route>::new(repo.clone()).insert(&route).await.unwrap();

        let err = repo.delete(RecordKind::Vehicle, vehicle.id).await.unwrap_err();
        match err {
            RepositoryError::Protected { referenced_by, .. } => {
                assert_eq!(referenced_by, vec![route.label()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
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
        assert!(repo.referencing(vehicle.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_restores_indexes() {
        let repo = Arc::new(InMemoryRepository::new());
        let sections: Table<Section> = Table::new(repo.clone());
        let section = Section::new(2024, "A", date(9, 1));
        sections.insert(&section).await.unwrap();
        let vehicle = Vehicle::new(2024, "Van", 12);
        let route = Route::new(2024, "Blue", RouteCategory::Internal, vehicle.id);
        Table::<Vehicle>::new(repo.clone()).insert(&vehicle).await.unwrap();
        Table::<Route>::new(repo.clone()).insert(&route).await.unwrap();

        let failed = repo
            .commit(vec![
                Change::Delete {
                    kind: RecordKind::Section,
                    id: section.id,
                },
                Change::Delete {
                    kind: RecordKind::Route,
                    id: route.id,
                },
                Change::Insert(StoredRecord::encode(&vehicle).unwrap()),
            ])
            .await;
        assert!(matches!(failed, Err(RepositoryError::AlreadyExists { .. })));

        let sources = repo.referencing(vehicle.id).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, route.id);
        let clash = sections.insert(&Section::new(2024, "A", date(9, 5))).await;
        assert!(matches!(clash, Err(RepositoryError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_create_and_delete_never_dangles() {
        let repo = Arc::new(InMemoryRepository::new());
        let vehicles: Table<Vehicle> = Table::new(repo.clone());
        let routes: Table<Route> = Table::new(repo.clone());

        for i in 0..200 {
            let vehicle = Vehicle::new(2024, format!("Van {i}"), 12);
            vehicles.insert(&vehicle).await.unwrap();
            let route = Route::new(2024, format!("Route {i}"), RouteCategory::Internal, vehicle.id);

            let (created, deleted) = tokio::join!(
                routes.insert(&route),
                repo.delete(RecordKind::Vehicle, vehicle.id)
            );
            assert!(
                created.is_ok() != deleted.is_ok(),
                "exactly one of create and delete must win"
            );
        }

        for route in routes.list(2024).await.unwrap() {
            let target = repo.get(RecordKind::Vehicle, route.vehicle).await.unwrap();
            assert!(target.is_some(), "route {} points at a deleted vehicle", route.name);
        }
    }

    #[tokio::test]
    async fn test_years_and_advance() {
        let repo = InMemoryRepository::new();
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
    async fn test_users_are_unique_by_netid() {
        let repo = InMemoryRepository::new();
        let user = User::new("d12345a", "Jane", "jane@dartmouth.edu");
        repo.create_user(&user).await.unwrap();

        let dup = User::new("D12345A", "Jane", "jane@dartmouth.edu");
        assert!(repo.create_user(&dup).await.is_err());

        let found = repo.get_user_by_netid("D12345A").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn test_timetable_is_created_on_first_read() {
        let repo = InMemoryRepository::new();
        let first = repo.get_timetable().await.unwrap();
        let second = repo.get_timetable().await.unwrap();
        assert_eq!(first, second);
    }
}
