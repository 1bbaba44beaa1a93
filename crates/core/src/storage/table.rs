//! Typed access to a [`RecordStore`].

use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use crate::record::{Record, StoredRecord};

use super::{Change, RecordStore, RepositoryError, Result};

/// A view of the records of one type, scoped by trips year on every read.
pub struct Table<T> {
    store: Arc<dyn RecordStore>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            marker: PhantomData,
        }
    }
}

impl<T: Record> Table<T> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            marker: PhantomData,
        }
    }

    /// Gets a record by id. Records of other years are treated as missing.
    pub async fn get(&self, trips_year: i32, id: Uuid) -> Result<Option<T>> {
        match self.store.get(T::KIND, id).await? {
            Some(stored) if stored.trips_year == trips_year => Ok(Some(stored.decode()?)),
            _ => Ok(None),
        }
    }

    /// Gets a record by id, failing with `NotFound` when it is absent.
    pub async fn require(&self, trips_year: i32, id: Uuid) -> Result<T> {
        self.get(trips_year, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(T::KIND.as_str(), id))
    }

    pub async fn list(&self, trips_year: i32) -> Result<Vec<T>> {
        self.store
            .list(T::KIND, trips_year)
            .await?
            .iter()
            .map(StoredRecord::decode)
            .collect()
    }

    pub async fn insert(&self, record: &T) -> Result<()> {
        self.store.insert(StoredRecord::encode(record)?).await
    }

    pub async fn update(&self, record: &T) -> Result<()> {
        self.store.update(StoredRecord::encode(record)?).await
    }

    /// Inserts all records atomically.
    pub async fn insert_all(&self, records: &[T]) -> Result<()> {
        let changes = records
            .iter()
            .map(|r| StoredRecord::encode(r).map(Change::Insert))
            .collect::<Result<Vec<_>>>()?;
        self.store.commit(changes).await
    }

    /// Updates all records atomically.
    pub async fn update_all(&self, records: &[T]) -> Result<()> {
        let changes = records
            .iter()
            .map(|r| StoredRecord::encode(r).map(Change::Update))
            .collect::<Result<Vec<_>>>()?;
        self.store.commit(changes).await
    }
}
