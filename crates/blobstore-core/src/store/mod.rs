//! Blob store: CRUD over one named, auto-keyed object store.
//!
//! Construction never fails and never touches the engine. The first
//! operation (or an explicit [`BlobStore::connect`]) opens the shared
//! connection, and every operation runs in its own transaction on it.
//!
//! Batch variants (`save_many`, `get_many`, `create_many`) process elements in
//! order, one transaction each, and stop at the first failure. Elements
//! written before the failure stay written.

mod connection;

pub use connection::Connector;

use tracing::{debug, warn};

use crate::codec;
use crate::logging::prefix;
use crate::options::StoreOptions;
use crate::record::{Blob, Record, RecordBody, RecordId};
use crate::storage::{ObjectStore, Schema, StorageEngine, StoreError, StoreResult};

/// Blob store bound to a single named database.
pub struct BlobStore<E: StorageEngine> {
    name: String,
    connector: Connector<E>,
}

impl<E: StorageEngine> BlobStore<E> {
    /// Bind a store to the database named in `options`.
    pub fn new(engine: E, options: StoreOptions) -> Self {
        let name = options.resolved_db_name().to_string();
        let connector = Connector::new(engine, Schema::new(name.clone()));
        Self { name, connector }
    }

    /// Database name in use.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine(&self) -> &E {
        self.connector.engine()
    }

    /// Open the shared connection now instead of on first use.
    pub async fn connect(&self) -> StoreResult<()> {
        self.connector.acquire().await.map(|_| ())
    }

    /// Close the shared connection. The next operation reopens it.
    pub async fn close(&self) {
        self.connector.release().await;
    }

    /// Every record in store order.
    pub async fn all(&self) -> StoreResult<Vec<Record>> {
        let store = self.connector.acquire().await?;
        let records = store.all().await.inspect_err(|e| self.log_failure("all", e))?;
        debug!("{} all: {} records from '{}'", prefix::DB, records.len(), self.name);
        Ok(records)
    }

    /// Persist a blob under a generated key and return the key.
    pub async fn save(&self, blob: impl Into<Blob>) -> StoreResult<RecordId> {
        self.write(None, blob.into()).await
    }

    /// Persist a blob under a caller-supplied key, overwriting any record
    /// already stored there. A string key doubles as the record's GUID.
    pub async fn save_with_id(
        &self,
        id: impl Into<RecordId>,
        blob: impl Into<Blob>,
    ) -> StoreResult<RecordId> {
        self.write(Some(id.into()), blob.into()).await
    }

    /// Persist several blobs, returning their keys in input order.
    pub async fn save_many<I, B>(&self, blobs: I) -> StoreResult<Vec<RecordId>>
    where
        I: IntoIterator<Item = B>,
        B: Into<Blob>,
    {
        let mut ids = Vec::new();
        for blob in blobs {
            ids.push(self.write(None, blob.into()).await?);
        }
        Ok(ids)
    }

    /// Persist a blob and return the stored record.
    pub async fn create(&self, blob: impl Into<Blob>) -> StoreResult<Record> {
        let id = self.save(blob).await?;
        self.fetch_written(id).await
    }

    /// Persist a blob under a caller-supplied key and return the stored record.
    pub async fn create_with_id(
        &self,
        id: impl Into<RecordId>,
        blob: impl Into<Blob>,
    ) -> StoreResult<Record> {
        let id = self.save_with_id(id, blob).await?;
        self.fetch_written(id).await
    }

    /// Persist several blobs and return the stored records in input order.
    pub async fn create_many<I, B>(&self, blobs: I) -> StoreResult<Vec<Record>>
    where
        I: IntoIterator<Item = B>,
        B: Into<Blob>,
    {
        let ids = self.save_many(blobs).await?;
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            records.push(self.fetch_written(id).await?);
        }
        Ok(records)
    }

    /// Retrieve a record by key.
    /// Returns `None` if not found.
    pub async fn get(&self, id: &RecordId) -> StoreResult<Option<Record>> {
        let store = self.connector.acquire().await?;
        store.get(id).await.inspect_err(|e| self.log_failure("get", e))
    }

    /// Retrieve several records, in the order of `ids`, with `None` for
    /// missing keys.
    pub async fn get_many(&self, ids: &[RecordId]) -> StoreResult<Vec<Option<Record>>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            records.push(self.get(id).await?);
        }
        Ok(records)
    }

    /// Retrieve a record's payload decoded as a binary string.
    /// Returns `None` if not found.
    pub async fn get_as_string(&self, id: &RecordId) -> StoreResult<Option<String>> {
        Ok(self
            .get(id)
            .await?
            .map(|record| codec::bytes_to_binary_string(&record.data)))
    }

    /// Number of stored records.
    pub async fn size(&self) -> StoreResult<usize> {
        let store = self.connector.acquire().await?;
        store.count().await.inspect_err(|e| self.log_failure("size", e))
    }

    /// Delete every record.
    pub async fn clear(&self) -> StoreResult<()> {
        let store = self.connector.acquire().await?;
        store.clear().await.inspect_err(|e| self.log_failure("clear", e))?;
        debug!("{} cleared '{}'", prefix::DB, self.name);
        Ok(())
    }

    async fn write(&self, key: Option<RecordId>, blob: Blob) -> StoreResult<RecordId> {
        let guid = match key.as_ref().and_then(RecordId::as_named) {
            Some(name) => name.to_string(),
            None => codec::guid(),
        };
        let body = RecordBody::from_blob(&blob, guid);

        let store = self.connector.acquire().await?;
        let id = store
            .put(body, key)
            .await
            .inspect_err(|e| self.log_failure("save", e))?;
        debug!(
            "{} saved {} bytes ({}) as {} in '{}'",
            prefix::DB,
            blob.len(),
            blob.mime_type(),
            id,
            self.name
        );
        Ok(id)
    }

    async fn fetch_written(&self, id: RecordId) -> StoreResult<Record> {
        self.get(&id).await?.ok_or_else(|| {
            StoreError::Transaction(format!("record {} missing right after write", id))
        })
    }

    fn log_failure(&self, operation: &str, error: &StoreError) {
        warn!("{} {} on '{}' failed: {}", prefix::DB, operation, self.name, error);
    }
}
