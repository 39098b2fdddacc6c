//! Storage trait definitions

use async_trait::async_trait;

use crate::options::{DB_VERSION, STORE_NAME};
use crate::record::{Record, RecordBody, RecordId};
use crate::storage::error::StoreResult;

/// Where and at which version a database is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub db_name: String,
    pub version: u32,
    pub store_name: String,
}

impl Schema {
    /// Schema for `db_name` at the current version with the default store.
    pub fn new(db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            version: DB_VERSION,
            store_name: STORE_NAME.to_string(),
        }
    }
}

/// A host storage engine.
///
/// Resolved once and injected into the blob store. Futures are not `Send`:
/// browser engines are single-threaded and their handles cannot cross threads.
#[async_trait(?Send)]
pub trait StorageEngine {
    /// Open connection to one object store.
    type Store: ObjectStore;

    /// Open the database at `schema.version`.
    ///
    /// When the stored version is older (or the database is new) this runs the
    /// upgrade, which creates the object store with an auto-incrementing key
    /// and no indexes if it does not exist yet.
    ///
    /// Returns `StoreError::Unsupported` when the engine is not available and
    /// `StoreError::Connection` on any other open or upgrade failure.
    async fn open(&self, schema: &Schema) -> StoreResult<Self::Store>;

    /// Delete a whole database. Deleting a missing database succeeds.
    async fn delete_database(&self, db_name: &str) -> StoreResult<()>;
}

/// An open connection scoped to a single object store.
///
/// Every request runs in its own transaction. Failures surface as
/// `StoreError::Transaction` carrying the host's message.
#[async_trait(?Send)]
pub trait ObjectStore {
    /// Insert or overwrite a record.
    ///
    /// With no key the store's key generator assigns one. Returns the key the
    /// record was written under.
    async fn put(&self, body: RecordBody, key: Option<RecordId>) -> StoreResult<RecordId>;

    /// Retrieve a record by key.
    ///
    /// Returns `None` if not found.
    async fn get(&self, key: &RecordId) -> StoreResult<Option<Record>>;

    /// Scan every record in key order.
    async fn all(&self) -> StoreResult<Vec<Record>>;

    /// Number of records in the store.
    async fn count(&self) -> StoreResult<usize>;

    /// Delete every record in the store.
    async fn clear(&self) -> StoreResult<()>;

    /// Close the connection. Later requests fail.
    fn close(&self) {}
}
