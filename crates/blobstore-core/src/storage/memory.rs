//! In-memory storage engine
//!
//! A map-based stand-in for the host engine, for testing and development.
//! Databases live as long as the engine (and its clones), so reopening a
//! database by name sees earlier writes, like per-origin browser storage.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::record::{Record, RecordBody, RecordId};
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::traits::{ObjectStore, Schema, StorageEngine};

/// In-memory storage engine.
///
/// Cloning shares the underlying databases. Useful for:
/// - Unit testing the blob store without a browser
/// - Simulating an environment with no storage engine (`unsupported`)
/// - Simulating failing requests (`fail_requests`)
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    state: Arc<Mutex<EngineState>>,
}

#[derive(Debug, Default)]
struct EngineState {
    unsupported: bool,
    failure: Option<String>,
    opens: usize,
    databases: HashMap<String, MemoryDatabase>,
}

#[derive(Debug, Default)]
struct MemoryDatabase {
    version: u32,
    stores: HashMap<String, MemoryObjectStoreData>,
}

/// Largest key the generator hands out (2^53, the largest exact JS integer).
const MAX_GENERATED_KEY: u64 = 1 << 53;

#[derive(Debug)]
struct MemoryObjectStoreData {
    next_key: u64,
    records: BTreeMap<RecordId, RecordBody>,
}

impl MemoryObjectStoreData {
    fn new() -> Self {
        Self {
            next_key: 1,
            records: BTreeMap::new(),
        }
    }
}

impl MemoryEngine {
    /// Create an engine with no databases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine that behaves like a host without storage support.
    pub fn unsupported() -> Self {
        let engine = Self::new();
        engine.state.lock().unsupported = true;
        engine
    }

    /// Make every subsequent request fail with the given message.
    pub fn fail_requests(&self, message: impl Into<String>) {
        self.state.lock().failure = Some(message.into());
    }

    /// Stop failing requests.
    pub fn recover(&self) {
        self.state.lock().failure = None;
    }

    /// Number of `open` calls made so far, successful or not.
    pub fn open_count(&self) -> usize {
        self.state.lock().opens
    }

    /// Stored schema version of a database, if it exists.
    pub fn database_version(&self, db_name: &str) -> Option<u32> {
        self.state.lock().databases.get(db_name).map(|db| db.version)
    }

    /// Names of all existing databases, sorted.
    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().databases.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait(?Send)]
impl StorageEngine for MemoryEngine {
    type Store = MemoryObjectStore;

    async fn open(&self, schema: &Schema) -> StoreResult<MemoryObjectStore> {
        let mut state = self.state.lock();
        state.opens += 1;

        if state.unsupported {
            return Err(StoreError::Unsupported(
                "no storage engine in this environment".into(),
            ));
        }
        if schema.version == 0 {
            return Err(StoreError::Connection(
                "version must be a positive integer".into(),
            ));
        }

        let db = state.databases.entry(schema.db_name.clone()).or_default();

        if schema.version < db.version {
            return Err(StoreError::Connection(format!(
                "requested version ({}) is less than the existing version ({})",
                schema.version, db.version
            )));
        }
        if schema.version > db.version {
            db.version = schema.version;
            db.stores
                .entry(schema.store_name.clone())
                .or_insert_with(MemoryObjectStoreData::new);
        }

        Ok(MemoryObjectStore {
            state: Arc::clone(&self.state),
            db_name: schema.db_name.clone(),
            store_name: schema.store_name.clone(),
            closed: Cell::new(false),
        })
    }

    async fn delete_database(&self, db_name: &str) -> StoreResult<()> {
        let mut state = self.state.lock();
        if state.unsupported {
            return Err(StoreError::Unsupported(
                "no storage engine in this environment".into(),
            ));
        }
        state.databases.remove(db_name);
        Ok(())
    }
}

/// Connection to one object store of a [`MemoryEngine`] database.
#[derive(Debug)]
pub struct MemoryObjectStore {
    state: Arc<Mutex<EngineState>>,
    db_name: String,
    store_name: String,
    closed: Cell<bool>,
}

impl MemoryObjectStore {
    /// Run `f` against the backing store data, applying closed-connection and
    /// injected-failure checks first.
    fn with_store<T>(
        &self,
        f: impl FnOnce(&mut MemoryObjectStoreData) -> T,
    ) -> StoreResult<T> {
        if self.closed.get() {
            return Err(StoreError::Transaction(
                "the database connection is closing".into(),
            ));
        }

        let mut state = self.state.lock();
        if let Some(message) = &state.failure {
            return Err(StoreError::Transaction(message.clone()));
        }

        let store = state
            .databases
            .get_mut(&self.db_name)
            .and_then(|db| db.stores.get_mut(&self.store_name))
            .ok_or_else(|| {
                StoreError::Transaction(format!(
                    "object store '{}' not found in '{}'",
                    self.store_name, self.db_name
                ))
            })?;

        Ok(f(store))
    }
}

#[async_trait(?Send)]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, body: RecordBody, key: Option<RecordId>) -> StoreResult<RecordId> {
        self.with_store(|store| {
            let key = match key {
                Some(RecordId::Auto(explicit)) => {
                    let bumped = explicit.min(MAX_GENERATED_KEY) + 1;
                    store.next_key = store.next_key.max(bumped);
                    RecordId::Auto(explicit)
                }
                Some(named) => named,
                None => {
                    if store.next_key > MAX_GENERATED_KEY {
                        return Err(StoreError::Transaction(
                            "ConstraintError: key generator exhausted".into(),
                        ));
                    }
                    let generated = store.next_key;
                    store.next_key += 1;
                    RecordId::Auto(generated)
                }
            };
            store.records.insert(key.clone(), body);
            Ok(key)
        })?
    }

    async fn get(&self, key: &RecordId) -> StoreResult<Option<Record>> {
        self.with_store(|store| {
            store
                .records
                .get(key)
                .map(|body| Record::from_body(key.clone(), body.clone()))
        })
    }

    async fn all(&self) -> StoreResult<Vec<Record>> {
        self.with_store(|store| {
            store
                .records
                .iter()
                .map(|(key, body)| Record::from_body(key.clone(), body.clone()))
                .collect()
        })
    }

    async fn count(&self) -> StoreResult<usize> {
        self.with_store(|store| store.records.len())
    }

    async fn clear(&self) -> StoreResult<()> {
        // The key generator is not reset
        self.with_store(|store| store.records.clear())
    }

    fn close(&self) {
        self.closed.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Blob;
    use pretty_assertions::assert_eq;

    fn body(text: &str) -> RecordBody {
        RecordBody::from_blob(&Blob::from(text), crate::codec::guid())
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let engine = MemoryEngine::new();
        let store = engine.open(&Schema::new("test")).await.unwrap();

        let id = store.put(body("Test"), None).await.unwrap();
        assert_eq!(id, RecordId::Auto(1));

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.data, b"Test".to_vec());
        assert!(store.get(&RecordId::Auto(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_key_generator() {
        let engine = MemoryEngine::new();
        let store = engine.open(&Schema::new("test")).await.unwrap();

        assert_eq!(store.put(body("a"), None).await.unwrap(), RecordId::Auto(1));
        assert_eq!(
            store.put(body("b"), Some(RecordId::Auto(10))).await.unwrap(),
            RecordId::Auto(10)
        );
        assert_eq!(store.put(body("c"), None).await.unwrap(), RecordId::Auto(11));

        // Named keys leave the generator alone
        store.put(body("d"), Some("x".into())).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.put(body("e"), None).await.unwrap(), RecordId::Auto(12));
    }

    #[tokio::test]
    async fn test_key_generator_exhaustion() {
        let engine = MemoryEngine::new();
        let store = engine.open(&Schema::new("test")).await.unwrap();

        store
            .put(body("max"), Some(RecordId::Auto(u64::MAX)))
            .await
            .unwrap();
        assert!(matches!(
            store.put(body("next"), None).await,
            Err(StoreError::Transaction(msg)) if msg.starts_with("ConstraintError")
        ));

        // The explicitly keyed record is untouched
        let record = store.get(&RecordId::Auto(u64::MAX)).await.unwrap().unwrap();
        assert_eq!(record.data, b"max".to_vec());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_key_generator_reaches_limit() {
        let engine = MemoryEngine::new();
        let store = engine.open(&Schema::new("test")).await.unwrap();

        store
            .put(body("a"), Some(RecordId::Auto(MAX_GENERATED_KEY - 1)))
            .await
            .unwrap();
        assert_eq!(
            store.put(body("b"), None).await.unwrap(),
            RecordId::Auto(MAX_GENERATED_KEY)
        );
        assert!(store.put(body("c"), None).await.is_err());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let engine = MemoryEngine::new();
        let store = engine.open(&Schema::new("test")).await.unwrap();

        store.put(body("old"), Some("k".into())).await.unwrap();
        store.put(body("new"), Some("k".into())).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let record = store.get(&"k".into()).await.unwrap().unwrap();
        assert_eq!(record.data, b"new".to_vec());
    }

    #[tokio::test]
    async fn test_all_in_key_order() {
        let engine = MemoryEngine::new();
        let store = engine.open(&Schema::new("test")).await.unwrap();

        store.put(body("named"), Some("a".into())).await.unwrap();
        store.put(body("first"), None).await.unwrap();
        store.put(body("second"), None).await.unwrap();

        let ids: Vec<RecordId> = store
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(
            ids,
            vec![RecordId::Auto(1), RecordId::Auto(2), RecordId::from("a")]
        );
    }

    #[tokio::test]
    async fn test_databases_persist_across_opens() {
        let engine = MemoryEngine::new();
        let first = engine.open(&Schema::new("test")).await.unwrap();
        first.put(body("Test"), None).await.unwrap();
        first.close();

        let second = engine.clone().open(&Schema::new("test")).await.unwrap();
        assert_eq!(second.count().await.unwrap(), 1);
        assert_eq!(engine.open_count(), 2);
        assert_eq!(engine.database_version("test"), Some(2));
    }

    #[tokio::test]
    async fn test_closed_connection_rejects_requests() {
        let engine = MemoryEngine::new();
        let store = engine.open(&Schema::new("test")).await.unwrap();
        store.close();

        assert!(matches!(
            store.count().await,
            Err(StoreError::Transaction(_))
        ));
    }

    #[tokio::test]
    async fn test_version_downgrade_fails() {
        let engine = MemoryEngine::new();
        engine.open(&Schema::new("test")).await.unwrap();

        let older = Schema {
            version: 1,
            ..Schema::new("test")
        };
        assert!(matches!(
            engine.open(&older).await,
            Err(StoreError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_unsupported_engine() {
        let engine = MemoryEngine::unsupported();
        assert!(matches!(
            engine.open(&Schema::new("test")).await,
            Err(StoreError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let engine = MemoryEngine::new();
        let store = engine.open(&Schema::new("test")).await.unwrap();

        engine.fail_requests("quota exceeded");
        let err = store.put(body("Test"), None).await.unwrap_err();
        assert_eq!(err, StoreError::Transaction("quota exceeded".into()));

        engine.recover();
        assert!(store.put(body("Test"), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_database() {
        let engine = MemoryEngine::new();
        engine.open(&Schema::new("a")).await.unwrap();
        engine.open(&Schema::new("b")).await.unwrap();
        assert_eq!(engine.database_names(), vec!["a", "b"]);

        engine.delete_database("a").await.unwrap();
        engine.delete_database("missing").await.unwrap();
        assert_eq!(engine.database_names(), vec!["b"]);
    }
}
