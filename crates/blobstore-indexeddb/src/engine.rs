//! The IndexedDB storage engine.

use async_trait::async_trait;
use blobstore_core::{Schema, StorageEngine, StoreResult};
use tracing::debug;
use web_sys::IdbFactory;

use crate::error::{IndexedDbError, Result};
use crate::idb;
use crate::store::IndexedDbObjectStore;

/// IndexedDB-backed storage engine for browser WASM.
///
/// The host factory is resolved once, when the engine is built. A missing
/// factory is remembered rather than reported, so building never fails; every
/// `open` then returns `StoreError::Unsupported`.
#[derive(Debug, Clone)]
pub struct IndexedDbEngine {
    factory: Option<IdbFactory>,
}

impl IndexedDbEngine {
    /// Resolve the factory from the global object.
    pub fn detect() -> Self {
        let factory = idb::resolve_factory();
        debug!("IndexedDB factory available: {}", factory.is_some());
        Self { factory }
    }

    /// Use an explicit factory, e.g. one handed over from JS.
    pub fn with_factory(factory: IdbFactory) -> Self {
        Self {
            factory: Some(factory),
        }
    }

    pub fn is_available(&self) -> bool {
        self.factory.is_some()
    }

    fn factory(&self) -> Result<&IdbFactory> {
        self.factory.as_ref().ok_or_else(|| {
            IndexedDbError::NotAvailable("IndexedDB does not seem to be supported in this environment".into())
        })
    }
}

#[async_trait(?Send)]
impl StorageEngine for IndexedDbEngine {
    type Store = IndexedDbObjectStore;

    async fn open(&self, schema: &Schema) -> StoreResult<IndexedDbObjectStore> {
        let db = idb::open_database(self.factory()?, schema).await?;
        Ok(IndexedDbObjectStore::new(db, schema.store_name.clone()))
    }

    async fn delete_database(&self, db_name: &str) -> StoreResult<()> {
        idb::delete_database(self.factory()?, db_name).await?;
        Ok(())
    }
}
