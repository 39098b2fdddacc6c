//! Object store connection implementing the `ObjectStore` contract.
//!
//! Each request opens its own transaction on the shared database handle and
//! resolves only after that transaction completes.

use async_trait::async_trait;
use blobstore_core::{ObjectStore, Record, RecordBody, RecordId, StoreError, StoreResult};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{IdbCursorWithValue, IdbDatabase, IdbTransactionMode};

use crate::convert;
use crate::error::js_error_message;
use crate::idb;

fn request_failed(op: &str, e: JsValue) -> StoreError {
    StoreError::Transaction(format!("IDB {}: {}", op, js_error_message(&e)))
}

/// Open connection to the blob object store of one IndexedDB database.
#[derive(Debug)]
pub struct IndexedDbObjectStore {
    db: IdbDatabase,
    store_name: String,
}

impl IndexedDbObjectStore {
    pub fn new(db: IdbDatabase, store_name: String) -> Self {
        Self { db, store_name }
    }

    /// Name of the underlying database.
    pub fn db_name(&self) -> String {
        self.db.name()
    }
}

#[async_trait(?Send)]
impl ObjectStore for IndexedDbObjectStore {
    async fn put(&self, body: RecordBody, key: Option<RecordId>) -> StoreResult<RecordId> {
        let js_val = convert::body_to_js(&body)?;

        let (tx, store) =
            idb::begin_transaction(&self.db, &self.store_name, IdbTransactionMode::Readwrite)?;

        let req = match &key {
            Some(key) => store.put_with_key(&js_val, &convert::key_to_js(key)),
            None => store.put(&js_val),
        }
        .map_err(|e| request_failed("put", e))?;

        let result = idb::await_request(&req).await?;
        idb::await_transaction(&tx).await?;

        let id = convert::js_to_key(&result)?;
        debug!("IDB put {} ({} bytes)", id, body.data.len());
        Ok(id)
    }

    async fn get(&self, key: &RecordId) -> StoreResult<Option<Record>> {
        let (tx, store) =
            idb::begin_transaction(&self.db, &self.store_name, IdbTransactionMode::Readonly)?;

        let js_key = convert::key_to_js(key);
        let req = store.get(&js_key).map_err(|e| request_failed("get", e))?;

        let result = idb::await_request(&req).await?;
        idb::await_transaction(&tx).await?;

        if result.is_undefined() || result.is_null() {
            return Ok(None);
        }

        Ok(Some(convert::js_to_record(&js_key, &result)?))
    }

    async fn all(&self) -> StoreResult<Vec<Record>> {
        let (tx, store) =
            idb::begin_transaction(&self.db, &self.store_name, IdbTransactionMode::Readonly)?;

        let req = store
            .open_cursor()
            .map_err(|e| request_failed("openCursor", e))?;

        // The cursor request fires success once per step, then once with null
        let mut records = Vec::new();
        loop {
            let result = idb::await_request(&req).await?;
            if result.is_undefined() || result.is_null() {
                break;
            }

            let cursor: IdbCursorWithValue = result
                .dyn_into()
                .map_err(|_| StoreError::Serialization("cursor result is not a cursor".into()))?;
            let key = cursor
                .primary_key()
                .map_err(|e| request_failed("cursor key", e))?;
            let value = cursor
                .value()
                .map_err(|e| request_failed("cursor value", e))?;
            records.push(convert::js_to_record(&key, &value)?);

            cursor
                .continue_()
                .map_err(|e| request_failed("cursor continue", e))?;
        }
        idb::await_transaction(&tx).await?;

        Ok(records)
    }

    async fn count(&self) -> StoreResult<usize> {
        let (tx, store) =
            idb::begin_transaction(&self.db, &self.store_name, IdbTransactionMode::Readonly)?;

        let req = store.count().map_err(|e| request_failed("count", e))?;

        let result = idb::await_request(&req).await?;
        idb::await_transaction(&tx).await?;

        Ok(convert::js_to_count(&result)?)
    }

    async fn clear(&self) -> StoreResult<()> {
        let (tx, store) =
            idb::begin_transaction(&self.db, &self.store_name, IdbTransactionMode::Readwrite)?;

        let req = store.clear().map_err(|e| request_failed("clear", e))?;

        idb::await_request(&req).await?;
        idb::await_transaction(&tx).await?;

        Ok(())
    }

    fn close(&self) {
        self.db.close();
    }
}
