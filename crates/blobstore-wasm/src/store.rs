//! `IndexedDBStore` JS class
//!
//! Thin promise-returning wrapper over `BlobStore<IndexedDbEngine>`. Records
//! cross the boundary as plain objects `{ id, guid, data, type, name, date }`
//! and keys as numbers (generated) or strings (caller-supplied).

use std::rc::Rc;

use blobstore_core::{Blob, BlobStore, Record, RecordId, StoreError, StoreOptions, StoreResult};
use blobstore_indexeddb::{convert, IndexedDbEngine};
use js_sys::{Array, Promise};
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::blob::from_js_input;
use crate::to_js_error;

/// Promise-based blob store bound to one IndexedDB database.
///
/// ```js
/// const store = new IndexedDBStore({ dbName: "files" });
/// const id = await store.save(file);
/// const record = await store.get(id);
/// ```
#[wasm_bindgen(js_name = IndexedDBStore)]
pub struct JsBlobStore {
    inner: Rc<BlobStore<IndexedDbEngine>>,
}

#[wasm_bindgen(js_class = IndexedDBStore)]
impl JsBlobStore {
    /// Bind to `options.dbName` (default `"DEFAULT"`) and start connecting.
    /// Never throws; a missing IndexedDB surfaces as a `StorageUnsupported`
    /// rejection on first use.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> JsBlobStore {
        console_error_panic_hook::set_once();

        let options = if options.is_undefined() || options.is_null() {
            StoreOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options).unwrap_or_else(|e| {
                warn!("ignoring malformed store options: {}", e);
                StoreOptions::default()
            })
        };

        let inner = Rc::new(BlobStore::new(IndexedDbEngine::detect(), options));

        // Start connecting right away; a failure is reported by the first call
        let connecting = inner.clone();
        spawn_local(async move {
            if let Err(e) = connecting.connect().await {
                warn!("background connect to '{}' failed: {}", connecting.name(), e);
            }
        });

        JsBlobStore { inner }
    }

    /// Database name in use.
    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    /// Open the connection now. Resolves with `undefined`.
    pub fn connect(&self) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            inner.connect().await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Close the connection. The next call reopens it.
    pub fn close(&self) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            inner.close().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Resolve with every record, in key order.
    pub fn all(&self) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let records = inner.all().await.map_err(to_js_error)?;
            records_to_js(records).map_err(to_js_error)
        })
    }

    /// `save(data)`, `save([data, ...])` or `save(id, data)`.
    ///
    /// Resolves with the key, or an array of keys for array input.
    pub fn save(&self, first: JsValue, second: JsValue) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            match SaveArgs::parse(first, second).map_err(to_js_error)? {
                SaveArgs::One(data) => {
                    let blob = from_js_input(&data).await.map_err(to_js_error)?;
                    let id = inner.save(blob).await.map_err(to_js_error)?;
                    Ok(convert::key_to_js(&id))
                }
                SaveArgs::Keyed(id, data) => {
                    let blob = from_js_input(&data).await.map_err(to_js_error)?;
                    let id = inner.save_with_id(id, blob).await.map_err(to_js_error)?;
                    Ok(convert::key_to_js(&id))
                }
                SaveArgs::Many(items) => {
                    let blobs = read_inputs(&items).await.map_err(to_js_error)?;
                    let ids = inner.save_many(blobs).await.map_err(to_js_error)?;
                    Ok(ids.iter().map(convert::key_to_js).collect::<Array>().into())
                }
            }
        })
    }

    /// Like `save`, but resolves with the stored record(s).
    pub fn create(&self, first: JsValue, second: JsValue) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            match SaveArgs::parse(first, second).map_err(to_js_error)? {
                SaveArgs::One(data) => {
                    let blob = from_js_input(&data).await.map_err(to_js_error)?;
                    let record = inner.create(blob).await.map_err(to_js_error)?;
                    record_to_js(record).map_err(to_js_error)
                }
                SaveArgs::Keyed(id, data) => {
                    let blob = from_js_input(&data).await.map_err(to_js_error)?;
                    let record = inner.create_with_id(id, blob).await.map_err(to_js_error)?;
                    record_to_js(record).map_err(to_js_error)
                }
                SaveArgs::Many(items) => {
                    let blobs = read_inputs(&items).await.map_err(to_js_error)?;
                    let records = inner.create_many(blobs).await.map_err(to_js_error)?;
                    records_to_js(records).map_err(to_js_error)
                }
            }
        })
    }

    /// Resolve with the record for `id` (or `undefined`), or with an array of
    /// records for an array of ids.
    pub fn get(&self, id: JsValue) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            if Array::is_array(&id) {
                let ids = keys_from_js(&Array::from(&id)).map_err(to_js_error)?;
                let records = inner.get_many(&ids).await.map_err(to_js_error)?;
                let out = Array::new();
                for record in records {
                    out.push(&optional_record_to_js(record).map_err(to_js_error)?);
                }
                return Ok(out.into());
            }

            let id = key_from_js(&id).map_err(to_js_error)?;
            let record = inner.get(&id).await.map_err(to_js_error)?;
            optional_record_to_js(record).map_err(to_js_error)
        })
    }

    /// Resolve with the payload of `id` as a binary string, or `undefined`.
    #[wasm_bindgen(js_name = getAsString)]
    pub fn get_as_string(&self, id: JsValue) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let id = key_from_js(&id).map_err(to_js_error)?;
            let text = inner.get_as_string(&id).await.map_err(to_js_error)?;
            Ok(text.map(JsValue::from).unwrap_or(JsValue::UNDEFINED))
        })
    }

    /// Resolve with the number of stored records.
    pub fn size(&self) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let count = inner.size().await.map_err(to_js_error)?;
            Ok(JsValue::from_f64(count as f64))
        })
    }

    /// Delete every record. Resolves with `undefined`.
    pub fn clear(&self) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            inner.clear().await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }
}

enum SaveArgs {
    One(JsValue),
    Keyed(RecordId, JsValue),
    Many(Array),
}

impl SaveArgs {
    fn parse(first: JsValue, second: JsValue) -> StoreResult<Self> {
        if !second.is_undefined() {
            return Ok(SaveArgs::Keyed(key_from_js(&first)?, second));
        }
        if Array::is_array(&first) {
            return Ok(SaveArgs::Many(Array::from(&first)));
        }
        Ok(SaveArgs::One(first))
    }
}

async fn read_inputs(items: &Array) -> StoreResult<Vec<Blob>> {
    let mut blobs = Vec::with_capacity(items.length() as usize);
    for item in items.iter() {
        blobs.push(from_js_input(&item).await?);
    }
    Ok(blobs)
}

fn key_from_js(value: &JsValue) -> StoreResult<RecordId> {
    convert::js_to_key(value).map_err(|e| StoreError::Read(e.to_string()))
}

fn keys_from_js(values: &Array) -> StoreResult<Vec<RecordId>> {
    values.iter().map(|v| key_from_js(&v)).collect()
}

fn record_to_js(record: Record) -> StoreResult<JsValue> {
    let (id, body) = record.into_parts();
    let obj = convert::body_to_js(&body)?;
    js_sys::Reflect::set(&obj, &"id".into(), &convert::key_to_js(&id))
        .map_err(|_| StoreError::Serialization("failed to set property: id".into()))?;
    Ok(obj)
}

fn optional_record_to_js(record: Option<Record>) -> StoreResult<JsValue> {
    match record {
        Some(record) => record_to_js(record),
        None => Ok(JsValue::UNDEFINED),
    }
}

fn records_to_js(records: Vec<Record>) -> StoreResult<JsValue> {
    let out = Array::new();
    for record in records {
        out.push(&record_to_js(record)?);
    }
    Ok(out.into())
}
