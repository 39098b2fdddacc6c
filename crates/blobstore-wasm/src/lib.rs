//! Blob store WASM bridge
//!
//! Browser bindings using wasm-bindgen over the IndexedDB engine:
//! - `IndexedDBStore`: promise-returning CRUD class bound to one database
//! - Blob utilities: conversions between host `Blob`s, `ArrayBuffer`s,
//!   binary strings, data URLs and object URLs
//!
//! Every fallible export rejects (or throws) with a JS `Error` whose `name`
//! is one of `StorageUnsupported`, `ConnectionError`, `TransactionError`,
//! `ReadError` or `SerializationError`.

pub mod blob;
pub mod logging;
pub mod store;
pub mod utils;

pub use store::JsBlobStore;

use blobstore_core::StoreError;
use wasm_bindgen::JsValue;

/// Convert a store error into a JS `Error` tagged with its kind.
pub(crate) fn to_js_error(err: StoreError) -> JsValue {
    let name = match &err {
        StoreError::Unsupported(_) => "StorageUnsupported",
        StoreError::Connection(_) => "ConnectionError",
        StoreError::Transaction(_) => "TransactionError",
        StoreError::Read(_) => "ReadError",
        StoreError::Serialization(_) => "SerializationError",
    };
    let error = js_sys::Error::new(&err.to_string());
    error.set_name(name);
    error.into()
}
