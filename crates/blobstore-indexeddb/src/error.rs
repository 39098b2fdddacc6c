//! Error types for the IndexedDB storage engine

use blobstore_core::StoreError;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Result type for IndexedDB operations
pub type Result<T> = std::result::Result<T, IndexedDbError>;

/// Errors that can occur during IndexedDB storage operations
#[derive(Debug, Error)]
pub enum IndexedDbError {
    /// IndexedDB is not available in this environment
    #[error("IndexedDB not available: {0}")]
    NotAvailable(String),

    /// Database open/upgrade error
    #[error("IndexedDB open error: {0}")]
    Open(String),

    /// Transaction error
    #[error("IndexedDB transaction error: {0}")]
    Transaction(String),

    /// Request error from IDB operation
    #[error("IndexedDB request error: {0}")]
    Request(String),

    /// JavaScript value conversion error
    #[error("JS conversion error: {0}")]
    JsValue(String),
}

impl From<JsValue> for IndexedDbError {
    fn from(val: JsValue) -> Self {
        IndexedDbError::Request(js_error_message(&val))
    }
}

/// Convert IndexedDbError to StoreError for the engine traits
impl From<IndexedDbError> for StoreError {
    fn from(err: IndexedDbError) -> Self {
        match err {
            IndexedDbError::NotAvailable(msg) => StoreError::Unsupported(msg),
            IndexedDbError::Open(msg) => StoreError::Connection(msg),
            IndexedDbError::Transaction(msg) | IndexedDbError::Request(msg) => {
                StoreError::Transaction(msg)
            }
            IndexedDbError::JsValue(msg) => StoreError::Serialization(msg),
        }
    }
}

/// Render a thrown or rejected JS value as `Name: message` where possible.
pub fn js_error_message(val: &JsValue) -> String {
    if let Some(ex) = val.dyn_ref::<web_sys::DomException>() {
        return format!("{}: {}", ex.name(), ex.message());
    }
    if let Some(err) = val.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    if let Some(s) = val.as_string() {
        return s;
    }
    js_sys::JSON::stringify(val)
        .map(String::from)
        .unwrap_or_else(|_| format!("{:?}", val))
}
