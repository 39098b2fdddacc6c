//! Storage engine abstraction
//!
//! This module defines the capability traits the blob store is written
//! against, so the host storage engine is injected rather than discovered.
//! Implementations exist for:
//!
//! - **Memory**: In-memory engine for testing (`MemoryEngine`)
//! - **IndexedDB**: Browser storage via web-sys (separate crate, WASM only)
//!
//! # Example
//!
//! ```rust
//! use blobstore_core::storage::{MemoryEngine, ObjectStore, Schema, StorageEngine};
//! use blobstore_core::{Blob, RecordBody, RecordId};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let engine = MemoryEngine::new();
//! let store = engine.open(&Schema::new("example")).await.unwrap();
//!
//! let body = RecordBody::from_blob(&Blob::from("Test"), "guid-1");
//! let id = store.put(body, None).await.unwrap();
//! assert_eq!(id, RecordId::Auto(1));
//! assert_eq!(store.count().await.unwrap(), 1);
//! # });
//! ```

mod error;
mod memory;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryEngine, MemoryObjectStore};
pub use traits::{ObjectStore, Schema, StorageEngine};
