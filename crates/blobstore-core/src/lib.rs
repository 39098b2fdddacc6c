//! Blob store core
//!
//! This crate provides the engine-independent half of the blob store, designed
//! to run identically in browser (WASM) and native environments:
//!
//! - [`codec`] - conversions between blobs, byte buffers, binary strings and data URLs
//! - [`record`] - the persisted record shape and its key type
//! - [`storage`] - the storage engine capability traits and an in-memory engine
//! - [`store`] - `BlobStore`, the CRUD wrapper over a single auto-keyed object store
//!
//! The browser IndexedDB engine lives in the `blobstore-indexeddb` crate.
//!
//! # Example
//!
//! ```rust
//! use blobstore_core::{Blob, BlobStore, MemoryEngine, StoreOptions};
//!
//! # tokio_test_block_on(async {
//! let store = BlobStore::new(MemoryEngine::new(), StoreOptions::default());
//! assert_eq!(store.name(), "DEFAULT");
//!
//! let id = store.save(Blob::from("Test").with_type("text/plain")).await?;
//! assert_eq!(store.get_as_string(&id).await?.as_deref(), Some("Test"));
//! assert_eq!(store.size().await?, 1);
//! # Ok::<(), blobstore_core::StoreError>(())
//! # }).unwrap();
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod codec;
pub mod logging;
pub mod options;
pub mod record;
pub mod storage;
pub mod store;

// Re-export main types at crate root
pub use codec::BlobJson;
pub use options::{StoreOptions, DB_VERSION, DEFAULT_DB_NAME, STORE_NAME};
pub use record::{Blob, Record, RecordBody, RecordId};
pub use storage::{MemoryEngine, ObjectStore, Schema, StorageEngine, StoreError, StoreResult};
pub use store::{BlobStore, Connector};
