//! IndexedDB storage engine for the blob store (browser WASM)
//!
//! This crate implements the `StorageEngine` and `ObjectStore` traits from
//! blobstore-core on top of the browser's IndexedDB, so a `BlobStore` can
//! persist records in the page's origin storage.
//!
//! # Schema
//!
//! Each database holds one object store, `"store"`, with an auto-incrementing
//! out-of-line key and no indexes. Records are plain JS objects:
//! `{ guid, data: ArrayBuffer, type, name, date }`, with `date` in
//! milliseconds since epoch.
//!
//! # Example
//!
//! ```rust,ignore
//! use blobstore_core::{BlobStore, StoreOptions};
//! use blobstore_indexeddb::IndexedDbEngine;
//!
//! // Resolve the host engine once; a missing engine surfaces on first use
//! let engine = IndexedDbEngine::detect();
//! let store = BlobStore::new(engine, StoreOptions::new().with_db_name("files"));
//!
//! let id = store.save("Test").await?;
//! assert_eq!(store.get_as_string(&id).await?.as_deref(), Some("Test"));
//! ```

pub mod convert;
pub mod engine;
pub mod error;
pub mod idb;
pub mod store;

pub use engine::IndexedDbEngine;
pub use error::{IndexedDbError, Result};
pub use store::IndexedDbObjectStore;
