//! Store configuration

use serde::{Deserialize, Serialize};

/// Database name used when none is configured.
pub const DEFAULT_DB_NAME: &str = "DEFAULT";

/// The single object store every database holds.
pub const STORE_NAME: &str = "store";

/// Schema version the database is opened at.
pub const DB_VERSION: u32 = 2;

/// Options accepted when constructing a `BlobStore`.
///
/// Deserializes from the JS-style options object `{ "dbName": "..." }`;
/// missing fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreOptions {
    pub db_name: Option<String>,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    /// The configured database name, or [`DEFAULT_DB_NAME`] when unset or empty.
    pub fn resolved_db_name(&self) -> &str {
        match self.db_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_DB_NAME,
        }
    }
}
