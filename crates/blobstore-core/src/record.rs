//! Record model
//!
//! A [`Blob`] is what callers hand in; a [`RecordBody`] is what gets persisted;
//! a [`Record`] is a persisted body together with its key.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec;

/// Key of a stored record.
///
/// `Auto` keys come from the store's key generator, `Named` keys are supplied
/// by the caller (usually a GUID). All `Auto` keys order before all `Named`
/// keys, matching the IndexedDB key ordering of numbers before strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Auto(u64),
    Named(String),
}

impl RecordId {
    /// The generated key, if this is one.
    pub fn as_auto(&self) -> Option<u64> {
        match self {
            RecordId::Auto(key) => Some(*key),
            RecordId::Named(_) => None,
        }
    }

    /// The caller-supplied key, if this is one.
    pub fn as_named(&self) -> Option<&str> {
        match self {
            RecordId::Auto(_) => None,
            RecordId::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Auto(key) => write!(f, "{}", key),
            RecordId::Named(name) => f.write_str(name),
        }
    }
}

impl From<u64> for RecordId {
    fn from(key: u64) -> Self {
        RecordId::Auto(key)
    }
}

impl From<String> for RecordId {
    fn from(name: String) -> Self {
        RecordId::Named(name)
    }
}

impl From<&str> for RecordId {
    fn from(name: &str) -> Self {
        RecordId::Named(name.to_string())
    }
}

/// Immutable binary data with a content-type tag.
///
/// Anonymous data has an empty name; data read from a file carries the file
/// name and, optionally, its last-modified time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    bytes: Vec<u8>,
    mime_type: String,
    name: String,
    last_modified: Option<DateTime<Utc>>,
}

impl Blob {
    /// Create an untyped, anonymous blob.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// MIME type, empty when untyped.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&str> for Blob {
    fn from(text: &str) -> Self {
        Blob::new(text.as_bytes())
    }
}

impl From<String> for Blob {
    fn from(text: String) -> Self {
        Blob::new(text.into_bytes())
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Blob::new(bytes)
    }
}

impl From<&[u8]> for Blob {
    fn from(bytes: &[u8]) -> Self {
        Blob::new(bytes)
    }
}

/// The persisted shape of a record, without its key.
///
/// Serialized field names match what is written to the host store:
/// `guid`, `data`, `type`, `name`, `date` (milliseconds since epoch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordBody {
    pub guid: String,
    pub data: Vec<u8>,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
}

impl RecordBody {
    /// Marshal a blob into the persisted shape under the given GUID.
    pub fn from_blob(blob: &Blob, guid: impl Into<String>) -> Self {
        let json = codec::blob_to_json(blob);
        Self {
            guid: guid.into(),
            data: json.data,
            mime_type: json.mime_type,
            name: json.name,
            date: json.date,
        }
    }
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub guid: String,
    pub data: Vec<u8>,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
}

impl Record {
    pub fn from_body(id: RecordId, body: RecordBody) -> Self {
        Self {
            id,
            guid: body.guid,
            data: body.data,
            mime_type: body.mime_type,
            name: body.name,
            date: body.date,
        }
    }

    /// Split into key and persisted body.
    pub fn into_parts(self) -> (RecordId, RecordBody) {
        (
            self.id,
            RecordBody {
                guid: self.guid,
                data: self.data,
                mime_type: self.mime_type,
                name: self.name,
                date: self.date,
            },
        )
    }

    /// Rebuild a blob carrying this record's payload and metadata.
    pub fn to_blob(&self) -> Blob {
        Blob::new(self.data.clone())
            .with_type(self.mime_type.clone())
            .with_name(self.name.clone())
            .with_last_modified(self.date)
    }

    /// Payload decoded as a binary string.
    pub fn data_as_binary_string(&self) -> String {
        codec::bytes_to_binary_string(&self.data)
    }
}
