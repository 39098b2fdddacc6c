//! Format conversions between blobs, byte buffers, binary strings and data URLs.
//!
//! Everything here is pure and synchronous. The conversions that need the host
//! (reading a browser `Blob`, registering object URLs) live in `blobstore-wasm`
//! and delegate to these functions once the bytes are in memory.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::Blob;
use crate::storage::{StoreError, StoreResult};

/// Separator between the header and a base64 payload in a data URL.
pub const BASE64_MARKER: &str = ";base64,";

const DATA_URL_SCHEME: &str = "data:";

/// Standard alphabet, padding optional, like the browser's `atob`.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Blob contents plus the metadata persisted alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobJson {
    pub data: Vec<u8>,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
}

/// Copy the full contents of a blob into a byte buffer.
pub fn blob_to_bytes(blob: &Blob) -> Vec<u8> {
    blob.bytes().to_vec()
}

/// Reinterpret bytes as a binary string: every byte becomes the code point
/// of the same value (U+0000..=U+00FF).
pub fn bytes_to_binary_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Wrap bytes in a blob with an optional content type.
pub fn bytes_to_blob(bytes: impl Into<Vec<u8>>, mime_type: Option<&str>) -> Blob {
    let blob = Blob::new(bytes);
    match mime_type {
        Some(mime_type) => blob.with_type(mime_type),
        None => blob,
    }
}

/// Parse a `data:` URL into a blob.
///
/// A `;base64,` marker selects base64 decoding; otherwise the payload after
/// the first comma is taken byte for byte. For base64 URLs the content type
/// is the header up to the marker, for raw URLs it is the whole header
/// (parameters included).
pub fn data_url_to_blob(data_url: &str) -> StoreResult<Blob> {
    let rest = data_url
        .strip_prefix(DATA_URL_SCHEME)
        .ok_or_else(|| StoreError::Read("not a data URL".into()))?;

    if let Some((content_type, payload)) = rest.split_once(BASE64_MARKER) {
        let cleaned: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = LENIENT_BASE64
            .decode(cleaned.as_bytes())
            .map_err(|e| StoreError::Read(format!("invalid base64 payload: {}", e)))?;
        return Ok(Blob::new(bytes).with_type(content_type));
    }

    let (content_type, raw) = rest
        .split_once(',')
        .ok_or_else(|| StoreError::Read("data URL has no payload separator".into()))?;
    Ok(Blob::new(raw.as_bytes()).with_type(content_type))
}

/// Extract a blob's contents and metadata.
///
/// Anonymous blobs get an empty name; blobs without a last-modified time are
/// dated now.
pub fn blob_to_json(blob: &Blob) -> BlobJson {
    BlobJson {
        data: blob_to_bytes(blob),
        mime_type: blob.mime_type().to_string(),
        name: blob.name().to_string(),
        date: blob.last_modified().unwrap_or_else(Utc::now),
    }
}

/// Generate a random GUID of the form `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
pub fn guid() -> String {
    uuid::Uuid::new_v4().hyphenated().to_string()
}

/// Shallow-merge JSON objects into `target`; later sources win.
///
/// A non-object `target` starts from an empty object, and non-object sources
/// are skipped.
pub fn extend<I>(target: Value, sources: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    let mut merged = match target {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for source in sources {
        if let Value::Object(map) = source {
            merged.extend(map);
        }
    }
    Value::Object(merged)
}
