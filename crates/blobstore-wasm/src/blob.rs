//! Host `Blob` <-> core blob conversion

use blobstore_core::{Blob, StoreError, StoreResult};
use blobstore_indexeddb::error::js_error_message;
use chrono::{DateTime, TimeZone, Utc};
use js_sys::{ArrayBuffer, DataView, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// Read the full contents and metadata of a host blob.
///
/// Files keep their name and last-modified time.
pub async fn read_blob(blob: &web_sys::Blob) -> StoreResult<Blob> {
    let buffer = JsFuture::from(blob.array_buffer())
        .await
        .map_err(|e| StoreError::Read(js_error_message(&e)))?;
    let mut out = Blob::new(Uint8Array::new(&buffer).to_vec()).with_type(blob.type_());

    if let Some(file) = blob.dyn_ref::<web_sys::File>() {
        out = out.with_name(file.name());
        if let Some(modified) = from_millis(file.last_modified()) {
            out = out.with_last_modified(modified);
        }
    }
    Ok(out)
}

/// Build a host blob from bytes with an optional content type.
pub fn to_host_blob(bytes: &[u8], mime_type: Option<&str>) -> StoreResult<web_sys::Blob> {
    let parts = js_sys::Array::of1(&Uint8Array::from(bytes));
    let bag = web_sys::BlobPropertyBag::new();
    if let Some(mime_type) = mime_type.filter(|t| !t.is_empty()) {
        js_sys::Reflect::set(&bag, &"type".into(), &JsValue::from_str(mime_type))
            .map_err(|e| StoreError::Read(js_error_message(&e)))?;
    }
    web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &bag)
        .map_err(|e| StoreError::Read(js_error_message(&e)))
}

/// Accept anything a caller may hand to `save`: a `Blob`/`File`, an
/// `ArrayBuffer`, a typed array or a string.
pub async fn from_js_input(value: &JsValue) -> StoreResult<Blob> {
    if let Some(blob) = value.dyn_ref::<web_sys::Blob>() {
        return read_blob(blob).await;
    }
    if value.is_instance_of::<ArrayBuffer>() || ArrayBuffer::is_view(value) {
        return buffer_bytes(value).map(Blob::new);
    }
    if let Some(text) = value.as_string() {
        return Ok(Blob::from(text));
    }
    Err(StoreError::Read(format!(
        "cannot store value of type {}",
        value.js_typeof().as_string().unwrap_or_default()
    )))
}

/// Copy the bytes behind an `ArrayBuffer` or any view on one (typed array
/// or `DataView`), honouring the view's offset and byte length.
pub fn buffer_bytes(value: &JsValue) -> StoreResult<Vec<u8>> {
    if value.is_instance_of::<ArrayBuffer>() {
        return Ok(Uint8Array::new(value).to_vec());
    }
    if ArrayBuffer::is_view(value) {
        // Every view exposes buffer/byteOffset/byteLength like a DataView
        let view = value.unchecked_ref::<DataView>();
        let bytes = Uint8Array::new_with_byte_offset_and_length(
            &view.buffer(),
            view.byte_offset() as u32,
            view.byte_length() as u32,
        );
        return Ok(bytes.to_vec());
    }
    Err(StoreError::Read(format!(
        "expected an ArrayBuffer or view, got {}",
        value.js_typeof().as_string().unwrap_or_default()
    )))
}

fn from_millis(millis: f64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis as i64).single()
}
