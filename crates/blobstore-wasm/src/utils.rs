//! Blob utilities exported to JS
//!
//! Host-facing counterparts of `blobstore_core::codec`. Conversions that read
//! a whole blob are asynchronous and return a Promise.

use blobstore_core::{codec, StoreError};
use blobstore_indexeddb::convert::bytes_to_array_buffer;
use blobstore_indexeddb::error::js_error_message;
use js_sys::Promise;
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::blob::{buffer_bytes, read_blob, to_host_blob};
use crate::to_js_error;

/// Read a blob's full contents. Resolves with an `ArrayBuffer`.
#[wasm_bindgen(js_name = blobToArrayBuffer)]
pub fn blob_to_array_buffer(blob: web_sys::Blob) -> Promise {
    future_to_promise(async move {
        let blob = read_blob(&blob).await.map_err(to_js_error)?;
        Ok(bytes_to_array_buffer(blob.bytes()))
    })
}

/// Reinterpret an `ArrayBuffer` (or typed array) as a binary string.
/// Resolves with the string.
#[wasm_bindgen(js_name = arrayBufferToBinaryString)]
pub fn array_buffer_to_binary_string(buffer: JsValue) -> Promise {
    match buffer_bytes(&buffer) {
        Ok(bytes) => {
            Promise::resolve(&JsValue::from_str(&codec::bytes_to_binary_string(&bytes)))
        }
        Err(e) => Promise::reject(&to_js_error(e)),
    }
}

/// Wrap an `ArrayBuffer` (or typed array) in a blob with an optional
/// content type.
#[wasm_bindgen(js_name = arrayBufferToBlob)]
pub fn array_buffer_to_blob(
    buffer: JsValue,
    mime_type: Option<String>,
) -> Result<web_sys::Blob, JsValue> {
    let bytes = buffer_bytes(&buffer).map_err(to_js_error)?;
    to_host_blob(&bytes, mime_type.as_deref()).map_err(to_js_error)
}

/// Register a revocable object URL for a blob, an `ArrayBuffer` or any other
/// data (wrapped in a blob first).
///
/// The URL stays registered until passed to `revokeObjectURL`.
#[wasm_bindgen(js_name = toObjectURL)]
pub fn to_object_url(data: JsValue, mime_type: Option<String>) -> Result<String, JsValue> {
    let blob = if let Some(blob) = data.dyn_ref::<web_sys::Blob>() {
        blob.clone()
    } else if data.is_instance_of::<js_sys::ArrayBuffer>() || js_sys::ArrayBuffer::is_view(&data)
    {
        let bytes = buffer_bytes(&data).map_err(to_js_error)?;
        to_host_blob(&bytes, mime_type.as_deref()).map_err(to_js_error)?
    } else {
        let bag = web_sys::BlobPropertyBag::new();
        if let Some(mime_type) = mime_type.as_deref() {
            js_sys::Reflect::set(&bag, &"type".into(), &JsValue::from_str(mime_type))?;
        }
        web_sys::Blob::new_with_str_sequence_and_options(&js_sys::Array::of1(&data), &bag)?
    };

    web_sys::Url::create_object_url_with_blob(&blob)
        .map_err(|e| to_js_error(StoreError::Read(js_error_message(&e))))
}

/// Release an object URL created by `toObjectURL`.
#[wasm_bindgen(js_name = revokeObjectURL)]
pub fn revoke_object_url(url: &str) -> Result<(), JsValue> {
    web_sys::Url::revoke_object_url(url)
}

/// Parse a `data:` URL (base64 or raw) into a blob.
#[wasm_bindgen(js_name = dataURLToBlob)]
pub fn data_url_to_blob(data_url: &str) -> Result<web_sys::Blob, JsValue> {
    let blob = codec::data_url_to_blob(data_url).map_err(to_js_error)?;
    to_host_blob(blob.bytes(), Some(blob.mime_type())).map_err(to_js_error)
}

/// Read a blob into `{ data: ArrayBuffer, type, name, date }`.
#[wasm_bindgen(js_name = blobToJSON)]
pub fn blob_to_json(blob: web_sys::Blob) -> Promise {
    future_to_promise(async move {
        let blob = read_blob(&blob).await.map_err(to_js_error)?;
        let json = codec::blob_to_json(&blob);

        let obj = js_sys::Object::new();
        js_sys::Reflect::set(&obj, &"data".into(), &bytes_to_array_buffer(&json.data))?;
        js_sys::Reflect::set(&obj, &"type".into(), &JsValue::from_str(&json.mime_type))?;
        js_sys::Reflect::set(&obj, &"name".into(), &JsValue::from_str(&json.name))?;
        js_sys::Reflect::set(
            &obj,
            &"date".into(),
            &JsValue::from_f64(json.date.timestamp_millis() as f64),
        )?;
        Ok(obj.into())
    })
}

/// Generate a random GUID (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).
#[wasm_bindgen]
pub fn guid() -> String {
    codec::guid()
}

/// Shallow-merge plain objects: `extend(target, [source, ...])`.
/// Later sources overwrite earlier keys.
#[wasm_bindgen]
pub fn extend(target: JsValue, sources: Vec<JsValue>) -> Result<JsValue, JsValue> {
    let target: serde_json::Value = serde_wasm_bindgen::from_value(target)?;
    let sources = sources
        .into_iter()
        .map(serde_wasm_bindgen::from_value)
        .collect::<Result<Vec<serde_json::Value>, _>>()?;

    let merged = codec::extend(target, sources);
    Ok(merged.serialize(&Serializer::json_compatible())?)
}
