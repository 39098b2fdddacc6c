//! JS <-> record conversion
//!
//! Records are stored as plain objects so that any IndexedDB client can read
//! them: `data` is an `ArrayBuffer`, `date` a number of milliseconds.

use blobstore_core::{Record, RecordBody, RecordId};
use chrono::{DateTime, TimeZone, Utc};
use wasm_bindgen::{JsCast, JsValue};

use crate::error::{IndexedDbError, Result};

/// Convert a record body to a JS object for IndexedDB storage.
pub fn body_to_js(body: &RecordBody) -> Result<JsValue> {
    let obj = js_sys::Object::new();

    set_prop(&obj, "guid", &JsValue::from_str(&body.guid))?;
    set_prop(&obj, "data", &bytes_to_array_buffer(&body.data))?;
    set_prop(&obj, "type", &JsValue::from_str(&body.mime_type))?;
    set_prop(&obj, "name", &JsValue::from_str(&body.name))?;
    set_prop(
        &obj,
        "date",
        &JsValue::from_f64(body.date.timestamp_millis() as f64),
    )?;

    Ok(obj.into())
}

/// Convert a stored JS object and its key back to a record.
///
/// Objects written by older clients may lack `guid`, `name` or `date`;
/// those fall back to empty strings and the epoch.
pub fn js_to_record(key: &JsValue, val: &JsValue) -> Result<Record> {
    let id = js_to_key(key)?;

    let data = get_prop(val, "data")?;
    if data.is_undefined() || data.is_null() {
        return Err(IndexedDbError::JsValue(format!("record {} has no data", id)));
    }

    let body = RecordBody {
        guid: get_string_prop(val, "guid")?,
        data: js_sys::Uint8Array::new(&data).to_vec(),
        mime_type: get_string_prop(val, "type")?,
        name: get_string_prop(val, "name")?,
        date: js_to_date(&get_prop(val, "date")?)?,
    };
    Ok(Record::from_body(id, body))
}

/// Convert a record key to a JS key.
pub fn key_to_js(key: &RecordId) -> JsValue {
    match key {
        RecordId::Auto(n) => JsValue::from_f64(*n as f64),
        RecordId::Named(name) => JsValue::from_str(name),
    }
}

/// Convert a JS key to a record key.
pub fn js_to_key(key: &JsValue) -> Result<RecordId> {
    if let Some(n) = key.as_f64() {
        if n >= 0.0 && n.fract() == 0.0 {
            return Ok(RecordId::Auto(n as u64));
        }
        return Err(IndexedDbError::JsValue(format!(
            "unsupported numeric key: {}",
            n
        )));
    }
    key.as_string()
        .map(RecordId::Named)
        .ok_or_else(|| IndexedDbError::JsValue(format!("unsupported key: {:?}", key)))
}

/// Convert the result of a `count` request.
pub fn js_to_count(val: &JsValue) -> Result<usize> {
    match val.as_f64() {
        Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
        _ => Err(IndexedDbError::JsValue(format!("count is not a number: {:?}", val))),
    }
}

/// Copy bytes into a fresh `ArrayBuffer`.
pub fn bytes_to_array_buffer(bytes: &[u8]) -> JsValue {
    js_sys::Uint8Array::from(bytes).buffer().into()
}

fn js_to_date(val: &JsValue) -> Result<DateTime<Utc>> {
    let millis = if let Some(date) = val.dyn_ref::<js_sys::Date>() {
        date.get_time()
    } else if val.is_undefined() || val.is_null() {
        0.0
    } else {
        val.as_f64()
            .ok_or_else(|| IndexedDbError::JsValue("date is not a number".into()))?
    };

    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .ok_or_else(|| IndexedDbError::JsValue(format!("date out of range: {}", millis)))
}

/// Set a property on a JS object.
fn set_prop(obj: &js_sys::Object, key: &str, val: &JsValue) -> Result<()> {
    js_sys::Reflect::set(obj, &key.into(), val)
        .map_err(|_| IndexedDbError::JsValue(format!("failed to set property: {}", key)))?;
    Ok(())
}

/// Get a property from a JS object.
fn get_prop(val: &JsValue, key: &str) -> Result<JsValue> {
    js_sys::Reflect::get(val, &key.into())
        .map_err(|_| IndexedDbError::JsValue(format!("missing property: {}", key)))
}

/// Get a string property, defaulting to empty when absent.
fn get_string_prop(val: &JsValue, key: &str) -> Result<String> {
    let prop = get_prop(val, key)?;
    if prop.is_undefined() || prop.is_null() {
        return Ok(String::new());
    }
    prop.as_string()
        .ok_or_else(|| IndexedDbError::JsValue(format!("{} is not a string", key)))
}
