//! Low-level IndexedDB helpers using web-sys
//!
//! Wraps the callback-based IndexedDB API into Rust futures using
//! `wasm_bindgen_futures::JsFuture` and `js_sys::Promise`. Every single-shot
//! request goes through [`await_request`]; cursors re-arm it once per step.

use js_sys::Promise;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    IdbDatabase, IdbFactory, IdbObjectStore, IdbOpenDbRequest, IdbRequest, IdbTransaction,
    IdbTransactionMode, IdbVersionChangeEvent,
};

use blobstore_core::Schema;

use crate::error::{js_error_message, IndexedDbError, Result};

/// Globals probed for the factory, standard name first.
const FACTORY_GLOBALS: [&str; 5] = [
    "indexedDB",
    "webkitIndexedDB",
    "mozIndexedDB",
    "OIndexedDB",
    "msIndexedDB",
];

/// Type alias for upgrade closure to reduce complexity
type UpgradeClosure = Rc<RefCell<Option<Closure<dyn FnMut(IdbVersionChangeEvent)>>>>;

/// Look up the IndexedDB factory on the global object.
///
/// Returns `None` when no (possibly vendor-prefixed) factory exists, e.g.
/// outside a browser or in a sandboxed frame.
pub fn resolve_factory() -> Option<IdbFactory> {
    let global = js_sys::global();

    FACTORY_GLOBALS.iter().find_map(|name| {
        let idb = js_sys::Reflect::get(&global, &JsValue::from_str(name)).ok()?;
        if idb.is_undefined() || idb.is_null() {
            return None;
        }
        idb.dyn_into::<IdbFactory>().ok()
    })
}

/// Render the error a request failed with.
fn request_error(req: &IdbRequest) -> JsValue {
    req.error()
        .ok()
        .flatten()
        .map(|e| JsValue::from_str(&format!("{}: {}", e.name(), e.message())))
        .unwrap_or_else(|| JsValue::from_str("unknown IDB error"))
}

/// Convert an IdbRequest into a JS Promise that resolves with the request's result.
fn request_to_promise(req: &IdbRequest) -> Promise {
    let req_success = req.clone();
    let req_error = req.clone();

    Promise::new(&mut move |resolve, reject| {
        // Store closures in Rc<RefCell> to manage their lifetime without leaking
        type ClosurePair = (
            Closure<dyn FnMut(web_sys::Event)>,
            Closure<dyn FnMut(web_sys::Event)>,
        );
        let closures: Rc<RefCell<Option<ClosurePair>>> = Rc::new(RefCell::new(None));

        let req_s = req_success.clone();
        let closures_for_success = closures.clone();
        let on_success = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let result = req_s.result().unwrap_or(JsValue::UNDEFINED);
            let _ = resolve.call1(&JsValue::UNDEFINED, &result);
            *closures_for_success.borrow_mut() = None;
        }) as Box<dyn FnMut(web_sys::Event)>);

        let req_e = req_error.clone();
        let closures_for_error = closures.clone();
        let on_error = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let _ = reject.call1(&JsValue::UNDEFINED, &request_error(&req_e));
            *closures_for_error.borrow_mut() = None;
        }) as Box<dyn FnMut(web_sys::Event)>);

        req_success.set_onsuccess(Some(on_success.as_ref().unchecked_ref()));
        req_error.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        // Keep both closures alive until one fires
        *closures.borrow_mut() = Some((on_success, on_error));
    })
}

/// Render the error a transaction failed or aborted with.
fn transaction_error(tx: &IdbTransaction) -> JsValue {
    tx.error()
        .map(|e| JsValue::from_str(&format!("{}: {}", e.name(), e.message())))
        .unwrap_or_else(|| JsValue::from_str("AbortError: transaction aborted"))
}

/// Convert an IdbTransaction completion into a JS Promise.
///
/// Rejects on `error` and on `abort`; commit-time failures such as an
/// exceeded quota only fire `abort`.
fn transaction_to_promise(tx: &IdbTransaction) -> Promise {
    let tx = tx.clone();

    Promise::new(&mut move |resolve, reject| {
        type ClosureTriple = (
            Closure<dyn FnMut(web_sys::Event)>,
            Closure<dyn FnMut(web_sys::Event)>,
            Closure<dyn FnMut(web_sys::Event)>,
        );
        let closures: Rc<RefCell<Option<ClosureTriple>>> = Rc::new(RefCell::new(None));

        let tx_c = tx.clone();
        let closures_for_complete = closures.clone();
        let on_complete = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let _ = resolve.call0(&JsValue::UNDEFINED);
            detach_transaction(&tx_c);
            *closures_for_complete.borrow_mut() = None;
        }) as Box<dyn FnMut(web_sys::Event)>);

        // An error is always followed by abort, which releases the closures
        let tx_e = tx.clone();
        let reject_on_error = reject.clone();
        let on_error = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let _ = reject_on_error.call1(&JsValue::UNDEFINED, &transaction_error(&tx_e));
        }) as Box<dyn FnMut(web_sys::Event)>);

        let tx_a = tx.clone();
        let closures_for_abort = closures.clone();
        let on_abort = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let _ = reject.call1(&JsValue::UNDEFINED, &transaction_error(&tx_a));
            detach_transaction(&tx_a);
            *closures_for_abort.borrow_mut() = None;
        }) as Box<dyn FnMut(web_sys::Event)>);

        tx.set_oncomplete(Some(on_complete.as_ref().unchecked_ref()));
        tx.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        tx.set_onabort(Some(on_abort.as_ref().unchecked_ref()));

        *closures.borrow_mut() = Some((on_complete, on_error, on_abort));
    })
}

fn detach_transaction(tx: &IdbTransaction) {
    tx.set_oncomplete(None);
    tx.set_onerror(None);
    tx.set_onabort(None);
}

/// Create the object store during an upgrade if it is missing.
fn create_store_if_absent(event: &IdbVersionChangeEvent, store_name: &str) -> Result<()> {
    let req: IdbOpenDbRequest = event
        .target()
        .ok_or_else(|| IndexedDbError::Open("upgrade event has no target".into()))?
        .unchecked_into();
    let db: IdbDatabase = req.result()?.unchecked_into();

    if db.object_store_names().contains(store_name) {
        return Ok(());
    }

    let params = web_sys::IdbObjectStoreParameters::new();
    js_sys::Reflect::set(&params, &"autoIncrement".into(), &JsValue::TRUE)
        .map_err(|e| IndexedDbError::Open(js_error_message(&e)))?;
    db.create_object_store_with_optional_parameters(store_name, &params)
        .map_err(|e| IndexedDbError::Open(js_error_message(&e)))?;

    debug!("created object store '{}'", store_name);
    Ok(())
}

/// Abort the version-change transaction an upgrade event belongs to.
fn abort_upgrade(event: &IdbVersionChangeEvent) {
    let tx = event
        .target()
        .map(|target| target.unchecked_into::<IdbRequest>())
        .and_then(|req| req.transaction());
    if let Some(tx) = tx {
        let _ = tx.abort();
    }
}

/// Open (or create and upgrade) the database described by `schema`.
pub async fn open_database(factory: &IdbFactory, schema: &Schema) -> Result<IdbDatabase> {
    let open_req: IdbOpenDbRequest = factory
        .open_with_u32(&schema.db_name, schema.version)
        .map_err(|e| IndexedDbError::Open(js_error_message(&e)))?;

    // Store upgrade closure to manage its lifetime without leaking
    let upgrade_closure: UpgradeClosure = Rc::new(RefCell::new(None));
    let upgrade_closure_for_drop = upgrade_closure.clone();

    let store_name = schema.store_name.clone();
    let on_upgrade = Closure::wrap(Box::new(move |event: IdbVersionChangeEvent| {
        if let Err(e) = create_store_if_absent(&event, &store_name) {
            // Aborting fails the open request, which rejects below
            warn!("upgrade failed: {}", e);
            abort_upgrade(&event);
        }
    }) as Box<dyn FnMut(IdbVersionChangeEvent)>);

    open_req.set_onupgradeneeded(Some(on_upgrade.as_ref().unchecked_ref()));
    *upgrade_closure.borrow_mut() = Some(on_upgrade);

    let open_promise = request_to_promise(open_req.unchecked_ref());
    let result = wasm_bindgen_futures::JsFuture::from(open_promise).await;

    // Clean up upgrade closure now that open is complete
    *upgrade_closure_for_drop.borrow_mut() = None;

    result
        .map_err(|e| IndexedDbError::Open(js_error_message(&e)))?
        .dyn_into::<IdbDatabase>()
        .map_err(|_| IndexedDbError::Open("result is not IdbDatabase".into()))
}

/// Start a transaction scoped to a single object store.
pub fn begin_transaction(
    db: &IdbDatabase,
    store_name: &str,
    mode: IdbTransactionMode,
) -> Result<(IdbTransaction, IdbObjectStore)> {
    let tx = db
        .transaction_with_str_and_mode(store_name, mode)
        .map_err(|e| IndexedDbError::Transaction(js_error_message(&e)))?;
    let store = tx
        .object_store(store_name)
        .map_err(|e| IndexedDbError::Request(js_error_message(&e)))?;
    Ok((tx, store))
}

/// Await an IdbRequest, resolving to its result JsValue.
pub async fn await_request(req: &IdbRequest) -> Result<JsValue> {
    let promise = request_to_promise(req);
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|e| IndexedDbError::Request(js_error_message(&e)))
}

/// Await an IdbTransaction to complete.
pub async fn await_transaction(tx: &IdbTransaction) -> Result<()> {
    let promise = transaction_to_promise(tx);
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|e| IndexedDbError::Transaction(js_error_message(&e)))?;
    Ok(())
}

/// Delete an IndexedDB database by name.
pub async fn delete_database(factory: &IdbFactory, db_name: &str) -> Result<()> {
    let req = factory
        .delete_database(db_name)
        .map_err(|e| IndexedDbError::Open(format!("delete db: {}", js_error_message(&e))))?;
    let promise = request_to_promise(req.unchecked_ref());
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|e| IndexedDbError::Open(format!("delete db: {}", js_error_message(&e))))?;
    Ok(())
}
