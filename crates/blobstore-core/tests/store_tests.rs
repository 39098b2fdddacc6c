//! CRUD operation tests for BlobStore over the in-memory engine

use blobstore_core::{codec, Blob, BlobStore, MemoryEngine, RecordId, StoreOptions};
use pretty_assertions::assert_eq;

/// Helper to create a store on a fresh engine
fn test_store() -> BlobStore<MemoryEngine> {
    BlobStore::new(MemoryEngine::new(), StoreOptions::new().with_db_name("test"))
}

fn text_blob(text: &str) -> Blob {
    Blob::from(text).with_type("text/plain")
}

fn is_guid(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_hexdigit()))
}

#[tokio::test]
async fn test_database_name() {
    let store = test_store();
    assert_eq!(store.name(), "test");

    let default = BlobStore::new(MemoryEngine::new(), StoreOptions::default());
    assert_eq!(default.name(), "DEFAULT");
}

#[tokio::test]
async fn test_construction_does_not_connect() {
    let engine = MemoryEngine::new();
    let _store = BlobStore::new(engine.clone(), StoreOptions::default());
    assert_eq!(engine.open_count(), 0);
    assert!(engine.database_names().is_empty());
}

#[tokio::test]
async fn test_all_empty_by_default() {
    let store = test_store();
    assert!(store.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_and_get_as_string() {
    let store = test_store();

    let id = store.save("Test").await.unwrap();
    assert_eq!(store.all().await.unwrap().len(), 1);
    assert_eq!(store.get_as_string(&id).await.unwrap().as_deref(), Some("Test"));
}

#[tokio::test]
async fn test_save_blob_returns_generated_id() {
    let store = test_store();

    let first = store.save(text_blob("Test")).await.unwrap();
    let second = store.save(text_blob("Test 2")).await.unwrap();

    assert!(first.as_auto().is_some());
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_save_with_given_guid() {
    let store = test_store();
    let guid = codec::guid();

    let id = store.save_with_id(guid.as_str(), "Test").await.unwrap();
    assert_eq!(id, RecordId::Named(guid.clone()));

    let record = store.get(&id).await.unwrap().unwrap();
    assert_eq!(record.guid, guid);
}

#[tokio::test]
async fn test_save_with_id_overwrites() {
    let store = test_store();

    store.save_with_id("doc", "v1").await.unwrap();
    store.save_with_id("doc", "v2").await.unwrap();

    assert_eq!(store.size().await.unwrap(), 1);
    assert_eq!(
        store.get_as_string(&"doc".into()).await.unwrap().as_deref(),
        Some("v2")
    );
}

#[tokio::test]
async fn test_save_many_preserves_order() {
    let store = test_store();

    let ids = store
        .save_many(vec![text_blob("Test"), text_blob("Test 2")])
        .await
        .unwrap();
    assert_eq!(ids.len(), 2);

    let records = store.get_many(&ids).await.unwrap();
    let texts: Vec<String> = records
        .into_iter()
        .map(|r| r.unwrap().data_as_binary_string())
        .collect();
    assert_eq!(texts, vec!["Test", "Test 2"]);
}

#[tokio::test]
async fn test_get_record_shape() {
    let store = test_store();

    let id = store.save("Test").await.unwrap();
    let record = store.get(&id).await.unwrap().unwrap();

    assert_eq!(record.id, id);
    assert_eq!(record.data.len(), 4);
    assert_eq!(record.mime_type, "");
    assert_eq!(record.name, "");
    assert!(is_guid(&record.guid), "bad guid: {}", record.guid);
}

#[tokio::test]
async fn test_get_nonexistent() {
    let store = BlobStore::new(MemoryEngine::new(), StoreOptions::default());
    assert!(store.get(&RecordId::Auto(404)).await.unwrap().is_none());
    assert!(store.get_as_string(&"missing".into()).await.unwrap().is_none());

    let many = store
        .get_many(&[RecordId::Auto(1), RecordId::from("x")])
        .await
        .unwrap();
    assert_eq!(many.len(), 2);
    assert!(many.iter().all(Option::is_none));
}

#[tokio::test]
async fn test_metadata_preserved() {
    let store = test_store();

    let text = store.create(text_blob("Test")).await.unwrap();
    assert_eq!(text.mime_type, "text/plain");
    assert_eq!(text.name, "");

    let image = store
        .create(
            Blob::new(vec![0xff, 0xd8, 0xff, 0xe0])
                .with_type("image/jpeg")
                .with_name("test-image.jpg"),
        )
        .await
        .unwrap();
    assert_eq!(image.mime_type, "image/jpeg");
    assert_eq!(image.name, "test-image.jpg");

    let pdf = store
        .create(Blob::from("%PDF-1.4").with_type("application/pdf"))
        .await
        .unwrap();
    assert_eq!(pdf.mime_type, "application/pdf");
}

#[tokio::test]
async fn test_create_returns_record() {
    let store = test_store();

    let record = store.create("Test").await.unwrap();
    assert_eq!(record.data.len(), 4);
    assert_eq!(record.data_as_binary_string(), "Test");
}

#[tokio::test]
async fn test_create_with_given_guid() {
    let store = test_store();
    let guid = codec::guid();

    let record = store.create_with_id(guid.clone(), "Test").await.unwrap();
    assert_eq!(record.data.len(), 4);
    assert_eq!(record.guid, guid);
}

#[tokio::test]
async fn test_create_many() {
    let store = test_store();

    let records = store
        .create_many(vec![text_blob("Test 1"), text_blob("Test 2")])
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].data_as_binary_string(), "Test 1");
    assert_eq!(records[1].data_as_binary_string(), "Test 2");
}

#[tokio::test]
async fn test_concurrent_creates() {
    let store = test_store();

    let (a, b) = tokio::join!(
        store.create(text_blob("Test 1")),
        store.create(text_blob("Test 2"))
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.data_as_binary_string(), "Test 1");
    assert_eq!(b.data_as_binary_string(), "Test 2");
    assert_eq!(store.all().await.unwrap().len(), 2);
    assert_eq!(store.engine().open_count(), 1);
}

#[tokio::test]
async fn test_n_saves_all_retrievable() {
    let store = test_store();

    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(store.save(format!("item {}", i)).await.unwrap());
    }
    ids.extend(
        store
            .save_many(vec!["batch a", "batch b", "batch c"])
            .await
            .unwrap(),
    );

    assert_eq!(store.all().await.unwrap().len(), 8);
    for id in &ids {
        assert!(store.get(id).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn test_binary_round_trip() {
    let store = test_store();
    let payload: Vec<u8> = (0..=255u8).collect();

    let id = store.save(payload.clone()).await.unwrap();
    let text = store.get_as_string(&id).await.unwrap().unwrap();

    assert_eq!(text, codec::bytes_to_binary_string(&payload));
    assert_eq!(text.chars().count(), 256);
}

#[tokio::test]
async fn test_size() {
    let store = test_store();
    assert_eq!(store.size().await.unwrap(), 0);

    store.save("Johan").await.unwrap();
    assert_eq!(store.size().await.unwrap(), 1);
}

#[tokio::test]
async fn test_clear() {
    let store = test_store();
    store.save_many(vec!["a", "b"]).await.unwrap();

    store.clear().await.unwrap();
    assert_eq!(store.size().await.unwrap(), 0);
    assert!(store.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stores_share_named_database() {
    let engine = MemoryEngine::new();
    let writer = BlobStore::new(engine.clone(), StoreOptions::new().with_db_name("shared"));
    let reader = BlobStore::new(engine.clone(), StoreOptions::new().with_db_name("shared"));
    let other = BlobStore::new(engine, StoreOptions::new().with_db_name("other"));

    let id = writer.save("Test").await.unwrap();
    assert_eq!(reader.get_as_string(&id).await.unwrap().as_deref(), Some("Test"));
    assert_eq!(other.size().await.unwrap(), 0);
}

#[tokio::test]
async fn test_close_and_reopen() {
    let store = test_store();
    store.connect().await.unwrap();

    let id = store.save("Test").await.unwrap();
    store.close().await;

    assert_eq!(store.get_as_string(&id).await.unwrap().as_deref(), Some("Test"));
    assert_eq!(store.engine().open_count(), 2);
}
