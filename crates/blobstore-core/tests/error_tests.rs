//! Failure propagation tests for BlobStore

use blobstore_core::{Blob, BlobStore, MemoryEngine, RecordId, StoreError, StoreOptions};

#[tokio::test]
async fn test_unsupported_surfaces_on_first_use() {
    // Construction succeeds even without a storage engine
    let store = BlobStore::new(MemoryEngine::unsupported(), StoreOptions::default());

    assert!(matches!(store.size().await, Err(StoreError::Unsupported(_))));
    assert!(matches!(store.connect().await, Err(StoreError::Unsupported(_))));
}

#[tokio::test]
async fn test_request_failure_is_propagated() {
    let engine = MemoryEngine::new();
    let store = BlobStore::new(engine.clone(), StoreOptions::default());
    store.connect().await.unwrap();

    engine.fail_requests("disk full");

    let expected = StoreError::Transaction("disk full".into());
    assert_eq!(store.save("Test").await.unwrap_err(), expected);
    assert_eq!(store.get(&RecordId::Auto(1)).await.unwrap_err(), expected);
    assert_eq!(store.all().await.unwrap_err(), expected);
    assert_eq!(store.size().await.unwrap_err(), expected);
    assert_eq!(store.clear().await.unwrap_err(), expected);

    engine.recover();
    assert!(store.save("Test").await.is_ok());
}

#[tokio::test]
async fn test_connection_error_on_downgrade() {
    let engine = MemoryEngine::new();
    let store = BlobStore::new(engine.clone(), StoreOptions::new().with_db_name("test"));
    store.connect().await.unwrap();
    store.close().await;

    // Another writer bumped the stored version past ours
    let newer = blobstore_core::Schema {
        version: 3,
        ..blobstore_core::Schema::new("test")
    };
    blobstore_core::StorageEngine::open(&engine, &newer)
        .await
        .unwrap();

    assert!(matches!(store.size().await, Err(StoreError::Connection(_))));
}

#[tokio::test]
async fn test_batch_save_stops_at_first_failure() {
    let engine = MemoryEngine::new();
    let store = BlobStore::new(engine.clone(), StoreOptions::default());
    store.save("before").await.unwrap();

    engine.fail_requests("quota exceeded");
    let result = store
        .save_many(vec![Blob::from("a"), Blob::from("b")])
        .await;
    assert!(matches!(result, Err(StoreError::Transaction(_))));

    engine.recover();
    assert_eq!(store.size().await.unwrap(), 1);
}

#[tokio::test]
async fn test_exhausted_key_generator_rejects_save() {
    let store = BlobStore::new(MemoryEngine::new(), StoreOptions::default());

    store.save_with_id(RecordId::Auto(u64::MAX), "max").await.unwrap();

    let err = store.save("next").await.unwrap_err();
    assert_eq!(
        err,
        StoreError::Transaction("ConstraintError: key generator exhausted".into())
    );
    let kept = store.get_as_string(&RecordId::Auto(u64::MAX)).await.unwrap();
    assert_eq!(kept.as_deref(), Some("max"));
}
