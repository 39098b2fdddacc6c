//! Connection lifecycle
//!
//! One shared connection per blob store: opened on first acquire, reused by
//! every later request, closed on release.

use std::rc::Rc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::logging::prefix;
use crate::storage::{ObjectStore, Schema, StorageEngine, StoreResult};

/// Owns the engine and the single shared connection opened from it.
///
/// Concurrent first acquisitions wait on the same open instead of racing
/// their own. A failed open is not cached; the next acquire tries again.
pub struct Connector<E: StorageEngine> {
    engine: E,
    schema: Schema,
    handle: Mutex<Option<Rc<E::Store>>>,
}

impl<E: StorageEngine> Connector<E> {
    pub fn new(engine: E, schema: Schema) -> Self {
        Self {
            engine,
            schema,
            handle: Mutex::new(None),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Get the shared connection, opening it if needed.
    pub async fn acquire(&self) -> StoreResult<Rc<E::Store>> {
        let mut slot = self.handle.lock().await;
        if let Some(store) = slot.as_ref() {
            return Ok(Rc::clone(store));
        }

        debug!(
            "{} opening '{}' at version {}",
            prefix::DB,
            self.schema.db_name,
            self.schema.version
        );
        let store = match self.engine.open(&self.schema).await {
            Ok(store) => Rc::new(store),
            Err(e) => {
                warn!("{} failed to open '{}': {}", prefix::DB, self.schema.db_name, e);
                return Err(e);
            }
        };
        info!(
            "{} {} connected to '{}'",
            prefix::PULSE_OPEN,
            prefix::DB,
            self.schema.db_name
        );

        *slot = Some(Rc::clone(&store));
        Ok(store)
    }

    /// Close and forget the shared connection. A no-op when not connected.
    pub async fn release(&self) {
        if let Some(store) = self.handle.lock().await.take() {
            store.close();
            info!(
                "{} {} closed '{}'",
                prefix::PULSE_CLOSE,
                prefix::DB,
                self.schema.db_name
            );
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.handle.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryEngine, StoreError};

    #[tokio::test]
    async fn test_acquire_opens_once() {
        let engine = MemoryEngine::new();
        let connector = Connector::new(engine.clone(), Schema::new("test"));

        assert!(!connector.is_connected().await);
        let first = connector.acquire().await.unwrap();
        let second = connector.acquire().await.unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(engine.open_count(), 1);
        assert!(connector.is_connected().await);
    }

    #[tokio::test]
    async fn test_concurrent_acquire_opens_once() {
        let engine = MemoryEngine::new();
        let connector = Connector::new(engine.clone(), Schema::new("test"));

        let (a, b) = tokio::join!(connector.acquire(), connector.acquire());
        assert!(Rc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(engine.open_count(), 1);
    }

    #[tokio::test]
    async fn test_release_then_reacquire() {
        let engine = MemoryEngine::new();
        let connector = Connector::new(engine.clone(), Schema::new("test"));

        let first = connector.acquire().await.unwrap();
        connector.release().await;
        assert!(!connector.is_connected().await);

        // The released handle is closed
        assert!(matches!(first.count().await, Err(StoreError::Transaction(_))));

        let second = connector.acquire().await.unwrap();
        assert_eq!(second.count().await.unwrap(), 0);
        assert_eq!(engine.open_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_open_is_retried() {
        let engine = MemoryEngine::unsupported();
        let connector = Connector::new(engine.clone(), Schema::new("test"));

        assert!(matches!(
            connector.acquire().await,
            Err(StoreError::Unsupported(_))
        ));
        assert!(connector.acquire().await.is_err());
        assert_eq!(engine.open_count(), 2);
        assert!(!connector.is_connected().await);
    }
}
