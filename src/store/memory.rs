//! In-memory shared store with TTL expiry
//!
//! Thread-safe map standing in for Redis in tests and single-process
//! deployments. Expired entries are dropped lazily on access.

use super::SharedStore;
use crate::errors::{EngineError, EngineResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct StoreEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl StoreEntry {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, StoreEntry>>>,
    /// When set, all operations fail with LockStoreUnavailable. Used by
    /// tests to simulate an unreachable store.
    unavailable: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    fn check_available(&self) -> EngineResult<()> {
        if *self.unavailable.lock().unwrap() {
            return Err(EngineError::LockStoreUnavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn get(&self, key: &str) -> EngineResult<Option<String>> {
        self.check_available()?;
        let mut data = self.data.lock().unwrap();
        match data.get(key) {
            Some(entry) if entry.is_expired() => {
                data.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> EngineResult<()> {
        self.check_available()?;
        let mut data = self.data.lock().unwrap();
        data.insert(
            key.to_string(),
            StoreEntry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> EngineResult<()> {
        self.check_available()?;
        let mut data = self.data.lock().unwrap();
        data.insert(
            key.to_string(),
            StoreEntry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> EngineResult<bool> {
        self.check_available()?;
        let mut data = self.data.lock().unwrap();
        let live = data.get(key).map(|e| !e.is_expired()).unwrap_or(false);
        if live {
            return Ok(false);
        }
        data.insert(
            key.to_string(),
            StoreEntry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> EngineResult<()> {
        self.check_available()?;
        self.data.lock().unwrap().remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> EngineResult<Vec<String>> {
        self.check_available()?;
        let mut data = self.data.lock().unwrap();
        data.retain(|_, entry| !entry.is_expired());
        Ok(data
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn basic_operations() {
        let store = MemoryStore::new();
        store.set("k1", "v1").await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), Some("v1".to_string()));
        assert_eq!(store.get("missing").await.unwrap(), None);

        store.delete("k1").await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_if_absent_is_exclusive() {
        let store = MemoryStore::new();
        assert!(store.set_if_absent("lock", "a").await.unwrap());
        assert!(!store.set_if_absent("lock", "b").await.unwrap());
        assert_eq!(store.get("lock").await.unwrap(), Some("a".to_string()));

        store.delete("lock").await.unwrap();
        assert!(store.set_if_absent("lock", "b").await.unwrap());
    }

    #[tokio::test]
    async fn ttl_expiry() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("short", "v", Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(store.get("short").await.unwrap(), Some("v".to_string()));

        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(store.get("short").await.unwrap(), None);
        // An expired entry no longer blocks set_if_absent
        store
            .set_with_ttl("short", "v", Duration::from_millis(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(store.set_if_absent("short", "w").await.unwrap());
    }

    #[tokio::test]
    async fn prefix_listing() {
        let store = MemoryStore::new();
        store.set("wallet:w1:locked", "true").await.unwrap();
        store.set("wallet:w2:awaiting_tx", "tx1").await.unwrap();
        store.set("price:p1", "2.0").await.unwrap();

        let mut keys = store.keys_with_prefix("wallet:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["wallet:w1:locked", "wallet:w2:awaiting_tx"]);
    }

    #[tokio::test]
    async fn unavailable_store_errors() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.get("k").await,
            Err(crate::errors::EngineError::LockStoreUnavailable(_))
        ));
    }
}
