//! Shared external key-value store boundary
//!
//! The wallet lock and price cache live in a store shared by every engine
//! instance (Redis in production). The trait keeps the engine testable and
//! lets a single-process deployment run on the in-memory implementation.
//!
//! `set_if_absent` is the atomic acquire primitive the wallet lock relies
//! on; implementations must guarantee that exactly one concurrent caller
//! observes `true` for a given key.

mod memory;

pub use memory::MemoryStore;

use crate::errors::EngineResult;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait SharedStore: Send + Sync {
    async fn get(&self, key: &str) -> EngineResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> EngineResult<()>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> EngineResult<()>;

    /// Atomically set `key` only when absent. Returns true when this caller
    /// created the entry.
    async fn set_if_absent(&self, key: &str, value: &str) -> EngineResult<bool>;

    async fn delete(&self, key: &str) -> EngineResult<()>;

    /// List all keys beginning with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> EngineResult<Vec<String>>;
}
