//! Result cache keyed by `(namespace, key)`

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::Result;

/// Raw JSON store; typing and validation happen in [`memoize`]
#[async_trait]
pub trait CacheService: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Option<Value>;

    async fn put(&self, namespace: &str, key: &str, value: Value);

    /// Remaining lifetime of an entry
    async fn get_ttl(&self, namespace: &str, key: &str) -> Option<Duration>;
}

/// Return the cached `T` for `(namespace, key)` or compute and store it
///
/// A cached value that no longer deserializes as `T` is treated as a miss.
/// Errors from `thunk` are returned and never cached.
pub async fn memoize<T, F, Fut>(
    cache: &dyn CacheService,
    namespace: &str,
    key: &str,
    thunk: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(raw) = cache.get(namespace, key).await {
        match serde_json::from_value::<T>(raw) {
            Ok(value) => {
                debug!(namespace, key, "cache hit");
                return Ok(value);
            }
            Err(e) => warn!(namespace, key, error = %e, "cached value failed validation"),
        }
    }

    let value = thunk().await?;
    match serde_json::to_value(&value) {
        Ok(raw) => cache.put(namespace, key, raw).await,
        Err(e) => warn!(namespace, key, error = %e, "result not cacheable"),
    }
    Ok(value)
}

/// Process-local cache with a fixed TTL per entry
pub struct MemoryCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Value, Instant)>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn entry_key(namespace: &str, key: &str) -> String {
        format!("{}/{}", namespace, key)
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires)| *expires > now)
            .count()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        let (value, expires) = entries.get(&Self::entry_key(namespace, key))?;
        (*expires > Instant::now()).then(|| value.clone())
    }

    async fn put(&self, namespace: &str, key: &str, value: Value) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(Self::entry_key(namespace, key), (value, now + self.ttl));
    }

    async fn get_ttl(&self, namespace: &str, key: &str) -> Option<Duration> {
        let entries = self.entries.read().await;
        let (_, expires) = entries.get(&Self::entry_key(namespace, key))?;
        expires.checked_duration_since(Instant::now())
    }
}

/// Stores nothing; every [`memoize`] call recomputes
pub struct PassthroughCache;

#[async_trait]
impl CacheService for PassthroughCache {
    async fn get(&self, _namespace: &str, _key: &str) -> Option<Value> {
        None
    }

    async fn put(&self, _namespace: &str, _key: &str, _value: Value) {}

    async fn get_ttl(&self, _namespace: &str, _key: &str) -> Option<Duration> {
        None
    }
}
