//! Shared model handles.
//!
//! Loading NLI weights is expensive, so pipelines built from the same model
//! options and device can share one loaded model through a [`ModelCache`].
//! The cache is an ordinary value owned by the caller; nothing here is
//! process-global.

use super::error::Result;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Implemented by model option types to generate a stable cache key.
pub trait ModelOptions {
    fn cache_key(&self) -> String;
}

type CacheStorage = HashMap<(TypeId, String), Arc<dyn Any + Send + Sync>>;

/// A thread-safe cache of loaded model handles, keyed by type and string key.
#[derive(Clone, Default)]
pub struct ModelCache {
    cache: Arc<Mutex<CacheStorage>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached handle for `key`, or runs `loader` and caches its result.
    ///
    /// The lock is not held while loading; two concurrent misses for the same key
    /// both load and the last one wins the slot.
    pub async fn get_or_create<M, F, Fut>(&self, key: &str, loader: F) -> Result<Arc<M>>
    where
        M: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<M>>,
    {
        let cache_key = (TypeId::of::<M>(), key.to_string());

        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.get(&cache_key) {
                if let Ok(model) = Arc::clone(cached).downcast::<M>() {
                    tracing::debug!(key, "model cache hit");
                    return Ok(model);
                }
            }
        }

        let model = Arc::new(loader().await?);

        {
            let mut cache = self.cache.lock().await;
            cache.insert(
                cache_key,
                Arc::clone(&model) as Arc<dyn Any + Send + Sync>,
            );
        }

        Ok(model)
    }

    /// Drops every cached handle. Pipelines already holding one keep it alive.
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }
}
