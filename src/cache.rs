//! TTL cache for generated recipe batches

use moka::future::Cache;
use moka::Expiry;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CacheOptions;
use crate::recipe::Recipe;

/// Prefix shared by every recipe cache key
pub const KEY_PREFIX: &str = "recipes:";

/// Deterministic fingerprint of an ingredient set.
///
/// Items are lowercased and trimmed, then sorted and joined with `-`, so
/// lists that differ only in case, whitespace or order share a key.
pub fn cache_key(ingredients: &[String]) -> String {
    let mut items: Vec<String> = ingredients
        .iter()
        .map(|i| i.trim().to_lowercase())
        .collect();
    items.sort();
    format!("{}{}", KEY_PREFIX, items.join("-"))
}

#[derive(Clone)]
struct CachedBatch {
    recipes: Arc<Vec<Recipe>>,
    ttl: Duration,
}

struct BatchExpiry;

impl Expiry<String, CachedBatch> for BatchExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedBatch,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedBatch,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Snapshot of the cache for the health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: u64,
    pub max_items: u64,
    pub default_ttl_secs: u64,
}

/// Bounded cache of recipe batches keyed by [`cache_key`]
#[derive(Clone)]
pub struct RecipeCache {
    inner: Cache<String, CachedBatch>,
    options: CacheOptions,
}

impl RecipeCache {
    pub fn new(options: CacheOptions) -> Self {
        let inner = Cache::builder()
            .max_capacity(options.max_items)
            .expire_after(BatchExpiry)
            .build();

        Self { inner, options }
    }

    /// TTL applied when the caller has no reason to choose another
    pub fn default_ttl(&self) -> Duration {
        self.options.ttl
    }

    pub async fn get(&self, key: &str) -> Option<Vec<Recipe>> {
        self.inner
            .get(key)
            .await
            .map(|batch| batch.recipes.as_ref().clone())
    }

    /// Store a batch; an existing entry under the same key is replaced
    pub async fn set(&self, key: &str, recipes: Vec<Recipe>, ttl: Duration) {
        let batch = CachedBatch {
            recipes: Arc::new(recipes),
            ttl,
        };
        self.inner.insert(key.to_string(), batch).await;
    }

    /// Drop every entry
    pub async fn reset(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
        tracing::info!("Recipe cache cleared");
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks().await;
        CacheStats {
            entries: self.inner.entry_count(),
            max_items: self.options.max_items,
            default_ttl_secs: self.options.ttl.as_secs(),
        }
    }
}

impl Default for RecipeCache {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}
