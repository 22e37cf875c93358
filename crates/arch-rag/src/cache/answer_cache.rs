//! Memoization of chat completions
//!
//! Answers are keyed by the exact (model, prompt, image reference) triple, so
//! any change to retrieved context or question produces a new entry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::providers::LlmProvider;

/// Cached completion with metadata
#[derive(Debug, Clone)]
pub struct CachedAnswer {
    /// Raw completion text
    pub answer: String,
    /// Model that produced it
    pub model: String,
    /// When this was cached
    pub cached_at: DateTime<Utc>,
    /// Number of cache hits
    pub hit_count: u32,
}

/// Bounded answer cache with TTL
pub struct AnswerCache {
    /// Entries keyed by request hash
    cache: RwLock<HashMap<String, CachedAnswer>>,
    /// Maximum cache size
    max_entries: usize,
    /// TTL for cache entries (seconds)
    ttl_seconds: u64,
}

impl AnswerCache {
    /// Create a new answer cache
    pub fn new(max_entries: usize, ttl_seconds: u64) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            ttl_seconds,
        }
    }

    /// Hash the request triple for the cache key
    pub fn key(model: &str, prompt: &str, image_url: Option<&str>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update([0u8]);
        hasher.update(prompt.as_bytes());
        hasher.update([0u8]);
        hasher.update(image_url.unwrap_or_default().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Get a cached answer if present and not expired
    pub fn get(&self, key: &str) -> Option<CachedAnswer> {
        self.get_at(key, Utc::now())
    }

    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<CachedAnswer> {
        let mut cache = self.cache.write();

        let entry = cache.get_mut(key)?;
        let age = now.signed_duration_since(entry.cached_at);
        if age.num_seconds() > self.ttl_seconds as i64 {
            tracing::debug!("Cache miss (TTL expired): {}", short(key));
            cache.remove(key);
            return None;
        }

        entry.hit_count += 1;
        tracing::debug!("Cache hit: {} (hits: {})", short(key), entry.hit_count);
        Some(entry.clone())
    }

    /// Store an answer, evicting the oldest entry when full
    pub fn put(&self, key: String, model: &str, answer: String) {
        self.put_at(key, model, answer, Utc::now());
    }

    fn put_at(&self, key: String, model: &str, answer: String, now: DateTime<Utc>) {
        let mut cache = self.cache.write();

        if cache.len() >= self.max_entries && !cache.contains_key(&key) {
            if let Some(oldest_key) = cache
                .iter()
                .min_by_key(|(_, v)| v.cached_at)
                .map(|(k, _)| k.clone())
            {
                cache.remove(&oldest_key);
            }
        }

        tracing::debug!("Cached answer: {}", short(&key));
        cache.insert(
            key,
            CachedAnswer {
                answer,
                model: model.to_string(),
                cached_at: now,
                hit_count: 0,
            },
        );
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.read();
        let total_hits: u32 = cache.values().map(|e| e.hit_count).sum();

        CacheStats {
            entries: cache.len(),
            total_hits,
            max_entries: self.max_entries,
            ttl_seconds: self.ttl_seconds,
        }
    }
}

/// Key prefix for log lines
fn short(key: &str) -> &str {
    key.get(..12).unwrap_or(key)
}

/// Cache statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_hits: u32,
    pub max_entries: usize,
    pub ttl_seconds: u64,
}

impl Default for AnswerCache {
    fn default() -> Self {
        let config = CacheConfig::default();
        Self::new(config.max_entries, config.ttl_secs)
    }
}

/// [`LlmProvider`] wrapper answering repeated requests from an [`AnswerCache`]
pub struct CachingLlm {
    inner: Arc<dyn LlmProvider>,
    cache: AnswerCache,
}

impl CachingLlm {
    pub fn new(inner: Arc<dyn LlmProvider>, config: &CacheConfig) -> Self {
        Self {
            inner,
            cache: AnswerCache::new(config.max_entries, config.ttl_secs),
        }
    }

    /// Statistics of the underlying cache
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[async_trait]
impl LlmProvider for CachingLlm {
    async fn complete(&self, prompt: &str, image_url: Option<&str>) -> Result<String> {
        let model = self.inner.model_for(image_url);
        let key = AnswerCache::key(model, prompt, image_url);

        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.answer);
        }

        let answer = self.inner.complete(prompt, image_url).await?;
        self.cache.put(key, model, answer.clone());
        Ok(answer)
    }

    fn model_for(&self, image_url: Option<&str>) -> &str {
        self.inner.model_for(image_url)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
