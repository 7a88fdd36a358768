//! Process-local, time-boxed memoization for expensive read queries.
//!
//! Repeated page renders within the revalidation window reuse the stored
//! result instead of issuing another round-trip. The cache is an explicit
//! value injected into the query service, so tests can pass a fresh one
//! (or skip the TTL) to observe the underlying calls.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

struct Entry {
    payload: Vec<u8>,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memoized computation builder.
    ///
    /// ```ignore
    /// let taxonomy: Taxonomy = cache
    ///     .memo("taxonomy", &())
    ///     .ttl_secs(3600)
    ///     .get_or(|| async { load_taxonomy().await })
    ///     .await?;
    /// ```
    pub fn memo<'a, K: Serialize>(&'a self, function_name: &'a str, key: &'a K) -> MemoBuilder<'a, K> {
        MemoBuilder {
            cache: self,
            function_name,
            key,
            ttl: Duration::ZERO,
        }
    }

    async fn lookup(&self, cache_key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read().await;
        let entry = entries.get(cache_key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.payload.clone())
    }

    async fn store(&self, cache_key: String, payload: Vec<u8>, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        // Opportunistic sweep so dead entries don't accumulate between
        // revalidations.
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            cache_key,
            Entry {
                payload,
                expires_at: now + ttl,
            },
        );
    }
}

pub struct MemoBuilder<'a, K> {
    cache: &'a MemoCache,
    function_name: &'a str,
    key: &'a K,
    ttl: Duration,
}

impl<'a, K: Serialize> MemoBuilder<'a, K> {
    /// Set the revalidation window. A zero TTL (the default) disables
    /// memoization entirely.
    pub fn ttl_secs(mut self, secs: u64) -> Self {
        self.ttl = Duration::from_secs(secs);
        self
    }

    /// Get the cached result or compute it via the provided closure.
    /// The cache key is the function name plus a hash of the argument
    /// tuple, so identical calls within the window coincide.
    pub async fn get_or<T, F, Fut>(self, f: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let input_bytes = serde_json::to_vec(self.key)?;
        let cache_key = format!(
            "{}:{}",
            self.function_name,
            hex::encode(Sha256::digest(&input_bytes))
        );

        if self.ttl > Duration::ZERO {
            if let Some(hit) = self.cache.lookup(&cache_key).await {
                return Ok(serde_json::from_slice(&hit)?);
            }
        }

        let result = f().await?;

        if self.ttl > Duration::ZERO {
            let payload = serde_json::to_vec(&result)?;
            self.cache.store(cache_key, payload, self.ttl).await;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn second_call_within_ttl_skips_compute() {
        let cache = MemoCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: i64 = cache
                .memo("answer", &(1, 2))
                .ttl_secs(60)
                .get_or(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_collide() {
        let cache = MemoCache::new();

        let a: i64 = cache
            .memo("op", &1)
            .ttl_secs(60)
            .get_or(|| async { Ok(10) })
            .await
            .unwrap();
        let b: i64 = cache
            .memo("op", &2)
            .ttl_secs(60)
            .get_or(|| async { Ok(20) })
            .await
            .unwrap();

        assert_eq!((a, b), (10, 20));
    }

    #[tokio::test]
    async fn same_key_different_function_names_do_not_collide() {
        let cache = MemoCache::new();

        let a: i64 = cache
            .memo("op_a", &1)
            .ttl_secs(60)
            .get_or(|| async { Ok(1) })
            .await
            .unwrap();
        let b: i64 = cache
            .memo("op_b", &1)
            .ttl_secs(60)
            .get_or(|| async { Ok(2) })
            .await
            .unwrap();

        assert_eq!((a, b), (1, 2));
    }

    #[tokio::test]
    async fn zero_ttl_recomputes_every_call() {
        let cache = MemoCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let _: i64 = cache
                .memo("uncached", &())
                .get_or(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(0)
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = MemoCache::new();
        let calls = AtomicUsize::new(0);

        let first: Result<i64> = cache
            .memo("flaky", &())
            .ttl_secs(60)
            .get_or(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("backend down")
            })
            .await;
        assert!(first.is_err());

        let second: i64 = cache
            .memo("flaky", &())
            .ttl_secs(60)
            .get_or(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await
            .unwrap();

        assert_eq!(second, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
