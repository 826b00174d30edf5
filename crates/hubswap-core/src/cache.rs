//! TTL cache with request coalescing
//!
//! Read-mostly, concurrency-safe key/value store. Concurrent misses for the
//! same key share a single underlying fetch: the first caller runs it and the
//! others await its result. Expired entries stay in the map until a purge,
//! which [`CacheService::start_cleanup`] runs on a timer.

use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tokio::time::Instant;

struct Slot<V> {
    cell: OnceCell<(V, Instant)>,
}

impl<V> Slot<V> {
    fn empty() -> Arc<Self> {
        Arc::new(Self {
            cell: OnceCell::new(),
        })
    }
}

pub struct CacheService<K, V> {
    name: &'static str,
    ttl: Duration,
    slots: Arc<DashMap<K, Arc<Slot<V>>>>,
}

impl<K, V> CacheService<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            slots: Arc::new(DashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = self.slots.get(key)?;
        match slot.cell.get() {
            Some((value, at)) if at.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let slot = Slot::empty();
        let _ = slot.cell.set((value, Instant::now()));
        self.slots.insert(key, slot);
    }

    /// Return the cached value or run `fetch` once for all concurrent callers.
    ///
    /// A failed fetch caches nothing; the next caller fetches again.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.live_slot(key);
        let mut fetched = false;
        let (value, _) = slot
            .cell
            .get_or_try_init(|| {
                fetched = true;
                async move { fetch().await.map(|v| (v, Instant::now())) }
            })
            .await?;
        if !fetched {
            tracing::trace!(cache = self.name, "cache hit");
        }
        Ok(value.clone())
    }

    /// The slot callers should wait on; replaces an expired one.
    fn live_slot(&self, key: K) -> Arc<Slot<V>> {
        let mut entry = self.slots.entry(key).or_insert_with(Slot::empty);
        let expired = matches!(entry.cell.get(), Some((_, at)) if at.elapsed() >= self.ttl);
        if expired {
            *entry = Slot::empty();
        }
        Arc::clone(&entry)
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        purge(&self.slots, self.ttl);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn purge<K: Eq + Hash, V>(slots: &DashMap<K, Arc<Slot<V>>>, ttl: Duration) {
    slots.retain(|_, slot| !matches!(slot.cell.get(), Some((_, at)) if at.elapsed() >= ttl));
}

impl<K, V> CacheService<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Purge expired entries every `every` on a background task.
    ///
    /// The task holds only a weak handle and ends once the cache is dropped.
    pub fn start_cleanup(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let slots: Weak<DashMap<K, Arc<Slot<V>>>> = Arc::downgrade(&self.slots);
        let ttl = self.ttl;
        let name = self.name;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
            loop {
                ticker.tick().await;
                let Some(slots) = slots.upgrade() else {
                    break;
                };
                let before = slots.len();
                purge(&slots, ttl);
                let purged = before.saturating_sub(slots.len());
                if purged > 0 {
                    tracing::debug!(cache = name, purged, "purged expired entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let cache: Arc<CacheService<String, u64>> =
            Arc::new(CacheService::new("test", Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_try_insert_with("pair".to_string(), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, String>(42)
                    })
                    .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache: CacheService<&str, u64> = CacheService::new("test", Duration::from_secs(10));
        cache.insert("k", 1);
        assert_eq!(cache.get(&"k"), Some(1));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get(&"k"), None);

        let v = cache
            .get_or_try_insert_with("k", || async { Ok::<_, String>(2) })
            .await
            .unwrap();
        assert_eq!(v, 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache: CacheService<&str, u64> = CacheService::new("test", Duration::from_secs(60));
        let err = cache
            .get_or_try_insert_with("k", || async { Err::<u64, _>("boom".to_string()) })
            .await;
        assert!(err.is_err());

        let ok = cache
            .get_or_try_insert_with("k", || async { Ok::<_, String>(5) })
            .await
            .unwrap();
        assert_eq!(ok, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache: CacheService<u8, u8> = CacheService::new("test", Duration::from_secs(1));
        cache.insert(1, 1);
        tokio::time::advance(Duration::from_secs(2)).await;
        cache.insert(2, 2);
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&2), Some(2));
    }

    #[tokio::test]
    async fn test_cleanup_task_evicts_expired_keys() {
        let cache: CacheService<u32, u32> = CacheService::new("test", Duration::from_millis(5));
        for i in 0..1000 {
            cache.insert(i, i);
        }
        let _cleanup = cache.start_cleanup(Duration::from_millis(1));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.len() < 1000);
        assert_eq!(cache.get(&7), None);
    }

    #[tokio::test]
    async fn test_cleanup_task_ends_with_cache() {
        let cache: CacheService<u32, u32> = CacheService::new("test", Duration::from_millis(5));
        let handle = cache.start_cleanup(Duration::from_millis(1));
        drop(cache);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
