//! Bounded, time-expiring response cache.
//!
//! Least-recently-used eviction at capacity, plus a wall-clock TTL applied
//! lazily at read time: expired entries are treated as misses and removed,
//! never proactively purged. The cache is constructor-injected (no module
//! globals), created once at application start, and holds no persistence.
//!
//! Capacity and TTL come from `EngineConfig`; the 50-entry / 10-minute
//! defaults are inherited configuration, not derived values.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Normalize a question + caller context into a cache key.
///
/// Conversation history deliberately does not participate: a follow-up merged
/// with prior context still caches under its own text.
pub fn cache_key(question: &str, user_context: Option<&str>) -> String {
    let mut key = question.trim().to_lowercase();
    key.push('|');
    if let Some(ctx) = user_context {
        key.push_str(&ctx.trim().to_lowercase());
    }
    key
}

struct CacheSlot<V> {
    value: V,
    inserted_at: Instant,
}

struct CacheInner<V> {
    slots: HashMap<String, CacheSlot<V>>,
    /// Recency order, least-recently-used at the front.
    order: VecDeque<String>,
}

/// LRU + TTL cache for formatted answers. Thread-safe behind one mutex; the
/// recency list makes a lock-free map unhelpful here.
pub struct ResponseCache<V> {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<CacheInner<V>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            inner: Mutex::new(CacheInner {
                slots: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Look up a fresh entry, refreshing its recency.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Insert or replace, evicting the least-recently-used entry at capacity.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_at(key.into(), value, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");

        let expired = match inner.slots.get(key) {
            Some(slot) => now.duration_since(slot.inserted_at) > self.ttl,
            None => return None,
        };

        if expired {
            inner.slots.remove(key);
            inner.order.retain(|k| k != key);
            return None;
        }

        inner.order.retain(|k| k != key);
        inner.order.push_back(key.to_string());
        inner.slots.get(key).map(|slot| slot.value.clone())
    }

    fn insert_at(&self, key: String, value: V, now: Instant) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");

        inner.order.retain(|k| *k != key);
        if inner.slots.len() >= self.capacity && !inner.slots.contains_key(&key) {
            if let Some(lru) = inner.order.pop_front() {
                inner.slots.remove(&lru);
            }
        }

        inner.slots.insert(
            key.clone(),
            CacheSlot {
                value,
                inserted_at: now,
            },
        );
        inner.order.push_back(key);
    }
}

impl<V> std::fmt::Debug for ResponseCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> ResponseCache<String> {
        ResponseCache::new(capacity, Duration::from_secs(600))
    }

    #[test]
    fn set_then_get_returns_value() {
        let c = cache(50);
        c.insert("k", "v".to_string());
        assert_eq!(c.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn lru_eviction_at_capacity() {
        let c = cache(3);
        c.insert("a", "1".to_string());
        c.insert("b", "2".to_string());
        c.insert("c", "3".to_string());
        c.insert("d", "4".to_string());

        assert_eq!(c.get("a"), None, "oldest entry should be evicted");
        assert_eq!(c.get("b").as_deref(), Some("2"));
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn read_refreshes_recency() {
        let c = cache(2);
        c.insert("a", "1".to_string());
        c.insert("b", "2".to_string());
        // Touch "a" so "b" becomes the LRU victim.
        assert!(c.get("a").is_some());
        c.insert("c", "3".to_string());

        assert!(c.get("a").is_some());
        assert_eq!(c.get("b"), None);
    }

    #[test]
    fn ttl_expiry_is_a_miss() {
        let c = ResponseCache::new(10, Duration::from_secs(600));
        let t0 = Instant::now();
        c.insert_at("k".to_string(), "v".to_string(), t0);

        let before_expiry = t0 + Duration::from_secs(599);
        assert_eq!(c.get_at("k", before_expiry).as_deref(), Some("v"));

        let after_expiry = t0 + Duration::from_secs(601);
        assert_eq!(c.get_at("k", after_expiry), None, "stale entry reads as a miss");
        assert_eq!(c.len(), 0, "expired entry is removed on read");
    }

    #[test]
    fn overwrite_resets_insertion_time() {
        let c = ResponseCache::new(10, Duration::from_secs(600));
        let t0 = Instant::now();
        c.insert_at("k".to_string(), "old".to_string(), t0);
        c.insert_at("k".to_string(), "new".to_string(), t0 + Duration::from_secs(700));

        assert_eq!(
            c.get_at("k", t0 + Duration::from_secs(750)).as_deref(),
            Some("new")
        );
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn key_normalization_ignores_case_and_padding() {
        assert_eq!(
            cache_key("  How many GOALS? ", Some("Luke Bangs")),
            cache_key("how many goals?", Some("luke bangs"))
        );
        assert_ne!(cache_key("goals", None), cache_key("goals", Some("Luke Bangs")));
    }

    #[test]
    fn concurrent_access() {
        use std::sync::Arc;
        let c = Arc::new(cache(100));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        c.insert(format!("{i}:{j}"), "v".to_string());
                        let _ = c.get(&format!("{i}:{j}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.len(), 100);
    }
}
