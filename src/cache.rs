use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Config {
    pub enabled: bool,
    pub ttl: Duration,
    pub capacity: usize,
}

/// Bounded cache whose entries expire `ttl` after insertion.
pub struct Cache<K, V> {
    enabled: bool,
    inner: quick_cache::sync::Cache<K, (Instant, Arc<V>)>,
    ttl: Duration,
}

impl<K, V> Cache<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new(config: Config) -> Self {
        Self {
            enabled: config.enabled,
            ttl: config.ttl,
            inner: quick_cache::sync::Cache::new(config.capacity.max(1)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let arcd = Arc::new(value);
        if !self.enabled {
            return arcd;
        }

        self.inner.insert(key, (Instant::now(), Arc::clone(&arcd)));
        arcd
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        if !self.enabled {
            return None;
        }

        let (inserted, value) = self.inner.get(key)?;
        if inserted.elapsed() >= self.ttl {
            self.inner.remove(key);
            return None;
        }

        Some(value)
    }
}
