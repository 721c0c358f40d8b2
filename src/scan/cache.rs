// 扫描结论缓存
// LRU + TTL，按目标身份（文件哈希 / 规范化 URL）索引

use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::types::{AggregatedResult, ScanTarget, ScoredVerdict};

/// 缓存键
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_target(target: &ScanTarget) -> Self {
        Self(format!("{}:{}", target.kind(), target.identity()))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    aggregated: AggregatedResult,
    verdict: ScoredVerdict,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() > ttl
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    /// 计算命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded verdict cache, shared between scans through an `Arc`.
pub struct VerdictCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
    stats: Mutex<CacheStats>,
}

impl VerdictCache {
    /// `None` when `capacity` is zero, meaning caching is disabled.
    pub fn new(capacity: usize, ttl: Duration) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            stats: Mutex::new(CacheStats::default()),
        })
    }

    pub fn get(&self, target: &ScanTarget) -> Option<(AggregatedResult, ScoredVerdict)> {
        let key = CacheKey::for_target(target);
        let mut entries = self.entries.lock();
        let mut stats = self.stats.lock();

        let lookup = entries.get(&key).map(|entry| {
            (!entry.is_expired(self.ttl)).then(|| (entry.aggregated.clone(), entry.verdict))
        });

        match lookup {
            Some(Some(hit)) => {
                stats.hits += 1;
                log::debug!("缓存命中: {}", target.display_name());
                Some(hit)
            }
            Some(None) => {
                // 过期的缓存项，移除
                entries.pop(&key);
                stats.expirations += 1;
                stats.misses += 1;
                None
            }
            None => {
                stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&self, aggregated: AggregatedResult, verdict: ScoredVerdict) {
        let key = CacheKey::for_target(&aggregated.target);
        let entry = CacheEntry {
            aggregated,
            verdict,
            inserted_at: Instant::now(),
        };

        let evicted = self.entries.lock().push(key.clone(), entry);
        if let Some((evicted_key, _)) = evicted {
            if evicted_key != key {
                self.stats.lock().evictions += 1;
            }
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }
}
