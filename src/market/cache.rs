//! Current-rate cache with TTL.
//!
//! Only current-rate lookups are memoized; historical ranges vary per call
//! and are always fetched. Entries are replaced whole under a write lock,
//! so a reader sees either the old value or the new one, never a mix.

use crate::core::currency::CurrencyPair;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    rate: Decimal,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_valid(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.cached_at) < ttl
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

/// Thread-safe, bounded current-rate cache.
///
/// Timestamps are passed in by the caller so expiry is testable without
/// sleeping.
#[derive(Debug)]
pub struct RateCache {
    entries: RwLock<HashMap<CurrencyPair, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl RateCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Cached rate for `pair` if still fresh at `now`.
    pub fn get(&self, pair: &CurrencyPair, now: DateTime<Utc>) -> Option<Decimal> {
        let entries = self.entries.read();
        match entries.get(pair) {
            Some(entry) if entry.is_valid(now, self.ttl) => {
                debug!("cache hit for {pair}");
                Some(entry.rate)
            }
            Some(_) => {
                debug!("cache entry for {pair} expired");
                None
            }
            None => None,
        }
    }

    /// Store `rate` for `pair`, evicting expired and then oldest entries when full.
    pub fn insert(&self, pair: CurrencyPair, rate: Decimal, now: DateTime<Utc>) {
        let mut entries = self.entries.write();
        if !entries.contains_key(&pair) && entries.len() >= self.max_entries {
            let ttl = self.ttl;
            entries.retain(|_, e| e.is_valid(now, ttl));
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.cached_at)
                    .map(|(p, _)| p.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(
            pair,
            CacheEntry {
                rate,
                cached_at: now,
            },
        );
    }

    pub fn remove(&self, pair: &CurrencyPair) {
        self.entries.write().remove(pair);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> CacheStats {
        let entries = self.entries.read();
        let total = entries.len();
        let valid = entries
            .values()
            .filter(|e| e.is_valid(now, self.ttl))
            .count();
        CacheStats {
            total_entries: total,
            valid_entries: valid,
            expired_entries: total - valid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyCode;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::thread;

    fn pair(base: &str) -> CurrencyPair {
        CurrencyPair::new(CurrencyCode::new(base), CurrencyCode::new("INR"))
    }

    #[test]
    fn test_insert_and_get() {
        let cache = RateCache::new(Duration::minutes(5), 10);
        let now = Utc::now();
        cache.insert(pair("USD"), dec!(83.2), now);
        assert_eq!(cache.get(&pair("USD"), now), Some(dec!(83.2)));
        assert_eq!(cache.get(&pair("EUR"), now), None);
    }

    #[test]
    fn test_expiry() {
        let cache = RateCache::new(Duration::minutes(5), 10);
        let now = Utc::now();
        cache.insert(pair("USD"), dec!(83.2), now);
        assert!(cache.get(&pair("USD"), now + Duration::minutes(4)).is_some());
        assert!(cache.get(&pair("USD"), now + Duration::minutes(5)).is_none());

        let stats = cache.stats(now + Duration::minutes(6));
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.expired_entries, 1);
    }

    #[test]
    fn test_bounded_capacity_evicts_oldest() {
        let cache = RateCache::new(Duration::minutes(5), 2);
        let now = Utc::now();
        cache.insert(pair("USD"), dec!(83), now);
        cache.insert(pair("EUR"), dec!(90), now + Duration::seconds(1));
        cache.insert(pair("GBP"), dec!(105), now + Duration::seconds(2));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&pair("USD"), now + Duration::seconds(3)).is_none());
        assert!(cache.get(&pair("GBP"), now + Duration::seconds(3)).is_some());
    }

    #[test]
    fn test_concurrent_readers_see_whole_values() {
        let cache = Arc::new(RateCache::new(Duration::minutes(5), 4));
        let now = Utc::now();
        cache.insert(pair("USD"), dec!(80), now);

        let writer = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..200u32 {
                    cache.insert(pair("USD"), Decimal::from(80 + i % 2), now);
                }
            })
        };
        for _ in 0..200 {
            let rate = cache.get(&pair("USD"), now).unwrap();
            assert!(rate == dec!(80) || rate == dec!(81));
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_clear() {
        let cache = RateCache::new(Duration::minutes(5), 4);
        cache.insert(pair("USD"), dec!(83), Utc::now());
        cache.clear();
        assert!(cache.is_empty());
    }
}
