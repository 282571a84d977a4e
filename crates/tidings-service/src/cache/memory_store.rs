//! In-process fallback store.
//!
//! Serves cache traffic while the distributed cache is unreachable. Entries
//! are lost on restart and never merged back into Redis.

use super::{CacheStore, KeyPattern};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tidings_core::{deadline, Clock, SystemClock, TidingsResult};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Default number of entries the fallback store holds.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// A cached JSON value with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Serialized value.
    pub value: String,
    /// Instant after which the entry must not be returned.
    pub expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Entries plus an index ordered by expiry.
///
/// Every key in `entries` has exactly one `(expires_at, key)` pair in
/// `expiries`, so the soonest-expiring entry is always the first element.
#[derive(Default)]
struct Entries {
    entries: HashMap<String, CacheEntry>,
    expiries: BTreeSet<(Instant, String)>,
}

impl Entries {
    fn insert(&mut self, key: &str, entry: CacheEntry) {
        let expires_at = entry.expires_at;
        if let Some(old) = self.entries.insert(key.to_string(), entry) {
            self.expiries.remove(&(old.expires_at, key.to_string()));
        }
        self.expiries.insert((expires_at, key.to_string()));
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.expiries.remove(&(entry.expires_at, key.to_string()));
        Some(entry)
    }

    /// Removes entries expired at `now`, walking the index from the front.
    fn purge_expired(&mut self, now: Instant) -> usize {
        let mut purged = 0;
        while let Some((expires_at, _)) = self.expiries.first() {
            if *expires_at > now {
                break;
            }
            if let Some((_, key)) = self.expiries.pop_first() {
                self.entries.remove(&key);
                purged += 1;
            }
        }
        purged
    }

    fn evict_soonest(&mut self) -> Option<String> {
        let (_, key) = self.expiries.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }

    fn remove_matching(&mut self, pattern: &KeyPattern) -> u64 {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pattern.matches(key));
        self.expiries.retain(|(_, key)| !pattern.matches(key));
        (before - self.entries.len()) as u64
    }
}

/// Bounded in-memory TTL map.
pub struct MemoryCacheStore {
    entries: RwLock<Entries>,
    clock: Arc<dyn Clock>,
    max_entries: usize,
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl MemoryCacheStore {
    /// Creates a store using the system clock.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    /// Creates a store driven by `clock`.
    #[must_use]
    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            clock,
            max_entries: max_entries.max(1),
        }
    }

    /// Returns the live value for `key`, dropping it if it has expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        {
            let entries = self.entries.read();
            match entries.entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write();
        if entries.entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            trace!("Dropped expired fallback entry '{}'", key);
        }
        None
    }

    /// Stores `value` under `key` for `ttl`.
    ///
    /// When the store is full, expired entries are purged first; if that frees
    /// nothing, the entry closest to expiry is evicted. Both steps cost
    /// `O(log n)` per removed entry.
    pub fn set(&self, key: &str, value: &str, ttl: Duration) {
        let now = self.clock.now();
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at: deadline(now, ttl),
        };

        let mut entries = self.entries.write();
        if !entries.entries.contains_key(key) && entries.entries.len() >= self.max_entries {
            entries.purge_expired(now);
            if entries.entries.len() >= self.max_entries {
                if let Some(victim) = entries.evict_soonest() {
                    debug!("Fallback store full; evicted '{}'", victim);
                }
            }
        }
        entries.insert(key, entry);
    }

    /// Removes every key matching `pattern`, returning how many were removed.
    pub fn remove_matching(&self, pattern: &KeyPattern) -> u64 {
        self.entries.write().remove_matching(pattern)
    }

    /// Removes every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.entries.write().purge_expired(now)
    }

    /// Number of entries currently held, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().entries.is_empty()
    }

    /// Spawns a task purging expired entries every `interval`.
    ///
    /// The task holds only a weak reference and exits once the store is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    debug!("Fallback store dropped; sweeper stopping");
                    break;
                };
                let purged = store.purge_expired();
                if purged > 0 {
                    debug!("Swept {} expired fallback entries", purged);
                }
            }
        })
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get_raw(&self, key: &str) -> TidingsResult<Option<String>> {
        Ok(self.get(key))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> TidingsResult<()> {
        self.set(key, value, ttl);
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> TidingsResult<u64> {
        let pattern = KeyPattern::parse(pattern)?;
        Ok(self.remove_matching(&pattern))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidings_core::ManualClock;

    fn store_with_clock(max_entries: usize) -> (MemoryCacheStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (MemoryCacheStore::with_clock(max_entries, clock.clone()), clock)
    }

    #[test]
    fn test_round_trip() {
        let (store, _) = store_with_clock(10);
        store.set("news:1", "[1,2,3]", Duration::from_secs(60));
        assert_eq!(store.get("news:1").as_deref(), Some("[1,2,3]"));
        assert_eq!(store.get("news:2"), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss_and_dropped() {
        let (store, clock) = store_with_clock(10);
        store.set("k", "v", Duration::from_secs(1));

        clock.advance(Duration::from_millis(999));
        assert_eq!(store.get("k").as_deref(), Some("v"));

        clock.advance(Duration::from_millis(1));
        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let (store, clock) = store_with_clock(10);
        store.set("short", "1", Duration::from_secs(1));
        store.set("long", "2", Duration::from_secs(100));

        clock.advance(Duration::from_secs(2));
        assert_eq!(store.len(), 2);
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("long").as_deref(), Some("2"));
    }

    #[test]
    fn test_full_store_evicts_soonest_expiring() {
        let (store, _) = store_with_clock(2);
        store.set("a", "1", Duration::from_secs(10));
        store.set("b", "2", Duration::from_secs(5));
        store.set("c", "3", Duration::from_secs(20));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("b"), None);
        assert!(store.get("a").is_some());
        assert!(store.get("c").is_some());
    }

    #[test]
    fn test_full_store_prefers_purging_expired() {
        let (store, clock) = store_with_clock(2);
        store.set("stale", "1", Duration::from_secs(1));
        store.set("fresh", "2", Duration::from_secs(1000));
        clock.advance(Duration::from_secs(5));

        store.set("new", "3", Duration::from_secs(500));
        assert!(store.get("fresh").is_some());
        assert!(store.get("new").is_some());
    }

    #[test]
    fn test_overwrite_moves_entry_in_eviction_order() {
        let (store, _) = store_with_clock(2);
        store.set("a", "1", Duration::from_secs(5));
        store.set("b", "2", Duration::from_secs(10));
        store.set("a", "3", Duration::from_secs(60));
        store.set("c", "4", Duration::from_secs(30));

        assert_eq!(store.get("b"), None);
        assert_eq!(store.get("a").as_deref(), Some("3"));
        assert!(store.get("c").is_some());
    }

    #[test]
    fn test_index_tracks_removals() {
        let (store, clock) = store_with_clock(3);
        store.set("news:a", "1", Duration::from_secs(1));
        store.set("news:b", "2", Duration::from_secs(2));
        store.set("podcasts:a", "3", Duration::from_secs(50));
        assert_eq!(store.remove_matching(&KeyPattern::parse("news:*").unwrap()), 2);

        clock.advance(Duration::from_secs(3));
        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.len(), 1);

        let entries = store.entries.read();
        assert_eq!(entries.expiries.len(), entries.entries.len());
    }

    #[test]
    fn test_full_store_of_live_entries_stays_bounded() {
        let (store, _) = store_with_clock(100);
        for i in 0..1_000u64 {
            store.set(&format!("news:{}", i), "v", Duration::from_secs(10_000 - i));
        }

        assert_eq!(store.len(), 100);
        assert!(store.get("news:0").is_some());
        assert!(store.get("news:500").is_none());
        assert!(store.get("news:999").is_some());
        let entries = store.entries.read();
        assert_eq!(entries.expiries.len(), 100);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let (store, _) = store_with_clock(1);
        store.set("a", "1", Duration::from_secs(10));
        store.set("a", "2", Duration::from_secs(10));
        assert_eq!(store.get("a").as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_delete_matching() {
        let (store, _) = store_with_clock(10);
        store.set("news:a", "1", Duration::from_secs(10));
        store.set("news:b", "1", Duration::from_secs(10));
        store.set("podcasts:a", "1", Duration::from_secs(10));

        assert_eq!(store.delete_matching("news:*").await.unwrap(), 2);
        assert!(store.get("podcasts:a").is_some());
        assert!(store.delete_matching("news:*:x").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_and_stops_when_dropped() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemoryCacheStore::with_clock(10, clock.clone()));
        store.set("k", "v", Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));

        let handle = store.spawn_sweeper(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.len(), 0);

        drop(store);
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(handle.is_finished());
    }
}
