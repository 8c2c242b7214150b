//! Time-limited dedup markers
//!
//! Entries carry their own deadline and are evicted by the table itself on
//! every access, so callers never schedule cleanup timers.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

/// A map whose entries expire after a fixed time-to-live
#[derive(Debug)]
pub struct DedupTable<K, V> {
    ttl: Duration,
    entries: HashMap<K, (V, Instant)>,
}

impl<K: Eq + Hash, V> DedupTable<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or refresh an entry
    pub fn insert(&mut self, key: K, value: V) {
        self.purge_expired();
        let deadline = Instant::now() + self.ttl;
        self.entries.insert(key, (value, deadline));
    }

    /// Live value for a key
    pub fn get(&self, key: &K) -> Option<&V> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|(_, deadline)| *deadline > now)
            .map(|(value, _)| value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Drop every expired entry, returning how many were dropped
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, (_, deadline)| *deadline > now);
        before - self.entries.len()
    }

    /// Live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.values().filter(|(_, deadline)| *deadline > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash> DedupTable<K, ()> {
    /// Mark a key as seen.
    ///
    /// Returns true if it was already seen within the time-to-live.
    pub fn mark_seen(&mut self, key: K) -> bool {
        if self.contains(&key) {
            return true;
        }
        self.insert(key, ());
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_mark_seen_expires() {
        let mut seen: DedupTable<String, ()> = DedupTable::new(Duration::from_secs(2));
        assert!(!seen.mark_seen("req-1".to_string()));
        assert!(seen.mark_seen("req-1".to_string()));

        tokio::time::advance(Duration::from_millis(1999)).await;
        assert!(seen.mark_seen("req-1".to_string()));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!seen.mark_seen("req-1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_and_purge() {
        let mut claims: DedupTable<String, String> = DedupTable::new(Duration::from_secs(1));
        claims.insert("https://a.example".to_string(), "c1".to_string());
        assert_eq!(claims.get(&"https://a.example".to_string()), Some(&"c1".to_string()));
        assert_eq!(claims.len(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(claims.get(&"https://a.example".to_string()), None);
        assert!(claims.is_empty());
        assert_eq!(claims.purge_expired(), 1);
    }
}
