//! Process-wide request counters.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Total and per-path request counts, shared by every connection.
///
/// Both counters are updated without a global lock: the total is a single
/// atomic, the per-path map is sharded and increments under the shard's lock.
#[derive(Debug, Default)]
pub struct RequestStats {
    total: AtomicU64,
    per_path: DashMap<String, u64>,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request and returns the new total.
    pub fn record_request(&self) -> u64 {
        self.total.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Counts one hit on `path` and returns that path's new count.
    pub fn record_hit(&self, path: &str) -> u64 {
        let mut hits = self.per_path.entry(path.to_owned()).or_insert(0);
        *hits += 1;
        *hits
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn hits(&self, path: &str) -> u64 {
        self.per_path.get(path).map_or(0, |hits| *hits)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn counts_per_path() {
        let stats = RequestStats::new();
        assert_eq!(stats.record_hit("/a"), 1);
        assert_eq!(stats.record_hit("/a"), 2);
        assert_eq!(stats.record_hit("/b"), 1);
        assert_eq!(stats.hits("/a"), 2);
        assert_eq!(stats.hits("/never"), 0);
    }

    #[test]
    fn no_lost_updates_across_threads() {
        let stats = Arc::new(RequestStats::new());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        stats.record_request();
                        stats.record_hit("/hot");
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(stats.total(), 8_000);
        assert_eq!(stats.hits("/hot"), 8_000);
    }
}
