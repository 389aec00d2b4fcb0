//! Short-lived cache of the last successful fetch.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::fetcher::PriceRecord;

#[derive(Debug)]
struct CachedFetch {
    symbols: Vec<String>,
    records: Vec<PriceRecord>,
    fetched_at: Instant,
}

/// Holds the records of the last fetch for `ttl`.
///
/// An entry only answers requests for the exact same symbol list.
#[derive(Debug)]
pub struct PriceCache {
    ttl: Duration,
    entry: Mutex<Option<CachedFetch>>,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Records cached for `symbols`, if still fresh.
    pub fn get(&self, symbols: &[String]) -> Option<Vec<PriceRecord>> {
        let entry = self.entry.lock();
        entry
            .as_ref()
            .filter(|e| e.symbols == symbols && e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.records.clone())
    }

    /// Replace the cached entry.
    pub fn put(&self, symbols: &[String], records: Vec<PriceRecord>) {
        *self.entry.lock() = Some(CachedFetch {
            symbols: symbols.to_vec(),
            records,
            fetched_at: Instant::now(),
        });
    }
}
